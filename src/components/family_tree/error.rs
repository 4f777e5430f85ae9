use thiserror::Error;

/// Failures at the edges of the tree view. Layout itself never fails.
#[derive(Debug, Error)]
pub enum FamilyTreeError {
	#[error("invalid tree payload: {0}")]
	Payload(#[from] serde_json::Error),

	#[error("avatar {media_id} could not be resolved: {reason}")]
	Avatar { media_id: String, reason: String },

	#[error("canvas unavailable: {0}")]
	Canvas(String),
}

impl FamilyTreeError {
	pub fn avatar(media_id: impl Into<String>, reason: impl Into<String>) -> Self {
		Self::Avatar {
			media_id: media_id.into(),
			reason: reason.into(),
		}
	}
}
