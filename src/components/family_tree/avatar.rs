//! Bounded-concurrency avatar resolution.
//!
//! The loader is a plain queue; the component drives it by spawning one
//! future per [`AvatarJob`] handed out by [`AvatarLoader::next_jobs`] and
//! feeding the outcome back through [`AvatarLoader::complete`]. A result is
//! applied only while some person in the current build still references its
//! media id; otherwise it is just cached for later builds.

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use log::{debug, warn};

use super::error::FamilyTreeError;
use super::types::FamilyGraph;

pub type AvatarFuture = Pin<Box<dyn Future<Output = Result<String, FamilyTreeError>>>>;

/// Host-supplied lookup from a media id to a displayable image URL.
pub type AvatarResolver = Rc<dyn Fn(String) -> AvatarFuture>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvatarJob {
	pub media_id: String,
}

/// An image URL the current build should display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvatarUpdate {
	pub media_id: String,
	pub url: String,
}

#[derive(Debug)]
pub struct AvatarLoader {
	max_in_flight: usize,
	in_flight: HashSet<String>,
	queue: VecDeque<AvatarJob>,
	/// media ids referenced by the current build
	wanted: HashSet<String>,
	resolved: HashMap<String, String>,
	/// Failed media ids are not retried this session.
	failed: HashSet<String>,
	/// Cached URLs the current build needs but the view may not hold yet.
	ready: Vec<AvatarUpdate>,
}

impl AvatarLoader {
	pub fn new(max_in_flight: usize) -> Self {
		Self {
			max_in_flight: max_in_flight.max(1),
			in_flight: HashSet::new(),
			queue: VecDeque::new(),
			wanted: HashSet::new(),
			resolved: HashMap::new(),
			failed: HashSet::new(),
			ready: Vec::new(),
		}
	}

	pub fn max_in_flight(&self) -> usize {
		self.max_in_flight
	}

	pub fn in_flight(&self) -> usize {
		self.in_flight.len()
	}

	pub fn pending(&self) -> usize {
		self.queue.len()
	}

	pub fn set_max_in_flight(&mut self, max_in_flight: usize) {
		self.max_in_flight = max_in_flight.max(1);
	}

	/// Retargets the loader at a freshly built graph. Queued work nobody
	/// references any more is dropped; running fetches are left alone and
	/// not queued twice. Already resolved images come back via
	/// [`AvatarLoader::take_ready`].
	pub fn reset(&mut self, graph: &FamilyGraph) {
		self.wanted = graph
			.nodes
			.iter()
			.filter_map(|node| node.avatar_media_id.clone())
			.collect();
		self.queue.clear();
		self.ready.clear();

		let mut missing = Vec::new();
		for media_id in &self.wanted {
			match self.resolved.get(media_id) {
				Some(url) => self.ready.push(AvatarUpdate {
					media_id: media_id.clone(),
					url: url.clone(),
				}),
				None if !self.in_flight.contains(media_id) && !self.failed.contains(media_id) => {
					missing.push(media_id.clone());
				}
				None => {}
			}
		}
		missing.sort();
		self.ready.sort_by(|a, b| a.media_id.cmp(&b.media_id));
		self.queue
			.extend(missing.into_iter().map(|media_id| AvatarJob { media_id }));
	}

	/// Cached images for the current build, handed out once.
	pub fn take_ready(&mut self) -> Vec<AvatarUpdate> {
		std::mem::take(&mut self.ready)
	}

	/// Jobs that may start now without exceeding the in-flight cap.
	pub fn next_jobs(&mut self) -> Vec<AvatarJob> {
		let mut jobs = Vec::new();
		while self.in_flight.len() < self.max_in_flight {
			let Some(job) = self.queue.pop_front() else {
				break;
			};
			if self.in_flight.insert(job.media_id.clone()) {
				jobs.push(job);
			}
		}
		jobs
	}

	/// Records a finished fetch. Returns an update only when a person in the
	/// current build still references the media id.
	pub fn complete(
		&mut self,
		job: AvatarJob,
		result: Result<String, FamilyTreeError>,
	) -> Option<AvatarUpdate> {
		self.in_flight.remove(&job.media_id);
		let url = match result {
			Ok(url) => url,
			Err(err) => {
				warn!("avatar fetch failed, keeping initials: {err}");
				self.failed.insert(job.media_id);
				return None;
			}
		};
		self.resolved.insert(job.media_id.clone(), url.clone());
		if !self.wanted.contains(&job.media_id) {
			debug!("avatar {} no longer displayed, cached only", job.media_id);
			return None;
		}
		Some(AvatarUpdate {
			media_id: job.media_id,
			url,
		})
	}
}
