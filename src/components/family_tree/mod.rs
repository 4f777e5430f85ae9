//! Family tree layout and canvas rendering.
//!
//! The pipeline runs payload -> [`builder::build`] -> [`layout::solve`] ->
//! [`scene::Scene::compose`] -> canvas. [`FamilyTreeCanvas`] owns one
//! [`state::FamilyTreeState`] and reruns the whole pipeline whenever its
//! tree or view inputs change.

pub mod avatar;
pub mod builder;
mod component;
pub mod config;
pub mod dates;
pub mod error;
pub mod layout;
pub mod palette;
mod render;
pub mod scene;
pub mod state;
pub mod timeline;
pub mod types;

pub use avatar::{AvatarFuture, AvatarResolver};
pub use component::FamilyTreeCanvas;
pub use config::{Language, LayoutConfig, NodeColoring, ViewConfig, ViewMode};
pub use error::FamilyTreeError;
pub use scene::RelationshipDirection;
pub use state::TreeEvent;
pub use types::{CrossTreeLink, PersonTreeNode, Sex};
