//! View and geometry configuration for a tree render pass.
//!
//! Both structs deserialize from partial JSON (missing keys fall back to
//! [`Default`]) so a host page can override only what it cares about.

use std::collections::BTreeSet;

use serde::Deserialize;

/// The four diagram paradigms drawn over the same person graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
	#[default]
	Pedigree,
	Descendants,
	Hourglass,
	Timeline,
}

impl ViewMode {
	pub fn parse(s: &str) -> Self {
		match s.trim().to_lowercase().as_str() {
			"descendants" | "descendant" => ViewMode::Descendants,
			"hourglass" => ViewMode::Hourglass,
			"timeline" => ViewMode::Timeline,
			_ => ViewMode::Pedigree,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			ViewMode::Pedigree => "pedigree",
			ViewMode::Descendants => "descendants",
			ViewMode::Hourglass => "hourglass",
			ViewMode::Timeline => "timeline",
		}
	}

	pub fn walks_ancestors(&self) -> bool {
		matches!(
			self,
			ViewMode::Pedigree | ViewMode::Hourglass | ViewMode::Timeline
		)
	}

	pub fn walks_descendants(&self) -> bool {
		matches!(
			self,
			ViewMode::Descendants | ViewMode::Hourglass | ViewMode::Timeline
		)
	}

	/// Views drawn with generation bands, generation colours and collapsible rows.
	pub fn is_generation_banded(&self) -> bool {
		!matches!(self, ViewMode::Descendants)
	}

	/// Views whose combinatorial ancestor spread needs the repulsion pass.
	pub fn resolves_overlaps(&self) -> bool {
		matches!(self, ViewMode::Pedigree | ViewMode::Hourglass)
	}
}

/// Display language for person names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
	#[default]
	English,
	Arabic,
	Nobiin,
}

impl Language {
	pub fn parse(s: &str) -> Self {
		match s.trim().to_lowercase().as_str() {
			"ar" | "arabic" => Language::Arabic,
			"nob" | "fia" | "nobiin" => Language::Nobiin,
			_ => Language::English,
		}
	}
}

/// How node boxes are filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeColoring {
	Sex,
	Generation,
}

/// Input parameters of a render pass.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewConfig {
	pub mode: ViewMode,
	/// Generations walked in each direction, at least 1.
	pub max_depth: u32,
	pub include_spouses: bool,
	pub focal_id: Option<String>,
	/// Generations hidden together with everything reached only through them.
	pub collapsed_generations: BTreeSet<i32>,
	pub language: Language,
	/// Overrides the per-mode default colouring.
	pub coloring: Option<NodeColoring>,
	pub avatar_concurrency: usize,
}

impl Default for ViewConfig {
	fn default() -> Self {
		Self {
			mode: ViewMode::default(),
			max_depth: 3,
			include_spouses: true,
			focal_id: None,
			collapsed_generations: BTreeSet::new(),
			language: Language::default(),
			coloring: None,
			avatar_concurrency: 8,
		}
	}
}

impl ViewConfig {
	pub fn depth(&self) -> u32 {
		self.max_depth.max(1)
	}

	pub fn coloring(&self) -> NodeColoring {
		self.coloring.unwrap_or(if self.mode.is_generation_banded() {
			NodeColoring::Generation
		} else {
			NodeColoring::Sex
		})
	}

	pub fn avatar_concurrency(&self) -> usize {
		self.avatar_concurrency.max(1)
	}
}

/// Geometry constants shared by the solver and the render adapter.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
	pub node_width: f64,
	pub node_height: f64,
	pub horizontal_spacing: f64,
	pub vertical_spacing: f64,
	pub spouse_gap: f64,
	pub overlap_padding: f64,
	pub overlap_margin: f64,
	pub max_overlap_iterations: usize,
	/// Per-generation growth of the ancestor spread; 2.0 mirrors binary fan-out.
	pub ancestor_spread_growth: f64,
	/// Year axis width used when the canvas width is unknown.
	pub timeline_width: f64,
	/// Canvas width kept free for the labels drawn right of the lifespan bars.
	pub timeline_label_room: f64,
	pub timeline_row_height: f64,
	pub timeline_year_buffer: i32,
	/// Age assumed for people without a usable birth date.
	pub default_age: i32,
	/// Lifespan assumed for deceased people without a death date.
	pub assumed_lifespan: i32,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			node_width: 160.0,
			node_height: 80.0,
			horizontal_spacing: 40.0,
			vertical_spacing: 120.0,
			spouse_gap: 20.0,
			overlap_padding: 20.0,
			overlap_margin: 1.0,
			max_overlap_iterations: 50,
			ancestor_spread_growth: 2.0,
			timeline_width: 1200.0,
			timeline_label_room: 220.0,
			timeline_row_height: 36.0,
			timeline_year_buffer: 5,
			default_age: 50,
			assumed_lifespan: 70,
		}
	}
}

impl LayoutConfig {
	/// Lateral step between a person and their n-th spouse.
	pub fn spouse_step(&self) -> f64 {
		self.node_width + self.spouse_gap
	}

	/// Year axis width for a canvas `available` px wide, never narrower
	/// than one node box.
	pub fn timeline_width_for(&self, available: f64) -> f64 {
		if available.is_finite() && available > 0.0 {
			(available - self.timeline_label_room).max(self.node_width)
		} else {
			self.timeline_width
		}
	}

	/// Distance between neighbouring parents `depth` generations above the focal person.
	pub fn ancestor_spread(&self, depth: u32) -> f64 {
		let exponent = depth.saturating_sub(1) as i32;
		(self.node_width + self.horizontal_spacing) * self.ancestor_spread_growth.powi(exponent)
	}
}
