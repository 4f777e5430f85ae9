use super::config::NodeColoring;
use super::types::{PersonNode, Sex};

pub const MALE: &str = "#4a90d9";
pub const FEMALE: &str = "#e07aa5";
pub const UNKNOWN: &str = "#9e9e9e";
pub const FOCAL: &str = "#8bc34a";

/// Ancestor ramp, nearest generation first.
const WARM: &[&str] = &["#ffcc80", "#ffb74d", "#ffa726", "#fb8c00", "#ef6c00", "#e65100"];
/// Descendant ramp, nearest generation first.
const COOL: &[&str] = &["#81d4fa", "#4fc3f7", "#29b6f6", "#039be5", "#0277bd", "#01579b"];

pub const BACKGROUND: &str = "#f7f5f0";
pub const EDGE: &str = "#7a7a7a";
pub const SPOUSE_EDGE: &str = "#b0785a";
pub const TEXT: &str = "#1d1d1d";
pub const SELECTED: &str = "#263238";
pub const BADGE: &str = "#6a1b9a";
pub const AFFORDANCE: &str = "#2e7d32";

pub fn sex_color(sex: Sex) -> &'static str {
	match sex {
		Sex::Male => MALE,
		Sex::Female => FEMALE,
		Sex::Unknown => UNKNOWN,
	}
}

/// Warm for ancestors, cool for descendants; the deepest shade repeats.
pub fn generation_color(generation: i32) -> &'static str {
	let ramp = match generation {
		0 => return FOCAL,
		g if g < 0 => WARM,
		_ => COOL,
	};
	let depth = generation.unsigned_abs() as usize;
	ramp[(depth - 1).min(ramp.len() - 1)]
}

pub fn node_fill(node: &PersonNode, coloring: NodeColoring) -> &'static str {
	match coloring {
		NodeColoring::Sex => sex_color(node.sex),
		NodeColoring::Generation => generation_color(node.generation),
	}
}

/// Translucent band tint behind a generation row.
pub fn band_fill(generation: i32) -> String {
	format!("{}33", generation_color(generation))
}
