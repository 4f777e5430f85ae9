//! Structural layout for pedigree, descendants and hourglass views.
//!
//! Node coordinates are box centers. The focal person sits at the origin,
//! ancestors above it (negative y) and descendants below.
//!
//! - **Ancestors** fan out symmetrically above each child with a spread that
//!   grows by [`LayoutConfig::ancestor_spread_growth`] per generation.
//! - **Descendants** are packed left to right into slots sized by a bottom-up
//!   subtree width pass, so sibling subtrees never nominally collide.
//! - **Spouses** sit on the anchor's row, one spouse step per offset.
//!
//! Pedigree and hourglass then run [`resolve_overlaps`] as a backstop for the
//! ancestor fan-out, which is generous but not collision free.

use log::debug;

use super::config::{LayoutConfig, ViewConfig, ViewMode};
use super::timeline::{self, TimelineLayout};
use super::types::{FamilyGraph, NodeIdx, PersonNode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlapReport {
	/// Passes run, including the final clean pass when converged.
	pub iterations: usize,
	pub converged: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Layout {
	Structural { overlap: Option<OverlapReport> },
	Timeline(TimelineLayout),
}

/// Assigns coordinates to every node of a freshly built graph.
pub fn solve(
	graph: &mut FamilyGraph,
	view: &ViewConfig,
	geometry: &LayoutConfig,
	current_year: i32,
) -> Layout {
	if graph.is_empty() {
		return Layout::Structural { overlap: None };
	}
	if view.mode == ViewMode::Timeline {
		return Layout::Timeline(timeline::project(graph, geometry, current_year));
	}

	place_structural(graph, geometry);
	let overlap = view.mode.resolves_overlaps().then(|| {
		let report = resolve_overlaps(&mut graph.nodes, geometry);
		if !report.converged {
			debug!(
				"overlap resolution stopped after {} passes with residual overlap",
				report.iterations
			);
		}
		report
	});
	Layout::Structural { overlap }
}

fn place_structural(graph: &mut FamilyGraph, geometry: &LayoutConfig) {
	let root = 0;
	graph.nodes[root].x = 0.0;
	graph.nodes[root].y = 0.0;
	place_spouses(graph, root, geometry);
	place_ancestors(graph, root, 1, geometry);

	let widths = subtree_widths(graph, geometry);
	place_descendants(graph, root, &widths, geometry);
}

fn place_spouses(graph: &mut FamilyGraph, anchor: NodeIdx, geometry: &LayoutConfig) {
	let (x, y) = (graph.nodes[anchor].x, graph.nodes[anchor].y);
	for (i, spouse) in graph.tree_spouses(anchor).into_iter().enumerate() {
		graph.nodes[spouse].x = x + geometry.spouse_step() * (i + 1) as f64;
		graph.nodes[spouse].y = y;
	}
}

fn place_ancestors(graph: &mut FamilyGraph, child: NodeIdx, depth: u32, geometry: &LayoutConfig) {
	let parents = graph.tree_parents(child);
	if parents.is_empty() {
		return;
	}
	let (x, y) = (graph.nodes[child].x, graph.nodes[child].y);
	let spread = geometry.ancestor_spread(depth);
	let middle = (parents.len() - 1) as f64 / 2.0;

	for (i, parent) in parents.into_iter().enumerate() {
		graph.nodes[parent].x = x + (i as f64 - middle) * spread;
		graph.nodes[parent].y = y - geometry.vertical_spacing;
		place_spouses(graph, parent, geometry);
		place_ancestors(graph, parent, depth + 1, geometry);
	}
}

/// Width of a person plus their spouse chain.
fn couple_width(graph: &FamilyGraph, idx: NodeIdx, geometry: &LayoutConfig) -> f64 {
	let spouses = graph.tree_spouses(idx).len() as f64;
	geometry.node_width + spouses * geometry.spouse_step()
}

/// Horizontal slot each node reserves for itself, its spouses and all of its
/// rendered descendants, indexed by [`NodeIdx`]. Nodes outside the
/// descendant tree keep their own couple width.
pub fn subtree_widths(graph: &FamilyGraph, geometry: &LayoutConfig) -> Vec<f64> {
	let mut widths: Vec<f64> = (0..graph.nodes.len())
		.map(|idx| couple_width(graph, idx, geometry))
		.collect();
	if !graph.is_empty() {
		measure(graph, 0, geometry, &mut widths);
	}
	widths
}

fn measure(graph: &FamilyGraph, idx: NodeIdx, geometry: &LayoutConfig, widths: &mut [f64]) -> f64 {
	let own = couple_width(graph, idx, geometry);
	let children = graph.tree_children(idx);
	let width = if children.is_empty() {
		own
	} else {
		let packed: f64 = children
			.iter()
			.map(|&child| measure(graph, child, geometry, widths))
			.sum::<f64>()
			+ (children.len() - 1) as f64 * geometry.horizontal_spacing;
		own.max(packed)
	};
	widths[idx] = width;
	width
}

// Children are centered under the couple midpoint; each child's couple is
// centered in its own slot.
fn place_descendants(
	graph: &mut FamilyGraph,
	parent: NodeIdx,
	widths: &[f64],
	geometry: &LayoutConfig,
) {
	let children = graph.tree_children(parent);
	if children.is_empty() {
		return;
	}
	let center =
		graph.nodes[parent].x + (couple_width(graph, parent, geometry) - geometry.node_width) / 2.0;
	let y = graph.nodes[parent].y + geometry.vertical_spacing;
	let total: f64 = children.iter().map(|&c| widths[c]).sum::<f64>()
		+ (children.len() - 1) as f64 * geometry.horizontal_spacing;

	let mut cursor = center - total / 2.0;
	for child in children {
		let slot_center = cursor + widths[child] / 2.0;
		let spouse_span = couple_width(graph, child, geometry) - geometry.node_width;
		graph.nodes[child].x = slot_center - spouse_span / 2.0;
		graph.nodes[child].y = y;
		place_spouses(graph, child, geometry);
		place_descendants(graph, child, widths, geometry);
		cursor += widths[child] + geometry.horizontal_spacing;
	}
}

fn same_row(a: &PersonNode, b: &PersonNode, geometry: &LayoutConfig) -> bool {
	(a.y - b.y).abs() < geometry.node_height / 2.0
}

/// Number of same-row pairs closer than `node_width + overlap_padding`.
pub fn overlapping_pairs(nodes: &[PersonNode], geometry: &LayoutConfig) -> usize {
	let required = geometry.node_width + geometry.overlap_padding;
	let mut count = 0;
	for i in 0..nodes.len() {
		for j in i + 1..nodes.len() {
			if same_row(&nodes[i], &nodes[j], geometry) && (nodes[i].x - nodes[j].x).abs() < required {
				count += 1;
			}
		}
	}
	count
}

/// Pairwise horizontal repulsion between nodes sharing a row. Each
/// overlapping pair is pushed apart by half the overlap plus a margin per
/// side. Stops at the first clean pass or after `max_overlap_iterations`.
pub fn resolve_overlaps(nodes: &mut [PersonNode], geometry: &LayoutConfig) -> OverlapReport {
	let required = geometry.node_width + geometry.overlap_padding;
	for pass in 0..geometry.max_overlap_iterations {
		let mut moved = false;
		for i in 0..nodes.len() {
			for j in i + 1..nodes.len() {
				if !same_row(&nodes[i], &nodes[j], geometry) {
					continue;
				}
				let dx = nodes[j].x - nodes[i].x;
				let overlap = required - dx.abs();
				if overlap <= 0.0 {
					continue;
				}
				// coincident nodes split with the earlier one moving left
				let direction = if dx < 0.0 { -1.0 } else { 1.0 };
				let push = overlap / 2.0 + geometry.overlap_margin;
				nodes[i].x -= push * direction;
				nodes[j].x += push * direction;
				moved = true;
			}
		}
		if !moved {
			return OverlapReport {
				iterations: pass + 1,
				converged: true,
			};
		}
	}
	OverlapReport {
		iterations: geometry.max_overlap_iterations,
		converged: false,
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::components::family_tree::builder;
	use crate::components::family_tree::types::{PersonTreeNode, Placement};

	fn tree(value: serde_json::Value) -> PersonTreeNode {
		serde_json::from_value(value).unwrap()
	}

	fn solved(
		person: &PersonTreeNode,
		mode: ViewMode,
		depth: u32,
		spouses: bool,
	) -> (FamilyGraph, Layout) {
		let view = ViewConfig {
			mode,
			max_depth: depth,
			include_spouses: spouses,
			..ViewConfig::default()
		};
		let mut graph = builder::build(person, &view);
		let layout = solve(&mut graph, &view, &LayoutConfig::default(), 2024);
		(graph, layout)
	}

	fn node<'a>(graph: &'a FamilyGraph, id: &str) -> &'a PersonNode {
		&graph.nodes[graph.index_of(id).unwrap()]
	}

	fn bare(id: &str, x: f64, y: f64) -> PersonNode {
		let mut node = PersonNode::from_tree(&tree(json!({ "id": id })), 0, Placement::Root);
		node.x = x;
		node.y = y;
		node
	}

	#[test]
	fn test_grandparent_two_rows_up() {
		let person = tree(json!({
			"id": "root",
			"parents": [
				{ "id": "dad", "parents": [{ "id": "grandpa" }] },
				{ "id": "mom" }
			]
		}));
		let (graph, _) = solved(&person, ViewMode::Pedigree, 2, false);
		let geometry = LayoutConfig::default();
		let root = node(&graph, "root");
		assert_eq!(node(&graph, "grandpa").y, root.y - 2.0 * geometry.vertical_spacing);
		assert_eq!(node(&graph, "dad").y, root.y - geometry.vertical_spacing);
		assert_eq!(node(&graph, "dad").x, -node(&graph, "mom").x);
	}

	#[test]
	fn test_childless_children_evenly_spaced() {
		let person = tree(json!({
			"id": "root",
			"children": [{ "id": "a" }, { "id": "b" }, { "id": "c" }]
		}));
		let (graph, layout) = solved(&person, ViewMode::Descendants, 1, false);
		assert_eq!(layout, Layout::Structural { overlap: None });
		assert_eq!(graph.nodes.len(), 4);
		assert_eq!(graph.edges.len(), 3);

		let geometry = LayoutConfig::default();
		let step = geometry.node_width + geometry.horizontal_spacing;
		let root = node(&graph, "root");
		let xs: Vec<f64> = ["a", "b", "c"].iter().map(|id| node(&graph, id).x).collect();
		assert_eq!(xs, vec![root.x - step, root.x, root.x + step]);
		assert!(["a", "b", "c"].iter().all(|id| node(&graph, id).y == root.y + geometry.vertical_spacing));
	}

	#[test]
	fn test_spouse_offsets() {
		let person = tree(json!({
			"id": "root",
			"unions": [{ "partners": [{ "id": "first" }] }, { "partners": [{ "id": "second" }] }]
		}));
		let (graph, _) = solved(&person, ViewMode::Descendants, 1, true);
		let step = LayoutConfig::default().spouse_step();
		assert_eq!(node(&graph, "first").x, step);
		assert_eq!(node(&graph, "second").x, 2.0 * step);
		assert_eq!(node(&graph, "second").y, 0.0);
	}

	#[test]
	fn test_subtree_width_covers_children() {
		let person = tree(json!({
			"id": "root",
			"unions": [{ "partners": [{ "id": "wife" }] }],
			"children": [
				{ "id": "a", "children": [{ "id": "a1" }, { "id": "a2" }, { "id": "a3" }],
				  "unions": [{ "partners": [{ "id": "a-wife" }] }] },
				{ "id": "b" },
				{ "id": "c", "children": [{ "id": "c1" }] }
			]
		}));
		let (graph, _) = solved(&person, ViewMode::Descendants, 3, true);
		let geometry = LayoutConfig::default();
		let widths = subtree_widths(&graph, &geometry);

		for idx in 0..graph.nodes.len() {
			let children = graph.tree_children(idx);
			if children.is_empty() {
				continue;
			}
			let packed: f64 = children.iter().map(|&c| widths[c]).sum::<f64>()
				+ (children.len() - 1) as f64 * geometry.horizontal_spacing;
			assert!(widths[idx] >= packed, "{}", graph.nodes[idx].id);
		}
		// a + spouse is 340 wide, its three children need 560
		assert_eq!(widths[graph.index_of("a").unwrap()], 560.0);
		assert_eq!(widths[graph.index_of("b").unwrap()], 160.0);
	}

	#[test]
	fn test_sibling_subtrees_do_not_collide() {
		let person = tree(json!({
			"id": "root",
			"children": [
				{ "id": "a", "children": [{ "id": "a1" }, { "id": "a2" }, { "id": "a3" }] },
				{ "id": "b", "children": [{ "id": "b1" }, { "id": "b2" }] }
			]
		}));
		let (graph, _) = solved(&person, ViewMode::Descendants, 2, true);
		let tight = LayoutConfig {
			overlap_padding: 0.0,
			..LayoutConfig::default()
		};
		assert_eq!(overlapping_pairs(&graph.nodes, &tight), 0);
		// parents are centered over their children
		let a = node(&graph, "a");
		assert_eq!(a.x, node(&graph, "a2").x);
		let b = node(&graph, "b");
		assert_eq!(b.x, (node(&graph, "b1").x + node(&graph, "b2").x) / 2.0);
	}

	#[test]
	fn test_children_centered_under_couple() {
		let person = tree(json!({
			"id": "root",
			"unions": [{ "partners": [{ "id": "wife" }] }],
			"children": [{ "id": "only" }]
		}));
		let (graph, _) = solved(&person, ViewMode::Descendants, 1, true);
		let midpoint = (node(&graph, "root").x + node(&graph, "wife").x) / 2.0;
		assert_eq!(node(&graph, "only").x, midpoint);
	}

	#[test]
	fn test_two_close_nodes_separated() {
		let geometry = LayoutConfig::default();
		let mut nodes = vec![bare("a", 0.0, 0.0), bare("b", 10.0, 0.0)];
		let report = resolve_overlaps(&mut nodes, &geometry);
		assert!(report.converged);
		assert!((nodes[1].x - nodes[0].x).abs() >= 180.0);
	}

	#[test]
	fn test_rows_do_not_repel() {
		let geometry = LayoutConfig::default();
		let mut nodes = vec![bare("a", 0.0, 0.0), bare("b", 0.0, 120.0)];
		let report = resolve_overlaps(&mut nodes, &geometry);
		assert_eq!(report, OverlapReport { iterations: 1, converged: true });
		assert_eq!(nodes[1].x, 0.0);
	}

	#[test]
	fn test_coincident_nodes_split() {
		let geometry = LayoutConfig::default();
		let mut nodes = vec![bare("a", 50.0, 0.0), bare("b", 50.0, 0.0)];
		resolve_overlaps(&mut nodes, &geometry);
		assert!(nodes[0].x < nodes[1].x);
		assert_eq!(overlapping_pairs(&nodes, &geometry), 0);
	}

	#[test]
	fn test_resolution_terminates() {
		let geometry = LayoutConfig {
			max_overlap_iterations: 3,
			..LayoutConfig::default()
		};
		let mut nodes: Vec<PersonNode> = (0..40)
			.map(|i| bare(&i.to_string(), (i % 3) as f64, 0.0))
			.collect();
		let report = resolve_overlaps(&mut nodes, &geometry);
		assert!(report.iterations <= 3);
		if !report.converged {
			assert_eq!(report.iterations, 3);
		}
	}

	#[test]
	fn test_pedigree_deep_ancestors_resolved() {
		fn ancestors(id: String, depth: u32) -> serde_json::Value {
			if depth == 0 {
				return json!({ "id": id });
			}
			json!({
				"id": id.clone(),
				"parents": [ancestors(format!("{id}f"), depth - 1), ancestors(format!("{id}m"), depth - 1)]
			})
		}
		let person = tree(ancestors("r".into(), 4));
		let (graph, layout) = solved(&person, ViewMode::Pedigree, 4, false);
		assert_eq!(graph.nodes.len(), 31);
		match layout {
			Layout::Structural { overlap: Some(report) } => {
				assert!(report.converged);
				assert_eq!(overlapping_pairs(&graph.nodes, &LayoutConfig::default()), 0);
			}
			other => panic!("unexpected layout {other:?}"),
		}
	}
}
