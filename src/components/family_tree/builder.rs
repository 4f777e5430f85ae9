//! Flattens the nested person payload into a node arena and edge list.

use std::collections::HashSet;

use log::debug;

use super::config::ViewConfig;
use super::types::{Edge, EdgeKind, FamilyGraph, NodeIdx, PersonNode, PersonTreeNode, Placement};

/// Builds the graph for one render pass. The focal person (`view.focal_id`
/// when present in the payload, otherwise the payload root) lands at index 0.
pub fn build(root: &PersonTreeNode, view: &ViewConfig) -> FamilyGraph {
	let focal = view
		.focal_id
		.as_deref()
		.and_then(|id| root.find(id))
		.unwrap_or(root);
	GraphBuilder::new(view).run(focal)
}

struct GraphBuilder<'a> {
	view: &'a ViewConfig,
	graph: FamilyGraph,
	edge_keys: HashSet<(EdgeKind, NodeIdx, NodeIdx)>,
}

impl<'a> GraphBuilder<'a> {
	fn new(view: &'a ViewConfig) -> Self {
		Self {
			view,
			graph: FamilyGraph::default(),
			edge_keys: HashSet::new(),
		}
	}

	fn run(mut self, root: &PersonTreeNode) -> FamilyGraph {
		let root_idx = self.graph.push(PersonNode::from_tree(root, 0, Placement::Root));
		self.attach_spouses(root_idx, root);

		if self.view.mode.walks_ancestors() {
			self.walk_ancestors(root_idx, root, 1);
		}
		if self.view.mode.walks_descendants() {
			self.walk_descendants(root_idx, root, 1);
		}

		debug!(
			"built {} graph: {} nodes, {} edges",
			self.view.mode.as_str(),
			self.graph.nodes.len(),
			self.graph.edges.len()
		);
		self.graph
	}

	/// Returns the node for `person`, creating it if the id is new.
	fn materialize(
		&mut self,
		person: &PersonTreeNode,
		generation: i32,
		placement: Placement,
	) -> (NodeIdx, bool) {
		match self.graph.index_of(&person.id) {
			Some(idx) => (idx, false),
			None => {
				let node = PersonNode::from_tree(person, generation, placement);
				(self.graph.push(node), true)
			}
		}
	}

	fn link(&mut self, kind: EdgeKind, from: NodeIdx, to: NodeIdx) {
		if from == to {
			return;
		}
		let key = match kind {
			EdgeKind::ParentChild => (kind, from, to),
			EdgeKind::Spouse => (kind, from.min(to), from.max(to)),
		};
		if self.edge_keys.insert(key) {
			self.graph.edges.push(Edge { kind, from, to });
		}
	}

	// All parents are created before any of them is expanded, so a mother
	// is never first materialized as her husband's spouse and left unexpanded.
	fn walk_ancestors(&mut self, child_idx: NodeIdx, child: &PersonTreeNode, depth: u32) {
		let generation = -(depth as i32);
		if depth > self.view.depth() || self.view.collapsed_generations.contains(&generation) {
			return;
		}

		let mut fresh = Vec::new();
		for parent in &child.parents {
			let (idx, created) =
				self.materialize(parent, generation, Placement::Ancestor { child: child_idx });
			self.link(EdgeKind::ParentChild, idx, child_idx);
			if created {
				fresh.push((idx, parent));
			}
		}
		for (idx, parent) in fresh {
			self.attach_spouses(idx, parent);
			self.walk_ancestors(idx, parent, depth + 1);
		}
	}

	fn walk_descendants(&mut self, parent_idx: NodeIdx, parent: &PersonTreeNode, depth: u32) {
		let generation = depth as i32;
		if depth > self.view.depth() || self.view.collapsed_generations.contains(&generation) {
			return;
		}

		let mut fresh = Vec::new();
		for child in &parent.children {
			let (idx, created) =
				self.materialize(child, generation, Placement::Descendant { parent: parent_idx });
			self.link(EdgeKind::ParentChild, parent_idx, idx);
			if created {
				fresh.push((idx, child));
			}
		}
		for (idx, child) in fresh {
			self.attach_spouses(idx, child);
			self.walk_descendants(idx, child, depth + 1);
		}
	}

	fn attach_spouses(&mut self, anchor_idx: NodeIdx, anchor: &PersonTreeNode) {
		if !self.view.include_spouses {
			return;
		}
		let generation = self.graph.nodes[anchor_idx].generation;
		let mut offset = 0;
		for partner in anchor.partners() {
			let spouse_idx = match self.graph.index_of(&partner.id) {
				Some(idx) => idx,
				None => {
					offset += 1;
					let placement = Placement::Spouse {
						anchor: anchor_idx,
						offset,
					};
					self.graph
						.push(PersonNode::from_tree(partner, generation, placement))
				}
			};
			self.link(EdgeKind::Spouse, anchor_idx, spouse_idx);
		}
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use serde_json::json;

	use super::*;
	use crate::components::family_tree::config::ViewMode;

	fn tree(value: serde_json::Value) -> PersonTreeNode {
		serde_json::from_value(value).unwrap()
	}

	fn view(mode: ViewMode, max_depth: u32, include_spouses: bool) -> ViewConfig {
		ViewConfig {
			mode,
			max_depth,
			include_spouses,
			..ViewConfig::default()
		}
	}

	fn deep_family() -> PersonTreeNode {
		tree(json!({
			"id": "root",
			"parents": [
				{ "id": "dad", "unions": [{ "partners": [{ "id": "mom" }, { "id": "stepmom" }] }],
				  "parents": [{ "id": "gd1", "parents": [{ "id": "ggd1" }] }] },
				{ "id": "mom", "unions": [{ "partners": [{ "id": "dad" }] }],
				  "parents": [{ "id": "gd1" }] }
			],
			"unions": [{ "partners": [{ "id": "wife" }] }],
			"children": [
				{ "id": "kid1", "children": [{ "id": "gk1", "children": [{ "id": "ggk1" }] }] },
				{ "id": "kid2", "parents": [{ "id": "root" }] }
			]
		}))
	}

	#[test]
	fn test_pedigree_scenario() {
		let person = tree(json!({
			"id": "root",
			"parents": [
				{ "id": "dad", "parents": [{ "id": "grandpa" }] },
				{ "id": "mom" }
			]
		}));
		let graph = build(&person, &view(ViewMode::Pedigree, 2, false));
		assert_eq!(graph.nodes.len(), 4);
		assert_eq!(graph.edges.len(), 3);
		assert!(graph.edges.iter().all(|e| e.kind == EdgeKind::ParentChild));
		assert_eq!(graph.nodes[0].id, "root");
		assert_eq!(graph.nodes[0].generation, 0);
		let grandpa = graph.index_of("grandpa").unwrap();
		assert_eq!(graph.nodes[grandpa].generation, -2);
	}

	#[test]
	fn test_no_duplicate_ids() {
		for mode in [
			ViewMode::Pedigree,
			ViewMode::Descendants,
			ViewMode::Hourglass,
			ViewMode::Timeline,
		] {
			let graph = build(&deep_family(), &view(mode, 5, true));
			let ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
			assert_eq!(ids.len(), graph.nodes.len(), "{mode:?}");
		}
	}

	#[test]
	fn test_depth_bound() {
		for depth in 1..=3 {
			let graph = build(&deep_family(), &view(ViewMode::Hourglass, depth, true));
			assert!(graph.nodes.iter().all(|n| n.generation.unsigned_abs() <= depth));
		}
		let graph = build(&deep_family(), &view(ViewMode::Hourglass, 1, false));
		assert!(graph.index_of("gd1").is_none());
		assert!(graph.index_of("gk1").is_none());
	}

	#[test]
	fn test_reused_parent_still_gets_edge() {
		let graph = build(&deep_family(), &view(ViewMode::Hourglass, 3, true));
		let root = 0;
		let root_parent_edges = graph
			.edges
			.iter()
			.filter(|e| e.kind == EdgeKind::ParentChild && e.to == root)
			.count();
		assert_eq!(root_parent_edges, 2);

		// gd1 is reached through both dad and mom but materialized once
		let gd1 = graph.index_of("gd1").unwrap();
		let dad = graph.index_of("dad").unwrap();
		let mom = graph.index_of("mom").unwrap();
		assert_eq!(graph.nodes[gd1].placement, Placement::Ancestor { child: dad });
		let gd1_children: HashSet<NodeIdx> = graph
			.edges
			.iter()
			.filter(|e| e.kind == EdgeKind::ParentChild && e.from == gd1)
			.map(|e| e.to)
			.collect();
		assert_eq!(gd1_children, HashSet::from([dad, mom]));

		// kid2 lists root as a parent again, which must not duplicate anything
		let kid2 = graph.index_of("kid2").unwrap();
		assert_eq!(graph.incident_edges(kid2).count(), 1);
	}

	#[test]
	fn test_spouses_share_generation_and_offsets() {
		let graph = build(&deep_family(), &view(ViewMode::Pedigree, 3, true));
		let dad = graph.index_of("dad").unwrap();
		let mom = graph.index_of("mom").unwrap();
		let stepmom = graph.index_of("stepmom").unwrap();

		// mom is a parent first, so dad only links to her
		assert_eq!(graph.nodes[mom].placement, Placement::Ancestor { child: 0 });
		assert_eq!(
			graph.nodes[stepmom].placement,
			Placement::Spouse {
				anchor: dad,
				offset: 1
			}
		);
		assert_eq!(graph.nodes[stepmom].generation, -1);
		let spouse_edges = graph
			.edges
			.iter()
			.filter(|e| e.kind == EdgeKind::Spouse)
			.filter(|e| e.touches(dad) && (e.touches(mom) || e.touches(stepmom)))
			.count();
		assert_eq!(spouse_edges, 2);
		assert_eq!(graph.tree_spouses(dad), vec![stepmom]);

		let wife = graph.index_of("wife").unwrap();
		assert_eq!(graph.nodes[wife].generation, 0);
	}

	#[test]
	fn test_spouse_offsets_deterministic() {
		let person = tree(json!({
			"id": "root",
			"unions": [
				{ "partners": [{ "id": "a" }] },
				{ "partners": [{ "id": "root" }, { "id": "b" }, { "id": "c" }] }
			]
		}));
		for _ in 0..3 {
			let graph = build(&person, &view(ViewMode::Descendants, 1, true));
			let offsets: Vec<_> = ["a", "b", "c"]
				.iter()
				.map(|id| graph.nodes[graph.index_of(id).unwrap()].placement)
				.collect();
			assert_eq!(
				offsets,
				vec![
					Placement::Spouse { anchor: 0, offset: 1 },
					Placement::Spouse { anchor: 0, offset: 2 },
					Placement::Spouse { anchor: 0, offset: 3 },
				]
			);
		}
	}

	#[test]
	fn test_spouses_excluded_when_disabled() {
		let graph = build(&deep_family(), &view(ViewMode::Hourglass, 3, false));
		assert!(graph.index_of("wife").is_none());
		assert!(graph.index_of("stepmom").is_none());
		assert!(graph.edges.iter().all(|e| e.kind == EdgeKind::ParentChild));
	}

	#[test]
	fn test_mode_restricts_direction() {
		let pedigree = build(&deep_family(), &view(ViewMode::Pedigree, 3, false));
		assert!(pedigree.index_of("kid1").is_none());
		let descendants = build(&deep_family(), &view(ViewMode::Descendants, 3, false));
		assert!(descendants.index_of("dad").is_none());
		assert!(descendants.index_of("ggk1").is_some());
	}

	#[test]
	fn test_collapsed_generation_hides_deeper_rows() {
		let mut config = view(ViewMode::Hourglass, 3, true);
		config.collapsed_generations.insert(-2);
		config.collapsed_generations.insert(1);
		let graph = build(&deep_family(), &config);
		assert!(graph.index_of("dad").is_some());
		assert!(graph.index_of("gd1").is_none());
		assert!(graph.index_of("ggd1").is_none());
		assert!(graph.index_of("kid1").is_none());
		assert!(graph.index_of("gk1").is_none());
		assert_eq!(graph.generations().into_iter().collect::<Vec<_>>(), vec![-1, 0]);
	}

	#[test]
	fn test_focal_id_reroots() {
		let mut config = view(ViewMode::Descendants, 2, false);
		config.focal_id = Some("kid1".into());
		let graph = build(&deep_family(), &config);
		assert_eq!(graph.nodes[0].id, "kid1");
		assert_eq!(graph.nodes.len(), 3);

		config.focal_id = Some("missing".into());
		let graph = build(&deep_family(), &config);
		assert_eq!(graph.nodes[0].id, "root");
	}

	#[test]
	fn test_bare_root() {
		let graph = build(&tree(json!({ "id": "solo" })), &ViewConfig::default());
		assert_eq!(graph.nodes.len(), 1);
		assert!(graph.edges.is_empty());
		assert_eq!((graph.nodes[0].x, graph.nodes[0].y), (0.0, 0.0));
	}
}
