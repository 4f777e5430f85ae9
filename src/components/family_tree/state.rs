use std::collections::{BTreeSet, HashSet};

use log::{debug, info};

use super::avatar::AvatarLoader;
use super::builder;
use super::config::{LayoutConfig, ViewConfig, ViewMode};
use super::dates;
use super::layout::{self, Layout};
use super::scene::{Action, Hit, RelationshipDirection, Scene, generation_label};
use super::types::{CrossTreeLink, FamilyGraph, NodeIdx, PersonTreeNode};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;
/// Pointer travel (screen px) below which a press counts as a click.
const CLICK_SLOP: f64 = 3.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewPhase {
	#[default]
	Idle,
	Loading,
	Built,
	Interactive,
}

/// Callbacks the host application receives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeEvent {
	PersonSelected(String),
	PersonDoubleClicked(String),
	CrossTreeLinkClicked(String),
	FindRelationshipRequested(String),
	AddRelationshipRequested(String, RelationshipDirection),
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<NodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<NodeIdx>,
	pub neighbors: HashSet<NodeIdx>,
}

/// Cross-tree links of one person, positioned in screen space.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkPopover {
	pub person_name: String,
	pub links: Vec<CrossTreeLink>,
	pub screen_x: f64,
	pub screen_y: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationToggle {
	pub generation: i32,
	pub label: String,
	pub collapsed: bool,
}

pub struct FamilyTreeState {
	pub phase: ViewPhase,
	pub view: ViewConfig,
	pub geometry: LayoutConfig,
	pub collapsed: BTreeSet<i32>,
	pub graph: FamilyGraph,
	pub layout: Layout,
	pub scene: Scene,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub selected: Option<NodeIdx>,
	pub open_links: Option<NodeIdx>,
	pub avatars: AvatarLoader,
	pub width: f64,
	pub height: f64,
	pub current_year: i32,
	/// Set whenever the canvas needs repainting.
	pub dirty: bool,
	source: Option<PersonTreeNode>,
	press_moved: bool,
}

impl FamilyTreeState {
	pub fn new(geometry: LayoutConfig, width: f64, height: f64) -> Self {
		let view = ViewConfig::default();
		Self {
			phase: ViewPhase::Idle,
			avatars: AvatarLoader::new(view.avatar_concurrency()),
			view,
			geometry,
			collapsed: BTreeSet::new(),
			graph: FamilyGraph::default(),
			layout: Layout::Structural { overlap: None },
			scene: Scene::default(),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			selected: None,
			open_links: None,
			width,
			height,
			current_year: dates::current_year(),
			dirty: true,
			source: None,
			press_moved: false,
		}
	}

	/// Waiting for the host to deliver a payload.
	pub fn begin_loading(&mut self) {
		self.phase = ViewPhase::Loading;
		self.source = None;
		self.graph = FamilyGraph::default();
		self.scene = Scene::default();
		self.dirty = true;
	}

	/// New payload and/or view parameters. Collapse state is taken from
	/// `view`, so anything toggled interactively is discarded unless the
	/// caller carries it over.
	pub fn load(&mut self, tree: PersonTreeNode, view: ViewConfig) {
		info!("loading {} tree rooted at {}", view.mode.as_str(), tree.id);
		self.collapsed = view.collapsed_generations.clone();
		self.avatars.set_max_in_flight(view.avatar_concurrency());
		self.view = view;
		self.source = Some(tree);
		self.rebuild();
	}

	pub fn set_view(&mut self, view: ViewConfig) {
		match self.source.take() {
			Some(tree) => self.load(tree, view),
			None => {
				self.avatars.set_max_in_flight(view.avatar_concurrency());
				self.view = view;
			}
		}
	}

	fn rebuild(&mut self) {
		let Some(source) = &self.source else {
			return;
		};
		let mut view = self.view.clone();
		if view.mode.is_generation_banded() {
			view.collapsed_generations = self.collapsed.clone();
		} else {
			view.collapsed_generations.clear();
		}

		let mut geometry = self.geometry.clone();
		geometry.timeline_width = self.geometry.timeline_width_for(self.width);

		let mut graph = builder::build(source, &view);
		self.layout = layout::solve(&mut graph, &view, &geometry, self.current_year);
		self.scene = Scene::compose(&graph, &self.layout, &view, &geometry);
		self.graph = graph;
		self.avatars.reset(&self.graph);

		self.drag = DragState::default();
		self.pan = PanState::default();
		self.hover = HoverState::default();
		self.selected = None;
		self.open_links = None;
		self.phase = ViewPhase::Built;
		self.fit_to_view();
		debug!(
			"{} view rebuilt: {} people, {} edges",
			view.mode.as_str(),
			self.graph.nodes.len(),
			self.graph.edges.len()
		);
	}

	/// Collapses or expands one generation and rebuilds. The focal
	/// generation and non-banded views are left alone.
	pub fn toggle_generation(&mut self, generation: i32) -> bool {
		if generation == 0 || !self.view.mode.is_generation_banded() || self.source.is_none() {
			return false;
		}
		if !self.collapsed.remove(&generation) {
			self.collapsed.insert(generation);
		}
		debug!("generation {generation} collapsed: {}", self.collapsed.contains(&generation));
		self.rebuild();
		true
	}

	/// Rendered and collapsed generations, top to bottom.
	pub fn generation_toggles(&self) -> Vec<GenerationToggle> {
		if !self.view.mode.is_generation_banded() || self.graph.is_empty() {
			return Vec::new();
		}
		let mut generations = self.graph.generations();
		generations.extend(self.collapsed.iter().copied());
		generations
			.into_iter()
			.filter(|&g| g != 0)
			.map(|generation| GenerationToggle {
				generation,
				label: generation_label(generation),
				collapsed: self.collapsed.contains(&generation),
			})
			.collect()
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn graph_to_screen(&self, gx: f64, gy: f64) -> (f64, f64) {
		(
			gx * self.transform.k + self.transform.x,
			gy * self.transform.k + self.transform.y,
		)
	}

	pub fn hit_at(&self, sx: f64, sy: f64) -> Option<Hit> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.scene.hit_test(gx, gy)
	}

	fn node_at_position(&self, sx: f64, sy: f64) -> Option<NodeIdx> {
		match self.hit_at(sx, sy)? {
			Hit::Node(idx) => Some(idx),
			_ => None,
		}
	}

	/// Centers the scene and shrinks it to fit, never enlarging past 1:1.
	pub fn fit_to_view(&mut self) {
		let bounds = self.scene.bounds;
		if bounds.w <= 0.0 || bounds.h <= 0.0 || self.width <= 0.0 || self.height <= 0.0 {
			return;
		}
		let k = (self.width / bounds.w)
			.min(self.height / bounds.h)
			.clamp(MIN_ZOOM, 1.0);
		let (cx, cy) = bounds.center();
		self.transform = ViewTransform {
			x: self.width / 2.0 - cx * k,
			y: self.height / 2.0 - cy * k,
			k,
		};
		self.dirty = true;
	}

	fn interact(&mut self) {
		if self.phase == ViewPhase::Built {
			self.phase = ViewPhase::Interactive;
		}
		self.dirty = true;
	}

	pub fn pointer_down(&mut self, x: f64, y: f64) {
		if self.graph.is_empty() {
			return;
		}
		self.interact();
		self.press_moved = false;
		if let Some(idx) = self.node_at_position(x, y) {
			self.drag = DragState {
				active: true,
				node_idx: Some(idx),
				start_x: x,
				start_y: y,
				node_start_x: self.graph.nodes[idx].x,
				node_start_y: self.graph.nodes[idx].y,
			};
		} else {
			self.pan = PanState {
				active: true,
				start_x: x,
				start_y: y,
				transform_start_x: self.transform.x,
				transform_start_y: self.transform.y,
			};
		}
	}

	pub fn pointer_move(&mut self, x: f64, y: f64) {
		if !self.drag.active {
			let hovered = self.node_at_position(x, y);
			self.set_hover(hovered);
		}

		if self.drag.active {
			let Some(idx) = self.drag.node_idx else {
				return;
			};
			if (x - self.drag.start_x).hypot(y - self.drag.start_y) < CLICK_SLOP && !self.press_moved {
				return;
			}
			self.press_moved = true;
			let (dx, dy) = (
				(x - self.drag.start_x) / self.transform.k,
				(y - self.drag.start_y) / self.transform.k,
			);
			self.graph.nodes[idx].x = self.drag.node_start_x + dx;
			self.graph.nodes[idx].y = self.drag.node_start_y + dy;
			self.scene.move_node(&self.graph, idx);
			self.dirty = true;
		} else if self.pan.active {
			if (x - self.pan.start_x).hypot(y - self.pan.start_y) >= CLICK_SLOP {
				self.press_moved = true;
			}
			self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
			self.dirty = true;
		}
	}

	/// Ends a press; a press that barely moved is handled as a click.
	pub fn pointer_up(&mut self, x: f64, y: f64) -> Option<TreeEvent> {
		let was_pressed = self.drag.active || self.pan.active;
		let clicked = was_pressed && !self.press_moved;
		self.drag = DragState::default();
		self.pan.active = false;
		self.press_moved = false;
		if clicked { self.click(x, y) } else { None }
	}

	pub fn pointer_leave(&mut self) {
		self.drag = DragState::default();
		self.pan.active = false;
		self.press_moved = false;
		self.set_hover(None);
	}

	pub fn click(&mut self, x: f64, y: f64) -> Option<TreeEvent> {
		self.dirty = true;
		let Some(hit) = self.hit_at(x, y) else {
			self.open_links = None;
			self.select(None);
			return None;
		};
		match hit {
			Hit::Node(idx) => {
				self.open_links = None;
				self.select(Some(idx));
				Some(TreeEvent::PersonSelected(self.graph.nodes[idx].id.clone()))
			}
			Hit::Badge(idx) => {
				self.open_links = if self.open_links == Some(idx) { None } else { Some(idx) };
				None
			}
			Hit::Action(idx, action) => {
				let id = self.graph.nodes[idx].id.clone();
				Some(match action {
					Action::AddRelative(direction) => TreeEvent::AddRelationshipRequested(id, direction),
					Action::FindRelationship => TreeEvent::FindRelationshipRequested(id),
				})
			}
		}
	}

	/// Recenters the view on the person under the pointer.
	pub fn double_click(&mut self, x: f64, y: f64) -> Option<TreeEvent> {
		let idx = self.node_at_position(x, y)?;
		let (cx, cy) = self.scene.boxes[idx].rect.center();
		self.transform.x = self.width / 2.0 - cx * self.transform.k;
		self.transform.y = self.height / 2.0 - cy * self.transform.k;
		self.interact();
		Some(TreeEvent::PersonDoubleClicked(self.graph.nodes[idx].id.clone()))
	}

	pub fn select(&mut self, node: Option<NodeIdx>) {
		self.selected = node;
		self.scene.select(node);
		self.dirty = true;
	}

	/// Zooms around the pointer.
	pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) {
		self.zoom_by(x, y, if delta_y > 0.0 { 0.9 } else { 1.1 });
	}

	/// Scales the view around a fixed screen point; pinch gestures feed the
	/// ratio of finger distances here.
	pub fn zoom_by(&mut self, x: f64, y: f64, factor: f64) {
		if !factor.is_finite() || factor <= 0.0 {
			return;
		}
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
		self.interact();
	}

	pub fn set_hover(&mut self, node: Option<NodeIdx>) {
		if self.hover.node == node {
			return;
		}
		self.hover.node = node;
		self.hover.neighbors = node
			.map(|idx| self.graph.neighbors(idx).collect())
			.unwrap_or_default();
		self.dirty = true;
	}

	pub fn is_highlighted(&self, idx: NodeIdx) -> bool {
		self.hover.node == Some(idx) || self.hover.neighbors.contains(&idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some()
	}

	pub fn link_popover(&self) -> Option<LinkPopover> {
		let idx = self.open_links?;
		let node = self.graph.nodes.get(idx)?;
		let rect = self.scene.boxes.get(idx)?.rect;
		let (screen_x, screen_y) = self.graph_to_screen(rect.right(), rect.top());
		Some(LinkPopover {
			person_name: node.display_name(self.view.language).to_string(),
			links: node.cross_tree_links.clone(),
			screen_x,
			screen_y,
		})
	}

	/// Follows a link from the open popover.
	pub fn follow_link(&mut self, link_id: &str) -> Option<TreeEvent> {
		let idx = self.open_links.take()?;
		self.dirty = true;
		self.graph.nodes[idx]
			.cross_tree_links
			.iter()
			.find(|link| link.link_id == link_id)
			.map(|link| TreeEvent::CrossTreeLinkClicked(link.link_id.clone()))
	}

	/// The timeline axis spans the canvas, so that view is re-projected.
	pub fn resize(&mut self, width: f64, height: f64) {
		let width_changed = width != self.width;
		self.width = width;
		self.height = height;
		self.dirty = true;
		if width_changed && self.view.mode == ViewMode::Timeline {
			self.rebuild();
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::components::family_tree::config::ViewMode;

	fn family() -> PersonTreeNode {
		serde_json::from_value(json!({
			"id": "root",
			"parents": [{ "id": "dad", "parents": [{ "id": "grandpa" }] }, { "id": "mom" }],
			"children": [{
				"id": "kid",
				"crossTreeLinks": [{ "linkId": "l1", "linkType": "Same", "targetPersonId": "other" }]
			}]
		}))
		.unwrap()
	}

	fn loaded(mode: ViewMode) -> FamilyTreeState {
		let mut state = FamilyTreeState::new(LayoutConfig::default(), 1000.0, 800.0);
		state.current_year = 2024;
		state.load(
			family(),
			ViewConfig {
				mode,
				..ViewConfig::default()
			},
		);
		state
	}

	fn screen_center(state: &FamilyTreeState, idx: NodeIdx) -> (f64, f64) {
		let (cx, cy) = state.scene.boxes[idx].rect.center();
		state.graph_to_screen(cx, cy)
	}

	#[test]
	fn test_phase_transitions() {
		let mut state = FamilyTreeState::new(LayoutConfig::default(), 1000.0, 800.0);
		assert_eq!(state.phase, ViewPhase::Idle);
		state.begin_loading();
		assert_eq!(state.phase, ViewPhase::Loading);
		state.load(family(), ViewConfig::default());
		assert_eq!(state.phase, ViewPhase::Built);
		state.wheel(500.0, 400.0, -1.0);
		assert_eq!(state.phase, ViewPhase::Interactive);
		state.set_view(ViewConfig {
			mode: ViewMode::Hourglass,
			..ViewConfig::default()
		});
		assert_eq!(state.phase, ViewPhase::Built);
		assert!(state.graph.index_of("kid").is_some());
	}

	#[test]
	fn test_click_selects_and_emits() {
		let mut state = loaded(ViewMode::Hourglass);
		let dad = state.graph.index_of("dad").unwrap();
		let (sx, sy) = screen_center(&state, dad);
		state.pointer_down(sx, sy);
		let event = state.pointer_up(sx, sy);
		assert_eq!(event, Some(TreeEvent::PersonSelected("dad".into())));
		assert_eq!(state.selected, Some(dad));
		assert_eq!(state.scene.affordances.len(), 4);
	}

	#[test]
	fn test_affordance_click_requests_relationship() {
		let mut state = loaded(ViewMode::Hourglass);
		state.select(Some(0));
		let parent = state.scene.affordances[0];
		let (sx, sy) = {
			let (cx, cy) = parent.rect.center();
			state.graph_to_screen(cx, cy)
		};
		assert_eq!(
			state.click(sx, sy),
			Some(TreeEvent::AddRelationshipRequested(
				"root".into(),
				RelationshipDirection::Parent
			))
		);
		let find = state.scene.affordances[3];
		let (cx, cy) = find.rect.center();
		let (sx, sy) = state.graph_to_screen(cx, cy);
		assert_eq!(state.click(sx, sy), Some(TreeEvent::FindRelationshipRequested("root".into())));
	}

	#[test]
	fn test_double_click_reports_person() {
		let mut state = loaded(ViewMode::Hourglass);
		let dad = state.graph.index_of("dad").unwrap();
		let (sx, sy) = screen_center(&state, dad);
		assert_eq!(state.double_click(sx, sy), Some(TreeEvent::PersonDoubleClicked("dad".into())));
		let (cx, cy) = screen_center(&state, dad);
		assert!((cx - 500.0).abs() < 1e-9 && (cy - 400.0).abs() < 1e-9);
		assert_eq!(state.double_click(-5000.0, -5000.0), None);
	}

	#[test]
	fn test_drag_moves_only_dragged_node() {
		let mut state = loaded(ViewMode::Hourglass);
		let kid = state.graph.index_of("kid").unwrap();
		let before: Vec<(f64, f64)> = state.graph.nodes.iter().map(|n| (n.x, n.y)).collect();
		let (sx, sy) = screen_center(&state, kid);
		state.pointer_down(sx, sy);
		state.pointer_move(sx + 40.0, sy + 20.0);
		assert_eq!(state.pointer_up(sx + 40.0, sy + 20.0), None);

		let k = state.transform.k;
		for (idx, node) in state.graph.nodes.iter().enumerate() {
			if idx == kid {
				assert!((node.x - (before[idx].0 + 40.0 / k)).abs() < 1e-9);
				assert!((node.y - (before[idx].1 + 20.0 / k)).abs() < 1e-9);
			} else {
				assert_eq!((node.x, node.y), before[idx]);
			}
		}
		assert_eq!(state.selected, None);
	}

	#[test]
	fn test_pan_and_zoom_leave_coordinates_alone() {
		let mut state = loaded(ViewMode::Pedigree);
		let before: Vec<(f64, f64)> = state.graph.nodes.iter().map(|n| (n.x, n.y)).collect();
		let tx = state.transform.x;
		state.pointer_down(-900.0, -900.0);
		state.pointer_move(-850.0, -900.0);
		state.pointer_up(-850.0, -900.0);
		assert_eq!(state.transform.x, tx + 50.0);

		state.wheel(100.0, 100.0, 1.0);
		for _ in 0..100 {
			state.wheel(100.0, 100.0, 1.0);
		}
		assert_eq!(state.transform.k, MIN_ZOOM);
		let after: Vec<(f64, f64)> = state.graph.nodes.iter().map(|n| (n.x, n.y)).collect();
		assert_eq!(before, after);
	}

	#[test]
	fn test_rebuild_discards_drag_offsets() {
		let mut state = loaded(ViewMode::Hourglass);
		let kid = state.graph.index_of("kid").unwrap();
		let original = state.graph.nodes[kid].x;
		let (sx, sy) = screen_center(&state, kid);
		state.pointer_down(sx, sy);
		state.pointer_move(sx + 100.0, sy);
		state.pointer_up(sx + 100.0, sy);
		assert_ne!(state.graph.nodes[kid].x, original);

		state.set_view(state.view.clone());
		let kid = state.graph.index_of("kid").unwrap();
		assert_eq!(state.graph.nodes[kid].x, original);
	}

	#[test]
	fn test_generation_collapse_round_trip() {
		let mut state = loaded(ViewMode::Pedigree);
		assert_eq!(state.graph.nodes.len(), 4);
		assert!(!state.toggle_generation(0));

		assert!(state.toggle_generation(-1));
		assert_eq!(state.graph.nodes.len(), 1);
		let toggles = state.generation_toggles();
		assert_eq!(
			toggles,
			vec![GenerationToggle {
				generation: -1,
				label: "Parents".into(),
				collapsed: true
			}]
		);

		assert!(state.toggle_generation(-1));
		assert_eq!(state.graph.nodes.len(), 4);
		assert!(state.generation_toggles().iter().all(|t| !t.collapsed));
	}

	#[test]
	fn test_collapse_ignored_in_descendants_view() {
		let mut state = loaded(ViewMode::Descendants);
		assert!(!state.toggle_generation(1));
		assert!(state.generation_toggles().is_empty());
	}

	#[test]
	fn test_cross_tree_badge_popover() {
		let mut state = loaded(ViewMode::Hourglass);
		let badge = state.scene.badges[0];
		let (sx, sy) = state.graph_to_screen(badge.center.0, badge.center.1);
		assert_eq!(state.click(sx, sy), None);
		let popover = state.link_popover().unwrap();
		assert_eq!(popover.links.len(), 1);
		assert_eq!(state.follow_link("nope"), None);

		state.click(sx, sy);
		assert_eq!(
			state.follow_link("l1"),
			Some(TreeEvent::CrossTreeLinkClicked("l1".into()))
		);
		assert!(state.link_popover().is_none());
	}

	#[test]
	fn test_hover_highlights_neighbors() {
		let mut state = loaded(ViewMode::Pedigree);
		let dad = state.graph.index_of("dad").unwrap();
		let grandpa = state.graph.index_of("grandpa").unwrap();
		let mom = state.graph.index_of("mom").unwrap();
		let (sx, sy) = screen_center(&state, dad);
		state.pointer_move(sx, sy);
		assert!(state.is_highlighted(dad));
		assert!(state.is_highlighted(grandpa));
		assert!(state.is_highlighted(0));
		assert!(!state.is_highlighted(mom));
		state.pointer_leave();
		assert!(!state.has_active_highlight());
	}

	#[test]
	fn test_fit_to_view_centers_scene() {
		let state = loaded(ViewMode::Hourglass);
		let (cx, cy) = state.scene.bounds.center();
		let (sx, sy) = state.graph_to_screen(cx, cy);
		assert!((sx - 500.0).abs() < 1e-9);
		assert!((sy - 400.0).abs() < 1e-9);
		assert!(state.transform.k <= 1.0);
	}

	#[test]
	fn test_zoom_keeps_anchor_point_fixed() {
		let mut state = loaded(ViewMode::Pedigree);
		let anchor = state.screen_to_graph(320.0, 240.0);
		state.zoom_by(320.0, 240.0, 1.8);
		let (sx, sy) = state.graph_to_screen(anchor.0, anchor.1);
		assert!((sx - 320.0).abs() < 1e-9 && (sy - 240.0).abs() < 1e-9);

		let k = state.transform.k;
		state.zoom_by(320.0, 240.0, 0.0);
		assert_eq!(state.transform.k, k);
		state.zoom_by(0.0, 0.0, 1e6);
		assert_eq!(state.transform.k, MAX_ZOOM);
	}

	#[test]
	fn test_timeline_axis_spans_canvas_width() {
		let mut state = loaded(ViewMode::Timeline);
		let axis_width = |state: &FamilyTreeState| match &state.layout {
			Layout::Timeline(timeline) => timeline.scale.width,
			Layout::Structural { .. } => panic!("expected a timeline layout"),
		};
		let room = state.geometry.timeline_label_room;
		assert_eq!(axis_width(&state), 1000.0 - room);

		state.resize(1400.0, 800.0);
		assert_eq!(axis_width(&state), 1400.0 - room);
		assert_eq!(state.phase, ViewPhase::Built);
	}

	#[test]
	fn test_view_before_payload_sets_avatar_concurrency() {
		let mut state = FamilyTreeState::new(LayoutConfig::default(), 1000.0, 800.0);
		state.set_view(ViewConfig {
			avatar_concurrency: 3,
			..ViewConfig::default()
		});
		assert_eq!(state.avatars.max_in_flight(), 3);
		assert_eq!(state.view.avatar_concurrency, 3);
	}
}
