//! Drawable primitives for a laid-out graph, in world coordinates.
//!
//! A [`Scene`] is recomposed on every rebuild. While dragging, only the moved
//! node's box and its incident connectors are refreshed via
//! [`Scene::move_node`].

use super::config::{LayoutConfig, ViewConfig};
use super::layout::Layout;
use super::palette;
use super::types::{Edge, EdgeKind, FamilyGraph, NodeIdx, PersonNode, initials};

pub type Point = (f64, f64);

const BOUNDS_PADDING: f64 = 40.0;
const BADGE_RADIUS: f64 = 9.0;
const AFFORDANCE_SIZE: f64 = 20.0;
const AFFORDANCE_GAP: f64 = 4.0;
const MIN_BAR_WIDTH: f64 = 6.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub w: f64,
	pub h: f64,
}

impl Rect {
	pub fn centered(cx: f64, cy: f64, w: f64, h: f64) -> Self {
		Self {
			x: cx - w / 2.0,
			y: cy - h / 2.0,
			w,
			h,
		}
	}

	pub fn left(&self) -> f64 {
		self.x
	}

	pub fn right(&self) -> f64 {
		self.x + self.w
	}

	pub fn top(&self) -> f64 {
		self.y
	}

	pub fn bottom(&self) -> f64 {
		self.y + self.h
	}

	pub fn center(&self) -> Point {
		(self.x + self.w / 2.0, self.y + self.h / 2.0)
	}

	pub fn contains(&self, px: f64, py: f64) -> bool {
		px >= self.left() && px <= self.right() && py >= self.top() && py <= self.bottom()
	}

	pub fn union(&self, other: &Rect) -> Rect {
		let (x, y) = (self.x.min(other.x), self.y.min(other.y));
		Rect {
			x,
			y,
			w: self.right().max(other.right()) - x,
			h: self.bottom().max(other.bottom()) - y,
		}
	}

	pub fn inflate(&self, by: f64) -> Rect {
		Rect {
			x: self.x - by,
			y: self.y - by,
			w: self.w + 2.0 * by,
			h: self.h + 2.0 * by,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConnectorShape {
	/// Vertical cubic from the parent's bottom-center to the child's top-center.
	Curve {
		from: Point,
		c1: Point,
		c2: Point,
		to: Point,
	},
	/// Horizontal dashed line between facing box edges.
	Dashed { from: Point, to: Point },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Connector {
	/// Index into [`FamilyGraph::edges`].
	pub edge: usize,
	pub shape: ConnectorShape,
}

impl Connector {
	fn between(edge_idx: usize, edge: &Edge, boxes: &[NodeBox]) -> Self {
		let (a, b) = (boxes[edge.from].rect, boxes[edge.to].rect);
		let shape = match edge.kind {
			EdgeKind::ParentChild => {
				let from = (a.center().0, a.bottom());
				let to = (b.center().0, b.top());
				let mid_y = (from.1 + to.1) / 2.0;
				ConnectorShape::Curve {
					from,
					c1: (from.0, mid_y),
					c2: (to.0, mid_y),
					to,
				}
			}
			EdgeKind::Spouse => {
				let (left, right) = if a.center().0 <= b.center().0 { (a, b) } else { (b, a) };
				ConnectorShape::Dashed {
					from: (left.right(), left.center().1),
					to: (right.left(), right.center().1),
				}
			}
		};
		Self {
			edge: edge_idx,
			shape,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeBox {
	pub node: NodeIdx,
	pub rect: Rect,
	pub fill: &'static str,
	pub label: String,
	pub caption: String,
	pub initials: String,
	pub avatar_media_id: Option<String>,
	pub is_focal: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Band {
	pub generation: i32,
	pub label: String,
	pub rect: Rect,
	pub fill: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkBadge {
	pub node: NodeIdx,
	pub center: Point,
	pub radius: f64,
	pub count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationshipDirection {
	Parent,
	Child,
	Spouse,
}

impl RelationshipDirection {
	pub fn as_str(&self) -> &'static str {
		match self {
			RelationshipDirection::Parent => "parent",
			RelationshipDirection::Child => "child",
			RelationshipDirection::Spouse => "spouse",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
	AddRelative(RelationshipDirection),
	FindRelationship,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affordance {
	pub node: NodeIdx,
	pub action: Action,
	pub rect: Rect,
	pub glyph: &'static str,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Axis {
	/// `(year, x)` decade marks.
	pub ticks: Vec<(i32, f64)>,
	pub top: f64,
	pub bottom: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hit {
	Node(NodeIdx),
	Badge(NodeIdx),
	Action(NodeIdx, Action),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
	/// One box per graph node, indexed by [`NodeIdx`].
	pub boxes: Vec<NodeBox>,
	pub connectors: Vec<Connector>,
	pub bands: Vec<Band>,
	pub badges: Vec<LinkBadge>,
	pub affordances: Vec<Affordance>,
	pub axis: Option<Axis>,
	pub bounds: Rect,
}

/// Band title relative to the focal person.
pub fn generation_label(generation: i32) -> String {
	let (noun, depth) = match generation {
		0 => return "Focal generation".to_string(),
		g if g < 0 => ("grandparents", g.unsigned_abs()),
		g => ("grandchildren", g.unsigned_abs()),
	};
	match depth {
		1 if generation < 0 => "Parents".to_string(),
		1 => "Children".to_string(),
		2 => capitalize(noun),
		3 => format!("Great-{noun}"),
		n => format!("Great×{} {noun}", n - 2),
	}
}

fn capitalize(s: &str) -> String {
	let mut chars = s.chars();
	chars
		.next()
		.map(|first| first.to_uppercase().chain(chars).collect())
		.unwrap_or_default()
}

/// Recorded years only, e.g. `1921 – 1988`, `1950 –`, `? – 1901`.
pub fn years_caption(node: &PersonNode) -> String {
	match (node.birth_year, node.death_year) {
		(Some(birth), Some(death)) => format!("{birth} – {death}"),
		(Some(birth), None) if node.is_living => format!("{birth} –"),
		(Some(birth), None) => format!("{birth} – ?"),
		(None, Some(death)) => format!("? – {death}"),
		(None, None) => String::new(),
	}
}

impl Scene {
	pub fn compose(
		graph: &FamilyGraph,
		layout: &Layout,
		view: &ViewConfig,
		geometry: &LayoutConfig,
	) -> Self {
		let coloring = view.coloring();
		let boxes: Vec<NodeBox> = graph
			.nodes
			.iter()
			.enumerate()
			.map(|(idx, node)| {
				let label = node.display_name(view.language).to_string();
				let (rect, caption) = match layout {
					Layout::Timeline(timeline) => match timeline.row_for(idx) {
						Some(row) => (
							Rect::centered(
								node.x,
								node.y,
								(row.x_end - row.x_start).max(MIN_BAR_WIDTH),
								geometry.timeline_row_height * 0.7,
							),
							row.lifespan.caption(),
						),
						None => (
							Rect::centered(node.x, node.y, MIN_BAR_WIDTH, geometry.timeline_row_height * 0.7),
							String::new(),
						),
					},
					Layout::Structural { .. } => (
						Rect::centered(node.x, node.y, geometry.node_width, geometry.node_height),
						years_caption(node),
					),
				};
				NodeBox {
					node: idx,
					rect,
					fill: palette::node_fill(node, coloring),
					initials: initials(&label),
					label,
					caption,
					avatar_media_id: node.avatar_media_id.clone(),
					is_focal: idx == 0,
				}
			})
			.collect();

		let connectors = match layout {
			Layout::Timeline(_) => Vec::new(),
			Layout::Structural { .. } => graph
				.edges
				.iter()
				.enumerate()
				.map(|(i, edge)| Connector::between(i, edge, &boxes))
				.collect(),
		};

		let badges = graph
			.nodes
			.iter()
			.enumerate()
			.filter_map(|(idx, node)| badge_for(idx, node, &boxes[idx].rect))
			.collect();

		let mut scene = Scene {
			boxes,
			connectors,
			bands: Vec::new(),
			badges,
			affordances: Vec::new(),
			axis: None,
			bounds: Rect::default(),
		};
		scene.bounds = scene.box_bounds();

		if let Layout::Timeline(timeline) = layout {
			let top = scene.bounds.top() - geometry.timeline_row_height / 2.0;
			scene.axis = Some(Axis {
				ticks: timeline
					.scale
					.ticks()
					.into_iter()
					.map(|year| (year, timeline.scale.x(year as f64)))
					.collect(),
				top,
				bottom: scene.bounds.bottom(),
			});
			let (start, end) = timeline.scale.domain();
			let axis_rect = Rect {
				x: timeline.scale.x(start as f64),
				y: top,
				w: timeline.scale.x(end as f64) - timeline.scale.x(start as f64),
				h: scene.bounds.bottom() - top,
			};
			scene.bounds = scene.bounds.union(&axis_rect);
		}

		if view.mode.is_generation_banded() {
			scene.bands = scene.compose_bands(graph, layout, geometry);
		}
		scene
	}

	fn box_bounds(&self) -> Rect {
		self.boxes
			.iter()
			.map(|b| b.rect)
			.reduce(|acc, rect| acc.union(&rect))
			.unwrap_or_default()
			.inflate(BOUNDS_PADDING)
	}

	fn compose_bands(&self, graph: &FamilyGraph, layout: &Layout, geometry: &LayoutConfig) -> Vec<Band> {
		let pad = match layout {
			Layout::Timeline(_) => geometry.timeline_row_height / 4.0,
			Layout::Structural { .. } => (geometry.vertical_spacing - geometry.node_height).max(0.0) / 2.0,
		};
		graph
			.generations()
			.into_iter()
			.filter_map(|generation| {
				let (top, bottom) = self
					.boxes
					.iter()
					.filter(|b| graph.nodes[b.node].generation == generation)
					.fold(None, |span: Option<(f64, f64)>, b| {
						Some(match span {
							Some((top, bottom)) => (top.min(b.rect.top()), bottom.max(b.rect.bottom())),
							None => (b.rect.top(), b.rect.bottom()),
						})
					})?;
				Some(Band {
					generation,
					label: generation_label(generation),
					rect: Rect {
						x: self.bounds.left(),
						y: top - pad,
						w: self.bounds.w,
						h: bottom - top + 2.0 * pad,
					},
					fill: palette::band_fill(generation),
				})
			})
			.collect()
	}

	/// Shows relationship affordances around `node`, or clears them.
	pub fn select(&mut self, node: Option<NodeIdx>) {
		self.affordances = node
			.and_then(|idx| self.boxes.get(idx))
			.map(|b| affordances_for(b.node, &b.rect))
			.unwrap_or_default();
	}

	pub fn selected(&self) -> Option<NodeIdx> {
		self.affordances.first().map(|a| a.node)
	}

	/// Re-centers one box on its node and refreshes what hangs off it.
	pub fn move_node(&mut self, graph: &FamilyGraph, idx: NodeIdx) {
		let (Some(node), Some(node_box)) = (graph.nodes.get(idx), self.boxes.get_mut(idx)) else {
			return;
		};
		let rect = Rect::centered(node.x, node.y, node_box.rect.w, node_box.rect.h);
		node_box.rect = rect;

		for connector in self.connectors.iter_mut() {
			let edge = &graph.edges[connector.edge];
			if edge.touches(idx) {
				*connector = Connector::between(connector.edge, edge, &self.boxes);
			}
		}
		if let Some(badge) = self.badges.iter_mut().find(|b| b.node == idx) {
			if let Some(moved) = badge_for(idx, node, &rect) {
				*badge = moved;
			}
		}
		if self.selected() == Some(idx) {
			self.affordances = affordances_for(idx, &rect);
		}
	}

	/// Topmost primitive under a world-space point.
	pub fn hit_test(&self, x: f64, y: f64) -> Option<Hit> {
		if let Some(a) = self.affordances.iter().find(|a| a.rect.contains(x, y)) {
			return Some(Hit::Action(a.node, a.action));
		}
		if let Some(b) = self.badges.iter().rev().find(|b| {
			let (dx, dy) = (x - b.center.0, y - b.center.1);
			(dx * dx + dy * dy).sqrt() <= b.radius
		}) {
			return Some(Hit::Badge(b.node));
		}
		self.boxes
			.iter()
			.rev()
			.find(|b| b.rect.contains(x, y))
			.map(|b| Hit::Node(b.node))
	}
}

fn badge_for(idx: NodeIdx, node: &PersonNode, rect: &Rect) -> Option<LinkBadge> {
	if node.cross_tree_links.is_empty() {
		return None;
	}
	Some(LinkBadge {
		node: idx,
		center: (rect.right() - BADGE_RADIUS / 2.0, rect.top() + BADGE_RADIUS / 2.0),
		radius: BADGE_RADIUS,
		count: node.cross_tree_links.len(),
	})
}

fn affordances_for(node: NodeIdx, rect: &Rect) -> Vec<Affordance> {
	let (cx, cy) = rect.center();
	let reach = AFFORDANCE_SIZE / 2.0 + AFFORDANCE_GAP;
	let at = |x, y| Rect::centered(x, y, AFFORDANCE_SIZE, AFFORDANCE_SIZE);
	vec![
		Affordance {
			node,
			action: Action::AddRelative(RelationshipDirection::Parent),
			rect: at(cx, rect.top() - reach),
			glyph: "+",
		},
		Affordance {
			node,
			action: Action::AddRelative(RelationshipDirection::Child),
			rect: at(cx, rect.bottom() + reach),
			glyph: "+",
		},
		Affordance {
			node,
			action: Action::AddRelative(RelationshipDirection::Spouse),
			rect: at(rect.right() + reach, cy),
			glyph: "+",
		},
		Affordance {
			node,
			action: Action::FindRelationship,
			rect: at(rect.left() - reach, cy),
			glyph: "?",
		},
	]
}
