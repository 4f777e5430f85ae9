//! Timeline projection: x is calendar year, y is one row per person.
//!
//! Rows are ordered by generation, then birth year, with a half-row gap at
//! every generation boundary. Each node is centered on its lifespan bar.

use super::config::LayoutConfig;
use super::dates::Lifespan;
use super::types::{FamilyGraph, NodeIdx};

/// Linear map from years onto `[0, width]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YearScale {
	/// Decade-rounded extent of the data, before the buffer is applied.
	pub min_year: i32,
	pub max_year: i32,
	pub buffer: i32,
	pub width: f64,
}

impl YearScale {
	pub fn domain(&self) -> (i32, i32) {
		(self.min_year - self.buffer, self.max_year + self.buffer)
	}

	pub fn x(&self, year: f64) -> f64 {
		let (start, end) = self.domain();
		let span = (end - start).max(1) as f64;
		(year - start as f64) / span * self.width
	}

	/// Decade marks inside the rounded data extent.
	pub fn ticks(&self) -> Vec<i32> {
		(self.min_year..=self.max_year).step_by(10).collect()
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineRow {
	pub node: NodeIdx,
	pub generation: i32,
	pub lifespan: Lifespan,
	/// Row center.
	pub y: f64,
	pub x_start: f64,
	pub x_end: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimelineLayout {
	pub scale: YearScale,
	pub rows: Vec<TimelineRow>,
}

impl TimelineLayout {
	pub fn row_for(&self, node: NodeIdx) -> Option<&TimelineRow> {
		self.rows.iter().find(|row| row.node == node)
	}
}

fn floor_decade(year: i32) -> i32 {
	year.div_euclid(10) * 10
}

fn ceil_decade(year: i32) -> i32 {
	-floor_decade(-year)
}

/// Earliest birth and latest end year, rounded outward to whole decades.
pub fn year_range(lifespans: &[Lifespan], current_year: i32) -> (i32, i32) {
	let min = lifespans.iter().map(|span| span.birth_year).min();
	let max = lifespans.iter().map(|span| span.end_year).max();
	match (min, max) {
		(Some(min), Some(max)) => (floor_decade(min), ceil_decade(max)),
		_ => (floor_decade(current_year), ceil_decade(current_year)),
	}
}

pub fn lifespans(graph: &FamilyGraph, geometry: &LayoutConfig, current_year: i32) -> Vec<Lifespan> {
	graph
		.nodes
		.iter()
		.map(|node| {
			Lifespan::resolve(
				node.birth_year,
				node.death_year,
				node.is_living,
				current_year,
				geometry,
			)
		})
		.collect()
}

pub fn project(graph: &mut FamilyGraph, geometry: &LayoutConfig, current_year: i32) -> TimelineLayout {
	let spans = lifespans(graph, geometry, current_year);
	let (min_year, max_year) = year_range(&spans, current_year);
	let scale = YearScale {
		min_year,
		max_year,
		buffer: geometry.timeline_year_buffer,
		width: geometry.timeline_width,
	};

	let mut order: Vec<NodeIdx> = (0..graph.nodes.len()).collect();
	order.sort_by_key(|&idx| (graph.nodes[idx].generation, spans[idx].birth_year, idx));

	let row_height = geometry.timeline_row_height;
	let mut rows = Vec::with_capacity(order.len());
	let mut offset = row_height / 2.0;
	let mut previous = None;
	for (slot, idx) in order.into_iter().enumerate() {
		let generation = graph.nodes[idx].generation;
		if previous.is_some_and(|prev| prev != generation) {
			offset += row_height / 2.0;
		}
		previous = Some(generation);

		let span = spans[idx];
		let row = TimelineRow {
			node: idx,
			generation,
			lifespan: span,
			y: offset + slot as f64 * row_height,
			x_start: scale.x(span.birth_year as f64),
			x_end: scale.x(span.end_year as f64),
		};
		graph.nodes[idx].x = (row.x_start + row.x_end) / 2.0;
		graph.nodes[idx].y = row.y;
		rows.push(row);
	}

	TimelineLayout { scale, rows }
}
