use std::collections::HashMap;
use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use super::palette;
use super::scene::{Affordance, Band, Connector, ConnectorShape, LinkBadge, NodeBox, Rect};
use super::state::FamilyTreeState;

const CORNER_RADIUS: f64 = 8.0;
const AVATAR_RADIUS: f64 = 18.0;
const DIMMED_ALPHA: f64 = 0.3;

/// Loaded avatar images keyed by media id.
pub type AvatarImages = HashMap<String, HtmlImageElement>;

pub fn render(state: &FamilyTreeState, images: &AvatarImages, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(palette::BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);

	let k = state.transform.k;
	for band in &state.scene.bands {
		draw_band(band, k, ctx);
	}
	if let Some(axis) = &state.scene.axis {
		ctx.set_stroke_style_str("rgba(0, 0, 0, 0.12)");
		ctx.set_line_width(1.0 / k);
		ctx.set_fill_style_str(palette::TEXT);
		ctx.set_font(&format!("{}px sans-serif", 11.0 / k.max(0.5)));
		ctx.set_text_align("center");
		ctx.set_text_baseline("bottom");
		for &(year, x) in &axis.ticks {
			ctx.begin_path();
			ctx.move_to(x, axis.top);
			ctx.line_to(x, axis.bottom);
			ctx.stroke();
			let _ = ctx.fill_text(&year.to_string(), x, axis.top - 4.0);
		}
	}
	for connector in &state.scene.connectors {
		draw_connector(state, connector, ctx);
	}
	let timeline = state.scene.axis.is_some();
	for node_box in &state.scene.boxes {
		draw_node(state, node_box, images, timeline, ctx);
	}
	for badge in &state.scene.badges {
		draw_badge(badge, k, ctx);
	}
	for affordance in &state.scene.affordances {
		draw_affordance(affordance, k, ctx);
	}
	ctx.restore();
}

fn draw_band(band: &Band, k: f64, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(&band.fill);
	ctx.fill_rect(band.rect.x, band.rect.y, band.rect.w, band.rect.h);
	ctx.set_fill_style_str("rgba(0, 0, 0, 0.45)");
	ctx.set_font(&format!("{}px sans-serif", 12.0 / k.max(0.5)));
	ctx.set_text_align("left");
	ctx.set_text_baseline("top");
	let _ = ctx.fill_text(&band.label, band.rect.x + 8.0, band.rect.y + 6.0);
}

fn draw_connector(state: &FamilyTreeState, connector: &Connector, ctx: &CanvasRenderingContext2d) {
	let edge = &state.graph.edges[connector.edge];
	let k = state.transform.k;
	let alpha = if !state.has_active_highlight()
		|| (state.is_highlighted(edge.from) && state.is_highlighted(edge.to))
	{
		1.0
	} else {
		DIMMED_ALPHA
	};
	ctx.set_global_alpha(alpha);
	ctx.begin_path();
	match connector.shape {
		ConnectorShape::Curve { from, c1, c2, to } => {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
			ctx.set_stroke_style_str(palette::EDGE);
			ctx.set_line_width(1.5 / k.max(0.5));
			ctx.move_to(from.0, from.1);
			ctx.bezier_curve_to(c1.0, c1.1, c2.0, c2.1, to.0, to.1);
		}
		ConnectorShape::Dashed { from, to } => {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(6.0),
				&JsValue::from_f64(4.0),
			));
			ctx.set_stroke_style_str(palette::SPOUSE_EDGE);
			ctx.set_line_width(2.0 / k.max(0.5));
			ctx.move_to(from.0, from.1);
			ctx.line_to(to.0, to.1);
		}
	}
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
	ctx.set_global_alpha(1.0);
}

fn rounded_rect(rect: &Rect, radius: f64, ctx: &CanvasRenderingContext2d) {
	let r = radius.min(rect.w / 2.0).min(rect.h / 2.0);
	ctx.begin_path();
	ctx.move_to(rect.left() + r, rect.top());
	let _ = ctx.arc_to(rect.right(), rect.top(), rect.right(), rect.bottom(), r);
	let _ = ctx.arc_to(rect.right(), rect.bottom(), rect.left(), rect.bottom(), r);
	let _ = ctx.arc_to(rect.left(), rect.bottom(), rect.left(), rect.top(), r);
	let _ = ctx.arc_to(rect.left(), rect.top(), rect.right(), rect.top(), r);
	ctx.close_path();
}

/// Trims `text` with an ellipsis until it fits `max_width`.
fn fit_text(text: &str, max_width: f64, ctx: &CanvasRenderingContext2d) -> String {
	let width = |s: &str| ctx.measure_text(s).map(|m| m.width()).unwrap_or(0.0);
	if width(text) <= max_width {
		return text.to_string();
	}
	let mut chars: Vec<char> = text.chars().collect();
	while !chars.is_empty() {
		chars.pop();
		let candidate: String = chars.iter().chain(std::iter::once(&'…')).collect();
		if width(&candidate) <= max_width {
			return candidate;
		}
	}
	String::new()
}

fn draw_node(
	state: &FamilyTreeState,
	node_box: &NodeBox,
	images: &AvatarImages,
	timeline: bool,
	ctx: &CanvasRenderingContext2d,
) {
	let k = state.transform.k;
	let rect = node_box.rect;
	let dimmed = state.has_active_highlight() && !state.is_highlighted(node_box.node);
	ctx.set_global_alpha(if dimmed { DIMMED_ALPHA } else { 1.0 });

	rounded_rect(&rect, if timeline { 3.0 } else { CORNER_RADIUS }, ctx);
	ctx.set_fill_style_str(node_box.fill);
	ctx.fill();
	let selected = state.selected == Some(node_box.node);
	if selected || node_box.is_focal {
		ctx.set_stroke_style_str(palette::SELECTED);
		let width = if selected { 3.0 } else { 1.5 };
		ctx.set_line_width(width / k.max(0.5));
		ctx.stroke();
	}

	if timeline {
		// label sits to the right of the lifespan bar
		ctx.set_fill_style_str(palette::TEXT);
		ctx.set_font(&format!("{}px sans-serif", 11.0 / k.max(0.5)));
		ctx.set_text_align("left");
		ctx.set_text_baseline("middle");
		let text = format!("{}  {}", node_box.label, node_box.caption);
		let _ = ctx.fill_text(&text, rect.right() + 6.0, rect.center().1);
		ctx.set_global_alpha(1.0);
		return;
	}

	let (avatar_x, avatar_y) = (rect.left() + 10.0 + AVATAR_RADIUS, rect.center().1);
	draw_avatar(node_box, images, avatar_x, avatar_y, ctx);

	let text_left = avatar_x + AVATAR_RADIUS + 8.0;
	let text_width = rect.right() - 8.0 - text_left;
	ctx.set_fill_style_str(palette::TEXT);
	ctx.set_text_align("left");
	ctx.set_text_baseline("middle");
	ctx.set_font("bold 13px sans-serif");
	let label = fit_text(&node_box.label, text_width, ctx);
	let _ = ctx.fill_text(&label, text_left, rect.center().1 - 9.0);
	if !node_box.caption.is_empty() {
		ctx.set_font("11px sans-serif");
		let _ = ctx.fill_text(&node_box.caption, text_left, rect.center().1 + 10.0);
	}
	ctx.set_global_alpha(1.0);
}

// Initials are drawn until the image has actually decoded.
fn draw_avatar(
	node_box: &NodeBox,
	images: &AvatarImages,
	x: f64,
	y: f64,
	ctx: &CanvasRenderingContext2d,
) {
	let image = node_box
		.avatar_media_id
		.as_ref()
		.and_then(|media_id| images.get(media_id))
		.filter(|img| img.complete() && img.natural_width() > 0);

	ctx.begin_path();
	let _ = ctx.arc(x, y, AVATAR_RADIUS, 0.0, 2.0 * PI);
	match image {
		Some(img) => {
			ctx.save();
			ctx.clip();
			let d = AVATAR_RADIUS * 2.0;
			let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
				img,
				x - AVATAR_RADIUS,
				y - AVATAR_RADIUS,
				d,
				d,
			);
			ctx.restore();
		}
		None => {
			ctx.set_fill_style_str("rgba(255, 255, 255, 0.75)");
			ctx.fill();
			ctx.set_fill_style_str(palette::TEXT);
			ctx.set_font("bold 13px sans-serif");
			ctx.set_text_align("center");
			ctx.set_text_baseline("middle");
			let _ = ctx.fill_text(&node_box.initials, x, y);
		}
	}
}

fn draw_badge(badge: &LinkBadge, k: f64, ctx: &CanvasRenderingContext2d) {
	ctx.begin_path();
	let _ = ctx.arc(badge.center.0, badge.center.1, badge.radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(palette::BADGE);
	ctx.fill();
	ctx.set_stroke_style_str("white");
	ctx.set_line_width(1.5 / k.max(0.5));
	ctx.stroke();
	ctx.set_fill_style_str("white");
	ctx.set_font("bold 10px sans-serif");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let _ = ctx.fill_text(&badge.count.to_string(), badge.center.0, badge.center.1);
}

fn draw_affordance(affordance: &Affordance, k: f64, ctx: &CanvasRenderingContext2d) {
	let (cx, cy) = affordance.rect.center();
	ctx.begin_path();
	let _ = ctx.arc(cx, cy, affordance.rect.w / 2.0, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(palette::AFFORDANCE);
	ctx.fill();
	ctx.set_fill_style_str("white");
	ctx.set_font(&format!("bold {}px sans-serif", 14.0 / k.max(1.0)));
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let _ = ctx.fill_text(affordance.glyph, cx, cy);
}
