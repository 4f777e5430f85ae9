use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, MouseEvent, TouchEvent, TouchList,
	WheelEvent, Window,
};

use super::avatar::{AvatarResolver, AvatarUpdate};
use super::config::{LayoutConfig, ViewConfig};
use super::error::FamilyTreeError;
use super::render::{self, AvatarImages};
use super::scene::RelationshipDirection;
use super::state::{FamilyTreeState, GenerationToggle, LinkPopover, TreeEvent, ViewPhase};
use super::types::PersonTreeNode;

type SharedState = Rc<RefCell<Option<FamilyTreeState>>>;
type SharedImages = Rc<RefCell<AvatarImages>>;

#[derive(Clone, Copy, Default)]
struct TreeCallbacks {
	on_person_selected: Option<Callback<String>>,
	on_person_double_clicked: Option<Callback<String>>,
	on_cross_tree_link_clicked: Option<Callback<String>>,
	on_find_relationship: Option<Callback<String>>,
	on_add_relationship: Option<Callback<(String, RelationshipDirection)>>,
}

impl TreeCallbacks {
	fn emit(&self, event: TreeEvent) {
		debug!("tree event {event:?}");
		match event {
			TreeEvent::PersonSelected(id) => {
				if let Some(cb) = self.on_person_selected {
					cb.run(id);
				}
			}
			TreeEvent::PersonDoubleClicked(id) => {
				if let Some(cb) = self.on_person_double_clicked {
					cb.run(id);
				}
			}
			TreeEvent::CrossTreeLinkClicked(link_id) => {
				if let Some(cb) = self.on_cross_tree_link_clicked {
					cb.run(link_id);
				}
			}
			TreeEvent::FindRelationshipRequested(id) => {
				if let Some(cb) = self.on_find_relationship {
					cb.run(id);
				}
			}
			TreeEvent::AddRelationshipRequested(id, direction) => {
				if let Some(cb) = self.on_add_relationship {
					cb.run((id, direction));
				}
			}
		}
	}
}

/// Reactive mirrors of the state the DOM overlays need.
#[derive(Clone, Copy)]
struct UiSignals {
	phase: RwSignal<ViewPhase>,
	toggles: RwSignal<Vec<GenerationToggle>>,
	popover: RwSignal<Option<LinkPopover>>,
}

impl UiSignals {
	fn publish(&self, state: &FamilyTreeState) {
		self.phase.set(state.phase);
		self.toggles.set(state.generation_toggles());
		self.publish_popover(state);
	}

	fn publish_popover(&self, state: &FamilyTreeState) {
		self.popover.set(state.link_popover());
	}
}

fn window_size(window: &Window) -> (f64, f64) {
	(
		window
			.inner_width()
			.ok()
			.and_then(|w| w.as_f64())
			.unwrap_or(800.0),
		window
			.inner_height()
			.ok()
			.and_then(|h| h.as_f64())
			.unwrap_or(600.0),
	)
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, FamilyTreeError> {
	canvas
		.get_context("2d")
		.map_err(|err| FamilyTreeError::Canvas(format!("{err:?}")))?
		.ok_or_else(|| FamilyTreeError::Canvas("2d context not supported".into()))?
		.dyn_into::<CanvasRenderingContext2d>()
		.map_err(|_| FamilyTreeError::Canvas("unexpected context type".into()))
}

fn canvas_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn touch_points(canvas_ref: NodeRef<leptos::html::Canvas>, touches: &TouchList) -> Vec<(f64, f64)> {
	let Some(canvas) = canvas_ref.get() else {
		return Vec::new();
	};
	let rect = canvas.get_bounding_client_rect();
	(0..touches.length())
		.filter_map(|i| touches.item(i))
		.map(|t| {
			(
				t.client_x() as f64 - rect.left(),
				t.client_y() as f64 - rect.top(),
			)
		})
		.collect()
}

fn pinch_span(points: &[(f64, f64)]) -> Option<(f64, (f64, f64))> {
	let [a, b] = points else {
		return None;
	};
	let distance = (a.0 - b.0).hypot(a.1 - b.1);
	Some((distance, ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)))
}

fn load_image(media_id: &str, url: &str, state: SharedState) -> Result<HtmlImageElement, FamilyTreeError> {
	let img = HtmlImageElement::new().map_err(|err| FamilyTreeError::avatar(media_id, format!("{err:?}")))?;
	let onload = Closure::once_into_js(move || {
		if let Some(ref mut s) = *state.borrow_mut() {
			s.dirty = true;
		}
	});
	img.set_onload(Some(onload.unchecked_ref()));
	img.set_src(url);
	Ok(img)
}

fn show_avatar(update: AvatarUpdate, state: &SharedState, images: &SharedImages) {
	if images.borrow().contains_key(&update.media_id) {
		return;
	}
	match load_image(&update.media_id, &update.url, state.clone()) {
		Ok(img) => {
			images.borrow_mut().insert(update.media_id, img);
		}
		Err(err) => warn!("{err}"),
	}
}

/// Shows cached avatars of the current build, then starts as many fetches
/// as the loader allows; each completion pumps again so the queue drains at
/// the configured concurrency.
fn pump_avatars(state: SharedState, images: SharedImages, resolver: Option<AvatarResolver>) {
	let (ready, jobs) = match *state.borrow_mut() {
		Some(ref mut s) => {
			let jobs = match resolver {
				Some(_) => s.avatars.next_jobs(),
				None => Vec::new(),
			};
			debug!(
				"avatars: {}/{} in flight, {} queued",
				s.avatars.in_flight(),
				s.avatars.max_in_flight(),
				s.avatars.pending()
			);
			(s.avatars.take_ready(), jobs)
		}
		None => return,
	};
	for update in ready {
		show_avatar(update, &state, &images);
	}
	let Some(resolver) = resolver else {
		return;
	};
	for job in jobs {
		let (state, images, resolver) = (state.clone(), images.clone(), resolver.clone());
		wasm_bindgen_futures::spawn_local(async move {
			let result = resolver(job.media_id.clone()).await;
			let update = match *state.borrow_mut() {
				Some(ref mut s) => s.avatars.complete(job, result),
				None => None,
			};
			if let Some(update) = update {
				show_avatar(update, &state, &images);
			}
			pump_avatars(state, images, Some(resolver));
		});
	}
}

/// Interactive family tree drawn on a canvas.
///
/// Any change to `tree` or `view` rebuilds the whole diagram; dragged
/// positions and interactively collapsed generations are discarded.
#[component]
pub fn FamilyTreeCanvas(
	#[prop(into)] tree: Signal<Option<PersonTreeNode>>,
	#[prop(into)] view: Signal<ViewConfig>,
	#[prop(optional)] geometry: Option<LayoutConfig>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(optional)] avatar_resolver: Option<AvatarResolver>,
	#[prop(optional)] on_person_selected: Option<Callback<String>>,
	#[prop(optional)] on_person_double_clicked: Option<Callback<String>>,
	#[prop(optional)] on_cross_tree_link_clicked: Option<Callback<String>>,
	#[prop(optional)] on_find_relationship: Option<Callback<String>>,
	#[prop(optional)] on_add_relationship: Option<Callback<(String, RelationshipDirection)>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let images: SharedImages = Rc::new(RefCell::new(AvatarImages::new()));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let geometry = geometry.unwrap_or_default();
	let callbacks = TreeCallbacks {
		on_person_selected,
		on_person_double_clicked,
		on_cross_tree_link_clicked,
		on_find_relationship,
		on_add_relationship,
	};
	let ui = UiSignals {
		phase: RwSignal::new(ViewPhase::Idle),
		toggles: RwSignal::new(Vec::new()),
		popover: RwSignal::new(None),
	};
	let toggle_request = RwSignal::new(None::<i32>);
	let follow_request = RwSignal::new(None::<String>);

	let (state_init, images_init, animate_init, resize_cb_init, resolver_init) = (
		state.clone(),
		images.clone(),
		animate.clone(),
		resize_cb.clone(),
		avatar_resolver.clone(),
	);
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx = match context_2d(&canvas) {
			Ok(ctx) => ctx,
			Err(err) => {
				warn!("{err}");
				return;
			}
		};

		let mut initial = FamilyTreeState::new(geometry.clone(), w, h);
		match tree.get_untracked() {
			Some(person) => initial.load(person, view.get_untracked()),
			None => initial.begin_loading(),
		}
		ui.publish(&initial);
		*state_init.borrow_mut() = Some(initial);
		pump_avatars(state_init.clone(), images_init.clone(), resolver_init.clone());

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = window_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
					ui.publish(s);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, images_anim, animate_inner) =
			(state_init.clone(), images_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				if s.dirty {
					render::render(s, &images_anim.borrow(), &ctx);
					s.dirty = false;
				}
			}
			if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	// Structural input changed: full rebuild.
	let (state_data, images_data, resolver_data) =
		(state.clone(), images.clone(), avatar_resolver.clone());
	Effect::new(move |prev: Option<()>| {
		let (person, config) = (tree.get(), view.get());
		if prev.is_none() {
			// the mount effect already built from the initial inputs
			return;
		}
		if let Some(ref mut s) = *state_data.borrow_mut() {
			match person {
				Some(person) => s.load(person, config),
				None => s.begin_loading(),
			}
			ui.publish(s);
		}
		pump_avatars(state_data.clone(), images_data.clone(), resolver_data.clone());
	});

	let (state_toggle, images_toggle, resolver_toggle) =
		(state.clone(), images.clone(), avatar_resolver.clone());
	Effect::new(move |_| {
		let Some(generation) = toggle_request.get() else {
			return;
		};
		if let Some(ref mut s) = *state_toggle.borrow_mut() {
			if s.toggle_generation(generation) {
				ui.publish(s);
			}
		}
		pump_avatars(state_toggle.clone(), images_toggle.clone(), resolver_toggle.clone());
	});

	let state_follow = state.clone();
	Effect::new(move |_| {
		let Some(link_id) = follow_request.get() else {
			return;
		};
		let event = match *state_follow.borrow_mut() {
			Some(ref mut s) => {
				let event = s.follow_link(&link_id);
				ui.publish_popover(s);
				event
			}
			None => None,
		};
		if let Some(event) = event {
			callbacks.emit(event);
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pointer_down(x, y);
			ui.phase.set(s.phase);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(x, y);
			if s.open_links.is_some() && s.pan.active {
				ui.publish_popover(s);
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		let event = match *state_mu.borrow_mut() {
			Some(ref mut s) => {
				let event = s.pointer_up(x, y);
				ui.publish_popover(s);
				event
			}
			None => None,
		};
		if let Some(event) = event {
			callbacks.emit(event);
		}
	};

	let state_dbl = state.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		let event = match *state_dbl.borrow_mut() {
			Some(ref mut s) => s.double_click(x, y),
			None => None,
		};
		if let Some(event) = event {
			callbacks.emit(event);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_leave();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.wheel(x, y, ev.delta_y());
			ui.phase.set(s.phase);
			if s.open_links.is_some() {
				ui.publish_popover(s);
			}
		}
	};

	// Finger distance of an ongoing two-finger pinch.
	let pinch = Rc::new(Cell::new(None::<f64>));

	let (state_ts, pinch_ts) = (state.clone(), pinch.clone());
	let on_touchstart = move |ev: TouchEvent| {
		ev.prevent_default();
		let points = touch_points(canvas_ref, &ev.touches());
		if let Some(ref mut s) = *state_ts.borrow_mut() {
			if let Some((distance, _)) = pinch_span(&points) {
				// a second finger turns any drag into a pinch
				s.pointer_leave();
				pinch_ts.set(Some(distance));
			} else if let [(x, y)] = points[..] {
				s.pointer_down(x, y);
				ui.phase.set(s.phase);
			}
		}
	};

	let (state_tm, pinch_tm) = (state.clone(), pinch.clone());
	let on_touchmove = move |ev: TouchEvent| {
		ev.prevent_default();
		let points = touch_points(canvas_ref, &ev.touches());
		if let Some(ref mut s) = *state_tm.borrow_mut() {
			match (pinch_tm.get(), pinch_span(&points)) {
				(Some(previous), Some((distance, (cx, cy)))) if previous > 0.0 => {
					s.zoom_by(cx, cy, distance / previous);
					pinch_tm.set(Some(distance));
					ui.phase.set(s.phase);
				}
				(None, None) => {
					if let [(x, y)] = points[..] {
						s.pointer_move(x, y);
					}
				}
				_ => {}
			}
		}
	};

	let (state_te, pinch_te) = (state.clone(), pinch.clone());
	let on_touchend = move |ev: TouchEvent| {
		ev.prevent_default();
		if pinch_te.get().is_some() {
			if ev.touches().length() == 0 {
				pinch_te.set(None);
			}
			return;
		}
		let Some(&(x, y)) = touch_points(canvas_ref, &ev.changed_touches()).first() else {
			return;
		};
		let event = match *state_te.borrow_mut() {
			Some(ref mut s) => {
				let event = s.pointer_up(x, y);
				s.set_hover(None);
				ui.publish_popover(s);
				event
			}
			None => None,
		};
		if let Some(event) = event {
			callbacks.emit(event);
		}
	};

	view! {
		<div class="family-tree" style="position: relative;">
			<canvas
				node_ref=canvas_ref
				class="family-tree-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:dblclick=on_dblclick
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:touchstart=on_touchstart
				on:touchmove=on_touchmove
				on:touchend=on_touchend
				style="display: block; cursor: grab; touch-action: none;"
			/>
			{move || {
				(ui.phase.get() == ViewPhase::Loading)
					.then(|| view! { <div class="family-tree-loading">"Loading…"</div> })
			}}
			<div class="generation-legend">
				{move || {
					ui.toggles
						.get()
						.into_iter()
						.map(|toggle| {
							let generation = toggle.generation;
							let class = if toggle.collapsed {
								"generation-toggle collapsed"
							} else {
								"generation-toggle"
							};
							view! {
								<button class=class on:click=move |_| toggle_request.set(Some(generation))>
									{toggle.label}
								</button>
							}
						})
						.collect_view()
				}}
			</div>
			{move || {
				ui.popover
					.get()
					.map(|popover| {
						let style = format!(
							"position: absolute; left: {}px; top: {}px;",
							popover.screen_x,
							popover.screen_y,
						);
						view! {
							<div class="cross-tree-popover" style=style>
								<strong>{popover.person_name}</strong>
								<ul>
									{popover
										.links
										.into_iter()
										.map(|link| {
											let summary = link.summary();
											let link_id = link.link_id;
											view! {
												<li>
													<button on:click=move |_| {
														follow_request.set(Some(link_id.clone()))
													}>{summary}</button>
												</li>
											}
										})
										.collect_view()}
								</ul>
							</div>
						}
					})
			}}
		</div>
	}
}
