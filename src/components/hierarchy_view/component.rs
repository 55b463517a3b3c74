use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::state::{HierarchyViewState, Viewer};
use super::types::HierarchyData;
use crate::lineage::{BundleStore, HighlightSession, LineageContext, Transition};

type SharedViewer = Rc<RefCell<Option<Viewer<BundleStore>>>>;

fn window_size(window: &Window) -> (f64, f64) {
	(
		window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0),
		window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0),
	)
}

fn canvas_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Canvas drawing every level of a coarsening hierarchy as a horizontal band.
/// Double-click a vertex to show its lineage; double-click it again to clear.
#[component]
pub fn HierarchyCanvas(
	/// Artifact bundle to draw. A new value replaces the loaded run.
	#[prop(into)]
	data: Signal<HierarchyData>,
	/// Fill the window and follow its size.
	#[prop(default = false)]
	fullscreen: bool,
	/// Canvas width when not fullscreen. Defaults to the parent's width.
	#[prop(default = None)]
	width: Option<f64>,
	/// Canvas height when not fullscreen. Defaults to the parent's height.
	#[prop(default = None)]
	height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let viewer: SharedViewer = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (viewer_init, animate_init, resize_cb_init) =
		(viewer.clone(), animate.clone(), resize_cb.clone());

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

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("canvas has no 2d context");
			return;
		};

		let data = data.get();
		let config = data.config();
		let codec = config.codec();
		let store = BundleStore::new(codec.clone(), data.files);
		let hierarchy = store.hierarchy().clone();
		info!(
			"loaded `{}` with {} levels",
			codec.graph_name(),
			hierarchy.len()
		);

		let first_load = {
			let mut slot = viewer_init.borrow_mut();
			match slot.as_mut() {
				// A new bundle replaces the drawn one; any lineage on the old
				// surface goes with it.
				Some(v) => {
					v.session.deactivate(&mut v.state);
					v.ctx.replace(store, codec, hierarchy);
					v.session = HighlightSession::new(&config);
					v.state = HierarchyViewState::new(&mut v.ctx, &config.palette, w, h);
					false
				}
				None => {
					let mut lineage = LineageContext::new(store, codec, hierarchy);
					let state = HierarchyViewState::new(&mut lineage, &config.palette, w, h);
					*slot = Some(Viewer {
						ctx: lineage,
						session: HighlightSession::new(&config),
						state,
					});
					true
				}
			}
		};
		if !first_load {
			return;
		}

		if fullscreen {
			let (viewer_resize, canvas_resize) = (viewer_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = window_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut v) = *viewer_resize.borrow_mut() {
					v.state.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (viewer_anim, animate_inner) = (viewer_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			// A click handler may hold the viewer; skip the frame.
			if let Ok(mut slot) = viewer_anim.try_borrow_mut() {
				if let Some(ref mut v) = *slot {
					if v.state.animation_running {
						v.state.tick(0.016);
					}
					render::render(&v.state, &ctx);
				}
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let viewer_md = viewer.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut v) = *viewer_md.borrow_mut() {
			let s = &mut v.state;
			if let Some(idx) = s.node_at_position(x, y) {
				s.drag.active = true;
				s.drag.node_idx = Some(idx);
				s.drag.start_x = x;
				s.drag.start_y = y;
				s.graph.visit_nodes(|node| {
					if node.index() == idx {
						s.drag.node_start_x = node.x();
					}
				});
			} else {
				s.pan.active = true;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
			}
		}
	};

	let viewer_mm = viewer.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut v) = *viewer_mm.borrow_mut() {
			let s = &mut v.state;
			if !s.drag.active {
				s.hover = s.node_at_position(x, y);
			}

			if s.drag.active {
				// Vertices stay on their level's band; only x follows the cursor.
				if let Some(idx) = s.drag.node_idx {
					let nx = s.drag.node_start_x + ((x - s.drag.start_x) / s.transform.k) as f32;
					s.graph.visit_nodes_mut(|node| {
						if node.index() == idx {
							node.data.x = nx;
							node.data.is_anchor = true;
						}
					});
				}
			} else if s.pan.active {
				s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
				s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
			}
		}
	};

	let viewer_mu = viewer.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut v) = *viewer_mu.borrow_mut() {
			let s = &mut v.state;
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
		}
	};

	let viewer_ml = viewer.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut v) = *viewer_ml.borrow_mut() {
			let s = &mut v.state;
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
			s.hover = None;
		}
	};

	let viewer_dc = viewer.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		// Clicks arriving while a transition runs are dropped.
		let Ok(mut slot) = viewer_dc.try_borrow_mut() else {
			debug!("click dropped, transition in progress");
			return;
		};
		let Some(ref mut v) = *slot else {
			return;
		};
		let Some((level, render_index)) = v.state.slot_at_position(x, y) else {
			return;
		};
		let Some(vertex) = v.ctx.vertex_at(level, render_index) else {
			warn!("slot {render_index} of {level} holds no vertex");
			return;
		};
		match v.session.activate(&mut v.ctx, &mut v.state, vertex, level) {
			Transition::Activated(report) | Transition::Switched(report) => debug!(
				"vertex {vertex} at {level}: {} highlighted, {} edges",
				report.highlighted, report.edges
			),
			Transition::Deactivated => debug!("vertex {vertex} at {level}: cleared"),
			Transition::Ignored => debug!("vertex {vertex} at {level}: ignored"),
		}
	};

	let viewer_wh = viewer.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut v) = *viewer_wh.borrow_mut() {
			let s = &mut v.state;
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			let new_k = (s.transform.k * factor).clamp(0.1, 10.0);
			let ratio = new_k / s.transform.k;
			s.transform.x = x - (x - s.transform.x) * ratio;
			s.transform.y = y - (y - s.transform.y) * ratio;
			s.transform.k = new_k;
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="hierarchy-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:dblclick=on_dblclick
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
