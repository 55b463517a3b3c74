use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{HierarchyViewState, NODE_RADIUS};

pub fn render(state: &HierarchyViewState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_bands(state, ctx);
	draw_level_edges(state, ctx);
	draw_lineage_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_bands(state: &HierarchyViewState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let left = -state.transform.x / k;
	ctx.set_font(&format!("{}px sans-serif", 11.0 / k.max(0.5)));
	for band in &state.bands {
		let y = band.y as f64;
		ctx.set_stroke_style_str("rgba(255, 255, 255, 0.06)");
		ctx.set_line_width(1.0 / k);
		ctx.begin_path();
		ctx.move_to(left, y);
		ctx.line_to(left + state.width / k, y);
		ctx.stroke();

		let alpha = if band.primary { 0.8 } else { 0.45 };
		ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", alpha));
		let _ = ctx.fill_text(&band.level.to_string(), left + 8.0 / k, y - 10.0 / k);
	}
}

fn draw_level_edges(state: &HierarchyViewState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	// Same-level edges fade while a lineage is shown
	let alpha = if state.has_active_highlight() { 0.12 } else { 0.35 };
	ctx.set_stroke_style_str(&format!("rgba(100, 180, 255, {})", alpha));
	ctx.set_line_width(1.0 / k);
	state.graph.visit_edges(|n1, n2, _| {
		ctx.begin_path();
		ctx.move_to(n1.x() as f64, n1.y() as f64);
		ctx.line_to(n2.x() as f64, n2.y() as f64);
		ctx.stroke();
	});
}

fn draw_lineage_edges(state: &HierarchyViewState, ctx: &CanvasRenderingContext2d) {
	if state.aux_edges.is_empty() {
		return;
	}
	let k = state.transform.k;
	let (dash, gap) = (10.0 / k, 3.0 / k);
	let positions = state.node_positions();

	ctx.set_line_width(1.5 / k);
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(dash),
		&JsValue::from_f64(gap),
	));
	ctx.set_line_dash_offset(-(state.flow_time * 30.0) % (dash + gap));
	for edge in &state.aux_edges {
		let (Some(&(x1, y1)), Some(&(x2, y2))) = (positions.get(&edge.from), positions.get(&edge.to))
		else {
			continue;
		};
		ctx.set_stroke_style_str(&edge.color);
		ctx.begin_path();
		ctx.move_to(x1, y1);
		ctx.line_to(x2, y2);
		ctx.stroke();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_nodes(state: &HierarchyViewState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, k) = (state.has_active_highlight(), state.transform.k);

	state.graph.visit_nodes(|node| {
		let idx = node.index();
		let (x, y) = (node.x() as f64, node.y() as f64);
		let is_highlighted = state.highlighted.contains(&idx);
		let is_hovered = state.hover == Some(idx);
		let alpha = if has_highlight && !is_highlighted { 0.35 } else { 1.0 };
		let radius = if is_highlighted {
			NODE_RADIUS * 1.3
		} else {
			NODE_RADIUS
		};

		if is_highlighted {
			if let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.3, x, y, radius * 2.4) {
				let _ = gradient.add_color_stop(0.0, "rgba(255, 255, 255, 0.3)");
				let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
				ctx.begin_path();
				let _ = ctx.arc(x, y, radius * 2.4, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		ctx.set_global_alpha(alpha);
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&node.data.user_data.color);
		ctx.fill();
		ctx.set_global_alpha(1.0);

		if is_hovered {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 2.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str("rgba(255, 255, 255, 0.7)");
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
		}

		if let Some(label) = &node.data.user_data.label {
			ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", alpha * 0.8));
			ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
			let _ = ctx.fill_text(label, x + radius + 3.0, y + 3.0);
		}
	});
}
