use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::ForceGraphState;
use crate::topics::{GraphVisualNode, NodeShape, Point, VisualKind};

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(state.style.background);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_edges(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (line_width, dash, gap) = (1.5 / k, 8.0 / k, 4.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let t = ease_out_cubic(state.hover.highlight_t);
	let (r, g, b) = state.style.edge_rgb;
	let padding = state.style.nodes.edge_padding;

	for edge in &state.visible.edges {
		// Unplaced nodes get their edge on a later frame.
		let Some((start, end)) = state.visible.edge_endpoints(*edge, padding) else {
			continue;
		};
		let (Some(from), Some(to)) = (
			state.visible.nodes[edge.source].position(),
			state.visible.nodes[edge.target].position(),
		) else {
			continue;
		};
		// Overlapping outlines flip the segment; nothing sensible to draw.
		if (end.x - start.x) * (to.x - from.x) + (end.y - start.y) * (to.y - from.y) <= 0.0 {
			continue;
		}

		let is_highlighted = state.is_highlighted(edge.source) && state.is_highlighted(edge.target);
		let (edge_alpha, width) = if is_highlighted {
			(0.6 + 0.3 * t, line_width * (1.0 + 0.3 * t))
		} else {
			(0.6 - 0.45 * t, line_width * (1.0 - 0.3 * t))
		};

		ctx.set_stroke_style_str(&format!("rgba({r}, {g}, {b}, {edge_alpha})"));
		ctx.set_line_width(width);
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(dash),
			&JsValue::from_f64(gap),
		));
		ctx.set_line_dash_offset(dash_offset);

		ctx.begin_path();
		ctx.move_to(start.x, start.y);
		ctx.line_to(end.x, end.y);
		ctx.stroke();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
		state.transform.k,
	);

	// Dimmed pass first so highlighted nodes paint on top.
	for (slot, node) in state.visible.nodes.iter().enumerate() {
		if has_highlight && state.is_highlighted(slot) {
			continue;
		}
		let Some(at) = node.position() else {
			continue;
		};
		let alpha = 1.0 - 0.7 * t;
		ctx.set_global_alpha(alpha);
		fill_shape(ctx, node, at, 1.0 - 0.15 * t);
		ctx.set_global_alpha(1.0);
		draw_expander(ctx, node, at, k, alpha);
		draw_label(ctx, node, at, k, &format!("rgba(255, 255, 255, {})", alpha * 0.8));
	}

	if !has_highlight {
		return;
	}

	for (slot, node) in state.visible.nodes.iter().enumerate() {
		if !state.is_highlighted(slot) {
			continue;
		}
		let Some(at) = node.position() else {
			continue;
		};
		let is_hovered = state.is_hovered(slot);
		let is_neighbor =
			state.hover.neighbors.contains(&slot) || state.hover.prev_neighbors.contains(&slot);
		let base = outline_radius(node.shape);

		let (scale, glow_radius) = if is_hovered {
			(1.0 + 0.35 * t, base * (1.8 + 1.2 * t))
		} else if is_neighbor {
			(1.0 + 0.2 * t, base * (1.4 + 0.6 * t))
		} else {
			(1.0, 0.0)
		};

		if glow_radius > 0.0 && t > 0.01 {
			if let Ok(gradient) = ctx.create_radial_gradient(at.x, at.y, base * 0.3, at.x, at.y, glow_radius) {
				let alpha = if is_hovered { 0.35 * t } else { 0.2 * t };
				let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {})", alpha));
				let _ = gradient.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", alpha * 0.3));
				let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
				ctx.begin_path();
				let _ = ctx.arc(at.x, at.y, glow_radius, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		fill_shape(ctx, node, at, scale);
		draw_expander(ctx, node, at, k, 1.0);

		if is_hovered && t > 0.01 {
			ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", 0.7 * t));
			ctx.set_line_width(1.5 / k);
			stroke_shape(ctx, node.shape, at, scale, 2.0 / k);
		}

		draw_label(ctx, node, at, k, "white");
	}
}

fn outline_radius(shape: NodeShape) -> f64 {
	match shape {
		NodeShape::Circle { radius } => radius,
		NodeShape::Box {
			half_width,
			half_height,
		} => half_width.max(half_height),
	}
}

fn fill_shape(ctx: &CanvasRenderingContext2d, node: &GraphVisualNode, at: Point, scale: f64) {
	ctx.set_fill_style_str(&node.color);
	match node.shape {
		NodeShape::Circle { radius } => {
			ctx.begin_path();
			let _ = ctx.arc(at.x, at.y, radius * scale, 0.0, 2.0 * PI);
			ctx.fill();
		}
		NodeShape::Box {
			half_width,
			half_height,
		} => {
			let (w, h) = (half_width * scale, half_height * scale);
			ctx.fill_rect(at.x - w, at.y - h, 2.0 * w, 2.0 * h);
		}
	}
}

fn stroke_shape(ctx: &CanvasRenderingContext2d, shape: NodeShape, at: Point, scale: f64, grow: f64) {
	match shape {
		NodeShape::Circle { radius } => {
			ctx.begin_path();
			let _ = ctx.arc(at.x, at.y, radius * scale + grow, 0.0, 2.0 * PI);
			ctx.stroke();
		}
		NodeShape::Box {
			half_width,
			half_height,
		} => {
			let (w, h) = (half_width * scale + grow, half_height * scale + grow);
			ctx.stroke_rect(at.x - w, at.y - h, 2.0 * w, 2.0 * h);
		}
	}
}

/// Collapsed branches get a solid ring, open ones a dashed ring.
fn draw_expander(ctx: &CanvasRenderingContext2d, node: &GraphVisualNode, at: Point, k: f64, alpha: f64) {
	if !node.is_expandable {
		return;
	}
	let NodeShape::Circle { radius } = node.shape else {
		return;
	};
	ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", 0.6 * alpha));
	ctx.set_line_width(1.2 / k);
	if node.is_expanded {
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(3.0 / k),
			&JsValue::from_f64(3.0 / k),
		));
	}
	ctx.begin_path();
	let _ = ctx.arc(at.x, at.y, radius + 3.0 / k, 0.0, 2.0 * PI);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_label(ctx: &CanvasRenderingContext2d, node: &GraphVisualNode, at: Point, k: f64, fill: &str) {
	ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
	match (node.kind, node.shape) {
		(VisualKind::Center, _) | (_, NodeShape::Box { .. }) => {
			ctx.set_fill_style_str("#1a1a2e");
			ctx.set_text_align("center");
			ctx.set_text_baseline("middle");
			let _ = ctx.fill_text(&node.label, at.x, at.y);
			ctx.set_text_align("start");
			ctx.set_text_baseline("alphabetic");
		}
		(_, NodeShape::Circle { radius }) => {
			ctx.set_fill_style_str(fill);
			let _ = ctx.fill_text(&node.label, at.x + radius + 3.0, at.y + 3.0);
		}
	}
}
