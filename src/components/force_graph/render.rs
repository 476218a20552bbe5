use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{LayoutState, NodeInfo};
use crate::graph::LinkKind;

const BACKGROUND: &str = "#fafafa";
const NODE_FILL: &str = "107, 107, 107";
const EMPHASIS_FILL: &str = "92, 92, 92";
const HIGHLIGHT_RGB: &str = "13, 115, 119";
const FOCUS_RGB: &str = "71, 85, 105";
const LINK_RGB: &str = "176, 176, 176";
const LABEL_RGB: &str = "51, 51, 51";
const FONT_FAMILY: &str = "Inter, system-ui, sans-serif";

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(state: &LayoutState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_links(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_links(state: &LayoutState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (dash, gap) = (4.0 / k, 3.0 / k);
	let t = ease_out_cubic(state.focus.level);

	for link in state.sim.links() {
		let (p1, p2) = (state.sim.position(link.source), state.sim.position(link.target));
		let (dx, dy) = (p2.x - p1.x, p2.y - p1.y);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		// links touching the focused node brighten, the rest dim
		let touches_focus =
			state.focus.node.is_some_and(|f| link.source == f || link.target == f);
		let base_width = match link.kind {
			LinkKind::Similarity => 1.0 + link.weight.unwrap_or(0.0),
			LinkKind::Hierarchy => 1.2,
			LinkKind::Relevance => 1.0,
		} / k;
		let (alpha, width) = if touches_focus {
			(0.65 + 0.3 * t, base_width * (1.0 + 0.3 * t))
		} else {
			(0.65 - 0.45 * t, base_width * (1.0 - 0.3 * t))
		};

		ctx.set_stroke_style_str(&format!("rgba({}, {})", LINK_RGB, alpha));
		ctx.set_line_width(width);
		if link.kind == LinkKind::Similarity {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			));
		} else {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		let (ux, uy) = (dx / dist, dy / dist);
		let (r1, r2) = (state.nodes[link.source].radius, state.nodes[link.target].radius);
		ctx.begin_path();
		ctx.move_to(p1.x + ux * r1, p1.y + uy * r1);
		ctx.line_to(p2.x - ux * r2, p2.y - uy * r2);
		ctx.stroke();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn fill_for(node: &NodeInfo, alpha: f64) -> String {
	if node.highlighted {
		return format!("rgba({}, {})", HIGHLIGHT_RGB, alpha);
	}
	let rgb = if node.emphasis { EMPHASIS_FILL } else { NODE_FILL };
	// stronger documents read darker
	let weight = node.relevance.map(|r| 0.55 + 0.45 * r).unwrap_or(1.0);
	format!("rgba({}, {})", rgb, alpha * weight)
}

fn draw_circle(
	ctx: &CanvasRenderingContext2d,
	node: &NodeInfo,
	x: f64,
	y: f64,
	radius: f64,
	alpha: f64,
	k: f64,
) {
	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(&fill_for(node, alpha));
	ctx.fill();
	if node.highlighted {
		ctx.set_stroke_style_str(&format!("rgba({}, {})", HIGHLIGHT_RGB, alpha));
		ctx.set_line_width(2.0 / k);
	} else {
		ctx.set_stroke_style_str("#ffffff");
		ctx.set_line_width(1.0 / k);
	}
	ctx.stroke();
}

fn draw_label(
	ctx: &CanvasRenderingContext2d,
	node: &NodeInfo,
	x: f64,
	y: f64,
	alpha: f64,
	k: f64,
) {
	ctx.set_fill_style_str(&format!("rgba({}, {})", LABEL_RGB, alpha));
	ctx.set_font(&format!("{}px {}", 11.0 / k.max(0.5), FONT_FAMILY));
	let _ = ctx.fill_text(&node.label, x + node.radius + 6.0, y + 4.0);
}

fn draw_nodes(state: &LayoutState, ctx: &CanvasRenderingContext2d) {
	let (t, k) = (ease_out_cubic(state.focus.level), state.transform.k);
	let focused = |idx| t > 0.0 && state.in_focus(idx);

	// unfocused nodes first so the focused neighbourhood draws on top
	for (idx, node) in state.nodes.iter().enumerate() {
		if focused(idx) {
			continue;
		}
		let p = state.sim.position(idx);
		let (alpha, radius) = (1.0 - 0.6 * t, node.radius * (1.0 - 0.15 * t));
		draw_circle(ctx, node, p.x, p.y, radius, alpha, k);
		draw_label(ctx, node, p.x, p.y, alpha, k);
	}

	let Some(center) = state.focus.node.filter(|_| t > 0.0) else {
		return;
	};
	for (idx, node) in state.nodes.iter().enumerate() {
		if !focused(idx) {
			continue;
		}
		let p = state.sim.position(idx);
		let (radius, glow_radius) = if idx == center {
			(node.radius * (1.0 + 0.35 * t), node.radius * (1.8 + 1.2 * t))
		} else {
			(node.radius * (1.0 + 0.2 * t), node.radius * (1.4 + 0.6 * t))
		};

		if t > 0.01 {
			if let Ok(gradient) =
				ctx.create_radial_gradient(p.x, p.y, radius * 0.3, p.x, p.y, glow_radius)
			{
				let alpha = if idx == center { 0.22 * t } else { 0.1 * t };
				let _ = gradient.add_color_stop(0.0, &format!("rgba({}, {})", FOCUS_RGB, alpha));
				let _ = gradient.add_color_stop(0.6, &format!("rgba({}, {})", FOCUS_RGB, alpha * 0.3));
				let _ = gradient.add_color_stop(1.0, &format!("rgba({}, 0)", FOCUS_RGB));
				ctx.begin_path();
				let _ = ctx.arc(p.x, p.y, glow_radius, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		draw_circle(ctx, node, p.x, p.y, radius, 1.0, k);

		if idx == center && t > 0.01 {
			ctx.begin_path();
			let _ = ctx.arc(p.x, p.y, radius + 2.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&format!("rgba({}, {})", FOCUS_RGB, 0.6 * t));
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
		}

		draw_label(ctx, node, p.x, p.y, 1.0, k);
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;
	use crate::graph::{ConceptEntry, NodeKind, NodePayload};

	fn concept(highlighted: bool) -> NodeInfo {
		NodeInfo {
			label: "Method".into(),
			kind: NodeKind::Concept,
			emphasis: false,
			highlighted,
			radius: 6.0,
			relevance: None,
			page: Some(3),
			payload: NodePayload::Concept {
				entry: Arc::new(ConceptEntry {
					id: "method".into(),
					label: "Method".into(),
					content: None,
					position: None,
					quote: None,
				}),
				depth: 1,
			},
		}
	}

	#[test]
	fn page_highlight_fades_with_other_nodes() {
		assert_eq!(fill_for(&concept(true), 0.4), "rgba(13, 115, 119, 0.4)");
	}

	#[test]
	fn only_page_matches_use_the_highlight_colour() {
		assert!(!fill_for(&concept(false), 1.0).contains(HIGHLIGHT_RGB));
		assert_ne!(FOCUS_RGB, HIGHLIGHT_RGB);
	}
}
