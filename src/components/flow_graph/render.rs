use std::f64::consts::{FRAC_PI_2, PI};

use web_sys::CanvasRenderingContext2d;

use super::scene::{LINE_HEIGHT, Scene, SceneEdge, SceneNode, boundary_point};
use super::style::{ArrowShape, EdgeStyle, NodeShape};

const BACKGROUND: &str = "#f8fafc";
const CORNER_RADIUS: f64 = 6.0;
const ARROW_SIZE: f64 = 8.0;

pub fn render<P>(scene: &Scene<P>, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, scene.width, scene.height);
	ctx.save();
	let _ = ctx.translate(scene.transform.x, scene.transform.y);
	let _ = ctx.scale(scene.transform.k, scene.transform.k);
	for edge in &scene.edges {
		draw_edge(scene, edge, ctx);
	}
	for node in &scene.nodes {
		draw_node(node, ctx);
	}
	ctx.restore();
}

fn draw_edge<P>(scene: &Scene<P>, edge: &SceneEdge<P>, ctx: &CanvasRenderingContext2d) {
	let style = &scene.style.edge;
	let (Some(src), Some(tgt)) = (scene.nodes.get(edge.source), scene.nodes.get(edge.target)) else {
		return;
	};
	let Some((cx, cy)) = scene.control_point(edge) else {
		return;
	};

	let (x1, y1) = boundary_point(src, cx, cy);
	let (x2, y2) = boundary_point(tgt, cx, cy);

	ctx.set_stroke_style_str(style.line_color);
	ctx.set_line_width(style.width);
	ctx.begin_path();
	ctx.move_to(x1, y1);
	ctx.quadratic_curve_to(cx, cy, x2, y2);
	ctx.stroke();

	if style.target_arrow == ArrowShape::Triangle {
		draw_arrow(style, (cx, cy), (x2, y2), ctx);
	}

	if !edge.label.is_empty() {
		// quadratic curve midpoint at t = 0.5
		let (mx, my) = (
			0.25 * x1 + 0.5 * cx + 0.25 * x2,
			0.25 * y1 + 0.5 * cy + 0.25 * y2,
		);
		draw_edge_label(style, &edge.label, (mx, my), (x2 - x1, y2 - y1), ctx);
	}
}

fn draw_arrow(
	style: &EdgeStyle,
	(fx, fy): (f64, f64),
	(tip_x, tip_y): (f64, f64),
	ctx: &CanvasRenderingContext2d,
) {
	let (dx, dy) = (tip_x - fx, tip_y - fy);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return;
	}
	let size = ARROW_SIZE * style.arrow_scale;
	let (ux, uy) = (dx / dist, dy / dist);
	let (back_x, back_y) = (tip_x - ux * size, tip_y - uy * size);
	let (px, py) = (-uy * size * 0.5, ux * size * 0.5);

	ctx.set_fill_style_str(style.arrow_color);
	ctx.begin_path();
	ctx.move_to(tip_x, tip_y);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();
}

fn draw_edge_label(
	style: &EdgeStyle,
	label: &str,
	(mx, my): (f64, f64),
	(dx, dy): (f64, f64),
	ctx: &CanvasRenderingContext2d,
) {
	ctx.save();
	let _ = ctx.translate(mx, my);
	if style.text_autorotate {
		let _ = ctx.rotate(readable_angle(dy.atan2(dx)));
	}
	ctx.set_fill_style_str(style.text_color);
	ctx.set_font(&format!("{}px sans-serif", style.font_size));
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let _ = ctx.fill_text(label, 0.0, style.text_margin_y);
	ctx.restore();
}

/// Keeps rotated text upright.
fn readable_angle(angle: f64) -> f64 {
	if angle > FRAC_PI_2 {
		angle - PI
	} else if angle < -FRAC_PI_2 {
		angle + PI
	} else {
		angle
	}
}

fn draw_node<P>(node: &SceneNode<P>, ctx: &CanvasRenderingContext2d) {
	let style = &node.style;
	let (x0, y0) = (node.x - node.width / 2.0, node.y - node.height / 2.0);
	let radius = match style.shape {
		NodeShape::RoundRectangle => CORNER_RADIUS.min(node.height / 2.0),
		NodeShape::Rectangle => 0.0,
	};

	ctx.begin_path();
	trace_round_rect(ctx, x0, y0, node.width, node.height, radius);
	ctx.set_fill_style_str(style.background_color);
	ctx.fill();
	ctx.set_stroke_style_str(style.border_color);
	ctx.set_line_width(style.border_width);
	ctx.stroke();

	ctx.set_fill_style_str(style.text_color);
	ctx.set_font(&format!("{}px sans-serif", style.font_size));
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let line_height = style.font_size * LINE_HEIGHT;
	let first = node.y - line_height * (node.lines.len() as f64 - 1.0) / 2.0;
	for (i, line) in node.lines.iter().enumerate() {
		let _ = ctx.fill_text(line, node.x, first + i as f64 * line_height);
	}
}

fn trace_round_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
	ctx.move_to(x + r, y);
	ctx.line_to(x + w - r, y);
	ctx.quadratic_curve_to(x + w, y, x + w, y + r);
	ctx.line_to(x + w, y + h - r);
	ctx.quadratic_curve_to(x + w, y + h, x + w - r, y + h);
	ctx.line_to(x + r, y + h);
	ctx.quadratic_curve_to(x, y + h, x, y + h - r);
	ctx.line_to(x, y + r);
	ctx.quadratic_curve_to(x, y, x + r, y);
	ctx.close_path();
}
