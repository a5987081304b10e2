use std::collections::HashMap;

use log::warn;

use super::elements::Element;
use super::layout;
use super::style::{CurveStyle, LayoutDirective, NodeStyle, StyleSheet};
use super::types::NodeType;
use super::view::Renderer;

/// Movement in screen pixels below which a press/release pair counts as a tap.
pub const TAP_TOLERANCE: f64 = 4.0;
pub const LINE_HEIGHT: f64 = 1.2;

/// Width of `text` rendered at `font_size` pixels.
pub type TextMeasure = Box<dyn Fn(&str, f64) -> f64>;

/// Rough width estimate for when no canvas is available.
pub fn approximate_measure() -> TextMeasure {
	Box::new(|text: &str, font_size: f64| text.chars().count() as f64 * font_size * 0.6)
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
	pub node_idx: Option<usize>,
	pub moved: bool,
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

#[derive(Clone, Debug)]
struct Transition {
	elapsed_ms: f64,
	duration_ms: f64,
}

#[derive(Clone, Debug)]
pub struct SceneNode<P> {
	pub id: String,
	pub label: String,
	pub kind: NodeType,
	pub payload: Option<P>,
	pub style: NodeStyle,
	pub lines: Vec<String>,
	pub width: f64,
	pub height: f64,
	pub x: f64,
	pub y: f64,
	from: (f64, f64),
	to: (f64, f64),
	placed: bool,
}

impl<P> SceneNode<P> {
	pub fn contains(&self, gx: f64, gy: f64) -> bool {
		(gx - self.x).abs() <= self.width / 2.0 && (gy - self.y).abs() <= self.height / 2.0
	}
}

#[derive(Clone, Debug)]
pub struct SceneEdge<P> {
	pub id: String,
	pub source: usize,
	pub target: usize,
	pub label: String,
	pub payload: Option<P>,
	/// Perpendicular bend, non-zero for parallel edges.
	pub offset: f64,
}

/// DOM-free renderer state: element geometry, view transform and pointer
/// interaction. The canvas component draws it every frame.
pub struct Scene<P> {
	pub nodes: Vec<SceneNode<P>>,
	pub edges: Vec<SceneEdge<P>>,
	pub style: StyleSheet,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
	measure: TextMeasure,
	index: HashMap<String, usize>,
	previous: HashMap<String, (f64, f64)>,
	transition: Option<Transition>,
}

impl<P> Scene<P> {
	pub fn new(width: f64, height: f64, measure: TextMeasure) -> Self {
		Self {
			nodes: Vec::new(),
			edges: Vec::new(),
			style: StyleSheet::default(),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			width,
			height,
			measure,
			index: HashMap::new(),
			previous: HashMap::new(),
			transition: None,
		}
	}

	pub fn node(&self, id: &str) -> Option<&SceneNode<P>> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	pub fn is_animating(&self) -> bool {
		self.transition.is_some()
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Topmost node under a screen position.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.nodes.iter().rposition(|n| n.contains(gx, gy))
	}

	/// Advance the layout transition.
	pub fn tick(&mut self, dt_ms: f64) {
		let Some(transition) = self.transition.as_mut() else {
			return;
		};
		transition.elapsed_ms += dt_ms;
		let t = if transition.duration_ms <= 0.0 {
			1.0
		} else {
			(transition.elapsed_ms / transition.duration_ms).min(1.0)
		};
		if t >= 1.0 {
			for node in &mut self.nodes {
				(node.x, node.y) = node.to;
			}
			self.transition = None;
			return;
		}
		let eased = ease_out_cubic(t);
		for node in &mut self.nodes {
			node.x = node.from.0 + (node.to.0 - node.from.0) * eased;
			node.y = node.from.1 + (node.to.1 - node.from.1) * eased;
		}
	}

	pub fn pointer_down(&mut self, x: f64, y: f64) {
		if let Some(idx) = self.node_at_position(x, y) {
			self.drag = DragState {
				active: true,
				node_idx: Some(idx),
				moved: false,
				start_x: x,
				start_y: y,
				node_start_x: self.nodes[idx].x,
				node_start_y: self.nodes[idx].y,
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
		if self.drag.active {
			let Some(idx) = self.drag.node_idx else {
				return;
			};
			let (dx, dy) = (x - self.drag.start_x, y - self.drag.start_y);
			if !self.drag.moved && dx.hypot(dy) < TAP_TOLERANCE {
				return;
			}
			self.drag.moved = true;
			let k = self.transform.k;
			let (nx, ny) = (self.drag.node_start_x + dx / k, self.drag.node_start_y + dy / k);
			let Some(node) = self.nodes.get_mut(idx) else {
				return;
			};
			node.x = nx;
			node.y = ny;
			node.to = (nx, ny);
			node.from = (nx, ny);
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
		}
	}

	/// Ends a drag or pan. Returns the node index when the press was a tap.
	pub fn pointer_up(&mut self) -> Option<usize> {
		let tapped = match (self.drag.active, self.drag.moved) {
			(true, false) => self.drag.node_idx,
			_ => None,
		};
		self.pointer_leave();
		tapped
	}

	pub fn pointer_leave(&mut self) {
		self.drag = DragState::default();
		self.pan.active = false;
	}

	/// Zoom around a screen point. `sensitivity` scales each wheel step.
	pub fn zoom_at(&mut self, x: f64, y: f64, delta_y: f64, sensitivity: f64) {
		let step = 0.5 * sensitivity;
		let factor = if delta_y > 0.0 { 1.0 - step } else { 1.0 + step };
		let new_k = (self.transform.k * factor).clamp(0.1, 10.0);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Control point of an edge's quadratic curve: the midpoint pushed
	/// sideways by the edge offset. `None` for coincident endpoints.
	pub fn control_point(&self, edge: &SceneEdge<P>) -> Option<(f64, f64)> {
		let (src, tgt) = (self.nodes.get(edge.source)?, self.nodes.get(edge.target)?);
		let (dx, dy) = (tgt.x - src.x, tgt.y - src.y);
		let dist = dx.hypot(dy);
		if dist < 0.001 {
			return None;
		}
		let (nx, ny) = (-dy / dist, dx / dist);
		let bend = match self.style.edge.curve {
			CurveStyle::Bezier => edge.offset * 2.0,
			CurveStyle::Straight => 0.0,
		};
		Some((
			(src.x + tgt.x) / 2.0 + nx * bend,
			(src.y + tgt.y) / 2.0 + ny * bend,
		))
	}

	fn size_node(&self, node: &mut SceneNode<P>) {
		let style = self.style.node_style(node.kind);
		node.lines = wrap_label(
			&node.label,
			style.text_max_width,
			style.font_size,
			&*self.measure,
		);
		let text_width = node
			.lines
			.iter()
			.map(|l| (self.measure)(l, style.font_size))
			.fold(0.0, f64::max);
		let text_height = node.lines.len() as f64 * style.font_size * LINE_HEIGHT;
		node.width = text_width + 2.0 * style.padding;
		node.height = style.height.unwrap_or(text_height + 2.0 * style.padding);
		node.style = style;
	}

	fn bounding_box(&self) -> Option<(f64, f64, f64, f64)> {
		self.nodes.iter().fold(None, |acc, n| {
			let (x0, y0) = (n.to.0 - n.width / 2.0, n.to.1 - n.height / 2.0);
			let (x1, y1) = (n.to.0 + n.width / 2.0, n.to.1 + n.height / 2.0);
			Some(match acc {
				None => (x0, y0, x1, y1),
				Some((a0, b0, a1, b1)) => (a0.min(x0), b0.min(y0), a1.max(x1), b1.max(y1)),
			})
		})
	}
}

impl<P> Renderer<P> for Scene<P> {
	fn clear_elements(&mut self) {
		self.previous = self
			.nodes
			.drain(..)
			.map(|n| (n.id, (n.x, n.y)))
			.collect();
		self.edges.clear();
		self.index.clear();
		self.transition = None;
		// a held node may not survive the replacement
		self.pointer_leave();
	}

	fn add_elements(&mut self, elements: Vec<Element<P>>) {
		let mut edges = Vec::new();
		for element in elements {
			match element {
				Element::Node(n) => {
					let (x, y, placed) = match self.previous.get(&n.id) {
						Some(&(x, y)) => (x, y, true),
						None => (0.0, 0.0, false),
					};
					let mut node = SceneNode {
						id: n.id,
						label: n.label,
						kind: n.kind,
						payload: n.payload,
						style: self.style.node.clone(),
						lines: Vec::new(),
						width: 0.0,
						height: 0.0,
						x,
						y,
						from: (x, y),
						to: (x, y),
						placed,
					};
					self.size_node(&mut node);
					self.index.insert(node.id.clone(), self.nodes.len());
					self.nodes.push(node);
				}
				Element::Edge(e) => edges.push(e),
			}
		}

		for e in edges {
			let (Some(&source), Some(&target)) = (self.index.get(&e.source), self.index.get(&e.target))
			else {
				warn!("edge {} references an unknown node, skipped", e.id);
				continue;
			};
			self.edges.push(SceneEdge {
				id: e.id,
				source,
				target,
				label: e.label,
				payload: e.payload,
				offset: 0.0,
			});
		}
	}

	fn apply_style(&mut self, style: &StyleSheet) {
		self.style = style.clone();
		let mut nodes = std::mem::take(&mut self.nodes);
		for node in &mut nodes {
			self.size_node(node);
		}
		self.nodes = nodes;
	}

	fn run_layout(&mut self, directive: &LayoutDirective) {
		let sizes: Vec<_> = self.nodes.iter().map(|n| (n.width, n.height)).collect();
		let pairs: Vec<_> = self.edges.iter().map(|e| (e.source, e.target)).collect();
		let positions = layout::compute(directive, &sizes, &pairs);

		for (edge, offset) in self
			.edges
			.iter_mut()
			.zip(layout::edge_offsets(&pairs, directive.edge_sep))
		{
			edge.offset = offset;
		}
		for (node, to) in self.nodes.iter_mut().zip(positions) {
			node.from = if node.placed { (node.x, node.y) } else { to };
			node.to = to;
			node.placed = true;
		}

		self.transition = Some(Transition {
			elapsed_ms: 0.0,
			duration_ms: if directive.animate {
				directive.animation_duration_ms
			} else {
				0.0
			},
		});
		if !directive.animate {
			self.tick(0.0);
		}
		if directive.fit {
			self.fit(directive.padding);
		}
	}

	fn fit(&mut self, padding: f64) {
		let Some((x0, y0, x1, y1)) = self.bounding_box() else {
			return;
		};
		let (bw, bh) = ((x1 - x0).max(1.0), (y1 - y0).max(1.0));
		let (aw, ah) = (
			(self.width - 2.0 * padding).max(1.0),
			(self.height - 2.0 * padding).max(1.0),
		);
		let k = (aw / bw).min(ah / bh).clamp(0.1, 10.0);
		let (cx, cy) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);
		self.transform = ViewTransform {
			x: self.width / 2.0 - cx * k,
			y: self.height / 2.0 - cy * k,
			k,
		};
	}
}

pub fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Greedy word wrap. A single word wider than `max_width` keeps its own line.
pub fn wrap_label(
	label: &str,
	max_width: f64,
	font_size: f64,
	measure: &dyn Fn(&str, f64) -> f64,
) -> Vec<String> {
	let mut lines = Vec::new();
	let mut current = String::new();
	for word in label.split_whitespace() {
		if current.is_empty() {
			current.push_str(word);
			continue;
		}
		let candidate = format!("{current} {word}");
		if measure(&candidate, font_size) <= max_width {
			current = candidate;
		} else {
			lines.push(std::mem::replace(&mut current, word.to_string()));
		}
	}
	if !current.is_empty() || lines.is_empty() {
		lines.push(current);
	}
	lines
}

/// Point where the segment from a node center towards `(tx, ty)` leaves the
/// node's rectangle.
pub fn boundary_point(node: &SceneNode<impl Sized>, tx: f64, ty: f64) -> (f64, f64) {
	let (dx, dy) = (tx - node.x, ty - node.y);
	if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
		return (node.x, node.y);
	}
	let (hw, hh) = (node.width / 2.0, node.height / 2.0);
	let sx = if dx.abs() > 0.0 { hw / dx.abs() } else { f64::INFINITY };
	let sy = if dy.abs() > 0.0 { hh / dy.abs() } else { f64::INFINITY };
	let s = sx.min(sy).min(1.0);
	(node.x + dx * s, node.y + dy * s)
}
