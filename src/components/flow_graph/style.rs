//! Static style table and layout directive for the flow graph.

use super::types::NodeType;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeShape {
	Rectangle,
	RoundRectangle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeStyle {
	pub shape: NodeShape,
	pub border_width: f64,
	pub border_color: &'static str,
	pub background_color: &'static str,
	pub text_color: &'static str,
	pub font_size: f64,
	pub padding: f64,
	/// Labels wrap onto a new line past this width.
	pub text_max_width: f64,
	/// `None` sizes the node from its label.
	pub height: Option<f64>,
}

/// Partial node style applied on top of the base for one [`NodeType`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeStyleOverride {
	pub border_color: Option<&'static str>,
	pub background_color: Option<&'static str>,
	pub font_size: Option<f64>,
	pub padding: Option<f64>,
	pub height: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurveStyle {
	Straight,
	Bezier,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrowShape {
	None,
	Triangle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeStyle {
	pub curve: CurveStyle,
	pub target_arrow: ArrowShape,
	pub arrow_scale: f64,
	pub line_color: &'static str,
	pub arrow_color: &'static str,
	pub width: f64,
	pub font_size: f64,
	pub text_color: &'static str,
	/// Rotate the label along the edge direction.
	pub text_autorotate: bool,
	pub text_margin_y: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StyleSheet {
	pub node: NodeStyle,
	pub node_types: Vec<(NodeType, NodeStyleOverride)>,
	pub edge: EdgeStyle,
}

impl StyleSheet {
	/// Resolved style for a node of the given type.
	pub fn node_style(&self, kind: NodeType) -> NodeStyle {
		let mut style = self.node.clone();
		for (_, over) in self.node_types.iter().filter(|(k, _)| *k == kind) {
			if let Some(c) = over.border_color {
				style.border_color = c;
			}
			if let Some(c) = over.background_color {
				style.background_color = c;
			}
			if let Some(s) = over.font_size {
				style.font_size = s;
			}
			if let Some(p) = over.padding {
				style.padding = p;
			}
			if over.height.is_some() {
				style.height = over.height;
			}
		}
		style
	}
}

impl Default for StyleSheet {
	fn default() -> Self {
		Self {
			node: NodeStyle {
				shape: NodeShape::RoundRectangle,
				border_width: 1.0,
				border_color: "#cbd5e1",
				background_color: "#ffffff",
				text_color: "#0f172a",
				font_size: 11.0,
				padding: 10.0,
				text_max_width: 140.0,
				height: None,
			},
			node_types: vec![
				(
					NodeType::Process,
					NodeStyleOverride {
						border_color: Some("#60a5fa"),
						background_color: Some("#eff6ff"),
						..Default::default()
					},
				),
				(
					NodeType::EconomicFlow,
					NodeStyleOverride {
						border_color: Some("#34d399"),
						background_color: Some("#ecfdf5"),
						..Default::default()
					},
				),
				(
					NodeType::ElementaryFlow,
					NodeStyleOverride {
						border_color: Some("#fbbf24"),
						background_color: Some("#fffbeb"),
						font_size: Some(5.0),
						padding: Some(2.0),
						height: Some(7.0),
					},
				),
			],
			edge: EdgeStyle {
				curve: CurveStyle::Bezier,
				target_arrow: ArrowShape::Triangle,
				arrow_scale: 1.0,
				line_color: "#94a3b8",
				arrow_color: "#94a3b8",
				width: 2.0,
				font_size: 10.0,
				text_color: "#475569",
				text_autorotate: true,
				text_margin_y: -6.0,
			},
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutName {
	/// Hierarchical ranks along [`RankDir`].
	Layered,
	/// Force-directed simulation.
	Force,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RankDir {
	LeftRight,
	TopBottom,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutDirective {
	pub name: LayoutName,
	pub rank_dir: RankDir,
	pub node_sep: f64,
	pub rank_sep: f64,
	pub edge_sep: f64,
	/// Fit the viewport to the result once the layout is placed.
	pub fit: bool,
	pub padding: f64,
	pub animate: bool,
	pub animation_duration_ms: f64,
}

impl Default for LayoutDirective {
	fn default() -> Self {
		Self {
			name: LayoutName::Layered,
			rank_dir: RankDir::LeftRight,
			node_sep: 40.0,
			rank_sep: 70.0,
			edge_sep: 10.0,
			fit: true,
			padding: 30.0,
			animate: true,
			animation_duration_ms: 200.0,
		}
	}
}
