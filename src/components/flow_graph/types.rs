use std::fmt;

/// Category of a graph node, used as the style selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
	Process,
	EconomicFlow,
	ElementaryFlow,
}

impl NodeType {
	pub const ALL: [NodeType; 3] = [
		NodeType::Process,
		NodeType::EconomicFlow,
		NodeType::ElementaryFlow,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			NodeType::Process => "process",
			NodeType::EconomicFlow => "economic_flow",
			NodeType::ElementaryFlow => "elementary_flow",
		}
	}
}

impl fmt::Display for NodeType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode<P = ()> {
	pub id: String,
	pub kind: NodeType,
	pub label: String,
	pub payload: Option<P>,
}

impl<P> GraphNode<P> {
	pub fn new(id: impl Into<String>, kind: NodeType, label: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			kind,
			label: label.into(),
			payload: None,
		}
	}

	pub fn with_payload(mut self, payload: P) -> Self {
		self.payload = Some(payload);
		self
	}
}

/// Directed edge. Endpoints are expected to reference existing node ids;
/// nothing here checks that.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge<P = ()> {
	pub id: String,
	pub source: String,
	pub target: String,
	pub label: Option<String>,
	pub payload: Option<P>,
}

impl<P> GraphEdge<P> {
	pub fn new(
		id: impl Into<String>,
		source: impl Into<String>,
		target: impl Into<String>,
	) -> Self {
		Self {
			id: id.into(),
			source: source.into(),
			target: target.into(),
			label: None,
			payload: None,
		}
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	pub fn with_payload(mut self, payload: P) -> Self {
		self.payload = Some(payload);
		self
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphModel<P = ()> {
	pub nodes: Vec<GraphNode<P>>,
	pub edges: Vec<GraphEdge<P>>,
}

impl<P> Default for GraphModel<P> {
	fn default() -> Self {
		Self {
			nodes: Vec::new(),
			edges: Vec::new(),
		}
	}
}
