//! Translation of a [`GraphModel`] into the flat element list a renderer
//! consumes.

use super::types::{GraphModel, NodeType};

#[derive(Clone, Debug, PartialEq)]
pub struct NodeElement<P> {
	pub id: String,
	pub label: String,
	pub kind: NodeType,
	pub payload: Option<P>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeElement<P> {
	pub id: String,
	pub source: String,
	pub target: String,
	pub label: String,
	pub payload: Option<P>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Element<P> {
	Node(NodeElement<P>),
	Edge(EdgeElement<P>),
}

impl<P> Element<P> {
	pub fn id(&self) -> &str {
		match self {
			Element::Node(n) => &n.id,
			Element::Edge(e) => &e.id,
		}
	}
}

/// Nodes first, then edges, each in model order. Missing edge labels become
/// the empty string.
pub fn to_elements<P: Clone>(graph: &GraphModel<P>) -> Vec<Element<P>> {
	let nodes = graph.nodes.iter().map(|n| {
		Element::Node(NodeElement {
			id: n.id.clone(),
			label: n.label.clone(),
			kind: n.kind,
			payload: n.payload.clone(),
		})
	});
	let edges = graph.edges.iter().map(|e| {
		Element::Edge(EdgeElement {
			id: e.id.clone(),
			source: e.source.clone(),
			target: e.target.clone(),
			label: e.label.clone().unwrap_or_default(),
			payload: e.payload.clone(),
		})
	});
	nodes.chain(edges).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::flow_graph::types::{GraphEdge, GraphNode};

	#[test]
	fn two_processes_and_one_edge() {
		let graph: GraphModel = GraphModel {
			nodes: vec![
				GraphNode::new("process:p1", NodeType::Process, "Steel production"),
				GraphNode::new("process:p2", NodeType::Process, "Car manufacturing"),
			],
			edges: vec![GraphEdge::new("edge:p1-p2", "process:p1", "process:p2")],
		};

		let elements = to_elements(&graph);
		let nodes: Vec<_> = elements
			.iter()
			.filter(|e| matches!(e, Element::Node(_)))
			.collect();
		let edges: Vec<_> = elements
			.iter()
			.filter_map(|e| match e {
				Element::Edge(edge) => Some(edge),
				Element::Node(_) => None,
			})
			.collect();

		assert_eq!(nodes.len(), 2);
		assert_eq!(edges.len(), 1);
		assert_eq!(edges[0].source, "process:p1");
		assert_eq!(edges[0].target, "process:p2");
		assert_eq!(edges[0].label, "");
	}

	#[test]
	fn carries_type_label_and_payload() {
		let graph = GraphModel {
			nodes: vec![
				GraphNode::new("elem:el1", NodeType::ElementaryFlow, "CO2 emissions")
					.with_payload(42u32),
			],
			edges: vec![
				GraphEdge::new("e1", "elem:el1", "elem:el1")
					.with_label("kg")
					.with_payload(7u32),
			],
		};

		let elements = to_elements(&graph);
		assert_eq!(
			elements[0],
			Element::Node(NodeElement {
				id: "elem:el1".into(),
				label: "CO2 emissions".into(),
				kind: NodeType::ElementaryFlow,
				payload: Some(42),
			})
		);
		match &elements[1] {
			Element::Edge(edge) => {
				assert_eq!(edge.label, "kg");
				assert_eq!(edge.payload, Some(7));
			}
			Element::Node(_) => panic!("expected an edge element"),
		}
	}

	#[test]
	fn empty_model_yields_no_elements() {
		let graph: GraphModel = GraphModel::default();
		assert!(to_elements(&graph).is_empty());
	}
}
