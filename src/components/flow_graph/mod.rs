//! Process/flow graph widget drawn on a canvas.

mod component;
mod elements;
mod error;
mod layout;
mod render;
mod scene;
mod style;
mod types;
mod view;

pub use component::FlowGraph;
pub use style::{LayoutDirective, LayoutName};
pub use types::{GraphEdge, GraphModel, GraphNode, NodeType};
