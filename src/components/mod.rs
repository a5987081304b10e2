pub mod flow_graph;
pub mod smart_table;
