use std::future::{Ready, ready};

use leptos::prelude::*;
use log::info;

use crate::components::flow_graph::{
	FlowGraph, GraphEdge, GraphModel, GraphNode, LayoutDirective, LayoutName, NodeType,
};
use crate::components::smart_table::{CellChange, Column, Row, SelectOption, SmartTable, Sort};

/// Sample life-cycle graph: two processes and the elementary flows they emit.
fn mock_graph() -> GraphModel {
	GraphModel {
		nodes: vec![
			GraphNode::new("process:p1", NodeType::Process, "Steel production"),
			GraphNode::new("process:p2", NodeType::Process, "Car manufacturing"),
			GraphNode::new("elem:el1", NodeType::ElementaryFlow, "CO₂ emissions"),
			GraphNode::new("elem:el2", NodeType::ElementaryFlow, "Water consumption"),
		],
		edges: vec![
			// economic flow
			GraphEdge::new("edge:p1-p2", "process:p1", "process:p2"),
			// elementary flows
			GraphEdge::new("edge:p1-el1", "process:p1", "elem:el1"),
			GraphEdge::new("edge:p1-el2", "process:p1", "elem:el2"),
		],
	}
}

/// The other layout, for the graph panel's toggle button.
fn toggled(name: LayoutName) -> LayoutName {
	match name {
		LayoutName::Layered => LayoutName::Force,
		LayoutName::Force => LayoutName::Layered,
	}
}

fn autocomplete_options() -> Vec<SelectOption> {
	(1..=3)
		.map(|i| SelectOption::new(i.to_string(), format!("Option {i}")))
		.collect()
}

/// Case-insensitive substring match on the option labels.
fn autocomplete_search(query: String) -> Ready<Vec<SelectOption>> {
	let query = query.to_lowercase();
	ready(
		autocomplete_options()
			.into_iter()
			.filter(|o| o.label.to_lowercase().contains(&query))
			.collect(),
	)
}

fn mock_columns() -> Vec<Column> {
	vec![
		Column::new("uuid", "UUID"),
		Column::new("name", "Nom").text(),
		Column::new("age", "Âge").number(),
		Column::new("role", "Rôle").select(vec![
			SelectOption::new("ADMIN", "Administrateur"),
			SelectOption::new("MEMBER", "Membre"),
		]),
		Column::new("autocomplete", "Autocomplete").autocomplete(autocomplete_search),
	]
}

fn mock_rows() -> Vec<Row> {
	vec![
		Row::new()
			.with("uuid", 1i64)
			.with("name", "Alice")
			.with("age", 28i64),
		Row::new()
			.with("uuid", 2i64)
			.with("name", "Bob")
			.with("age", 34i64)
			.with("role", "ADMIN")
			.with("autocomplete", SelectOption::new("2", "Option 2")),
	]
}

/// Host page wiring mock data into the graph and the table.
#[component]
pub fn Dashboard() -> impl IntoView {
	let graph = Signal::derive(mock_graph);
	let rows = Signal::derive(mock_rows);
	let sorting = RwSignal::new(None::<Sort>);
	let layout_name = RwSignal::new(LayoutName::Layered);
	let layout = Signal::derive(move || LayoutDirective {
		name: layout_name.get(),
		..LayoutDirective::default()
	});

	let on_cell_change = Callback::new(|change: CellChange| {
		// a real host would sync this to the backend
		info!("Cell changed {change:?}");
	});
	let on_sort_change = Callback::new(move |sort: Option<Sort>| sorting.set(sort));

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<main class="dashboard">
				<section class="graph-panel">
					<h2>"Process graph"</h2>
					<button
						class="layout-toggle"
						on:click=move |_| layout_name.update(|name| *name = toggled(*name))
					>
						{move || match layout_name.get() {
							LayoutName::Layered => "Switch to force layout",
							LayoutName::Force => "Switch to layered layout",
						}}
					</button>
					<FlowGraph graph=graph layout=layout height=Some(420.0) />
				</section>
				<section class="table-panel">
					<h2>"Members"</h2>
					<p class="subtitle">
						{move || match sorting.get() {
							Some(sort) => format!("Sorted by {} ({})", sort.column_key, sort.order),
							None => "Click a header to sort, click a cell to edit.".to_string(),
						}}
					</p>
					<SmartTable
						columns=mock_columns()
						rows=rows
						on_cell_change=on_cell_change
						on_sort_change=on_sort_change
					/>
				</section>
			</main>
		</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn mock_graph_edges_reference_existing_nodes() {
		let graph = mock_graph();
		for edge in &graph.edges {
			assert!(graph.nodes.iter().any(|n| n.id == edge.source));
			assert!(graph.nodes.iter().any(|n| n.id == edge.target));
		}
	}

	#[test]
	fn layout_toggle_alternates() {
		assert_eq!(toggled(LayoutName::Layered), LayoutName::Force);
		assert_eq!(toggled(toggled(LayoutName::Layered)), LayoutName::Layered);
	}

	#[test]
	fn search_filters_labels_case_insensitively() {
		let hits = autocomplete_search("OPTION 2".into()).into_inner();
		assert_eq!(hits, vec![SelectOption::new("2", "Option 2")]);
		assert_eq!(autocomplete_search(String::new()).into_inner().len(), 3);
	}
}
