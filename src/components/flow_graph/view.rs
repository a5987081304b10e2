use super::elements::{Element, to_elements};
use super::style::{LayoutDirective, StyleSheet};
use super::types::GraphModel;

/// Margin kept around the graph when the view is re-fitted after an update.
pub const FIT_PADDING: f64 = 30.0;

/// The drawing surface the graph view drives.
pub trait Renderer<P> {
	fn clear_elements(&mut self);
	fn add_elements(&mut self, elements: Vec<Element<P>>);
	fn apply_style(&mut self, style: &StyleSheet);
	fn run_layout(&mut self, layout: &LayoutDirective);
	fn fit(&mut self, padding: f64);
}

/// Pushes graph models into a [`Renderer`]. Every update replaces the whole
/// element set.
pub struct GraphView<R> {
	renderer: R,
	style: StyleSheet,
	layout: LayoutDirective,
	fit_padding: f64,
	initialized: bool,
}

impl<R> GraphView<R> {
	pub fn new(renderer: R, style: StyleSheet, layout: LayoutDirective) -> Self {
		Self {
			renderer,
			style,
			layout,
			fit_padding: FIT_PADDING,
			initialized: false,
		}
	}

	pub fn with_fit_padding(mut self, padding: f64) -> Self {
		self.fit_padding = padding;
		self
	}

	pub fn renderer(&self) -> &R {
		&self.renderer
	}

	pub fn renderer_mut(&mut self) -> &mut R {
		&mut self.renderer
	}

	pub fn update<P: Clone>(&mut self, graph: &GraphModel<P>)
	where
		R: Renderer<P>,
	{
		let elements = to_elements(graph);
		if !self.initialized {
			self.renderer.apply_style(&self.style);
			self.renderer.add_elements(elements);
			self.renderer.run_layout(&self.layout);
			self.initialized = true;
			return;
		}
		self.renderer.clear_elements();
		self.renderer.add_elements(elements);
		self.renderer.run_layout(&self.layout);
		self.renderer.fit(self.fit_padding);
	}

	/// Swaps the layout. Once elements are shown they are laid out again in
	/// place and the view is re-fitted.
	pub fn relayout<P>(&mut self, layout: LayoutDirective)
	where
		R: Renderer<P>,
	{
		self.layout = layout;
		if !self.initialized {
			return;
		}
		self.renderer.run_layout(&self.layout);
		self.renderer.fit(self.fit_padding);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::flow_graph::style::LayoutName;
	use crate::components::flow_graph::types::{GraphEdge, GraphNode, NodeType};

	#[derive(Debug, PartialEq)]
	enum Call {
		Clear,
		Add(Vec<String>),
		Style,
		Layout,
		Fit(f64),
	}

	#[derive(Default)]
	struct Recording {
		calls: Vec<Call>,
		live: Vec<String>,
		layout: Option<LayoutName>,
	}

	impl Renderer<()> for Recording {
		fn clear_elements(&mut self) {
			self.live.clear();
			self.calls.push(Call::Clear);
		}

		fn add_elements(&mut self, elements: Vec<Element<()>>) {
			let ids: Vec<String> = elements.iter().map(|e| e.id().to_string()).collect();
			self.live.extend(ids.iter().cloned());
			self.calls.push(Call::Add(ids));
		}

		fn apply_style(&mut self, _style: &StyleSheet) {
			self.calls.push(Call::Style);
		}

		fn run_layout(&mut self, layout: &LayoutDirective) {
			self.layout = Some(layout.name);
			self.calls.push(Call::Layout);
		}

		fn fit(&mut self, padding: f64) {
			self.calls.push(Call::Fit(padding));
		}
	}

	fn graph(ids: &[&str]) -> GraphModel {
		GraphModel {
			nodes: ids
				.iter()
				.map(|id| GraphNode::new(*id, NodeType::Process, *id))
				.collect(),
			edges: ids
				.windows(2)
				.map(|w| GraphEdge::new(format!("{}-{}", w[0], w[1]), w[0], w[1]))
				.collect(),
		}
	}

	fn view() -> GraphView<Recording> {
		GraphView::new(
			Recording::default(),
			StyleSheet::default(),
			LayoutDirective::default(),
		)
	}

	#[test]
	fn first_update_initializes_without_fit() {
		let mut view = view();
		view.update(&graph(&["a", "b"]));
		assert_eq!(
			view.renderer().calls,
			vec![
				Call::Style,
				Call::Add(vec!["a".into(), "b".into(), "a-b".into()]),
				Call::Layout,
			]
		);
	}

	#[test]
	fn later_updates_replace_everything_and_refit() {
		let mut view = view();
		view.update(&graph(&["a", "b"]));
		view.update(&graph(&["c", "d"]));

		assert_eq!(
			view.renderer().calls[3..],
			[
				Call::Clear,
				Call::Add(vec!["c".into(), "d".into(), "c-d".into()]),
				Call::Layout,
				Call::Fit(FIT_PADDING),
			]
		);
		assert_eq!(view.renderer().live, vec!["c", "d", "c-d"]);
	}

	#[test]
	fn custom_fit_padding_is_used() {
		let mut view = view().with_fit_padding(12.0);
		view.update(&graph(&["a"]));
		view.update(&graph(&["a"]));
		assert_eq!(view.renderer().calls.last(), Some(&Call::Fit(12.0)));
	}

	#[test]
	fn relayout_reruns_layout_on_shown_elements() {
		let force = LayoutDirective {
			name: LayoutName::Force,
			..LayoutDirective::default()
		};
		let mut view = view();
		view.relayout::<()>(force);
		assert!(view.renderer().calls.is_empty());

		view.update(&graph(&["a", "b"]));
		assert_eq!(view.renderer().layout, Some(LayoutName::Force));

		view.relayout::<()>(LayoutDirective::default());
		assert_eq!(
			view.renderer().calls[3..],
			[Call::Layout, Call::Fit(FIT_PADDING)]
		);
		assert_eq!(view.renderer().layout, Some(LayoutName::Layered));
		assert_eq!(view.renderer().live, vec!["a", "b", "a-b"]);
	}
}
