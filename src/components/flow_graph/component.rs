use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, error, info};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::error::CanvasError;
use super::render;
use super::scene::{Scene, TextMeasure};
use super::style::{LayoutDirective, StyleSheet};
use super::types::GraphModel;
use super::view::{FIT_PADDING, GraphView};

pub const DEFAULT_WHEEL_SENSITIVITY: f64 = 0.2;
/// Upper bound on one animation step, so a backgrounded tab does not jump.
const MAX_FRAME_MS: f64 = 100.0;

type SharedView<P> = Rc<RefCell<Option<GraphView<Scene<P>>>>>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Canvas-backed flow graph. Every change of `graph` replaces all rendered
/// elements, re-runs the layout and re-fits the view.
#[component]
pub fn FlowGraph<P>(
	graph: Signal<GraphModel<P>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(default = DEFAULT_WHEEL_SENSITIVITY)] wheel_sensitivity: f64,
	#[prop(default = FIT_PADDING)] fit_padding: f64,
	#[prop(optional, into)] layout: Option<Signal<LayoutDirective>>,
	#[prop(optional)] style: Option<StyleSheet>,
	#[prop(optional, into)] on_node_tap: Option<Callback<String>>,
) -> impl IntoView
where
	P: Clone + Debug + Send + Sync + 'static,
{
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let view: SharedView<P> = Rc::new(RefCell::new(None));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let resize_cb: FrameCallback = Rc::new(RefCell::new(None));
	let (view_init, animate_init, resize_cb_init) =
		(view.clone(), animate.clone(), resize_cb.clone());
	let layout = layout.unwrap_or_else(|| Signal::derive(LayoutDirective::default));
	let style = style.unwrap_or_default();

	Effect::new(move |_| {
		let model = graph.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();

		if view_init.borrow().is_none() {
			let mounted = mount(
				&canvas,
				MountOptions {
					fullscreen,
					width,
					height,
					fit_padding,
					layout: layout.get_untracked(),
					style: style.clone(),
				},
				&view_init,
				&animate_init,
				&resize_cb_init,
			);
			if let Err(err) = mounted {
				error!("flow graph canvas unavailable: {err}");
				return;
			}
		}

		if let Some(view) = view_init.borrow_mut().as_mut() {
			debug!(
				"flow graph update: {} nodes, {} edges",
				model.nodes.len(),
				model.edges.len()
			);
			view.update(&model);
		}
	});

	let view_layout = view.clone();
	Effect::new(move |prev: Option<()>| {
		let directive = layout.get();
		if prev.is_none() {
			return;
		}
		if let Some(v) = view_layout.borrow_mut().as_mut() {
			debug!("flow graph layout switched to {:?}", directive.name);
			v.relayout::<P>(directive);
		}
	});

	let view_md = view.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(v) = view_md.borrow_mut().as_mut() {
			v.renderer_mut().pointer_down(x, y);
		}
	};

	let view_mm = view.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(v) = view_mm.borrow_mut().as_mut() {
			v.renderer_mut().pointer_move(x, y);
		}
	};

	let view_mu = view.clone();
	let on_mouseup = move |_: MouseEvent| {
		let tapped = view_mu.borrow_mut().as_mut().and_then(|v| {
			let scene = v.renderer_mut();
			let idx = scene.pointer_up()?;
			let node = scene.nodes.get(idx)?;
			info!("node clicked {} {:?}", node.id, node.payload);
			Some(node.id.clone())
		});
		if let (Some(id), Some(cb)) = (tapped, on_node_tap) {
			cb.run(id);
		}
	};

	let view_ml = view.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(v) = view_ml.borrow_mut().as_mut() {
			v.renderer_mut().pointer_leave();
		}
	};

	let view_wh = view.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(v) = view_wh.borrow_mut().as_mut() {
			v.renderer_mut()
				.zoom_at(x, y, ev.delta_y(), wheel_sensitivity);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="flow-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}

struct MountOptions {
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
	fit_padding: f64,
	layout: LayoutDirective,
	style: StyleSheet,
}

fn mount<P: 'static>(
	canvas: &HtmlCanvasElement,
	options: MountOptions,
	view: &SharedView<P>,
	animate: &FrameCallback,
	resize_cb: &FrameCallback,
) -> Result<(), CanvasError> {
	let window: Window = web_sys::window().ok_or(CanvasError::NoWindow)?;

	let (w, h) = if options.fullscreen {
		window_size(&window)?
	} else {
		(
			options.width.unwrap_or_else(|| {
				canvas
					.parent_element()
					.map(|p| p.client_width() as f64)
					.unwrap_or(800.0)
			}),
			options.height.unwrap_or_else(|| {
				canvas
					.parent_element()
					.map(|p| p.client_height() as f64)
					.unwrap_or(600.0)
			}),
		)
	};
	canvas.set_width(w as u32);
	canvas.set_height(h as u32);

	let ctx: CanvasRenderingContext2d = canvas
		.get_context("2d")?
		.ok_or(CanvasError::NoContext)?
		.dyn_into()
		.map_err(|_| CanvasError::NoContext)?;

	let scene = Scene::new(w, h, canvas_measure(ctx.clone()));
	*view.borrow_mut() = Some(
		GraphView::new(scene, options.style, options.layout).with_fit_padding(options.fit_padding),
	);

	if options.fullscreen {
		let (view_resize, canvas_resize) = (view.clone(), canvas.clone());
		*resize_cb.borrow_mut() = Some(Closure::new(move || {
			let Some(win) = web_sys::window() else {
				return;
			};
			let Ok((nw, nh)) = window_size(&win) else {
				return;
			};
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(v) = view_resize.borrow_mut().as_mut() {
				v.renderer_mut().resize(nw, nh);
			}
		}));
		if let Some(ref cb) = *resize_cb.borrow() {
			window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref())?;
		}
	}

	let (view_anim, animate_inner) = (view.clone(), animate.clone());
	let last_frame = Cell::new(js_sys::Date::now());
	*animate.borrow_mut() = Some(Closure::new(move || {
		let now = js_sys::Date::now();
		let dt = (now - last_frame.replace(now)).clamp(0.0, MAX_FRAME_MS);
		if let Some(v) = view_anim.borrow_mut().as_mut() {
			let scene = v.renderer_mut();
			scene.tick(dt);
			render::render(scene, &ctx);
		}
		if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
			let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	}));
	if let Some(ref cb) = *animate.borrow() {
		window.request_animation_frame(cb.as_ref().unchecked_ref())?;
	}
	Ok(())
}

fn canvas_measure(ctx: CanvasRenderingContext2d) -> TextMeasure {
	Box::new(move |text: &str, font_size: f64| {
		ctx.set_font(&format!("{font_size}px sans-serif"));
		ctx.measure_text(text)
			.map(|m| m.width())
			.unwrap_or(text.chars().count() as f64 * font_size * 0.6)
	})
}

fn window_size(window: &Window) -> Result<(f64, f64), CanvasError> {
	let w = window.inner_width()?.as_f64().ok_or(CanvasError::NoWindow)?;
	let h = window.inner_height()?.as_f64().ok_or(CanvasError::NoWindow)?;
	Ok((w, h))
}

fn local_position(
	canvas_ref: NodeRef<leptos::html::Canvas>,
	ev: &MouseEvent,
) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}
