//! Imperative mounting of a [`GraphModel`] into a container element.
//!
//! A mount owns its canvas, animation frame loop and every listener it
//! registers, including the window resize listener. [`GraphHandle::destroy`]
//! (also run on drop) releases all of them and removes the canvas. Mounting
//! into a container that already holds a graph disposes that graph first.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use thiserror::Error;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, Event, EventTarget, HtmlCanvasElement, HtmlElement, MouseEvent,
	WheelEvent, Window,
};

use super::config::LayoutConfig;
use super::render;
use super::state::LayoutState;
use super::types::{ClickAction, MountOptions, NavigateFn};
use crate::graph::{ConceptTreeNode, GraphModel, RetrievalInput, YearFilter, flatten};

const FRAME_DT: f32 = 0.016;

/// Why a mount was aborted.
#[derive(Debug, Error)]
pub enum MountError {
	/// Not running in a browser window.
	#[error("no global window")]
	NoWindow,
	/// The window has no document.
	#[error("window has no document")]
	NoDocument,
	/// The canvas element could not be created.
	#[error("could not create canvas: {0}")]
	CanvasCreation(String),
	/// The browser refused a 2D drawing context.
	#[error("2d canvas context unavailable")]
	ContextUnavailable,
}

struct Listener {
	target: EventTarget,
	event: &'static str,
	callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
	fn attach(target: &EventTarget, event: &'static str, f: impl FnMut(Event) + 'static) -> Self {
		let callback = Closure::<dyn FnMut(Event)>::new(f);
		let _ = target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref());
		LISTENERS.set(LISTENERS.get() + 1);
		Self {
			target: target.clone(),
			event,
			callback,
		}
	}
}

impl Drop for Listener {
	fn drop(&mut self) {
		let _ = self
			.target
			.remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
		LISTENERS.set(LISTENERS.get().saturating_sub(1));
	}
}

struct AnimationLoop {
	callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
	frame: Rc<Cell<Option<i32>>>,
}

impl AnimationLoop {
	fn start(window: &Window, state: Rc<RefCell<LayoutState>>, ctx: CanvasRenderingContext2d) -> Self {
		let callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
		let frame: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
		let (callback_inner, frame_inner) = (callback.clone(), frame.clone());

		*callback.borrow_mut() = Some(Closure::new(move || {
			frame_inner.set(None);
			if let Ok(mut s) = state.try_borrow_mut() {
				s.tick(FRAME_DT);
				render::render(&s, &ctx);
			}
			if let (Some(cb), Some(win)) = (callback_inner.borrow().as_ref(), web_sys::window()) {
				frame_inner.set(win.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
			}
		}));
		if let Some(ref cb) = *callback.borrow() {
			frame.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}

		Self { callback, frame }
	}

	fn stop(&self) {
		if let (Some(id), Some(win)) = (self.frame.take(), web_sys::window()) {
			let _ = win.cancel_animation_frame(id);
		}
		// drops the closure and with it the self-reference keeping it alive
		self.callback.borrow_mut().take();
	}
}

struct Mounted {
	canvas: HtmlCanvasElement,
	state: Rc<RefCell<LayoutState>>,
	animation: AnimationLoop,
	listeners: Vec<Listener>,
}

type SharedMount = Rc<RefCell<Option<Mounted>>>;

thread_local! {
	// live mounts keyed by container; a container holds at most one
	static LIVE: RefCell<Vec<(HtmlElement, Weak<RefCell<Option<Mounted>>>)>> =
		const { RefCell::new(Vec::new()) };
	static LISTENERS: Cell<usize> = const { Cell::new(0) };
}

/// Number of DOM listeners currently attached by all live mounts.
pub fn attached_listener_count() -> usize {
	LISTENERS.get()
}

fn register(container: &HtmlElement, shared: &SharedMount) {
	LIVE.with_borrow_mut(|live| {
		live.retain(|(_, weak)| weak.strong_count() > 0);
		live.push((container.clone(), Rc::downgrade(shared)));
	});
}

fn unregister(shared: &SharedMount) {
	let weak = Rc::downgrade(shared);
	LIVE.with_borrow_mut(|live| live.retain(|(_, w)| !w.ptr_eq(&weak) && w.strong_count() > 0));
}

fn dispose_previous(container: &HtmlElement) {
	let previous: Vec<SharedMount> = LIVE.with_borrow(|live| {
		live.iter()
			.filter(|(c, _)| c == container)
			.filter_map(|(_, weak)| weak.upgrade())
			.collect()
	});
	for shared in previous {
		log::debug!("disposing previous graph in container");
		dispose(&shared);
	}
}

fn dispose(shared: &SharedMount) -> bool {
	let Some(mounted) = shared.borrow_mut().take() else {
		return false;
	};
	unregister(shared);
	mounted.animation.stop();
	if let Ok(mut state) = mounted.state.try_borrow_mut() {
		state.stop();
	}
	drop(mounted.listeners);
	mounted.canvas.remove();
	log::debug!("graph unmounted");
	true
}

/// A live graph inside a container.
pub struct GraphHandle {
	shared: SharedMount,
}

impl GraphHandle {
	/// Stops the simulation, detaches every listener and removes the graph's
	/// canvas. Calling it again, or after a newer mount replaced this one,
	/// does nothing.
	pub fn destroy(&mut self) {
		dispose(&self.shared);
	}

	/// Whether the graph is still mounted.
	pub fn is_mounted(&self) -> bool {
		self.shared.borrow().is_some()
	}

	#[cfg(all(test, target_arch = "wasm32"))]
	fn state(&self) -> Option<Rc<RefCell<LayoutState>>> {
		self.shared.borrow().as_ref().map(|m| m.state.clone())
	}
}

impl Drop for GraphHandle {
	fn drop(&mut self) {
		self.destroy();
	}
}

/// Mounts `model` into `container`, disposing whatever graph was mounted
/// there before.
///
/// Returns `None` without touching the container when the model is empty,
/// and `None` after logging when the browser environment is unusable.
pub fn mount(
	container: &HtmlElement,
	model: &GraphModel,
	options: MountOptions,
) -> Option<GraphHandle> {
	if model.is_empty() {
		log::debug!("empty graph, nothing to mount");
		return None;
	}
	dispose_previous(container);
	match try_mount(container, model, options) {
		Ok(handle) => Some(handle),
		Err(err) => {
			log::error!("graph mount aborted: {}", err);
			None
		}
	}
}

fn try_mount(
	container: &HtmlElement,
	model: &GraphModel,
	options: MountOptions,
) -> Result<GraphHandle, MountError> {
	let window = web_sys::window().ok_or(MountError::NoWindow)?;
	let document = window.document().ok_or(MountError::NoDocument)?;
	let canvas: HtmlCanvasElement = document
		.create_element("canvas")
		.map_err(|err| MountError::CanvasCreation(format!("{:?}", err)))?
		.dyn_into()
		.map_err(|_| MountError::CanvasCreation("element is not a canvas".into()))?;
	let ctx: CanvasRenderingContext2d = canvas
		.get_context("2d")
		.ok()
		.flatten()
		.and_then(|ctx| ctx.dyn_into().ok())
		.ok_or(MountError::ContextUnavailable)?;

	let config = options
		.config
		.clone()
		.unwrap_or_else(|| LayoutConfig::for_model(model));
	let (width, height) = config.viewport_size(
		container.client_width() as f64,
		container.client_height() as f64,
	);

	container.set_inner_html("");
	canvas.set_class_name("force-graph-canvas");
	canvas.set_width(width as u32);
	canvas.set_height(height as u32);
	let _ = canvas.style().set_property("display", "block");
	let _ = canvas.style().set_property("cursor", "grab");
	container
		.append_child(&canvas)
		.map_err(|err| MountError::CanvasCreation(format!("{:?}", err)))?;

	let state = Rc::new(RefCell::new(LayoutState::new(
		model,
		config,
		options.highlight_page,
		options.document_href.clone(),
		width,
		height,
	)));
	let listeners = attach_listeners(&window, container, &canvas, &state, options.on_navigate);
	let animation = AnimationLoop::start(&window, state.clone(), ctx);

	log::debug!(
		"graph mounted: {} nodes, {}x{}",
		model.nodes.len(),
		width,
		height
	);
	let shared = Rc::new(RefCell::new(Some(Mounted {
		canvas,
		state,
		animation,
		listeners,
	})));
	register(container, &shared);
	Ok(GraphHandle { shared })
}

fn local_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn dispatch(action: ClickAction, on_navigate: Option<&NavigateFn>) {
	let Some(win) = web_sys::window() else {
		return;
	};
	if let Some(url) = action.external_url.as_deref() {
		let _ = win.open_with_url_and_target(url, "_blank");
	}
	// deferred: the host may remount, which drops the listener running now
	if let Some(navigate) = on_navigate.cloned() {
		let payload = action.payload;
		let run = Closure::once_into_js(move || navigate(&payload));
		let _ = win.set_timeout_with_callback(run.unchecked_ref());
	}
}

fn attach_listeners(
	window: &Window,
	container: &HtmlElement,
	canvas: &HtmlCanvasElement,
	state: &Rc<RefCell<LayoutState>>,
	on_navigate: Option<NavigateFn>,
) -> Vec<Listener> {
	let mut listeners = Vec::with_capacity(6);

	let (state_md, canvas_md) = (state.clone(), canvas.clone());
	listeners.push(Listener::attach(canvas, "mousedown", move |ev| {
		let (x, y) = local_point(&canvas_md, ev.unchecked_ref());
		let mut s = state_md.borrow_mut();
		s.pointer_down(x, y);
		let _ = canvas_md.style().set_property("cursor", s.cursor());
	}));

	let (state_mm, canvas_mm) = (state.clone(), canvas.clone());
	listeners.push(Listener::attach(canvas, "mousemove", move |ev| {
		let (x, y) = local_point(&canvas_mm, ev.unchecked_ref());
		let mut s = state_mm.borrow_mut();
		s.pointer_move(x, y);
		let _ = canvas_mm.style().set_property("cursor", s.cursor());
	}));

	let (state_mu, canvas_mu) = (state.clone(), canvas.clone());
	listeners.push(Listener::attach(canvas, "mouseup", move |_| {
		// release the borrow before the host callback runs; it may remount
		let action = state_mu.borrow_mut().pointer_up();
		let _ = canvas_mu.style().set_property("cursor", state_mu.borrow().cursor());
		if let Some(action) = action {
			dispatch(action, on_navigate.as_ref());
		}
	}));

	let state_ml = state.clone();
	listeners.push(Listener::attach(canvas, "mouseleave", move |_| {
		state_ml.borrow_mut().pointer_leave();
	}));

	let (state_wh, canvas_wh) = (state.clone(), canvas.clone());
	listeners.push(Listener::attach(canvas, "wheel", move |ev| {
		ev.prevent_default();
		let wheel: &WheelEvent = ev.unchecked_ref();
		let (x, y) = local_point(&canvas_wh, wheel);
		state_wh.borrow_mut().zoom_at(x, y, wheel.delta_y());
	}));

	let (state_rs, canvas_rs, container_rs) = (state.clone(), canvas.clone(), container.clone());
	listeners.push(Listener::attach(window, "resize", move |_| {
		let mut s = state_rs.borrow_mut();
		let (w, h) = s.config().viewport_size(
			container_rs.client_width() as f64,
			container_rs.client_height() as f64,
		);
		canvas_rs.set_width(w as u32);
		canvas_rs.set_height(h as u32);
		s.resize(w, h);
		log::debug!("graph resized to {}x{}", w, h);
	}));

	listeners
}

/// Holds at most one mounted graph for a container; mounting again disposes
/// the previous graph first.
#[derive(Default)]
pub struct GraphSlot {
	handle: Option<GraphHandle>,
}

impl GraphSlot {
	/// Disposes the current graph, then mounts `model`. Returns whether a
	/// graph is mounted afterwards.
	pub fn mount(&mut self, container: &HtmlElement, model: &GraphModel, options: MountOptions) -> bool {
		self.clear();
		self.handle = mount(container, model, options);
		self.handle.is_some()
	}

	/// Disposes the current graph, if any.
	pub fn clear(&mut self) {
		if let Some(mut handle) = self.handle.take() {
			handle.destroy();
		}
	}

	/// Whether a graph is mounted.
	pub fn is_mounted(&self) -> bool {
		self.handle.as_ref().is_some_and(GraphHandle::is_mounted)
	}
}

/// A mounted retrieval graph that can be re-filtered by year.
pub struct RetrievalGraph {
	container: HtmlElement,
	input: RetrievalInput,
	year_filter: YearFilter,
	options: MountOptions,
	slot: GraphSlot,
}

impl RetrievalGraph {
	/// Builds and mounts the retrieval graph for `input`.
	pub fn mount(
		container: &HtmlElement,
		input: RetrievalInput,
		year_filter: YearFilter,
		options: MountOptions,
	) -> Option<Self> {
		let mut graph = Self {
			container: container.clone(),
			input,
			year_filter,
			options,
			slot: GraphSlot::default(),
		};
		if graph.remount() { Some(graph) } else { None }
	}

	/// Rebuilds the graph under a new year filter and remounts it.
	pub fn set_year_filter(&mut self, year_filter: YearFilter) {
		if self.year_filter == year_filter && self.slot.is_mounted() {
			return;
		}
		self.year_filter = year_filter;
		self.remount();
	}

	/// Input the graph was built from.
	pub fn input(&self) -> &RetrievalInput {
		&self.input
	}

	/// Active year filter.
	pub fn year_filter(&self) -> YearFilter {
		self.year_filter
	}

	/// Disposes the mounted graph.
	pub fn destroy(&mut self) {
		self.slot.clear();
	}

	fn remount(&mut self) -> bool {
		let model = self.input.build(self.year_filter);
		self.slot.mount(&self.container, &model, self.options.clone())
	}
}

/// Flattens `root` and mounts the resulting concept graph.
pub fn mount_concept_tree(
	container: &HtmlElement,
	root: &ConceptTreeNode,
	options: MountOptions,
) -> Option<GraphHandle> {
	mount(container, &flatten(root), options)
}
