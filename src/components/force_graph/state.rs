use std::collections::HashSet;

use super::config::LayoutConfig;
use super::simulation::{Point, Simulation};
use super::types::ClickAction;
use crate::graph::{GraphModel, NodeKind, NodePayload};

/// Extra hit radius around a node, in graph units.
pub const HIT_SLOP: f64 = 4.0;
/// Pointer travel, in screen pixels, below which a press counts as a click.
pub const CLICK_SLOP: f64 = 3.0;

// per second; the fade in is quicker than the fade out
const FOCUS_IN_RATE: f64 = 9.0;
const FOCUS_OUT_RATE: f64 = 4.0;

/// Per-node drawing and click data, indexed by simulation slot.
#[derive(Clone, Debug)]
pub struct NodeInfo {
	pub label: String,
	pub kind: NodeKind,
	pub emphasis: bool,
	pub highlighted: bool,
	pub radius: f64,
	pub relevance: Option<f64>,
	pub page: Option<u32>,
	pub payload: NodePayload,
}

/// Pan offset and zoom factor applied to graph space.
#[derive(Clone, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node: Option<usize>,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start: Point,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Neighbourhood of the node under the pointer. It outlives the hover while
/// `level` fades back to zero.
#[derive(Clone, Debug, Default)]
pub struct Focus {
	/// Focused node slot.
	pub node: Option<usize>,
	/// Slots linked to `node`.
	pub neighbors: HashSet<usize>,
	/// Emphasis in `[0, 1]`.
	pub level: f64,
	held: bool,
}

/// Everything one mounted graph needs between frames: the simulation, the
/// view transform and pointer interaction state.
pub struct LayoutState {
	pub sim: Simulation,
	pub nodes: Vec<NodeInfo>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub focus: Focus,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	config: LayoutConfig,
	document_href: Option<String>,
}

impl LayoutState {
	/// Lays out `model` in a `width` x `height` viewport.
	pub fn new(
		model: &GraphModel,
		config: LayoutConfig,
		highlight_page: Option<u32>,
		document_href: Option<String>,
		width: f64,
		height: f64,
	) -> Self {
		let sim = Simulation::new(model, &config, Point::new(width / 2.0, height / 2.0));
		let nodes = model
			.nodes
			.iter()
			.map(|node| {
				let page = node.source_position().map(|p| p.page);
				let emphasis = node.is_emphasis();
				NodeInfo {
					label: node.label.clone(),
					kind: node.kind(),
					emphasis,
					highlighted: highlight_page.is_some() && page == highlight_page,
					radius: if emphasis {
						config.node_radius_emphasis
					} else {
						config.node_radius
					},
					relevance: node.relevance_score(),
					page,
					payload: node.payload.clone(),
				}
			})
			.collect();

		Self {
			sim,
			nodes,
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			focus: Focus::default(),
			width,
			height,
			animation_running: true,
			config,
			document_href,
		}
	}

	/// Converts canvas coordinates to graph space.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Nearest node under a canvas point, if any.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let point = {
			let (gx, gy) = self.screen_to_graph(sx, sy);
			Point::new(gx, gy)
		};
		// hit radius is in graph space, scales with zoom like nodes
		self.sim
			.positions()
			.iter()
			.enumerate()
			.map(|(idx, p)| (idx, p.distance(point)))
			.filter(|&(idx, d)| d <= self.nodes[idx].radius + HIT_SLOP)
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(idx, _)| idx)
	}

	/// Starts a node drag or a background pan.
	pub fn pointer_down(&mut self, x: f64, y: f64) {
		if let Some(idx) = self.node_at_position(x, y) {
			let at = self.sim.position(idx);
			self.drag = DragState {
				active: true,
				node: Some(idx),
				moved: false,
				start_x: x,
				start_y: y,
				node_start: at,
			};
			self.sim.pin(idx, at);
			self.sim.set_alpha_target(self.config.drag_alpha_target);
			self.sim.reheat(self.config.drag_alpha_target);
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

	/// Updates hover, the dragged node or the pan offset.
	pub fn pointer_move(&mut self, x: f64, y: f64) {
		if !self.drag.active {
			let hovered = self.node_at_position(x, y);
			self.set_hover(hovered);
		}

		if self.drag.active {
			if let Some(idx) = self.drag.node {
				let (dx, dy) = (x - self.drag.start_x, y - self.drag.start_y);
				if dx.hypot(dy) > CLICK_SLOP {
					self.drag.moved = true;
				}
				let k = self.transform.k;
				let at = Point::new(
					self.drag.node_start.x + dx / k,
					self.drag.node_start.y + dy / k,
				);
				self.sim.pin(idx, at);
			}
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
		}
	}

	/// Ends a drag or pan. A press on a node that barely moved is a click;
	/// its navigation action, if any, is returned.
	pub fn pointer_up(&mut self) -> Option<ClickAction> {
		let clicked = match self.end_drag() {
			Some((idx, false)) => self.click_action(idx),
			_ => None,
		};
		self.pan.active = false;
		clicked
	}

	/// Cancels any gesture and clears hover.
	pub fn pointer_leave(&mut self) {
		self.end_drag();
		self.pan.active = false;
		self.set_hover(None);
	}

	fn end_drag(&mut self) -> Option<(usize, bool)> {
		if !self.drag.active {
			return None;
		}
		let ended = self.drag.node.map(|idx| (idx, self.drag.moved));
		if let Some(idx) = self.drag.node {
			self.sim.release(idx);
		}
		self.sim.set_alpha_target(0.0);
		self.drag = DragState::default();
		ended
	}

	/// Zooms around a screen point. The factor stays within the configured
	/// extent; node coordinates are untouched.
	pub fn zoom_at(&mut self, x: f64, y: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(self.config.min_zoom, self.config.max_zoom);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// What clicking node `idx` does. The query and the tree root are inert.
	pub fn click_action(&self, idx: usize) -> Option<ClickAction> {
		let node = self.nodes.get(idx)?;
		if node.emphasis {
			return None;
		}
		let external_url = match (node.kind, node.page, &self.document_href) {
			(NodeKind::Concept, Some(page), Some(href)) => Some(format!("{}#page={}", href, page)),
			_ => None,
		};
		Some(ClickAction {
			payload: node.payload.clone(),
			external_url,
		})
	}

	/// CSS cursor for the current pointer state.
	pub fn cursor(&self) -> &'static str {
		if self.drag.active {
			return "grabbing";
		}
		match self.hovered().and_then(|idx| self.nodes.get(idx)) {
			Some(node) if node.emphasis => "default",
			Some(_) => "pointer",
			None => "grab",
		}
	}

	/// Moves focus to `node`, or lets the current focus fade out on `None`.
	pub fn set_hover(&mut self, node: Option<usize>) {
		let Some(idx) = node else {
			self.focus.held = false;
			return;
		};
		if self.focus.held && self.focus.node == Some(idx) {
			return;
		}
		self.focus.node = Some(idx);
		self.focus.neighbors = self.sim.neighbors(idx).collect();
		self.focus.held = true;
	}

	/// Node currently under the pointer.
	pub fn hovered(&self) -> Option<usize> {
		self.focus.node.filter(|_| self.focus.held)
	}

	/// Whether `idx` is the focused node or one of its neighbours.
	pub fn in_focus(&self, idx: usize) -> bool {
		self.focus.node == Some(idx) || self.focus.neighbors.contains(&idx)
	}

	/// Advances the simulation and the focus fade by `dt` seconds.
	pub fn tick(&mut self, dt: f32) {
		if !self.animation_running {
			return;
		}
		self.sim.tick(dt);

		let target = if self.focus.held { 1.0 } else { 0.0 };
		let rate = if self.focus.held { FOCUS_IN_RATE } else { FOCUS_OUT_RATE };
		self.focus.level += (target - self.focus.level) * (1.0 - (-rate * dt as f64).exp());
		if !self.focus.held && self.focus.level < 0.01 {
			self.focus = Focus::default();
		}
	}

	/// Tracks a new viewport size: re-centres the layout and injects energy
	/// so it spreads into the new bounds.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.sim.set_center(Point::new(width / 2.0, height / 2.0));
		self.sim.reheat(self.config.resize_alpha);
	}

	/// Stops animating for good.
	pub fn stop(&mut self) {
		self.animation_running = false;
		self.sim.stop();
		self.drag = DragState::default();
		self.pan.active = false;
	}

	/// Active layout parameters.
	pub fn config(&self) -> &LayoutConfig {
		&self.config
	}
}
