//! Headless force simulation.
//!
//! `force_graph` integrates many-body repulsion and velocities. Link rest
//! lengths, collision and centering run afterwards as positional passes,
//! all scaled by the simulation energy (`alpha`). Energy decays toward a
//! target every tick; drag and resize raise it again. Once below
//! `alpha_min` the layout is settled and ticks stop moving nodes until
//! energy is injected.

use std::collections::HashMap;
use std::f64::consts::TAU;

use force_graph::{ForceGraph, NodeData, SimulationParameters};

use super::config::LayoutConfig;
use crate::graph::{GraphModel, LinkKind};

const BODY_MASS: f32 = 10.0;
const FORCE_MAX: f32 = 100.0;
const NODE_SPEED: f32 = 3000.0;
const DAMPING: f32 = 0.9;
const COLLIDE_STRENGTH: f64 = 1.0;
const INITIAL_RING: f64 = 100.0;

/// A point in simulation (graph) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Point {
	/// Creates a point.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance.
	pub fn distance(self, other: Point) -> f64 {
		(self.x - other.x).hypot(self.y - other.y)
	}
}

#[derive(Clone, Copy, Debug, Default)]
struct Body {
	slot: usize,
}

/// A link with endpoints resolved to node slots.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimLink {
	/// Source slot.
	pub source: usize,
	/// Target slot.
	pub target: usize,
	/// Link type.
	pub kind: LinkKind,
	/// Similarity weight, if any.
	pub weight: Option<f64>,
	/// Rest length.
	pub distance: f64,
}

/// Force-directed layout of one graph.
pub struct Simulation {
	graph: ForceGraph<Body, ()>,
	positions: Vec<Point>,
	pins: Vec<Option<Point>>,
	radii: Vec<f64>,
	links: Vec<SimLink>,
	degrees: Vec<usize>,
	link_strength: f64,
	center: Point,
	alpha: f64,
	alpha_target: f64,
	alpha_min: f64,
	alpha_decay: f64,
	ticks: u64,
	stopped: bool,
}

impl Simulation {
	/// Places the model's nodes around `center` and resolves its links.
	/// Links naming unknown ids are dropped.
	pub fn new(model: &GraphModel, config: &LayoutConfig, center: Point) -> Self {
		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: config.charge,
			force_spring: 0.0,
			force_max: FORCE_MAX,
			node_speed: NODE_SPEED,
			damping_factor: DAMPING,
		});

		let count = model.nodes.len();
		let mut slots = HashMap::with_capacity(count);
		let mut positions = Vec::with_capacity(count);
		let mut radii = Vec::with_capacity(count);

		for (slot, node) in model.nodes.iter().enumerate() {
			let position = if node.is_emphasis() || count == 1 {
				center
			} else {
				let angle = slot as f64 * TAU / count as f64;
				Point::new(
					center.x + INITIAL_RING * angle.cos(),
					center.y + INITIAL_RING * angle.sin(),
				)
			};
			graph.add_node(NodeData {
				x: position.x as f32,
				y: position.y as f32,
				mass: BODY_MASS,
				is_anchor: false,
				user_data: Body { slot },
			});
			slots.insert(node.id.as_str(), slot);
			positions.push(position);
			radii.push(if node.is_emphasis() {
				config.collide_radius_emphasis
			} else {
				config.collide_radius
			});
		}

		let mut degrees = vec![0; count];
		let links: Vec<SimLink> = model
			.links
			.iter()
			.filter_map(|link| {
				let (Some(&source), Some(&target)) =
					(slots.get(link.source.as_str()), slots.get(link.target.as_str()))
				else {
					log::debug!("dropping link {} -> {}", link.source, link.target);
					return None;
				};
				degrees[source] += 1;
				degrees[target] += 1;
				Some(SimLink {
					source,
					target,
					kind: link.kind,
					weight: link.weight,
					distance: config.link_distance(link.kind),
				})
			})
			.collect();

		Self {
			graph,
			positions,
			pins: vec![None; count],
			radii,
			links,
			degrees,
			link_strength: config.link_strength,
			center,
			alpha: 1.0,
			alpha_target: 0.0,
			alpha_min: config.alpha_min,
			alpha_decay: config.alpha_decay,
			ticks: 0,
			stopped: false,
		}
	}

	/// Advances the layout by one step. Returns whether nodes were moved.
	pub fn tick(&mut self, dt: f32) -> bool {
		if self.stopped {
			return false;
		}
		self.ticks += 1;
		self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
		if self.is_settled() {
			self.apply_pins();
			return false;
		}

		let alpha = self.alpha;
		self.push_to_graph();
		self.graph.update(dt * alpha as f32);
		self.pull_from_graph();

		apply_links(
			&mut self.positions,
			&self.links,
			&self.degrees,
			self.link_strength * alpha,
		);
		apply_collisions(&mut self.positions, &self.radii, COLLIDE_STRENGTH);
		apply_centering(&mut self.positions, self.center);
		self.apply_pins();
		true
	}

	/// Raises the energy to at least `alpha`.
	pub fn reheat(&mut self, alpha: f64) {
		self.alpha = self.alpha.max(alpha);
	}

	/// Sets the energy the simulation decays toward.
	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target.max(0.0);
	}

	/// Current energy.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Whether energy is below `alpha_min` with nothing holding it up.
	pub fn is_settled(&self) -> bool {
		self.alpha < self.alpha_min && self.alpha_target < self.alpha_min
	}

	/// Moves the point the layout is pulled toward.
	pub fn set_center(&mut self, center: Point) {
		self.center = center;
	}

	/// Point the layout is pulled toward.
	pub fn center(&self) -> Point {
		self.center
	}

	/// Fixes a node at `at` until released.
	pub fn pin(&mut self, slot: usize, at: Point) {
		if let Some(pin) = self.pins.get_mut(slot) {
			*pin = Some(at);
			self.positions[slot] = at;
		}
	}

	/// Lets a pinned node move freely again.
	pub fn release(&mut self, slot: usize) {
		if let Some(pin) = self.pins.get_mut(slot) {
			*pin = None;
		}
	}

	/// Whether the node is pinned.
	pub fn is_pinned(&self, slot: usize) -> bool {
		self.pins.get(slot).is_some_and(Option::is_some)
	}

	/// Halts the simulation for good; later ticks do nothing.
	pub fn stop(&mut self) {
		self.stopped = true;
	}

	/// Whether [`Simulation::stop`] was called.
	pub fn is_stopped(&self) -> bool {
		self.stopped
	}

	/// Ticks processed so far.
	pub fn tick_count(&self) -> u64 {
		self.ticks
	}

	/// Number of nodes.
	pub fn len(&self) -> usize {
		self.positions.len()
	}

	/// Whether the simulation holds no nodes.
	pub fn is_empty(&self) -> bool {
		self.positions.is_empty()
	}

	/// Position of a node.
	pub fn position(&self, slot: usize) -> Point {
		self.positions[slot]
	}

	/// All positions, indexed by slot.
	pub fn positions(&self) -> &[Point] {
		&self.positions
	}

	/// Collision radius of a node.
	pub fn radius(&self, slot: usize) -> f64 {
		self.radii[slot]
	}

	/// Slots linked to `slot`, in link order.
	pub fn neighbors(&self, slot: usize) -> impl Iterator<Item = usize> + '_ {
		self.links.iter().filter_map(move |link| {
			if link.source == slot {
				Some(link.target)
			} else if link.target == slot {
				Some(link.source)
			} else {
				None
			}
		})
	}

	/// Resolved links.
	pub fn links(&self) -> &[SimLink] {
		&self.links
	}

	fn push_to_graph(&mut self) {
		let (positions, pins) = (&self.positions, &self.pins);
		self.graph.visit_nodes_mut(|node| {
			let slot = node.data.user_data.slot;
			node.data.x = positions[slot].x as f32;
			node.data.y = positions[slot].y as f32;
			node.data.is_anchor = pins[slot].is_some();
		});
	}

	fn pull_from_graph(&mut self) {
		let positions = &mut self.positions;
		self.graph.visit_nodes(|node| {
			let (x, y) = (node.x() as f64, node.y() as f64);
			if x.is_finite() && y.is_finite() {
				positions[node.data.user_data.slot] = Point::new(x, y);
			}
		});
	}

	fn apply_pins(&mut self) {
		for (position, pin) in self.positions.iter_mut().zip(&self.pins) {
			if let Some(pin) = pin {
				*position = *pin;
			}
		}
	}
}

// Deterministic nudge for coincident points.
fn jiggle(a: usize, b: usize) -> (f64, f64) {
	let angle = ((a as f64) * 0.618_034 + (b as f64) * 0.414_214) * TAU;
	(angle.cos() * 1e-3, angle.sin() * 1e-3)
}

/// Moves link endpoints toward the link's rest length. The endpoint with
/// more links moves less.
pub(crate) fn apply_links(
	positions: &mut [Point],
	links: &[SimLink],
	degrees: &[usize],
	strength: f64,
) {
	for link in links {
		let (s, t) = (link.source, link.target);
		if s == t {
			continue;
		}
		let (mut dx, mut dy) = (
			positions[t].x - positions[s].x,
			positions[t].y - positions[s].y,
		);
		let length = dx.hypot(dy);
		if length == 0.0 {
			(dx, dy) = jiggle(s, t);
		}
		// (dx, dy) only gives the direction; scale by the real separation
		let k = (length - link.distance) / dx.hypot(dy) * strength;
		let (dx, dy) = (dx * k, dy * k);
		let total = (degrees[s] + degrees[t]).max(1) as f64;
		let bias = degrees[s] as f64 / total;

		positions[t].x -= dx * bias;
		positions[t].y -= dy * bias;
		positions[s].x += dx * (1.0 - bias);
		positions[s].y += dy * (1.0 - bias);
	}
}

/// Pushes overlapping circles apart.
pub(crate) fn apply_collisions(positions: &mut [Point], radii: &[f64], strength: f64) {
	for i in 0..positions.len() {
		for j in (i + 1)..positions.len() {
			let min_distance = radii[i] + radii[j];
			let (mut dx, mut dy) = (
				positions[j].x - positions[i].x,
				positions[j].y - positions[i].y,
			);
			let distance = dx.hypot(dy);
			if distance >= min_distance {
				continue;
			}
			if distance == 0.0 {
				(dx, dy) = jiggle(i, j);
			}
			let push = (min_distance - distance) / dx.hypot(dy) * strength * 0.5;
			positions[i].x -= dx * push;
			positions[i].y -= dy * push;
			positions[j].x += dx * push;
			positions[j].y += dy * push;
		}
	}
}

/// Translates every point so their mean lands on `center`.
pub(crate) fn apply_centering(positions: &mut [Point], center: Point) {
	if positions.is_empty() {
		return;
	}
	let n = positions.len() as f64;
	let (sx, sy) = positions
		.iter()
		.fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
	let (shift_x, shift_y) = (center.x - sx / n, center.y - sy / n);
	for p in positions.iter_mut() {
		p.x += shift_x;
		p.y += shift_y;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{ConceptTreeNode, Link, flatten, retrieval};

	fn link(source: usize, target: usize, distance: f64) -> SimLink {
		SimLink {
			source,
			target,
			kind: LinkKind::Hierarchy,
			weight: None,
			distance,
		}
	}

	fn tree() -> GraphModel {
		flatten(&ConceptTreeNode::leaf("root", "R").with_children([
			ConceptTreeNode::leaf("a", "A"),
			ConceptTreeNode::leaf("b", "B").with_children([ConceptTreeNode::leaf("c", "C")]),
		]))
	}

	// --- Passes ---

	#[test]
	fn link_pass_pulls_toward_rest_length() {
		let mut positions = vec![Point::new(0.0, 0.0), Point::new(200.0, 0.0)];
		apply_links(&mut positions, &[link(0, 1, 90.0)], &[1, 1], 0.5);
		let d = positions[0].distance(positions[1]);
		assert!((d - 145.0).abs() < 1e-9, "{}", d);
	}

	#[test]
	fn link_pass_pushes_apart_when_too_close() {
		let mut positions = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
		apply_links(&mut positions, &[link(0, 1, 70.0)], &[1, 1], 0.6);
		assert!(positions[0].distance(positions[1]) > 10.0);
	}

	#[test]
	fn busier_endpoint_moves_less() {
		let mut positions = vec![Point::new(0.0, 0.0), Point::new(200.0, 0.0)];
		apply_links(&mut positions, &[link(0, 1, 100.0)], &[3, 1], 1.0);
		let moved_source = positions[0].x.abs();
		let moved_target = (200.0 - positions[1].x).abs();
		assert!(moved_source < moved_target);
	}

	#[test]
	fn collision_pass_separates_overlaps() {
		let mut positions = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
		apply_collisions(&mut positions, &[14.0, 14.0], 1.0);
		assert!((positions[0].distance(positions[1]) - 28.0).abs() < 1e-9);
	}

	#[test]
	fn collision_pass_handles_coincident_points() {
		let mut positions = vec![Point::new(5.0, 5.0), Point::new(5.0, 5.0)];
		apply_collisions(&mut positions, &[14.0, 18.0], 1.0);
		let d = positions[0].distance(positions[1]);
		assert!(d.is_finite() && (d - 32.0).abs() < 1e-6, "{}", d);
	}

	#[test]
	fn coincident_link_endpoints_separate_to_rest_length() {
		let mut positions = vec![Point::new(3.0, 3.0), Point::new(3.0, 3.0)];
		let links = [SimLink {
			source: 0,
			target: 1,
			kind: LinkKind::Hierarchy,
			weight: None,
			distance: 70.0,
		}];
		apply_links(&mut positions, &links, &[1, 1], 1.0);
		let d = positions[0].distance(positions[1]);
		assert!((d - 70.0).abs() < 1e-6, "{}", d);
	}

	#[test]
	fn half_strength_collision_closes_half_the_overlap() {
		let mut positions = vec![Point::new(0.0, 0.0), Point::new(0.0, 0.0)];
		apply_collisions(&mut positions, &[10.0, 10.0], 0.5);
		let d = positions[0].distance(positions[1]);
		assert!((d - 10.0).abs() < 1e-6, "{}", d);
	}

	#[test]
	fn centering_moves_mean_to_center() {
		let mut positions = vec![Point::new(0.0, 0.0), Point::new(20.0, 20.0)];
		apply_centering(&mut positions, Point::new(50.0, 50.0));
		assert_eq!(positions[0], Point::new(40.0, 40.0));
		assert_eq!(positions[1], Point::new(60.0, 60.0));
	}

	// --- Simulation ---

	#[test]
	fn emphasis_node_starts_at_center() {
		let sim = Simulation::new(&tree(), &LayoutConfig::hierarchy(), Point::new(320.0, 200.0));
		assert_eq!(sim.position(0), Point::new(320.0, 200.0));
		assert_eq!(sim.len(), 4);
		assert_eq!(sim.links().len(), 3);
		assert_eq!(sim.radius(0), 18.0);
		assert_eq!(sim.radius(1), 14.0);
	}

	#[test]
	fn dangling_links_are_dropped() {
		let mut model = tree();
		model.links.push(Link {
			source: "c".into(),
			target: "nowhere".into(),
			kind: LinkKind::Hierarchy,
			weight: None,
		});
		let sim = Simulation::new(&model, &LayoutConfig::hierarchy(), Point::default());
		assert_eq!(sim.links().len(), 3);
	}

	#[test]
	fn link_distances_follow_kind() {
		let docs = [
			crate::graph::Document {
				id: "p1".into(),
				..Default::default()
			},
			crate::graph::Document {
				id: "p2".into(),
				..Default::default()
			},
		];
		let sims = [crate::graph::SimilarityPair {
			a: "p1".into(),
			b: "p2".into(),
			similarity: 0.5,
		}];
		let model = retrieval::build("q", &docs, &sims, Default::default());
		let sim = Simulation::new(&model, &LayoutConfig::retrieval(), Point::default());
		let distances: Vec<(LinkKind, f64)> =
			sim.links().iter().map(|l| (l.kind, l.distance)).collect();
		assert_eq!(
			distances,
			[
				(LinkKind::Relevance, 90.0),
				(LinkKind::Relevance, 90.0),
				(LinkKind::Similarity, 70.0)
			]
		);
	}

	#[test]
	fn ticks_keep_positions_finite_and_centered() {
		let center = Point::new(320.0, 200.0);
		let mut sim = Simulation::new(&tree(), &LayoutConfig::hierarchy(), center);
		for _ in 0..120 {
			sim.tick(0.016);
		}
		assert!(sim.positions().iter().all(|p| p.x.is_finite() && p.y.is_finite()));
		let n = sim.len() as f64;
		let mean_x = sim.positions().iter().map(|p| p.x).sum::<f64>() / n;
		let mean_y = sim.positions().iter().map(|p| p.y).sum::<f64>() / n;
		assert!((mean_x - center.x).abs() < 1e-6);
		assert!((mean_y - center.y).abs() < 1e-6);
	}

	#[test]
	fn energy_decays_until_settled() {
		let mut sim = Simulation::new(&tree(), &LayoutConfig::hierarchy(), Point::default());
		for _ in 0..400 {
			sim.tick(0.016);
		}
		assert!(sim.is_settled());
		let before = sim.positions().to_vec();
		assert!(!sim.tick(0.016));
		assert_eq!(sim.positions(), &before[..]);
	}

	#[test]
	fn reheat_wakes_a_settled_layout() {
		let mut sim = Simulation::new(&tree(), &LayoutConfig::hierarchy(), Point::default());
		for _ in 0..400 {
			sim.tick(0.016);
		}
		sim.reheat(0.3);
		assert!(!sim.is_settled());
		assert!(sim.tick(0.016));
	}

	#[test]
	fn alpha_target_holds_energy_up() {
		let mut sim = Simulation::new(&tree(), &LayoutConfig::hierarchy(), Point::default());
		sim.set_alpha_target(0.3);
		for _ in 0..1000 {
			sim.tick(0.016);
		}
		assert!((sim.alpha() - 0.3).abs() < 0.01);
		sim.set_alpha_target(0.0);
		for _ in 0..400 {
			sim.tick(0.016);
		}
		assert!(sim.is_settled());
	}

	#[test]
	fn pinned_node_stays_put() {
		let mut sim = Simulation::new(&tree(), &LayoutConfig::hierarchy(), Point::default());
		let at = Point::new(-150.0, 75.0);
		sim.pin(2, at);
		for _ in 0..50 {
			sim.tick(0.016);
		}
		assert_eq!(sim.position(2), at);
		sim.release(2);
		assert!(!sim.is_pinned(2));
	}

	#[test]
	fn stopped_simulation_ignores_ticks() {
		let mut sim = Simulation::new(&tree(), &LayoutConfig::hierarchy(), Point::default());
		sim.tick(0.016);
		sim.stop();
		let before = sim.positions().to_vec();
		assert!(!sim.tick(0.016));
		assert_eq!(sim.tick_count(), 1);
		assert_eq!(sim.positions(), &before[..]);
	}
}
