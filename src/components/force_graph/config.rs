use crate::graph::{GraphModel, LinkKind, NodeKind};

/// Simulation, interaction and viewport constants for one mount.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
	/// Rest length of query-to-document links.
	pub relevance_distance: f64,
	/// Rest length of document-to-document links.
	pub similarity_distance: f64,
	/// Rest length of parent-to-child links.
	pub hierarchy_distance: f64,
	/// How hard links pull toward their rest length, per tick at full energy.
	pub link_strength: f64,
	/// Many-body repulsion.
	pub charge: f32,
	/// Collision radius of ordinary nodes.
	pub collide_radius: f64,
	/// Collision radius of the query or root node.
	pub collide_radius_emphasis: f64,
	/// Drawn radius of ordinary nodes.
	pub node_radius: f64,
	/// Drawn radius of the query or root node.
	pub node_radius_emphasis: f64,
	/// Energy below which the layout counts as settled.
	pub alpha_min: f64,
	/// Fraction of the distance to the energy target covered per tick.
	pub alpha_decay: f64,
	/// Energy target held while a node is dragged.
	pub drag_alpha_target: f64,
	/// Energy injected by a resize.
	pub resize_alpha: f64,
	/// Smallest zoom factor.
	pub min_zoom: f64,
	/// Largest zoom factor.
	pub max_zoom: f64,
	/// Width used when the container measures zero.
	pub default_width: f64,
	/// Height used when the container measures zero.
	pub default_height: f64,
	/// Lower bound of the viewport height.
	pub min_height: f64,
	/// Upper bound of the viewport height.
	pub max_height: f64,
}

const ALPHA_MIN: f64 = 0.001;
// ~300 ticks from full energy to ALPHA_MIN
const SETTLE_TICKS: f64 = 300.0;

impl Default for LayoutConfig {
	fn default() -> Self {
		Self::retrieval()
	}
}

impl LayoutConfig {
	/// Loose star layout for query/document graphs.
	pub fn retrieval() -> Self {
		Self {
			relevance_distance: 90.0,
			similarity_distance: 70.0,
			hierarchy_distance: 70.0,
			link_strength: 0.4,
			charge: 200.0,
			collide_radius: 14.0,
			collide_radius_emphasis: 18.0,
			node_radius: 6.0,
			node_radius_emphasis: 10.0,
			alpha_min: ALPHA_MIN,
			alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / SETTLE_TICKS),
			drag_alpha_target: 0.3,
			resize_alpha: 0.3,
			min_zoom: 0.3,
			max_zoom: 3.0,
			default_width: 640.0,
			default_height: 400.0,
			min_height: 320.0,
			max_height: 420.0,
		}
	}

	/// Tighter layout for concept hierarchies.
	pub fn hierarchy() -> Self {
		Self {
			link_strength: 0.6,
			charge: 220.0,
			..Self::retrieval()
		}
	}

	/// Picks the preset matching the graph: retrieval when there is a query
	/// node, hierarchy otherwise.
	pub fn for_model(model: &GraphModel) -> Self {
		if model.nodes_of(NodeKind::Query).next().is_some() {
			Self::retrieval()
		} else {
			Self::hierarchy()
		}
	}

	/// Rest length for a link kind.
	pub fn link_distance(&self, kind: LinkKind) -> f64 {
		match kind {
			LinkKind::Relevance => self.relevance_distance,
			LinkKind::Similarity => self.similarity_distance,
			LinkKind::Hierarchy => self.hierarchy_distance,
		}
	}

	/// Viewport size for a container's measured client size. A zero or
	/// unmeasurable dimension falls back to the defaults; the height is then
	/// clamped to `[min_height, max_height]`.
	pub fn viewport_size(&self, client_width: f64, client_height: f64) -> (f64, f64) {
		let usable = |v: f64| v.is_finite() && v > 0.0;
		let width = if usable(client_width) { client_width } else { self.default_width };
		let height = if usable(client_height) { client_height } else { self.default_height };
		(width, height.clamp(self.min_height, self.max_height))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{ConceptTreeNode, flatten, retrieval};

	#[test]
	fn zero_sized_container_uses_defaults() {
		let config = LayoutConfig::default();
		assert_eq!(config.viewport_size(0.0, 0.0), (640.0, 400.0));
		assert_eq!(config.viewport_size(f64::NAN, -3.0), (640.0, 400.0));
	}

	#[test]
	fn height_is_clamped() {
		let config = LayoutConfig::default();
		assert_eq!(config.viewport_size(900.0, 100.0), (900.0, 320.0));
		assert_eq!(config.viewport_size(900.0, 1000.0), (900.0, 420.0));
		assert_eq!(config.viewport_size(900.0, 360.0), (900.0, 360.0));
	}

	#[test]
	fn preset_follows_graph_kind() {
		let retrieval = retrieval::build("q", &[], &[], Default::default());
		assert_eq!(LayoutConfig::for_model(&retrieval).link_strength, 0.4);
		let concepts = flatten(&ConceptTreeNode::leaf("root", "R"));
		let config = LayoutConfig::for_model(&concepts);
		assert_eq!(config.link_strength, 0.6);
		assert_eq!(config.charge, 220.0);
		assert_eq!(config.link_distance(LinkKind::Hierarchy), 70.0);
	}

	#[test]
	fn decay_reaches_alpha_min_in_about_three_hundred_ticks() {
		let config = LayoutConfig::default();
		let mut alpha = 1.0;
		let mut ticks = 0;
		while alpha >= config.alpha_min {
			alpha += (0.0 - alpha) * config.alpha_decay;
			ticks += 1;
		}
		assert!((295..=305).contains(&ticks), "{}", ticks);
	}
}
