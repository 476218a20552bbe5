//! Property tests for the graph builders and the layout lifecycle.

#![cfg(not(target_arch = "wasm32"))]

use std::collections::HashMap;

use proptest::prelude::*;
use research_graph::components::force_graph::{LayoutConfig, LayoutState};
use research_graph::graph::retrieval::{MAX_DOCUMENTS, SIMILARITY_THRESHOLD};
use research_graph::graph::{
	ConceptTreeNode, Document, LinkKind, NodeKind, RetrievalInput, SimilarityPair, YearFilter,
	flatten,
};

fn document() -> impl Strategy<Value = Document> {
	(
		prop_oneof![
			8 => "p[0-9]{1,2}".prop_map(String::from),
			1 => Just("query".to_string()),
			1 => Just(String::new()),
		],
		prop::option::of(1990i32..2030),
		prop::option::of(-0.5f64..1.5),
	)
		.prop_map(|(id, year, score)| Document {
			title: format!("Title of {}", id),
			id,
			year,
			score,
			..Document::default()
		})
}

fn similarity() -> impl Strategy<Value = SimilarityPair> {
	("p[0-9]{1,2}", "p[0-9]{1,2}", prop_oneof![-1.0f64..2.0, Just(f64::NAN)]).prop_map(
		|(a, b, similarity)| SimilarityPair { a, b, similarity },
	)
}

fn retrieval_input() -> impl Strategy<Value = RetrievalInput> {
	(
		"[a-z ]{0,40}",
		prop::collection::vec(document(), 0..30),
		prop::collection::vec(similarity(), 0..60),
	)
		.prop_map(|(query, ranked, similarities)| RetrievalInput {
			query,
			ranked,
			similarities,
		})
}

fn year_filter() -> impl Strategy<Value = YearFilter> {
	prop_oneof![Just(YearFilter::All), (1990i32..2030).prop_map(YearFilter::MinYear)]
}

fn concept_tree() -> impl Strategy<Value = ConceptTreeNode> {
	let leaf = (prop::option::of("[a-c]{0,2}"), prop::option::of("[A-Za-z ]{0,30}")).prop_map(
		|(id, label)| ConceptTreeNode {
			id,
			label,
			..ConceptTreeNode::default()
		},
	);
	leaf.prop_recursive(4, 48, 5, |inner| {
		(
			prop::option::of("[a-c]{0,2}"),
			prop::collection::vec(inner, 0..5),
		)
			.prop_map(|(id, children)| ConceptTreeNode {
				id,
				children,
				..ConceptTreeNode::default()
			})
	})
}

proptest! {
	#[test]
	fn retrieval_graph_is_bounded(input in retrieval_input(), filter in year_filter()) {
		let model = input.build(filter);
		let documents = model.nodes_of(NodeKind::Document).count();
		prop_assert!(documents <= MAX_DOCUMENTS);
		prop_assert_eq!(model.nodes.len(), documents + 1);
		prop_assert_eq!(model.nodes_of(NodeKind::Query).count(), 1);
	}

	#[test]
	fn similarity_links_are_strong_and_resolved(input in retrieval_input(), filter in year_filter()) {
		let model = input.build(filter);
		for link in model.links_of(LinkKind::Similarity) {
			let weight = link.weight.unwrap_or(f64::NAN);
			prop_assert!(weight >= SIMILARITY_THRESHOLD && weight <= 1.0);
			prop_assert_ne!(&link.source, &link.target);
			for end in [&link.source, &link.target] {
				prop_assert_eq!(model.node(end).map(|n| n.kind()), Some(NodeKind::Document));
			}
		}
	}

	#[test]
	fn relevance_scores_stay_in_unit_range(input in retrieval_input()) {
		let model = input.build(YearFilter::All);
		for node in model.nodes_of(NodeKind::Document) {
			let score = node.relevance_score().unwrap_or(f64::NAN);
			prop_assert!((0.0..=1.0).contains(&score));
		}
	}

	#[test]
	fn builders_are_idempotent(input in retrieval_input(), filter in year_filter(), tree in concept_tree()) {
		prop_assert_eq!(input.build(filter), input.build(filter));
		prop_assert_eq!(flatten(&tree), flatten(&tree));
	}

	#[test]
	fn raising_the_year_never_adds_documents(input in retrieval_input(), low in 1990i32..2030, step in 0i32..20) {
		let count = |filter| input.build(filter).nodes_of(NodeKind::Document).count();
		let all = count(YearFilter::All);
		let lower = count(YearFilter::MinYear(low));
		let higher = count(YearFilter::MinYear(low + step));
		prop_assert!(lower <= all);
		prop_assert!(higher <= lower);
	}

	#[test]
	fn flatten_preserves_tree_shape(tree in concept_tree()) {
		let model = flatten(&tree);
		let count = tree.count_nodes();
		prop_assert_eq!(model.nodes.len(), count);
		prop_assert_eq!(model.links_of(LinkKind::Hierarchy).count(), count - 1);

		let depth: HashMap<&str, u32> = model.nodes.iter().map(|n| (n.id.as_str(), n.depth())).collect();
		prop_assert_eq!(depth.len(), count, "ids must be unique");
		prop_assert_eq!(model.nodes[0].depth(), 0);
		for link in &model.links {
			prop_assert_eq!(depth[link.target.as_str()], depth[link.source.as_str()] + 1);
		}
	}

	#[test]
	fn stopped_layout_never_ticks_again(input in retrieval_input(), frames in 1usize..20) {
		let model = input.build(YearFilter::All);
		let mut state = LayoutState::new(&model, LayoutConfig::retrieval(), None, None, 640.0, 400.0);
		for _ in 0..frames {
			state.tick(0.016);
		}
		let before = (state.sim.tick_count(), state.sim.positions().to_vec());
		state.stop();
		for _ in 0..frames {
			state.tick(0.016);
		}
		prop_assert!(state.sim.is_stopped());
		prop_assert_eq!(state.sim.tick_count(), before.0);
		prop_assert_eq!(state.sim.positions(), &before.1[..]);
	}
}
