//! End-to-end checks of the two builders against decoded JSON input.

use research_graph::graph::oracle::{parse_semantic_index, parse_similarities};
use research_graph::graph::{
	ConceptTreeNode, Document, GraphModel, LinkKind, NodeKind, RetrievalInput, YearFilter, flatten,
};

fn doc(id: &str, year: i32) -> Document {
	Document {
		id: id.to_string(),
		title: format!("Paper {}", id),
		year: Some(year),
		..Document::default()
	}
}

fn gnn_input() -> RetrievalInput {
	RetrievalInput {
		query: "graph neural networks".to_string(),
		ranked: vec![doc("p1", 2019), doc("p2", 2021), doc("p3", 2022)],
		similarities: parse_similarities(
			r#"[{"a":"p1","b":"p2","similarity":0.6},{"a":"p2","b":"p3","similarity":0.1}]"#,
		),
	}
}

fn ids(model: &GraphModel) -> Vec<&str> {
	model.nodes.iter().map(|n| n.id.as_str()).collect()
}

fn pairs(model: &GraphModel, kind: LinkKind) -> Vec<(&str, &str)> {
	model
		.links_of(kind)
		.map(|l| (l.source.as_str(), l.target.as_str()))
		.collect()
}

// --- Retrieval ---

#[test]
fn unfiltered_retrieval_graph() {
	let model = gnn_input().build(YearFilter::All);

	assert_eq!(ids(&model), ["query", "p1", "p2", "p3"]);
	assert_eq!(
		pairs(&model, LinkKind::Relevance),
		[("query", "p1"), ("query", "p2"), ("query", "p3")]
	);
	assert_eq!(pairs(&model, LinkKind::Similarity), [("p1", "p2")]);
	assert_eq!(model.nodes_of(NodeKind::Query).count(), 1);
}

#[test]
fn year_filter_drops_documents_and_their_similarities() {
	let model = gnn_input().build(YearFilter::parse("2021"));

	assert_eq!(ids(&model), ["query", "p2", "p3"]);
	assert_eq!(pairs(&model, LinkKind::Relevance).len(), 2);
	assert!(pairs(&model, LinkKind::Similarity).is_empty());
}

#[test]
fn unscored_documents_default_to_half_relevance() {
	let model = gnn_input().build(YearFilter::All);
	for node in model.nodes_of(NodeKind::Document) {
		assert_eq!(node.relevance_score(), Some(0.5));
	}
}

// --- Concept tree ---

#[test]
fn concept_tree_flattens_with_depths_and_hierarchy_links() {
	let tree = ConceptTreeNode::leaf("root", "Root").with_children([
		ConceptTreeNode::leaf("a", "A"),
		ConceptTreeNode::leaf("b", "B").with_children([ConceptTreeNode::leaf("c", "C")]),
	]);
	let model = flatten(&tree);

	let depths: Vec<(&str, u32)> = model.nodes.iter().map(|n| (n.id.as_str(), n.depth())).collect();
	assert_eq!(depths, [("root", 0), ("a", 1), ("b", 1), ("c", 2)]);
	assert_eq!(
		pairs(&model, LinkKind::Hierarchy),
		[("root", "a"), ("root", "b"), ("b", "c")]
	);
}

#[test]
fn semantic_index_file_flattens() {
	let index = parse_semantic_index(
		r#"{
			"paperId": "p9",
			"title": "A Study of Things",
			"tree": {
				"children": [
					{"id": "intro", "label": "Introduction", "position": {"page": 1}},
					{"label": "Untitled section", "position": {"page": "n/a"}, "children": [
						{"id": "intro", "label": "Repeated id"}
					]}
				]
			}
		}"#,
	)
	.expect("index parses");
	let model = flatten(&index.tree);

	assert_eq!(ids(&model), ["root", "intro", "node-2", "node-3"]);
	assert_eq!(model.nodes[0].label, "A Study of Things");
	assert_eq!(model.nodes[1].source_position().map(|p| p.page), Some(1));
	assert_eq!(model.nodes[2].source_position(), None);
	assert_eq!(model.links.len(), 3);
}
