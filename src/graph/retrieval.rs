//! Retrieval graph builder: a star of ranked documents around the query,
//! meshed by pairwise similarity links.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::model::{
	DOCUMENT_LABEL_MAX, GraphModel, Link, LinkKind, Node, NodePayload, truncate_label,
};
use super::oracle::{Document, SimilarityPair};

/// Id of the query node. Documents carrying this id are dropped.
pub const QUERY_NODE_ID: &str = "query";
/// Maximum number of document nodes in one graph.
pub const MAX_DOCUMENTS: usize = 12;
/// Similarities below this are not drawn.
pub const SIMILARITY_THRESHOLD: f64 = 0.2;
/// Relevance used when the ranking supplied no score.
pub const DEFAULT_RELEVANCE: f64 = 0.5;

const QUERY_FALLBACK_LABEL: &str = "Query";

/// Minimum publication year filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum YearFilter {
	/// Keep every document.
	#[default]
	All,
	/// Keep documents published in or after this year.
	MinYear(i32),
}

impl YearFilter {
	/// Parses `"all"` or a year. Anything unparseable means `All`.
	pub fn parse(value: &str) -> Self {
		let value = value.trim();
		if value.eq_ignore_ascii_case("all") {
			return Self::All;
		}
		value.parse().map(Self::MinYear).unwrap_or_default()
	}

	/// Whether `doc` survives the filter. A missing year counts as year 0, so
	/// undated documents fail any positive minimum.
	pub fn admits(&self, doc: &Document) -> bool {
		match self {
			Self::All => true,
			Self::MinYear(min) => doc.year.unwrap_or(0) >= *min,
		}
	}
}

impl fmt::Display for YearFilter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::All => f.write_str("all"),
			Self::MinYear(year) => write!(f, "{}", year),
		}
	}
}

/// Everything the retrieval builder needs, as resolved by the host.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RetrievalInput {
	/// The user's search query.
	pub query: String,
	/// Documents in oracle ranking order.
	pub ranked: Vec<Document>,
	/// Pairwise similarities.
	pub similarities: Vec<SimilarityPair>,
}

impl RetrievalInput {
	/// Builds the graph for this input.
	pub fn build(&self, year_filter: YearFilter) -> GraphModel {
		build(&self.query, &self.ranked, &self.similarities, year_filter)
	}
}

/// Builds a retrieval graph.
///
/// Documents are filtered by `year_filter`, stripped of empty or repeated ids,
/// and capped at [`MAX_DOCUMENTS`] in ranking order. Every survivor gets a
/// `relevance` link from the query. A similarity becomes a `similarity` link
/// only when its weight reaches [`SIMILARITY_THRESHOLD`] and both ends
/// survived; weights above 1 are clamped and self-pairs are ignored.
pub fn build(
	query: &str,
	ranked: &[Document],
	similarities: &[SimilarityPair],
	year_filter: YearFilter,
) -> GraphModel {
	let query_text = query.trim();
	let query_label = if query_text.is_empty() {
		QUERY_FALLBACK_LABEL.to_string()
	} else {
		truncate_label(query_text, DOCUMENT_LABEL_MAX)
	};

	let mut model = GraphModel::default();
	model.nodes.push(Node {
		id: QUERY_NODE_ID.to_string(),
		label: query_label,
		payload: NodePayload::Query {
			text: query_text.to_string(),
		},
	});

	let mut kept: HashSet<&str> = HashSet::new();
	for doc in ranked.iter().filter(|doc| year_filter.admits(doc)) {
		if kept.len() == MAX_DOCUMENTS {
			break;
		}
		let id = doc.id.as_str();
		if id.is_empty() || id == QUERY_NODE_ID || !kept.insert(id) {
			continue;
		}
		model.nodes.push(Node {
			id: id.to_string(),
			label: truncate_label(doc.display_title(), DOCUMENT_LABEL_MAX),
			payload: NodePayload::Document {
				document: Arc::new(doc.clone()),
				relevance_score: relevance_of(doc),
			},
		});
		model.links.push(Link {
			source: QUERY_NODE_ID.to_string(),
			target: id.to_string(),
			kind: LinkKind::Relevance,
			weight: None,
		});
	}

	for pair in similarities {
		if pair.similarity.is_nan() || pair.similarity < SIMILARITY_THRESHOLD || pair.a == pair.b {
			continue;
		}
		if !kept.contains(pair.a.as_str()) || !kept.contains(pair.b.as_str()) {
			continue;
		}
		model.links.push(Link {
			source: pair.a.clone(),
			target: pair.b.clone(),
			kind: LinkKind::Similarity,
			weight: Some(pair.similarity.min(1.0)),
		});
	}

	log::info!(
		"retrieval graph: {} documents, {} links (filter {})",
		kept.len(),
		model.links.len(),
		year_filter
	);
	model
}

fn relevance_of(doc: &Document) -> f64 {
	doc.score
		.filter(|s| s.is_finite())
		.map(|s| s.clamp(0.0, 1.0))
		.unwrap_or(DEFAULT_RELEVANCE)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::model::NodeKind;

	fn doc(id: &str, year: i32) -> Document {
		Document {
			id: id.to_string(),
			title: format!("Paper {}", id),
			year: Some(year),
			..Document::default()
		}
	}

	fn pair(a: &str, b: &str, similarity: f64) -> SimilarityPair {
		SimilarityPair {
			a: a.to_string(),
			b: b.to_string(),
			similarity,
		}
	}

	#[test]
	fn query_node_comes_first() {
		let model = build("graph neural networks", &[doc("p1", 2020)], &[], YearFilter::All);
		assert_eq!(model.nodes[0].id, QUERY_NODE_ID);
		assert_eq!(model.nodes[0].kind(), NodeKind::Query);
		assert_eq!(model.nodes[0].label, "graph neural networks");
	}

	#[test]
	fn empty_query_gets_placeholder_label() {
		let model = build("   ", &[], &[], YearFilter::All);
		assert_eq!(model.nodes.len(), 1);
		assert_eq!(model.nodes[0].label, "Query");
		assert!(model.links.is_empty());
	}

	#[test]
	fn caps_after_filtering() {
		let docs: Vec<Document> = (0..30)
			.map(|i| doc(&format!("d{}", i), if i % 2 == 0 { 2015 } else { 2022 }))
			.collect();
		let model = build("q", &docs, &[], YearFilter::MinYear(2020));
		let ids: Vec<&str> = model.nodes_of(NodeKind::Document).map(|n| n.id.as_str()).collect();
		assert_eq!(ids.len(), MAX_DOCUMENTS);
		assert_eq!(ids[0], "d1");
		assert_eq!(ids[11], "d23");
	}

	#[test]
	fn missing_score_defaults_and_explicit_score_is_kept() {
		let mut scored = doc("p2", 2021);
		scored.score = Some(0.83);
		let mut wild = doc("p3", 2021);
		wild.score = Some(4.0);
		let model = build("q", &[doc("p1", 2020), scored, wild], &[], YearFilter::All);
		assert_eq!(model.node("p1").and_then(Node::relevance_score), Some(0.5));
		assert_eq!(model.node("p2").and_then(Node::relevance_score), Some(0.83));
		assert_eq!(model.node("p3").and_then(Node::relevance_score), Some(1.0));
	}

	#[test]
	fn malformed_documents_are_skipped() {
		let docs = [doc("", 2020), doc("query", 2020), doc("p1", 2020), doc("p1", 2021)];
		let model = build("q", &docs, &[], YearFilter::All);
		assert_eq!(model.nodes.len(), 2);
		assert_eq!(model.links.len(), 1);
	}

	#[test]
	fn documents_without_year_count_as_year_zero() {
		let undated = Document {
			id: "u".into(),
			..Document::default()
		};
		assert_eq!(build("q", &[undated.clone()], &[], YearFilter::All).nodes.len(), 2);
		assert_eq!(build("q", &[undated.clone()], &[], YearFilter::MinYear(1900)).nodes.len(), 1);
		assert_eq!(build("q", &[undated.clone()], &[], YearFilter::MinYear(0)).nodes.len(), 2);
		assert_eq!(build("q", &[undated], &[], YearFilter::MinYear(-5)).nodes.len(), 2);
	}

	#[test]
	fn similarity_links_need_threshold_and_both_ends() {
		let docs = [doc("p1", 2020), doc("p2", 2020)];
		let sims = [
			pair("p1", "p2", 0.2),
			pair("p1", "p2", 0.19),
			pair("p1", "ghost", 0.9),
			pair("p1", "p1", 0.9),
			pair("p2", "p1", f64::NAN),
			pair("p2", "p1", 1.7),
		];
		let model = build("q", &docs, &sims, YearFilter::All);
		let weights: Vec<Option<f64>> =
			model.links_of(LinkKind::Similarity).map(|l| l.weight).collect();
		assert_eq!(weights, [Some(0.2), Some(1.0)]);
	}

	#[test]
	fn labels_fall_back_to_id() {
		let untitled = Document {
			id: "arxiv:1706.03762".into(),
			..Document::default()
		};
		let model = build("q", &[untitled], &[], YearFilter::All);
		assert_eq!(model.nodes[1].label, "arxiv:1706.03762");
	}

	#[test]
	fn year_filter_parsing() {
		assert_eq!(YearFilter::parse("all"), YearFilter::All);
		assert_eq!(YearFilter::parse(" 2021 "), YearFilter::MinYear(2021));
		assert_eq!(YearFilter::parse("recent"), YearFilter::All);
		assert_eq!(YearFilter::MinYear(2019).to_string(), "2019");
	}
}
