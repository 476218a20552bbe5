use std::sync::Arc;

use super::concept::ConceptEntry;
use super::oracle::Document;

/// Visible label length for query and document nodes.
pub const DOCUMENT_LABEL_MAX: usize = 22;
/// Visible label length for concept nodes.
pub const CONCEPT_LABEL_MAX: usize = 18;

const ELLIPSIS: char = '…';

/// Role of a node in a graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
	/// The search query at the centre of a retrieval graph.
	Query,
	/// A ranked document.
	Document,
	/// An entry of a document's concept tree.
	Concept,
}

/// Relationship carried by a link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkKind {
	/// Query to document.
	Relevance,
	/// Document to document.
	Similarity,
	/// Concept parent to child.
	Hierarchy,
}

/// Page anchor inside the source document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourcePosition {
	/// 1-based page number.
	pub page: u32,
}

/// Kind-specific data of a node.
///
/// Each variant carries only the fields that are meaningful for that kind, so
/// a document node cannot carry a depth and a concept node cannot carry a
/// relevance score.
#[derive(Clone, Debug, PartialEq)]
pub enum NodePayload {
	/// The query text, untruncated.
	Query {
		/// Full query string.
		text: String,
	},
	/// A document kept alive by the builder's input.
	Document {
		/// Read-only view of the ranked document.
		document: Arc<Document>,
		/// Relevance in `[0, 1]`, 0.5 when the ranking gave none.
		relevance_score: f64,
	},
	/// A concept tree entry.
	Concept {
		/// Read-only view of the tree entry.
		entry: Arc<ConceptEntry>,
		/// Distance from the tree root.
		depth: u32,
	},
}

/// A vertex of a [`GraphModel`].
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	/// Unique within one graph.
	pub id: String,
	/// Display label, already truncated.
	pub label: String,
	/// Back-reference to the originating data.
	pub payload: NodePayload,
}

impl Node {
	/// The node's role.
	pub fn kind(&self) -> NodeKind {
		match self.payload {
			NodePayload::Query { .. } => NodeKind::Query,
			NodePayload::Document { .. } => NodeKind::Document,
			NodePayload::Concept { .. } => NodeKind::Concept,
		}
	}

	/// Tree depth; always 0 outside concept graphs.
	pub fn depth(&self) -> u32 {
		match &self.payload {
			NodePayload::Concept { depth, .. } => *depth,
			_ => 0,
		}
	}

	/// Relevance score of a document node.
	pub fn relevance_score(&self) -> Option<f64> {
		match &self.payload {
			NodePayload::Document {
				relevance_score, ..
			} => Some(*relevance_score),
			_ => None,
		}
	}

	/// Source location of a concept node.
	pub fn source_position(&self) -> Option<&SourcePosition> {
		match &self.payload {
			NodePayload::Concept { entry, .. } => entry.position.as_ref(),
			_ => None,
		}
	}

	/// Whether this is the query or the tree root. Emphasised nodes are
	/// drawn larger and are not navigation targets.
	pub fn is_emphasis(&self) -> bool {
		match &self.payload {
			NodePayload::Query { .. } => true,
			NodePayload::Concept { depth, .. } => *depth == 0,
			NodePayload::Document { .. } => false,
		}
	}
}

/// A typed edge between two node ids.
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
	/// Source node id.
	pub source: String,
	/// Target node id.
	pub target: String,
	/// Relationship type.
	pub kind: LinkKind,
	/// Similarity in `[0, 1]`, only for [`LinkKind::Similarity`].
	pub weight: Option<f64>,
}

/// Nodes plus typed links, built fresh for every mount.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphModel {
	/// All nodes, emphasis node first.
	pub nodes: Vec<Node>,
	/// All links.
	pub links: Vec<Link>,
}

impl GraphModel {
	/// True when there is nothing to draw.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Looks up a node by id.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Links of one kind.
	pub fn links_of(&self, kind: LinkKind) -> impl Iterator<Item = &Link> + '_ {
		self.links.iter().filter(move |l| l.kind == kind)
	}

	/// Nodes of one kind.
	pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = &Node> + '_ {
		self.nodes.iter().filter(move |n| n.kind() == kind)
	}
}

/// Trims `text` and cuts it to `max` characters, appending an ellipsis when
/// anything was removed. Cuts on `char` boundaries.
pub fn truncate_label(text: &str, max: usize) -> String {
	let text = text.trim();
	if text.chars().count() <= max {
		return text.to_string();
	}
	let mut out: String = text.chars().take(max).collect();
	out.truncate(out.trim_end().len());
	out.push(ELLIPSIS);
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn short_labels_are_kept() {
		assert_eq!(truncate_label("  Attention  ", 22), "Attention");
		assert_eq!(truncate_label("", 22), "");
	}

	#[test]
	fn long_labels_get_ellipsis() {
		let label = truncate_label("Graph Neural Networks: A Review of Methods", 22);
		assert_eq!(label, "Graph Neural Networks:…");
		assert_eq!(label.chars().count(), 23);
	}

	#[test]
	fn exact_length_is_not_truncated() {
		let text = "a".repeat(18);
		assert_eq!(truncate_label(&text, 18), text);
	}

	#[test]
	fn truncation_respects_multibyte_glyphs() {
		let label = truncate_label("图神经网络在推荐系统中的应用研究综述与展望分析", 18);
		assert!(label.ends_with('…'));
		assert_eq!(label.chars().count(), 19);
	}

	#[test]
	fn trailing_space_before_ellipsis_is_trimmed() {
		assert_eq!(truncate_label("abcd efgh", 5), "abcd…");
	}
}
