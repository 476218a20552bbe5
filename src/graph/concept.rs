//! Concept tree builder: flattens a document's concept hierarchy into a
//! [`GraphModel`] of `concept` nodes and parent-to-child `hierarchy` links.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::model::{
	CONCEPT_LABEL_MAX, GraphModel, Link, LinkKind, Node, NodePayload, SourcePosition,
	truncate_label,
};
use super::oracle::lenient_opt_string;

/// One entry of an extracted concept tree, as stored in a semantic index.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ConceptTreeNode {
	/// Stable id; synthesised from traversal order when absent.
	#[serde(default, deserialize_with = "lenient_opt_string")]
	pub id: Option<String>,
	/// Display label.
	#[serde(default, deserialize_with = "lenient_opt_string")]
	pub label: Option<String>,
	/// Summary text.
	#[serde(default, deserialize_with = "lenient_opt_string")]
	pub content: Option<String>,
	/// Location in the source document.
	#[serde(default, deserialize_with = "lenient_position")]
	pub position: Option<TreePosition>,
	/// Sub-entries, in document order.
	#[serde(default, deserialize_with = "lenient_children")]
	pub children: Vec<ConceptTreeNode>,
}

/// Raw position record of a tree entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreePosition {
	/// 1-based page, when the record carried a usable number.
	pub page: Option<u32>,
	/// Short excerpt from that page.
	pub quote: Option<String>,
}

impl ConceptTreeNode {
	/// A leaf with an id and label.
	pub fn leaf(id: &str, label: &str) -> Self {
		Self {
			id: Some(id.to_string()),
			label: Some(label.to_string()),
			..Self::default()
		}
	}

	/// Sets the source page.
	pub fn at_page(mut self, page: u32) -> Self {
		self.position = Some(TreePosition {
			page: Some(page),
			quote: None,
		});
		self
	}

	/// Appends children.
	pub fn with_children(mut self, children: impl IntoIterator<Item = ConceptTreeNode>) -> Self {
		self.children.extend(children);
		self
	}

	/// Number of entries in this subtree, including itself.
	pub fn count_nodes(&self) -> usize {
		let mut count = 0;
		let mut stack = vec![self];
		while let Some(node) = stack.pop() {
			count += 1;
			stack.extend(node.children.iter());
		}
		count
	}
}

/// The payload a concept node carries back to the host on navigation.
#[derive(Clone, Debug, PartialEq)]
pub struct ConceptEntry {
	/// Resolved graph id.
	pub id: String,
	/// Full, untruncated label.
	pub label: String,
	/// Summary text.
	pub content: Option<String>,
	/// Page anchor; entries without one are structural only.
	pub position: Option<SourcePosition>,
	/// Excerpt from the page.
	pub quote: Option<String>,
}

/// Flattens `root` depth-first, pre-order.
///
/// Depth is the parent's depth plus one, with the root at 0. Entries without
/// an id get `node-<index>` where index is the pre-order position. An id that
/// is already taken falls back to the synthetic form as well, so ids stay
/// unique even when the tree repeats them.
pub fn flatten(root: &ConceptTreeNode) -> GraphModel {
	let mut model = GraphModel::default();
	let mut seen: HashSet<String> = HashSet::new();
	// (entry, parent id, depth)
	let mut stack: Vec<(&ConceptTreeNode, Option<String>, u32)> = vec![(root, None, 0)];

	while let Some((tree_node, parent, depth)) = stack.pop() {
		let index = model.nodes.len();
		let id = unique_id(tree_node.id.as_deref(), index, &seen);
		seen.insert(id.clone());

		let full_label = tree_node
			.label
			.as_deref()
			.map(str::trim)
			.filter(|l| !l.is_empty())
			.unwrap_or(id.as_str())
			.to_string();
		let (page, quote) = match &tree_node.position {
			Some(pos) => (pos.page, pos.quote.clone()),
			None => (None, None),
		};
		let entry = ConceptEntry {
			id: id.clone(),
			label: full_label.clone(),
			content: tree_node.content.clone(),
			position: page.map(|page| SourcePosition { page }),
			quote,
		};

		model.nodes.push(Node {
			id: id.clone(),
			label: truncate_label(&full_label, CONCEPT_LABEL_MAX),
			payload: NodePayload::Concept {
				entry: Arc::new(entry),
				depth,
			},
		});
		if let Some(parent) = parent {
			model.links.push(Link {
				source: parent,
				target: id.clone(),
				kind: LinkKind::Hierarchy,
				weight: None,
			});
		}

		// reversed so the first child is visited next
		for child in tree_node.children.iter().rev() {
			stack.push((child, Some(id.clone()), depth + 1));
		}
	}

	log::info!(
		"concept graph: {} nodes, {} links",
		model.nodes.len(),
		model.links.len()
	);
	model
}

fn unique_id(own: Option<&str>, index: usize, seen: &HashSet<String>) -> String {
	if let Some(own) = own.map(str::trim).filter(|id| !id.is_empty()) {
		if !seen.contains(own) {
			return own.to_string();
		}
	}
	let base = format!("node-{}", index);
	if !seen.contains(&base) {
		return base;
	}
	(1..)
		.map(|n| format!("{}-{}", base, n))
		.find(|candidate| !seen.contains(candidate))
		.unwrap_or(base)
}

fn lenient_position<'de, D>(de: D) -> Result<Option<TreePosition>, D::Error>
where
	D: Deserializer<'de>,
{
	let Value::Object(map) = Value::deserialize(de)? else {
		return Ok(None);
	};
	let page = map
		.get("page")
		.and_then(Value::as_f64)
		.filter(|p| p.is_finite() && *p >= 0.0 && p.fract() == 0.0)
		.map(|p| p as u32);
	let quote = map.get("quote").and_then(Value::as_str).map(str::to_string);
	Ok(Some(TreePosition { page, quote }))
}

fn lenient_children<'de, D>(de: D) -> Result<Vec<ConceptTreeNode>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match Value::deserialize(de)? {
		Value::Array(items) => items
			.into_iter()
			.filter_map(|item| serde_json::from_value(item).ok())
			.collect(),
		_ => Vec::new(),
	})
}
