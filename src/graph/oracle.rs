//! Typed decoding of the ranking/similarity oracle's JSON output and of
//! semantic index files.
//!
//! The oracle is an external language-model endpoint; its output is treated
//! as untrusted boundary data. Decoding never fails outward: malformed items
//! are skipped, missing fields take documented defaults, and a broken ranking
//! falls back to [`keyword_rank`].

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use super::concept::ConceptTreeNode;

/// Upper bound on documents kept from one ranking.
pub const RANKING_LIMIT: usize = 10;
/// Deepest concept tree a semantic index file can carry. Each tree level
/// costs two JSON nesting levels (entry object and `children` array)
/// against serde_json's limit of 128.
pub const MAX_INDEX_TREE_DEPTH: usize = 60;

/// Errors raised while decoding oracle payloads.
#[derive(Debug, Error)]
pub enum OracleError {
	/// The body was not valid JSON of the expected shape.
	#[error("invalid oracle payload: {0}")]
	Json(#[from] serde_json::Error),
	/// The body was valid JSON but not an array.
	#[error("oracle payload is not an array")]
	NotAnArray,
	/// The ranking named no document from the catalog.
	#[error("ranking matched no catalog document")]
	EmptyRanking,
}

/// A catalog document as returned by the ranking collaborator.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Document {
	/// Catalog id.
	#[serde(default, deserialize_with = "lenient_string")]
	pub id: String,
	/// Title; may be empty.
	#[serde(default, deserialize_with = "lenient_string")]
	pub title: String,
	/// Publication year.
	#[serde(default, deserialize_with = "lenient_year")]
	pub year: Option<i32>,
	/// Explicit relevance score from the oracle, if any.
	#[serde(default, deserialize_with = "lenient_number")]
	pub score: Option<f64>,
	/// Abstract text.
	#[serde(default, rename = "abstract", deserialize_with = "lenient_opt_string")]
	pub abstract_text: Option<String>,
	/// Author keywords.
	#[serde(default, deserialize_with = "lenient_strings")]
	pub keywords: Vec<String>,
	/// Coarse topic category (`llm`, `cv`, `nlp`, ...).
	#[serde(default, deserialize_with = "lenient_opt_string")]
	pub category: Option<String>,
}

impl Document {
	/// Title when present, otherwise the id.
	pub fn display_title(&self) -> &str {
		let title = self.title.trim();
		if title.is_empty() { &self.id } else { title }
	}
}

/// One pairwise similarity judgement.
#[derive(Clone, Debug, PartialEq)]
pub struct SimilarityPair {
	/// First document id.
	pub a: String,
	/// Second document id.
	pub b: String,
	/// Similarity, nominally in `[0, 1]`.
	pub similarity: f64,
}

/// A persisted semantic index: a document's concept tree.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticIndex {
	/// Catalog id of the indexed document.
	#[serde(default, deserialize_with = "lenient_string")]
	pub paper_id: String,
	/// Document title.
	#[serde(default, deserialize_with = "lenient_string")]
	pub title: String,
	/// Build timestamp, RFC 3339.
	#[serde(default, deserialize_with = "lenient_opt_string")]
	pub built_at: Option<String>,
	/// Root of the concept tree.
	pub tree: ConceptTreeNode,
}

#[derive(Deserialize)]
struct RankingEntry {
	#[serde(default, deserialize_with = "lenient_string")]
	id: String,
	#[serde(default, deserialize_with = "lenient_number")]
	score: Option<f64>,
}

/// Decodes a catalog: either a bare array of documents or `{"papers": [...]}`.
/// Malformed entries are skipped.
pub fn parse_catalog(body: &str) -> Vec<Document> {
	let value: Value = match serde_json::from_str(body) {
		Ok(value) => value,
		Err(err) => {
			log::warn!("catalog: {}", OracleError::from(err));
			return Vec::new();
		}
	};
	let items = match value {
		Value::Array(items) => items,
		Value::Object(mut map) => match map.remove("papers") {
			Some(Value::Array(items)) => items,
			_ => return Vec::new(),
		},
		_ => return Vec::new(),
	};
	items
		.into_iter()
		.filter_map(|item| serde_json::from_value::<Document>(item).ok())
		.filter(|doc| !doc.id.is_empty())
		.collect()
}

/// Decodes a similarity list `[{a, b, similarity}]`.
///
/// Entries whose ids are not strings or whose similarity is not a number are
/// skipped. Anything that is not a JSON array yields an empty list.
pub fn parse_similarities(body: &str) -> Vec<SimilarityPair> {
	match decode_array(body) {
		Ok(items) => items.iter().filter_map(similarity_from_value).collect(),
		Err(err) => {
			log::warn!("similarities: {}", err);
			Vec::new()
		}
	}
}

fn similarity_from_value(value: &Value) -> Option<SimilarityPair> {
	let a = value.get("a")?.as_str()?;
	let b = value.get("b")?.as_str()?;
	let similarity = value.get("similarity")?.as_f64()?;
	Some(SimilarityPair {
		a: a.to_string(),
		b: b.to_string(),
		similarity,
	})
}

/// Orders `catalog` by the oracle ranking in `body` (`[{id, score?}]`).
///
/// Explicit scores are attached to the returned documents. Ids unknown to the
/// catalog are skipped. When the ranking cannot be used at all the result of
/// [`keyword_rank`] is returned instead.
pub fn apply_ranking(query: &str, catalog: &[Document], body: &str) -> Vec<Document> {
	match try_apply_ranking(catalog, body) {
		Ok(ranked) => ranked,
		Err(err) => {
			log::warn!("ranking fell back to keyword scoring: {}", err);
			keyword_rank(query, catalog)
		}
	}
}

fn try_apply_ranking(catalog: &[Document], body: &str) -> Result<Vec<Document>, OracleError> {
	let entries: Vec<RankingEntry> = decode_array(body)?
		.into_iter()
		.filter_map(|item| serde_json::from_value(item).ok())
		.collect();

	let by_id: HashMap<&str, &Document> = catalog
		.iter()
		.filter(|doc| !doc.id.is_empty())
		.map(|doc| (doc.id.as_str(), doc))
		.collect();

	let mut ranked: Vec<Document> = Vec::new();
	for entry in entries {
		let Some(&doc) = by_id.get(entry.id.as_str()) else {
			continue;
		};
		if ranked.iter().any(|d| d.id == doc.id) {
			continue;
		}
		let mut doc = doc.clone();
		if entry.score.is_some() {
			doc.score = entry.score;
		}
		ranked.push(doc);
	}

	if ranked.is_empty() {
		return Err(OracleError::EmptyRanking);
	}
	ranked.truncate(RANKING_LIMIT);
	Ok(ranked)
}

/// Offline rule-based ranking used when the oracle is unavailable.
///
/// Scores keyword hits in title, abstract and keywords, category matches and
/// recency. Ties keep catalog order. If nothing scores above zero the first
/// catalog entries are returned unchanged.
pub fn keyword_rank(query: &str, catalog: &[Document]) -> Vec<Document> {
	let query = query.to_lowercase();
	let terms: Vec<&str> = query.split_whitespace().collect();

	let mut scored: Vec<(u32, &Document)> = catalog
		.iter()
		.map(|doc| {
			let text = format!(
				"{} {} {}",
				doc.title,
				doc.abstract_text.as_deref().unwrap_or_default(),
				doc.keywords.join(" ")
			)
			.to_lowercase();

			let mut score = terms.iter().filter(|t| text.contains(*t)).count() as u32 * 2;
			let category = doc.category.as_deref().unwrap_or_default();
			for (needle, cat) in [
				("transformer", "transformer"),
				("llm", "llm"),
				("vision", "cv"),
				("nlp", "nlp"),
			] {
				if query.contains(needle) && category == cat {
					score += 5;
				}
			}
			if doc.year.is_some_and(|y| y >= 2020) {
				score += 1;
			}
			(score, doc)
		})
		.collect();

	// stable: equal scores keep catalog order
	scored.sort_by(|a, b| b.0.cmp(&a.0));

	if scored.first().is_some_and(|(score, _)| *score > 0) {
		scored
			.into_iter()
			.take(RANKING_LIMIT)
			.map(|(_, doc)| doc.clone())
			.collect()
	} else {
		catalog.iter().take(RANKING_LIMIT).cloned().collect()
	}
}

/// Decodes a semantic index file. Returns `None` when the body is unusable.
///
/// Concept trees nested deeper than [`MAX_INDEX_TREE_DEPTH`] exceed
/// serde_json's recursion limit, and the whole index is rejected.
pub fn parse_semantic_index(body: &str) -> Option<SemanticIndex> {
	match serde_json::from_str::<SemanticIndex>(body) {
		Ok(mut index) => {
			if index.tree.id.as_deref().is_none_or(str::is_empty) {
				index.tree.id = Some("root".to_string());
			}
			if index.tree.label.as_deref().is_none_or(str::is_empty) {
				index.tree.label = Some(index.title.clone());
			}
			Some(index)
		}
		Err(err) => {
			log::warn!("semantic index: {}", OracleError::from(err));
			None
		}
	}
}

fn decode_array(body: &str) -> Result<Vec<Value>, OracleError> {
	match serde_json::from_str::<Value>(body)? {
		Value::Array(items) => Ok(items),
		_ => Err(OracleError::NotAnArray),
	}
}

// Lenient field decoders: wrong JSON types degrade to defaults instead of
// failing the whole record.

pub(crate) fn lenient_string<'de, D>(de: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(lenient_opt_string(de)?.unwrap_or_default())
}

pub(crate) fn lenient_opt_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match Value::deserialize(de)? {
		Value::String(s) => Some(s),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	})
}

pub(crate) fn lenient_number<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(Value::deserialize(de)?.as_f64().filter(|n| n.is_finite()))
}

fn lenient_year<'de, D>(de: D) -> Result<Option<i32>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match Value::deserialize(de)? {
		Value::Number(n) => n.as_f64().map(|y| y as i32),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	})
}

fn lenient_strings<'de, D>(de: D) -> Result<Vec<String>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match Value::deserialize(de)? {
		Value::Array(items) => items
			.into_iter()
			.filter_map(|v| v.as_str().map(str::to_string))
			.collect(),
		_ => Vec::new(),
	})
}
