//! Bundled demo data standing in for the catalog, the ranking oracle and a
//! prebuilt semantic index.

use crate::graph::oracle::{self, SemanticIndex};
use crate::graph::{Document, RetrievalInput};

pub const DEFAULT_QUERY: &str = "transformer attention for language models";

pub const DOCUMENT_HREF: &str = "papers/attention.pdf";

const CATALOG: &str = r#"{"papers": [
	{"id": "attention", "title": "Attention Is All You Need", "year": 2017, "category": "transformer",
	 "abstract": "A sequence transduction model based solely on attention mechanisms.",
	 "keywords": ["transformer", "attention", "translation"]},
	{"id": "bert", "title": "BERT: Pre-training of Deep Bidirectional Transformers", "year": 2019, "category": "nlp",
	 "abstract": "Bidirectional transformer pre-training for language understanding.",
	 "keywords": ["transformer", "language", "pre-training"]},
	{"id": "gpt3", "title": "Language Models are Few-Shot Learners", "year": 2020, "category": "llm",
	 "abstract": "Scaling language models improves few-shot performance.",
	 "keywords": ["language", "models", "few-shot"]},
	{"id": "vit", "title": "An Image is Worth 16x16 Words", "year": 2021, "category": "cv",
	 "abstract": "A pure transformer applied to sequences of image patches.",
	 "keywords": ["vision", "transformer", "attention"]},
	{"id": "flash", "title": "FlashAttention: Fast and Memory-Efficient Exact Attention", "year": 2022, "category": "transformer",
	 "abstract": "IO-aware exact attention with tiling.",
	 "keywords": ["attention", "efficiency"]},
	{"id": "llama", "title": "LLaMA: Open and Efficient Foundation Language Models", "year": 2023, "category": "llm",
	 "abstract": "Open foundation language models trained on public data.",
	 "keywords": ["language", "models", "open"]},
	{"id": "resnet", "title": "Deep Residual Learning for Image Recognition", "year": 2016, "category": "cv",
	 "abstract": "Residual connections ease training of very deep networks.",
	 "keywords": ["vision", "residual"]},
	{"id": "mamba", "title": "Mamba: Linear-Time Sequence Modeling", "year": 2023, "category": "llm",
	 "abstract": "Selective state space models as an alternative to attention.",
	 "keywords": ["sequence", "state space", "language"]}
]}"#;

const RANKING: &str = r#"[
	{"id": "attention", "score": 0.95},
	{"id": "bert", "score": 0.82},
	{"id": "gpt3", "score": 0.78},
	{"id": "flash", "score": 0.7},
	{"id": "llama", "score": 0.64},
	{"id": "vit", "score": 0.45},
	{"id": "mamba", "score": 0.38}
]"#;

const SIMILARITIES: &str = r#"[
	{"a": "attention", "b": "bert", "similarity": 0.8},
	{"a": "attention", "b": "flash", "similarity": 0.75},
	{"a": "attention", "b": "vit", "similarity": 0.55},
	{"a": "bert", "b": "gpt3", "similarity": 0.6},
	{"a": "gpt3", "b": "llama", "similarity": 0.85},
	{"a": "llama", "b": "mamba", "similarity": 0.4},
	{"a": "vit", "b": "mamba", "similarity": 0.1}
]"#;

const SEMANTIC_INDEX: &str = r#"{
	"paperId": "attention",
	"title": "Attention Is All You Need",
	"builtAt": "2024-05-01T12:00:00Z",
	"tree": {
		"id": "root",
		"label": "Attention Is All You Need",
		"children": [
			{"id": "arch", "label": "Model Architecture", "position": {"page": 3}, "children": [
				{"id": "encdec", "label": "Encoder and Decoder Stacks", "position": {"page": 3, "quote": "The encoder is composed of a stack of N = 6 identical layers."}},
				{"id": "attn", "label": "Scaled Dot-Product Attention", "position": {"page": 4}, "children": [
					{"id": "mha", "label": "Multi-Head Attention", "position": {"page": 4}},
					{"id": "mask", "label": "Masked Attention", "content": "Prevents positions from attending to subsequent positions.", "position": {"page": 5}}
				]},
				{"id": "posenc", "label": "Positional Encoding", "position": {"page": 6}}
			]},
			{"id": "training", "label": "Training", "position": {"page": 7}, "children": [
				{"id": "optimizer", "label": "Optimizer and Warmup Schedule", "position": {"page": 7}},
				{"id": "regularization", "label": "Regularization", "position": {"page": 8}}
			]},
			{"id": "results", "label": "Results", "position": {"page": 8}, "children": [
				{"id": "mt", "label": "Machine Translation", "position": {"page": 8}},
				{"id": "parsing", "label": "English Constituency Parsing", "position": {"page": 9}}
			]}
		]
	}
}"#;

pub fn catalog() -> Vec<Document> {
	oracle::parse_catalog(CATALOG)
}

/// Retrieval input for `query`. The bundled ranking answers the default
/// query; any other query is ranked by keyword scoring.
pub fn retrieval_input(query: &str) -> RetrievalInput {
	let catalog = catalog();
	let ranked = if query.trim() == DEFAULT_QUERY {
		oracle::apply_ranking(query, &catalog, RANKING)
	} else {
		oracle::keyword_rank(query, &catalog)
	};
	RetrievalInput {
		query: query.to_string(),
		ranked,
		similarities: oracle::parse_similarities(SIMILARITIES),
	}
}

pub fn semantic_index() -> Option<SemanticIndex> {
	oracle::parse_semantic_index(SEMANTIC_INDEX)
}
