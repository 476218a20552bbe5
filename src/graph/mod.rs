//! Graph model and the builders that produce it.
//!
//! Everything here is pure and free of DOM access, so it is exercised by
//! native tests.

pub mod concept;
pub mod model;
pub mod oracle;
pub mod retrieval;

pub use concept::{ConceptEntry, ConceptTreeNode, flatten};
pub use model::{GraphModel, Link, LinkKind, Node, NodeKind, NodePayload, SourcePosition};
pub use oracle::{Document, SemanticIndex, SimilarityPair};
pub use retrieval::{RetrievalInput, YearFilter};
