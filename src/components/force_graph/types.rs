use std::rc::Rc;

use super::config::LayoutConfig;
use crate::graph::NodePayload;

/// Host callback invoked with the payload of a clicked node.
pub type NavigateFn = Rc<dyn Fn(&NodePayload)>;

/// Result of clicking a navigable node.
#[derive(Clone, Debug, PartialEq)]
pub struct ClickAction {
	/// Payload handed to the host's navigation callback.
	pub payload: NodePayload,
	/// Page-anchored document viewer link to open, for concept nodes.
	pub external_url: Option<String>,
}

/// Per-mount settings supplied by the host.
#[derive(Clone, Default)]
pub struct MountOptions {
	/// Called when a document or concept node is clicked.
	pub on_navigate: Option<NavigateFn>,
	/// Document viewer reference; concept clicks open `href#page=N`.
	pub document_href: Option<String>,
	/// Concept nodes on this page are drawn highlighted.
	pub highlight_page: Option<u32>,
	/// Overrides the preset picked from the graph.
	pub config: Option<LayoutConfig>,
}

impl MountOptions {
	/// Sets the navigation callback.
	pub fn with_navigate(mut self, f: impl Fn(&NodePayload) + 'static) -> Self {
		self.on_navigate = Some(Rc::new(f));
		self
	}

	/// Sets the document viewer reference.
	pub fn with_document_href(mut self, href: impl Into<String>) -> Self {
		self.document_href = Some(href.into());
		self
	}

	/// Sets the page to highlight.
	pub fn with_highlight_page(mut self, page: Option<u32>) -> Self {
		self.highlight_page = page;
		self
	}

	/// Overrides the layout preset.
	pub fn with_config(mut self, config: LayoutConfig) -> Self {
		self.config = Some(config);
		self
	}
}
