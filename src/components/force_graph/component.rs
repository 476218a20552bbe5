use leptos::prelude::*;

use super::mount::{GraphSlot, RetrievalGraph};
use super::types::MountOptions;
use crate::graph::{ConceptTreeNode, NodePayload, RetrievalInput, YearFilter, flatten};

fn options_for(on_navigate: Option<Callback<NodePayload>>) -> MountOptions {
	match on_navigate {
		Some(cb) => MountOptions::default().with_navigate(move |payload| cb.run(payload.clone())),
		None => MountOptions::default(),
	}
}

/// Query-centred retrieval graph. Changing the year filter rebuilds the
/// graph from the same input.
#[component]
pub fn RetrievalGraphView(
	#[prop(into)] input: Signal<RetrievalInput>,
	#[prop(into)] year_filter: Signal<YearFilter>,
	#[prop(optional)] on_navigate: Option<Callback<NodePayload>>,
	#[prop(optional, into)] class: Option<String>,
) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let graph = StoredValue::new_local(None::<RetrievalGraph>);

	Effect::new(move |_| {
		let (input, filter) = (input.get(), year_filter.get());
		let Some(container) = container_ref.get() else {
			return;
		};
		graph.update_value(|current| {
			if let Some(existing) = current.as_mut().filter(|g| *g.input() == input) {
				existing.set_year_filter(filter);
				return;
			}
			if let Some(mut old) = current.take() {
				old.destroy();
			}
			*current = RetrievalGraph::mount(&container, input, filter, options_for(on_navigate));
		});
	});

	on_cleanup(move || {
		graph.update_value(|current| {
			if let Some(mut g) = current.take() {
				g.destroy();
			}
		});
	});

	view! {
		<div
			node_ref=container_ref
			class=format!("graph-container retrieval-graph {}", class.unwrap_or_default())
		/>
	}
}

/// Concept tree rendered as a hierarchy graph. Concepts on `highlight_page`
/// are drawn highlighted; with a `document_href`, clicking a concept opens
/// the document at its page.
#[component]
pub fn ConceptGraphView(
	#[prop(into)] tree: Signal<Option<ConceptTreeNode>>,
	#[prop(optional, into)] highlight_page: Signal<Option<u32>>,
	#[prop(optional, into)] document_href: Option<String>,
	#[prop(optional)] on_navigate: Option<Callback<NodePayload>>,
	#[prop(optional, into)] class: Option<String>,
) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let slot = StoredValue::new_local(GraphSlot::default());

	Effect::new(move |_| {
		let (tree, page) = (tree.get(), highlight_page.get());
		let Some(container) = container_ref.get() else {
			return;
		};
		slot.update_value(|slot| {
			let Some(root) = tree else {
				slot.clear();
				return;
			};
			let mut options = options_for(on_navigate).with_highlight_page(page);
			if let Some(href) = document_href.clone() {
				options = options.with_document_href(href);
			}
			slot.mount(&container, &flatten(&root), options);
		});
	});

	on_cleanup(move || {
		slot.update_value(GraphSlot::clear);
	});

	view! {
		<div
			node_ref=container_ref
			class=format!("graph-container concept-graph {}", class.unwrap_or_default())
		/>
	}
}
