use leptos::prelude::*;
use leptos_router::components::A;

use super::details::PayloadDetails;
use super::sample;
use crate::components::force_graph::ConceptGraphView;
use crate::graph::NodePayload;

/// Concept map demo for a bundled semantic index.
#[component]
pub fn Concepts() -> impl IntoView {
	let index = sample::semantic_index();
	let title = index
		.as_ref()
		.map(|i| i.title.clone())
		.unwrap_or_else(|| "Concept map".into());
	let tree = Signal::derive(move || index.as_ref().map(|i| i.tree.clone()));
	let highlight_page = RwSignal::new(None::<u32>);
	let selected = RwSignal::new(None::<NodePayload>);
	let on_navigate = Callback::new(move |payload: NodePayload| selected.set(Some(payload)));

	view! {
		<div class="page concept-page">
			<header>
				<h1>{title}</h1>
				<A href="/">"Back to search"</A>
			</header>

			<div class="controls">
				<label>"Current page "</label>
				<select on:change=move |ev| {
					highlight_page.set(event_target_value(&ev).parse().ok())
				}>
					<option value="">"None"</option>
					{(1..=9u32)
						.map(|page| view! { <option value=page.to_string()>{page}</option> })
						.collect_view()}
				</select>
			</div>

			<div class="graph-layout">
				<ConceptGraphView
					tree=tree
					highlight_page=highlight_page
					document_href=sample::DOCUMENT_HREF
					on_navigate=on_navigate
				/>
				<aside>
					<PayloadDetails selected=selected />
				</aside>
			</div>
		</div>
	}
}
