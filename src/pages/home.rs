use leptos::prelude::*;
use leptos_router::components::A;

use super::details::PayloadDetails;
use super::sample;
use crate::components::force_graph::RetrievalGraphView;
use crate::graph::{NodePayload, YearFilter};

const YEAR_OPTIONS: [&str; 4] = ["all", "2018", "2020", "2022"];

/// Retrieval demo: a query, its ranked documents and their similarities.
#[component]
pub fn Home() -> impl IntoView {
	let query = RwSignal::new(sample::DEFAULT_QUERY.to_string());
	let draft = RwSignal::new(sample::DEFAULT_QUERY.to_string());
	let year_filter = RwSignal::new(YearFilter::All);
	let selected = RwSignal::new(None::<NodePayload>);

	let input = Memo::new(move |_| sample::retrieval_input(&query.get()));
	let on_navigate = Callback::new(move |payload: NodePayload| selected.set(Some(payload)));

	let on_submit = move |ev: leptos::ev::SubmitEvent| {
		ev.prevent_default();
		selected.set(None);
		query.set(draft.get_untracked());
	};

	view! {
		<div class="page retrieval-page">
			<header>
				<h1>"Research Graph"</h1>
				<p class="subtitle">
					"Drag nodes to reposition. Scroll to zoom. Drag background to pan."
				</p>
				<A href="/concepts">"Concept map"</A>
			</header>

			<form class="controls" on:submit=on_submit>
				<input
					type="text"
					prop:value=move || draft.get()
					on:input=move |ev| draft.set(event_target_value(&ev))
				/>
				<button type="submit">"Search"</button>
				<select on:change=move |ev| year_filter.set(YearFilter::parse(&event_target_value(&ev)))>
					{YEAR_OPTIONS
						.into_iter()
						.map(|value| {
							let label = if value == "all" {
								"All years".to_string()
							} else {
								format!("{} and later", value)
							};
							view! { <option value=value>{label}</option> }
						})
						.collect_view()}
				</select>
			</form>

			<div class="graph-layout">
				<RetrievalGraphView input=input year_filter=year_filter on_navigate=on_navigate />
				<aside>
					<PayloadDetails selected=selected />
				</aside>
			</div>
		</div>
	}
}
