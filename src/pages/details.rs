use leptos::prelude::*;

use crate::graph::NodePayload;

/// Side panel describing the last clicked node.
#[component]
pub fn PayloadDetails(#[prop(into)] selected: Signal<Option<NodePayload>>) -> impl IntoView {
	move || match selected.get() {
		None => view! { <p class="hint">"Click a node to see its details."</p> }.into_any(),
		Some(NodePayload::Query { text }) => view! {
			<div class="details">
				<h3>"Query"</h3>
				<p>{text}</p>
			</div>
		}
		.into_any(),
		Some(NodePayload::Document {
			document,
			relevance_score,
		}) => {
			let year = document.year.map(|y| y.to_string()).unwrap_or_else(|| "n.d.".into());
			let title = document.display_title().to_string();
			let abstract_text = document.abstract_text.clone().unwrap_or_default();
			view! {
				<div class="details">
					<h3>{title}</h3>
					<p class="meta">{format!("{} · relevance {:.2}", year, relevance_score)}</p>
					<p>{abstract_text}</p>
				</div>
			}
			.into_any()
		}
		Some(NodePayload::Concept { entry, depth }) => {
			let page = entry
				.position
				.as_ref()
				.map(|p| format!("page {}", p.page))
				.unwrap_or_else(|| "no page".into());
			let content = entry.content.clone().or_else(|| entry.quote.clone()).unwrap_or_default();
			view! {
				<div class="details">
					<h3>{entry.label.clone()}</h3>
					<p class="meta">{format!("{} · depth {}", page, depth)}</p>
					<p>{content}</p>
				</div>
			}
			.into_any()
		}
	}
}
