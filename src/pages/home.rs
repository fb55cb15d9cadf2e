use leptos::prelude::*;
use log::info;

use crate::components::force_graph::{ForceGraphCanvas, GraphStyle};
use crate::topics::{CreateRequest, NodeId, SelectionEvent, SubjectCatalog, TopicNavigator};

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let catalog = SubjectCatalog::load();

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				{catalog.map(|catalog| view! { <TopicMap catalog=catalog /> })}
			</div>
		</ErrorBoundary>
	}
}

/// Navigator canvas for one subject at a time, plus the panels that stand
/// in for the content list and the topic-creation form.
#[component]
fn TopicMap(catalog: SubjectCatalog) -> impl IntoView {
	let style = GraphStyle::default();
	let first = catalog.first();
	let navigator = RwSignal::new(TopicNavigator::new(
		first.title.clone(),
		first.forest.clone(),
	));
	let titles: Vec<String> = catalog.subjects().iter().map(|s| s.title.clone()).collect();
	let catalog = StoredValue::new(catalog);
	let active_topic = RwSignal::new(None::<NodeId>);
	let create_request = RwSignal::new(None::<CreateRequest>);

	let visible = Memo::new(move |_| navigator.with(|nav| nav.visible_set(&style.nodes)));

	let on_node_click = Callback::new(move |id: NodeId| {
		let Some(activation) = navigator.try_update(|nav| nav.activate(id)) else {
			return;
		};
		if let Some(SelectionEvent { topic_id }) = activation.selection {
			info!("Topic filter set to {topic_id:?}");
			active_topic.set(topic_id);
		}
	});

	let on_node_context = Callback::new(move |id: NodeId| {
		if let Some(request) = navigator.with_untracked(|nav| nav.request_create_child(id)) {
			info!("Create requested under {:?}", request.parent_topic_id);
			create_request.set(Some(request));
		}
	});

	let switch_subject = move |title: String| {
		let Some(subject) = catalog.with_value(|c| c.get(&title).cloned()) else {
			return;
		};
		navigator.update(|nav| nav.load_subject(subject.title, subject.forest));
		active_topic.set(None);
		create_request.set(None);
	};

	let subject_title = move || navigator.with(|nav| nav.subject().to_string());

	let filter_label = move || {
		navigator.with(|nav| match active_topic.get() {
			Some(id) => nav.label_of(id).map(str::to_string).unwrap_or_else(|| id.to_string()),
			None => "Барлық тақырыптар".to_string(),
		})
	};

	let record_count = move || {
		let title = navigator.with(|nav| nav.subject().to_string());
		catalog.with_value(|c| {
			c.get(&title)
				.map(|subject| match active_topic.get() {
					Some(id) => subject.records_for(id).count(),
					None => subject.records.len(),
				})
				.unwrap_or(0)
		})
	};

	let create_label = move || {
		create_request.get().map(|request| {
			navigator.with(|nav| match request.parent_topic_id {
				Some(id) => format!(
					"Жаңа тақырып: «{}» ішінде",
					nav.label_of(id).unwrap_or_default()
				),
				None => format!("Жаңа тақырып: {}", nav.subject()),
			})
		})
	};

	view! {
		<ForceGraphCanvas
			data=visible
			on_node_click=on_node_click
			on_node_context=on_node_context
			style=style
			fullscreen=true
		/>
		<div class="graph-overlay">
			<h1>{subject_title}</h1>
			<nav class="subject-switcher">
				{titles
					.into_iter()
					.map(|title| {
						let target = title.clone();
						view! { <button on:click=move |_| switch_subject(target.clone())>{title}</button> }
					})
					.collect_view()}
			</nav>
			<p class="subtitle">
				"Click a node to open it. Right-click the centre or a topic to add a subtopic."
			</p>
			<p class="active-filter">{filter_label} " · " {record_count} " материал"</p>
			<Show when=move || create_request.get().is_some()>
				<p class="create-request">
					{create_label}
					<button on:click=move |_| create_request.set(None)>"×"</button>
				</p>
			</Show>
		</div>
	}
}
