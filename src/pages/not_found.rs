use leptos::prelude::*;

/// 404 Not Found Page
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<div class="not-found">
			<h1>"Бет табылмады"</h1>
			<a href="/">"Тақырыптар картасына оралу"</a>
		</div>
	}
}
