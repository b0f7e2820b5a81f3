use dioxus::prelude::*;

use crate::app::Route;
use crate::components::guard::RequireAuth;
use crate::hooks::{use_app, use_auth_session, use_notifications};
use crate::utils::notifications::DROPDOWN_LIMIT;

#[component]
pub fn Dashboard() -> Element {
  rsx! {
    RequireAuth { TraderHome {} }
  }
}

#[component]
fn TraderHome() -> Element {
  let ctx = use_app();
  let auth = use_auth_session();
  let notes = use_notifications(ctx.config.poll.app_shell);
  let store = notes.store.read();
  let counts = store.counts();

  let name = auth
    .read()
    .user
    .map(|u| u.first_name.unwrap_or(u.email))
    .unwrap_or_default();

  rsx! {
    div {
      class: "dashboard",
      h1 { "Welcome back, {name}" }
      section {
        class: "stats",
        div { class: "stat-card", h3 { "Unread" } p { "{counts.unread}" } }
        div { class: "stat-card", h3 { "Warnings" } p { "{counts.warnings}" } }
        div { class: "stat-card", h3 { "Alerts" } p { "{counts.errors}" } }
      }
      section {
        h2 { "Latest activity" }
        if store.is_empty() {
          p { "Nothing yet. Updates about your challenges and payouts show up here." }
        }
        ul {
          for n in store.top(DROPDOWN_LIMIT) {
            li {
              key: "{n.id}",
              class: if n.read { "read" } else { "unread" },
              strong { "{n.title}" }
              p { "{n.body}" }
            }
          }
        }
        Link { to: Route::Notifications {}, "All notifications" }
      }
    }
  }
}
