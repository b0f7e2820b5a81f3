use dioxus::prelude::*;

use crate::components::guard::RequireAuth;
use crate::hooks::{use_app, use_notifications};
use crate::utils::notifications::NotificationFilter;
use crate::utils::server::{NotificationCategory, NotificationKind};

const CATEGORIES: [(&str, Option<NotificationCategory>); 5] = [
  ("all", None),
  ("challenge", Some(NotificationCategory::Challenge)),
  ("payout", Some(NotificationCategory::Payout)),
  ("account", Some(NotificationCategory::Account)),
  ("system", Some(NotificationCategory::System)),
];

fn category_from(value: &str) -> Option<NotificationCategory> {
  CATEGORIES.iter().find(|(tag, _)| *tag == value).and_then(|(_, c)| *c)
}

fn kind_icon(kind: NotificationKind) -> &'static str {
  match kind {
    NotificationKind::Info => "ℹ",
    NotificationKind::Success => "✔",
    NotificationKind::Warning => "⚠",
    NotificationKind::Error => "✖",
  }
}

#[component]
pub fn Notifications() -> Element {
  rsx! {
    RequireAuth { NotificationCenter {} }
  }
}

#[component]
fn NotificationCenter() -> Element {
  let ctx = use_app();
  let notes = use_notifications(ctx.config.poll.notifications_page);
  let mut filter = use_signal(NotificationFilter::default);

  let store = notes.store.read();
  let counts = store.counts();
  let current = filter();
  let all_read = notes.clone();
  let rows: Vec<_> = store
    .filtered(&current)
    .into_iter()
    .map(|n| (n.clone(), kind_icon(n.kind), n.created_at.format("%b %e, %H:%M").to_string()))
    .collect();

  rsx! {
    div {
      class: "notifications-page",
      header {
        h1 { "Notifications" }
        p { "{counts.unread} unread of {counts.total}" }
        button {
          disabled: counts.unread == 0,
          onclick: move |_| all_read.mark_all_read(),
          "Mark all as read"
        }
      }
      div {
        class: "filters",
        select {
          onchange: move |evt: FormEvent| filter.write().category = category_from(&evt.value()),
          for (tag, _) in CATEGORIES {
            option { value: tag, "{tag}" }
          }
        }
        label {
          input {
            r#type: "checkbox",
            checked: current.unread_only,
            onchange: move |evt: FormEvent| filter.write().unread_only = evt.checked(),
          }
          "Unread only"
        }
      }
      ul {
        for (n, icon, when) in rows {
          li {
            key: "{n.id}",
            class: if n.read { "read" } else { "unread" },
            span { class: "kind", "{icon}" }
            strong { "{n.title}" }
            p { "{n.body}" }
            small { "{when}" }
            if !n.read {
              button {
                class: "link-button",
                onclick: {
                  let notes = notes.clone();
                  let id = n.id.clone();
                  move |_| notes.mark_read(id.clone())
                },
                "Mark as read"
              }
            }
          }
        }
      }
    }
  }
}
