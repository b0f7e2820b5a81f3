pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod notifications;

use dioxus::prelude::FormEvent;

/// Text value of a named form field, empty when missing.
pub(crate) fn field(evt: &FormEvent, name: &str) -> String {
  evt.values().get(name).map(|v| v.as_value()).unwrap_or_default()
}
