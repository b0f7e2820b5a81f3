use dioxus::prelude::*;

#[component]
pub fn ErrorToast(content: String) -> Element {
  rsx! {
    div { class: "toast toast-error", role: "alert", "{content}" }
  }
}

#[component]
pub fn SuccessToast(content: String) -> Element {
  rsx! {
    div { class: "toast toast-success", role: "status", "{content}" }
  }
}

/// Inline error under a form, rendered only when there is one.
#[component]
pub fn FormError(message: Option<String>) -> Element {
  match message {
    Some(content) => rsx! { ErrorToast { content } },
    None => rsx! {},
  }
}
