use dioxus::prelude::*;
use tracing::warn;

use crate::admin::payments::{AdminPaymentsView, PaymentStatus};
use crate::admin::violations::{AdminViolationsView, ViolationStatus};
use crate::components::guard::RequireAuth;
use crate::components::toast::FormError;
use crate::hooks::use_app;

/// Browser `alert()`, which blocks until the admin dismisses it.
fn blocking_alert(message: &str) {
  let Some(window) = web_sys::window() else {
    return;
  };
  if let Err(e) = window.alert_with_message(message) {
    warn!("alert failed: {:?}", e);
  }
}

#[component]
fn Pager(page: u32, total_pages: u32, on_go: EventHandler<u32>) -> Element {
  rsx! {
    div {
      class: "pager",
      button { disabled: page <= 1, onclick: move |_| on_go.call(page.saturating_sub(1)), "Previous" }
      span { "Page {page} of {total_pages}" }
      button { disabled: page >= total_pages, onclick: move |_| on_go.call(page + 1), "Next" }
    }
  }
}

#[component]
pub fn AdminDashboard() -> Element {
  rsx! {
    RequireAuth { admin: true, PaymentsPanel {} }
  }
}

#[component]
fn PaymentsPanel() -> Element {
  let ctx = use_app();
  let locale = ctx.config.locale;
  let every = ctx.config.poll.admin_financial;
  let mut view = use_signal(move || AdminPaymentsView::new(ctx.api.clone(), ctx.cache.clone(), locale));
  // cache reads are not reactive, bumping this re-renders after a load
  let mut revision = use_signal(|| 0u64);
  let mut busy = use_signal(|| false);
  let mut load_error = use_signal(|| None::<String>);

  use_future(move || async move {
    loop {
      let v = view.peek().clone();
      match v.refresh().await {
        Ok(_) => load_error.set(None),
        Err(e) => load_error.set(Some(e.user_message(locale))),
      }
      *revision.write() += 1;
      async_std::task::sleep(every).await;
    }
  });

  let confirm = move |_: MouseEvent| async move {
    let mut v = view();
    busy.set(true);
    if let Err(e) = v.confirm_refund().await {
      warn!("refund did not go through: {}", e);
    }
    busy.set(false);
    if let Some(alert) = v.refund.draft().and_then(|d| d.alert.clone()) {
      blocking_alert(&alert);
      v.refund.dismiss_alert();
    }
    view.set(v);
    *revision.write() += 1;
  };

  let _ = revision();
  let v = view.read();
  let stats = v.statistics().unwrap_or_default();
  let page = v.current_page();
  let search = v.filter.search_query.clone();
  let draft = v.refund.draft().cloned();
  let rows: Vec<_> = v
    .filtered()
    .into_iter()
    .map(|p| {
      let label = p.status.label(locale);
      let when = p.created_at.format("%Y-%m-%d %H:%M").to_string();
      (p, label, when)
    })
    .collect();
  drop(v);

  let dialog = draft.map(|d| {
    rsx! {
      div {
        class: "dialog-backdrop",
        div {
          class: "dialog",
          role: "dialog",
          h3 { "Refund payment {d.payment_id}" }
          p { "The customer is refunded in full. This cannot be undone." }
          textarea {
            placeholder: "Reason (optional)",
            value: "{d.reason}",
            oninput: move |evt: FormEvent| view.write().refund.set_reason(&evt.value()),
          }
          div {
            button { disabled: busy(), onclick: move |_| view.write().refund.cancel(), "Cancel" }
            button { disabled: busy(), onclick: confirm, if busy() { "Refunding…" } else { "Confirm refund" } }
          }
        }
      }
    }
  });

  rsx! {
    div {
      class: "admin-page",
      h1 { "Payments" }
      FormError { message: load_error() }
      section {
        class: "stats",
        div { class: "stat-card", h3 { "Revenue" } p { "{stats.total_revenue}" } }
        div { class: "stat-card", h3 { "Payments" } p { "{stats.total_payments}" } }
        div { class: "stat-card", h3 { "Successful" } p { "{stats.successful_payments}" } }
        div { class: "stat-card", h3 { "Pending" } p { "{stats.pending_payments}" } }
        div { class: "stat-card", h3 { "Refunded" } p { "{stats.refunded_amount}" } }
      }
      div {
        class: "filters",
        input {
          placeholder: "Search id, account, transaction or email",
          value: "{search}",
          oninput: move |evt: FormEvent| view.write().set_search(&evt.value()),
        }
        select {
          onchange: move |evt: FormEvent| view.write().set_status(&evt.value()),
          option { value: "all", "All statuses" }
          for status in PaymentStatus::ALL {
            option { value: status.as_str(), {status.label(locale)} }
          }
        }
      }
      table {
        thead {
          tr {
            th { "Payment" }
            th { "Account" }
            th { "Email" }
            th { "Amount" }
            th { "Status" }
            th { "Created" }
            th {}
          }
        }
        tbody {
          for (p, label, when) in rows {
            tr {
              key: "{p.id}",
              td { "{p.id}" }
              td { "{p.account_id}" }
              td { {p.user_email.clone().unwrap_or_default()} }
              td { {p.display_amount()} }
              td { "{label}" }
              td { "{when}" }
              td {
                if p.is_refundable() {
                  button {
                    onclick: {
                      let id = p.id.clone();
                      move |_| {
                        view.write().open_refund(&id);
                      }
                    },
                    "Refund"
                  }
                }
              }
            }
          }
        }
      }
      Pager {
        page: page.page,
        total_pages: page.total_pages,
        on_go: move |n| {
          view.write().set_page(n);
        },
      }
      {dialog}
    }
  }
}

#[component]
pub fn AdminViolations() -> Element {
  rsx! {
    RequireAuth { admin: true, ViolationsPanel {} }
  }
}

#[component]
fn ViolationsPanel() -> Element {
  let ctx = use_app();
  let locale = ctx.config.locale;
  let mut view = use_signal(move || AdminViolationsView::new(ctx.api.clone(), ctx.cache.clone()));
  let mut revision = use_signal(|| 0u64);
  let mut load_error = use_signal(|| None::<String>);

  // moves to page `n` on a copy, then stores the copy back
  let go_to = move |n: u32| async move {
    let mut v = view();
    match v.go_to(n).await {
      Ok(_) => load_error.set(None),
      Err(e) => load_error.set(Some(e.user_message(locale))),
    }
    view.set(v);
    *revision.write() += 1;
  };

  use_future(move || go_to(1));

  let _ = revision();
  let v = view.read();
  let stats = v.stats();
  let page = v.filter.page;
  let total_pages = v.total_pages();
  let total = v.current().map(|p| p.total).unwrap_or_default();
  let search = v.filter.search_query.clone();
  let rows: Vec<_> = v
    .filtered()
    .into_iter()
    .map(|r| {
      let label = r.status.label(locale);
      let when = r.created_at.format("%Y-%m-%d %H:%M").to_string();
      (r, label, when)
    })
    .collect();
  drop(v);

  rsx! {
    div {
      class: "admin-page",
      h1 { "Rule violations" }
      FormError { message: load_error() }
      section {
        class: "stats",
        div { class: "stat-card", h3 { "Total" } p { "{stats.total}" } }
        div { class: "stat-card", h3 { "Active" } p { "{stats.active}" } }
        div { class: "stat-card", h3 { "Resolved" } p { "{stats.resolved}" } }
      }
      div {
        class: "filters",
        input {
          placeholder: "Search id, account or rule",
          value: "{search}",
          oninput: move |evt: FormEvent| view.write().set_search(&evt.value()),
        }
        select {
          onchange: move |evt: FormEvent| view.write().set_status(&evt.value()),
          option { value: "all", "All statuses" }
          for status in ViolationStatus::ALL {
            option { value: status.as_str(), {status.label(locale)} }
          }
        }
      }
      table {
        thead {
          tr {
            th { "Violation" }
            th { "Account" }
            th { "Rule" }
            th { "Severity" }
            th { "Status" }
            th { "Detected" }
          }
        }
        tbody {
          for (r, label, when) in rows {
            tr {
              key: "{r.id}",
              td { "{r.id}" }
              td { "{r.account_id}" }
              td { title: "{r.description}", "{r.rule}" }
              td { {r.severity.clone().unwrap_or_default()} }
              td { "{label}" }
              td { "{when}" }
            }
          }
        }
      }
      p { "{total} violations" }
      Pager {
        page,
        total_pages,
        on_go: move |n| {
          spawn(go_to(n));
        },
      }
    }
  }
}
