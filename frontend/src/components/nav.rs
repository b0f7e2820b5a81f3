use dioxus::prelude::*;

use crate::app::Route;
use crate::flows::signin::sign_out;
use crate::hooks::{use_app, use_auth_session, use_notifications, UseNotifications};
use crate::utils::notifications::DROPDOWN_LIMIT;
use crate::utils::server::UserRole;

#[component]
pub fn NavBar() -> Element {
  let ctx = use_app();
  let mut auth = use_auth_session();
  let session = auth.read();

  rsx! {
    nav {
      div {
        class: "nav-container",
        Link { class: "logo", to: Route::Dashboard {}, "PropDesk" }
        div {
          class: "nav-links",
          if session.token.is_some() {
            if session.user.as_ref().is_some_and(|u| u.role == UserRole::Admin) {
              Link { active_class: "nav-active", to: Route::AdminDashboard {}, "Payments" }
              Link { active_class: "nav-active", to: Route::AdminViolations {}, "Violations" }
            }
            NotificationBell {}
            button {
              class: "link-button",
              onclick: move |_| {
                sign_out(&ctx.session, &ctx.cache);
                auth.sync(&ctx);
                navigator().push(Route::SignIn {});
              },
              "Sign out"
            }
          } else {
            Link { active_class: "nav-active", to: Route::SignIn {}, "Sign in" }
            Link { active_class: "nav-active", to: Route::SignUp {}, "Sign up" }
          }
        }
      }
    }
    Outlet::<Route> {}
  }
}

#[component]
fn NotificationBell() -> Element {
  let ctx = use_app();
  let notes: UseNotifications = use_notifications(ctx.config.poll.app_shell);
  let mut open = use_signal(|| false);
  let store = notes.store.read();
  let unread = store.counts().unread;

  rsx! {
    div {
      class: "bell",
      button {
        class: "bell-button",
        onclick: move |_| open.toggle(),
        "🔔"
        if unread > 0 {
          span { class: "badge", "{unread}" }
        }
      }
      if open() {
        ul {
          class: "bell-dropdown",
          for n in store.top(DROPDOWN_LIMIT) {
            li {
              key: "{n.id}",
              class: if n.read { "read" } else { "unread" },
              onclick: {
                let notes = notes.clone();
                let id = n.id.clone();
                move |_| notes.mark_read(id.clone())
              },
              strong { "{n.title}" }
              p { "{n.body}" }
            }
          }
          li { Link { to: Route::Notifications {}, "See all" } }
        }
      }
    }
  }
}
