use dioxus::prelude::*;

use crate::app::Route;
use crate::hooks::use_auth_session;
use crate::utils::server::UserRole;

/// Renders `children` only for a signed-in user (an admin when `admin` is set).
#[component]
pub fn RequireAuth(#[props(default)] admin: bool, children: Element) -> Element {
  let auth = use_auth_session();
  let session = auth.read();

  if session.token.is_none() {
    return rsx! {
      section {
        class: "auth-card",
        p { "Sign in to continue." }
        Link { to: Route::SignIn {}, "Sign in" }
      }
    };
  }
  // a hydrated token has no profile until /auth/me answers
  let Some(user) = session.user else {
    return rsx! { p { "Loading your account…" } };
  };
  if admin && user.role != UserRole::Admin {
    return rsx! { p { "This area is for administrators." } };
  }
  children
}
