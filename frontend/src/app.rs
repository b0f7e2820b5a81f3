#![allow(non_snake_case)]

use std::sync::Arc;

use dioxus::prelude::*;

use crate::components::nav::NavBar;
use crate::flows::signin::restore_session;
use crate::flows::Destination;
use crate::pages::{
  admin::{AdminDashboard, AdminViolations},
  auth::{ForgotPassword, SignIn, SignUp},
  dashboard::Dashboard,
  notifications::Notifications,
};
use crate::utils::api::ApiClient;
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::config::ClientConfig;
use crate::utils::query::QueryCache;
use crate::utils::session::{AuthSession, LocalStorage, SessionState};

#[derive(Routable, PartialEq, Clone)]
pub enum Route {
  #[layout(NavBar)]
  #[route("/")]
  Dashboard {},
  #[route("/sign-in")]
  SignIn {},
  #[route("/sign-up")]
  SignUp {},
  #[route("/forgot-password")]
  ForgotPassword {},
  #[route("/notifications")]
  Notifications {},
  #[route("/admin")]
  AdminDashboard {},
  #[route("/admin/violations")]
  AdminViolations {},
  #[end_layout]
  #[route("/:..route")]
  PageNotFound { route: Vec<String> },
}

impl From<Destination> for Route {
  fn from(dest: Destination) -> Self {
    match dest {
      Destination::Dashboard => Route::Dashboard {},
      Destination::AdminDashboard => Route::AdminDashboard {},
      Destination::SignIn => Route::SignIn {},
    }
  }
}

/// Process-wide handles shared by every page.
#[derive(Clone)]
pub struct AppContext {
  pub config: ClientConfig,
  pub session: Arc<AuthSession>,
  pub cache: Arc<QueryCache>,
  pub api: Arc<ApiClient>,
  pub clock: Arc<dyn Clock>,
}

impl AppContext {
  pub fn init() -> Self {
    let config = ClientConfig::from_build_env();
    let session = AuthSession::init(LocalStorage);
    let cache = QueryCache::new();
    let api = Arc::new(ApiClient::new(&config, session.clone(), cache.clone()));
    Self { config, session, cache, api, clock: Arc::new(SystemClock) }
  }
}

/// Reactive copy of the session, refreshed after every sign-in/out.
#[derive(Clone, Copy)]
pub struct SessionSignal(pub Signal<SessionState>);

#[component]
pub fn App() -> Element {
  let ctx = use_context_provider(AppContext::init);
  let mut session = use_context_provider(|| SessionSignal(Signal::new(ctx.session.snapshot()))).0;

  // fill in the user for a token that survived the reload
  let restore = ctx.clone();
  use_future(move || {
    let ctx = restore.clone();
    async move {
      if let Err(e) = restore_session(ctx.api.as_ref(), &ctx.session).await {
        tracing::warn!("session restore failed: {}", e);
      }
      session.set(ctx.session.snapshot());
    }
  });

  // mirror every session change, including a teardown after a 401
  use_future(move || {
    let auth = ctx.session.clone();
    async move {
      let mut changes = auth.subscribe();
      while changes.changed().await.is_ok() {
        session.set(auth.snapshot());
      }
    }
  });

  static CSS: Asset = asset!("/assets/main.css");
  rsx! {
    document::Stylesheet { href: CSS }
    Router::<Route> {}
  }
}

#[component]
fn PageNotFound(route: Vec<String>) -> Element {
  let path = route.join("/");
  rsx! {
    h1 { "Page not found" }
    p { "Nothing lives at /{path}." }
    Link { to: Route::Dashboard {}, "Back to the dashboard" }
  }
}
