//! In-memory stand-in for the PropDesk REST backend.
//!
//! Serves the endpoints the dashboard consumes so the client can be run and
//! contract-tested without the real service.

pub mod config;
pub mod midwares;
pub mod route_handlers;
pub mod seed;

use axum::{
  middleware,
  routing::{get, post},
  Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub use config::StubConfig;
pub use midwares::app_state::AppState;
use midwares::auth::require_auth;
use route_handlers::{auth, notifications, payments, violations};

pub fn app(state: AppState) -> Router {
  let protected = Router::new()
    .route("/auth/me", get(auth::me))
    .route("/notifications", get(notifications::list))
    .route("/notifications/read-all", post(notifications::mark_all_read))
    .route("/notifications/{id}/read", post(notifications::mark_read))
    .route("/admin/payments", get(payments::list))
    .route("/admin/payments/statistics", get(payments::statistics))
    .route("/admin/payments/{id}/refund", post(payments::refund))
    .route("/admin/violations", get(violations::list))
    .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

  Router::new()
    .route("/auth/register/request-otp", post(auth::request_signup_otp))
    .route("/auth/register/verify-otp", post(auth::verify_signup_otp))
    .route("/auth/login", post(auth::login))
    .route("/auth/forgot-password", post(auth::forgot_password))
    .route("/auth/reset-password", post(auth::reset_password))
    .merge(protected)
    .layer(CorsLayer::permissive())
    .with_state(state)
}

pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
  axum::serve(listener, app(state)).await
}
