use std::collections::HashMap;
use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;

use super::auth::TokenSigner;
use crate::config::StubConfig;

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppError {
  #[error("{0}")]
  BadRequest(String),
  #[error("{0}")]
  Unauthorized(String),
  #[error("{0}")]
  Forbidden(String),
  #[error("{0}")]
  NotFound(String),
  #[error("{0}")]
  Conflict(String),
  #[error("{0}")]
  TooManyRequests(String),
}

impl IntoResponse for AppError {
  fn into_response(self) -> axum::response::Response {
    let status = match &self {
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
    };

    let body = Json(json!({"message": self.to_string(), "code": status.as_u16()}));

    (status, body).into_response()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Trader,
  Admin,
}

#[derive(Debug, Clone)]
pub struct UserRecord {
  pub id: String,
  pub email: String,
  pub password: String,
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBody {
  pub id: String,
  pub email: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub first_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_name: Option<String>,
  pub role: Role,
}

impl From<&UserRecord> for UserBody {
  fn from(u: &UserRecord) -> Self {
    Self {
      id: u.id.clone(),
      email: u.email.clone(),
      first_name: u.first_name.clone(),
      last_name: u.last_name.clone(),
      role: u.role,
    }
  }
}

/// A signup or reset waiting for its emailed code.
#[derive(Debug, Clone)]
pub struct PendingCode {
  pub code: String,
  pub resend_available_at: DateTime<Utc>,
  pub signup: Option<PendingSignup>,
}

#[derive(Debug, Clone)]
pub struct PendingSignup {
  pub password: String,
  pub first_name: Option<String>,
  pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
  pub id: String,
  #[serde(skip)]
  pub user_id: String,
  pub title: String,
  pub body: String,
  #[serde(rename = "type")]
  pub kind: String,
  pub category: String,
  pub read: bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
  pub id: String,
  pub account_id: String,
  pub user_email: Option<String>,
  pub amount: Decimal,
  pub currency: String,
  pub status: String,
  pub transaction_id: Option<String>,
  pub created_at: DateTime<Utc>,
  #[serde(skip)]
  pub refund_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationRecord {
  pub id: String,
  pub account_id: String,
  pub rule: String,
  pub description: String,
  pub severity: Option<String>,
  pub status: String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct Store {
  pub users: Vec<UserRecord>,
  pub signups: HashMap<String, PendingCode>,
  pub resets: HashMap<String, PendingCode>,
  pub notifications: Vec<NotificationRecord>,
  pub payments: Vec<PaymentRecord>,
  pub violations: Vec<ViolationRecord>,
}

impl Store {
  pub fn user_by_email(&self, email: &str) -> Option<&UserRecord> {
    self.users.iter().find(|u| u.email.eq_ignore_ascii_case(email))
  }

  pub fn user_by_id(&self, id: &str) -> Option<&UserRecord> {
    self.users.iter().find(|u| u.id == id)
  }
}

#[derive(Clone)]
pub struct AppState {
  pub config: Arc<StubConfig>,
  pub signer: TokenSigner,
  pub store: Arc<RwLock<Store>>,
}

impl AppState {
  pub fn new(config: StubConfig, store: Store) -> Self {
    let signer = TokenSigner::new(&config.token_key);
    Self { config: Arc::new(config), signer, store: Arc::new(RwLock::new(store)) }
  }

  pub fn seeded(config: StubConfig) -> Self {
    Self::new(config, crate::seed::demo_store())
  }
}
