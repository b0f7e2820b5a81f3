use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::flows::FlowStep;
use super::messages::{self, Locale};

/* Server Requests */
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOtpRequest {
  pub email: String,
  pub password: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub first_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
  pub email: String,
  pub otp: String,
  pub password: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub first_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
  pub email: String,
  pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest {
  pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
  pub email: String,
  pub otp: String,
  pub new_password: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RefundRequest {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reason: Option<String>,
}

/* Server Responses */
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOtpResponse {
  #[serde(default)]
  pub resend_available_at: Option<DateTime<Utc>>,
}

// forgot-password may answer with an empty 200, so every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
  #[serde(default)]
  pub resend_available_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
  pub access_token: String,
  pub user: User,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
  #[default]
  Trader,
  Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: String,
  pub email: String,
  #[serde(default)]
  pub first_name: Option<String>,
  #[serde(default)]
  pub last_name: Option<String>,
  #[serde(default)]
  pub role: UserRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
  Info,
  Success,
  Warning,
  Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
  Challenge,
  Payout,
  Account,
  System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub id: String,
  pub title: String,
  pub body: String,
  #[serde(rename = "type")]
  pub kind: NotificationKind,
  pub category: NotificationCategory,
  pub read: bool,
  pub created_at: DateTime<Utc>,
}

/// Payment status exactly as the payment processor reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawPaymentStatus {
  Succeeded,
  Pending,
  Processing,
  RequiresPaymentMethod,
  Failed,
  Canceled,
  Refunded,
  #[serde(other)]
  Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPayment {
  pub id: String,
  pub account_id: String,
  #[serde(default)]
  pub user_email: Option<String>,
  pub amount: Decimal,
  pub currency: String,
  pub status: RawPaymentStatus,
  #[serde(default)]
  pub transaction_id: Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentStatistics {
  pub total_revenue: Decimal,
  pub total_payments: u64,
  pub successful_payments: u64,
  pub pending_payments: u64,
  pub refunded_amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawViolationStatus {
  Active,
  Open,
  UnderReview,
  Resolved,
  Dismissed,
  #[serde(other)]
  Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawViolation {
  pub id: String,
  pub account_id: String,
  pub rule: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub severity: Option<String>,
  pub status: RawViolationStatus,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViolationStats {
  pub total: u64,
  pub active: u64,
  pub resolved: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationPage {
  pub data: Vec<RawViolation>,
  pub total: u64,
  pub total_pages: u32,
  #[serde(default)]
  pub stats: ViolationStats,
}

// backends answer errors as {"message": ..} or {"error": ..}, sometimes with a list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageField {
  One(String),
  Many(Vec<String>),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
  #[serde(default)]
  message: Option<MessageField>,
  #[serde(default)]
  error: Option<MessageField>,
}

/// Pulls a human readable message out of an error response body.
pub fn extract_error_message(body: &str) -> Option<String> {
  let parsed = serde_json::from_str::<ErrorBody>(body).ok()?;
  let field = parsed.message.or(parsed.error)?;
  let msg = match field {
    MessageField::One(s) => s,
    MessageField::Many(list) => list.join(", "),
  };
  let msg = msg.trim().to_string();
  if msg.is_empty() { None } else { Some(msg) }
}

// Local validation errors, caught before any request goes out
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
  #[error("passwords do not match")]
  PasswordMismatch,
  #[error("password must be at least {min} characters")]
  PasswordTooShort { min: usize },
  #[error("verification code must be {expected} characters")]
  InvalidOtpLength { expected: usize },
  #[error("email is required")]
  MissingEmail,
  #[error("resend available in {seconds}s")]
  CooldownActive { seconds: u64 },
  #[error("cannot move from {from:?} to {to:?}")]
  InvalidTransition { from: FlowStep, to: FlowStep },
}

impl ValidationError {
  pub fn message(&self, locale: Locale) -> String {
    messages::validation_message(self, locale)
  }
}

// App Errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppError {
  #[error("Validation error: {0}")]
  Validation(#[from] ValidationError),
  #[error("Server error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
  Remote { status: u16, message: Option<String> },
  #[error("Network error: {0}")]
  Network(String),
  #[error("Session expired")]
  Unauthorized,
  #[error("Deserialize error: {0}")]
  Decode(String),
  #[error("Storage error: {0}")]
  Storage(String),
}

impl AppError {
  /// Text to show inline: the backend's own message when it sent one,
  /// otherwise the localized generic fallback.
  pub fn user_message(&self, locale: Locale) -> String {
    match self {
      AppError::Validation(v) => v.message(locale),
      AppError::Remote { message: Some(msg), .. } => msg.clone(),
      AppError::Unauthorized => messages::session_expired(locale).to_string(),
      _ => messages::generic_failure(locale).to_string(),
    }
  }

  pub fn is_local(&self) -> bool {
    matches!(self, AppError::Validation(_))
  }
}

impl From<reqwest::Error> for AppError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      AppError::Decode(e.to_string())
    } else {
      AppError::Network(e.to_string())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn error_message_prefers_message_key() {
    let body = r#"{"message":"Email already registered","error":"Bad Request"}"#;
    assert_eq!(extract_error_message(body).as_deref(), Some("Email already registered"));
  }

  #[test]
  fn error_message_falls_back_to_error_key_and_joins_lists() {
    assert_eq!(extract_error_message(r#"{"error":"Invalid OTP"}"#).as_deref(), Some("Invalid OTP"));
    let body = r#"{"message":["email must be an email","password too weak"]}"#;
    assert_eq!(
      extract_error_message(body).as_deref(),
      Some("email must be an email, password too weak")
    );
  }

  #[test]
  fn error_message_absent_for_garbage_or_blank() {
    assert_eq!(extract_error_message("<html>502</html>"), None);
    assert_eq!(extract_error_message(r#"{"message":"   "}"#), None);
    assert_eq!(extract_error_message(""), None);
  }

  #[test]
  fn user_message_uses_backend_text_verbatim() {
    let err = AppError::Remote { status: 400, message: Some("Invalid or expired OTP".into()) };
    assert_eq!(err.user_message(Locale::En), "Invalid or expired OTP");
  }

  #[test]
  fn user_message_uses_fallback_without_backend_text() {
    let remote = AppError::Remote { status: 500, message: None };
    let network = AppError::Network("connection refused".into());
    assert_eq!(remote.user_message(Locale::En), messages::generic_failure(Locale::En));
    assert_eq!(network.user_message(Locale::Es), messages::generic_failure(Locale::Es));
    assert!(!remote.is_local());
  }

  #[test]
  fn notification_wire_format() {
    let json = r#"{
      "id": "n1", "title": "Phase passed", "body": "Congrats", "type": "success",
      "category": "challenge", "read": false, "createdAt": "2026-03-01T10:00:00Z"
    }"#;
    let n: Notification = serde_json::from_str(json).unwrap();
    assert_eq!(n.kind, NotificationKind::Success);
    assert_eq!(n.category, NotificationCategory::Challenge);
    assert!(!n.read);
  }

  #[test]
  fn unknown_payment_status_does_not_break_decoding() {
    let json = r#"{"id":"p1","accountId":"ACC-1","amount":"99.00","currency":"usd",
      "status":"partially_captured","createdAt":"2026-03-01T10:00:00Z"}"#;
    let p: RawPayment = serde_json::from_str(json).unwrap();
    assert_eq!(p.status, RawPaymentStatus::Unknown);
    assert_eq!(p.transaction_id, None);
  }
}
