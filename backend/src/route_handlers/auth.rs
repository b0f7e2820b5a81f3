use std::collections::HashMap;

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::midwares::app_state::{AppError, AppState, PendingCode, PendingSignup, Role, UserBody, UserRecord};
use crate::midwares::auth::AuthContext;
use crate::seed::welcome_notification;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOtpBody {
  pub email: String,
  pub password: String,
  #[serde(default)]
  pub first_name: Option<String>,
  #[serde(default)]
  pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpBody {
  pub email: String,
  pub otp: String,
  pub password: String,
  #[serde(default)]
  pub first_name: Option<String>,
  #[serde(default)]
  pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email: String,
  pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordBody {
  pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordBody {
  pub email: String,
  pub otp: String,
  pub new_password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendBody {
  pub resend_available_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthBody {
  pub access_token: String,
  pub user: UserBody,
}

fn check_password(password: &str) -> Result<(), AppError> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(AppError::BadRequest(format!("Password must be at least {} characters", MIN_PASSWORD_LEN)));
  }
  Ok(())
}

fn check_email(email: &str) -> Result<String, AppError> {
  let email = email.trim().to_lowercase();
  if email.is_empty() || !email.contains('@') {
    return Err(AppError::BadRequest("A valid email is required".to_string()));
  }
  Ok(email)
}

/// Stores a fresh code for `email` unless the last one is still cooling down.
fn issue_code(
  codes: &mut HashMap<String, PendingCode>,
  state: &AppState,
  email: &str,
  signup: Option<PendingSignup>,
) -> Result<DateTime<Utc>, AppError> {
  let now = Utc::now();
  if let Some(pending) = codes.get(email) {
    if pending.resend_available_at > now {
      let wait = (pending.resend_available_at - now).num_seconds().max(1);
      return Err(AppError::TooManyRequests(format!("Please wait {}s before requesting a new code", wait)));
    }
  }
  let resend_available_at = now + state.config.resend_cooldown;
  codes.insert(
    email.to_string(),
    PendingCode { code: state.config.otp_code.clone(), resend_available_at, signup },
  );
  info!("issued code for {}, resend at {}", email, resend_available_at);
  Ok(resend_available_at)
}

pub async fn request_signup_otp(
  State(state): State<AppState>,
  Json(body): Json<RequestOtpBody>,
) -> Result<Json<ResendBody>, AppError> {
  let email = check_email(&body.email)?;
  check_password(&body.password)?;

  let mut store = state.store.write().await;
  if store.user_by_email(&email).is_some() {
    return Err(AppError::Conflict("Email already registered".to_string()));
  }
  let signup = PendingSignup { password: body.password, first_name: body.first_name, last_name: body.last_name };
  let resend_available_at = issue_code(&mut store.signups, &state, &email, Some(signup))?;
  Ok(Json(ResendBody { resend_available_at }))
}

pub async fn verify_signup_otp(
  State(state): State<AppState>,
  Json(body): Json<VerifyOtpBody>,
) -> Result<Json<AuthBody>, AppError> {
  let email = check_email(&body.email)?;
  let mut store = state.store.write().await;

  let pending = store
    .signups
    .get(&email)
    .ok_or_else(|| AppError::BadRequest("No pending registration for this email".to_string()))?;
  if pending.code != body.otp.trim() {
    return Err(AppError::BadRequest("Invalid OTP".to_string()));
  }
  let signup = pending.signup.clone().unwrap_or(PendingSignup {
    password: body.password.clone(),
    first_name: body.first_name.clone(),
    last_name: body.last_name.clone(),
  });
  store.signups.remove(&email);

  let user = UserRecord {
    id: format!("u-{}", uuid::Uuid::new_v4().simple()),
    email,
    password: signup.password,
    first_name: body.first_name.or(signup.first_name),
    last_name: body.last_name.or(signup.last_name),
    role: Role::Trader,
  };
  store.notifications.push(welcome_notification(&user.id));
  let access_token = state.signer.issue(&user.id);
  let user_body = UserBody::from(&user);
  info!("registered {}", user.id);
  store.users.push(user);

  Ok(Json(AuthBody { access_token, user: user_body }))
}

pub async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> Result<Json<AuthBody>, AppError> {
  let store = state.store.read().await;
  let user = store
    .user_by_email(body.email.trim())
    .filter(|u| u.password == body.password)
    .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;
  Ok(Json(AuthBody { access_token: state.signer.issue(&user.id), user: UserBody::from(user) }))
}

pub async fn me(
  State(state): State<AppState>,
  Extension(ctx): Extension<AuthContext>,
) -> Result<Json<UserBody>, AppError> {
  let store = state.store.read().await;
  let user = store.user_by_id(&ctx.user_id).ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
  Ok(Json(UserBody::from(user)))
}

/// Answers the same way whether or not the email exists.
pub async fn forgot_password(
  State(state): State<AppState>,
  Json(body): Json<ForgotPasswordBody>,
) -> Result<Json<ResendBody>, AppError> {
  let email = check_email(&body.email)?;
  let mut store = state.store.write().await;
  if store.user_by_email(&email).is_none() {
    return Ok(Json(ResendBody { resend_available_at: Utc::now() + state.config.resend_cooldown }));
  }
  let resend_available_at = issue_code(&mut store.resets, &state, &email, None)?;
  Ok(Json(ResendBody { resend_available_at }))
}

pub async fn reset_password(
  State(state): State<AppState>,
  Json(body): Json<ResetPasswordBody>,
) -> Result<Json<Value>, AppError> {
  let email = check_email(&body.email)?;
  check_password(&body.new_password)?;
  let mut store = state.store.write().await;

  let valid = store.resets.get(&email).is_some_and(|p| p.code == body.otp.trim());
  if !valid {
    return Err(AppError::BadRequest("Invalid or expired code".to_string()));
  }
  store.resets.remove(&email);
  let user = store
    .users
    .iter_mut()
    .find(|u| u.email.eq_ignore_ascii_case(&email))
    .ok_or_else(|| AppError::BadRequest("Invalid or expired code".to_string()))?;
  user.password = body.new_password;
  info!("password reset for {}", user.id);
  Ok(Json(json!({"success": true})))
}
