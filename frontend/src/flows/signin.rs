use std::sync::Arc;

use tracing::{info, warn};

use super::{normalize_email, Destination, MIN_PASSWORD_LEN};
use crate::utils::api::AuthApi;
use crate::utils::query::QueryCache;
use crate::utils::server::{AppError, LoginRequest, User, ValidationError};
use crate::utils::session::AuthSession;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignInForm {
  pub email: String,
  pub password: String,
}

impl SignInForm {
  pub fn validate(&self) -> Result<LoginRequest, ValidationError> {
    let email = normalize_email(&self.email)?;
    if self.password.chars().count() < MIN_PASSWORD_LEN {
      return Err(ValidationError::PasswordTooShort { min: MIN_PASSWORD_LEN });
    }
    Ok(LoginRequest { email, password: self.password.clone() })
  }
}

pub async fn sign_in(api: &dyn AuthApi, session: &AuthSession, form: &SignInForm) -> Result<Destination, AppError> {
  let req = form.validate()?;
  let resp = api.login(&req).await?;
  let destination = Destination::landing_for(&resp.user.role);
  session.sign_in(resp.access_token, resp.user)?;
  Ok(destination)
}

/// Drops the token and every cached query that belonged to the user.
pub fn sign_out(session: &AuthSession, cache: &QueryCache) {
  session.teardown();
  cache.clear();
  info!("signed out");
}

/// Loads the profile for a token hydrated from storage.
///
/// Returns `Ok(None)` when there is no token. A rejected token has already
/// torn the session down by the time this sees `Unauthorized`.
pub async fn restore_session(api: &dyn AuthApi, session: &Arc<AuthSession>) -> Result<Option<User>, AppError> {
  if !session.is_authenticated() {
    return Ok(None);
  }
  if let Some(user) = session.user() {
    return Ok(Some(user));
  }
  match api.me().await {
    Ok(user) => {
      session.set_user(user.clone());
      info!("session restored for {}", user.id);
      Ok(Some(user))
    }
    Err(AppError::Unauthorized) => {
      session.teardown();
      Ok(None)
    }
    Err(e) => {
      warn!("could not restore session: {}", e);
      Err(e)
    }
  }
}
