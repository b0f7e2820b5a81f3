use std::sync::Arc;

use axum::{
  extract::{Request, State},
  http::header::AUTHORIZATION,
  middleware::Next,
  response::IntoResponse,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use super::app_state::{AppError, AppState, Role};

type HmacSha256 = Hmac<Sha256>;

/// Issues and checks `user_id.issued_at.signature` bearer tokens.
#[derive(Clone)]
pub struct TokenSigner {
  key: Arc<Vec<u8>>,
}

impl TokenSigner {
  pub fn new(key: &str) -> Self {
    Self { key: Arc::new(key.as_bytes().to_vec()) }
  }

  fn mac(&self, data: &str) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size");
    mac.update(data.as_bytes());
    mac
  }

  pub fn issue(&self, user_id: &str) -> String {
    let payload = format!("{}.{}", user_id, Utc::now().timestamp());
    let sig = hex::encode(self.mac(&payload).finalize().into_bytes());
    format!("{}.{}", payload, sig)
  }

  /// Returns the user id a valid token was issued for.
  pub fn verify(&self, token: &str) -> Option<String> {
    let (payload, sig) = token.rsplit_once('.')?;
    let sig = hex::decode(sig).ok()?;
    self.mac(payload).verify_slice(&sig).ok()?;
    let (user_id, _issued_at) = payload.rsplit_once('.')?;
    Some(user_id.to_string())
  }
}

/// Caller identity, inserted by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthContext {
  pub user_id: String,
  pub role: Role,
}

impl AuthContext {
  pub fn require_admin(&self) -> Result<(), AppError> {
    match self.role {
      Role::Admin => Ok(()),
      Role::Trader => Err(AppError::Forbidden("Admin access required".to_string())),
    }
  }
}

pub async fn require_auth(
  State(state): State<AppState>,
  mut req: Request,
  next: Next,
) -> Result<impl IntoResponse, AppError> {
  let token = req
    .headers()
    .get(AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

  let user_id = state
    .signer
    .verify(token)
    .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

  let role = {
    let store = state.store.read().await;
    store
      .user_by_id(&user_id)
      .map(|u| u.role)
      .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?
  };
  debug!("{} {} as {}", req.method(), req.uri().path(), user_id);

  req.extensions_mut().insert(AuthContext { user_id, role });
  Ok(next.run(req).await)
}
