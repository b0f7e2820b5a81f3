use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::utils::api::AuthApi;
use crate::utils::clock::ManualClock;
use crate::utils::server::{
  AppError, AuthResponse, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest, RequestOtpRequest,
  RequestOtpResponse, ResetPasswordRequest, User, UserRole, VerifyOtpRequest,
};
use crate::utils::session::{AuthSession, MemoryStorage};

pub(crate) fn t0() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

pub(crate) fn trader() -> User {
  User {
    id: "u-1".into(),
    email: "a@b.com".into(),
    first_name: Some("Ada".into()),
    last_name: Some("Lovelace".into()),
    role: UserRole::Trader,
  }
}

/// Scriptable auth backend that records every call.
pub(crate) struct FakeAuth {
  pub clock: ManualClock,
  pub cooldown: Duration,
  calls: Mutex<HashMap<&'static str, usize>>,
  failures: Mutex<HashMap<&'static str, AppError>>,
  pub last_request_otp: Mutex<Option<RequestOtpRequest>>,
  pub last_verify: Mutex<Option<VerifyOtpRequest>>,
  pub last_reset: Mutex<Option<ResetPasswordRequest>>,
}

impl FakeAuth {
  pub fn new(clock: ManualClock) -> Arc<Self> {
    Arc::new(Self {
      clock,
      cooldown: Duration::seconds(60),
      calls: Mutex::new(HashMap::new()),
      failures: Mutex::new(HashMap::new()),
      last_request_otp: Mutex::new(None),
      last_verify: Mutex::new(None),
      last_reset: Mutex::new(None),
    })
  }

  pub fn fail(&self, op: &'static str, err: AppError) {
    self.failures.lock().unwrap().insert(op, err);
  }

  pub fn succeed(&self, op: &'static str) {
    self.failures.lock().unwrap().remove(op);
  }

  pub fn calls(&self, op: &'static str) -> usize {
    self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
  }

  fn hit(&self, op: &'static str) -> Result<(), AppError> {
    *self.calls.lock().unwrap().entry(op).or_insert(0) += 1;
    match self.failures.lock().unwrap().get(op) {
      Some(err) => Err(err.clone()),
      None => Ok(()),
    }
  }

  fn resend_at(&self) -> Option<DateTime<Utc>> {
    use crate::utils::clock::Clock;
    Some(self.clock.now() + self.cooldown)
  }
}

#[async_trait]
impl AuthApi for FakeAuth {
  async fn request_signup_otp(&self, req: &RequestOtpRequest) -> Result<RequestOtpResponse, AppError> {
    *self.last_request_otp.lock().unwrap() = Some(req.clone());
    self.hit("request_otp")?;
    Ok(RequestOtpResponse { resend_available_at: self.resend_at() })
  }

  async fn verify_signup_otp(&self, req: &VerifyOtpRequest) -> Result<AuthResponse, AppError> {
    *self.last_verify.lock().unwrap() = Some(req.clone());
    self.hit("verify_otp")?;
    Ok(AuthResponse { access_token: "issued-token".into(), user: trader() })
  }

  async fn login(&self, _req: &LoginRequest) -> Result<AuthResponse, AppError> {
    self.hit("login")?;
    Ok(AuthResponse { access_token: "login-token".into(), user: trader() })
  }

  async fn me(&self) -> Result<User, AppError> {
    self.hit("me")?;
    Ok(trader())
  }

  async fn forgot_password(&self, _req: &ForgotPasswordRequest) -> Result<ForgotPasswordResponse, AppError> {
    self.hit("forgot_password")?;
    Ok(ForgotPasswordResponse { resend_available_at: self.resend_at() })
  }

  async fn reset_password(&self, req: &ResetPasswordRequest) -> Result<(), AppError> {
    *self.last_reset.lock().unwrap() = Some(req.clone());
    self.hit("reset_password")
  }
}

pub(crate) fn session_with(storage: Arc<MemoryStorage>) -> Arc<AuthSession> {
  AuthSession::init(storage)
}
