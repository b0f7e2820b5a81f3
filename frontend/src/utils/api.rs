//! REST client for the PropDesk backend.
//!
//! Each concern gets its own trait so flows and views can be driven by a fake
//! in tests; [`ApiClient`] is the reqwest-backed implementation of all three.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::config::ClientConfig;
use super::query::QueryCache;
use super::server::{
  extract_error_message, AppError, AuthResponse, ForgotPasswordRequest, ForgotPasswordResponse,
  LoginRequest, Notification, PaymentStatistics, RawPayment, RefundRequest, RequestOtpRequest,
  RequestOtpResponse, ResetPasswordRequest, User, VerifyOtpRequest, ViolationPage,
};
use super::session::AuthSession;

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait AuthApi: Send + Sync {
  async fn request_signup_otp(&self, req: &RequestOtpRequest) -> Result<RequestOtpResponse, AppError>;
  async fn verify_signup_otp(&self, req: &VerifyOtpRequest) -> Result<AuthResponse, AppError>;
  async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, AppError>;
  async fn me(&self) -> Result<User, AppError>;
  async fn forgot_password(&self, req: &ForgotPasswordRequest) -> Result<ForgotPasswordResponse, AppError>;
  async fn reset_password(&self, req: &ResetPasswordRequest) -> Result<(), AppError>;
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait NotificationApi: Send + Sync {
  async fn list_notifications(&self, user_id: &str) -> Result<Vec<Notification>, AppError>;
  async fn mark_read(&self, id: &str) -> Result<(), AppError>;
  async fn mark_all_read(&self, user_id: &str) -> Result<(), AppError>;
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait AdminApi: Send + Sync {
  async fn list_payments(&self) -> Result<Vec<RawPayment>, AppError>;
  async fn payment_statistics(&self) -> Result<PaymentStatistics, AppError>;
  async fn refund_payment(&self, id: &str, req: &RefundRequest) -> Result<(), AppError>;
  async fn list_violations(&self, page: u32, limit: u32) -> Result<ViolationPage, AppError>;
}

#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: String,
  session: Arc<AuthSession>,
  cache: Arc<QueryCache>,
}

impl ApiClient {
  /// `cache` is wiped together with the session when the backend answers 401.
  pub fn new(config: &ClientConfig, session: Arc<AuthSession>, cache: Arc<QueryCache>) -> Self {
    Self {
      http: reqwest::Client::new(),
      base_url: config.api_base_url.clone(),
      session,
      cache,
    }
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }

  /// Base URL plus `segments`, each percent-encoded as a single path segment.
  fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
    let mut url = Url::parse(&self.base_url).map_err(|e| AppError::Network(format!("bad base url: {}", e)))?;
    url
      .path_segments_mut()
      .map_err(|_| AppError::Network(format!("base url {} cannot take a path", self.base_url)))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
    match self.session.token() {
      Some(token) => builder.bearer_auth(token),
      None => builder,
    }
  }

  /// Maps non-2xx answers to [`AppError`]. A 401 ends the session.
  async fn check(&self, resp: Response) -> Result<Response, AppError> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    if status == StatusCode::UNAUTHORIZED && self.session.is_authenticated() {
      warn!("backend rejected the session token, tearing session down");
      self.session.teardown();
      self.cache.clear();
      return Err(AppError::Unauthorized);
    }
    let message = extract_error_message(&body);
    debug!("request failed with {}: {:?}", status, message);
    Err(AppError::Remote { status: status.as_u16(), message })
  }

  async fn send<R: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<R, AppError> {
    let resp = self.check(self.authed(builder).send().await?).await?;
    resp.json::<R>().await.map_err(|e| AppError::Decode(e.to_string()))
  }

  /// For endpoints that may answer 200 with an empty body.
  async fn send_or_default<R: DeserializeOwned + Default>(&self, builder: RequestBuilder) -> Result<R, AppError> {
    let resp = self.check(self.authed(builder).send().await?).await?;
    let text = resp.text().await?;
    if text.trim().is_empty() {
      return Ok(R::default());
    }
    serde_json::from_str(&text).map_err(|e| AppError::Decode(e.to_string()))
  }

  async fn send_empty(&self, builder: RequestBuilder) -> Result<(), AppError> {
    self.check(self.authed(builder).send().await?).await?;
    Ok(())
  }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl AuthApi for ApiClient {
  async fn request_signup_otp(&self, req: &RequestOtpRequest) -> Result<RequestOtpResponse, AppError> {
    self.send(self.http.post(self.url("/auth/register/request-otp")).json(req)).await
  }

  async fn verify_signup_otp(&self, req: &VerifyOtpRequest) -> Result<AuthResponse, AppError> {
    self.send(self.http.post(self.url("/auth/register/verify-otp")).json(req)).await
  }

  async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, AppError> {
    self.send(self.http.post(self.url("/auth/login")).json(req)).await
  }

  async fn me(&self) -> Result<User, AppError> {
    self.send(self.http.get(self.url("/auth/me"))).await
  }

  async fn forgot_password(&self, req: &ForgotPasswordRequest) -> Result<ForgotPasswordResponse, AppError> {
    self.send_or_default(self.http.post(self.url("/auth/forgot-password")).json(req)).await
  }

  async fn reset_password(&self, req: &ResetPasswordRequest) -> Result<(), AppError> {
    self.send_empty(self.http.post(self.url("/auth/reset-password")).json(req)).await
  }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl NotificationApi for ApiClient {
  async fn list_notifications(&self, user_id: &str) -> Result<Vec<Notification>, AppError> {
    self.send(self.http.get(self.url("/notifications")).query(&[("userId", user_id)])).await
  }

  async fn mark_read(&self, id: &str) -> Result<(), AppError> {
    let url = self.endpoint(&["notifications", id, "read"])?;
    self.send_empty(self.http.post(url)).await
  }

  async fn mark_all_read(&self, user_id: &str) -> Result<(), AppError> {
    self.send_empty(self.http.post(self.url("/notifications/read-all")).query(&[("userId", user_id)])).await
  }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl AdminApi for ApiClient {
  async fn list_payments(&self) -> Result<Vec<RawPayment>, AppError> {
    self.send(self.http.get(self.url("/admin/payments"))).await
  }

  async fn payment_statistics(&self) -> Result<PaymentStatistics, AppError> {
    self.send(self.http.get(self.url("/admin/payments/statistics"))).await
  }

  async fn refund_payment(&self, id: &str, req: &RefundRequest) -> Result<(), AppError> {
    let url = self.endpoint(&["admin", "payments", id, "refund"])?;
    self.send_empty(self.http.post(url).json(req)).await
  }

  async fn list_violations(&self, page: u32, limit: u32) -> Result<ViolationPage, AppError> {
    let query = [("page", page.to_string()), ("limit", limit.to_string())];
    self.send(self.http.get(self.url("/admin/violations")).query(&query)).await
  }
}
