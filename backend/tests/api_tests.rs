use axum::{
  body::Body,
  http::{header, Request, StatusCode},
  Router,
};
use propdesk_backend::{app, seed, AppState, StubConfig};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

fn test_app() -> Router {
  app(AppState::seeded(StubConfig::for_tests()))
}

async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
  let mut req = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
  }
  let req = match body {
    Some(body) => req.header(header::CONTENT_TYPE, "application/json").body(Body::from(body.to_string())),
    None => req.body(Body::empty()),
  }
  .unwrap();

  let response = app.clone().oneshot(req).await.unwrap();
  let status = response.status();
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
  (status, value)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
  let (status, body) = call(app, "POST", "/auth/login", None, Some(json!({"email": email, "password": password}))).await;
  assert_eq!(status, StatusCode::OK);
  body["accessToken"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn signup_round_trip() {
  let app = test_app();
  let (status, body) = call(
    &app,
    "POST",
    "/auth/register/request-otp",
    None,
    Some(json!({"email": "new@example.com", "password": "abcdef", "firstName": "Nia"})),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert!(body["resendAvailableAt"].is_string());

  let (status, body) = call(
    &app,
    "POST",
    "/auth/register/verify-otp",
    None,
    Some(json!({"email": "new@example.com", "otp": "000000", "password": "abcdef"})),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["message"], "Invalid OTP");

  let (status, body) = call(
    &app,
    "POST",
    "/auth/register/verify-otp",
    None,
    Some(json!({"email": "new@example.com", "otp": "123456", "password": "abcdef"})),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["user"]["firstName"], "Nia");
  assert_eq!(body["user"]["role"], "trader");

  let token = body["accessToken"].as_str().unwrap();
  let (status, me) = call(&app, "GET", "/auth/me", Some(token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(me["email"], "new@example.com");
}

#[tokio::test]
async fn duplicate_signup_is_a_conflict() {
  let app = test_app();
  let (status, body) = call(
    &app,
    "POST",
    "/auth/register/request-otp",
    None,
    Some(json!({"email": seed::DEMO_TRADER_EMAIL, "password": "abcdef"})),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["message"], "Email already registered");
  assert_eq!(body["code"], 409);
}

#[tokio::test]
async fn cooldown_is_enforced_server_side() {
  let config = StubConfig { resend_cooldown: chrono::Duration::seconds(60), ..StubConfig::for_tests() };
  let app = app(AppState::seeded(config));
  let req = json!({"email": seed::DEMO_TRADER_EMAIL});
  let (status, _) = call(&app, "POST", "/auth/forgot-password", None, Some(req.clone())).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = call(&app, "POST", "/auth/forgot-password", None, Some(req)).await;
  assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
  let app = test_app();
  let uri = format!("/notifications?userId={}", seed::DEMO_TRADER_ID);
  let (status, _) = call(&app, "GET", &uri, None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  let (status, _) = call(&app, "GET", &uri, Some("u-trader.1.deadbeef"), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn traders_cannot_reach_admin_routes() {
  let app = test_app();
  let token = login(&app, seed::DEMO_TRADER_EMAIL, seed::DEMO_TRADER_PASSWORD).await;
  let (status, _) = call(&app, "GET", "/admin/payments", Some(&token), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = call(&app, "GET", "/notifications?userId=u-admin", Some(&token), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn refund_only_applies_to_succeeded_payments() {
  let app = test_app();
  let token = login(&app, seed::DEMO_ADMIN_EMAIL, seed::DEMO_ADMIN_PASSWORD).await;

  let (status, body) = call(&app, "POST", "/admin/payments/pay-002/refund", Some(&token), Some(json!({}))).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["message"], "Only completed payments can be refunded");

  let (status, _) =
    call(&app, "POST", "/admin/payments/pay-001/refund", Some(&token), Some(json!({"reason": "duplicate"}))).await;
  assert_eq!(status, StatusCode::OK);

  let (_, payments) = call(&app, "GET", "/admin/payments", Some(&token), None).await;
  let refunded = payments.as_array().unwrap().iter().find(|p| p["id"] == "pay-001").unwrap();
  assert_eq!(refunded["status"], "refunded");
}

#[tokio::test]
async fn mark_read_flips_only_the_owners_notification() {
  let app = test_app();
  let token = login(&app, seed::DEMO_TRADER_EMAIL, seed::DEMO_TRADER_PASSWORD).await;
  let (status, _) = call(&app, "POST", "/notifications/n-1/read", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = call(&app, "POST", "/notifications/n-404/read", Some(&token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let uri = format!("/notifications?userId={}", seed::DEMO_TRADER_ID);
  let (_, list) = call(&app, "GET", &uri, Some(&token), None).await;
  let n1 = list.as_array().unwrap().iter().find(|n| n["id"] == "n-1").unwrap();
  assert_eq!(n1["read"], true);
  assert_eq!(n1["type"], "success");
}
