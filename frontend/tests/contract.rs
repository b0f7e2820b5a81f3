//! Runs the real HTTP client against the stub backend on an ephemeral port.

use std::sync::Arc;
use std::time::Duration;

use propdesk_backend::{seed, serve, AppState, StubConfig};
use propdesk_frontend::admin::{AdminPaymentsView, AdminViolationsView, PaymentStatus};
use propdesk_frontend::flows::reset::PasswordResetFlow;
use propdesk_frontend::flows::signin::{restore_session, sign_in, SignInForm};
use propdesk_frontend::flows::signup::{SignupDetails, SignupFlow};
use propdesk_frontend::flows::{Destination, FlowOutcome, FlowStep};
use propdesk_frontend::utils::api::{AdminApi, ApiClient, NotificationApi};
use propdesk_frontend::utils::clock::SystemClock;
use propdesk_frontend::utils::config::ClientConfig;
use propdesk_frontend::utils::messages::Locale;
use propdesk_frontend::utils::notifications::{NotificationSynchronizer, PollOutcome};
use propdesk_frontend::utils::query::{QueryCache, QueryKey};
use propdesk_frontend::utils::server::AppError;
use propdesk_frontend::utils::session::{AuthSession, MemoryStorage, SessionStorage};
use tokio::net::TcpListener;

struct Harness {
  api: Arc<ApiClient>,
  session: Arc<AuthSession>,
  storage: Arc<MemoryStorage>,
  cache: Arc<QueryCache>,
}

async fn spawn_stub() -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(serve(listener, AppState::seeded(StubConfig::for_tests())));
  format!("http://{}/", addr)
}

async fn harness_with(storage: MemoryStorage) -> Harness {
  let base = spawn_stub().await;
  let storage = Arc::new(storage);
  let session = AuthSession::init(storage.clone());
  let config = ClientConfig::default().with_base_url(&base);
  let cache = QueryCache::new();
  let api = Arc::new(ApiClient::new(&config, session.clone(), cache.clone()));
  Harness { api, session, storage, cache }
}

async fn harness() -> Harness {
  harness_with(MemoryStorage::default()).await
}

async fn signed_in(email: &str, password: &str) -> Harness {
  let h = harness().await;
  let form = SignInForm { email: email.into(), password: password.into() };
  sign_in(h.api.as_ref(), &h.session, &form).await.unwrap();
  h
}

#[tokio::test]
async fn signup_with_otp_persists_session() {
  let h = harness().await;
  let mut flow = SignupFlow::new(h.api.clone(), h.session.clone(), Arc::new(SystemClock), Locale::En);
  let details = SignupDetails {
    first_name: "Nia".into(),
    last_name: String::new(),
    email: "nia@example.com".into(),
    password: "abcdef".into(),
    confirm_password: "abcdef".into(),
  };
  assert_eq!(flow.submit_details(details).await.unwrap(), FlowOutcome::Step(FlowStep::AwaitingOtp));

  let err = flow.submit_otp("000000").await.unwrap_err();
  assert_eq!(err, AppError::Remote { status: 400, message: Some("Invalid OTP".into()) });
  assert_eq!(flow.step(), FlowStep::AwaitingOtp);
  assert_eq!(h.storage.load().unwrap(), None);

  assert_eq!(flow.submit_otp("123456").await.unwrap(), FlowOutcome::Navigate(Destination::Dashboard));
  assert!(h.storage.load().unwrap().is_some());
  assert_eq!(h.session.user().map(|u| u.email).as_deref(), Some("nia@example.com"));
}

#[tokio::test]
async fn duplicate_email_surfaces_backend_message() {
  let h = harness().await;
  let mut flow = SignupFlow::new(h.api.clone(), h.session.clone(), Arc::new(SystemClock), Locale::En);
  let details = SignupDetails {
    email: seed::DEMO_TRADER_EMAIL.into(),
    password: "abcdef".into(),
    confirm_password: "abcdef".into(),
    ..SignupDetails::default()
  };
  flow.submit_details(details).await.unwrap_err();
  assert_eq!(flow.error(), Some("Email already registered"));
  assert_eq!(flow.step(), FlowStep::Details);
}

#[tokio::test]
async fn password_reset_then_sign_in_with_new_password() {
  let h = harness().await;
  let mut flow = PasswordResetFlow::new(h.api.clone(), Arc::new(SystemClock), Locale::En);
  flow.submit_details(seed::DEMO_TRADER_EMAIL).await.unwrap();
  flow.submit_otp("123456").unwrap();
  let outcome = flow.submit_new_password("brand-new", "brand-new").await.unwrap();
  assert_eq!(outcome, FlowOutcome::Navigate(Destination::SignIn));

  let old = SignInForm { email: seed::DEMO_TRADER_EMAIL.into(), password: seed::DEMO_TRADER_PASSWORD.into() };
  assert!(sign_in(h.api.as_ref(), &h.session, &old).await.is_err());
  let new = SignInForm { email: seed::DEMO_TRADER_EMAIL.into(), password: "brand-new".into() };
  assert_eq!(sign_in(h.api.as_ref(), &h.session, &new).await.unwrap(), Destination::Dashboard);
}

#[tokio::test]
async fn notifications_poll_and_mark_read() {
  let h = signed_in(seed::DEMO_TRADER_EMAIL, seed::DEMO_TRADER_PASSWORD).await;
  let sync = NotificationSynchronizer::new(h.api.clone(), h.cache.clone(), h.session.clone(), Duration::from_secs(5));

  assert_eq!(sync.poll().await.unwrap(), PollOutcome::Refreshed { count: 6 });
  let before = sync.snapshot().counts();
  assert_eq!(before.unread, 3);

  let unread_id = sync.snapshot().sorted()[0].id.clone();
  sync.mark_read(&unread_id).await.unwrap();
  let after = sync.snapshot();
  assert!(after.get(&unread_id).unwrap().notification.read);
  assert_eq!(after.counts().unread, 2);

  sync.mark_all_read().await.unwrap();
  assert_eq!(sync.snapshot().counts().unread, 0);
}

#[tokio::test]
async fn rejected_token_tears_session_down() {
  let h = harness_with(MemoryStorage::with_token("u-trader.0.00")).await;
  assert_eq!(restore_session(h.api.as_ref(), &h.session).await.unwrap(), None);
  assert!(!h.session.is_authenticated());
  assert_eq!(h.storage.load().unwrap(), None);

  let err = h.api.list_notifications(seed::DEMO_TRADER_ID).await.unwrap_err();
  assert!(matches!(err, AppError::Remote { status: 401, .. }));
}

#[tokio::test]
async fn unauthorized_answer_clears_cached_queries() {
  let h = harness_with(MemoryStorage::with_token("u-admin.0.00")).await;
  h.cache.set(QueryKey::Payments, vec![1u32]);
  h.cache.set(QueryKey::Notifications { user_id: seed::DEMO_TRADER_ID.into() }, 6usize);
  let changes = h.session.subscribe();

  let err = h.api.list_payments().await.unwrap_err();
  assert_eq!(err, AppError::Unauthorized);
  assert!(!h.session.is_authenticated());
  assert_eq!(h.cache.get::<Vec<u32>>(&QueryKey::Payments), None);
  assert_eq!(h.cache.get::<usize>(&QueryKey::Notifications { user_id: seed::DEMO_TRADER_ID.into() }), None);
  assert!(changes.has_changed().unwrap());
}

#[tokio::test]
async fn admin_refund_reloads_list_and_statistics() {
  let h = signed_in(seed::DEMO_ADMIN_EMAIL, seed::DEMO_ADMIN_PASSWORD).await;
  let mut view = AdminPaymentsView::new(h.api.clone(), h.cache.clone(), Locale::En);
  view.refresh().await.unwrap();
  let before = view.statistics().unwrap();
  assert_eq!(view.current_page().total, 27);

  let target = view.payments().into_iter().find(|p| p.status == PaymentStatus::Completed).unwrap();
  assert!(view.open_refund(&target.id));
  view.refund.set_reason("customer request");
  view.confirm_refund().await.unwrap();

  assert!(!view.refund.is_open());
  let refunded = view.payments().into_iter().find(|p| p.id == target.id).unwrap();
  assert_eq!(refunded.status, PaymentStatus::Refunded);
  let after = view.statistics().unwrap();
  assert_eq!(after.refunded_amount, before.refunded_amount + target.amount);
  assert_eq!(after.successful_payments + 1, before.successful_payments);

  // a second refund of the same payment is refused by the button and the backend
  assert!(!view.open_refund(&target.id));
}

#[tokio::test]
async fn admin_violations_are_server_paginated() {
  let h = signed_in(seed::DEMO_ADMIN_EMAIL, seed::DEMO_ADMIN_PASSWORD).await;
  let mut view = AdminViolationsView::new(h.api.clone(), h.cache.clone());
  view.refresh_if_stale().await.unwrap();
  assert_eq!(view.total_pages(), 3);
  assert_eq!(view.stats().total, 23);
  assert_eq!(view.go_to(3).await.unwrap(), 3);
  assert_eq!(view.current().unwrap().rows.len(), 3);
}
