use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::filter::{AdminListFilterState, AdminRow, Page, StatusFilter, UnknownStatus};
use super::refund::RefundDialog;
use crate::utils::api::AdminApi;
use crate::utils::messages::Locale;
use crate::utils::query::{QueryCache, QueryKey};
use crate::utils::server::{AppError, PaymentStatistics, RawPayment, RawPaymentStatus};

pub const PAYMENTS_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
  Completed,
  Pending,
  Failed,
  Refunded,
}

impl PaymentStatus {
  pub const ALL: [PaymentStatus; 4] =
    [PaymentStatus::Completed, PaymentStatus::Pending, PaymentStatus::Failed, PaymentStatus::Refunded];

  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentStatus::Completed => "completed",
      PaymentStatus::Pending => "pending",
      PaymentStatus::Failed => "failed",
      PaymentStatus::Refunded => "refunded",
    }
  }

  pub fn label(&self, locale: Locale) -> &'static str {
    match (self, locale) {
      (PaymentStatus::Completed, Locale::En) => "Completed",
      (PaymentStatus::Pending, Locale::En) => "Pending",
      (PaymentStatus::Failed, Locale::En) => "Failed",
      (PaymentStatus::Refunded, Locale::En) => "Refunded",
      (PaymentStatus::Completed, Locale::Es) => "Completado",
      (PaymentStatus::Pending, Locale::Es) => "Pendiente",
      (PaymentStatus::Failed, Locale::Es) => "Fallido",
      (PaymentStatus::Refunded, Locale::Es) => "Reembolsado",
    }
  }
}

impl From<RawPaymentStatus> for PaymentStatus {
  fn from(raw: RawPaymentStatus) -> Self {
    match raw {
      RawPaymentStatus::Succeeded => PaymentStatus::Completed,
      RawPaymentStatus::Pending
      | RawPaymentStatus::Processing
      | RawPaymentStatus::RequiresPaymentMethod
      | RawPaymentStatus::Unknown => PaymentStatus::Pending,
      RawPaymentStatus::Failed | RawPaymentStatus::Canceled => PaymentStatus::Failed,
      RawPaymentStatus::Refunded => PaymentStatus::Refunded,
    }
  }
}

impl FromStr for PaymentStatus {
  type Err = UnknownStatus;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    PaymentStatus::ALL
      .into_iter()
      .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| UnknownStatus(s.to_string()))
  }
}

impl fmt::Display for PaymentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentView {
  pub id: String,
  pub account_id: String,
  pub user_email: Option<String>,
  pub amount: Decimal,
  pub currency: String,
  pub status: PaymentStatus,
  pub transaction_id: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl From<RawPayment> for PaymentView {
  fn from(raw: RawPayment) -> Self {
    Self {
      id: raw.id,
      account_id: raw.account_id,
      user_email: raw.user_email,
      amount: raw.amount,
      currency: raw.currency,
      status: raw.status.into(),
      transaction_id: raw.transaction_id,
      created_at: raw.created_at,
    }
  }
}

impl PaymentView {
  pub fn is_refundable(&self) -> bool {
    self.status == PaymentStatus::Completed
  }

  pub fn display_amount(&self) -> String {
    format!("{} {}", self.amount.round_dp(2), self.currency)
  }
}

impl AdminRow for PaymentView {
  type Status = PaymentStatus;

  fn search_fields(&self) -> Vec<&str> {
    let mut fields = vec![self.id.as_str(), self.account_id.as_str()];
    fields.extend(self.transaction_id.as_deref());
    fields.extend(self.user_email.as_deref());
    fields
  }

  fn status(&self) -> PaymentStatus {
    self.status
  }
}

/// Admin payments table: full list fetched once, paged locally, searched and
/// filtered per page, plus the refund dialog.
#[derive(Clone)]
pub struct AdminPaymentsView {
  api: Arc<dyn AdminApi>,
  cache: Arc<QueryCache>,
  locale: Locale,
  pub filter: AdminListFilterState<PaymentStatus>,
  pub refund: RefundDialog,
}

impl AdminPaymentsView {
  pub fn new(api: Arc<dyn AdminApi>, cache: Arc<QueryCache>, locale: Locale) -> Self {
    Self { api, cache, locale, filter: AdminListFilterState::default(), refund: RefundDialog::Closed }
  }

  /// Refetches list and statistics together. `Ok(false)` when another
  /// refresh was already running.
  pub async fn refresh(&self) -> Result<bool, AppError> {
    let Some(_guard) = self.cache.begin_fetch(&QueryKey::Payments) else {
      return Ok(false);
    };
    let (payments, stats) = futures::try_join!(self.api.list_payments(), self.api.payment_statistics())?;
    let rows: Vec<PaymentView> = payments.into_iter().map(PaymentView::from).collect();
    debug!("fetched {} payments", rows.len());
    self.cache.set(QueryKey::Payments, rows);
    self.cache.set(QueryKey::PaymentStatistics, stats);
    Ok(true)
  }

  pub async fn refresh_if_stale(&self) -> Result<bool, AppError> {
    if self.cache.is_stale(&QueryKey::Payments) || self.cache.is_stale(&QueryKey::PaymentStatistics) {
      self.refresh().await
    } else {
      Ok(false)
    }
  }

  pub fn payments(&self) -> Vec<PaymentView> {
    self.cache.get::<Vec<PaymentView>>(&QueryKey::Payments).unwrap_or_default()
  }

  pub fn statistics(&self) -> Option<PaymentStatistics> {
    self.cache.get::<PaymentStatistics>(&QueryKey::PaymentStatistics)
  }

  pub fn current_page(&self) -> Page<PaymentView> {
    Page::slice_of(&self.payments(), self.filter.page, PAYMENTS_PAGE_SIZE)
  }

  /// Current page after search and status filter.
  pub fn filtered(&self) -> Vec<PaymentView> {
    self.filter.filter_page(&self.current_page().data)
  }

  pub fn set_page(&mut self, page: u32) -> u32 {
    let total_pages = self.current_page().total_pages;
    self.filter.set_page(page, total_pages)
  }

  pub fn set_search(&mut self, query: &str) {
    self.filter.set_search(query);
  }

  pub fn set_status(&mut self, value: &str) {
    self.filter.set_status(StatusFilter::parse(value));
  }

  /// Opens the refund dialog for a completed payment. Returns whether it opened.
  pub fn open_refund(&mut self, payment_id: &str) -> bool {
    let refundable = self.payments().iter().any(|p| p.id == payment_id && p.is_refundable());
    if refundable {
      self.refund = RefundDialog::open(payment_id);
    }
    refundable
  }

  /// Confirms the open refund, then refetches whatever it invalidated.
  pub async fn confirm_refund(&mut self) -> Result<(), AppError> {
    let api = Arc::clone(&self.api);
    let cache = Arc::clone(&self.cache);
    self.refund.confirm(api.as_ref(), &cache, self.locale).await?;
    info!("refund confirmed, reloading payments");
    self.refresh_if_stale().await.map(|_| ())
  }
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;
  use crate::admin::fakes::{payment, FakeAdmin};

  async fn loaded(api: Arc<FakeAdmin>) -> AdminPaymentsView {
    let view = AdminPaymentsView::new(api, QueryCache::new(), Locale::En);
    assert!(view.refresh().await.unwrap());
    view
  }

  #[test]
  fn processor_statuses_collapse_to_four() {
    assert_eq!(PaymentStatus::from(RawPaymentStatus::Succeeded), PaymentStatus::Completed);
    assert_eq!(PaymentStatus::from(RawPaymentStatus::RequiresPaymentMethod), PaymentStatus::Pending);
    assert_eq!(PaymentStatus::from(RawPaymentStatus::Canceled), PaymentStatus::Failed);
    assert_eq!(PaymentStatus::from(RawPaymentStatus::Refunded), PaymentStatus::Refunded);
    assert_eq!("Completed".parse::<PaymentStatus>(), Ok(PaymentStatus::Completed));
    assert!("succeeded".parse::<PaymentStatus>().is_err());
  }

  #[test]
  fn amount_is_rounded_to_cents() {
    let view = PaymentView::from(payment(1, RawPaymentStatus::Succeeded, dec!(149.5)));
    assert_eq!(view.display_amount(), "149.5 USD");
    let view = PaymentView::from(payment(1, RawPaymentStatus::Succeeded, dec!(99.999)));
    assert_eq!(view.display_amount(), "100.00 USD");
  }

  #[tokio::test]
  async fn pages_locally_and_filters_only_the_current_page() {
    let mut view = loaded(FakeAdmin::seeded()).await;
    let page = view.current_page();
    assert_eq!((page.total, page.total_pages, page.data.len()), (23, 3, 10));

    view.set_status("completed");
    let filtered = view.filtered();
    assert!(!filtered.is_empty());
    assert!(filtered.iter().all(|p| page.data.contains(p) && p.status == PaymentStatus::Completed));

    view.set_search("acc-00");
    view.set_status("all");
    let search_only = view.filtered();
    assert_eq!(search_only.len(), 9);

    assert_eq!(view.set_page(99), 3);
    assert_eq!(view.current_page().data.len(), 3);
    assert_eq!(view.filter.search_query, "acc-00");
    assert!(view.filtered().is_empty());
  }

  #[tokio::test]
  async fn only_completed_payments_open_the_refund_dialog() {
    let mut view = loaded(FakeAdmin::seeded()).await;
    assert!(!view.open_refund("pay-2"));
    assert!(!view.refund.is_open());
    assert!(view.open_refund("pay-1"));
    assert!(view.refund.is_open());
  }

  #[tokio::test]
  async fn refund_invalidates_list_and_statistics_and_closes() {
    let api = FakeAdmin::seeded();
    let mut view = loaded(api.clone()).await;
    let before = view.statistics().unwrap();

    assert!(view.open_refund("pay-1"));
    view.refund.set_reason("chargeback");
    let cache = Arc::clone(&view.cache);
    view.refund.confirm(api.as_ref(), &cache, Locale::En).await.unwrap();
    assert!(!view.refund.is_open());
    assert!(cache.is_stale(&QueryKey::Payments));
    assert!(cache.is_stale(&QueryKey::PaymentStatistics));

    assert!(view.refresh_if_stale().await.unwrap());
    let refunded = view.payments().into_iter().find(|p| p.id == "pay-1").unwrap();
    assert_eq!(refunded.status, PaymentStatus::Refunded);
    assert_eq!(view.statistics().unwrap().refunded_amount, before.refunded_amount + dec!(99.00));
  }

  #[tokio::test]
  async fn confirm_refund_reloads_once() {
    let api = FakeAdmin::seeded();
    let mut view = loaded(api.clone()).await;
    view.open_refund("pay-5");
    view.confirm_refund().await.unwrap();
    assert_eq!(api.payment_fetches.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert_eq!(api.stats_fetches.load(std::sync::atomic::Ordering::SeqCst), 2);
    // nothing stale any more
    assert!(!view.refresh_if_stale().await.unwrap());
  }

  #[tokio::test]
  async fn failed_refund_keeps_rows_and_dialog() {
    let api = FakeAdmin::seeded();
    *api.refund_error.lock().unwrap() = Some(AppError::Network("reset by peer".into()));
    let mut view = loaded(api.clone()).await;
    view.open_refund("pay-1");
    assert!(view.confirm_refund().await.is_err());
    let alert = view.refund.draft().and_then(|d| d.alert.clone());
    assert_eq!(alert.as_deref(), Some(crate::utils::messages::generic_failure(Locale::En)));
    assert_eq!(api.payment_fetches.load(std::sync::atomic::Ordering::SeqCst), 1);
  }
}
