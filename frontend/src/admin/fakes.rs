use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::utils::api::AdminApi;
use crate::utils::server::{
  AppError, PaymentStatistics, RawPayment, RawPaymentStatus, RawViolation, RawViolationStatus, RefundRequest,
  ViolationPage, ViolationStats,
};

pub(crate) fn payment(n: usize, status: RawPaymentStatus, amount: Decimal) -> RawPayment {
  RawPayment {
    id: format!("pay-{}", n),
    account_id: format!("ACC-{:03}", n),
    user_email: Some(format!("trader{}@example.com", n)),
    amount,
    currency: "USD".into(),
    status,
    transaction_id: Some(format!("pi_{:04}", n)),
    created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::hours(n as i64),
  }
}

pub(crate) fn violation(n: usize, status: RawViolationStatus) -> RawViolation {
  RawViolation {
    id: format!("vio-{}", n),
    account_id: format!("ACC-{:03}", n),
    rule: if n % 2 == 0 { "max_daily_loss".into() } else { "max_drawdown".into() },
    description: "limit breached".into(),
    severity: None,
    status,
    created_at: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
  }
}

/// In-memory admin backend that applies refunds to its own list.
pub(crate) struct FakeAdmin {
  pub payments: Mutex<Vec<RawPayment>>,
  pub violations: Vec<RawViolation>,
  pub refund_error: Mutex<Option<AppError>>,
  pub last_refund: Mutex<Option<(String, RefundRequest)>>,
  pub payment_fetches: AtomicUsize,
  pub stats_fetches: AtomicUsize,
  pub violation_fetches: AtomicUsize,
}

impl FakeAdmin {
  pub fn new(payments: Vec<RawPayment>, violations: Vec<RawViolation>) -> Arc<Self> {
    Arc::new(Self {
      payments: Mutex::new(payments),
      violations,
      refund_error: Mutex::new(None),
      last_refund: Mutex::new(None),
      payment_fetches: AtomicUsize::new(0),
      stats_fetches: AtomicUsize::new(0),
      violation_fetches: AtomicUsize::new(0),
    })
  }

  pub fn seeded() -> Arc<Self> {
    let payments = (1..=23)
      .map(|n| {
        let status = match n % 4 {
          0 => RawPaymentStatus::Refunded,
          1 => RawPaymentStatus::Succeeded,
          2 => RawPaymentStatus::Processing,
          _ => RawPaymentStatus::Canceled,
        };
        payment(n, status, dec!(99.00))
      })
      .collect();
    let violations = (1..=14)
      .map(|n| violation(n, if n % 3 == 0 { RawViolationStatus::Resolved } else { RawViolationStatus::Open }))
      .collect();
    Self::new(payments, violations)
  }
}

#[async_trait]
impl AdminApi for FakeAdmin {
  async fn list_payments(&self) -> Result<Vec<RawPayment>, AppError> {
    self.payment_fetches.fetch_add(1, Ordering::SeqCst);
    Ok(self.payments.lock().unwrap().clone())
  }

  async fn payment_statistics(&self) -> Result<PaymentStatistics, AppError> {
    self.stats_fetches.fetch_add(1, Ordering::SeqCst);
    let payments = self.payments.lock().unwrap();
    let sum = |s: RawPaymentStatus| payments.iter().filter(|p| p.status == s).map(|p| p.amount).sum::<Decimal>();
    Ok(PaymentStatistics {
      total_revenue: sum(RawPaymentStatus::Succeeded),
      total_payments: payments.len() as u64,
      successful_payments: payments.iter().filter(|p| p.status == RawPaymentStatus::Succeeded).count() as u64,
      pending_payments: payments.iter().filter(|p| p.status == RawPaymentStatus::Processing).count() as u64,
      refunded_amount: sum(RawPaymentStatus::Refunded),
    })
  }

  async fn refund_payment(&self, id: &str, req: &RefundRequest) -> Result<(), AppError> {
    *self.last_refund.lock().unwrap() = Some((id.to_string(), req.clone()));
    if let Some(err) = self.refund_error.lock().unwrap().clone() {
      return Err(err);
    }
    let mut payments = self.payments.lock().unwrap();
    match payments.iter_mut().find(|p| p.id == id) {
      Some(p) => {
        p.status = RawPaymentStatus::Refunded;
        Ok(())
      }
      None => Err(AppError::Remote { status: 404, message: Some("Payment not found".into()) }),
    }
  }

  async fn list_violations(&self, page: u32, limit: u32) -> Result<ViolationPage, AppError> {
    self.violation_fetches.fetch_add(1, Ordering::SeqCst);
    let start = ((page.max(1) - 1) * limit) as usize;
    let data = self.violations.iter().skip(start).take(limit as usize).cloned().collect();
    let total = self.violations.len() as u64;
    let resolved = self.violations.iter().filter(|v| v.status == RawViolationStatus::Resolved).count() as u64;
    Ok(ViolationPage {
      data,
      total,
      total_pages: total.div_ceil(u64::from(limit)) as u32,
      stats: ViolationStats { total, active: total - resolved, resolved },
    })
  }
}
