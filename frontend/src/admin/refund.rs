use tracing::{info, warn};

use crate::utils::api::AdminApi;
use crate::utils::messages::Locale;
use crate::utils::query::{QueryCache, QueryKey};
use crate::utils::server::{AppError, RefundRequest};

#[derive(Debug, Clone, PartialEq)]
pub struct RefundDraft {
  pub payment_id: String,
  pub reason: String,
  pub submitting: bool,
  /// Blocking alert text from the last failed attempt.
  pub alert: Option<String>,
}

/// Confirmation dialog for refunding one payment.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RefundDialog {
  #[default]
  Closed,
  Open(RefundDraft),
}

impl RefundDialog {
  pub fn open(payment_id: &str) -> Self {
    RefundDialog::Open(RefundDraft {
      payment_id: payment_id.to_string(),
      reason: String::new(),
      submitting: false,
      alert: None,
    })
  }

  pub fn is_open(&self) -> bool {
    matches!(self, RefundDialog::Open(_))
  }

  pub fn draft(&self) -> Option<&RefundDraft> {
    match self {
      RefundDialog::Open(draft) => Some(draft),
      RefundDialog::Closed => None,
    }
  }

  pub fn set_reason(&mut self, reason: &str) {
    if let RefundDialog::Open(draft) = self {
      draft.reason = reason.to_string();
    }
  }

  /// Dismisses the alert so the admin can retry.
  pub fn dismiss_alert(&mut self) {
    if let RefundDialog::Open(draft) = self {
      draft.alert = None;
    }
  }

  /// Cancel is ignored while the request is in flight.
  pub fn cancel(&mut self) {
    if !matches!(self, RefundDialog::Open(RefundDraft { submitting: true, .. })) {
      *self = RefundDialog::Closed;
    }
  }

  /// Sends the refund. On success the payment list and statistics are
  /// invalidated and the dialog closes; on failure it stays open with the
  /// backend's message in `alert`.
  pub async fn confirm(&mut self, api: &dyn AdminApi, cache: &QueryCache, locale: Locale) -> Result<(), AppError> {
    let RefundDialog::Open(draft) = self else {
      return Ok(());
    };
    let reason = draft.reason.trim();
    let req = RefundRequest { reason: (!reason.is_empty()).then(|| reason.to_string()) };
    let payment_id = draft.payment_id.clone();
    draft.submitting = true;
    draft.alert = None;

    let result = api.refund_payment(&payment_id, &req).await;
    draft.submitting = false;
    match result {
      Ok(()) => {
        cache.invalidate(&QueryKey::Payments);
        cache.invalidate(&QueryKey::PaymentStatistics);
        *self = RefundDialog::Closed;
        info!("refunded payment {}", payment_id);
        Ok(())
      }
      Err(e) => {
        warn!("refund of {} failed: {}", payment_id, e);
        draft.alert = Some(e.user_message(locale));
        Err(e)
      }
    }
  }
}
