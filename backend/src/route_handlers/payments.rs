use axum::{
  extract::{Path, State},
  Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::midwares::app_state::{AppError, AppState, PaymentRecord};
use crate::midwares::auth::AuthContext;

#[derive(Debug, Default, Deserialize)]
pub struct RefundBody {
  #[serde(default)]
  pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
  pub total_revenue: Decimal,
  pub total_payments: u64,
  pub successful_payments: u64,
  pub pending_payments: u64,
  pub refunded_amount: Decimal,
}

fn with_status<'a>(
  payments: &'a [PaymentRecord],
  statuses: &'static [&'static str],
) -> impl Iterator<Item = &'a PaymentRecord> {
  payments.iter().filter(move |p| statuses.contains(&p.status.as_str()))
}

pub fn statistics_of(payments: &[PaymentRecord]) -> Statistics {
  Statistics {
    total_revenue: with_status(payments, &["succeeded"]).map(|p| p.amount).sum(),
    total_payments: payments.len() as u64,
    successful_payments: with_status(payments, &["succeeded"]).count() as u64,
    pending_payments: with_status(payments, &["pending", "processing", "requires_payment_method"]).count() as u64,
    refunded_amount: with_status(payments, &["refunded"]).map(|p| p.amount).sum(),
  }
}

pub async fn list(
  State(state): State<AppState>,
  Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Vec<PaymentRecord>>, AppError> {
  ctx.require_admin()?;
  let store = state.store.read().await;
  let mut payments = store.payments.clone();
  payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
  Ok(Json(payments))
}

pub async fn statistics(
  State(state): State<AppState>,
  Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Statistics>, AppError> {
  ctx.require_admin()?;
  let store = state.store.read().await;
  Ok(Json(statistics_of(&store.payments)))
}

pub async fn refund(
  State(state): State<AppState>,
  Extension(ctx): Extension<AuthContext>,
  Path(id): Path<String>,
  body: Option<Json<RefundBody>>,
) -> Result<Json<Value>, AppError> {
  ctx.require_admin()?;
  let body = body.map(|Json(b)| b).unwrap_or_default();
  let mut store = state.store.write().await;
  let payment = store
    .payments
    .iter_mut()
    .find(|p| p.id == id)
    .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;
  if payment.status != "succeeded" {
    return Err(AppError::Conflict("Only completed payments can be refunded".to_string()));
  }
  payment.status = "refunded".to_string();
  payment.refund_reason = body.reason.filter(|r| !r.trim().is_empty());
  info!("payment {} refunded by {} ({:?})", id, ctx.user_id, payment.refund_reason);
  Ok(Json(json!({"success": true})))
}
