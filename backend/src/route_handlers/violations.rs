use axum::{
  extract::{Query, State},
  Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::midwares::app_state::{AppError, AppState, ViolationRecord};
use crate::midwares::auth::AuthContext;

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
  pub page: Option<u32>,
  pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ViolationStats {
  pub total: u64,
  pub active: u64,
  pub resolved: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationPage {
  pub data: Vec<ViolationRecord>,
  pub total: u64,
  pub total_pages: u32,
  pub stats: ViolationStats,
}

pub fn page_of(all: &[ViolationRecord], page: u32, limit: u32) -> ViolationPage {
  let limit = limit.clamp(1, MAX_LIMIT);
  let total = all.len() as u64;
  let total_pages = (total.div_ceil(u64::from(limit)) as u32).max(1);
  let page = page.clamp(1, total_pages);
  let data = all.iter().skip(((page - 1) * limit) as usize).take(limit as usize).cloned().collect();
  let resolved = all.iter().filter(|v| v.status == "resolved").count() as u64;
  let dismissed = all.iter().filter(|v| v.status == "dismissed").count() as u64;
  ViolationPage {
    data,
    total,
    total_pages,
    stats: ViolationStats { total, active: total - resolved - dismissed, resolved },
  }
}

pub async fn list(
  State(state): State<AppState>,
  Extension(ctx): Extension<AuthContext>,
  Query(q): Query<PageQuery>,
) -> Result<Json<ViolationPage>, AppError> {
  ctx.require_admin()?;
  let store = state.store.read().await;
  Ok(Json(page_of(&store.violations, q.page.unwrap_or(1), q.limit.unwrap_or(DEFAULT_LIMIT))))
}
