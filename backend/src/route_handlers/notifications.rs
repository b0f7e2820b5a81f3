use axum::{
  extract::{Path, Query, State},
  Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::midwares::app_state::{AppError, AppState, NotificationRecord, Role};
use crate::midwares::auth::AuthContext;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
  pub user_id: String,
}

fn check_owner(ctx: &AuthContext, user_id: &str) -> Result<(), AppError> {
  if ctx.user_id == user_id || ctx.role == Role::Admin {
    Ok(())
  } else {
    Err(AppError::Forbidden("Cannot access another user's notifications".to_string()))
  }
}

pub async fn list(
  State(state): State<AppState>,
  Extension(ctx): Extension<AuthContext>,
  Query(q): Query<UserQuery>,
) -> Result<Json<Vec<NotificationRecord>>, AppError> {
  check_owner(&ctx, &q.user_id)?;
  let store = state.store.read().await;
  let mut list: Vec<NotificationRecord> =
    store.notifications.iter().filter(|n| n.user_id == q.user_id).cloned().collect();
  list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
  Ok(Json(list))
}

pub async fn mark_read(
  State(state): State<AppState>,
  Extension(ctx): Extension<AuthContext>,
  Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
  let mut store = state.store.write().await;
  let n = store
    .notifications
    .iter_mut()
    .find(|n| n.id == id && (n.user_id == ctx.user_id || ctx.role == Role::Admin))
    .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;
  n.read = true;
  debug!("notification {} read", id);
  Ok(Json(json!({"success": true})))
}

pub async fn mark_all_read(
  State(state): State<AppState>,
  Extension(ctx): Extension<AuthContext>,
  Query(q): Query<UserQuery>,
) -> Result<Json<Value>, AppError> {
  check_owner(&ctx, &q.user_id)?;
  let mut store = state.store.write().await;
  let mut updated = 0;
  for n in store.notifications.iter_mut().filter(|n| n.user_id == q.user_id && !n.read) {
    n.read = true;
    updated += 1;
  }
  Ok(Json(json!({"updated": updated})))
}
