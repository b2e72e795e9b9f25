/// TaskHub Web - Notification API handlers.
///
/// Every handler acts on the authenticated user's notifications only. None of
/// them push count updates to live connections.
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::NotificationDto;
use crate::store::ReadOutcome;

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListParams {
    pub fn limit(&self) -> i64 {
        self.limit
            .filter(|limit| *limit > 0)
            .map_or(DEFAULT_LIST_LIMIT, |limit| limit.min(MAX_LIST_LIMIT))
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationDto>,
    pub unread_count: i64,
}

/// List notifications (GET /api/notifications).
pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListParams>,
) -> AppResult<impl IntoResponse> {
    let rows = state
        .store
        .list_notifications(user.id, params.limit(), params.offset())
        .await?;
    let unread_count = state.store.unread_count(user.id).await?;

    Ok(Json(NotificationListResponse {
        notifications: rows.into_iter().map(NotificationDto::from).collect(),
        unread_count,
    }))
}

/// Unread count (GET /api/notifications/count).
pub async fn unread_count(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let count = state.store.unread_count(user.id).await?;
    Ok(Json(json!({ "count": count })))
}

/// Mark one notification read (POST /api/notifications/{id}/mark-read).
pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(notification_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    match state
        .store
        .mark_read(user.id, notification_id, Utc::now())
        .await?
    {
        ReadOutcome::NotFound => Err(AppError::NotFound("Notification not found".to_string())),
        outcome => {
            debug!(user_id = user.id, notification_id, ?outcome, "Notification marked read");
            Ok(Json(json!({ "success": true })))
        }
    }
}

/// Mark every notification read (POST /api/notifications/mark-all-read).
pub async fn mark_all_read(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let updated = state.store.mark_all_read(user.id, Utc::now()).await?;
    Ok(Json(json!({ "success": true, "updated": updated })))
}

/// Delete one notification (DELETE /api/notifications/{id}).
pub async fn delete_notification(
    State(state): State<AppState>,
    user: AuthUser,
    Path(notification_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    if !state
        .store
        .delete_notification(user.id, notification_id)
        .await?
    {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }
    Ok(Json(json!({ "success": true })))
}

/// Clear all notifications (DELETE /api/notifications).
pub async fn clear_notifications(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let deleted = state.store.clear_notifications(user.id).await?;
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}
