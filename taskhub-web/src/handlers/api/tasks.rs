/// TaskHub Web - Task API handlers.
///
/// Task mutations emit notifications through the dispatcher. A notification
/// that fails to persist is logged; the task change itself stands.
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use validator::Validate;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::{NewTask, Notification, Task, TaskInput, TaskQuery};

/// List own tasks (GET /api/tasks).
pub async fn list_tasks(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TaskQuery>,
) -> AppResult<impl IntoResponse> {
    let now = Utc::now();
    let page = state.store.list_tasks(user.id, &query).await?;
    Ok(Json(page.map(|task| task.to_dto(now))))
}

/// Create a task (POST /api/tasks).
pub async fn create_task(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<TaskInput>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    ensure_category_visible(&state, user.id, input.category_id).await?;

    let now = Utc::now();
    let task = state
        .store
        .insert_task(NewTask::from_input(user.id, input, now))
        .await?;

    info!(user_id = user.id, task_id = task.id, "Task created");
    log_failure(&task, state.dispatcher.notify_task_created(&task).await);

    Ok((StatusCode::CREATED, Json(task.to_dto(now))))
}

/// Get one task (GET /api/tasks/{id}).
pub async fn get_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let task = own_task(&state, user.id, task_id).await?;
    Ok(Json(task.to_dto(Utc::now())))
}

/// Replace a task (PUT /api/tasks/{id}).
pub async fn update_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<i32>,
    Json(input): Json<TaskInput>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    ensure_category_visible(&state, user.id, input.category_id).await?;

    let mut task = own_task(&state, user.id, task_id).await?;
    let now = Utc::now();
    let change = task.apply(input, now);
    let task = state.store.save_task(&task).await?;

    info!(user_id = user.id, task_id, completed = change.completed, "Task updated");
    log_failure(&task, state.dispatcher.notify_task_updated(&task).await);
    if change.completed {
        log_failure(&task, state.dispatcher.notify_task_completed(&task).await);
    }

    Ok(Json(task.to_dto(now)))
}

/// Complete a task (POST /api/tasks/{id}/complete).
pub async fn complete_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let mut task = own_task(&state, user.id, task_id).await?;
    let now = Utc::now();

    if !task.complete(now) {
        return Ok(Json(json!({ "success": true, "changed": false })));
    }

    let task = state.store.save_task(&task).await?;
    info!(user_id = user.id, task_id, "Task completed");
    log_failure(&task, state.dispatcher.notify_task_completed(&task).await);

    Ok(Json(json!({ "success": true, "changed": true })))
}

/// Delete a task (DELETE /api/tasks/{id}).
pub async fn delete_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    if !state.store.delete_task(user.id, task_id).await? {
        return Err(AppError::NotFound("Task not found".to_string()));
    }
    info!(user_id = user.id, task_id, "Task deleted");
    Ok(Json(json!({ "success": true })))
}

/// Dashboard counters (GET /api/dashboard).
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let stats = state.store.task_stats(user.id, Utc::now()).await?;
    Ok(Json(stats))
}

async fn own_task(state: &AppState, user_id: i32, task_id: i32) -> AppResult<Task> {
    state
        .store
        .find_task(user_id, task_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))
}

async fn ensure_category_visible(
    state: &AppState,
    user_id: i32,
    category_id: Option<i32>,
) -> AppResult<()> {
    let Some(category_id) = category_id else {
        return Ok(());
    };
    match state
        .store
        .find_visible_category(user_id, category_id)
        .await?
    {
        Some(_) => Ok(()),
        None => Err(AppError::Validation(format!(
            "Unknown category: {}",
            category_id
        ))),
    }
}

fn log_failure(task: &Task, result: AppResult<Notification>) {
    if let Err(e) = result {
        warn!(task_id = task.id, error = %e, "Task notification failed");
    }
}
