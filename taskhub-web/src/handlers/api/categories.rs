/// TaskHub Web - Category API handlers.
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::{Category, CategoryInput, NewCategory};
use crate::models::category::normalize_color;

/// List own and global categories (GET /api/categories).
pub async fn list_categories(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let categories = state.store.visible_categories(user.id).await?;
    Ok(Json(categories))
}

/// Create an own category (POST /api/categories).
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CategoryInput>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let category = state
        .store
        .insert_category(NewCategory::from_input(Some(user.id), input)?)
        .await?;
    info!(user_id = user.id, category_id = category.id, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// Update an own category (PUT /api/categories/{id}).
pub async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(category_id): Path<i32>,
    Json(input): Json<CategoryInput>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let mut category = owned_category(&state, user.id, category_id).await?;
    category.name = input.name.trim().to_string();
    category.color = normalize_color(input.color.as_deref())?;

    let category = state.store.save_category(&category).await?;
    Ok(Json(category))
}

/// Delete an own category (DELETE /api/categories/{id}).
///
/// A category still referenced by a task is refused.
pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(category_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    owned_category(&state, user.id, category_id).await?;
    if state.store.category_in_use(category_id).await? {
        return Err(AppError::Validation(
            "Category is in use by one or more tasks".to_string(),
        ));
    }

    state.store.delete_category(user.id, category_id).await?;
    info!(user_id = user.id, category_id, "Category deleted");
    Ok(Json(json!({ "success": true })))
}

async fn owned_category(state: &AppState, user_id: i32, category_id: i32) -> AppResult<Category> {
    state
        .store
        .find_visible_category(user_id, category_id)
        .await?
        .filter(|category| category.is_owned_by(user_id))
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}
