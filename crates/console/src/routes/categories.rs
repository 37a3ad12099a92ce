//! Category route handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};

use guacamaya_core::CategoryId;

use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::{Category, CategoryDraft};
use crate::state::AppState;

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(list_categories).post(create_category))
        .route(
            "/api/categories/{id}",
            put(update_category).delete(delete_category),
        )
}

/// List all categories, alphabetically.
///
/// GET /api/categories
async fn list_categories(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.categories().list().await?))
}

/// Create a category.
///
/// POST /api/categories
async fn create_category(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(draft): Json<CategoryDraft>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let category = state.categories().create(&draft).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Overwrite a category.
///
/// PUT /api/categories/{id}
async fn update_category(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(draft): Json<CategoryDraft>,
) -> Result<StatusCode, AppError> {
    state.categories().update(id, &draft).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a category. Rejected with 409 while products still reference it.
///
/// DELETE /api/categories/{id}
async fn delete_category(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode, AppError> {
    state.categories().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
