//! Bank account route handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;

use guacamaya_core::BankAccountId;

use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::{BankAccount, BankAccountDraft};
use crate::state::AppState;

/// Build the bank accounts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/bank-accounts", get(list_accounts).post(create_account))
        .route(
            "/api/bank-accounts/{id}",
            put(update_account).delete(delete_account),
        )
        .route("/api/bank-accounts/{id}/active", put(set_account_active))
}

/// List all accounts, newest first.
///
/// GET /api/bank-accounts
async fn list_accounts(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<BankAccount>>, AppError> {
    Ok(Json(state.bank_accounts().list().await?))
}

/// Create an account.
///
/// POST /api/bank-accounts
async fn create_account(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(draft): Json<BankAccountDraft>,
) -> Result<(StatusCode, Json<BankAccount>), AppError> {
    let account = state.bank_accounts().create(&draft).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// Overwrite an account.
///
/// PUT /api/bank-accounts/{id}
async fn update_account(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<BankAccountId>,
    Json(draft): Json<BankAccountDraft>,
) -> Result<StatusCode, AppError> {
    state.bank_accounts().update(id, &draft).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct ActiveUpdate {
    is_active: bool,
}

/// Activate or deactivate an account. Deactivating the last active
/// account is rejected with 409.
///
/// PUT /api/bank-accounts/{id}/active
async fn set_account_active(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<BankAccountId>,
    Json(body): Json<ActiveUpdate>,
) -> Result<StatusCode, AppError> {
    state.bank_accounts().set_active(id, body.is_active).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete an account.
///
/// DELETE /api/bank-accounts/{id}
async fn delete_account(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<BankAccountId>,
) -> Result<StatusCode, AppError> {
    state.bank_accounts().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
