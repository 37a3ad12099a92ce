//! Order route handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use guacamaya_core::{OrderId, OrderStatus};

use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::{Order, OrderItem};
use crate::state::AppState;

/// Bucket holding uploaded transfer-proof images.
const PROOF_BUCKET: &str = "transfer-proofs";

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list_orders))
        .route("/api/orders/{id}/items", get(list_order_items))
        .route("/api/orders/{id}/status", put(update_order_status))
        .route("/api/orders/{id}/payment-proof", get(payment_proof_url))
}

/// List all orders, newest first.
///
/// GET /api/orders
async fn list_orders(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(state.orders().list().await?))
}

/// List the line items of an order.
///
/// GET /api/orders/{id}/items
async fn list_order_items(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Vec<OrderItem>>, AppError> {
    Ok(Json(state.orders().items(id).await?))
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: OrderStatus,
}

/// Move an order to a new status.
///
/// PUT /api/orders/{id}/status
async fn update_order_status(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusUpdate>,
) -> Result<StatusCode, AppError> {
    state.orders().update_status(id, body.status).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct SignedUrlResponse {
    url: String,
    expires_in: u64,
}

/// Issue a signed, time-limited URL for an order's payment proof.
///
/// GET /api/orders/{id}/payment-proof
async fn payment_proof_url(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<SignedUrlResponse>, AppError> {
    let order = state.orders().get(id).await?;
    let path = order
        .payment_proof_path
        .ok_or_else(|| AppError::NotFound("this order has no payment proof".to_string()))?;

    let ttl = state.config().proof_url_ttl;
    let url = state
        .store()
        .create_signed_url(PROOF_BUCKET, &path, ttl)
        .await?;

    Ok(Json(SignedUrlResponse {
        url,
        expires_in: ttl.as_secs(),
    }))
}
