//! Shipping route handlers.
//!
//! The quote endpoint is public - the storefront checkout calls it for
//! every destination the customer types. Rule management is gated.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use guacamaya_core::{Destination, RuleId};

use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::{ShippingRule, ShippingRuleDraft};
use crate::services::shipping::ShippingQuote;
use crate::state::AppState;
use crate::store::shipping_rules::{RULE_PAGE_SIZE, RuleListParams, RuleScope};

/// Build the shipping router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/shipping/quote", get(quote))
        .route("/api/shipping/rules", get(list_rules).post(create_rule))
        .route(
            "/api/shipping/rules/{id}",
            put(update_rule).delete(delete_rule),
        )
        .route("/api/shipping/rules/{id}/cost", put(update_rule_cost))
        .route("/api/shipping/rules/{id}/active", put(set_rule_active))
}

#[derive(Debug, Deserialize)]
struct QuoteParams {
    country: String,
    state: String,
    city: Option<String>,
}

/// Resolve a shipping quote for a destination.
///
/// GET /api/shipping/quote?country=..&state=..&city=..
///
/// Always answers 200 with a well-formed quote once the destination
/// parses; lookup failures come back as an unavailable quote.
async fn quote(
    State(state): State<AppState>,
    Query(params): Query<QuoteParams>,
) -> Result<Json<ShippingQuote>, AppError> {
    let destination = Destination::new(&params.country, &params.state, params.city.as_deref())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(state.shipping_resolver().resolve(&destination).await))
}

#[derive(Debug, Deserialize)]
struct RuleListQuery {
    page: Option<u64>,
    search: Option<String>,
    scope: Option<RuleScope>,
}

#[derive(Debug, Serialize)]
struct RuleListResponse {
    rules: Vec<ShippingRule>,
    total: u64,
    page: u64,
    page_size: u64,
}

/// List rules for the management screen.
///
/// GET /api/shipping/rules?page=..&search=..&scope=states|cities
async fn list_rules(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<RuleListQuery>,
) -> Result<Json<RuleListResponse>, AppError> {
    let params = RuleListParams {
        page: query.page.unwrap_or(1),
        search: query.search,
        scope: query.scope.unwrap_or(RuleScope::StateDefaults),
    };

    let (rules, total) = state.shipping_rules().list(&params).await?;

    Ok(Json(RuleListResponse {
        rules,
        total,
        page: params.page.max(1),
        page_size: RULE_PAGE_SIZE,
    }))
}

/// Create a rule.
///
/// POST /api/shipping/rules
async fn create_rule(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(draft): Json<ShippingRuleDraft>,
) -> Result<(StatusCode, Json<ShippingRule>), AppError> {
    let rule = state.shipping_rules().create(&draft).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

/// Overwrite a rule.
///
/// PUT /api/shipping/rules/{id}
async fn update_rule(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<RuleId>,
    Json(draft): Json<ShippingRuleDraft>,
) -> Result<StatusCode, AppError> {
    state.shipping_rules().update(id, &draft).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct CostUpdate {
    is_free: bool,
    #[serde(default)]
    base_cost: Decimal,
}

/// Update just the cost fields of a rule (inline edit on the listing).
///
/// PUT /api/shipping/rules/{id}/cost
async fn update_rule_cost(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<RuleId>,
    Json(body): Json<CostUpdate>,
) -> Result<StatusCode, AppError> {
    state
        .shipping_rules()
        .set_cost(id, body.is_free, body.base_cost)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct ActiveUpdate {
    is_active: bool,
}

/// Activate or deactivate a rule.
///
/// PUT /api/shipping/rules/{id}/active
async fn set_rule_active(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<RuleId>,
    Json(body): Json<ActiveUpdate>,
) -> Result<StatusCode, AppError> {
    state.shipping_rules().set_active(id, body.is_active).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a rule.
///
/// DELETE /api/shipping/rules/{id}
async fn delete_rule(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<RuleId>,
) -> Result<StatusCode, AppError> {
    state.shipping_rules().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
