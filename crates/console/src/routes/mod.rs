//! Route handlers for the console API.
//!
//! Every `/api` route sits behind the [`crate::middleware::RequireAdmin`]
//! gate except the shipping quote, which the storefront checkout calls.

pub mod auth;
pub mod bank_accounts;
pub mod categories;
pub mod orders;
pub mod shipping;

use axum::Router;

use crate::state::AppState;

/// Build the console router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(orders::router())
        .merge(categories::router())
        .merge(shipping::router())
        .merge(bank_accounts::router())
}
