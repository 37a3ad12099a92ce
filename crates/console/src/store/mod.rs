//! Remote record store client.
//!
//! All persistent data lives in an externally hosted relational store
//! fronted by an HTTP row API: filtered and ordered row queries, inserts,
//! updates and deletes per table, plus signed URLs for private stored
//! objects. This module provides the low-level client; the per-table
//! repositories live in the submodules.
//!
//! # Protocol
//!
//! Queries go to `GET {base}/rest/v1/{table}` with filter operators in the
//! query string (`column=eq.value`, `column=is.null`, ...), ordering via
//! `order=column.asc`, and pagination via `limit`/`offset`. An exact total
//! row count is requested with `Prefer: count=exact` and returned in the
//! `Content-Range` header. Writes use `POST`/`PATCH`/`DELETE` with the
//! same filter syntax.

pub mod admin_grants;
pub mod bank_accounts;
pub mod categories;
pub mod objects;
pub mod orders;
pub mod shipping_rules;

pub use admin_grants::AdminGrantRepository;
pub use bank_accounts::BankAccountRepository;
pub use categories::CategoryRepository;
pub use orders::OrderRepository;
pub use shipping_rules::ShippingRuleRepository;

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_RANGE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::RecordStoreConfig;

/// Errors that can occur when talking to the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store rejected the request.
    #[error("record store error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The service key was rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A uniqueness constraint was violated.
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The row is referenced by other records.
    #[error("row is referenced by other records: {0}")]
    ForeignKey(String),

    /// Requested row was not found.
    #[error("not found")]
    NotFound,

    /// The store answered with something structurally unexpected.
    #[error("malformed response: {0}")]
    Data(String),
}

/// Error body returned by the row API.
#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    code: Option<String>,
}

/// Map a non-success response to a [`StoreError`].
fn map_api_error(status: StatusCode, body: &str) -> StoreError {
    let parsed: Option<ApiErrorBody> = serde_json::from_str(body).ok();
    let code = parsed.as_ref().and_then(|b| b.code.clone());
    let message = parsed
        .and_then(|b| b.message)
        .unwrap_or_else(|| body.chars().take(200).collect());

    match code.as_deref() {
        // Postgres unique_violation / foreign_key_violation
        Some("23505") => return StoreError::Conflict(message),
        Some("23503") => return StoreError::ForeignKey(message),
        _ => {}
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized(message),
        StatusCode::CONFLICT => StoreError::Conflict(message),
        _ => StoreError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Parse the total row count out of a `Content-Range` header (`0-24/117`).
fn parse_content_range_total(value: &HeaderValue) -> Option<u64> {
    let raw = value.to_str().ok()?;
    let total = raw.rsplit('/').next()?;
    total.parse().ok()
}

// =============================================================================
// StoreClient
// =============================================================================

/// Client for the remote record store row API.
///
/// Cheaply cloneable via `Arc`; authenticates with the service key on
/// every request. Repositories build table-scoped queries on top of it.
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<StoreClientInner>,
}

struct StoreClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl StoreClient {
    /// Create a new record store client.
    ///
    /// # Panics
    ///
    /// Panics if the service key contains invalid header characters.
    #[must_use]
    pub fn new(config: &RecordStoreConfig) -> Self {
        let key = config.service_key.expose_secret();

        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(key).expect("Invalid service key for header"),
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {key}"))
            .expect("Invalid service key for header");
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            inner: Arc::new(StoreClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
            }),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.inner.base_url)
    }

    /// Start a row query against a table.
    #[must_use]
    pub fn query(&self, table: &str) -> Select<'_> {
        Select {
            client: self,
            table: table.to_string(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            exact_count: false,
        }
    }

    /// Insert rows and return their stored representation.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` on a uniqueness violation, or other
    /// `StoreError` variants for transport/API failures.
    pub async fn insert<B, T>(&self, table: &str, rows: &B) -> Result<Vec<T>, StoreError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .inner
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(map_api_error(status, &body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Insert a single row and return its stored representation.
    ///
    /// # Errors
    ///
    /// As [`Self::insert`], plus `StoreError::Data` if the store returns
    /// an empty representation.
    pub async fn insert_one<B, T>(&self, table: &str, row: &B) -> Result<T, StoreError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let rows: Vec<T> = self.insert(table, &[row]).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Data("insert returned no rows".to_string()))
    }

    /// Start an update against a table. Filters select the rows to patch.
    #[must_use]
    pub fn update(&self, table: &str, body: serde_json::Value) -> Update<'_> {
        Update {
            client: self,
            table: table.to_string(),
            filters: Vec::new(),
            body,
        }
    }

    /// Start a delete against a table. Filters select the rows to remove.
    #[must_use]
    pub fn delete(&self, table: &str) -> Delete<'_> {
        Delete {
            client: self,
            table: table.to_string(),
            filters: Vec::new(),
        }
    }

    /// Check that the row API answers at all.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` when the store is unreachable or rejects the
    /// service key.
    pub async fn health(&self) -> Result<(), StoreError> {
        let response = self
            .inner
            .client
            .get(format!("{}/rest/v1/", self.inner.base_url))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(map_api_error(status, &body))
        }
    }

    async fn run_select(&self, select: &Select<'_>) -> Result<(String, Option<u64>), StoreError> {
        let mut request = self
            .inner
            .client
            .get(self.table_url(&select.table))
            .query(&select.query_params());
        if select.exact_count {
            request = request.header("Prefer", "count=exact");
        }

        let response = request.send().await?;
        let status = response.status();
        let total = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(parse_content_range_total);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(map_api_error(status, &body));
        }

        Ok((body, total))
    }
}

// =============================================================================
// Query builders
// =============================================================================

/// A filtered, ordered, paginated row query.
#[must_use]
pub struct Select<'a> {
    client: &'a StoreClient,
    table: String,
    columns: String,
    filters: Vec<(String, String)>,
    order: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    exact_count: bool,
}

impl Select<'_> {
    /// Restrict the selected columns (defaults to `*`).
    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    /// Equality filter: `column = value`.
    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filters.push((column.to_string(), format!("eq.{value}")));
        self
    }

    /// Inequality filter: `column <> value`.
    pub fn neq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filters
            .push((column.to_string(), format!("neq.{value}")));
        self
    }

    /// Null filter: `column IS NULL`.
    pub fn is_null(mut self, column: &str) -> Self {
        self.filters.push((column.to_string(), "is.null".to_string()));
        self
    }

    /// Not-null filter: `column IS NOT NULL`.
    pub fn not_null(mut self, column: &str) -> Self {
        self.filters
            .push((column.to_string(), "not.is.null".to_string()));
        self
    }

    /// Case-insensitive pattern filter: `column ILIKE pattern`.
    pub fn ilike(mut self, column: &str, pattern: &str) -> Self {
        self.filters
            .push((column.to_string(), format!("ilike.{pattern}")));
        self
    }

    /// Disjunction of raw filter expressions, e.g.
    /// `state.ilike.*term*,city.ilike.*term*`.
    pub fn any_of(mut self, expression: &str) -> Self {
        self.filters
            .push(("or".to_string(), format!("({expression})")));
        self
    }

    /// Ascending sort on a column (appended after prior sorts).
    pub fn order_asc(mut self, column: &str) -> Self {
        self.order.push(format!("{column}.asc"));
        self
    }

    /// Descending sort on a column (appended after prior sorts).
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order.push(format!("{column}.desc"));
        self
    }

    /// Cap the number of returned rows.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip this many rows.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    fn query_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.columns.clone())];
        params.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            params.push(("order".to_string(), self.order.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset".to_string(), offset.to_string()));
        }
        params
    }

    /// Fetch all matching rows.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` on transport, API, or decode failure.
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, StoreError> {
        let (body, _) = self.client.run_select(&self).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch matching rows plus the exact total count (ignoring
    /// pagination).
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` on transport, API, or decode failure.
    pub async fn fetch_with_count<T: DeserializeOwned>(
        mut self,
    ) -> Result<(Vec<T>, u64), StoreError> {
        self.exact_count = true;
        let (body, total) = self.client.run_select(&self).await?;
        let rows: Vec<T> = serde_json::from_str(&body)?;
        let total = total.unwrap_or(rows.len() as u64);
        Ok((rows, total))
    }

    /// Fetch at most one matching row.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` on transport, API, or decode failure.
    pub async fn fetch_optional<T: DeserializeOwned>(mut self) -> Result<Option<T>, StoreError> {
        self.limit = Some(1);
        let (body, _) = self.client.run_select(&self).await?;
        let rows: Vec<T> = serde_json::from_str(&body)?;
        Ok(rows.into_iter().next())
    }
}

/// A filtered row update.
#[must_use]
pub struct Update<'a> {
    client: &'a StoreClient,
    table: String,
    filters: Vec<(String, String)>,
    body: serde_json::Value,
}

impl Update<'_> {
    /// Equality filter: `column = value`.
    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filters.push((column.to_string(), format!("eq.{value}")));
        self
    }

    /// Inequality filter: `column <> value`.
    pub fn neq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filters
            .push((column.to_string(), format!("neq.{value}")));
        self
    }

    /// Apply the update to all matching rows.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` on a uniqueness violation, or other
    /// `StoreError` variants for transport/API failures.
    pub async fn execute(self) -> Result<(), StoreError> {
        let response = self
            .client
            .inner
            .client
            .patch(self.client.table_url(&self.table))
            .query(&self.filters)
            .json(&self.body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(map_api_error(status, &body));
        }

        Ok(())
    }
}

/// A filtered row delete.
#[must_use]
pub struct Delete<'a> {
    client: &'a StoreClient,
    table: String,
    filters: Vec<(String, String)>,
}

impl Delete<'_> {
    /// Equality filter: `column = value`.
    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.filters.push((column.to_string(), format!("eq.{value}")));
        self
    }

    /// Delete all matching rows.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ForeignKey` when other records still reference
    /// the rows, or other `StoreError` variants for transport/API failures.
    pub async fn execute(self) -> Result<(), StoreError> {
        let response = self
            .client
            .inner
            .client
            .delete(self.client.table_url(&self.table))
            .query(&self.filters)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(map_api_error(status, &body));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_map_api_error_unique_violation() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#;
        let err = map_api_error(StatusCode::CONFLICT, body);
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn test_map_api_error_foreign_key_violation() {
        let body = r#"{"code":"23503","message":"violates foreign key constraint"}"#;
        let err = map_api_error(StatusCode::CONFLICT, body);
        assert!(matches!(err, StoreError::ForeignKey(_)));
    }

    #[test]
    fn test_map_api_error_unauthorized() {
        let err = map_api_error(StatusCode::UNAUTHORIZED, r#"{"message":"JWT expired"}"#);
        assert!(matches!(err, StoreError::Unauthorized(_)));
    }

    #[test]
    fn test_map_api_error_unparseable_body() {
        let err = map_api_error(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        match err {
            StoreError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "<html>oops</html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_content_range_total() {
        let header = HeaderValue::from_static("0-24/117");
        assert_eq!(parse_content_range_total(&header), Some(117));

        let star = HeaderValue::from_static("*/0");
        assert_eq!(parse_content_range_total(&star), Some(0));

        let unknown = HeaderValue::from_static("0-24/*");
        assert_eq!(parse_content_range_total(&unknown), None);
    }
}
