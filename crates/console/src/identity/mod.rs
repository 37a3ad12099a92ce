//! Identity provider client.
//!
//! The record store host also runs the identity provider: password
//! sign-in issuing a session token, and sign-out revoking it. The console
//! only needs those two calls - session resume is handled by the cookie
//! session, and grant checks live in the authorizer.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::instrument;

use guacamaya_core::UserId;

use crate::config::RecordStoreConfig;

/// Errors that can occur when talking to the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The email/password pair was rejected.
    #[error("invalid login credentials")]
    InvalidCredentials,

    /// The provider rejected the request for another reason.
    #[error("identity provider error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The authenticated user inside an identity session.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    /// Identity-provider user ID.
    pub id: UserId,
    /// Email on record, when the provider returns one.
    pub email: Option<String>,
}

/// A live identity session.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentitySession {
    /// Bearer token for subsequent calls on the user's behalf.
    pub access_token: String,
    /// The signed-in user.
    pub user: AuthUser,
}

/// Error body returned by the identity provider.
#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
}

fn map_auth_error(status: StatusCode, body: &str) -> IdentityError {
    let parsed: Option<AuthErrorBody> = serde_json::from_str(body).ok();
    let code = parsed.as_ref().and_then(|b| b.error.clone());
    let message = parsed
        .and_then(|b| b.error_description.or(b.msg))
        .unwrap_or_else(|| body.chars().take(200).collect());

    let credentials_rejected = code.as_deref() == Some("invalid_grant")
        || message.to_lowercase().contains("credential");
    if credentials_rejected
        && matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED)
    {
        return IdentityError::InvalidCredentials;
    }

    IdentityError::Api {
        status: status.as_u16(),
        message,
    }
}

// =============================================================================
// IdentityClient
// =============================================================================

/// Client for the identity provider.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct IdentityClient {
    inner: Arc<IdentityClientInner>,
}

struct IdentityClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl IdentityClient {
    /// Create a new identity provider client.
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

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            inner: Arc::new(IdentityClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
            }),
        }
    }

    /// Sign in with an email/password pair.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidCredentials` when the pair is
    /// rejected, or other `IdentityError` variants for transport/API
    /// failures.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentitySession, IdentityError> {
        let response = self
            .inner
            .client
            .post(format!("{}/auth/v1/token", self.inner.base_url))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(map_auth_error(status, &body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Revoke a session token.
    ///
    /// # Errors
    ///
    /// Returns an `IdentityError` if the provider rejects the call; the
    /// caller decides whether that matters (logout treats it as
    /// best-effort).
    #[instrument(skip_all)]
    pub async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let response = self
            .inner
            .client
            .post(format!("{}/auth/v1/logout", self.inner.base_url))
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(map_auth_error(status, &body))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_map_auth_error_invalid_grant() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        let err = map_auth_error(StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, IdentityError::InvalidCredentials));
    }

    #[test]
    fn test_map_auth_error_credentials_message() {
        let body = r#"{"msg":"Invalid login credentials"}"#;
        let err = map_auth_error(StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, IdentityError::InvalidCredentials));
    }

    #[test]
    fn test_map_auth_error_other() {
        let body = r#"{"msg":"Email rate limit exceeded"}"#;
        let err = map_auth_error(StatusCode::TOO_MANY_REQUESTS, body);
        match err {
            IdentityError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Email rate limit exceeded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_map_auth_error_server_error_is_not_credentials() {
        // A 500 mentioning credentials is still a provider failure.
        let body = r#"{"msg":"credential backend unavailable"}"#;
        let err = map_auth_error(StatusCode::INTERNAL_SERVER_ERROR, body);
        assert!(matches!(err, IdentityError::Api { status: 500, .. }));
    }
}
