//! Signed URLs for private stored objects.
//!
//! Payment-proof images live in a private bucket; they are only ever
//! handed out through signed, time-limited URLs. The expiry is a
//! configuration value ([`crate::config::ConsoleConfig::proof_url_ttl`]),
//! not a constant.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use super::{StoreClient, StoreError, map_api_error};

#[derive(Debug, Deserialize)]
struct SignedUrlBody {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl StoreClient {
    /// Issue a signed, time-limited URL for a private object.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the object does not exist or the storage
    /// API rejects the request.
    pub async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError> {
        let url = format!(
            "{}/storage/v1/object/sign/{bucket}/{path}",
            self.inner.base_url
        );

        let response = self
            .inner
            .client
            .post(url)
            .json(&json!({ "expiresIn": expires_in.as_secs() }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(map_api_error(status, &body));
        }

        let parsed: SignedUrlBody = serde_json::from_str(&body)?;

        // The storage API answers with a path relative to its own root.
        if parsed.signed_url.starts_with("http") {
            Ok(parsed.signed_url)
        } else {
            Ok(format!(
                "{}/storage/v1{}",
                self.inner.base_url, parsed.signed_url
            ))
        }
    }
}
