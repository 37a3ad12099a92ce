//! Admin grant repository.
//!
//! Grants are provisioned out-of-band; the console only ever reads them.

use guacamaya_core::UserId;

use super::{StoreClient, StoreError};

const TABLE: &str = "admin_users";

/// Repository for admin grant lookups.
pub struct AdminGrantRepository {
    store: StoreClient,
}

impl AdminGrantRepository {
    /// Create a new admin grant repository.
    #[must_use]
    pub fn new(store: &StoreClient) -> Self {
        Self {
            store: store.clone(),
        }
    }

    /// Whether an active grant row exists for this user.
    ///
    /// Zero rows is an ordinary `false`, not an error.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the query fails.
    pub async fn is_active_admin(&self, user_id: UserId) -> Result<bool, StoreError> {
        let rows: Vec<serde_json::Value> = self
            .store
            .query(TABLE)
            .columns("user_id")
            .eq("user_id", user_id)
            .eq("is_active", true)
            .limit(1)
            .fetch()
            .await?;

        Ok(!rows.is_empty())
    }
}
