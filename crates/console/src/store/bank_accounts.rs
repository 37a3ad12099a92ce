//! Bank account repository.

use serde::Serialize;
use serde_json::json;

use guacamaya_core::BankAccountId;

use super::{StoreClient, StoreError};
use crate::models::BankAccount;

const TABLE: &str = "bank_accounts";

/// Insert/update row for a bank account, already normalized.
#[derive(Debug, Serialize)]
pub struct BankAccountRow<'a> {
    pub label: &'a str,
    pub bank_name: &'a str,
    pub account_holder: &'a str,
    pub account_number: &'a str,
    pub document_id: Option<&'a str>,
    pub account_type: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub is_active: bool,
    pub is_primary: bool,
}

/// Repository for bank account row operations.
pub struct BankAccountRepository {
    store: StoreClient,
}

impl BankAccountRepository {
    /// Create a new bank account repository.
    #[must_use]
    pub fn new(store: &StoreClient) -> Self {
        Self {
            store: store.clone(),
        }
    }

    /// List all accounts, newest first.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the query fails.
    pub async fn list(&self) -> Result<Vec<BankAccount>, StoreError> {
        self.store
            .query(TABLE)
            .order_desc("created_at")
            .fetch()
            .await
    }

    /// Count the currently active accounts.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the query fails.
    pub async fn count_active(&self) -> Result<u64, StoreError> {
        let (_rows, total) = self
            .store
            .query(TABLE)
            .columns("id")
            .eq("is_active", true)
            .limit(1)
            .fetch_with_count::<serde_json::Value>()
            .await?;
        Ok(total)
    }

    /// Clear the primary flag everywhere (optionally sparing one account).
    ///
    /// Run before marking an account primary so at most one row ever
    /// carries the flag.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the update fails.
    pub async fn clear_primary(&self, exclude: Option<BankAccountId>) -> Result<(), StoreError> {
        let mut update = self
            .store
            .update(TABLE, json!({ "is_primary": false }))
            .eq("is_primary", true);
        if let Some(id) = exclude {
            update = update.neq("id", id);
        }
        update.execute().await
    }

    /// Insert an account and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the insert fails.
    pub async fn create(&self, row: &BankAccountRow<'_>) -> Result<BankAccount, StoreError> {
        self.store.insert_one(TABLE, row).await
    }

    /// Overwrite an account's fields.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the update fails.
    pub async fn update(
        &self,
        id: BankAccountId,
        row: &BankAccountRow<'_>,
    ) -> Result<(), StoreError> {
        self.store
            .update(TABLE, serde_json::to_value(row)?)
            .eq("id", id)
            .execute()
            .await
    }

    /// Activate or deactivate an account.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the update fails.
    pub async fn set_active(&self, id: BankAccountId, is_active: bool) -> Result<(), StoreError> {
        self.store
            .update(TABLE, json!({ "is_active": is_active }))
            .eq("id", id)
            .execute()
            .await
    }

    /// Delete an account.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the delete fails.
    pub async fn delete(&self, id: BankAccountId) -> Result<(), StoreError> {
        self.store.delete(TABLE).eq("id", id).execute().await
    }
}
