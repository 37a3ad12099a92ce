//! Category repository.

use serde::Serialize;

use guacamaya_core::CategoryId;

use super::{StoreClient, StoreError};
use crate::models::Category;

const TABLE: &str = "categories";

/// Insert/update row for a category, already normalized.
#[derive(Debug, Serialize)]
pub struct CategoryRow<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub image_url: Option<&'a str>,
}

/// Repository for category row operations.
pub struct CategoryRepository {
    store: StoreClient,
}

impl CategoryRepository {
    /// Create a new category repository.
    #[must_use]
    pub fn new(store: &StoreClient) -> Self {
        Self {
            store: store.clone(),
        }
    }

    /// List all categories, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, StoreError> {
        self.store.query(TABLE).order_asc("name").fetch().await
    }

    /// Check whether a category with this name exists, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the query fails.
    pub async fn name_exists(
        &self,
        name: &str,
        exclude: Option<CategoryId>,
    ) -> Result<bool, StoreError> {
        let mut query = self.store.query(TABLE).columns("id").ilike("name", name);
        if let Some(id) = exclude {
            query = query.neq("id", id);
        }

        let rows: Vec<serde_json::Value> = query.fetch().await?;
        Ok(!rows.is_empty())
    }

    /// Insert a category and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the insert fails.
    pub async fn create(&self, row: &CategoryRow<'_>) -> Result<Category, StoreError> {
        self.store.insert_one(TABLE, row).await
    }

    /// Overwrite a category's fields.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the update fails.
    pub async fn update(&self, id: CategoryId, row: &CategoryRow<'_>) -> Result<(), StoreError> {
        self.store
            .update(TABLE, serde_json::to_value(row)?)
            .eq("id", id)
            .execute()
            .await
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ForeignKey` when products still reference the
    /// category.
    pub async fn delete(&self, id: CategoryId) -> Result<(), StoreError> {
        self.store.delete(TABLE).eq("id", id).execute().await
    }
}
