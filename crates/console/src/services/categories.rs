//! Category management.

use thiserror::Error;
use tracing::instrument;

use guacamaya_core::CategoryId;

use crate::models::{Category, CategoryDraft};
use crate::store::categories::CategoryRow;
use crate::store::{CategoryRepository, StoreClient, StoreError};

/// Errors that can occur when writing categories.
#[derive(Debug, Error)]
pub enum CategoryWriteError {
    /// Form input failed validation; no write happened.
    #[error("{0}")]
    Validation(String),

    /// A category with this name already exists (case-insensitive).
    #[error("a category with this name already exists")]
    Duplicate,

    /// Products still reference the category.
    #[error("this category has products associated with it")]
    InUse,

    /// The record store rejected the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A category draft that passed validation.
struct ValidatedCategory {
    name: String,
    description: Option<String>,
    image_url: Option<String>,
}

impl ValidatedCategory {
    fn from_draft(draft: &CategoryDraft) -> Result<Self, CategoryWriteError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(CategoryWriteError::Validation(
                "name is required".to_string(),
            ));
        }

        Ok(Self {
            name: name.to_string(),
            description: non_empty(&draft.description),
            image_url: non_empty(&draft.image_url),
        })
    }

    fn as_row(&self) -> CategoryRow<'_> {
        CategoryRow {
            name: &self.name,
            description: self.description.as_deref(),
            image_url: self.image_url.as_deref(),
        }
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Write-side operations on categories.
pub struct CategoryService {
    categories: CategoryRepository,
}

impl CategoryService {
    /// Create a new category service.
    #[must_use]
    pub fn new(store: &StoreClient) -> Self {
        Self {
            categories: CategoryRepository::new(store),
        }
    }

    /// List all categories, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, StoreError> {
        self.categories.list().await
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryWriteError::Duplicate` when the name is already
    /// taken, `Validation` for bad input, or a store error.
    #[instrument(skip_all)]
    pub async fn create(&self, draft: &CategoryDraft) -> Result<Category, CategoryWriteError> {
        let category = ValidatedCategory::from_draft(draft)?;

        if self.categories.name_exists(&category.name, None).await? {
            return Err(CategoryWriteError::Duplicate);
        }

        Ok(self.categories.create(&category.as_row()).await?)
    }

    /// Overwrite a category.
    ///
    /// # Errors
    ///
    /// As [`Self::create`]; the edited category itself is excluded from
    /// the duplicate check.
    #[instrument(skip_all, fields(category = %id))]
    pub async fn update(
        &self,
        id: CategoryId,
        draft: &CategoryDraft,
    ) -> Result<(), CategoryWriteError> {
        let category = ValidatedCategory::from_draft(draft)?;

        if self.categories.name_exists(&category.name, Some(id)).await? {
            return Err(CategoryWriteError::Duplicate);
        }

        self.categories.update(id, &category.as_row()).await?;
        Ok(())
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryWriteError::InUse` when products still reference
    /// the category, or a store error.
    #[instrument(skip(self), fields(category = %id))]
    pub async fn delete(&self, id: CategoryId) -> Result<(), CategoryWriteError> {
        match self.categories.delete(id).await {
            Ok(()) => Ok(()),
            Err(StoreError::ForeignKey(_)) => Err(CategoryWriteError::InUse),
            Err(other) => Err(other.into()),
        }
    }
}
