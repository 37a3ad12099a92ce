//! Product category model and form payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use guacamaya_core::CategoryId;

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Unique category ID.
    pub id: CategoryId,
    /// Display name, unique case-insensitively.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional image URL.
    pub image_url: Option<String>,
    /// When the category was created.
    pub created_at: DateTime<Utc>,
}

/// Raw form payload for creating or editing a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
}
