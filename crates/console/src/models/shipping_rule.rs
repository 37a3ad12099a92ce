//! Shipping rule model and form payload.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use guacamaya_core::RuleId;

/// A shipping rule.
///
/// `city = None` makes this the state-wide default; a non-null city makes
/// it an override for that exact city (case-sensitive match). At most one
/// active rule may exist per `(country, state, city-or-null)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingRule {
    /// Unique rule ID.
    pub id: RuleId,
    /// Destination country.
    pub country: String,
    /// Destination state.
    pub state: String,
    /// Destination city; `None` applies to the entire state.
    pub city: Option<String>,
    /// Whether shipping is free for matching destinations.
    pub is_free: bool,
    /// Flat cost when not free. Always 0 when `is_free`.
    pub base_cost: Decimal,
    /// Inactive rules are invisible to resolution.
    pub is_active: bool,
    /// Free-form staff notes.
    pub notes: Option<String>,
    /// When the rule was created.
    pub created_at: DateTime<Utc>,
}

/// Raw form payload for creating or editing a shipping rule.
///
/// Normalization (trimming, empty-city-to-null, cost zeroing) happens in
/// the rule service, not here.
#[derive(Debug, Clone, Deserialize)]
pub struct ShippingRuleDraft {
    pub country: String,
    pub state: String,
    #[serde(default)]
    pub city: String,
    pub is_free: bool,
    #[serde(default)]
    pub base_cost: Decimal,
    #[serde(default)]
    pub notes: String,
    pub is_active: bool,
}
