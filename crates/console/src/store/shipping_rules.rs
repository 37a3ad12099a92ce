//! Shipping rule repository.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use guacamaya_core::RuleId;

use super::{StoreClient, StoreError};
use crate::models::ShippingRule;

const TABLE: &str = "shipping_rules";

/// Rows per page on the rule management screen.
pub const RULE_PAGE_SIZE: u64 = 25;

/// Which half of the rule set a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RuleScope {
    /// State-wide defaults (`city` is null).
    #[serde(rename = "states")]
    StateDefaults,
    /// City-level overrides (`city` is not null).
    #[serde(rename = "cities")]
    CityOverrides,
}

/// Parameters for a rule listing.
#[derive(Debug, Clone)]
pub struct RuleListParams {
    /// 1-based page number.
    pub page: u64,
    /// Search term matched against state, city and notes.
    pub search: Option<String>,
    /// Defaults vs overrides.
    pub scope: RuleScope,
}

/// Insert/update row for a shipping rule, already normalized.
#[derive(Debug, Serialize)]
pub struct ShippingRuleRow<'a> {
    pub country: &'a str,
    pub state: &'a str,
    pub city: Option<&'a str>,
    pub is_free: bool,
    pub base_cost: Decimal,
    pub notes: Option<&'a str>,
    pub is_active: bool,
}

/// Repository for shipping rule row operations.
pub struct ShippingRuleRepository {
    store: StoreClient,
}

impl ShippingRuleRepository {
    /// Create a new shipping rule repository.
    #[must_use]
    pub fn new(store: &StoreClient) -> Self {
        Self {
            store: store.clone(),
        }
    }

    /// List rules for the management screen, with the exact total count.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the query fails.
    pub async fn list(
        &self,
        params: &RuleListParams,
    ) -> Result<(Vec<ShippingRule>, u64), StoreError> {
        let page = params.page.max(1);

        let mut query = self.store.query(TABLE);
        query = match params.scope {
            RuleScope::StateDefaults => query.is_null("city"),
            RuleScope::CityOverrides => query.not_null("city"),
        };

        if let Some(term) = params.search.as_deref().map(str::trim)
            && !term.is_empty()
        {
            query = query.any_of(&format!(
                "state.ilike.*{term}*,city.ilike.*{term}*,notes.ilike.*{term}*"
            ));
        }

        query = query.order_asc("state");
        if params.scope == RuleScope::CityOverrides {
            query = query.order_asc("city");
        }

        query
            .limit(RULE_PAGE_SIZE)
            .offset((page - 1) * RULE_PAGE_SIZE)
            .fetch_with_count()
            .await
    }

    /// Get a rule by ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the rule does not exist.
    pub async fn get(&self, id: RuleId) -> Result<ShippingRule, StoreError> {
        self.store
            .query(TABLE)
            .eq("id", id)
            .fetch_optional()
            .await?
            .ok_or(StoreError::NotFound)
    }

    /// Find the active rule for an exact city, if any.
    ///
    /// City matching is case-sensitive: `Maracaibo` and `maracaibo` are
    /// different rules.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the query fails.
    pub async fn find_active_city_rule(
        &self,
        country: &str,
        state: &str,
        city: &str,
    ) -> Result<Option<ShippingRule>, StoreError> {
        self.store
            .query(TABLE)
            .eq("country", country)
            .eq("state", state)
            .eq("is_active", true)
            .eq("city", city)
            .fetch_optional()
            .await
    }

    /// Find the active state-wide default (`city` is null), if any.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the query fails.
    pub async fn find_active_state_default(
        &self,
        country: &str,
        state: &str,
    ) -> Result<Option<ShippingRule>, StoreError> {
        self.store
            .query(TABLE)
            .eq("country", country)
            .eq("state", state)
            .eq("is_active", true)
            .is_null("city")
            .fetch_optional()
            .await
    }

    /// Check whether another active rule already covers this destination.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the query fails.
    pub async fn has_active_conflict(
        &self,
        country: &str,
        state: &str,
        city: Option<&str>,
        exclude: Option<RuleId>,
    ) -> Result<bool, StoreError> {
        let mut query = self
            .store
            .query(TABLE)
            .columns("id")
            .eq("country", country)
            .eq("state", state)
            .eq("is_active", true);

        query = match city {
            Some(city) => query.eq("city", city),
            None => query.is_null("city"),
        };

        if let Some(id) = exclude {
            query = query.neq("id", id);
        }

        let rows: Vec<serde_json::Value> = query.fetch().await?;
        Ok(!rows.is_empty())
    }

    /// Insert a rule and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the store's uniqueness constraint
    /// rejects the row.
    pub async fn create(&self, row: &ShippingRuleRow<'_>) -> Result<ShippingRule, StoreError> {
        self.store.insert_one(TABLE, row).await
    }

    /// Overwrite a rule's fields.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the update fails.
    pub async fn update(&self, id: RuleId, row: &ShippingRuleRow<'_>) -> Result<(), StoreError> {
        self.store
            .update(TABLE, serde_json::to_value(row)?)
            .eq("id", id)
            .execute()
            .await
    }

    /// Update just the cost fields of a rule.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the update fails.
    pub async fn set_cost(
        &self,
        id: RuleId,
        is_free: bool,
        base_cost: Decimal,
    ) -> Result<(), StoreError> {
        self.store
            .update(TABLE, json!({ "is_free": is_free, "base_cost": base_cost }))
            .eq("id", id)
            .execute()
            .await
    }

    /// Activate or deactivate a rule.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the update fails.
    pub async fn set_active(&self, id: RuleId, is_active: bool) -> Result<(), StoreError> {
        self.store
            .update(TABLE, json!({ "is_active": is_active }))
            .eq("id", id)
            .execute()
            .await
    }

    /// Delete a rule.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the delete fails.
    pub async fn delete(&self, id: RuleId) -> Result<(), StoreError> {
        self.store.delete(TABLE).eq("id", id).execute().await
    }
}
