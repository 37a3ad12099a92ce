//! Shipping cost resolution and rule management.
//!
//! Read side: [`ShippingResolver`] turns a destination into a
//! [`ShippingQuote`], preferring a city-level rule over the state-wide
//! default. Write side: [`ShippingRuleService`] owns validation and
//! duplicate prevention for the management screen.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{instrument, warn};

use guacamaya_core::{Destination, RuleId};

use crate::models::{ShippingRule, ShippingRuleDraft};
use crate::store::shipping_rules::{RuleListParams, ShippingRuleRow};
use crate::store::{ShippingRuleRepository, StoreClient, StoreError};

// =============================================================================
// Resolution
// =============================================================================

/// Outcome of resolving shipping for a destination.
///
/// Always well-formed: a failed lookup becomes an unavailable quote with a
/// generic message, never an error the caller has to handle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShippingQuote {
    /// Whether any rule covers the destination.
    pub available: bool,
    /// Cost to charge; 0 when free or unavailable.
    pub cost: Decimal,
    /// Whether the matched rule grants free shipping.
    pub is_free: bool,
    /// The matched rule, when one was found.
    pub rule_id: Option<RuleId>,
    /// Human-readable summary for the checkout screen.
    pub message: String,
}

impl ShippingQuote {
    fn from_rule(rule: &ShippingRule) -> Self {
        let cost = if rule.is_free {
            Decimal::ZERO
        } else {
            rule.base_cost
        };
        let message = if rule.is_free {
            "Free shipping".to_string()
        } else {
            format!("Shipping cost: ${cost:.2}")
        };

        Self {
            available: true,
            cost,
            is_free: rule.is_free,
            rule_id: Some(rule.id),
            message,
        }
    }

    fn unavailable() -> Self {
        Self {
            available: false,
            cost: Decimal::ZERO,
            is_free: false,
            rule_id: None,
            message: "Shipping is not available for this destination".to_string(),
        }
    }

    fn lookup_failed() -> Self {
        Self {
            available: false,
            cost: Decimal::ZERO,
            is_free: false,
            rule_id: None,
            message: "Unable to calculate shipping cost".to_string(),
        }
    }
}

/// Resolves a shipping quote for a destination.
///
/// Stateless and purely a read; safe to call repeatedly and concurrently.
pub struct ShippingResolver {
    rules: ShippingRuleRepository,
}

impl ShippingResolver {
    /// Create a new resolver.
    #[must_use]
    pub fn new(store: &StoreClient) -> Self {
        Self {
            rules: ShippingRuleRepository::new(store),
        }
    }

    /// Resolve a quote, first match wins:
    ///
    /// 1. an active rule for the exact city, when a city was given;
    /// 2. the active state-wide default;
    /// 3. otherwise the destination is unavailable.
    ///
    /// Lookup failures are caught here and surface as an unavailable quote
    /// with a generic message.
    #[instrument(skip(self), fields(destination = %destination))]
    pub async fn resolve(&self, destination: &Destination) -> ShippingQuote {
        match self.find_rule(destination).await {
            Ok(Some(rule)) => ShippingQuote::from_rule(&rule),
            Ok(None) => ShippingQuote::unavailable(),
            Err(error) => {
                warn!(%error, "shipping rule lookup failed");
                ShippingQuote::lookup_failed()
            }
        }
    }

    async fn find_rule(
        &self,
        destination: &Destination,
    ) -> Result<Option<ShippingRule>, StoreError> {
        if let Some(city) = destination.city()
            && let Some(rule) = self
                .rules
                .find_active_city_rule(destination.country(), destination.state(), city)
                .await?
        {
            return Ok(Some(rule));
        }

        self.rules
            .find_active_state_default(destination.country(), destination.state())
            .await
    }
}

// =============================================================================
// Rule management
// =============================================================================

/// Errors that can occur when writing shipping rules.
#[derive(Debug, Error)]
pub enum RuleWriteError {
    /// Form input failed validation; no write happened.
    #[error("{0}")]
    Validation(String),

    /// An active rule already covers this `(country, state, city)`.
    #[error("an active rule already exists for this country, state and city")]
    Duplicate,

    /// The record store rejected the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A rule draft that passed validation and normalization.
struct ValidatedRule {
    country: String,
    state: String,
    city: Option<String>,
    is_free: bool,
    base_cost: Decimal,
    notes: Option<String>,
    is_active: bool,
}

impl ValidatedRule {
    fn from_draft(draft: &ShippingRuleDraft) -> Result<Self, RuleWriteError> {
        let country = draft.country.trim();
        if country.is_empty() {
            return Err(RuleWriteError::Validation("country is required".to_string()));
        }

        let state = draft.state.trim();
        if state.is_empty() {
            return Err(RuleWriteError::Validation("state is required".to_string()));
        }

        let base_cost = normalize_cost(draft.is_free, draft.base_cost)?;
        let city = non_empty(&draft.city);
        let notes = non_empty(&draft.notes);

        Ok(Self {
            country: country.to_string(),
            state: state.to_string(),
            city,
            is_free: draft.is_free,
            base_cost,
            notes,
            is_active: draft.is_active,
        })
    }

    fn as_row(&self) -> ShippingRuleRow<'_> {
        ShippingRuleRow {
            country: &self.country,
            state: &self.state,
            city: self.city.as_deref(),
            is_free: self.is_free,
            base_cost: self.base_cost,
            notes: self.notes.as_deref(),
            is_active: self.is_active,
        }
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Free rules always store a zero cost; paid rules must not be negative.
fn normalize_cost(is_free: bool, base_cost: Decimal) -> Result<Decimal, RuleWriteError> {
    if is_free {
        return Ok(Decimal::ZERO);
    }
    if base_cost.is_sign_negative() {
        return Err(RuleWriteError::Validation(
            "shipping cost cannot be negative".to_string(),
        ));
    }
    Ok(base_cost)
}

/// Treat the store's uniqueness constraint as the same duplicate error the
/// pre-check produces - the constraint is authoritative, the pre-check is
/// the friendly fast path.
fn store_conflict_as_duplicate(error: StoreError) -> RuleWriteError {
    match error {
        StoreError::Conflict(_) => RuleWriteError::Duplicate,
        other => RuleWriteError::Store(other),
    }
}

/// Write-side operations on shipping rules.
pub struct ShippingRuleService {
    rules: ShippingRuleRepository,
}

impl ShippingRuleService {
    /// Create a new rule service.
    #[must_use]
    pub fn new(store: &StoreClient) -> Self {
        Self {
            rules: ShippingRuleRepository::new(store),
        }
    }

    /// List rules for the management screen.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the query fails.
    pub async fn list(
        &self,
        params: &RuleListParams,
    ) -> Result<(Vec<ShippingRule>, u64), StoreError> {
        self.rules.list(params).await
    }

    /// Create a rule.
    ///
    /// # Errors
    ///
    /// Returns `RuleWriteError::Validation` for bad input,
    /// `RuleWriteError::Duplicate` when an active rule already covers the
    /// destination, or a store error.
    #[instrument(skip_all)]
    pub async fn create(&self, draft: &ShippingRuleDraft) -> Result<ShippingRule, RuleWriteError> {
        let rule = ValidatedRule::from_draft(draft)?;

        if rule.is_active
            && self
                .rules
                .has_active_conflict(&rule.country, &rule.state, rule.city.as_deref(), None)
                .await?
        {
            return Err(RuleWriteError::Duplicate);
        }

        self.rules
            .create(&rule.as_row())
            .await
            .map_err(store_conflict_as_duplicate)
    }

    /// Overwrite a rule.
    ///
    /// # Errors
    ///
    /// As [`Self::create`]; the edited rule itself is excluded from the
    /// duplicate check.
    #[instrument(skip_all, fields(rule = %id))]
    pub async fn update(
        &self,
        id: RuleId,
        draft: &ShippingRuleDraft,
    ) -> Result<(), RuleWriteError> {
        let rule = ValidatedRule::from_draft(draft)?;

        if rule.is_active
            && self
                .rules
                .has_active_conflict(&rule.country, &rule.state, rule.city.as_deref(), Some(id))
                .await?
        {
            return Err(RuleWriteError::Duplicate);
        }

        self.rules
            .update(id, &rule.as_row())
            .await
            .map_err(store_conflict_as_duplicate)
    }

    /// Update just the cost fields of a rule.
    ///
    /// # Errors
    ///
    /// Returns `RuleWriteError::Validation` for a negative cost, or a
    /// store error.
    pub async fn set_cost(
        &self,
        id: RuleId,
        is_free: bool,
        base_cost: Decimal,
    ) -> Result<(), RuleWriteError> {
        let cost = normalize_cost(is_free, base_cost)?;
        self.rules.set_cost(id, is_free, cost).await?;
        Ok(())
    }

    /// Activate or deactivate a rule.
    ///
    /// Activation re-checks the duplicate invariant; deactivation never
    /// blocks, even for a state's only default - the resolver simply
    /// reports that state unavailable afterwards.
    ///
    /// # Errors
    ///
    /// Returns `RuleWriteError::Duplicate` when activation would create a
    /// second active rule for the destination, or a store error.
    #[instrument(skip(self), fields(rule = %id))]
    pub async fn set_active(&self, id: RuleId, is_active: bool) -> Result<(), RuleWriteError> {
        if is_active {
            let rule = self.rules.get(id).await?;
            if self
                .rules
                .has_active_conflict(&rule.country, &rule.state, rule.city.as_deref(), Some(id))
                .await?
            {
                return Err(RuleWriteError::Duplicate);
            }
        }

        self.rules.set_active(id, is_active).await?;
        Ok(())
    }

    /// Delete a rule.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the delete fails.
    pub async fn delete(&self, id: RuleId) -> Result<(), StoreError> {
        self.rules.delete(id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn rule(is_free: bool, base_cost: &str) -> ShippingRule {
        ShippingRule {
            id: RuleId::new(Uuid::new_v4()),
            country: "Venezuela".to_string(),
            state: "Zulia".to_string(),
            city: None,
            is_free,
            base_cost: base_cost.parse().unwrap(),
            is_active: true,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn draft(country: &str, state: &str, city: &str) -> ShippingRuleDraft {
        ShippingRuleDraft {
            country: country.to_string(),
            state: state.to_string(),
            city: city.to_string(),
            is_free: false,
            base_cost: "5.00".parse().unwrap(),
            notes: String::new(),
            is_active: true,
        }
    }

    #[test]
    fn test_quote_from_paid_rule() {
        let rule = rule(false, "5.00");
        let quote = ShippingQuote::from_rule(&rule);
        assert!(quote.available);
        assert!(!quote.is_free);
        assert_eq!(quote.cost, "5.00".parse().unwrap());
        assert_eq!(quote.rule_id, Some(rule.id));
        assert_eq!(quote.message, "Shipping cost: $5.00");
    }

    #[test]
    fn test_quote_from_free_rule_ignores_stored_cost() {
        // A stale base_cost on a free rule must not leak into the quote.
        let rule = rule(true, "12.50");
        let quote = ShippingQuote::from_rule(&rule);
        assert!(quote.available);
        assert!(quote.is_free);
        assert_eq!(quote.cost, Decimal::ZERO);
        assert_eq!(quote.message, "Free shipping");
    }

    #[test]
    fn test_quote_unavailable_has_zero_cost() {
        let quote = ShippingQuote::unavailable();
        assert!(!quote.available);
        assert_eq!(quote.cost, Decimal::ZERO);
        assert!(quote.rule_id.is_none());
    }

    #[test]
    fn test_validated_rule_requires_country_and_state() {
        let result = ValidatedRule::from_draft(&draft("  ", "Zulia", ""));
        assert!(matches!(result, Err(RuleWriteError::Validation(_))));

        let result = ValidatedRule::from_draft(&draft("Venezuela", "", ""));
        assert!(matches!(result, Err(RuleWriteError::Validation(_))));
    }

    #[test]
    fn test_validated_rule_normalizes_city() {
        let rule = ValidatedRule::from_draft(&draft("Venezuela", "Zulia", "  Maracaibo ")).unwrap();
        assert_eq!(rule.city.as_deref(), Some("Maracaibo"));

        let statewide = ValidatedRule::from_draft(&draft("Venezuela", "Zulia", "   ")).unwrap();
        assert_eq!(statewide.city, None);
    }

    #[test]
    fn test_free_rule_forces_zero_cost() {
        let mut d = draft("Venezuela", "Zulia", "");
        d.is_free = true;
        d.base_cost = "9.99".parse().unwrap();
        let rule = ValidatedRule::from_draft(&d).unwrap();
        assert_eq!(rule.base_cost, Decimal::ZERO);
    }

    #[test]
    fn test_negative_cost_rejected() {
        let mut d = draft("Venezuela", "Zulia", "");
        d.base_cost = "-1.00".parse().unwrap();
        let result = ValidatedRule::from_draft(&d);
        assert!(matches!(result, Err(RuleWriteError::Validation(_))));
    }

    #[test]
    fn test_store_conflict_becomes_duplicate() {
        let err = store_conflict_as_duplicate(StoreError::Conflict("23505".to_string()));
        assert!(matches!(err, RuleWriteError::Duplicate));

        let err = store_conflict_as_duplicate(StoreError::NotFound);
        assert!(matches!(err, RuleWriteError::Store(StoreError::NotFound)));
    }
}
