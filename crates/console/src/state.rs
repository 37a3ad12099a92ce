//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ConsoleConfig;
use crate::identity::IdentityClient;
use crate::services::authorizer::{SessionAuthorizer, TtlAdminCache};
use crate::services::bank_accounts::BankAccountService;
use crate::services::categories::CategoryService;
use crate::services::shipping::{ShippingResolver, ShippingRuleService};
use crate::store::{OrderRepository, StoreClient};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Long-lived pieces (clients, the
/// authorizer with its cache) live here; services are constructed on
/// demand since they only wrap a client clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ConsoleConfig,
    store: StoreClient,
    authorizer: SessionAuthorizer,
}

impl AppState {
    /// Create a new application state from configuration.
    #[must_use]
    pub fn new(config: ConsoleConfig) -> Self {
        let store = StoreClient::new(&config.record_store);
        let identity = IdentityClient::new(&config.record_store);
        let cache = Arc::new(TtlAdminCache::new(config.admin_cache_ttl));
        let authorizer = SessionAuthorizer::new(identity, &store, cache);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                authorizer,
            }),
        }
    }

    /// Get a reference to the console configuration.
    #[must_use]
    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    /// Get a reference to the record store client.
    #[must_use]
    pub fn store(&self) -> &StoreClient {
        &self.inner.store
    }

    /// Get a reference to the session authorizer.
    #[must_use]
    pub fn authorizer(&self) -> &SessionAuthorizer {
        &self.inner.authorizer
    }

    /// Shipping quote resolver.
    #[must_use]
    pub fn shipping_resolver(&self) -> ShippingResolver {
        ShippingResolver::new(self.store())
    }

    /// Shipping rule management service.
    #[must_use]
    pub fn shipping_rules(&self) -> ShippingRuleService {
        ShippingRuleService::new(self.store())
    }

    /// Order repository.
    #[must_use]
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.store())
    }

    /// Category management service.
    #[must_use]
    pub fn categories(&self) -> CategoryService {
        CategoryService::new(self.store())
    }

    /// Bank account management service.
    #[must_use]
    pub fn bank_accounts(&self) -> BankAccountService {
        BankAccountService::new(self.store())
    }
}
