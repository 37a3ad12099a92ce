//! Admin session authorization.
//!
//! A user is an administrator iff an active grant row exists for their id.
//! Answers are cached per user for a short, configurable window so the
//! gate in front of every protected route does not hammer the record
//! store. The cache is the only mutable state here; entries are
//! last-write-wins recomputations of the same fact, so no locking beyond
//! the cache's own is needed. A grant change may take up to one TTL to be
//! observed by a live session - an accepted staleness window.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use thiserror::Error;
use tracing::{instrument, warn};

use guacamaya_core::{Email, UserId};

use crate::identity::{IdentityClient, IdentityError};
use crate::models::CurrentUser;
use crate::store::{AdminGrantRepository, StoreClient, StoreError};

// =============================================================================
// Cache
// =============================================================================

/// Cache of recent admin-check answers, keyed by user id.
///
/// Injectable so tests can substitute a deterministic double and so the
/// expiry policy stays a constructor parameter instead of a constant
/// buried in the authorizer.
pub trait AdminCache: Send + Sync {
    /// A previously stored answer for this user, if still valid.
    fn get(&self, user_id: UserId) -> Option<bool>;
    /// Store the answer for this user.
    fn insert(&self, user_id: UserId, is_admin: bool);
    /// Drop the entry for this user (logout).
    fn remove(&self, user_id: UserId);
    /// Drop every entry.
    fn clear(&self);
}

/// Moka-backed [`AdminCache`] with a per-entry time-to-live.
pub struct TtlAdminCache {
    entries: Cache<UserId, bool>,
}

impl TtlAdminCache {
    /// Create a cache whose entries expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(1024)
                .time_to_live(ttl)
                .build(),
        }
    }
}

impl AdminCache for TtlAdminCache {
    fn get(&self, user_id: UserId) -> Option<bool> {
        self.entries.get(&user_id)
    }

    fn insert(&self, user_id: UserId, is_admin: bool) {
        self.entries.insert(user_id, is_admin);
    }

    fn remove(&self, user_id: UserId) {
        self.entries.invalidate(&user_id);
    }

    fn clear(&self) {
        self.entries.invalidate_all();
    }
}

// =============================================================================
// Authorizer
// =============================================================================

/// Result of an admin check.
///
/// Boundary-safe: failures ride in `error`, the check itself never
/// returns `Err`. A missing session or missing grant is a plain negative,
/// not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminStatus {
    /// Whether the session belongs to an administrator.
    pub is_admin: bool,
    /// Set when the grant lookup itself failed.
    pub error: Option<String>,
}

impl AdminStatus {
    const fn denied() -> Self {
        Self {
            is_admin: false,
            error: None,
        }
    }

    const fn resolved(is_admin: bool) -> Self {
        Self {
            is_admin,
            error: None,
        }
    }

    const fn failed(message: String) -> Self {
        Self {
            is_admin: false,
            error: Some(message),
        }
    }
}

/// An identity that signed in and holds an active admin grant.
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin {
    /// Identity-provider user ID.
    pub user_id: UserId,
    /// Email on record.
    pub email: String,
    /// Identity-provider access token for this session.
    pub access_token: String,
}

/// Errors that can occur during login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The identity provider rejected the sign-in.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Credentials were fine, but no active admin grant exists.
    #[error("this account does not have administrator access")]
    NotAdmin,

    /// The grant lookup failed; the fresh session was terminated.
    #[error("could not verify administrator access: {0}")]
    Grants(StoreError),
}

/// Decides whether a session belongs to an administrator.
pub struct SessionAuthorizer {
    identity: IdentityClient,
    grants: AdminGrantRepository,
    cache: Arc<dyn AdminCache>,
}

impl SessionAuthorizer {
    /// Create a new authorizer.
    #[must_use]
    pub fn new(identity: IdentityClient, store: &StoreClient, cache: Arc<dyn AdminCache>) -> Self {
        Self {
            identity,
            grants: AdminGrantRepository::new(store),
            cache,
        }
    }

    /// Check whether the current session belongs to an administrator.
    ///
    /// No session is a plain negative, not an error. A cached answer for
    /// this user is returned without touching the record store; on a miss
    /// the grant lookup runs once and the answer - positive or negative -
    /// is cached. A failed lookup surfaces in `error` and is not cached,
    /// so the next check retries.
    #[instrument(skip_all)]
    pub async fn check_admin(&self, user: Option<&CurrentUser>) -> AdminStatus {
        let Some(user) = user else {
            return AdminStatus::denied();
        };

        if let Some(is_admin) = self.cache.get(user.id) {
            return AdminStatus::resolved(is_admin);
        }

        match self.grants.is_active_admin(user.id).await {
            Ok(is_admin) => {
                self.cache.insert(user.id, is_admin);
                AdminStatus::resolved(is_admin)
            }
            Err(error) => {
                warn!(%error, "admin grant lookup failed");
                AdminStatus::failed(error.to_string())
            }
        }
    }

    /// Sign in with password credentials and require an admin grant.
    ///
    /// The grant lookup always goes to the record store - a brand-new
    /// session cannot have a cache entry. An identity that authenticates
    /// but holds no active grant is signed out immediately and the login
    /// fails: a non-admin never keeps a live session in this console. On
    /// success the cache is primed for the user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Identity` for rejected credentials or provider
    /// failures, `AuthError::NotAdmin` for authenticated non-admins, and
    /// `AuthError::Grants` when the grant lookup itself failed.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<AuthenticatedAdmin, AuthError> {
        let session = self
            .identity
            .sign_in_with_password(email.as_str(), password)
            .await?;
        let user_id = session.user.id;

        let is_admin = match self.grants.is_active_admin(user_id).await {
            Ok(is_admin) => is_admin,
            Err(error) => {
                self.terminate(&session.access_token).await;
                return Err(AuthError::Grants(error));
            }
        };

        if !is_admin {
            self.terminate(&session.access_token).await;
            return Err(AuthError::NotAdmin);
        }

        self.cache.insert(user_id, true);

        Ok(AuthenticatedAdmin {
            user_id,
            email: session
                .user
                .email
                .unwrap_or_else(|| email.as_str().to_string()),
            access_token: session.access_token,
        })
    }

    /// End a session: best-effort identity sign-out plus cache removal
    /// for the user.
    #[instrument(skip_all)]
    pub async fn logout(&self, access_token: &str, user_id: UserId) {
        self.terminate(access_token).await;
        self.cache.remove(user_id);
    }

    async fn terminate(&self, access_token: &str) {
        if let Err(error) = self.identity.sign_out(access_token).await {
            warn!(%error, "identity sign-out failed");
        }
    }
}
