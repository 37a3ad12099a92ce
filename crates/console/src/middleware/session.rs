//! Session middleware configuration.
//!
//! Cookie sessions with strict security settings (SameSite=Strict, 24hr
//! inactivity expiry, signed). The store is in-process memory: a console
//! restart signs everyone out, which is acceptable for an internal tool
//! and keeps session state scoped to one running console - nothing is
//! persisted beyond it.

use secrecy::ExposeSecret;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::ConsoleConfig;

/// Session cookie name for the console.
pub const SESSION_COOKIE_NAME: &str = "guacamaya_console_session";

/// Session expiry time in seconds (24 hours).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer with an in-memory store.
///
/// # Panics
///
/// Panics if the session secret is shorter than the signing key minimum
/// (configuration validation enforces 32+ characters before this runs).
#[must_use]
pub fn create_session_layer(
    config: &ConsoleConfig,
) -> SessionManagerLayer<MemoryStore, SignedCookie> {
    let store = MemoryStore::default();

    // Determine if we're in production (HTTPS)
    let is_secure = config.base_url.starts_with("https://");

    let key = Key::derive_from(config.session_secret.expose_secret().as_bytes());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key)
}
