//! Session types for the console.

use serde::{Deserialize, Serialize};

use guacamaya_core::UserId;

/// The signed-in user stored in the cookie session.
///
/// Holding the identity-provider access token here lets logout revoke the
/// upstream session, not just the cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Identity-provider user ID.
    pub id: UserId,
    /// Email the user signed in with.
    pub email: String,
    /// Identity-provider access token for this session.
    pub access_token: String,
}

/// Keys used for session storage.
pub mod session_keys {
    /// Session key for the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";
}
