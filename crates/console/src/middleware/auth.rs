//! Admin gate for protected routes.
//!
//! Provides the extractor that fronts every protected handler.

use axum::Json;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{StatusCode, request::Parts};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Extractor that admits only sessions holding an active admin grant.
///
/// The check runs before the handler, so protected content is never
/// produced for a session that fails it. A signed-in session whose grant
/// is missing, revoked, or unverifiable is destroyed on the spot - a
/// stale cookie cannot keep riding past the authorizer's cache window.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdmin(user): RequireAdmin,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAdmin(pub CurrentUser);

/// Error returned when the admin gate turns a request away.
pub enum AdminGateRejection {
    /// No session, or nobody signed in.
    Unauthenticated,
    /// Signed in, but no active admin grant (or the check errored).
    Forbidden,
}

impl IntoResponse for AdminGateRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, "authentication required"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "administrator access required"),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AdminGateRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AdminGateRejection::Unauthenticated)?;

        let user: Option<CurrentUser> = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();

        let status = state.authorizer().check_admin(user.as_ref()).await;

        match user {
            Some(user) if status.is_admin => Ok(Self(user)),
            Some(_) => {
                // Grant missing, revoked, or unverifiable: end the session.
                let _ = session.flush().await;
                Err(AdminGateRejection::Forbidden)
            }
            None => Err(AdminGateRejection::Unauthenticated),
        }
    }
}

/// Helper to store the signed-in user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}
