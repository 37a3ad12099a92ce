//! Authentication route handlers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use guacamaya_core::{Email, UserId};

use crate::error::AppError;
use crate::middleware::{RequireAdmin, set_current_user};
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/api/session", get(current_session))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    user_id: UserId,
    email: String,
    is_admin: bool,
}

/// Sign in with email and password.
///
/// POST /auth/login
///
/// Authenticated identities without an active admin grant are signed out
/// upstream and rejected here with 403 - they never keep a session.
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let email = Email::parse(&request.email).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let admin = state.authorizer().login(&email, &request.password).await?;

    let user = CurrentUser {
        id: admin.user_id,
        email: admin.email.clone(),
        access_token: admin.access_token,
    };
    set_current_user(&session, &user)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(SessionResponse {
        user_id: admin.user_id,
        email: admin.email,
        is_admin: true,
    }))
}

/// Sign out: revoke the identity session, drop the cached admin status,
/// and destroy the cookie session.
///
/// POST /auth/logout
async fn logout(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    if let Ok(Some(user)) = session.get::<CurrentUser>(session_keys::CURRENT_USER).await {
        state.authorizer().logout(&user.access_token, user.id).await;
    }
    let _ = session.flush().await;

    StatusCode::NO_CONTENT
}

/// Current admin identity, for the SPA shell on load.
///
/// GET /api/session
async fn current_session(RequireAdmin(user): RequireAdmin) -> Json<SessionResponse> {
    Json(SessionResponse {
        user_id: user.id,
        email: user.email,
        is_admin: true,
    })
}
