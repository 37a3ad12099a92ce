//! Unified error handling for the console.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::identity::IdentityError;
use crate::services::authorizer::AuthError;
use crate::services::bank_accounts::BankAccountWriteError;
use crate::services::categories::CategoryWriteError;
use crate::services::shipping::RuleWriteError;
use crate::store::StoreError;

/// Application-level error type for the console.
#[derive(Debug, Error)]
pub enum AppError {
    /// Record store operation failed.
    #[error("record store error: {0}")]
    Store(StoreError),

    /// Identity provider operation failed.
    #[error("identity provider error: {0}")]
    Identity(IdentityError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Write rejected to protect an invariant.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => Self::NotFound("row not found".to_string()),
            StoreError::Conflict(message) | StoreError::ForeignKey(message) => {
                Self::Conflict(message)
            }
            other => Self::Store(other),
        }
    }
}

impl From<RuleWriteError> for AppError {
    fn from(error: RuleWriteError) -> Self {
        match error {
            RuleWriteError::Validation(message) => Self::BadRequest(message),
            RuleWriteError::Duplicate => Self::Conflict(error.to_string()),
            RuleWriteError::Store(store) => store.into(),
        }
    }
}

impl From<CategoryWriteError> for AppError {
    fn from(error: CategoryWriteError) -> Self {
        match error {
            CategoryWriteError::Validation(message) => Self::BadRequest(message),
            CategoryWriteError::Duplicate | CategoryWriteError::InUse => {
                Self::Conflict(error.to_string())
            }
            CategoryWriteError::Store(store) => store.into(),
        }
    }
}

impl From<BankAccountWriteError> for AppError {
    fn from(error: BankAccountWriteError) -> Self {
        match error {
            BankAccountWriteError::Validation(message) => Self::BadRequest(message),
            BankAccountWriteError::SoleActiveAccount => Self::Conflict(error.to_string()),
            BankAccountWriteError::Store(store) => store.into(),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Identity(IdentityError::InvalidCredentials) => {
                Self::Unauthorized("incorrect email or password".to_string())
            }
            AuthError::Identity(other) => Self::Identity(other),
            AuthError::NotAdmin => Self::Forbidden(error.to_string()),
            AuthError::Grants(store) => Self::Store(store),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(self, Self::Store(_) | Self::Identity(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Console request error"
            );
        }

        let status = match &self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(_) | Self::Identity(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Store(_) | Self::Identity(_) => "External service error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order-123".to_string());
        assert_eq!(err.to_string(), "Not found: order-123");

        let err = AppError::Conflict("duplicate rule".to_string());
        assert_eq!(err.to_string(), "Conflict: duplicate rule");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_not_found_maps_to_404() {
        assert_eq!(
            get_status(AppError::from(StoreError::NotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_store_conflict_maps_to_409() {
        assert_eq!(
            get_status(AppError::from(StoreError::Conflict("dup".to_string()))),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_invalid_credentials_map_to_401() {
        let err = AppError::from(AuthError::Identity(IdentityError::InvalidCredentials));
        assert_eq!(get_status(err), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_not_admin_maps_to_403() {
        assert_eq!(
            get_status(AppError::from(AuthError::NotAdmin)),
            StatusCode::FORBIDDEN
        );
    }
}
