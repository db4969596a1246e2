//! Unified error handling.
//!
//! Provides a unified `AppError` type that maps every layer's errors to an
//! HTTP status and the `{success, message}` JSON envelope. All route
//! handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::response::ApiResponse;
use crate::services::auth::AuthError;
use crate::services::rewards::RewardsError;

/// Application-level error type for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart download / point award failed.
    #[error("Rewards error: {0}")]
    Rewards(#[from] RewardsError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::UserNotFound
                | AuthError::AccountDisabled
                | AuthError::AccountBanned => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::CodeInvalid
                | AuthError::CodeExpired => StatusCode::BAD_REQUEST,
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Rewards(err) => match err {
                RewardsError::EmptyCart | RewardsError::TooManyItems { .. } => {
                    StatusCode::BAD_REQUEST
                }
                RewardsError::Cooldown { .. } => StatusCode::TOO_MANY_REQUESTS,
                RewardsError::UserNotFound => StatusCode::NOT_FOUND,
                RewardsError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing message. Internal details are never exposed.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "Invalid credentials".to_string()
                }
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::AccountDisabled => "This account has been deactivated".to_string(),
                AuthError::AccountBanned => "This account has been banned".to_string(),
                AuthError::CodeInvalid => "Invalid verification code".to_string(),
                AuthError::CodeExpired => {
                    "Verification code expired, request a new one".to_string()
                }
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    "Internal server error".to_string()
                }
            },
            Self::Rewards(err) => match err {
                RewardsError::EmptyCart => "Cart is empty".to_string(),
                RewardsError::TooManyItems { count } => {
                    format!("Cart has too many items to download at once ({count})")
                }
                RewardsError::Cooldown {
                    retry_after_seconds,
                } => format!(
                    "Please wait {retry_after_seconds} seconds before downloading again"
                ),
                RewardsError::UserNotFound => "User not found".to_string(),
                RewardsError::Repository(_) => "Internal server error".to_string(),
            },
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::Unauthorized(_) => "Authentication required".to_string(),
            Self::Forbidden(_) => "You do not have permission to do that".to_string(),
            Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with full detail before the message is redacted
        if self.status().is_server_error() {
            tracing::error!(error = %self, "Request error");
        }

        let status = self.status();
        let body = ApiResponse::error(self.client_message());
        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("mod-123".to_string());
        assert_eq!(err.to_string(), "Not found: mod-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("x".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized("x".to_string()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("x".to_string()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Internal("x".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_cooldown_maps_to_429() {
        let err = AppError::Rewards(RewardsError::Cooldown {
            retry_after_seconds: 120,
        });
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(err.client_message().contains("120"));
    }

    #[test]
    fn test_empty_cart_maps_to_400() {
        let err = AppError::Rewards(RewardsError::EmptyCart);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = AppError::Internal("connection pool exhausted".to_string());
        assert_eq!(err.client_message(), "Internal server error");
    }
}
