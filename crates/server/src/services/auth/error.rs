//! Authentication error types.

use thiserror::Error;

use moostyle_core::EmailError;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email format is invalid.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password doesn't meet strength requirements.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// An account with this email already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Email/password pair is wrong.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No account for this identifier.
    #[error("user not found")]
    UserNotFound,

    /// The account has been deactivated by an admin.
    #[error("account disabled")]
    AccountDisabled,

    /// The account is banned.
    #[error("account banned")]
    AccountBanned,

    /// Verification code doesn't match any outstanding code.
    #[error("invalid verification code")]
    CodeInvalid,

    /// Verification code matched but has expired.
    #[error("verification code expired")]
    CodeExpired,

    /// Password hashing failed.
    #[error("password hashing failed")]
    PasswordHash,

    /// Database operation failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}
