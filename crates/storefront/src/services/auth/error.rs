//! Authentication error type.

use thiserror::Error;

use loomline_core::EmailError;

use crate::db::RepositoryError;

/// Errors from the authentication service.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email/password combination doesn't match a user.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A user with this email already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password doesn't meet requirements.
    #[error("{0}")]
    WeakPassword(String),

    /// Email address is invalid.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password and confirm-password do not match.
    #[error("password and confirm password do not match")]
    PasswordMismatch,

    /// Reset token is unknown or expired.
    #[error("reset token is invalid or has expired")]
    InvalidResetToken,

    /// Password hashing failed.
    #[error("password hashing error: {0}")]
    Hash(String),

    /// Underlying repository error.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}
