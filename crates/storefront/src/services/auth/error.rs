//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] liher_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Account exists but the activation link was never followed.
    #[error("account not activated")]
    AccountInactive,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Activation or reset token is malformed, expired, or stale.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Repository/database error.
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl From<liher_core::password::PasswordError> for AuthError {
    fn from(e: liher_core::password::PasswordError) -> Self {
        use liher_core::password::PasswordError;
        match e {
            PasswordError::Weak(msg) => Self::WeakPassword(msg),
            PasswordError::Mismatch => Self::PasswordMismatch,
            PasswordError::Hash => Self::PasswordHash,
        }
    }
}
