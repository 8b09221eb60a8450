//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] avoi_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid email or password")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("email already registered")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Account has been deactivated.
    #[error("account is deactivated")]
    AccountDeactivated,

    /// Email address has not been verified yet.
    #[error("please verify your email address before logging in")]
    EmailNotVerified,

    /// Supplied verification token doesn't match the stored one.
    #[error("invalid verification token")]
    InvalidVerificationToken,

    /// Bearer token has expired.
    #[error("token has expired")]
    TokenExpired,

    /// Bearer token is malformed or has a bad signature.
    #[error("invalid token")]
    TokenInvalid,

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
