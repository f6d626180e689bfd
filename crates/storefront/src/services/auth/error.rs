//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] bazaar_core::EmailError),

    /// Display name missing.
    #[error("name must not be empty")]
    MissingName,

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Current password given for a password change is wrong.
    #[error("current password is incorrect")]
    IncorrectPassword,

    /// New password and its confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// A required address field is blank.
    #[error("address field missing: {0}")]
    InvalidAddress(&'static str),

    /// The user already has an address of this type.
    #[error("{0} address already exists")]
    DuplicateAddressType(String),

    /// No saved address with this ID for the user.
    #[error("address not found")]
    AddressNotFound,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
