//! Account errors.

use thiserror::Error;

use crate::db::RepositoryError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] contentforge_core::EmailError),

    /// Unknown email and wrong password look the same to the caller.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("an account with this email already exists")]
    UserAlreadyExists,

    #[error("{0}")]
    WeakPassword(String),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("password hashing failed")]
    PasswordHash,
}
