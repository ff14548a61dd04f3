//! Email and password accounts.
//!
//! Hashes are Argon2id PHC strings with the crate's default parameters.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use contentforge_core::Email;

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

const MIN_PASSWORD_LENGTH: usize = 8;
/// Upper bound so a request cannot make hashing arbitrarily slow.
const MAX_PASSWORD_LENGTH: usize = 1024;

pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// `InvalidEmail`, `WeakPassword`, or `UserAlreadyExists` when the
    /// address is taken.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        self.users
            .create_with_password(&email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Check credentials and return the account.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` for an unknown email, a malformed email or a
    /// wrong password alike.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let Some((user, stored)) = self.users.get_password_hash(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        verify_password(password, &stored)?;
        Ok(user)
    }
}

/// Length check, counted in characters.
///
/// # Errors
///
/// `WeakPassword` naming the bound.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Argon2id PHC string for `password`.
///
/// # Errors
///
/// `PasswordHash` if the hasher fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

fn verify_password(password: &str, stored: &str) -> Result<(), AuthError> {
    // A corrupt stored hash reads as a failed login
    let parsed = PasswordHash::new(stored).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_bounds() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
        assert!(validate_password(&"x".repeat(MAX_PASSWORD_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse battery").expect("hash");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
