//! Accounts table.

use sqlx::PgPool;

use contentforge_core::{Email, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::User;

#[derive(sqlx::FromRow)]
struct UserWithPassword {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT id, email, created_at, updated_at
            FROM contentforge.user
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Insert an account. `password_hash` is already a PHC string.
    ///
    /// # Errors
    ///
    /// `Conflict` when the email is taken.
    pub async fn create_with_password(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r"
            INSERT INTO contentforge.user (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, created_at, updated_at
            ",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))
    }

    /// Account plus stored hash, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithPassword>(
            r"
            SELECT id, email, password_hash, created_at, updated_at
            FROM contentforge.user
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| (r.user, r.password_hash)))
    }
}
