//! Accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use contentforge_core::{Email, UserId};

/// An account; every website belongs to exactly one. The password hash is
/// only ever read by the login query.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
