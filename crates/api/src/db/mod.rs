//! Database operations for the `contentforge` schema.
//!
//! # Tables
//!
//! - `user` - Accounts (email + Argon2 password hash)
//! - `website` - Website profiles, sitemap index and business analysis
//! - `content` - Generated articles and pages
//! - `platform_config` - Shopify / WordPress / Search Console connections
//! - `pending_product_description` - Product copy awaiting review
//! - `published_product` - Descriptions written to Shopify (revert history)
//! - `tower_sessions.session` - Session storage
//!
//! Every record other than `user` hangs off a website, and every website
//! belongs to exactly one user. Repository methods that take a `UserId` scope
//! their query through that chain, so a foreign record reads as missing.
//!
//! Schema changes live in `crates/api/migrations/` and are applied with
//! `cf-cli migrate`.

pub mod contents;
pub mod platforms;
pub mod product_descriptions;
pub mod users;
pub mod websites;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use contents::ContentRepository;
pub use platforms::PlatformConfigRepository;
pub use product_descriptions::ProductDescriptionRepository;
pub use users::UserRepository;
pub use websites::WebsiteRepository;

const MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value no longer parses (e.g. a JSONB column).
    #[error("stored data is invalid: {0}")]
    DataCorruption(String),

    /// Missing, or owned by another user.
    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),
}

/// Map unique violations to `Conflict`, everything else to `Database`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Connect the shared pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if no connection can be opened.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    // Generation requests hold a connection only around their writes
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url.expose_secret())
        .await
}
