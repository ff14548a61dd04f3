//! Subcommand implementations.

pub mod crawl;
pub mod migrate;
pub mod user;

use contentforge_api::config::{ConfigError, database_url_from_env};
use contentforge_api::db;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by the database-backed commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration missing or invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect using `API_DATABASE_URL` (or `DATABASE_URL`).
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();
    let database_url = database_url_from_env()?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&database_url).await?)
}
