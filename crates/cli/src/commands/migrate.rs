//! Database migration command.
//!
//! ```bash
//! cf-cli migrate
//! ```
//!
//! Migrations live in `crates/api/migrations/` and are embedded at build
//! time.

use thiserror::Error;

use super::{CommandError, connect};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all pending migrations.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
