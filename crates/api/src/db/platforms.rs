//! Platform connection repository.

use sqlx::PgPool;
use sqlx::types::Json;

use contentforge_core::{Platform, WebsiteId};

use super::RepositoryError;
use crate::models::{PlatformConfig, PlatformConfigInput};

/// Repository for per-website platform connections.
pub struct PlatformConfigRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PlatformConfigRepository<'a> {
    /// Create a new platform config repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a website's connections.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, website_id: WebsiteId) -> Result<Vec<PlatformConfig>, RepositoryError> {
        let configs = sqlx::query_as::<_, PlatformConfig>(
            r"
            SELECT * FROM contentforge.platform_config
            WHERE website_id = $1
            ORDER BY platform
            ",
        )
        .bind(website_id)
        .fetch_all(self.pool)
        .await?;

        Ok(configs)
    }

    /// Get the connection for one platform.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the website is not connected.
    pub async fn get(
        &self,
        website_id: WebsiteId,
        platform: Platform,
    ) -> Result<PlatformConfig, RepositoryError> {
        sqlx::query_as::<_, PlatformConfig>(
            r"
            SELECT * FROM contentforge.platform_config
            WHERE website_id = $1 AND platform = $2
            ",
        )
        .bind(website_id)
        .bind(platform)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Insert or replace a connection. A missing `secret` keeps the stored one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert(
        &self,
        website_id: WebsiteId,
        platform: Platform,
        input: &PlatformConfigInput,
    ) -> Result<PlatformConfig, RepositoryError> {
        let settings = input
            .settings
            .clone()
            .unwrap_or_else(|| serde_json::json!({}));

        let config = sqlx::query_as::<_, PlatformConfig>(
            r"
            INSERT INTO contentforge.platform_config
                (website_id, platform, base_url, username, secret, settings)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (website_id, platform) DO UPDATE SET
                base_url = EXCLUDED.base_url,
                username = EXCLUDED.username,
                secret = COALESCE(EXCLUDED.secret, contentforge.platform_config.secret),
                settings = EXCLUDED.settings,
                updated_at = NOW()
            RETURNING *
            ",
        )
        .bind(website_id)
        .bind(platform)
        .bind(input.base_url.trim())
        .bind(&input.username)
        .bind(&input.secret)
        .bind(Json(settings))
        .fetch_one(self.pool)
        .await?;

        Ok(config)
    }

    /// Remove a connection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there was nothing to delete.
    pub async fn delete(
        &self,
        website_id: WebsiteId,
        platform: Platform,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM contentforge.platform_config
            WHERE website_id = $1 AND platform = $2
            ",
        )
        .bind(website_id)
        .bind(platform)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
