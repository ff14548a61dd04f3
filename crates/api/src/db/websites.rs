//! Website repository.
//!
//! All reads and writes are scoped to the owning user.

use sqlx::PgPool;
use sqlx::types::Json;

use contentforge_core::{UserId, WebsiteId};

use super::RepositoryError;
use crate::crawler::SitemapUrl;
use crate::models::{BusinessAnalysis, NewWebsite, Website, WebsiteUpdate};

/// Repository for website profiles.
pub struct WebsiteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WebsiteRepository<'a> {
    /// Create a new website repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's websites, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Website>, RepositoryError> {
        let websites = sqlx::query_as::<_, Website>(
            r"
            SELECT * FROM contentforge.website
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(websites)
    }

    /// Get a website owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the website does not exist or
    /// belongs to another user.
    pub async fn get(&self, user_id: UserId, id: WebsiteId) -> Result<Website, RepositoryError> {
        sqlx::query_as::<_, Website>(
            r"
            SELECT * FROM contentforge.website
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Insert a website. `url` must already be normalised.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &NewWebsite,
        url: &str,
    ) -> Result<Website, RepositoryError> {
        let website = sqlx::query_as::<_, Website>(
            r"
            INSERT INTO contentforge.website
                (user_id, name, url, description, industry, target_audience, tone,
                 language, sitemap_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, 'en'), $9)
            RETURNING *
            ",
        )
        .bind(user_id)
        .bind(input.name.trim())
        .bind(url)
        .bind(&input.description)
        .bind(&input.industry)
        .bind(&input.target_audience)
        .bind(&input.tone)
        .bind(&input.language)
        .bind(&input.sitemap_url)
        .fetch_one(self.pool)
        .await?;

        Ok(website)
    }

    /// Apply a partial update. `url`, when set, must already be normalised.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the website is not the user's.
    pub async fn update(
        &self,
        user_id: UserId,
        id: WebsiteId,
        update: &WebsiteUpdate,
    ) -> Result<Website, RepositoryError> {
        sqlx::query_as::<_, Website>(
            r"
            UPDATE contentforge.website SET
                name = COALESCE($3, name),
                url = COALESCE($4, url),
                description = COALESCE($5, description),
                industry = COALESCE($6, industry),
                target_audience = COALESCE($7, target_audience),
                tone = COALESCE($8, tone),
                language = COALESCE($9, language),
                sitemap_url = COALESCE($10, sitemap_url),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(&update.url)
        .bind(&update.description)
        .bind(&update.industry)
        .bind(&update.target_audience)
        .bind(&update.tone)
        .bind(&update.language)
        .bind(&update.sitemap_url)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a website and everything that references it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the website is not the user's.
    pub async fn delete(&self, user_id: UserId, id: WebsiteId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM contentforge.website
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Store the result of a sitemap index run.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the website no longer exists.
    pub async fn save_sitemap(
        &self,
        id: WebsiteId,
        urls: &[SitemapUrl],
    ) -> Result<Website, RepositoryError> {
        sqlx::query_as::<_, Website>(
            r"
            UPDATE contentforge.website
            SET sitemap_urls = $2, indexed_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(Json(urls))
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Store a business analysis.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the website no longer exists.
    pub async fn save_analysis(
        &self,
        id: WebsiteId,
        analysis: &BusinessAnalysis,
    ) -> Result<Website, RepositoryError> {
        sqlx::query_as::<_, Website>(
            r"
            UPDATE contentforge.website
            SET analysis = $2, analyzed_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(Json(analysis))
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}
