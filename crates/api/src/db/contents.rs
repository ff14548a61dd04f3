//! Content repository.

use sqlx::PgPool;

use contentforge_core::{ContentId, ContentStatus, Platform, UserId, WebsiteId};

use super::RepositoryError;
use crate::models::{Content, ContentUpdate, NewContent};

/// Where a content item was published.
#[derive(Debug, Clone)]
pub struct PublishTarget {
    pub platform: Platform,
    pub external_id: String,
    pub external_url: Option<String>,
}

/// Repository for content items.
pub struct ContentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContentRepository<'a> {
    /// Create a new content repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a website's contents, newest first, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_website(
        &self,
        website_id: WebsiteId,
        status: Option<ContentStatus>,
    ) -> Result<Vec<Content>, RepositoryError> {
        let contents = sqlx::query_as::<_, Content>(
            r"
            SELECT * FROM contentforge.content
            WHERE website_id = $1 AND ($2::contentforge.content_status IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(website_id)
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(contents)
    }

    /// Get a content item whose website belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if missing or foreign.
    pub async fn get(&self, user_id: UserId, id: ContentId) -> Result<Content, RepositoryError> {
        sqlx::query_as::<_, Content>(
            r"
            SELECT c.* FROM contentforge.content c
            JOIN contentforge.website w ON w.id = c.website_id
            WHERE c.id = $1 AND w.user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Insert a draft.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewContent) -> Result<Content, RepositoryError> {
        let content = sqlx::query_as::<_, Content>(
            r"
            INSERT INTO contentforge.content
                (website_id, kind, title, keywords, body_markdown, body_html)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            ",
        )
        .bind(new.website_id)
        .bind(new.kind)
        .bind(&new.title)
        .bind(&new.keywords)
        .bind(&new.body_markdown)
        .bind(&new.body_html)
        .fetch_one(self.pool)
        .await?;

        Ok(content)
    }

    /// Apply a partial update.
    ///
    /// `body_html` must be the rendering of `update.body_markdown` and is
    /// only written together with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the content does not exist.
    pub async fn update(
        &self,
        id: ContentId,
        update: &ContentUpdate,
        body_html: Option<&str>,
    ) -> Result<Content, RepositoryError> {
        sqlx::query_as::<_, Content>(
            r"
            UPDATE contentforge.content SET
                title = COALESCE($2, title),
                keywords = COALESCE($3, keywords),
                body_markdown = COALESCE($4, body_markdown),
                body_html = COALESCE($5, body_html),
                meta_title = COALESCE($6, meta_title),
                meta_description = COALESCE($7, meta_description),
                status = COALESCE($8, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.keywords)
        .bind(&update.body_markdown)
        .bind(body_html)
        .bind(&update.meta_title)
        .bind(&update.meta_description)
        .bind(update.status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Record a successful publish.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the content does not exist.
    pub async fn mark_published(
        &self,
        id: ContentId,
        target: &PublishTarget,
    ) -> Result<Content, RepositoryError> {
        sqlx::query_as::<_, Content>(
            r"
            UPDATE contentforge.content SET
                status = 'published',
                platform = $2,
                external_id = $3,
                external_url = $4,
                published_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(target.platform)
        .bind(&target.external_id)
        .bind(&target.external_url)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a content item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the content does not exist.
    pub async fn delete(&self, id: ContentId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM contentforge.content WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
