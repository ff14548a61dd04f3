//! Product description queue and publish history.

use sqlx::PgPool;

use contentforge_core::{
    DescriptionStatus, PendingDescriptionId, PublishedProductId, UserId, WebsiteId,
};

use super::RepositoryError;
use crate::models::{PendingProductDescription, PublishedProduct};

/// Fields for queueing a generated description.
#[derive(Debug, Clone)]
pub struct NewPendingDescription<'a> {
    pub website_id: WebsiteId,
    pub product_id: &'a str,
    pub product_title: &'a str,
    pub original_html: &'a str,
    pub generated_html: &'a str,
    pub error: Option<&'a str>,
}

/// Repository for product descriptions.
pub struct ProductDescriptionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductDescriptionRepository<'a> {
    /// Create a new product description repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Queue a generated (or failed) description as pending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_pending(
        &self,
        new: &NewPendingDescription<'_>,
    ) -> Result<PendingProductDescription, RepositoryError> {
        let pending = sqlx::query_as::<_, PendingProductDescription>(
            r"
            INSERT INTO contentforge.pending_product_description
                (website_id, product_id, product_title, original_html, generated_html, error)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            ",
        )
        .bind(new.website_id)
        .bind(new.product_id)
        .bind(new.product_title)
        .bind(new.original_html)
        .bind(new.generated_html)
        .bind(new.error)
        .fetch_one(self.pool)
        .await?;

        Ok(pending)
    }

    /// List a website's descriptions, newest first, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        website_id: WebsiteId,
        status: Option<DescriptionStatus>,
    ) -> Result<Vec<PendingProductDescription>, RepositoryError> {
        let items = sqlx::query_as::<_, PendingProductDescription>(
            r"
            SELECT * FROM contentforge.pending_product_description
            WHERE website_id = $1
              AND ($2::contentforge.description_status IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(website_id)
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Get a description whose website belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if missing or foreign.
    pub async fn get(
        &self,
        user_id: UserId,
        id: PendingDescriptionId,
    ) -> Result<PendingProductDescription, RepositoryError> {
        sqlx::query_as::<_, PendingProductDescription>(
            r"
            SELECT d.* FROM contentforge.pending_product_description d
            JOIN contentforge.website w ON w.id = d.website_id
            WHERE d.id = $1 AND w.user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Move a description from `from` to `to`.
    ///
    /// The `WHERE status = from` guard makes concurrent transitions fail
    /// instead of overwriting each other.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the status changed underneath.
    pub async fn transition(
        &self,
        id: PendingDescriptionId,
        from: DescriptionStatus,
        to: DescriptionStatus,
    ) -> Result<PendingProductDescription, RepositoryError> {
        sqlx::query_as::<_, PendingProductDescription>(
            r"
            UPDATE contentforge.pending_product_description
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            ",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::Conflict(format!("description is no longer {from}")))
    }

    /// Replace the generated HTML of a pending description.
    ///
    /// Hand-written text supersedes a failed generation, so `error` is
    /// cleared.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the description is not pending.
    pub async fn update_generated_html(
        &self,
        id: PendingDescriptionId,
        generated_html: &str,
    ) -> Result<PendingProductDescription, RepositoryError> {
        sqlx::query_as::<_, PendingProductDescription>(
            r"
            UPDATE contentforge.pending_product_description
            SET generated_html = $2, error = NULL, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            ",
        )
        .bind(id)
        .bind(generated_html)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::Conflict("description is not pending".to_string()))
    }

    /// Store a regeneration result and reset the description to pending.
    ///
    /// A failed regeneration (`error` is `Some`) keeps the old text for
    /// reference; approval refuses descriptions that carry an error. Only
    /// pending or rejected rows are touched, so an approval that lands while
    /// the model runs wins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the description was approved or
    /// published in the meantime.
    pub async fn save_regenerated(
        &self,
        id: PendingDescriptionId,
        generated_html: &str,
        error: Option<&str>,
    ) -> Result<PendingProductDescription, RepositoryError> {
        sqlx::query_as::<_, PendingProductDescription>(
            r"
            UPDATE contentforge.pending_product_description
            SET generated_html = CASE WHEN $3::TEXT IS NULL THEN $2 ELSE generated_html END,
                error = $3,
                status = 'pending',
                updated_at = NOW()
            WHERE id = $1 AND status IN ('pending', 'rejected')
            RETURNING *
            ",
        )
        .bind(id)
        .bind(generated_html)
        .bind(error)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| {
            RepositoryError::Conflict("description left review while regenerating".to_string())
        })
    }

    /// Mark an approved description published and record the write.
    ///
    /// `previous_html` is the live description the publish replaced. Both
    /// rows change in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the description is no longer
    /// approved.
    pub async fn record_publish(
        &self,
        pending: &PendingProductDescription,
        previous_html: &str,
    ) -> Result<PublishedProduct, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r"
            UPDATE contentforge.pending_product_description
            SET status = 'published', updated_at = NOW()
            WHERE id = $1 AND status = 'approved'
            ",
        )
        .bind(pending.id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(
                "description is no longer approved".to_string(),
            ));
        }

        let published = sqlx::query_as::<_, PublishedProduct>(
            r"
            INSERT INTO contentforge.published_product
                (website_id, product_id, product_title, previous_html, published_html)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            ",
        )
        .bind(pending.website_id)
        .bind(&pending.product_id)
        .bind(&pending.product_title)
        .bind(previous_html)
        .bind(&pending.generated_html)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(published)
    }

    /// List a website's published descriptions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_published(
        &self,
        website_id: WebsiteId,
    ) -> Result<Vec<PublishedProduct>, RepositoryError> {
        let items = sqlx::query_as::<_, PublishedProduct>(
            r"
            SELECT * FROM contentforge.published_product
            WHERE website_id = $1
            ORDER BY published_at DESC, id DESC
            ",
        )
        .bind(website_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Get a published record whose website belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if missing or foreign.
    pub async fn get_published(
        &self,
        user_id: UserId,
        id: PublishedProductId,
    ) -> Result<PublishedProduct, RepositoryError> {
        sqlx::query_as::<_, PublishedProduct>(
            r"
            SELECT p.* FROM contentforge.published_product p
            JOIN contentforge.website w ON w.id = p.website_id
            WHERE p.id = $1 AND w.user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Mark a published record reverted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if it was already reverted.
    pub async fn mark_reverted(
        &self,
        id: PublishedProductId,
    ) -> Result<PublishedProduct, RepositoryError> {
        sqlx::query_as::<_, PublishedProduct>(
            r"
            UPDATE contentforge.published_product
            SET reverted_at = NOW()
            WHERE id = $1 AND reverted_at IS NULL
            RETURNING *
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::Conflict("already reverted".to_string()))
    }
}
