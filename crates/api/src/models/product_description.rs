//! Product description review queue and publish history.

use chrono::{DateTime, Utc};
use serde::Serialize;

use contentforge_core::{DescriptionStatus, PendingDescriptionId, PublishedProductId, WebsiteId};

/// A generated product description awaiting review.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PendingProductDescription {
    pub id: PendingDescriptionId,
    pub website_id: WebsiteId,
    /// Shopify product GID (`gid://shopify/Product/123`).
    pub product_id: String,
    pub product_title: String,
    /// Description on Shopify when generation ran.
    pub original_html: String,
    pub generated_html: String,
    pub status: DescriptionStatus,
    /// Last generation failure, if any.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A description written to Shopify, kept for revert.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PublishedProduct {
    pub id: PublishedProductId,
    pub website_id: WebsiteId,
    pub product_id: String,
    pub product_title: String,
    pub previous_html: String,
    pub published_html: String,
    pub published_at: DateTime<Utc>,
    pub reverted_at: Option<DateTime<Utc>>,
}
