//! Generated content items (articles, pages, product copy).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use contentforge_core::{ContentId, ContentKind, ContentStatus, Platform, WebsiteId};

/// A content item belonging to exactly one website.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Content {
    pub id: ContentId,
    pub website_id: WebsiteId,
    pub kind: ContentKind,
    pub title: String,
    pub keywords: Vec<String>,
    pub body_markdown: String,
    /// HTML rendered from `body_markdown`; never edited directly.
    pub body_html: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub status: ContentStatus,
    /// Platform the item was last published to.
    pub platform: Option<Platform>,
    /// WordPress post ID, or `{blog_id}/{article_id}` on Shopify.
    pub external_id: Option<String>,
    pub external_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a content item.
#[derive(Debug, Clone)]
pub struct NewContent {
    pub website_id: WebsiteId,
    pub kind: ContentKind,
    pub title: String,
    pub keywords: Vec<String>,
    pub body_markdown: String,
    pub body_html: String,
}

/// Partial update of a content item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentUpdate {
    pub title: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub body_markdown: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub status: Option<ContentStatus>,
}

impl ContentUpdate {
    /// Whether the update carries no changes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.keywords.is_none()
            && self.body_markdown.is_none()
            && self.meta_title.is_none()
            && self.meta_description.is_none()
            && self.status.is_none()
    }
}
