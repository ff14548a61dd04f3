//! Publishing to WordPress and Shopify.
//!
//! Content items become WordPress posts or Shopify blog articles. Approved
//! product descriptions replace a product's Shopify description, keeping the
//! text they replaced for revert.

use serde::Deserialize;
use tracing::{info, instrument};

use contentforge_core::Platform;

use crate::db::contents::PublishTarget;
use crate::error::AppError;
use crate::models::Content;
use crate::services::Connections;
use crate::shopify::{ArticleInput, ShopifyClient, ShopifyError};
use crate::state::AppState;
use crate::wordpress::{PostInput, WordPressClient};

/// Post statuses WordPress accepts from us.
const WORDPRESS_STATUSES: &[&str] = &["publish", "draft", "pending", "private"];

/// Where and how to publish.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishOptions {
    pub platform: Platform,
    /// WordPress post status, or `draft` to create an unpublished Shopify
    /// article. Defaults to `publish`.
    pub status: Option<String>,
    /// Shopify blog. Defaults to the store's first blog.
    pub blog_id: Option<i64>,
    /// WordPress category IDs.
    #[serde(default)]
    pub categories: Vec<i64>,
}

impl PublishOptions {
    fn status(&self) -> Result<String, AppError> {
        let status = self
            .status
            .as_deref()
            .map_or("publish", str::trim)
            .to_ascii_lowercase();
        if WORDPRESS_STATUSES.contains(&status.as_str()) {
            Ok(status)
        } else {
            Err(AppError::BadRequest(format!(
                "status must be one of: {}",
                WORDPRESS_STATUSES.join(", ")
            )))
        }
    }
}

/// Publish `content` and return where it landed.
///
/// # Errors
///
/// 400 for an unsupported platform, missing connection or bad options;
/// the vendor error if the write fails.
#[instrument(skip(state, content), fields(content_id = %content.id, platform = %options.platform))]
pub async fn publish(
    state: &AppState,
    content: &Content,
    options: &PublishOptions,
) -> Result<PublishTarget, AppError> {
    if content.body_html.trim().is_empty() {
        return Err(AppError::BadRequest("content has no body".to_string()));
    }
    let status = options.status()?;
    let connections = Connections::new(state);

    let target = match options.platform {
        Platform::WordPress => {
            let client = connections.wordpress(content.website_id).await?;
            publish_wordpress(&client, content, status, options.categories.clone()).await?
        }
        Platform::Shopify => {
            let client = connections.shopify(content.website_id).await?;
            publish_shopify(&client, content, status != "publish", options.blog_id).await?
        }
        Platform::SearchConsole => {
            return Err(AppError::BadRequest(format!(
                "content cannot be published to {}",
                options.platform
            )));
        }
    };

    info!(external_id = %target.external_id, "Content published");
    Ok(target)
}

/// Create the post, or update it when this content was already published to
/// WordPress.
///
/// # Errors
///
/// Returns the WordPress error if the write fails.
pub async fn publish_wordpress(
    client: &WordPressClient,
    content: &Content,
    status: String,
    categories: Vec<i64>,
) -> Result<PublishTarget, AppError> {
    let post = PostInput {
        title: content.title.clone(),
        content: content.body_html.clone(),
        status,
        excerpt: content.meta_description.clone(),
        categories,
    };

    let existing = (content.platform == Some(Platform::WordPress))
        .then(|| content.external_id.as_deref()?.parse::<i64>().ok())
        .flatten();
    let saved = match existing {
        Some(id) => client.update_post(id, &post).await?,
        None => client.create_post(&post).await?,
    };

    Ok(PublishTarget {
        platform: Platform::WordPress,
        external_id: saved.id.to_string(),
        external_url: Some(saved.link),
    })
}

/// `{blog_id}/{article_id}` of a Shopify article, as stored in `external_id`.
fn article_ref(external_id: &str) -> Option<(i64, i64)> {
    let (blog, article) = external_id.split_once('/')?;
    Some((blog.parse().ok()?, article.parse().ok()?))
}

/// Create a blog article, or update the one this content was already
/// published as.
///
/// `blog_id` defaults to the article's current blog, then to the store's
/// first blog. Asking for a different blog creates a new article there.
///
/// # Errors
///
/// 400 if the blog does not exist; the Shopify error if the write fails.
pub async fn publish_shopify(
    client: &ShopifyClient,
    content: &Content,
    hidden: bool,
    blog_id: Option<i64>,
) -> Result<PublishTarget, AppError> {
    let existing = (content.platform == Some(Platform::Shopify))
        .then(|| content.external_id.as_deref().and_then(article_ref))
        .flatten()
        .filter(|(blog, _)| blog_id.is_none_or(|id| id == *blog));

    let blogs = client.list_blogs().await?;
    let blog = match existing.map(|(blog, _)| blog).or(blog_id) {
        Some(id) => blogs.into_iter().find(|b| b.id == id).ok_or_else(|| {
            AppError::BadRequest(format!("blog {id} does not exist in this store"))
        })?,
        None => blogs
            .into_iter()
            .next()
            .ok_or_else(|| AppError::BadRequest("the store has no blog".to_string()))?,
    };

    let input = ArticleInput {
        title: content.title.clone(),
        body_html: content.body_html.clone(),
        summary_html: content.meta_description.clone(),
        author: None,
        tags: content.keywords.join(", "),
        published: !hidden,
    };
    let article = match existing {
        Some((_, article_id)) => client.update_article(blog.id, article_id, &input).await?,
        None => client.create_article(blog.id, &input).await?,
    };

    Ok(PublishTarget {
        platform: Platform::Shopify,
        external_id: format!("{}/{}", blog.id, article.id),
        external_url: Some(format!(
            "https://{}/blogs/{}/{}",
            client.store(),
            blog.handle,
            article.handle
        )),
    })
}

/// Replace a product's description with `html`.
///
/// Returns the live description it replaced, read just before the write so
/// a revert restores what shoppers actually saw.
///
/// # Errors
///
/// Returns the Shopify error if the read or the write fails.
#[instrument(skip(client, html), fields(store = %client.store()))]
pub async fn publish_product_description(
    client: &ShopifyClient,
    product_id: &str,
    html: &str,
) -> Result<String, ShopifyError> {
    let live = client.product(product_id).await?;
    client.update_product_description(product_id, html).await?;
    client.invalidate_products();
    Ok(live.description_html)
}

/// Write `previous_html` back to a product.
///
/// # Errors
///
/// Returns the Shopify error if the write fails.
#[instrument(skip(client, previous_html), fields(store = %client.store()))]
pub async fn restore_product_description(
    client: &ShopifyClient,
    product_id: &str,
    previous_html: &str,
) -> Result<(), ShopifyError> {
    client
        .update_product_description(product_id, previous_html)
        .await?;
    client.invalidate_products();
    Ok(())
}
