//! Shopify catalog browsing for a connected website.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use contentforge_core::WebsiteId;

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::routes::websites::owned_website;
use crate::services::Connections;
use crate::shopify::{Blog, ProductPage};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub first: Option<i64>,
    pub after: Option<String>,
    pub query: Option<String>,
}

/// One page of the store's products.
///
/// GET /api/websites/{id}/shopify/products?first&after&query
///
/// Unfiltered pages come from the product cache when warm.
///
/// # Errors
///
/// 400 if Shopify is not connected, 404 for a foreign website, 429 when
/// Shopify keeps throttling.
pub async fn products(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(website_id): Path<WebsiteId>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<ProductPage>, AppError> {
    let website = owned_website(&state, user.id, website_id).await?;
    let client = Connections::new(&state).shopify(website.id).await?;

    let page = client
        .products_page(
            query.first.unwrap_or(DEFAULT_PAGE_SIZE),
            query.after.as_deref().filter(|a| !a.is_empty()),
            query.query.as_deref(),
        )
        .await?;
    Ok(Json(page))
}

/// GET /api/websites/{id}/shopify/blogs
///
/// # Errors
///
/// 400 if Shopify is not connected, 404 for a foreign website.
pub async fn blogs(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(website_id): Path<WebsiteId>,
) -> Result<Json<Vec<Blog>>, AppError> {
    let website = owned_website(&state, user.id, website_id).await?;
    let client = Connections::new(&state).shopify(website.id).await?;
    Ok(Json(client.list_blogs().await?))
}
