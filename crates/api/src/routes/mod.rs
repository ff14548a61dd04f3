//! HTTP route handlers for the JSON API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (rate limited)
//! POST   /api/auth/register
//! POST   /api/auth/login
//! POST   /api/auth/logout
//! GET    /api/auth/me
//!
//! # Websites
//! GET    /api/websites                                  - List own websites
//! POST   /api/websites                                  - Create
//! GET    /api/websites/{id}                             - Show
//! PATCH  /api/websites/{id}                             - Partial update
//! DELETE /api/websites/{id}                             - Delete (cascades)
//! POST   /api/websites/{id}/index-sitemap               - Crawl sitemap
//! GET    /api/websites/{id}/sitemap                     - Stored URL list
//!
//! # Language model (rate limited)
//! POST   /api/websites/{id}/analyze                     - Business analysis
//! POST   /api/websites/{id}/topics                      - Topic ideas
//! POST   /api/generate/article                          - Stream article (SSE)
//! POST   /api/generate/rewrite                          - Rewrite article
//! POST   /api/generate/meta                             - SEO title/description
//! POST   /api/websites/{id}/product-descriptions/generate
//! POST   /api/product-descriptions/{id}/regenerate
//!
//! # Content
//! GET    /api/websites/{id}/contents?status=
//! GET    /api/contents/{id}
//! PATCH  /api/contents/{id}
//! DELETE /api/contents/{id}
//! POST   /api/contents/{id}/publish                     - WordPress or Shopify blog
//!
//! # Platform connections
//! GET    /api/websites/{id}/platforms
//! PUT    /api/websites/{id}/platforms/{platform}
//! DELETE /api/websites/{id}/platforms/{platform}
//! POST   /api/websites/{id}/platforms/{platform}/verify
//!
//! # Shopify
//! GET    /api/websites/{id}/shopify/products?first&after&query
//! GET    /api/websites/{id}/shopify/blogs
//!
//! # Product descriptions
//! GET    /api/websites/{id}/product-descriptions?status=
//! PATCH  /api/product-descriptions/{id}
//! POST   /api/product-descriptions/{id}/approve
//! POST   /api/product-descriptions/{id}/reject
//! POST   /api/product-descriptions/{id}/publish
//! GET    /api/websites/{id}/published-products
//! POST   /api/published-products/{id}/revert
//!
//! # Search Console and research
//! GET    /api/websites/{id}/search-console/performance?days&dimension
//! POST   /api/research
//! ```

pub mod analysis;
pub mod auth;
pub mod contents;
pub mod crawl;
pub mod generate;
pub mod platforms;
pub mod product_descriptions;
pub mod research;
pub mod search_console;
pub mod shopify;
pub mod websites;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, generation_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the routes that call a language model.
pub fn generation_routes() -> Router<AppState> {
    Router::new()
        .route("/api/websites/{id}/analyze", post(analysis::analyze))
        .route("/api/websites/{id}/topics", post(analysis::topics))
        .route("/api/generate/article", post(generate::article))
        .route("/api/generate/rewrite", post(generate::rewrite))
        .route("/api/generate/meta", post(generate::meta))
        .route(
            "/api/websites/{id}/product-descriptions/generate",
            post(product_descriptions::generate),
        )
        .route(
            "/api/product-descriptions/{id}/regenerate",
            post(product_descriptions::regenerate),
        )
}

/// Create the website routes router.
pub fn website_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(websites::index).post(websites::create))
        .route(
            "/{id}",
            get(websites::show)
                .patch(websites::update)
                .delete(websites::destroy),
        )
        .route("/{id}/index-sitemap", post(crawl::index_sitemap))
        .route("/{id}/sitemap", get(crawl::sitemap))
        .route("/{id}/contents", get(contents::index))
        .route("/{id}/platforms", get(platforms::index))
        .route(
            "/{id}/platforms/{platform}",
            axum::routing::put(platforms::upsert).delete(platforms::destroy),
        )
        .route("/{id}/platforms/{platform}/verify", post(platforms::verify))
        .route("/{id}/shopify/products", get(shopify::products))
        .route("/{id}/shopify/blogs", get(shopify::blogs))
        .route(
            "/{id}/product-descriptions",
            get(product_descriptions::index),
        )
        .route(
            "/{id}/published-products",
            get(product_descriptions::published),
        )
        .route(
            "/{id}/search-console/performance",
            get(search_console::performance),
        )
}

/// Create the content routes router.
pub fn content_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(contents::show)
                .patch(contents::update)
                .delete(contents::destroy),
        )
        .route("/{id}/publish", post(contents::publish))
}

/// Create the product description routes router.
pub fn product_description_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", axum::routing::patch(product_descriptions::update))
        .route("/{id}/approve", post(product_descriptions::approve))
        .route("/{id}/reject", post(product_descriptions::reject))
        .route("/{id}/publish", post(product_descriptions::publish))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes().layer(auth_rate_limiter()))
        .merge(generation_routes().layer(generation_rate_limiter()))
        .nest("/api/websites", website_routes())
        .nest("/api/contents", content_routes())
        .nest("/api/product-descriptions", product_description_routes())
        .route(
            "/api/published-products/{id}/revert",
            post(product_descriptions::revert),
        )
        .route("/api/research", post(research::search))
}
