//! Domain types for the Shopify Admin API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Monetary amount with currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

/// Product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub alt_text: Option<String>,
}

/// A product as needed for description generation and listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// GID, e.g. `gid://shopify/Product/123`.
    pub id: String,
    pub title: String,
    pub handle: String,
    pub description_html: String,
    /// `ACTIVE`, `DRAFT` or `ARCHIVED`.
    pub status: String,
    pub vendor: String,
    pub product_type: String,
    pub tags: Vec<String>,
    pub online_store_url: Option<String>,
    pub featured_image: Option<Image>,
    pub min_price: Option<Money>,
}

/// One page of a product listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// Shop identity, used to verify a connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
    pub name: String,
    pub myshopify_domain: String,
    pub primary_domain_url: Option<String>,
}

/// An online store blog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blog {
    pub id: i64,
    pub title: String,
    pub handle: String,
}

/// Fields for creating or replacing a blog article.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleInput {
    pub title: String,
    pub body_html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Comma-separated tags.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tags: String,
    pub published: bool,
}

/// A blog article as Shopify returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub handle: String,
    pub blog_id: i64,
}
