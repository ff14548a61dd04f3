//! GraphQL documents and raw response shapes.
//!
//! Sent through `graphql_client::QueryBody` and read back through
//! `graphql_client::Response`, so only the envelope comes from the crate.

use serde::{Deserialize, Serialize};

use super::types::{Image, Money, Product, ProductPage, Shop};

macro_rules! product_fields {
    () => {
        "id title handle descriptionHtml status vendor productType tags onlineStoreUrl \
         featuredImage { url altText } \
         priceRangeV2 { minVariantPrice { amount currencyCode } }"
    };
}

pub const PRODUCTS_OPERATION: &str = "Products";
pub const PRODUCT_OPERATION: &str = "Product";
pub const SHOP_OPERATION: &str = "Shop";

/// `products(first, after, query)` with page info.
pub const PRODUCTS_QUERY: &str = concat!(
    "query Products($first: Int!, $after: String, $query: String) {\n",
    "  products(first: $first, after: $after, query: $query, sortKey: TITLE) {\n",
    "    pageInfo { hasNextPage endCursor }\n",
    "    nodes { ",
    product_fields!(),
    " }\n",
    "  }\n",
    "}"
);

/// Single product by GID.
pub const PRODUCT_QUERY: &str = concat!(
    "query Product($id: ID!) {\n",
    "  product(id: $id) { ",
    product_fields!(),
    " }\n",
    "}"
);

pub const SHOP_QUERY: &str = r"query Shop {
  shop { name myshopifyDomain primaryDomain { url } }
}";

#[derive(Debug, Serialize)]
pub struct ProductsVariables<'a> {
    pub first: i64,
    pub after: Option<&'a str>,
    pub query: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct ProductVariables<'a> {
    pub id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct NoVariables {}

#[derive(Debug, Deserialize)]
pub struct ProductsData {
    pub products: ProductConnection,
}

#[derive(Debug, Deserialize)]
pub struct ProductData {
    pub product: Option<ProductNode>,
}

#[derive(Debug, Deserialize)]
pub struct ShopData {
    pub shop: ShopNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductConnection {
    pub page_info: PageInfo,
    pub nodes: Vec<ProductNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductNode {
    pub id: String,
    pub title: String,
    pub handle: String,
    #[serde(default)]
    pub description_html: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub online_store_url: Option<String>,
    pub featured_image: Option<ImageNode>,
    pub price_range_v2: Option<PriceRangeNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageNode {
    pub url: String,
    pub alt_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeNode {
    pub min_variant_price: MoneyNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyNode {
    pub amount: rust_decimal::Decimal,
    pub currency_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopNode {
    pub name: String,
    pub myshopify_domain: String,
    pub primary_domain: Option<DomainNode>,
}

#[derive(Debug, Deserialize)]
pub struct DomainNode {
    pub url: String,
}

impl From<ProductNode> for Product {
    fn from(node: ProductNode) -> Self {
        Self {
            id: node.id,
            title: node.title,
            handle: node.handle,
            description_html: node.description_html,
            status: node.status,
            vendor: node.vendor,
            product_type: node.product_type,
            tags: node.tags,
            online_store_url: node.online_store_url,
            featured_image: node.featured_image.map(|i| Image {
                url: i.url,
                alt_text: i.alt_text,
            }),
            min_price: node.price_range_v2.map(|p| Money {
                amount: p.min_variant_price.amount,
                currency_code: p.min_variant_price.currency_code,
            }),
        }
    }
}

impl From<ProductConnection> for ProductPage {
    fn from(conn: ProductConnection) -> Self {
        Self {
            products: conn.nodes.into_iter().map(Product::from).collect(),
            has_next_page: conn.page_info.has_next_page,
            end_cursor: conn.page_info.end_cursor,
        }
    }
}

impl From<ShopNode> for Shop {
    fn from(node: ShopNode) -> Self {
        Self {
            name: node.name,
            myshopify_domain: node.myshopify_domain,
            primary_domain_url: node.primary_domain.map(|d| d.url),
        }
    }
}
