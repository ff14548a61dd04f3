//! Crawler error types.

use thiserror::Error;

/// Errors from sitemap discovery, sitemap parsing and page fetching.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// URL could not be parsed or is not http(s).
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Network failure or timeout.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Document is not well-formed XML.
    #[error("malformed sitemap xml: {0}")]
    Xml(String),

    /// Document parsed but its root is neither `<sitemapindex>` nor `<urlset>`.
    #[error("not a sitemap (root element <{0}>)")]
    NotASitemap(String),
}

impl From<quick_xml::Error> for CrawlError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<quick_xml::DeError> for CrawlError {
    fn from(err: quick_xml::DeError) -> Self {
        Self::Xml(err.to_string())
    }
}
