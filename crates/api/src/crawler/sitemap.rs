//! Sitemap XML parsing.
//!
//! Handles the two document types of the sitemaps.org protocol:
//!
//! ```xml
//! <sitemapindex><sitemap><loc>https://example.com/a.xml</loc></sitemap></sitemapindex>
//! <urlset><url><loc>https://example.com/</loc><lastmod>2024-01-01</lastmod></url></urlset>
//! ```

use quick_xml::Reader;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};

use super::CrawlError;

/// A page URL listed in a `<urlset>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapUrl {
    pub loc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,
}

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<sitemapindex>`: locations of child sitemaps, unnormalised.
    Index(Vec<String>),
    /// `<urlset>`: page URLs, unnormalised.
    UrlSet(Vec<SitemapUrl>),
}

#[derive(Deserialize)]
struct RawIndex {
    #[serde(rename = "sitemap", default)]
    sitemaps: Vec<RawEntry>,
}

#[derive(Deserialize)]
struct RawUrlSet {
    #[serde(rename = "url", default)]
    urls: Vec<RawEntry>,
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(default)]
    loc: Option<String>,
    #[serde(default)]
    lastmod: Option<String>,
}

/// Parse a sitemap or sitemap index.
///
/// Entries without a `<loc>` are dropped.
///
/// # Errors
///
/// Returns `CrawlError::Xml` for malformed XML and `CrawlError::NotASitemap`
/// when the root element is anything else.
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, CrawlError> {
    match root_element(xml)?.as_str() {
        "sitemapindex" => {
            let raw: RawIndex = quick_xml::de::from_str(xml)?;
            Ok(SitemapDocument::Index(
                raw.sitemaps.into_iter().filter_map(|e| e.loc).collect(),
            ))
        }
        "urlset" => {
            let raw: RawUrlSet = quick_xml::de::from_str(xml)?;
            Ok(SitemapDocument::UrlSet(
                raw.urls
                    .into_iter()
                    .filter_map(|e| {
                        e.loc.map(|loc| SitemapUrl {
                            loc,
                            lastmod: e.lastmod.map(|m| m.trim().to_string()),
                        })
                    })
                    .collect(),
            ))
        }
        other => Err(CrawlError::NotASitemap(other.to_string())),
    }
}

/// Local name of the first element, ignoring prolog and namespace prefix.
fn root_element(xml: &str) -> Result<String, CrawlError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::Eof => return Err(CrawlError::NotASitemap(String::new())),
            _ => {}
        }
    }
}

/// Normalise a `<loc>` for deduplication.
///
/// Trims whitespace, drops the fragment and rejects anything that is not an
/// absolute http(s) URL.
#[must_use]
pub fn normalize_loc(raw: &str) -> Option<String> {
    let mut url = url::Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    url.set_fragment(None);
    Some(url.into())
}

/// `Sitemap:` entries of a robots.txt file, in order.
#[must_use]
pub fn robots_sitemaps(robots: &str) -> Vec<String> {
    robots
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case("sitemap")
                .then(|| value.trim().to_string())
        })
        .filter(|value| !value.is_empty())
        .collect()
}
