//! HTML page text extraction.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

/// Default cap on extracted text.
pub const DEFAULT_MAX_CHARS: usize = 12_000;

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("Invalid selector"));
static META_DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[name="description"], meta[property="og:description"]"#)
        .expect("Invalid selector")
});
static HEADINGS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3").expect("Invalid selector"));
static BODY_TEXT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p, li").expect("Invalid selector"));

/// Text extracted from one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageContent {
    pub url: String,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub headings: Vec<String>,
    /// Paragraph and list text, one block per line.
    pub text: String,
}

impl PageContent {
    /// Render the page as a compact plain-text block for prompts.
    #[must_use]
    pub fn to_prompt_text(&self) -> String {
        let mut out = format!("URL: {}\n", self.url);
        if let Some(title) = &self.title {
            out.push_str(&format!("Title: {title}\n"));
        }
        if let Some(desc) = &self.meta_description {
            out.push_str(&format!("Description: {desc}\n"));
        }
        if !self.headings.is_empty() {
            out.push_str(&format!("Headings: {}\n", self.headings.join(" | ")));
        }
        if !self.text.is_empty() {
            out.push_str(&self.text);
            out.push('\n');
        }
        out
    }
}

/// Extract title, meta description, headings and body text from HTML.
///
/// Whitespace inside every block is collapsed. Headings and text together
/// are capped at `max_chars` characters; the block that crosses the cap is
/// cut and the rest dropped.
#[must_use]
pub fn extract_page(url: &str, html: &str, max_chars: usize) -> PageContent {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty());

    let meta_description = document
        .select(&META_DESCRIPTION)
        .filter_map(|e| e.value().attr("content"))
        .map(collapse_whitespace)
        .find(|d| !d.is_empty());

    let mut budget = max_chars;
    let headings = take_within_budget(document.select(&HEADINGS).map(element_text), &mut budget);
    let blocks = take_within_budget(document.select(&BODY_TEXT).map(element_text), &mut budget);

    PageContent {
        url: url.to_string(),
        title,
        meta_description,
        headings,
        text: blocks.join("\n"),
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Collapse runs of whitespace into single spaces and trim.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn take_within_budget(blocks: impl Iterator<Item = String>, budget: &mut usize) -> Vec<String> {
    let mut out = Vec::new();
    for block in blocks.filter(|b| !b.is_empty()) {
        if *budget == 0 {
            break;
        }
        let len = block.chars().count();
        if len <= *budget {
            *budget -= len;
            out.push(block);
        } else {
            out.push(block.chars().take(*budget).collect());
            *budget = 0;
        }
    }
    out
}
