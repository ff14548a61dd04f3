//! Prompt builders.
//!
//! Every prompt carries the website profile so the model writes for the
//! right business, audience and tone.

use std::fmt::Write as _;

use crate::ai::CompletionRequest;
use crate::crawler::PageContent;
use crate::models::{BusinessAnalysis, Content, Website};
use crate::research::SearchResults;
use crate::shopify::Product;

const ANALYST_SYSTEM: &str = "You are a marketing analyst. You read website copy and describe \
the business behind it precisely. Answer with a single JSON object and nothing else.";

const STRATEGIST_SYSTEM: &str = "You are an SEO content strategist. Answer with a single JSON \
object and nothing else.";

const WRITER_SYSTEM: &str = "You are an experienced copywriter who writes clear, accurate, \
search-friendly web content in Markdown. Never invent facts about the business.";

const PRODUCT_WRITER_SYSTEM: &str = "You are an e-commerce copywriter. You write persuasive, \
accurate product descriptions as clean HTML using only <p>, <ul>, <li>, <strong>, <em> and \
<h3> tags. Output only the HTML.";

/// Profile block shared by every prompt.
#[must_use]
pub fn website_context(website: &Website) -> String {
    let mut out = format!("Website: {} ({})\n", website.name, website.url);
    let fields = [
        ("Description", website.description.as_deref()),
        ("Industry", website.industry.as_deref()),
        ("Target audience", website.target_audience.as_deref()),
        ("Tone of voice", website.tone.as_deref()),
    ];
    for (label, value) in fields {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            let _ = writeln!(out, "{label}: {value}");
        }
    }
    let _ = writeln!(out, "Language: {}", website.language);

    if let Some(analysis) = website.business_analysis() {
        let _ = writeln!(out, "Business summary: {}", analysis.summary);
        if !analysis.products_services.is_empty() {
            let _ = writeln!(
                out,
                "Products and services: {}",
                analysis.products_services.join(", ")
            );
        }
        if !analysis.unique_selling_points.is_empty() {
            let _ = writeln!(
                out,
                "Unique selling points: {}",
                analysis.unique_selling_points.join("; ")
            );
        }
    }
    out
}

/// Ask for a [`BusinessAnalysis`] of the fetched pages.
#[must_use]
pub fn analysis_request(website: &Website, pages: &[PageContent]) -> CompletionRequest {
    let mut prompt = website_context(website);
    prompt.push_str("\nPages from the site:\n\n");
    for page in pages {
        prompt.push_str(&page.to_prompt_text());
        prompt.push_str("\n---\n");
    }
    prompt.push_str(
        "\nAnalyze this business. Respond with JSON of the form:\n\
         {\"summary\": string, \"products_services\": [string], \"target_audience\": string, \
         \"tone\": string, \"unique_selling_points\": [string], \"keywords\": [string]}\n\
         Give 5 to 15 keywords a customer would search for.",
    );

    CompletionRequest::new(ANALYST_SYSTEM, prompt)
        .json()
        .temperature(0.2)
}

/// Ask for `count` blog topic ideas.
#[must_use]
pub fn topics_request(
    website: &Website,
    analysis: &BusinessAnalysis,
    count: usize,
) -> CompletionRequest {
    let mut prompt = website_context(website);
    if !analysis.keywords.is_empty() {
        let _ = writeln!(prompt, "Known keywords: {}", analysis.keywords.join(", "));
    }
    let _ = write!(
        prompt,
        "\nSuggest {count} blog article topics that would attract this business's customers \
         from search. Respond with JSON of the form:\n\
         {{\"topics\": [{{\"title\": string, \"keyword\": string, \"angle\": string}}]}}\n\
         Each keyword is the main search phrase the article targets; angle is one sentence on \
         what makes the article useful."
    );

    CompletionRequest::new(STRATEGIST_SYSTEM, prompt)
        .json()
        .temperature(0.8)
}

/// Ask for a full Markdown article.
#[must_use]
pub fn article_request(
    website: &Website,
    topic: &str,
    keywords: &[String],
    word_count: u32,
    research: Option<&SearchResults>,
) -> CompletionRequest {
    let mut prompt = website_context(website);
    let _ = writeln!(prompt, "\nWrite a blog article titled or about: {topic}");
    if !keywords.is_empty() {
        let _ = writeln!(
            prompt,
            "Work these keywords in naturally: {}",
            keywords.join(", ")
        );
    }
    let _ = writeln!(prompt, "Length: about {word_count} words.");
    if let Some(research) = research {
        let context = research.to_prompt_text(5);
        if !context.is_empty() {
            prompt.push_str("\nWhat currently ranks for this topic:\n");
            prompt.push_str(&context);
            prompt.push_str("Cover the questions people ask. Do not copy the results.\n");
        }
    }
    prompt.push_str(
        "\nFormat: Markdown. Start with a single '# ' title line, use '## ' section headings, \
         end with a short conclusion that mentions the business where it fits.",
    );

    CompletionRequest::new(WRITER_SYSTEM, prompt)
        .temperature(0.7)
        .max_tokens(word_count.saturating_mul(3).clamp(1024, 8192))
}

/// Ask for a rewrite of an existing article.
#[must_use]
pub fn rewrite_request(website: &Website, content: &Content, instructions: &str) -> CompletionRequest {
    let mut prompt = website_context(website);
    let _ = write!(
        prompt,
        "\nRewrite the article below following these instructions: {instructions}\n\
         Keep it in Markdown and keep the '# ' title line. Return only the article.\n\n\
         # {}\n\n{}",
        content.title, content.body_markdown
    );

    CompletionRequest::new(WRITER_SYSTEM, prompt)
        .temperature(0.6)
        .max_tokens(8192)
}

/// Ask for an SEO title and meta description.
#[must_use]
pub fn meta_request(website: &Website, content: &Content) -> CompletionRequest {
    let excerpt: String = content.body_markdown.chars().take(4000).collect();
    let mut prompt = website_context(website);
    let _ = write!(
        prompt,
        "\nWrite SEO metadata for this article.\nTitle: {}\nKeywords: {}\n\n{excerpt}\n\n\
         Respond with JSON: {{\"meta_title\": string (max 60 characters), \
         \"meta_description\": string (max 160 characters)}}",
        content.title,
        content.keywords.join(", "),
    );

    CompletionRequest::new(STRATEGIST_SYSTEM, prompt)
        .json()
        .temperature(0.3)
}

/// Ask for a product description in HTML.
#[must_use]
pub fn product_description_request(
    website: &Website,
    product: &Product,
    instructions: Option<&str>,
) -> CompletionRequest {
    let mut prompt = website_context(website);
    let _ = writeln!(prompt, "\nProduct: {}", product.title);
    if !product.product_type.is_empty() {
        let _ = writeln!(prompt, "Type: {}", product.product_type);
    }
    if !product.vendor.is_empty() {
        let _ = writeln!(prompt, "Brand: {}", product.vendor);
    }
    if !product.tags.is_empty() {
        let _ = writeln!(prompt, "Tags: {}", product.tags.join(", "));
    }
    if let Some(price) = &product.min_price {
        let _ = writeln!(prompt, "Price from: {} {}", price.amount, price.currency_code);
    }
    if !product.description_html.trim().is_empty() {
        let _ = writeln!(
            prompt,
            "Current description (HTML):\n{}",
            product.description_html
        );
    }
    prompt.push_str("\nWrite a new description of 120 to 250 words.");
    if let Some(extra) = instructions.filter(|i| !i.trim().is_empty()) {
        let _ = write!(prompt, "\nAdditional instructions: {extra}");
    }

    CompletionRequest::new(PRODUCT_WRITER_SYSTEM, prompt).temperature(0.7)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use contentforge_core::{UserId, WebsiteId};
    use sqlx::types::Json;

    use super::*;

    fn website(analysis: Option<BusinessAnalysis>) -> Website {
        Website {
            id: WebsiteId::new(1),
            user_id: UserId::new(1),
            name: "Acme Coffee".to_string(),
            url: "https://acme.test".to_string(),
            description: Some("Small-batch roaster".to_string()),
            industry: None,
            target_audience: Some("Home baristas".to_string()),
            tone: Some(String::new()),
            language: "en".to_string(),
            sitemap_url: None,
            sitemap_urls: Json(vec![]),
            indexed_at: None,
            analysis: analysis.map(Json),
            analyzed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_website_context_skips_empty_fields() {
        let ctx = website_context(&website(None));
        assert!(ctx.contains("Website: Acme Coffee (https://acme.test)"));
        assert!(ctx.contains("Target audience: Home baristas"));
        assert!(!ctx.contains("Industry"));
        assert!(!ctx.contains("Tone of voice"));
    }

    #[test]
    fn test_website_context_includes_analysis() {
        let analysis = BusinessAnalysis {
            summary: "Roasts beans weekly".to_string(),
            products_services: vec!["Espresso blend".to_string()],
            ..BusinessAnalysis::default()
        };
        let ctx = website_context(&website(Some(analysis)));
        assert!(ctx.contains("Business summary: Roasts beans weekly"));
        assert!(ctx.contains("Products and services: Espresso blend"));
    }

    #[test]
    fn test_json_prompts_request_json() {
        let site = website(None);
        assert!(analysis_request(&site, &[]).json);
        assert!(topics_request(&site, &BusinessAnalysis::default(), 5).json);
        let article = article_request(&site, "Cold brew", &[], 1200, None);
        assert!(!article.json);
        assert_eq!(article.max_tokens, Some(3600));
    }

    #[test]
    fn test_article_request_includes_research() {
        let research = SearchResults {
            organic: vec![],
            people_also_ask: vec!["How long does cold brew last?".to_string()],
        };
        let request = article_request(
            &website(None),
            "Cold brew",
            &["cold brew".to_string()],
            800,
            Some(&research),
        );
        assert!(request.prompt.contains("How long does cold brew last?"));
        assert!(request.prompt.contains("cold brew"));
    }
}
