//! Content generation on top of [`LanguageModel`].
//!
//! Prompts live in [`prompts`]; this module sends them and shapes the
//! answers into the records the routes persist.

pub mod markdown;
pub mod prompts;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::ai::{AiError, LanguageModel, parse_json_output, strip_code_fences};
use crate::crawler::PageContent;
use crate::models::{BusinessAnalysis, Content, Website};
use crate::shopify::Product;

pub use markdown::render_markdown;

pub const DEFAULT_TOPIC_COUNT: usize = 5;
pub const MAX_TOPIC_COUNT: usize = 20;
pub const DEFAULT_WORD_COUNT: u32 = 1200;
pub const MIN_WORD_COUNT: u32 = 300;
pub const MAX_WORD_COUNT: u32 = 4000;
pub const META_TITLE_MAX: usize = 60;
pub const META_DESCRIPTION_MAX: usize = 160;

/// A suggested article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicIdea {
    pub title: String,
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub angle: String,
}

#[derive(Debug, Deserialize)]
struct TopicList {
    topics: Vec<TopicIdea>,
}

/// SEO title and description of a content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaTags {
    pub meta_title: String,
    pub meta_description: String,
}

impl MetaTags {
    /// Trim both fields and cut them to their length limits.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            meta_title: truncate_at_word_boundary(self.meta_title.trim(), META_TITLE_MAX),
            meta_description: truncate_at_word_boundary(
                self.meta_description.trim(),
                META_DESCRIPTION_MAX,
            ),
        }
    }
}

/// An article split into title and body, with the body rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDraft {
    pub title: String,
    pub body_markdown: String,
    pub body_html: String,
}

impl ArticleDraft {
    /// Build a draft from model output. The leading `# ` line becomes the
    /// title; without one `fallback_title` is used.
    #[must_use]
    pub fn from_markdown(markdown: &str, fallback_title: &str) -> Self {
        let title = markdown::leading_title(markdown).unwrap_or_else(|| fallback_title.trim().to_string());
        let body = markdown::strip_leading_title(markdown).trim_end().to_string();
        let body_html = render_markdown(&body);
        Self {
            title,
            body_markdown: body,
            body_html,
        }
    }
}

/// Clamp a requested word count.
#[must_use]
pub fn clamp_word_count(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_WORD_COUNT)
        .clamp(MIN_WORD_COUNT, MAX_WORD_COUNT)
}

/// Cut `text` to at most `max` characters, preferring the last space.
///
/// Trailing punctuation left at the cut is dropped.
#[must_use]
pub fn truncate_at_word_boundary(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let cut: String = text.chars().take(max).collect();
    let next_is_break = text.chars().nth(max).is_some_and(char::is_whitespace);
    let kept = if next_is_break {
        cut.as_str()
    } else {
        cut.rfind(char::is_whitespace)
            .and_then(|i| cut.get(..i))
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&cut)
    };
    kept.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-'))
        .to_string()
}

/// Analyze a business from its pages.
///
/// # Errors
///
/// Returns an `AiError` if the model call fails or the answer is not a
/// valid analysis.
#[instrument(skip_all, fields(website_id = %website.id, pages = pages.len()))]
pub async fn analyze_website(
    model: &dyn LanguageModel,
    website: &Website,
    pages: &[PageContent],
) -> Result<BusinessAnalysis, AiError> {
    let completion = model
        .complete(&prompts::analysis_request(website, pages))
        .await?;
    let analysis: BusinessAnalysis = parse_json_output(&completion.text)?;
    if analysis.summary.trim().is_empty() {
        return Err(AiError::EmptyResponse);
    }
    debug!(keywords = analysis.keywords.len(), "Website analyzed");
    Ok(analysis)
}

/// Suggest up to `count` article topics.
///
/// # Errors
///
/// Returns an `AiError` if the model call fails or returns no topics.
#[instrument(skip_all, fields(website_id = %website.id, count))]
pub async fn suggest_topics(
    model: &dyn LanguageModel,
    website: &Website,
    analysis: &BusinessAnalysis,
    count: usize,
) -> Result<Vec<TopicIdea>, AiError> {
    let count = count.clamp(1, MAX_TOPIC_COUNT);
    let completion = model
        .complete(&prompts::topics_request(website, analysis, count))
        .await?;

    // Some models answer with a bare array instead of {"topics": [...]}.
    let topics = parse_json_output::<TopicList>(&completion.text)
        .map(|list| list.topics)
        .or_else(|_| parse_json_output::<Vec<TopicIdea>>(&completion.text))?;

    let topics: Vec<TopicIdea> = topics
        .into_iter()
        .filter(|t| !t.title.trim().is_empty())
        .take(count)
        .collect();
    if topics.is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(topics)
}

/// Rewrite an article following `instructions`.
///
/// # Errors
///
/// Returns an `AiError` if the model call fails or answers with nothing.
#[instrument(skip_all, fields(content_id = %content.id))]
pub async fn rewrite_article(
    model: &dyn LanguageModel,
    website: &Website,
    content: &Content,
    instructions: &str,
) -> Result<ArticleDraft, AiError> {
    let completion = model
        .complete(&prompts::rewrite_request(website, content, instructions))
        .await?;
    let markdown = strip_code_fences(&completion.text);
    if markdown.is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(ArticleDraft::from_markdown(markdown, &content.title))
}

/// Generate meta title and description within their length limits.
///
/// # Errors
///
/// Returns an `AiError` if the model call fails or the answer cannot be
/// parsed.
#[instrument(skip_all, fields(content_id = %content.id))]
pub async fn generate_meta(
    model: &dyn LanguageModel,
    website: &Website,
    content: &Content,
) -> Result<MetaTags, AiError> {
    let completion = model
        .complete(&prompts::meta_request(website, content))
        .await?;
    let meta: MetaTags = parse_json_output(&completion.text)?;
    let meta = meta.clamped();
    if meta.meta_title.is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(meta)
}

/// Generate an HTML product description.
///
/// # Errors
///
/// Returns an `AiError` if the model call fails or answers with nothing.
#[instrument(skip_all, fields(product_id = %product.id))]
pub async fn generate_product_description(
    model: &dyn LanguageModel,
    website: &Website,
    product: &Product,
    instructions: Option<&str>,
) -> Result<String, AiError> {
    let completion = model
        .complete(&prompts::product_description_request(
            website,
            product,
            instructions,
        ))
        .await?;
    let html = strip_code_fences(&completion.text);
    if html.is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(html.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use contentforge_core::{AiProvider, ContentId, ContentKind, ContentStatus, UserId, WebsiteId};
    use sqlx::types::Json;

    use super::*;
    use crate::ai::{Completion, CompletionRequest, TextStream};

    /// Answers every request with a fixed text and records the prompts.
    struct ScriptedModel {
        answer: String,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedModel {
        fn new(answer: &str) -> Self {
            Self {
                answer: answer.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        fn provider(&self) -> AiProvider {
            AiProvider::Openai
        }

        fn model(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AiError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(Completion {
                text: self.answer.clone(),
                provider: AiProvider::Openai,
                model: "scripted".to_string(),
            })
        }

        async fn stream(&self, _request: &CompletionRequest) -> Result<TextStream, AiError> {
            let chunks = vec![Ok(self.answer.clone())];
            Ok(Box::pin(futures::stream::iter(chunks)))
        }
    }

    fn website() -> Website {
        Website {
            id: WebsiteId::new(7),
            user_id: UserId::new(1),
            name: "Acme Coffee".to_string(),
            url: "https://acme.test".to_string(),
            description: None,
            industry: Some("Coffee".to_string()),
            target_audience: None,
            tone: None,
            language: "en".to_string(),
            sitemap_url: None,
            sitemap_urls: Json(vec![]),
            indexed_at: None,
            analysis: None,
            analyzed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn content() -> Content {
        Content {
            id: ContentId::new(3),
            website_id: WebsiteId::new(7),
            kind: ContentKind::Article,
            title: "Cold Brew Basics".to_string(),
            keywords: vec!["cold brew".to_string()],
            body_markdown: "Steep for 18 hours.".to_string(),
            body_html: "<p>Steep for 18 hours.</p>\n".to_string(),
            meta_title: None,
            meta_description: None,
            status: ContentStatus::Draft,
            platform: None,
            external_id: None,
            external_url: None,
            published_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_truncate_at_word_boundary() {
        assert_eq!(truncate_at_word_boundary("short", 60), "short");
        assert_eq!(
            truncate_at_word_boundary("The quick brown fox jumps", 13),
            "The quick"
        );
        assert_eq!(
            truncate_at_word_boundary("The quick brown fox", 15),
            "The quick brown"
        );
        assert_eq!(truncate_at_word_boundary("Hello, world again", 8), "Hello");
        assert_eq!(
            truncate_at_word_boundary("Supercalifragilistic", 5),
            "Super"
        );
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let text = "Café crème brûlée recette";
        let out = truncate_at_word_boundary(text, 12);
        assert_eq!(out, "Café crème");
        assert!(out.chars().count() <= 12);
    }

    #[test]
    fn test_clamp_word_count() {
        assert_eq!(clamp_word_count(None), DEFAULT_WORD_COUNT);
        assert_eq!(clamp_word_count(Some(50)), MIN_WORD_COUNT);
        assert_eq!(clamp_word_count(Some(10_000)), MAX_WORD_COUNT);
        assert_eq!(clamp_word_count(Some(900)), 900);
    }

    #[test]
    fn test_article_draft_from_markdown() {
        let draft = ArticleDraft::from_markdown("# Brewing Guide\n\n## Step one\n\nGrind.\n", "Fallback");
        assert_eq!(draft.title, "Brewing Guide");
        assert!(draft.body_markdown.starts_with("## Step one"));
        assert!(draft.body_html.contains("<h2>Step one</h2>"));

        let untitled = ArticleDraft::from_markdown("Just text.", " Fallback ");
        assert_eq!(untitled.title, "Fallback");
    }

    #[tokio::test]
    async fn test_analyze_website_parses_fenced_json() {
        let model = ScriptedModel::new(
            "```json\n{\"summary\": \"Roaster\", \"keywords\": [\"espresso\"]}\n```",
        );
        let analysis = analyze_website(&model, &website(), &[]).await.unwrap();
        assert_eq!(analysis.summary, "Roaster");
        assert_eq!(analysis.keywords, vec!["espresso"]);
        assert!(model.seen.lock().unwrap()[0].json);
    }

    #[tokio::test]
    async fn test_analyze_website_rejects_empty_summary() {
        let model = ScriptedModel::new("{\"summary\": \"  \"}");
        let err = analyze_website(&model, &website(), &[]).await.unwrap_err();
        assert!(matches!(err, AiError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_suggest_topics_caps_count_and_accepts_bare_array() {
        let model = ScriptedModel::new(
            r#"[{"title": "A", "keyword": "a"}, {"title": ""}, {"title": "B"}, {"title": "C"}]"#,
        );
        let topics = suggest_topics(&model, &website(), &BusinessAnalysis::default(), 2)
            .await
            .unwrap();
        assert_eq!(
            topics.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(),
            vec!["A", "B"]
        );
    }

    #[tokio::test]
    async fn test_generate_meta_truncates_overlong_fields() {
        let long_title = "Word ".repeat(20);
        let long_desc = "Sentence ".repeat(30);
        let answer = serde_json::json!({
            "meta_title": long_title,
            "meta_description": long_desc,
        })
        .to_string();
        let model = ScriptedModel::new(&answer);

        let meta = generate_meta(&model, &website(), &content()).await.unwrap();
        assert!(meta.meta_title.chars().count() <= META_TITLE_MAX);
        assert!(meta.meta_description.chars().count() <= META_DESCRIPTION_MAX);
        assert!(meta.meta_title.ends_with("Word"));
    }

    #[tokio::test]
    async fn test_rewrite_keeps_title_when_model_drops_it() {
        let model = ScriptedModel::new("Steep for 12 hours instead.");
        let draft = rewrite_article(&model, &website(), &content(), "shorter")
            .await
            .unwrap();
        assert_eq!(draft.title, "Cold Brew Basics");
        assert_eq!(draft.body_markdown, "Steep for 12 hours instead.");
        let prompt = &model.seen.lock().unwrap()[0].prompt;
        assert!(prompt.contains("shorter"));
    }

    #[tokio::test]
    async fn test_product_description_strips_fences() {
        let model = ScriptedModel::new("```html\n<p>Great mug.</p>\n```");
        let product = Product {
            id: "gid://shopify/Product/1".to_string(),
            title: "Mug".to_string(),
            handle: "mug".to_string(),
            description_html: String::new(),
            status: "ACTIVE".to_string(),
            vendor: String::new(),
            product_type: String::new(),
            tags: vec![],
            online_store_url: None,
            featured_image: None,
            min_price: None,
        };
        let html = generate_product_description(&model, &website(), &product, None)
            .await
            .unwrap();
        assert_eq!(html, "<p>Great mug.</p>");
    }
}
