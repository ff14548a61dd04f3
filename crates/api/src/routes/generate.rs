//! Article generation, rewrite and SEO metadata.

use std::convert::Infallible;

use axum::{
    Json,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use contentforge_core::{AiProvider, ContentId, ContentKind, WebsiteId};

use crate::ai::TextStream;
use crate::db::ContentRepository;
use crate::error::AppError;
use crate::generation::{self, ArticleDraft, MetaTags, clamp_word_count, prompts};
use crate::middleware::RequireAuth;
use crate::models::{Content, ContentUpdate, NewContent};
use crate::research::SearchResults;
use crate::routes::websites::owned_website;
use crate::state::AppState;

/// Organic results requested from Serper for article research.
const RESEARCH_RESULTS: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct GenerateArticleRequest {
    pub website_id: WebsiteId,
    pub topic: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub word_count: Option<u32>,
    pub provider: Option<AiProvider>,
    #[serde(default)]
    pub research: bool,
}

#[derive(Debug, Deserialize)]
pub struct RewriteRequest {
    pub content_id: ContentId,
    pub instructions: String,
    pub provider: Option<AiProvider>,
}

#[derive(Debug, Deserialize)]
pub struct MetaRequest {
    pub content_id: ContentId,
    pub provider: Option<AiProvider>,
}

#[derive(Debug, Serialize)]
pub struct MetaResponse {
    #[serde(flatten)]
    pub meta: MetaTags,
    pub content: Content,
}

fn sse_event(name: &str, data: &serde_json::Value) -> Event {
    Event::default().event(name).data(data.to_string())
}

/// Top results for `topic`, or `None` when research is off, unconfigured or
/// failing.
async fn research(state: &AppState, topic: &str) -> Option<SearchResults> {
    let serper = state.serper()?;
    match serper.search(topic, RESEARCH_RESULTS).await {
        Ok(results) => Some(results),
        Err(e) => {
            warn!(error = %e, "Research failed, generating without it");
            None
        }
    }
}

/// Forward model deltas as `chunk` events, then persist the draft and send
/// `done`, or send `error`.
fn article_events(
    state: AppState,
    new_content: NewContent,
    mut deltas: TextStream,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        let mut markdown = String::new();
        while let Some(delta) = deltas.next().await {
            match delta {
                Ok(text) => {
                    markdown.push_str(&text);
                    yield Ok(sse_event("chunk", &json!({ "text": text })));
                }
                Err(e) => {
                    warn!(error = %e, "Article stream failed");
                    yield Ok(sse_event("error", &json!({ "error": e.to_string() })));
                    return;
                }
            }
        }

        if markdown.trim().is_empty() {
            yield Ok(sse_event("error", &json!({ "error": "model returned an empty response" })));
            return;
        }

        let draft = ArticleDraft::from_markdown(&markdown, &new_content.title);
        let new_content = NewContent {
            title: draft.title,
            body_markdown: draft.body_markdown,
            body_html: draft.body_html,
            ..new_content
        };
        match ContentRepository::new(state.pool()).create(&new_content).await {
            Ok(content) => {
                info!(content_id = %content.id, website_id = %content.website_id, "Article generated");
                yield Ok(sse_event("done", &json!({ "content_id": content.id, "title": content.title })));
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to save generated article");
                yield Ok(sse_event("error", &json!({ "error": "failed to save article" })));
            }
        }
    }
}

/// Stream a new article and save it as a draft.
///
/// POST /api/generate/article
///
/// Server-sent events: `chunk` `{"text"}` per delta, then `done`
/// `{"content_id", "title"}` or `error` `{"error"}`.
///
/// # Errors
///
/// Fails before streaming starts: 400 for a blank topic or unconfigured
/// provider, 404 for a foreign website, 429/502 if the provider rejects the
/// request.
pub async fn article(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<GenerateArticleRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let topic = body.topic.trim();
    if topic.is_empty() {
        return Err(AppError::BadRequest("topic is required".to_string()));
    }
    let website = owned_website(&state, user.id, body.website_id).await?;
    let model = state.ai().get(body.provider)?;

    let keywords: Vec<String> = body
        .keywords
        .iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    let word_count = clamp_word_count(body.word_count);

    let research = if body.research {
        research(&state, topic).await
    } else {
        None
    };

    let request =
        prompts::article_request(&website, topic, &keywords, word_count, research.as_ref());
    let deltas = model.stream(&request).await?;

    info!(
        website_id = %website.id,
        provider = %model.provider(),
        word_count,
        research = research.is_some(),
        "Article generation started"
    );

    let new_content = NewContent {
        website_id: website.id,
        kind: ContentKind::Article,
        title: topic.to_string(),
        keywords,
        body_markdown: String::new(),
        body_html: String::new(),
    };
    Ok(Sse::new(article_events(state, new_content, deltas)).keep_alive(KeepAlive::default()))
}

/// Rewrite an article and store the new body.
///
/// POST /api/generate/rewrite
///
/// # Errors
///
/// 400 for blank instructions, 404 for a foreign content item, 502 if the
/// model fails.
pub async fn rewrite(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<RewriteRequest>,
) -> Result<Json<Content>, AppError> {
    let instructions = body.instructions.trim();
    if instructions.is_empty() {
        return Err(AppError::BadRequest("instructions are required".to_string()));
    }
    let contents = ContentRepository::new(state.pool());
    let content = contents.get(user.id, body.content_id).await?;
    let website = owned_website(&state, user.id, content.website_id).await?;
    let model = state.ai().get(body.provider)?;

    let draft =
        generation::rewrite_article(model.as_ref(), &website, &content, instructions).await?;
    let update = ContentUpdate {
        title: Some(draft.title),
        body_markdown: Some(draft.body_markdown),
        ..ContentUpdate::default()
    };
    let content = contents
        .update(content.id, &update, Some(&draft.body_html))
        .await?;
    Ok(Json(content))
}

/// Generate and store meta title and description.
///
/// POST /api/generate/meta
///
/// # Errors
///
/// 404 for a foreign content item, 502 if the model fails.
pub async fn meta(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<MetaRequest>,
) -> Result<Json<MetaResponse>, AppError> {
    let contents = ContentRepository::new(state.pool());
    let content = contents.get(user.id, body.content_id).await?;
    let website = owned_website(&state, user.id, content.website_id).await?;
    let model = state.ai().get(body.provider)?;

    let meta = generation::generate_meta(model.as_ref(), &website, &content).await?;
    let update = ContentUpdate {
        meta_title: Some(meta.meta_title.clone()),
        meta_description: Some(meta.meta_description.clone()),
        ..ContentUpdate::default()
    };
    let content = contents.update(content.id, &update, None).await?;
    Ok(Json(MetaResponse { meta, content }))
}
