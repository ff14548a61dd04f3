//! Business analysis and topic ideas.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use contentforge_core::{AiProvider, WebsiteId};

use crate::crawler::{CrawlError, PageContent};
use crate::db::WebsiteRepository;
use crate::error::AppError;
use crate::generation::{self, DEFAULT_TOPIC_COUNT, MAX_TOPIC_COUNT, TopicIdea};
use crate::middleware::RequireAuth;
use crate::models::{BusinessAnalysis, Website};
use crate::routes::websites::owned_website;
use crate::state::AppState;

const DEFAULT_ANALYSIS_PAGES: usize = 3;
const MAX_ANALYSIS_PAGES: usize = 10;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    pub provider: Option<AiProvider>,
    /// Sitemap pages to read besides the homepage.
    pub pages: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub analysis: BusinessAnalysis,
    pub pages_analyzed: Vec<String>,
    pub provider: AiProvider,
}

#[derive(Debug, Default, Deserialize)]
pub struct TopicsRequest {
    pub provider: Option<AiProvider>,
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    pub topics: Vec<TopicIdea>,
}

/// Homepage first, then sitemap URLs, without duplicates.
fn pages_to_read(website: &Website, extra: usize) -> Vec<String> {
    let home = format!("{}/", website.url.trim_end_matches('/'));
    let mut urls = vec![home];
    for entry in &website.sitemap_urls.0 {
        if urls.len() > extra {
            break;
        }
        let loc = entry.loc.trim_end_matches('/');
        if !urls.iter().any(|u| u.trim_end_matches('/') == loc) {
            urls.push(entry.loc.clone());
        }
    }
    urls
}

async fn fetch_pages(state: &AppState, urls: &[String]) -> Result<Vec<PageContent>, CrawlError> {
    let mut pages = Vec::with_capacity(urls.len());
    let mut first_error = None;
    for url in urls {
        match state.crawler().fetch_page(url).await {
            Ok(page) if !page.text.is_empty() || page.title.is_some() => pages.push(page),
            Ok(_) => warn!(url = %url, "Page has no readable text"),
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to fetch page for analysis");
                first_error.get_or_insert(e);
            }
        }
    }
    match (pages.is_empty(), first_error) {
        (true, Some(e)) => Err(e),
        _ => Ok(pages),
    }
}

/// Read the site and store a business analysis.
///
/// POST /api/websites/{id}/analyze
///
/// # Errors
///
/// 400 if the provider is not configured, 502 if no page could be read or
/// the model fails.
pub async fn analyze(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<WebsiteId>,
    body: Option<Json<AnalyzeRequest>>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let Json(body) = body.unwrap_or_default();
    let website = owned_website(&state, user.id, id).await?;
    let model = state.ai().get(body.provider)?;

    let extra = body
        .pages
        .unwrap_or(DEFAULT_ANALYSIS_PAGES)
        .min(MAX_ANALYSIS_PAGES);
    let urls = pages_to_read(&website, extra);
    let pages = fetch_pages(&state, &urls).await?;

    let analysis = generation::analyze_website(model.as_ref(), &website, &pages).await?;
    WebsiteRepository::new(state.pool())
        .save_analysis(website.id, &analysis)
        .await?;

    info!(website_id = %website.id, pages = pages.len(), provider = %model.provider(), "Website analyzed");
    Ok(Json(AnalyzeResponse {
        analysis,
        pages_analyzed: pages.into_iter().map(|p| p.url).collect(),
        provider: model.provider(),
    }))
}

/// Suggest article topics from the stored analysis.
///
/// POST /api/websites/{id}/topics
///
/// # Errors
///
/// 400 if the website was never analyzed or the provider is not
/// configured, 502 if the model fails.
pub async fn topics(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<WebsiteId>,
    body: Option<Json<TopicsRequest>>,
) -> Result<Json<TopicsResponse>, AppError> {
    let Json(body) = body.unwrap_or_default();
    let website = owned_website(&state, user.id, id).await?;
    let analysis = website
        .business_analysis()
        .ok_or_else(|| AppError::BadRequest("analyze the website first".to_string()))?;
    let model = state.ai().get(body.provider)?;

    let count = body
        .count
        .unwrap_or(DEFAULT_TOPIC_COUNT)
        .clamp(1, MAX_TOPIC_COUNT);
    let topics = generation::suggest_topics(model.as_ref(), &website, analysis, count).await?;
    Ok(Json(TopicsResponse { topics }))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use contentforge_core::UserId;
    use sqlx::types::Json as SqlJson;

    use super::*;
    use crate::crawler::SitemapUrl;

    fn website(urls: &[&str]) -> Website {
        Website {
            id: WebsiteId::new(1),
            user_id: UserId::new(1),
            name: "Acme".to_string(),
            url: "https://acme.test".to_string(),
            description: None,
            industry: None,
            target_audience: None,
            tone: None,
            language: "en".to_string(),
            sitemap_url: None,
            sitemap_urls: SqlJson(
                urls.iter()
                    .map(|u| SitemapUrl {
                        loc: (*u).to_string(),
                        lastmod: None,
                    })
                    .collect(),
            ),
            indexed_at: None,
            analysis: None,
            analyzed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_pages_to_read_starts_with_homepage_and_caps() {
        let site = website(&[
            "https://acme.test/",
            "https://acme.test/about",
            "https://acme.test/shop",
            "https://acme.test/blog",
        ]);
        assert_eq!(
            pages_to_read(&site, 2),
            vec![
                "https://acme.test/".to_string(),
                "https://acme.test/about".to_string(),
                "https://acme.test/shop".to_string(),
            ]
        );
        assert_eq!(pages_to_read(&site, 0), vec!["https://acme.test/".to_string()]);
    }
}
