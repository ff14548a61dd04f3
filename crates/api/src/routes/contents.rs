//! Content items: list, edit, delete, publish.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use contentforge_core::{ContentId, ContentStatus, WebsiteId};

use crate::db::ContentRepository;
use crate::error::AppError;
use crate::generation::render_markdown;
use crate::middleware::RequireAuth;
use crate::models::{Content, ContentUpdate};
use crate::routes::websites::owned_website;
use crate::services::{PublishOptions, publishing};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    pub status: Option<ContentStatus>,
}

/// List a website's content, newest first.
///
/// GET /api/websites/{id}/contents?status=
///
/// # Errors
///
/// 404 if not the caller's website.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(website_id): Path<WebsiteId>,
    Query(query): Query<ContentQuery>,
) -> Result<Json<Vec<Content>>, AppError> {
    let website = owned_website(&state, user.id, website_id).await?;
    let contents = ContentRepository::new(state.pool())
        .list_for_website(website.id, query.status)
        .await?;
    Ok(Json(contents))
}

/// GET /api/contents/{id}
///
/// # Errors
///
/// 404 if missing or foreign.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ContentId>,
) -> Result<Json<Content>, AppError> {
    let content = ContentRepository::new(state.pool()).get(user.id, id).await?;
    Ok(Json(content))
}

/// Partially update a content item. A new Markdown body is re-rendered.
///
/// PATCH /api/contents/{id}
///
/// # Errors
///
/// 400 for an empty update or blank title, 404 if missing or foreign.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ContentId>,
    Json(body): Json<ContentUpdate>,
) -> Result<Json<Content>, AppError> {
    if body.is_empty() {
        return Err(AppError::BadRequest("nothing to update".to_string()));
    }
    if body.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::BadRequest("title cannot be empty".to_string()));
    }

    let contents = ContentRepository::new(state.pool());
    let content = contents.get(user.id, id).await?;
    let body_html = body.body_markdown.as_deref().map(render_markdown);
    let content = contents
        .update(content.id, &body, body_html.as_deref())
        .await?;
    Ok(Json(content))
}

/// DELETE /api/contents/{id}
///
/// # Errors
///
/// 404 if missing or foreign.
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ContentId>,
) -> Result<StatusCode, AppError> {
    let contents = ContentRepository::new(state.pool());
    let content = contents.get(user.id, id).await?;
    contents.delete(content.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Publish to WordPress (create or update) or as a Shopify blog article.
///
/// POST /api/contents/{id}/publish
///
/// # Errors
///
/// 400 if the platform is unsupported or not connected, 404 if missing or
/// foreign, 502 if the platform rejects the write.
pub async fn publish(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ContentId>,
    Json(options): Json<PublishOptions>,
) -> Result<Json<Content>, AppError> {
    if !options.platform.is_publish_target() {
        return Err(AppError::BadRequest(format!(
            "content cannot be published to {}",
            options.platform
        )));
    }
    let contents = ContentRepository::new(state.pool());
    let content = contents.get(user.id, id).await?;

    let target = publishing::publish(&state, &content, &options).await?;
    let content = contents.mark_published(content.id, &target).await?;
    Ok(Json(content))
}
