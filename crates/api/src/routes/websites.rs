//! Website profile CRUD.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use tracing::info;

use contentforge_core::{UserId, WebsiteId};

use crate::crawler::normalize_loc;
use crate::db::WebsiteRepository;
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{NewWebsite, Website, WebsiteUpdate, website::normalize_site_url};
use crate::state::AppState;

/// Website as returned by the API.
#[derive(Debug, Serialize)]
pub struct WebsiteResponse {
    #[serde(flatten)]
    pub website: Website,
    pub indexed_url_count: usize,
}

impl From<Website> for WebsiteResponse {
    fn from(website: Website) -> Self {
        let indexed_url_count = website.indexed_url_count();
        Self {
            website,
            indexed_url_count,
        }
    }
}

/// Load a website owned by `user_id` (404 otherwise).
pub(crate) async fn owned_website(
    state: &AppState,
    user_id: UserId,
    id: WebsiteId,
) -> Result<Website, AppError> {
    Ok(WebsiteRepository::new(state.pool()).get(user_id, id).await?)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_sitemap_url(raw: Option<String>) -> Result<Option<String>, AppError> {
    non_blank(raw)
        .map(|url| {
            normalize_loc(&url)
                .ok_or_else(|| AppError::BadRequest("sitemap_url must be an http(s) URL".to_string()))
        })
        .transpose()
}

/// List the caller's websites, newest first.
///
/// GET /api/websites
///
/// # Errors
///
/// 500 on database failure.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<WebsiteResponse>>, AppError> {
    let websites = WebsiteRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(websites.into_iter().map(WebsiteResponse::from).collect()))
}

/// Create a website.
///
/// POST /api/websites
///
/// # Errors
///
/// 400 if `name` is blank or `url` is not an http(s) URL.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(mut body): Json<NewWebsite>,
) -> Result<impl IntoResponse, AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    let url = normalize_site_url(&body.url).map_err(AppError::BadRequest)?;
    body.sitemap_url = validate_sitemap_url(body.sitemap_url.take())?;
    body.language = non_blank(body.language.take());

    let website = WebsiteRepository::new(state.pool())
        .create(user.id, &body, &url)
        .await?;

    info!(website_id = %website.id, url = %website.url, "Website created");
    Ok((StatusCode::CREATED, Json(WebsiteResponse::from(website))))
}

/// Get one website.
///
/// GET /api/websites/{id}
///
/// # Errors
///
/// 404 if the website does not exist or belongs to someone else.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<WebsiteId>,
) -> Result<Json<WebsiteResponse>, AppError> {
    let website = owned_website(&state, user.id, id).await?;
    Ok(Json(WebsiteResponse::from(website)))
}

/// Partially update a website.
///
/// PATCH /api/websites/{id}
///
/// # Errors
///
/// 400 for a blank name or invalid URL, 404 if not the caller's.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<WebsiteId>,
    Json(mut body): Json<WebsiteUpdate>,
) -> Result<Json<WebsiteResponse>, AppError> {
    if body.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }
    body.url = body
        .url
        .as_deref()
        .map(normalize_site_url)
        .transpose()
        .map_err(AppError::BadRequest)?;
    body.sitemap_url = validate_sitemap_url(body.sitemap_url.take())?;
    body.language = non_blank(body.language.take());

    let website = WebsiteRepository::new(state.pool())
        .update(user.id, id, &body)
        .await?;
    Ok(Json(WebsiteResponse::from(website)))
}

/// Delete a website and everything under it.
///
/// DELETE /api/websites/{id}
///
/// # Errors
///
/// 404 if not the caller's.
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<WebsiteId>,
) -> Result<StatusCode, AppError> {
    WebsiteRepository::new(state.pool())
        .delete(user.id, id)
        .await?;
    info!(website_id = %id, "Website deleted");
    Ok(StatusCode::NO_CONTENT)
}
