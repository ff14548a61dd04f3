//! Per-website platform connections.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use contentforge_core::{Platform, WebsiteId};
use tracing::info;

use crate::db::PlatformConfigRepository;
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{PlatformConfigInput, PlatformConfigView, website::normalize_site_url};
use crate::routes::websites::owned_website;
use crate::services::{Connections, VerifiedConnection};
use crate::shopify::normalize_store_domain;
use crate::state::AppState;

/// Check and normalise `base_url` and `username` for `platform`.
fn normalize_input(
    platform: Platform,
    mut input: PlatformConfigInput,
) -> Result<PlatformConfigInput, AppError> {
    let base_url = input.base_url.trim();
    if base_url.is_empty() {
        return Err(AppError::BadRequest("base_url is required".to_string()));
    }

    input.base_url = match platform {
        Platform::Shopify => {
            let store = normalize_store_domain(base_url);
            if !store.ends_with(".myshopify.com") || store.len() <= ".myshopify.com".len() {
                return Err(AppError::BadRequest(
                    "base_url must be a *.myshopify.com store domain".to_string(),
                ));
            }
            store
        }
        Platform::WordPress => {
            if input.username.as_deref().is_none_or(|u| u.trim().is_empty()) {
                return Err(AppError::BadRequest(
                    "username is required for wordpress".to_string(),
                ));
            }
            let url = url::Url::parse(base_url)
                .ok()
                .filter(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
                .ok_or_else(|| AppError::BadRequest("base_url must be an http(s) URL".to_string()))?;
            url.as_str().trim_end_matches('/').to_string()
        }
        Platform::SearchConsole => {
            // Domain properties are written `sc-domain:example.com`.
            if base_url.starts_with("sc-domain:") {
                base_url.to_string()
            } else {
                let origin = normalize_site_url(base_url).map_err(AppError::BadRequest)?;
                format!("{origin}/")
            }
        }
    };
    input.username = input
        .username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());
    input.secret = input.secret.filter(|s| !s.trim().is_empty());
    Ok(input)
}

/// List connections (secrets omitted).
///
/// GET /api/websites/{id}/platforms
///
/// # Errors
///
/// 404 if not the caller's website.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(website_id): Path<WebsiteId>,
) -> Result<Json<Vec<PlatformConfigView>>, AppError> {
    let website = owned_website(&state, user.id, website_id).await?;
    let configs = PlatformConfigRepository::new(state.pool())
        .list(website.id)
        .await?;
    Ok(Json(configs.iter().map(|c| c.view()).collect()))
}

/// Create or replace a connection.
///
/// PUT /api/websites/{id}/platforms/{platform}
///
/// # Errors
///
/// 400 for an invalid `base_url`, 404 if not the caller's website.
pub async fn upsert(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path((website_id, platform)): Path<(WebsiteId, Platform)>,
    Json(body): Json<PlatformConfigInput>,
) -> Result<Json<PlatformConfigView>, AppError> {
    let website = owned_website(&state, user.id, website_id).await?;
    let input = normalize_input(platform, body)?;

    let config = PlatformConfigRepository::new(state.pool())
        .upsert(website.id, platform, &input)
        .await?;

    info!(website_id = %website.id, platform = %platform, "Platform connection saved");
    Ok(Json(config.view()))
}

/// DELETE /api/websites/{id}/platforms/{platform}
///
/// # Errors
///
/// 404 if not the caller's website or not connected.
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path((website_id, platform)): Path<(WebsiteId, Platform)>,
) -> Result<StatusCode, AppError> {
    let website = owned_website(&state, user.id, website_id).await?;
    PlatformConfigRepository::new(state.pool())
        .delete(website.id, platform)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Call the vendor with the stored credentials.
///
/// POST /api/websites/{id}/platforms/{platform}/verify
///
/// # Errors
///
/// 400 if not connected, 502 if the vendor rejects the credentials.
pub async fn verify(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path((website_id, platform)): Path<(WebsiteId, Platform)>,
) -> Result<Json<VerifiedConnection>, AppError> {
    let website = owned_website(&state, user.id, website_id).await?;
    let connections = Connections::new(&state);
    let config = connections.config(website.id, platform).await?;
    let verified = connections.verify(&config).await?;
    Ok(Json(verified))
}
