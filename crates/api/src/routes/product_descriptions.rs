//! Product description workflow: generate, review, publish, revert.
//!
//! Descriptions move `pending -> approved -> published`, with `rejected`
//! reachable from pending or approved and sent back to pending by a
//! regeneration. Publishing writes the HTML to Shopify and keeps the
//! previous description so it can be restored.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{info, warn};

use contentforge_core::{
    AiProvider, DescriptionStatus, PendingDescriptionId, PublishedProductId, UserId, WebsiteId,
};

use crate::db::ProductDescriptionRepository;
use crate::db::product_descriptions::NewPendingDescription;
use crate::error::AppError;
use crate::generation;
use crate::middleware::RequireAuth;
use crate::models::{PendingProductDescription, PublishedProduct};
use crate::routes::websites::owned_website;
use crate::services::Connections;
use crate::services::publishing::{publish_product_description, restore_product_description};
use crate::state::AppState;

/// Products per generation request.
pub const MAX_BATCH: usize = 20;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub product_ids: Vec<String>,
    pub instructions: Option<String>,
    pub provider: Option<AiProvider>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegenerateRequest {
    pub instructions: Option<String>,
    pub provider: Option<AiProvider>,
}

#[derive(Debug, Deserialize)]
pub struct DescriptionQuery {
    pub status: Option<DescriptionStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDescriptionRequest {
    pub generated_html: String,
}

/// Trimmed, deduplicated product IDs, in request order.
fn batch_ids(ids: &[String]) -> Result<Vec<&str>, AppError> {
    let mut batch: Vec<&str> = Vec::with_capacity(ids.len());
    for id in ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
        if !batch.contains(&id) {
            batch.push(id);
        }
    }

    if batch.is_empty() {
        return Err(AppError::BadRequest("product_ids is required".to_string()));
    }
    if batch.len() > MAX_BATCH {
        return Err(AppError::BadRequest(format!(
            "at most {MAX_BATCH} products per request"
        )));
    }
    Ok(batch)
}

fn instructions(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Generate descriptions for up to 20 products and queue them for review.
///
/// POST /api/websites/{id}/product-descriptions/generate
///
/// Products run one after another. A product that cannot be loaded or
/// generated is still queued, with `error` set.
///
/// # Errors
///
/// 400 for an empty or oversized batch, an unconfigured provider or a
/// missing Shopify connection; 404 for a foreign website.
pub async fn generate(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(website_id): Path<WebsiteId>,
    Json(body): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<Vec<PendingProductDescription>>), AppError> {
    let ids = batch_ids(&body.product_ids)?;
    let website = owned_website(&state, user.id, website_id).await?;
    let client = Connections::new(&state).shopify(website.id).await?;
    let model = state.ai().get(body.provider)?;
    let instructions = instructions(body.instructions.as_deref());
    let repo = ProductDescriptionRepository::new(state.pool());

    let mut queued = Vec::with_capacity(ids.len());
    for product_id in ids {
        let new = match client.product(product_id).await {
            Ok(product) => {
                match generation::generate_product_description(
                    model.as_ref(),
                    &website,
                    &product,
                    instructions,
                )
                .await
                {
                    Ok(html) => {
                        repo.create_pending(&NewPendingDescription {
                            website_id: website.id,
                            product_id: &product.id,
                            product_title: &product.title,
                            original_html: &product.description_html,
                            generated_html: &html,
                            error: None,
                        })
                        .await?
                    }
                    Err(e) => {
                        warn!(product_id, error = %e, "Description generation failed");
                        let error = e.to_string();
                        repo.create_pending(&NewPendingDescription {
                            website_id: website.id,
                            product_id: &product.id,
                            product_title: &product.title,
                            original_html: &product.description_html,
                            generated_html: "",
                            error: Some(&error),
                        })
                        .await?
                    }
                }
            }
            Err(e) => {
                warn!(product_id, error = %e, "Product lookup failed");
                let error = e.to_string();
                repo.create_pending(&NewPendingDescription {
                    website_id: website.id,
                    product_id,
                    product_title: product_id,
                    original_html: "",
                    generated_html: "",
                    error: Some(&error),
                })
                .await?
            }
        };
        queued.push(new);
    }

    info!(
        website_id = %website.id,
        provider = %model.provider(),
        count = queued.len(),
        failed = queued.iter().filter(|d| d.error.is_some()).count(),
        "Product descriptions generated"
    );
    Ok((StatusCode::CREATED, Json(queued)))
}

/// GET /api/websites/{id}/product-descriptions?status=
///
/// # Errors
///
/// 404 for a foreign website.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(website_id): Path<WebsiteId>,
    Query(query): Query<DescriptionQuery>,
) -> Result<Json<Vec<PendingProductDescription>>, AppError> {
    let website = owned_website(&state, user.id, website_id).await?;
    let items = ProductDescriptionRepository::new(state.pool())
        .list(website.id, query.status)
        .await?;
    Ok(Json(items))
}

/// Edit the generated HTML before approval.
///
/// PATCH /api/product-descriptions/{id}
///
/// # Errors
///
/// 400 for blank HTML, 404 if missing or foreign, 409 unless pending.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<PendingDescriptionId>,
    Json(body): Json<UpdateDescriptionRequest>,
) -> Result<Json<PendingProductDescription>, AppError> {
    let html = body.generated_html.trim();
    if html.is_empty() {
        return Err(AppError::BadRequest("generated_html cannot be empty".to_string()));
    }

    let repo = ProductDescriptionRepository::new(state.pool());
    let pending = repo.get(user.id, id).await?;
    if pending.status != DescriptionStatus::Pending {
        return Err(AppError::Conflict(format!(
            "only pending descriptions can be edited, this one is {}",
            pending.status
        )));
    }
    Ok(Json(repo.update_generated_html(pending.id, html).await?))
}

async fn move_to(
    state: &AppState,
    user_id: UserId,
    id: PendingDescriptionId,
    to: DescriptionStatus,
) -> Result<PendingProductDescription, AppError> {
    let repo = ProductDescriptionRepository::new(state.pool());
    let pending = repo.get(user_id, id).await?;

    if !pending.status.can_transition_to(to) {
        return Err(AppError::Conflict(format!(
            "cannot move a {} description to {to}",
            pending.status
        )));
    }
    if to == DescriptionStatus::Approved {
        ensure_approvable(&pending)?;
    }

    Ok(repo.transition(pending.id, pending.status, to).await?)
}

/// Only text that came out of a successful generation, or was written by
/// hand, can be approved.
fn ensure_approvable(pending: &PendingProductDescription) -> Result<(), AppError> {
    if let Some(error) = &pending.error {
        return Err(AppError::BadRequest(format!(
            "last generation failed ({error}), regenerate or edit it first"
        )));
    }
    if pending.generated_html.trim().is_empty() {
        return Err(AppError::BadRequest(
            "description has no generated text, regenerate it first".to_string(),
        ));
    }
    Ok(())
}

/// POST /api/product-descriptions/{id}/approve
///
/// # Errors
///
/// 400 if the last generation failed, 404 if missing or foreign, 409 unless
/// pending.
pub async fn approve(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<PendingDescriptionId>,
) -> Result<Json<PendingProductDescription>, AppError> {
    Ok(Json(move_to(&state, user.id, id, DescriptionStatus::Approved).await?))
}

/// POST /api/product-descriptions/{id}/reject
///
/// # Errors
///
/// 404 if missing or foreign, 409 if already rejected or published.
pub async fn reject(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<PendingDescriptionId>,
) -> Result<Json<PendingProductDescription>, AppError> {
    Ok(Json(move_to(&state, user.id, id, DescriptionStatus::Rejected).await?))
}

/// Generate a fresh description and put it back in review.
///
/// POST /api/product-descriptions/{id}/regenerate
///
/// A model failure is stored on the description rather than returned.
///
/// # Errors
///
/// 404 if missing or foreign, 409 if approved or published, 400 if Shopify
/// is not connected.
pub async fn regenerate(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<PendingDescriptionId>,
    body: Option<Json<RegenerateRequest>>,
) -> Result<Json<PendingProductDescription>, AppError> {
    let Json(body) = body.unwrap_or_default();
    let repo = ProductDescriptionRepository::new(state.pool());
    let pending = repo.get(user.id, id).await?;

    if !matches!(
        pending.status,
        DescriptionStatus::Pending | DescriptionStatus::Rejected
    ) {
        return Err(AppError::Conflict(format!(
            "cannot regenerate a {} description",
            pending.status
        )));
    }

    let website = owned_website(&state, user.id, pending.website_id).await?;
    let client = Connections::new(&state).shopify(website.id).await?;
    let model = state.ai().get(body.provider)?;
    let product = client.product(&pending.product_id).await?;

    let updated = match generation::generate_product_description(
        model.as_ref(),
        &website,
        &product,
        instructions(body.instructions.as_deref()),
    )
    .await
    {
        Ok(html) => repo.save_regenerated(pending.id, &html, None).await?,
        Err(e) => {
            warn!(description_id = %pending.id, error = %e, "Description regeneration failed");
            repo.save_regenerated(pending.id, "", Some(&e.to_string()))
                .await?
        }
    };
    Ok(Json(updated))
}

/// Write an approved description to Shopify.
///
/// The product's live description is read first and kept for revert.
///
/// POST /api/product-descriptions/{id}/publish
///
/// # Errors
///
/// 404 if missing or foreign, 409 unless approved, 502 if Shopify rejects
/// the write.
pub async fn publish(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<PendingDescriptionId>,
) -> Result<Json<PublishedProduct>, AppError> {
    let repo = ProductDescriptionRepository::new(state.pool());
    let pending = repo.get(user.id, id).await?;
    if !pending
        .status
        .can_transition_to(DescriptionStatus::Published)
    {
        return Err(AppError::Conflict(format!(
            "description must be approved before publishing, it is {}",
            pending.status
        )));
    }

    let client = Connections::new(&state).shopify(pending.website_id).await?;
    let previous_html =
        publish_product_description(&client, &pending.product_id, &pending.generated_html)
            .await?;
    let published = repo.record_publish(&pending, &previous_html).await?;

    info!(
        description_id = %pending.id,
        product_id = %pending.product_id,
        "Product description published"
    );
    Ok(Json(published))
}

/// GET /api/websites/{id}/published-products
///
/// # Errors
///
/// 404 for a foreign website.
pub async fn published(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(website_id): Path<WebsiteId>,
) -> Result<Json<Vec<PublishedProduct>>, AppError> {
    let website = owned_website(&state, user.id, website_id).await?;
    let items = ProductDescriptionRepository::new(state.pool())
        .list_published(website.id)
        .await?;
    Ok(Json(items))
}

/// Restore the description a publish replaced.
///
/// POST /api/published-products/{id}/revert
///
/// # Errors
///
/// 404 if missing or foreign, 409 if already reverted.
pub async fn revert(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<PublishedProductId>,
) -> Result<Json<PublishedProduct>, AppError> {
    let repo = ProductDescriptionRepository::new(state.pool());
    let record = repo.get_published(user.id, id).await?;
    if record.reverted_at.is_some() {
        return Err(AppError::Conflict("already reverted".to_string()));
    }

    let client = Connections::new(&state).shopify(record.website_id).await?;
    restore_product_description(&client, &record.product_id, &record.previous_html).await?;
    let reverted = repo.mark_reverted(record.id).await?;

    info!(published_id = %record.id, product_id = %record.product_id, "Product description reverted");
    Ok(Json(reverted))
}
