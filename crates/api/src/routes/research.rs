//! Keyword research through Serper.

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::research::SearchResults;
use crate::state::AppState;

const DEFAULT_RESULTS: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct ResearchRequest {
    pub query: String,
    pub num: Option<u32>,
}

/// POST /api/research
///
/// # Errors
///
/// 400 for a blank query or when no Serper key is configured, 502 if
/// Serper fails.
pub async fn search(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Json(body): Json<ResearchRequest>,
) -> Result<Json<SearchResults>, AppError> {
    let query = body.query.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("query is required".to_string()));
    }
    let serper = state
        .serper()
        .ok_or_else(|| AppError::BadRequest("research is not configured".to_string()))?;

    let results = serper
        .search(query, body.num.unwrap_or(DEFAULT_RESULTS))
        .await?;
    Ok(Json(results))
}
