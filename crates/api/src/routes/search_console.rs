//! Search Console performance reports.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use contentforge_core::WebsiteId;

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::routes::websites::owned_website;
use crate::search_console::{DIMENSIONS, PerformanceRow, SearchAnalyticsQuery};
use crate::services::Connections;
use crate::state::AppState;

const DEFAULT_DAYS: u32 = 28;
const MAX_DAYS: u32 = 480;
const ROW_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct PerformanceQuery {
    pub days: Option<u32>,
    pub dimension: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PerformanceResponse {
    pub site_url: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub dimension: String,
    pub rows: Vec<PerformanceRow>,
}

/// `days` full days ending yesterday. Today's data is always incomplete.
fn report_window(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    let end = today - Days::new(1);
    let start = end - Days::new(u64::from(days.saturating_sub(1)));
    (start, end)
}

fn validate(query: &PerformanceQuery) -> Result<(u32, String), AppError> {
    let days = query.days.unwrap_or(DEFAULT_DAYS);
    if !(1..=MAX_DAYS).contains(&days) {
        return Err(AppError::BadRequest(format!(
            "days must be between 1 and {MAX_DAYS}"
        )));
    }

    let dimension = query
        .dimension
        .as_deref()
        .map_or("query", str::trim)
        .to_ascii_lowercase();
    if !DIMENSIONS.contains(&dimension.as_str()) {
        return Err(AppError::BadRequest(format!(
            "dimension must be one of {}",
            DIMENSIONS.join(", ")
        )));
    }
    Ok((days, dimension))
}

/// Clicks, impressions, CTR and position grouped by one dimension.
///
/// GET /api/websites/{id}/search-console/performance?days=28&dimension=query
///
/// # Errors
///
/// 400 for out-of-range parameters or a missing connection, 404 for a
/// foreign website, 502 if Google rejects the query.
pub async fn performance(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(website_id): Path<WebsiteId>,
    Query(query): Query<PerformanceQuery>,
) -> Result<Json<PerformanceResponse>, AppError> {
    let (days, dimension) = validate(&query)?;
    let website = owned_website(&state, user.id, website_id).await?;
    let (client, site_url) = Connections::new(&state).search_console(website.id).await?;

    let (start_date, end_date) = report_window(Utc::now().date_naive(), days);
    let rows = client
        .query(
            &site_url,
            &SearchAnalyticsQuery {
                start_date: start_date.format("%Y-%m-%d").to_string(),
                end_date: end_date.format("%Y-%m-%d").to_string(),
                dimensions: vec![dimension.clone()],
                row_limit: ROW_LIMIT,
            },
        )
        .await?;

    Ok(Json(PerformanceResponse {
        site_url,
        start_date,
        end_date,
        dimension,
        rows,
    }))
}
