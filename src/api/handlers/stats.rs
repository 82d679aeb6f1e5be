//! Handler for aggregated link statistics.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};

use crate::api::dto::stats::{StatsResponse, SummaryQueryParams};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::identity::tier_from_headers;

/// Retrieves the aggregated statistics summary for a link.
///
/// # Endpoint
///
/// `GET /api/links/{id}/stats`
///
/// # Query Parameters
///
/// - `from` (optional): Start of the range (RFC3339)
/// - `to` (optional): End of the range (RFC3339)
///
/// Without an explicit range the chart is windowed by tier (7 days for
/// `free`, 90 for `pro`) and totals come from the link's counters. With a
/// range, everything is computed from the event log over that range.
///
/// # Tier Gating
///
/// `free` callers get totals, the daily chart and top countries. City,
/// device, browser and referrer breakdowns come back empty below `pro`.
///
/// # Errors
///
/// Returns 404 Not Found if the link doesn't exist.
/// Returns 400 Bad Request if the date range is invalid.
pub async fn stats_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SummaryQueryParams>,
) -> Result<Json<StatsResponse>, AppError> {
    params.date_filter.validate_range()?;
    let tier = tier_from_headers(&headers)?;

    let summary = state
        .analytics_service
        .summary(id, tier, params.date_filter.from, params.date_filter.to)
        .await?;

    Ok(Json(StatsResponse::from_summary(id, summary)))
}
