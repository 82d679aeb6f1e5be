//! Handler for the raw click event log.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};

use crate::api::dto::events::{EventQueryParams, EventsResponse};
use crate::api::dto::pagination::PaginationMeta;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::identity::tier_from_headers;

/// Retrieves the paginated click event log for a link.
///
/// # Endpoint
///
/// `GET /api/links/{id}/events`
///
/// # Query Parameters
///
/// - `page`, `page_size`: Pagination (default 1 / 25)
/// - `from`, `to` (optional): Clicked-at range (RFC3339)
/// - `country`, `device`, `browser` (optional): Exact-match filters
///
/// # Tier Gating
///
/// The event log is a `pro` feature; `free` callers receive an empty page
/// with `total_items` 0.
///
/// # Errors
///
/// Returns 404 Not Found if the link doesn't exist.
/// Returns 400 Bad Request if pagination or the date range is invalid.
pub async fn events_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<EventQueryParams>,
) -> Result<Json<EventsResponse>, AppError> {
    let tier = tier_from_headers(&headers)?;

    let page = params.pagination.page();
    let page_size = params.pagination.page_size();
    let filter = params.into_filter()?;

    let events = state.analytics_service.detail(id, tier, filter).await?;

    Ok(Json(EventsResponse {
        pagination: PaginationMeta::new(page, page_size, events.total),
        items: events.items.into_iter().map(Into::into).collect(),
    }))
}
