//! Handlers for link management endpoints.

use axum::{
    Json,
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use std::net::SocketAddr;
use validator::Validate;

use crate::api::dto::links::{
    CreateLinkRequest, LinkListResponse, LinkResponse, UpdateLinkRequest,
};
use crate::api::dto::pagination::{PaginationMeta, PaginationParams};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::identity::{owner_id_from_headers, require_owner_id, tier_from_headers};
use crate::utils::ip::client_ip;

/// Creates a short link.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Identity
///
/// Authentication happens upstream; this service trusts the `X-Owner-Id`
/// and `X-Owner-Tier` headers it is handed. Requests without an owner id
/// create guest links, which are throttled per client IP and expire per
/// the guest retention window.
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/very/long/path",
///   "custom_alias": "my-promo",          // optional
///   "password": "hunter2",               // optional
///   "scheduled_at": "2026-09-01T00:00:00Z",  // optional
///   "expires_at": "2026-12-31T23:59:59Z",    // optional
///   "click_limit": 1000,                 // optional
///   "is_one_time": false                 // optional
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request if validation fails.
/// Returns 409 Conflict if the custom alias is already taken.
/// Returns 429 Too Many Requests when a guest exceeds the daily quota.
pub async fn create_link_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;

    let owner_id = owner_id_from_headers(&headers)?;
    let tier = tier_from_headers(&headers)?;
    let creator_ip = client_ip(&headers, Some(addr));

    let link = state
        .link_service
        .create_link(payload.into_input(owner_id, tier, creator_ip))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LinkResponse::from_entity(&link, &state.base_url)),
    ))
}

/// Lists the caller's links, newest first.
///
/// # Endpoint
///
/// `GET /api/links?page=1&page_size=25`
///
/// # Errors
///
/// Returns 400 Bad Request if `X-Owner-Id` is missing or pagination
/// parameters are invalid.
pub async fn list_links_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PaginationParams>,
) -> Result<Json<LinkListResponse>, AppError> {
    let owner_id = require_owner_id(&headers)?;
    let (offset, limit) = params.validate_and_get_offset_limit()?;

    let (links, total) = state
        .link_service
        .list_links(owner_id, offset, limit)
        .await?;

    let links = links
        .iter()
        .map(|link| LinkResponse::from_entity(link, &state.base_url))
        .collect();

    Ok(Json(LinkListResponse {
        links,
        pagination: PaginationMeta::new(params.page(), params.page_size(), total),
    }))
}

/// Fetches a single link by id.
///
/// # Endpoint
///
/// `GET /api/links/{id}`
///
/// # Errors
///
/// Returns 404 Not Found if the link doesn't exist.
pub async fn get_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.get_link(id).await?;
    Ok(Json(LinkResponse::from_entity(&link, &state.base_url)))
}

/// Partially updates a link.
///
/// # Endpoint
///
/// `PATCH /api/links/{id}`
///
/// # Request Body
///
/// All fields are optional. Only provided fields are changed; explicit
/// `null` clears the nullable ones.
///
/// ```json
/// {
///   "url": "https://new-destination.com",
///   "expires_at": null,        // clears the expiry
///   "custom_alias": "fresh",
///   "password": null,          // removes the password
///   "click_limit": 500,
///   "is_one_time": true
/// }
/// ```
///
/// Lifecycle fields are re-derived after the patch, so clearing an expiry
/// on an expired link reactivates it.
///
/// # Errors
///
/// Returns 404 Not Found if the link doesn't exist.
/// Returns 400 Bad Request if validation fails.
/// Returns 409 Conflict if the new alias is already taken.
pub async fn update_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .update_link(id, payload.into_input())
        .await?;

    Ok(Json(LinkResponse::from_entity(&link, &state.base_url)))
}

/// Permanently deletes a link and its click history.
///
/// # Endpoint
///
/// `DELETE /api/links/{id}`
///
/// # Errors
///
/// Returns 404 Not Found if the link doesn't exist.
pub async fn delete_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete_link(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Archives a link. Archived links stop resolving but keep their stats.
///
/// # Endpoint
///
/// `POST /api/links/{id}/archive`
pub async fn archive_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.archive(id).await?;
    Ok(Json(LinkResponse::from_entity(&link, &state.base_url)))
}

/// Restores an archived link to its derived lifecycle state.
///
/// # Endpoint
///
/// `POST /api/links/{id}/unarchive`
pub async fn unarchive_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.unarchive(id).await?;
    Ok(Json(LinkResponse::from_entity(&link, &state.base_url)))
}

/// Blocks a link for abuse. A blocked link never resolves until unblocked.
///
/// # Endpoint
///
/// `POST /api/links/{id}/block`
pub async fn block_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.block(id).await?;
    Ok(Json(LinkResponse::from_entity(&link, &state.base_url)))
}

/// Lifts a block, returning the link to its derived lifecycle state.
///
/// # Endpoint
///
/// `POST /api/links/{id}/unblock`
pub async fn unblock_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.unblock(id).await?;
    Ok(Json(LinkResponse::from_entity(&link, &state.base_url)))
}
