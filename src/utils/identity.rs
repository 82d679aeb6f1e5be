//! Caller identity headers.
//!
//! Authentication happens upstream; by the time a request reaches this
//! service the platform gateway has already resolved the caller and stamped
//! `X-Owner-Id` / `X-Owner-Tier` onto the request. These helpers only parse
//! what the gateway sent, they never decide who anyone is.

use axum::http::HeaderMap;
use serde_json::json;

use crate::domain::entities::Tier;
use crate::error::AppError;

pub const OWNER_ID_HEADER: &str = "x-owner-id";
pub const OWNER_TIER_HEADER: &str = "x-owner-tier";

/// Reads the owner id header. Absent means a guest request.
///
/// # Errors
///
/// Returns [`AppError::Validation`] when the header is present but not a
/// positive integer.
pub fn owner_id_from_headers(headers: &HeaderMap) -> Result<Option<i64>, AppError> {
    let Some(value) = headers.get(OWNER_ID_HEADER) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .map(Some)
        .ok_or_else(|| {
            AppError::bad_request(
                "Invalid X-Owner-Id header",
                json!({ "header": OWNER_ID_HEADER }),
            )
        })
}

/// Reads the owner id header, rejecting guest requests.
///
/// # Errors
///
/// Returns [`AppError::Validation`] when the header is missing or invalid.
pub fn require_owner_id(headers: &HeaderMap) -> Result<i64, AppError> {
    owner_id_from_headers(headers)?.ok_or_else(|| {
        AppError::bad_request(
            "X-Owner-Id header is required",
            json!({ "header": OWNER_ID_HEADER }),
        )
    })
}

/// Reads the subscription tier header, defaulting to `free` when absent.
///
/// # Errors
///
/// Returns [`AppError::Validation`] when the header is present but not a
/// known tier name.
pub fn tier_from_headers(headers: &HeaderMap) -> Result<Tier, AppError> {
    let Some(value) = headers.get(OWNER_TIER_HEADER) else {
        return Ok(Tier::Free);
    };

    value
        .to_str()
        .ok()
        .and_then(|s| s.trim().to_ascii_lowercase().parse::<Tier>().ok())
        .ok_or_else(|| {
            AppError::bad_request(
                "Invalid X-Owner-Tier header",
                json!({ "header": OWNER_TIER_HEADER, "expected": ["free", "pro"] }),
            )
        })
}
