//! Handlers for the public resolution endpoints: the redirect itself and
//! password verification for gated links.

use axum::{
    Json,
    extract::{ConnectInfo, Path, RawQuery, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use metrics::counter;
use std::net::SocketAddr;
use tracing::debug;
use validator::Validate;

use crate::api::dto::resolve::{
    PasswordRequiredResponse, ResolvedLinkResponse, VerifyPasswordRequest,
};
use crate::application::services::ResolveOutcome;
use crate::domain::click_message::ClickMessage;
use crate::domain::entities::Link;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::ip::client_ip;

/// Name of the response header carrying a safety warning on flagged links.
pub const WARNING_HEADER: &str = "x-link-warning";

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Resolve the code through the lifecycle rules (scheduling, expiry,
///    click limits, archive and block states)
/// 2. Send a click event to the background worker
/// 3. Return 307 Temporary Redirect
///
/// Password-protected links short-circuit before step 2: the response is
/// **401 Unauthorized** with a JSON body telling the caller to POST the
/// password to `/{code}/verify`, and no click is recorded.
///
/// # Click Tracking
///
/// Click events are sent to a bounded channel for async processing.
/// If the queue is full, the click is dropped (fire-and-forget).
///
/// # Errors
///
/// Returns 404 Not Found if the code doesn't exist.
/// Returns 403 Forbidden if the link is archived, disabled, blocked,
/// expired, spent, or not yet active.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Response, AppError> {
    let outcome = match state.resolve_service.resolve(&code).await {
        Ok(outcome) => outcome,
        Err(err) => {
            counter!("resolves_total", "outcome" => resolve_outcome_label(&err)).increment(1);
            return Err(err);
        }
    };

    match outcome {
        ResolveOutcome::Redirect { link, warning } => {
            counter!("resolves_total", "outcome" => "redirect").increment(1);
            enqueue_click(&state, &link, &headers, Some(addr), query.as_deref());

            let mut response = Redirect::temporary(&link.original_url).into_response();
            if let Some(warning) = warning
                && let Ok(value) = HeaderValue::from_str(&warning)
            {
                response.headers_mut().insert(WARNING_HEADER, value);
            }
            Ok(response)
        }
        ResolveOutcome::PasswordRequired { link } => {
            counter!("resolves_total", "outcome" => "password_required").increment(1);
            let body = PasswordRequiredResponse::for_code(link.visible_code());
            Ok((StatusCode::UNAUTHORIZED, Json(body)).into_response())
        }
    }
}

/// Verifies the password of a protected link and returns its destination.
///
/// # Endpoint
///
/// `POST /{code}/verify`
///
/// The destination comes back in the body instead of a 307 because a
/// redirect answer to a POST would make the client replay the password
/// against the target.
///
/// A successful verification counts as the click for this visit.
///
/// # Errors
///
/// Returns 403 Forbidden if the password is wrong.
/// Returns 400 Bad Request if the link has no password.
/// Lifecycle errors are the same as for the redirect endpoint.
pub async fn verify_password_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<VerifyPasswordRequest>,
) -> Result<Json<ResolvedLinkResponse>, AppError> {
    payload.validate()?;

    let outcome = match state
        .resolve_service
        .verify_password(&code, &payload.password)
        .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            counter!("resolves_total", "outcome" => resolve_outcome_label(&err)).increment(1);
            return Err(err);
        }
    };

    let ResolveOutcome::Redirect { link, warning } = outcome else {
        return Err(AppError::internal(
            "Password verification produced no destination",
            serde_json::json!({ "code": code }),
        ));
    };

    counter!("resolves_total", "outcome" => "verified").increment(1);
    enqueue_click(&state, &link, &headers, Some(addr), None);

    Ok(Json(ResolvedLinkResponse {
        original_url: link.original_url,
        warning,
    }))
}

/// Builds a click message from the request and hands it to the worker
/// queue. Queue-full is not an error for the visitor.
fn enqueue_click(
    state: &AppState,
    link: &Link,
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    query: Option<&str>,
) {
    let message = ClickMessage::new(
        link.id,
        Utc::now(),
        client_ip(headers, peer),
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok()),
        headers.get(header::REFERER).and_then(|v| v.to_str().ok()),
        query,
    );

    if state.click_sender.try_send(message).is_err() {
        counter!("click_queue_dropped_total").increment(1);
        debug!(link_id = link.id, "Click queue full, dropping event");
    }
}

/// Maps resolution failures onto the `outcome` label of `resolves_total`.
fn resolve_outcome_label(err: &AppError) -> &'static str {
    match err {
        AppError::NotFound { .. } => "not_found",
        AppError::Forbidden { .. } => "denied",
        _ => "error",
    }
}
