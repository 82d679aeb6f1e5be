//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`         - Short link redirect (public)
//! - `POST /{code}/verify`  - Password verification for gated links (public)
//! - `GET  /health`         - Health check: DB, click queue (public)
//! - `/api/*`               - Link management and analytics
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket: a generous grade for the
//!   public resolution pair, a stricter one for everything under `/api`
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler, verify_password_handler};
use crate::api::middleware::{rate_limit, tracing};
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `behind_proxy` - when `true`, rate limiting reads client IP from
///   `X-Forwarded-For` / `X-Real-IP` headers instead of the peer socket
///   address; enable only when the service runs behind a trusted reverse
///   proxy
pub fn app_router(state: AppState, behind_proxy: bool) -> NormalizePath<Router> {
    let resolve_routes = Router::new()
        .route("/{code}", get(redirect_handler))
        .route("/{code}/verify", post(verify_password_handler));
    let resolve_routes = if behind_proxy {
        resolve_routes.layer(rate_limit::proxy_layer())
    } else {
        resolve_routes.layer(rate_limit::layer())
    };

    let api_router = if behind_proxy {
        api::routes::api_routes().layer(rate_limit::secure_proxy_layer())
    } else {
        api::routes::api_routes().layer(rate_limit::secure_layer())
    };

    let router = Router::new()
        .route("/health", get(health_handler))
        .merge(resolve_routes)
        .nest("/api", api_router)
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
