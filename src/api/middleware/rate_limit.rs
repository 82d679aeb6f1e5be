//! Rate limiting middleware using token bucket algorithm.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{KeyExtractor, PeerIpKeyExtractor, SmartIpKeyExtractor},
};

/// Public endpoints (redirect, password verification): 2 requests per
/// second with a burst of 100.
const PUBLIC_PER_SECOND: u64 = 2;
const PUBLIC_BURST: u32 = 100;

/// Management endpoints under `/api`: 1 request per second with a burst
/// of 10.
const SECURE_PER_SECOND: u64 = 1;
const SECURE_BURST: u32 = 10;

fn build<K>(
    key_extractor: K,
    per_second: u64,
    burst_size: u32,
) -> GovernorLayer<K, NoOpMiddleware<QuantaInstant>, axum::body::Body>
where
    K: KeyExtractor,
{
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(key_extractor)
            .per_second(per_second)
            .burst_size(burst_size)
            .finish()
            .unwrap(),
    );

    GovernorLayer::new(governor_conf)
}

/// Creates a rate limiter for public endpoints.
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
/// Rate limits are applied per client IP taken from the socket peer
/// address.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/{code}", get(redirect_handler))
///     .layer(rate_limit::layer());
/// ```
pub fn layer() -> GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>
{
    build(PeerIpKeyExtractor, PUBLIC_PER_SECOND, PUBLIC_BURST)
}

/// Public-endpoint limiter for deployments behind a reverse proxy: keys
/// on `X-Forwarded-For`/`X-Real-Ip`/`Forwarded` before falling back to
/// the peer address.
pub fn proxy_layer()
-> GovernorLayer<SmartIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body> {
    build(SmartIpKeyExtractor, PUBLIC_PER_SECOND, PUBLIC_BURST)
}

/// Creates a stricter rate limiter for management endpoints.
///
/// # Example
///
/// ```rust,ignore
/// let api = Router::new()
///     .route("/links", post(create_link_handler))
///     .layer(rate_limit::secure_layer());
/// ```
pub fn secure_layer()
-> GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body> {
    build(PeerIpKeyExtractor, SECURE_PER_SECOND, SECURE_BURST)
}

/// Management-endpoint limiter for deployments behind a reverse proxy.
pub fn secure_proxy_layer()
-> GovernorLayer<SmartIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body> {
    build(SmartIpKeyExtractor, SECURE_PER_SECOND, SECURE_BURST)
}
