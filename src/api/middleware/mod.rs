//! HTTP middleware for request processing and protection.
//!
//! Provides rate limiting and observability middleware. Authentication
//! happens upstream of this service.

pub mod rate_limit;
pub mod tracing;
