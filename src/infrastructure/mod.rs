//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence and IP geolocation.
//!
//! # Modules
//!
//! - [`geo`] - MaxMind GeoIP lookups behind the [`crate::domain::repositories::GeoLocator`] trait
//! - [`persistence`] - PostgreSQL repository implementations

pub mod geo;
pub mod persistence;
