//! Offline IP geolocation.
//!
//! Provides a [`GeoLocator`] trait with two implementations:
//! - [`MaxMindLocator`] - Local GeoLite2 City database lookups
//! - [`NullLocator`] - No-op implementation when no database is configured
//!
//! Lookups are synchronous and purely local; click ingestion must never
//! wait on an outbound network call for geo data.

mod maxmind;

pub use maxmind::MaxMindLocator;

use std::sync::Arc;

use tracing::{debug, warn};

/// Coarse geolocation for a single IP address.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoInfo {
    /// ISO 3166-1 alpha-2 country code (e.g. "US", "DE").
    pub country: Option<String>,
    pub city: Option<String>,
    /// First subdivision name (state, province, ...).
    pub region: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Trait for resolving an IP address to a coarse location.
///
/// Implementations must be cheap and local; a miss is `None`, never an
/// error the click pipeline would have to handle.
pub trait GeoLocator: Send + Sync {
    fn locate(&self, ip: &str) -> Option<GeoInfo>;

    /// Implementation name, for startup logging.
    fn name(&self) -> &'static str;
}

/// A locator that resolves nothing.
///
/// Used when no GeoLite2 database is configured or the file cannot be
/// opened; ingestion proceeds with empty geo columns.
pub struct NullLocator;

impl GeoLocator for NullLocator {
    fn locate(&self, _ip: &str) -> Option<GeoInfo> {
        None
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

/// Builds the locator for the configured database path.
///
/// Falls back to [`NullLocator`] with a warning when the path is unset or
/// the database cannot be opened, so a missing mmdb file never stops the
/// server from starting.
pub fn build_locator(db_path: Option<&str>) -> Arc<dyn GeoLocator> {
    match db_path {
        Some(path) => match MaxMindLocator::open(path) {
            Ok(locator) => {
                debug!(path, "GeoLite2 database loaded");
                Arc::new(locator)
            }
            Err(e) => {
                warn!(path, "failed to open GeoLite2 database, geo lookups disabled: {e}");
                Arc::new(NullLocator)
            }
        },
        None => {
            debug!("no GeoLite2 database configured, geo lookups disabled");
            Arc::new(NullLocator)
        }
    }
}
