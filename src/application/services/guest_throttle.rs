//! Rolling-window creation quota for anonymous users.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::debug;

use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Links a single guest IP may create inside the rolling window.
pub const GUEST_LINK_CAP: i64 = 5;

/// Width of the rolling window, in hours.
pub const GUEST_WINDOW_HOURS: i64 = 24;

/// Per-IP quota on guest link creation.
///
/// The window rolls: each attempt counts guest links created by the same IP
/// in the preceding 24 hours, so slots free up one by one as old creations
/// age out rather than all at once at midnight.
pub struct GuestThrottle {
    links: Arc<dyn LinkRepository>,
    cap: i64,
}

impl GuestThrottle {
    /// Creates a throttle with the default cap.
    pub fn new(links: Arc<dyn LinkRepository>) -> Self {
        Self::with_cap(links, GUEST_LINK_CAP)
    }

    /// Creates a throttle with a custom cap (used by config overrides).
    pub fn with_cap(links: Arc<dyn LinkRepository>, cap: i64) -> Self {
        Self { links, cap }
    }

    /// Admits or rejects one guest creation attempt from `ip`.
    ///
    /// Counting happens at admission time; the caller inserts the link
    /// afterwards. Two racing requests can therefore both pass on the last
    /// slot, which is accepted: the quota is an abuse brake, not an exact
    /// ledger.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::TooManyRequests`] when the cap is spent.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn check_and_admit(&self, ip: &str) -> Result<(), AppError> {
        let since = Utc::now() - Duration::hours(GUEST_WINDOW_HOURS);
        let created = self.links.count_guest_links_since(ip, since).await?;

        if created >= self.cap {
            debug!(ip, created, cap = self.cap, "guest creation quota spent");
            return Err(AppError::too_many_requests(
                "Guest link limit reached, try again later",
                json!({ "cap": self.cap, "window_hours": GUEST_WINDOW_HOURS }),
            ));
        }

        Ok(())
    }
}
