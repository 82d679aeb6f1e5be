//! Background lifecycle sweeps.
//!
//! The redirect pipeline already fixes up any link it actually sees; the
//! sweeps exist so links nobody clicks still converge to the right state,
//! and so old guest/FREE links get deleted on schedule.

use std::sync::Arc;

use chrono::{Duration, Utc};
use metrics::counter;
use tracing::info;

use crate::domain::entities::{FREE_RETENTION_DAYS, GUEST_RETENTION_DAYS};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Row counts from one status sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepOutcome {
    pub activated: u64,
    pub disabled: u64,
}

/// Runs the periodic batch transitions.
///
/// Both sweeps are idempotent: every statement carries its own guard
/// conditions, so overlapping runs (or a sweep racing the redirect
/// pipeline's lazy transitions) settle on the same end state.
pub struct SweepService {
    links: Arc<dyn LinkRepository>,
}

impl SweepService {
    /// Creates a new sweep service.
    pub fn new(links: Arc<dyn LinkRepository>) -> Self {
        Self { links }
    }

    /// Hourly pass: disable everything expired, then activate due
    /// scheduled links.
    ///
    /// Expiry goes first so a link that is both due and already expired is
    /// never briefly activated; the activation statement excludes expired
    /// rows as well, making the order a belt on top of braces.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn run_status_sweep(&self) -> Result<SweepOutcome, AppError> {
        let now = Utc::now();

        let disabled = self.links.disable_expired(now).await?;
        let activated = self.links.activate_due_scheduled(now).await?;

        counter!("sweep_links_disabled_total").increment(disabled);
        counter!("sweep_links_activated_total").increment(activated);

        if disabled > 0 || activated > 0 {
            info!(disabled, activated, "status sweep finished");
        }

        Ok(SweepOutcome { activated, disabled })
    }

    /// Daily pass: delete links past their retention window.
    ///
    /// Guest links go 30 days after creation, FREE links after 90, PRO
    /// links never. Deletion cascades the click events.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn run_retention_sweep(&self) -> Result<u64, AppError> {
        let now = Utc::now();

        let purged = self
            .links
            .purge_per_retention(
                now - Duration::days(GUEST_RETENTION_DAYS),
                now - Duration::days(FREE_RETENTION_DAYS),
            )
            .await?;

        counter!("sweep_links_purged_total").increment(purged);

        if purged > 0 {
            info!(purged, "retention sweep deleted links");
        }

        Ok(purged)
    }
}
