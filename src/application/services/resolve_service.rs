//! Redirect resolution: the ordered guard pipeline.
//!
//! Every redirect and password verification runs the same checks in the
//! same order, so precedence between overlapping conditions (a blocked
//! *and* expired link, say) is fixed and observable: blocked wins over
//! archived wins over expired wins over scheduling wins over limits.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::warn;

use crate::domain::entities::{Link, LinkStatus};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::password::verify_password;

/// Outcome of a successful resolution.
#[derive(Debug)]
pub enum ResolveOutcome {
    /// The caller may follow the redirect.
    Redirect {
        link: Link,
        /// Present when the destination failed a safety scan.
        warning: Option<String>,
    },
    /// The link is healthy but gated behind a password; no redirect and no
    /// click until the password is verified.
    PasswordRequired { link: Link },
}

/// Service deciding whether a short code may redirect right now.
///
/// State checks that trip (expiry, spent click limit) persist their
/// transition on the spot rather than waiting for the background sweep;
/// persistence is best effort and never changes the decision already made.
pub struct ResolveService {
    links: Arc<dyn LinkRepository>,
}

impl ResolveService {
    /// Creates a new resolve service.
    pub fn new(links: Arc<dyn LinkRepository>) -> Self {
        Self { links }
    }

    /// Resolves a short code or custom alias for redirecting.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown code and
    /// [`AppError::Forbidden`] with a stable reason (`"blocked"`,
    /// `"inactive"`, `"expired"`, `"not yet active"`, `"limit reached"`,
    /// `"already used"`) when the link exists but must not redirect.
    pub async fn resolve(&self, code: &str) -> Result<ResolveOutcome, AppError> {
        let link = self.guard(code, Utc::now()).await?;

        if link.has_password() {
            return Ok(ResolveOutcome::PasswordRequired { link });
        }

        Ok(ResolveOutcome::Redirect {
            warning: scan_warning(&link),
            link,
        })
    }

    /// Verifies the password for a gated link.
    ///
    /// The full guard pipeline runs again first: a link that expired
    /// between showing the password prompt and submitting it fails here
    /// exactly as it would on a fresh resolve.
    ///
    /// # Errors
    ///
    /// Everything [`Self::resolve`] returns, plus
    /// [`AppError::Forbidden`] (reason `"invalid password"`) on a wrong
    /// password and [`AppError::Validation`] when the link is not password
    /// protected at all.
    pub async fn verify_password(
        &self,
        code: &str,
        password: &str,
    ) -> Result<ResolveOutcome, AppError> {
        let link = self.guard(code, Utc::now()).await?;

        let Some(hash) = link.password_hash.as_deref() else {
            return Err(AppError::bad_request(
                "Link is not password protected",
                json!({ "code": code }),
            ));
        };

        if !verify_password(password, hash)? {
            return Err(AppError::forbidden("invalid password", json!({})));
        }

        Ok(ResolveOutcome::Redirect {
            warning: scan_warning(&link),
            link,
        })
    }

    /// Runs the ordered state checks shared by both entry points.
    ///
    /// Order is load-bearing; see the module docs.
    async fn guard(&self, code: &str, now: DateTime<Utc>) -> Result<Link, AppError> {
        let link = self
            .links
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "code": code })))?;

        if link.status == LinkStatus::Blocked {
            return Err(AppError::forbidden("blocked", json!({ "code": code })));
        }

        if link.is_archived || link.status == LinkStatus::Disabled {
            return Err(AppError::forbidden("inactive", json!({ "code": code })));
        }

        if link.is_expired_at(now) {
            if let Err(e) = self.links.disable_if_expired(link.id, now).await {
                warn!(link_id = link.id, "failed to persist expiry: {e}");
            }
            return Err(AppError::forbidden("expired", json!({ "code": code })));
        }

        if link.status == LinkStatus::Scheduled {
            if link.is_pending_at(now) {
                return Err(AppError::forbidden("not yet active", json!({ "code": code })));
            }

            // Go-live time passed but the sweep has not caught up yet.
            if let Err(e) = self.links.activate_if_due(link.id, now).await {
                warn!(link_id = link.id, "failed to persist activation: {e}");
            }
        }

        if link.limit_reached() {
            if let Err(e) = self.links.disable_if_limit_reached(link.id).await {
                warn!(link_id = link.id, "failed to persist limit exhaustion: {e}");
            }
            return Err(AppError::forbidden("limit reached", json!({ "code": code })));
        }

        if link.is_one_time && link.click_count >= 1 {
            return Err(AppError::forbidden("already used", json!({ "code": code })));
        }

        Ok(link)
    }
}

fn scan_warning(link: &Link) -> Option<String> {
    match link.scan_status.as_deref() {
        Some("suspicious") | Some("malicious") => {
            Some("Destination flagged as potentially unsafe".to_string())
        }
        _ => None,
    }
}
