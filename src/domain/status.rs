//! Pure, time-dependent status evaluation for links.
//!
//! The stored `status` column can lag behind reality between sweep runs, so
//! every display or resolution decision goes through [`effective_status`]
//! with an explicit `now` instead of trusting the column. The sweep jobs
//! persist the same answers back in batch.

use chrono::{DateTime, Utc};

use crate::domain::entities::{Link, LinkStatus};

/// Evaluates the status a link has *right now*, regardless of what the
/// stored column says.
///
/// Precedence mirrors the redirect guard pipeline: blocked beats archived
/// beats disabled beats expiry beats scheduling beats click limit. A
/// `SCHEDULED` link whose go-live time has passed evaluates as `ACTIVE`
/// (or `DISABLED` if its click limit is already spent).
pub fn effective_status(link: &Link, now: DateTime<Utc>) -> LinkStatus {
    if link.status == LinkStatus::Blocked {
        return LinkStatus::Blocked;
    }
    if link.is_archived || link.status == LinkStatus::Archived {
        return LinkStatus::Archived;
    }
    if link.status == LinkStatus::Disabled {
        return LinkStatus::Disabled;
    }
    if link.is_expired_at(now) {
        return LinkStatus::Disabled;
    }
    if link.status == LinkStatus::Scheduled && link.is_pending_at(now) {
        return LinkStatus::Scheduled;
    }
    if link.limit_reached() {
        return LinkStatus::Disabled;
    }
    LinkStatus::Active
}

/// Status assigned at creation time: `SCHEDULED` when the go-live time is in
/// the future, `ACTIVE` otherwise.
pub fn initial_status(scheduled_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> LinkStatus {
    match scheduled_at {
        Some(at) if now < at => LinkStatus::Scheduled,
        _ => LinkStatus::Active,
    }
}

/// Status after an explicit unarchive/unblock, or after scheduling fields
/// change on edit: `DISABLED` if already expired, `SCHEDULED` if the go-live
/// time is still ahead, `ACTIVE` otherwise.
pub fn rederive_status(
    scheduled_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> LinkStatus {
    if expires_at.is_some_and(|e| now >= e) {
        return LinkStatus::Disabled;
    }
    match scheduled_at {
        Some(at) if now < at => LinkStatus::Scheduled,
        _ => LinkStatus::Active,
    }
}
