//! Link entity: the mapping between a short code and its destination URL,
//! together with every lifecycle attribute the redirect pipeline consults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Days a guest link survives before the retention sweep deletes it.
pub const GUEST_RETENTION_DAYS: i64 = 30;

/// Days a FREE-tier link survives before the retention sweep deletes it.
/// PRO links are kept indefinitely.
pub const FREE_RETENTION_DAYS: i64 = 90;

/// Subscription tier of the link owner at creation time.
///
/// The tier is snapshotted onto the link so analytics gating and retention
/// sweeps never need a join against an accounts table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
        }
    }

    /// Breakdown rows returned per dimension in the stats summary.
    pub fn top_n(&self) -> usize {
        match self {
            Tier::Free => 5,
            Tier::Pro => 10,
        }
    }

    /// Length of the daily click chart window, in days.
    pub fn chart_days(&self) -> i64 {
        match self {
            Tier::Free => 7,
            Tier::Pro => 90,
        }
    }

    /// How long links on this tier live before the daily retention sweep
    /// deletes them. `None` means they are kept indefinitely.
    pub fn retention_days(&self) -> Option<i64> {
        match self {
            Tier::Free => Some(FREE_RETENTION_DAYS),
            Tier::Pro => None,
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Tier::Free),
            "pro" => Ok(Tier::Pro),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored lifecycle state of a link.
///
/// `Blocked` and `Archived` are imposed by an administrator or the owner and
/// never transition away on their own. `Disabled` is left behind by expiry or
/// a spent click limit and only explicit unarchive/unblock re-derives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LinkStatus {
    Active,
    Scheduled,
    Disabled,
    Archived,
    Blocked,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Active => "ACTIVE",
            LinkStatus::Scheduled => "SCHEDULED",
            LinkStatus::Disabled => "DISABLED",
            LinkStatus::Archived => "ARCHIVED",
            LinkStatus::Blocked => "BLOCKED",
        }
    }
}

impl FromStr for LinkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(LinkStatus::Active),
            "SCHEDULED" => Ok(LinkStatus::Scheduled),
            "DISABLED" => Ok(LinkStatus::Disabled),
            "ARCHIVED" => Ok(LinkStatus::Archived),
            "BLOCKED" => Ok(LinkStatus::Blocked),
            other => Err(format!("unknown link status: {other}")),
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shortened URL link with its full lifecycle state.
///
/// Both `short_code` and `custom_alias` resolve to this link; the alias is
/// the vanity name, the code is the generated one. Click counters live on the
/// row itself so the redirect path can increment them with a single
/// conditional update.
#[derive(Debug, Clone)]
pub struct Link {
    pub id: i64,
    /// `None` for guest-created links.
    pub owner_id: Option<i64>,
    pub owner_tier: Tier,
    pub original_url: String,
    pub short_code: String,
    pub custom_alias: Option<String>,
    pub status: LinkStatus,
    /// Verdict of the destination scanner: `pending`, `clean`, `suspicious`
    /// or `malicious`. Opaque to the lifecycle engine except for warnings.
    pub scan_status: Option<String>,
    pub scan_score: Option<f64>,
    pub scan_details: Option<String>,
    pub scanned_at: Option<DateTime<Utc>>,
    pub password_hash: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub click_limit: Option<i32>,
    pub is_one_time: bool,
    pub is_archived: bool,
    pub click_count: i64,
    pub unique_click_count: i64,
    pub last_clicked_at: Option<DateTime<Utc>>,
    /// IP the link was created from; used for the guest creation quota.
    pub creator_ip: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Link {
    /// The code shown to the owner: the vanity alias when one is set.
    pub fn visible_code(&self) -> &str {
        self.custom_alias.as_deref().unwrap_or(&self.short_code)
    }

    /// Returns true if the link was created without an account.
    pub fn is_guest(&self) -> bool {
        self.owner_id.is_none()
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Returns true if the link has passed its expiry time at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Returns true if the link has a go-live time that is still in the future.
    pub fn is_pending_at(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_at.is_some_and(|s| now < s)
    }

    /// Returns true if the click limit is set and spent.
    pub fn limit_reached(&self) -> bool {
        self.click_limit
            .is_some_and(|limit| self.click_count >= i64::from(limit))
    }

    /// How many days after creation the retention sweep may delete this
    /// link. Guest links get the short window regardless of the tier column.
    pub fn retention_days(&self) -> Option<i64> {
        if self.is_guest() {
            Some(GUEST_RETENTION_DAYS)
        } else {
            self.owner_tier.retention_days()
        }
    }
}

/// Input data for creating a new link.
///
/// `status` is derived by the service from `scheduled_at` before insert;
/// the repository stores it verbatim.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub owner_id: Option<i64>,
    pub owner_tier: Tier,
    pub original_url: String,
    pub short_code: String,
    pub custom_alias: Option<String>,
    pub status: LinkStatus,
    pub password_hash: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub click_limit: Option<i32>,
    pub is_one_time: bool,
    pub creator_ip: Option<String>,
}

/// Partial update for an existing link.
///
/// `None` fields are left unchanged. Double-option fields distinguish
/// "leave as is" (`None`) from "clear" (`Some(None)`) from "set"
/// (`Some(Some(v))`).
#[derive(Debug, Clone, Default)]
pub struct LinkPatch {
    pub original_url: Option<String>,
    pub custom_alias: Option<Option<String>>,
    pub password_hash: Option<Option<String>>,
    pub scheduled_at: Option<Option<DateTime<Utc>>>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub click_limit: Option<Option<i32>>,
    pub is_one_time: Option<bool>,
    /// Recomputed by the service when scheduling fields change; never taken
    /// from client input directly.
    pub status: Option<LinkStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_link() -> Link {
        let now = Utc::now();
        Link {
            id: 1,
            owner_id: Some(10),
            owner_tier: Tier::Free,
            original_url: "https://example.com/docs".to_string(),
            short_code: "Xy7mK2p".to_string(),
            custom_alias: None,
            status: LinkStatus::Active,
            scan_status: None,
            scan_score: None,
            scan_details: None,
            scanned_at: None,
            password_hash: None,
            scheduled_at: None,
            expires_at: None,
            click_limit: None,
            is_one_time: false,
            is_archived: false,
            click_count: 0,
            unique_click_count: 0,
            last_clicked_at: None,
            creator_ip: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_visible_code_prefers_alias() {
        let mut link = sample_link();
        assert_eq!(link.visible_code(), "Xy7mK2p");

        link.custom_alias = Some("my-campaign".to_string());
        assert_eq!(link.visible_code(), "my-campaign");
    }

    #[test]
    fn test_is_expired_at() {
        let now = Utc::now();
        let mut link = sample_link();
        assert!(!link.is_expired_at(now));

        link.expires_at = Some(now - Duration::seconds(1));
        assert!(link.is_expired_at(now));

        link.expires_at = Some(now + Duration::hours(1));
        assert!(!link.is_expired_at(now));
    }

    #[test]
    fn test_is_pending_at() {
        let now = Utc::now();
        let mut link = sample_link();
        assert!(!link.is_pending_at(now));

        link.scheduled_at = Some(now + Duration::hours(1));
        assert!(link.is_pending_at(now));

        link.scheduled_at = Some(now - Duration::hours(1));
        assert!(!link.is_pending_at(now));
    }

    #[test]
    fn test_limit_reached() {
        let mut link = sample_link();
        assert!(!link.limit_reached());

        link.click_limit = Some(100);
        link.click_count = 99;
        assert!(!link.limit_reached());

        link.click_count = 100;
        assert!(link.limit_reached());

        link.click_count = 150;
        assert!(link.limit_reached());
    }

    #[test]
    fn test_retention_guest_overrides_tier() {
        let mut link = sample_link();
        link.owner_id = None;
        link.owner_tier = Tier::Pro;
        assert_eq!(link.retention_days(), Some(30));

        link.owner_id = Some(10);
        assert_eq!(link.retention_days(), None);

        link.owner_tier = Tier::Free;
        assert_eq!(link.retention_days(), Some(90));
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            LinkStatus::Active,
            LinkStatus::Scheduled,
            LinkStatus::Disabled,
            LinkStatus::Archived,
            LinkStatus::Blocked,
        ] {
            assert_eq!(status.as_str().parse::<LinkStatus>(), Ok(status));
        }
        assert!("active".parse::<LinkStatus>().is_err());
    }

    #[test]
    fn test_tier_gating_values() {
        assert_eq!(Tier::Free.top_n(), 5);
        assert_eq!(Tier::Pro.top_n(), 10);
        assert_eq!(Tier::Free.chart_days(), 7);
        assert_eq!(Tier::Pro.chart_days(), 90);
        assert_eq!(Tier::Free.retention_days(), Some(90));
        assert_eq!(Tier::Pro.retention_days(), None);
    }
}
