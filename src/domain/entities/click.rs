//! Click event entity: one immutable row per resolved redirect.

use chrono::{DateTime, Utc};

/// A click event recorded after a successful redirect.
///
/// Captures parsed client metadata (browser, OS, device), coarse geolocation
/// and campaign attribution alongside the raw request data. Raw `ip_address`
/// is stored unmasked; every outward read must pass it through the masking
/// helper first.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub id: i64,
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    /// One-way fingerprint of (ip, user agent); collisions are accepted noise.
    pub visitor_id: String,
    /// True iff this was the first event with this visitor id for the link.
    pub is_unique: bool,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub device: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub referrer: Option<String>,
    pub referrer_domain: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
}

/// Input data for appending a click event.
///
/// Carries no `is_unique` flag: the repository decides uniqueness at insert
/// time, where the first write for a `(link_id, visitor_id)` pair can be
/// serialized properly.
#[derive(Debug, Clone)]
pub struct NewClickEvent {
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub visitor_id: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub device: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub referrer: Option<String>,
    pub referrer_domain: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
}

impl NewClickEvent {
    /// Minimal event with only the required fields set.
    pub fn bare(link_id: i64, visitor_id: impl Into<String>, clicked_at: DateTime<Utc>) -> Self {
        Self {
            link_id,
            clicked_at,
            visitor_id: visitor_id.into(),
            ip_address: None,
            user_agent: None,
            browser: None,
            os: None,
            device: None,
            country: None,
            city: None,
            region: None,
            latitude: None,
            longitude: None,
            referrer: None,
            referrer_domain: None,
            utm_source: None,
            utm_medium: None,
            utm_campaign: None,
            utm_term: None,
            utm_content: None,
        }
    }
}
