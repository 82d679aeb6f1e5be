//! Click message passed from HTTP handlers to the background worker.

use chrono::{DateTime, Utc};

/// Raw request metadata captured at redirect time for async processing.
///
/// Handlers build one of these and push it onto a bounded channel so the
/// redirect response never waits on analytics writes. The worker turns it
/// into a recorded click plus an enriched click event.
///
/// `clicked_at` is stamped in the handler, not the worker, so queueing delay
/// never skews timestamps.
#[derive(Debug, Clone)]
pub struct ClickMessage {
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    /// Raw query string of the inbound request, for UTM extraction.
    pub query: Option<String>,
}

impl ClickMessage {
    pub fn new(
        link_id: i64,
        clicked_at: DateTime<Utc>,
        ip: Option<String>,
        user_agent: Option<&str>,
        referrer: Option<&str>,
        query: Option<&str>,
    ) -> Self {
        Self {
            link_id,
            clicked_at,
            ip,
            user_agent: user_agent.map(|s| s.to_string()),
            referrer: referrer.map(|s| s.to_string()),
            query: query.map(|s| s.to_string()),
        }
    }
}
