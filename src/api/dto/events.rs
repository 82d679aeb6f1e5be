//! DTOs for the raw click event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::ClickEvent;
use crate::domain::repositories::EventFilter;
use crate::error::AppError;
use crate::utils::ip::mask_ip;

use super::pagination::{DateFilterParams, PaginationMeta, PaginationParams};

#[derive(Debug, Default, Deserialize)]
pub struct EventQueryParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    #[serde(flatten)]
    pub date_filter: DateFilterParams,
    pub country: Option<String>,
    pub device: Option<String>,
    pub browser: Option<String>,
}

impl EventQueryParams {
    /// Validates the query and folds it into the repository filter.
    pub fn into_filter(self) -> Result<EventFilter, AppError> {
        let (offset, limit) = self.pagination.validate_and_get_offset_limit()?;
        self.date_filter.validate_range()?;
        Ok(EventFilter {
            from: self.date_filter.from,
            to: self.date_filter.to,
            country: self.country,
            device: self.device,
            browser: self.browser,
            offset,
            limit,
        })
    }
}

/// One click event. Optional fields are omitted from JSON when `None`,
/// and the IP is masked before it leaves the server.
#[derive(Debug, Serialize)]
pub struct EventInfo {
    pub id: i64,
    pub clicked_at: DateTime<Utc>,
    pub visitor_id: String,
    pub is_unique: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer_domain: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_term: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_content: Option<String>,
}

impl From<ClickEvent> for EventInfo {
    fn from(e: ClickEvent) -> Self {
        Self {
            id: e.id,
            clicked_at: e.clicked_at,
            visitor_id: e.visitor_id,
            is_unique: e.is_unique,
            ip: e.ip_address.as_deref().map(mask_ip),
            user_agent: e.user_agent,
            browser: e.browser,
            os: e.os,
            device: e.device,
            country: e.country,
            city: e.city,
            region: e.region,
            referrer: e.referrer,
            referrer_domain: e.referrer_domain,
            utm_source: e.utm_source,
            utm_medium: e.utm_medium,
            utm_campaign: e.utm_campaign,
            utm_term: e.utm_term,
            utm_content: e.utm_content,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub pagination: PaginationMeta,
    pub items: Vec<EventInfo>,
}
