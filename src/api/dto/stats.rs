//! DTOs for the aggregated statistics endpoint.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::application::services::LinkSummary;
use crate::domain::repositories::{DateCount, LabelCount};

use super::pagination::DateFilterParams;

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQueryParams {
    #[serde(flatten)]
    pub date_filter: DateFilterParams,
}

#[derive(Debug, Serialize)]
pub struct DateCountDto {
    pub date: NaiveDate,
    pub count: i64,
}

impl From<DateCount> for DateCountDto {
    fn from(d: DateCount) -> Self {
        Self {
            date: d.date,
            count: d.count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LabelCountDto {
    pub label: String,
    pub count: i64,
}

impl From<LabelCount> for LabelCountDto {
    fn from(l: LabelCount) -> Self {
        Self {
            label: l.label,
            count: l.count,
        }
    }
}

/// Aggregated statistics for one link. Breakdown lists are empty for
/// tiers that do not include them.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub link_id: i64,
    pub total_clicks: i64,
    pub unique_visitors: i64,
    pub clicks_by_date: Vec<DateCountDto>,
    pub best_day: Option<DateCountDto>,
    pub top_countries: Vec<LabelCountDto>,
    pub top_cities: Vec<LabelCountDto>,
    pub top_devices: Vec<LabelCountDto>,
    pub top_browsers: Vec<LabelCountDto>,
    pub top_referrers: Vec<LabelCountDto>,
}

impl StatsResponse {
    pub fn from_summary(link_id: i64, summary: LinkSummary) -> Self {
        fn convert(items: Vec<LabelCount>) -> Vec<LabelCountDto> {
            items.into_iter().map(Into::into).collect()
        }

        Self {
            link_id,
            total_clicks: summary.total_clicks,
            unique_visitors: summary.unique_visitors,
            clicks_by_date: summary.clicks_by_date.into_iter().map(Into::into).collect(),
            best_day: summary.best_day.map(Into::into),
            top_countries: convert(summary.top_countries),
            top_cities: convert(summary.top_cities),
            top_devices: convert(summary.top_devices),
            top_browsers: convert(summary.top_browsers),
            top_referrers: convert(summary.top_referrers),
        }
    }
}

