//! Tier-gated analytics reads: the per-link summary and the event log.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use crate::domain::entities::Tier;
use crate::domain::repositories::{
    BreakdownDimension, ClickRepository, DateCount, EventFilter, EventPage, LabelCount,
    LinkRepository,
};
use crate::error::AppError;

/// Aggregated analytics for one link.
#[derive(Debug, Clone)]
pub struct LinkSummary {
    pub total_clicks: i64,
    pub unique_visitors: i64,
    /// Ascending by date; dates without clicks are absent.
    pub clicks_by_date: Vec<DateCount>,
    /// Highest-count date in `clicks_by_date`; ties go to the earliest.
    pub best_day: Option<DateCount>,
    pub top_countries: Vec<LabelCount>,
    pub top_cities: Vec<LabelCount>,
    pub top_devices: Vec<LabelCount>,
    pub top_browsers: Vec<LabelCount>,
    pub top_referrers: Vec<LabelCount>,
}

/// Read-side analytics service.
///
/// The caller's tier arrives as a parameter; nothing here decides who is
/// `PRO`, it only branches on the value. `FREE` gets totals, the windowed
/// chart and a short country list; every finer breakdown and the raw event
/// log are `PRO` features.
pub struct AnalyticsService {
    links: Arc<dyn LinkRepository>,
    clicks: Arc<dyn ClickRepository>,
}

impl AnalyticsService {
    /// Creates a new analytics service.
    pub fn new(links: Arc<dyn LinkRepository>, clicks: Arc<dyn ClickRepository>) -> Self {
        Self { links, clicks }
    }

    /// Builds the stats summary for a link.
    ///
    /// Without an explicit range, totals come straight off the link row's
    /// counters and the chart is windowed to the last 7 (`FREE`) or 90
    /// (`PRO`) days while breakdowns stay all-time. With an explicit range,
    /// every figure, totals included, is computed from the event log over
    /// that range.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn summary(
        &self,
        link_id: i64,
        tier: Tier,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<LinkSummary, AppError> {
        let link = self
            .links
            .find_by_id(link_id)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": link_id })))?;

        let top_n = tier.top_n() as i64;
        let explicit_range = from.is_some() || to.is_some();

        let (total_clicks, unique_visitors, chart_from, chart_to) = if explicit_range {
            let total = self.clicks.count_clicks(link_id, from, to).await?;
            let unique = self.clicks.count_distinct_visitors(link_id, from, to).await?;
            (total, unique, from, to)
        } else {
            let window_start = Utc::now() - Duration::days(tier.chart_days());
            (
                link.click_count,
                link.unique_click_count,
                Some(window_start),
                None,
            )
        };

        let clicks_by_date = self
            .clicks
            .clicks_by_date(link_id, chart_from, chart_to)
            .await?;
        let best_day = best_day(&clicks_by_date);

        let (bd_from, bd_to) = if explicit_range { (from, to) } else { (None, None) };

        let top_countries = self
            .clicks
            .top_breakdown(link_id, BreakdownDimension::Country, top_n, bd_from, bd_to)
            .await?;

        let (top_cities, top_devices, top_browsers, top_referrers) = match tier {
            Tier::Free => (Vec::new(), Vec::new(), Vec::new(), Vec::new()),
            Tier::Pro => (
                self.clicks
                    .top_breakdown(link_id, BreakdownDimension::City, top_n, bd_from, bd_to)
                    .await?,
                self.clicks
                    .top_breakdown(link_id, BreakdownDimension::Device, top_n, bd_from, bd_to)
                    .await?,
                self.clicks
                    .top_breakdown(link_id, BreakdownDimension::Browser, top_n, bd_from, bd_to)
                    .await?,
                self.clicks
                    .top_breakdown(link_id, BreakdownDimension::Referrer, top_n, bd_from, bd_to)
                    .await?,
            ),
        };

        Ok(LinkSummary {
            total_clicks,
            unique_visitors,
            clicks_by_date,
            best_day,
            top_countries,
            top_cities,
            top_devices,
            top_browsers,
            top_referrers,
        })
    }

    /// Returns one page of the click event log.
    ///
    /// `FREE` callers always get an empty page, whatever the filters; the
    /// denial is silent, not an error, and skips the existence check so the
    /// response cannot be used to probe for link ids either.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist (`PRO`
    /// only). Returns [`AppError::Internal`] on database errors.
    pub async fn detail(
        &self,
        link_id: i64,
        tier: Tier,
        filter: EventFilter,
    ) -> Result<EventPage, AppError> {
        if tier == Tier::Free {
            return Ok(EventPage::empty());
        }

        self.links
            .find_by_id(link_id)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": link_id })))?;

        self.clicks.list_events(link_id, filter).await
    }
}

/// Picks the highest-count entry; on ties the earliest date wins, which for
/// an ascending input means the first one seen.
fn best_day(chart: &[DateCount]) -> Option<DateCount> {
    chart
        .iter()
        .fold(None::<&DateCount>, |best, candidate| match best {
            Some(current) if current.count >= candidate.count => Some(current),
            _ => Some(candidate),
        })
        .cloned()
}
