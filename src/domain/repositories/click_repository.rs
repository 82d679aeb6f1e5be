//! Repository trait for click events and analytics aggregates.

use crate::domain::entities::{ClickEvent, NewClickEvent};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Filter criteria for the click event log.
///
/// Dimension filters are exact matches against the parsed columns.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub country: Option<String>,
    pub device: Option<String>,
    pub browser: Option<String>,
    pub offset: i64,
    pub limit: i64,
}

impl EventFilter {
    /// Creates a filter with pagination only.
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            from: None,
            to: None,
            country: None,
            device: None,
            browser: None,
            offset,
            limit,
        }
    }

    /// Adds date range filtering.
    pub fn with_date_range(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn has_date_range(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }
}

/// One page of the event log plus the total matching count.
#[derive(Debug, Clone)]
pub struct EventPage {
    pub total: i64,
    pub items: Vec<ClickEvent>,
}

impl EventPage {
    pub fn empty() -> Self {
        Self {
            total: 0,
            items: Vec::new(),
        }
    }
}

/// Clicks bucketed by calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateCount {
    pub date: NaiveDate,
    pub count: i64,
}

/// Clicks grouped under one breakdown label (a country, a browser, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

/// Dimensions the summary can rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakdownDimension {
    Country,
    City,
    Device,
    Browser,
    Referrer,
}

/// Repository interface for the append-only click event log.
///
/// Events are immutable once written; all aggregates are derived by query,
/// never stored, except the two counters on the link row.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgClickRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Appends a click event.
    ///
    /// The implementation decides `is_unique` itself: the first insert for a
    /// `(link_id, visitor_id)` pair wins, and concurrent duplicates must not
    /// both come back unique. The stored event is returned with the final
    /// verdict.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors, including a
    /// vanished link (one-time self-destruct racing the insert).
    async fn record_event(&self, event: NewClickEvent) -> Result<ClickEvent, AppError>;

    /// Lists events for a link, newest first, with the total match count.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_events(&self, link_id: i64, filter: EventFilter) -> Result<EventPage, AppError>;

    /// Counts events for a link within an optional date range.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_clicks(
        &self,
        link_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError>;

    /// Counts distinct visitor ids for a link within an optional date range.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_distinct_visitors(
        &self,
        link_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError>;

    /// Buckets clicks by calendar date, ascending, within an optional range.
    /// Dates without clicks are absent, not zero-filled.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn clicks_by_date(
        &self,
        link_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<DateCount>, AppError>;

    /// Ranks the top `limit` labels of one dimension by click count,
    /// descending, within an optional range. Events with a null value for
    /// the dimension are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn top_breakdown(
        &self,
        link_id: i64,
        dimension: BreakdownDimension,
        limit: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<LabelCount>, AppError>;
}
