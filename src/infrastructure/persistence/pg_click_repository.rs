//! PostgreSQL implementation of the click event repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::entities::{ClickEvent, NewClickEvent};
use crate::domain::repositories::{
    BreakdownDimension, ClickRepository, DateCount, EventFilter, EventPage, LabelCount,
};
use crate::error::AppError;

/// Column list shared by every query that materializes a full [`ClickEvent`].
const EVENT_COLUMNS: &str = "id, link_id, clicked_at, visitor_id, is_unique, ip_address, \
     user_agent, browser, os, device, country, city, region, latitude, longitude, referrer, \
     referrer_domain, utm_source, utm_medium, utm_campaign, utm_term, utm_content";

/// PostgreSQL repository for the append-only click event log.
///
/// Uniqueness is decided by the `link_visitors` table: one row per
/// `(link_id, visitor_id)` pair, inserted with `ON CONFLICT DO NOTHING`
/// inside the same transaction as the event. The row lock makes concurrent
/// duplicates queue up, so exactly one insert ever wins.
pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn map_event(row: &PgRow) -> Result<ClickEvent, AppError> {
    Ok(ClickEvent {
        id: row.try_get("id")?,
        link_id: row.try_get("link_id")?,
        clicked_at: row.try_get("clicked_at")?,
        visitor_id: row.try_get("visitor_id")?,
        is_unique: row.try_get("is_unique")?,
        ip_address: row.try_get("ip_address")?,
        user_agent: row.try_get("user_agent")?,
        browser: row.try_get("browser")?,
        os: row.try_get("os")?,
        device: row.try_get("device")?,
        country: row.try_get("country")?,
        city: row.try_get("city")?,
        region: row.try_get("region")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        referrer: row.try_get("referrer")?,
        referrer_domain: row.try_get("referrer_domain")?,
        utm_source: row.try_get("utm_source")?,
        utm_medium: row.try_get("utm_medium")?,
        utm_campaign: row.try_get("utm_campaign")?,
        utm_term: row.try_get("utm_term")?,
        utm_content: row.try_get("utm_content")?,
    })
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn record_event(&self, event: NewClickEvent) -> Result<ClickEvent, AppError> {
        let mut tx = self.pool.begin().await?;

        let visitor_insert = sqlx::query(
            r#"
            INSERT INTO link_visitors (link_id, visitor_id, first_seen_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (link_id, visitor_id) DO NOTHING
            "#,
        )
        .bind(event.link_id)
        .bind(&event.visitor_id)
        .bind(event.clicked_at)
        .execute(&mut *tx)
        .await?;

        let is_unique = visitor_insert.rows_affected() == 1;

        let sql = format!(
            r#"
            INSERT INTO click_events (
                link_id, clicked_at, visitor_id, is_unique, ip_address, user_agent,
                browser, os, device, country, city, region, latitude, longitude,
                referrer, referrer_domain, utm_source, utm_medium, utm_campaign,
                utm_term, utm_content
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21)
            RETURNING {EVENT_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(event.link_id)
            .bind(event.clicked_at)
            .bind(&event.visitor_id)
            .bind(is_unique)
            .bind(&event.ip_address)
            .bind(&event.user_agent)
            .bind(&event.browser)
            .bind(&event.os)
            .bind(&event.device)
            .bind(&event.country)
            .bind(&event.city)
            .bind(&event.region)
            .bind(event.latitude)
            .bind(event.longitude)
            .bind(&event.referrer)
            .bind(&event.referrer_domain)
            .bind(&event.utm_source)
            .bind(&event.utm_medium)
            .bind(&event.utm_campaign)
            .bind(&event.utm_term)
            .bind(&event.utm_content)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        map_event(&row)
    }

    async fn list_events(&self, link_id: i64, filter: EventFilter) -> Result<EventPage, AppError> {
        let count_row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count FROM click_events
            WHERE link_id = $1
              AND ($2::timestamptz IS NULL OR clicked_at >= $2)
              AND ($3::timestamptz IS NULL OR clicked_at <= $3)
              AND ($4::text IS NULL OR country = $4)
              AND ($5::text IS NULL OR device = $5)
              AND ($6::text IS NULL OR browser = $6)
            "#,
        )
        .bind(link_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(&filter.country)
        .bind(&filter.device)
        .bind(&filter.browser)
        .fetch_one(self.pool.as_ref())
        .await?;

        let total: i64 = count_row.try_get("count")?;

        let sql = format!(
            r#"
            SELECT {EVENT_COLUMNS} FROM click_events
            WHERE link_id = $1
              AND ($2::timestamptz IS NULL OR clicked_at >= $2)
              AND ($3::timestamptz IS NULL OR clicked_at <= $3)
              AND ($4::text IS NULL OR country = $4)
              AND ($5::text IS NULL OR device = $5)
              AND ($6::text IS NULL OR browser = $6)
            ORDER BY clicked_at DESC, id DESC
            LIMIT $7 OFFSET $8
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(link_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(&filter.country)
            .bind(&filter.device)
            .bind(&filter.browser)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(self.pool.as_ref())
            .await?;

        let items = rows.iter().map(map_event).collect::<Result<Vec<_>, _>>()?;

        Ok(EventPage { total, items })
    }

    async fn count_clicks(
        &self,
        link_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count FROM click_events
            WHERE link_id = $1
              AND ($2::timestamptz IS NULL OR clicked_at >= $2)
              AND ($3::timestamptz IS NULL OR clicked_at <= $3)
            "#,
        )
        .bind(link_id)
        .bind(from)
        .bind(to)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.try_get("count")?)
    }

    async fn count_distinct_visitors(
        &self,
        link_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(DISTINCT visitor_id) AS count FROM click_events
            WHERE link_id = $1
              AND ($2::timestamptz IS NULL OR clicked_at >= $2)
              AND ($3::timestamptz IS NULL OR clicked_at <= $3)
            "#,
        )
        .bind(link_id)
        .bind(from)
        .bind(to)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.try_get("count")?)
    }

    async fn clicks_by_date(
        &self,
        link_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<DateCount>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT (clicked_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS count
            FROM click_events
            WHERE link_id = $1
              AND ($2::timestamptz IS NULL OR clicked_at >= $2)
              AND ($3::timestamptz IS NULL OR clicked_at <= $3)
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(link_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter()
            .map(|row| {
                Ok(DateCount {
                    date: row.try_get("day")?,
                    count: row.try_get("count")?,
                })
            })
            .collect()
    }

    async fn top_breakdown(
        &self,
        link_id: i64,
        dimension: BreakdownDimension,
        limit: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<LabelCount>, AppError> {
        // Referrers rank by domain, not the full URL.
        let column = match dimension {
            BreakdownDimension::Country => "country",
            BreakdownDimension::City => "city",
            BreakdownDimension::Device => "device",
            BreakdownDimension::Browser => "browser",
            BreakdownDimension::Referrer => "referrer_domain",
        };

        let sql = format!(
            r#"
            SELECT {column} AS label, COUNT(*) AS count
            FROM click_events
            WHERE link_id = $1
              AND {column} IS NOT NULL
              AND ($2::timestamptz IS NULL OR clicked_at >= $2)
              AND ($3::timestamptz IS NULL OR clicked_at <= $3)
            GROUP BY {column}
            ORDER BY count DESC, label ASC
            LIMIT $4
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(link_id)
            .bind(from)
            .bind(to)
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;

        rows.iter()
            .map(|row| {
                Ok(LabelCount {
                    label: row.try_get("label")?,
                    count: row.try_get("count")?,
                })
            })
            .collect()
    }
}
