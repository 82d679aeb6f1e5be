//! PostgreSQL implementation of the link repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::entities::{Link, LinkPatch, LinkStatus, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Column list shared by every query that materializes a full [`Link`].
const LINK_COLUMNS: &str = "id, owner_id, owner_tier, original_url, short_code, custom_alias, \
     status, scan_status, scan_score, scan_details, scanned_at, password_hash, scheduled_at, \
     expires_at, click_limit, is_one_time, is_archived, click_count, unique_click_count, \
     last_clicked_at, creator_ip, created_at, updated_at";

/// PostgreSQL repository for link storage.
///
/// All state transitions that can race concurrent redirects are single
/// conditional UPDATE statements; the database is the judge of who wins,
/// and losing just means the transition already happened.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn map_link(row: &PgRow) -> Result<Link, AppError> {
    let status: String = row.try_get("status")?;
    let owner_tier: String = row.try_get("owner_tier")?;

    Ok(Link {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        owner_tier: owner_tier.parse().map_err(corrupt_column)?,
        original_url: row.try_get("original_url")?,
        short_code: row.try_get("short_code")?,
        custom_alias: row.try_get("custom_alias")?,
        status: status.parse().map_err(corrupt_column)?,
        scan_status: row.try_get("scan_status")?,
        scan_score: row.try_get("scan_score")?,
        scan_details: row.try_get("scan_details")?,
        scanned_at: row.try_get("scanned_at")?,
        password_hash: row.try_get("password_hash")?,
        scheduled_at: row.try_get("scheduled_at")?,
        expires_at: row.try_get("expires_at")?,
        click_limit: row.try_get("click_limit")?,
        is_one_time: row.try_get("is_one_time")?,
        is_archived: row.try_get("is_archived")?,
        click_count: row.try_get("click_count")?,
        unique_click_count: row.try_get("unique_click_count")?,
        last_clicked_at: row.try_get("last_clicked_at")?,
        creator_ip: row.try_get("creator_ip")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn corrupt_column(e: String) -> AppError {
    AppError::internal("Corrupt enum column", json!({ "error": e }))
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let sql = format!(
            r#"
            INSERT INTO links (
                owner_id, owner_tier, original_url, short_code, custom_alias,
                status, password_hash, scheduled_at, expires_at, click_limit,
                is_one_time, creator_ip
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {LINK_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(new_link.owner_id)
            .bind(new_link.owner_tier.as_str())
            .bind(&new_link.original_url)
            .bind(&new_link.short_code)
            .bind(&new_link.custom_alias)
            .bind(new_link.status.as_str())
            .bind(&new_link.password_hash)
            .bind(new_link.scheduled_at)
            .bind(new_link.expires_at)
            .bind(new_link.click_limit)
            .bind(new_link.is_one_time)
            .bind(&new_link.creator_ip)
            .fetch_one(self.pool.as_ref())
            .await?;

        map_link(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE id = $1");

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.as_ref().map(map_link).transpose()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE short_code = $1 OR custom_alias = $1"
        );

        let row = sqlx::query(&sql)
            .bind(code)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.as_ref().map(map_link).transpose()
    }

    async fn code_or_alias_taken(
        &self,
        candidate: &str,
        excluding_id: Option<i64>,
    ) -> Result<bool, AppError> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM links
                WHERE (short_code = $1 OR custom_alias = $1)
                  AND ($2::bigint IS NULL OR id <> $2)
            ) AS taken
            "#,
        )
        .bind(candidate)
        .bind(excluding_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.try_get("taken")?)
    }

    async fn list_by_owner(
        &self,
        owner_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Link>, AppError> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE owner_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );

        let rows = sqlx::query(&sql)
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.as_ref())
            .await?;

        rows.iter().map(map_link).collect()
    }

    async fn count_by_owner(&self, owner_id: i64) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM links WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(row.try_get("count")?)
    }

    async fn update(&self, id: i64, patch: LinkPatch) -> Result<Link, AppError> {
        // One static statement covers every patch shape. Plain options ride
        // on COALESCE; double options need the extra "change?" flag to tell
        // "clear to NULL" apart from "leave alone".
        let sql = format!(
            r#"
            UPDATE links SET
                original_url  = COALESCE($2, original_url),
                custom_alias  = CASE WHEN $3 THEN $4 ELSE custom_alias END,
                password_hash = CASE WHEN $5 THEN $6 ELSE password_hash END,
                scheduled_at  = CASE WHEN $7 THEN $8 ELSE scheduled_at END,
                expires_at    = CASE WHEN $9 THEN $10 ELSE expires_at END,
                click_limit   = CASE WHEN $11 THEN $12 ELSE click_limit END,
                is_one_time   = COALESCE($13, is_one_time),
                status        = COALESCE($14, status),
                updated_at    = NOW()
            WHERE id = $1
            RETURNING {LINK_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .bind(&patch.original_url)
            .bind(patch.custom_alias.is_some())
            .bind(patch.custom_alias.flatten())
            .bind(patch.password_hash.is_some())
            .bind(patch.password_hash.flatten())
            .bind(patch.scheduled_at.is_some())
            .bind(patch.scheduled_at.flatten())
            .bind(patch.expires_at.is_some())
            .bind(patch.expires_at.flatten())
            .bind(patch.click_limit.is_some())
            .bind(patch.click_limit.flatten())
            .bind(patch.is_one_time)
            .bind(patch.status.map(|s| s.as_str()))
            .fetch_one(self.pool.as_ref())
            .await?;

        map_link(&row)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM links WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_archived(
        &self,
        id: i64,
        archived: bool,
        status: LinkStatus,
    ) -> Result<Link, AppError> {
        let sql = format!(
            "UPDATE links SET is_archived = $2, status = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {LINK_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .bind(archived)
            .bind(status.as_str())
            .fetch_one(self.pool.as_ref())
            .await?;

        map_link(&row)
    }

    async fn set_status(&self, id: i64, status: LinkStatus) -> Result<Link, AppError> {
        let sql = format!(
            "UPDATE links SET status = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {LINK_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_one(self.pool.as_ref())
            .await?;

        map_link(&row)
    }

    async fn activate_if_due(&self, id: i64, now: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE links SET status = 'ACTIVE', updated_at = NOW()
            WHERE id = $1
              AND status = 'SCHEDULED'
              AND scheduled_at IS NOT NULL
              AND scheduled_at <= $2
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn disable_if_expired(&self, id: i64, now: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE links SET status = 'DISABLED', is_archived = TRUE, updated_at = NOW()
            WHERE id = $1
              AND status <> 'BLOCKED'
              AND expires_at IS NOT NULL
              AND expires_at <= $2
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn disable_if_limit_reached(&self, id: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE links SET status = 'DISABLED', is_archived = TRUE, updated_at = NOW()
            WHERE id = $1
              AND status <> 'BLOCKED'
              AND click_limit IS NOT NULL
              AND click_count >= click_limit
            "#,
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn increment_click(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<bool>, AppError> {
        let row = sqlx::query(
            r#"
            UPDATE links
            SET click_count = click_count + 1, last_clicked_at = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING is_one_time
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row
            .map(|r| r.try_get::<bool, _>("is_one_time"))
            .transpose()?)
    }

    async fn increment_unique_click(&self, id: i64) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE links SET unique_click_count = unique_click_count + 1, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn delete_if_one_time(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM links WHERE id = $1 AND is_one_time = TRUE")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_guest_links_since(
        &self,
        ip: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM links \
             WHERE owner_id IS NULL AND creator_ip = $1 AND created_at >= $2",
        )
        .bind(ip)
        .bind(since)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.try_get("count")?)
    }

    async fn activate_due_scheduled(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE links SET status = 'ACTIVE', updated_at = NOW()
            WHERE status = 'SCHEDULED'
              AND scheduled_at IS NOT NULL
              AND scheduled_at <= $1
              AND (expires_at IS NULL OR expires_at > $1)
            "#,
        )
        .bind(now)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }

    async fn disable_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE links SET status = 'DISABLED', is_archived = TRUE, updated_at = NOW()
            WHERE status IN ('ACTIVE', 'SCHEDULED')
              AND expires_at IS NOT NULL
              AND expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }

    async fn purge_per_retention(
        &self,
        guest_cutoff: DateTime<Utc>,
        free_cutoff: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM links
            WHERE (owner_id IS NULL AND created_at < $1)
               OR (owner_id IS NOT NULL AND owner_tier = 'free' AND created_at < $2)
            "#,
        )
        .bind(guest_cutoff)
        .bind(free_cutoff)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }
}
