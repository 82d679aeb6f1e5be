//! Shared query-string parameters for paginated and date-filtered
//! endpoints.
//!
//! Query strings arrive as text, so numeric fields go through
//! `DisplayFromStr` instead of relying on serde's native integer
//! handling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_with::{DisplayFromStr, serde_as};

use crate::error::AppError;

/// RFC 3339 timestamps in query strings, with empty values treated as
/// absent so `?from=&to=` does not error.
pub(crate) mod optional_rfc3339 {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(serde::de::Error::custom),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub page: Option<u32>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub page_size: Option<u32>,
}

impl PaginationParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(25)
    }

    /// Checks bounds and converts page/page_size into the offset/limit
    /// pair the repositories take.
    pub fn validate_and_get_offset_limit(&self) -> Result<(i64, i64), AppError> {
        let page = self.page();
        if page < 1 {
            return Err(AppError::bad_request(
                "Page must be at least 1",
                json!({ "page": page }),
            ));
        }

        let page_size = self.page_size();
        if !(10..=1000).contains(&page_size) {
            return Err(AppError::bad_request(
                "Page size must be between 10 and 1000",
                json!({ "page_size": page_size }),
            ));
        }

        let offset = i64::from(page - 1) * i64::from(page_size);
        Ok((offset, i64::from(page_size)))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateFilterParams {
    #[serde(default, deserialize_with = "optional_rfc3339::deserialize")]
    pub from: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "optional_rfc3339::deserialize")]
    pub to: Option<DateTime<Utc>>,
}

impl DateFilterParams {
    pub fn validate_range(&self) -> Result<(), AppError> {
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from > to
        {
            return Err(AppError::bad_request(
                "'from' must not be after 'to'",
                json!({ "from": from.to_rfc3339(), "to": to.to_rfc3339() }),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: u32,
}

impl PaginationMeta {
    pub fn new(page: u32, page_size: u32, total_items: i64) -> Self {
        let total_pages = if total_items <= 0 {
            0
        } else {
            (total_items as f64 / f64::from(page_size)).ceil() as u32
        };
        Self {
            page,
            page_size,
            total_items,
            total_pages,
        }
    }
}
