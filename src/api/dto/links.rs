//! Request and response shapes for link management endpoints.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::{CreateLinkInput, UpdateLinkInput};
use crate::domain::entities::{Link, LinkStatus, Tier};
use crate::domain::status::effective_status;
use crate::utils::ip::mask_ip;

static ALIAS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]+$").unwrap());

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    #[validate(url(message = "Must be a valid URL with a scheme"))]
    pub url: String,

    #[validate(
        length(min = 3, max = 30, message = "Alias must be 3-30 characters"),
        regex(
            path = "*ALIAS_REGEX",
            message = "Alias may only contain letters, digits and hyphens"
        )
    )]
    pub custom_alias: Option<String>,

    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: Option<String>,

    pub scheduled_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,

    #[validate(range(min = 1, message = "Click limit must be positive"))]
    pub click_limit: Option<i32>,

    #[serde(default)]
    pub is_one_time: bool,
}

impl CreateLinkRequest {
    pub fn into_input(
        self,
        owner_id: Option<i64>,
        owner_tier: Tier,
        creator_ip: Option<String>,
    ) -> CreateLinkInput {
        CreateLinkInput {
            original_url: self.url,
            custom_alias: self.custom_alias,
            password: self.password,
            scheduled_at: self.scheduled_at,
            expires_at: self.expires_at,
            click_limit: self.click_limit,
            is_one_time: self.is_one_time,
            owner_id,
            owner_tier,
            creator_ip,
        }
    }
}

/// Field update payload for PATCH. Absent fields are left untouched;
/// explicit `null` clears the nullable ones, which is why the optional
/// fields are double-wrapped.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLinkRequest {
    #[validate(url(message = "Must be a valid URL with a scheme"))]
    pub url: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub custom_alias: Option<Option<String>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub password: Option<Option<String>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub scheduled_at: Option<Option<DateTime<Utc>>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub expires_at: Option<Option<DateTime<Utc>>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub click_limit: Option<Option<i32>>,

    pub is_one_time: Option<bool>,
}

impl UpdateLinkRequest {
    pub fn into_input(self) -> UpdateLinkInput {
        UpdateLinkInput {
            original_url: self.url,
            custom_alias: self.custom_alias,
            password: self.password,
            scheduled_at: self.scheduled_at,
            expires_at: self.expires_at,
            click_limit: self.click_limit,
            is_one_time: self.is_one_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: i64,
    pub owner_id: Option<i64>,
    pub owner_tier: Tier,
    pub short_code: String,
    pub custom_alias: Option<String>,
    pub short_url: String,
    pub original_url: String,
    /// Stored lifecycle state.
    pub status: LinkStatus,
    /// State the resolver would see right now, with time-based
    /// transitions applied.
    pub effective_status: LinkStatus,
    pub has_password: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub click_limit: Option<i32>,
    pub is_one_time: bool,
    pub is_archived: bool,
    pub click_count: i64,
    pub unique_click_count: i64,
    pub last_clicked_at: Option<DateTime<Utc>>,
    pub creator_ip: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LinkResponse {
    pub fn from_entity(link: &Link, base_url: &str) -> Self {
        let code = link.visible_code();
        let short_url = format!("{}/{}", base_url.trim_end_matches('/'), code);
        Self {
            id: link.id,
            owner_id: link.owner_id,
            owner_tier: link.owner_tier,
            short_code: link.short_code.clone(),
            custom_alias: link.custom_alias.clone(),
            short_url,
            original_url: link.original_url.clone(),
            status: link.status,
            effective_status: effective_status(link, Utc::now()),
            has_password: link.has_password(),
            scheduled_at: link.scheduled_at,
            expires_at: link.expires_at,
            click_limit: link.click_limit,
            is_one_time: link.is_one_time,
            is_archived: link.is_archived,
            click_count: link.click_count,
            unique_click_count: link.unique_click_count,
            last_clicked_at: link.last_clicked_at,
            creator_ip: link.creator_ip.as_deref().map(mask_ip),
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LinkListResponse {
    pub links: Vec<LinkResponse>,
    pub pagination: super::pagination::PaginationMeta,
}
