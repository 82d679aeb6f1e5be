//! Link creation, editing and lifecycle transitions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde_json::json;
use tracing::info;

use crate::application::services::alias_service::AliasAllocator;
use crate::application::services::guest_throttle::GuestThrottle;
use crate::domain::entities::{Link, LinkPatch, LinkStatus, NewLink, Tier};
use crate::domain::repositories::LinkRepository;
use crate::domain::status::{initial_status, rederive_status};
use crate::error::AppError;
use crate::utils::password::hash_password;
use crate::utils::url_normalizer::normalize_url;

/// Input for creating a link.
#[derive(Debug, Clone)]
pub struct CreateLinkInput {
    pub original_url: String,
    pub custom_alias: Option<String>,
    pub password: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub click_limit: Option<i32>,
    pub is_one_time: bool,
    pub owner_id: Option<i64>,
    pub owner_tier: Tier,
    pub creator_ip: Option<String>,
}

/// Input for partially updating a link.
///
/// Double-option fields distinguish "leave unchanged" (`None`) from "clear"
/// (`Some(None)`) from "set" (`Some(Some(v))`), mirroring [`LinkPatch`].
#[derive(Debug, Clone, Default)]
pub struct UpdateLinkInput {
    pub original_url: Option<String>,
    pub custom_alias: Option<Option<String>>,
    pub password: Option<Option<String>>,
    pub scheduled_at: Option<Option<DateTime<Utc>>>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub click_limit: Option<Option<i32>>,
    pub is_one_time: Option<bool>,
}

/// Service for creating, editing and transitioning links.
///
/// Owns every write path except click recording: creation (with the guest
/// quota and alias vetting), partial updates, deletion, and the
/// archive/block lifecycle operations. Status is always derived here or in
/// the redirect pipeline, never taken from client input.
pub struct LinkService {
    links: Arc<dyn LinkRepository>,
    aliases: Arc<AliasAllocator>,
    guest_throttle: Arc<GuestThrottle>,
}

impl LinkService {
    /// Creates a new link service.
    pub fn new(
        links: Arc<dyn LinkRepository>,
        aliases: Arc<AliasAllocator>,
        guest_throttle: Arc<GuestThrottle>,
    ) -> Self {
        Self {
            links,
            aliases,
            guest_throttle,
        }
    }

    /// Creates a link.
    ///
    /// The URL is normalized before storage. A short code is always
    /// allocated, even when a custom alias is supplied; the alias is an
    /// additional name, not a replacement. Guests are subject to the
    /// per-IP creation quota.
    ///
    /// A past `expires_at` is accepted on purpose: such a link is born
    /// expired and the redirect pipeline disables it on first hit.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] on a malformed URL, alias, click
    /// limit or date pair. Returns [`AppError::Conflict`] when the alias is
    /// taken. Returns [`AppError::TooManyRequests`] when a guest is over
    /// quota. Returns [`AppError::Exhausted`] when code allocation failed.
    pub async fn create_link(&self, input: CreateLinkInput) -> Result<Link, AppError> {
        let normalized_url = normalize_url(&input.original_url)?;
        validate_click_limit(input.click_limit)?;
        validate_schedule(input.scheduled_at, input.expires_at)?;

        let password_hash = match input.password.as_deref() {
            Some("") => {
                return Err(AppError::bad_request("Password cannot be empty", json!({})));
            }
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        if input.owner_id.is_none()
            && let Some(ip) = input.creator_ip.as_deref()
        {
            self.guest_throttle.check_and_admit(ip).await?;
        }

        if let Some(alias) = input.custom_alias.as_deref() {
            self.aliases.ensure_alias_available(alias, None).await?;
        }

        let short_code = self.aliases.allocate_code().await?;
        let now = Utc::now();

        let new_link = NewLink {
            owner_id: input.owner_id,
            owner_tier: input.owner_tier,
            original_url: normalized_url,
            short_code,
            custom_alias: input.custom_alias,
            status: initial_status(input.scheduled_at, now),
            password_hash,
            scheduled_at: input.scheduled_at,
            expires_at: input.expires_at,
            click_limit: input.click_limit,
            is_one_time: input.is_one_time,
            creator_ip: input.creator_ip,
        };

        let link = self.links.create(new_link).await?;
        counter!("links_created_total").increment(1);
        info!(link_id = link.id, code = %link.short_code, "link created");
        Ok(link)
    }

    /// Retrieves a link by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link matches.
    pub async fn get_link(&self, id: i64) -> Result<Link, AppError> {
        self.links
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))
    }

    /// Lists an owner's links, newest first, with the total count.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn list_links(
        &self,
        owner_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Link>, i64), AppError> {
        let total = self.links.count_by_owner(owner_id).await?;
        let items = self.links.list_by_owner(owner_id, offset, limit).await?;
        Ok((items, total))
    }

    /// Partially updates a link.
    ///
    /// When either scheduling field changes the stored status is rederived
    /// from the new window, except on archived links, which keep `ARCHIVED`
    /// until explicitly unarchived. Blocked links cannot be edited at all.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    /// Returns [`AppError::Forbidden`] (reason `"blocked"`) on a blocked
    /// link. Returns [`AppError::Validation`] / [`AppError::Conflict`] for
    /// the same field problems as [`Self::create_link`].
    pub async fn update_link(&self, id: i64, input: UpdateLinkInput) -> Result<Link, AppError> {
        let current = self.get_link(id).await?;

        if current.status == LinkStatus::Blocked {
            return Err(AppError::forbidden("blocked", json!({ "id": id })));
        }

        let mut patch = LinkPatch::default();

        if let Some(url) = input.original_url.as_deref() {
            patch.original_url = Some(normalize_url(url)?);
        }

        match input.custom_alias {
            Some(Some(alias)) => {
                self.aliases.ensure_alias_available(&alias, Some(id)).await?;
                patch.custom_alias = Some(Some(alias));
            }
            Some(None) => patch.custom_alias = Some(None),
            None => {}
        }

        match input.password {
            Some(Some(password)) if password.is_empty() => {
                return Err(AppError::bad_request("Password cannot be empty", json!({})));
            }
            Some(Some(password)) => {
                patch.password_hash = Some(Some(hash_password(&password)?));
            }
            Some(None) => patch.password_hash = Some(None),
            None => {}
        }

        if let Some(limit) = input.click_limit {
            validate_click_limit(limit)?;
            patch.click_limit = Some(limit);
        }

        let new_scheduled = input.scheduled_at.unwrap_or(current.scheduled_at);
        let new_expires = input.expires_at.unwrap_or(current.expires_at);
        validate_schedule(new_scheduled, new_expires)?;

        if input.scheduled_at.is_some() || input.expires_at.is_some() {
            patch.scheduled_at = input.scheduled_at;
            patch.expires_at = input.expires_at;

            if !current.is_archived && current.status != LinkStatus::Archived {
                patch.status = Some(rederive_status(new_scheduled, new_expires, Utc::now()));
            }
        }

        patch.is_one_time = input.is_one_time;

        let link = self.links.update(id, patch).await?;
        info!(link_id = id, "link updated");
        Ok(link)
    }

    /// Deletes a link outright. Click events go with it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    pub async fn delete_link(&self, id: i64) -> Result<(), AppError> {
        if !self.links.delete(id).await? {
            return Err(AppError::not_found("Link not found", json!({ "id": id })));
        }

        info!(link_id = id, "link deleted");
        Ok(())
    }

    /// Soft-deletes a link: sets the archived flag and `ARCHIVED` status.
    /// Already-archived links are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    /// Returns [`AppError::Forbidden`] (reason `"blocked"`) on a blocked
    /// link; moderation holds override owner actions.
    pub async fn archive(&self, id: i64) -> Result<Link, AppError> {
        let current = self.get_link(id).await?;

        if current.status == LinkStatus::Blocked {
            return Err(AppError::forbidden("blocked", json!({ "id": id })));
        }

        if current.is_archived {
            return Ok(current);
        }

        self.links.set_archived(id, true, LinkStatus::Archived).await
    }

    /// Restores an archived link. The status comes back as whatever the
    /// scheduling window dictates right now, except blocked links, which
    /// stay `BLOCKED` with only the flag cleared.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    pub async fn unarchive(&self, id: i64) -> Result<Link, AppError> {
        let current = self.get_link(id).await?;

        if !current.is_archived && current.status != LinkStatus::Archived {
            return Ok(current);
        }

        let status = if current.status == LinkStatus::Blocked {
            LinkStatus::Blocked
        } else {
            rederive_status(current.scheduled_at, current.expires_at, Utc::now())
        };

        self.links.set_archived(id, false, status).await
    }

    /// Places a moderation hold on a link. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    pub async fn block(&self, id: i64) -> Result<Link, AppError> {
        let link = self.links.set_status(id, LinkStatus::Blocked).await?;
        info!(link_id = id, "link blocked");
        Ok(link)
    }

    /// Releases a moderation hold. The link drops back to whatever status
    /// its own state dictates: `ARCHIVED` when the flag is still set,
    /// otherwise derived from the scheduling window. Unblocking a link that
    /// is not blocked is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    pub async fn unblock(&self, id: i64) -> Result<Link, AppError> {
        let current = self.get_link(id).await?;

        if current.status != LinkStatus::Blocked {
            return Ok(current);
        }

        let status = if current.is_archived {
            LinkStatus::Archived
        } else {
            rederive_status(current.scheduled_at, current.expires_at, Utc::now())
        };

        let link = self.links.set_status(id, status).await?;
        info!(link_id = id, status = %link.status, "link unblocked");
        Ok(link)
    }
}

fn validate_click_limit(limit: Option<i32>) -> Result<(), AppError> {
    if let Some(l) = limit
        && l <= 0
    {
        return Err(AppError::bad_request(
            "click_limit must be positive",
            json!({ "click_limit": l }),
        ));
    }

    Ok(())
}

fn validate_schedule(
    scheduled_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
) -> Result<(), AppError> {
    if let (Some(scheduled), Some(expires)) = (scheduled_at, expires_at)
        && scheduled >= expires
    {
        return Err(AppError::bad_request(
            "scheduled_at must be earlier than expires_at",
            json!({ "scheduled_at": scheduled, "expires_at": expires }),
        ));
    }

    Ok(())
}
