//! Repository trait for link data access.

use crate::domain::entities::{Link, LinkPatch, LinkStatus, NewLink};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for managing links.
///
/// Covers CRUD plus the conditional single-statement mutations the redirect
/// pipeline and the background sweeps rely on. Every mutating method that
/// can race with concurrent redirects is expressed as one conditional
/// update, never a read-then-write pair.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Creates a new link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short code or custom alias is
    /// already taken. Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a link by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError>;

    /// Finds a link whose short code *or* custom alias equals `code`.
    ///
    /// This is the lookup every redirect goes through; both columns resolve.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError>;

    /// Returns true if `candidate` collides with any short code or custom
    /// alias, optionally ignoring one link (the one being edited).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn code_or_alias_taken(
        &self,
        candidate: &str,
        excluding_id: Option<i64>,
    ) -> Result<bool, AppError>;

    /// Lists an owner's links, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_by_owner(
        &self,
        owner_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Link>, AppError>;

    /// Counts an owner's links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_by_owner(&self, owner_id: i64) -> Result<i64, AppError>;

    /// Partially updates a link. Only fields present in [`LinkPatch`] are
    /// modified; `None` fields are unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    /// Returns [`AppError::Conflict`] on an alias collision.
    /// Returns [`AppError::Internal`] on database errors.
    async fn update(&self, id: i64, patch: LinkPatch) -> Result<Link, AppError>;

    /// Deletes a link outright, cascading its click events.
    ///
    /// Returns `Ok(true)` if a row was deleted, `Ok(false)` if the link was
    /// already gone.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Sets the archived flag together with the status that goes with it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    async fn set_archived(
        &self,
        id: i64,
        archived: bool,
        status: LinkStatus,
    ) -> Result<Link, AppError>;

    /// Overwrites the stored status (block/unblock moderation path).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    async fn set_status(&self, id: i64, status: LinkStatus) -> Result<Link, AppError>;

    /// Flips `SCHEDULED -> ACTIVE` iff the go-live time has passed.
    ///
    /// Conditional and idempotent: a no-op when another request already
    /// activated the link or the precondition no longer holds.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn activate_if_due(&self, id: i64, now: DateTime<Utc>) -> Result<(), AppError>;

    /// Disables (and archives) the link iff its expiry has passed. Blocked
    /// links are left alone. Idempotent under concurrent calls.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn disable_if_expired(&self, id: i64, now: DateTime<Utc>) -> Result<(), AppError>;

    /// Disables (and archives) the link iff its click limit is spent.
    /// Blocked links are left alone. Idempotent under concurrent calls.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn disable_if_limit_reached(&self, id: i64) -> Result<(), AppError>;

    /// Atomically increments the click counter and stamps `last_clicked_at`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(is_one_time))` when the row existed and was incremented
    /// - `Ok(None)` when the row is already gone (self-destructed)
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn increment_click(&self, id: i64, now: DateTime<Utc>)
    -> Result<Option<bool>, AppError>;

    /// Atomically increments the unique-visitor counter.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn increment_unique_click(&self, id: i64) -> Result<(), AppError>;

    /// Deletes the link iff it is a one-time link (self-destruct). Returns
    /// whether a row was deleted; a concurrent call finding nothing no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete_if_one_time(&self, id: i64) -> Result<bool, AppError>;

    /// Counts guest-created links from `ip` since `since` (rolling-window
    /// creation quota).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_guest_links_since(
        &self,
        ip: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError>;

    /// Batch-activates every scheduled link whose go-live time has passed
    /// and whose expiry has not. Returns the number of rows touched.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn activate_due_scheduled(&self, now: DateTime<Utc>) -> Result<u64, AppError>;

    /// Batch-disables (and archives) every non-blocked link whose expiry has
    /// passed. Returns the number of rows touched.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn disable_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;

    /// Deletes guest links created before `guest_cutoff` and FREE-owner
    /// links created before `free_cutoff`; PRO links are never touched.
    /// Returns the number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn purge_per_retention(
        &self,
        guest_cutoff: DateTime<Utc>,
        free_cutoff: DateTime<Utc>,
    ) -> Result<u64, AppError>;
}
