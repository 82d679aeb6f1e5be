//! Short-code allocation and custom alias vetting.

use std::collections::HashSet;
use std::sync::Arc;

use metrics::counter;
use serde_json::json;
use tracing::debug;

use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::codegen::{generate_code, validate_alias_format, RESERVED_ALIASES};

/// Candidates tried per allocation before giving up.
const MAX_ALLOCATION_ATTEMPTS: usize = 5;

/// Allocates generated short codes and vets caller-supplied aliases.
///
/// Both kinds of name live in the same namespace: a candidate is free only
/// when it matches neither a `short_code` nor a `custom_alias` of any other
/// link. The reserved-word set is fixed at construction time.
pub struct AliasAllocator {
    links: Arc<dyn LinkRepository>,
    reserved: HashSet<String>,
}

impl AliasAllocator {
    /// Creates an allocator with the default reserved-alias set.
    pub fn new(links: Arc<dyn LinkRepository>) -> Self {
        Self::with_reserved(links, RESERVED_ALIASES.iter().map(|a| (*a).to_string()))
    }

    /// Creates an allocator with a custom reserved-alias set.
    ///
    /// Entries are lowercased on the way in; lookups are case-insensitive.
    pub fn with_reserved(
        links: Arc<dyn LinkRepository>,
        reserved: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            links,
            reserved: reserved.into_iter().map(|a| a.to_lowercase()).collect(),
        }
    }

    /// Generates a short code that is unused across both name columns.
    ///
    /// Retries up to five times on collision. With a 58-character alphabet
    /// and 7 positions a collision is already rare; five misses in a row
    /// mean the table is in real trouble, so the error maps to 503 rather
    /// than 500.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Exhausted`] when every candidate collided.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn allocate_code(&self) -> Result<String, AppError> {
        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let candidate = generate_code();

            if !self.links.code_or_alias_taken(&candidate, None).await? {
                return Ok(candidate);
            }

            counter!("code_allocation_collisions_total").increment(1);
            debug!(attempt, "short code collision, retrying");
        }

        Err(AppError::exhausted(
            "Failed to allocate a short code",
            json!({ "attempts": MAX_ALLOCATION_ATTEMPTS }),
        ))
    }

    /// Checks alias format and rejects reserved words.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the alias is malformed or
    /// reserved.
    pub fn validate_alias(&self, alias: &str) -> Result<(), AppError> {
        validate_alias_format(alias)?;

        if self.reserved.contains(&alias.to_lowercase()) {
            return Err(AppError::bad_request(
                "This alias is reserved",
                json!({ "alias": alias }),
            ));
        }

        Ok(())
    }

    /// Fully vets a caller-supplied alias: format, reserved words and
    /// cross-column uniqueness.
    ///
    /// `excluding_id` skips one link row, so an update that keeps its own
    /// alias does not collide with itself.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the alias is malformed or
    /// reserved. Returns [`AppError::Conflict`] if another link already
    /// answers to this name. Returns [`AppError::Internal`] on database
    /// errors.
    pub async fn ensure_alias_available(
        &self,
        alias: &str,
        excluding_id: Option<i64>,
    ) -> Result<(), AppError> {
        self.validate_alias(alias)?;

        if self.links.code_or_alias_taken(alias, excluding_id).await? {
            return Err(AppError::conflict(
                "This alias is already taken",
                json!({ "alias": alias }),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockLinkRepository;
    use crate::utils::codegen::{CODE_ALPHABET, CODE_LENGTH};
    use mockall::Sequence;

    #[tokio::test]
    async fn test_allocate_code_first_try() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_code_or_alias_taken()
            .withf(|_, excluding| excluding.is_none())
            .times(1)
            .returning(|_, _| Ok(false));

        let allocator = AliasAllocator::new(Arc::new(mock_repo));

        let code = allocator.allocate_code().await.unwrap();
        assert_eq!(code.len(), CODE_LENGTH);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
    }

    #[tokio::test]
    async fn test_allocate_code_retries_after_collision() {
        let mut mock_repo = MockLinkRepository::new();
        let mut seq = Sequence::new();

        mock_repo
            .expect_code_or_alias_taken()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(true));
        mock_repo
            .expect_code_or_alias_taken()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(false));

        let allocator = AliasAllocator::new(Arc::new(mock_repo));

        assert!(allocator.allocate_code().await.is_ok());
    }

    #[tokio::test]
    async fn test_allocate_code_exhausted_after_five_collisions() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_code_or_alias_taken()
            .times(5)
            .returning(|_, _| Ok(true));

        let allocator = AliasAllocator::new(Arc::new(mock_repo));

        let err = allocator.allocate_code().await.unwrap_err();
        assert!(matches!(err, AppError::Exhausted { .. }));
    }

    #[tokio::test]
    async fn test_reserved_alias_rejected_without_touching_repo() {
        let mock_repo = MockLinkRepository::new();
        let allocator = AliasAllocator::new(Arc::new(mock_repo));

        let err = allocator
            .ensure_alias_available("admin", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_reserved_check_is_case_insensitive() {
        let mock_repo = MockLinkRepository::new();
        let allocator = AliasAllocator::new(Arc::new(mock_repo));

        assert!(allocator.validate_alias("ADMIN").is_err());
        assert!(allocator.validate_alias("Api").is_err());
    }

    #[tokio::test]
    async fn test_malformed_alias_rejected() {
        let mock_repo = MockLinkRepository::new();
        let allocator = AliasAllocator::new(Arc::new(mock_repo));

        let err = allocator
            .ensure_alias_available("ab", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_taken_alias_is_conflict() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_code_or_alias_taken()
            .withf(|alias, excluding| alias == "my-link" && excluding.is_none())
            .times(1)
            .returning(|_, _| Ok(true));

        let allocator = AliasAllocator::new(Arc::new(mock_repo));

        let err = allocator
            .ensure_alias_available("my-link", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_update_excludes_own_row() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_code_or_alias_taken()
            .withf(|alias, excluding| alias == "my-link" && *excluding == Some(7))
            .times(1)
            .returning(|_, _| Ok(false));

        let allocator = AliasAllocator::new(Arc::new(mock_repo));

        assert!(allocator
            .ensure_alias_available("my-link", Some(7))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_custom_reserved_set_replaces_default() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_code_or_alias_taken()
            .times(1)
            .returning(|_, _| Ok(false));

        let allocator =
            AliasAllocator::with_reserved(Arc::new(mock_repo), vec!["docs".to_string()]);

        assert!(allocator.validate_alias("docs").is_err());
        // "admin" is only reserved in the default set
        assert!(allocator.ensure_alias_available("admin", None).await.is_ok());
    }
}
