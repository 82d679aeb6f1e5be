//! Repository trait definitions for the domain layer.
//!
//! Traits define the data-access contract; concrete implementations live in
//! `crate::infrastructure::persistence`, and `mockall` generates mocks for
//! service-level tests.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Link CRUD plus the conditional lifecycle mutations
//! - [`ClickRepository`] - Append-only click events and analytics aggregates

pub mod click_repository;
pub mod link_repository;

pub use click_repository::{
    BreakdownDimension, ClickRepository, DateCount, EventFilter, EventPage, LabelCount,
};
pub use link_repository::LinkRepository;

#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
