//! Business logic services for the application layer.

pub mod alias_service;
pub mod analytics_service;
pub mod click_service;
pub mod guest_throttle;
pub mod link_service;
pub mod resolve_service;
pub mod sweep_service;

pub use alias_service::AliasAllocator;
pub use analytics_service::{AnalyticsService, LinkSummary};
pub use click_service::ClickService;
pub use guest_throttle::GuestThrottle;
pub use link_service::{CreateLinkInput, LinkService, UpdateLinkInput};
pub use resolve_service::{ResolveOutcome, ResolveService};
pub use sweep_service::{SweepOutcome, SweepService};
