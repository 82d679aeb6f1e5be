//! Application layer: business logic services and the click worker.
//!
//! Services consume the domain repository traits and provide a clean API
//! for HTTP handlers; nothing here touches sqlx directly.
//!
//! # Available Services
//!
//! - [`services::LinkService`] - link creation, editing and lifecycle transitions
//! - [`services::ResolveService`] - the redirect guard pipeline
//! - [`services::ClickService`] - asynchronous click recording and enrichment
//! - [`services::AnalyticsService`] - tier-gated stats reads
//! - [`services::AliasAllocator`] - short-code allocation and alias vetting
//! - [`services::GuestThrottle`] - per-IP guest creation quota
//! - [`services::SweepService`] - periodic status and retention sweeps
//!
//! [`click_worker::run_click_worker`] drains the bounded click channel the
//! redirect handler feeds.

pub mod click_worker;
pub mod services;
