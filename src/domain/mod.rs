//! Domain layer containing business entities and logic.
//!
//! Defines entities, repository interfaces and the pure status machine,
//! independent of infrastructure concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`status`] - Pure, time-dependent status evaluation
//! - [`click_message`] - Raw click metadata for async processing
//!
//! # Click Processing Flow
//!
//! 1. The redirect handler resolves the link and responds immediately
//! 2. A [`click_message::ClickMessage`] is pushed onto a bounded channel
//! 3. [`crate::application::click_worker::run_click_worker`] drains the
//!    channel, recording the click and ingesting the analytics event
//! 4. Persistence goes through the repository traits defined here

pub mod click_message;
pub mod entities;
pub mod repositories;
pub mod status;
