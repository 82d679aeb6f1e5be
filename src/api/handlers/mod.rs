//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod events;
pub mod health;
pub mod links;
pub mod redirect;
pub mod stats;

pub use events::events_handler;
pub use health::health_handler;
pub use links::{
    archive_link_handler, block_link_handler, create_link_handler, delete_link_handler,
    get_link_handler, list_links_handler, unarchive_link_handler, unblock_link_handler,
    update_link_handler,
};
pub use redirect::{redirect_handler, verify_password_handler};
pub use stats::stats_handler;
