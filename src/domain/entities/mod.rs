//! Domain entities.

mod click;
mod link;

pub use click::{ClickEvent, NewClickEvent};
pub use link::{
    FREE_RETENTION_DAYS, GUEST_RETENTION_DAYS, Link, LinkPatch, LinkStatus, NewLink, Tier,
};
