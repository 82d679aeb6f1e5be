//! API route configuration.
//!
//! Identity for these endpoints comes from the `X-Owner-Id` and
//! `X-Owner-Tier` headers set by the upstream gateway; see
//! [`crate::utils::identity`].

use crate::api::handlers::{
    archive_link_handler, block_link_handler, create_link_handler, delete_link_handler,
    events_handler, get_link_handler, list_links_handler, stats_handler, unarchive_link_handler,
    unblock_link_handler, update_link_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// All management routes, nested under `/api`.
///
/// # Endpoints
///
/// - `POST   /links`                - Create a short link
/// - `GET    /links`                - List the caller's links (paginated)
/// - `GET    /links/{id}`           - Fetch one link
/// - `PATCH  /links/{id}`           - Partially update a link
/// - `DELETE /links/{id}`           - Delete a link and its click history
/// - `POST   /links/{id}/archive`   - Archive (hide from resolution)
/// - `POST   /links/{id}/unarchive` - Restore an archived link
/// - `POST   /links/{id}/block`     - Block for abuse
/// - `POST   /links/{id}/unblock`   - Lift a block
/// - `GET    /links/{id}/stats`     - Aggregated statistics summary
/// - `GET    /links/{id}/events`    - Raw click event log (paginated)
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/links", post(create_link_handler).get(list_links_handler))
        .route(
            "/links/{id}",
            get(get_link_handler)
                .patch(update_link_handler)
                .delete(delete_link_handler),
        )
        .route("/links/{id}/archive", post(archive_link_handler))
        .route("/links/{id}/unarchive", post(unarchive_link_handler))
        .route("/links/{id}/block", post(block_link_handler))
        .route("/links/{id}/unblock", post(unblock_link_handler))
        .route("/links/{id}/stats", get(stats_handler))
        .route("/links/{id}/events", get(events_handler))
}
