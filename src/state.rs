//! Shared application state injected into all handlers.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::services::{
    AliasAllocator, AnalyticsService, GuestThrottle, LinkService, ResolveService,
};
use crate::domain::click_message::ClickMessage;
use crate::domain::repositories::{ClickRepository, LinkRepository};

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub resolve_service: Arc<ResolveService>,
    pub analytics_service: Arc<AnalyticsService>,
    /// Direct repository handle for the health check's database probe.
    pub link_repo: Arc<dyn LinkRepository>,
    pub click_sender: mpsc::Sender<ClickMessage>,
    pub base_url: String,
}

impl AppState {
    /// Wires the services over the given repositories.
    ///
    /// Taking the repositories as trait objects keeps the constructor
    /// usable from tests with in-memory implementations.
    pub fn new(
        links: Arc<dyn LinkRepository>,
        clicks: Arc<dyn ClickRepository>,
        click_sender: mpsc::Sender<ClickMessage>,
        base_url: String,
        guest_daily_cap: i64,
    ) -> Self {
        let aliases = Arc::new(AliasAllocator::new(links.clone()));
        let guest_throttle = Arc::new(GuestThrottle::with_cap(links.clone(), guest_daily_cap));

        let link_service = Arc::new(LinkService::new(
            links.clone(),
            aliases,
            guest_throttle,
        ));
        let resolve_service = Arc::new(ResolveService::new(links.clone()));
        let analytics_service = Arc::new(AnalyticsService::new(links.clone(), clicks));

        Self {
            link_service,
            resolve_service,
            analytics_service,
            link_repo: links,
            click_sender,
            base_url,
        }
    }
}
