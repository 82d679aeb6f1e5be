//! Asynchronous click processing: counting, enrichment, self-destruct.

use std::sync::Arc;

use metrics::counter;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, warn};

use crate::domain::click_message::ClickMessage;
use crate::domain::entities::NewClickEvent;
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::infrastructure::geo::GeoLocator;
use crate::utils::fingerprint::visitor_id;
use crate::utils::referrer::{extract_utm, referrer_domain};
use crate::utils::user_agent::parse_user_agent;

/// Consumes click messages: bumps counters, stores enriched events and
/// self-destructs one-time links.
///
/// Runs entirely off the request path, so nothing here returns an error to
/// a caller; failures are logged and counted. The one write that must not
/// be lost silently, the click counter increment, gets a bounded retry.
pub struct ClickService {
    links: Arc<dyn LinkRepository>,
    clicks: Arc<dyn ClickRepository>,
    geo: Arc<dyn GeoLocator>,
}

impl ClickService {
    /// Creates a new click service.
    pub fn new(
        links: Arc<dyn LinkRepository>,
        clicks: Arc<dyn ClickRepository>,
        geo: Arc<dyn GeoLocator>,
    ) -> Self {
        Self { links, clicks, geo }
    }

    /// Processes one click message to completion.
    ///
    /// Order matters: the counter increment comes first (it also tells us
    /// whether this is a one-time link), then the analytics event, then the
    /// self-destruct. A one-time link's deletion cascades its events, so
    /// the event write has to land before the row goes away.
    pub async fn process(&self, msg: ClickMessage) {
        let Some(is_one_time) = self.record_click(&msg).await else {
            return;
        };

        self.ingest_event(&msg).await;

        if is_one_time {
            match self.links.delete_if_one_time(msg.link_id).await {
                Ok(true) => debug!(link_id = msg.link_id, "one-time link self-destructed"),
                Ok(false) => {}
                Err(e) => warn!(link_id = msg.link_id, "failed to delete one-time link: {e}"),
            }
        }
    }

    /// Increments the click counter, retrying transient failures.
    ///
    /// Returns the link's `is_one_time` flag, or `None` when the link no
    /// longer exists or the write kept failing. A `None` skips ingestion
    /// too: an event without its counter increment would let the unique
    /// count overtake the total.
    async fn record_click(&self, msg: &ClickMessage) -> Option<bool> {
        let strategy = ExponentialBackoff::from_millis(50).map(jitter).take(3);
        let result = Retry::spawn(strategy, || {
            self.links.increment_click(msg.link_id, msg.clicked_at)
        })
        .await;

        match result {
            Ok(Some(is_one_time)) => {
                counter!("clicks_recorded_total").increment(1);
                Some(is_one_time)
            }
            Ok(None) => {
                debug!(link_id = msg.link_id, "link gone before click was recorded");
                None
            }
            Err(e) => {
                error!(link_id = msg.link_id, "failed to record click: {e}");
                counter!("clicks_dropped_total").increment(1);
                None
            }
        }
    }

    /// Builds and stores the enriched analytics event.
    async fn ingest_event(&self, msg: &ClickMessage) {
        let ip = msg.ip.as_deref().unwrap_or("");
        let ua_raw = msg.user_agent.as_deref().unwrap_or("");
        let ua = parse_user_agent(ua_raw);
        let geo = msg
            .ip
            .as_deref()
            .and_then(|ip| self.geo.locate(ip))
            .unwrap_or_default();
        let utm = msg.query.as_deref().map(extract_utm).unwrap_or_default();

        let event = NewClickEvent {
            link_id: msg.link_id,
            clicked_at: msg.clicked_at,
            visitor_id: visitor_id(ip, ua_raw),
            ip_address: msg.ip.clone(),
            user_agent: msg.user_agent.clone(),
            browser: ua.browser,
            os: ua.os,
            device: ua.device,
            country: geo.country,
            city: geo.city,
            region: geo.region,
            latitude: geo.latitude,
            longitude: geo.longitude,
            referrer: msg.referrer.clone(),
            referrer_domain: msg.referrer.as_deref().and_then(referrer_domain),
            utm_source: utm.source,
            utm_medium: utm.medium,
            utm_campaign: utm.campaign,
            utm_term: utm.term,
            utm_content: utm.content,
        };

        match self.clicks.record_event(event).await {
            Ok(stored) if stored.is_unique => {
                if let Err(e) = self.links.increment_unique_click(msg.link_id).await {
                    warn!(link_id = msg.link_id, "failed to bump unique counter: {e}");
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!(link_id = msg.link_id, "failed to store click event: {e}");
                counter!("click_events_dropped_total").increment(1);
            }
        }
    }
}
