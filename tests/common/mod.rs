//! Shared fixtures for the handler integration tests.
//!
//! The tests run the real services over in-memory repository
//! implementations, so everything above the SQL layer is exercised for
//! real. The in-memory repositories mirror the conditional-update and
//! uniqueness semantics of the PostgreSQL implementations; when those
//! change, change these too.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use axum::extract::ConnectInfo;
use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::mpsc;

use linkforge::domain::click_message::ClickMessage;
use linkforge::domain::entities::{
    ClickEvent, Link, LinkPatch, LinkStatus, NewClickEvent, NewLink, Tier,
};
use linkforge::domain::repositories::{
    BreakdownDimension, ClickRepository, DateCount, EventFilter, EventPage, LabelCount,
    LinkRepository,
};
use linkforge::error::AppError;
use linkforge::state::AppState;

pub const TEST_BASE_URL: &str = "https://lf.test";

/// Guest quota used by the test state. Low so throttle tests stay short.
pub const TEST_GUEST_CAP: i64 = 3;

/// Wired state plus direct handles for seeding and assertions.
pub struct TestContext {
    pub state: AppState,
    pub links: Arc<InMemoryLinkRepository>,
    pub clicks: Arc<InMemoryClickRepository>,
    pub click_rx: mpsc::Receiver<ClickMessage>,
}

/// Builds an [`AppState`] over fresh in-memory repositories.
///
/// The click channel's receiving end is handed back so tests can assert
/// what the handlers enqueued (or drive a worker themselves).
pub fn create_test_state() -> TestContext {
    let links = Arc::new(InMemoryLinkRepository::new());
    let clicks = Arc::new(InMemoryClickRepository::new());
    let (click_tx, click_rx) = mpsc::channel(64);

    let state = AppState::new(
        links.clone(),
        clicks.clone(),
        click_tx,
        TEST_BASE_URL.to_string(),
        TEST_GUEST_CAP,
    );

    TestContext {
        state,
        links,
        clicks,
        click_rx,
    }
}

/// A plain active guest link. Tests override fields before seeding.
pub fn new_link(code: &str) -> NewLink {
    NewLink {
        owner_id: None,
        owner_tier: Tier::Free,
        original_url: "https://example.com/landing".to_string(),
        short_code: code.to_string(),
        custom_alias: None,
        status: LinkStatus::Active,
        password_hash: None,
        scheduled_at: None,
        expires_at: None,
        click_limit: None,
        is_one_time: false,
        creator_ip: None,
    }
}

pub async fn seed_link(repo: &InMemoryLinkRepository, code: &str) -> Link {
    repo.create(new_link(code)).await.unwrap()
}

pub async fn seed_owned_link(
    repo: &InMemoryLinkRepository,
    owner_id: i64,
    tier: Tier,
    code: &str,
) -> Link {
    let mut link = new_link(code);
    link.owner_id = Some(owner_id);
    link.owner_tier = tier;
    repo.create(link).await.unwrap()
}

// ─── In-memory link repository ──────────────────────────────────────────────

pub struct InMemoryLinkRepository {
    links: Mutex<Vec<Link>>,
    next_id: AtomicI64,
}

impl InMemoryLinkRepository {
    pub fn new() -> Self {
        Self {
            links: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Snapshot of a stored link for direct assertions.
    pub fn get(&self, id: i64) -> Option<Link> {
        self.links.lock().unwrap().iter().find(|l| l.id == id).cloned()
    }

    pub fn count(&self) -> usize {
        self.links.lock().unwrap().len()
    }

    /// Backdates `created_at`, for retention tests.
    pub fn age_link(&self, id: i64, created_at: DateTime<Utc>) {
        let mut links = self.links.lock().unwrap();
        if let Some(link) = links.iter_mut().find(|l| l.id == id) {
            link.created_at = created_at;
        }
    }

    /// Stamps a scanner verdict onto a stored link, standing in for the
    /// out-of-band scanner that normally writes these columns.
    pub fn set_scan_status(&self, id: i64, verdict: &str) {
        let mut links = self.links.lock().unwrap();
        if let Some(link) = links.iter_mut().find(|l| l.id == id) {
            link.scan_status = Some(verdict.to_string());
            link.scanned_at = Some(Utc::now());
        }
    }
}

fn taken(links: &[Link], candidate: &str, excluding_id: Option<i64>) -> bool {
    links.iter().any(|l| {
        excluding_id != Some(l.id)
            && (l.short_code == candidate || l.custom_alias.as_deref() == Some(candidate))
    })
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut links = self.links.lock().unwrap();

        // Stand-in for the unique indexes on short_code and custom_alias.
        let candidates = [Some(new_link.short_code.as_str()), new_link.custom_alias.as_deref()];
        for candidate in candidates.into_iter().flatten() {
            if taken(&links, candidate, None) {
                return Err(AppError::conflict(
                    "Short code or alias already exists",
                    json!({ "code": candidate }),
                ));
            }
        }

        let now = Utc::now();
        let link = Link {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            owner_id: new_link.owner_id,
            owner_tier: new_link.owner_tier,
            original_url: new_link.original_url,
            short_code: new_link.short_code,
            custom_alias: new_link.custom_alias,
            status: new_link.status,
            scan_status: None,
            scan_score: None,
            scan_details: None,
            scanned_at: None,
            password_hash: new_link.password_hash,
            scheduled_at: new_link.scheduled_at,
            expires_at: new_link.expires_at,
            click_limit: new_link.click_limit,
            is_one_time: new_link.is_one_time,
            is_archived: false,
            click_count: 0,
            unique_click_count: 0,
            last_clicked_at: None,
            creator_ip: new_link.creator_ip,
            created_at: now,
            updated_at: now,
        };
        links.push(link.clone());
        Ok(link)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        Ok(self.get(id))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let links = self.links.lock().unwrap();
        Ok(links
            .iter()
            .find(|l| l.short_code == code || l.custom_alias.as_deref() == Some(code))
            .cloned())
    }

    async fn code_or_alias_taken(
        &self,
        candidate: &str,
        excluding_id: Option<i64>,
    ) -> Result<bool, AppError> {
        let links = self.links.lock().unwrap();
        Ok(taken(&links, candidate, excluding_id))
    }

    async fn list_by_owner(
        &self,
        owner_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Link>, AppError> {
        let links = self.links.lock().unwrap();
        let mut rows: Vec<Link> = links
            .iter()
            .filter(|l| l.owner_id == Some(owner_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_by_owner(&self, owner_id: i64) -> Result<i64, AppError> {
        let links = self.links.lock().unwrap();
        Ok(links.iter().filter(|l| l.owner_id == Some(owner_id)).count() as i64)
    }

    async fn update(&self, id: i64, patch: LinkPatch) -> Result<Link, AppError> {
        let mut links = self.links.lock().unwrap();
        let Some(link) = links.iter_mut().find(|l| l.id == id) else {
            return Err(AppError::not_found("Link not found", json!({ "id": id })));
        };

        if let Some(url) = patch.original_url {
            link.original_url = url;
        }
        if let Some(alias) = patch.custom_alias {
            link.custom_alias = alias;
        }
        if let Some(hash) = patch.password_hash {
            link.password_hash = hash;
        }
        if let Some(at) = patch.scheduled_at {
            link.scheduled_at = at;
        }
        if let Some(at) = patch.expires_at {
            link.expires_at = at;
        }
        if let Some(limit) = patch.click_limit {
            link.click_limit = limit;
        }
        if let Some(flag) = patch.is_one_time {
            link.is_one_time = flag;
        }
        if let Some(status) = patch.status {
            link.status = status;
        }
        link.updated_at = Utc::now();
        Ok(link.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut links = self.links.lock().unwrap();
        let before = links.len();
        links.retain(|l| l.id != id);
        Ok(links.len() < before)
    }

    async fn set_archived(
        &self,
        id: i64,
        archived: bool,
        status: LinkStatus,
    ) -> Result<Link, AppError> {
        let mut links = self.links.lock().unwrap();
        let Some(link) = links.iter_mut().find(|l| l.id == id) else {
            return Err(AppError::not_found("Link not found", json!({ "id": id })));
        };
        link.is_archived = archived;
        link.status = status;
        link.updated_at = Utc::now();
        Ok(link.clone())
    }

    async fn set_status(&self, id: i64, status: LinkStatus) -> Result<Link, AppError> {
        let mut links = self.links.lock().unwrap();
        let Some(link) = links.iter_mut().find(|l| l.id == id) else {
            return Err(AppError::not_found("Link not found", json!({ "id": id })));
        };
        link.status = status;
        link.updated_at = Utc::now();
        Ok(link.clone())
    }

    async fn activate_if_due(&self, id: i64, now: DateTime<Utc>) -> Result<(), AppError> {
        let mut links = self.links.lock().unwrap();
        if let Some(link) = links.iter_mut().find(|l| l.id == id)
            && link.status == LinkStatus::Scheduled
            && link.scheduled_at.is_some_and(|at| at <= now)
        {
            link.status = LinkStatus::Active;
            link.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn disable_if_expired(&self, id: i64, now: DateTime<Utc>) -> Result<(), AppError> {
        let mut links = self.links.lock().unwrap();
        if let Some(link) = links.iter_mut().find(|l| l.id == id)
            && link.status != LinkStatus::Blocked
            && link.expires_at.is_some_and(|at| at <= now)
        {
            link.status = LinkStatus::Disabled;
            link.is_archived = true;
            link.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn disable_if_limit_reached(&self, id: i64) -> Result<(), AppError> {
        let mut links = self.links.lock().unwrap();
        if let Some(link) = links.iter_mut().find(|l| l.id == id)
            && link.status != LinkStatus::Blocked
            && link.click_limit.is_some_and(|limit| link.click_count >= i64::from(limit))
        {
            link.status = LinkStatus::Disabled;
            link.is_archived = true;
            link.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn increment_click(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<bool>, AppError> {
        let mut links = self.links.lock().unwrap();
        match links.iter_mut().find(|l| l.id == id) {
            Some(link) => {
                link.click_count += 1;
                link.last_clicked_at = Some(now);
                Ok(Some(link.is_one_time))
            }
            None => Ok(None),
        }
    }

    async fn increment_unique_click(&self, id: i64) -> Result<(), AppError> {
        let mut links = self.links.lock().unwrap();
        if let Some(link) = links.iter_mut().find(|l| l.id == id) {
            link.unique_click_count += 1;
        }
        Ok(())
    }

    async fn delete_if_one_time(&self, id: i64) -> Result<bool, AppError> {
        let mut links = self.links.lock().unwrap();
        let before = links.len();
        links.retain(|l| l.id != id || !l.is_one_time);
        Ok(links.len() < before)
    }

    async fn count_guest_links_since(
        &self,
        ip: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let links = self.links.lock().unwrap();
        Ok(links
            .iter()
            .filter(|l| {
                l.owner_id.is_none()
                    && l.creator_ip.as_deref() == Some(ip)
                    && l.created_at >= since
            })
            .count() as i64)
    }

    async fn activate_due_scheduled(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut links = self.links.lock().unwrap();
        let mut touched = 0;
        for link in links.iter_mut() {
            if link.status == LinkStatus::Scheduled
                && link.scheduled_at.is_some_and(|at| at <= now)
                && !link.expires_at.is_some_and(|at| at <= now)
            {
                link.status = LinkStatus::Active;
                link.updated_at = Utc::now();
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn disable_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut links = self.links.lock().unwrap();
        let mut touched = 0;
        for link in links.iter_mut() {
            if matches!(link.status, LinkStatus::Active | LinkStatus::Scheduled)
                && link.expires_at.is_some_and(|at| at <= now)
            {
                link.status = LinkStatus::Disabled;
                link.is_archived = true;
                link.updated_at = Utc::now();
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn purge_per_retention(
        &self,
        guest_cutoff: DateTime<Utc>,
        free_cutoff: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let mut links = self.links.lock().unwrap();
        let before = links.len();
        links.retain(|l| match l.owner_id {
            None => l.created_at >= guest_cutoff,
            Some(_) => l.owner_tier != Tier::Free || l.created_at >= free_cutoff,
        });
        Ok((before - links.len()) as u64)
    }
}

// ─── In-memory click repository ─────────────────────────────────────────────

pub struct InMemoryClickRepository {
    events: Mutex<Vec<ClickEvent>>,
    visitors: Mutex<HashSet<(i64, String)>>,
    next_id: AtomicI64,
}

impl InMemoryClickRepository {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            visitors: Mutex::new(HashSet::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

fn in_range(at: DateTime<Utc>, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
    from.is_none_or(|f| at >= f) && to.is_none_or(|t| at <= t)
}

#[async_trait]
impl ClickRepository for InMemoryClickRepository {
    async fn record_event(&self, event: NewClickEvent) -> Result<ClickEvent, AppError> {
        // First insert for a (link, visitor) pair wins, like the PK probe
        // on link_visitors.
        let is_unique = self
            .visitors
            .lock()
            .unwrap()
            .insert((event.link_id, event.visitor_id.clone()));

        let stored = ClickEvent {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            link_id: event.link_id,
            clicked_at: event.clicked_at,
            visitor_id: event.visitor_id,
            is_unique,
            ip_address: event.ip_address,
            user_agent: event.user_agent,
            browser: event.browser,
            os: event.os,
            device: event.device,
            country: event.country,
            city: event.city,
            region: event.region,
            latitude: event.latitude,
            longitude: event.longitude,
            referrer: event.referrer,
            referrer_domain: event.referrer_domain,
            utm_source: event.utm_source,
            utm_medium: event.utm_medium,
            utm_campaign: event.utm_campaign,
            utm_term: event.utm_term,
            utm_content: event.utm_content,
        };
        self.events.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn list_events(&self, link_id: i64, filter: EventFilter) -> Result<EventPage, AppError> {
        let events = self.events.lock().unwrap();
        let mut matches: Vec<ClickEvent> = events
            .iter()
            .filter(|e| {
                e.link_id == link_id
                    && in_range(e.clicked_at, filter.from, filter.to)
                    && filter
                        .country
                        .as_deref()
                        .is_none_or(|c| e.country.as_deref() == Some(c))
                    && filter
                        .device
                        .as_deref()
                        .is_none_or(|d| e.device.as_deref() == Some(d))
                    && filter
                        .browser
                        .as_deref()
                        .is_none_or(|b| e.browser.as_deref() == Some(b))
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.clicked_at.cmp(&a.clicked_at).then(b.id.cmp(&a.id)));
        let total = matches.len() as i64;
        let items = matches
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .collect();

        Ok(EventPage { total, items })
    }

    async fn count_clicks(
        &self,
        link_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError> {
        let events = self.events.lock().unwrap();
        Ok(events
            .iter()
            .filter(|e| e.link_id == link_id && in_range(e.clicked_at, from, to))
            .count() as i64)
    }

    async fn count_distinct_visitors(
        &self,
        link_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError> {
        let events = self.events.lock().unwrap();
        let distinct: HashSet<&str> = events
            .iter()
            .filter(|e| e.link_id == link_id && in_range(e.clicked_at, from, to))
            .map(|e| e.visitor_id.as_str())
            .collect();
        Ok(distinct.len() as i64)
    }

    async fn clicks_by_date(
        &self,
        link_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<DateCount>, AppError> {
        let events = self.events.lock().unwrap();
        let mut buckets: BTreeMap<chrono::NaiveDate, i64> = BTreeMap::new();
        for event in events
            .iter()
            .filter(|e| e.link_id == link_id && in_range(e.clicked_at, from, to))
        {
            *buckets.entry(event.clicked_at.date_naive()).or_insert(0) += 1;
        }
        Ok(buckets
            .into_iter()
            .map(|(date, count)| DateCount { date, count })
            .collect())
    }

    async fn top_breakdown(
        &self,
        link_id: i64,
        dimension: BreakdownDimension,
        limit: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<LabelCount>, AppError> {
        let events = self.events.lock().unwrap();
        let mut counts: HashMap<String, i64> = HashMap::new();
        for event in events
            .iter()
            .filter(|e| e.link_id == link_id && in_range(e.clicked_at, from, to))
        {
            let label = match dimension {
                BreakdownDimension::Country => event.country.clone(),
                BreakdownDimension::City => event.city.clone(),
                BreakdownDimension::Device => event.device.clone(),
                BreakdownDimension::Browser => event.browser.clone(),
                BreakdownDimension::Referrer => event.referrer_domain.clone(),
            };
            if let Some(label) = label {
                *counts.entry(label).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<LabelCount> = counts
            .into_iter()
            .map(|(label, count)| LabelCount { label, count })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then(a.label.cmp(&b.label)));
        ranked.truncate(limit as usize);
        Ok(ranked)
    }
}

// ─── Mock ConnectInfo ───────────────────────────────────────────────────────

/// Injects a fixed peer address into request extensions.
///
/// `axum-test` drives the router directly rather than through
/// `into_make_service_with_connect_info`, so the `ConnectInfo` extractor
/// would otherwise fail with a 500.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> tower::Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
