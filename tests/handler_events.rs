mod common;

use axum_test::TestServer;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;

use common::{
    InMemoryClickRepository, MockConnectInfoLayer, TestContext, create_test_state, seed_link,
};
use linkforge::api::routes::api_routes;
use linkforge::domain::entities::{ClickEvent, NewClickEvent};
use linkforge::domain::repositories::ClickRepository;

fn make_server(ctx: &TestContext) -> TestServer {
    let app = api_routes()
        .layer(MockConnectInfoLayer)
        .with_state(ctx.state.clone());

    TestServer::new(app).unwrap()
}

/// RFC 3339 with a `Z` suffix, safe to embed in a query string.
fn query_ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Stores one bare event `age` back from now and returns the stored row.
async fn record(
    clicks: &InMemoryClickRepository,
    link_id: i64,
    visitor: &str,
    age: Duration,
) -> ClickEvent {
    let event = NewClickEvent::bare(link_id, visitor, Utc::now() - age);
    clicks.record_event(event).await.unwrap()
}

// ─── Tier gating ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_events_free_tier_gets_empty_page() {
    let ctx = create_test_state();
    let server = make_server(&ctx);

    let link = seed_link(&ctx.links, "freebie").await;
    record(&ctx.clicks, link.id, "v1", Duration::hours(1)).await;
    record(&ctx.clicks, link.id, "v2", Duration::hours(2)).await;

    // No tier header defaults to free.
    let response = server.get(&format!("/links/{}/events", link.id)).await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
    assert_eq!(body["pagination"]["total_items"], 0);
    assert_eq!(body["pagination"]["total_pages"], 0);
}

#[tokio::test]
async fn test_events_free_tier_skips_existence_check() {
    let ctx = create_test_state();
    let server = make_server(&ctx);

    let response = server.get("/links/99999/events").await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["pagination"]["total_items"], 0);
}

#[tokio::test]
async fn test_events_pro_missing_link() {
    let ctx = create_test_state();
    let server = make_server(&ctx);

    let response = server
        .get("/links/99999/events")
        .add_header("X-Owner-Tier", "pro")
        .await;

    response.assert_status_not_found();
}

// ─── Ordering and pagination ─────────────────────────────────────────────────

#[tokio::test]
async fn test_events_pro_newest_first() {
    let ctx = create_test_state();
    let server = make_server(&ctx);

    let link = seed_link(&ctx.links, "ordered").await;
    record(&ctx.clicks, link.id, "v-oldest", Duration::hours(3)).await;
    record(&ctx.clicks, link.id, "v-middle", Duration::hours(2)).await;
    record(&ctx.clicks, link.id, "v-newest", Duration::hours(1)).await;

    let response = server
        .get(&format!("/links/{}/events", link.id))
        .add_header("X-Owner-Tier", "pro")
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["page_size"], 25);
    assert_eq!(body["pagination"]["total_items"], 3);
    assert_eq!(body["pagination"]["total_pages"], 1);

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["visitor_id"], "v-newest");
    assert_eq!(items[2]["visitor_id"], "v-oldest");
    // Three distinct visitors, so every event was a first sighting.
    assert!(items.iter().all(|i| i["is_unique"] == true));
}

#[tokio::test]
async fn test_events_paginates() {
    let ctx = create_test_state();
    let server = make_server(&ctx);

    let link = seed_link(&ctx.links, "pages").await;
    for n in 0..12 {
        record(
            &ctx.clicks,
            link.id,
            &format!("v{n}"),
            Duration::minutes(12 - n),
        )
        .await;
    }

    let first = server
        .get(&format!("/links/{}/events?page_size=10", link.id))
        .add_header("X-Owner-Tier", "pro")
        .await;

    first.assert_status_ok();
    let body: Value = first.json();
    assert_eq!(body["items"].as_array().unwrap().len(), 10);
    assert_eq!(body["pagination"]["total_items"], 12);
    assert_eq!(body["pagination"]["total_pages"], 2);
    // v11 is the youngest event, so it leads the first page.
    assert_eq!(body["items"][0]["visitor_id"], "v11");

    let second = server
        .get(&format!("/links/{}/events?page=2&page_size=10", link.id))
        .add_header("X-Owner-Tier", "pro")
        .await;

    second.assert_status_ok();
    let body: Value = second.json();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(body["pagination"]["page"], 2);
    assert_eq!(items[1]["visitor_id"], "v0");
}

#[tokio::test]
async fn test_events_rejects_bad_page_size() {
    let ctx = create_test_state();
    let server = make_server(&ctx);

    let link = seed_link(&ctx.links, "toosmall").await;

    let response = server
        .get(&format!("/links/{}/events?page_size=5", link.id))
        .add_header("X-Owner-Tier", "pro")
        .await;

    response.assert_status_bad_request();

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "validation_error");
}

// ─── Filters ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_events_country_filter() {
    let ctx = create_test_state();
    let server = make_server(&ctx);

    let link = seed_link(&ctx.links, "geo").await;
    for (visitor, country) in [("v1", "US"), ("v2", "US"), ("v3", "DE")] {
        let mut event = NewClickEvent::bare(link.id, visitor, Utc::now() - Duration::hours(1));
        event.country = Some(country.to_string());
        ctx.clicks.record_event(event).await.unwrap();
    }

    let response = server
        .get(&format!("/links/{}/events?country=US", link.id))
        .add_header("X-Owner-Tier", "pro")
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["pagination"]["total_items"], 2);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i["country"] == "US"));
}

#[tokio::test]
async fn test_events_date_range_filter() {
    let ctx = create_test_state();
    let server = make_server(&ctx);

    let link = seed_link(&ctx.links, "windowed").await;
    record(&ctx.clicks, link.id, "v-ancient", Duration::days(10)).await;
    record(&ctx.clicks, link.id, "v-recent", Duration::days(2)).await;
    record(&ctx.clicks, link.id, "v-fresh", Duration::hours(1)).await;

    let from = query_ts(Utc::now() - Duration::days(3));
    let response = server
        .get(&format!("/links/{}/events?from={from}", link.id))
        .add_header("X-Owner-Tier", "pro")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["pagination"]["total_items"], 2);

    // Bounded on both ends only the middle event survives.
    let to = query_ts(Utc::now() - Duration::days(1));
    let response = server
        .get(&format!("/links/{}/events?from={from}&to={to}", link.id))
        .add_header("X-Owner-Tier", "pro")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["visitor_id"], "v-recent");
}

// ─── Field shaping ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_events_ip_masked_and_empty_fields_omitted() {
    let ctx = create_test_state();
    let server = make_server(&ctx);

    let link = seed_link(&ctx.links, "shaped").await;

    let mut rich = NewClickEvent::bare(link.id, "v-rich", Utc::now() - Duration::hours(1));
    rich.ip_address = Some("203.0.113.99".to_string());
    rich.country = Some("US".to_string());
    rich.browser = Some("Firefox".to_string());
    ctx.clicks.record_event(rich).await.unwrap();

    let bare = NewClickEvent::bare(link.id, "v-bare", Utc::now() - Duration::hours(2));
    ctx.clicks.record_event(bare).await.unwrap();

    let response = server
        .get(&format!("/links/{}/events", link.id))
        .add_header("X-Owner-Tier", "pro")
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);

    let rich = &items[0];
    assert_eq!(rich["visitor_id"], "v-rich");
    // Raw octets never leave the server.
    assert_eq!(rich["ip"], "203.0.xxx.xxx");
    assert_eq!(rich["country"], "US");
    assert_eq!(rich["browser"], "Firefox");

    let bare = &items[1];
    assert_eq!(bare["visitor_id"], "v-bare");
    assert!(bare.get("ip").is_none());
    assert!(bare.get("country").is_none());
    assert!(bare.get("utm_source").is_none());
}
