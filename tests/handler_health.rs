mod common;

use axum::{Router, routing::get};
use axum_test::TestServer;
use serde_json::Value;

use common::create_test_state;
use linkforge::api::handlers::health_handler;

#[tokio::test]
async fn test_health_ok() {
    let ctx = create_test_state();
    let app = Router::new()
        .route("/health", get(health_handler))
        .with_state(ctx.state.clone());
    let server = TestServer::new(app).unwrap();

    let response = server.get("/health").await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["checks"]["database"]["status"], "ok");
    assert_eq!(body["checks"]["click_queue"]["status"], "ok");
    assert!(
        body["checks"]["click_queue"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Capacity:")
    );
}

#[tokio::test]
async fn test_health_degraded_when_queue_closed() {
    let ctx = create_test_state();
    let app = Router::new()
        .route("/health", get(health_handler))
        .with_state(ctx.state.clone());
    let server = TestServer::new(app).unwrap();

    // Dropping the receiver closes the channel, as a crashed worker would.
    drop(ctx.click_rx);

    let response = server.get("/health").await;

    response.assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = response.json();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["database"]["status"], "ok");
    assert_eq!(body["checks"]["click_queue"]["status"], "error");
}
