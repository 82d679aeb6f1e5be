//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, worker spawning, periodic sweeps, and the
//! Axum server lifecycle.

use crate::application::click_worker::run_click_worker;
use crate::application::services::{ClickService, SweepService};
use crate::config::Config;
use crate::infrastructure::geo::build_locator;
use crate::infrastructure::persistence::{PgClickRepository, PgLinkRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - GeoIP locator (or a null fallback)
/// - Background click worker
/// - Periodic lifecycle and retention sweeps
/// - Axum HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Database connection fails
/// - Migrations fail
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let pool_arc = Arc::new(pool);
    let link_repository = Arc::new(PgLinkRepository::new(pool_arc.clone()));
    let click_repository = Arc::new(PgClickRepository::new(pool_arc.clone()));

    let geo = build_locator(config.geoip_db_path.as_deref());
    info!(locator = geo.name(), "Geolocation initialized");

    let (click_tx, click_rx) = mpsc::channel(config.click_queue_capacity);

    let click_service = Arc::new(ClickService::new(
        link_repository.clone(),
        click_repository.clone(),
        geo,
    ));
    tokio::spawn(run_click_worker(click_rx, click_service));
    info!("Click worker started");

    let sweeper = Arc::new(SweepService::new(link_repository.clone()));
    tokio::spawn(run_status_sweeps(
        sweeper.clone(),
        Duration::from_secs(config.status_sweep_interval_secs),
    ));
    tokio::spawn(run_retention_sweeps(
        sweeper,
        Duration::from_secs(config.retention_sweep_interval_secs),
    ));
    info!("Sweep tasks started");

    let state = AppState::new(
        link_repository,
        click_repository,
        click_tx,
        config.base_url.clone(),
        config.guest_daily_cap,
    );

    let app = app_router(state, config.behind_proxy);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .await?;

    Ok(())
}

/// Periodic lifecycle sweep: activates due scheduled links and disables
/// expired ones. The first tick fires immediately, which doubles as
/// catch-up after downtime; both statements are idempotent.
async fn run_status_sweeps(sweeper: Arc<SweepService>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match sweeper.run_status_sweep().await {
            Ok(outcome) if outcome.activated > 0 || outcome.disabled > 0 => {
                info!(
                    activated = outcome.activated,
                    disabled = outcome.disabled,
                    "Status sweep applied transitions"
                );
            }
            Ok(_) => {}
            Err(e) => error!("Status sweep failed: {}", e),
        }
    }
}

/// Periodic retention purge of expired guest and free-tier links.
async fn run_retention_sweeps(sweeper: Arc<SweepService>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match sweeper.run_retention_sweep().await {
            Ok(0) => {}
            Ok(purged) => info!(purged, "Retention sweep purged links"),
            Err(e) => error!("Retention sweep failed: {}", e),
        }
    }
}
