//! CLI administration tool for linkforge.
//!
//! Provides commands for running lifecycle sweeps, viewing statistics,
//! and performing database operations without requiring HTTP API access.
//!
//! # Usage
//!
//! ```bash
//! # Apply due lifecycle transitions (scheduled activation, expiry)
//! cargo run --bin admin -- sweep status
//!
//! # Purge guest and free-tier links past their retention window
//! cargo run --bin admin -- sweep retention
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string
//!
//! # Features
//!
//! - **Sweeps**: Run the lifecycle and retention sweeps on demand
//! - **Statistics**: View link and click counts
//! - **Database Tools**: Connection checks and info queries
//! - **Interactive Prompts**: Confirmation dialogs before destructive actions
//! - **Colored Output**: Terminal-friendly formatting using `colored` crate

use linkforge::application::services::SweepService;
use linkforge::infrastructure::persistence::PgLinkRepository;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing linkforge.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Run a maintenance sweep
    Sweep {
        #[command(subcommand)]
        action: SweepAction,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Sweep subcommands.
#[derive(Subcommand)]
enum SweepAction {
    /// Activate due scheduled links and disable expired ones
    Status,

    /// Permanently purge guest and free-tier links past retention
    Retention {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Connect to database
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Sweep { action } => handle_sweep_action(action, &pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Dispatches sweep commands.
async fn handle_sweep_action(action: SweepAction, pool: &PgPool) -> Result<()> {
    let repo = Arc::new(PgLinkRepository::new(Arc::new(pool.clone())));
    let sweeper = SweepService::new(repo);

    match action {
        SweepAction::Status => run_status_sweep(&sweeper).await?,
        SweepAction::Retention { yes } => run_retention_sweep(&sweeper, yes).await?,
    }

    Ok(())
}

/// Runs the lifecycle sweep and reports the transition counts.
async fn run_status_sweep(sweeper: &SweepService) -> Result<()> {
    println!("{}", "🔄 Status Sweep".bright_blue().bold());
    println!();

    let outcome = sweeper
        .run_status_sweep()
        .await
        .map_err(|e| anyhow::anyhow!("Sweep failed: {}", e))?;

    println!(
        "  Activated: {}",
        outcome.activated.to_string().bright_green().bold()
    );
    println!(
        "  Disabled:  {}",
        outcome.disabled.to_string().bright_yellow().bold()
    );
    println!();
    println!("{}", "✅ Sweep complete".green().bold());
    println!();

    Ok(())
}

/// Runs the retention purge with a confirmation prompt.
///
/// # Safety
///
/// - Deleted links and their click history are unrecoverable
/// - Requires confirmation (default: No) unless `--yes` is passed
async fn run_retention_sweep(sweeper: &SweepService, skip_confirm: bool) -> Result<()> {
    println!("{}", "🗑️  Retention Sweep".bright_blue().bold());
    println!();
    println!(
        "{}",
        "⚠️  This permanently deletes guest and free-tier links past their retention window."
            .yellow()
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Purge now?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let purged = sweeper
        .run_retention_sweep()
        .await
        .map_err(|e| anyhow::anyhow!("Sweep failed: {}", e))?;

    println!();
    println!(
        "  Purged: {}",
        purged.to_string().bright_green().bold()
    );
    println!();
    println!("{}", "✅ Sweep complete".green().bold());
    println!();

    Ok(())
}

/// Displays system statistics.
///
/// Shows:
/// - Total number of links and their status breakdown
/// - Total number of click events
/// - Number of distinct (link, visitor) pairs
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let links_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links")
        .fetch_one(pool)
        .await?;

    let active_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE status = 'ACTIVE'")
            .fetch_one(pool)
            .await?;

    let scheduled_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE status = 'SCHEDULED'")
            .fetch_one(pool)
            .await?;

    let clicks_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM click_events")
        .fetch_one(pool)
        .await?;

    let visitors_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM link_visitors")
        .fetch_one(pool)
        .await?;

    println!(
        "  Links:     {} ({} active, {} scheduled)",
        links_count.to_string().bright_green().bold(),
        active_count.to_string().green(),
        scheduled_count.to_string().cyan()
    );
    println!(
        "  Clicks:    {}",
        clicks_count.to_string().bright_green().bold()
    );
    println!(
        "  Visitors:  {}",
        visitors_count.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!();
        }
    }

    Ok(())
}
