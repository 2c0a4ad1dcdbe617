// ABOUTME: Server binary - runs the collector loop, retention sweeper, goal sweep, and health endpoint
// ABOUTME: Loads environment configuration and wires all components together
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

//! # Gymwatch Server Binary
//!
//! Starts the occupancy collector with its background tasks: the daily
//! retention sweeper, the hourly goal sweep, and the health endpoint. The
//! only fatal startup condition is missing portal credentials; collection
//! failures are logged and skipped.

use anyhow::Result;
use clap::Parser;
use gymwatch::{
    collector::Collector,
    config::ServerConfig,
    database::Database,
    logging,
    portal::{MembershipProvider, PortalClient},
    retention::RetentionSweeper,
    sink::Sink,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Hourly cadence for the goal sweep; the sweep is idempotent, so running
/// more often than the Saturday deadline only catches up missed transitions
const GOAL_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Parser)]
#[command(name = "gymwatch-server")]
#[command(about = "Gymwatch - club occupancy collector and goal tracker")]
struct Args {
    /// Override the health endpoint port
    #[arg(long)]
    health_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.health_port {
        config.health_port = port;
    }

    info!("Starting gymwatch server");
    info!("{}", config.summary());

    let database = Database::new(&config.storage.database_url).await?;

    // Health endpoint
    let health_db = database.clone();
    let health_port = config.health_port;
    tokio::spawn(async move {
        if let Err(err) = gymwatch::health::serve(health_db, health_port).await {
            error!(%err, "health endpoint stopped");
        }
    });

    // Daily audit-log rotation and backup pruning
    let sweeper = RetentionSweeper::new(
        config.storage.audit_log_path.clone(),
        config.storage.backup_dir.clone(),
        config.storage.backup_retention_days,
    );
    tokio::spawn(async move { sweeper.run().await });

    // Hourly goal sweep and message pruning. Ban notifications are logged
    // here; the chat adapter delivers them out of process.
    let sweep_db = database.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(GOAL_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let now = chrono::Utc::now();
            match sweep_db.sweep_expired_goals(now).await {
                Ok(failed) => {
                    for goal in &failed {
                        warn!(
                            user_id = goal.user_id,
                            goal_id = goal.id,
                            "goal failed, user banned for 30 days"
                        );
                    }
                }
                Err(err) => error!(%err, "goal sweep failed"),
            }
            match sweep_db.prune_messages(now).await {
                Ok(0) => {}
                Ok(pruned) => info!(pruned, "pruned expired chat messages"),
                Err(err) => error!(%err, "message pruning failed"),
            }
        }
    });

    // Collector loop on the main task
    let provider: Arc<dyn MembershipProvider> = Arc::new(PortalClient::new(config.portal.clone())?);
    let sink = Sink::new(database, config.storage.audit_log_path.clone());
    let collector = Collector::new(
        provider,
        sink,
        config.collector.clone(),
        config.portal.club_filter.clone(),
    );

    tokio::select! {
        () = collector.run() => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("shutdown signal received");
        }
    }

    Ok(())
}
