// ABOUTME: Timer-driven collection loop with retry, validation, and persistence
// ABOUTME: Fetches occupancy snapshots, discards out-of-range counts, and hands rows to the sink
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

//! # Collector Loop
//!
//! On a fixed interval the collector fetches the current members-in-clubs
//! snapshot, validates it, and persists it through the [`Sink`]. Fetch
//! failures retry with exponential backoff (base delay doubling per
//! attempt); once retries are exhausted the cycle is logged and skipped,
//! resuming on the next timer tick. No collector error is fatal.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::config::CollectorConfig;
use crate::errors::{AppError, AppResult};
use crate::models::Reading;
use crate::portal::MembershipProvider;
use crate::sink::Sink;

/// Timer-driven occupancy collector
pub struct Collector {
    provider: Arc<dyn MembershipProvider>,
    sink: Sink,
    config: CollectorConfig,
    club_filter: String,
}

impl Collector {
    /// Create a collector
    ///
    /// `club_filter` is a case-insensitive substring selecting which clubs to
    /// persist; empty keeps every club in the snapshot.
    #[must_use]
    pub fn new(
        provider: Arc<dyn MembershipProvider>,
        sink: Sink,
        config: CollectorConfig,
        club_filter: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            sink,
            config,
            club_filter: club_filter.into(),
        }
    }

    /// Run the collection loop forever
    pub async fn run(&self) {
        let mut ticker = interval(Duration::from_secs(self.config.scrape_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval_secs = self.config.scrape_interval_secs,
            provider = self.provider.name(),
            "collector started"
        );

        loop {
            ticker.tick().await;
            match self.collect_once().await {
                Ok(persisted) => {
                    info!(readings = persisted, "collection cycle complete");
                }
                Err(err) => {
                    error!(%err, "collection cycle failed, skipping until next tick");
                }
            }
        }
    }

    /// Execute one collection cycle; returns the number of readings persisted
    ///
    /// # Errors
    ///
    /// Returns an error when all fetch attempts fail, the payload is
    /// malformed, the club filter matches nothing, or persistence fails.
    pub async fn collect_once(&self) -> AppResult<usize> {
        let snapshot = self.fetch_with_retry().await?;

        let mut readings = Vec::new();
        for club in &snapshot.clubs {
            if !self.club_filter.is_empty()
                && !club
                    .club_name
                    .to_lowercase()
                    .contains(&self.club_filter.to_lowercase())
            {
                continue;
            }

            let reading = Reading {
                club_name: club.club_name.clone(),
                member_count: club.member_count,
                recorded_at: snapshot.fetched_at,
            };
            if reading.is_valid() {
                readings.push(reading);
            } else {
                warn!(
                    club = %club.club_name,
                    count = club.member_count,
                    "discarding out-of-range member count"
                );
            }
        }

        if !self.club_filter.is_empty() && readings.is_empty() {
            return Err(AppError::not_found(format!(
                "Club matching '{}'",
                self.club_filter
            )));
        }

        self.sink
            .persist(&readings, &snapshot.raw, snapshot.fetched_at)
            .await?;
        Ok(readings.len())
    }

    /// Fetch with up to `max_retries` attempts; delay before attempt n+1 is
    /// `initial_backoff * 2^n`
    async fn fetch_with_retry(&self) -> AppResult<crate::models::OccupancySnapshot> {
        let max_retries = self.config.max_retries.max(1);
        let mut last_err = AppError::internal("no fetch attempts were made");

        for attempt in 0..max_retries {
            match self.provider.fetch_occupancy().await {
                Ok(snapshot) => return Ok(snapshot),
                Err(err) => {
                    if attempt + 1 < max_retries {
                        // Doubling factor capped at 2^32 so the shift cannot
                        // overflow for large retry counts
                        let factor = 1u64 << attempt.min(32);
                        let delay = Duration::from_secs(
                            self.config.initial_backoff_secs.saturating_mul(factor),
                        );
                        warn!(
                            attempt = attempt + 1,
                            max_retries,
                            delay_secs = delay.as_secs(),
                            %err,
                            "fetch attempt failed, backing off"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_err = err;
                }
            }
        }

        Err(AppError::external_service(
            self.provider.name(),
            format!("failed after {max_retries} attempts: {last_err}"),
        ))
    }
}
