// ABOUTME: Stats reader - resampling and summary aggregates over stored readings
// ABOUTME: Produces fixed-bucket mean series and current/max summaries per club
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

//! # Stats Reader
//!
//! Read-side companion to the collector: loads recent readings, resamples
//! them into fixed time buckets (mean per bucket, empty buckets omitted),
//! and computes the summary aggregates the bot reports. The resampled series
//! is the chart-ready product; image rendering happens outside this
//! repository.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::Reading;

/// One resampled time bucket
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Bucket {
    /// Bucket start, aligned to the bucket width
    pub start: DateTime<Utc>,
    /// Mean member count of the samples falling in this bucket
    pub mean: f64,
}

/// Summary aggregates for one club
#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    /// Club the summary covers
    pub club_name: String,
    /// Latest member count
    pub current_members: i64,
    /// When the latest reading was collected
    pub current_as_of: DateTime<Utc>,
    /// Maximum count over the last 24 hours
    pub max_24h: Option<i64>,
    /// Maximum count over the last 7 days
    pub max_7d: Option<i64>,
    /// Maximum count over the last 14 days
    pub max_14d: Option<i64>,
}

/// Read-side stats access over the readings table
#[derive(Clone)]
pub struct StatsReader {
    database: Database,
}

impl StatsReader {
    /// Create a reader over the given database
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Most recent reading for a club
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when no readings exist for the club.
    pub async fn latest(&self, club_name: &str) -> AppResult<Reading> {
        self.database
            .latest_reading(club_name)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Readings for club {club_name}")))
    }

    /// Summary aggregates: current members plus 24h/7d/14d maxima
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when no readings exist for the club.
    pub async fn summary(&self, club_name: &str) -> AppResult<StatsSummary> {
        let latest = self.latest(club_name).await?;
        let now = Utc::now();

        let max_24h = self
            .database
            .max_count_since(club_name, now - Duration::days(1))
            .await?;
        let max_7d = self
            .database
            .max_count_since(club_name, now - Duration::days(7))
            .await?;
        let max_14d = self
            .database
            .max_count_since(club_name, now - Duration::days(14))
            .await?;

        Ok(StatsSummary {
            club_name: club_name.to_owned(),
            current_members: latest.member_count,
            current_as_of: latest.recorded_at,
            max_24h,
            max_7d,
            max_14d,
        })
    }

    /// Maximum member count over the last `days` days
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a non-positive day count, or a database
    /// error.
    pub async fn max_over_days(&self, club_name: &str, days: i64) -> AppResult<Option<i64>> {
        if days <= 0 {
            return Err(AppError::invalid_input("day window must be positive"));
        }
        self.database
            .max_count_since(club_name, Utc::now() - Duration::days(days))
            .await
    }

    /// Resample the last `window` of readings into fixed `bucket`-wide means,
    /// oldest bucket first. Empty buckets are omitted rather than
    /// interpolated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a non-positive bucket width, or a database
    /// error.
    pub async fn resample(
        &self,
        club_name: &str,
        window: Duration,
        bucket: Duration,
    ) -> AppResult<Vec<Bucket>> {
        let bucket_secs = bucket.num_seconds();
        if bucket_secs <= 0 {
            return Err(AppError::invalid_input("bucket width must be positive"));
        }

        let since = Utc::now() - window;
        let readings = self.database.readings_since(club_name, since).await?;
        Ok(resample_readings(&readings, bucket_secs))
    }
}

/// Pure bucketing over an ordered reading slice; bucket starts are aligned to
/// multiples of the bucket width since the epoch
fn resample_readings(readings: &[Reading], bucket_secs: i64) -> Vec<Bucket> {
    let mut buckets: Vec<Bucket> = Vec::new();
    let mut current_start: Option<i64> = None;
    let mut sum = 0i64;
    let mut count = 0i64;

    let mut flush = |start: i64, sum: i64, count: i64, out: &mut Vec<Bucket>| {
        if count > 0 {
            if let Some(ts) = Utc.timestamp_opt(start, 0).single() {
                out.push(Bucket {
                    start: ts,
                    mean: sum as f64 / count as f64,
                });
            }
        }
    };

    for reading in readings {
        let aligned = reading.recorded_at.timestamp() / bucket_secs * bucket_secs;
        match current_start {
            Some(start) if start == aligned => {
                sum += reading.member_count;
                count += 1;
            }
            Some(start) => {
                flush(start, sum, count, &mut buckets);
                current_start = Some(aligned);
                sum = reading.member_count;
                count = 1;
            }
            None => {
                current_start = Some(aligned);
                sum = reading.member_count;
                count = 1;
            }
        }
    }
    if let Some(start) = current_start {
        flush(start, sum, count, &mut buckets);
    }

    buckets
}
