// ABOUTME: Reading persistence - append-only occupancy samples per club
// ABOUTME: Backs the collector's sink and the stats reader's queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

use chrono::{DateTime, Utc};
use sqlx::Row;

use super::Database;
use crate::errors::AppResult;
use crate::models::Reading;

impl Database {
    /// Create the readings table
    pub(super) async fn migrate_readings(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS readings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                club_name TEXT NOT NULL,
                member_count INTEGER NOT NULL,
                recorded_at DATETIME NOT NULL
            )
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_readings_club_time
            ON readings (club_name, recorded_at)
            ",
        )
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Append one reading. The collector validates range before calling;
    /// rows here are trusted.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert_reading(&self, reading: &Reading) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO readings (club_name, member_count, recorded_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(&reading.club_name)
        .bind(reading.member_count)
        .bind(reading.recorded_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Most recent reading for a club, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn latest_reading(&self, club_name: &str) -> AppResult<Option<Reading>> {
        let row = sqlx::query(
            r"
            SELECT club_name, member_count, recorded_at
            FROM readings
            WHERE club_name = $1
            ORDER BY recorded_at DESC
            LIMIT 1
            ",
        )
        .bind(club_name)
        .fetch_optional(self.pool())
        .await?;

        row.map(|r| {
            Ok(Reading {
                club_name: r.try_get("club_name")?,
                member_count: r.try_get("member_count")?,
                recorded_at: r.try_get("recorded_at")?,
            })
        })
        .transpose()
    }

    /// All readings for a club since the given instant, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn readings_since(
        &self,
        club_name: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<Reading>> {
        let rows = sqlx::query(
            r"
            SELECT club_name, member_count, recorded_at
            FROM readings
            WHERE club_name = $1 AND recorded_at > $2
            ORDER BY recorded_at ASC
            ",
        )
        .bind(club_name)
        .bind(since)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(Reading {
                    club_name: r.try_get("club_name")?,
                    member_count: r.try_get("member_count")?,
                    recorded_at: r.try_get("recorded_at")?,
                })
            })
            .collect()
    }

    /// Maximum member count for a club since the given instant
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn max_count_since(
        &self,
        club_name: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Option<i64>> {
        let row = sqlx::query(
            r"
            SELECT MAX(member_count) AS max_count
            FROM readings
            WHERE club_name = $1 AND recorded_at > $2
            ",
        )
        .bind(club_name)
        .bind(since)
        .fetch_one(self.pool())
        .await?;

        Ok(row.try_get("max_count")?)
    }
}
