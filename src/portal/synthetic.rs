// ABOUTME: Synthetic membership provider for development and testing
// ABOUTME: Serves configurable occupancy data without network access or credentials
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

//! # Synthetic Provider
//!
//! In-memory [`MembershipProvider`] used by tests, demos, and local
//! development. Counts can be pinned per club or jittered to simulate a live
//! portal. The raw payload is synthesized in the portal wire shape so the
//! audit path is exercised identically.

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde_json::json;
use std::sync::RwLock;

use super::MembershipProvider;
use crate::errors::{AppError, AppResult};
use crate::models::{ClubOccupancy, OccupancySnapshot};

/// Configurable in-memory occupancy source
pub struct SyntheticProvider {
    clubs: RwLock<Vec<ClubOccupancy>>,
    jitter: i64,
}

impl SyntheticProvider {
    /// Create a provider with the given club entries and no jitter
    #[must_use]
    pub fn new(clubs: Vec<ClubOccupancy>) -> Self {
        Self {
            clubs: RwLock::new(clubs),
            jitter: 0,
        }
    }

    /// Create a provider with a single club at a fixed count
    #[must_use]
    pub fn single_club(club_name: impl Into<String>, member_count: i64) -> Self {
        Self::new(vec![ClubOccupancy {
            club_name: club_name.into(),
            club_address: None,
            member_count,
        }])
    }

    /// Apply a uniform random jitter of up to `amount` in either direction
    /// on every fetch
    #[must_use]
    pub fn with_jitter(mut self, amount: i64) -> Self {
        self.jitter = amount;
        self
    }

    /// Replace the count for a club, if present
    ///
    /// # Errors
    ///
    /// Returns an error when the lock is poisoned or the club is unknown.
    pub fn set_count(&self, club_name: &str, member_count: i64) -> AppResult<()> {
        let mut clubs = self
            .clubs
            .write()
            .map_err(|_| AppError::internal("synthetic provider lock poisoned"))?;
        let club = clubs
            .iter_mut()
            .find(|c| c.club_name == club_name)
            .ok_or_else(|| AppError::not_found(format!("Club {club_name}")))?;
        club.member_count = member_count;
        Ok(())
    }
}

#[async_trait]
impl MembershipProvider for SyntheticProvider {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn fetch_occupancy(&self) -> AppResult<OccupancySnapshot> {
        let clubs = {
            let guard = self
                .clubs
                .read()
                .map_err(|_| AppError::internal("synthetic provider lock poisoned"))?;
            guard.clone()
        };

        let clubs: Vec<ClubOccupancy> = clubs
            .into_iter()
            .map(|mut club| {
                if self.jitter > 0 {
                    let delta = rand::thread_rng().gen_range(-self.jitter..=self.jitter);
                    club.member_count += delta;
                }
                club
            })
            .collect();

        // Mirror the portal wire shape so audit-log consumers see one format
        let raw = json!({
            "UsersInClubList": clubs
                .iter()
                .map(|c| {
                    json!({
                        "ClubName": c.club_name,
                        "ClubAddress": c.club_address,
                        "UsersCountCurrentlyInClub": c.member_count,
                    })
                })
                .collect::<Vec<_>>()
        });

        Ok(OccupancySnapshot {
            clubs,
            raw,
            fetched_at: Utc::now(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_returns_configured_clubs() {
        let provider = SyntheticProvider::single_club("Ferio Gaj", 33);
        let snapshot = provider.fetch_occupancy().await.unwrap();
        assert_eq!(snapshot.clubs.len(), 1);
        assert_eq!(snapshot.clubs[0].member_count, 33);
        assert!(snapshot.raw.get("UsersInClubList").is_some());
    }

    #[tokio::test]
    async fn set_count_updates_next_fetch() {
        let provider = SyntheticProvider::single_club("Ferio Gaj", 10);
        provider.set_count("Ferio Gaj", 99).unwrap();
        let snapshot = provider.fetch_occupancy().await.unwrap();
        assert_eq!(snapshot.clubs[0].member_count, 99);
    }

    #[tokio::test]
    async fn unknown_club_is_an_error() {
        let provider = SyntheticProvider::single_club("Ferio Gaj", 10);
        assert!(provider.set_count("Nowhere", 5).is_err());
    }
}
