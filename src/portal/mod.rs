// ABOUTME: Membership provider abstraction for fetching club occupancy data
// ABOUTME: Defines the provider trait implemented by the portal client and the synthetic provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

//! # Membership Provider Seam
//!
//! The collector talks to the upstream portal through [`MembershipProvider`]
//! so the real HTTP client and the synthetic test provider are
//! interchangeable. Providers return an [`OccupancySnapshot`] carrying both
//! the normalized club list and the raw payload for the audit log.

mod client;
mod synthetic;

pub use client::PortalClient;
pub use synthetic::SyntheticProvider;

use async_trait::async_trait;

use crate::errors::AppResult;
use crate::models::OccupancySnapshot;

/// Source of club occupancy snapshots
#[async_trait]
pub trait MembershipProvider: Send + Sync {
    /// Short provider name for logging
    fn name(&self) -> &'static str;

    /// Fetch the current members-in-clubs snapshot
    ///
    /// # Errors
    ///
    /// Returns an error on authentication failure, transport failure, or a
    /// payload that does not match the expected shape.
    async fn fetch_occupancy(&self) -> AppResult<OccupancySnapshot>;
}
