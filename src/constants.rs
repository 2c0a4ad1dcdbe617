// ABOUTME: System-wide constants and limit values for gymwatch
// ABOUTME: Contains validation bounds, retention windows, and service identity values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

//! Application constants shared across modules

/// Validation bounds and domain limits
pub mod limits {
    /// Highest member count accepted from the portal; a reading above this
    /// (or below zero) is discarded rather than persisted
    pub const MAX_MEMBER_COUNT: i64 = 1000;

    /// Minimum weekly visit target a user may commit to
    pub const MIN_GOAL_TARGET: i64 = 1;

    /// Maximum weekly visit target a user may commit to
    pub const MAX_GOAL_TARGET: i64 = 5;

    /// Days a ban lasts after a failed goal
    pub const BAN_DURATION_DAYS: i64 = 30;

    /// Hours a stored chat message stays eligible for LLM context
    pub const MESSAGE_MAX_AGE_HOURS: i64 = 72;

    /// Running character budget applied when reading chat history
    pub const MESSAGE_CHAR_BUDGET: usize = 8000;
}

/// Service identity values
pub mod service {
    /// Service name used in logs and the health endpoint
    pub const SERVICE_NAME: &str = "gymwatch";

    /// Service version from Cargo.toml
    pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
}
