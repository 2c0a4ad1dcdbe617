// ABOUTME: Main library entry point for the gymwatch club-occupancy tracker
// ABOUTME: Exposes the collector, storage, stats, LLM, and bot command layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

#![deny(unsafe_code)]

//! # Gymwatch
//!
//! Polls a fitness-club membership portal on a timer, persists occupancy
//! readings, and backs a chat bot with weekly goal tracking, 30-day bans for
//! failed goals, and LLM-generated motivational replies.
//!
//! ## Architecture
//!
//! - **portal**: session-authenticated client for the membership portal,
//!   behind a provider trait with a synthetic implementation for tests
//! - **collector**: timer loop with exponential-backoff retry and range
//!   validation
//! - **sink / retention**: durable readings plus a rotated raw-payload audit
//!   log with a dated-backup retention window
//! - **database**: `SQLite`-backed readings, goal/ban state machine, and chat
//!   message log
//! - **stats**: fixed-bucket resampling and summary aggregates
//! - **bot**: platform-independent command handlers an external chat adapter
//!   drives
//! - **llm**: Gemini-backed motivational reply generation

/// Platform-independent chat command parsing and handling
pub mod bot;

/// Timer-driven collection loop with retry and validation
pub mod collector;

/// Environment-based configuration management
pub mod config;

/// Application constants and limit values
pub mod constants;

/// `SQLite` database management for all durable state
pub mod database;

/// Unified error handling with standard error codes
pub mod errors;

/// Health check endpoint
pub mod health;

/// LLM provider abstraction and the Gemini implementation
pub mod llm;

/// Structured logging configuration
pub mod logging;

/// Core domain models
pub mod models;

/// Membership portal client and provider seam
pub mod portal;

/// Daily backup rotation and pruning
pub mod retention;

/// Durable sink for readings and raw payloads
pub mod sink;

/// Resampling and summary aggregates over stored readings
pub mod stats;
