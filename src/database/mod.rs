// ABOUTME: SQLite database management for readings, goals, bans, and chat messages
// ABOUTME: Owns the connection pool and runs per-area schema migrations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

//! # Database Management
//!
//! All cross-cycle state lives here: occupancy readings appended by the
//! collector, the goal/ban state machine mutated by the bot and the weekly
//! sweep, and the chat message log backing LLM context. Operations are split
//! into one submodule per area, each adding methods onto [`Database`].

mod goals;
mod messages;
mod readings;

use sqlx::SqlitePool;

use crate::errors::AppResult;

/// Database handle for all durable state
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if necessary) the database and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") && !database_url.contains('?')
        {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options).await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get a reference to the pool for advanced operations
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run all schema migrations
    ///
    /// # Errors
    ///
    /// Returns an error if table creation fails.
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_readings().await?;
        self.migrate_goals().await?;
        self.migrate_messages().await?;
        Ok(())
    }

    /// Lightweight connectivity probe used by the health endpoint
    ///
    /// # Errors
    ///
    /// Returns an error when the pool cannot serve a query.
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
