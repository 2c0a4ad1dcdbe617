// ABOUTME: Shared test utilities for gymwatch integration tests
// ABOUTME: Provides in-memory database setup, quiet logging, and raw row insertion helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors
#![allow(dead_code, clippy::missing_panics_doc)]

//! Shared test setup for gymwatch integration tests

use chrono::{DateTime, Utc};
use gymwatch::database::Database;
use gymwatch::models::Reading;
use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Standard in-memory test database
pub async fn create_test_database() -> Database {
    init_test_logging();
    Database::new("sqlite::memory:")
        .await
        .unwrap_or_else(|err| panic!("failed to open test database: {err}"))
}

/// Insert a reading with an explicit timestamp
pub async fn insert_reading_at(
    db: &Database,
    club_name: &str,
    member_count: i64,
    recorded_at: DateTime<Utc>,
) {
    db.insert_reading(&Reading {
        club_name: club_name.to_owned(),
        member_count,
        recorded_at,
    })
    .await
    .unwrap_or_else(|err| panic!("failed to insert reading: {err}"));
}

/// Insert an active goal row with an explicit deadline, bypassing the
/// create-time deadline computation so sweep transitions can be exercised
pub async fn insert_goal_at(
    db: &Database,
    user_id: i64,
    target_visits: i64,
    current_visits: i64,
    end_date: DateTime<Utc>,
) -> i64 {
    let result = sqlx::query(
        r"
        INSERT INTO goals (user_id, user_name, target_visits, current_visits,
                           created_at, end_date, status)
        VALUES ($1, 'Test User', $2, $3, $4, $5, 'active')
        ",
    )
    .bind(user_id)
    .bind(target_visits)
    .bind(current_visits)
    .bind(Utc::now())
    .bind(end_date)
    .execute(db.pool())
    .await
    .unwrap_or_else(|err| panic!("failed to insert goal: {err}"));
    result.last_insert_rowid()
}

/// Insert a chat message with an explicit timestamp
pub async fn insert_message_at(
    db: &Database,
    user_id: i64,
    role: &str,
    content: &str,
    created_at: DateTime<Utc>,
) {
    sqlx::query(
        r"
        INSERT INTO messages (user_id, role, content, created_at)
        VALUES ($1, $2, $3, $4)
        ",
    )
    .bind(user_id)
    .bind(role)
    .bind(content)
    .bind(created_at)
    .execute(db.pool())
    .await
    .unwrap_or_else(|err| panic!("failed to insert message: {err}"));
}
