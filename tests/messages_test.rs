// ABOUTME: Integration tests for the chat message log
// ABOUTME: Covers the 72-hour history window, the character budget, and pruning
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors
#![allow(clippy::unwrap_used)]

mod common;

use chrono::{Duration, Utc};
use gymwatch::models::MessageRole;

#[tokio::test]
async fn history_is_chronological_and_per_user() {
    let db = common::create_test_database().await;
    let now = Utc::now();

    common::insert_message_at(&db, 1, "user", "first", now - Duration::hours(3)).await;
    common::insert_message_at(&db, 1, "assistant", "second", now - Duration::hours(2)).await;
    common::insert_message_at(&db, 1, "user", "third", now - Duration::hours(1)).await;
    common::insert_message_at(&db, 2, "user", "other user", now - Duration::hours(1)).await;

    let history = db.recent_history(1).await.unwrap();
    let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["first", "second", "third"]);
    assert_eq!(history[0].role, MessageRole::User);
    assert_eq!(history[1].role, MessageRole::Assistant);
}

#[tokio::test]
async fn history_excludes_messages_older_than_72_hours() {
    let db = common::create_test_database().await;
    let now = Utc::now();

    common::insert_message_at(&db, 1, "user", "stale", now - Duration::hours(73)).await;
    common::insert_message_at(&db, 1, "user", "fresh", now - Duration::hours(71)).await;

    let history = db.recent_history(1).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "fresh");
}

#[tokio::test]
async fn history_budget_keeps_the_newest_messages() {
    let db = common::create_test_database().await;
    let now = Utc::now();

    // Oldest message no longer fits once the newer ones have consumed the
    // 8000-character budget
    let big_old = "x".repeat(5000);
    let big_new = "y".repeat(4000);
    common::insert_message_at(&db, 1, "user", &big_old, now - Duration::hours(2)).await;
    common::insert_message_at(&db, 1, "assistant", &big_new, now - Duration::hours(1)).await;

    let history = db.recent_history(1).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, big_new);
}

#[tokio::test]
async fn append_then_read_round_trips() {
    let db = common::create_test_database().await;

    db.append_message(1, MessageRole::User, "hello").await.unwrap();
    db.append_message(1, MessageRole::Assistant, "hey bro 💪")
        .await
        .unwrap();

    let history = db.recent_history(1).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].content, "hey bro 💪");
    assert_eq!(history[1].role, MessageRole::Assistant);
}

#[tokio::test]
async fn prune_removes_expired_messages_only() {
    let db = common::create_test_database().await;
    let now = Utc::now();

    common::insert_message_at(&db, 1, "user", "stale", now - Duration::hours(80)).await;
    common::insert_message_at(&db, 2, "user", "stale too", now - Duration::hours(75)).await;
    common::insert_message_at(&db, 1, "user", "fresh", now - Duration::hours(10)).await;

    let pruned = db.prune_messages(now).await.unwrap();
    assert_eq!(pruned, 2);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(remaining, 1);
}
