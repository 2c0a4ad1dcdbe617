// ABOUTME: Integration tests for the goal/ban state machine
// ABOUTME: Covers deadline computation, creation guards, the weekly sweep, and 30-day bans
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors
#![allow(clippy::unwrap_used)]

mod common;

use chrono::{Datelike, Duration, Local, Timelike, Utc, Weekday};
use gymwatch::errors::ErrorCode;
use gymwatch::models::GoalStatus;

#[tokio::test]
async fn created_goal_ends_next_saturday_at_2350_local() {
    let db = common::create_test_database().await;

    let goal = db.create_goal(1, "Alice", 3).await.unwrap();

    let end_local = goal.end_date.with_timezone(&Local);
    assert_eq!(end_local.weekday(), Weekday::Sat);
    assert_eq!(end_local.hour(), 23);
    assert_eq!(end_local.minute(), 50);

    let until_deadline = goal.end_date - Utc::now();
    assert!(until_deadline > Duration::zero());
    assert!(until_deadline <= Duration::days(7));
}

#[tokio::test]
async fn target_outside_one_to_five_is_rejected() {
    let db = common::create_test_database().await;

    for target in [0, 6, -1, 100] {
        let err = db.create_goal(1, "Alice", target).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange, "target {target}");
    }

    for target in [1, 5] {
        let db = common::create_test_database().await;
        assert!(db.create_goal(1, "Alice", target).await.is_ok());
    }
}

#[tokio::test]
async fn second_active_goal_is_rejected() {
    let db = common::create_test_database().await;

    db.create_goal(1, "Alice", 3).await.unwrap();
    let err = db.create_goal(1, "Alice", 2).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);

    // A different user is unaffected
    assert!(db.create_goal(2, "Bob", 2).await.is_ok());
}

#[tokio::test]
async fn increment_counts_visits_against_the_active_goal() {
    let db = common::create_test_database().await;

    db.create_goal(1, "Alice", 3).await.unwrap();
    let goal = db.increment_visits(1).await.unwrap();
    assert_eq!(goal.current_visits, 1);
    let goal = db.increment_visits(1).await.unwrap();
    assert_eq!(goal.current_visits, 2);
    assert!(!goal.is_met());
    let goal = db.increment_visits(1).await.unwrap();
    assert!(goal.is_met());
}

#[tokio::test]
async fn increment_without_active_goal_is_not_found() {
    let db = common::create_test_database().await;

    let err = db.increment_visits(42).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn sweep_completes_met_goals_without_banning() {
    let db = common::create_test_database().await;
    let now = Utc::now();

    let goal_id = common::insert_goal_at(&db, 1, 3, 3, now - Duration::minutes(5)).await;

    let failed = db.sweep_expired_goals(now).await.unwrap();
    assert!(failed.is_empty());
    assert!(db.active_goal(1).await.unwrap().is_none());
    assert!(!db.is_banned(1).await.unwrap());

    let status: String = sqlx::query_scalar("SELECT status FROM goals WHERE id = $1")
        .bind(goal_id)
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(status, "completed");
}

#[tokio::test]
async fn sweep_fails_unmet_goals_and_issues_a_30_day_ban() {
    let db = common::create_test_database().await;
    let now = Utc::now();

    common::insert_goal_at(&db, 1, 3, 1, now - Duration::minutes(5)).await;

    let failed = db.sweep_expired_goals(now).await.unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].user_id, 1);
    assert_eq!(failed[0].status, GoalStatus::Failed);

    let ban = db.current_ban(1).await.unwrap().unwrap();
    assert_eq!(ban.unban_date - ban.ban_date, Duration::days(30));
    assert!(db.is_banned(1).await.unwrap());
}

#[tokio::test]
async fn sweep_is_idempotent_and_skips_unexpired_goals() {
    let db = common::create_test_database().await;
    let now = Utc::now();

    common::insert_goal_at(&db, 1, 3, 0, now - Duration::minutes(5)).await;
    common::insert_goal_at(&db, 2, 3, 0, now + Duration::days(3)).await;

    let failed = db.sweep_expired_goals(now).await.unwrap();
    assert_eq!(failed.len(), 1);

    // Second pass finds nothing new and issues no second ban
    let failed = db.sweep_expired_goals(now).await.unwrap();
    assert!(failed.is_empty());
    let ban_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bans WHERE user_id = 1")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(ban_count, 1);

    // The unexpired goal is still active
    assert!(db.active_goal(2).await.unwrap().is_some());
}

#[tokio::test]
async fn failed_sweep_write_leaves_the_goal_active_for_retry() {
    let db = common::create_test_database().await;
    let now = Utc::now();

    common::insert_goal_at(&db, 1, 3, 0, now - Duration::minutes(5)).await;

    // Force the ban insert to fail mid-sweep; the status flip must roll
    // back with it so the next sweep picks the goal up again
    sqlx::query("DROP TABLE bans")
        .execute(db.pool())
        .await
        .unwrap();
    assert!(db.sweep_expired_goals(now).await.is_err());
    assert!(db.active_goal(1).await.unwrap().is_some());

    db.migrate().await.unwrap();
    let failed = db.sweep_expired_goals(now).await.unwrap();
    assert_eq!(failed.len(), 1);
    assert!(db.is_banned(1).await.unwrap());
}

#[tokio::test]
async fn banned_user_cannot_create_a_goal() {
    let db = common::create_test_database().await;
    let now = Utc::now();

    common::insert_goal_at(&db, 1, 3, 0, now - Duration::minutes(5)).await;
    db.sweep_expired_goals(now).await.unwrap();

    let err = db.create_goal(1, "Alice", 2).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
    assert!(err.message.contains("banned"));
}
