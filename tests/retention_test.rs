// ABOUTME: Integration tests for the retention sweeper against a temp directory
// ABOUTME: Covers audit-log rotation, same-day append, and backup pruning by filename date
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors
#![allow(clippy::unwrap_used)]

mod common;

use chrono::{Duration, Local};
use gymwatch::retention::RetentionSweeper;
use std::path::Path;

fn sweeper(dir: &Path, retention_days: i64) -> RetentionSweeper {
    RetentionSweeper::new(
        dir.join("raw_responses.jsonl"),
        dir.join("backups"),
        retention_days,
    )
}

fn backup_name(offset_days: i64) -> String {
    let date = Local::now().date_naive() - Duration::days(offset_days);
    format!("backup_{}.jsonl", date.format("%Y%m%d"))
}

#[tokio::test]
async fn rotate_moves_live_log_into_dated_backup() {
    common::init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let live = dir.path().join("raw_responses.jsonl");
    std::fs::write(&live, "{\"a\":1}\n").unwrap();

    let now = Local::now();
    sweeper(dir.path(), 30).rotate(now).await.unwrap();

    let backup = dir
        .path()
        .join("backups")
        .join(format!("backup_{}.jsonl", now.format("%Y%m%d")));
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), "{\"a\":1}\n");
    assert_eq!(std::fs::read_to_string(&live).unwrap(), "");
}

#[tokio::test]
async fn second_rotation_on_the_same_day_appends() {
    common::init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let live = dir.path().join("raw_responses.jsonl");
    let sweeper = sweeper(dir.path(), 30);
    let now = Local::now();

    std::fs::write(&live, "{\"a\":1}\n").unwrap();
    sweeper.rotate(now).await.unwrap();
    std::fs::write(&live, "{\"b\":2}\n").unwrap();
    sweeper.rotate(now).await.unwrap();

    let backup = dir
        .path()
        .join("backups")
        .join(format!("backup_{}.jsonl", now.format("%Y%m%d")));
    assert_eq!(
        std::fs::read_to_string(&backup).unwrap(),
        "{\"a\":1}\n{\"b\":2}\n"
    );
}

#[tokio::test]
async fn rotating_a_missing_or_empty_log_is_a_noop() {
    common::init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let sweeper = sweeper(dir.path(), 30);
    let now = Local::now();

    sweeper.rotate(now).await.unwrap();
    assert!(!dir.path().join("backups").exists());

    std::fs::write(dir.path().join("raw_responses.jsonl"), "").unwrap();
    sweeper.rotate(now).await.unwrap();
    assert!(!dir.path().join("backups").exists());
}

#[tokio::test]
async fn prune_deletes_only_backups_older_than_the_window() {
    common::init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let backups = dir.path().join("backups");
    std::fs::create_dir_all(&backups).unwrap();

    let fresh = backup_name(0);
    let edge = backup_name(30);
    let stale = backup_name(31);
    let ancient = backup_name(90);
    for name in [&fresh, &edge, &stale, &ancient] {
        std::fs::write(backups.join(name), "x\n").unwrap();
    }
    // Foreign files are never touched, whatever their age
    std::fs::write(backups.join("notes.txt"), "keep me\n").unwrap();
    std::fs::write(backups.join("backup_latest.jsonl"), "keep me\n").unwrap();

    let deleted = sweeper(dir.path(), 30)
        .prune_backups(Local::now())
        .await
        .unwrap();

    assert_eq!(deleted, 2);
    assert!(backups.join(&fresh).exists());
    assert!(backups.join(&edge).exists());
    assert!(!backups.join(&stale).exists());
    assert!(!backups.join(&ancient).exists());
    assert!(backups.join("notes.txt").exists());
    assert!(backups.join("backup_latest.jsonl").exists());
}

#[tokio::test]
async fn prune_with_no_backup_directory_is_a_noop() {
    common::init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let deleted = sweeper(dir.path(), 30)
        .prune_backups(Local::now())
        .await
        .unwrap();
    assert_eq!(deleted, 0);
}

#[tokio::test]
async fn sweep_once_rotates_and_prunes_together() {
    common::init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let backups = dir.path().join("backups");
    std::fs::create_dir_all(&backups).unwrap();
    std::fs::write(backups.join(backup_name(45)), "old\n").unwrap();
    std::fs::write(dir.path().join("raw_responses.jsonl"), "{\"a\":1}\n").unwrap();

    let now = Local::now();
    sweeper(dir.path(), 30).sweep_once(now).await.unwrap();

    assert!(!backups.join(backup_name(45)).exists());
    assert!(backups
        .join(format!("backup_{}.jsonl", now.format("%Y%m%d")))
        .exists());
}
