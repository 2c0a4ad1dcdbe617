// ABOUTME: Daily retention sweeper - rotates the raw audit log into dated backups
// ABOUTME: Deletes backup artifacts older than the retention window, matched by filename date
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

//! # Retention Sweeper
//!
//! Once per day the sweeper copies the accumulating raw-response log into a
//! `backup_YYYYMMDD.jsonl` artifact, truncates the live log, and deletes
//! artifacts older than the configured day count. Artifacts are matched by
//! filename date only; files that don't parse are left untouched.

use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDate};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::errors::AppResult;

const BACKUP_PREFIX: &str = "backup_";
const BACKUP_SUFFIX: &str = ".jsonl";
const SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Daily backup-rotation and pruning task
pub struct RetentionSweeper {
    audit_log_path: PathBuf,
    backup_dir: PathBuf,
    retention_days: i64,
}

impl RetentionSweeper {
    /// Create a sweeper over the given audit log and backup directory
    #[must_use]
    pub fn new(
        audit_log_path: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
        retention_days: i64,
    ) -> Self {
        Self {
            audit_log_path: audit_log_path.into(),
            backup_dir: backup_dir.into(),
            retention_days,
        }
    }

    /// Run the daily sweep loop forever
    pub async fn run(&self) {
        let mut ticker = interval(SWEEP_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately, which also catches up after a
        // restart.
        info!(
            retention_days = self.retention_days,
            backup_dir = %self.backup_dir.display(),
            "retention sweeper started"
        );

        loop {
            ticker.tick().await;
            if let Err(err) = self.sweep_once(Local::now()).await {
                error!(%err, "retention sweep failed");
            }
        }
    }

    /// Rotate the live log and prune old backups
    ///
    /// # Errors
    ///
    /// Returns an error if filesystem operations fail.
    pub async fn sweep_once(&self, now: DateTime<Local>) -> AppResult<()> {
        self.rotate(now).await?;
        self.prune_backups(now).await?;
        Ok(())
    }

    /// Copy the live audit log into today's dated backup and truncate it.
    /// A missing or empty live log is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if filesystem operations fail.
    pub async fn rotate(&self, now: DateTime<Local>) -> AppResult<()> {
        let contents = match tokio::fs::read(&self.audit_log_path).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => return Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        tokio::fs::create_dir_all(&self.backup_dir).await?;
        let backup_name = format!(
            "{BACKUP_PREFIX}{}{BACKUP_SUFFIX}",
            now.format("%Y%m%d")
        );
        let backup_path = self.backup_dir.join(&backup_name);

        // Append rather than replace so a second rotation on the same day
        // keeps earlier entries.
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&backup_path)
            .await?;
        file.write_all(&contents).await?;
        file.flush().await?;

        tokio::fs::write(&self.audit_log_path, b"").await?;
        info!(backup = %backup_path.display(), bytes = contents.len(), "rotated audit log");
        Ok(())
    }

    /// Delete backup artifacts whose filename date falls outside the
    /// retention window. Never touches artifacts newer than the window or
    /// files with unparseable names.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory listing or a delete fails.
    pub async fn prune_backups(&self, now: DateTime<Local>) -> AppResult<u32> {
        let cutoff = now.date_naive() - ChronoDuration::days(self.retention_days);

        let mut entries = match tokio::fs::read_dir(&self.backup_dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };

        let mut deleted = 0;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some(date) = parse_backup_date(name) else {
                continue;
            };
            if date < cutoff {
                tokio::fs::remove_file(entry.path()).await?;
                warn!(file = name, "deleted expired backup artifact");
                deleted += 1;
            }
        }

        Ok(deleted)
    }
}

/// Extract the date from a `backup_YYYYMMDD.jsonl` filename
fn parse_backup_date(file_name: &str) -> Option<NaiveDate> {
    let stem = file_name
        .strip_prefix(BACKUP_PREFIX)?
        .strip_suffix(BACKUP_SUFFIX)?;
    NaiveDate::parse_from_str(stem, "%Y%m%d").ok()
}
