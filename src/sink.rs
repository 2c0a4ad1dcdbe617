// ABOUTME: Durable sink for normalized readings and raw portal payloads
// ABOUTME: Appends readings to the database and raw responses to a JSONL audit log
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

//! # Sink
//!
//! Two write paths per collection cycle: normalized readings go to the
//! append-only `readings` table; the raw portal payload is appended verbatim
//! to a JSON-lines audit log, which the retention sweeper rotates into dated
//! backups.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::database::Database;
use crate::errors::AppResult;
use crate::models::Reading;

/// One line of the raw-response audit log
#[derive(Debug, Serialize)]
struct AuditEntry<'a> {
    timestamp: DateTime<Utc>,
    response: &'a serde_json::Value,
}

/// Durable storage sink for the collector
pub struct Sink {
    database: Database,
    audit_log_path: PathBuf,
}

impl Sink {
    /// Create a sink writing to the given database and audit log path
    #[must_use]
    pub fn new(database: Database, audit_log_path: impl Into<PathBuf>) -> Self {
        Self {
            database,
            audit_log_path: audit_log_path.into(),
        }
    }

    /// Path of the live audit log
    #[must_use]
    pub fn audit_log_path(&self) -> &Path {
        &self.audit_log_path
    }

    /// Persist one collection cycle: all validated readings plus the raw
    /// payload for audit
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert or the audit append fails.
    pub async fn persist(
        &self,
        readings: &[Reading],
        raw: &serde_json::Value,
        fetched_at: DateTime<Utc>,
    ) -> AppResult<()> {
        for reading in readings {
            self.database.insert_reading(reading).await?;
        }
        self.append_audit(raw, fetched_at).await?;
        debug!(readings = readings.len(), "persisted collection cycle");
        Ok(())
    }

    /// Append the raw payload as one JSON line
    async fn append_audit(
        &self,
        raw: &serde_json::Value,
        fetched_at: DateTime<Utc>,
    ) -> AppResult<()> {
        if let Some(parent) = self.audit_log_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let entry = AuditEntry {
            timestamp: fetched_at,
            response: raw,
        };
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
