// ABOUTME: Chat message log backing LLM conversation context
// ABOUTME: Applies the 72-hour age limit and 8000-character budget when reading history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

use chrono::{DateTime, Duration, Utc};
use sqlx::Row;

use super::Database;
use crate::constants::limits;
use crate::errors::{AppError, AppResult};
use crate::models::{MessageRole, StoredMessage};

impl Database {
    /// Create the messages table
    pub(super) async fn migrate_messages(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
                content TEXT NOT NULL,
                created_at DATETIME NOT NULL
            )
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_messages_user_time
            ON messages (user_id, created_at)
            ",
        )
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Append one message to a user's conversation log
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn append_message(
        &self,
        user_id: i64,
        role: MessageRole,
        content: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO messages (user_id, role, content, created_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(user_id)
        .bind(role.as_str())
        .bind(content)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Recent conversation history for a user, in chronological order.
    ///
    /// Only messages newer than 72 hours are considered, and messages are
    /// accumulated newest-first until the running 8000-character budget is
    /// exhausted, so the most recent exchange always survives pruning.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn recent_history(&self, user_id: i64) -> AppResult<Vec<StoredMessage>> {
        let cutoff = Utc::now() - Duration::hours(limits::MESSAGE_MAX_AGE_HOURS);
        let rows = sqlx::query(
            r"
            SELECT user_id, role, content, created_at
            FROM messages
            WHERE user_id = $1 AND created_at > $2
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .bind(cutoff)
        .fetch_all(self.pool())
        .await?;

        let mut budget = limits::MESSAGE_CHAR_BUDGET;
        let mut history = Vec::new();
        for row in &rows {
            let role: String = row.try_get("role")?;
            let message = StoredMessage {
                user_id: row.try_get("user_id")?,
                role: MessageRole::parse(&role)
                    .ok_or_else(|| AppError::database(format!("unknown message role '{role}'")))?,
                content: row.try_get("content")?,
                created_at: row.try_get("created_at")?,
            };
            let chars = message.content.chars().count();
            if chars > budget {
                break;
            }
            budget -= chars;
            history.push(message);
        }

        history.reverse();
        Ok(history)
    }

    /// Delete messages older than the retention window (72 hours before
    /// `now`). Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn prune_messages(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let cutoff = now - Duration::hours(limits::MESSAGE_MAX_AGE_HOURS);
        let result = sqlx::query("DELETE FROM messages WHERE created_at <= $1")
            .bind(cutoff)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }
}
