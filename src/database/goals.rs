// ABOUTME: Goal and ban state machine - creation, progress, weekly sweep, 30-day bans
// ABOUTME: Enforces one active goal per user and the ban gate on goal creation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

//! Goal/ban state machine.
//!
//! States: active -> {completed, failed}; a failure issues a 30-day ban.
//! Transitions are evaluated by [`Database::sweep_expired_goals`], which the
//! server schedules around the Saturday 23:50 deadline and which is
//! idempotent (only goals past their `end_date` transition).

use chrono::{DateTime, Duration, Local, Utc};
use sqlx::Row;
use tracing::info;

use super::Database;
use crate::constants::limits;
use crate::errors::{AppError, AppResult};
use crate::models::{next_goal_deadline, Ban, Goal, GoalStatus};

fn goal_from_row(row: &sqlx::sqlite::SqliteRow) -> AppResult<Goal> {
    let status: String = row.try_get("status")?;
    Ok(Goal {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        user_name: row.try_get("user_name")?,
        target_visits: row.try_get("target_visits")?,
        current_visits: row.try_get("current_visits")?,
        created_at: row.try_get("created_at")?,
        end_date: row.try_get("end_date")?,
        status: GoalStatus::parse(&status)
            .ok_or_else(|| AppError::database(format!("unknown goal status '{status}'")))?,
    })
}

impl Database {
    /// Create the goals and bans tables
    pub(super) async fn migrate_goals(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS goals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                user_name TEXT NOT NULL,
                target_visits INTEGER NOT NULL,
                current_visits INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                end_date DATETIME NOT NULL,
                status TEXT NOT NULL DEFAULT 'active'
                    CHECK (status IN ('active', 'completed', 'failed'))
            )
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS bans (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                goal_id INTEGER NOT NULL REFERENCES goals(id),
                ban_date DATETIME NOT NULL,
                unban_date DATETIME NOT NULL
            )
            ",
        )
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Whether the user currently has an unexpired ban
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn is_banned(&self, user_id: i64) -> AppResult<bool> {
        Ok(self.current_ban(user_id).await?.is_some())
    }

    /// The user's unexpired ban, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn current_ban(&self, user_id: i64) -> AppResult<Option<Ban>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, goal_id, ban_date, unban_date
            FROM bans
            WHERE user_id = $1 AND unban_date > $2
            ORDER BY unban_date DESC
            LIMIT 1
            ",
        )
        .bind(user_id)
        .bind(Utc::now())
        .fetch_optional(self.pool())
        .await?;

        row.map(|r| {
            Ok(Ban {
                id: r.try_get("id")?,
                user_id: r.try_get("user_id")?,
                goal_id: r.try_get("goal_id")?,
                ban_date: r.try_get("ban_date")?,
                unban_date: r.try_get("unban_date")?,
            })
        })
        .transpose()
    }

    /// The user's active goal, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn active_goal(&self, user_id: i64) -> AppResult<Option<Goal>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, user_name, target_visits, current_visits,
                   created_at, end_date, status
            FROM goals
            WHERE user_id = $1 AND status = 'active'
            LIMIT 1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        row.as_ref().map(goal_from_row).transpose()
    }

    /// Create a new weekly goal ending next Saturday 23:50 local time
    ///
    /// # Errors
    ///
    /// Rejects targets outside 1..=5, banned users, and users who already
    /// have an active goal.
    pub async fn create_goal(
        &self,
        user_id: i64,
        user_name: &str,
        target_visits: i64,
    ) -> AppResult<Goal> {
        if !(limits::MIN_GOAL_TARGET..=limits::MAX_GOAL_TARGET).contains(&target_visits) {
            return Err(AppError::value_out_of_range(format!(
                "target must be between {} and {}, got {target_visits}",
                limits::MIN_GOAL_TARGET,
                limits::MAX_GOAL_TARGET
            )));
        }

        if let Some(ban) = self.current_ban(user_id).await? {
            return Err(AppError::invalid_input(format!(
                "user {user_id} is banned until {}",
                ban.unban_date.format("%Y-%m-%d")
            )));
        }

        if self.active_goal(user_id).await?.is_some() {
            return Err(AppError::already_exists(format!(
                "Active goal for user {user_id}"
            )));
        }

        let now_local = Local::now();
        let end_date = next_goal_deadline(&now_local).with_timezone(&Utc);
        let created_at = now_local.with_timezone(&Utc);

        let row = sqlx::query(
            r"
            INSERT INTO goals (user_id, user_name, target_visits, current_visits,
                               created_at, end_date, status)
            VALUES ($1, $2, $3, 0, $4, $5, 'active')
            RETURNING id, user_id, user_name, target_visits, current_visits,
                      created_at, end_date, status
            ",
        )
        .bind(user_id)
        .bind(user_name)
        .bind(target_visits)
        .bind(created_at)
        .bind(end_date)
        .fetch_one(self.pool())
        .await?;

        let goal = goal_from_row(&row)?;
        info!(
            user_id,
            target_visits,
            end_date = %goal.end_date,
            "created weekly goal"
        );
        Ok(goal)
    }

    /// Record one visit against the user's active goal
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the user has no active goal.
    pub async fn increment_visits(&self, user_id: i64) -> AppResult<Goal> {
        let goal = self
            .active_goal(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Active goal for user {user_id}")))?;

        sqlx::query("UPDATE goals SET current_visits = current_visits + 1 WHERE id = $1")
            .bind(goal.id)
            .execute(self.pool())
            .await?;

        self.active_goal(user_id)
            .await?
            .ok_or_else(|| AppError::database("goal disappeared during increment"))
    }

    /// Transition every active goal past its deadline: completed when the
    /// target was met, otherwise failed plus a 30-day ban. Returns the
    /// failed goals so the front-end can notify their owners.
    ///
    /// # Errors
    ///
    /// Returns an error if any query fails.
    pub async fn sweep_expired_goals(&self, now: DateTime<Utc>) -> AppResult<Vec<Goal>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, user_name, target_visits, current_visits,
                   created_at, end_date, status
            FROM goals
            WHERE status = 'active' AND end_date < $1
            ",
        )
        .bind(now)
        .fetch_all(self.pool())
        .await?;

        let mut failed = Vec::new();
        for row in &rows {
            let mut goal = goal_from_row(row)?;
            if goal.is_met() {
                sqlx::query("UPDATE goals SET status = 'completed' WHERE id = $1")
                    .bind(goal.id)
                    .execute(self.pool())
                    .await?;
                info!(user_id = goal.user_id, goal_id = goal.id, "goal completed");
            } else {
                // The status flip and the ban must land together: a failed
                // goal without a ban row would never be revisited by the
                // sweep, leaving the user unbanned
                let unban_date = now + Duration::days(limits::BAN_DURATION_DAYS);
                let mut tx = self.pool().begin().await?;
                sqlx::query("UPDATE goals SET status = 'failed' WHERE id = $1")
                    .bind(goal.id)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query(
                    r"
                    INSERT INTO bans (user_id, goal_id, ban_date, unban_date)
                    VALUES ($1, $2, $3, $4)
                    ",
                )
                .bind(goal.user_id)
                .bind(goal.id)
                .bind(now)
                .bind(unban_date)
                .execute(&mut *tx)
                .await?;
                tx.commit().await?;

                info!(
                    user_id = goal.user_id,
                    goal_id = goal.id,
                    %unban_date,
                    "goal failed, ban issued"
                );
                goal.status = GoalStatus::Failed;
                failed.push(goal);
            }
        }

        Ok(failed)
    }
}
