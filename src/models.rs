// ABOUTME: Core domain models for occupancy readings, goals, bans, and chat messages
// ABOUTME: Shared data structures used across the collector, database, stats, and bot layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

//! # Domain Models
//!
//! Plain data structures shared across the system. All persistence-facing
//! types serialize with serde; timestamps are `chrono` values stored as UTC
//! and rendered in local time only at the presentation edge.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveTime, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::constants::limits;

/// One membership-count sample for a club at a point in time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reading {
    /// Club the sample belongs to
    pub club_name: String,
    /// Number of members in the club when sampled
    pub member_count: i64,
    /// When the sample was collected
    pub recorded_at: DateTime<Utc>,
}

impl Reading {
    /// Whether the member count is inside the acceptable range.
    /// Out-of-range readings are rejected rather than persisted.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (0..=limits::MAX_MEMBER_COUNT).contains(&self.member_count)
    }
}

/// Normalized occupancy entry for a single club, as reported by the portal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubOccupancy {
    /// Club display name
    pub club_name: String,
    /// Club street address, when the portal provides one
    pub club_address: Option<String>,
    /// Members currently in the club
    pub member_count: i64,
}

/// A full portal response: normalized entries plus the raw payload retained
/// for the audit log
#[derive(Debug, Clone)]
pub struct OccupancySnapshot {
    /// Normalized per-club occupancy entries
    pub clubs: Vec<ClubOccupancy>,
    /// Opaque raw response body, persisted verbatim for audit/backup
    pub raw: serde_json::Value,
    /// When the snapshot was fetched
    pub fetched_at: DateTime<Utc>,
}

/// Lifecycle state of a weekly goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    /// Goal is still running
    Active,
    /// Goal reached its target by the deadline
    Completed,
    /// Goal missed its target; a ban was issued
    Failed,
}

impl GoalStatus {
    /// Database string form
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse the database string form
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A user's weekly visit-count commitment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    /// Row id
    pub id: i64,
    /// Chat user id owning the goal
    pub user_id: i64,
    /// Display name captured at creation time
    pub user_name: String,
    /// Committed number of visits (1..=5)
    pub target_visits: i64,
    /// Visits recorded so far
    pub current_visits: i64,
    /// When the goal was created
    pub created_at: DateTime<Utc>,
    /// Deadline: next Saturday 23:50 local time
    pub end_date: DateTime<Utc>,
    /// Lifecycle state
    pub status: GoalStatus,
}

impl Goal {
    /// Whether the recorded visits satisfy the target
    #[must_use]
    pub fn is_met(&self) -> bool {
        self.current_visits >= self.target_visits
    }
}

/// A 30-day access restriction imposed after goal failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ban {
    /// Row id
    pub id: i64,
    /// Banned chat user id
    pub user_id: i64,
    /// The failed goal that triggered the ban
    pub goal_id: i64,
    /// When the ban was issued
    pub ban_date: DateTime<Utc>,
    /// When the ban expires (`ban_date` + 30 days)
    pub unban_date: DateTime<Utc>,
}

/// Author of a stored chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message written by the user
    User,
    /// Message produced by the assistant
    Assistant,
}

impl MessageRole {
    /// Database string form
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Parse the database string form
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// One stored chat message, used as LLM conversation context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Chat user the conversation belongs to
    pub user_id: i64,
    /// Author role
    pub role: MessageRole,
    /// Message text
    pub content: String,
    /// When the message was stored
    pub created_at: DateTime<Utc>,
}

/// Compute the goal deadline for a goal created at `now`: the next Saturday
/// at 23:50 in `now`'s timezone, at most 7 days out. A goal created on a
/// Saturday at or after 23:50 rolls to the following Saturday.
pub fn next_goal_deadline<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let cutoff = NaiveTime::from_hms_opt(23, 50, 0).unwrap_or_default();
    let target = Weekday::Sat.num_days_from_monday();
    let mut days_ahead = i64::from((target + 7 - now.weekday().num_days_from_monday()) % 7);
    if days_ahead == 0 && now.time() >= cutoff {
        days_ahead = 7;
    }
    let deadline_date = now.date_naive() + Duration::days(days_ahead);
    match now
        .timezone()
        .from_local_datetime(&deadline_date.and_time(cutoff))
    {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
        // DST gap at 23:50 cannot occur for real offsets; keep the wall-clock
        // day anyway
        LocalResult::None => now.clone() + Duration::days(days_ahead),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn deadline_is_saturday_2350_within_seven_days() {
        // Walk a full week of creation times
        for day in 1..=7 {
            let now = utc(2025, 6, day, 12, 0); // 2025-06-01 is a Sunday
            let deadline = next_goal_deadline(&now);
            assert_eq!(deadline.weekday(), Weekday::Sat);
            assert_eq!(deadline.hour(), 23);
            assert_eq!(deadline.minute(), 50);
            let delta = deadline - now;
            assert!(delta > Duration::zero());
            assert!(delta <= Duration::days(7));
        }
    }

    #[test]
    fn saturday_before_cutoff_stays_same_day() {
        // 2025-06-07 is a Saturday
        let now = utc(2025, 6, 7, 10, 0);
        let deadline = next_goal_deadline(&now);
        assert_eq!(deadline, utc(2025, 6, 7, 23, 50));
    }

    #[test]
    fn saturday_after_cutoff_rolls_to_next_week() {
        let now = utc(2025, 6, 7, 23, 55);
        let deadline = next_goal_deadline(&now);
        assert_eq!(deadline, utc(2025, 6, 14, 23, 50));
    }

    #[test]
    fn reading_validity_bounds() {
        let mut reading = Reading {
            club_name: "Ferio Gaj".into(),
            member_count: 0,
            recorded_at: Utc::now(),
        };
        assert!(reading.is_valid());
        reading.member_count = limits::MAX_MEMBER_COUNT;
        assert!(reading.is_valid());
        reading.member_count = limits::MAX_MEMBER_COUNT + 1;
        assert!(!reading.is_valid());
        reading.member_count = -1;
        assert!(!reading.is_valid());
    }

    #[test]
    fn status_round_trips_through_db_form() {
        for status in [GoalStatus::Active, GoalStatus::Completed, GoalStatus::Failed] {
            assert_eq!(GoalStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(GoalStatus::parse("banned"), None);
    }
}
