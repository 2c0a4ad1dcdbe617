// ABOUTME: Platform-independent chat command layer - parsing, ban gating, and reply rendering
// ABOUTME: Dispatches reads to the stats reader and writes to the goal store, relaying LLM text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

//! # Bot Front-End Command Layer
//!
//! The chat-platform SDK itself lives outside this repository; an adapter
//! feeds incoming messages to [`BotHandler::handle`] and delivers the
//! returned reply. Every handler runs to completion independently, is gated
//! on the user's ban state, and degrades to an apology instead of erroring
//! (freeform messages from banned users are dropped silently).

use chrono::{Local, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::database::Database;
use crate::errors::{AppResult, ErrorCode};
use crate::llm::{prompts, ChatMessage, ChatRequest, LlmProvider};
use crate::models::{Goal, MessageRole};
use crate::stats::StatsReader;

/// Sampling temperature for persona replies; high on purpose, the bro
/// should ramble
const REPLY_TEMPERATURE: f32 = 1.5;

/// A parsed incoming chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start`
    Start,
    /// `/help`
    Help,
    /// `/status [days]`
    Status {
        /// Optional day window for the maximum; default is the 24h/7d summary
        days: Option<i64>,
    },
    /// `/goal [n]`
    Goal {
        /// Parsed target argument
        target: GoalTarget,
    },
    /// `/checkgoal`
    CheckGoal,
    /// `/latestdata`
    LatestData,
    /// Any unrecognized slash command
    Unknown,
    /// Freeform text relayed through the LLM
    Message(String),
}

/// Argument state of a `/goal` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalTarget {
    /// `/goal` with no argument
    Unspecified,
    /// `/goal <n>` with a numeric argument
    Visits(i64),
    /// `/goal <text>` with a non-numeric argument
    Invalid,
}

impl Command {
    /// Parse raw message text into a command. Parsing is total: malformed
    /// arguments degrade rather than fail.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if !trimmed.starts_with('/') {
            return Self::Message(trimmed.to_owned());
        }

        let mut parts = trimmed.split_whitespace();
        let command = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next();

        match command.as_str() {
            "/start" => Self::Start,
            "/help" => Self::Help,
            "/status" => Self::Status {
                days: arg.and_then(|a| a.parse().ok()).filter(|d| *d > 0),
            },
            "/goal" => Self::Goal {
                target: match arg {
                    None => GoalTarget::Unspecified,
                    Some(a) => a.parse().map_or(GoalTarget::Invalid, GoalTarget::Visits),
                },
            },
            "/checkgoal" => Self::CheckGoal,
            "/latestdata" => Self::LatestData,
            _ => Self::Unknown,
        }
    }
}

/// Stateless chat request handlers over the database, stats reader, and LLM
pub struct BotHandler {
    database: Database,
    stats: StatsReader,
    llm: Option<Arc<dyn LlmProvider>>,
    club_name: String,
}

impl BotHandler {
    /// Create a handler; `llm` being `None` disables freeform replies
    /// beyond the canned fallback
    #[must_use]
    pub fn new(
        database: Database,
        stats: StatsReader,
        llm: Option<Arc<dyn LlmProvider>>,
        club_name: impl Into<String>,
    ) -> Self {
        Self {
            database,
            stats,
            llm,
            club_name: club_name.into(),
        }
    }

    /// Handle one incoming message. Returns `None` when no reply should be
    /// sent (banned users' freeform messages are ignored silently).
    pub async fn handle(&self, user_id: i64, user_name: &str, text: &str) -> Option<String> {
        let command = Command::parse(text);

        match self.database.current_ban(user_id).await {
            Ok(Some(ban)) => {
                if matches!(command, Command::Message(_)) {
                    return None;
                }
                return Some(format!(
                    "You're currently banned for failing your gym goal. 😔\n\
                     You'll be unbanned on {}.\n\
                     Come back when you're ready to commit! 💀",
                    ban.unban_date.with_timezone(&Local).format("%Y-%m-%d")
                ));
            }
            Ok(None) => {}
            Err(err) => {
                error!(%err, user_id, "ban check failed");
                return Some(apology());
            }
        }

        info!(user_id, user_name, ?command, "handling chat command");
        let reply = match command {
            Command::Start => Ok(greeting()),
            Command::Help => Ok(help_text()),
            Command::Status { days } => self.status_reply(days).await,
            Command::Goal { target } => self.goal_reply(user_id, user_name, target).await,
            Command::CheckGoal => self.check_goal_reply(user_id).await,
            Command::LatestData => self.latest_data_reply().await,
            Command::Unknown => Ok(help_text()),
            Command::Message(message) => Ok(self.freeform_reply(user_id, user_name, &message).await),
        };

        Some(reply.unwrap_or_else(|err| {
            error!(%err, user_id, "command handler failed");
            apology()
        }))
    }

    /// Run the weekly goal sweep and render one ban notification per failed
    /// goal for the adapter to deliver
    ///
    /// # Errors
    ///
    /// Returns an error if the sweep itself fails; notification rendering
    /// cannot fail.
    pub async fn sweep_and_notify(&self) -> AppResult<Vec<(i64, String)>> {
        let failed = self.database.sweep_expired_goals(Utc::now()).await?;
        Ok(failed
            .into_iter()
            .map(|goal| {
                (
                    goal.user_id,
                    format!(
                        "You failed to reach your gym goal ({}/{} visits)! 😔\n\
                         As agreed, you're banned for 30 days.\n\
                         Use this time to reflect on your commitment!\n\
                         See you in a month, when you're ready to try again! 💪",
                        goal.current_visits, goal.target_visits
                    ),
                )
            })
            .collect())
    }

    async fn status_reply(&self, days: Option<i64>) -> AppResult<String> {
        let summary = self.stats.summary(&self.club_name).await?;
        let now = Local::now().format("%Y-%m-%d %H:%M:%S");

        let mut message = format!(
            "🏋️ Gym Status Report - {now}\n\n\
             Current members: {} 👥\n",
            summary.current_members
        );
        if let Some(days) = days {
            let max = self.stats.max_over_days(&self.club_name, days).await?;
            match max {
                Some(max) => {
                    message.push_str(&format!("Maximum in last {days} days: {max} 📈\n"));
                }
                None => message.push_str(&format!("No readings in the last {days} days 🤷\n")),
            }
        } else if let Some(max_7d) = summary.max_7d {
            message.push_str(&format!("Maximum in last 7 days: {max_7d} 📈\n"));
        }
        Ok(message)
    }

    async fn goal_reply(
        &self,
        user_id: i64,
        user_name: &str,
        target: GoalTarget,
    ) -> AppResult<String> {
        if let Some(goal) = self.database.active_goal(user_id).await? {
            return Ok(format!(
                "You already have an active goal!\n{}",
                render_progress(&goal)
            ));
        }

        let target = match target {
            GoalTarget::Visits(n) => n,
            GoalTarget::Unspecified => {
                return Ok(
                    "Let's set a weekly gym goal! 🎯\n\
                     How many times will you go to the gym this week? (1-5)\n\
                     Reply with e.g. /goal 3\n\
                     Choose wisely - if you fail, you'll be banned for a month! 😱"
                        .to_owned(),
                );
            }
            GoalTarget::Invalid => {
                return Ok("Please enter a valid number! 🔢 Try e.g. /goal 3".to_owned());
            }
        };

        match self.database.create_goal(user_id, user_name, target).await {
            Ok(goal) => Ok(format!(
                "Goal set! 🎯\n\
                 You committed to {} gym visits this week.\n\
                 Deadline: {}\n\
                 Don't let me down, bro! 💪",
                goal.target_visits,
                goal.end_date.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            )),
            Err(err) if err.code == ErrorCode::ValueOutOfRange => {
                Ok("Please choose a number between 1 and 5! 🔢".to_owned())
            }
            Err(err) => Err(err),
        }
    }

    async fn check_goal_reply(&self, user_id: i64) -> AppResult<String> {
        match self.database.active_goal(user_id).await? {
            Some(goal) => Ok(format!(
                "Current Goal Progress 📊\n{}\nKeep pushing! 💪",
                render_progress(&goal)
            )),
            None => Ok("You don't have an active goal! 🤔\nUse /goal to set one!".to_owned()),
        }
    }

    async fn latest_data_reply(&self) -> AppResult<String> {
        let reading = self.stats.latest(&self.club_name).await?;
        Ok(format!(
            "Latest reading for {}: {} members at {} 📊",
            reading.club_name,
            reading.member_count,
            reading
                .recorded_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
        ))
    }

    /// Relay a freeform message through the LLM with stored history as
    /// context; any failure falls back to the canned reply
    async fn freeform_reply(&self, user_id: i64, user_name: &str, message: &str) -> String {
        let Some(llm) = &self.llm else {
            return prompts::fallback_reply().to_owned();
        };

        let goal = self.database.active_goal(user_id).await.ok().flatten();
        let history = self
            .database
            .recent_history(user_id)
            .await
            .unwrap_or_default();

        if let Err(err) = self
            .database
            .append_message(user_id, MessageRole::User, message)
            .await
        {
            warn!(%err, user_id, "failed to store user message");
        }

        let mut messages = vec![ChatMessage::system(prompts::persona_prompt(
            user_name,
            goal.as_ref(),
        ))];
        for stored in &history {
            messages.push(ChatMessage {
                role: stored.role.into(),
                content: stored.content.clone(),
            });
        }
        messages.push(ChatMessage::user(message));

        let request = ChatRequest::new(messages).with_temperature(REPLY_TEMPERATURE);
        match llm.complete(&request).await {
            Ok(response) => {
                if let Err(err) = self
                    .database
                    .append_message(user_id, MessageRole::Assistant, &response.content)
                    .await
                {
                    warn!(%err, user_id, "failed to store assistant reply");
                }
                response.content
            }
            Err(err) => {
                error!(%err, user_id, "LLM reply failed, using fallback");
                prompts::fallback_reply().to_owned()
            }
        }
    }
}

fn render_progress(goal: &Goal) -> String {
    format!(
        "Target: {} visits\n\
         Current progress: {}/{}\n\
         Deadline: {}",
        goal.target_visits,
        goal.current_visits,
        goal.target_visits,
        goal.end_date.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    )
}

fn greeting() -> String {
    "Do you even lift bro? 💀\n\
     Use /status to check gym stats!\n\
     Use /goal to set a weekly gym goal!"
        .to_owned()
}

fn help_text() -> String {
    "Available commands:\n\
     /status [days] - current members and recent maximum\n\
     /goal [1-5] - commit to weekly gym visits\n\
     /checkgoal - check your goal progress\n\
     /latestdata - newest reading with timestamp\n\
     /help - this message"
        .to_owned()
}

fn apology() -> String {
    "Sorry, couldn't fetch that right now 😔 Try again later!".to_owned()
}
