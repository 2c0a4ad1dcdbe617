// ABOUTME: Prompt construction for the gym-bro chat persona
// ABOUTME: Builds system prompts with goal context and provides the canned fallback reply
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

use crate::models::Goal;

/// System prompt framing freeform replies, with the user's goal state woven in
#[must_use]
pub fn persona_prompt(user_name: &str, goal: Option<&Goal>) -> String {
    let goal_context = goal.map_or_else(
        || "The user does not have an active gym goal yet.".to_owned(),
        |g| {
            format!(
                "The user has an active gym goal: {}/{} visits completed this week.",
                g.current_visits, g.target_visits
            )
        },
    );

    format!(
        "You are a gym bro chatbot talking to {user_name}. \
         Be motivational but also funny and use gym bro slang. \
         {goal_context} \
         Respond in a motivational gym bro style, keep it short and fun. Use emojis."
    )
}

/// Reply used whenever the LLM is unavailable or fails
#[must_use]
pub fn fallback_reply() -> &'static str {
    "Sorry bro, my protein shake must've gone to my head! 🥤 Try again later! 💪"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GoalStatus;
    use chrono::Utc;

    #[test]
    fn prompt_mentions_goal_progress_when_active() {
        let goal = Goal {
            id: 1,
            user_id: 7,
            user_name: "Kasia".into(),
            target_visits: 4,
            current_visits: 2,
            created_at: Utc::now(),
            end_date: Utc::now(),
            status: GoalStatus::Active,
        };
        let prompt = persona_prompt("Kasia", Some(&goal));
        assert!(prompt.contains("2/4 visits"));
    }

    #[test]
    fn prompt_notes_missing_goal() {
        let prompt = persona_prompt("Kasia", None);
        assert!(prompt.contains("does not have an active gym goal"));
    }
}
