// ABOUTME: CLI binary for inspecting stored readings and administering goals
// ABOUTME: Prints summaries, latest readings, resampled series, and runs the goal sweep
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

//! # Gymwatch CLI
//!
//! Operator tool over the same database the server writes. Does not need
//! portal credentials.

use anyhow::Result;
use chrono::Duration;
use clap::{Parser, Subcommand};
use gymwatch::{
    bot::BotHandler,
    database::Database,
    llm::{GeminiProvider, LlmProvider},
    logging,
    stats::StatsReader,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "gymwatch-cli")]
#[command(about = "Gymwatch operator CLI - inspect readings and administer goals")]
struct Args {
    /// SQLite database URL
    #[arg(long, default_value = "sqlite:gymwatch.db")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print current members and 24h/7d/14d maxima for a club
    Summary {
        /// Club name as stored in readings
        club: String,
    },
    /// Print the newest reading for a club
    Latest {
        /// Club name as stored in readings
        club: String,
    },
    /// Print a resampled mean series for a club
    Resample {
        /// Club name as stored in readings
        club: String,
        /// Hours of history to include
        #[arg(long, default_value_t = 24)]
        hours: i64,
        /// Bucket width in minutes
        #[arg(long, default_value_t = 20)]
        bucket_minutes: i64,
    },
    /// Transition expired goals and print ban notifications
    SweepGoals,
    /// Relay one chat message through the bot and print the reply
    Chat {
        /// Chat user id to attribute the message to
        #[arg(long, default_value_t = 0)]
        user_id: i64,
        /// Display name for the persona prompt
        #[arg(long, default_value = "operator")]
        user_name: String,
        /// Club name for /status and /latestdata replies
        #[arg(long, default_value = "")]
        club: String,
        /// Message text, e.g. "/status" or freeform
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_from_env()?;
    let args = Args::parse();

    let database = Database::new(&args.database_url).await?;
    let stats = StatsReader::new(database.clone());

    match args.command {
        Command::Summary { club } => {
            let summary = stats.summary(&club).await?;
            println!("Club: {}", summary.club_name);
            println!(
                "Current members: {} (as of {})",
                summary.current_members, summary.current_as_of
            );
            println!("Max members (24h): {}", render_max(summary.max_24h));
            println!("Max members (7d):  {}", render_max(summary.max_7d));
            println!("Max members (14d): {}", render_max(summary.max_14d));
        }
        Command::Latest { club } => {
            let reading = stats.latest(&club).await?;
            println!(
                "{}  {}  {} members",
                reading.recorded_at, reading.club_name, reading.member_count
            );
        }
        Command::Resample {
            club,
            hours,
            bucket_minutes,
        } => {
            let buckets = stats
                .resample(
                    &club,
                    Duration::hours(hours),
                    Duration::minutes(bucket_minutes),
                )
                .await?;
            if buckets.is_empty() {
                println!("No readings in the last {hours}h");
            }
            for bucket in buckets {
                println!("{}  {:.1}", bucket.start, bucket.mean);
            }
        }
        Command::SweepGoals => {
            let handler = BotHandler::new(database.clone(), stats, None, String::new());
            let notifications = handler.sweep_and_notify().await?;
            if notifications.is_empty() {
                println!("No goals failed");
            }
            for (user_id, text) in notifications {
                println!("--- notify user {user_id} ---\n{text}");
            }
        }
        Command::Chat {
            user_id,
            user_name,
            club,
            message,
        } => {
            // Without GEMINI_API_KEY the bot still answers commands and
            // falls back to the canned reply for freeform text
            let llm = GeminiProvider::from_env()
                .ok()
                .map(|provider| match std::env::var("GEMINI_MODEL") {
                    Ok(model) => provider.with_default_model(model),
                    Err(_) => provider,
                })
                .map(|provider| Arc::new(provider) as Arc<dyn LlmProvider>);

            let handler = BotHandler::new(database.clone(), stats, llm, club);
            match handler.handle(user_id, &user_name, &message).await {
                Some(reply) => println!("{reply}"),
                None => println!("(no reply)"),
            }
        }
    }

    Ok(())
}

fn render_max(value: Option<i64>) -> String {
    value.map_or_else(|| "no data".to_owned(), |v| v.to_string())
}
