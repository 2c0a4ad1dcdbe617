// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, defaults, and runtime configuration parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

//! Environment-based configuration management
//!
//! Every tunable is read from environment variables with a sensible default.
//! The only configuration that is allowed to abort startup is missing portal
//! credentials; everything else degrades (e.g. no LLM key disables LLM
//! replies).

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Default member portal base URL
pub const DEFAULT_PORTAL_BASE_URL: &str = "https://wellfitness.perfectgym.pl/ClientPortal2";
/// Default collection interval in seconds (10 minutes)
pub const DEFAULT_SCRAPE_INTERVAL_SECS: u64 = 600;
/// Default number of fetch attempts per collection cycle
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default initial retry backoff in seconds (doubles per attempt)
pub const DEFAULT_INITIAL_BACKOFF_SECS: u64 = 60;
/// Default backup retention window in days
pub const DEFAULT_BACKUP_RETENTION_DAYS: i64 = 30;
/// Default health endpoint port
pub const DEFAULT_HEALTH_PORT: u16 = 8080;

/// Portal (upstream membership API) settings
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Base URL of the client portal, without trailing slash
    pub base_url: String,
    /// Portal login
    pub username: String,
    /// Portal password
    pub password: String,
    /// Substring filter selecting which clubs to persist; empty keeps all
    pub club_filter: String,
}

/// Collector loop settings
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Seconds between collection cycles
    pub scrape_interval_secs: u64,
    /// Fetch attempts per cycle before giving up
    pub max_retries: u32,
    /// Delay before the second attempt; doubles for each later attempt
    pub initial_backoff_secs: u64,
}

/// Durable storage settings
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// `SQLite` database URL
    pub database_url: String,
    /// Path of the live raw-response audit log
    pub audit_log_path: PathBuf,
    /// Directory receiving dated backup artifacts
    pub backup_dir: PathBuf,
    /// Days to keep backup artifacts
    pub backup_retention_days: i64,
}

/// LLM settings; entirely optional
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Gemini API key; `None` disables LLM replies
    pub gemini_api_key: Option<String>,
    /// Model override
    pub model: Option<String>,
}

/// Top-level server configuration assembled from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Upstream portal settings
    pub portal: PortalConfig,
    /// Collector loop settings
    pub collector: CollectorConfig,
    /// Storage settings
    pub storage: StorageConfig,
    /// LLM settings
    pub llm: LlmConfig,
    /// Port for the health endpoint
    pub health_port: u16,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error when portal credentials are missing or a numeric
    /// variable fails to parse. Missing credentials are the only fatal
    /// startup condition in the system.
    pub fn from_env() -> Result<Self> {
        let username = env::var("PORTAL_USERNAME")
            .context("PORTAL_USERNAME environment variable is required")?;
        let password = env::var("PORTAL_PASSWORD")
            .context("PORTAL_PASSWORD environment variable is required")?;

        Ok(Self {
            portal: PortalConfig {
                base_url: env_var_or("PORTAL_BASE_URL", DEFAULT_PORTAL_BASE_URL),
                username,
                password,
                club_filter: env_var_or("PORTAL_CLUB_FILTER", ""),
            },
            collector: CollectorConfig {
                scrape_interval_secs: parse_env_var(
                    "SCRAPE_INTERVAL",
                    DEFAULT_SCRAPE_INTERVAL_SECS,
                )?,
                max_retries: parse_env_var("SCRAPE_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
                initial_backoff_secs: parse_env_var(
                    "SCRAPE_INITIAL_BACKOFF",
                    DEFAULT_INITIAL_BACKOFF_SECS,
                )?,
            },
            storage: StorageConfig {
                database_url: env_var_or("DATABASE_URL", "sqlite:gymwatch.db"),
                audit_log_path: PathBuf::from(env_var_or("AUDIT_LOG_PATH", "data/raw_responses.jsonl")),
                backup_dir: PathBuf::from(env_var_or("BACKUP_DIR", "data/backups")),
                backup_retention_days: parse_env_var(
                    "BACKUP_RETENTION_DAYS",
                    DEFAULT_BACKUP_RETENTION_DAYS,
                )?,
            },
            llm: LlmConfig {
                gemini_api_key: env::var("GEMINI_API_KEY").ok(),
                model: env::var("GEMINI_MODEL").ok(),
            },
            health_port: parse_env_var("HEALTH_PORT", DEFAULT_HEALTH_PORT)?,
        })
    }

    /// One-line configuration summary for startup logging; never includes
    /// credentials.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "portal={} interval={}s retries={} db={} backups={} ({}d) health_port={} llm={}",
            self.portal.base_url,
            self.collector.scrape_interval_secs,
            self.collector.max_retries,
            self.storage.database_url,
            self.storage.backup_dir.display(),
            self.storage.backup_retention_days,
            self.health_port,
            if self.llm.gemini_api_key.is_some() {
                "enabled"
            } else {
                "disabled"
            }
        )
    }
}

/// Read an environment variable with a fallback default
fn env_var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_owned())
}

/// Read and parse an environment variable with a fallback default
fn parse_env_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr + ToString,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("failed to parse {name}={value}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn set_required_vars() {
        env::set_var("PORTAL_USERNAME", "user@example.com");
        env::set_var("PORTAL_PASSWORD", "hunter2");
    }

    fn clear_vars() {
        for name in [
            "PORTAL_USERNAME",
            "PORTAL_PASSWORD",
            "SCRAPE_INTERVAL",
            "PORTAL_CLUB_FILTER",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn missing_credentials_are_fatal() {
        clear_vars();
        assert!(ServerConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn defaults_apply_when_unset() {
        clear_vars();
        set_required_vars();
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(
            config.collector.scrape_interval_secs,
            DEFAULT_SCRAPE_INTERVAL_SECS
        );
        assert_eq!(config.collector.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(
            config.storage.backup_retention_days,
            DEFAULT_BACKUP_RETENTION_DAYS
        );
        assert!(config.portal.club_filter.is_empty());
        clear_vars();
    }

    #[test]
    #[serial]
    fn summary_never_leaks_credentials() {
        clear_vars();
        set_required_vars();
        env::set_var("SCRAPE_INTERVAL", "120");
        let config = ServerConfig::from_env().unwrap();
        let summary = config.summary();
        assert!(summary.contains("interval=120s"));
        assert!(!summary.contains("hunter2"));
        assert!(!summary.contains("user@example.com"));
        clear_vars();
    }

    #[test]
    #[serial]
    fn invalid_numeric_value_is_rejected() {
        clear_vars();
        set_required_vars();
        env::set_var("SCRAPE_INTERVAL", "soon");
        assert!(ServerConfig::from_env().is_err());
        clear_vars();
    }
}
