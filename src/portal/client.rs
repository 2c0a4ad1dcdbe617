// ABOUTME: HTTP client for the membership portal with cookie-session authentication
// ABOUTME: Logs in per fetch and retrieves the members-in-clubs snapshot
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

//! # Portal Client
//!
//! Session-cookie authenticated client for the club portal. The portal
//! exposes a JSON login endpoint and a POST endpoint returning the list of
//! clubs with their current member counts. The response is treated as opaque
//! JSON: the client validates only the shape it needs and keeps the full
//! payload for the audit log.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::MembershipProvider;
use crate::config::PortalConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{ClubOccupancy, OccupancySnapshot};

/// Login request body
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    login: &'a str,
    password: &'a str,
}

/// Portal members-in-clubs response; only the fields we consume
#[derive(Debug, Deserialize)]
struct MembersInClubsResponse {
    #[serde(rename = "UsersInClubList")]
    users_in_club_list: Vec<ClubEntry>,
}

/// One club entry from the portal
#[derive(Debug, Deserialize)]
struct ClubEntry {
    #[serde(rename = "ClubName")]
    club_name: String,
    #[serde(rename = "ClubAddress")]
    club_address: Option<String>,
    #[serde(rename = "UsersCountCurrentlyInClub")]
    users_count: i64,
}

/// Session-cookie authenticated portal client
pub struct PortalClient {
    client: Client,
    config: PortalConfig,
}

impl PortalClient {
    /// Build a client for the configured portal
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: PortalConfig) -> AppResult<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| AppError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Authenticate against the portal, storing the session cookie on the
    /// client's cookie jar
    async fn login(&self) -> AppResult<()> {
        let url = format!("{}/Auth/Login", self.config.base_url);
        let body = LoginRequest {
            login: &self.config.username,
            password: &self.config.password,
        };

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(AppError::external_auth(
                "portal",
                format!("login failed with status {}", response.status()),
            ));
        }
        debug!("portal login succeeded");
        Ok(())
    }

    /// Parse and validate the members-in-clubs payload shape
    fn normalize(raw: &serde_json::Value) -> AppResult<Vec<ClubOccupancy>> {
        let parsed: MembersInClubsResponse = serde_json::from_value(raw.clone())
            .map_err(|e| AppError::invalid_format(format!("unexpected portal response: {e}")))?;

        Ok(parsed
            .users_in_club_list
            .into_iter()
            .map(|entry| ClubOccupancy {
                club_name: entry.club_name,
                club_address: entry.club_address,
                member_count: entry.users_count,
            })
            .collect())
    }
}

#[async_trait]
impl MembershipProvider for PortalClient {
    fn name(&self) -> &'static str {
        "portal"
    }

    async fn fetch_occupancy(&self) -> AppResult<OccupancySnapshot> {
        // The portal session is short-lived; authenticate per fetch rather
        // than tracking cookie expiry.
        self.login().await?;

        let url = format!("{}/Clubs/Clubs/GetMembersInClubs", self.config.base_url);
        let response = self.client.post(&url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::external_service(
                "portal",
                format!("members request failed with status {}", response.status()),
            ));
        }

        let raw: serde_json::Value = response.json().await.map_err(|e| {
            AppError::invalid_format(format!("portal response is not JSON: {e}"))
        })?;
        let clubs = Self::normalize(&raw)?;
        debug!(clubs = clubs.len(), "fetched occupancy snapshot");

        Ok(OccupancySnapshot {
            clubs,
            raw,
            fetched_at: Utc::now(),
        })
    }
}
