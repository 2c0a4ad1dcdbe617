// ABOUTME: Health check endpoint for operational visibility
// ABOUTME: Serves GET /health with service status, timestamp, and hostname
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

//! Health check endpoint and monitoring utilities

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use tracing::{info, warn};

use crate::constants::service;
use crate::database::Database;
use crate::errors::{AppError, AppResult};

/// Overall health status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All components responding
    Healthy,
    /// Service is up but a component check failed
    Degraded,
}

/// Health check response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Response timestamp
    pub timestamp: DateTime<Utc>,
    /// Host the service runs on
    pub hostname: String,
}

/// Build the health response, probing the database
pub async fn check(database: &Database) -> HealthResponse {
    let status = match database.ping().await {
        Ok(()) => HealthStatus::Healthy,
        Err(err) => {
            warn!(%err, "database ping failed during health check");
            HealthStatus::Degraded
        }
    };

    HealthResponse {
        status,
        service: service::SERVICE_NAME.to_owned(),
        version: service::SERVICE_VERSION.to_owned(),
        timestamp: Utc::now(),
        hostname: env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_owned()),
    }
}

async fn health_handler(State(database): State<Database>) -> Json<HealthResponse> {
    Json(check(&database).await)
}

/// Build the health router
#[must_use]
pub fn router(database: Database) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(database)
}

/// Serve the health endpoint on the given port until the process exits
///
/// # Errors
///
/// Returns an error if the listener cannot bind.
pub async fn serve(database: Database, port: u16) -> AppResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::internal(format!("failed to bind health port {port}: {e}")))?;
    info!(%addr, "health endpoint listening");
    axum::serve(listener, router(database))
        .await
        .map_err(|e| AppError::internal(format!("health server failed: {e}")))?;
    Ok(())
}
