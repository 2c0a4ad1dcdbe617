// ABOUTME: Google Gemini LLM provider over the Generative Language REST API
// ABOUTME: Non-streaming generateContent calls with permissive safety settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

//! # Gemini Provider
//!
//! Implementation of [`LlmProvider`] for Google's Gemini models. Set the
//! `GEMINI_API_KEY` environment variable with a key from Google AI Studio.

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatRequest, ChatResponse, ChatRole, LlmProvider};
use crate::errors::{AppError, AppResult};

/// Environment variable for the Gemini API key
const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default model to use
const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Base URL for the Gemini API
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Harm categories disabled for the gym-bro persona; the prompt leans on
/// slang the default filters occasionally trip over
const SAFETY_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

// ============================================================================
// API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Google Gemini LLM provider
pub struct GeminiProvider {
    api_key: String,
    client: Client,
    default_model: String,
}

impl GeminiProvider {
    /// Create a provider with an API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            default_model: DEFAULT_MODEL.to_owned(),
        }
    }

    /// Create a provider from the `GEMINI_API_KEY` environment variable
    ///
    /// # Errors
    ///
    /// Returns an error if the environment variable is not set.
    pub fn from_env() -> AppResult<Self> {
        let api_key = env::var(GEMINI_API_KEY_ENV).map_err(|_| {
            AppError::config(format!("{GEMINI_API_KEY_ENV} environment variable not set"))
        })?;
        Ok(Self::new(api_key))
    }

    /// Set a custom default model
    #[must_use]
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    fn build_request(request: &ChatRequest) -> GeminiRequest {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();

        for message in &request.messages {
            match message.role {
                ChatRole::System => system_parts.push(ContentPart {
                    text: message.content.clone(),
                }),
                ChatRole::User => contents.push(GeminiContent {
                    role: Some("user".to_owned()),
                    parts: vec![ContentPart {
                        text: message.content.clone(),
                    }],
                }),
                ChatRole::Assistant => contents.push(GeminiContent {
                    role: Some("model".to_owned()),
                    parts: vec![ContentPart {
                        text: message.content.clone(),
                    }],
                }),
            }
        }

        GeminiRequest {
            contents,
            system_instruction: if system_parts.is_empty() {
                None
            } else {
                Some(GeminiContent {
                    role: None,
                    parts: system_parts,
                })
            },
            generation_config: Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            }),
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect(),
        }
    }

    fn extract_text(response: GeminiResponse) -> AppResult<String> {
        if let Some(error) = response.error {
            return Err(AppError::external_service("gemini", error.message));
        }

        let text: String = response
            .candidates
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .map(|p| p.text)
            .collect();

        if text.is_empty() {
            return Err(AppError::external_service(
                "gemini",
                "response contained no text candidates",
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        let model = request.model.as_deref().unwrap_or(&self.default_model);
        let url = format!(
            "{API_BASE_URL}/models/{model}:generateContent?key={}",
            self.api_key
        );

        debug!(model, "sending request to Gemini API");
        let response = self
            .client
            .post(&url)
            .json(&Self::build_request(request))
            .send()
            .await?;

        let status = response.status();
        let body: GeminiResponse = response.json().await.map_err(|e| {
            AppError::external_service("gemini", format!("unreadable response ({status}): {e}"))
        })?;

        let content = Self::extract_text(body)?;
        Ok(ChatResponse {
            content,
            model: model.to_owned(),
        })
    }
}
