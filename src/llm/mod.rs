// ABOUTME: LLM provider abstraction for motivational reply generation
// ABOUTME: Defines the chat completion contract implemented by the Gemini provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymwatch Contributors

//! # LLM Provider Interface
//!
//! Contract for chat completion providers. The bot relays freeform messages
//! through an [`LlmProvider`] together with stored conversation history; a
//! provider failure is never surfaced to the user (the bot substitutes a
//! canned reply).

mod gemini;
pub mod prompts;

pub use gemini::GeminiProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppResult;
use crate::models::MessageRole;

/// Role of a chat completion message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instruction framing for the model
    System,
    /// End-user message
    User,
    /// Model output
    Assistant,
}

impl From<MessageRole> for ChatRole {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => Self::User,
            MessageRole::Assistant => Self::Assistant,
        }
    }
}

/// One message in a chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author role
    pub role: ChatRole,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Build a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Build a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Build an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Chat completion request configuration
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Conversation messages, oldest first
    pub messages: Vec<ChatMessage>,
    /// Model override; provider default when `None`
    pub model: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Output token cap
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Build a request from messages with provider defaults
    #[must_use]
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the sampling temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Chat completion response
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Generated text
    pub content: String,
    /// Model that produced the response
    pub model: String,
}

/// Chat completion provider contract
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short provider name for logging
    fn name(&self) -> &'static str;

    /// Complete a chat request
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or an API error response.
    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse>;
}
