//! Completion client abstraction
//!
//! The summarization engine only ever talks to a [`CompletionClient`], so
//! providers can be swapped and tests can script responses.

use crate::LlmResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-request deadline when the caller sets none
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A chat message for the LLM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Everything one completion call needs
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_output_tokens: u32,
    pub temperature: f64,
    /// Local deadline for the whole call
    pub timeout: Duration,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_output_tokens: 1000,
            temperature: 0.7,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Content of the last user message, the text being worked on
    pub fn user_content(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map_or("", |m| m.content.as_str())
    }
}

/// Trait for text completion providers
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run one completion and return the generated text
    ///
    /// # Errors
    /// Returns a classified `ApiError` for HTTP failures, transport errors,
    /// malformed payloads, and requests that outlive `request.timeout`
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<String>;
}
