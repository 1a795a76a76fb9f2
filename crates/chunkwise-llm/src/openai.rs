//! OpenAI-compatible chat completions client
//!
//! Works against any server exposing `POST /v1/chat/completions` with the
//! OpenAI request and response shape.

use crate::client::{CompletionClient, CompletionRequest};
use crate::{ApiError, LlmResult};
use async_trait::async_trait;
use chunkwise_common::error_sanitizer::redact_credentials;
use chunkwise_config::LlmConfig;
use serde_json::{Value, json};
use tracing::debug;

pub struct OpenAiCompatibleClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiCompatibleClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config.base_url.clone(), config.api_key.clone())
    }

    async fn send(&self, request: &CompletionRequest) -> LlmResult<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_output_tokens,
        });

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Completion request to {url}"
        );

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::http(status.as_u16(), redact_credentials(&body)));
        }

        let payload: Value = response.json().await.map_err(transport_error)?;
        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::trim)
            .ok_or_else(|| ApiError::without_status("missing choices[0].message.content"))?;

        if content.is_empty() {
            return Err(ApiError::without_status("completion returned empty content"));
        }
        Ok(content.to_string())
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    ApiError::new(
        err.status().map(|s| s.as_u16()),
        redact_credentials(&err.to_string()),
    )
}

#[async_trait]
impl CompletionClient for OpenAiCompatibleClient {
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<String> {
        tokio::time::timeout(request.timeout, self.send(request))
            .await
            .map_err(|_| ApiError::timeout(request.timeout))?
    }
}
