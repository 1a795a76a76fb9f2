//! One retried completion call, shared by the summarizer and the reducer

use crate::retry::RetryExecutor;
use crate::summarizer::Summary;
use crate::SummarizationResult;
use chunkwise_config::TimeoutConfig;
use chunkwise_llm::{ApiError, CompletionClient, CompletionRequest, LlmResult, Message};
use chunkwise_parsing::{TokenCounter, TokenCounterRef};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Per-job request settings
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    /// Model name sent to the provider
    pub model: String,
    pub temperature: f64,
    /// Upper bound on generated tokens per call
    pub max_output_tokens: u32,
    pub timeouts: TimeoutConfig,
}

/// Builds requests, sizes their timeout, and runs them through the retry
/// executor
pub struct CompletionRunner {
    client: Arc<dyn CompletionClient>,
    counter: TokenCounterRef,
    executor: RetryExecutor,
    settings: CompletionSettings,
}

impl CompletionRunner {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        counter: TokenCounterRef,
        executor: RetryExecutor,
        settings: CompletionSettings,
    ) -> Self {
        Self {
            client,
            counter,
            executor,
            settings,
        }
    }

    pub fn counter(&self) -> &dyn TokenCounter {
        self.counter.as_ref()
    }

    /// Send one system/user prompt pair and count the reply
    ///
    /// Output is capped so that prompt plus reply fit `context_window`.
    ///
    /// # Errors
    /// Returns the final completion error once retries are exhausted, or
    /// `SummarizationError::Cancelled`
    pub async fn run(
        &self,
        operation: &str,
        system_prompt: &str,
        user_prompt: String,
        context_window: usize,
        cancel: &CancellationToken,
    ) -> SummarizationResult<Summary> {
        let input_tokens = self.counter.count(system_prompt) + self.counter.count(&user_prompt);
        let timeout = self.settings.timeouts.timeout_for(input_tokens);
        let max_output = context_window
            .saturating_sub(input_tokens)
            .min(usize::try_from(self.settings.max_output_tokens).unwrap_or(usize::MAX))
            .max(1);

        let request = CompletionRequest::new(
            self.settings.model.clone(),
            vec![Message::system(system_prompt), Message::user(user_prompt)],
        )
        .with_temperature(self.settings.temperature)
        .with_max_output_tokens(u32::try_from(max_output).unwrap_or(u32::MAX))
        .with_timeout(timeout);

        tracing::debug!(
            operation,
            input_tokens,
            max_output,
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "Sending completion request"
        );

        let text = self
            .executor
            .execute(operation, cancel, || self.attempt(&request))
            .await?;
        let token_count = self.counter.count(&text);
        Ok(Summary::new(text, token_count))
    }

    async fn attempt(&self, request: &CompletionRequest) -> LlmResult<String> {
        let text = self.client.complete(request).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ApiError::without_status("completion returned empty content"));
        }
        Ok(text.to_string())
    }
}
