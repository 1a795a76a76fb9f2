//! Per-chunk summarization

use crate::completion::CompletionRunner;
use crate::prompts::{SUMMARIZE_SYSTEM_PROMPT, summary_prompt};
use crate::SummarizationResult;
use chunkwise_config::ModelProfile;
use chunkwise_parsing::Chunk;
use serde::Serialize;
use std::borrow::Cow;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Text produced by a completion call, with its token count
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub text: String,
    pub token_count: usize,
}

impl Summary {
    pub fn new(text: impl Into<String>, token_count: usize) -> Self {
        Self {
            text: text.into(),
            token_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Summarizes one chunk with one retried completion call
pub struct ChunkSummarizer {
    runner: Arc<CompletionRunner>,
}

impl ChunkSummarizer {
    pub fn new(runner: Arc<CompletionRunner>) -> Self {
        Self { runner }
    }

    /// Summarize `chunk` for `profile`
    ///
    /// Chunks over the profile's chunk budget are truncated first.
    ///
    /// # Errors
    /// Returns the completion error left after retries, or
    /// `SummarizationError::Cancelled`
    #[tracing::instrument(
        skip(self, chunk, profile, cancel),
        fields(chunk = chunk.index, tokens = chunk.token_count)
    )]
    pub async fn summarize(
        &self,
        chunk: &Chunk,
        profile: &ModelProfile,
        cancel: &CancellationToken,
    ) -> SummarizationResult<Summary> {
        let budget = profile.chunk_budget();
        let text = if chunk.token_count > budget {
            tracing::warn!(budget, "Chunk over budget, truncating");
            Cow::Owned(self.runner.counter().truncate(&chunk.text, budget))
        } else {
            Cow::Borrowed(chunk.text.as_str())
        };

        let summary = self
            .runner
            .run(
                "summarize_chunk",
                SUMMARIZE_SYSTEM_PROMPT,
                summary_prompt(profile.target_summary_tokens(), &text),
                profile.context_window(),
                cancel,
            )
            .await?;

        metrics::counter!("chunkwise_chunks_summarized_total").increment(1);
        tracing::debug!(summary_tokens = summary.token_count, "Chunk summarized");
        Ok(summary)
    }
}
