//! Document summarization pipeline
//!
//! [`SummarizationPipeline::process_text_document`] splits a document into
//! chunks, summarizes them with bounded concurrency, drops the chunks whose
//! calls never succeeded, and reduces what is left into one summary. It
//! always returns a [`SummaryResult`]: every failure, panics included, is
//! reported through the job's [`ProgressTracker`] and the result's `error`.

use crate::completion::{CompletionRunner, CompletionSettings};
use crate::progress::{JobStatus, ProgressTracker};
use crate::reducer::HierarchicalReducer;
use crate::retry::{RetryExecutor, RetryPolicy};
use crate::summarizer::{ChunkSummarizer, Summary};
use crate::{SummarizationError, SummarizationResult};
use chunkwise_common::CorrelationId;
use chunkwise_common::error_sanitizer::sanitize_with_message;
use chunkwise_config::{ApplicationConfig, LlmConfig, ModelProfile, TimeoutConfig};
use chunkwise_llm::CompletionClient;
use chunkwise_parsing::{Chunk, ChunkSplitter, TokenCounterRegistry};
use futures::{FutureExt, StreamExt, TryStreamExt, stream};
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Outcome of one job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Last known progress, 100 when completed
    pub progress: u8,
    pub total_chunks: usize,
    pub successful_chunks: usize,
    pub failed_chunks: usize,
    /// Model the requests were sent to
    pub model: String,
}

#[derive(Debug, Default)]
struct ChunkCounts {
    total: AtomicUsize,
    successful: AtomicUsize,
    failed: AtomicUsize,
}

/// Shared, reusable entry point for summarization jobs
pub struct SummarizationPipeline {
    client: Arc<dyn CompletionClient>,
    counters: Arc<TokenCounterRegistry>,
    llm: LlmConfig,
    retry: RetryPolicy,
    timeouts: TimeoutConfig,
    chunk_concurrency: usize,
}

impl SummarizationPipeline {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        counters: Arc<TokenCounterRegistry>,
        config: &ApplicationConfig,
    ) -> Self {
        Self {
            client,
            counters,
            llm: config.llm.clone(),
            retry: RetryPolicy::from_config(&config.retry),
            timeouts: config.timeout.clone(),
            chunk_concurrency: config.summarization.chunk_concurrency.max(1),
        }
    }

    /// Model name used when a request leaves it blank
    pub fn default_model(&self) -> &str {
        &self.llm.default_model
    }

    /// Summarize `text` for `model_name`
    ///
    /// Blank model names fall back to the configured default. Unknown models
    /// are still sent to the provider under their own name, with the default
    /// profile's limits.
    pub async fn process_text_document(
        &self,
        text: &str,
        model_name: &str,
        tracker: &ProgressTracker,
        cancel: &CancellationToken,
    ) -> SummaryResult {
        let requested = model_name.trim();
        let model = if requested.is_empty() {
            self.llm.default_model.as_str()
        } else {
            requested
        };
        let (_, profile) = ModelProfile::for_model(model);
        self.process_with_profile(text, model, profile, tracker, cancel)
            .await
    }

    /// [`Self::process_text_document`] with explicit token limits
    #[tracing::instrument(
        skip(self, text, profile, tracker, cancel),
        fields(correlation_id = tracing::field::Empty, model = %model, bytes = text.len())
    )]
    pub async fn process_with_profile(
        &self,
        text: &str,
        model: &str,
        profile: ModelProfile,
        tracker: &ProgressTracker,
        cancel: &CancellationToken,
    ) -> SummaryResult {
        let correlation_id = CorrelationId::from(tracker.job_id());
        tracing::Span::current().record("correlation_id", tracing::field::display(&correlation_id));

        let started = Instant::now();
        let counts = ChunkCounts::default();
        tracker.start();
        info!("Summarization job started");

        let outcome = AssertUnwindSafe(self.run(text, model, &profile, tracker, cancel, &counts))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(SummarizationError::Unexpected(panic_message(&*panic))));

        let (summary, error) = match outcome {
            Ok(summary) => {
                tracker.complete();
                (Some(summary.text), None)
            }
            Err(err) => {
                let message = match err {
                    SummarizationError::Unexpected(_) => sanitize_with_message(
                        &err,
                        "summarization",
                        "unexpected failure while summarizing",
                    ),
                    _ => err.to_string(),
                };
                tracker.set_error(message.clone());
                error!(kind = err.kind(), "Summarization job failed: {message}");
                (None, Some(message))
            }
        };

        let state = tracker.get_status();
        let elapsed = started.elapsed();
        metrics::counter!("chunkwise_jobs_total", "status" => state.status.as_str()).increment(1);
        metrics::histogram!("chunkwise_job_duration_seconds").record(elapsed.as_secs_f64());

        let result = SummaryResult {
            status: state.status,
            summary,
            error,
            progress: state.progress,
            total_chunks: counts.total.load(Ordering::SeqCst),
            successful_chunks: counts.successful.load(Ordering::SeqCst),
            failed_chunks: counts.failed.load(Ordering::SeqCst),
            model: model.to_string(),
        };
        info!(
            status = %result.status,
            chunks = result.total_chunks,
            failed = result.failed_chunks,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "Summarization job finished"
        );
        result
    }

    async fn run(
        &self,
        text: &str,
        model: &str,
        profile: &ModelProfile,
        tracker: &ProgressTracker,
        cancel: &CancellationToken,
        counts: &ChunkCounts,
    ) -> SummarizationResult<Summary> {
        let counter = self.counters.for_model(model, profile.context_window())?;
        let chunks = ChunkSplitter::new(Arc::clone(&counter)).split(text, profile.chunk_budget())?;
        let total = chunks.len();
        counts.total.store(total, Ordering::SeqCst);
        tracker.set_total_chunks(total);
        info!(chunks = total, budget = profile.chunk_budget(), "Document split");

        let runner = Arc::new(CompletionRunner::new(
            Arc::clone(&self.client),
            counter,
            RetryExecutor::new(self.retry),
            CompletionSettings {
                model: model.to_string(),
                temperature: self.llm.temperature,
                max_output_tokens: self.llm.max_output_tokens,
                timeouts: self.timeouts.clone(),
            },
        ));
        let summarizer = ChunkSummarizer::new(Arc::clone(&runner));

        let chunk_futures: Vec<_> = chunks
            .iter()
            .map(|chunk| {
                self.summarize_chunk(&summarizer, chunk, profile, tracker, cancel, counts, total)
            })
            .collect();
        let summaries: Vec<Option<Summary>> = stream::iter(chunk_futures)
            .buffered(self.chunk_concurrency)
            .try_collect()
            .await?;
        let summaries: Vec<Summary> = summaries.into_iter().flatten().collect();

        if summaries.is_empty() {
            return Err(SummarizationError::NoValidSummaries);
        }
        if cancel.is_cancelled() {
            return Err(SummarizationError::Cancelled);
        }

        debug!(summaries = summaries.len(), "Reducing chunk summaries");
        HierarchicalReducer::new(runner)
            .reduce(&summaries, profile, cancel)
            .await
    }

    /// `Ok(None)` marks a chunk dropped after its retries ran out
    #[allow(clippy::too_many_arguments)]
    async fn summarize_chunk(
        &self,
        summarizer: &ChunkSummarizer,
        chunk: &Chunk,
        profile: &ModelProfile,
        tracker: &ProgressTracker,
        cancel: &CancellationToken,
        counts: &ChunkCounts,
        total: usize,
    ) -> SummarizationResult<Option<Summary>> {
        if cancel.is_cancelled() {
            return Err(SummarizationError::Cancelled);
        }

        let result = summarizer.summarize(chunk, profile, cancel).await;
        match result {
            Ok(summary) => {
                counts.successful.fetch_add(1, Ordering::SeqCst);
                let attempted = tracker.record_chunk_attempt(total);
                debug!(chunk = chunk.index, attempted, total, "Chunk summarized");
                Ok(Some(summary))
            }
            Err(SummarizationError::Cancelled) => Err(SummarizationError::Cancelled),
            Err(err) => {
                counts.failed.fetch_add(1, Ordering::SeqCst);
                tracker.record_chunk_attempt(total);
                metrics::counter!("chunkwise_chunks_failed_total").increment(1);
                warn!(chunk = chunk.index, "Dropping chunk after failed summarization: {err}");
                Ok(None)
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|msg| (*msg).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "pipeline task panicked".to_string())
}
