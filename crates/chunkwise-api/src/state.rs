//! Application state for Axum handlers
//!
//! Built once at startup and cloned into every handler.

use chunkwise_summarization::{JobRegistry, SummarizationPipeline};
use std::sync::Arc;

/// Shared services behind every route
#[derive(Clone)]
pub struct AppState {
    /// Summarization entry point shared by synchronous and background jobs
    pub pipeline: Arc<SummarizationPipeline>,
    /// Background jobs started through `/api/jobs`
    pub jobs: Arc<JobRegistry>,
    /// Largest accepted document, in bytes of UTF-8
    pub max_document_bytes: usize,
}

impl AppState {
    #[must_use]
    pub const fn new(
        pipeline: Arc<SummarizationPipeline>,
        jobs: Arc<JobRegistry>,
        max_document_bytes: usize,
    ) -> Self {
        Self {
            pipeline,
            jobs,
            max_document_bytes,
        }
    }
}
