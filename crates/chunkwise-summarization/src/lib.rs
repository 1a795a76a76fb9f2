//! Token-budget-aware document summarization
//!
//! Long documents are split into chunks that fit a model's input budget,
//! each chunk is summarized through a retried completion call, and the
//! chunk summaries are reduced hierarchically into one summary.

pub mod completion;
pub mod error;
pub mod jobs;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod reducer;
pub mod retry;
pub mod summarizer;

pub use completion::{CompletionRunner, CompletionSettings};
pub use error::{SummarizationError, SummarizationResult};
pub use jobs::JobRegistry;
pub use pipeline::{SummarizationPipeline, SummaryResult};
pub use progress::{JobStatus, ProgressState, ProgressTracker};
pub use reducer::HierarchicalReducer;
pub use retry::{RetryExecutor, RetryPolicy};
pub use summarizer::{ChunkSummarizer, Summary};

// Re-export external crate types for convenience
pub use chunkwise_config::ModelProfile;
pub use chunkwise_parsing::{Chunk, TokenCounterRegistry};
