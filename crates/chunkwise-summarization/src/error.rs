//! Error types for the summarization crate

use chunkwise_common::{CommonError, impl_common_conversions};
use chunkwise_llm::ApiError;
use chunkwise_parsing::ParsingError;
use thiserror::Error;

/// Result type for summarization operations
pub type SummarizationResult<T> = Result<T, SummarizationError>;

/// Summarization-specific error types
#[derive(Error, Debug)]
pub enum SummarizationError {
    /// Tokenizer unavailable or a chunk could not be kept in budget
    #[error("Parsing error: {0}")]
    Parsing(#[from] ParsingError),

    /// Completion failed after the retry policy gave up
    #[error("{0}")]
    Completion(#[from] ApiError),

    /// Every chunk failed
    #[error("no valid summaries generated")]
    NoValidSummaries,

    /// The job's cancellation token fired
    #[error("job cancelled")]
    Cancelled,

    /// Anything the pipeline did not anticipate, including task panics
    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl SummarizationError {
    /// Label used for metrics and logs
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Parsing(_) => "parsing",
            Self::Completion(_) => "completion",
            Self::NoValidSummaries => "no_valid_summaries",
            Self::Cancelled => "cancelled",
            Self::Unexpected(_) => "unexpected",
        }
    }
}

impl CommonError for SummarizationError {
    fn io_error(msg: impl Into<String>) -> Self {
        Self::Unexpected(format!("I/O: {}", msg.into()))
    }

    fn other_error(msg: impl Into<String>) -> Self {
        Self::Unexpected(msg.into())
    }
}

impl_common_conversions!(SummarizationError);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_valid_summaries_message() {
        assert_eq!(
            SummarizationError::NoValidSummaries.to_string(),
            "no valid summaries generated"
        );
    }

    #[test]
    fn test_completion_error_keeps_provider_message() {
        let err = SummarizationError::from(ApiError::http(503, "overloaded"));
        assert_eq!(err.to_string(), "completion failed (HTTP 503): overloaded");
        assert_eq!(err.kind(), "completion");
    }

    #[test]
    fn test_common_conversions() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(matches!(
            SummarizationError::from(io),
            SummarizationError::Unexpected(msg) if msg == "I/O: missing"
        ));

        let other = SummarizationError::from(anyhow::anyhow!("surprise"));
        assert_eq!(other.kind(), "unexpected");
    }
}
