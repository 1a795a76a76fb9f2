//! Error types for the parsing crate
//!
//! Defines tokenization and chunking errors and the crate result type.

use thiserror::Error;

/// Parsing-specific error types
#[derive(Error, Debug)]
pub enum ParsingError {
    /// Tokenizer could not be created or used; nothing can be chunked safely
    #[error("Token counting error: {0}")]
    TokenCountingError(String),

    /// A chunk could not be kept within its token budget
    #[error("Chunk overflow: {message} (budget: {budget} tokens)")]
    ChunkOverflow { budget: usize, message: String },
}

impl ParsingError {
    /// Create a token counting error
    pub fn token_counting_error(msg: String) -> Self {
        Self::TokenCountingError(msg)
    }

    /// Create a chunk overflow error
    pub fn chunk_overflow(budget: usize, message: impl Into<String>) -> Self {
        Self::ChunkOverflow {
            budget,
            message: message.into(),
        }
    }
}

/// Result type alias for parsing operations
pub type ParsingResult<T> = Result<T, ParsingError>;
