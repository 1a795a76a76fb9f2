//! Chunkwise LLM completion crate
//!
//! This crate defines the [`CompletionClient`] seam the summarization engine
//! calls through, the classified [`ApiError`] every provider failure maps to,
//! and an OpenAI-compatible HTTP implementation.

pub mod client;
pub mod error;
pub mod openai;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export main types
pub use client::{CompletionClient, CompletionRequest, Message, Role};
pub use error::{ApiError, ErrorClass, LlmResult};
pub use openai::OpenAiCompatibleClient;
