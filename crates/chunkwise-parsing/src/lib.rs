//! Chunkwise tokenization and chunking crate
//!
//! This crate counts and truncates text in model tokens and splits documents
//! into token-bounded chunks that respect paragraph and sentence boundaries.

pub mod chunking;
pub mod error;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export main types
pub use chunking::{
    Chunk, ChunkSplitter, TiktokenCounter, TokenCounter, TokenCounterRef, TokenCounterRegistry,
};
pub use error::{ParsingError, ParsingResult};
