//! Token counting and token-aware text splitting

pub mod registry;
pub mod splitter;
pub mod tiktoken_counter;
pub mod traits;

pub use registry::TokenCounterRegistry;
pub use splitter::{Chunk, ChunkSplitter};
pub use tiktoken_counter::TiktokenCounter;
pub use traits::{TokenCounter, TokenCounterRef};
