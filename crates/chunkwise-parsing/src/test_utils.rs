//! Deterministic token counters for tests

use crate::chunking::TokenCounter;

/// Counts one token per whitespace-separated word
///
/// Token counts are easy to reason about in assertions, and joining pieces
/// with whitespace never changes the total.
#[derive(Debug, Clone)]
pub struct WordCounter {
    name: String,
    max_tokens: usize,
}

impl WordCounter {
    pub fn new() -> Self {
        Self::named("word-counter")
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            max_tokens: 1_000_000,
        }
    }
}

impl Default for WordCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCounter for WordCounter {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}
