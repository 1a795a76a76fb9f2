//! Token counter registry for model selection

use super::tiktoken_counter::TiktokenCounter;
use super::traits::TokenCounterRef;
use crate::{ParsingError, ParsingResult};
use dashmap::DashMap;
use std::sync::Arc;

/// Memoized token counters keyed by model name
///
/// Encoders are built on first use and shared read-only afterwards, so
/// concurrent jobs for the same model reuse one BPE table.
#[derive(Default)]
pub struct TokenCounterRegistry {
    counters: DashMap<String, TokenCounterRef>,
}

impl TokenCounterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or build) the token counter for `model_id`
    ///
    /// # Errors
    /// Returns `ParsingError::TokenCountingError` when no encoder can be
    /// loaded; jobs cannot be chunked without one
    pub fn for_model(&self, model_id: &str, max_tokens: usize) -> ParsingResult<TokenCounterRef> {
        if let Some(counter) = self.counters.get(model_id) {
            return Ok(Arc::clone(counter.value()));
        }

        let counter: TokenCounterRef = Arc::new(
            TiktokenCounter::new(model_id, max_tokens).map_err(|e| {
                ParsingError::token_counting_error(format!(
                    "failed to load tokenizer for {model_id}: {e}"
                ))
            })?,
        );
        tracing::debug!(model = model_id, "Loaded tokenizer");

        // Another task may have raced us here; keep whichever landed first
        let entry = self.counters.entry(model_id.to_string()).or_insert(counter);
        Ok(Arc::clone(entry.value()))
    }

    /// Register a counter, replacing any existing entry for the model
    pub fn register(&self, model_id: impl Into<String>, counter: TokenCounterRef) {
        self.counters.insert(model_id.into(), counter);
    }

    /// List all registered model IDs
    pub fn list_models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.counters.iter().map(|e| e.key().clone()).collect();
        models.sort();
        models
    }
}
