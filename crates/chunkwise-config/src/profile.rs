//! Per-model token limits
//!
//! A [`ModelProfile`] says how much text a single completion call can take
//! for a given model. Profiles are immutable and come either from the
//! built-in registry ([`ModelProfile::for_model`]) or from the validated
//! constructor.

use crate::{ConfigError, ConfigResult};
use serde::Serialize;

/// Model used when a request names no model or an unknown one
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Token limits for one target model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelProfile {
    max_tokens_per_chunk: usize,
    context_window: usize,
    chunk_overlap: usize,
    target_summary_tokens: usize,
    overhead_tokens: usize,
}

const GPT_35_TURBO: ModelProfile = ModelProfile {
    max_tokens_per_chunk: 3000,
    context_window: 4000,
    chunk_overlap: 100,
    target_summary_tokens: 800,
    overhead_tokens: 100,
};

const GPT_35_TURBO_16K: ModelProfile = ModelProfile {
    max_tokens_per_chunk: 8000,
    context_window: 16000,
    chunk_overlap: 200,
    target_summary_tokens: 1000,
    overhead_tokens: 100,
};

const GPT_4: ModelProfile = ModelProfile {
    max_tokens_per_chunk: 4000,
    context_window: 8000,
    chunk_overlap: 200,
    target_summary_tokens: 1000,
    overhead_tokens: 100,
};

const GPT_4_TURBO: ModelProfile = ModelProfile {
    max_tokens_per_chunk: 8000,
    context_window: 128_000,
    chunk_overlap: 200,
    target_summary_tokens: 1200,
    overhead_tokens: 100,
};

/// Built-in registry, default entry first
const REGISTRY: &[(&str, ModelProfile)] = &[
    (DEFAULT_MODEL, GPT_35_TURBO),
    ("gpt-3.5-turbo-16k", GPT_35_TURBO_16K),
    ("gpt-4", GPT_4),
    ("gpt-4-turbo", GPT_4_TURBO),
];

impl ModelProfile {
    /// Create a profile, rejecting limits that leave no input budget
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidModelProfile` when
    /// `context_window - target_summary_tokens - overhead_tokens` is not
    /// positive, or when `max_tokens_per_chunk` is zero
    pub fn new(
        max_tokens_per_chunk: usize,
        context_window: usize,
        chunk_overlap: usize,
        target_summary_tokens: usize,
        overhead_tokens: usize,
    ) -> ConfigResult<Self> {
        let reserved = target_summary_tokens.saturating_add(overhead_tokens);
        if context_window <= reserved {
            return Err(ConfigError::InvalidModelProfile {
                reason: format!(
                    "context window {context_window} leaves no input tokens after reserving \
                     {target_summary_tokens} summary and {overhead_tokens} overhead tokens"
                ),
            });
        }
        if max_tokens_per_chunk == 0 {
            return Err(ConfigError::InvalidModelProfile {
                reason: "max_tokens_per_chunk must be positive".to_string(),
            });
        }

        Ok(Self {
            max_tokens_per_chunk,
            context_window,
            chunk_overlap,
            target_summary_tokens,
            overhead_tokens,
        })
    }

    /// Look up a built-in profile, falling back to [`DEFAULT_MODEL`]
    ///
    /// Returns the model name the profile was resolved to alongside it.
    pub fn for_model(model_name: &str) -> (&'static str, Self) {
        let wanted = model_name.trim();
        REGISTRY
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .copied()
            .unwrap_or_else(|| {
                tracing::debug!("Unknown model '{wanted}', using {DEFAULT_MODEL} profile");
                (DEFAULT_MODEL, GPT_35_TURBO)
            })
    }

    /// Whether the registry has an entry for `model_name`
    pub fn is_known(model_name: &str) -> bool {
        REGISTRY
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(model_name.trim()))
    }

    /// All built-in profiles in registry order
    pub fn known_models() -> impl Iterator<Item = (&'static str, Self)> {
        REGISTRY.iter().copied()
    }

    pub const fn max_tokens_per_chunk(&self) -> usize {
        self.max_tokens_per_chunk
    }

    pub const fn context_window(&self) -> usize {
        self.context_window
    }

    pub const fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub const fn target_summary_tokens(&self) -> usize {
        self.target_summary_tokens
    }

    pub const fn overhead_tokens(&self) -> usize {
        self.overhead_tokens
    }

    /// Tokens left for input once the summary and fixed overhead are reserved
    pub const fn max_input_tokens(&self) -> usize {
        self.context_window
            .saturating_sub(self.target_summary_tokens)
            .saturating_sub(self.overhead_tokens)
    }

    /// Largest chunk a single summarize request may carry
    pub fn chunk_budget(&self) -> usize {
        self.max_input_tokens().min(self.max_tokens_per_chunk)
    }
}

impl Default for ModelProfile {
    fn default() -> Self {
        GPT_35_TURBO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_budget() {
        let profile = ModelProfile::default();
        assert_eq!(profile.max_input_tokens(), 3100);
        assert_eq!(profile.chunk_budget(), 3000);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let (name, profile) = ModelProfile::for_model("GPT-4");
        assert_eq!(name, "gpt-4");
        assert_eq!(profile.context_window(), 8000);
        assert_eq!(profile.max_input_tokens(), 6900);
    }

    #[test]
    fn test_unknown_model_falls_back_to_default() {
        let (name, profile) = ModelProfile::for_model("llama3.1-8b");
        assert_eq!(name, DEFAULT_MODEL);
        assert_eq!(profile, ModelProfile::default());
        assert!(!ModelProfile::is_known("llama3.1-8b"));
    }

    #[test]
    fn test_every_builtin_profile_passes_validation() {
        for (name, p) in ModelProfile::known_models() {
            let rebuilt = ModelProfile::new(
                p.max_tokens_per_chunk(),
                p.context_window(),
                p.chunk_overlap(),
                p.target_summary_tokens(),
                p.overhead_tokens(),
            );
            assert!(rebuilt.is_ok(), "built-in profile {name} should validate");
        }
    }

    #[test]
    fn test_constructor_rejects_non_positive_input_budget() {
        let exact = ModelProfile::new(1000, 1100, 0, 1000, 100);
        assert!(matches!(
            exact,
            Err(ConfigError::InvalidModelProfile { .. })
        ));

        let overflow = ModelProfile::new(1000, 500, 0, 1000, 100);
        assert!(overflow.is_err());

        let tiny = ModelProfile::new(10, 1101, 0, 1000, 100);
        assert_eq!(tiny.map(|p| p.max_input_tokens()).ok(), Some(1));
    }

    #[test]
    fn test_constructor_rejects_zero_chunk_size() {
        assert!(ModelProfile::new(0, 4000, 0, 800, 100).is_err());
    }

    #[test]
    fn test_chunk_budget_takes_smaller_limit() {
        let (_, turbo) = ModelProfile::for_model("gpt-4-turbo");
        assert_eq!(turbo.chunk_budget(), 8000);

        let narrow = ModelProfile::new(5000, 4000, 0, 800, 100);
        assert_eq!(narrow.map(|p| p.chunk_budget()).ok(), Some(3100));
    }
}
