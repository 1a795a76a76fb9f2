//! Tiktoken-based token counter for OpenAI models

use super::traits::TokenCounter;
use anyhow::Result;
use tiktoken_rs::{CoreBPE, cl100k_base, o200k_base, p50k_base, p50k_edit, r50k_base};

/// Token counter using tiktoken for OpenAI models
pub struct TiktokenCounter {
    /// Model name for identification
    model_name: String,
    /// The tiktoken encoder
    encoder: CoreBPE,
    /// Context window of the model
    max_tokens: usize,
}

impl TiktokenCounter {
    /// Create a new tiktoken counter for the specified model
    pub fn new(model_name: &str, max_tokens: usize) -> Result<Self> {
        let encoder = Self::get_encoder_for_model(model_name)?;

        Ok(Self {
            model_name: model_name.to_string(),
            encoder,
            max_tokens,
        })
    }

    /// Get the appropriate encoder for a model name
    fn get_encoder_for_model(model_name: &str) -> Result<CoreBPE> {
        let encoder = match model_name {
            name if name.starts_with("gpt-4o") || name.starts_with("o1") => o200k_base()?,
            name if name.starts_with("gpt-4") || name.starts_with("gpt-3.5") => cl100k_base()?,
            name if name.starts_with("text-davinci") || name.starts_with("code-") => {
                p50k_base()?
            }
            name if name.contains("-edit") => p50k_edit()?,
            name if name.starts_with("davinci") || name.starts_with("curie") => r50k_base()?,
            // Unknown and self-hosted models are budgeted with cl100k
            _ => cl100k_base()?,
        };

        Ok(encoder)
    }
}

impl TokenCounter for TiktokenCounter {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    fn count(&self, text: &str) -> usize {
        self.encoder.encode_ordinary(text).len()
    }

    /// Decode the longest token prefix that is valid UTF-8 and still fits
    /// once re-encoded
    fn truncate(&self, text: &str, max_tokens: usize) -> String {
        let tokens = self.encoder.encode_ordinary(text);
        if tokens.len() <= max_tokens {
            return text.to_string();
        }

        // A prefix can end inside a multi-byte character, and re-encoding can
        // merge differently at the cut, so step back until both checks pass
        for end in (1..=max_tokens).rev() {
            let Some(Ok(prefix)) = tokens.get(..end).map(|t| self.encoder.decode(t.to_vec())) else {
                continue;
            };
            if text.starts_with(&prefix) && self.count(&prefix) <= max_tokens {
                return prefix;
            }
        }

        String::new()
    }
}
