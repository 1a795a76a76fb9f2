//! Core traits for token counting

use std::sync::Arc;

/// Trait for counting tokens in text
///
/// Implementations must be thread-safe; one counter is shared by every chunk
/// of a job.
pub trait TokenCounter: Send + Sync {
    /// Get the name/identifier of this counter
    fn name(&self) -> &str;

    /// Maximum number of tokens this model can handle
    fn max_tokens(&self) -> usize;

    /// Count tokens in the given text
    ///
    /// This should be fast and deterministic for the same input
    fn count(&self, text: &str) -> usize;

    /// Longest prefix of `text` that counts to at most `max_tokens`
    ///
    /// Text that already fits is returned unchanged, which makes truncation
    /// idempotent. The default searches over char boundaries; encoders that
    /// can decode token prefixes should override it.
    fn truncate(&self, text: &str, max_tokens: usize) -> String {
        if self.count(text) <= max_tokens {
            return text.to_string();
        }

        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();

        let prefix = |i: usize| boundaries.get(i).and_then(|&end| text.get(..end)).unwrap_or("");

        // prefix(lo) always fits (the empty prefix), prefix(hi) never does
        let (mut lo, mut hi) = (0, boundaries.len().saturating_sub(1));
        while hi.saturating_sub(lo) > 1 {
            let mid = lo + (hi - lo) / 2;
            if self.count(prefix(mid)) <= max_tokens {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        prefix(lo).to_string()
    }
}

/// Type alias for shared token counter
pub type TokenCounterRef = Arc<dyn TokenCounter>;
