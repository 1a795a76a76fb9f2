//! Shared test utilities for chunkwise integration tests
//!
//! Provides a persistent Tokio runtime, fast-failing configuration, and
//! sample documents whose size in words is known up front.
//!
//! ## Usage
//!
//! In your test crate's `Cargo.toml`:
//! ```toml
//! [dev-dependencies]
//! chunkwise-test-utils = { path = "../chunkwise-test-utils" }
//! ```
//!
//! In your tests:
//! ```no_run
//! #[test]
//! fn my_integration_test() {
//!     chunkwise_test_utils::get_test_runtime().block_on(async {
//!         let text = chunkwise_test_utils::sample_document(3, 10);
//!         // ... test logic ...
//!     })
//! }
//! ```

use chunkwise_config::{ApplicationConfig, ModelProfile};
use std::sync::OnceLock;

pub use chunkwise_parsing::test_utils::WordCounter;

/// Shared Tokio runtime for integration tests that cannot use `#[tokio::test]`
static TEST_RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();

/// Get the shared test runtime (creates on first call, reuses thereafter)
///
/// Workers default to the CPU count; override with `TEST_RUNTIME_WORKERS`.
///
/// # Panics
/// Panics if the runtime cannot be created
#[allow(clippy::expect_used)] // Test infrastructure - panic on init failure is acceptable
pub fn get_test_runtime() -> &'static tokio::runtime::Runtime {
    TEST_RUNTIME.get_or_init(|| {
        let workers = std::env::var("TEST_RUNTIME_WORKERS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(std::num::NonZero::get)
                    .unwrap_or(4)
            });

        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("test-runtime")
            .worker_threads(workers)
            .build()
            .expect("Failed to create test runtime")
    })
}

/// Default configuration with millisecond backoff so failing calls do not
/// slow tests down
pub fn fast_config() -> ApplicationConfig {
    let mut config = ApplicationConfig::default();
    config.retry.base_delay_ms = 1;
    config.retry.rate_limit_base_delay_ms = 2;
    config.retry.max_delay_ms = 10;
    config.retry.jitter_ratio = 0.0;
    config
}

/// Profile whose chunk budget is exactly `max_tokens_per_chunk`
///
/// The context window is large enough that the budget is never the
/// input-token limit.
///
/// # Panics
/// Panics when `max_tokens_per_chunk` is zero
#[allow(clippy::expect_used)]
pub fn tight_profile(max_tokens_per_chunk: usize) -> ModelProfile {
    let context_window = max_tokens_per_chunk.saturating_mul(10).max(1000);
    ModelProfile::new(max_tokens_per_chunk, context_window, 0, 100, 100)
        .expect("valid test profile")
}

/// Profile whose chunk budget is `max_input_tokens`, with room for combine
/// prompts well beyond it
///
/// # Panics
/// Panics when `max_input_tokens` is zero
#[allow(clippy::expect_used)]
pub fn input_budget_profile(max_input_tokens: usize) -> ModelProfile {
    let per_chunk = max_input_tokens.saturating_mul(10).max(200);
    ModelProfile::new(per_chunk, max_input_tokens.saturating_add(200), 0, 100, 100)
        .expect("valid test profile")
}

/// One paragraph of exactly `words` words, each tagged with `tag`
pub fn paragraph(tag: &str, words: usize) -> String {
    (0..words)
        .map(|i| format!("{tag}w{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `paragraphs` paragraphs of `words` words each, separated by blank lines
///
/// Paragraph `i` uses the tag `p{i}`, so chunk boundaries are easy to spot.
pub fn sample_document(paragraphs: usize, words: usize) -> String {
    (0..paragraphs)
        .map(|i| paragraph(&format!("p{i}"), words))
        .collect::<Vec<_>>()
        .join("\n\n")
}
