//! Bounded retries with class-specific exponential backoff
//!
//! Every completion call made by the summarizer and the reducer goes through
//! [`RetryExecutor::execute`]. Waits depend on the [`ErrorClass`] of the
//! failure: rate limits back off from a longer base than server faults, and
//! client faults normally fail on the spot.

use crate::{SummarizationError, SummarizationResult};
use chunkwise_config::RetryConfig;
use chunkwise_llm::{ApiError, ErrorClass};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// Backoff parameters for one job
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub rate_limit_base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound of the random extra wait, as a fraction of the wait
    pub jitter_ratio: f64,
    /// Spend every attempt on 4xx responses instead of failing fast
    pub retry_client_errors: bool,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            base_delay: config.base_delay(),
            rate_limit_base_delay: config.rate_limit_base_delay(),
            max_delay: config.max_delay(),
            jitter_ratio: config.jitter_ratio,
            retry_client_errors: config.retry_client_errors,
        }
    }

    /// Wait before retrying after 0-based `attempt` failed, without jitter
    ///
    /// `base * 2^attempt`, capped at `max_delay`.
    pub fn base_wait(&self, class: ErrorClass, attempt: u32) -> Duration {
        let base = match class {
            ErrorClass::RateLimited => self.rate_limit_base_delay,
            ErrorClass::ServerFault | ErrorClass::ClientFault | ErrorClass::Unknown => {
                self.base_delay
            }
        };

        2_u32
            .checked_pow(attempt)
            .and_then(|factor| base.checked_mul(factor))
            .map_or(self.max_delay, |wait| wait.min(self.max_delay))
    }

    /// [`Self::base_wait`] plus up to `jitter_ratio` of random extra time,
    /// still capped at `max_delay`
    pub fn wait_with_jitter(&self, class: ErrorClass, attempt: u32) -> Duration {
        let wait = self.base_wait(class, attempt);
        let jitter = rand::random::<f64>() * self.jitter_ratio;
        wait.saturating_add(wait.mul_f64(jitter)).min(self.max_delay)
    }

    /// Whether a failure of this class is worth another attempt
    pub const fn is_retryable(&self, class: ErrorClass) -> bool {
        match class {
            ErrorClass::ClientFault => self.retry_client_errors,
            ErrorClass::RateLimited | ErrorClass::ServerFault | ErrorClass::Unknown => true,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Runs an operation under a [`RetryPolicy`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub const fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds, fails terminally, or runs out of
    /// attempts
    ///
    /// Cancellation is checked before every attempt and raced against both
    /// the call and every backoff sleep. No sleep follows the final attempt.
    ///
    /// # Errors
    /// Returns `SummarizationError::Completion` with the last failure, or
    /// `SummarizationError::Cancelled`
    pub async fn execute<T, F, Fut>(
        &self,
        operation: &str,
        cancel: &CancellationToken,
        mut call: F,
    ) -> SummarizationResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(SummarizationError::Cancelled);
            }

            let err = tokio::select! {
                () = cancel.cancelled() => return Err(SummarizationError::Cancelled),
                result = call() => match result {
                    Ok(value) => return Ok(value),
                    Err(err) => err,
                },
            };

            let class = err.class();
            if !self.policy.is_retryable(class) {
                error!(operation, %class, "Unrecoverable client error: {err}");
                return Err(err.into());
            }

            attempt += 1;
            if attempt >= max_attempts {
                error!(operation, %class, "Failed after {max_attempts} attempts: {err}");
                return Err(err.into());
            }

            let wait = self.policy.wait_with_jitter(class, attempt - 1);
            warn!(
                operation,
                %class,
                attempt,
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                "Attempt failed, retrying: {err}"
            );
            metrics::counter!("chunkwise_completion_retries_total", "class" => class.as_str())
                .increment(1);

            tokio::select! {
                () = cancel.cancelled() => return Err(SummarizationError::Cancelled),
                () = tokio::time::sleep(wait) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            rate_limit_base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            jitter_ratio: 0.1,
            retry_client_errors: false,
        }
    }

    #[test]
    fn test_rate_limit_backoff_doubles_from_longer_base() {
        let policy = policy();
        for attempt in 0..5 {
            let rate_limited = policy.base_wait(ErrorClass::RateLimited, attempt);
            let unknown = policy.base_wait(ErrorClass::Unknown, attempt);
            assert_eq!(rate_limited, Duration::from_secs(2 * 2_u64.pow(attempt)));
            assert_eq!(unknown, Duration::from_secs(2_u64.pow(attempt)));
            assert!(rate_limited > unknown);
        }
        assert_eq!(
            policy.base_wait(ErrorClass::ServerFault, 2),
            Duration::from_secs(4)
        );
    }

    #[test]
    fn test_waits_are_capped() {
        let policy = policy();
        assert_eq!(
            policy.base_wait(ErrorClass::RateLimited, 10),
            Duration::from_secs(60)
        );
        assert_eq!(
            policy.base_wait(ErrorClass::Unknown, 40),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_jitter_stays_within_ratio() {
        let policy = policy();
        for _ in 0..100 {
            let wait = policy.wait_with_jitter(ErrorClass::Unknown, 1);
            assert!(wait >= Duration::from_secs(2));
            assert!(wait <= Duration::from_millis(2200));
        }
    }

    #[test]
    fn test_jittered_wait_never_exceeds_cap() {
        let policy = RetryPolicy::default();
        for attempt in [6, 10, 40] {
            for _ in 0..200 {
                let wait = policy.wait_with_jitter(ErrorClass::RateLimited, attempt);
                assert!(wait <= policy.max_delay, "{wait:?} at attempt {attempt}");
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let executor = RetryExecutor::new(policy());
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let started = Instant::now();

        let result = executor
            .execute("test", &CancellationToken::new(), move || async move {
                match counter.fetch_add(1, Ordering::SeqCst) {
                    0 => Err(ApiError::http(429, "slow down")),
                    1 => Err(ApiError::http(502, "bad gateway")),
                    _ => Ok("done"),
                }
            })
            .await;

        assert_eq!(result.ok(), Some("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        // 2s for the rate limit at attempt 0, then 2s for the server fault at attempt 1
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(4), "{elapsed:?}");
        assert!(elapsed <= Duration::from_millis(4400), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_sleep_after_final_attempt() {
        let executor = RetryExecutor::new(policy());
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let started = Instant::now();

        let result: SummarizationResult<()> = executor
            .execute("test", &CancellationToken::new(), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::without_status("connection reset"))
            })
            .await;

        assert!(matches!(
            result,
            Err(SummarizationError::Completion(ApiError { status_code: None, .. }))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Waits of 1s and 2s only, never the 4s that a third sleep would add
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_errors_fail_fast_by_default() {
        let executor = RetryExecutor::new(policy());
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: SummarizationResult<()> = executor
            .execute("test", &CancellationToken::new(), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::http(400, "context length exceeded"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_errors_can_spend_all_attempts() {
        let executor = RetryExecutor::new(RetryPolicy {
            retry_client_errors: true,
            ..policy()
        });
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: SummarizationResult<()> = executor
            .execute("test", &CancellationToken::new(), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::http(404, "model not found"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_backoff() {
        let executor = RetryExecutor::new(policy());
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                cancel.cancel();
            })
        };

        let result: SummarizationResult<()> = executor
            .execute("test", &cancel, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::http(429, "slow down"))
            })
            .await;

        canceller.await.expect("canceller task");
        assert!(matches!(result, Err(SummarizationError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_slow_call() {
        let executor = RetryExecutor::new(policy());
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                cancel.cancel();
            })
        };

        let started = Instant::now();
        let result: SummarizationResult<()> = executor
            .execute("test", &cancel, || async {
                tokio::time::sleep(Duration::from_secs(300)).await;
                Ok(())
            })
            .await;

        canceller.await.expect("canceller task");
        assert!(matches!(result, Err(SummarizationError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_cancelled_token_skips_the_call() {
        let executor = RetryExecutor::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: SummarizationResult<()> = executor
            .execute("test", &cancel, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::without_status("unreachable"))
            })
            .await;
        assert!(matches!(result, Err(SummarizationError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
