//! Job-scoped progress tracking
//!
//! A [`ProgressTracker`] is created per job and shared behind an `Arc`: the
//! pipeline writes to it and pollers read [`ProgressState`] snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockWriteGuard};
use uuid::Uuid;

/// Lifecycle of a summarization job
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    /// Completed and Error are final
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "error" => Ok(Self::Error),
            _ => Err(format!("Invalid job status: {s}")),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Point-in-time view of a job
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressState {
    pub job_id: Uuid,
    pub status: JobStatus,
    /// Percentage of chunks attempted, 0 to 100
    pub progress: u8,
    pub total_chunks: usize,
    pub processed_chunks: usize,
    /// 1-based position of the most recently attempted chunk
    pub current_chunk: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutable progress record for one job
///
/// Mutations after the job reached a terminal status are ignored.
#[derive(Debug)]
pub struct ProgressTracker {
    state: RwLock<ProgressState>,
    attempted: AtomicUsize,
}

impl ProgressTracker {
    pub fn new(job_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            state: RwLock::new(ProgressState {
                job_id,
                status: JobStatus::Pending,
                progress: 0,
                total_chunks: 0,
                processed_chunks: 0,
                current_chunk: 0,
                error: None,
                created_at: now,
                updated_at: now,
            }),
            attempted: AtomicUsize::new(0),
        }
    }

    pub fn job_id(&self) -> Uuid {
        self.read().job_id
    }

    /// Pending -> Processing
    pub fn start(&self) {
        self.mutate("start", |state| state.status = JobStatus::Processing);
    }

    pub fn set_total_chunks(&self, total_chunks: usize) {
        self.mutate("set_total_chunks", |state| state.total_chunks = total_chunks);
    }

    /// Record that `current` of `total` chunks have been attempted
    ///
    /// Progress never moves backwards, so late updates from concurrent
    /// chunks cannot undo newer ones.
    pub fn update(&self, current: usize, total: usize) {
        self.mutate("update", |state| {
            let percent = if total == 0 {
                100
            } else {
                current.saturating_mul(100) / total
            };
            let percent = u8::try_from(percent.min(100)).unwrap_or(100);

            state.status = JobStatus::Processing;
            state.total_chunks = total;
            if percent >= state.progress && current >= state.processed_chunks {
                state.progress = percent;
                state.processed_chunks = current;
                state.current_chunk = current;
            }
        });
    }

    /// Count one more attempted chunk and update progress from the running
    /// total; safe to call from concurrently completing chunks
    pub fn record_chunk_attempt(&self, total: usize) -> usize {
        let attempted = self.attempted.fetch_add(1, Ordering::SeqCst) + 1;
        self.update(attempted, total);
        attempted
    }

    pub fn complete(&self) {
        self.mutate("complete", |state| {
            state.status = JobStatus::Completed;
            state.progress = 100;
        });
    }

    /// Error status keeps the last progress so pollers can see how far the
    /// job got
    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.mutate("set_error", |state| {
            state.status = JobStatus::Error;
            state.error = Some(message);
        });
    }

    /// Consistent snapshot of the current state
    pub fn get_status(&self) -> ProgressState {
        self.read().clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, ProgressState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ProgressState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate(&self, operation: &str, apply: impl FnOnce(&mut ProgressState)) {
        let mut state = self.write();
        if state.status.is_terminal() {
            tracing::warn!(
                job_id = %state.job_id,
                status = %state.status,
                "Ignoring {operation} on finished job"
            );
            return;
        }
        apply(&mut state);
        state.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_new_tracker_is_pending() {
        let tracker = ProgressTracker::new(Uuid::new_v4());
        let state = tracker.get_status();
        assert_eq!(state.status, JobStatus::Pending);
        assert_eq!(state.progress, 0);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_update_computes_floor_percentage() {
        let tracker = ProgressTracker::new(Uuid::new_v4());
        tracker.start();
        tracker.update(1, 3);
        assert_eq!(tracker.get_status().progress, 33);
        tracker.update(2, 3);
        let state = tracker.get_status();
        assert_eq!(state.progress, 66);
        assert_eq!(state.current_chunk, 2);
        assert_eq!(state.status, JobStatus::Processing);
    }

    #[test]
    fn test_progress_never_decreases() {
        let tracker = ProgressTracker::new(Uuid::new_v4());
        tracker.update(3, 4);
        tracker.update(1, 4);
        let state = tracker.get_status();
        assert_eq!(state.progress, 75);
        assert_eq!(state.processed_chunks, 3);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let tracker = ProgressTracker::new(Uuid::new_v4());
        tracker.update(1, 2);
        tracker.set_error("provider unreachable");
        tracker.complete();
        tracker.update(2, 2);

        let state = tracker.get_status();
        assert_eq!(state.status, JobStatus::Error);
        assert_eq!(state.progress, 50);
        assert_eq!(state.error.as_deref(), Some("provider unreachable"));
    }

    #[test]
    fn test_complete_sets_full_progress() {
        let tracker = ProgressTracker::new(Uuid::new_v4());
        tracker.start();
        tracker.update(1, 3);
        tracker.complete();
        let state = tracker.get_status();
        assert_eq!(state.status, JobStatus::Completed);
        assert_eq!(state.progress, 100);
    }

    #[test]
    fn test_concurrent_attempts_are_all_counted() {
        let tracker = Arc::new(ProgressTracker::new(Uuid::new_v4()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        tracker.record_chunk_attempt(200);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread");
        }

        let state = tracker.get_status();
        assert_eq!(state.processed_chunks, 200);
        assert_eq!(state.progress, 100);
    }

    #[test]
    fn test_status_round_trips_through_strings() {
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Error,
        ] {
            assert_eq!(status.to_string().parse::<JobStatus>(), Ok(status));
        }
        assert!("running".parse::<JobStatus>().is_err());
        assert_eq!(
            serde_json::to_value(JobStatus::Error).expect("serialize"),
            serde_json::json!("error")
        );
    }
}
