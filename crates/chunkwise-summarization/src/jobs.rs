//! In-memory registry of background jobs

use crate::pipeline::SummaryResult;
use crate::progress::{ProgressState, ProgressTracker};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Finished jobs kept when no retention is configured
pub const DEFAULT_MAX_FINISHED_JOBS: usize = 1000;

struct JobEntry {
    tracker: Arc<ProgressTracker>,
    cancel: CancellationToken,
    result: Option<SummaryResult>,
    /// Order in which the job's result was stored
    finished_seq: Option<u64>,
}

/// Tracks background jobs started by this process, keyed by job id
///
/// Running jobs stay until they finish. Of the finished ones only the
/// `max_finished` most recent are kept; older ones are evicted as new
/// results arrive.
pub struct JobRegistry {
    jobs: DashMap<Uuid, JobEntry>,
    max_finished: usize,
    finished: AtomicU64,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::with_retention(DEFAULT_MAX_FINISHED_JOBS)
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry keeping at most `max_finished` finished jobs (at least one)
    pub fn with_retention(max_finished: usize) -> Self {
        Self {
            jobs: DashMap::new(),
            max_finished: max_finished.max(1),
            finished: AtomicU64::new(0),
        }
    }

    /// Register a new pending job and hand back what the worker needs
    pub fn create(&self) -> (Uuid, Arc<ProgressTracker>, CancellationToken) {
        let job_id = Uuid::new_v4();
        let tracker = Arc::new(ProgressTracker::new(job_id));
        let cancel = CancellationToken::new();
        self.jobs.insert(
            job_id,
            JobEntry {
                tracker: Arc::clone(&tracker),
                cancel: cancel.clone(),
                result: None,
                finished_seq: None,
            },
        );
        tracing::debug!(%job_id, "Registered job");
        (job_id, tracker, cancel)
    }

    pub fn get(&self, job_id: &Uuid) -> Option<ProgressState> {
        self.jobs.get(job_id).map(|entry| entry.tracker.get_status())
    }

    /// Snapshots of all jobs, oldest first
    pub fn list(&self) -> Vec<ProgressState> {
        let mut states: Vec<_> = self
            .jobs
            .iter()
            .map(|entry| entry.tracker.get_status())
            .collect();
        states.sort_by_key(|state| state.created_at);
        states
    }

    /// Request cancellation; false when the job is unknown or already
    /// finished
    pub fn cancel(&self, job_id: &Uuid) -> bool {
        let Some(entry) = self.jobs.get(job_id) else {
            return false;
        };
        if entry.tracker.get_status().status.is_terminal() {
            return false;
        }
        entry.cancel.cancel();
        tracing::info!(%job_id, "Cancellation requested");
        true
    }

    /// Attach the final result and evict the oldest finished jobs beyond
    /// the retention limit
    pub fn store_result(&self, job_id: &Uuid, result: SummaryResult) {
        let Some(mut entry) = self.jobs.get_mut(job_id) else {
            return;
        };
        entry.result = Some(result);
        entry.finished_seq = Some(self.finished.fetch_add(1, Ordering::SeqCst));
        drop(entry);

        self.evict_finished();
    }

    fn evict_finished(&self) {
        let mut finished: Vec<(u64, Uuid)> = self
            .jobs
            .iter()
            .filter_map(|entry| entry.finished_seq.map(|seq| (seq, *entry.key())))
            .collect();
        if finished.len() <= self.max_finished {
            return;
        }

        finished.sort_unstable();
        let excess = finished.len() - self.max_finished;
        for (_, job_id) in finished.into_iter().take(excess) {
            self.jobs.remove(&job_id);
            tracing::debug!(%job_id, "Evicted finished job");
        }
    }

    pub fn result(&self, job_id: &Uuid) -> Option<SummaryResult> {
        self.jobs.get(job_id).and_then(|entry| entry.result.clone())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::JobStatus;

    #[test]
    fn test_created_job_is_pending() {
        let registry = JobRegistry::new();
        let (job_id, _tracker, _cancel) = registry.create();

        let state = registry.get(&job_id).expect("job registered");
        assert_eq!(state.status, JobStatus::Pending);
        assert_eq!(state.job_id, job_id);
        assert!(registry.get(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_tracker_updates_are_visible() {
        let registry = JobRegistry::new();
        let (job_id, tracker, _cancel) = registry.create();
        tracker.start();
        tracker.update(1, 4);

        let state = registry.get(&job_id).expect("job registered");
        assert_eq!(state.status, JobStatus::Processing);
        assert_eq!(state.progress, 25);
    }

    #[test]
    fn test_cancel_fires_token_for_running_job() {
        let registry = JobRegistry::new();
        let (job_id, tracker, cancel) = registry.create();
        tracker.start();

        assert!(registry.cancel(&job_id));
        assert!(cancel.is_cancelled());
        assert!(!registry.cancel(&Uuid::new_v4()));
    }

    #[test]
    fn test_cancel_ignores_finished_job() {
        let registry = JobRegistry::new();
        let (job_id, tracker, cancel) = registry.create();
        tracker.complete();

        assert!(!registry.cancel(&job_id));
        assert!(!cancel.is_cancelled());
    }

    fn finished_result() -> SummaryResult {
        SummaryResult {
            status: JobStatus::Completed,
            summary: Some("done".to_string()),
            error: None,
            progress: 100,
            total_chunks: 1,
            successful_chunks: 1,
            failed_chunks: 0,
            model: "test-model".to_string(),
        }
    }

    #[test]
    fn test_finished_jobs_are_bounded() {
        let registry = JobRegistry::with_retention(2);
        let (running, _tracker, _cancel) = registry.create();

        let finished: Vec<Uuid> = (0..5)
            .map(|_| {
                let (job_id, tracker, _cancel) = registry.create();
                tracker.complete();
                registry.store_result(&job_id, finished_result());
                job_id
            })
            .collect();

        assert_eq!(registry.len(), 3);
        assert!(registry.get(&running).is_some());
        for evicted in &finished[..3] {
            assert!(registry.get(evicted).is_none());
            assert!(registry.result(evicted).is_none());
        }
        for kept in &finished[3..] {
            assert!(registry.result(kept).is_some());
        }
    }

    #[test]
    fn test_list_is_oldest_first() {
        let registry = JobRegistry::new();
        let ids: Vec<_> = (0..3).map(|_| registry.create().0).collect();

        let listed: Vec<_> = registry.list().into_iter().map(|s| s.job_id).collect();
        assert_eq!(listed.len(), 3);
        assert_eq!(registry.len(), 3);
        for id in ids {
            assert!(listed.contains(&id));
        }
    }
}
