//! Metrics collection for the update coordinator

use crate::domain::{Disposition, JobOutcome};
use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for the update coordinator
#[derive(Debug, Default)]
pub struct Metrics {
    /// Submissions appended without a collision
    pub jobs_enqueued: AtomicU64,

    /// Submissions that replaced a queued job
    pub jobs_replaced: AtomicU64,

    /// Submissions attached to a queued job
    pub jobs_coalesced: AtomicU64,

    /// Submissions dropped because an equal job was queued
    pub jobs_skipped: AtomicU64,

    /// Submissions rejected during shutdown
    pub jobs_rejected: AtomicU64,

    /// Jobs that ran and succeeded
    pub jobs_succeeded: AtomicU64,

    /// Jobs that ran and failed
    pub jobs_failed: AtomicU64,

    /// Jobs removed from the queue by a replacement
    pub jobs_superseded: AtomicU64,

    /// Jobs dropped at shutdown without running
    pub jobs_abandoned: AtomicU64,

    /// Total job run time (milliseconds)
    pub run_time_ms: AtomicU64,

    /// Longest single job run time (milliseconds)
    pub max_run_time_ms: AtomicU64,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record how a submission was handled
    pub fn record_submission(&self, disposition: Disposition) {
        let counter = match disposition {
            Disposition::Enqueued => &self.jobs_enqueued,
            Disposition::Replaced => &self.jobs_replaced,
            Disposition::Coalesced => &self.jobs_coalesced,
            Disposition::Skipped => &self.jobs_skipped,
            Disposition::Rejected => &self.jobs_rejected,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a job reaching its terminal state
    pub fn record_outcome(&self, outcome: JobOutcome) {
        let counter = match outcome {
            JobOutcome::Succeeded => &self.jobs_succeeded,
            JobOutcome::Failed => &self.jobs_failed,
            JobOutcome::Superseded => &self.jobs_superseded,
            JobOutcome::Abandoned => &self.jobs_abandoned,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the run time of one executed job
    pub fn record_run_time(&self, duration_ms: u64) {
        self.run_time_ms.fetch_add(duration_ms, Ordering::Relaxed);
        self.max_run_time_ms
            .fetch_max(duration_ms, Ordering::Relaxed);
    }

    /// Get number of jobs that actually ran
    pub fn get_jobs_executed(&self) -> u64 {
        self.jobs_succeeded.load(Ordering::Relaxed) + self.jobs_failed.load(Ordering::Relaxed)
    }

    /// Get number of jobs that succeeded
    pub fn get_jobs_succeeded(&self) -> u64 {
        self.jobs_succeeded.load(Ordering::Relaxed)
    }

    /// Get number of jobs that failed
    pub fn get_jobs_failed(&self) -> u64 {
        self.jobs_failed.load(Ordering::Relaxed)
    }

    /// Get number of superseded jobs
    pub fn get_jobs_superseded(&self) -> u64 {
        self.jobs_superseded.load(Ordering::Relaxed)
    }

    /// Get number of abandoned jobs
    pub fn get_jobs_abandoned(&self) -> u64 {
        self.jobs_abandoned.load(Ordering::Relaxed)
    }

    /// Get number of submissions that did not add a job (coalesced + skipped)
    pub fn get_jobs_deduplicated(&self) -> u64 {
        self.jobs_coalesced.load(Ordering::Relaxed) + self.jobs_skipped.load(Ordering::Relaxed)
    }

    /// Get average run time of executed jobs (milliseconds)
    pub fn get_avg_run_time(&self) -> f64 {
        let executed = self.get_jobs_executed();
        if executed == 0 {
            return 0.0;
        }
        let time = self.run_time_ms.load(Ordering::Relaxed);
        time as f64 / executed as f64
    }
}
