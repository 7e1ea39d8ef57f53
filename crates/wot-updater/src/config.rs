//! Configuration types for the update coordinator

use crate::error::{Result, UpdaterError};
use serde::Deserialize;

/// Runtime configuration for the update coordinator
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Name given to the background worker thread
    pub worker_thread_name: String,

    /// Run the jobs queued before `stop()` (true) or abandon them as soon as
    /// the job in flight finishes (false)
    pub drain_on_stop: bool,

    /// Jobs running longer than this are logged at warn level (0 = never)
    pub slow_job_threshold_ms: u64,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            worker_thread_name: crate::DEFAULT_WORKER_THREAD_NAME.to_string(),
            drain_on_stop: true,
            slow_job_threshold_ms: crate::DEFAULT_SLOW_JOB_THRESHOLD_MS,
        }
    }
}

impl UpdaterConfig {
    /// Checks the configuration for values the worker cannot use.
    pub fn validate(&self) -> Result<()> {
        if self.worker_thread_name.trim().is_empty() {
            return Err(UpdaterError::InvalidConfig(
                "worker_thread_name must not be empty".to_string(),
            ));
        }
        if self.worker_thread_name.contains('\0') {
            return Err(UpdaterError::InvalidConfig(
                "worker_thread_name must not contain NUL bytes".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a job that took `elapsed_ms` should be reported as slow.
    pub fn is_slow(&self, elapsed_ms: u64) -> bool {
        self.slow_job_threshold_ms > 0 && elapsed_ms >= self.slow_job_threshold_ms
    }
}
