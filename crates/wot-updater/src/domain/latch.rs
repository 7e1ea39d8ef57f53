//! One-shot completion signal shared between a job and its waiters.

use super::value_objects::JobOutcome;
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Broadcast latch that moves from pending to finished exactly once.
///
/// Any number of threads may wait; all of them are released by the single
/// `signal`. Waiters arriving after the signal return immediately.
#[derive(Debug, Default)]
pub struct CompletionLatch {
    outcome: Mutex<Option<JobOutcome>>,
    finished: Condvar,
}

impl CompletionLatch {
    /// Creates a pending latch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Finishes the latch and wakes all waiters.
    ///
    /// Returns `false` (and changes nothing) if it was already finished.
    pub fn signal(&self, outcome: JobOutcome) -> bool {
        let mut state = self.outcome.lock();
        if state.is_some() {
            return false;
        }
        *state = Some(outcome);
        drop(state);
        self.finished.notify_all();
        true
    }

    /// Returns the outcome without blocking, if already finished.
    pub fn try_outcome(&self) -> Option<JobOutcome> {
        *self.outcome.lock()
    }

    /// Whether the latch has been signalled.
    pub fn is_finished(&self) -> bool {
        self.try_outcome().is_some()
    }

    /// Blocks until the latch is signalled.
    pub fn wait(&self) -> JobOutcome {
        let mut state = self.outcome.lock();
        loop {
            if let Some(outcome) = *state {
                return outcome;
            }
            self.finished.wait(&mut state);
        }
    }

    /// Blocks until the latch is signalled and reports whether the job
    /// succeeded.
    pub fn wait_success(&self) -> bool {
        self.wait().is_success()
    }

    /// Blocks for at most `timeout`. Returns `None` if still pending.
    ///
    /// A timeout too large to express as a deadline waits without one.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<JobOutcome> {
        let mut state = self.outcome.lock();
        if state.is_some() {
            return *state;
        }
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            drop(state);
            return Some(self.wait());
        };
        loop {
            if let Some(outcome) = *state {
                return Some(outcome);
            }
            if self.finished.wait_until(&mut state, deadline).timed_out() {
                return *state;
            }
        }
    }
}
