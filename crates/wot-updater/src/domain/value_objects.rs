//! Value objects for the update coordinator.
//!
//! Small immutable types shared between the job, the queue and the service.

use super::entities::IdentityId;
use crate::error::UpdaterError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A trust score in the closed range [-100, 100].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct TrustScore(i8);

impl TrustScore {
    /// Lowest accepted score.
    pub const MIN: i32 = -100;
    /// Highest accepted score.
    pub const MAX: i32 = 100;

    /// Creates a score, rejecting values outside [-100, 100].
    pub fn new(value: i32) -> Result<Self, UpdaterError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            // In range, so the narrowing cannot truncate.
            Ok(Self(value as i8))
        } else {
            Err(UpdaterError::InvalidTrustScore(value))
        }
    }

    /// Returns the score as an integer.
    pub fn value(self) -> i32 {
        i32::from(self.0)
    }
}

impl TryFrom<i32> for TrustScore {
    type Error = UpdaterError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TrustScore> for i32 {
    fn from(score: TrustScore) -> Self {
        score.value()
    }
}

impl fmt::Display for TrustScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies "the same logical operation" for deduplication.
///
/// Built from the job variant and its identity-bearing fields only; value
/// fields (score, comment, property value) never take part, so two jobs
/// differing only in value collide.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum JobKey {
    /// Trust between truster and trustee.
    Trust {
        /// Identity assigning the trust
        truster: IdentityId,
        /// Identity receiving the trust
        trustee: IdentityId,
    },
    /// Adding a context to an own identity.
    AddContext {
        /// Own identity the context belongs to
        own_identity: IdentityId,
        /// Context name
        context: String,
    },
    /// Removing a context from an own identity.
    RemoveContext {
        /// Own identity the context belongs to
        own_identity: IdentityId,
        /// Context name
        context: String,
    },
    /// Setting or removing a property on an own identity.
    Property {
        /// Own identity the property belongs to
        own_identity: IdentityId,
        /// Property name
        name: String,
    },
}

/// What to do when a job arrives whose key is already queued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Drop the queued job and append the new one at the back.
    Replace,
    /// Keep the queued job; the new request shares its completion.
    Coalesce,
    /// Keep the queued job; the new request is dropped.
    SkipIfPresent,
}

/// How a submission was handled by the queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// No job with the same key was queued; appended at the back.
    Enqueued,
    /// An older job with the same key was superseded; appended at the back.
    Replaced,
    /// Attached to an already queued job with the same key.
    Coalesced,
    /// An equal job was already queued; nothing was added.
    Skipped,
    /// The coordinator is shutting down; the job will never run.
    Rejected,
}

/// Terminal state of a job's completion latch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job ran and the backend accepted it.
    Succeeded,
    /// The job ran and the backend reported a fault.
    Failed,
    /// The job was removed from the queue by a newer job with the same key.
    Superseded,
    /// The job was dropped at shutdown without running.
    Abandoned,
}

impl JobOutcome {
    /// The boolean success flag delivered to waiting callers.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Whether the job actually ran.
    pub fn ran(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Maps a run result onto an outcome.
    pub fn from_success(success: bool) -> Self {
        if success {
            Self::Succeeded
        } else {
            Self::Failed
        }
    }
}

/// Lifecycle of the coordinator's background worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdaterState {
    /// Created, worker not yet started. Submissions are queued.
    Idle,
    /// Worker is running.
    Running,
    /// Stop requested; worker is draining up to the sentinel.
    Stopping,
    /// Worker has exited (or was never started and the queue was abandoned).
    Stopped,
}

impl UpdaterState {
    /// Whether new submissions are still accepted.
    pub fn accepts_jobs(self) -> bool {
        matches!(self, Self::Idle | Self::Running)
    }
}
