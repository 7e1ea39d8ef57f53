//! Domain layer for the update coordinator.
//!
//! Pure logic with no threads of its own: identity entities, the job type,
//! the completion latch and the deduplicating queue.

pub mod entities;
pub mod job;
pub mod latch;
pub mod queue;
pub mod value_objects;

pub use entities::{Identity, IdentityId, TrustRecord};
pub use job::UpdateJob;
pub use latch::CompletionLatch;
pub use queue::{DedupQueue, Offer, PendingJob};
pub use value_objects::{DedupPolicy, Disposition, JobKey, JobOutcome, TrustScore, UpdaterState};
