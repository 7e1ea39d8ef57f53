//! # WoT Updater - Web of Trust Update Coordinator
//!
//! **Bounded Context:** Identity trust, contexts and properties
//! **Architecture Compliance:** DDD + Hexagonal
//!
//! ## Purpose
//!
//! Callers change their view of the web of trust (trust assignments, own
//! identity contexts, own identity properties). Every change needs a slow
//! round trip to an external web-of-trust backend, so the coordinator:
//! - Queues changes and runs them on one background worker thread
//! - Collapses redundant queued changes (replace, coalesce, skip)
//! - Keeps a local identity cache in step with successful remote changes
//! - Lets callers block until a particular change has completed
//!
//! ## Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Adapters (Outer)                                   │
//! │  - InMemoryIdentityCache                            │
//! │  - RecordingConnector (tests, local development)    │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Ports (Middle)                                     │
//! │  - Inbound: TrustUpdaterApi                         │
//! │  - Outbound: WebOfTrustConnector, IdentityCache     │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain (Inner - Pure Logic)                        │
//! │  - UpdateJob, DedupQueue, CompletionLatch           │
//! │  - Identity, TrustScore                             │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Queue Invariants
//!
//! 1. **Unique keys**: at most one queued job per dedup key
//! 2. **Replace moves to the back**: `A, B, A'` runs as `B, A'`
//! 3. **Single execution**: every queued job runs at most once
//! 4. **Latch fires once**: every latch is finished exactly once, even for jobs that never run
//!
//! ## Usage Example
//!
//! ```rust
//! use std::sync::Arc;
//! use wot_updater::{
//!     IdentityId, InMemoryIdentityCache, RecordingConnector, TrustUpdater, TrustUpdaterApi,
//! };
//!
//! let updater = TrustUpdater::with_defaults(
//!     Arc::new(RecordingConnector::new()),
//!     Arc::new(InMemoryIdentityCache::new()),
//! );
//! updater.start()?;
//!
//! let own = IdentityId::from("own-identity");
//! assert!(updater.add_context_wait(&own, "Sone"));
//!
//! updater.shutdown()?;
//! # Ok::<(), wot_updater::UpdaterError>(())
//! ```
//!
//! ## Module Structure
//!
//! - [`domain`]: Jobs, queue, latch and identity model
//! - [`ports`]: Hexagonal architecture interfaces (inbound/outbound)
//! - [`adapters`]: In-memory cache and recording connector
//! - [`service`]: The coordinator and its worker thread

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Cache and connector adapters
pub mod adapters;
/// Domain models and queue logic
pub mod domain;
pub mod ports;
pub mod service;

mod config;
mod error;
mod metrics;

pub use config::UpdaterConfig;
pub use error::{ConnectorError, Result, UpdaterError};
pub use metrics::Metrics;

pub use domain::{
    CompletionLatch, DedupPolicy, DedupQueue, Disposition, Identity, IdentityId, JobKey,
    JobOutcome, TrustRecord, TrustScore, UpdateJob, UpdaterState,
};

pub use ports::{IdentityCache, TrustUpdaterApi, WebOfTrustConnector};

pub use adapters::{ConnectorCall, InMemoryIdentityCache, RecordingConnector};

pub use service::{JobHandle, TrustUpdater};

/// Default name of the worker thread
pub const DEFAULT_WORKER_THREAD_NAME: &str = "wot-updater";

/// Job run time above which a warning is logged (milliseconds)
pub const DEFAULT_SLOW_JOB_THRESHOLD_MS: u64 = 5_000;
