//! # Trust Updater Service
//!
//! The update coordinator: a deduplicating queue drained by one background
//! worker thread.
//!
//! ## Threads
//!
//! - Any number of caller threads submit jobs and may block on a job's latch.
//! - One worker thread pops jobs in queue order and runs them one at a time,
//!   so the backend sees a strictly serialized stream of mutations.
//!
//! The queue and the lifecycle state live under one mutex; the worker sleeps
//! on a condition variable while the queue is empty.
//!
//! ## Shutdown
//!
//! `stop()` stops accepting jobs and appends the `Stop` sentinel. Jobs queued
//! before it still run (unless `drain_on_stop` is off). Whatever is left in
//! the queue when the worker exits is finished as `Abandoned`, so no waiter
//! is left blocked.

use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::UpdaterConfig;
use crate::domain::{
    CompletionLatch, DedupQueue, Disposition, IdentityId, JobOutcome, Offer, PendingJob,
    TrustScore, UpdateJob, UpdaterState,
};
use crate::error::{Result, UpdaterError};
use crate::metrics::Metrics;
use crate::ports::inbound::TrustUpdaterApi;
use crate::ports::outbound::{IdentityCache, WebOfTrustConnector};

/// Handle on a submitted job.
///
/// Coalesced submissions share the handle state of the job they attached to.
#[derive(Clone, Debug)]
pub struct JobHandle {
    disposition: Disposition,
    latch: Arc<CompletionLatch>,
}

impl JobHandle {
    /// How the submission was handled by the dedup policy.
    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    /// Blocks until the job reached a terminal state; `true` only on success.
    pub fn wait(&self) -> bool {
        self.latch.wait_success()
    }

    /// Blocks until the job reached a terminal state.
    pub fn wait_outcome(&self) -> JobOutcome {
        self.latch.wait()
    }

    /// Blocks for at most `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<JobOutcome> {
        self.latch.wait_timeout(timeout)
    }

    /// Terminal state, if already reached.
    pub fn outcome(&self) -> Option<JobOutcome> {
        self.latch.try_outcome()
    }
}

struct QueueState {
    jobs: DedupQueue,
    state: UpdaterState,
}

struct Shared {
    queue: Mutex<QueueState>,
    job_available: Condvar,
    metrics: Metrics,
}

impl Shared {
    /// Finishes jobs that will never run. Returns how many were abandoned.
    fn abandon(&self, jobs: Vec<PendingJob>) -> usize {
        let mut abandoned = 0;
        for pending in jobs.into_iter().filter(|pending| !pending.job.is_sentinel()) {
            warn!(job = %pending.job, "Abandoning queued update job");
            if pending.latch.signal(JobOutcome::Abandoned) {
                self.metrics.record_outcome(JobOutcome::Abandoned);
            }
            abandoned += 1;
        }
        abandoned
    }

    /// Undoes a `start()` whose worker never came up.
    ///
    /// Back to `Idle` unless a stop arrived in between; then the queue
    /// (sentinel included) is abandoned and the updater is `Stopped`.
    fn rollback_start(&self) -> UpdaterState {
        let remaining = {
            let mut queue = self.queue.lock();
            if queue.state == UpdaterState::Running {
                queue.state = UpdaterState::Idle;
                return UpdaterState::Idle;
            }
            queue.state = UpdaterState::Stopped;
            queue.jobs.drain()
        };
        self.abandon(remaining);
        UpdaterState::Stopped
    }
}

/// Background coordinator for web-of-trust updates.
///
/// ## Dedup policies
///
/// | Operation | Policy |
/// |-----------|--------|
/// | `set_trust`, `set_property`, `remove_property` | replace |
/// | `add_context`, `add_context_wait` | coalesce |
/// | `remove_context` | skip if present |
///
/// ## Thread Safety
///
/// All methods take `&self`; share the coordinator via `Arc`.
pub struct TrustUpdater<C, I>
where
    C: WebOfTrustConnector + 'static,
    I: IdentityCache + 'static,
{
    config: UpdaterConfig,
    connector: Arc<C>,
    identities: Arc<I>,
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<C, I> TrustUpdater<C, I>
where
    C: WebOfTrustConnector + 'static,
    I: IdentityCache + 'static,
{
    /// Creates a coordinator. The worker is not started yet.
    pub fn new(config: UpdaterConfig, connector: Arc<C>, identities: Arc<I>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, connector, identities))
    }

    /// Creates a coordinator with the default configuration.
    pub fn with_defaults(connector: Arc<C>, identities: Arc<I>) -> Self {
        Self::build(UpdaterConfig::default(), connector, identities)
    }

    fn build(config: UpdaterConfig, connector: Arc<C>, identities: Arc<I>) -> Self {
        Self {
            config,
            connector,
            identities,
            shared: Arc::new(Shared {
                queue: Mutex::new(QueueState {
                    jobs: DedupQueue::new(),
                    state: UpdaterState::Idle,
                }),
                job_available: Condvar::new(),
                metrics: Metrics::new(),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// Returns the connector.
    pub fn connector(&self) -> &Arc<C> {
        &self.connector
    }

    /// Returns the identity cache.
    pub fn identities(&self) -> &Arc<I> {
        &self.identities
    }

    /// Returns the collected metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.shared.metrics
    }

    /// Current lifecycle state.
    pub fn state(&self) -> UpdaterState {
        self.shared.queue.lock().state
    }

    /// Number of queued jobs (not counting the job in flight).
    pub fn pending_jobs(&self) -> usize {
        self.shared
            .queue
            .lock()
            .jobs
            .iter()
            .filter(|job| !job.is_sentinel())
            .count()
    }

    /// Snapshot of the queued jobs in execution order.
    pub fn queued_jobs(&self) -> Vec<UpdateJob> {
        self.shared
            .queue
            .lock()
            .jobs
            .iter()
            .filter(|job| !job.is_sentinel())
            .cloned()
            .collect()
    }

    /// Submits a job under its variant's dedup policy.
    ///
    /// The sentinel cannot be submitted this way; it and every job submitted
    /// after `stop()` come back `Rejected` and already `Abandoned`.
    pub fn submit(&self, job: UpdateJob) -> JobHandle {
        if job.is_sentinel() {
            warn!("Refusing to queue the stop sentinel as an update job");
            return self.reject(job);
        }

        let mut queue = self.shared.queue.lock();
        if !queue.state.accepts_jobs() {
            drop(queue);
            return self.reject(job);
        }
        let description = job.to_string();
        let Offer {
            disposition,
            latch,
            superseded,
        } = queue.jobs.offer(job);
        let pending = queue.jobs.len();
        drop(queue);

        if matches!(disposition, Disposition::Enqueued | Disposition::Replaced) {
            self.shared.job_available.notify_one();
        }
        if let Some(old) = superseded {
            debug!(job = %old.job, "Superseded queued update job");
            if old.latch.signal(JobOutcome::Superseded) {
                self.shared.metrics.record_outcome(JobOutcome::Superseded);
            }
        }
        self.shared.metrics.record_submission(disposition);
        debug!(job = %description, ?disposition, pending, "Submitted update job");

        JobHandle { disposition, latch }
    }

    /// Requests a stop and waits for the worker thread to exit.
    pub fn shutdown(&self) -> Result<()> {
        self.request_stop();
        self.join()
    }

    /// Waits for the worker thread to exit.
    ///
    /// Only returns once `stop()` was called (by this or another thread).
    /// Returns immediately if the worker was never started or already joined.
    pub fn join(&self) -> Result<()> {
        let handle = self.worker.lock().take();
        match handle {
            Some(handle) => handle.join().map_err(|_| UpdaterError::WorkerPanicked),
            None => Ok(()),
        }
    }

    fn reject(&self, job: UpdateJob) -> JobHandle {
        debug!(%job, "Rejecting update job, updater is shutting down");
        let latch = Arc::new(CompletionLatch::new());
        latch.signal(JobOutcome::Abandoned);
        self.shared.metrics.record_submission(Disposition::Rejected);
        self.shared.metrics.record_outcome(JobOutcome::Abandoned);
        JobHandle {
            disposition: Disposition::Rejected,
            latch,
        }
    }

    fn spawn_worker(&self) -> Result<()> {
        let mut worker = self.worker.lock();
        {
            let mut queue = self.shared.queue.lock();
            match queue.state {
                UpdaterState::Idle => queue.state = UpdaterState::Running,
                UpdaterState::Running | UpdaterState::Stopping => {
                    return Err(UpdaterError::AlreadyStarted)
                }
                UpdaterState::Stopped => return Err(UpdaterError::Terminated),
            }
        }

        let shared = Arc::clone(&self.shared);
        let connector = Arc::clone(&self.connector);
        let identities = Arc::clone(&self.identities);
        let config = self.config.clone();
        let spawned = thread::Builder::new()
            .name(self.config.worker_thread_name.clone())
            .spawn(move || run_worker(&shared, &*connector, &*identities, &config));

        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                info!(thread = %self.config.worker_thread_name, "Started web of trust updater");
                Ok(())
            }
            Err(e) => {
                self.shared.rollback_start();
                error!(error = %e, "Failed to spawn update worker");
                Err(UpdaterError::WorkerSpawn(e))
            }
        }
    }

    fn request_stop(&self) {
        let abandoned = {
            let mut queue = self.shared.queue.lock();
            match queue.state {
                UpdaterState::Running => {
                    queue.state = UpdaterState::Stopping;
                    queue.jobs.push_sentinel();
                    Vec::new()
                }
                UpdaterState::Idle => {
                    queue.state = UpdaterState::Stopped;
                    queue.jobs.drain()
                }
                UpdaterState::Stopping | UpdaterState::Stopped => {
                    debug!("Stop already requested");
                    return;
                }
            }
        };
        self.shared.job_available.notify_all();

        let abandoned = self.shared.abandon(abandoned);
        info!(abandoned, "Stopping web of trust updater");
    }

    fn set_trust_job(
        truster: &IdentityId,
        trustee: &IdentityId,
        score: Option<TrustScore>,
        comment: Option<&str>,
    ) -> UpdateJob {
        UpdateJob::SetTrust {
            truster: truster.clone(),
            trustee: trustee.clone(),
            score,
            comment: comment.map(str::to_string),
        }
    }
}

impl<C, I> TrustUpdaterApi for TrustUpdater<C, I>
where
    C: WebOfTrustConnector + 'static,
    I: IdentityCache + 'static,
{
    fn set_trust(
        &self,
        truster: &IdentityId,
        trustee: &IdentityId,
        score: Option<TrustScore>,
        comment: Option<&str>,
    ) {
        self.submit(Self::set_trust_job(truster, trustee, score, comment));
    }

    fn add_context(&self, own_identity: &IdentityId, context: &str) {
        self.submit(UpdateJob::AddContext {
            own_identity: own_identity.clone(),
            context: context.to_string(),
        });
    }

    fn add_context_wait(&self, own_identity: &IdentityId, context: &str) -> bool {
        self.submit(UpdateJob::AddContext {
            own_identity: own_identity.clone(),
            context: context.to_string(),
        })
        .wait()
    }

    fn remove_context(&self, own_identity: &IdentityId, context: &str) {
        self.submit(UpdateJob::RemoveContext {
            own_identity: own_identity.clone(),
            context: context.to_string(),
        });
    }

    fn set_property(&self, own_identity: &IdentityId, name: &str, value: Option<&str>) {
        self.submit(UpdateJob::SetProperty {
            own_identity: own_identity.clone(),
            name: name.to_string(),
            value: value.map(str::to_string),
        });
    }

    fn start(&self) -> Result<()> {
        self.spawn_worker()
    }

    fn stop(&self) {
        self.request_stop();
    }
}

impl<C, I> Drop for TrustUpdater<C, I>
where
    C: WebOfTrustConnector + 'static,
    I: IdentityCache + 'static,
{
    fn drop(&mut self) {
        // The worker holds its own Arcs; it finishes draining on its own.
        self.request_stop();
    }
}

/// Worker loop: pop, run, signal, until the sentinel (or a non-draining stop).
fn run_worker<C, I>(shared: &Shared, connector: &C, identities: &I, config: &UpdaterConfig)
where
    C: WebOfTrustConnector + ?Sized,
    I: IdentityCache + ?Sized,
{
    info!("Update worker running");

    loop {
        let next = {
            let mut queue = shared.queue.lock();
            loop {
                if queue.state == UpdaterState::Stopping && !config.drain_on_stop {
                    break None;
                }
                if let Some(pending) = queue.jobs.pop_front() {
                    break Some(pending);
                }
                shared.job_available.wait(&mut queue);
            }
        };

        let Some(pending) = next else {
            debug!("Stop requested, not draining remaining jobs");
            break;
        };
        if pending.job.is_sentinel() {
            debug!("Reached stop sentinel");
            break;
        }
        execute(shared, connector, identities, config, pending);
    }

    let remaining = {
        let mut queue = shared.queue.lock();
        queue.state = UpdaterState::Stopped;
        queue.jobs.drain()
    };
    let abandoned = shared.abandon(remaining);
    info!(abandoned, "Update worker stopped");
}

fn execute<C, I>(
    shared: &Shared,
    connector: &C,
    identities: &I,
    config: &UpdaterConfig,
    pending: PendingJob,
) where
    C: WebOfTrustConnector + ?Sized,
    I: IdentityCache + ?Sized,
{
    debug!(job = %pending.job, "Running update job");
    let started = Instant::now();
    let success = panic::catch_unwind(AssertUnwindSafe(|| pending.job.run(connector, identities)))
        .unwrap_or_else(|_| {
            error!(job = %pending.job, "Update job panicked");
            false
        });
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let outcome = JobOutcome::from_success(success);
    shared.metrics.record_run_time(elapsed_ms);
    shared.metrics.record_outcome(outcome);
    if config.is_slow(elapsed_ms) {
        warn!(job = %pending.job, elapsed_ms, "Slow update job");
    } else {
        debug!(job = %pending.job, ?outcome, elapsed_ms, "Update job finished");
    }

    pending.latch.signal(outcome);
}
