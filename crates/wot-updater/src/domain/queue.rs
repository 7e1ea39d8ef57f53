//! # Deduplicating Job Queue
//!
//! FIFO queue in which at most one job per [`JobKey`] may wait at any time.
//!
//! ## Data Structures
//!
//! - `entries`: jobs ordered by insertion sequence (front = lowest sequence)
//! - `index`: key -> sequence, O(1) membership and removal by key
//!
//! A replaced job loses its place: the replacement gets a fresh sequence
//! number and goes to the back. Coalesced and skipped submissions leave the
//! existing entry where it is.
//!
//! The queue is not synchronized; the coordinator owns it behind a mutex.

use super::job::UpdateJob;
use super::latch::CompletionLatch;
use super::value_objects::{DedupPolicy, Disposition, JobKey};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A queued job together with the latch its waiters block on.
#[derive(Debug)]
pub struct PendingJob {
    /// The job to execute.
    pub job: UpdateJob,
    /// Finished exactly once: by the worker, by a replacement, or at shutdown.
    pub latch: Arc<CompletionLatch>,
}

impl PendingJob {
    fn new(job: UpdateJob) -> Self {
        Self {
            job,
            latch: Arc::new(CompletionLatch::new()),
        }
    }
}

/// Result of offering a job to the queue.
#[derive(Debug)]
pub struct Offer {
    /// What the dedup policy did with the job.
    pub disposition: Disposition,
    /// Latch that completes when the request is done.
    pub latch: Arc<CompletionLatch>,
    /// Job removed by a `Replace`; the caller must finish its latch.
    pub superseded: Option<PendingJob>,
}

/// Key-unique FIFO queue of update jobs.
#[derive(Debug, Default)]
pub struct DedupQueue {
    next_seq: u64,
    entries: BTreeMap<u64, PendingJob>,
    index: HashMap<JobKey, u64>,
}

impl DedupQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued entries, sentinels included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a job with the given key is queued.
    pub fn contains(&self, key: &JobKey) -> bool {
        self.index.contains_key(key)
    }

    /// Queued jobs in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &UpdateJob> {
        self.entries.values().map(|pending| &pending.job)
    }

    /// Offers a job, applying its dedup policy against the queued jobs.
    ///
    /// The sentinel has no key and is always appended.
    pub fn offer(&mut self, job: UpdateJob) -> Offer {
        let (Some(key), Some(policy)) = (job.key(), job.dedup_policy()) else {
            let latch = self.append(None, PendingJob::new(job));
            return Offer {
                disposition: Disposition::Enqueued,
                latch,
                superseded: None,
            };
        };

        let existing = self.index.get(&key).and_then(|seq| {
            self.entries
                .get(seq)
                .map(|pending| (*seq, Arc::clone(&pending.latch)))
        });
        let Some((existing_seq, existing_latch)) = existing else {
            let latch = self.append(Some(key), PendingJob::new(job));
            return Offer {
                disposition: Disposition::Enqueued,
                latch,
                superseded: None,
            };
        };

        match policy {
            DedupPolicy::Replace => {
                let superseded = self.entries.remove(&existing_seq);
                let latch = self.append(Some(key), PendingJob::new(job));
                Offer {
                    disposition: Disposition::Replaced,
                    latch,
                    superseded,
                }
            }
            DedupPolicy::Coalesce => Offer {
                disposition: Disposition::Coalesced,
                latch: existing_latch,
                superseded: None,
            },
            DedupPolicy::SkipIfPresent => Offer {
                disposition: Disposition::Skipped,
                latch: existing_latch,
                superseded: None,
            },
        }
    }

    /// Appends the shutdown sentinel at the back.
    pub fn push_sentinel(&mut self) {
        self.append(None, PendingJob::new(UpdateJob::Stop));
    }

    /// Removes and returns the front job.
    pub fn pop_front(&mut self) -> Option<PendingJob> {
        let (_, pending) = self.entries.pop_first()?;
        if let Some(key) = pending.job.key() {
            self.index.remove(&key);
        }
        Some(pending)
    }

    /// Removes all queued jobs in execution order.
    pub fn drain(&mut self) -> Vec<PendingJob> {
        self.index.clear();
        std::mem::take(&mut self.entries).into_values().collect()
    }

    fn append(&mut self, key: Option<JobKey>, pending: PendingJob) -> Arc<CompletionLatch> {
        let seq = self.next_seq;
        self.next_seq += 1;
        if let Some(key) = key {
            self.index.insert(key, seq);
        }
        let latch = Arc::clone(&pending.latch);
        self.entries.insert(seq, pending);
        latch
    }
}
