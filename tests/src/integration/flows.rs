//! # Integration Test Flows
//!
//! Drives the coordinator through its public API with a real worker thread
//! and checks what the backend and the local cache observe.
//!
//! ## Flows Tested:
//!
//! 1. **Replace**: repeated `set_trust` / `set_property` on one key runs only the last value
//! 2. **Coalesce**: concurrent `add_context_wait` callers share one backend call and one result
//! 3. **Skip**: a repeated `remove_context` is dropped while the first is queued
//! 4. **Ordering**: distinct keys run in submission order
//! 5. **Local/remote consistency**: trust is cached before the remote call; contexts
//!    and properties only after a successful one

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use wot_updater::{
        ConnectorCall, Disposition, Identity, InMemoryIdentityCache, JobOutcome, TrustRecord,
        TrustUpdaterApi, UpdateJob, UpdaterConfig,
    };

    use crate::support::{eventually, id, score, trust_snapshot_connector, Harness, WAIT};

    fn set_trust_job(truster: &str, trustee: &str, value: i32) -> UpdateJob {
        UpdateJob::SetTrust {
            truster: id(truster),
            trustee: id(trustee),
            score: Some(score(value)),
            comment: None,
        }
    }

    fn set_property_job(name: &str, value: &str) -> UpdateJob {
        UpdateJob::SetProperty {
            own_identity: id("alice"),
            name: name.to_string(),
            value: Some(value.to_string()),
        }
    }

    // =============================================================================
    // REPLACE
    // =============================================================================

    #[test]
    fn test_only_last_set_trust_runs() {
        let harness = Harness::new();
        harness.park();

        let handles: Vec<_> = [10, 20, 30]
            .into_iter()
            .map(|value| harness.updater.submit(set_trust_job("alice", "bob", value)))
            .collect();

        harness.release();
        harness.updater.shutdown().unwrap();

        assert_eq!(
            harness.backend_calls(),
            vec![ConnectorCall::SetTrust {
                truster: id("alice"),
                trustee: id("bob"),
                score: score(30),
                comment: None,
            }]
        );
        assert_eq!(handles[0].outcome(), Some(JobOutcome::Superseded));
        assert_eq!(handles[1].outcome(), Some(JobOutcome::Superseded));
        assert_eq!(handles[2].outcome(), Some(JobOutcome::Succeeded));
        assert_eq!(harness.updater.metrics().get_jobs_superseded(), 2);
        assert_eq!(
            harness.identities.trust(&id("alice"), &id("bob")),
            Some(TrustRecord::explicit(score(30), None))
        );
    }

    #[test]
    fn test_waiter_on_replaced_job_is_released() {
        let harness = Harness::new();
        harness.park();

        let first = harness.updater.submit(set_property_job("Sone.Version", "1"));
        let waiter = thread::spawn(move || first.wait());

        harness.updater.submit(set_property_job("Sone.Version", "2"));
        assert!(!waiter.join().unwrap());

        harness.release();
        harness.updater.shutdown().unwrap();
        assert_eq!(
            harness.identities.property(&id("alice"), "Sone.Version").as_deref(),
            Some("2")
        );
    }

    #[test]
    fn test_replace_moves_job_to_back() {
        let harness = Harness::new();
        harness.park();

        harness.updater.submit(set_property_job("a", "1"));
        harness.updater.submit(set_property_job("b", "1"));
        let replaced = harness.updater.submit(set_property_job("a", "2"));
        assert_eq!(replaced.disposition(), Disposition::Replaced);
        assert_eq!(
            harness.updater.queued_jobs(),
            vec![set_property_job("b", "1"), set_property_job("a", "2")]
        );

        harness.release();
        harness.updater.shutdown().unwrap();

        let order: Vec<_> = harness
            .backend_calls()
            .into_iter()
            .filter_map(|call| match call {
                ConnectorCall::SetProperty { name, value, .. } => Some((name, value)),
                _ => None,
            })
            .collect();
        assert_eq!(
            order,
            vec![("b".to_string(), "1".to_string()), ("a".to_string(), "2".to_string())]
        );
    }

    // =============================================================================
    // COALESCE / SKIP
    // =============================================================================

    fn coalesced_waiters_result(fail: bool) -> Vec<bool> {
        let harness = Harness::new();
        harness.park();
        if fail {
            harness.connector.fail_operation("add_context");
        }

        let first = harness.updater.submit(UpdateJob::AddContext {
            own_identity: id("alice"),
            context: "Sone".to_string(),
        });

        let results = thread::scope(|scope| {
            let waiters: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| harness.updater.add_context_wait(&id("alice"), "Sone"))
                })
                .collect();

            assert!(eventually(|| {
                harness.updater.metrics().jobs_coalesced.load(std::sync::atomic::Ordering::Relaxed)
                    == 4
            }));
            harness.release();

            let mut results: Vec<bool> = waiters.into_iter().map(|w| w.join().unwrap()).collect();
            results.push(first.wait());
            results
        });

        harness.updater.shutdown().unwrap();
        let add_calls = harness
            .backend_calls()
            .into_iter()
            .filter(|call| call.operation() == "add_context")
            .count();
        assert_eq!(add_calls, 1);
        results
    }

    #[test]
    fn test_coalesced_waiters_share_success() {
        assert!(coalesced_waiters_result(false).into_iter().all(|ok| ok));
    }

    #[test]
    fn test_coalesced_waiters_share_failure() {
        assert!(coalesced_waiters_result(true).into_iter().all(|ok| !ok));
    }

    #[test]
    fn test_repeated_remove_context_runs_once() {
        let harness = Harness::new();
        harness.park();

        let job = UpdateJob::RemoveContext {
            own_identity: id("alice"),
            context: "Sone".to_string(),
        };
        assert_eq!(harness.updater.submit(job.clone()).disposition(), Disposition::Enqueued);
        assert_eq!(harness.updater.submit(job).disposition(), Disposition::Skipped);

        harness.release();
        harness.updater.shutdown().unwrap();

        assert_eq!(
            harness.backend_calls(),
            vec![ConnectorCall::RemoveContext {
                own_identity: id("alice"),
                context: "Sone".to_string(),
            }]
        );
    }

    // =============================================================================
    // ORDERING
    // =============================================================================

    #[test]
    fn test_distinct_keys_keep_submission_order() {
        let harness = Harness::new();
        harness.park();

        harness.updater.set_property(&id("alice"), "a", Some("1"));
        harness.updater.set_property(&id("alice"), "b", Some("1"));
        harness.updater.add_context(&id("alice"), "Sone");
        harness.updater.set_trust(&id("alice"), &id("bob"), Some(score(5)), None);

        harness.release();
        harness.updater.shutdown().unwrap();

        let operations: Vec<_> = harness
            .backend_calls()
            .iter()
            .map(|call| call.operation())
            .collect();
        assert_eq!(
            operations,
            vec!["set_property", "set_property", "add_context", "set_trust"]
        );
        assert!(matches!(
            &harness.backend_calls()[0],
            ConnectorCall::SetProperty { name, .. } if name == "a"
        ));
    }

    // =============================================================================
    // LOCAL / REMOTE CONSISTENCY
    // =============================================================================

    #[test]
    fn test_trust_is_cached_before_backend_call() {
        let identities = Arc::new(InMemoryIdentityCache::new());
        let (connector, snapshots) = trust_snapshot_connector(Arc::clone(&identities));
        let harness = Harness::from_parts(connector, identities, UpdaterConfig::default());
        harness.updater.start().unwrap();

        let handle = harness.updater.submit(UpdateJob::SetTrust {
            truster: id("t1"),
            trustee: id("t2"),
            score: Some(score(50)),
            comment: Some("ok".to_string()),
        });
        assert!(handle.wait());

        let expected = TrustRecord::explicit(score(50), Some("ok".to_string()));
        assert_eq!(snapshots.lock().as_slice(), &[Some(expected.clone())]);
        assert_eq!(harness.identities.trust(&id("t1"), &id("t2")), Some(expected));

        harness.updater.set_trust(&id("t1"), &id("t2"), None, None);
        harness.updater.shutdown().unwrap();

        assert_eq!(snapshots.lock().len(), 2);
        assert_eq!(snapshots.lock()[1], None);
        assert_eq!(
            harness.connector.calls().last(),
            Some(&ConnectorCall::RemoveTrust {
                truster: id("t1"),
                trustee: id("t2"),
            })
        );
    }

    #[test]
    fn test_failed_set_trust_keeps_local_change() {
        let harness = Harness::started();
        harness.connector.fail_operation("set_trust");

        let handle = harness.updater.submit(set_trust_job("alice", "bob", -20));
        assert_eq!(handle.wait_timeout(WAIT), Some(JobOutcome::Failed));
        assert_eq!(
            harness.identities.trust(&id("alice"), &id("bob")),
            Some(TrustRecord::explicit(score(-20), None))
        );
        harness.updater.shutdown().unwrap();
    }

    #[test]
    fn test_failed_add_context_leaves_cache_unchanged() {
        let harness = Harness::started();
        let mut alice = Identity::new(id("alice"));
        alice.add_context("Existing");
        harness.identities.insert(alice);
        harness.connector.fail_operation("add_context");

        assert!(!harness.updater.add_context_wait(&id("alice"), "Sone"));

        let contexts = harness.identities.contexts(&id("alice"));
        assert_eq!(contexts.len(), 1);
        assert!(contexts.contains("Existing"));
        harness.updater.shutdown().unwrap();
        assert_eq!(harness.updater.metrics().get_jobs_failed(), 1);
    }

    #[test]
    fn test_failed_remove_context_keeps_context() -> anyhow::Result<()> {
        let harness = Harness::started();
        let mut alice = Identity::new(id("alice"));
        alice.add_context("Sone");
        harness.identities.insert(alice);
        harness.connector.fail_operation("remove_context");

        let handle = harness.updater.submit(UpdateJob::RemoveContext {
            own_identity: id("alice"),
            context: "Sone".to_string(),
        });
        assert!(!handle.wait());
        assert!(harness.identities.contexts(&id("alice")).contains("Sone"));

        harness.connector.heal_operation("remove_context");
        harness.updater.remove_context(&id("alice"), "Sone");
        harness.updater.shutdown()?;
        assert!(harness.identities.contexts(&id("alice")).is_empty());
        Ok(())
    }

    #[test]
    fn test_remove_property_removes_remote_then_local() -> anyhow::Result<()> {
        let harness = Harness::started();
        let mut alice = Identity::new(id("alice"));
        alice.set_property("Sone.Version", "1");
        harness.identities.insert(alice);

        harness.updater.remove_property(&id("alice"), "Sone.Version");
        harness.updater.shutdown()?;

        assert_eq!(
            harness.connector.calls(),
            vec![ConnectorCall::RemoveProperty {
                own_identity: id("alice"),
                name: "Sone.Version".to_string(),
            }]
        );
        assert_eq!(harness.identities.property(&id("alice"), "Sone.Version"), None);
        Ok(())
    }
}
