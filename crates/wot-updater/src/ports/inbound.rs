//! Inbound ports (driving side - API)

use crate::domain::{IdentityId, TrustScore};
use crate::error::Result;

/// Public surface of the update coordinator.
///
/// All mutation methods return immediately unless their name ends in
/// `_wait`; the actual backend call happens later on the worker thread.
/// Every method is safe to call from any number of threads.
pub trait TrustUpdaterApi: Send + Sync {
    /// Sets (`Some`) or removes (`None`) the trust from `truster` to
    /// `trustee`. A queued update for the same pair is replaced.
    fn set_trust(
        &self,
        truster: &IdentityId,
        trustee: &IdentityId,
        score: Option<TrustScore>,
        comment: Option<&str>,
    );

    /// Adds a context to an own identity. Coalesces with a queued equal request.
    fn add_context(&self, own_identity: &IdentityId, context: &str);

    /// Adds a context and blocks until the backend call finished.
    ///
    /// Returns `true` only if the context was added successfully. If an equal
    /// request is already queued, waits for that one instead.
    fn add_context_wait(&self, own_identity: &IdentityId, context: &str) -> bool;

    /// Removes a context from an own identity. Skipped if an equal request is queued.
    fn remove_context(&self, own_identity: &IdentityId, context: &str);

    /// Sets (`Some`) or removes (`None`) a property. A queued update of the
    /// same property is replaced.
    fn set_property(&self, own_identity: &IdentityId, name: &str, value: Option<&str>);

    /// Removes a property; same as `set_property(own_identity, name, None)`.
    fn remove_property(&self, own_identity: &IdentityId, name: &str) {
        self.set_property(own_identity, name, None);
    }

    /// Starts the background worker.
    fn start(&self) -> Result<()>;

    /// Requests the worker to stop once it reaches the end of the jobs
    /// queued so far. Does not wait for the worker to exit.
    fn stop(&self);
}
