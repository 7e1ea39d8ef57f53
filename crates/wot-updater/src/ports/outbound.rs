//! Outbound (Driven) ports for the update coordinator.
//!
//! Only the worker thread calls these, one job at a time, so implementations
//! never see concurrent mutations from the coordinator.

use crate::domain::{IdentityId, TrustRecord, TrustScore};
use crate::error::ConnectorError;

/// Synchronous client for the remote web-of-trust backend.
///
/// Every call may block for a long time and may fail with a backend fault.
pub trait WebOfTrustConnector: Send + Sync {
    /// Assigns an explicit trust value from `truster` to `trustee`.
    fn set_trust(
        &self,
        truster: &IdentityId,
        trustee: &IdentityId,
        score: TrustScore,
        comment: Option<&str>,
    ) -> Result<(), ConnectorError>;

    /// Removes the trust relation from `truster` to `trustee`.
    fn remove_trust(
        &self,
        truster: &IdentityId,
        trustee: &IdentityId,
    ) -> Result<(), ConnectorError>;

    /// Adds a context to an own identity.
    fn add_context(&self, own_identity: &IdentityId, context: &str) -> Result<(), ConnectorError>;

    /// Removes a context from an own identity.
    fn remove_context(
        &self,
        own_identity: &IdentityId,
        context: &str,
    ) -> Result<(), ConnectorError>;

    /// Sets a property on an own identity.
    fn set_property(
        &self,
        own_identity: &IdentityId,
        name: &str,
        value: &str,
    ) -> Result<(), ConnectorError>;

    /// Removes a property from an own identity.
    fn remove_property(&self, own_identity: &IdentityId, name: &str) -> Result<(), ConnectorError>;
}

/// Local, in-process view of identity state.
///
/// Mutators never fail. The coordinator calls them to keep local state in
/// line with what it has sent to the backend.
pub trait IdentityCache: Send + Sync {
    /// Sets (`Some`) or clears (`None`) the trust `truster` assigned to `trustee`.
    fn set_local_trust(
        &self,
        truster: &IdentityId,
        trustee: &IdentityId,
        trust: Option<TrustRecord>,
    );

    /// Adds a context to an own identity.
    fn add_local_context(&self, own_identity: &IdentityId, context: &str);

    /// Removes a context from an own identity.
    fn remove_local_context(&self, own_identity: &IdentityId, context: &str);

    /// Sets (`Some`) or removes (`None`) a property on an own identity.
    fn set_local_property(&self, own_identity: &IdentityId, name: &str, value: Option<&str>);
}
