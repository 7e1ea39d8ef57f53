//! # Update Jobs
//!
//! One variant per backend mutation, plus the `Stop` sentinel that only the
//! coordinator ever enqueues.
//!
//! ## Local vs. remote ordering
//!
//! | Variant | Order | Local change on failure |
//! |---------|-------|-------------------------|
//! | `SetTrust` | local first, then remote | kept |
//! | `AddContext` / `RemoveContext` | remote first, then local | none |
//! | `SetProperty` | remote first, then local | none |
//!
//! Trust is applied locally before the backend call so the local view
//! reflects the caller's intent while the slow call is in flight.

use super::entities::{IdentityId, TrustRecord};
use super::value_objects::{DedupPolicy, JobKey, TrustScore};
use crate::error::ConnectorError;
use crate::ports::{IdentityCache, WebOfTrustConnector};
use std::fmt;

/// A requested mutation of web-of-trust state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateJob {
    /// Set (`Some`) or remove (`None`) trust from `truster` to `trustee`.
    SetTrust {
        /// Identity assigning the trust
        truster: IdentityId,
        /// Identity receiving the trust
        trustee: IdentityId,
        /// New score, `None` to remove the trust relation
        score: Option<TrustScore>,
        /// Free-form comment stored with the score
        comment: Option<String>,
    },
    /// Add a context to an own identity.
    AddContext {
        /// Own identity to change
        own_identity: IdentityId,
        /// Context to add
        context: String,
    },
    /// Remove a context from an own identity.
    RemoveContext {
        /// Own identity to change
        own_identity: IdentityId,
        /// Context to remove
        context: String,
    },
    /// Set (`Some`) or remove (`None`) a property on an own identity.
    SetProperty {
        /// Own identity to change
        own_identity: IdentityId,
        /// Property name
        name: String,
        /// New value, `None` to remove the property
        value: Option<String>,
    },
    /// Worker shutdown sentinel. Never executed.
    Stop,
}

impl UpdateJob {
    /// Deduplication key; `None` for the sentinel.
    pub fn key(&self) -> Option<JobKey> {
        match self {
            Self::SetTrust {
                truster, trustee, ..
            } => Some(JobKey::Trust {
                truster: truster.clone(),
                trustee: trustee.clone(),
            }),
            Self::AddContext {
                own_identity,
                context,
            } => Some(JobKey::AddContext {
                own_identity: own_identity.clone(),
                context: context.clone(),
            }),
            Self::RemoveContext {
                own_identity,
                context,
            } => Some(JobKey::RemoveContext {
                own_identity: own_identity.clone(),
                context: context.clone(),
            }),
            Self::SetProperty {
                own_identity, name, ..
            } => Some(JobKey::Property {
                own_identity: own_identity.clone(),
                name: name.clone(),
            }),
            Self::Stop => None,
        }
    }

    /// Policy applied when a job with the same key is already queued.
    ///
    /// Latest value wins for trust and properties; context changes carry no
    /// value, so the first queued request already reaches the end state.
    pub fn dedup_policy(&self) -> Option<DedupPolicy> {
        match self {
            Self::SetTrust { .. } | Self::SetProperty { .. } => Some(DedupPolicy::Replace),
            Self::AddContext { .. } => Some(DedupPolicy::Coalesce),
            Self::RemoveContext { .. } => Some(DedupPolicy::SkipIfPresent),
            Self::Stop => None,
        }
    }

    /// Whether this is the shutdown sentinel.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Stop)
    }

    /// Executes the mutation. Returns `true` on success.
    ///
    /// Connector failures are logged and turned into `false`; they never
    /// escape to the caller. Calling this on the sentinel is a no-op that
    /// reports failure.
    pub fn run<C, I>(&self, connector: &C, identities: &I) -> bool
    where
        C: WebOfTrustConnector + ?Sized,
        I: IdentityCache + ?Sized,
    {
        match self.apply(connector, identities) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(job = %self, %error, "Web of trust update failed");
                false
            }
        }
    }

    fn apply<C, I>(&self, connector: &C, identities: &I) -> Result<(), ConnectorError>
    where
        C: WebOfTrustConnector + ?Sized,
        I: IdentityCache + ?Sized,
    {
        match self {
            Self::SetTrust {
                truster,
                trustee,
                score: Some(score),
                comment,
            } => {
                identities.set_local_trust(
                    truster,
                    trustee,
                    Some(TrustRecord::explicit(*score, comment.clone())),
                );
                connector.set_trust(truster, trustee, *score, comment.as_deref())
            }
            Self::SetTrust {
                truster,
                trustee,
                score: None,
                ..
            } => {
                identities.set_local_trust(truster, trustee, None);
                connector.remove_trust(truster, trustee)
            }
            Self::AddContext {
                own_identity,
                context,
            } => {
                connector.add_context(own_identity, context)?;
                identities.add_local_context(own_identity, context);
                Ok(())
            }
            Self::RemoveContext {
                own_identity,
                context,
            } => {
                connector.remove_context(own_identity, context)?;
                identities.remove_local_context(own_identity, context);
                Ok(())
            }
            Self::SetProperty {
                own_identity,
                name,
                value: Some(value),
            } => {
                connector.set_property(own_identity, name, value)?;
                identities.set_local_property(own_identity, name, Some(value));
                Ok(())
            }
            Self::SetProperty {
                own_identity,
                name,
                value: None,
            } => {
                connector.remove_property(own_identity, name)?;
                identities.set_local_property(own_identity, name, None);
                Ok(())
            }
            Self::Stop => Err(ConnectorError::fault("stop", "sentinel job cannot run")),
        }
    }
}

impl fmt::Display for UpdateJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetTrust {
                truster,
                trustee,
                score,
                ..
            } => match score {
                Some(score) => write!(f, "SetTrust[{truster} -> {trustee} = {score}]"),
                None => write!(f, "SetTrust[{truster} -> {trustee} = none]"),
            },
            Self::AddContext {
                own_identity,
                context,
            } => write!(f, "AddContext[{own_identity} + {context}]"),
            Self::RemoveContext {
                own_identity,
                context,
            } => write!(f, "RemoveContext[{own_identity} - {context}]"),
            Self::SetProperty {
                own_identity,
                name,
                value,
            } => match value {
                Some(value) => write!(f, "SetProperty[{own_identity}: {name} = {value}]"),
                None => write!(f, "SetProperty[{own_identity}: {name} removed]"),
            },
            Self::Stop => f.write_str("Stop"),
        }
    }
}
