//! Core identity entities.
//!
//! These mirror the subset of web-of-trust identity state the coordinator
//! keeps consistent with the backend: contexts, properties and the trust
//! each truster has assigned to an identity.

use super::value_objects::TrustScore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Opaque identifier of an identity in the web of trust.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
    /// Creates a new identity id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for IdentityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A trust relation as seen from the trustee.
///
/// A missing record (rather than a record without score) means "no trust
/// relation"; the score is optional only because the backend reports
/// computed trust without an explicit assignment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustRecord {
    /// Explicit score, if any.
    pub score: Option<TrustScore>,
    /// Free-form comment attached by the truster.
    pub comment: Option<String>,
    /// Distance from the truster; explicit assignments are rank 0.
    pub rank: i32,
}

impl TrustRecord {
    /// An explicit, locally assigned trust value.
    pub fn explicit(score: TrustScore, comment: Option<String>) -> Self {
        Self {
            score: Some(score),
            comment,
            rank: 0,
        }
    }
}

/// In-memory state of a single identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    id: IdentityId,
    contexts: BTreeSet<String>,
    properties: BTreeMap<String, String>,
    trust: HashMap<IdentityId, TrustRecord>,
}

impl Identity {
    /// Creates an identity with no contexts, properties or trust.
    pub fn new(id: IdentityId) -> Self {
        Self {
            id,
            contexts: BTreeSet::new(),
            properties: BTreeMap::new(),
            trust: HashMap::new(),
        }
    }

    /// Returns the identity's id.
    pub fn id(&self) -> &IdentityId {
        &self.id
    }

    /// Returns the contexts of this identity in sorted order.
    pub fn contexts(&self) -> &BTreeSet<String> {
        &self.contexts
    }

    /// Whether the identity carries the given context.
    pub fn has_context(&self, context: &str) -> bool {
        self.contexts.contains(context)
    }

    /// Adds a context. Returns `false` if it was already present.
    pub fn add_context(&mut self, context: impl Into<String>) -> bool {
        self.contexts.insert(context.into())
    }

    /// Removes a context. Returns `false` if it was not present.
    pub fn remove_context(&mut self, context: &str) -> bool {
        self.contexts.remove(context)
    }

    /// Returns all properties.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Returns the value of a property.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Sets a property, returning the previous value.
    pub fn set_property(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.properties.insert(name.into(), value.into())
    }

    /// Removes a property, returning the previous value.
    pub fn remove_property(&mut self, name: &str) -> Option<String> {
        self.properties.remove(name)
    }

    /// Returns the trust the given truster has assigned to this identity.
    pub fn trust_from(&self, truster: &IdentityId) -> Option<&TrustRecord> {
        self.trust.get(truster)
    }

    /// Sets or clears the trust the given truster has assigned.
    pub fn set_trust(&mut self, truster: IdentityId, trust: Option<TrustRecord>) {
        match trust {
            Some(record) => {
                self.trust.insert(truster, record);
            }
            None => {
                self.trust.remove(&truster);
            }
        }
    }
}
