//! In-memory identity cache.
//!
//! Implements [`IdentityCache`] over a map of [`Identity`] records. Identities
//! unknown to the cache are created on first mutation.

use crate::domain::{Identity, IdentityId, TrustRecord};
use crate::ports::outbound::IdentityCache;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};

/// Identity cache backed by a `RwLock<HashMap>`.
#[derive(Debug, Default)]
pub struct InMemoryIdentityCache {
    identities: RwLock<HashMap<IdentityId, Identity>>,
}

impl InMemoryIdentityCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an identity.
    pub fn insert(&self, identity: Identity) {
        self.identities
            .write()
            .insert(identity.id().clone(), identity);
    }

    /// Returns a copy of an identity.
    pub fn get(&self, id: &IdentityId) -> Option<Identity> {
        self.identities.read().get(id).cloned()
    }

    /// Number of known identities.
    pub fn len(&self) -> usize {
        self.identities.read().len()
    }

    /// Whether no identity is known.
    pub fn is_empty(&self) -> bool {
        self.identities.read().is_empty()
    }

    /// Trust `truster` has assigned to `trustee`.
    pub fn trust(&self, truster: &IdentityId, trustee: &IdentityId) -> Option<TrustRecord> {
        self.identities
            .read()
            .get(trustee)
            .and_then(|identity| identity.trust_from(truster).cloned())
    }

    /// Contexts of an identity (empty if unknown).
    pub fn contexts(&self, id: &IdentityId) -> BTreeSet<String> {
        self.identities
            .read()
            .get(id)
            .map(|identity| identity.contexts().clone())
            .unwrap_or_default()
    }

    /// Value of a property on an identity.
    pub fn property(&self, id: &IdentityId, name: &str) -> Option<String> {
        self.identities
            .read()
            .get(id)
            .and_then(|identity| identity.property(name).map(str::to_string))
    }

    fn update(&self, id: &IdentityId, mutate: impl FnOnce(&mut Identity)) {
        let mut identities = self.identities.write();
        let identity = identities
            .entry(id.clone())
            .or_insert_with(|| Identity::new(id.clone()));
        mutate(identity);
    }
}

impl IdentityCache for InMemoryIdentityCache {
    fn set_local_trust(
        &self,
        truster: &IdentityId,
        trustee: &IdentityId,
        trust: Option<TrustRecord>,
    ) {
        self.update(trustee, |identity| identity.set_trust(truster.clone(), trust));
    }

    fn add_local_context(&self, own_identity: &IdentityId, context: &str) {
        self.update(own_identity, |identity| {
            identity.add_context(context);
        });
    }

    fn remove_local_context(&self, own_identity: &IdentityId, context: &str) {
        self.update(own_identity, |identity| {
            identity.remove_context(context);
        });
    }

    fn set_local_property(&self, own_identity: &IdentityId, name: &str, value: Option<&str>) {
        self.update(own_identity, |identity| {
            match value {
                Some(value) => identity.set_property(name, value),
                None => identity.remove_property(name),
            };
        });
    }
}
