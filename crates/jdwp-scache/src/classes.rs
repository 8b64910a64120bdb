//! Index from class signatures to class ids, and from class ids to the keys derived from them

use crate::key::Key;
use jdwp_types::ReferenceTypeId;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Knows which cache keys belong to which loaded class, so that unloading a class evicts exactly
/// the keys derived from it.
#[derive(Debug, Default)]
pub struct ClassesRepo {
    ids_by_signature: HashMap<String, HashSet<ReferenceTypeId>>,
    signature_by_id: HashMap<ReferenceTypeId, String>,
    derived_keys: HashMap<ReferenceTypeId, HashSet<Key>>,
}

impl ClassesRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a class reported by a CLASS_PREPARE event. Returns keys to evict if the id
    /// previously named another class.
    pub fn record_class_prepare(&mut self, signature: &str, class: ReferenceTypeId) -> Vec<Key> {
        self.record(signature, class)
    }

    /// Records a class reported by a class listing reply. Returns keys to evict if the id
    /// previously named another class.
    pub fn record_class_listing(&mut self, signature: &str, class: ReferenceTypeId) -> Vec<Key> {
        self.record(signature, class)
    }

    fn record(&mut self, signature: &str, class: ReferenceTypeId) -> Vec<Key> {
        let previous = self.signature_by_id.get(&class).cloned();
        let evicted = match previous {
            Some(known) if known == signature => return Vec::new(),
            Some(_) => {
                debug!(%class, signature, "class id now names another class");
                self.detach(class);
                self.derived_keys
                    .remove(&class)
                    .map(|keys| keys.into_iter().collect())
                    .unwrap_or_default()
            }
            None => Vec::new(),
        };
        self.signature_by_id.insert(class, signature.to_string());
        self.ids_by_signature
            .entry(signature.to_string())
            .or_default()
            .insert(class);
        evicted
    }

    /// Removes `class` from the signature it is currently indexed under
    fn detach(&mut self, class: ReferenceTypeId) {
        let Some(signature) = self.signature_by_id.remove(&class) else {
            return;
        };
        if let Some(ids) = self.ids_by_signature.get_mut(&signature) {
            ids.remove(&class);
            if ids.is_empty() {
                self.ids_by_signature.remove(&signature);
            }
        }
    }

    /// Remembers that `key` was derived while resolving `class`
    pub fn declare_derived_key(&mut self, class: ReferenceTypeId, key: Key) {
        self.derived_keys.entry(class).or_default().insert(key);
    }

    /// Drops every class loaded under `signature` and returns all keys derived from them
    pub fn on_class_unload(&mut self, signature: &str) -> HashSet<Key> {
        let Some(ids) = self.ids_by_signature.remove(signature) else {
            return HashSet::new();
        };
        let mut evicted = HashSet::new();
        for id in ids {
            self.signature_by_id.remove(&id);
            if let Some(keys) = self.derived_keys.remove(&id) {
                evicted.extend(keys);
            }
        }
        evicted
    }

    /// The ids currently loaded under `signature`
    pub fn class_ids(&self, signature: &str) -> impl Iterator<Item = ReferenceTypeId> + '_ {
        self.ids_by_signature
            .get(signature)
            .into_iter()
            .flatten()
            .copied()
    }
}
