//! The cache proper: replies to synthetic commands, keyed by what they answer

use crate::classes::ClassesRepo;
use crate::key::Key;
use crate::synthetic::SyntheticIds;
use bytes::Bytes;
use jdwp_types::{Location, ReferenceTypeId};
use jdwp_wire::id_sizes::IdSizes;
use jdwp_wire::packet::{ErrorCode, Packet};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Tracks every key through the states *not requested*, *synthetic command in flight* and
/// *cached*. One speculator lives for one debuggee generation: it is thrown away whenever the
/// VM resumes.
#[derive(Debug, Default)]
pub struct Speculator {
    cache: HashMap<Key, Bytes>,
    pending: HashMap<u32, Key>,
    requested: HashSet<Key>,
    classes: ClassesRepo,
}

impl Speculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a synthetic command for every key of every location that is neither cached nor
    /// already requested.
    ///
    /// Ids come from `ids`, skipping ids of synthetic commands still in flight and ids for which
    /// `in_use` holds.
    pub fn speculate(
        &mut self,
        locations: impl IntoIterator<Item = Location>,
        ids: &mut SyntheticIds,
        in_use: impl Fn(u32) -> bool,
        id_sizes: IdSizes,
    ) -> Vec<Packet> {
        let mut packets = Vec::new();
        for location in locations {
            for key in Key::speculations(&location) {
                if self.cache.contains_key(&key) || self.requested.contains(&key) {
                    continue;
                }
                let pending = &self.pending;
                let id = ids.next(|id| in_use(id) || pending.contains_key(&id));
                trace!(id, ?key, "speculating");
                self.track(id, key);
                packets.push(key.to_packet(id, id_sizes));
            }
        }
        if !packets.is_empty() {
            debug!(count = packets.len(), "issued synthetic commands");
        }
        packets
    }

    /// Remembers that synthetic command `id` asks for `key`
    pub fn track(&mut self, id: u32, key: Key) {
        self.pending.insert(id, key);
        self.requested.insert(key);
        self.classes.declare_derived_key(key.class(), key);
    }

    /// Whether `id` is a synthetic command waiting for its reply
    pub fn is_pending(&self, id: u32) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn is_cached(&self, key: &Key) -> bool {
        self.cache.contains_key(key)
    }

    /// Takes the reply to a synthetic command. Returns false if `id` is not pending, in which case
    /// the reply belongs to someone else.
    ///
    /// Successful replies are cached. Error replies are dropped so the key can be requested again.
    pub fn absorb(&mut self, id: u32, error_code: ErrorCode, payload: &[u8]) -> bool {
        let Some(key) = self.pending.remove(&id) else {
            return false;
        };
        self.requested.remove(&key);
        if error_code.is_error() {
            debug!(id, ?key, code = error_code.code(), "synthetic command failed");
        } else {
            trace!(id, ?key, len = payload.len(), "caching reply");
            self.cache.insert(key, Bytes::copy_from_slice(payload));
        }
        true
    }

    /// A reply to command `id` with the cached answer for `key`, if there is one
    pub fn answer(&self, id: u32, key: &Key) -> Option<Packet> {
        self.cache
            .get(key)
            .map(|payload| Packet::new_reply(id, ErrorCode::NONE, Bytes::copy_from_slice(payload)))
    }

    /// Records a class reported by a CLASS_PREPARE event
    pub fn record_class_prepare(&mut self, signature: &str, class: ReferenceTypeId) {
        let evicted = self.classes.record_class_prepare(signature, class);
        self.evict(evicted);
    }

    /// Records a class reported by a class listing reply
    pub fn record_class_listing(&mut self, signature: &str, class: ReferenceTypeId) {
        let evicted = self.classes.record_class_listing(signature, class);
        self.evict(evicted);
    }

    /// Forgets everything derived from classes loaded under `signature`
    pub fn on_class_unload(&mut self, signature: &str) {
        let evicted = self.classes.on_class_unload(signature);
        debug!(signature, evicted = evicted.len(), "class unloaded");
        self.evict(evicted);
    }

    /// Drops `keys` from the cache. Replies to synthetic commands still in flight for them will
    /// not be recognized any more.
    fn evict(&mut self, keys: impl IntoIterator<Item = Key>) {
        let keys = keys.into_iter().collect::<HashSet<_>>();
        if keys.is_empty() {
            return;
        }
        self.cache.retain(|key, _| !keys.contains(key));
        self.pending.retain(|_, key| !keys.contains(key));
        self.requested.retain(|key| !keys.contains(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jdwp_types::{MethodId, TypeTag};

    const CLASS: ReferenceTypeId = ReferenceTypeId::new(0xAABB);

    fn location(class: ReferenceTypeId, method: u64) -> Location {
        Location {
            tag: TypeTag::Class.repr(),
            class,
            method: MethodId::new(method),
            index: 0,
        }
    }

    fn speculate(speculator: &mut Speculator, locations: Vec<Location>) -> Vec<Packet> {
        let mut ids = SyntheticIds::new();
        speculator.speculate(locations, &mut ids, |_| false, IdSizes::default())
    }

    #[test]
    fn duplicate_frames_are_requested_once() {
        let mut speculator = Speculator::new();
        let packets = speculate(
            &mut speculator,
            vec![location(CLASS, 1), location(CLASS, 1), location(CLASS, 2)],
        );
        // 8 keys for the first method, plus the 3 method-specific keys of the second
        assert_eq!(packets.len(), 11);
        let ids = packets.iter().map(Packet::id).collect::<HashSet<_>>();
        assert_eq!(ids.len(), 11);
        assert!(packets.iter().all(|packet| speculator.is_pending(packet.id())));
    }

    #[test]
    fn successful_replies_are_cached() {
        let mut speculator = Speculator::new();
        let key = Key::SourceFile(CLASS);
        speculator.track(0x8000_0000, key);
        assert!(speculator.answer(3, &key).is_none());

        assert!(speculator.absorb(0x8000_0000, ErrorCode::NONE, &[0, 0, 0, 1, b'A']));
        assert!(!speculator.is_pending(0x8000_0000));
        let reply = speculator.answer(3, &key).unwrap();
        assert_eq!(reply.id(), 3);
        assert_eq!(&reply.payload()[..], &[0, 0, 0, 1, b'A']);

        // an already cached key is not speculated on again
        let packets = speculate(&mut speculator, vec![location(CLASS, 1)]);
        assert_eq!(packets.len(), 7);
    }

    #[test]
    fn error_replies_are_absorbed_but_not_cached() {
        let mut speculator = Speculator::new();
        let key = Key::SourceDebugExtension(CLASS);
        speculator.track(0x8000_0005, key);
        assert!(speculator.absorb(0x8000_0005, ErrorCode::new(101), &[]));
        assert!(!speculator.is_cached(&key));
        assert!(!speculator.absorb(0x8000_0005, ErrorCode::NONE, &[]));
    }

    #[test]
    fn unload_evicts_cached_and_pending_keys() {
        let mut speculator = Speculator::new();
        speculator.record_class_prepare("LA;", CLASS);
        speculator.track(0x8000_0000, Key::SourceFile(CLASS));
        speculator.track(0x8000_0001, Key::Interfaces(CLASS));
        speculator.absorb(0x8000_0000, ErrorCode::NONE, &[0, 0, 0, 0]);

        speculator.on_class_unload("LA;");
        assert!(!speculator.is_cached(&Key::SourceFile(CLASS)));
        assert!(!speculator.is_pending(0x8000_0001));
        // the late reply is somebody else's now
        assert!(!speculator.absorb(0x8000_0001, ErrorCode::NONE, &[]));
    }
}
