use bytes::Bytes;
use jdwp_scache::jdwp_wire::commands::class_type::Superclass;
use jdwp_scache::jdwp_wire::commands::event::Event;
use jdwp_scache::jdwp_wire::commands::method::{LineTable, LineTableReply};
use jdwp_scache::jdwp_wire::commands::reference_type::{SourceFile, SourceFileReply};
use jdwp_scache::jdwp_wire::commands::thread_reference::{self, Frames};
use jdwp_scache::jdwp_wire::commands::virtual_machine::{
    self, AllClasses, AllClassesReply, AllClassesWithGeneric, AllClassesWithGenericReply,
    ClassReferenceWithGeneric, ClassReferenceWithSignature, IdSizes as IdSizesCommand,
};
use jdwp_scache::jdwp_wire::commands::JdwpCommand;
use jdwp_scache::jdwp_wire::id_sizes::IdSizes;
use jdwp_scache::jdwp_wire::jdwp_types::*;
use jdwp_scache::jdwp_wire::packet::{CommandData, ErrorCode, Packet, HEADER_LENGTH};
use jdwp_scache::{is_synthetic, Outcome, SCache, SCacheConfig};
use jdwp_test_fixtures::*;
use std::collections::HashSet;

const STRING: u64 = 15;
const VECTOR: u64 = 16;
const STRING_SIGNATURE: &str = "Ljava/lang/String;";
const VECTOR_SIGNATURE: &str = "Ljava/util/Vector;";

struct Debugger {
    scache: SCache,
    ids: IdGenerator,
    id_sizes: IdSizes,
}

impl Debugger {
    fn new() -> Self {
        Self::with_config(SCacheConfig::default())
    }

    fn with_config(config: SCacheConfig) -> Self {
        Self {
            scache: SCache::new(config),
            ids: IdGenerator::new(),
            id_sizes: IdSizes::default(),
        }
    }

    /// Sends `command` from the debugger, returning its id and what the cache made of it
    fn send<C: JdwpCommand>(&mut self, cmd: &C) -> (u32, Outcome) {
        let id = self.ids.next();
        let outcome = self
            .scache
            .on_upstream_packet(command(id, cmd, self.id_sizes));
        (id, outcome)
    }

    /// Asks for the frames of a thread and lets the VM answer with `locations`
    fn frames(&mut self, locations: &[Location]) -> Outcome {
        let (id, _) = self.send(&Frames {
            thread: ThreadId::new(1),
            start_frame: 0,
            length: -1,
        });
        self.scache
            .on_downstream_packet(frames_reply(id, locations, self.id_sizes))
    }

    fn event(&mut self, events: Vec<Event>) -> Outcome {
        let id = self.ids.next();
        self.scache
            .on_downstream_packet(composite(id, events, self.id_sizes))
    }

    /// Answers every synthetic command in `outcome` with a canned reply
    fn answer_all(&mut self, outcome: &Outcome) {
        for packet in &outcome.edict.upstream {
            let packet = Packet::decode(packet).unwrap();
            let command = packet.header().command().unwrap();
            let payload =
                canned_answer(command, packet.payload().clone(), self.id_sizes).unwrap();
            let reply = Packet::new_reply(packet.id(), ErrorCode::NONE, payload);
            let absorbed = self.scache.on_downstream_packet(reply.to_bytes());
            assert!(absorbed.edict.is_empty(), "synthetic reply was forwarded");
            assert_eq!(absorbed.journal.downstream.len(), 1);
        }
    }

    fn source_file(&mut self, class: u64) -> Outcome {
        self.send(&SourceFile {
            ref_type: ReferenceTypeId::new(class),
        })
        .1
    }
}

fn sent_ids(outcome: &Outcome) -> Vec<u32> {
    outcome
        .edict
        .upstream
        .iter()
        .map(|packet| Packet::decode(packet).unwrap().id())
        .collect()
}

fn assert_hit(outcome: &Outcome) {
    assert!(outcome.edict.upstream.is_empty(), "cache hit was forwarded");
    assert_eq!(outcome.edict.downstream.len(), 1, "no reply on cache hit");
    assert_eq!(outcome.journal.upstream.len(), 1, "absorbed command not journaled");
}

fn assert_miss(outcome: &Outcome) {
    assert_eq!(outcome.edict.upstream.len(), 1, "cache miss was not forwarded");
    assert!(outcome.edict.downstream.is_empty());
}

#[test_log::test]
fn id_sizes_reply_changes_payload_widths() {
    let mut debugger = Debugger::new();
    let (id, _) = debugger.send(&IdSizesCommand);
    debugger
        .scache
        .on_downstream_packet(id_sizes_reply(id, IdSizes::uniform(8).unwrap()));

    debugger.send(&Superclass {
        clazz: ClassId::new(0),
    });
    assert!(debugger.scache.is_enabled());

    // one byte wide ids are too short to read at the negotiated widths
    debugger.id_sizes = IdSizes::uniform(1).unwrap();
    debugger.send(&Superclass {
        clazz: ClassId::new(0),
    });
    assert!(!debugger.scache.is_enabled());
}

#[test_log::test]
fn narrow_id_sizes_are_used_for_speculation() {
    let narrow = IdSizes::new(8, 4, 8, 4, 8).unwrap();
    let mut debugger = Debugger::new();
    let (id, _) = debugger.send(&IdSizesCommand);
    debugger.scache.on_downstream_packet(id_sizes_reply(id, narrow));
    assert_eq!(debugger.scache.id_sizes(), narrow);
    debugger.id_sizes = narrow;

    let outcome = debugger.frames(&[location(STRING, 3)]);
    assert_eq!(outcome.edict.upstream.len(), 8);
    let line_table = outcome
        .edict
        .upstream
        .iter()
        .map(|packet| Packet::decode(packet).unwrap())
        .find(|packet| packet.header().is_a(6, 1))
        .unwrap();
    // class and method ids are four bytes each
    assert_eq!(line_table.payload().len(), 8);
}

#[test_log::test]
fn frames_reply_triggers_speculation() {
    let mut debugger = Debugger::new();
    let outcome = debugger.frames(&[location(0, 0)]);
    assert_eq!(outcome.edict.upstream.len(), 8);
    assert_eq!(outcome.journal.upstream, outcome.edict.upstream);
    assert_eq!(outcome.edict.downstream.len(), 1);
    assert!(sent_ids(&outcome).into_iter().all(is_synthetic));
}

#[test_log::test]
fn frames_with_an_unknown_type_tag_are_speculated_on() {
    let mut debugger = Debugger::new();
    let zeroed = Location {
        tag: 0,
        class: ReferenceTypeId::new(0),
        method: MethodId::new(0),
        index: 0,
    };
    let outcome = debugger.frames(&[zeroed]);
    assert_eq!(outcome.edict.upstream.len(), 8);
    assert!(debugger.scache.is_enabled());
}

#[test_log::test]
fn speculation_is_capped() {
    let mut debugger = Debugger::new();
    let locations = (0..60).map(|class| location(class, 1)).collect::<Vec<_>>();
    let outcome = debugger.frames(&locations);
    assert_eq!(outcome.edict.upstream.len(), 8 * 41);
    let ids = sent_ids(&outcome).into_iter().collect::<HashSet<_>>();
    assert_eq!(ids.len(), 8 * 41);

    let mut debugger = Debugger::with_config(SCacheConfig {
        max_speculated_frames: 2,
        ..SCacheConfig::default()
    });
    let outcome = debugger.frames(&locations);
    assert_eq!(outcome.edict.upstream.len(), 16);
}

#[test_log::test]
fn interface_frames_do_not_ask_for_a_superclass() {
    let mut debugger = Debugger::new();
    let mut interface = location(STRING, 1);
    interface.tag = TypeTag::Interface.repr();
    let outcome = debugger.frames(&[interface]);
    assert_eq!(outcome.edict.upstream.len(), 7);
}

#[test_log::test]
fn speculated_keys_are_hits() {
    let mut debugger = Debugger::new();
    let outcome = debugger.frames(&[location(STRING, 1), location(VECTOR, 1)]);
    assert_eq!(outcome.edict.upstream.len(), 16);
    debugger.answer_all(&outcome);

    let (id, hit) = debugger.send(&SourceFile {
        ref_type: ReferenceTypeId::new(STRING),
    });
    assert_hit(&hit);
    let reply = Packet::decode(&hit.edict.downstream[0]).unwrap();
    assert_eq!(reply.id(), id);
    assert_eq!(reply.header().error_code().map(|code| code.code()), Some(0));
    let SourceFileReply { source_file } = reply.decoder(debugger.id_sizes).get().unwrap();
    assert_eq!(source_file, "Classf.java");

    assert_hit(&debugger.source_file(VECTOR));

    let (_, hit) = debugger.send(&LineTable {
        ref_type: ReferenceTypeId::new(VECTOR),
        method_id: MethodId::new(1),
    });
    assert_hit(&hit);
}

#[test_log::test]
fn a_second_frames_reply_only_asks_for_new_keys() {
    let mut debugger = Debugger::new();
    let first = debugger.frames(&[location(STRING, 1)]);
    assert_eq!(first.edict.upstream.len(), 8);

    // still in flight
    let second = debugger.frames(&[location(STRING, 1)]);
    assert!(second.edict.upstream.is_empty());

    debugger.answer_all(&first);
    let third = debugger.frames(&[location(STRING, 1), location(STRING, 2)]);
    assert_eq!(third.edict.upstream.len(), 3);
}

#[test_log::test]
fn real_replies_are_never_cached() {
    let mut debugger = Debugger::new();
    let (id, miss) = debugger.send(&LineTable {
        ref_type: ReferenceTypeId::new(0xAABB),
        method_id: MethodId::new(0x01),
    });
    assert_miss(&miss);
    assert_eq!(
        &miss.edict.upstream[0][..],
        &[
            0, 0, 0, 27, 0, 0, 0, 1, 0, 6, 1, // header
            0, 0, 0, 0, 0, 0, 0xAA, 0xBB, // class
            0, 0, 0, 0, 0, 0, 0, 0x01, // method
        ]
    );

    let reply = reply(
        id,
        &LineTableReply {
            start: 0,
            end: 1,
            lines: vec![],
        },
        debugger.id_sizes,
    );
    let forwarded = debugger.scache.on_downstream_packet(reply.clone());
    assert_eq!(forwarded.edict.downstream, vec![reply.clone()]);
    assert!(forwarded.edict.upstream.is_empty());
    assert_eq!(forwarded.journal.downstream, vec![reply]);

    let (_, again) = debugger.send(&LineTable {
        ref_type: ReferenceTypeId::new(0xAABB),
        method_id: MethodId::new(0x01),
    });
    assert_miss(&again);
}

#[test_log::test]
fn non_keyable_traffic_is_bridged() {
    let mut debugger = Debugger::new();
    let id = debugger.ids.next();
    let unknown =
        Packet::new_command(id, CommandData::new(9, 1), Bytes::from_static(&[1, 2, 3])).to_bytes();
    let outcome = debugger.scache.on_upstream_packet(unknown.clone());
    assert_eq!(outcome.edict.upstream, vec![unknown.clone()]);
    assert_eq!(outcome.journal.upstream, vec![unknown]);

    let reply = Packet::new_reply(id, ErrorCode::NONE, Bytes::from_static(&[4])).to_bytes();
    let outcome = debugger.scache.on_downstream_packet(reply.clone());
    assert_eq!(outcome.edict.downstream, vec![reply]);
}

#[test_log::test]
fn error_replies_are_forwarded_without_triggers() {
    let mut debugger = Debugger::new();
    let (id, _) = debugger.send(&Frames {
        thread: ThreadId::new(1),
        start_frame: 0,
        length: -1,
    });
    let error = error_reply(id, ErrorConstant::ThreadNotSuspended);
    let outcome = debugger.scache.on_downstream_packet(error.clone());
    assert_eq!(outcome.edict.downstream, vec![error]);
    assert!(outcome.edict.upstream.is_empty());
    assert!(debugger.scache.is_enabled());
}

#[test_log::test]
fn failed_synthetic_commands_are_absorbed_and_retried() {
    let mut debugger = Debugger::new();
    let outcome = debugger.frames(&[location(STRING, 1)]);
    for id in sent_ids(&outcome) {
        let absorbed = debugger
            .scache
            .on_downstream_packet(error_reply(id, ErrorConstant::AbsentInformation));
        assert!(absorbed.edict.is_empty());
    }
    assert_miss(&debugger.source_file(STRING));
    let retry = debugger.frames(&[location(STRING, 1)]);
    assert_eq!(retry.edict.upstream.len(), 8);
}

fn load_hit_and_unload(debugger: &mut Debugger) {
    let outcome = debugger.frames(&[location(STRING, 1), location(VECTOR, 1)]);
    assert_eq!(outcome.edict.upstream.len(), 16);
    let source_files = outcome
        .edict
        .upstream
        .iter()
        .filter(|packet| Packet::decode(packet).unwrap().header().is_a(2, 7))
        .count();
    assert_eq!(source_files, 2);
    debugger.answer_all(&outcome);

    assert_hit(&debugger.source_file(STRING));
    assert_hit(&debugger.source_file(VECTOR));

    let unload = debugger.event(vec![class_unload(STRING_SIGNATURE)]);
    assert_eq!(unload.edict.downstream.len(), 1);
}

#[test_log::test]
fn class_prepare_makes_unload_evict() {
    let mut debugger = Debugger::new();
    debugger.event(vec![class_prepare(STRING_SIGNATURE, STRING)]);
    debugger.event(vec![class_prepare(VECTOR_SIGNATURE, VECTOR)]);
    load_hit_and_unload(&mut debugger);

    assert_miss(&debugger.source_file(STRING));
    assert_hit(&debugger.source_file(VECTOR));
}

#[test_log::test]
fn all_classes_makes_unload_evict() {
    let mut debugger = Debugger::new();
    let (id, _) = debugger.send(&AllClasses);
    let listing = AllClassesReply {
        classes: [(STRING, STRING_SIGNATURE), (VECTOR, VECTOR_SIGNATURE)]
            .into_iter()
            .map(|(class, signature)| ClassReferenceWithSignature {
                type_tag: 0,
                id: ReferenceTypeId::new(class),
                signature: signature.to_string(),
                status: ClassStatus::from_bits(7),
            })
            .collect(),
    };
    debugger
        .scache
        .on_downstream_packet(reply(id, &listing, debugger.id_sizes));
    load_hit_and_unload(&mut debugger);

    assert_miss(&debugger.source_file(STRING));
    assert_hit(&debugger.source_file(VECTOR));
}

#[test_log::test]
fn all_classes_with_generic_makes_unload_evict() {
    let mut debugger = Debugger::new();
    let (id, _) = debugger.send(&AllClassesWithGeneric);
    let listing = AllClassesWithGenericReply {
        classes: [(STRING, STRING_SIGNATURE), (VECTOR, VECTOR_SIGNATURE)]
            .into_iter()
            .map(|(class, signature)| ClassReferenceWithGeneric {
                type_tag: 0,
                id: ReferenceTypeId::new(class),
                signature: signature.to_string(),
                generic_signature: String::new(),
                status: ClassStatus::from_bits(7),
            })
            .collect(),
    };
    debugger
        .scache
        .on_downstream_packet(reply(id, &listing, debugger.id_sizes));
    load_hit_and_unload(&mut debugger);

    assert_miss(&debugger.source_file(STRING));
    assert_hit(&debugger.source_file(VECTOR));
}

#[test_log::test]
fn unknown_class_unload_evicts_nothing() {
    let mut debugger = Debugger::new();
    load_hit_and_unload(&mut debugger);

    assert_hit(&debugger.source_file(STRING));
    assert_hit(&debugger.source_file(VECTOR));
}

#[test_log::test]
fn late_reply_after_unload_is_forwarded() {
    let mut debugger = Debugger::new();
    debugger.event(vec![class_prepare(STRING_SIGNATURE, STRING)]);
    let outcome = debugger.frames(&[location(STRING, 1)]);
    debugger.event(vec![class_unload(STRING_SIGNATURE)]);

    let id = sent_ids(&outcome)[0];
    let late = Packet::new_reply(id, ErrorCode::NONE, Bytes::new()).to_bytes();
    let forwarded = debugger.scache.on_downstream_packet(late.clone());
    assert_eq!(forwarded.edict.downstream, vec![late]);
}

#[test_log::test]
fn resume_flushes_the_cache() {
    for resume in [
        command(100, &virtual_machine::Resume, IdSizes::default()),
        command(
            100,
            &thread_reference::Resume {
                thread: ThreadId::new(1),
            },
            IdSizes::default(),
        ),
    ] {
        let mut debugger = Debugger::new();
        let outcome = debugger.frames(&[location(STRING, 1)]);
        debugger.answer_all(&outcome);
        assert_hit(&debugger.source_file(STRING));

        let pending = debugger.frames(&[location(VECTOR, 1)]);
        let forwarded = debugger.scache.on_upstream_packet(resume.clone());
        assert_eq!(forwarded.edict.upstream, vec![resume]);

        assert_miss(&debugger.source_file(STRING));
        // replies to synthetic commands of the previous generation are someone else's
        let stale = sent_ids(&pending)[0];
        let reply = Packet::new_reply(stale, ErrorCode::NONE, Bytes::new()).to_bytes();
        let outcome = debugger.scache.on_downstream_packet(reply.clone());
        assert_eq!(outcome.edict.downstream, vec![reply]);

        // synthetic ids are not reused by the next generation
        let next = debugger.frames(&[location(VECTOR, 1)]);
        let old = sent_ids(&pending).into_iter().collect::<HashSet<_>>();
        assert!(sent_ids(&next).iter().all(|id| !old.contains(id)));
    }
}

#[test_log::test]
fn truncated_packet_disables_the_cache() {
    let mut debugger = Debugger::new();
    debugger.send(&AllClasses);
    let good = command(debugger.ids.next(), &AllClasses, debugger.id_sizes);
    let mut bad = good.to_vec();
    bad[3] += 2;
    let bad = Bytes::from(bad);
    let outcome = debugger.scache.on_upstream_packet(bad.clone());
    assert_eq!(outcome.edict.upstream, vec![bad]);
    assert!(!debugger.scache.is_enabled());

    let outcome = debugger.frames(&[location(STRING, 1)]);
    assert!(outcome.edict.upstream.is_empty());
    assert_eq!(outcome.edict.downstream.len(), 1);
}

#[test_log::test]
fn bypass_mode_never_speculates() {
    let mut debugger = Debugger::with_config(SCacheConfig::bypass());
    let outcome = debugger.frames(&[location(STRING, 1)]);
    assert!(outcome.edict.upstream.is_empty());
    assert_eq!(outcome.journal, outcome.edict);

    // reset does not enable a cache the configuration disabled
    debugger.scache.reset();
    assert!(!debugger.scache.is_enabled());
}

#[test_log::test]
fn synthetic_ids_skip_ids_pending_from_the_debugger() {
    let mut debugger = Debugger::new();
    let pending = 0x8000_0000;
    let forwarded = debugger.scache.on_upstream_packet(
        Packet::new_command(pending, CommandData::new(1, 1), Bytes::new()).to_bytes(),
    );
    assert_eq!(forwarded.edict.upstream.len(), 1);

    let outcome = debugger.frames(&[location(STRING, 1)]);
    assert!(!sent_ids(&outcome).contains(&pending));
}

#[test_log::test]
fn packets_shorter_than_a_header_are_forwarded() {
    let scache = SCache::default();
    let short = Bytes::from_static(&[0, 0, 0]);
    assert!(short.len() < HEADER_LENGTH);
    let outcome = scache.on_downstream_packet(short.clone());
    assert_eq!(outcome.edict.downstream, vec![short]);
    assert!(!scache.is_enabled());
}
