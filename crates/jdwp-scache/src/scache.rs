//! The orchestrator: runs both directions of traffic through triggers and the speculator

use crate::config::SCacheConfig;
use crate::error::SCacheError;
use crate::key::Key;
use crate::speculator::Speculator;
use crate::synthetic::{is_synthetic, SyntheticIds};
use crate::trigger::TriggerManager;
use bytes::Bytes;
use jdwp_types::Location;
use jdwp_wire::codec::JdwpDecoder;
use jdwp_wire::commands::event::{Composite, Event};
use jdwp_wire::commands::thread_reference::{self, Frames, FramesReply};
use jdwp_wire::commands::virtual_machine::{
    self, AllClasses, AllClassesReply, AllClassesWithGeneric, AllClassesWithGenericReply,
    IdSizes as IdSizesCommand, IdSizesReply,
};
use jdwp_wire::id_sizes::IdSizes;
use jdwp_wire::packet::{HeaderKind, Packet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, instrument, trace, warn, Span};

/// Packets to send or log, by direction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batches {
    /// Packets heading to the VM
    pub upstream: Vec<Bytes>,
    /// Packets heading to the debugger
    pub downstream: Vec<Bytes>,
}

impl Batches {
    fn upstream(packet: Bytes) -> Self {
        Self {
            upstream: vec![packet],
            downstream: Vec::new(),
        }
    }

    fn downstream(packet: Bytes) -> Self {
        Self {
            upstream: Vec::new(),
            downstream: vec![packet],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.upstream.is_empty() && self.downstream.is_empty()
    }
}

/// What became of a packet handed to the cache
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// What must actually be written to each side
    pub edict: Batches,
    /// The logical traffic, including packets the cache answered or swallowed
    pub journal: Batches,
}

impl Outcome {
    fn forward_upstream(packet: Bytes) -> Self {
        Self {
            edict: Batches::upstream(packet.clone()),
            journal: Batches::upstream(packet),
        }
    }

    fn forward_downstream(packet: Bytes) -> Self {
        Self {
            edict: Batches::downstream(packet.clone()),
            journal: Batches::downstream(packet),
        }
    }
}

/// A speculative look-aside cache sitting between a debugger and a VM.
///
/// The transport hands every packet to [on_upstream_packet](Self::on_upstream_packet) or
/// [on_downstream_packet](Self::on_downstream_packet) and writes out the returned edict. Both may
/// be called from different tasks; packets are processed one at a time.
#[derive(Debug)]
pub struct SCache {
    session: Mutex<Session>,
}

impl SCache {
    pub fn new(config: SCacheConfig) -> Self {
        Self {
            session: Mutex::new(Session::new(config)),
        }
    }

    /// Handles a packet sent by the debugger
    #[instrument(skip_all, fields(len = packet.len(), id = tracing::field::Empty))]
    pub fn on_upstream_packet(&self, packet: Bytes) -> Outcome {
        let mut session = self.lock();
        if !session.enabled {
            return Outcome::forward_upstream(packet);
        }
        match session.upstream(&packet) {
            Ok(outcome) => outcome,
            Err(err) => {
                session.disable(&err);
                Outcome::forward_upstream(packet)
            }
        }
    }

    /// Handles a packet sent by the VM
    #[instrument(skip_all, fields(len = packet.len(), id = tracing::field::Empty))]
    pub fn on_downstream_packet(&self, packet: Bytes) -> Outcome {
        let mut session = self.lock();
        if !session.enabled {
            return Outcome::forward_downstream(packet);
        }
        match session.downstream(&packet) {
            Ok(outcome) => outcome,
            Err(err) => {
                session.disable(&err);
                Outcome::forward_downstream(packet)
            }
        }
    }

    /// Flushes everything cached or pending and re-enables the cache if the configuration allows
    /// it. The negotiated id sizes are kept.
    pub fn reset(&self) {
        self.lock().reset();
    }

    /// Returns to the state right after construction
    pub fn close(&self) {
        let mut session = self.lock();
        let config = session.config.clone();
        *session = Session::new(config);
    }

    /// Whether packets are inspected at all
    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// The id sizes payloads are currently parsed with
    pub fn id_sizes(&self) -> IdSizes {
        self.lock().state.id_sizes
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SCache {
    fn default() -> Self {
        Self::new(SCacheConfig::default())
    }
}

/// Everything triggers may touch
#[derive(Debug)]
struct SessionState {
    max_speculated_frames: usize,
    id_sizes: IdSizes,
    speculator: Speculator,
    /// Locations from Frames replies, waiting to be speculated on
    wanted: Vec<Location>,
}

impl SessionState {
    fn flush(&mut self) {
        self.speculator = Speculator::new();
        self.wanted.clear();
    }
}

struct Session {
    config: SCacheConfig,
    enabled: bool,
    triggers: TriggerManager<SessionState>,
    synthetic_ids: SyntheticIds,
    state: SessionState,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("enabled", &self.enabled)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Session {
    fn new(config: SCacheConfig) -> Self {
        let mut triggers = TriggerManager::new();
        triggers.register_command_trigger::<virtual_machine::Resume>(on_resume);
        triggers.register_command_trigger::<thread_reference::Resume>(on_resume);
        triggers.register_command_trigger::<Composite>(on_composite);
        triggers.register_reply_trigger::<IdSizesCommand>(on_id_sizes);
        triggers.register_reply_trigger::<Frames>(on_frames);
        triggers.register_reply_trigger::<AllClasses>(on_all_classes);
        triggers.register_reply_trigger::<AllClassesWithGeneric>(on_all_classes_with_generic);
        Self {
            enabled: config.enabled,
            triggers,
            synthetic_ids: SyntheticIds::new(),
            state: SessionState {
                max_speculated_frames: config.max_speculated_frames,
                id_sizes: config.initial_id_sizes,
                speculator: Speculator::new(),
                wanted: Vec::new(),
            },
            config,
        }
    }

    fn upstream(&mut self, bytes: &Bytes) -> Result<Outcome, SCacheError> {
        let packet = Packet::decode(bytes)?;
        let id = packet.id();
        Span::current().record("id", id);
        let Some(command) = packet.header().command() else {
            warn!("debugger sent a reply, forwarding it");
            return Ok(Outcome::forward_upstream(bytes.clone()));
        };
        trace!(%command, "command from debugger");
        if is_synthetic(id) && self.state.speculator.is_pending(id) {
            warn!("debugger reused the id of a synthetic command");
        }

        let id_sizes = self.state.id_sizes;
        self.triggers
            .dispatch(&mut self.state, packet.header(), &mut packet.decoder(id_sizes))
            .map_err(|err| err.in_packet(id))?;

        let key = Key::from_command(command, &mut packet.decoder(id_sizes))
            .map_err(|err| SCacheError::from(err).in_packet(id))?;
        let Some(reply) = key.and_then(|key| self.state.speculator.answer(id, &key)) else {
            return Ok(Outcome::forward_upstream(bytes.clone()));
        };
        debug!(?key, "answered from cache");
        self.triggers.forget(id);
        let reply = reply.to_bytes();
        Ok(Outcome {
            edict: Batches::downstream(reply.clone()),
            journal: Batches {
                upstream: vec![bytes.clone()],
                downstream: vec![reply],
            },
        })
    }

    fn downstream(&mut self, bytes: &Bytes) -> Result<Outcome, SCacheError> {
        let packet = Packet::decode(bytes)?;
        let id = packet.id();
        Span::current().record("id", id);
        let id_sizes = self.state.id_sizes;
        let error_code = match packet.header().kind() {
            HeaderKind::Command(command) => {
                trace!(%command, "event from vm");
                self.triggers
                    .dispatch_event(&mut self.state, command, &mut packet.decoder(id_sizes))
                    .map_err(|err| err.in_packet(id))?;
                return Ok(Outcome::forward_downstream(bytes.clone()));
            }
            HeaderKind::Reply(error_code) => error_code,
        };

        if self.state.speculator.absorb(id, error_code, packet.payload()) {
            return Ok(Outcome {
                edict: Batches::default(),
                journal: Batches::downstream(bytes.clone()),
            });
        }
        if error_code.is_error() {
            trace!(code = error_code.code(), "error reply");
            self.triggers.forget(id);
            return Ok(Outcome::forward_downstream(bytes.clone()));
        }

        self.triggers
            .dispatch(&mut self.state, packet.header(), &mut packet.decoder(id_sizes))
            .map_err(|err| err.in_packet(id))?;
        let synthetic = self.speculate();
        Ok(Outcome {
            edict: Batches {
                upstream: synthetic.clone(),
                downstream: vec![bytes.clone()],
            },
            journal: Batches {
                upstream: synthetic,
                downstream: vec![bytes.clone()],
            },
        })
    }

    /// Issues synthetic commands for the locations collected by the last dispatch
    fn speculate(&mut self) -> Vec<Bytes> {
        if self.state.wanted.is_empty() {
            return Vec::new();
        }
        let wanted = std::mem::take(&mut self.state.wanted);
        let id_sizes = self.state.id_sizes;
        let triggers = &self.triggers;
        self.state
            .speculator
            .speculate(
                wanted,
                &mut self.synthetic_ids,
                |id| triggers.is_in_flight(id),
                id_sizes,
            )
            .iter()
            .map(Packet::to_bytes)
            .collect()
    }

    fn disable(&mut self, err: &SCacheError) {
        error!(%err, "disabling the cache for the rest of the session");
        self.enabled = false;
        self.state.flush();
    }

    fn reset(&mut self) {
        debug!("resetting the cache");
        self.state.flush();
        self.triggers.clear();
        self.enabled = self.config.enabled;
    }
}

fn on_resume(state: &mut SessionState, _: &mut JdwpDecoder) -> Result<(), SCacheError> {
    debug!("vm resumed, flushing the cache");
    state.flush();
    Ok(())
}

fn on_id_sizes(state: &mut SessionState, decoder: &mut JdwpDecoder) -> Result<(), SCacheError> {
    let reply = decoder.get::<IdSizesReply>()?;
    state.id_sizes = reply.id_sizes()?;
    debug!(id_sizes = ?state.id_sizes, "negotiated id sizes");
    Ok(())
}

fn on_frames(state: &mut SessionState, decoder: &mut JdwpDecoder) -> Result<(), SCacheError> {
    let reply = decoder.get::<FramesReply>()?;
    let max = state.max_speculated_frames;
    state
        .wanted
        .extend(reply.frames.into_iter().take(max).map(|frame| frame.location));
    Ok(())
}

fn on_all_classes(state: &mut SessionState, decoder: &mut JdwpDecoder) -> Result<(), SCacheError> {
    let reply = decoder.get::<AllClassesReply>()?;
    for class in &reply.classes {
        state
            .speculator
            .record_class_listing(&class.signature, class.id);
    }
    Ok(())
}

fn on_all_classes_with_generic(
    state: &mut SessionState,
    decoder: &mut JdwpDecoder,
) -> Result<(), SCacheError> {
    let reply = decoder.get::<AllClassesWithGenericReply>()?;
    for class in &reply.classes {
        state
            .speculator
            .record_class_listing(&class.signature, class.id);
    }
    Ok(())
}

fn on_composite(state: &mut SessionState, decoder: &mut JdwpDecoder) -> Result<(), SCacheError> {
    let composite = decoder.get::<Composite>()?;
    for event in &composite.events {
        match event {
            Event::ClassPrepare {
                type_id, signature, ..
            } => state.speculator.record_class_prepare(signature, *type_id),
            Event::ClassUnload { signature, .. } => state.speculator.on_class_unload(signature),
            _ => {}
        }
    }
    Ok(())
}
