//! Packets and a scripted VM shared by the tests of several crates

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use jdwp_wire::codec::encode_payload;
use jdwp_wire::commands::class_type::SuperclassReply;
use jdwp_wire::commands::event::{Composite, Event};
use jdwp_wire::commands::method::{
    IsObsoleteReply, Line, LineTableReply, VariableTableWithGenericReply,
};
use jdwp_wire::commands::reference_type::{
    InterfacesReply, MethodsWithGenericReply, SourceDebugExtensionReply, SourceFileReply,
};
use jdwp_wire::commands::thread_reference::{FrameInfo, Frames, FramesReply};
use jdwp_wire::commands::virtual_machine::IdSizesReply;
use jdwp_wire::commands::{reply_packet, JdwpCommand};
use jdwp_wire::framing::PacketCodec;
use jdwp_wire::id_sizes::IdSizes;
use jdwp_wire::jdwp_types::*;
use jdwp_wire::packet::{CommandData, ErrorCode, Packet};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Framed;
use tracing::{debug, trace};

/// The handshake both sides send before the first packet
pub const HANDSHAKE: &[u8; 14] = b"JDWP-Handshake";

/// Hands out command ids the way a debugger does, counting up from 1
#[derive(Debug)]
pub struct IdGenerator {
    next: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// A location in method `method` of class `class`
pub fn location(class: u64, method: u64) -> Location {
    Location {
        tag: TypeTag::Class.repr(),
        class: ReferenceTypeId::new(class),
        method: MethodId::new(method),
        index: 0,
    }
}

/// Encodes a typed command
pub fn command<C: JdwpCommand>(id: u32, command: &C, id_sizes: IdSizes) -> Bytes {
    command.to_packet(id, id_sizes).to_bytes()
}

/// Encodes a successful typed reply
pub fn reply<R: jdwp_wire::codec::JdwpEncodable>(id: u32, reply: &R, id_sizes: IdSizes) -> Bytes {
    reply_packet(id, reply, id_sizes).to_bytes()
}

/// A reply carrying only an error code
pub fn error_reply(id: u32, error: ErrorConstant) -> Bytes {
    Packet::new_reply(id, ErrorCode::new(error.repr()), Bytes::new()).to_bytes()
}

/// A Frames reply with one frame per location
pub fn frames_reply(id: u32, locations: &[Location], id_sizes: IdSizes) -> Bytes {
    reply(id, &stack(locations), id_sizes)
}

fn stack(locations: &[Location]) -> FramesReply {
    let frames = locations
        .iter()
        .enumerate()
        .map(|(index, location)| FrameInfo {
            frame_id: FrameId::new(index as u64 + 1),
            location: *location,
        })
        .collect();
    FramesReply { frames }
}

/// An IDSizes reply announcing `id_sizes`
pub fn id_sizes_reply(id: u32, id_sizes: IdSizes) -> Bytes {
    reply(id, &IdSizesReply::from(id_sizes), id_sizes)
}

/// A composite event command from the VM
pub fn composite(id: u32, events: Vec<Event>, id_sizes: IdSizes) -> Bytes {
    command(
        id,
        &Composite {
            suspend_policy: SuspendPolicy::All,
            events,
        },
        id_sizes,
    )
}

pub fn class_prepare(signature: &str, class: u64) -> Event {
    Event::ClassPrepare {
        request_id: 1,
        thread: ThreadId::new(1),
        ref_type_tag: TypeTag::Class.repr(),
        type_id: ReferenceTypeId::new(class),
        signature: signature.to_string(),
        status: ClassStatus::from_bits(7),
    }
}

pub fn class_unload(signature: &str) -> Event {
    Event::ClassUnload {
        request_id: 2,
        signature: signature.to_string(),
    }
}

/// The payload a [FakeVm] answers a command with, or `None` for commands it does not know.
///
/// Answers depend only on the command and its ids, so the same question always gets the same
/// answer.
pub fn canned_answer(command: CommandData, payload: Bytes, id_sizes: IdSizes) -> Option<Bytes> {
    use jdwp_wire::commands::class_type::Superclass;
    use jdwp_wire::commands::method::{IsObsolete, LineTable, VariableTableWithGeneric};
    use jdwp_wire::commands::reference_type::{
        Interfaces, MethodsWithGeneric, SourceDebugExtension, SourceFile,
    };

    let mut decoder = jdwp_wire::codec::JdwpDecoder::new(id_sizes, payload);
    let answer = if command == jdwp_wire::commands::virtual_machine::IdSizes::command_data() {
        encode_payload(id_sizes, &IdSizesReply::from(id_sizes))
    } else if command == Superclass::command_data() {
        let Superclass { clazz } = decoder.get().ok()?;
        encode_payload(
            id_sizes,
            &SuperclassReply {
                superclass: ClassId::new(clazz.get() + 1),
            },
        )
    } else if command == SourceFile::command_data() {
        let SourceFile { ref_type } = decoder.get().ok()?;
        encode_payload(
            id_sizes,
            &SourceFileReply {
                source_file: format!("Class{:x}.java", ref_type.get()),
            },
        )
    } else if command == Interfaces::command_data() {
        encode_payload(id_sizes, &InterfacesReply { interfaces: vec![] })
    } else if command == SourceDebugExtension::command_data() {
        encode_payload(
            id_sizes,
            &SourceDebugExtensionReply {
                extension: "SMAP".to_string(),
            },
        )
    } else if command == MethodsWithGeneric::command_data() {
        encode_payload(id_sizes, &MethodsWithGenericReply { declared: vec![] })
    } else if command == LineTable::command_data() {
        let LineTable { method_id, .. } = decoder.get().ok()?;
        encode_payload(
            id_sizes,
            &LineTableReply {
                start: 0,
                end: 10,
                lines: vec![Line {
                    line_code_index: 0,
                    line_number: method_id.get() as Int,
                }],
            },
        )
    } else if command == IsObsolete::command_data() {
        encode_payload(id_sizes, &IsObsoleteReply { is_obsolete: false })
    } else if command == VariableTableWithGeneric::command_data() {
        encode_payload(
            id_sizes,
            &VariableTableWithGenericReply {
                arg_count: 0,
                slots: vec![],
            },
        )
    } else {
        return None;
    };
    Some(answer)
}

/// A VM that accepts the handshake and answers every command with [canned_answer]. Every
/// thread is suspended with the same stack.
#[derive(Debug, Default)]
pub struct FakeVm {
    id_sizes: IdSizes,
    stack: Vec<Location>,
}

impl FakeVm {
    pub fn new(id_sizes: IdSizes) -> Self {
        Self {
            id_sizes,
            stack: Vec::new(),
        }
    }

    /// Answers Frames commands with one frame per location
    pub fn with_stack(mut self, stack: Vec<Location>) -> Self {
        self.stack = stack;
        self
    }

    fn answer(&self, packet: &Packet, command: CommandData) -> Bytes {
        if command == Frames::command_data() {
            return encode_payload(self.id_sizes, &stack(&self.stack));
        }
        canned_answer(command, packet.payload().clone(), self.id_sizes).unwrap_or_default()
    }

    /// Serves a single connection until the peer hangs up, returning every command received.
    ///
    /// Commands without an answer get an empty successful reply.
    pub async fn serve<S>(&self, mut stream: S) -> io::Result<Vec<Packet>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut handshake = [0u8; HANDSHAKE.len()];
        stream.read_exact(&mut handshake).await?;
        if &handshake != HANDSHAKE {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "bad handshake"));
        }
        stream.write_all(HANDSHAKE).await?;
        debug!("fake vm accepted handshake");

        let mut framed = Framed::new(stream, PacketCodec);
        let mut received = Vec::new();
        while let Some(frame) = framed.next().await {
            let packet = Packet::decode(&frame?)
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
            let Some(command) = packet.header().command() else {
                continue;
            };
            trace!(id = packet.id(), %command, "fake vm got command");
            let payload = self.answer(&packet, command);
            framed
                .send(Packet::new_reply(packet.id(), ErrorCode::NONE, payload).to_bytes())
                .await?;
            received.push(packet);
        }
        Ok(received)
    }
}
