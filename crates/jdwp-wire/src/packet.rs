//! The fixed JDWP packet header and whole packets

use crate::codec::JdwpDecoder;
use crate::id_sizes::IdSizes;
use bitfield::bitfield;
use bytes::{BufMut, Bytes, BytesMut};
use jdwp_types::{ErrorConstant, UnknownTagError};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Largest packet the length field can describe
pub const MAX_PACKET_LENGTH: usize = u32::MAX as usize;
/// Every packet starts with a header of exactly this many bytes
pub const HEADER_LENGTH: usize = size_of::<u32>() * 2 + size_of::<u8>() + size_of::<u16>();

bitfield! {
    #[derive(Copy, Clone, Eq, PartialEq)]
    #[repr(transparent)]
    pub struct Flags(u8);
    impl Debug;

    pub is_reply, set_is_reply: 7;
}

impl Flags {
    /// Flags of a command packet
    pub const fn new_command() -> Self {
        Flags(0)
    }

    /// Flags of a reply packet
    pub const fn new_reply() -> Self {
        Flags(0x80)
    }

    /// The raw flag byte
    pub const fn bits(&self) -> u8 {
        self.0
    }
}

/// The command set and command of a command packet
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CommandData {
    command_set: u8,
    command: u8,
}

impl CommandData {
    /// Creates a new command data struct
    pub const fn new(command_set: u8, command: u8) -> CommandData {
        Self {
            command_set,
            command,
        }
    }

    /// Gets the command set
    pub fn command_set(&self) -> u8 {
        self.command_set
    }

    /// Gets the command
    pub fn command(&self) -> u8 {
        self.command
    }
}

impl Display for CommandData {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.command_set, self.command)
    }
}

/// The error code of a reply packet, zero on success
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub struct ErrorCode {
    code: u16,
}

impl ErrorCode {
    /// The code of a successful reply
    pub const NONE: ErrorCode = ErrorCode { code: 0 };

    pub const fn new(code: u16) -> ErrorCode {
        Self { code }
    }

    /// Gets the code
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Whether the reply reports a failure
    pub fn is_error(&self) -> bool {
        self.code != 0
    }

    /// The named constant for this code, if it is a known one
    pub fn constant(&self) -> Result<ErrorConstant, UnknownTagError<u16>> {
        ErrorConstant::try_from(self.code)
    }
}

/// What the last two header bytes hold
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HeaderKind {
    /// Command set and command of a command packet
    Command(CommandData),
    /// Error code of a reply packet
    Reply(ErrorCode),
}

/// Errors raised while reading the fixed part of a packet
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    #[error("{available} bytes are not enough for a {HEADER_LENGTH} byte packet header")]
    HeaderTooShort { available: usize },
    #[error("declared packet length {length} is shorter than the packet header")]
    InvalidLength { length: u32 },
    #[error("declared packet length {length} exceeds the {available} bytes available")]
    Truncated { length: u32, available: usize },
    #[error("{length} is larger than max packet size: {MAX_PACKET_LENGTH}")]
    TooLarge { length: usize },
}

/// A decoded packet header
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Header {
    length: u32,
    id: u32,
    flags: Flags,
    kind: HeaderKind,
}

impl Header {
    /// Reads a header from the front of `src`, checking that the declared length fits in `src`
    pub fn decode(src: &[u8]) -> Result<Header, PacketError> {
        let Some(raw) = src.first_chunk::<HEADER_LENGTH>() else {
            return Err(PacketError::HeaderTooShort {
                available: src.len(),
            });
        };
        let length = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
        if (length as usize) < HEADER_LENGTH {
            return Err(PacketError::InvalidLength { length });
        }
        if length as usize > src.len() {
            return Err(PacketError::Truncated {
                length,
                available: src.len(),
            });
        }
        let id = u32::from_be_bytes([raw[4], raw[5], raw[6], raw[7]]);
        let flags = Flags(raw[8]);
        let kind = if flags.is_reply() {
            HeaderKind::Reply(ErrorCode::new(u16::from_be_bytes([raw[9], raw[10]])))
        } else {
            HeaderKind::Command(CommandData::new(raw[9], raw[10]))
        };
        Ok(Header {
            length,
            id,
            flags,
            kind,
        })
    }

    /// Writes this header in its wire layout
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_u32(self.length);
        dst.put_u32(self.id);
        dst.put_u8(self.flags.bits());
        match self.kind {
            HeaderKind::Command(command) => {
                dst.put_u8(command.command_set());
                dst.put_u8(command.command());
            }
            HeaderKind::Reply(error_code) => dst.put_u16(error_code.code()),
        }
    }

    /// Gets the total length of the packet
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Gets the id of the packet
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Gets the flags for this packet
    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn kind(&self) -> HeaderKind {
        self.kind
    }

    pub fn is_reply(&self) -> bool {
        self.flags.is_reply()
    }

    /// Gets the command for a command header
    pub fn command(&self) -> Option<CommandData> {
        match self.kind {
            HeaderKind::Command(command) => Some(command),
            HeaderKind::Reply(_) => None,
        }
    }

    /// Gets the error code for a reply header
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self.kind {
            HeaderKind::Reply(error_code) => Some(error_code),
            HeaderKind::Command(_) => None,
        }
    }

    /// Whether this is a command packet for the given command set and command
    pub fn is_a(&self, command_set: u8, command: u8) -> bool {
        self.command() == Some(CommandData::new(command_set, command))
    }
}

/// A whole packet: its header and the payload that follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    header: Header,
    payload: Bytes,
}

impl Packet {
    /// Decodes a packet. The payload shares the buffer of `bytes`; anything past the declared
    /// length is ignored.
    pub fn decode(bytes: &Bytes) -> Result<Packet, PacketError> {
        let header = Header::decode(bytes)?;
        let payload = bytes.slice(HEADER_LENGTH..header.length() as usize);
        Ok(Packet { header, payload })
    }

    pub fn new_command(id: u32, command: CommandData, payload: Bytes) -> Self {
        Self::new(id, Flags::new_command(), HeaderKind::Command(command), payload)
    }

    pub fn new_reply(id: u32, error_code: ErrorCode, payload: Bytes) -> Self {
        Self::new(id, Flags::new_reply(), HeaderKind::Reply(error_code), payload)
    }

    fn new(id: u32, flags: Flags, kind: HeaderKind, payload: Bytes) -> Self {
        let length = (HEADER_LENGTH + payload.len()) as u32;
        Self {
            header: Header {
                length,
                id,
                flags,
                kind,
            },
            payload,
        }
    }

    /// Gets the header for this packet
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Gets the payload for this packet
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn id(&self) -> u32 {
        self.header.id()
    }

    /// A decoder over the payload, reading ids at the given widths
    pub fn decoder(&self, id_sizes: IdSizes) -> JdwpDecoder {
        JdwpDecoder::new(id_sizes, self.payload.clone())
    }

    /// Encodes the packet into a fresh buffer
    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(self.header.length() as usize);
        self.header.encode(&mut dst);
        dst.put_slice(&self.payload);
        dst.freeze()
    }
}
