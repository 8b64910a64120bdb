use jdwp_wire::codec::DecodeJdwpDataError;
use jdwp_wire::id_sizes::InvalidIdSizeError;
use jdwp_wire::packet::PacketError;
use thiserror::Error;

/// Anything that makes the cache give up on a session. Never surfaced to the transport: the
/// offending packet is forwarded and the cache drops into bypass mode.
#[derive(Debug, Error)]
pub enum SCacheError {
    #[error(transparent)]
    Packet(#[from] PacketError),
    #[error("failed to decode payload of packet {id}: {source}")]
    Payload {
        id: u32,
        #[source]
        source: DecodeJdwpDataError,
    },
    #[error(transparent)]
    Decode(#[from] DecodeJdwpDataError),
    #[error(transparent)]
    IdSizes(#[from] InvalidIdSizeError),
}

impl SCacheError {
    /// Attaches the id of the packet whose payload failed to decode
    pub(crate) fn in_packet(self, id: u32) -> Self {
        match self {
            SCacheError::Decode(source) => SCacheError::Payload { id, source },
            other => other,
        }
    }
}
