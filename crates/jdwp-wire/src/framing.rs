//! Splits a byte stream into whole JDWP packets, using [tokio-util]'s [Encoder] and [Decoder]
//! traits.
//!
//! Frames are handed out undecoded: the proxy passes them to the cache as-is.

use crate::packet::{PacketError, HEADER_LENGTH, MAX_PACKET_LENGTH};
use bytes::{BufMut, Bytes, BytesMut};
use std::io::ErrorKind;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{instrument, trace};

/// Most bytes reserved at once while waiting for the rest of a frame
const RESERVE_CHUNK: usize = 1 << 20;

/// Codec for framing jdwp packets. Any length the header can express is accepted.
#[derive(Debug, Default, Copy, Clone)]
pub struct PacketCodec;

impl Encoder<Bytes> for PacketCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > MAX_PACKET_LENGTH {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                PacketError::TooLarge { length: item.len() },
            ));
        }
        dst.reserve(item.len());
        dst.put(item);
        Ok(())
    }
}

impl Decoder for PacketCodec {
    type Item = Bytes;
    type Error = std::io::Error;

    #[instrument(level = "trace", skip_all, fields(buffered = src.len()))]
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(length) = src.first_chunk::<4>().map(|raw| u32::from_be_bytes(*raw)) else {
            trace!("current length of {} is not enough to read length of packet", src.len());
            return Ok(None);
        };
        trace!("got length for packet: {length}");
        if (length as usize) < HEADER_LENGTH {
            return Err(std::io::Error::new(
                ErrorKind::InvalidData,
                PacketError::InvalidLength { length },
            ));
        }
        let length = length as usize;
        if src.len() < length {
            trace!("current length of {} is not enough to read length of packet", src.len());
            src.reserve((length - src.len()).min(RESERVE_CHUNK));
            return Ok(None);
        }
        Ok(Some(src.split_to(length).freeze()))
    }
}
