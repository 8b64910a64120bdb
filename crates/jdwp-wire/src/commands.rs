//! The JDWP commands the cache needs to understand, grouped by command set.
//!
//! Every command is declared once with its command and reply layouts; encoding and decoding for
//! both directions are generated from that declaration.

use crate::codec::{encode_payload, JdwpDecodable, JdwpEncodable};
use crate::id_sizes::IdSizes;
use crate::packet::{CommandData, ErrorCode, Packet};

/// Declares a payload struct whose fields are encoded and decoded in declaration order
macro_rules! payload {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {}
    ) => {
        $(#[$meta])*
        $vis struct $name;

        impl $crate::codec::JdwpEncodable for $name {
            fn encode(&self, _encoder: &mut $crate::codec::JdwpEncoder) {}
        }

        impl $crate::codec::JdwpDecodable for $name {
            fn decode(
                _decoder: &mut $crate::codec::JdwpDecoder,
            ) -> Result<Self, $crate::codec::DecodeJdwpDataError> {
                Ok(Self)
            }
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($(#[$field_meta:meta])* $field_vis:vis $field:ident: $field_ty:ty),+
            $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($(#[$field_meta])* $field_vis $field: $field_ty,)+
        }

        impl $crate::codec::JdwpEncodable for $name {
            fn encode(&self, encoder: &mut $crate::codec::JdwpEncoder) {
                $(
                    encoder.put(&self.$field);
                )+
            }
        }

        impl $crate::codec::JdwpDecodable for $name {
            fn decode(
                decoder: &mut $crate::codec::JdwpDecoder,
            ) -> Result<Self, $crate::codec::DecodeJdwpDataError> {
                Ok(Self {
                    $(
                        $field: decoder.get()?,
                    )+
                })
            }
        }
    };
}

/// Declares a command, its reply, and binds them to a command set and command
macro_rules! command {
    (
        command_set: $command_set:expr;
        command: $command:expr;
        $(#[$meta:meta])*
        $vis:vis struct $command_id:ident { $($fields:tt)* } -> { $($reply_fields:tt)* }
    ) => {
        paste::paste! {
            payload! {
                $(#[$meta])*
                $vis struct $command_id { $($fields)* }
            }

            payload! {
                $(#[$meta])*
                $vis struct [<$command_id Reply>] { $($reply_fields)* }
            }

            impl $crate::commands::JdwpCommand for $command_id {
                type Reply = [<$command_id Reply>];

                fn command_data() -> $crate::packet::CommandData {
                    $crate::packet::CommandData::new($command_set, $command)
                }
            }
        }
    };
}

pub mod class_type;
pub mod event;
pub mod method;
pub mod reference_type;
pub mod thread_reference;
pub mod virtual_machine;

/// used for representing a JDWP command
pub trait JdwpCommand: Sized + JdwpEncodable + JdwpDecodable {
    type Reply: JdwpEncodable + JdwpDecodable;

    fn command_data() -> CommandData;

    /// Encodes this command as a packet with the given id
    fn to_packet(&self, id: u32, id_sizes: IdSizes) -> Packet {
        Packet::new_command(id, Self::command_data(), encode_payload(id_sizes, self))
    }
}

/// Encodes a successful reply as a packet with the given id
pub fn reply_packet<R: JdwpEncodable>(id: u32, reply: &R, id_sizes: IdSizes) -> Packet {
    Packet::new_reply(id, ErrorCode::NONE, encode_payload(id_sizes, reply))
}
