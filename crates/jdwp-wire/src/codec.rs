//! Payload encoding and decoding, with identifier widths taken from the negotiated [IdSizes]

use crate::id_sizes::IdSizes;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use jdwp_types::*;
use thiserror::Error;

/// Encodable into a packet payload
pub trait JdwpEncodable {
    /// Encodes this into the encoder's buffer
    fn encode(&self, encoder: &mut JdwpEncoder);
}

/// Decodable from a packet payload
pub trait JdwpDecodable: Sized {
    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, DecodeJdwpDataError>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeJdwpDataError {
    #[error("Not enough bytes to decode type: needed {needed}, {remaining} remaining")]
    NotEnoughBytes { needed: usize, remaining: usize },
    #[error("Got negative integer {0} when only positive integers are expected")]
    UnexpectedNegativeInt(i32),
    #[error(transparent)]
    IllegalByteTag(#[from] UnknownTagError<u8>),
    #[error("string is not valid modified UTF-8")]
    InvalidString,
    #[error("event kind {0:?} cannot appear in a composite event")]
    UnexpectedEventKind(EventKind),
}

/// Reads values from a payload
#[derive(Debug)]
pub struct JdwpDecoder {
    id_sizes: IdSizes,
    data: Bytes,
}

impl JdwpDecoder {
    /// Creates a new decoder over `data`
    pub fn new(id_sizes: IdSizes, data: Bytes) -> Self {
        Self { id_sizes, data }
    }

    /// Decodes the next jdwp value
    pub fn get<T: JdwpDecodable>(&mut self) -> Result<T, DecodeJdwpDataError> {
        T::decode(self)
    }

    pub fn id_sizes(&self) -> IdSizes {
        self.id_sizes
    }

    /// Number of payload bytes not read yet
    pub fn remaining(&self) -> usize {
        self.data.remaining()
    }

    fn require(&self, needed: usize) -> Result<(), DecodeJdwpDataError> {
        if self.data.remaining() < needed {
            return Err(DecodeJdwpDataError::NotEnoughBytes {
                needed,
                remaining: self.data.remaining(),
            });
        }
        Ok(())
    }

    /// Takes the next `len` bytes without copying them
    pub fn take(&mut self, len: usize) -> Result<Bytes, DecodeJdwpDataError> {
        self.require(len)?;
        Ok(self.data.split_to(len))
    }

    /// Reads an unsigned big endian integer that is `width` bytes wide
    fn get_sized(&mut self, width: usize) -> Result<u64, DecodeJdwpDataError> {
        self.require(width)?;
        Ok(self.data.get_uint(width))
    }
}

/// Writes values into a payload
#[derive(Debug)]
pub struct JdwpEncoder {
    id_sizes: IdSizes,
    buffer: BytesMut,
}

impl JdwpEncoder {
    pub fn new(id_sizes: IdSizes) -> Self {
        Self {
            id_sizes,
            buffer: BytesMut::new(),
        }
    }

    /// Encodes the next jdwp value
    pub fn put<T: JdwpEncodable + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.encode(self);
        self
    }

    pub fn id_sizes(&self) -> IdSizes {
        self.id_sizes
    }

    /// The payload written so far
    pub fn finish(self) -> Bytes {
        self.buffer.freeze()
    }

    /// Writes the low `width` bytes of `value`, big endian
    fn put_sized(&mut self, value: u64, width: usize) {
        self.buffer.put_uint(value, width);
    }
}

/// Encodes a single value into a standalone payload
pub fn encode_payload<T: JdwpEncodable + ?Sized>(id_sizes: IdSizes, value: &T) -> Bytes {
    let mut encoder = JdwpEncoder::new(id_sizes);
    encoder.put(value);
    encoder.finish()
}

macro_rules! fixed_width {
    ($($ty:ty: $get:ident, $put:ident);* $(;)?) => {
        $(
            impl JdwpDecodable for $ty {
                fn decode(decoder: &mut JdwpDecoder) -> Result<Self, DecodeJdwpDataError> {
                    decoder.require(size_of::<$ty>())?;
                    Ok(decoder.data.$get())
                }
            }

            impl JdwpEncodable for $ty {
                fn encode(&self, encoder: &mut JdwpEncoder) {
                    encoder.buffer.$put(*self);
                }
            }
        )*
    };
}

fixed_width! {
    u8: get_u8, put_u8;
    i8: get_i8, put_i8;
    u16: get_u16, put_u16;
    i16: get_i16, put_i16;
    u32: get_u32, put_u32;
    i32: get_i32, put_i32;
    u64: get_u64, put_u64;
    i64: get_i64, put_i64;
    f32: get_f32, put_f32;
    f64: get_f64, put_f64;
}

impl JdwpDecodable for bool {
    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, DecodeJdwpDataError> {
        Ok(decoder.get::<u8>()? != 0)
    }
}

impl JdwpEncodable for bool {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.put(&u8::from(*self));
    }
}

impl JdwpDecodable for String {
    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, DecodeJdwpDataError> {
        let len = decoder.get::<u32>()? as usize;
        let bytes = decoder.take(len)?;
        cesu8::from_java_cesu8(&bytes)
            .map(|string| string.into_owned())
            .map_err(|_| DecodeJdwpDataError::InvalidString)
    }
}

impl JdwpEncodable for str {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        let bytes = cesu8::to_java_cesu8(self);
        encoder.put(&(bytes.len() as u32));
        encoder.buffer.put_slice(&bytes);
    }
}

impl JdwpEncodable for String {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.put(self.as_str());
    }
}

macro_rules! sized_id {
    (
        $(
            $($id_type:ty),*: $id_size:ident
        );*
        $(;)?
    ) => {
        $(
            $(
                impl JdwpDecodable for $id_type {
                    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, DecodeJdwpDataError> {
                        let width = decoder.id_sizes.$id_size();
                        decoder.get_sized(width).map(Id::new)
                    }
                }

                impl JdwpEncodable for $id_type {
                    fn encode(&self, encoder: &mut JdwpEncoder) {
                        let width = encoder.id_sizes.$id_size();
                        encoder.put_sized(self.get(), width);
                    }
                }
            )*
        )*
    };
}

sized_id! {
    ObjectId, ThreadId: object_id_size;
    ReferenceTypeId, ClassId, InterfaceId: reference_type_id_size;
    MethodId: method_id_size;
    FieldId: field_id_size;
    FrameId: frame_id_size;
}

macro_rules! tagged {
    ($($ty:ty),* $(,)?) => {
        $(
            impl JdwpDecodable for $ty {
                fn decode(decoder: &mut JdwpDecoder) -> Result<Self, DecodeJdwpDataError> {
                    Ok(<$ty>::try_from(decoder.get::<u8>()?)?)
                }
            }

            impl JdwpEncodable for $ty {
                fn encode(&self, encoder: &mut JdwpEncoder) {
                    encoder.put(&self.repr());
                }
            }
        )*
    };
}

tagged!(TypeTag, Tag, SuspendPolicy, EventKind);

impl JdwpDecodable for ClassStatus {
    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, DecodeJdwpDataError> {
        decoder.get::<u32>().map(ClassStatus::from_bits)
    }
}

impl JdwpEncodable for ClassStatus {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.put(&self.bits());
    }
}

impl JdwpDecodable for Location {
    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, DecodeJdwpDataError> {
        Ok(Location {
            tag: decoder.get()?,
            class: decoder.get()?,
            method: decoder.get()?,
            index: decoder.get()?,
        })
    }
}

impl JdwpEncodable for Location {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder
            .put(&self.tag)
            .put(&self.class)
            .put(&self.method)
            .put(&self.index);
    }
}

impl JdwpDecodable for TaggedObjectId {
    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, DecodeJdwpDataError> {
        Ok(TaggedObjectId::new(decoder.get()?, decoder.get()?))
    }
}

impl JdwpEncodable for TaggedObjectId {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.put(&self.tag()).put(&self.id());
    }
}

impl JdwpDecodable for Value {
    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, DecodeJdwpDataError> {
        let value = match decoder.get::<Tag>()? {
            Tag::Array => Value::Array(decoder.get()?),
            Tag::Byte => Value::Byte(decoder.get()?),
            Tag::Char => Value::Char(decoder.get()?),
            Tag::Object => Value::Object(decoder.get()?),
            Tag::Float => Value::Float(decoder.get()?),
            Tag::Double => Value::Double(decoder.get()?),
            Tag::Int => Value::Int(decoder.get()?),
            Tag::Long => Value::Long(decoder.get()?),
            Tag::Short => Value::Short(decoder.get()?),
            Tag::Void => Value::Void,
            Tag::Boolean => Value::Boolean(decoder.get()?),
            Tag::String => Value::String(decoder.get()?),
            Tag::Thread => Value::Thread(decoder.get()?),
            Tag::ThreadGroup => Value::ThreadGroup(decoder.get()?),
            Tag::ClassLoader => Value::ClassLoader(decoder.get()?),
            Tag::ClassObject => Value::ClassObject(decoder.get()?),
        };
        Ok(value)
    }
}

impl JdwpEncodable for Value {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.put(&self.tag());
        match self {
            Value::Array(id)
            | Value::Object(id)
            | Value::String(id)
            | Value::Thread(id)
            | Value::ThreadGroup(id)
            | Value::ClassLoader(id)
            | Value::ClassObject(id) => encoder.put(id),
            Value::Byte(v) => encoder.put(v),
            Value::Boolean(v) => encoder.put(v),
            Value::Char(v) => encoder.put(v),
            Value::Float(v) => encoder.put(v),
            Value::Double(v) => encoder.put(v),
            Value::Int(v) => encoder.put(v),
            Value::Long(v) => encoder.put(v),
            Value::Short(v) => encoder.put(v),
            Value::Void => encoder,
        };
    }
}

impl<T: JdwpDecodable> JdwpDecodable for Vec<T> {
    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, DecodeJdwpDataError> {
        let len = decoder.get::<i32>()?;
        if len < 0 {
            return Err(DecodeJdwpDataError::UnexpectedNegativeInt(len));
        }
        // every element takes at least one byte, so a bogus count cannot over-allocate
        let mut collect = Vec::with_capacity((len as usize).min(decoder.remaining()));
        for _ in 0..len {
            collect.push(decoder.get::<T>()?);
        }
        Ok(collect)
    }
}

impl<T: JdwpEncodable> JdwpEncodable for Vec<T> {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.put(&(self.len() as i32));
        for item in self {
            encoder.put(item);
        }
    }
}
