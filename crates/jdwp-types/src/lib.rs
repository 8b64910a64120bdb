//! # `jdwp-types`
//! The JDWP value types shared by the packet codec and the speculative cache, as defined by the
//! [jdwp-spec].
//!
//! [jdwp-spec]: https://docs.oracle.com/javase/8/docs/technotes/guides/jpda/jdwp-spec.html

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub use constants::*;
pub use ids::*;
use crate::private::Repr;
use thiserror::Error;

mod constants;
mod ids;
mod macros;

/// A byte value
pub type Byte = u8;
/// A boolean value, encoded as 0 for false and non-zero for true
pub type Boolean = bool;
/// A four-byte integer value
pub type Int = i32;
/// A eight-byte integer value
pub type Long = i64;

/// An executable location: a type tag, the declaring reference type, the method and the code
/// index within that method.
///
/// The type tag tells whether the reference type is a class or an interface. Code can live in an
/// interface (static initializers, default methods), which matters for commands that are only
/// defined on classes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Location {
    /// Type tag of the declaring type, as sent. Left undecoded since tags outside [TypeTag]
    /// show up in the wild (zero, in particular).
    pub tag: Byte,
    /// The declaring reference type
    pub class: ReferenceTypeId,
    /// The method
    pub method: MethodId,
    /// Code index within the method
    pub index: u64,
}

impl Location {
    /// The declaring type's kind, when the tag is a known one
    pub fn type_tag(&self) -> Result<TypeTag, UnknownTagError<u8>> {
        TypeTag::try_from(self.tag)
    }

    /// Whether the declaring type is known to be an interface
    pub fn is_interface(&self) -> bool {
        self.type_tag() == Ok(TypeTag::Interface)
    }
}

/// A value tagged with its type, as found in events and field modifications
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Value {
    Array(ObjectId),
    Byte(i8),
    Boolean(bool),
    Char(u16),
    Object(ObjectId),
    Float(f32),
    Double(f64),
    Int(i32),
    Long(i64),
    Short(i16),
    Void,
    String(ObjectId),
    Thread(ObjectId),
    ThreadGroup(ObjectId),
    ClassLoader(ObjectId),
    ClassObject(ObjectId),
}

impl Value {
    /// The tag this value is written with
    pub fn tag(&self) -> Tag {
        match self {
            Value::Array(_) => Tag::Array,
            Value::Byte(_) => Tag::Byte,
            Value::Boolean(_) => Tag::Boolean,
            Value::Char(_) => Tag::Char,
            Value::Object(_) => Tag::Object,
            Value::Float(_) => Tag::Float,
            Value::Double(_) => Tag::Double,
            Value::Int(_) => Tag::Int,
            Value::Long(_) => Tag::Long,
            Value::Short(_) => Tag::Short,
            Value::Void => Tag::Void,
            Value::String(_) => Tag::String,
            Value::Thread(_) => Tag::Thread,
            Value::ThreadGroup(_) => Tag::ThreadGroup,
            Value::ClassLoader(_) => Tag::ClassLoader,
            Value::ClassObject(_) => Tag::ClassObject,
        }
    }
}

/// Unknown tag constant
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown tag constant: {0}")]
pub struct UnknownTagError<T: Repr>(T);

mod private {
    use std::fmt::{Debug, Display};

    pub trait Identifiable {}
    pub trait Repr: Display + Debug {}

    impl Repr for u8 {}
    impl Repr for u16 {}
}
