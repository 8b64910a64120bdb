use crate::constants::Tag;
use crate::private::Identifiable;
use std::any::type_name;
use std::fmt::{Debug, Display, Formatter};
use std::marker::PhantomData;

pub use identifiable_types::*;

/// Uniquely identifies an object in the target VM. An ObjectId of 0 is the null object.
pub type ObjectId = Id<Object>;
/// An object known to be a thread
pub type ThreadId = Id<Thread>;
/// Uniquely identifies a reference type (class, interface or array type) in the target VM.
///
/// The VM never reuses a reference type id for a different type during its lifetime, but a
/// debugger-side index must still tolerate a stale mapping after an unload it did not observe.
pub type ReferenceTypeId = Id<ReferenceType>;
/// A reference type known to be a class
pub type ClassId = Id<Class>;
/// A reference type known to be an interface
pub type InterfaceId = Id<Interface>;
/// Identifies a method within its declaring type. Only meaningful when paired with a
/// [ReferenceTypeId].
pub type MethodId = Id<Method>;
/// Identifies a field within its declaring type. Only meaningful when paired with a
/// [ReferenceTypeId].
pub type FieldId = Id<Field>;
/// Identifies a stack frame. Only valid while its thread stays suspended.
pub type FrameId = Id<Frame>;

/// Uniquely identifies some *thing* in the target VM.
///
/// Ids are at most eight bytes wide on the wire, so the raw value is always kept as a `u64`
/// regardless of the negotiated width.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct Id<T: Identifiable>(u64, PhantomData<T>);

impl<T: Identifiable> Id<T> {
    /// Creates a new [Id]. There's no guarantee that it's valid within the given VM's context.
    pub const fn new(id: u64) -> Self {
        Id(id, PhantomData)
    }

    /// Gets the raw id
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Reinterprets this id as an id of another kind, for commands that narrow a reference type
    /// to a class or an interface.
    pub const fn cast<U: Identifiable>(self) -> Id<U> {
        Id(self.0, PhantomData)
    }
}

impl<T: Identifiable> From<Id<T>> for u64 {
    fn from(value: Id<T>) -> Self {
        value.0
    }
}

impl<T: Identifiable + Debug> Debug for Id<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = type_name::<T>().rsplit("::").next().unwrap_or("?");
        write!(f, "{kind}({:#x})", self.0)
    }
}

impl<T: Identifiable> Display for Id<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// An object id together with the tag of the object's runtime type
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TaggedObjectId(Tag, ObjectId);

impl TaggedObjectId {
    /// Creates a new tagged object id
    pub const fn new(tag: Tag, id: ObjectId) -> Self {
        TaggedObjectId(tag, id)
    }

    /// Gets the tag for this object id
    pub fn tag(&self) -> Tag {
        self.0
    }

    /// Gets the object id
    pub fn id(&self) -> ObjectId {
        self.1
    }
}

mod identifiable_types {
    use crate::private::Identifiable;

    macro_rules! identifiables {
        ($($ty:ident)*) => {
            $(
                /// An identifiable type
                #[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
                pub enum $ty {}
                impl Identifiable for $ty {}
            )*
        };
    }

    identifiables!(Object Thread ReferenceType Class Interface Method Field Frame);
}
