//! constants

use crate::macros::tagged_type;
use bitfield::bitfield;

/// Command set numbers
pub mod command_set {
    /// VirtualMachine
    pub const VIRTUAL_MACHINE: u8 = 1;
    /// ReferenceType
    pub const REFERENCE_TYPE: u8 = 2;
    /// ClassType
    pub const CLASS_TYPE: u8 = 3;
    /// Method
    pub const METHOD: u8 = 6;
    /// ThreadReference
    pub const THREAD_REFERENCE: u8 = 11;
    /// Event, the only command set sent by the VM
    pub const EVENT: u8 = 64;
}

/// Commands of the VirtualMachine command set
#[allow(missing_docs)]
pub mod virtual_machine {
    pub const ALL_CLASSES: u8 = 3;
    pub const ID_SIZES: u8 = 7;
    pub const RESUME: u8 = 9;
    pub const ALL_CLASSES_WITH_GENERIC: u8 = 20;
}

/// Commands of the ReferenceType command set
#[allow(missing_docs)]
pub mod reference_type {
    pub const SOURCE_FILE: u8 = 7;
    pub const INTERFACES: u8 = 10;
    pub const SOURCE_DEBUG_EXTENSION: u8 = 12;
    pub const METHODS_WITH_GENERIC: u8 = 15;
}

/// Commands of the ClassType command set
#[allow(missing_docs)]
pub mod class_type {
    pub const SUPERCLASS: u8 = 1;
}

/// Commands of the Method command set
#[allow(missing_docs)]
pub mod method {
    pub const LINE_TABLE: u8 = 1;
    pub const IS_OBSOLETE: u8 = 4;
    pub const VARIABLE_TABLE_WITH_GENERIC: u8 = 5;
}

/// Commands of the ThreadReference command set
#[allow(missing_docs)]
pub mod thread_reference {
    pub const RESUME: u8 = 3;
    pub const FRAMES: u8 = 6;
}

/// Commands of the Event command set
#[allow(missing_docs)]
pub mod event {
    pub const COMPOSITE: u8 = 100;
}

tagged_type! {
    repr: u16;
    /// An error constant carried by reply packets
    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    #[allow(missing_docs)]
    pub enum ErrorConstant {
        None = 0,
        InvalidThread = 10,
        InvalidThreadGroup = 11,
        InvalidPriority = 12,
        ThreadNotSuspended = 13,
        ThreadSuspended = 14,
        ThreadNotAlive = 15,
        InvalidObject = 20,
        InvalidClass = 21,
        ClassNotPrepared = 22,
        InvalidMethodId = 23,
        InvalidLocation = 24,
        InvalidFieldId = 25,
        InvalidFrameId = 30,
        NoMoreFrames = 31,
        OpaqueFrame = 32,
        NotCurrentFrame = 33,
        TypeMismatch = 34,
        InvalidSlot = 35,
        Duplicate = 40,
        NotFound = 41,
        InvalidModule = 42,
        InvalidMonitor = 50,
        NotMonitorOwner = 51,
        Interrupt = 52,
        InvalidClassFormat = 60,
        CircularClassDefinition = 61,
        FailsVerification = 62,
        AddMethodNotImplemented = 63,
        SchemaChangeNotImplemented = 64,
        InvalidTypestate = 65,
        HierarchyChangeNotImplemented = 66,
        DeleteMethodNotImplemented = 67,
        UnsupportedVersion = 68,
        NamesDontMatch = 69,
        ClassModifiersChangeNotImplemented = 70,
        MethodModifiersChangeNotImplemented = 71,
        ClassAttributeChangeNotImplemented = 72,
        NotImplemented = 99,
        NullPointer = 100,
        AbsentInformation = 101,
        InvalidEventType = 102,
        IllegalArgument = 103,
        OutOfMemory = 110,
        AccessDenied = 111,
        VmDead = 112,
        Internal = 113,
        UnattachedThread = 115,
        InvalidTag = 500,
        AlreadyInvoking = 502,
        InvalidIndex = 503,
        InvalidLength = 504,
        InvalidString = 506,
        InvalidClassLoader = 507,
        InvalidArray = 508,
        TransportLoad = 509,
        TransportInit = 510,
        NativeMethod = 511,
        InvalidCount = 512,
    }
}

tagged_type! {
    /// The kind of a reference type
    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    pub enum TypeTag {
        /// ReferenceType is a class.
        Class = 1,
        /// ReferenceType is an interface.
        Interface = 2,
        /// Reference type is an array.
        Array = 3,
    }
}

tagged_type! {
    /// The tag of a value, an ASCII character on the wire
    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    pub enum Tag {
        /// '[' - an array object (objectID size).
        Array = 91,
        /// 'B' - a byte value (1 byte).
        Byte = 66,
        /// 'C' - a character value (2 bytes).
        Char = 67,
        /// 'L' - an object (objectID size).
        Object = 76,
        /// 'F' - a float value (4 bytes).
        Float = 70,
        /// 'D' - a double value (8 bytes).
        Double = 68,
        /// 'I' - an int value (4 bytes).
        Int = 73,
        /// 'J' - a long value (8 bytes).
        Long = 74,
        /// 'S' - a short value (2 bytes).
        Short = 83,
        /// 'V' - a void value (no bytes).
        Void = 86,
        /// 'Z' - a boolean value (1 byte).
        Boolean = 90,
        /// 's' - a String object (objectID size).
        String = 115,
        /// 't' - a Thread object (objectID size).
        Thread = 116,
        /// 'g' - a ThreadGroup object (objectID size).
        ThreadGroup = 103,
        /// 'l' - a ClassLoader object (objectID size).
        ClassLoader = 108,
        /// 'c' - a class object object (objectID size).
        ClassObject = 99,
    }
}

tagged_type! {
    /// Which threads the VM suspended when reporting an event
    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    pub enum SuspendPolicy {
        /// Nothing in the VM was suspended
        None = 0,
        /// Only the thread where the event started is suspended
        EventThread = 1,
        /// All threads are suspended
        All = 2,
    }
}

bitfield! {
    /// Preparation state of a class, as reported by class listings and CLASS_PREPARE
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct ClassStatus(u32);
    impl Debug;

    pub verified, _: 0;
    pub prepared, _: 1;
    pub initialized, _: 2;
    pub error, _: 3;
}

impl ClassStatus {
    /// Wraps raw status bits as read from the wire
    pub const fn from_bits(bits: u32) -> Self {
        ClassStatus(bits)
    }

    /// The raw status bits
    pub const fn bits(&self) -> u32 {
        self.0
    }
}

tagged_type! {
    /// Kind of an event inside an Event.Composite command
    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    #[allow(missing_docs)]
    pub enum EventKind {
        SingleStep = 1,
        Breakpoint = 2,
        FramePop = 3,
        Exception = 4,
        UserDefined = 5,
        ThreadStart = 6,
        ThreadDeath = 7,
        ClassPrepare = 8,
        ClassUnload = 9,
        ClassLoad = 10,
        FieldAccess = 20,
        FieldModification = 21,
        ExceptionCatch = 30,
        MethodEntry = 40,
        MethodExit = 41,
        MethodExitWithReturnValue = 42,
        MonitorContendedEnter = 43,
        MonitorContendedEntered = 44,
        MonitorWait = 45,
        MonitorWaited = 46,
        VmStart = 90,
        VmDeath = 99,
        /// Never sent across JDWP
        VmDisconnected = 100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UnknownTagError;

    #[test]
    fn tagged_types_round_trip_through_their_repr() {
        assert_eq!(TypeTag::try_from(2), Ok(TypeTag::Interface));
        assert_eq!(u8::from(Tag::Object), b'L');
        assert_eq!(ErrorConstant::try_from(101), Ok(ErrorConstant::AbsentInformation));
        assert_eq!(EventKind::ClassUnload.repr(), 9);
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert_eq!(TypeTag::try_from(0), Err(UnknownTagError(0)));
        assert!(SuspendPolicy::try_from(3).is_err());
        assert!(ErrorConstant::try_from(1).is_err());
    }

    #[test]
    fn class_status_bits() {
        let status = ClassStatus(0b0111);
        assert!(status.verified());
        assert!(status.prepared());
        assert!(status.initialized());
        assert!(!status.error());
    }
}
