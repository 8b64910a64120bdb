use jdwp_types::command_set::REFERENCE_TYPE;
use jdwp_types::reference_type::*;
use jdwp_types::{Int, InterfaceId, MethodId, ReferenceTypeId};

command! {
    command_set: REFERENCE_TYPE;
    command: SOURCE_FILE;
    /// The source file name a reference type was compiled from
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SourceFile {
        pub ref_type: ReferenceTypeId,
    } -> {
        pub source_file: String,
    }
}

command! {
    command_set: REFERENCE_TYPE;
    command: INTERFACES;
    /// The interfaces a reference type declares to implement
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Interfaces {
        pub ref_type: ReferenceTypeId,
    } -> {
        pub interfaces: Vec<InterfaceId>,
    }
}

command! {
    command_set: REFERENCE_TYPE;
    command: SOURCE_DEBUG_EXTENSION;
    /// The SourceDebugExtension attribute (JSR-45 SMAP) of a reference type
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SourceDebugExtension {
        pub ref_type: ReferenceTypeId,
    } -> {
        pub extension: String,
    }
}

command! {
    command_set: REFERENCE_TYPE;
    command: METHODS_WITH_GENERIC;
    /// The methods a reference type declares, with generic signatures
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct MethodsWithGeneric {
        pub ref_type: ReferenceTypeId,
    } -> {
        pub declared: Vec<MethodWithGeneric>,
    }
}

payload! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct MethodWithGeneric {
        pub method_id: MethodId,
        pub name: String,
        pub signature: String,
        pub generic_signature: String,
        pub mod_bits: Int,
    }
}
