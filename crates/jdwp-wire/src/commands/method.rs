use jdwp_types::command_set::METHOD;
use jdwp_types::method::*;
use jdwp_types::{Int, Long, MethodId, ReferenceTypeId};

command! {
    command_set: METHOD;
    command: LINE_TABLE;
    /// Maps code indices of a method to source lines
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct LineTable {
        pub ref_type: ReferenceTypeId,
        pub method_id: MethodId,
    } -> {
        pub start: Long,
        pub end: Long,
        pub lines: Vec<Line>,
    }
}

payload! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Line {
        pub line_code_index: Long,
        pub line_number: Int,
    }
}

command! {
    command_set: METHOD;
    command: IS_OBSOLETE;
    /// Whether a method was replaced by a class redefinition
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct IsObsolete {
        pub ref_type: ReferenceTypeId,
        pub method_id: MethodId,
    } -> {
        pub is_obsolete: bool,
    }
}

command! {
    command_set: METHOD;
    command: VARIABLE_TABLE_WITH_GENERIC;
    /// The local variables of a method, with generic signatures
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct VariableTableWithGeneric {
        pub ref_type: ReferenceTypeId,
        pub method_id: MethodId,
    } -> {
        pub arg_count: Int,
        pub slots: Vec<VariableSlot>,
    }
}

payload! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct VariableSlot {
        pub code_index: Long,
        pub name: String,
        pub signature: String,
        pub generic_signature: String,
        pub length: Int,
        pub slot: Int,
    }
}
