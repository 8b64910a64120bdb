use jdwp_types::class_type::*;
use jdwp_types::command_set::CLASS_TYPE;
use jdwp_types::ClassId;

command! {
    command_set: CLASS_TYPE;
    command: SUPERCLASS;
    /// The immediate superclass of a class, a null id for `java.lang.Object`
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Superclass {
        pub clazz: ClassId,
    } -> {
        pub superclass: ClassId,
    }
}
