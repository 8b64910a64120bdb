use crate::id_sizes::{IdSizes as NegotiatedIdSizes, InvalidIdSizeError};
use jdwp_types::command_set::VIRTUAL_MACHINE;
use jdwp_types::virtual_machine::*;
use jdwp_types::{ClassStatus, Int, ReferenceTypeId};

command! {
    command_set: VIRTUAL_MACHINE;
    command: ALL_CLASSES;
    /// Reference types for every class currently loaded by the VM
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct AllClasses {} -> {
        pub classes: Vec<ClassReferenceWithSignature>,
    }
}

payload! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ClassReferenceWithSignature {
        /// Kind of the reference type, see [jdwp_types::TypeTag]
        pub type_tag: u8,
        pub id: ReferenceTypeId,
        pub signature: String,
        pub status: ClassStatus,
    }
}

command! {
    command_set: VIRTUAL_MACHINE;
    command: ID_SIZES;
    /// The width of every kind of id, in bytes
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct IdSizes {} -> {
        pub field_id_size: Int,
        pub method_id_size: Int,
        pub object_id_size: Int,
        pub reference_type_id_size: Int,
        pub frame_id_size: Int,
    }
}

impl IdSizesReply {
    /// Validates the reported widths
    pub fn id_sizes(&self) -> Result<NegotiatedIdSizes, InvalidIdSizeError> {
        NegotiatedIdSizes::new(
            self.field_id_size,
            self.method_id_size,
            self.object_id_size,
            self.reference_type_id_size,
            self.frame_id_size,
        )
    }
}

impl From<NegotiatedIdSizes> for IdSizesReply {
    fn from(sizes: NegotiatedIdSizes) -> Self {
        Self {
            field_id_size: sizes.field_id_size() as Int,
            method_id_size: sizes.method_id_size() as Int,
            object_id_size: sizes.object_id_size() as Int,
            reference_type_id_size: sizes.reference_type_id_size() as Int,
            frame_id_size: sizes.frame_id_size() as Int,
        }
    }
}

command! {
    command_set: VIRTUAL_MACHINE;
    command: RESUME;
    /// Resumes every thread of the VM
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Resume {} -> {}
}

command! {
    command_set: VIRTUAL_MACHINE;
    command: ALL_CLASSES_WITH_GENERIC;
    /// Like [AllClasses], with the generic signature of every class
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct AllClassesWithGeneric {} -> {
        pub classes: Vec<ClassReferenceWithGeneric>,
    }
}

payload! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ClassReferenceWithGeneric {
        /// Kind of the reference type, see [jdwp_types::TypeTag]
        pub type_tag: u8,
        pub id: ReferenceTypeId,
        pub signature: String,
        pub generic_signature: String,
        pub status: ClassStatus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_payload, JdwpDecoder};
    use crate::commands::JdwpCommand;
    use bytes::Bytes;

    #[test]
    fn id_sizes_reply_is_validated() {
        let reply = IdSizesReply {
            field_id_size: 8,
            method_id_size: 8,
            object_id_size: 8,
            reference_type_id_size: 8,
            frame_id_size: 5,
        };
        assert!(reply.id_sizes().is_err());

        let sizes = NegotiatedIdSizes::new(4, 4, 8, 8, 2).unwrap();
        assert_eq!(IdSizesReply::from(sizes).id_sizes(), Ok(sizes));
    }

    #[test]
    fn all_classes_reply_layout() {
        let sizes = NegotiatedIdSizes::uniform(4).unwrap();
        let payload = Bytes::from_static(&[
            0, 0, 0, 1, // one class
            1, // class
            0, 0, 0, 15, // id
            0, 0, 0, 3, b'L', b'A', b';', // signature
            0, 0, 0, 7, // status
        ]);
        let reply = JdwpDecoder::new(sizes, payload.clone())
            .get::<AllClassesReply>()
            .unwrap();
        assert_eq!(reply.classes.len(), 1);
        let class = &reply.classes[0];
        assert_eq!(class.type_tag, jdwp_types::TypeTag::Class.repr());
        assert_eq!(class.id, ReferenceTypeId::new(15));
        assert_eq!(class.signature, "LA;");
        assert!(class.status.initialized());
        assert_eq!(encode_payload(sizes, &reply), payload);
    }

    #[test]
    fn unit_commands_have_empty_payloads() {
        let packet = Resume.to_packet(3, NegotiatedIdSizes::default());
        assert!(packet.payload().is_empty());
        assert!(packet.header().is_a(1, 9));
    }
}
