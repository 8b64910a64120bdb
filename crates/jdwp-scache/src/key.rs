//! Cache keys: one variant per keyable command, holding the ids the answer depends on

use jdwp_types::command_set::{CLASS_TYPE, METHOD, REFERENCE_TYPE};
use jdwp_types::{class_type, method, reference_type};
use jdwp_types::{Location, MethodId, ReferenceTypeId};
use jdwp_wire::codec::{DecodeJdwpDataError, JdwpDecoder};
use jdwp_wire::commands::class_type::Superclass;
use jdwp_wire::commands::method::{IsObsolete, LineTable, VariableTableWithGeneric};
use jdwp_wire::commands::reference_type::{
    Interfaces, MethodsWithGeneric, SourceDebugExtension, SourceFile,
};
use jdwp_wire::commands::JdwpCommand;
use jdwp_wire::id_sizes::IdSizes;
use jdwp_wire::packet::{CommandData, Packet};

/// Identifies a cacheable question together with its target. Equal keys are answered by equal
/// reply payloads for as long as the class they were derived from stays loaded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Superclass(ReferenceTypeId),
    SourceFile(ReferenceTypeId),
    Interfaces(ReferenceTypeId),
    SourceDebugExtension(ReferenceTypeId),
    MethodsWithGeneric(ReferenceTypeId),
    LineTable(ReferenceTypeId, MethodId),
    IsObsolete(ReferenceTypeId, MethodId),
    VariableTableWithGeneric(ReferenceTypeId, MethodId),
}

impl Key {
    /// Reads the key of a command, or `None` if the command is not keyable
    pub fn from_command(
        command: CommandData,
        decoder: &mut JdwpDecoder,
    ) -> Result<Option<Key>, DecodeJdwpDataError> {
        let key = match (command.command_set(), command.command()) {
            (CLASS_TYPE, class_type::SUPERCLASS) => {
                let Superclass { clazz } = decoder.get()?;
                Key::Superclass(clazz.cast())
            }
            (REFERENCE_TYPE, reference_type::SOURCE_FILE) => {
                Key::SourceFile(decoder.get::<SourceFile>()?.ref_type)
            }
            (REFERENCE_TYPE, reference_type::INTERFACES) => {
                Key::Interfaces(decoder.get::<Interfaces>()?.ref_type)
            }
            (REFERENCE_TYPE, reference_type::SOURCE_DEBUG_EXTENSION) => {
                Key::SourceDebugExtension(decoder.get::<SourceDebugExtension>()?.ref_type)
            }
            (REFERENCE_TYPE, reference_type::METHODS_WITH_GENERIC) => {
                Key::MethodsWithGeneric(decoder.get::<MethodsWithGeneric>()?.ref_type)
            }
            (METHOD, method::LINE_TABLE) => {
                let LineTable {
                    ref_type,
                    method_id,
                } = decoder.get()?;
                Key::LineTable(ref_type, method_id)
            }
            (METHOD, method::IS_OBSOLETE) => {
                let IsObsolete {
                    ref_type,
                    method_id,
                } = decoder.get()?;
                Key::IsObsolete(ref_type, method_id)
            }
            (METHOD, method::VARIABLE_TABLE_WITH_GENERIC) => {
                let VariableTableWithGeneric {
                    ref_type,
                    method_id,
                } = decoder.get()?;
                Key::VariableTableWithGeneric(ref_type, method_id)
            }
            _ => return Ok(None),
        };
        Ok(Some(key))
    }

    /// Every key worth asking for ahead of time once a frame at `location` is on screen
    pub fn speculations(location: &Location) -> impl Iterator<Item = Key> {
        let class = location.class;
        let method = location.method;
        let superclass = (!location.is_interface()).then_some(Key::Superclass(class));
        superclass.into_iter().chain([
            Key::LineTable(class, method),
            Key::SourceFile(class),
            Key::IsObsolete(class, method),
            Key::SourceDebugExtension(class),
            Key::Interfaces(class),
            Key::MethodsWithGeneric(class),
            Key::VariableTableWithGeneric(class, method),
        ])
    }

    /// The class this key was derived from
    pub fn class(&self) -> ReferenceTypeId {
        match *self {
            Key::Superclass(class)
            | Key::SourceFile(class)
            | Key::Interfaces(class)
            | Key::SourceDebugExtension(class)
            | Key::MethodsWithGeneric(class)
            | Key::LineTable(class, _)
            | Key::IsObsolete(class, _)
            | Key::VariableTableWithGeneric(class, _) => class,
        }
    }

    pub fn command_data(&self) -> CommandData {
        match self {
            Key::Superclass(_) => Superclass::command_data(),
            Key::SourceFile(_) => SourceFile::command_data(),
            Key::Interfaces(_) => Interfaces::command_data(),
            Key::SourceDebugExtension(_) => SourceDebugExtension::command_data(),
            Key::MethodsWithGeneric(_) => MethodsWithGeneric::command_data(),
            Key::LineTable(..) => LineTable::command_data(),
            Key::IsObsolete(..) => IsObsolete::command_data(),
            Key::VariableTableWithGeneric(..) => VariableTableWithGeneric::command_data(),
        }
    }

    /// The command that asks the VM for this key
    pub fn to_packet(&self, id: u32, id_sizes: IdSizes) -> Packet {
        match *self {
            Key::Superclass(ref_type) => Superclass {
                clazz: ref_type.cast(),
            }
            .to_packet(id, id_sizes),
            Key::SourceFile(ref_type) => SourceFile { ref_type }.to_packet(id, id_sizes),
            Key::Interfaces(ref_type) => Interfaces { ref_type }.to_packet(id, id_sizes),
            Key::SourceDebugExtension(ref_type) => {
                SourceDebugExtension { ref_type }.to_packet(id, id_sizes)
            }
            Key::MethodsWithGeneric(ref_type) => {
                MethodsWithGeneric { ref_type }.to_packet(id, id_sizes)
            }
            Key::LineTable(ref_type, method_id) => LineTable {
                ref_type,
                method_id,
            }
            .to_packet(id, id_sizes),
            Key::IsObsolete(ref_type, method_id) => IsObsolete {
                ref_type,
                method_id,
            }
            .to_packet(id, id_sizes),
            Key::VariableTableWithGeneric(ref_type, method_id) => VariableTableWithGeneric {
                ref_type,
                method_id,
            }
            .to_packet(id, id_sizes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jdwp_types::TypeTag;

    fn location(tag: u8) -> Location {
        Location {
            tag,
            class: ReferenceTypeId::new(0xAABB),
            method: MethodId::new(1),
            index: 0,
        }
    }

    #[test]
    fn kinds_never_collide() {
        let class = ReferenceTypeId::new(5);
        let method = MethodId::new(5);
        assert_ne!(Key::SourceFile(class), Key::Interfaces(class));
        assert_ne!(Key::LineTable(class, method), Key::IsObsolete(class, method));
    }

    #[test]
    fn class_frames_speculate_every_kind() {
        let keys = Key::speculations(&location(TypeTag::Class.repr())).collect::<Vec<_>>();
        assert_eq!(keys.len(), 8);
        assert!(keys.iter().all(|key| key.class() == ReferenceTypeId::new(0xAABB)));
        assert!(keys.contains(&Key::Superclass(ReferenceTypeId::new(0xAABB))));
    }

    #[test]
    fn interface_frames_skip_superclass() {
        let keys = Key::speculations(&location(TypeTag::Interface.repr())).collect::<Vec<_>>();
        assert_eq!(keys.len(), 7);
        assert!(!keys.iter().any(|key| matches!(key, Key::Superclass(_))));
    }

    #[test]
    fn unknown_tags_are_treated_as_classes() {
        assert_eq!(Key::speculations(&location(0)).count(), 8);
    }

    #[test]
    fn packets_decode_back_to_their_key() {
        let sizes = IdSizes::new(8, 4, 8, 2, 8).unwrap();
        for key in Key::speculations(&location(TypeTag::Class.repr())) {
            let packet = key.to_packet(0x8000_0001, sizes);
            let command = packet.header().command().unwrap();
            assert_eq!(command, key.command_data());
            let decoded = Key::from_command(command, &mut packet.decoder(sizes)).unwrap();
            assert_eq!(decoded, Some(key));
        }
    }

    #[test]
    fn other_commands_are_not_keyable() {
        let mut decoder = JdwpDecoder::new(IdSizes::default(), bytes::Bytes::new());
        let frames = CommandData::new(11, 6);
        assert_eq!(Key::from_command(frames, &mut decoder), Ok(None));
    }
}
