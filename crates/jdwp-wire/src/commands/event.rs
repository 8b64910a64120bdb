//! Events sent by the VM, always wrapped in a composite command

use crate::codec::{DecodeJdwpDataError, JdwpDecodable, JdwpDecoder, JdwpEncodable, JdwpEncoder};
use jdwp_types::command_set::EVENT;
use jdwp_types::event::*;
use jdwp_types::{
    ClassStatus, EventKind, FieldId, Int, Location, Long, ReferenceTypeId, SuspendPolicy,
    TaggedObjectId, ThreadId, Value,
};

command! {
    command_set: EVENT;
    command: COMPOSITE;
    /// One or more events reported together under a single suspend policy
    #[derive(Debug, Clone, PartialEq)]
    pub struct Composite {
        pub suspend_policy: SuspendPolicy,
        pub events: Vec<Event>,
    } -> {}
}

/// A single event of a composite
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// VM start, thread start or thread death
    Thread {
        kind: EventKind,
        request_id: Int,
        thread: ThreadId,
    },
    /// Single step, breakpoint, method entry or method exit
    Located {
        kind: EventKind,
        request_id: Int,
        thread: ThreadId,
        location: Location,
    },
    MethodExitWithReturnValue {
        request_id: Int,
        thread: ThreadId,
        location: Location,
        value: Value,
    },
    /// Contended monitor enter or entered
    MonitorContended {
        kind: EventKind,
        request_id: Int,
        thread: ThreadId,
        object: TaggedObjectId,
        location: Location,
    },
    MonitorWait {
        request_id: Int,
        thread: ThreadId,
        object: TaggedObjectId,
        location: Location,
        timeout: Long,
    },
    MonitorWaited {
        request_id: Int,
        thread: ThreadId,
        object: TaggedObjectId,
        location: Location,
        timed_out: bool,
    },
    Exception {
        request_id: Int,
        thread: ThreadId,
        location: Location,
        exception: TaggedObjectId,
        catch_location: Location,
    },
    ClassPrepare {
        request_id: Int,
        thread: ThreadId,
        ref_type_tag: u8,
        type_id: ReferenceTypeId,
        signature: String,
        status: ClassStatus,
    },
    ClassUnload {
        request_id: Int,
        signature: String,
    },
    FieldAccess {
        request_id: Int,
        thread: ThreadId,
        location: Location,
        ref_type_tag: u8,
        type_id: ReferenceTypeId,
        field_id: FieldId,
        object: TaggedObjectId,
    },
    FieldModification {
        request_id: Int,
        thread: ThreadId,
        location: Location,
        ref_type_tag: u8,
        type_id: ReferenceTypeId,
        field_id: FieldId,
        object: TaggedObjectId,
        value_to_be: Value,
    },
    VmDeath {
        request_id: Int,
    },
}

impl Event {
    /// The kind byte this event is sent with
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Thread { kind, .. }
            | Event::Located { kind, .. }
            | Event::MonitorContended { kind, .. } => *kind,
            Event::MethodExitWithReturnValue { .. } => EventKind::MethodExitWithReturnValue,
            Event::MonitorWait { .. } => EventKind::MonitorWait,
            Event::MonitorWaited { .. } => EventKind::MonitorWaited,
            Event::Exception { .. } => EventKind::Exception,
            Event::ClassPrepare { .. } => EventKind::ClassPrepare,
            Event::ClassUnload { .. } => EventKind::ClassUnload,
            Event::FieldAccess { .. } => EventKind::FieldAccess,
            Event::FieldModification { .. } => EventKind::FieldModification,
            Event::VmDeath { .. } => EventKind::VmDeath,
        }
    }
}

impl JdwpDecodable for Event {
    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, DecodeJdwpDataError> {
        let kind = decoder.get::<EventKind>()?;
        let event = match kind {
            EventKind::VmStart | EventKind::ThreadStart | EventKind::ThreadDeath => Event::Thread {
                kind,
                request_id: decoder.get()?,
                thread: decoder.get()?,
            },
            EventKind::SingleStep
            | EventKind::Breakpoint
            | EventKind::MethodEntry
            | EventKind::MethodExit => Event::Located {
                kind,
                request_id: decoder.get()?,
                thread: decoder.get()?,
                location: decoder.get()?,
            },
            EventKind::MethodExitWithReturnValue => Event::MethodExitWithReturnValue {
                request_id: decoder.get()?,
                thread: decoder.get()?,
                location: decoder.get()?,
                value: decoder.get()?,
            },
            EventKind::MonitorContendedEnter | EventKind::MonitorContendedEntered => {
                Event::MonitorContended {
                    kind,
                    request_id: decoder.get()?,
                    thread: decoder.get()?,
                    object: decoder.get()?,
                    location: decoder.get()?,
                }
            }
            EventKind::MonitorWait => Event::MonitorWait {
                request_id: decoder.get()?,
                thread: decoder.get()?,
                object: decoder.get()?,
                location: decoder.get()?,
                timeout: decoder.get()?,
            },
            EventKind::MonitorWaited => Event::MonitorWaited {
                request_id: decoder.get()?,
                thread: decoder.get()?,
                object: decoder.get()?,
                location: decoder.get()?,
                timed_out: decoder.get()?,
            },
            EventKind::Exception => Event::Exception {
                request_id: decoder.get()?,
                thread: decoder.get()?,
                location: decoder.get()?,
                exception: decoder.get()?,
                catch_location: decoder.get()?,
            },
            EventKind::ClassPrepare => Event::ClassPrepare {
                request_id: decoder.get()?,
                thread: decoder.get()?,
                ref_type_tag: decoder.get()?,
                type_id: decoder.get()?,
                signature: decoder.get()?,
                status: decoder.get()?,
            },
            EventKind::ClassUnload => Event::ClassUnload {
                request_id: decoder.get()?,
                signature: decoder.get()?,
            },
            EventKind::FieldAccess => Event::FieldAccess {
                request_id: decoder.get()?,
                thread: decoder.get()?,
                location: decoder.get()?,
                ref_type_tag: decoder.get()?,
                type_id: decoder.get()?,
                field_id: decoder.get()?,
                object: decoder.get()?,
            },
            EventKind::FieldModification => Event::FieldModification {
                request_id: decoder.get()?,
                thread: decoder.get()?,
                location: decoder.get()?,
                ref_type_tag: decoder.get()?,
                type_id: decoder.get()?,
                field_id: decoder.get()?,
                object: decoder.get()?,
                value_to_be: decoder.get()?,
            },
            EventKind::VmDeath => Event::VmDeath {
                request_id: decoder.get()?,
            },
            EventKind::FramePop
            | EventKind::UserDefined
            | EventKind::ClassLoad
            | EventKind::ExceptionCatch
            | EventKind::VmDisconnected => {
                return Err(DecodeJdwpDataError::UnexpectedEventKind(kind))
            }
        };
        Ok(event)
    }
}

impl JdwpEncodable for Event {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.put(&self.kind());
        match self {
            Event::Thread {
                request_id, thread, ..
            } => {
                encoder.put(request_id).put(thread);
            }
            Event::Located {
                request_id,
                thread,
                location,
                ..
            } => {
                encoder.put(request_id).put(thread).put(location);
            }
            Event::MethodExitWithReturnValue {
                request_id,
                thread,
                location,
                value,
            } => {
                encoder.put(request_id).put(thread).put(location).put(value);
            }
            Event::MonitorContended {
                request_id,
                thread,
                object,
                location,
                ..
            } => {
                encoder.put(request_id).put(thread).put(object).put(location);
            }
            Event::MonitorWait {
                request_id,
                thread,
                object,
                location,
                timeout,
            } => {
                encoder
                    .put(request_id)
                    .put(thread)
                    .put(object)
                    .put(location)
                    .put(timeout);
            }
            Event::MonitorWaited {
                request_id,
                thread,
                object,
                location,
                timed_out,
            } => {
                encoder
                    .put(request_id)
                    .put(thread)
                    .put(object)
                    .put(location)
                    .put(timed_out);
            }
            Event::Exception {
                request_id,
                thread,
                location,
                exception,
                catch_location,
            } => {
                encoder
                    .put(request_id)
                    .put(thread)
                    .put(location)
                    .put(exception)
                    .put(catch_location);
            }
            Event::ClassPrepare {
                request_id,
                thread,
                ref_type_tag,
                type_id,
                signature,
                status,
            } => {
                encoder
                    .put(request_id)
                    .put(thread)
                    .put(ref_type_tag)
                    .put(type_id)
                    .put(signature)
                    .put(status);
            }
            Event::ClassUnload {
                request_id,
                signature,
            } => {
                encoder.put(request_id).put(signature);
            }
            Event::FieldAccess {
                request_id,
                thread,
                location,
                ref_type_tag,
                type_id,
                field_id,
                object,
            } => {
                encoder
                    .put(request_id)
                    .put(thread)
                    .put(location)
                    .put(ref_type_tag)
                    .put(type_id)
                    .put(field_id)
                    .put(object);
            }
            Event::FieldModification {
                request_id,
                thread,
                location,
                ref_type_tag,
                type_id,
                field_id,
                object,
                value_to_be,
            } => {
                encoder
                    .put(request_id)
                    .put(thread)
                    .put(location)
                    .put(ref_type_tag)
                    .put(type_id)
                    .put(field_id)
                    .put(object)
                    .put(value_to_be);
            }
            Event::VmDeath { request_id } => {
                encoder.put(request_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_payload;
    use crate::id_sizes::IdSizes;
    use bytes::Bytes;

    #[test]
    fn composite_with_class_events() {
        let sizes = IdSizes::uniform(4).unwrap();
        let payload = Bytes::from_static(&[
            1, // suspend event thread
            0, 0, 0, 2, // two events
            9, 0, 0, 0, 3, 0, 0, 0, 3, b'L', b'A', b';', // class unload
            99, 0, 0, 0, 0, // vm death
        ]);
        let composite = JdwpDecoder::new(sizes, payload.clone())
            .get::<Composite>()
            .unwrap();
        assert_eq!(composite.suspend_policy, SuspendPolicy::EventThread);
        assert_eq!(
            composite.events,
            vec![
                Event::ClassUnload {
                    request_id: 3,
                    signature: "LA;".to_string(),
                },
                Event::VmDeath { request_id: 0 },
            ]
        );
        assert_eq!(encode_payload(sizes, &composite), payload);
    }

    #[test]
    fn class_prepare_carries_the_new_id() {
        let sizes = IdSizes::uniform(2).unwrap();
        let payload = Bytes::from_static(&[
            8, // class prepare
            0, 0, 0, 1, // request
            0, 5, // thread
            0, 0, 0x2A, // unknown type tag, type id
            0, 0, 0, 3, b'L', b'B', b';', // signature
            0, 0, 0, 3, // status
        ]);
        let event = JdwpDecoder::new(sizes, payload).get::<Event>().unwrap();
        assert_eq!(event.kind(), EventKind::ClassPrepare);
        let Event::ClassPrepare {
            ref_type_tag,
            type_id,
            signature,
            ..
        } = event
        else {
            panic!("expected class prepare, got {event:?}");
        };
        assert_eq!(ref_type_tag, 0);
        assert_eq!(type_id, ReferenceTypeId::new(0x2A));
        assert_eq!(signature, "LB;");
    }

    #[test]
    fn kinds_outside_composites_are_rejected() {
        let mut decoder = JdwpDecoder::new(IdSizes::default(), Bytes::from_static(&[3]));
        assert_eq!(
            decoder.get::<Event>(),
            Err(DecodeJdwpDataError::UnexpectedEventKind(EventKind::FramePop))
        );
    }
}
