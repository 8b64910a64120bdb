//! Dispatches observed commands and replies to handlers keyed by command set and command

use crate::error::SCacheError;
use jdwp_wire::codec::JdwpDecoder;
use jdwp_wire::commands::JdwpCommand;
use jdwp_wire::packet::{CommandData, Header, HeaderKind};
use std::collections::HashMap;
use tracing::trace;

/// A handler invoked with the session state and a decoder over the packet's payload
pub type Trigger<C> = fn(&mut C, &mut JdwpDecoder) -> Result<(), SCacheError>;

/// Runs handlers for commands and for the replies to them.
///
/// Replies don't carry their command set and command, so every command seen through
/// [dispatch](Self::dispatch) is remembered under its id until the reply shows up.
pub struct TriggerManager<C> {
    command_triggers: HashMap<CommandData, Trigger<C>>,
    reply_triggers: HashMap<CommandData, Trigger<C>>,
    in_flight: HashMap<u32, CommandData>,
}

impl<C> TriggerManager<C> {
    pub fn new() -> Self {
        Self {
            command_triggers: HashMap::new(),
            reply_triggers: HashMap::new(),
            in_flight: HashMap::new(),
        }
    }

    /// Runs `trigger` whenever a command of kind `T` is dispatched
    pub fn register_command_trigger<T: JdwpCommand>(&mut self, trigger: Trigger<C>) {
        self.command_triggers.insert(T::command_data(), trigger);
    }

    /// Runs `trigger` whenever a successful reply to a command of kind `T` is dispatched
    pub fn register_reply_trigger<T: JdwpCommand>(&mut self, trigger: Trigger<C>) {
        self.reply_triggers.insert(T::command_data(), trigger);
    }

    /// Dispatches a packet sent by the debugger, or a reply to one.
    ///
    /// Commands are remembered until their reply is dispatched. A reply to a command that was
    /// never seen is ignored.
    pub fn dispatch(
        &mut self,
        context: &mut C,
        header: &Header,
        decoder: &mut JdwpDecoder,
    ) -> Result<(), SCacheError> {
        let trigger = match header.kind() {
            HeaderKind::Command(command) => {
                self.in_flight.insert(header.id(), command);
                self.command_triggers.get(&command)
            }
            HeaderKind::Reply(_) => {
                let Some(command) = self.in_flight.remove(&header.id()) else {
                    trace!(id = header.id(), "reply to an unknown command");
                    return Ok(());
                };
                self.reply_triggers.get(&command)
            }
        };
        match trigger {
            Some(trigger) => trigger(context, decoder),
            None => Ok(()),
        }
    }

    /// Dispatches a command sent by the VM. The VM never gets a reply to these, so nothing is
    /// remembered.
    pub fn dispatch_event(
        &mut self,
        context: &mut C,
        command: CommandData,
        decoder: &mut JdwpDecoder,
    ) -> Result<(), SCacheError> {
        match self.command_triggers.get(&command) {
            Some(trigger) => trigger(context, decoder),
            None => Ok(()),
        }
    }

    /// Stops waiting for the reply to command `id`
    pub fn forget(&mut self, id: u32) -> Option<CommandData> {
        self.in_flight.remove(&id)
    }

    /// Whether a command with this id is waiting for its reply
    pub fn is_in_flight(&self, id: u32) -> bool {
        self.in_flight.contains_key(&id)
    }

    /// Forgets every command waiting for a reply
    pub fn clear(&mut self) {
        self.in_flight.clear();
    }
}

impl<C> Default for TriggerManager<C> {
    fn default() -> Self {
        Self::new()
    }
}
