//! A speculative look-aside cache for JDWP.
//!
//! Inspecting a stack frame in a debugger sends a burst of small metadata requests for every
//! frame shown. [SCache] sits between debugger and VM, answers those requests from a local cache,
//! and fills that cache ahead of time: as soon as it sees the reply to a ThreadReference.Frames
//! command it asks the VM, on its own, for the metadata of every frame's class and method.
//!
//! The cache never owns a socket. The transport hands it one framed packet at a time and sends
//! whatever the returned [Outcome]'s edict says.

mod classes;
mod config;
mod error;
mod key;
mod scache;
mod speculator;
mod synthetic;
mod trigger;

pub use classes::ClassesRepo;
pub use config::{SCacheConfig, DEFAULT_MAX_SPECULATED_FRAMES};
pub use error::SCacheError;
pub use key::Key;
pub use scache::{Batches, Outcome, SCache};
pub use speculator::Speculator;
pub use synthetic::{is_synthetic, SyntheticIds, SYNTHETIC_ID_BIT};
pub use trigger::{Trigger, TriggerManager};

pub use jdwp_wire;
