//! The JDWP wire layer: packet headers, payload codecs for the commands a look-aside cache needs
//! to understand, and stream framing.

pub mod codec;
pub mod commands;
pub mod framing;
pub mod id_sizes;
pub mod packet;

pub use jdwp_types;
