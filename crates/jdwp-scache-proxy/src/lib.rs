//! A JDWP proxy that sits between a debugger and a VM and runs all traffic through a
//! [jdwp_scache::SCache].

mod handshake;
mod relay;
mod transport;

pub use handshake::{relay_handshake, JDWP_HANDSHAKE};
pub use relay::relay;
pub use transport::JdwpTransport;
