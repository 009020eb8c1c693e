//! Datagram transport, wire format and scene transfer

#[macro_use]
extern crate log;

mod error;
mod local;
mod transfer;
mod transport;
mod udp;
mod wire;

pub use error::*;
pub use local::*;
pub use transfer::*;
pub use transport::*;
pub use udp::*;
pub use wire::*;
