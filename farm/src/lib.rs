//! Render farm: coordinator and workers

#[macro_use]
extern crate log;

mod coordinator;
mod error;
mod local;
mod pending;
mod pool;
mod worker;

pub use coordinator::*;
pub use error::*;
pub use local::*;
pub use pending::*;
pub use pool::*;
pub use worker::*;
