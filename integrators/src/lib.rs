//! Integrators

#[macro_use]
extern crate log;

mod whitted;

// Re-export.
pub use whitted::*;
