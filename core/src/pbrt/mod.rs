//! Common numeric definitions

mod common;

// Re-export
pub use common::*;
