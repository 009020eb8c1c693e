//! Spectrum

mod color;

// Re-export.
pub use color::*;
