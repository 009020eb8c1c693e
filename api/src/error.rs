//! Scene errors

use thiserror::Error;

/// Errors that abort scene construction.
#[derive(Error, Debug)]
pub enum SceneError {
    /// A directive did not carry enough numeric values.
    #[error("line {line}: expected {expected} values for {directive}, found {found}")]
    MissingValues {
        directive: &'static str,
        expected: usize,
        found: usize,
        line: usize,
    },

    /// A value was numeric but unusable for the directive.
    #[error("line {line}: invalid value {value} for {directive}")]
    InvalidNumber {
        directive: &'static str,
        value: String,
        line: usize,
    },

    /// The scene file could not be read.
    #[error("cannot read scene file: {0}")]
    Io(#[from] std::io::Error),
}
