//! Network errors

use thiserror::Error;

/// Errors raised by transports and the wire codec.
#[derive(Error, Debug)]
pub enum NetError {
    /// Socket failure.
    #[error("network I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport was shut down.
    #[error("transport disconnected")]
    Disconnected,

    /// Data that cannot be encoded or decoded.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// A protocol configuration whose messages cannot be told apart or sent.
    #[error("invalid protocol: {0}")]
    InvalidProtocol(String),
}
