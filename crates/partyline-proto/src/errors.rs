//! Protocol error types.

use thiserror::Error;

/// Errors produced while encoding or decoding protocol data.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Inbound JSON did not match any recognized envelope shape.
    #[error("malformed envelope: {0}")]
    Decode(#[source] serde_json::Error),

    /// An outbound value could not be serialized.
    #[error("envelope encoding failed: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Convenience result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
