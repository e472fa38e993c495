//! Error types for the protocol layer.

/// Errors that can occur while turning events into bytes and back.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The frame is not a well-formed event: bad JSON, unknown event
    /// name, missing fields, or fields of the wrong type.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame decoded but is not valid as an event.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
