//! Error types for the protocol layer.

/// Errors raised while turning frames into events or events into frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The frame is not a JSON object of the form `{"event": .., "data": ..}`.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but names an event this server does not handle.
    #[error("unknown event: {0}")]
    UnknownEvent(String),
}
