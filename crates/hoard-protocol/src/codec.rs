//! Codec trait and the JSON implementation.
//!
//! Browser clients speak JSON over WebSocket text frames, so the codec
//! produces `String`s and reads raw bytes (text or binary frames both arrive
//! as bytes from the transport).

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts values to outbound text frames and inbound bytes back to values.
///
/// `Send + Sync + 'static` because the codec is shared by every connection
/// task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a received payload.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] for malformed or mistyped input.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use hoard_protocol::{Codec, Envelope, JsonCodec, ServerEvent};
///
/// let codec = JsonCodec;
/// let frame = codec
///     .encode(&Envelope::new(1, 250, ServerEvent::CountUpdated { count: 3 }))
///     .unwrap();
/// assert!(frame.contains(r#""event":"count-updated""#));
///
/// let back: Envelope = codec.decode(frame.as_bytes()).unwrap();
/// assert_eq!(back.seq, 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
