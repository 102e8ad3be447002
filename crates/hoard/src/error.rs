//! Unified error type for the Hoard server.

use hoard_hub::HubError;
use hoard_protocol::ProtocolError;
use hoard_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate errors
/// automatically.
#[derive(Debug, thiserror::Error)]
pub enum HoardError {
    /// Connection, send or receive failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encoding or decoding failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The hub stopped or refused the request.
    #[error(transparent)]
    Hub(#[from] HubError),

    /// Binding or serving the HTTP listener failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
