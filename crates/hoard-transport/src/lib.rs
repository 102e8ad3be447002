//! Connection boundary for Hoard.
//!
//! The session core never touches sockets. It sees a [`Transport`] that hands
//! out [`Connection`]s, each a message-oriented duplex channel identified by a
//! [`ConnectionId`] that is never reused for the life of the process.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{PendingWebSocket, WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Process-unique identifier for an accepted channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw counter value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw counter value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new duplex channels.
///
/// Accepting is split in two. [`accept`](Transport::accept) only takes the
/// raw socket off the listener, so it never waits on a peer.
/// [`upgrade`](Transport::upgrade) runs the protocol handshake and belongs in
/// the per-connection task, under a deadline.
pub trait Transport: Send + Sync + 'static {
    /// A socket that has been accepted but not yet handshaken.
    type Pending: Send + 'static;
    /// The channel type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next incoming socket.
    async fn accept(&mut self) -> Result<Self::Pending, Self::Error>;

    /// Completes the handshake on an accepted socket.
    async fn upgrade(pending: Self::Pending) -> Result<Self::Connection, Self::Error>;
}

/// A single duplex channel carrying whole messages.
///
/// `send` and `recv` may be awaited concurrently from different branches of a
/// `select!`; implementations must not hold one direction while waiting on
/// the other.
pub trait Connection: Send + Sync + 'static {
    /// The error type for channel operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one text message to the peer.
    async fn send(&self, text: &str) -> Result<(), Self::Error>;

    /// Receives the next message payload.
    ///
    /// Returns `Ok(None)` when the peer closed the channel cleanly.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the channel.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the channel's identifier.
    fn id(&self) -> ConnectionId;
}
