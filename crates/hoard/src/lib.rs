//! # Hoard
//!
//! Authoritative shared-world session server. Participants connect over
//! WebSocket, wander a small world and drop tokens into shared containers;
//! every change is broadcast to everyone else connected.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hoard::prelude::*;
//!
//! # async fn run() -> Result<(), HoardError> {
//! let server = HoardServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .http_bind("0.0.0.0:3001")
//!     .build()
//!     .await?;
//! server.run_until(shutdown_signal()).await
//! # }
//! ```

mod error;
mod handler;
pub mod http;
mod server;

pub use error::HoardError;
pub use server::{HoardServer, HoardServerBuilder, SHUTDOWN_MESSAGE, shutdown_signal};

/// Re-exports for `use hoard::prelude::*`.
pub mod prelude {
    pub use crate::{HoardError, HoardServer, HoardServerBuilder, SHUTDOWN_MESSAGE, shutdown_signal};
    pub use hoard_hub::{HubConfig, HubHandle, HubStatus};
    pub use hoard_protocol::{
        ClientEvent, ContainerId, Envelope, InboundFrame, ParticipantId, ParticipantView, ServerEvent,
    };
    pub use hoard_session::SessionConfig;
    pub use hoard_world::{ContainerSpec, WorldConfig};
}
