//! The Hoard hub.
//!
//! One Tokio task owns the world and the session lifecycle. Connection
//! handlers and the HTTP layer talk to it through a cloneable [`HubHandle`];
//! it answers queries over `oneshot` replies and pushes notifications into
//! per-channel [`Outbox`]es.
//!
//! # Key types
//!
//! - [`HubHandle`]: send commands to the running hub
//! - [`HubConfig`]: world, session and housekeeping settings
//! - [`dispatch::notifications`]: which notifications a transition produces

mod config;
pub mod dispatch;
mod error;
mod hub;

pub use config::HubConfig;
pub use error::HubError;
pub use hub::{HubHandle, HubStatus, Outbox, spawn_hub};
