//! Authoritative world model for Hoard.
//!
//! The [`WorldStore`] is the only owner of participant and container records.
//! Everything else reads [`ParticipantView`](hoard_protocol::ParticipantView)
//! snapshots or goes through one of the mutation entry points:
//!
//! - [`economy`]: token placement, refill, and the admin container reset
//! - `hoard-session`: join, movement, leave, idle eviction
//!
//! Every successful mutation returns a [`Transition`] describing what
//! happened, which the hub turns into notifications.

mod config;
mod error;
mod model;
mod store;
mod transition;

pub mod economy;

pub use config::{ContainerSpec, WorldConfig};
pub use error::WorldError;
pub use model::{Container, PALETTE, Participant};
pub use store::WorldStore;
pub use transition::{LeaveCause, Transition};
