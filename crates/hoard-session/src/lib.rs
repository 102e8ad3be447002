//! Participant session lifecycle for Hoard.
//!
//! Each channel moves through a small state machine:
//!
//! ```text
//!   Unjoined ──(join)──→ Active ──(leave / idle eviction)──→ Closed
//!                          │ ↑
//!                          └─┘ touch / move
//! ```
//!
//! [`SessionLifecycle`] drives those transitions against a
//! [`WorldStore`](hoard_world::WorldStore) it borrows for each call, and the
//! [`reaper`] sweep evicts participants that stopped talking.

mod error;
mod lifecycle;

pub mod reaper;

pub use error::SessionError;
pub use lifecycle::{ChannelState, SessionConfig, SessionLifecycle};
