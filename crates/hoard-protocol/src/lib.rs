//! Wire protocol for Hoard.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Types** ([`ParticipantId`], [`ContainerId`], [`Pose`], views): the
//!   primitive-field payloads that travel on the wire.
//! - **Events** ([`ClientEvent`], [`ServerEvent`], [`Envelope`]): the named
//!   inbound and outbound events.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events become frames.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (frames) → Protocol (events) → Hub (world mutations)
//! ```

mod codec;
mod error;
mod events;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use events::{ClientEvent, Envelope, InboundFrame, InitSnapshot, Movement, ServerEvent};
pub use types::{
    ContainerId, ContainerView, MoveUpdate, ParticipantId, ParticipantView, Pose, Recipient, Vec3,
};
