//! Error types for the session layer.

use hoard_protocol::ParticipantId;
use hoard_world::WorldError;

/// Why a lifecycle operation was a no-op.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The channel already has an Active participant.
    #[error("channel {0} already joined")]
    AlreadyActive(ParticipantId),

    /// The channel was evicted or left and cannot come back.
    #[error("channel {0} is closed")]
    Closed(ParticipantId),

    /// The underlying store refused (usually: participant not found).
    #[error(transparent)]
    World(#[from] WorldError),
}
