//! Error types for the world layer.

use hoard_protocol::{ContainerId, ParticipantId};

/// Why a world operation did not happen.
///
/// Callers that act on behalf of an unauthenticated client treat every
/// variant as a silent no-op; the variants exist so the reason can be logged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// No participant record for this id (never joined, or already gone).
    #[error("participant {0} not found")]
    ParticipantNotFound(ParticipantId),

    /// No container with this id was configured.
    #[error("container {0} not found")]
    ContainerNotFound(ContainerId),

    /// A record for this id already exists.
    #[error("participant {0} already present")]
    AlreadyPresent(ParticipantId),

    /// The participant has no tokens left to spend.
    #[error("participant {0} has no tokens")]
    InsufficientBalance(ParticipantId),

    /// The request named no container at all.
    #[error("no container given")]
    MissingContainer,
}
