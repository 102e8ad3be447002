//! Accepted state transitions.
//!
//! A transition carries everything needed to notify observers, so turning it
//! into notifications does not need to look at the store again.

use std::collections::BTreeMap;
use std::time::Duration;

use hoard_protocol::{ContainerId, ContainerView, InitSnapshot, Movement, ParticipantId};

/// Why a participant left the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveCause {
    /// The channel closed or the client left.
    Disconnected,
    /// The idle reaper evicted it.
    Idle,
}

impl std::fmt::Display for LeaveCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Idle => write!(f, "idle"),
        }
    }
}

/// Something that changed (or was asked about) in the world.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// A channel became Active. `snapshot.participant` is the newcomer.
    Joined { snapshot: InitSnapshot, active: usize },

    /// An Active participant reported a new pose.
    Moved(Movement),

    /// One token moved from a participant into a container.
    TokenPlaced {
        participant: ParticipantId,
        container_id: ContainerId,
        balance: u32,
        container_count: u64,
    },

    /// A participant's balance was reset to the maximum.
    Replenished { participant: ParticipantId, balance: u32 },

    /// A participant asked how many others are around.
    CountRequested { participant: ParticipantId, active: usize },

    /// A participant was removed. `active` is the count after removal.
    Left { participant: ParticipantId, cause: LeaveCause, active: usize },

    /// Periodic aggregate status.
    StatusTick { active: usize, uptime: Duration },

    /// Every container count was zeroed by an administrator.
    ContainersReset { containers: BTreeMap<ContainerId, ContainerView> },

    /// The server is going away.
    ShuttingDown { message: String, at_unix_ms: u64 },
}
