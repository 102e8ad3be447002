//! Idle Reaper sweep.
//!
//! The sweep itself is synchronous and takes `now` explicitly; scheduling it
//! on an interval is the hub's job.

use std::time::{Duration, Instant};

use hoard_protocol::ParticipantId;
use hoard_world::{LeaveCause, Transition, WorldStore};

use crate::SessionLifecycle;

/// Participants whose last activity is more than `threshold` before `now`.
pub fn idle_participants(world: &WorldStore, now: Instant, threshold: Duration) -> Vec<ParticipantId> {
    world
        .participants()
        .filter(|p| p.idle_for(now) > threshold)
        .map(|p| p.id())
        .collect()
}

impl SessionLifecycle {
    /// Evicts every idle participant, returning one `Left` per eviction in
    /// id order. Each carries the active count right after that removal.
    pub fn reap_idle(&mut self, world: &mut WorldStore, now: Instant) -> Vec<Transition> {
        let threshold = self.config().idle_timeout;
        let idle = idle_participants(world, now, threshold);
        if idle.is_empty() {
            tracing::trace!(active = world.active_count(), "idle sweep found nobody");
            return Vec::new();
        }

        tracing::info!(evicting = idle.len(), threshold_secs = threshold.as_secs(), "idle sweep");
        idle.into_iter()
            .filter_map(|id| self.leave(world, id, LeaveCause::Idle).ok())
            .collect()
    }
}
