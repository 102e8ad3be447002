//! The Session Lifecycle Manager.
//!
//! Keys everything by the channel's [`ParticipantId`]. The only state kept
//! here besides configuration is the set of Closed channels whose transport
//! is still open (evicted but not yet disconnected); Active state lives in
//! the world store itself.

use std::collections::HashSet;
use std::f64::consts::TAU;
use std::time::{Duration, Instant};

use hoard_protocol::{MoveUpdate, Movement, ParticipantId, Pose};
use hoard_world::{LeaveCause, PALETTE, Participant, Transition, WorldConfig, WorldStore};
use rand::Rng;

use crate::SessionError;

/// Session behaviour knobs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// A participant with no activity for longer than this is evicted by the
    /// next reaper sweep. Default: 10 minutes.
    pub idle_timeout: Duration,

    /// Display names longer than this many characters are cut. Default: 32.
    pub max_name_chars: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(10 * 60),
            max_name_chars: 32,
        }
    }
}

/// Where a channel is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Unjoined,
    Active,
    Closed,
}

/// Drives join, activity, and leave transitions.
#[derive(Debug)]
pub struct SessionLifecycle {
    config: SessionConfig,
    spawn_extent: f64,
    spawn_height: f64,
    closed: HashSet<ParticipantId>,
}

impl SessionLifecycle {
    pub fn new(config: SessionConfig, world: &WorldConfig) -> Self {
        Self {
            config,
            spawn_extent: world.spawn_extent.abs(),
            spawn_height: world.spawn_height,
            closed: HashSet::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self, world: &WorldStore, id: ParticipantId) -> ChannelState {
        if world.contains(id) {
            ChannelState::Active
        } else if self.closed.contains(&id) {
            ChannelState::Closed
        } else {
            ChannelState::Unjoined
        }
    }

    /// Unjoined → Active.
    ///
    /// Spawns the participant at a random point with a random palette color
    /// and a full balance.
    ///
    /// # Errors
    /// [`SessionError::AlreadyActive`] or [`SessionError::Closed`]; the
    /// world is untouched in both cases.
    pub fn join(
        &mut self,
        world: &mut WorldStore,
        id: ParticipantId,
        requested_name: Option<&str>,
        now: Instant,
        rng: &mut impl Rng,
    ) -> Result<Transition, SessionError> {
        match self.state(world, id) {
            ChannelState::Active => return Err(SessionError::AlreadyActive(id)),
            ChannelState::Closed => return Err(SessionError::Closed(id)),
            ChannelState::Unjoined => {}
        }

        let extent = self.spawn_extent;
        let pose = Pose {
            x: rng.random_range(-extent..=extent),
            y: self.spawn_height,
            z: rng.random_range(-extent..=extent),
            rotation: rng.random_range(0.0..TAU),
        };
        let color = PALETTE[rng.random_range(0..PALETTE.len())];
        let name = display_name(requested_name, id, self.config.max_name_chars);

        let participant = Participant::new(id, name, color, pose, world.max_tokens(), now);
        world.insert_participant(participant)?;
        let snapshot = world.snapshot_for(id)?;

        tracing::info!(
            %id,
            name = %snapshot.participant.name,
            active = world.active_count(),
            "participant joined"
        );

        Ok(Transition::Joined { snapshot, active: world.active_count() })
    }

    /// Refreshes `last_active` for an Active channel.
    pub fn touch(&self, world: &mut WorldStore, id: ParticipantId, now: Instant) -> Result<(), SessionError> {
        world.participant_mut(id)?.touch(now);
        Ok(())
    }

    /// Touch plus a pose update. Missing or non-finite fields keep their value.
    pub fn apply_move(
        &self,
        world: &mut WorldStore,
        id: ParticipantId,
        update: &MoveUpdate,
        now: Instant,
    ) -> Result<Transition, SessionError> {
        let participant = world.participant_mut(id)?;
        participant.touch(now);
        let pose = update.apply_to(participant.pose());
        participant.set_pose(pose);

        tracing::trace!(%id, x = pose.x, z = pose.z, "participant moved");
        Ok(Transition::Moved(Movement { id, pose }))
    }

    /// Answers a count request from an Active channel.
    pub fn request_count(&self, world: &WorldStore, id: ParticipantId) -> Result<Transition, SessionError> {
        world.participant(id)?;
        Ok(Transition::CountRequested { participant: id, active: world.active_count() })
    }

    /// Active → Closed. The remaining balance is discarded.
    ///
    /// Calling it again for the same channel returns
    /// [`WorldError::ParticipantNotFound`](hoard_world::WorldError) and does
    /// nothing else.
    pub fn leave(
        &mut self,
        world: &mut WorldStore,
        id: ParticipantId,
        cause: LeaveCause,
    ) -> Result<Transition, SessionError> {
        let gone = world.remove_participant(id)?;
        self.closed.insert(id);

        tracing::info!(
            %id,
            name = gone.name(),
            %cause,
            discarded = gone.balance(),
            active = world.active_count(),
            "participant left"
        );

        Ok(Transition::Left { participant: id, cause, active: world.active_count() })
    }

    /// Releases the Closed marker once the transport channel is gone.
    pub fn forget(&mut self, id: ParticipantId) {
        self.closed.remove(&id);
    }

    /// Number of channels that are Closed but still connected.
    pub fn closed_count(&self) -> usize {
        self.closed.len()
    }
}

/// Cleans up a requested display name, falling back to `Player_<n>`.
pub(crate) fn display_name(requested: Option<&str>, id: ParticipantId, max_chars: usize) -> String {
    let trimmed = requested.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return format!("Player_{}", id.0);
    }
    trimmed.chars().take(max_chars.max(1)).collect()
}

#[cfg(test)]
mod tests {
    use hoard_world::WorldError;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn pid(id: u64) -> ParticipantId {
        ParticipantId(id)
    }

    fn setup() -> (SessionLifecycle, WorldStore, StdRng) {
        let config = WorldConfig::default();
        (
            SessionLifecycle::new(SessionConfig::default(), &config),
            WorldStore::new(&config),
            StdRng::seed_from_u64(7),
        )
    }

    // =====================================================================
    // join()
    // =====================================================================

    #[test]
    fn test_join_creates_full_balance_participant_inside_bounds() {
        let (mut sessions, mut world, mut rng) = setup();
        let now = Instant::now();

        let t = sessions.join(&mut world, pid(1), Some("ann"), now, &mut rng).unwrap();

        let Transition::Joined { snapshot, active } = t else {
            panic!("expected Joined");
        };
        assert_eq!(active, 1);
        let me = &snapshot.participant;
        assert_eq!(me.name, "ann");
        assert_eq!(me.balance, 5);
        assert!(PALETTE.contains(&me.color.as_str()));
        assert!(me.pose.x.abs() <= 15.0 && me.pose.z.abs() <= 15.0);
        assert_eq!(me.pose.y, 1.0);
        assert!((0.0..TAU).contains(&me.pose.rotation));
        assert_eq!(sessions.state(&world, pid(1)), ChannelState::Active);
    }

    #[test]
    fn test_join_twice_keeps_single_unchanged_record() {
        let (mut sessions, mut world, mut rng) = setup();
        let now = Instant::now();
        sessions.join(&mut world, pid(1), Some("ann"), now, &mut rng).unwrap();
        let before = world.participant(pid(1)).unwrap().view();

        let err = sessions
            .join(&mut world, pid(1), Some("someone else"), now + Duration::from_secs(5), &mut rng)
            .unwrap_err();

        assert_eq!(err, SessionError::AlreadyActive(pid(1)));
        assert_eq!(world.active_count(), 1);
        assert_eq!(world.participant(pid(1)).unwrap().view(), before);
        assert_eq!(world.participant(pid(1)).unwrap().last_active(), now);
    }

    #[test]
    fn test_join_snapshot_lists_existing_participants() {
        let (mut sessions, mut world, mut rng) = setup();
        let now = Instant::now();
        sessions.join(&mut world, pid(1), None, now, &mut rng).unwrap();

        let t = sessions.join(&mut world, pid(2), None, now, &mut rng).unwrap();

        let Transition::Joined { snapshot, active } = t else {
            panic!("expected Joined");
        };
        assert_eq!(active, 2);
        assert_eq!(snapshot.others.len(), 1);
        assert_eq!(snapshot.others[0].id, pid(1));
    }

    #[test]
    fn test_display_name_defaults_and_truncates() {
        assert_eq!(display_name(None, pid(4), 32), "Player_4");
        assert_eq!(display_name(Some("   "), pid(4), 32), "Player_4");
        assert_eq!(display_name(Some("  bob "), pid(4), 32), "bob");
        assert_eq!(display_name(Some("abcdefgh"), pid(4), 3), "abc");
    }

    // =====================================================================
    // touch() / apply_move()
    // =====================================================================

    #[test]
    fn test_touch_refreshes_last_active() {
        let (mut sessions, mut world, mut rng) = setup();
        let start = Instant::now();
        sessions.join(&mut world, pid(1), None, start, &mut rng).unwrap();

        let later = start + Duration::from_secs(90);
        sessions.touch(&mut world, pid(1), later).unwrap();

        assert_eq!(world.participant(pid(1)).unwrap().last_active(), later);
    }

    #[test]
    fn test_touch_unknown_channel_is_noop_error() {
        let (sessions, mut world, _) = setup();
        let err = sessions.touch(&mut world, pid(9), Instant::now()).unwrap_err();
        assert_eq!(err, SessionError::World(WorldError::ParticipantNotFound(pid(9))));
        assert_eq!(world.active_count(), 0);
    }

    #[test]
    fn test_apply_move_merges_partial_update() {
        let (mut sessions, mut world, mut rng) = setup();
        let now = Instant::now();
        sessions.join(&mut world, pid(1), None, now, &mut rng).unwrap();
        let before = world.participant(pid(1)).unwrap().pose();

        let update = MoveUpdate { x: Some(2.5), z: Some(f64::INFINITY), ..Default::default() };
        let t = sessions.apply_move(&mut world, pid(1), &update, now).unwrap();

        let expected = Pose { x: 2.5, ..before };
        assert_eq!(t, Transition::Moved(Movement { id: pid(1), pose: expected }));
        assert_eq!(world.participant(pid(1)).unwrap().pose(), expected);
    }

    // =====================================================================
    // leave() / forget()
    // =====================================================================

    #[test]
    fn test_leave_is_idempotent_and_closes_channel() {
        let (mut sessions, mut world, mut rng) = setup();
        let now = Instant::now();
        sessions.join(&mut world, pid(1), None, now, &mut rng).unwrap();
        sessions.join(&mut world, pid(2), None, now, &mut rng).unwrap();

        let t = sessions.leave(&mut world, pid(1), LeaveCause::Disconnected).unwrap();
        assert_eq!(
            t,
            Transition::Left { participant: pid(1), cause: LeaveCause::Disconnected, active: 1 }
        );

        assert!(sessions.leave(&mut world, pid(1), LeaveCause::Disconnected).is_err());
        assert_eq!(world.active_count(), 1);
        assert_eq!(sessions.state(&world, pid(1)), ChannelState::Closed);
    }

    #[test]
    fn test_closed_channel_cannot_rejoin() {
        let (mut sessions, mut world, mut rng) = setup();
        let now = Instant::now();
        sessions.join(&mut world, pid(1), None, now, &mut rng).unwrap();
        sessions.leave(&mut world, pid(1), LeaveCause::Idle).unwrap();

        let err = sessions.join(&mut world, pid(1), None, now, &mut rng).unwrap_err();

        assert_eq!(err, SessionError::Closed(pid(1)));
        assert_eq!(world.active_count(), 0);
    }

    #[test]
    fn test_forget_releases_closed_marker() {
        let (mut sessions, mut world, mut rng) = setup();
        sessions.join(&mut world, pid(1), None, Instant::now(), &mut rng).unwrap();
        sessions.leave(&mut world, pid(1), LeaveCause::Disconnected).unwrap();
        assert_eq!(sessions.closed_count(), 1);

        sessions.forget(pid(1));

        assert_eq!(sessions.closed_count(), 0);
    }

    #[test]
    fn test_request_count_only_for_active_channels() {
        let (mut sessions, mut world, mut rng) = setup();
        sessions.join(&mut world, pid(1), None, Instant::now(), &mut rng).unwrap();

        assert_eq!(
            sessions.request_count(&world, pid(1)).unwrap(),
            Transition::CountRequested { participant: pid(1), active: 1 }
        );
        assert!(sessions.request_count(&world, pid(2)).is_err());
    }
}
