//! Participant and container records.
//!
//! Balances and counts are only writable from inside this crate, so the
//! bounds and the conservation rule are enforced in one place
//! ([`crate::economy`]).

use std::time::{Duration, Instant};

use hoard_protocol::{ContainerId, ContainerView, ParticipantId, ParticipantView, Pose, Vec3};

/// Colors handed out to joining participants.
pub const PALETTE: [&str; 6] = ["#FF6B6B", "#4ECDC4", "#FFD166", "#06D6A0", "#118AB2", "#EF476F"];

/// A connected participant's authoritative record.
#[derive(Debug, Clone)]
pub struct Participant {
    id: ParticipantId,
    pose: Pose,
    name: String,
    color: String,
    balance: u32,
    connected_at: Instant,
    last_active: Instant,
}

impl Participant {
    /// Creates a record that joined at `now`.
    pub fn new(
        id: ParticipantId,
        name: impl Into<String>,
        color: impl Into<String>,
        pose: Pose,
        balance: u32,
        now: Instant,
    ) -> Self {
        Self {
            id,
            pose,
            name: name.into(),
            color: color.into(),
            balance,
            connected_at: now,
            last_active: now,
        }
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn balance(&self) -> u32 {
        self.balance
    }

    pub fn connected_at(&self) -> Instant {
        self.connected_at
    }

    pub fn last_active(&self) -> Instant {
        self.last_active
    }

    /// Time since the last recorded activity. Zero if `now` is earlier.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_active)
    }

    /// Records activity at `now`.
    pub fn touch(&mut self, now: Instant) {
        if now > self.last_active {
            self.last_active = now;
        }
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    pub(crate) fn clamp_balance(&mut self, max: u32) {
        self.balance = self.balance.min(max);
    }

    /// Spends one token. Returns `false` (and changes nothing) at zero.
    pub(crate) fn debit(&mut self) -> bool {
        match self.balance.checked_sub(1) {
            Some(rest) => {
                self.balance = rest;
                true
            }
            None => false,
        }
    }

    pub(crate) fn refill(&mut self, max: u32) {
        self.balance = max;
    }

    /// The fields other clients are allowed to see.
    pub fn view(&self) -> ParticipantView {
        ParticipantView {
            id: self.id,
            pose: self.pose,
            name: self.name.clone(),
            color: self.color.clone(),
            balance: self.balance,
        }
    }
}

/// A fixed-location shared container.
#[derive(Debug, Clone)]
pub struct Container {
    id: ContainerId,
    position: Vec3,
    count: u64,
}

impl Container {
    pub(crate) fn new(id: ContainerId, position: Vec3) -> Self {
        Self { id, position, count: 0 }
    }

    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub(crate) fn deposit(&mut self) {
        self.count += 1;
    }

    pub(crate) fn reset(&mut self) {
        self.count = 0;
    }

    pub fn view(&self) -> ContainerView {
        ContainerView { position: self.position, count: self.count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(balance: u32) -> Participant {
        Participant::new(ParticipantId(1), "ann", PALETTE[0], Pose::default(), balance, Instant::now())
    }

    #[test]
    fn test_debit_stops_at_zero() {
        let mut p = participant(1);
        assert!(p.debit());
        assert_eq!(p.balance(), 0);
        assert!(!p.debit());
        assert_eq!(p.balance(), 0);
    }

    #[test]
    fn test_touch_never_moves_backwards() {
        let start = Instant::now();
        let mut p = participant(5);
        let later = start + Duration::from_secs(30);
        p.touch(later);
        p.touch(start);
        assert_eq!(p.last_active(), later);
    }

    #[test]
    fn test_idle_for_saturates() {
        let p = participant(5);
        let earlier = p.last_active() - Duration::from_millis(1);
        assert_eq!(p.idle_for(earlier), Duration::ZERO);
    }
}
