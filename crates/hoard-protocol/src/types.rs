//! Identity and payload types shared by inbound and outbound events.
//!
//! Every payload is made of primitive fields so that a browser client can
//! read it without knowing anything about Rust.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies a participant for the lifetime of its connection.
///
/// Derived from the transport's connection counter, so an id is never handed
/// out twice within one process. `#[serde(transparent)]` keeps it a plain
/// number on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Well-known name of a shared container, e.g. `"chest1"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(pub String);

impl ContainerId {
    /// Creates a container id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who a notification is addressed to.
///
/// Resolved against the set of Active channels at delivery time, so
/// `AllExcept(id)` after `id` has left is the same as `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every Active channel.
    All,
    /// One channel only.
    Only(ParticipantId),
    /// Every Active channel except the given one (usually the originator).
    AllExcept(ParticipantId),
}

impl Recipient {
    /// Whether a channel falls inside this address set.
    pub fn includes(&self, id: ParticipantId) -> bool {
        match self {
            Self::All => true,
            Self::Only(target) => *target == id,
            Self::AllExcept(excluded) => *excluded != id,
        }
    }
}

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Position plus facing, serialized flat as `{x, y, z, rotation}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Facing in radians.
    pub rotation: f64,
}

impl Pose {
    /// The positional part of the pose.
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

/// A partial pose sent by a moving client.
///
/// Any field may be missing or garbage; those keep the participant's current
/// value when applied.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveUpdate {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub rotation: Option<f64>,
}

impl MoveUpdate {
    /// Merges this update over `current`, ignoring absent and non-finite values.
    pub fn apply_to(&self, current: Pose) -> Pose {
        let pick = |new: Option<f64>, old: f64| new.filter(|v| v.is_finite()).unwrap_or(old);
        Pose {
            x: pick(self.x, current.x),
            y: pick(self.y, current.y),
            z: pick(self.z, current.z),
            rotation: pick(self.rotation, current.rotation),
        }
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// The public fields of a participant as other clients see them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantView {
    pub id: ParticipantId,
    #[serde(flatten)]
    pub pose: Pose,
    pub name: String,
    pub color: String,
    pub balance: u32,
}

/// A container's fixed position and accumulated count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerView {
    pub position: Vec3,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: u64) -> ParticipantId {
        ParticipantId(id)
    }

    #[test]
    fn test_participant_id_is_plain_number_on_the_wire() {
        assert_eq!(serde_json::to_string(&pid(42)).unwrap(), "42");
        assert_eq!(pid(7).to_string(), "P-7");
    }

    #[test]
    fn test_container_id_is_plain_string_on_the_wire() {
        let json = serde_json::to_string(&ContainerId::new("chest1")).unwrap();
        assert_eq!(json, "\"chest1\"");
    }

    #[test]
    fn test_recipient_includes() {
        assert!(Recipient::All.includes(pid(1)));
        assert!(Recipient::Only(pid(1)).includes(pid(1)));
        assert!(!Recipient::Only(pid(1)).includes(pid(2)));
        assert!(!Recipient::AllExcept(pid(1)).includes(pid(1)));
        assert!(Recipient::AllExcept(pid(1)).includes(pid(2)));
    }

    #[test]
    fn test_move_update_keeps_current_for_missing_fields() {
        let current = Pose { x: 1.0, y: 2.0, z: 3.0, rotation: 0.5 };
        let update = MoveUpdate { x: Some(9.0), rotation: Some(f64::NAN), ..Default::default() };
        let merged = update.apply_to(current);
        assert_eq!(merged, Pose { x: 9.0, y: 2.0, z: 3.0, rotation: 0.5 });
    }

    #[test]
    fn test_participant_view_is_flat() {
        let view = ParticipantView {
            id: pid(3),
            pose: Pose { x: 1.0, y: 1.0, z: -2.0, rotation: 0.0 },
            name: "ann".into(),
            color: "#FF6B6B".into(),
            balance: 5,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["z"], -2.0);
        assert_eq!(json["balance"], 5);
        assert!(json.get("pose").is_none());
    }
}
