//! Named inbound and outbound events.
//!
//! Inbound frames look like `{"event": "move", "data": {"x": 1.5, ...}}`.
//! They are parsed in two steps: first into a loose [`InboundFrame`], then
//! field by field into a [`ClientEvent`]. The second step never fails on a
//! missing or mistyped field; it substitutes `None` and lets the world apply
//! its own default. Only an unknown event name is an error.
//!
//! Outbound frames are an [`Envelope`]: a per-connection sequence number and
//! a server timestamp next to the adjacently tagged [`ServerEvent`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ContainerId, ContainerView, MoveUpdate, ParticipantId, ParticipantView, Pose, ProtocolError};

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// A syntactically valid inbound frame whose payload is not yet interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl InboundFrame {
    /// Builds a frame, mostly useful for clients and tests.
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self { event: event.into(), data }
    }

    fn str_field(&self, key: &str) -> Option<String> {
        self.data.get(key).and_then(Value::as_str).map(str::to_owned)
    }

    fn num_field(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(Value::as_f64)
    }
}

/// Everything a client may ask of the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Announce this channel as a participant.
    Join { username: Option<String> },
    /// Report a new pose.
    Move(MoveUpdate),
    /// Deposit one token into a container.
    PlaceToken { container_id: Option<ContainerId> },
    /// Ask for the current participant count.
    RequestCount,
    /// Reset own balance to the maximum.
    Refill,
}

impl ClientEvent {
    /// Interprets a frame. Payload problems degrade to `None` fields.
    ///
    /// # Errors
    /// [`ProtocolError::UnknownEvent`] if the event name is not recognised.
    pub fn from_frame(frame: &InboundFrame) -> Result<Self, ProtocolError> {
        let event = match frame.event.as_str() {
            "join" => Self::Join { username: frame.str_field("username") },
            "move" => Self::Move(MoveUpdate {
                x: frame.num_field("x"),
                y: frame.num_field("y"),
                z: frame.num_field("z"),
                rotation: frame.num_field("rotation"),
            }),
            "place-token" => Self::PlaceToken {
                container_id: frame.str_field("container_id").map(ContainerId),
            },
            "request-count" => Self::RequestCount,
            "refill" => Self::Refill,
            other => return Err(ProtocolError::UnknownEvent(other.to_owned())),
        };
        Ok(event)
    }

    /// The wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Move(_) => "move",
            Self::PlaceToken { .. } => "place-token",
            Self::RequestCount => "request-count",
            Self::Refill => "refill",
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Everything a newly joined client needs to render the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitSnapshot {
    /// The joining participant's own record.
    pub participant: ParticipantView,
    /// Every other Active participant.
    pub others: Vec<ParticipantView>,
    /// Every container, keyed by id.
    pub containers: BTreeMap<ContainerId, ContainerView>,
    /// Upper bound on balances, so clients can draw a full inventory.
    pub max_tokens: u32,
}

/// Sender id plus its new pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: ParticipantId,
    #[serde(flatten)]
    pub pose: Pose,
}

/// Notifications pushed by the server.
///
/// `#[serde(tag = "event", content = "data")]` produces
/// `{"event": "count-updated", "data": {"count": 3}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    InitSnapshot(InitSnapshot),
    ParticipantJoined(ParticipantView),
    ParticipantMoved(Movement),
    TokenAccepted {
        container_id: ContainerId,
        balance: u32,
        container_count: u64,
    },
    ContainerUpdated {
        container_id: ContainerId,
        count: u64,
    },
    BalanceUpdated {
        id: ParticipantId,
        balance: u32,
    },
    CountUpdated {
        count: usize,
    },
    ParticipantLeft {
        id: ParticipantId,
    },
    ServerStatus {
        count: usize,
        uptime_secs: u64,
    },
    ServerShutdown {
        message: String,
        at_unix_ms: u64,
    },
    TokensRefilled {
        balance: u32,
    },
    ContainersReset {
        containers: BTreeMap<ContainerId, ContainerView>,
    },
}

impl ServerEvent {
    /// The wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InitSnapshot(_) => "init-snapshot",
            Self::ParticipantJoined(_) => "participant-joined",
            Self::ParticipantMoved(_) => "participant-moved",
            Self::TokenAccepted { .. } => "token-accepted",
            Self::ContainerUpdated { .. } => "container-updated",
            Self::BalanceUpdated { .. } => "balance-updated",
            Self::CountUpdated { .. } => "count-updated",
            Self::ParticipantLeft { .. } => "participant-left",
            Self::ServerStatus { .. } => "server-status",
            Self::ServerShutdown { .. } => "server-shutdown",
            Self::TokensRefilled { .. } => "tokens-refilled",
            Self::ContainersReset { .. } => "containers-reset",
        }
    }
}

/// One outbound frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-connection counter, starting at 1.
    pub seq: u64,
    /// Milliseconds since the server started.
    pub timestamp: u64,
    #[serde(flatten)]
    pub event: ServerEvent,
}

impl Envelope {
    pub fn new(seq: u64, timestamp: u64, event: ServerEvent) -> Self {
        Self { seq, timestamp, event }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(event: &str, data: Value) -> Result<ClientEvent, ProtocolError> {
        ClientEvent::from_frame(&InboundFrame::new(event, data))
    }

    // =====================================================================
    // Inbound
    // =====================================================================

    #[test]
    fn test_join_reads_username() {
        let ev = parse("join", json!({"username": "ann"})).unwrap();
        assert_eq!(ev, ClientEvent::Join { username: Some("ann".into()) });
    }

    #[test]
    fn test_join_tolerates_missing_or_mistyped_username() {
        assert_eq!(parse("join", Value::Null).unwrap(), ClientEvent::Join { username: None });
        assert_eq!(
            parse("join", json!({"username": 17})).unwrap(),
            ClientEvent::Join { username: None }
        );
    }

    #[test]
    fn test_move_keeps_only_numeric_fields() {
        let ev = parse("move", json!({"x": 1.5, "y": "high", "rotation": 3})).unwrap();
        assert_eq!(
            ev,
            ClientEvent::Move(MoveUpdate { x: Some(1.5), y: None, z: None, rotation: Some(3.0) })
        );
    }

    #[test]
    fn test_place_token_reads_container_id() {
        let ev = parse("place-token", json!({"container_id": "chest2"})).unwrap();
        assert_eq!(ev, ClientEvent::PlaceToken { container_id: Some(ContainerId::new("chest2")) });
        assert_eq!(
            parse("place-token", json!({})).unwrap(),
            ClientEvent::PlaceToken { container_id: None }
        );
    }

    #[test]
    fn test_frame_without_data_defaults_to_null() {
        let frame: InboundFrame = serde_json::from_str(r#"{"event": "request-count"}"#).unwrap();
        assert_eq!(frame.data, Value::Null);
        assert_eq!(ClientEvent::from_frame(&frame).unwrap(), ClientEvent::RequestCount);
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let err = parse("fly-to-moon", json!({})).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownEvent(name) if name == "fly-to-moon"));
    }

    // =====================================================================
    // Outbound
    // =====================================================================

    #[test]
    fn test_server_event_is_adjacently_tagged_kebab_case() {
        let ev = ServerEvent::TokenAccepted {
            container_id: ContainerId::new("chest1"),
            balance: 4,
            container_count: 1,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "token-accepted");
        assert_eq!(json["data"]["container_id"], "chest1");
        assert_eq!(json["data"]["balance"], 4);
        assert_eq!(json["data"]["container_count"], 1);
        assert_eq!(ev.name(), "token-accepted");
    }

    #[test]
    fn test_movement_payload_is_flat() {
        let ev = ServerEvent::ParticipantMoved(Movement {
            id: ParticipantId(2),
            pose: Pose { x: 1.0, y: 1.0, z: 4.0, rotation: 0.25 },
        });
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "participant-moved");
        assert_eq!(json["data"], json!({"id": 2, "x": 1.0, "y": 1.0, "z": 4.0, "rotation": 0.25}));
    }

    #[test]
    fn test_envelope_puts_event_next_to_seq() {
        let env = Envelope::new(3, 1200, ServerEvent::ParticipantLeft { id: ParticipantId(9) });
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["seq"], 3);
        assert_eq!(json["timestamp"], 1200);
        assert_eq!(json["event"], "participant-left");
        assert_eq!(json["data"]["id"], 9);

        let back: Envelope = serde_json::from_value(json).unwrap();
        assert_eq!(back, env);
    }
}
