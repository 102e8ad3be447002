//! Broadcast Dispatcher table.
//!
//! Maps a [`Transition`] to the notifications it produces, in the order they
//! must be delivered. Resolving recipients against live channels is the
//! hub's job.

use hoard_protocol::{Recipient, ServerEvent};
use hoard_world::Transition;

/// Notifications for one accepted transition.
pub fn notifications(transition: &Transition) -> Vec<(Recipient, ServerEvent)> {
    match transition {
        Transition::Joined { snapshot, active } => {
            let joiner = snapshot.participant.id;
            vec![
                (Recipient::Only(joiner), ServerEvent::InitSnapshot(snapshot.clone())),
                (
                    Recipient::AllExcept(joiner),
                    ServerEvent::ParticipantJoined(snapshot.participant.clone()),
                ),
                (Recipient::All, ServerEvent::CountUpdated { count: *active }),
            ]
        }

        Transition::Moved(movement) => {
            vec![(Recipient::AllExcept(movement.id), ServerEvent::ParticipantMoved(movement.clone()))]
        }

        Transition::TokenPlaced { participant, container_id, balance, container_count } => vec![
            (
                Recipient::Only(*participant),
                ServerEvent::TokenAccepted {
                    container_id: container_id.clone(),
                    balance: *balance,
                    container_count: *container_count,
                },
            ),
            (
                Recipient::All,
                ServerEvent::ContainerUpdated { container_id: container_id.clone(), count: *container_count },
            ),
            (
                Recipient::AllExcept(*participant),
                ServerEvent::BalanceUpdated { id: *participant, balance: *balance },
            ),
        ],

        Transition::Replenished { participant, balance } => vec![
            (Recipient::Only(*participant), ServerEvent::TokensRefilled { balance: *balance }),
            (
                Recipient::AllExcept(*participant),
                ServerEvent::BalanceUpdated { id: *participant, balance: *balance },
            ),
        ],

        Transition::CountRequested { participant, active } => {
            vec![(Recipient::Only(*participant), ServerEvent::CountUpdated { count: *active })]
        }

        Transition::Left { participant, active, .. } => vec![
            (Recipient::AllExcept(*participant), ServerEvent::ParticipantLeft { id: *participant }),
            (Recipient::All, ServerEvent::CountUpdated { count: *active }),
        ],

        Transition::StatusTick { active, uptime } => vec![(
            Recipient::All,
            ServerEvent::ServerStatus { count: *active, uptime_secs: uptime.as_secs() },
        )],

        Transition::ContainersReset { containers } => {
            vec![(Recipient::All, ServerEvent::ContainersReset { containers: containers.clone() })]
        }

        Transition::ShuttingDown { message, at_unix_ms } => vec![(
            Recipient::All,
            ServerEvent::ServerShutdown { message: message.clone(), at_unix_ms: *at_unix_ms },
        )],
    }
}
