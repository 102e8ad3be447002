//! Resource Transaction Logic.
//!
//! [`place_token`] is the only operation that moves tokens and it never
//! creates or destroys one. [`replenish`] and [`reset_containers`] are
//! administrative escape hatches that deliberately break conservation; both
//! are recorded under the `hoard::audit` tracing target.

use hoard_protocol::{ContainerId, ParticipantId};

use crate::{Transition, WorldError, WorldStore};

/// Moves one token from `participant` into `container`.
///
/// # Errors
/// Returns the first failed precondition (unknown participant, unknown
/// container, empty balance). Nothing is changed in that case.
pub fn place_token(
    world: &mut WorldStore,
    participant: ParticipantId,
    container: Option<&ContainerId>,
) -> Result<Transition, WorldError> {
    let container = container.ok_or(WorldError::MissingContainer)?;
    let (balance, container_count) = world.transfer_token(participant, container)?;

    tracing::debug!(
        %participant,
        container_id = %container,
        balance,
        container_count,
        "token placed"
    );

    Ok(Transition::TokenPlaced {
        participant,
        container_id: container.clone(),
        balance,
        container_count,
    })
}

/// Resets `participant`'s balance to the maximum, whatever it was.
///
/// # Errors
/// [`WorldError::ParticipantNotFound`] if the participant is not Active.
pub fn replenish(world: &mut WorldStore, participant: ParticipantId) -> Result<Transition, WorldError> {
    let max = world.max_tokens();
    let record = world.participant_mut(participant)?;
    let before = record.balance();
    record.refill(max);

    tracing::info!(
        target: "hoard::audit",
        %participant,
        before,
        after = max,
        minted = max - before,
        "balance replenished outside the token economy"
    );

    Ok(Transition::Replenished { participant, balance: max })
}

/// Zeroes every container count.
pub fn reset_containers(world: &mut WorldStore) -> Transition {
    let mut discarded = 0u64;
    for container in world.containers_mut() {
        discarded += container.count();
        container.reset();
    }

    tracing::info!(
        target: "hoard::audit",
        discarded,
        "container counts reset by administrator"
    );

    Transition::ContainersReset { containers: world.container_views() }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use hoard_protocol::Pose;

    use super::*;
    use crate::{Participant, WorldConfig};

    fn pid(id: u64) -> ParticipantId {
        ParticipantId(id)
    }

    fn chest(name: &str) -> ContainerId {
        ContainerId::new(name)
    }

    fn world_with(balances: &[(u64, u32)]) -> WorldStore {
        let mut world = WorldStore::new(&WorldConfig::default());
        for &(id, balance) in balances {
            let p = Participant::new(pid(id), format!("p{id}"), "#06D6A0", Pose::default(), balance, Instant::now());
            world.insert_participant(p).unwrap();
        }
        world
    }

    #[test]
    fn test_place_token_moves_exactly_one_token() {
        let mut world = world_with(&[(1, 5)]);
        let total = world.token_total();

        let t = place_token(&mut world, pid(1), Some(&chest("chest1"))).unwrap();

        assert_eq!(
            t,
            Transition::TokenPlaced {
                participant: pid(1),
                container_id: chest("chest1"),
                balance: 4,
                container_count: 1,
            }
        );
        assert_eq!(world.token_total(), total);
    }

    #[test]
    fn test_place_token_with_zero_balance_changes_nothing() {
        let mut world = world_with(&[(1, 0)]);

        let err = place_token(&mut world, pid(1), Some(&chest("chest1"))).unwrap_err();

        assert_eq!(err, WorldError::InsufficientBalance(pid(1)));
        assert_eq!(world.participant(pid(1)).unwrap().balance(), 0);
        assert_eq!(world.container(&chest("chest1")).unwrap().count(), 0);
    }

    #[test]
    fn test_place_token_into_unknown_container_changes_nothing() {
        let mut world = world_with(&[(1, 5)]);

        let err = place_token(&mut world, pid(1), Some(&chest("chest9"))).unwrap_err();

        assert_eq!(err, WorldError::ContainerNotFound(chest("chest9")));
        assert_eq!(world.participant(pid(1)).unwrap().balance(), 5);
        assert_eq!(world.token_total(), 5);
    }

    #[test]
    fn test_place_token_without_container_is_rejected() {
        let mut world = world_with(&[(1, 5)]);
        assert_eq!(place_token(&mut world, pid(1), None).unwrap_err(), WorldError::MissingContainer);
    }

    #[test]
    fn test_place_token_for_unknown_participant_is_rejected() {
        let mut world = world_with(&[]);
        let err = place_token(&mut world, pid(4), Some(&chest("chest1"))).unwrap_err();
        assert_eq!(err, WorldError::ParticipantNotFound(pid(4)));
        assert_eq!(world.container(&chest("chest1")).unwrap().count(), 0);
    }

    #[test]
    fn test_two_participants_on_same_container_both_count() {
        let mut world = world_with(&[(1, 5), (2, 5)]);

        place_token(&mut world, pid(1), Some(&chest("chest2"))).unwrap();
        place_token(&mut world, pid(2), Some(&chest("chest2"))).unwrap();

        assert_eq!(world.container(&chest("chest2")).unwrap().count(), 2);
        assert_eq!(world.participant(pid(1)).unwrap().balance(), 4);
        assert_eq!(world.participant(pid(2)).unwrap().balance(), 4);
        assert_eq!(world.token_total(), 10);
    }

    #[test]
    fn test_spending_everything_then_more_never_goes_negative() {
        let mut world = world_with(&[(1, 5)]);
        let mut accepted = 0;
        for _ in 0..8 {
            if place_token(&mut world, pid(1), Some(&chest("chest3"))).is_ok() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 5);
        assert_eq!(world.participant(pid(1)).unwrap().balance(), 0);
        assert_eq!(world.container(&chest("chest3")).unwrap().count(), 5);
    }

    #[test]
    fn test_replenish_sets_exactly_max() {
        let mut world = world_with(&[(1, 1)]);
        let t = replenish(&mut world, pid(1)).unwrap();
        assert_eq!(t, Transition::Replenished { participant: pid(1), balance: 5 });
        assert_eq!(world.participant(pid(1)).unwrap().balance(), 5);
        assert_eq!(world.token_total(), 5);
    }

    #[test]
    fn test_replenish_unknown_participant_is_not_found() {
        let mut world = world_with(&[]);
        assert!(replenish(&mut world, pid(1)).is_err());
    }

    #[test]
    fn test_reset_containers_zeroes_counts_only() {
        let mut world = world_with(&[(1, 5)]);
        place_token(&mut world, pid(1), Some(&chest("chest1"))).unwrap();
        place_token(&mut world, pid(1), Some(&chest("chest4"))).unwrap();

        let t = reset_containers(&mut world);

        let Transition::ContainersReset { containers } = t else {
            panic!("expected ContainersReset");
        };
        assert!(containers.values().all(|c| c.count == 0));
        assert_eq!(world.participant(pid(1)).unwrap().balance(), 3);
    }
}
