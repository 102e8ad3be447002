//! The World State Store.
//!
//! Plain ordered maps, no interior locking: the store is owned by exactly one
//! task (the hub actor) and every mutation goes through `&mut self`.

use std::collections::BTreeMap;

use hoard_protocol::{ContainerId, ContainerView, InitSnapshot, ParticipantId, ParticipantView};

use crate::{Container, Participant, WorldConfig, WorldError};

/// All participants and containers.
#[derive(Debug, Clone)]
pub struct WorldStore {
    /// Keyed by id; `BTreeMap` so snapshots list participants in join order.
    participants: BTreeMap<ParticipantId, Participant>,
    containers: BTreeMap<ContainerId, Container>,
    max_tokens: u32,
}

impl WorldStore {
    /// Builds an empty world with the configured containers.
    pub fn new(config: &WorldConfig) -> Self {
        let containers = config
            .containers
            .iter()
            .map(|spec| (spec.id.clone(), Container::new(spec.id.clone(), spec.position)))
            .collect();
        Self {
            participants: BTreeMap::new(),
            containers,
            max_tokens: config.max_tokens,
        }
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    // -- Participants -----------------------------------------------------

    /// Adds a participant. Its balance is clamped to `max_tokens`.
    ///
    /// # Errors
    /// [`WorldError::AlreadyPresent`] if the id is taken; the existing
    /// record is left untouched.
    pub fn insert_participant(&mut self, mut participant: Participant) -> Result<(), WorldError> {
        let id = participant.id();
        if self.participants.contains_key(&id) {
            return Err(WorldError::AlreadyPresent(id));
        }
        participant.clamp_balance(self.max_tokens);
        self.participants.insert(id, participant);
        Ok(())
    }

    pub fn participant(&self, id: ParticipantId) -> Result<&Participant, WorldError> {
        self.participants.get(&id).ok_or(WorldError::ParticipantNotFound(id))
    }

    pub fn participant_mut(&mut self, id: ParticipantId) -> Result<&mut Participant, WorldError> {
        self.participants.get_mut(&id).ok_or(WorldError::ParticipantNotFound(id))
    }

    pub fn remove_participant(&mut self, id: ParticipantId) -> Result<Participant, WorldError> {
        self.participants.remove(&id).ok_or(WorldError::ParticipantNotFound(id))
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.participants.contains_key(&id)
    }

    /// Number of Active participants.
    pub fn active_count(&self) -> usize {
        self.participants.len()
    }

    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    pub fn participant_views(&self) -> Vec<ParticipantView> {
        self.participants.values().map(Participant::view).collect()
    }

    // -- Containers -------------------------------------------------------

    pub fn container(&self, id: &ContainerId) -> Result<&Container, WorldError> {
        self.containers.get(id).ok_or_else(|| WorldError::ContainerNotFound(id.clone()))
    }

    pub(crate) fn containers_mut(&mut self) -> impl Iterator<Item = &mut Container> {
        self.containers.values_mut()
    }

    pub fn container_views(&self) -> BTreeMap<ContainerId, ContainerView> {
        self.containers
            .iter()
            .map(|(id, c)| (id.clone(), c.view()))
            .collect()
    }

    /// Debits `participant` and credits `container` in one step.
    ///
    /// All preconditions are checked before either record is touched.
    pub(crate) fn transfer_token(
        &mut self,
        participant: ParticipantId,
        container: &ContainerId,
    ) -> Result<(u32, u64), WorldError> {
        let owner = self
            .participants
            .get_mut(&participant)
            .ok_or(WorldError::ParticipantNotFound(participant))?;
        let chest = self
            .containers
            .get_mut(container)
            .ok_or_else(|| WorldError::ContainerNotFound(container.clone()))?;
        if !owner.debit() {
            return Err(WorldError::InsufficientBalance(participant));
        }
        chest.deposit();
        Ok((owner.balance(), chest.count()))
    }

    // -- Derived views ----------------------------------------------------

    /// The world as seen by `id` right after joining.
    pub fn snapshot_for(&self, id: ParticipantId) -> Result<InitSnapshot, WorldError> {
        let me = self.participant(id)?;
        Ok(InitSnapshot {
            participant: me.view(),
            others: self
                .participants
                .values()
                .filter(|p| p.id() != id)
                .map(Participant::view)
                .collect(),
            containers: self.container_views(),
            max_tokens: self.max_tokens,
        })
    }

    /// Sum of all balances plus all container counts.
    pub fn token_total(&self) -> u64 {
        let held: u64 = self.participants.values().map(|p| u64::from(p.balance())).sum();
        let stored: u64 = self.containers.values().map(Container::count).sum();
        held + stored
    }
}
