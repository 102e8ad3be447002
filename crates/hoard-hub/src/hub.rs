//! Hub actor: the single task that owns the world.
//!
//! Every mutation arrives as a [`HubCommand`] on one bounded queue and runs
//! to completion before the next, so the world never sees interleaved
//! updates. Reaper and status ticks are branches of the same `select!`.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hoard_protocol::{ClientEvent, ContainerId, ContainerView, ParticipantId, ParticipantView, ServerEvent};
use hoard_session::{SessionError, SessionLifecycle};
use hoard_tick::{TickConfig, TickScheduler};
use hoard_world::{LeaveCause, Transition, WorldStore, economy};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::{HubConfig, HubError, dispatch};

/// Channel the hub pushes a participant's notifications into.
///
/// The hub holds the only sender once a channel has joined. When the
/// participant leaves or is evicted the sender is dropped, so the receiving
/// side sees `None` and knows to close the connection. The queue is bounded
/// by [`HubConfig::outbox_capacity`]; a channel that lets it fill up is
/// evicted.
pub type Outbox = mpsc::Sender<ServerEvent>;

/// Commands sent to the hub through its queue.
pub(crate) enum HubCommand {
    /// First join on a channel, carrying the channel's outbox.
    Join {
        id: ParticipantId,
        username: Option<String>,
        outbox: Outbox,
    },

    /// Any other inbound client event.
    Client { id: ParticipantId, event: ClientEvent },

    /// The transport channel is gone.
    Disconnected { id: ParticipantId },

    Participants {
        reply: oneshot::Sender<Vec<ParticipantView>>,
    },

    Containers {
        reply: oneshot::Sender<BTreeMap<ContainerId, ContainerView>>,
    },

    Status {
        reply: oneshot::Sender<HubStatus>,
    },

    ResetContainers {
        reply: oneshot::Sender<Result<BTreeMap<ContainerId, ContainerView>, HubError>>,
    },

    /// Broadcast `server-shutdown` and stop accepting changes.
    Shutdown { message: String, reply: oneshot::Sender<()> },
}

/// Aggregate state for health checks.
#[derive(Debug, Clone, PartialEq)]
pub struct HubStatus {
    /// Active participants.
    pub active: usize,
    /// Time since the hub started.
    pub uptime: Duration,
    /// Sum of balances and container counts.
    pub token_total: u64,
    pub shutting_down: bool,
}

/// Handle to the running hub. Cheap to clone.
#[derive(Clone)]
pub struct HubHandle {
    sender: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Joins channel `id`, handing over its outbox.
    ///
    /// The result of the join arrives on the outbox: `init-snapshot` on
    /// success, or the outbox is dropped if the hub refused.
    pub async fn join(&self, id: ParticipantId, username: Option<String>, outbox: Outbox) -> Result<(), HubError> {
        self.send(HubCommand::Join { id, username, outbox }).await
    }

    /// Forwards a client event (fire-and-forget).
    pub async fn submit(&self, id: ParticipantId, event: ClientEvent) -> Result<(), HubError> {
        self.send(HubCommand::Client { id, event }).await
    }

    /// Reports that channel `id` has closed.
    pub async fn disconnected(&self, id: ParticipantId) -> Result<(), HubError> {
        self.send(HubCommand::Disconnected { id }).await
    }

    /// Like [`disconnected`](Self::disconnected) but usable from `Drop`.
    ///
    /// Falls back to a spawned task when the queue is momentarily full.
    pub fn disconnected_nowait(&self, id: ParticipantId) {
        match self.sender.try_send(HubCommand::Disconnected { id }) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(cmd)) => {
                let sender = self.sender.clone();
                tokio::spawn(async move {
                    let _ = sender.send(cmd).await;
                });
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(%id, "hub gone, dropping disconnect");
            }
        }
    }

    /// Every Active participant.
    pub async fn participants(&self) -> Result<Vec<ParticipantView>, HubError> {
        self.query(|reply| HubCommand::Participants { reply }).await
    }

    /// Every container with its count.
    pub async fn containers(&self) -> Result<BTreeMap<ContainerId, ContainerView>, HubError> {
        self.query(|reply| HubCommand::Containers { reply }).await
    }

    pub async fn status(&self) -> Result<HubStatus, HubError> {
        self.query(|reply| HubCommand::Status { reply }).await
    }

    /// Zeroes every container and broadcasts `containers-reset`.
    ///
    /// # Errors
    /// [`HubError::ShuttingDown`] once [`shutdown`](Self::shutdown) has run.
    pub async fn reset_containers(&self) -> Result<BTreeMap<ContainerId, ContainerView>, HubError> {
        self.query(|reply| HubCommand::ResetContainers { reply }).await?
    }

    /// Broadcasts `server-shutdown` and freezes the world. Queries keep
    /// working afterwards. Calling it twice broadcasts once.
    pub async fn shutdown(&self, message: impl Into<String>) -> Result<(), HubError> {
        let message = message.into();
        self.query(|reply| HubCommand::Shutdown { message, reply }).await
    }

    async fn send(&self, cmd: HubCommand) -> Result<(), HubError> {
        self.sender.send(cmd).await.map_err(|_| HubError::Unavailable)
    }

    async fn query<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> HubCommand) -> Result<T, HubError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(make(reply_tx)).await?;
        reply_rx.await.map_err(|_| HubError::Unavailable)
    }
}

/// The actor state. Runs inside a Tokio task.
struct HubActor {
    world: WorldStore,
    sessions: SessionLifecycle,
    /// Outboxes of Active channels only.
    outboxes: BTreeMap<ParticipantId, Outbox>,
    reaper: TickScheduler,
    status: TickScheduler,
    started: Instant,
    shutting_down: bool,
    rng: StdRng,
    receiver: mpsc::Receiver<HubCommand>,
}

impl HubActor {
    /// Processes ticks and commands until every handle is dropped.
    async fn run(mut self) {
        tracing::info!(
            containers = self.world.container_views().len(),
            max_tokens = self.world.max_tokens(),
            "hub started"
        );

        loop {
            tokio::select! {
                biased;

                _ = self.reaper.wait_for_tick() => self.sweep_idle(),
                _ = self.status.wait_for_tick() => self.broadcast_status(),
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
            }
        }

        tracing::info!(active = self.world.active_count(), "hub stopped");
    }

    fn handle(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::Join { id, username, outbox } => self.join(id, username.as_deref(), Some(outbox)),
            HubCommand::Client { id, event } => self.client_event(id, event),
            HubCommand::Disconnected { id } => self.disconnected(id),
            HubCommand::Participants { reply } => {
                let _ = reply.send(self.world.participant_views());
            }
            HubCommand::Containers { reply } => {
                let _ = reply.send(self.world.container_views());
            }
            HubCommand::Status { reply } => {
                let _ = reply.send(HubStatus {
                    active: self.world.active_count(),
                    uptime: self.started.elapsed(),
                    token_total: self.world.token_total(),
                    shutting_down: self.shutting_down,
                });
            }
            HubCommand::ResetContainers { reply } => {
                let result = if self.shutting_down {
                    Err(HubError::ShuttingDown)
                } else {
                    let transition = economy::reset_containers(&mut self.world);
                    self.deliver(&transition);
                    Ok(self.world.container_views())
                };
                let _ = reply.send(result);
            }
            HubCommand::Shutdown { message, reply } => {
                self.shut_down(message);
                let _ = reply.send(());
            }
        }
    }

    fn join(&mut self, id: ParticipantId, username: Option<&str>, outbox: Option<Outbox>) {
        if self.shutting_down {
            tracing::debug!(%id, "join refused during shutdown");
            return;
        }

        let now = Instant::now().into_std();
        match self.sessions.join(&mut self.world, id, username, now, &mut self.rng) {
            Ok(transition) => {
                if let Some(outbox) = outbox {
                    self.outboxes.insert(id, outbox);
                }
                self.deliver(&transition);
            }
            Err(err) => tracing::debug!(%id, %err, "join ignored"),
        }
    }

    fn client_event(&mut self, id: ParticipantId, event: ClientEvent) {
        if self.shutting_down {
            tracing::debug!(%id, event = event.name(), "event dropped during shutdown");
            return;
        }

        let now = Instant::now().into_std();
        let name = event.name();
        let result = match event {
            ClientEvent::Join { username } => {
                self.join(id, username.as_deref(), None);
                return;
            }
            ClientEvent::Move(update) => self.sessions.apply_move(&mut self.world, id, &update, now),
            ClientEvent::PlaceToken { container_id } => {
                self.sessions.touch(&mut self.world, id, now).and_then(|()| {
                    economy::place_token(&mut self.world, id, container_id.as_ref()).map_err(SessionError::from)
                })
            }
            ClientEvent::RequestCount => self.sessions.request_count(&self.world, id),
            ClientEvent::Refill => self
                .sessions
                .touch(&mut self.world, id, now)
                .and_then(|()| economy::replenish(&mut self.world, id).map_err(SessionError::from)),
        };

        match result {
            Ok(transition) => self.deliver(&transition),
            Err(err) => tracing::debug!(%id, event = name, %err, "event rejected"),
        }
    }

    fn disconnected(&mut self, id: ParticipantId) {
        self.outboxes.remove(&id);
        if let Ok(transition) = self.sessions.leave(&mut self.world, id, LeaveCause::Disconnected) {
            self.deliver(&transition);
        }
        self.sessions.forget(id);
    }

    fn sweep_idle(&mut self) {
        let now = Instant::now().into_std();
        let evicted = self.sessions.reap_idle(&mut self.world, now);

        // Close every evicted channel before telling the survivors.
        for transition in &evicted {
            if let Transition::Left { participant, .. } = transition {
                self.outboxes.remove(participant);
            }
        }
        for transition in &evicted {
            self.deliver(transition);
        }
    }

    fn broadcast_status(&mut self) {
        let transition = Transition::StatusTick {
            active: self.world.active_count(),
            uptime: self.started.elapsed(),
        };
        tracing::debug!(active = self.world.active_count(), "status tick");
        self.deliver(&transition);
    }

    fn shut_down(&mut self, message: String) {
        if self.shutting_down {
            return;
        }
        self.shutting_down = true;
        self.reaper.pause();
        self.status.pause();

        let at_unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        tracing::info!(active = self.world.active_count(), %message, "hub shutting down");
        self.deliver(&Transition::ShuttingDown { message, at_unix_ms });
    }

    /// Pushes a transition's notifications into the outboxes they address.
    /// A closed outbox means the channel is on its way out; its disconnect
    /// will follow. A full outbox gets its participant evicted.
    fn deliver(&mut self, transition: &Transition) {
        let mut overflowed = BTreeSet::new();
        for (recipient, event) in dispatch::notifications(transition) {
            for (id, outbox) in &self.outboxes {
                if !recipient.includes(*id) {
                    continue;
                }
                if let Err(mpsc::error::TrySendError::Full(_)) = outbox.try_send(event.clone()) {
                    overflowed.insert(*id);
                }
            }
        }

        for id in overflowed {
            self.evict_slow(id);
        }
    }

    /// Drops a channel that stopped reading and announces its departure.
    fn evict_slow(&mut self, id: ParticipantId) {
        if self.outboxes.remove(&id).is_none() {
            return;
        }
        tracing::warn!(%id, "outbox full, evicting slow participant");
        if let Ok(transition) = self.sessions.leave(&mut self.world, id, LeaveCause::Disconnected) {
            self.deliver(&transition);
        }
    }
}

/// Spawns the hub task and returns a handle to it.
///
/// The task stops once every [`HubHandle`] is dropped.
pub fn spawn_hub(config: HubConfig) -> HubHandle {
    let (tx, rx) = mpsc::channel(config.command_buffer.max(1));

    let actor = HubActor {
        world: WorldStore::new(&config.world),
        sessions: SessionLifecycle::new(config.session, &config.world),
        outboxes: BTreeMap::new(),
        reaper: TickScheduler::new("reaper", TickConfig::maybe_every(config.reap_interval)),
        status: TickScheduler::new("status", TickConfig::maybe_every(config.status_interval)),
        started: Instant::now(),
        shutting_down: false,
        rng: StdRng::from_os_rng(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    HubHandle { sender: tx }
}
