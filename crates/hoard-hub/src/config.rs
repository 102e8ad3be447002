//! Hub configuration.

use std::time::Duration;

use hoard_session::SessionConfig;
use hoard_world::WorldConfig;

/// Settings for [`spawn_hub`](crate::spawn_hub).
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub world: WorldConfig,
    pub session: SessionConfig,

    /// How often the idle reaper sweeps. `None` disables it.
    pub reap_interval: Option<Duration>,

    /// How often `server-status` is broadcast. `None` disables it.
    pub status_interval: Option<Duration>,

    /// Capacity of the command queue. Senders wait when it is full.
    pub command_buffer: usize,

    /// Capacity of each channel's outbox. A channel whose outbox fills up
    /// is evicted.
    pub outbox_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            session: SessionConfig::default(),
            reap_interval: Some(Duration::from_secs(5 * 60)),
            status_interval: Some(Duration::from_secs(30)),
            command_buffer: 1024,
            outbox_capacity: 256,
        }
    }
}
