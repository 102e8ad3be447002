//! World configuration.

use hoard_protocol::{ContainerId, Vec3};
use serde::{Deserialize, Serialize};

/// A container to create at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub id: ContainerId,
    pub position: Vec3,
}

impl ContainerSpec {
    pub fn new(id: impl Into<String>, position: Vec3) -> Self {
        Self { id: ContainerId::new(id), position }
    }
}

/// Static shape of the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Balance every participant starts with and can never exceed.
    pub max_tokens: u32,

    /// Spawn points are drawn from `[-spawn_extent, spawn_extent]` on x and z.
    pub spawn_extent: f64,

    /// Height every participant spawns at.
    pub spawn_height: f64,

    /// The fixed set of containers.
    pub containers: Vec<ContainerSpec>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_tokens: 5,
            spawn_extent: 15.0,
            spawn_height: 1.0,
            containers: vec![
                ContainerSpec::new("chest1", Vec3::new(10.0, 0.0, 10.0)),
                ContainerSpec::new("chest2", Vec3::new(-10.0, 0.0, 10.0)),
                ContainerSpec::new("chest3", Vec3::new(10.0, 0.0, -10.0)),
                ContainerSpec::new("chest4", Vec3::new(-10.0, 0.0, -10.0)),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_world_has_four_chests_and_five_tokens() {
        let config = WorldConfig::default();
        assert_eq!(config.max_tokens, 5);
        let ids: Vec<&str> = config.containers.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["chest1", "chest2", "chest3", "chest4"]);
    }
}
