//! World construction settings

use super::types::{Cell, DEFAULT_LIGHT_INTERVAL, DEFAULT_SPAWN_PERIOD};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Ticks between spawn rounds; 0 disables spawning
    pub spawn_period: u64,
    /// Ticks between toggles for every light built from the map
    pub light_interval: u32,
    /// Seed for a reproducible run. `None` uses the thread RNG.
    pub seed: Option<u64>,
    /// Where cars appear. `None` means the four grid corners.
    pub spawn_points: Option<Vec<Cell>>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            spawn_period: DEFAULT_SPAWN_PERIOD,
            light_interval: DEFAULT_LIGHT_INTERVAL,
            seed: None,
            spawn_points: None,
        }
    }
}

impl SimConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_spawn_period(mut self, spawn_period: u64) -> Self {
        self.spawn_period = spawn_period;
        self
    }

    pub fn with_light_interval(mut self, light_interval: u32) -> Self {
        self.light_interval = light_interval;
        self
    }

    pub fn with_spawn_points(mut self, spawn_points: Vec<Cell>) -> Self {
        self.spawn_points = Some(spawn_points);
        self
    }
}
