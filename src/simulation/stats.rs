//! Simulation statistics and per-tick metrics history

use serde::Serialize;

/// Running totals for a world
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimStats {
    pub ticks: u64,
    pub spawned: u64,
    pub arrived: u64,
    pub collisions_total: u64,
    pub active_cars: usize,
    /// Sum over arrived cars of ticks spent between spawn and arrival
    pub total_trip_ticks: u64,
}

impl SimStats {
    /// Mean trip length of the cars that made it, or 0 when none did
    pub fn average_trip_ticks(&self) -> f64 {
        if self.arrived == 0 {
            return 0.0;
        }
        self.total_trip_ticks as f64 / self.arrived as f64
    }

    /// Percentage of spawned cars that reached their destination
    pub fn arrival_rate(&self) -> f64 {
        if self.spawned == 0 {
            return 0.0;
        }
        self.arrived as f64 / self.spawned as f64 * 100.0
    }

    /// Record one arrival after a trip of `trip_ticks`
    pub fn record_arrival(&mut self, trip_ticks: u64) {
        self.arrived += 1;
        self.total_trip_ticks += trip_ticks;
    }
}

/// One row of the metrics history, collected at the end of every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSample {
    pub tick: u64,
    pub spawned: u64,
    pub arrived: u64,
    pub collisions: u64,
    pub collisions_total: u64,
    pub active_cars: usize,
}

impl MetricsSample {
    pub fn capture(stats: &SimStats, collisions: u64) -> Self {
        Self {
            tick: stats.ticks,
            spawned: stats.spawned,
            arrived: stats.arrived,
            collisions,
            collisions_total: stats.collisions_total,
            active_cars: stats.active_cars,
        }
    }
}
