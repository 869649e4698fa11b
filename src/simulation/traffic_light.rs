//! Traffic light logic for the grid simulation
//!
//! A light is a plain periodic toggle. It has no knowledge of the cars
//! waiting on it; cars read `green` when surveying their neighbors.

use super::types::Direction;

/// A traffic light sharing a cell with exactly one street
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimTrafficLight {
    /// Ticks between toggles
    pub interval: u32,
    /// Ticks since the last toggle
    pub elapsed: u32,
    pub green: bool,
    /// Direction of the street this light controls
    pub direction: Direction,
}

impl SimTrafficLight {
    pub fn new(interval: u32, green: bool, direction: Direction) -> Self {
        Self {
            interval,
            elapsed: 0,
            green,
            direction,
        }
    }

    pub fn is_red(&self) -> bool {
        !self.green
    }

    /// Advance the light by one tick
    /// Returns true when this activation toggled the light
    pub fn update(&mut self) -> bool {
        self.elapsed += 1;
        if self.elapsed >= self.interval {
            self.green = !self.green;
            self.elapsed = 0;
            return true;
        }
        false
    }
}
