//! Grid traffic simulation engine
//!
//! This module contains the whole simulation: the grid, the entity model,
//! traffic lights, car movement, cell reservations and the tick driver. It
//! has no rendering or transport concerns and can be driven from the console.

mod car;
mod config;
mod entity;
mod error;
mod grid;
mod map;
mod reservations;
mod snapshot;
mod spawner;
mod stats;
mod traffic_light;
mod types;
mod world;

// Re-export public types for external use
pub use car::{CarUpdateResult, SimCar};
pub use config::SimConfig;
pub use entity::{EntityKind, EntityStore, SimEntity};
pub use error::{SimError, SimResult};
pub use grid::SimGrid;
pub use map::{Placement, DEFAULT_MAP};
pub use reservations::ReservationTable;
pub use snapshot::{DynamicEntitySnapshot, DynamicKind, StaticEntitySnapshot, StaticKind};
pub use spawner::Spawner;
pub use stats::{MetricsSample, SimStats};
pub use traffic_light::SimTrafficLight;
pub use types::{
    Cell, Direction, EntityId, DEFAULT_LIGHT_INTERVAL, DEFAULT_SPAWN_PERIOD,
    RECENT_POSITIONS_CAPACITY,
};
pub use world::SimWorld;
