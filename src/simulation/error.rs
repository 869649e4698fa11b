//! Simulation error type.
//!
//! Blocked moves, red lights and reservation conflicts are not errors; a car
//! that cannot move simply stays put for the tick.

use thiserror::Error;

use super::types::{Cell, EntityId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("cell {cell} is outside the {width}x{height} grid")]
    OutOfBounds { cell: Cell, width: i32, height: i32 },

    #[error("malformed map: {0}")]
    MalformedMap(String),

    #[error("no destinations available to assign")]
    NoDestinationsAvailable,

    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
}

/// Shorthand result type for the simulation engine.
pub type SimResult<T> = Result<T, SimError>;
