//! Read-only views of the world for renderers and API layers
//!
//! Field names follow the JSON shape the front end consumes; optional fields
//! are left out of the output entirely when they do not apply.

use serde::Serialize;

use super::types::{Cell, Direction, EntityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StaticKind {
    Obstacle,
    Street,
    Destination,
}

/// An immortal, stateless entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticEntitySnapshot {
    pub id: EntityId,
    pub kind: StaticKind,
    #[serde(rename = "pos")]
    pub position: Cell,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DynamicKind {
    Car,
    TrafficLight,
}

/// A car or traffic light
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DynamicEntitySnapshot {
    pub id: EntityId,
    pub kind: DynamicKind,
    #[serde(rename = "pos")]
    pub position: Cell,
    #[serde(rename = "green", skip_serializing_if = "Option::is_none")]
    pub light_green: Option<bool>,
    #[serde(rename = "destination", skip_serializing_if = "Option::is_none")]
    pub destination_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_positions: Option<Vec<Cell>>,
}
