//! The closed set of things that can stand on a grid cell

use std::collections::BTreeMap;

use super::car::SimCar;
use super::traffic_light::SimTrafficLight;
use super::types::{Cell, Direction, EntityId};

/// Per-kind payload. Only cars and lights carry mutable state.
#[derive(Debug, Clone)]
pub enum EntityKind {
    Obstacle,
    Street(Direction),
    TrafficLight(SimTrafficLight),
    Destination,
    Car(SimCar),
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Obstacle => "Obstacle",
            EntityKind::Street(_) => "Street",
            EntityKind::TrafficLight(_) => "TrafficLight",
            EntityKind::Destination => "Destination",
            EntityKind::Car(_) => "Car",
        }
    }

    /// Cars and lights are scheduled every tick; everything else is scenery
    pub fn is_agent(&self) -> bool {
        matches!(self, EntityKind::Car(_) | EntityKind::TrafficLight(_))
    }
}

/// An entity placed somewhere on the grid
#[derive(Debug, Clone)]
pub struct SimEntity {
    pub id: EntityId,
    pub position: Cell,
    pub kind: EntityKind,
}

impl SimEntity {
    pub fn new(id: EntityId, position: Cell, kind: EntityKind) -> Self {
        Self { id, position, kind }
    }

    /// Debug label such as `Car-12`, built on demand
    pub fn label(&self) -> String {
        format!("{}-{}", self.kind.name(), self.id)
    }

    pub fn as_car(&self) -> Option<&SimCar> {
        match &self.kind {
            EntityKind::Car(car) => Some(car),
            _ => None,
        }
    }

    pub fn as_light(&self) -> Option<&SimTrafficLight> {
        match &self.kind {
            EntityKind::TrafficLight(light) => Some(light),
            _ => None,
        }
    }

    pub fn street_direction(&self) -> Option<Direction> {
        match self.kind {
            EntityKind::Street(direction) => Some(direction),
            _ => None,
        }
    }
}

/// Ordered so that iteration, and therefore seeded runs, are reproducible
pub type EntityStore = BTreeMap<EntityId, SimEntity>;
