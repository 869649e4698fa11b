//! Car spawning for the grid simulation
//!
//! The spawner owns the fixed spawn points and period. The actual placement
//! is a free function over the world's parts so the world can call it both
//! from its periodic spawn round and from explicit `spawn_car` requests.

use log::debug;

use super::car::SimCar;
use super::entity::{EntityKind, EntityStore, SimEntity};
use super::error::{SimError, SimResult};
use super::grid::SimGrid;
use super::reservations::ReservationTable;
use super::types::{Cell, EntityId};

/// Where and how often new cars appear
#[derive(Debug, Clone)]
pub struct Spawner {
    pub spawn_points: Vec<Cell>,
    /// Ticks between spawn rounds; 0 disables spawning
    pub period: u64,
}

impl Spawner {
    pub fn new(spawn_points: Vec<Cell>, period: u64) -> Self {
        Self {
            spawn_points,
            period,
        }
    }

    /// The four grid corners, without duplicates on degenerate grids
    pub fn corners(width: i32, height: i32) -> Vec<Cell> {
        let mut corners = Vec::with_capacity(4);
        for cell in [
            Cell::new(0, 0),
            Cell::new(width - 1, 0),
            Cell::new(0, height - 1),
            Cell::new(width - 1, height - 1),
        ] {
            if !corners.contains(&cell) {
                corners.push(cell);
            }
        }
        corners
    }

    pub fn is_spawn_tick(&self, tick: u64) -> bool {
        self.period > 0 && tick % self.period == 0
    }
}

/// Place a new car at `cell` heading for `destination`
///
/// Returns `Ok(None)` when the cell is already reserved. On success the car
/// is on the grid, holds the reservation for `cell` and has been inserted
/// into `entities`.
pub fn spawn_car(
    car_id: EntityId,
    cell: Cell,
    destination: EntityId,
    tick: u64,
    grid: &mut SimGrid,
    entities: &mut EntityStore,
    reservations: &mut ReservationTable,
) -> SimResult<Option<EntityId>> {
    if !grid.in_bounds(cell) {
        return Err(SimError::OutOfBounds {
            cell,
            width: grid.width(),
            height: grid.height(),
        });
    }

    match entities.get(&destination).map(|entity| &entity.kind) {
        Some(EntityKind::Destination) => {}
        _ => return Err(SimError::EntityNotFound(destination)),
    }

    if reservations.is_reserved(cell) {
        debug!("Spawn point {} is reserved, skipping", cell);
        return Ok(None);
    }

    grid.place(car_id, cell)?;
    reservations.claim(cell, car_id);
    entities.insert(
        car_id,
        SimEntity::new(car_id, cell, EntityKind::Car(SimCar::new(destination, tick))),
    );

    debug!(
        "Spawned car {} at {} heading for destination {}",
        car_id, cell, destination
    );
    Ok(Some(car_id))
}

/// Uniform pick from the world's destinations
pub fn pick_destination<R: rand::Rng + ?Sized>(
    destinations: &[EntityId],
    rng: &mut R,
) -> SimResult<EntityId> {
    use rand::seq::IndexedRandom;

    destinations
        .choose(rng)
        .copied()
        .ok_or(SimError::NoDestinationsAvailable)
}
