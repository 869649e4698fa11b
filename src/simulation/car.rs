//! Car movement logic for the grid traffic simulation
//!
//! Each activation a car looks one cell ahead in the four compass
//! directions and greedily steps toward its destination. There is no route
//! planning; the short history in `recent_positions` is the only thing that
//! keeps a car from circling forever.

use ordered_float::OrderedFloat;
use std::collections::VecDeque;

use super::entity::{EntityKind, EntityStore};
use super::error::{SimError, SimResult};
use super::grid::SimGrid;
use super::reservations::ReservationTable;
use super::types::{Cell, Direction, EntityId, RECENT_POSITIONS_CAPACITY};

/// Result of a car update indicating what happened this activation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarUpdateResult {
    /// Car was standing on its destination and has left the grid
    Arrived,
    /// Car moved one cell
    Moved { from: Cell, to: Cell },
    /// Car picked a target but another car had already reserved it
    Blocked { target: Cell },
    /// No legal move this tick
    Stalled,
}

/// A car in the grid simulation
#[derive(Debug, Clone, PartialEq)]
pub struct SimCar {
    /// The destination entity, fixed for the car's whole life
    pub destination: EntityId,
    /// The cell the car occupied before its last move
    pub last_position: Option<Cell>,
    /// Most recently vacated cells, oldest first
    pub recent_positions: VecDeque<Cell>,
    /// Tick on which the car was spawned
    pub spawned_at: u64,
}

/// What a car sees when it looks at one neighboring cell
#[derive(Debug, Clone, Copy)]
struct NeighborSurvey {
    cell: Cell,
    street: Option<Direction>,
    red_light: bool,
    has_car: bool,
    has_own_destination: bool,
}

impl SimCar {
    pub fn new(destination: EntityId, spawned_at: u64) -> Self {
        Self {
            destination,
            last_position: None,
            recent_positions: VecDeque::with_capacity(RECENT_POSITIONS_CAPACITY + 1),
            spawned_at,
        }
    }

    /// Whether `cell` is in the loop-avoidance history
    pub fn recently_visited(&self, cell: Cell) -> bool {
        self.recent_positions.contains(&cell)
    }

    fn remember(&mut self, cell: Cell) {
        self.recent_positions.push_back(cell);
        while self.recent_positions.len() > RECENT_POSITIONS_CAPACITY {
            self.recent_positions.pop_front();
        }
    }

    /// Run one activation for the car `id` standing at `position`
    ///
    /// The car must not be present in `entities` while this runs (the world
    /// takes it out), but its id is still on the grid. On `Arrived` the car
    /// has already been removed from the grid and its reservation released.
    pub fn update(
        &mut self,
        id: EntityId,
        position: &mut Cell,
        grid: &mut SimGrid,
        entities: &EntityStore,
        reservations: &mut ReservationTable,
    ) -> SimResult<CarUpdateResult> {
        let current = *position;

        // Standing on our destination: leave the simulation
        if grid.contents(current).contains(&self.destination) {
            grid.remove(id, current)?;
            reservations.release(current, id);
            return Ok(CarUpdateResult::Arrived);
        }

        let destination_cell = entities
            .get(&self.destination)
            .map(|destination| destination.position)
            .ok_or(SimError::EntityNotFound(self.destination))?;

        let current_street = grid
            .contents(current)
            .iter()
            .filter_map(|occupant| entities.get(occupant))
            .find_map(|entity| entity.street_direction());

        let surveys: Vec<NeighborSurvey> = grid
            .neighbors4(current)
            .into_iter()
            .map(|cell| self.survey(cell, grid, entities))
            .collect();

        // Destination wins over every other candidate
        let target = match surveys.iter().find(|survey| survey.has_own_destination) {
            Some(survey) => Some(survey.cell),
            None => self.choose_step(current, current_street, &surveys, destination_cell),
        };

        let Some(target) = target else {
            return Ok(CarUpdateResult::Stalled);
        };

        // First claim wins; try again next tick
        if !reservations.transfer(id, current, target) {
            return Ok(CarUpdateResult::Blocked { target });
        }

        grid.move_entity(id, current, target)?;
        *position = target;
        self.last_position = Some(current);
        self.remember(current);

        Ok(CarUpdateResult::Moved {
            from: current,
            to: target,
        })
    }

    fn survey(&self, cell: Cell, grid: &SimGrid, entities: &EntityStore) -> NeighborSurvey {
        let mut survey = NeighborSurvey {
            cell,
            street: None,
            red_light: false,
            has_car: false,
            has_own_destination: false,
        };

        for occupant in grid.contents(cell) {
            let Some(entity) = entities.get(occupant) else {
                continue;
            };
            match &entity.kind {
                EntityKind::Street(direction) => survey.street = Some(*direction),
                EntityKind::TrafficLight(light) => survey.red_light |= light.is_red(),
                EntityKind::Car(_) => survey.has_car = true,
                EntityKind::Destination => {
                    survey.has_own_destination |= *occupant == self.destination
                }
                EntityKind::Obstacle => {}
            }
        }

        survey
    }

    /// Filter neighbors into fresh and recently visited candidates, then pick
    /// the one closest to the destination. Fresh candidates always win.
    fn choose_step(
        &self,
        current: Cell,
        current_street: Option<Direction>,
        surveys: &[NeighborSurvey],
        destination_cell: Cell,
    ) -> Option<Cell> {
        let mut candidates = Vec::new();
        let mut visited = Vec::new();

        for survey in surveys {
            if survey.red_light || survey.has_car {
                continue;
            }
            if self.last_position == Some(survey.cell) {
                continue;
            }
            let Some(street) = survey.street else {
                continue;
            };
            let Some(heading) = current.direction_to(&survey.cell) else {
                continue;
            };
            if !Self::is_legal_move(heading, street, current_street) {
                continue;
            }

            if self.recently_visited(survey.cell) {
                visited.push(survey.cell);
            } else {
                candidates.push(survey.cell);
            }
        }

        Self::closest(&candidates, destination_cell)
            .or_else(|| Self::closest(&visited, destination_cell))
    }

    /// A move heading in `heading` is illegal when either the target street
    /// or the street the car is standing on runs the opposite way
    pub fn is_legal_move(
        heading: Direction,
        target_street: Direction,
        current_street: Option<Direction>,
    ) -> bool {
        let against = heading.opposite();
        target_street != against && current_street != Some(against)
    }

    /// First minimum wins on ties
    fn closest(cells: &[Cell], destination_cell: Cell) -> Option<Cell> {
        cells
            .iter()
            .copied()
            .min_by_key(|cell| OrderedFloat(cell.distance(&destination_cell)))
    }
}
