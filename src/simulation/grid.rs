//! Bounded multi-occupancy grid
//!
//! Each cell keeps an unordered list of the entity ids standing on it. The
//! grid knows nothing about what those entities are; the world owns them.

use super::error::{SimError, SimResult};
use super::types::{Cell, Direction, EntityId};

/// A non-wrapping `width` x `height` spatial index
#[derive(Debug, Clone)]
pub struct SimGrid {
    width: i32,
    height: i32,
    cells: Vec<Vec<EntityId>>,
}

impl SimGrid {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![Vec::new(); (width * height) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.width && cell.y >= 0 && cell.y < self.height
    }

    fn index(&self, cell: Cell) -> SimResult<usize> {
        if !self.in_bounds(cell) {
            return Err(SimError::OutOfBounds {
                cell,
                width: self.width,
                height: self.height,
            });
        }
        Ok((cell.y * self.width + cell.x) as usize)
    }

    /// Add an entity to a cell
    pub fn place(&mut self, entity: EntityId, cell: Cell) -> SimResult<()> {
        let index = self.index(cell)?;
        self.cells[index].push(entity);
        Ok(())
    }

    /// Entities at a cell. Out-of-bounds cells are simply empty.
    pub fn contents(&self, cell: Cell) -> &[EntityId] {
        match self.index(cell) {
            Ok(index) => &self.cells[index],
            Err(_) => &[],
        }
    }

    /// In-bounds orthogonal neighbors, in North, East, South, West order
    pub fn neighbors4(&self, cell: Cell) -> Vec<Cell> {
        Direction::ALL
            .into_iter()
            .map(|direction| cell.step(direction))
            .filter(|neighbor| self.in_bounds(*neighbor))
            .collect()
    }

    /// Remove an entity from a cell
    /// Returns whether the entity was actually there
    pub fn remove(&mut self, entity: EntityId, cell: Cell) -> SimResult<bool> {
        let index = self.index(cell)?;
        let occupants = &mut self.cells[index];
        match occupants.iter().position(|id| *id == entity) {
            Some(slot) => {
                occupants.swap_remove(slot);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Move an entity between cells
    /// Both cells are validated before anything changes
    pub fn move_entity(&mut self, entity: EntityId, from: Cell, to: Cell) -> SimResult<()> {
        let from_index = self.index(from)?;
        let to_index = self.index(to)?;
        let occupants = &mut self.cells[from_index];
        if let Some(slot) = occupants.iter().position(|id| *id == entity) {
            occupants.swap_remove(slot);
        }
        self.cells[to_index].push(entity);
        Ok(())
    }

    /// Iterate every cell with its occupants, row by row from the bottom
    pub fn iter_cells(&self) -> impl Iterator<Item = (Cell, &[EntityId])> + '_ {
        let width = self.width;
        self.cells.iter().enumerate().map(move |(index, occupants)| {
            let index = index as i32;
            (
                Cell::new(index % width, index / width),
                occupants.as_slice(),
            )
        })
    }
}
