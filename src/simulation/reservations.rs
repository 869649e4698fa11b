//! Tick-scoped cell reservations
//!
//! Every car owns the reservation for the cell it stands on. Moving means
//! claiming the target and releasing the old cell in one call, so later cars
//! in the same tick never observe a half-finished move.

use std::collections::HashMap;

use super::types::{Cell, EntityId};

#[derive(Debug, Clone, Default)]
pub struct ReservationTable {
    claims: HashMap<Cell, EntityId>,
}

impl ReservationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The car currently holding `cell`, if any
    pub fn holder(&self, cell: Cell) -> Option<EntityId> {
        self.claims.get(&cell).copied()
    }

    pub fn is_reserved(&self, cell: Cell) -> bool {
        self.claims.contains_key(&cell)
    }

    /// True when `cell` is held by some car other than `car`
    pub fn is_held_by_other(&self, cell: Cell, car: EntityId) -> bool {
        matches!(self.holder(cell), Some(holder) if holder != car)
    }

    /// Claim a cell. First claim wins; returns false if someone else holds it.
    pub fn claim(&mut self, cell: Cell, car: EntityId) -> bool {
        if self.is_held_by_other(cell, car) {
            return false;
        }
        self.claims.insert(cell, car);
        true
    }

    /// Release a cell, but only if `car` is the one holding it
    pub fn release(&mut self, cell: Cell, car: EntityId) {
        if self.holder(cell) == Some(car) {
            self.claims.remove(&cell);
        }
    }

    /// Claim `to` and release `from` as a single step
    /// Returns false, changing nothing, when `to` belongs to another car
    pub fn transfer(&mut self, car: EntityId, from: Cell, to: Cell) -> bool {
        if !self.claim(to, car) {
            return false;
        }
        if from != to {
            self.release(from, car);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Cell, &EntityId)> {
        self.claims.iter()
    }
}
