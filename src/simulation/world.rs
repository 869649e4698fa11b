//! Main simulation world that ties everything together
//!
//! This is the entry point for running the grid traffic simulation. All
//! mutable state lives here and is threaded explicitly through the grid,
//! the cars and the reservation table.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::car::{CarUpdateResult, SimCar};
use super::config::SimConfig;
use super::entity::{EntityKind, EntityStore, SimEntity};
use super::error::{SimError, SimResult};
use super::grid::SimGrid;
use super::map::{self, Placement};
use super::reservations::ReservationTable;
use super::snapshot::{DynamicEntitySnapshot, DynamicKind, StaticEntitySnapshot, StaticKind};
use super::spawner::{self, Spawner};
use super::stats::{MetricsSample, SimStats};
use super::traffic_light::SimTrafficLight;
use super::types::{Cell, EntityId};

/// The main simulation world
pub struct SimWorld {
    grid: SimGrid,

    /// Every entity, static or not, keyed by id
    entities: EntityStore,

    /// Destination ids in creation order, the pool cars draw from
    destinations: Vec<EntityId>,

    reservations: ReservationTable,

    spawner: Spawner,

    stats: SimStats,

    /// One sample per completed tick
    metrics: Vec<MetricsSample>,

    tick: u64,

    /// Cleared the first time a spawn round produces no car
    running: bool,

    /// Next ID to assign
    next_id: usize,

    /// Interval given to lights built from the map
    light_interval: u32,

    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,
}

impl SimWorld {
    fn new_internal(width: i32, height: i32, config: SimConfig) -> SimResult<Self> {
        let grid = SimGrid::new(width, height);

        let spawn_points = config
            .spawn_points
            .unwrap_or_else(|| Spawner::corners(width, height));
        if let Some(cell) = spawn_points.iter().find(|cell| !grid.in_bounds(**cell)) {
            return Err(SimError::OutOfBounds {
                cell: *cell,
                width,
                height,
            });
        }

        Ok(Self {
            grid,
            entities: EntityStore::new(),
            destinations: Vec::new(),
            reservations: ReservationTable::new(),
            spawner: Spawner::new(spawn_points, config.spawn_period),
            stats: SimStats::default(),
            metrics: Vec::new(),
            tick: 0,
            running: true,
            next_id: 0,
            light_interval: config.light_interval,
            rng: config.seed.map(StdRng::seed_from_u64),
        })
    }

    /// Build a world from a `width` x `height` text map
    pub fn initialize<S: AsRef<str>>(
        width: usize,
        height: usize,
        rows: &[S],
        config: SimConfig,
    ) -> SimResult<Self> {
        map::validate(width, height, rows)?;
        let too_large = || SimError::MalformedMap(format!("{}x{} map is too large", width, height));
        let grid_width = i32::try_from(width).map_err(|_| too_large())?;
        let grid_height = i32::try_from(height).map_err(|_| too_large())?;

        let mut world = Self::new_internal(grid_width, grid_height, config)?;
        for (cell, placement) in map::placements(rows) {
            world.build(cell, placement)?;
        }

        info!(
            "Initialized {}x{} world: {} entities, {} destinations, {} spawn points",
            width,
            height,
            world.entities.len(),
            world.destinations.len(),
            world.spawner.spawn_points.len()
        );
        Ok(world)
    }

    /// Build a world from a text map, taking the size from the rows
    pub fn from_map<S: AsRef<str>>(rows: &[S], config: SimConfig) -> SimResult<Self> {
        let (width, height) = map::dimensions(rows);
        Self::initialize(width, height, rows, config)
    }

    /// The built-in city map
    pub fn create_default_world(config: SimConfig) -> SimResult<Self> {
        Self::from_map(map::DEFAULT_MAP, config)
    }

    fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Shuffle a slice, using seeded RNG if available
    fn shuffle<T>(&mut self, slice: &mut [T]) {
        match &mut self.rng {
            Some(rng) => slice.shuffle(rng),
            None => slice.shuffle(&mut rand::rng()),
        }
    }

    /// Choose a random destination, using seeded RNG if available
    fn pick_destination(&mut self) -> SimResult<EntityId> {
        match &mut self.rng {
            Some(rng) => spawner::pick_destination(&self.destinations, rng),
            None => spawner::pick_destination(&self.destinations, &mut rand::rng()),
        }
    }

    fn add_entity(&mut self, position: Cell, kind: EntityKind) -> SimResult<EntityId> {
        let id = self.next_entity_id();
        self.grid.place(id, position)?;
        self.entities.insert(id, SimEntity::new(id, position, kind));
        Ok(id)
    }

    fn build(&mut self, cell: Cell, placement: Placement) -> SimResult<()> {
        match placement {
            Placement::Obstacle => {
                self.add_entity(cell, EntityKind::Obstacle)?;
            }
            Placement::Destination => {
                let id = self.add_entity(cell, EntityKind::Destination)?;
                self.destinations.push(id);
            }
            Placement::Street(direction) => {
                self.add_entity(cell, EntityKind::Street(direction))?;
            }
            Placement::LightedStreet { direction, green } => {
                let light = SimTrafficLight::new(self.light_interval, green, direction);
                self.add_entity(cell, EntityKind::TrafficLight(light))?;
                self.add_entity(cell, EntityKind::Street(direction))?;
            }
        }
        Ok(())
    }

    /// Put a new car on `cell` heading for `destination`
    ///
    /// Returns `Ok(None)` without spawning when the cell is reserved.
    pub fn spawn_car(&mut self, cell: Cell, destination: EntityId) -> SimResult<Option<EntityId>> {
        let car_id = EntityId(self.next_id);
        let spawned = spawner::spawn_car(
            car_id,
            cell,
            destination,
            self.tick,
            &mut self.grid,
            &mut self.entities,
            &mut self.reservations,
        )?;

        if spawned.is_some() {
            self.next_id += 1;
            self.stats.spawned += 1;
            self.stats.active_cars += 1;
        }
        Ok(spawned)
    }

    /// One car attempt per spawn point. Returns how many cars appeared.
    fn spawn_round(&mut self) -> usize {
        let spawn_points = self.spawner.spawn_points.clone();
        let mut spawned = 0;

        for cell in spawn_points {
            if self.reservations.is_reserved(cell) {
                continue;
            }
            let destination = match self.pick_destination() {
                Ok(destination) => destination,
                Err(err) => {
                    debug!("Skipping spawn at {}: {}", cell, err);
                    continue;
                }
            };
            match self.spawn_car(cell, destination) {
                Ok(Some(_)) => spawned += 1,
                Ok(None) => {}
                Err(err) => warn!("Failed to spawn car at {}: {}", cell, err),
            }
        }

        spawned
    }

    /// Remove a car from every structure that knows about it
    fn despawn_car(&mut self, id: EntityId, position: Cell) {
        if let Err(err) = self.grid.remove(id, position) {
            warn!("Car {} was not on the grid at {}: {}", id, position, err);
        }
        self.reservations.release(position, id);
        self.stats.active_cars = self.stats.active_cars.saturating_sub(1);
    }

    /// Run one agent's logic for the current tick
    fn activate(&mut self, id: EntityId) {
        // Take the entity out so it can read the rest of the world while mutating itself
        let Some(mut entity) = self.entities.remove(&id) else {
            return;
        };

        let keep = match &mut entity.kind {
            EntityKind::Car(car) => {
                let result = car.update(
                    id,
                    &mut entity.position,
                    &mut self.grid,
                    &self.entities,
                    &mut self.reservations,
                );
                match result {
                    Ok(CarUpdateResult::Arrived) => {
                        let trip_ticks = self.tick.saturating_sub(car.spawned_at);
                        debug!("Car {} arrived after {} ticks", id, trip_ticks);
                        self.stats.record_arrival(trip_ticks);
                        self.stats.active_cars = self.stats.active_cars.saturating_sub(1);
                        false
                    }
                    Ok(CarUpdateResult::Moved { from, to }) => {
                        debug!("Car {} moved {} -> {}", id, from, to);
                        true
                    }
                    Ok(CarUpdateResult::Blocked { target }) => {
                        debug!("Car {} blocked, {} is reserved", id, target);
                        true
                    }
                    Ok(CarUpdateResult::Stalled) => true,
                    Err(err) => {
                        warn!("Car {} failed to update, despawning: {}", id, err);
                        self.despawn_car(id, entity.position);
                        false
                    }
                }
            }
            EntityKind::TrafficLight(light) => {
                if light.update() {
                    debug!(
                        "Light {} at {} turned {}",
                        id,
                        entity.position,
                        if light.green { "green" } else { "red" }
                    );
                }
                true
            }
            EntityKind::Obstacle | EntityKind::Street(_) | EntityKind::Destination => true,
        };

        if keep {
            self.entities.insert(id, entity);
        }
    }

    /// Cells holding more than one car right now
    fn count_collisions(&self) -> u64 {
        self.grid
            .iter_cells()
            .filter(|(_, occupants)| {
                occupants
                    .iter()
                    .filter(|occupant| self.car(**occupant).is_some())
                    .count()
                    > 1
            })
            .count() as u64
    }

    /// Main simulation tick
    pub fn step(&mut self) {
        self.tick += 1;
        self.stats.ticks = self.tick;

        // Periodic spawning
        if self.spawner.is_spawn_tick(self.tick) {
            let spawned = self.spawn_round();
            if spawned == 0 && self.running {
                info!(
                    "No car could be spawned on tick {}, marking world as saturated",
                    self.tick
                );
                self.running = false;
            }
        }

        // Every car and light exactly once, in a fresh random order
        let mut order: Vec<EntityId> = self
            .entities
            .values()
            .filter(|entity| entity.kind.is_agent())
            .map(|entity| entity.id)
            .collect();
        self.shuffle(&mut order);
        for id in order {
            self.activate(id);
        }

        let collisions = self.count_collisions();
        if collisions > 0 {
            debug!("{} collisions on tick {}", collisions, self.tick);
        }
        self.stats.collisions_total += collisions;
        self.metrics.push(MetricsSample::capture(&self.stats, collisions));
    }

    /// Obstacles, streets and destinations
    pub fn static_entities(&self) -> Vec<StaticEntitySnapshot> {
        self.entities
            .values()
            .filter_map(|entity| {
                let (kind, direction) = match entity.kind {
                    EntityKind::Obstacle => (StaticKind::Obstacle, None),
                    EntityKind::Street(direction) => (StaticKind::Street, Some(direction)),
                    EntityKind::Destination => (StaticKind::Destination, None),
                    EntityKind::TrafficLight(_) | EntityKind::Car(_) => return None,
                };
                Some(StaticEntitySnapshot {
                    id: entity.id,
                    kind,
                    position: entity.position,
                    direction,
                })
            })
            .collect()
    }

    /// Cars and traffic lights
    pub fn dynamic_entities(&self) -> Vec<DynamicEntitySnapshot> {
        self.entities
            .values()
            .filter_map(|entity| match &entity.kind {
                EntityKind::Car(car) => Some(DynamicEntitySnapshot {
                    id: entity.id,
                    kind: DynamicKind::Car,
                    position: entity.position,
                    light_green: None,
                    destination_id: Some(car.destination),
                    recent_positions: Some(car.recent_positions.iter().copied().collect()),
                }),
                EntityKind::TrafficLight(light) => Some(DynamicEntitySnapshot {
                    id: entity.id,
                    kind: DynamicKind::TrafficLight,
                    position: entity.position,
                    light_green: Some(light.green),
                    destination_id: None,
                    recent_positions: None,
                }),
                _ => None,
            })
            .collect()
    }

    pub fn stats(&self) -> SimStats {
        self.stats.clone()
    }

    pub fn metrics(&self) -> &[MetricsSample] {
        &self.metrics
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn grid(&self) -> &SimGrid {
        &self.grid
    }

    pub fn reservations(&self) -> &ReservationTable {
        &self.reservations
    }

    pub fn destinations(&self) -> &[EntityId] {
        &self.destinations
    }

    pub fn entity(&self, id: EntityId) -> Option<&SimEntity> {
        self.entities.get(&id)
    }

    pub fn car(&self, id: EntityId) -> Option<&SimCar> {
        self.entities.get(&id).and_then(SimEntity::as_car)
    }

    pub fn car_mut(&mut self, id: EntityId) -> Option<&mut SimCar> {
        match self.entities.get_mut(&id).map(|entity| &mut entity.kind) {
            Some(EntityKind::Car(car)) => Some(car),
            _ => None,
        }
    }

    pub fn light(&self, id: EntityId) -> Option<&SimTrafficLight> {
        self.entities.get(&id).and_then(SimEntity::as_light)
    }

    /// Ids of every car still on the grid
    pub fn car_ids(&self) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|entity| entity.as_car().is_some())
            .map(|entity| entity.id)
            .collect()
    }

    /// Cars standing on `cell`
    pub fn cars_at(&self, cell: Cell) -> Vec<EntityId> {
        self.grid
            .contents(cell)
            .iter()
            .copied()
            .filter(|id| self.car(*id).is_some())
            .collect()
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        let stats = &self.stats;
        let lights = self
            .entities
            .values()
            .filter_map(SimEntity::as_light)
            .collect::<Vec<_>>();
        let green = lights.iter().filter(|light| light.green).count();

        println!("=== Grid Traffic Summary ===");
        println!(
            "Tick: {} ({})",
            self.tick,
            if self.running { "running" } else { "saturated" }
        );
        println!(
            "Grid: {}x{}, Destinations: {}, Lights: {} ({} green)",
            self.grid.width(),
            self.grid.height(),
            self.destinations.len(),
            lights.len(),
            green
        );
        println!(
            "Cars: {} active, {} spawned, {} arrived",
            stats.active_cars, stats.spawned, stats.arrived
        );
        println!(
            "Collisions: {}, Average trip: {:.1} ticks",
            stats.collisions_total,
            stats.average_trip_ticks()
        );
    }

    /// Draw a visual map of the world in the terminal
    pub fn draw_map(&self) {
        println!("\n=== World Map (tick {}) ===", self.tick);
        println!("Legend: #=Obstacle, D=Destination, ^>v<=Street, G/R=Light, C=Car");
        println!();
        for y in (0..self.grid.height()).rev() {
            let line: String = (0..self.grid.width())
                .map(|x| self.cell_symbol(Cell::new(x, y)))
                .collect();
            println!("{}", line);
        }
        println!();
    }

    fn cell_symbol(&self, cell: Cell) -> char {
        let mut symbol = ' ';
        let mut rank = 0;
        for entity in self
            .grid
            .contents(cell)
            .iter()
            .filter_map(|id| self.entities.get(id))
        {
            // Higher rank draws on top
            let (candidate, candidate_rank) = match &entity.kind {
                EntityKind::Car(_) => ('C', 5),
                EntityKind::TrafficLight(light) => (if light.green { 'G' } else { 'R' }, 4),
                EntityKind::Destination => ('D', 3),
                EntityKind::Street(direction) => (direction.symbol(), 2),
                EntityKind::Obstacle => ('#', 1),
            };
            if candidate_rank > rank {
                symbol = candidate;
                rank = candidate_rank;
            }
        }
        symbol
    }
}
