//! World behavior tests
//!
//! These drive the simulation through its public API on small hand-made maps
//! so every car decision can be predicted.

use grid_traffic::simulation::{
    Cell, Direction, DynamicKind, EntityId, SimCar, SimConfig, SimError, SimGrid,
    SimTrafficLight, SimWorld, StaticKind, DEFAULT_MAP,
};

/// Seeded config with spawning switched off, for scripted scenarios
fn scripted(seed: u64) -> SimConfig {
    SimConfig::default().with_seed(seed).with_spawn_period(0)
}

fn position(world: &SimWorld, id: EntityId) -> Cell {
    world.entity(id).expect("entity should exist").position
}

/// Place a car on `cell` heading for the only destination on the map
fn spawn_single(world: &mut SimWorld, cell: Cell) -> EntityId {
    let destination = world.destinations()[0];
    world
        .spawn_car(cell, destination)
        .expect("spawn should succeed")
        .expect("cell should be free")
}

#[test]
fn test_car_reaches_adjacent_destination_then_leaves() {
    let mut world = SimWorld::from_map(&[">D "], scripted(1)).unwrap();
    let car = spawn_single(&mut world, Cell::new(0, 0));

    world.step();
    assert_eq!(position(&world, car), Cell::new(1, 0));
    assert_eq!(world.stats().arrived, 0);
    assert_eq!(world.reservations().holder(Cell::new(1, 0)), Some(car));

    world.step();
    assert!(world.entity(car).is_none());
    assert!(world.cars_at(Cell::new(1, 0)).is_empty());
    assert!(world.reservations().is_empty());

    let stats = world.stats();
    assert_eq!(stats.arrived, 1);
    assert_eq!(stats.active_cars, 0);
    assert_eq!(stats.total_trip_ticks, 2);
    assert_eq!(stats.average_trip_ticks(), 2.0);
    assert_eq!(world.metrics().last().unwrap().collisions, 0);
}

#[test]
fn test_contested_cell_goes_to_first_claimant() {
    let rows = ["#####", "#####", "#>D##", "##^##", "#####"];
    let target = Cell::new(2, 2);

    for seed in 0..8 {
        let mut world = SimWorld::from_map(&rows, scripted(seed)).unwrap();
        let west = spawn_single(&mut world, Cell::new(1, 2));
        let south = spawn_single(&mut world, Cell::new(2, 1));

        world.step();

        let winners = world.cars_at(target);
        assert_eq!(winners.len(), 1, "seed {}", seed);
        let (winner, loser, loser_start) = if winners[0] == west {
            (west, south, Cell::new(2, 1))
        } else {
            (south, west, Cell::new(1, 2))
        };
        assert_eq!(world.reservations().holder(target), Some(winner));
        assert_eq!(position(&world, loser), loser_start);
        assert_eq!(world.reservations().holder(loser_start), Some(loser));
        assert_eq!(world.stats().collisions_total, 0);

        for _ in 0..3 {
            world.step();
        }
        assert_eq!(world.stats().arrived, 2, "seed {}", seed);
        assert!(world.car_ids().is_empty());
    }
}

#[test]
fn test_recently_visited_cell_used_when_nothing_else_is_legal() {
    let mut world = SimWorld::from_map(&[">>>D"], scripted(2)).unwrap();
    let car = spawn_single(&mut world, Cell::new(0, 0));
    world
        .car_mut(car)
        .unwrap()
        .recent_positions
        .push_back(Cell::new(1, 0));

    world.step();

    assert_eq!(position(&world, car), Cell::new(1, 0));
}

#[test]
fn test_car_without_legal_move_stays_put() {
    let mut world = SimWorld::from_map(&["D#>#"], scripted(3)).unwrap();
    let car = spawn_single(&mut world, Cell::new(2, 0));

    for _ in 0..5 {
        world.step();
    }

    assert_eq!(position(&world, car), Cell::new(2, 0));
    assert_eq!(world.stats().active_cars, 1);
    assert_eq!(world.reservations().holder(Cell::new(2, 0)), Some(car));
}

#[test]
fn test_street_direction_is_respected() {
    // Entering a west-bound street while heading east
    let mut world = SimWorld::from_map(&["<<D"], scripted(4)).unwrap();
    let car = spawn_single(&mut world, Cell::new(0, 0));
    world.step();
    assert_eq!(position(&world, car), Cell::new(0, 0));

    // Leaving a west-bound street eastward, even onto an east-bound one
    let mut world = SimWorld::from_map(&["<>D"], scripted(4)).unwrap();
    let car = spawn_single(&mut world, Cell::new(0, 0));
    world.step();
    assert_eq!(position(&world, car), Cell::new(0, 0));

    let mut world = SimWorld::from_map(&[">>D"], scripted(4)).unwrap();
    let car = spawn_single(&mut world, Cell::new(0, 0));
    world.step();
    assert_eq!(position(&world, car), Cell::new(1, 0));
}

#[test]
fn test_legality_rule() {
    assert!(SimCar::is_legal_move(Direction::East, Direction::East, None));
    assert!(SimCar::is_legal_move(Direction::East, Direction::North, Some(Direction::South)));
    assert!(!SimCar::is_legal_move(Direction::East, Direction::West, None));
    assert!(!SimCar::is_legal_move(Direction::East, Direction::East, Some(Direction::West)));
    assert!(!SimCar::is_legal_move(Direction::North, Direction::South, None));
    assert!(!SimCar::is_legal_move(Direction::South, Direction::North, None));
    assert!(!SimCar::is_legal_move(Direction::West, Direction::West, Some(Direction::East)));
}

#[test]
fn test_destination_wins_over_street_direction() {
    let mut world = SimWorld::from_map(&["<D"], scripted(5)).unwrap();
    let car = spawn_single(&mut world, Cell::new(0, 0));

    world.step();

    assert_eq!(position(&world, car), Cell::new(1, 0));
}

#[test]
fn test_closest_candidate_chosen_with_survey_order_tie_break() {
    // North and east are equally close to the destination; north is surveyed first
    let rows = [" >D", "<^^", "   "];
    let mut world = SimWorld::from_map(&rows, scripted(6)).unwrap();
    let car = spawn_single(&mut world, Cell::new(1, 1));
    world.step();
    assert_eq!(position(&world, car), Cell::new(1, 2));

    // With north blocked, east beats the farther west street
    let rows = [" #D", "<^^", "   "];
    let mut world = SimWorld::from_map(&rows, scripted(6)).unwrap();
    let car = spawn_single(&mut world, Cell::new(1, 1));
    world.step();
    assert_eq!(position(&world, car), Cell::new(2, 1));
}

#[test]
fn test_red_light_holds_car_until_green() {
    let mut world = SimWorld::from_map(&[">d>D"], scripted(7)).unwrap();
    let car = spawn_single(&mut world, Cell::new(0, 0));

    for _ in 0..4 {
        world.step();
        assert_eq!(position(&world, car), Cell::new(0, 0));
    }

    for _ in 0..6 {
        world.step();
    }
    assert!(world.entity(car).is_none());
    assert_eq!(world.stats().arrived, 1);
}

#[test]
fn test_light_period_is_twice_the_interval() {
    let mut light = SimTrafficLight::new(3, true, Direction::North);
    for activation in 1..=12u32 {
        let toggled = light.update();
        assert_eq!(toggled, activation % 3 == 0);
        assert_eq!(light.green, (activation / 3) % 2 == 0, "activation {}", activation);
    }
}

#[test]
fn test_map_lights_start_in_configured_phase() {
    let config = scripted(8).with_light_interval(2);
    let mut world = SimWorld::from_map(&["AiBd"], config).unwrap();

    let phases = |world: &SimWorld| {
        world
            .dynamic_entities()
            .into_iter()
            .filter(|snapshot| snapshot.kind == DynamicKind::TrafficLight)
            .map(|snapshot| snapshot.light_green.unwrap())
            .collect::<Vec<_>>()
    };

    assert_eq!(phases(&world), vec![true, false, true, false]);
    world.step();
    assert_eq!(phases(&world), vec![true, false, true, false]);
    world.step();
    assert_eq!(phases(&world), vec![false, true, false, true]);

    // Every light shares its cell with a street of the same direction
    let lights: Vec<_> = world
        .dynamic_entities()
        .into_iter()
        .filter(|snapshot| snapshot.kind == DynamicKind::TrafficLight)
        .collect();
    for snapshot in lights {
        let light = world.light(snapshot.id).unwrap();
        let street = world
            .static_entities()
            .into_iter()
            .find(|entity| entity.position == snapshot.position)
            .unwrap();
        assert_eq!(street.kind, StaticKind::Street);
        assert_eq!(street.direction, Some(light.direction));
    }
}

#[test]
fn test_static_entities_reproduce_the_map() {
    let rows = ["#>>vD", "^ #v ", "^<<<D"];
    let world = SimWorld::from_map(&rows, scripted(9)).unwrap();

    let mut rebuilt = vec![vec![' '; 5]; 3];
    for entity in world.static_entities() {
        let symbol = match entity.kind {
            StaticKind::Obstacle => '#',
            StaticKind::Destination => 'D',
            StaticKind::Street => entity.direction.unwrap().symbol(),
        };
        let row = (2 - entity.position.y) as usize;
        rebuilt[row][entity.position.x as usize] = symbol;
    }

    let rebuilt: Vec<String> = rebuilt.into_iter().map(|row| row.into_iter().collect()).collect();
    assert_eq!(rebuilt, rows);
}

#[test]
fn test_malformed_maps_are_rejected() {
    assert!(matches!(
        SimWorld::from_map(&["##", "#"], SimConfig::default()),
        Err(SimError::MalformedMap(_))
    ));
    assert!(matches!(
        SimWorld::initialize(3, 2, &["##", "##"], SimConfig::default()),
        Err(SimError::MalformedMap(_))
    ));
    assert!(matches!(
        SimWorld::initialize(2, 3, &["##", "##"], SimConfig::default()),
        Err(SimError::MalformedMap(_))
    ));
    let empty: [&str; 0] = [];
    assert!(matches!(
        SimWorld::from_map(&empty, SimConfig::default()),
        Err(SimError::MalformedMap(_))
    ));
}

#[test]
fn test_out_of_bounds_is_rejected() {
    let mut grid = SimGrid::new(2, 2);
    assert!(grid.place(EntityId(0), Cell::new(1, 1)).is_ok());
    assert!(matches!(
        grid.place(EntityId(1), Cell::new(2, 0)),
        Err(SimError::OutOfBounds { .. })
    ));
    assert!(matches!(
        grid.move_entity(EntityId(0), Cell::new(1, 1), Cell::new(1, -1)),
        Err(SimError::OutOfBounds { .. })
    ));
    assert_eq!(grid.contents(Cell::new(1, 1)), &[EntityId(0)]);

    let mut world = SimWorld::from_map(&[">D"], scripted(10)).unwrap();
    let destination = world.destinations()[0];
    assert!(matches!(
        world.spawn_car(Cell::new(5, 0), destination),
        Err(SimError::OutOfBounds { .. })
    ));

    let config = scripted(10).with_spawn_points(vec![Cell::new(0, 3)]);
    assert!(matches!(
        SimWorld::from_map(&[">D"], config),
        Err(SimError::OutOfBounds { .. })
    ));
}

#[test]
fn test_grid_neighbors_do_not_wrap() {
    let grid = SimGrid::new(3, 2);
    assert_eq!(
        grid.neighbors4(Cell::new(0, 0)),
        vec![Cell::new(0, 1), Cell::new(1, 0)]
    );
    assert_eq!(
        grid.neighbors4(Cell::new(1, 1)),
        vec![Cell::new(2, 1), Cell::new(1, 0), Cell::new(0, 1)]
    );
}

#[test]
fn test_spawn_on_reserved_cell_is_skipped() {
    let mut world = SimWorld::from_map(&["D#>#"], scripted(11)).unwrap();
    let first = spawn_single(&mut world, Cell::new(2, 0));
    let destination = world.destinations()[0];

    assert_eq!(world.spawn_car(Cell::new(2, 0), destination), Ok(None));
    assert_eq!(world.reservations().holder(Cell::new(2, 0)), Some(first));
    assert_eq!(world.stats().spawned, 1);

    // A car's destination must be a destination entity
    assert!(matches!(
        world.spawn_car(Cell::new(1, 0), first),
        Err(SimError::EntityNotFound(_))
    ));
}

#[test]
fn test_world_without_destinations_never_spawns() {
    let config = SimConfig::default().with_seed(12).with_spawn_period(1);
    let mut world = SimWorld::from_map(&[">>>", "^#v", "^<<"], config).unwrap();
    assert!(world.running());

    for _ in 0..3 {
        world.step();
    }

    assert!(!world.running());
    assert_eq!(world.stats().spawned, 0);
    assert_eq!(world.tick(), 3);
}

#[test]
fn test_spawn_rounds_use_the_four_corners() {
    let mut world = SimWorld::create_default_world(SimConfig::default().with_seed(13)).unwrap();

    for _ in 0..9 {
        world.step();
    }
    assert_eq!(world.stats().spawned, 0);

    world.step();
    let stats = world.stats();
    assert_eq!(stats.spawned, 4);
    assert_eq!(stats.active_cars, 4);
    assert!(world.running());

    for id in world.car_ids() {
        let car = world.car(id).unwrap();
        assert!(world.destinations().contains(&car.destination));
        assert_eq!(car.spawned_at, 10);
    }
}

#[test]
fn test_recent_positions_keep_only_the_last_three() {
    let mut world = SimWorld::from_map(&[">>>>>>>D"], scripted(14)).unwrap();
    let car = spawn_single(&mut world, Cell::new(0, 0));

    for _ in 0..5 {
        world.step();
    }

    assert_eq!(position(&world, car), Cell::new(5, 0));
    let car = world.car(car).unwrap();
    assert_eq!(car.last_position, Some(Cell::new(4, 0)));
    assert_eq!(
        car.recent_positions.iter().copied().collect::<Vec<_>>(),
        vec![Cell::new(2, 0), Cell::new(3, 0), Cell::new(4, 0)]
    );
}

#[test]
fn test_reservations_track_every_car_over_a_long_run() {
    let config = SimConfig::default().with_seed(15).with_spawn_period(2);
    let mut world = SimWorld::create_default_world(config).unwrap();

    for _ in 0..400 {
        world.step();

        let cars = world.car_ids();
        assert_eq!(world.reservations().len(), cars.len());
        assert_eq!(world.stats().active_cars, cars.len());
        for id in cars {
            let cell = position(&world, id);
            assert_eq!(world.reservations().holder(cell), Some(id));
            assert_eq!(world.cars_at(cell), vec![id]);
        }
        assert_eq!(world.metrics().last().unwrap().collisions, 0);
    }

    let stats = world.stats();
    assert!(stats.spawned > 0);
    assert_eq!(stats.collisions_total, 0);
    assert_eq!(stats.spawned, stats.arrived + stats.active_cars as u64);
}

#[test]
fn test_metrics_history_has_one_sample_per_tick() {
    let mut world = SimWorld::create_default_world(SimConfig::default().with_seed(16)).unwrap();

    for _ in 0..25 {
        world.step();
    }

    let metrics = world.metrics();
    assert_eq!(metrics.len(), 25);
    for (index, sample) in metrics.iter().enumerate() {
        assert_eq!(sample.tick, index as u64 + 1);
    }
    let last = metrics.last().unwrap();
    let stats = world.stats();
    assert_eq!(last.spawned, stats.spawned);
    assert_eq!(last.arrived, stats.arrived);
    assert_eq!(last.active_cars, stats.active_cars);
}

#[test]
fn test_seeded_worlds_are_reproducible() {
    let run = || {
        let config = SimConfig::default().with_seed(42).with_spawn_period(3);
        let mut world = SimWorld::from_map(DEFAULT_MAP, config).unwrap();
        for _ in 0..300 {
            world.step();
        }
        (world.stats(), world.dynamic_entities())
    };

    assert_eq!(run(), run());
}

#[test]
fn test_snapshots_describe_cars() {
    let mut world = SimWorld::from_map(&[">>>D"], scripted(17)).unwrap();
    let car = spawn_single(&mut world, Cell::new(0, 0));
    world.step();

    let snapshot = world
        .dynamic_entities()
        .into_iter()
        .find(|snapshot| snapshot.id == car)
        .unwrap();
    assert_eq!(snapshot.kind, DynamicKind::Car);
    assert_eq!(snapshot.position, Cell::new(1, 0));
    assert_eq!(snapshot.destination_id, Some(world.destinations()[0]));
    assert_eq!(snapshot.recent_positions, Some(vec![Cell::new(0, 0)]));
    assert_eq!(snapshot.light_green, None);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["pos"]["x"], 1);
    assert!(json.get("green").is_none());
}
