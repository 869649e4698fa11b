use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

use grid_traffic::simulation::{
    DynamicEntitySnapshot, SimConfig, SimStats, SimWorld, StaticEntitySnapshot,
    DEFAULT_LIGHT_INTERVAL, DEFAULT_SPAWN_PERIOD,
};

#[derive(Parser)]
#[command(name = "grid_traffic")]
#[command(about = "Headless grid traffic simulation")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "1000")]
    ticks: u64,

    /// Text map file, one row per line. Defaults to the built-in city map.
    #[arg(long)]
    map: Option<PathBuf>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Ticks between spawn rounds (0 disables spawning)
    #[arg(long, default_value_t = DEFAULT_SPAWN_PERIOD)]
    spawn_period: u64,

    /// Ticks between traffic light toggles
    #[arg(long, default_value_t = DEFAULT_LIGHT_INTERVAL)]
    light_interval: u32,

    /// Log a progress report every N ticks
    #[arg(long, default_value = "100")]
    report_every: u64,

    /// Print the ASCII map with every progress report
    #[arg(long)]
    draw: bool,

    /// Print final stats and entity snapshots as JSON on stdout
    #[arg(long)]
    json: bool,
}

/// Final state dump for `--json`
#[derive(Serialize)]
struct Report {
    stats: SimStats,
    static_entities: Vec<StaticEntitySnapshot>,
    dynamic_entities: Vec<DynamicEntitySnapshot>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,grid_traffic=info"),
    )
    .init();

    let cli = Cli::parse();

    let mut config = SimConfig::default()
        .with_spawn_period(cli.spawn_period)
        .with_light_interval(cli.light_interval);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    let mut world = match &cli.map {
        Some(path) => {
            let rows = load_map(path)?;
            SimWorld::from_map(&rows, config)
                .with_context(|| format!("Failed to build world from {}", path.display()))?
        }
        None => {
            SimWorld::create_default_world(config).context("Failed to build default world")?
        }
    };

    run_headless(&mut world, cli.ticks, cli.report_every, cli.draw);

    if cli.json {
        let report = Report {
            stats: world.stats(),
            static_entities: world.static_entities(),
            dynamic_entities: world.dynamic_entities(),
        };
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    }

    Ok(())
}

/// Read a map file, dropping trailing blank lines
fn load_map(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read map file {}", path.display()))?;
    let mut rows: Vec<String> = text.lines().map(str::to_string).collect();
    while rows.last().is_some_and(|row| row.trim().is_empty()) {
        rows.pop();
    }
    Ok(rows)
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(world: &mut SimWorld, ticks: u64, report_every: u64, draw: bool) {
    info!("Running grid traffic simulation for {} ticks", ticks);
    if draw {
        world.draw_map();
    }

    for _ in 0..ticks {
        world.step();

        if report_every > 0 && world.tick() % report_every == 0 {
            let stats = world.stats();
            info!(
                "Tick {}: {} active, {} spawned, {} arrived, {} collisions",
                stats.ticks, stats.active_cars, stats.spawned, stats.arrived, stats.collisions_total
            );
            if draw {
                world.draw_map();
            }
        }
    }

    let stats = world.stats();
    info!("=== SIMULATION COMPLETE ===");
    info!("Ticks: {}", stats.ticks);
    info!("Total cars spawned: {}", stats.spawned);
    info!("Total cars arrived: {}", stats.arrived);
    info!("Active cars: {}", stats.active_cars);
    info!("Total collisions: {}", stats.collisions_total);
    info!("Average trip ticks: {:.1}", stats.average_trip_ticks());
    info!("Arrival rate: {:.1}%", stats.arrival_rate());
    if !world.running() {
        info!("World saturated: spawn points stayed blocked");
    }
}
