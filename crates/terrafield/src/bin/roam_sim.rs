//! # TERRAFIELD Roaming Simulation
//!
//! Headless run of the grid: animals wander downhill, cells appear as they
//! are reached, flora is planted, and every tick ends with a neighborhood
//! query per animal.
//!
//! ```bash
//! # Defaults: built-in config, 500 ticks
//! ./roam_sim
//!
//! # Custom grid config and tick count
//! ./roam_sim grid.toml 2000
//!
//! # More detail
//! RUST_LOG=debug ./roam_sim
//!
//! # Cell changes of every entity, nothing else below warn
//! RUST_LOG=warn,terrafield_procedural=trace ./roam_sim
//! ```

use std::time::Instant;

use terrafield::{GridConfig, Simulation, SimulationConfig, TickStats};

/// Ticks run when no count is given.
const DEFAULT_TICKS: u64 = 500;

/// Progress line interval.
const REPORT_EVERY: u64 = 100;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(terrafield::logging::env_filter())
        .init();

    println!("═══════════════════════════════════════════════════════════════════");
    println!("                 TERRAFIELD ROAMING SIMULATION");
    println!("                         HEADLESS MODE");
    println!("═══════════════════════════════════════════════════════════════════");
    println!();

    let mut args = std::env::args().skip(1);

    // === CONFIG ===
    let grid_config = match args.next() {
        Some(path) => match GridConfig::from_toml_file(&path) {
            Ok(config) => {
                println!("  Config:   {path} ✓");
                config
            }
            Err(e) => {
                eprintln!("  ✗ FATAL: Failed to load {path}: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("  Config:   built-in defaults");
            GridConfig::default()
        }
    };

    let ticks = match args.next().map(|raw| raw.parse::<u64>()) {
        None => DEFAULT_TICKS,
        Some(Ok(ticks)) => ticks,
        Some(Err(e)) => {
            eprintln!("  ✗ FATAL: Tick count must be a whole number: {e}");
            std::process::exit(1);
        }
    };

    let sim_config = SimulationConfig::default();
    println!("  Cell:     {} world units", grid_config.cell_size);
    println!("  Roamers:  {}", sim_config.roamers);
    println!("  Ticks:    {ticks}");
    println!();

    // === WORLD ===
    let mut sim = match Simulation::new(grid_config, sim_config) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("  ✗ FATAL: {e}");
            std::process::exit(1);
        }
    };

    // === LOOP ===
    let start = Instant::now();
    let mut totals = TickStats::default();
    let mut slowest_us = 0;

    for tick in 0..ticks {
        let stats = sim.tick();
        totals.cell_changes += stats.cell_changes;
        totals.plants_added += stats.plants_added;
        totals.neighbors_sensed += stats.neighbors_sensed;
        slowest_us = slowest_us.max(stats.elapsed_us);

        if (tick + 1) % REPORT_EVERY == 0 {
            tracing::info!(
                tick = stats.tick,
                cells = stats.cells,
                cell_changes = totals.cell_changes,
                plants = sim.plants().len(),
                "progress"
            );
        }
    }

    let elapsed = start.elapsed();
    let grid_stats = sim.grid().stats();

    println!();
    println!("═══════════════════════════════════════════════════════════════════");
    println!("                            RESULTS");
    println!("═══════════════════════════════════════════════════════════════════");
    println!("  Ticks:             {ticks} in {elapsed:?}");
    println!("  Slowest tick:      {slowest_us} µs");
    println!("  Cells:             {}", grid_stats.cells);
    println!("  Tracked entities:  {}", grid_stats.tracked_entities);
    println!("  Flow vectors:      {}", grid_stats.flow_computed);
    println!("  Noise samples:     {}", grid_stats.noise_samples);
    println!("  Cell changes:      {}", totals.cell_changes);
    println!("  Plants:            {}", sim.plants().len());
    println!("  Neighbors sensed:  {}", totals.neighbors_sensed);
}
