//! # Roaming Simulation
//!
//! A minimal host for the grid, driving it the way a frame loop would:
//!
//! ```text
//! Tick N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. STEER                                                            │
//! │    └─ Each roamer reads the flow vector of its cell + jitter        │
//! │                                                                     │
//! │ 2. MOVE                                                             │
//! │    ├─ Integrate position                                            │
//! │    └─ grid.update_entity (may materialize cells, spawn flora)       │
//! │                                                                     │
//! │ 3. PLANT                                                            │
//! │    └─ Drain the flora queue and index new plants                    │
//! │                                                                     │
//! │ 4. SENSE                                                            │
//! │    └─ Radius query around every roamer                              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The grid calls the flora sink while it is mutably borrowed, so the sink
//! only queues spawns; plants are indexed once the move phase is done.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use terrafield_procedural::{
    CellCoord, EntityId, EntityKind, FloraType, Grid, GridConfig, Occupant, TerrainResult,
};
use terrafield_shared::Vec2;

/// Configuration for the simulation.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Number of roaming animals.
    pub roamers: u32,
    /// Half-width of the square the roamers start in.
    pub spawn_extent: f64,
    /// World units travelled per tick.
    pub speed: f64,
    /// Weight of the random component of the heading.
    pub jitter: f64,
    /// Radius of the per-roamer neighborhood query.
    pub sense_radius: f64,
    /// Seed for start positions and jitter.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            roamers: 200,
            spawn_extent: 500.0,
            speed: 6.0,
            jitter: 0.6,
            sense_radius: 40.0,
            seed: 7,
        }
    }
}

/// Counters for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Tick number.
    pub tick: u64,
    /// Roamers that crossed into another cell.
    pub cell_changes: u32,
    /// Plants indexed this tick.
    pub plants_added: u32,
    /// Total neighbors reported by the sense queries.
    pub neighbors_sensed: u64,
    /// Materialized cells after the tick.
    pub cells: usize,
    /// Tick time in microseconds.
    pub elapsed_us: u64,
}

/// A roaming animal.
#[derive(Clone, Copy, Debug)]
pub struct Roamer {
    id: EntityId,
    position: Vec2,
    cell: Option<CellCoord>,
}

impl Roamer {
    /// World position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }
}

impl Occupant for Roamer {
    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Animal
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn current_cell(&self) -> Option<CellCoord> {
        self.cell
    }

    fn set_current_cell(&mut self, cell: Option<CellCoord>) {
        self.cell = cell;
    }
}

/// A plant placed by a flora spawn. Never moves.
#[derive(Clone, Debug)]
pub struct Plant {
    id: EntityId,
    species: String,
    position: Vec2,
    cell: Option<CellCoord>,
}

impl Plant {
    /// Flora type name.
    #[must_use]
    pub fn species(&self) -> &str {
        &self.species
    }
}

impl Occupant for Plant {
    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Plant
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn current_cell(&self) -> Option<CellCoord> {
        self.cell
    }

    fn set_current_cell(&mut self, cell: Option<CellCoord>) {
        self.cell = cell;
    }
}

type FloraQueue = Arc<Mutex<Vec<(Vec2, String)>>>;

/// Owns a grid plus the entities roaming it.
#[derive(Debug)]
pub struct Simulation {
    grid: Grid,
    config: SimulationConfig,
    roamers: Vec<Roamer>,
    plants: Vec<Plant>,
    pending_flora: FloraQueue,
    rng: ChaCha8Rng,
    next_id: u64,
    tick: u64,
}

impl Simulation {
    /// Builds a grid from `grid_config` and scatters the roamers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the grid configuration is rejected.
    pub fn new(grid_config: GridConfig, config: SimulationConfig) -> TerrainResult<Self> {
        let pending_flora: FloraQueue = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&pending_flora);
        let grid = Grid::new(grid_config)?.with_flora_sink(
            move |x: f64, y: f64, flora: &FloraType| {
                sink.lock().push((Vec2::new(x, y), flora.name().to_owned()));
            },
        );

        let mut sim = Self {
            grid,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            roamers: Vec::new(),
            plants: Vec::new(),
            pending_flora,
            next_id: 0,
            tick: 0,
        };

        let extent = sim.config.spawn_extent;
        for _ in 0..sim.config.roamers {
            let position = Vec2::new(
                sim.rng.gen_range(-extent..=extent),
                sim.rng.gen_range(-extent..=extent),
            );
            let mut roamer = Roamer {
                id: sim.allocate_id(),
                position,
                cell: None,
            };
            sim.grid.add_entity(&mut roamer);
            sim.roamers.push(roamer);
        }
        sim.plant_pending();

        tracing::info!(
            roamers = sim.roamers.len(),
            plants = sim.plants.len(),
            cells = sim.grid.cell_count(),
            "simulation ready"
        );
        Ok(sim)
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// The grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Roaming animals.
    #[must_use]
    pub fn roamers(&self) -> &[Roamer] {
        &self.roamers
    }

    /// Plants placed so far.
    #[must_use]
    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    /// Advances one tick.
    pub fn tick(&mut self) -> TickStats {
        let start = Instant::now();
        let mut stats = TickStats {
            tick: self.tick,
            ..TickStats::default()
        };

        let mut roamers = std::mem::take(&mut self.roamers);
        for roamer in &mut roamers {
            let before = roamer.cell;
            let heading = self.steer(roamer);
            roamer.position += heading * self.config.speed;
            let after = self.grid.update_entity(roamer);
            if before != Some(after) {
                stats.cell_changes += 1;
            }
        }
        self.roamers = roamers;

        stats.plants_added = self.plant_pending();

        for roamer in &self.roamers {
            let found = self.grid.entities_in_radius(
                roamer.position.x,
                roamer.position.y,
                self.config.sense_radius,
            );
            // The roamer itself is always in range
            stats.neighbors_sensed += found.len().saturating_sub(1) as u64;
        }

        stats.cells = self.grid.cell_count();
        stats.elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.tick += 1;

        tracing::debug!(
            tick = stats.tick,
            cell_changes = stats.cell_changes,
            plants_added = stats.plants_added,
            cells = stats.cells,
            "tick complete"
        );
        stats
    }

    /// Heading for the next step: downhill plus jitter, turned back inland
    /// when standing in water.
    fn steer(&mut self, roamer: &Roamer) -> Vec2 {
        let coord = self.grid.world_to_cell(roamer.position.x, roamer.position.y);
        let flow = self.grid.flow_direction(coord);
        let angle = self.rng.gen_range(0.0..std::f64::consts::TAU);
        let heading = (flow + Vec2::from_angle(angle) * self.config.jitter).normalize_or_zero();

        let in_water = self
            .grid
            .existing_cell(coord)
            .is_some_and(|cell| cell.terrain().water);
        if in_water {
            -heading
        } else {
            heading
        }
    }

    /// Indexes every queued flora spawn. Returns how many were added.
    fn plant_pending(&mut self) -> u32 {
        let pending = std::mem::take(&mut *self.pending_flora.lock());
        let mut added = 0;
        for (position, species) in pending {
            let mut plant = Plant {
                id: self.allocate_id(),
                species,
                position,
                cell: None,
            };
            self.grid.add_entity(&mut plant);
            self.plants.push(plant);
            added += 1;
        }
        added
    }
}
