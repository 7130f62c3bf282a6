//! # World Grid
//!
//! Owns the sparse map from cell coordinates to cells and everything
//! needed to create them on demand: the cell size, the three terrain noise
//! fields, and the flora catalog.
//!
//! ## Invariants
//!
//! - Asking for the same coordinate twice returns the same stored cell.
//! - Terrain is a pure function of coordinates and seeds; two grids with
//!   the same configuration produce value-identical cells.
//! - A tracked entity is a member of exactly one cell, the one containing
//!   its position as of the last `add_entity`/`update_entity`.
//! - Proximity queries only visit existing cells and never create any.
//!
//! ## Neighbor Cache Consistency
//!
//! A cell's neighbor list for a given radius is captured the first time it
//! is requested and reused afterwards, even if more neighboring cells are
//! materialized later. Flow vectors computed from it are eventually
//! consistent: call [`Grid::refresh_neighbors`] and then
//! [`Grid::recalculate_flow_direction`] to pick up new neighbors.
//!
//! ## Threading
//!
//! All mutation goes through `&mut self`. Hosts that share a grid across
//! threads wrap it in one lock with [`Grid::into_shared`].

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use terrafield_shared::Vec2;

use crate::cell::{Cell, CellCoord, CellKey, TerrainNoise};
use crate::config::{FloraConfig, GridConfig};
use crate::entity::{Occupancy, Occupant};
use crate::error::TerrainResult;
use crate::flora::{FloraCatalog, FloraSink};
use crate::noise::FieldSeed;
use crate::terrain::TerrainAttribute;

/// A grid behind the single lock boundary used by multi-threaded hosts.
pub type SharedGrid = Arc<Mutex<Grid>>;

/// Snapshot of grid bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridStats {
    /// Materialized cells.
    pub cells: usize,
    /// Entities currently indexed.
    pub tracked_entities: usize,
    /// Cells whose flow vector has been computed.
    pub flow_computed: usize,
    /// Distinct points memoized across the three noise fields.
    pub noise_samples: usize,
}

/// Infinite, lazily materialized terrain grid with an entity index.
pub struct Grid {
    /// Validated construction parameters.
    config: GridConfig,
    /// Noise fields shared by every cell this grid creates.
    noise: TerrainNoise,
    /// Materialized cells.
    cells: HashMap<CellKey, Cell>,
    /// Flora types rolled when a cell is created.
    flora: FloraCatalog,
    /// Receiver of flora spawns. Rolls are skipped without one.
    flora_sink: Option<Box<dyn FloraSink>>,
}

impl Grid {
    /// Chebyshev radius aggregated by the flow field.
    pub const FLOW_RADIUS: u32 = 3;

    /// Creates an empty grid.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration fails validation.
    pub fn new(config: GridConfig) -> TerrainResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: GridConfig) -> Self {
        Self {
            noise: TerrainNoise::new(&config),
            config,
            cells: HashMap::new(),
            flora: FloraCatalog::default(),
            flora_sink: None,
        }
    }

    /// Replaces the flora catalog.
    #[must_use]
    pub fn with_flora_catalog(mut self, catalog: FloraCatalog) -> Self {
        self.flora = catalog;
        self
    }

    /// Installs the receiver of flora spawns.
    #[must_use]
    pub fn with_flora_sink(mut self, sink: impl FloraSink + 'static) -> Self {
        self.flora_sink = Some(Box::new(sink));
        self
    }

    /// Moves the grid behind a lock for sharing across threads.
    #[must_use]
    pub fn into_shared(self) -> SharedGrid {
        Arc::new(Mutex::new(self))
    }

    /// Map key of cell `(x, y)`.
    #[inline]
    #[must_use]
    pub const fn cell_key_of(x: i32, y: i32) -> CellKey {
        CellCoord::new(x, y).key()
    }

    /// Cell containing world position `(x, y)`.
    #[inline]
    #[must_use]
    pub fn world_to_cell(&self, x: f64, y: f64) -> CellCoord {
        CellCoord::from_world_pos(x, y, self.config.cell_size)
    }

    /// Returns cell `(x, y)`, creating it on first access.
    pub fn cell(&mut self, x: i32, y: i32) -> &Cell {
        self.ensure_cell(CellCoord::new(x, y))
    }

    /// Returns the cell containing world position `(x, y)`, creating it on
    /// first access.
    pub fn cell_at_world_pos(&mut self, x: f64, y: f64) -> &Cell {
        let coord = self.world_to_cell(x, y);
        self.ensure_cell(coord)
    }

    /// Returns the cell at `coord` only if it already exists.
    #[must_use]
    pub fn existing_cell(&self, coord: CellCoord) -> Option<&Cell> {
        self.cells.get(&coord.key())
    }

    /// Whether the cell at `coord` has been materialized.
    #[must_use]
    pub fn contains_cell(&self, coord: CellCoord) -> bool {
        self.cells.contains_key(&coord.key())
    }

    /// Number of materialized cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Iterates materialized cells in no particular order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.values()
    }

    /// Number of indexed entities.
    #[must_use]
    pub fn tracked_entity_count(&self) -> usize {
        self.cells.values().map(Cell::entity_count).sum()
    }

    /// Bookkeeping snapshot.
    #[must_use]
    pub fn stats(&self) -> GridStats {
        GridStats {
            cells: self.cells.len(),
            tracked_entities: self.tracked_entity_count(),
            flow_computed: self.cells.values().filter(|c| c.flow_computed()).count(),
            noise_samples: TerrainAttribute::ALL
                .into_iter()
                .map(|attr| self.noise.field(attr).sample_cache_len())
                .sum(),
        }
    }

    /// Drops every cell and its membership.
    ///
    /// Entities are not touched; their back-references go stale and are
    /// repaired by the next `update_entity`.
    pub fn clear(&mut self) {
        tracing::info!(cells = self.cells.len(), "clearing grid");
        self.cells.clear();
    }

    /// Lazy-create path shared by every mutating lookup.
    fn ensure_cell(&mut self, coord: CellCoord) -> &mut Cell {
        match self.cells.entry(coord.key()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let cell = Cell::generate(coord, self.config.cell_size, &mut self.noise);
                tracing::debug!(
                    x = coord.x,
                    y = coord.y,
                    height = cell.height(),
                    "materialized cell"
                );
                if let Some(sink) = self.flora_sink.as_deref_mut() {
                    let cell_size = self.config.cell_size;
                    spawn_flora(&self.flora, &self.config.flora, cell_size, &cell, sink);
                }
                entry.insert(cell)
            }
        }
    }

    // =========================================================================
    // Spatial index maintenance
    // =========================================================================

    /// Starts tracking `entity` in the cell containing its position.
    ///
    /// An entity that is already tracked is updated instead. Returns the
    /// cell it now belongs to.
    pub fn add_entity<E: Occupant + ?Sized>(&mut self, entity: &mut E) -> CellCoord {
        if entity.current_cell().is_some() {
            return self.update_entity(entity);
        }

        let occupancy = entity.occupancy();
        let coord = self.world_to_cell(occupancy.position.x, occupancy.position.y);
        self.ensure_cell(coord).add_entity(occupancy);
        entity.set_current_cell(Some(coord));
        coord
    }

    /// Stops tracking `entity`. Returns whether a membership was removed.
    pub fn remove_entity<E: Occupant + ?Sized>(&mut self, entity: &mut E) -> bool {
        let Some(coord) = entity.current_cell() else {
            return false;
        };

        let removed = self
            .cells
            .get_mut(&coord.key())
            .and_then(|cell| cell.remove_entity(entity.entity_id()))
            .is_some();
        entity.set_current_cell(None);
        removed
    }

    /// Re-indexes `entity` after it moved.
    ///
    /// Staying inside the same cell changes no membership; only the
    /// recorded position is refreshed. Crossing into another cell moves the
    /// membership and the back-reference, creating either cell if needed.
    /// Untracked entities are added. Returns the entity's cell.
    pub fn update_entity<E: Occupant + ?Sized>(&mut self, entity: &mut E) -> CellCoord {
        let Some(old) = entity.current_cell() else {
            return self.add_entity(entity);
        };

        let occupancy = entity.occupancy();
        let new = self.world_to_cell(occupancy.position.x, occupancy.position.y);
        if new == old {
            self.ensure_cell(old).add_entity(occupancy);
            return old;
        }

        self.ensure_cell(old).remove_entity(occupancy.id);
        self.ensure_cell(new).add_entity(occupancy);
        entity.set_current_cell(Some(new));
        tracing::trace!(
            entity = occupancy.id.value(),
            from_x = old.x,
            from_y = old.y,
            to_x = new.x,
            to_y = new.y,
            "entity changed cell"
        );
        new
    }

    // =========================================================================
    // Proximity queries
    // =========================================================================

    /// Entities within Euclidean distance `radius` of `(cx, cy)`, inclusive.
    ///
    /// Negative or NaN radii match nothing.
    #[must_use]
    pub fn entities_in_radius(&self, cx: f64, cy: f64, radius: f64) -> Vec<Occupancy> {
        if !(radius >= 0.0) {
            return Vec::new();
        }

        let min = self.world_to_cell(cx - radius, cy - radius);
        let max = self.world_to_cell(cx + radius, cy + radius);
        let center = Vec2::new(cx, cy);
        let radius_sq = radius * radius;

        self.cells_in_range(min, max)
            .into_iter()
            .flat_map(Cell::entities)
            .filter(|occupancy| occupancy.position.distance_squared(center) <= radius_sq)
            .copied()
            .collect()
    }

    /// Entities inside the closed rectangle `[x, x + width] × [y, y + height]`.
    ///
    /// Negative or NaN extents match nothing.
    #[must_use]
    pub fn entities_in_area(&self, x: f64, y: f64, width: f64, height: f64) -> Vec<Occupancy> {
        if !(width >= 0.0 && height >= 0.0) {
            return Vec::new();
        }

        let min = self.world_to_cell(x, y);
        let max = self.world_to_cell(x + width, y + height);
        let x_range = x..=x + width;
        let y_range = y..=y + height;

        self.cells_in_range(min, max)
            .into_iter()
            .flat_map(Cell::entities)
            .filter(|occupancy| {
                x_range.contains(&occupancy.position.x) && y_range.contains(&occupancy.position.y)
            })
            .copied()
            .collect()
    }

    /// Existing cells with coordinates in `[min, max]` on both axes.
    ///
    /// Walks the coordinate range when it is smaller than the map, and the
    /// map otherwise.
    fn cells_in_range(&self, min: CellCoord, max: CellCoord) -> Vec<&Cell> {
        let width = i64::from(max.x) - i64::from(min.x) + 1;
        let height = i64::from(max.y) - i64::from(min.y) + 1;
        if width <= 0 || height <= 0 {
            return Vec::new();
        }

        let span = width.saturating_mul(height);
        let populated = i64::try_from(self.cells.len()).unwrap_or(i64::MAX);
        if span <= populated {
            (min.x..=max.x)
                .flat_map(|x| (min.y..=max.y).map(move |y| CellCoord::new(x, y)))
                .filter_map(|coord| self.cells.get(&coord.key()))
                .collect()
        } else {
            self.cells
                .values()
                .filter(|cell| {
                    let c = cell.coord();
                    (min.x..=max.x).contains(&c.x) && (min.y..=max.y).contains(&c.y)
                })
                .collect()
        }
    }

    // =========================================================================
    // Neighborhoods and flow
    // =========================================================================

    /// Existing cells within Chebyshev `radius` of `coord`, excluding
    /// `coord` itself, ordered by x offset then y offset.
    ///
    /// Creates the cell at `coord` if needed, but never its neighbors. The
    /// result is cached per radius on first call; see the module docs for
    /// the consistency rules.
    pub fn neighbors_in_radius(&mut self, coord: CellCoord, radius: u32) -> Vec<CellCoord> {
        if let Some(cached) = self.ensure_cell(coord).cached_neighbors(radius) {
            return cached.to_vec();
        }

        let neighbors = self.existing_neighbors(coord, radius);
        self.ensure_cell(coord).cache_neighbors(radius, neighbors.clone());
        neighbors
    }

    /// Drops the cached neighbor lists of the cell at `coord`, if it exists.
    pub fn refresh_neighbors(&mut self, coord: CellCoord) {
        if let Some(cell) = self.cells.get_mut(&coord.key()) {
            cell.clear_neighbor_cache();
        }
    }

    fn existing_neighbors(&self, coord: CellCoord, radius: u32) -> Vec<CellCoord> {
        let r = i64::from(radius);
        let side = 2 * r + 1;
        let span = side.saturating_mul(side);
        let populated = i64::try_from(self.cells.len()).unwrap_or(i64::MAX);

        if span <= populated {
            let mut neighbors = Vec::new();
            for dx in -r..=r {
                for dy in -r..=r {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let (Ok(dx), Ok(dy)) = (i32::try_from(dx), i32::try_from(dy)) else {
                        continue;
                    };
                    if let Some(neighbor) = coord.offset(dx, dy) {
                        if self.contains_cell(neighbor) {
                            neighbors.push(neighbor);
                        }
                    }
                }
            }
            neighbors
        } else {
            let mut neighbors: Vec<CellCoord> = self
                .cells
                .values()
                .map(Cell::coord)
                .filter(|&c| {
                    let dx = (i64::from(c.x) - i64::from(coord.x)).abs();
                    let dy = (i64::from(c.y) - i64::from(coord.y)).abs();
                    c != coord && dx <= r && dy <= r
                })
                .collect();
            // CellCoord orders by x then y, which matches the offset order.
            neighbors.sort_unstable();
            neighbors
        }
    }

    /// Downhill direction of the cell at `coord`: a unit vector, or zero on
    /// flat ground or without materialized neighbors.
    ///
    /// Computed once and cached.
    pub fn flow_direction(&mut self, coord: CellCoord) -> Vec2 {
        if let Some(flow) = self.ensure_cell(coord).cached_flow() {
            return flow;
        }
        self.recalculate_flow_direction(coord)
    }

    /// Recomputes and caches the flow vector of the cell at `coord`.
    ///
    /// Each existing neighbor within [`Grid::FLOW_RADIUS`] pulls along the
    /// unit direction towards it, weighted by how much lower it is; higher
    /// neighbors push the other way. The sum is normalized.
    pub fn recalculate_flow_direction(&mut self, coord: CellCoord) -> Vec2 {
        let neighbors = self.neighbors_in_radius(coord, Self::FLOW_RADIUS);
        let height = self.ensure_cell(coord).height();

        let mut sum = Vec2::ZERO;
        for neighbor in neighbors {
            let Some(cell) = self.cells.get(&neighbor.key()) else {
                continue;
            };
            let direction = Vec2::new(
                f64::from(neighbor.x) - f64::from(coord.x),
                f64::from(neighbor.y) - f64::from(coord.y),
            )
            .normalize_or_zero();
            sum += direction * (height - cell.height());
        }

        let flow = sum.normalize_or_zero();
        self.ensure_cell(coord).set_flow(flow);
        flow
    }

    #[cfg(test)]
    pub(crate) fn insert_terrain(&mut self, coord: CellCoord, terrain: crate::terrain::Terrain) {
        let cell = Cell::from_terrain(coord, self.config.cell_size, terrain);
        self.cells.insert(coord.key(), cell);
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::build(GridConfig::default())
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("config", &self.config)
            .field("cells", &self.cells.len())
            .field("flora_types", &self.flora.types().len())
            .field("flora_sink", &self.flora_sink.is_some())
            .finish_non_exhaustive()
    }
}

/// Rolls and delivers flora for a freshly generated cell.
///
/// The RNG is seeded from the flora seed and the cell key, so the same
/// coordinate always spawns the same plants.
fn spawn_flora<S: FloraSink + ?Sized>(
    catalog: &FloraCatalog,
    config: &FloraConfig,
    cell_size: f64,
    cell: &Cell,
    sink: &mut S,
) {
    let seed = FieldSeed::new(config.seed).derive(cell.coord().key().value());
    let mut rng = ChaCha8Rng::seed_from_u64(seed.value());

    for spawn in catalog.roll(cell.terrain(), cell.origin(), cell_size, config, &mut rng) {
        tracing::debug!(
            flora = spawn.flora.name(),
            x = spawn.position.x,
            y = spawn.position.y,
            "spawning flora"
        );
        sink.create_flora(spawn.position.x, spawn.position.y, spawn.flora);
    }
}
