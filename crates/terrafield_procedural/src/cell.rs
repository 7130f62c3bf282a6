//! # Cell System
//!
//! The plane is divided into fixed-size square cells identified by integer
//! coordinates. A cell holds:
//! - Terrain sampled once from three noise fields (never changes)
//! - A lazily computed flow vector
//! - A per-radius cache of neighboring cells that existed when first asked
//! - The set of entities currently inside it
//!
//! Cells are created by the `Grid` on first access and never individually
//! evicted.

use std::collections::HashMap;

use terrafield_shared::{Rgb, Vec2};

use crate::config::GridConfig;
use crate::entity::{EntityId, Occupancy};
use crate::noise::NoiseField;
use crate::terrain::{elevation_for, Terrain, TerrainAttribute};

/// Cell coordinate (identifies a cell in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    /// X coordinate (in cells, not world units).
    pub x: i32,
    /// Y coordinate (in cells, not world units).
    pub y: i32,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Converts world coordinates to the containing cell.
    ///
    /// Uses floor division so negative positions land in negative cells
    /// (`x = -1` with size 50 is cell `-1`, not `0`). Results saturate at the
    /// `i32` range; NaN maps to 0.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_world_pos(world_x: f64, world_y: f64, cell_size: f64) -> Self {
        Self {
            x: (world_x / cell_size).floor() as i32,
            y: (world_y / cell_size).floor() as i32,
        }
    }

    /// Returns the world position of the cell's origin (minimum corner).
    #[inline]
    #[must_use]
    pub fn world_origin(self, cell_size: f64) -> Vec2 {
        Vec2::new(f64::from(self.x) * cell_size, f64::from(self.y) * cell_size)
    }

    /// Returns the coordinate offset by `(dx, dy)`, or `None` past the `i32`
    /// range.
    #[inline]
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
    }

    /// Packs the coordinate into a map key.
    #[inline]
    #[must_use]
    pub const fn key(self) -> CellKey {
        CellKey::new(self)
    }
}

/// Packed map key: `x` in the high 32 bits, `y` in the low 32 bits.
///
/// Injective over all `i32` pairs and reversible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey(u64);

impl CellKey {
    /// Packs a coordinate.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn new(coord: CellCoord) -> Self {
        Self(((coord.x as u32 as u64) << 32) | (coord.y as u32 as u64))
    }

    /// Unpacks the coordinate.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub const fn coord(self) -> CellCoord {
        CellCoord::new((self.0 >> 32) as u32 as i32, self.0 as u32 as i32)
    }

    /// Returns the raw packed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// The three noise fields terrain is sampled from, with their frequencies.
///
/// Owned by the grid and passed into every cell it creates.
#[derive(Debug, Clone)]
pub struct TerrainNoise {
    /// One field per `TerrainAttribute`, in `TerrainAttribute::ALL` order.
    fields: [NoiseField; 3],
    /// Sampling frequency per field.
    frequencies: [f64; 3],
}

impl TerrainNoise {
    /// Builds the fields from their configured seeds.
    #[must_use]
    pub fn new(config: &GridConfig) -> Self {
        let field = |attr| NoiseField::new(config.field(attr).field_seed());
        let frequency = |attr| config.field(attr).frequency;
        Self {
            fields: TerrainAttribute::ALL.map(field),
            frequencies: TerrainAttribute::ALL.map(frequency),
        }
    }

    /// Field backing one attribute.
    #[must_use]
    pub fn field(&self, attr: TerrainAttribute) -> &NoiseField {
        &self.fields[attr as usize]
    }

    /// Samples one attribute for a cell at `(coord · frequency)`.
    pub fn sample(&mut self, attr: TerrainAttribute, coord: CellCoord) -> f64 {
        let frequency = self.frequencies[attr as usize];
        self.fields[attr as usize].sample(
            f64::from(coord.x) * frequency,
            f64::from(coord.y) * frequency,
        )
    }

    /// Samples all three attributes and derives flags.
    pub fn terrain_at(&mut self, coord: CellCoord) -> Terrain {
        Terrain::from_samples(
            self.sample(TerrainAttribute::SoilFertility, coord),
            self.sample(TerrainAttribute::Height, coord),
            self.sample(TerrainAttribute::Temperature, coord),
        )
    }
}

/// One terrain unit of the world grid.
#[derive(Clone, Debug)]
pub struct Cell {
    /// Position in the grid.
    coord: CellCoord,
    /// World position of the minimum corner.
    origin: Vec2,
    /// Immutable terrain.
    terrain: Terrain,
    /// Vertical offset; flat for now.
    z: f64,
    /// Entities currently inside, with their recorded positions.
    members: HashMap<EntityId, Occupancy>,
    /// Flow vector once computed.
    flow: Option<Vec2>,
    /// Existing neighbors per Chebyshev radius, as of first request.
    neighbor_cache: HashMap<u32, Vec<CellCoord>>,
}

impl Cell {
    /// Generates the cell at `coord` from the grid's noise fields.
    #[must_use]
    pub fn generate(coord: CellCoord, cell_size: f64, noise: &mut TerrainNoise) -> Self {
        Self::from_terrain(coord, cell_size, noise.terrain_at(coord))
    }

    /// Builds a cell around already-sampled terrain.
    #[must_use]
    pub fn from_terrain(coord: CellCoord, cell_size: f64, terrain: Terrain) -> Self {
        Self {
            coord,
            origin: coord.world_origin(cell_size),
            z: elevation_for(&terrain),
            terrain,
            members: HashMap::new(),
            flow: None,
            neighbor_cache: HashMap::new(),
        }
    }

    /// Cell coordinate.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// World position of the minimum corner.
    #[inline]
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Terrain attributes and flags.
    #[inline]
    #[must_use]
    pub const fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// Terrain height in [0, 1].
    #[inline]
    #[must_use]
    pub const fn height(&self) -> f64 {
        self.terrain.height
    }

    /// Vertical offset.
    #[inline]
    #[must_use]
    pub const fn z(&self) -> f64 {
        self.z
    }

    /// Display color.
    #[must_use]
    pub fn color(&self) -> Rgb {
        self.terrain.color()
    }

    /// Adds or refreshes a member. Returns `true` if it was not present.
    pub fn add_entity(&mut self, occupancy: Occupancy) -> bool {
        self.members.insert(occupancy.id, occupancy).is_none()
    }

    /// Removes a member, returning its record.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Occupancy> {
        self.members.remove(&id)
    }

    /// Live membership, in no particular order.
    pub fn entities(&self) -> impl Iterator<Item = &Occupancy> + '_ {
        self.members.values()
    }

    /// Ids of the live membership, in no particular order.
    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.members.keys().copied()
    }

    /// Whether `id` is a member.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.members.contains_key(&id)
    }

    /// Number of members.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.members.len()
    }

    /// Flow vector if already computed.
    #[must_use]
    pub const fn cached_flow(&self) -> Option<Vec2> {
        self.flow
    }

    /// Whether the flow vector has been computed.
    #[must_use]
    pub const fn flow_computed(&self) -> bool {
        self.flow.is_some()
    }

    /// Neighbor list for `radius` if already computed.
    #[must_use]
    pub fn cached_neighbors(&self, radius: u32) -> Option<&[CellCoord]> {
        self.neighbor_cache.get(&radius).map(Vec::as_slice)
    }

    pub(crate) fn set_flow(&mut self, flow: Vec2) {
        self.flow = Some(flow);
    }

    pub(crate) fn cache_neighbors(&mut self, radius: u32, neighbors: Vec<CellCoord>) {
        self.neighbor_cache.insert(radius, neighbors);
    }

    pub(crate) fn clear_neighbor_cache(&mut self) {
        self.neighbor_cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;

    #[test]
    fn test_cell_coord_from_world() {
        let size = 50.0;
        assert_eq!(CellCoord::from_world_pos(0.0, 0.0, size), CellCoord::new(0, 0));
        assert_eq!(CellCoord::from_world_pos(49.0, 0.0, size), CellCoord::new(0, 0));
        assert_eq!(CellCoord::from_world_pos(50.0, 0.0, size), CellCoord::new(1, 0));
        assert_eq!(CellCoord::from_world_pos(-1.0, -1.0, size), CellCoord::new(-1, -1));
        assert_eq!(CellCoord::from_world_pos(-50.0, -50.0, size), CellCoord::new(-1, -1));
        assert_eq!(CellCoord::from_world_pos(-51.0, -51.0, size), CellCoord::new(-2, -2));
        assert_eq!(CellCoord::from_world_pos(120.0, -30.0, size), CellCoord::new(2, -1));
    }

    #[test]
    fn test_cell_coord_saturates() {
        let far = CellCoord::from_world_pos(1.0e300, -1.0e300, 1.0);
        assert_eq!(far, CellCoord::new(i32::MAX, i32::MIN));
        assert_eq!(CellCoord::from_world_pos(f64::NAN, 0.0, 1.0), CellCoord::new(0, 0));
    }

    #[test]
    fn test_key_round_trip_and_injective() {
        let coords = [
            CellCoord::new(0, 0),
            CellCoord::new(-1, 0),
            CellCoord::new(0, -1),
            CellCoord::new(1, -1),
            CellCoord::new(-1, 1),
            CellCoord::new(i32::MAX, i32::MIN),
            CellCoord::new(i32::MIN, i32::MAX),
        ];
        let mut keys = std::collections::HashSet::new();
        for coord in coords {
            assert_eq!(coord.key().coord(), coord);
            assert!(keys.insert(coord.key()), "Duplicate key for {coord:?}");
        }
    }

    #[test]
    fn test_offset_overflow() {
        assert_eq!(CellCoord::new(i32::MAX, 0).offset(1, 0), None);
        assert_eq!(CellCoord::new(3, 4).offset(-1, 2), Some(CellCoord::new(2, 6)));
    }

    #[test]
    fn test_generation_determinism() {
        let config = GridConfig::default();
        let mut noise1 = TerrainNoise::new(&config);
        let mut noise2 = TerrainNoise::new(&config);

        for x in -5..5 {
            for y in -5..5 {
                let coord = CellCoord::new(x, y);
                let a = Cell::generate(coord, config.cell_size, &mut noise1);
                let b = Cell::generate(coord, config.cell_size, &mut noise2);
                assert_eq!(a.terrain(), b.terrain(), "Mismatch at {coord:?}");
            }
        }
    }

    #[test]
    fn test_cell_origin_and_flat_elevation() {
        let mut noise = TerrainNoise::new(&GridConfig::default());
        let cell = Cell::generate(CellCoord::new(2, -1), 50.0, &mut noise);

        assert_eq!(cell.origin(), Vec2::new(100.0, -50.0));
        assert_eq!(cell.z(), 0.0);
        assert!(!cell.flow_computed());
    }

    #[test]
    fn test_terrain_in_unit_range() {
        let mut noise = TerrainNoise::new(&GridConfig::default());
        for x in -20..20 {
            for y in -20..20 {
                let terrain = noise.terrain_at(CellCoord::new(x * 37, y * 53));
                for attr in TerrainAttribute::ALL {
                    assert!((0.0..=1.0).contains(&terrain.attribute(attr)));
                }
            }
        }
    }

    #[test]
    fn test_membership() {
        let terrain = Terrain::from_samples(0.5, 0.5, 0.5);
        let mut cell = Cell::from_terrain(CellCoord::new(0, 0), 50.0, terrain);
        let occupancy = Occupancy {
            id: EntityId::new(7),
            kind: EntityKind::Animal,
            position: Vec2::new(10.0, 10.0),
        };

        assert!(cell.add_entity(occupancy));
        assert!(!cell.add_entity(occupancy), "Second add refreshes, does not duplicate");
        assert_eq!(cell.entity_count(), 1);
        assert!(cell.contains(EntityId::new(7)));
        assert_eq!(cell.entity_ids().collect::<Vec<_>>(), vec![EntityId::new(7)]);

        assert_eq!(cell.remove_entity(EntityId::new(7)), Some(occupancy));
        assert_eq!(cell.remove_entity(EntityId::new(7)), None);
        assert_eq!(cell.entities().count(), 0);
    }
}
