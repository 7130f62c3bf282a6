//! # TERRAFIELD Procedural Terrain
//!
//! Deterministic, infinite, lazily materialized 2D terrain with a spatial
//! index for the entities that roam it.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seeds always produce the same terrain
//! 2. **Lazy**: A cell exists only once something asks for it
//! 3. **Read-only queries**: Proximity queries never create cells
//! 4. **Embeddable**: The grid never owns entities; it indexes them
//!
//! ## Core Components
//!
//! - `NoiseField`: Memoized 2D gradient noise in `[0, 1]`
//! - `Terrain`: Fertility, height, temperature, and the derived flags
//! - `Cell`: One square of the plane with its members and flow vector
//! - `Grid`: The sparse cell map, entity index, and flow field
//! - `FloraCatalog`: Spawn-chance model rolled once per new cell
//!
//! ## Example
//!
//! ```rust
//! use terrafield_procedural::{Body, EntityId, EntityKind, Grid, GridConfig};
//! use terrafield_shared::Vec2;
//!
//! let mut grid = Grid::new(GridConfig::default()).unwrap();
//! let mut deer = Body::new(EntityId::new(1), EntityKind::Animal, Vec2::new(120.0, -30.0));
//!
//! let cell = grid.add_entity(&mut deer);
//! assert_eq!((cell.x, cell.y), (2, -1));
//!
//! let nearby = grid.entities_in_radius(100.0, -30.0, 25.0);
//! assert_eq!(nearby.len(), 1);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod cell;
pub mod config;
pub mod entity;
pub mod error;
pub mod flora;
pub mod grid;
pub mod noise;
pub mod terrain;

pub use cell::{Cell, CellCoord, CellKey, TerrainNoise};
pub use config::{FloraConfig, GridConfig, NoiseFieldConfig};
pub use entity::{Body, EntityId, EntityKind, Occupancy, Occupant};
pub use error::{TerrainError, TerrainResult};
pub use flora::{FloraCatalog, FloraDefinition, FloraSink, FloraSpawn, FloraType, Tolerance};
pub use grid::{Grid, GridStats, SharedGrid};
pub use noise::{FieldSeed, NoiseField};
pub use terrain::{elevation_for, Terrain, TerrainAttribute, TerrainClass};
