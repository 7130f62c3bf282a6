//! # TERRAFIELD
//!
//! Infinite, deterministic 2D terrain with a spatial index for the
//! entities that roam it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              TERRAFIELD                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐   │
//! │  │   NOISE         │────>│   CELL          │<────│   FLORA         │   │
//! │  │                 │     │                 │     │                 │   │
//! │  │  • Gradients    │     │  • Terrain      │     │  • Tolerances   │   │
//! │  │  • Memo caches  │     │  • Members      │     │  • Spawn rolls  │   │
//! │  └─────────────────┘     │  • Flow cache   │     └─────────────────┘   │
//! │                          └────────┬────────┘                           │
//! │                                   │                                     │
//! │                          ┌────────▼────────┐                           │
//! │                          │   GRID          │                           │
//! │                          │                 │                           │
//! │                          │  • Lazy cells   │                           │
//! │                          │  • Entity index │                           │
//! │                          │  • Flow field   │                           │
//! │                          │  • Queries      │                           │
//! │                          └─────────────────┘                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `procedural`: Terrain generation and the spatial index
//! - `shared`: Math types
//! - `sim`: A roaming simulation driving the grid tick by tick
//! - `logging`: `RUST_LOG` filtering for binaries

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod logging;
pub mod sim;

pub use terrafield_procedural as procedural;
pub use terrafield_shared as shared;

// Re-export commonly used types
pub use sim::{Plant, Roamer, Simulation, SimulationConfig, TickStats};
pub use terrafield_procedural::{
    CellCoord, EntityId, EntityKind, FloraCatalog, Grid, GridConfig, Occupancy, Occupant,
    SharedGrid, TerrainError, TerrainResult,
};
pub use terrafield_shared::{Rgb, Vec2};
