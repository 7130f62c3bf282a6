//! # Flora Spawning
//!
//! Decides which plants grow in a freshly generated cell.
//!
//! Each flora type has a tolerance per terrain attribute: a `[min, max]`
//! range and an optimal value. Fitness falls off linearly from the optimum
//! and is zero outside the range. A type's spawn chance is the product of
//! its three fitnesses times a base rate.
//!
//! Spawning runs once per cell materialization and never on water. The
//! highest-chance types are rolled first, up to a per-cell cap, and each
//! success is handed to the application's [`FloraSink`].

use std::collections::BTreeMap;
use std::path::Path;

use rand::Rng;
use serde::Deserialize;
use terrafield_shared::Vec2;

use crate::config::FloraConfig;
use crate::error::{TerrainError, TerrainResult};
use crate::terrain::{Terrain, TerrainAttribute};

/// Acceptable range and optimum of one terrain attribute.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tolerance {
    /// Lowest value the type survives.
    pub min: f64,
    /// Value with full fitness.
    pub optimal: f64,
    /// Highest value the type survives.
    pub max: f64,
}

impl Tolerance {
    /// Creates a tolerance.
    #[must_use]
    pub const fn new(min: f64, optimal: f64, max: f64) -> Self {
        Self { min, optimal, max }
    }

    /// Fitness of `value` in [0, 1].
    ///
    /// `1 − |value − optimal| / max(optimal − min, max − optimal)` inside
    /// the range, zero outside. A zero-width range is fully fit at its
    /// single point.
    #[must_use]
    pub fn fitness(&self, value: f64) -> f64 {
        if !(self.min..=self.max).contains(&value) {
            return 0.0;
        }
        let spread = (self.optimal - self.min).max(self.max - self.optimal);
        if spread <= 0.0 {
            return 1.0;
        }
        (1.0 - (value - self.optimal).abs() / spread).clamp(0.0, 1.0)
    }
}

/// One kind of plant.
#[derive(Clone, Debug, PartialEq)]
pub struct FloraType {
    name: String,
    tolerances: BTreeMap<TerrainAttribute, Tolerance>,
}

impl FloraType {
    /// Creates a type with no tolerances.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tolerances: BTreeMap::new(),
        }
    }

    /// Adds or replaces the tolerance for one attribute.
    #[must_use]
    pub fn with_tolerance(mut self, attr: TerrainAttribute, tolerance: Tolerance) -> Self {
        self.tolerances.insert(attr, tolerance);
        self
    }

    /// Type name, as passed to the flora sink.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tolerance for one attribute, if defined.
    #[must_use]
    pub fn tolerance(&self, attr: TerrainAttribute) -> Option<&Tolerance> {
        self.tolerances.get(&attr)
    }

    /// Attributes this type has no tolerance for, in sampling order.
    pub fn missing_tolerances(&self) -> impl Iterator<Item = TerrainAttribute> + '_ {
        TerrainAttribute::ALL
            .into_iter()
            .filter(|attr| !self.tolerances.contains_key(attr))
    }

    /// Spawn chance on `terrain`.
    ///
    /// A missing tolerance is treated as "cannot grow here". The catalog
    /// reports incomplete types once when it is built.
    #[must_use]
    pub fn chance(&self, terrain: &Terrain, base_rate: f64) -> f64 {
        let mut fitness = 1.0;
        for attr in TerrainAttribute::ALL {
            let Some(tolerance) = self.tolerances.get(&attr) else {
                tracing::debug!(
                    flora = %self.name,
                    attribute = attr.name(),
                    "no tolerance for attribute; spawn chance is zero"
                );
                return 0.0;
            };
            fitness *= tolerance.fitness(terrain.attribute(attr));
        }
        fitness * base_rate
    }
}

/// Serialized form of a flora type, keyed by attribute name.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FloraDefinition {
    /// Type name.
    pub name: String,
    /// Tolerances keyed by `soil_fertility`, `height`, `temperature`.
    pub tolerances: BTreeMap<String, Tolerance>,
}

impl TryFrom<FloraDefinition> for FloraType {
    type Error = TerrainError;

    fn try_from(def: FloraDefinition) -> TerrainResult<Self> {
        let mut flora = Self::new(def.name);
        for (key, tolerance) in def.tolerances {
            let attr = TerrainAttribute::from_name(&key)
                .ok_or(TerrainError::UnknownTerrainAttribute(key))?;
            flora.tolerances.insert(attr, tolerance);
        }
        Ok(flora)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    flora: Vec<FloraDefinition>,
}

/// A spawn decided by a roll.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloraSpawn<'a> {
    /// World position inside the cell.
    pub position: Vec2,
    /// What to spawn.
    pub flora: &'a FloraType,
}

/// Application-owned receiver of flora spawns.
pub trait FloraSink: Send {
    /// Creates one plant at world position `(x, y)`.
    fn create_flora(&mut self, x: f64, y: f64, flora: &FloraType);
}

impl<F> FloraSink for F
where
    F: FnMut(f64, f64, &FloraType) + Send,
{
    fn create_flora(&mut self, x: f64, y: f64, flora: &FloraType) {
        self(x, y, flora);
    }
}

/// Fixed set of flora types a grid can spawn.
#[derive(Clone, Debug, PartialEq)]
pub struct FloraCatalog {
    types: Vec<FloraType>,
}

impl FloraCatalog {
    /// Creates a catalog from types.
    ///
    /// Types lacking a tolerance for any attribute are kept but can never
    /// spawn; each one is logged here, once.
    #[must_use]
    pub fn new(types: Vec<FloraType>) -> Self {
        for flora in &types {
            let missing: Vec<&str> = flora
                .missing_tolerances()
                .map(TerrainAttribute::name)
                .collect();
            if !missing.is_empty() {
                tracing::warn!(
                    flora = %flora.name,
                    ?missing,
                    "flora type lacks tolerances; it will never spawn"
                );
            }
        }
        Self { types }
    }

    /// A catalog that never spawns anything.
    #[must_use]
    pub fn empty() -> Self {
        Self { types: Vec::new() }
    }

    /// Parses a catalog from `[[flora]]` entries.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParse` for malformed TOML and
    /// `UnknownTerrainAttribute` for tolerance keys other than the three
    /// terrain attributes.
    pub fn from_toml_str(source: &str) -> TerrainResult<Self> {
        let file: CatalogFile = toml::from_str(source)?;
        let types = file
            .flora
            .into_iter()
            .map(FloraType::try_from)
            .collect::<TerrainResult<Vec<_>>>()?;
        Ok(Self::new(types))
    }

    /// Reads a catalog file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigIo` if the file cannot be read, otherwise the same
    /// errors as [`FloraCatalog::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> TerrainResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// All types.
    #[must_use]
    pub fn types(&self) -> &[FloraType] {
        &self.types
    }

    /// Looks up a type by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FloraType> {
        self.types.iter().find(|flora| flora.name == name)
    }

    /// Spawn chance of the named type on `terrain`.
    ///
    /// Unknown names are logged and yield zero.
    #[must_use]
    pub fn spawn_chance(&self, name: &str, terrain: &Terrain, base_rate: f64) -> f64 {
        match self.get(name) {
            Some(flora) => flora.chance(terrain, base_rate),
            None => {
                tracing::warn!(flora = name, "unknown flora type; spawn chance is zero");
                0.0
            }
        }
    }

    /// Rolls spawns for one cell.
    ///
    /// Water cells never spawn. Types with a non-zero chance are taken in
    /// descending chance order, at most `config.max_spawns_per_cell` of
    /// them, and each is rolled independently. Successful rolls land at a
    /// uniformly random point of the cell square starting at `origin`.
    pub fn roll<R: Rng + ?Sized>(
        &self,
        terrain: &Terrain,
        origin: Vec2,
        cell_size: f64,
        config: &FloraConfig,
        rng: &mut R,
    ) -> Vec<FloraSpawn<'_>> {
        if terrain.water {
            return Vec::new();
        }

        let mut ranked: Vec<(&FloraType, f64)> = self
            .types
            .iter()
            .map(|flora| (flora, flora.chance(terrain, config.base_rate)))
            .filter(|&(_, chance)| chance > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut spawns = Vec::new();
        for (flora, chance) in ranked.into_iter().take(config.max_spawns_per_cell) {
            if rng.gen::<f64>() < chance {
                let offset = Vec2::new(rng.gen::<f64>(), rng.gen::<f64>()) * cell_size;
                spawns.push(FloraSpawn {
                    position: origin + offset,
                    flora,
                });
            }
        }
        spawns
    }
}

impl Default for FloraCatalog {
    fn default() -> Self {
        use TerrainAttribute::{Height, SoilFertility, Temperature};

        Self::new(vec![
            FloraType::new("oak")
                .with_tolerance(SoilFertility, Tolerance::new(0.4, 0.7, 1.0))
                .with_tolerance(Height, Tolerance::new(0.45, 0.6, 0.85))
                .with_tolerance(Temperature, Tolerance::new(0.35, 0.55, 0.75)),
            FloraType::new("pine")
                .with_tolerance(SoilFertility, Tolerance::new(0.2, 0.5, 0.9))
                .with_tolerance(Height, Tolerance::new(0.5, 0.75, 1.0))
                .with_tolerance(Temperature, Tolerance::new(0.0, 0.25, 0.5)),
            FloraType::new("cactus")
                .with_tolerance(SoilFertility, Tolerance::new(0.0, 0.15, 0.4))
                .with_tolerance(Height, Tolerance::new(0.45, 0.55, 0.8))
                .with_tolerance(Temperature, Tolerance::new(0.65, 0.9, 1.0)),
            FloraType::new("palm")
                .with_tolerance(SoilFertility, Tolerance::new(0.2, 0.4, 0.7))
                .with_tolerance(Height, Tolerance::new(0.4, 0.44, 0.55))
                .with_tolerance(Temperature, Tolerance::new(0.55, 0.8, 1.0)),
            FloraType::new("shrub")
                .with_tolerance(SoilFertility, Tolerance::new(0.1, 0.4, 0.8))
                .with_tolerance(Height, Tolerance::new(0.45, 0.6, 0.9))
                .with_tolerance(Temperature, Tolerance::new(0.2, 0.5, 0.8)),
        ])
    }
}
