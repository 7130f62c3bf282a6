//! # Grid Configuration
//!
//! Everything a `Grid` needs at construction: cell size, one frequency and
//! seed per terrain noise field, and the flora roll parameters.
//!
//! Loaded once at startup, either from defaults or from a TOML file:
//!
//! ```toml
//! cell_size = 50.0
//!
//! [height]
//! frequency = 0.08
//! seed = 2
//!
//! [flora]
//! base_rate = 0.3
//! max_spawns_per_cell = 2
//! ```
//!
//! Omitted tables fall back to `GridConfig::default()`.

use std::path::Path;

use serde::Deserialize;

use crate::error::{TerrainError, TerrainResult};
use crate::noise::FieldSeed;
use crate::terrain::TerrainAttribute;

/// Frequency and seed of one noise field.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoiseFieldConfig {
    /// Multiplier applied to cell coordinates before sampling.
    /// Smaller values give larger features.
    pub frequency: f64,
    /// Seed of the field.
    pub seed: u64,
}

impl NoiseFieldConfig {
    /// Creates a field configuration.
    #[must_use]
    pub const fn new(frequency: f64, seed: u64) -> Self {
        Self { frequency, seed }
    }

    /// Returns the seed as a `FieldSeed`.
    #[must_use]
    pub const fn field_seed(&self) -> FieldSeed {
        FieldSeed::new(self.seed)
    }
}

/// Flora spawn roll parameters.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FloraConfig {
    /// Seed for per-cell spawn rolls.
    pub seed: u64,
    /// Scale applied to the product of the per-attribute fitnesses.
    pub base_rate: f64,
    /// Upper bound on flora types rolled per cell.
    pub max_spawns_per_cell: usize,
}

impl FloraConfig {
    /// Default base spawn rate.
    pub const DEFAULT_BASE_RATE: f64 = 0.3;
    /// Default cap on types rolled per cell.
    pub const DEFAULT_MAX_SPAWNS: usize = 2;
}

impl Default for FloraConfig {
    fn default() -> Self {
        Self {
            seed: 4,
            base_rate: Self::DEFAULT_BASE_RATE,
            max_spawns_per_cell: Self::DEFAULT_MAX_SPAWNS,
        }
    }
}

/// Grid construction parameters.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// World units per cell edge.
    pub cell_size: f64,
    /// Soil fertility field.
    pub soil_fertility: NoiseFieldConfig,
    /// Height field.
    pub height: NoiseFieldConfig,
    /// Temperature field.
    pub temperature: NoiseFieldConfig,
    /// Flora rolls.
    pub flora: FloraConfig,
}

impl GridConfig {
    /// Default world units per cell edge.
    pub const DEFAULT_CELL_SIZE: f64 = 50.0;

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParse` for malformed TOML and `InvalidConfig` when a
    /// value is out of range.
    pub fn from_toml_str(source: &str) -> TerrainResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigIo` if the file cannot be read, otherwise the same
    /// errors as [`GridConfig::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> TerrainResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Sets the cell size.
    #[must_use]
    pub const fn with_cell_size(mut self, cell_size: f64) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Replaces the configuration of one noise field.
    #[must_use]
    pub fn with_field(mut self, attr: TerrainAttribute, field: NoiseFieldConfig) -> Self {
        match attr {
            TerrainAttribute::SoilFertility => self.soil_fertility = field,
            TerrainAttribute::Height => self.height = field,
            TerrainAttribute::Temperature => self.temperature = field,
        }
        self
    }

    /// Returns the configuration of one noise field.
    #[must_use]
    pub const fn field(&self, attr: TerrainAttribute) -> &NoiseFieldConfig {
        match attr {
            TerrainAttribute::SoilFertility => &self.soil_fertility,
            TerrainAttribute::Height => &self.height,
            TerrainAttribute::Temperature => &self.temperature,
        }
    }

    /// Checks every value is in range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first offending value.
    pub fn validate(&self) -> TerrainResult<()> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(TerrainError::InvalidConfig(format!(
                "cell_size must be positive and finite, got {}",
                self.cell_size
            )));
        }

        for attr in TerrainAttribute::ALL {
            let frequency = self.field(attr).frequency;
            if !(frequency.is_finite() && frequency >= 0.0) {
                return Err(TerrainError::InvalidConfig(format!(
                    "{} frequency must be non-negative and finite, got {frequency}",
                    attr.name()
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.flora.base_rate) {
            return Err(TerrainError::InvalidConfig(format!(
                "flora base_rate must be within [0, 1], got {}",
                self.flora.base_rate
            )));
        }

        Ok(())
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: Self::DEFAULT_CELL_SIZE,
            soil_fertility: NoiseFieldConfig::new(0.05, 1),
            height: NoiseFieldConfig::new(0.08, 2),
            temperature: NoiseFieldConfig::new(0.03, 3),
            flora: FloraConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = GridConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cell_size, 50.0);
        assert_eq!(config.flora.max_spawns_per_cell, 2);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config = GridConfig::from_toml_str(
            r#"
            cell_size = 32.0

            [height]
            frequency = 0.1
            seed = 99
            "#,
        )
        .unwrap();

        assert_eq!(config.cell_size, 32.0);
        assert_eq!(config.height, NoiseFieldConfig::new(0.1, 99));
        assert_eq!(config.temperature, GridConfig::default().temperature);
        assert_eq!(config.flora, FloraConfig::default());
    }

    #[test]
    fn test_rejects_bad_cell_size() {
        for bad in ["cell_size = 0.0", "cell_size = -4.0", "cell_size = nan"] {
            let err = GridConfig::from_toml_str(bad).unwrap_err();
            assert!(matches!(err, TerrainError::InvalidConfig(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn test_rejects_negative_frequency() {
        let config = GridConfig::default()
            .with_field(TerrainAttribute::Temperature, NoiseFieldConfig::new(-0.1, 3));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_rejects_base_rate_out_of_range() {
        let err = GridConfig::from_toml_str("[flora]\nbase_rate = 1.5").unwrap_err();
        assert!(matches!(err, TerrainError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = GridConfig::from_toml_str("cell_size = ").unwrap_err();
        assert!(matches!(err, TerrainError::ConfigParse(_)));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = GridConfig::from_toml_str("cell_sise = 10.0").unwrap_err();
        assert!(matches!(err, TerrainError::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = GridConfig::from_toml_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, TerrainError::ConfigIo(_)));
    }
}
