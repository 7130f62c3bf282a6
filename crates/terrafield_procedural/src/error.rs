//! # Terrain Error Types
//!
//! Errors that can occur while building a grid.
//!
//! Grid, cell, and noise operations themselves are total; only loading
//! and validating configuration can fail.

use thiserror::Error;

/// Errors that can occur when configuring the terrain system.
#[derive(Error, Debug)]
pub enum TerrainError {
    /// A configuration value is outside its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// A flora definition names an attribute other than the three terrain scalars.
    #[error("unknown terrain attribute in flora definition: {0}")]
    UnknownTerrainAttribute(String),
}

/// Result type for terrain configuration.
pub type TerrainResult<T> = Result<T, TerrainError>;
