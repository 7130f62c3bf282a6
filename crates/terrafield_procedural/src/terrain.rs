//! # Terrain Classification
//!
//! Determines terrain flags and palette from per-cell noise samples.
//!
//! Every cell carries three independent scalars in [0, 1]:
//! - Soil fertility
//! - Height
//! - Temperature
//!
//! Flags are fixed thresholds on those scalars. They are not mutually
//! exclusive, except water and beach which partition the height axis.

use terrafield_shared::Rgb;

/// Height below which a cell is water.
pub const WATER_LEVEL: f64 = 0.4;
/// Height below which a non-water cell is beach.
pub const BEACH_LEVEL: f64 = 0.45;
/// Temperature below which a cell is frozen.
pub const FROZEN_TEMPERATURE: f64 = 0.3;
/// Temperature above which a cell is desert.
pub const DESERT_TEMPERATURE: f64 = 0.7;

/// The three noise-derived scalars every cell carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TerrainAttribute {
    /// How well plants grow.
    SoilFertility,
    /// Terrain height; drives water/beach and the flow field.
    Height,
    /// Climate temperature; drives frozen/desert.
    Temperature,
}

impl TerrainAttribute {
    /// All attributes, in sampling order.
    pub const ALL: [Self; 3] = [Self::SoilFertility, Self::Height, Self::Temperature];

    /// Returns the key used for this attribute in configuration tables.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SoilFertility => "soil_fertility",
            Self::Height => "height",
            Self::Temperature => "temperature",
        }
    }

    /// Parses a configuration key.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attr| attr.name() == name)
    }
}

/// Highest-priority terrain class of a cell.
///
/// This is the order palette lookups use: water, beach, frozen, desert,
/// then everything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TerrainClass {
    /// Height below the water level
    Water = 0,
    /// Narrow height band just above water
    Beach = 1,
    /// Cold land
    Frozen = 2,
    /// Hot land
    Desert = 3,
    /// Anything else; colored continuously
    Temperate = 4,
}

impl TerrainClass {
    /// Fixed palette entry, or `None` for temperate land.
    #[must_use]
    pub const fn palette(self) -> Option<Rgb> {
        match self {
            Self::Water => Some(Rgb::new(0, 0, 255)),
            Self::Beach => Some(Rgb::new(255, 255, 0)),
            Self::Frozen => Some(Rgb::new(230, 230, 230)),
            Self::Desert => Some(Rgb::new(200, 170, 0)),
            Self::Temperate => None,
        }
    }
}

/// Immutable terrain of one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Terrain {
    /// Soil fertility in [0, 1]
    pub soil_fertility: f64,
    /// Height in [0, 1]
    pub height: f64,
    /// Temperature in [0, 1]
    pub temperature: f64,
    /// `height < 0.4`
    pub water: bool,
    /// `0.4 <= height < 0.45`
    pub beach: bool,
    /// `temperature < 0.3`
    pub frozen: bool,
    /// `temperature > 0.7`
    pub desert: bool,
}

impl Terrain {
    /// Builds terrain from the three samples and derives the flags.
    #[must_use]
    pub fn from_samples(soil_fertility: f64, height: f64, temperature: f64) -> Self {
        let water = height < WATER_LEVEL;
        Self {
            soil_fertility,
            height,
            temperature,
            water,
            beach: !water && height < BEACH_LEVEL,
            frozen: temperature < FROZEN_TEMPERATURE,
            desert: temperature > DESERT_TEMPERATURE,
        }
    }

    /// Reads one scalar by attribute.
    #[inline]
    #[must_use]
    pub const fn attribute(&self, attr: TerrainAttribute) -> f64 {
        match attr {
            TerrainAttribute::SoilFertility => self.soil_fertility,
            TerrainAttribute::Height => self.height,
            TerrainAttribute::Temperature => self.temperature,
        }
    }

    /// Classifies by flag priority.
    #[must_use]
    pub const fn class(&self) -> TerrainClass {
        if self.water {
            TerrainClass::Water
        } else if self.beach {
            TerrainClass::Beach
        } else if self.frozen {
            TerrainClass::Frozen
        } else if self.desert {
            TerrainClass::Desert
        } else {
            TerrainClass::Temperate
        }
    }

    /// Display color: fixed palette for flagged terrain, otherwise
    /// `r = temperature, g = soil fertility, b = height`, scaled to 0..=255.
    #[must_use]
    pub fn color(&self) -> Rgb {
        self.class().palette().unwrap_or_else(|| {
            Rgb::from_unit(self.temperature, self.soil_fertility, self.height)
        })
    }
}

/// Elevation hook. Flat for now; cells call this once at construction so
/// vertical offset can later become a function of height.
#[inline]
#[must_use]
pub const fn elevation_for(_terrain: &Terrain) -> f64 {
    0.0
}
