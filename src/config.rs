//! Map generation configuration and builder
//!
//! The same configuration always produces the identical map: the seed
//! drives a private generator owned by the generation run, so callers never
//! share random state with the core.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{HexMapError, Result};
use crate::grid::HexDirection;

/// Which halves of the map receive the warm-equator temperature gradient
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Hemisphere {
    /// Warm equator in the middle, mirrored toward both poles
    #[default]
    Both,
    /// Northern hemisphere only: warm south edge, cold north edge
    North,
    /// Southern hemisphere only: warm north edge, cold south edge
    South,
}

/// Tuning parameters for one map generation run.
///
/// Construct through [`MapConfigBuilder`], which validates ranges and fills
/// a random seed when none is given.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapConfig {
    /// Seed for the run's private random generator
    pub seed: u64,
    /// Chance that a frontier cell gets a +1 heuristic, roughening chunk
    /// outlines [0, 0.5]
    pub jitter_probability: f32,
    /// Smallest land chunk grown per raise/sink step [20, 200]
    pub chunk_size_min: i32,
    /// Upper bound (exclusive) on grown chunk size [20, 200]
    pub chunk_size_max: i32,
    /// Percentage of cells that should end up above water [5, 95]
    pub land_percentage: i32,
    /// Global water level all cells start at [1, 5]
    pub water_level: i32,
    /// Chance a raise/sink step moves two levels instead of one [0, 1]
    pub high_rise_probability: f32,
    /// Chance a step sinks instead of raises; keep below raise [0, 0.4]
    pub sink_probability: f32,
    /// Lowest reachable elevation [-4, 0]
    pub elevation_minimum: i32,
    /// Highest reachable elevation [6, 10]
    pub elevation_maximum: i32,
    /// Land-free margin on the east/west map edges [0, 10]
    pub map_border_x: i32,
    /// Land-free margin on the north/south map edges [0, 10]
    pub map_border_z: i32,
    /// Land-free margin between regions [0, 10]
    pub region_border: i32,
    /// Number of land regions the map is split into [1, 4]
    pub region_count: i32,
    /// Percentage of erodible cells that get smoothed away [0, 100]
    pub erosion_percentage: i32,
    /// Moisture every cell starts the climate simulation with [0, 1]
    pub starting_moisture: f32,
    /// Fraction of moisture that evaporates per climate cycle [0, 1]
    pub evaporation_factor: f32,
    /// Fraction of clouds that precipitate per climate cycle [0, 1]
    pub precipitation_factor: f32,
    /// Fraction of moisture that runs downhill per cycle [0, 1]
    pub runoff_factor: f32,
    /// Fraction of moisture that seeps sideways per cycle [0, 1]
    pub seepage_factor: f32,
    /// Direction the wind blows from
    pub wind_direction: HexDirection,
    /// Cloud dispersal bias along the wind [1, 10]
    pub wind_strength: f32,
    /// River length as a percentage of land cells [0, 20]
    pub river_percentage: i32,
    /// Chance a river cell with no outlet becomes an extra lake [0, 1]
    pub extra_lake_probability: f32,
    /// Temperature at the cold pole [0, 1]
    pub low_temperature: f32,
    /// Temperature at the warm equator [0, 1]
    pub high_temperature: f32,
    /// Noise-driven temperature wobble [0, 1]
    pub temperature_jitter: f32,
    /// Hemisphere layout of the temperature gradient
    pub hemisphere: Hemisphere,
}

impl MapConfig {
    // Defaults shared by the builder; seed is filled at build time.
    fn base(seed: u64) -> MapConfig {
        MapConfig {
            seed,
            jitter_probability: 0.25,
            chunk_size_min: 30,
            chunk_size_max: 100,
            land_percentage: 40,
            water_level: 3,
            high_rise_probability: 0.25,
            sink_probability: 0.2,
            elevation_minimum: -2,
            elevation_maximum: 8,
            map_border_x: 5,
            map_border_z: 5,
            region_border: 5,
            region_count: 1,
            erosion_percentage: 50,
            starting_moisture: 0.1,
            evaporation_factor: 0.5,
            precipitation_factor: 0.25,
            runoff_factor: 0.25,
            seepage_factor: 0.125,
            wind_direction: HexDirection::NW,
            wind_strength: 4.0,
            river_percentage: 10,
            extra_lake_probability: 0.25,
            low_temperature: 0.0,
            high_temperature: 1.0,
            temperature_jitter: 0.1,
            hemisphere: Hemisphere::Both,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfigBuilder::new().build().unwrap()
    }
}

/// Builder for [`MapConfig`] with validation
///
/// ```
/// use hex_terrain::MapConfigBuilder;
///
/// let config = MapConfigBuilder::new()
///     .seed(42)
///     .land_percentage(55)
///     .river_percentage(12)
///     .build()
///     .unwrap();
/// assert_eq!(config.seed, 42);
/// ```
#[derive(Debug, Clone)]
pub struct MapConfigBuilder {
    seed: Option<u64>,
    config: MapConfig,
}

impl MapConfigBuilder {
    pub fn new() -> MapConfigBuilder {
        MapConfigBuilder {
            seed: None,
            config: MapConfig::base(0),
        }
    }

    fn config_mut(&mut self) -> &mut MapConfig {
        &mut self.config
    }

    /// Set the seed; the same seed always produces the identical map
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn jitter_probability(mut self, value: f32) -> Self {
        self.config_mut().jitter_probability = value;
        self
    }

    pub fn chunk_size_min(mut self, value: i32) -> Self {
        self.config_mut().chunk_size_min = value;
        self
    }

    pub fn chunk_size_max(mut self, value: i32) -> Self {
        self.config_mut().chunk_size_max = value;
        self
    }

    pub fn land_percentage(mut self, value: i32) -> Self {
        self.config_mut().land_percentage = value;
        self
    }

    pub fn water_level(mut self, value: i32) -> Self {
        self.config_mut().water_level = value;
        self
    }

    pub fn high_rise_probability(mut self, value: f32) -> Self {
        self.config_mut().high_rise_probability = value;
        self
    }

    pub fn sink_probability(mut self, value: f32) -> Self {
        self.config_mut().sink_probability = value;
        self
    }

    pub fn elevation_minimum(mut self, value: i32) -> Self {
        self.config_mut().elevation_minimum = value;
        self
    }

    pub fn elevation_maximum(mut self, value: i32) -> Self {
        self.config_mut().elevation_maximum = value;
        self
    }

    pub fn map_border_x(mut self, value: i32) -> Self {
        self.config_mut().map_border_x = value;
        self
    }

    pub fn map_border_z(mut self, value: i32) -> Self {
        self.config_mut().map_border_z = value;
        self
    }

    pub fn region_border(mut self, value: i32) -> Self {
        self.config_mut().region_border = value;
        self
    }

    pub fn region_count(mut self, value: i32) -> Self {
        self.config_mut().region_count = value;
        self
    }

    pub fn erosion_percentage(mut self, value: i32) -> Self {
        self.config_mut().erosion_percentage = value;
        self
    }

    pub fn starting_moisture(mut self, value: f32) -> Self {
        self.config_mut().starting_moisture = value;
        self
    }

    pub fn evaporation_factor(mut self, value: f32) -> Self {
        self.config_mut().evaporation_factor = value;
        self
    }

    pub fn precipitation_factor(mut self, value: f32) -> Self {
        self.config_mut().precipitation_factor = value;
        self
    }

    pub fn runoff_factor(mut self, value: f32) -> Self {
        self.config_mut().runoff_factor = value;
        self
    }

    pub fn seepage_factor(mut self, value: f32) -> Self {
        self.config_mut().seepage_factor = value;
        self
    }

    pub fn wind_direction(mut self, value: HexDirection) -> Self {
        self.config_mut().wind_direction = value;
        self
    }

    pub fn wind_strength(mut self, value: f32) -> Self {
        self.config_mut().wind_strength = value;
        self
    }

    pub fn river_percentage(mut self, value: i32) -> Self {
        self.config_mut().river_percentage = value;
        self
    }

    pub fn extra_lake_probability(mut self, value: f32) -> Self {
        self.config_mut().extra_lake_probability = value;
        self
    }

    pub fn low_temperature(mut self, value: f32) -> Self {
        self.config_mut().low_temperature = value;
        self
    }

    pub fn high_temperature(mut self, value: f32) -> Self {
        self.config_mut().high_temperature = value;
        self
    }

    pub fn temperature_jitter(mut self, value: f32) -> Self {
        self.config_mut().temperature_jitter = value;
        self
    }

    pub fn hemisphere(mut self, value: Hemisphere) -> Self {
        self.config_mut().hemisphere = value;
        self
    }

    /// Validate and build the configuration.
    ///
    /// A random seed is generated when none was given, so two unseeded
    /// builds produce different maps.
    pub fn build(self) -> Result<MapConfig> {
        let mut config = self.config;
        config.seed = self.seed.unwrap_or_else(rand::random);

        check_f32("jitter_probability", config.jitter_probability, 0.0, 0.5)?;
        check_i32("chunk_size_min", config.chunk_size_min, 20, 200)?;
        check_i32("chunk_size_max", config.chunk_size_max, 20, 200)?;
        if config.chunk_size_min >= config.chunk_size_max {
            return Err(HexMapError::InvalidConfig(format!(
                "chunk_size_min ({}) must be below chunk_size_max ({})",
                config.chunk_size_min, config.chunk_size_max
            )));
        }
        check_i32("land_percentage", config.land_percentage, 5, 95)?;
        check_i32("water_level", config.water_level, 1, 5)?;
        check_f32("high_rise_probability", config.high_rise_probability, 0.0, 1.0)?;
        check_f32("sink_probability", config.sink_probability, 0.0, 0.4)?;
        check_i32("elevation_minimum", config.elevation_minimum, -4, 0)?;
        check_i32("elevation_maximum", config.elevation_maximum, 6, 10)?;
        check_i32("map_border_x", config.map_border_x, 0, 10)?;
        check_i32("map_border_z", config.map_border_z, 0, 10)?;
        check_i32("region_border", config.region_border, 0, 10)?;
        check_i32("region_count", config.region_count, 1, 4)?;
        check_i32("erosion_percentage", config.erosion_percentage, 0, 100)?;
        check_f32("starting_moisture", config.starting_moisture, 0.0, 1.0)?;
        check_f32("evaporation_factor", config.evaporation_factor, 0.0, 1.0)?;
        check_f32("precipitation_factor", config.precipitation_factor, 0.0, 1.0)?;
        check_f32("runoff_factor", config.runoff_factor, 0.0, 1.0)?;
        check_f32("seepage_factor", config.seepage_factor, 0.0, 1.0)?;
        check_f32("wind_strength", config.wind_strength, 1.0, 10.0)?;
        check_i32("river_percentage", config.river_percentage, 0, 20)?;
        check_f32("extra_lake_probability", config.extra_lake_probability, 0.0, 1.0)?;
        check_f32("low_temperature", config.low_temperature, 0.0, 1.0)?;
        check_f32("high_temperature", config.high_temperature, 0.0, 1.0)?;
        if config.low_temperature > config.high_temperature {
            return Err(HexMapError::InvalidConfig(format!(
                "low_temperature ({}) must not exceed high_temperature ({})",
                config.low_temperature, config.high_temperature
            )));
        }
        check_f32("temperature_jitter", config.temperature_jitter, 0.0, 1.0)?;

        Ok(config)
    }
}

impl Default for MapConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn check_i32(name: &str, value: i32, min: i32, max: i32) -> Result<()> {
    if value < min || value > max {
        return Err(HexMapError::InvalidConfig(format!(
            "{} must be in [{}, {}] (got {})",
            name, min, max, value
        )));
    }
    Ok(())
}

fn check_f32(name: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(HexMapError::InvalidConfig(format!(
            "{} must be in [{}, {}] (got {})",
            name, min, max, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_are_valid() {
        let config = MapConfigBuilder::new().build().unwrap();
        assert_eq!(config.land_percentage, 40);
        assert_eq!(config.water_level, 3);
        assert_eq!(config.wind_direction, HexDirection::NW);
        assert_eq!(config.hemisphere, Hemisphere::Both);
    }

    #[test]
    fn builder_applies_settings() {
        let config = MapConfigBuilder::new()
            .seed(7)
            .land_percentage(80)
            .region_count(3)
            .hemisphere(Hemisphere::North)
            .build()
            .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.land_percentage, 80);
        assert_eq!(config.region_count, 3);
        assert_eq!(config.hemisphere, Hemisphere::North);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(MapConfigBuilder::new().land_percentage(4).build().is_err());
        assert!(MapConfigBuilder::new().water_level(0).build().is_err());
        assert!(MapConfigBuilder::new().sink_probability(0.5).build().is_err());
        assert!(MapConfigBuilder::new().region_count(5).build().is_err());
        assert!(MapConfigBuilder::new()
            .chunk_size_min(90)
            .chunk_size_max(50)
            .build()
            .is_err());
        assert!(MapConfigBuilder::new()
            .low_temperature(0.8)
            .high_temperature(0.2)
            .build()
            .is_err());
    }

    #[test]
    fn unseeded_builds_get_a_seed() {
        let a = MapConfigBuilder::new().build().unwrap();
        let b = MapConfigBuilder::new().build().unwrap();
        // Astronomically unlikely to collide
        assert_ne!(a.seed, b.seed);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_round_trips_through_json() {
        let config = MapConfigBuilder::new().seed(12345).build().unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let restored: MapConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }
}
