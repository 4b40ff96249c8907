//! Biome classification
//!
//! Land cells get a (terrain, plant) pair from a temperature x moisture
//! table; underwater cells get a terrain from depth and shoreline shape.

use rand::Rng;

use crate::config::Hemisphere;
use crate::grid::HexDirection;
use crate::noise;

use super::GenerationRun;

// Terrain type indices as the default texture array orders them
const SAND: u8 = 0;
const GRASS: u8 = 1;
const MUD: u8 = 2;
const STONE: u8 = 3;
const SNOW: u8 = 4;

const TEMPERATURE_BANDS: [f32; 3] = [0.1, 0.3, 0.6];
const MOISTURE_BANDS: [f32; 3] = [0.12, 0.28, 0.85];

#[derive(Debug, Clone, Copy)]
struct Biome {
    terrain: u8,
    plant: u8,
}

const fn biome(terrain: u8, plant: u8) -> Biome {
    Biome { terrain, plant }
}

// Rows are temperature bands cold to hot, columns moisture bands dry to wet
#[rustfmt::skip]
const BIOMES: [Biome; 16] = [
    biome(SAND, 0), biome(SNOW, 0),  biome(SNOW, 0),  biome(SNOW, 0),
    biome(SAND, 0), biome(MUD, 0),   biome(MUD, 1),   biome(MUD, 2),
    biome(SAND, 0), biome(GRASS, 0), biome(GRASS, 1), biome(GRASS, 2),
    biome(SAND, 0), biome(GRASS, 1), biome(GRASS, 2), biome(GRASS, 3),
];

impl GenerationRun<'_> {
    pub(super) fn set_terrain_types(&mut self) {
        let config = self.config;
        self.temperature_jitter_channel = self.rng.gen_range(0..4);
        // Bare sand this high up reads as rock desert instead
        let rock_desert_elevation =
            config.elevation_maximum - (config.elevation_maximum - config.water_level) / 2;

        for i in 0..self.grid.cell_count() {
            let temperature = self.determine_temperature(i);
            let moisture = self.climate[i].moisture;
            let cell = self.grid.cell(i);

            if !cell.is_underwater() {
                let t = TEMPERATURE_BANDS
                    .iter()
                    .position(|&band| temperature < band)
                    .unwrap_or(TEMPERATURE_BANDS.len());
                let m = MOISTURE_BANDS
                    .iter()
                    .position(|&band| moisture < band)
                    .unwrap_or(MOISTURE_BANDS.len());
                let mut cell_biome = BIOMES[t * 4 + m];

                if cell_biome.terrain == SAND {
                    if cell.elevation() >= rock_desert_elevation {
                        cell_biome.terrain = STONE;
                    }
                } else if cell.elevation() == config.elevation_maximum {
                    cell_biome.terrain = SNOW;
                }

                if cell_biome.terrain == SNOW {
                    cell_biome.plant = 0;
                } else if cell_biome.plant < 3 && cell.has_river() {
                    cell_biome.plant += 1;
                }

                self.grid.set_terrain_type_index(i, cell_biome.terrain);
                self.grid.set_plant_level(i, cell_biome.plant);
            } else {
                let terrain = if cell.elevation() == config.water_level - 1 {
                    // Shallows: count how the shoreline meets the water
                    let mut cliffs = 0;
                    let mut slopes = 0;
                    for direction in HexDirection::ALL {
                        let Some(neighbor) = self.grid.neighbor(i, direction) else {
                            continue;
                        };
                        let delta =
                            self.grid.cell(neighbor).elevation() - cell.water_level();
                        if delta == 0 {
                            slopes += 1;
                        } else if delta > 0 {
                            cliffs += 1;
                        }
                    }
                    if cliffs + slopes > 3 {
                        GRASS
                    } else if cliffs > 0 {
                        STONE
                    } else if slopes > 0 {
                        SAND
                    } else {
                        GRASS
                    }
                } else if cell.elevation() >= config.water_level {
                    GRASS
                } else if cell.elevation() < 0 {
                    STONE
                } else {
                    MUD
                };

                // Cold shallows read as mud flats, not drowned grass
                let terrain = if terrain == GRASS && temperature < TEMPERATURE_BANDS[0] {
                    MUD
                } else {
                    terrain
                };
                self.grid.set_terrain_type_index(i, terrain);
            }
        }
    }

    fn determine_temperature(&self, cell_index: usize) -> f32 {
        let config = self.config;
        let cell = self.grid.cell(cell_index);

        let mut latitude = cell.coordinates().z() as f32 / self.grid.cell_count_z() as f32;
        match config.hemisphere {
            Hemisphere::Both => {
                latitude *= 2.0;
                if latitude > 1.0 {
                    latitude = 2.0 - latitude;
                }
            }
            Hemisphere::North => latitude = 1.0 - latitude,
            Hemisphere::South => {}
        }

        let mut temperature = config.low_temperature
            + (config.high_temperature - config.low_temperature) * latitude;

        temperature *= 1.0
            - (cell.view_elevation() - config.water_level) as f32
                / (config.elevation_maximum - config.water_level + 1) as f32;

        let jitter = noise::sample(cell.position() * 0.1, self.grid.wrap_size())
            [self.temperature_jitter_channel];
        temperature + (jitter * 2.0 - 1.0) * config.temperature_jitter
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{Hemisphere, MapConfigBuilder};
    use crate::generator::MapGenerator;

    #[test]
    fn classification_stays_in_the_terrain_table() {
        let config = MapConfigBuilder::new().seed(8).build().unwrap();
        let grid = MapGenerator::new(config).generate(40, 30, false).unwrap();
        for cell in grid.cells() {
            assert!(cell.terrain_type_index() <= 4);
            assert!(cell.plant_level() <= 3);
            if cell.is_underwater() {
                // Plants never classify underwater
                assert_eq!(cell.plant_level(), 0);
            }
        }
    }

    #[test]
    fn snow_caps_carry_no_plants() {
        let config = MapConfigBuilder::new().seed(16).land_percentage(80).build().unwrap();
        let grid = MapGenerator::new(config).generate(40, 30, false).unwrap();
        for cell in grid.cells() {
            if cell.terrain_type_index() == 4 && !cell.is_underwater() {
                assert_eq!(cell.plant_level(), 0);
            }
        }
    }

    #[test]
    fn north_hemisphere_is_warm_at_the_south_edge() {
        let config = MapConfigBuilder::new()
            .seed(13)
            .hemisphere(Hemisphere::North)
            .temperature_jitter(0.0)
            .build()
            .unwrap();
        let grid = MapGenerator::new(config).generate(40, 30, false).unwrap();

        // Compare sea-level temperature proxies: snow should never appear
        // in the warmest southern band of land cells
        let count_z = grid.cell_count_z();
        for cell in grid.cells() {
            if cell.coordinates().z() < count_z / 8
                && !cell.is_underwater()
                && cell.elevation() < config.elevation_maximum
            {
                assert_ne!(cell.terrain_type_index(), 4);
            }
        }
    }
}
