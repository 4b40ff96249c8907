//! Procedural map generation
//!
//! One [`MapGenerator::generate`] call runs the full pipeline over a fresh
//! grid: region layout, land raising/sinking, erosion, climate simulation,
//! river carving and biome assignment, in that strict order. The run owns a
//! private seeded generator, so callers never share random state with it.

mod biomes;
mod climate;
mod rivers;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::MapConfig;
use crate::error::Result;
use crate::grid::{HexDirection, HexGrid};
use crate::search::CellPriorityQueue;

use climate::ClimateData;

/// Procedural map generator
///
/// ```
/// use hex_terrain::{MapConfigBuilder, MapGenerator};
///
/// let config = MapConfigBuilder::new().seed(42).build().unwrap();
/// let grid = MapGenerator::new(config).generate(40, 30, false).unwrap();
/// assert_eq!(grid.cell_count(), 1200);
/// ```
#[derive(Debug, Clone)]
pub struct MapGenerator {
    config: MapConfig,
}

impl MapGenerator {
    pub fn new(config: MapConfig) -> MapGenerator {
        MapGenerator { config }
    }

    #[inline]
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Generate a map. Budget shortfalls (land or rivers that could not be
    /// placed) are logged and accepted, never errors.
    pub fn generate(&self, width: i32, height: i32, wrapping: bool) -> Result<HexGrid> {
        let mut grid = HexGrid::new(width, height, wrapping)?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        GenerationRun {
            config: &self.config,
            grid: &mut grid,
            rng: &mut rng,
            frontier: CellPriorityQueue::new(),
            search_phase: 0,
            land_cells: 0,
            regions: Vec::new(),
            climate: Vec::new(),
            next_climate: Vec::new(),
            temperature_jitter_channel: 0,
        }
        .run()?;
        Ok(grid)
    }
}

/// Rectangular sub-bound of the grid that land placement is confined to
#[derive(Debug, Clone, Copy)]
struct MapRegion {
    x_min: i32,
    x_max: i32,
    z_min: i32,
    z_max: i32,
}

// State for a single generation run. The frontier queue and the phase
// counter implement the shared search bookkeeping; climate buffers are
// double-buffered and discarded with the run.
struct GenerationRun<'a> {
    config: &'a MapConfig,
    grid: &'a mut HexGrid,
    rng: &'a mut ChaCha8Rng,
    frontier: CellPriorityQueue,
    search_phase: u32,
    land_cells: i32,
    regions: Vec<MapRegion>,
    climate: Vec<ClimateData>,
    next_climate: Vec<ClimateData>,
    temperature_jitter_channel: usize,
}

impl GenerationRun<'_> {
    fn run(mut self) -> Result<()> {
        let cell_count = self.grid.cell_count();
        for i in 0..cell_count {
            self.grid.set_water_level(i, self.config.water_level);
        }

        self.create_regions();
        self.create_land()?;
        self.erode_land();
        self.create_climate();
        self.create_rivers();
        self.set_terrain_types();

        for i in 0..cell_count {
            self.grid.cell_mut(i).search_phase = 0;
        }
        log::debug!(
            "generated {}x{} map, {} of {} cells land",
            self.grid.cell_count_x(),
            self.grid.cell_count_z(),
            self.land_cells,
            cell_count
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Region layout
    // ------------------------------------------------------------------

    fn create_regions(&mut self) {
        self.regions.clear();
        let config = self.config;
        let count_x = self.grid.cell_count_x();
        let count_z = self.grid.cell_count_z();
        // Wrapping maps have no natural east/west edge; a symmetric wrap
        // border stands in for the map border there.
        let mut border_x = if self.grid.wrapping() {
            config.region_border
        } else {
            config.map_border_x
        };

        match config.region_count {
            2 => {
                if self.rng.gen::<f32>() < 0.5 {
                    // West and east halves
                    self.regions.push(MapRegion {
                        x_min: border_x,
                        x_max: count_x / 2 - config.region_border,
                        z_min: config.map_border_z,
                        z_max: count_z - config.map_border_z,
                    });
                    self.regions.push(MapRegion {
                        x_min: count_x / 2 + config.region_border,
                        x_max: count_x - border_x,
                        z_min: config.map_border_z,
                        z_max: count_z - config.map_border_z,
                    });
                } else {
                    // South and north halves span the full width
                    if self.grid.wrapping() {
                        border_x = 0;
                    }
                    self.regions.push(MapRegion {
                        x_min: border_x,
                        x_max: count_x - border_x,
                        z_min: config.map_border_z,
                        z_max: count_z / 2 - config.region_border,
                    });
                    self.regions.push(MapRegion {
                        x_min: border_x,
                        x_max: count_x - border_x,
                        z_min: count_z / 2 + config.region_border,
                        z_max: count_z - config.map_border_z,
                    });
                }
            }
            3 => {
                let z_min = config.map_border_z;
                let z_max = count_z - config.map_border_z;
                self.regions.push(MapRegion {
                    x_min: config.map_border_x,
                    x_max: count_x / 3 - config.region_border,
                    z_min,
                    z_max,
                });
                self.regions.push(MapRegion {
                    x_min: count_x / 3 - config.region_border,
                    x_max: count_x * 2 / 3 + config.region_border,
                    z_min,
                    z_max,
                });
                self.regions.push(MapRegion {
                    x_min: count_x * 2 / 3 + config.region_border,
                    x_max: count_x - config.map_border_x,
                    z_min,
                    z_max,
                });
            }
            4 => {
                self.regions.push(MapRegion {
                    x_min: config.map_border_x,
                    x_max: count_x / 2 - config.region_border,
                    z_min: config.map_border_z,
                    z_max: count_z / 2 - config.region_border,
                });
                self.regions.push(MapRegion {
                    x_min: count_x / 2 + config.region_border,
                    x_max: count_x - config.map_border_x,
                    z_min: config.map_border_z,
                    z_max: count_z / 2 - config.region_border,
                });
                self.regions.push(MapRegion {
                    x_min: count_x / 2 + config.region_border,
                    x_max: count_x - config.map_border_x,
                    z_min: count_z / 2 + config.region_border,
                    z_max: count_z - config.map_border_z,
                });
                self.regions.push(MapRegion {
                    x_min: config.map_border_x,
                    x_max: count_x / 2 - config.region_border,
                    z_min: count_z / 2 + config.region_border,
                    z_max: count_z - config.map_border_z,
                });
            }
            _ => {
                if self.grid.wrapping() {
                    border_x = 0;
                }
                self.regions.push(MapRegion {
                    x_min: border_x,
                    x_max: count_x - border_x,
                    z_min: config.map_border_z,
                    z_max: count_z - config.map_border_z,
                });
            }
        }
    }

    // Random cell inside a region. Degenerate bounds collapse to their
    // minimum so narrow maps still generate.
    fn random_cell(&mut self, region: MapRegion) -> usize {
        let x = if region.x_min < region.x_max {
            self.rng.gen_range(region.x_min..region.x_max)
        } else {
            region.x_min
        };
        let z = if region.z_min < region.z_max {
            self.rng.gen_range(region.z_min..region.z_max)
        } else {
            region.z_min
        };
        self.grid
            .cell_index_at_offset(x, z)
            .expect("region bounds lie inside the grid")
    }

    // ------------------------------------------------------------------
    // Land budget raising/sinking
    // ------------------------------------------------------------------

    fn create_land(&mut self) -> Result<()> {
        let cell_count = self.grid.cell_count();
        let mut land_budget =
            (cell_count as f32 * self.config.land_percentage as f32 * 0.01).round() as i32;
        self.land_cells = land_budget;

        for _guard in 0..10_000 {
            let sink = self.rng.gen::<f32>() < self.config.sink_probability;
            for region_index in 0..self.regions.len() {
                let region = self.regions[region_index];
                let chunk_size = self
                    .rng
                    .gen_range(self.config.chunk_size_min..self.config.chunk_size_max);
                if sink {
                    land_budget = self.sink_terrain(chunk_size, land_budget, region)?;
                } else {
                    land_budget = self.raise_terrain(chunk_size, land_budget, region)?;
                    if land_budget == 0 {
                        return Ok(());
                    }
                }
            }
        }
        if land_budget > 0 {
            log::warn!("failed to use up {} land budget", land_budget);
            self.land_cells -= land_budget;
        }
        Ok(())
    }

    fn raise_terrain(&mut self, chunk_size: i32, mut budget: i32, region: MapRegion) -> Result<i32> {
        self.search_phase += 1;
        let phase = self.search_phase;
        let first_cell = self.random_cell(region);
        {
            let cell = self.grid.cell_mut(first_cell);
            cell.search_phase = phase;
            cell.distance = 0;
            cell.search_heuristic = 0;
        }
        self.frontier.enqueue(first_cell, 0);
        let center = self.grid.cell(first_cell).coordinates();
        let wrap_size = self.grid.wrap_size();

        let rise = if self.rng.gen::<f32>() < self.config.high_rise_probability {
            2
        } else {
            1
        };
        let mut size = 0;
        while size < chunk_size && !self.frontier.is_empty() {
            let current = self.frontier.dequeue()?;
            let original_elevation = self.grid.cell(current).elevation();
            let new_elevation = original_elevation + rise;
            if new_elevation > self.config.elevation_maximum {
                // Out of range: skip without growing through this cell
                continue;
            }
            self.grid.set_elevation(current, new_elevation);
            if original_elevation < self.config.water_level
                && new_elevation >= self.config.water_level
            {
                budget -= 1;
                if budget == 0 {
                    break;
                }
            }
            size += 1;

            for direction in HexDirection::ALL {
                let Some(neighbor) = self.grid.neighbor(current, direction) else {
                    continue;
                };
                if self.grid.cell(neighbor).search_phase() < phase {
                    let distance = self
                        .grid
                        .cell(neighbor)
                        .coordinates()
                        .distance_to(center, wrap_size);
                    let heuristic = if self.rng.gen::<f32>() < self.config.jitter_probability {
                        1
                    } else {
                        0
                    };
                    let cell = self.grid.cell_mut(neighbor);
                    cell.search_phase = phase;
                    cell.distance = distance;
                    cell.search_heuristic = heuristic;
                    self.frontier.enqueue(neighbor, distance + heuristic);
                }
            }
        }
        self.frontier.clear();
        Ok(budget)
    }

    fn sink_terrain(&mut self, chunk_size: i32, mut budget: i32, region: MapRegion) -> Result<i32> {
        self.search_phase += 1;
        let phase = self.search_phase;
        let first_cell = self.random_cell(region);
        {
            let cell = self.grid.cell_mut(first_cell);
            cell.search_phase = phase;
            cell.distance = 0;
            cell.search_heuristic = 0;
        }
        self.frontier.enqueue(first_cell, 0);
        let center = self.grid.cell(first_cell).coordinates();
        let wrap_size = self.grid.wrap_size();

        let sink = if self.rng.gen::<f32>() < self.config.high_rise_probability {
            2
        } else {
            1
        };
        let mut size = 0;
        while size < chunk_size && !self.frontier.is_empty() {
            let current = self.frontier.dequeue()?;
            let original_elevation = self.grid.cell(current).elevation();
            let new_elevation = original_elevation - sink;
            if new_elevation < self.config.elevation_minimum {
                continue;
            }
            self.grid.set_elevation(current, new_elevation);
            if original_elevation >= self.config.water_level
                && new_elevation < self.config.water_level
            {
                // A land cell went under; the budget gets it back
                budget += 1;
            }
            size += 1;

            for direction in HexDirection::ALL {
                let Some(neighbor) = self.grid.neighbor(current, direction) else {
                    continue;
                };
                if self.grid.cell(neighbor).search_phase() < phase {
                    let distance = self
                        .grid
                        .cell(neighbor)
                        .coordinates()
                        .distance_to(center, wrap_size);
                    let heuristic = if self.rng.gen::<f32>() < self.config.jitter_probability {
                        1
                    } else {
                        0
                    };
                    let cell = self.grid.cell_mut(neighbor);
                    cell.search_phase = phase;
                    cell.distance = distance;
                    cell.search_heuristic = heuristic;
                    self.frontier.enqueue(neighbor, distance + heuristic);
                }
            }
        }
        self.frontier.clear();
        Ok(budget)
    }

    // ------------------------------------------------------------------
    // Erosion
    // ------------------------------------------------------------------

    fn erode_land(&mut self) {
        let mut erodible: Vec<usize> = (0..self.grid.cell_count())
            .filter(|&i| self.is_erodible(i))
            .collect();
        let target_count =
            (erodible.len() as f32 * (100 - self.config.erosion_percentage) as f32 * 0.01) as usize;

        while erodible.len() > target_count {
            let index = self.rng.gen_range(0..erodible.len());
            let cell = erodible[index];
            let target = self.erosion_target(cell);

            self.grid.set_elevation(cell, self.grid.cell(cell).elevation() - 1);
            self.grid
                .set_elevation(target, self.grid.cell(target).elevation() + 1);

            if !self.is_erodible(cell) {
                erodible.swap_remove(index);
            }

            // Lowering the cell may have freshly exposed its uphill
            // neighbors
            for direction in HexDirection::ALL {
                if let Some(neighbor) = self.grid.neighbor(cell, direction) {
                    if self.grid.cell(neighbor).elevation()
                        == self.grid.cell(cell).elevation() + 2
                        && !erodible.contains(&neighbor)
                    {
                        erodible.push(neighbor);
                    }
                }
            }

            if self.is_erodible(target) && !erodible.contains(&target) {
                erodible.push(target);
            }

            // Raising the target may have buried some of its neighbors
            for direction in HexDirection::ALL {
                if let Some(neighbor) = self.grid.neighbor(target, direction) {
                    if neighbor != cell
                        && self.grid.cell(neighbor).elevation()
                            == self.grid.cell(target).elevation() + 1
                        && !self.is_erodible(neighbor)
                    {
                        if let Some(position) = erodible.iter().position(|&c| c == neighbor) {
                            erodible.remove(position);
                        }
                    }
                }
            }
        }
    }

    fn is_erodible(&self, cell: usize) -> bool {
        let erodible_elevation = self.grid.cell(cell).elevation() - 2;
        HexDirection::ALL.iter().any(|&direction| {
            self.grid
                .neighbor(cell, direction)
                .is_some_and(|n| self.grid.cell(n).elevation() <= erodible_elevation)
        })
    }

    fn erosion_target(&mut self, cell: usize) -> usize {
        let erodible_elevation = self.grid.cell(cell).elevation() - 2;
        let candidates: Vec<usize> = HexDirection::ALL
            .iter()
            .filter_map(|&direction| self.grid.neighbor(cell, direction))
            .filter(|&n| self.grid.cell(n).elevation() <= erodible_elevation)
            .collect();
        assert!(
            !candidates.is_empty(),
            "erosion target requested for a non-erodible cell"
        );
        candidates[self.rng.gen_range(0..candidates.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfigBuilder;

    fn generate(seed: u64) -> HexGrid {
        let config = MapConfigBuilder::new().seed(seed).build().unwrap();
        MapGenerator::new(config).generate(40, 30, false).unwrap()
    }

    #[test]
    fn underwater_matches_water_level_and_elevation_bounds_hold() {
        let config = MapConfigBuilder::new().seed(9).build().unwrap();
        let grid = MapGenerator::new(config).generate(40, 30, false).unwrap();
        for cell in grid.cells() {
            assert_eq!(cell.is_underwater(), cell.water_level() > cell.elevation());
            assert!(cell.elevation() >= config.elevation_minimum);
            assert!(cell.elevation() <= config.elevation_maximum);
        }
    }

    #[test]
    fn fixed_seed_reproduces_the_same_map() {
        let a = generate(77);
        let b = generate(77);
        for (ca, cb) in a.cells().iter().zip(b.cells()) {
            assert_eq!(ca.elevation(), cb.elevation());
            assert_eq!(ca.water_level(), cb.water_level());
            assert_eq!(ca.terrain_type_index(), cb.terrain_type_index());
            assert_eq!(ca.plant_level(), cb.plant_level());
            assert_eq!(ca.incoming_river(), cb.incoming_river());
            assert_eq!(ca.outgoing_river(), cb.outgoing_river());
        }
    }

    #[test]
    fn different_seeds_give_different_maps() {
        let a = generate(1);
        let b = generate(2);
        let differing = a
            .cells()
            .iter()
            .zip(b.cells())
            .filter(|(ca, cb)| ca.elevation() != cb.elevation())
            .count();
        assert!(differing > 0);
    }

    #[test]
    fn land_fraction_lands_near_the_requested_percentage() {
        let config = MapConfigBuilder::new()
            .seed(5)
            .land_percentage(40)
            .build()
            .unwrap();
        let grid = MapGenerator::new(config).generate(40, 30, false).unwrap();
        let land = grid.cells().iter().filter(|c| !c.is_underwater()).count();
        let fraction = land as f32 / grid.cell_count() as f32;
        // Sinking after the budget is spent can only remove land, and the
        // guard accepts shortfalls, so only a loose band is guaranteed.
        assert!(
            (0.2..=0.6).contains(&fraction),
            "land fraction {} far from target",
            fraction
        );
    }

    #[test]
    fn search_phases_are_reset_after_generation() {
        let grid = generate(3);
        assert!(grid.cells().iter().all(|c| c.search_phase() == 0));
    }

    #[test]
    fn wrapping_maps_generate() {
        let config = MapConfigBuilder::new().seed(11).build().unwrap();
        let grid = MapGenerator::new(config).generate(40, 30, true).unwrap();
        assert!(grid.wrapping());
        assert!(grid.cells().iter().any(|c| !c.is_underwater()));
    }

    #[test]
    fn erosion_moves_but_conserves_total_elevation() {
        let config = MapConfigBuilder::new().seed(21).build().unwrap();
        let mut grid = HexGrid::new(20, 20, false).unwrap();
        // A steep spike in a flat plain
        let peak = grid.cell_index_at_offset(10, 10).unwrap();
        grid.set_elevation(peak, 6);
        let total_before: i32 = grid.cells().iter().map(|c| c.elevation()).sum();

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut run = GenerationRun {
            config: &config,
            grid: &mut grid,
            rng: &mut rng,
            frontier: CellPriorityQueue::new(),
            search_phase: 0,
            land_cells: 0,
            regions: Vec::new(),
            climate: Vec::new(),
            next_climate: Vec::new(),
            temperature_jitter_channel: 0,
        };
        run.erode_land();

        let total_after: i32 = grid.cells().iter().map(|c| c.elevation()).sum();
        assert_eq!(total_before, total_after);
        assert!(grid.cell(peak).elevation() < 6);
    }
}
