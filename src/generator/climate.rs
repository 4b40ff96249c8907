//! Climate simulation
//!
//! An iterative cellular pass moves moisture between cells as evaporation,
//! clouds, precipitation, runoff and seepage. The result feeds river
//! placement and biome classification; the buffers are discarded with the
//! run.

use crate::grid::HexDirection;

use super::GenerationRun;

/// Number of simulation cycles; enough for moisture to reach a stable
/// distribution at the default factors
const CLIMATE_CYCLES: usize = 40;

/// Transient per-cell climate state, double-buffered across cycles
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct ClimateData {
    pub clouds: f32,
    pub moisture: f32,
}

impl GenerationRun<'_> {
    pub(super) fn create_climate(&mut self) {
        let cell_count = self.grid.cell_count();
        self.climate.clear();
        self.next_climate.clear();
        let initial = ClimateData {
            clouds: 0.0,
            moisture: self.config.starting_moisture,
        };
        self.climate.resize(cell_count, initial);
        self.next_climate.resize(cell_count, ClimateData::default());

        for _ in 0..CLIMATE_CYCLES {
            for cell_index in 0..cell_count {
                self.evolve_climate(cell_index);
            }
            std::mem::swap(&mut self.climate, &mut self.next_climate);
        }
    }

    fn evolve_climate(&mut self, cell_index: usize) {
        let config = self.config;
        let is_underwater = self.grid.cell(cell_index).is_underwater();
        let view_elevation = self.grid.cell(cell_index).view_elevation();
        let mut cell_climate = self.climate[cell_index];

        if is_underwater {
            // Open water saturates and feeds the sky
            cell_climate.moisture = 1.0;
            cell_climate.clouds += config.evaporation_factor;
        } else {
            let evaporation = cell_climate.moisture * config.evaporation_factor;
            cell_climate.moisture -= evaporation;
            cell_climate.clouds += evaporation;
        }

        let precipitation = cell_climate.clouds * config.precipitation_factor;
        cell_climate.clouds -= precipitation;
        cell_climate.moisture += precipitation;

        // Thin air over high ground holds fewer clouds; the excess rains out
        let cloud_maximum = 1.0 - view_elevation as f32 / (config.elevation_maximum as f32 + 1.0);
        if cell_climate.clouds > cloud_maximum {
            cell_climate.moisture += cell_climate.clouds - cloud_maximum;
            cell_climate.clouds = cloud_maximum;
        }

        let main_dispersal_direction = config.wind_direction.opposite();
        let cloud_dispersal = cell_climate.clouds * (1.0 / (5.0 + config.wind_strength));
        let runoff = cell_climate.moisture * config.runoff_factor * (1.0 / 6.0);
        let seepage = cell_climate.moisture * config.seepage_factor * (1.0 / 6.0);

        for direction in HexDirection::ALL {
            let Some(neighbor) = self.grid.neighbor(cell_index, direction) else {
                // Map edges swallow their share of the clouds
                continue;
            };
            let mut neighbor_climate = self.next_climate[neighbor];
            if direction == main_dispersal_direction {
                neighbor_climate.clouds += cloud_dispersal * config.wind_strength;
            } else {
                neighbor_climate.clouds += cloud_dispersal;
            }

            let elevation_delta = self.grid.cell(neighbor).view_elevation() - view_elevation;
            if elevation_delta < 0 {
                cell_climate.moisture -= runoff;
                neighbor_climate.moisture += runoff;
            } else if elevation_delta == 0 {
                cell_climate.moisture -= seepage;
                neighbor_climate.moisture += seepage;
            }
            self.next_climate[neighbor] = neighbor_climate;
        }

        let next_cell_climate = &mut self.next_climate[cell_index];
        next_cell_climate.moisture += cell_climate.moisture;
        if next_cell_climate.moisture > 1.0 {
            next_cell_climate.moisture = 1.0;
        }
        // Clouds all dispersed; the cell starts the next cycle clean
        self.climate[cell_index] = ClimateData::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfigBuilder;
    use crate::grid::HexGrid;
    use crate::search::CellPriorityQueue;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn moisture_ends_saturated_under_water_and_bounded_on_land() {
        let config = MapConfigBuilder::new().seed(31).build().unwrap();
        let mut grid = HexGrid::new(20, 20, false).unwrap();
        for i in 0..grid.cell_count() {
            grid.set_water_level(i, config.water_level);
        }
        // A dry plateau in the east half
        for z in 0..20 {
            for x in 10..20 {
                let id = grid.cell_index_at_offset(x, z).unwrap();
                grid.set_elevation(id, config.water_level + 1);
            }
        }

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
        run.create_climate();

        for (i, data) in run.climate.iter().enumerate() {
            // The saturation cap applies when a cell folds its moisture
            // into the next buffer; inflow arriving after that can nudge a
            // cell slightly past it, so allow a small overshoot.
            assert!(
                (0.0..=1.4).contains(&data.moisture),
                "cell {} moisture {} out of range",
                i,
                data.moisture
            );
            // Water keeps itself and its surroundings wet; only outflow to
            // neighbors can pull a submerged cell below full saturation
            if run.grid.cell(i).is_underwater() {
                assert!(data.moisture > 0.5);
            }
        }
        // Moisture blew inland off the water: the shore column of the
        // plateau must be wetter than it started
        let shore = run.grid.cell_index_at_offset(10, 10).unwrap();
        assert!(run.climate[shore].moisture > config.starting_moisture);
    }
}
