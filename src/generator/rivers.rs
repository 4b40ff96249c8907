//! River carving
//!
//! Origins are drawn from a weighted list favoring wet, high cells; each
//! river then runs greedily downhill, merging into rivers it meets and
//! pooling into a lake when it gets stuck.

use rand::Rng;

use crate::grid::HexDirection;

use super::GenerationRun;

impl GenerationRun<'_> {
    pub(super) fn create_rivers(&mut self) {
        let config = self.config;
        let mut river_origins: Vec<usize> = Vec::new();
        for i in 0..self.grid.cell_count() {
            let cell = self.grid.cell(i);
            if cell.is_underwater() {
                continue;
            }
            // Quartile-banded weighting: up to four list entries per cell
            let weight = self.climate[i].moisture
                * (cell.elevation() - config.water_level) as f32
                / (config.elevation_maximum - config.water_level) as f32;
            if weight > 0.75 {
                river_origins.push(i);
                river_origins.push(i);
            }
            if weight > 0.5 {
                river_origins.push(i);
            }
            if weight > 0.25 {
                river_origins.push(i);
            }
        }

        let mut river_budget =
            (self.land_cells as f32 * config.river_percentage as f32 * 0.01).round() as i32;
        while river_budget > 0 && !river_origins.is_empty() {
            let index = self.rng.gen_range(0..river_origins.len());
            let origin = river_origins.swap_remove(index);

            if self.grid.cell(origin).has_river() {
                continue;
            }
            let touches_water_or_river = HexDirection::ALL.iter().any(|&direction| {
                self.grid.neighbor(origin, direction).is_some_and(|n| {
                    self.grid.cell(n).has_river() || self.grid.cell(n).is_underwater()
                })
            });
            if !touches_water_or_river {
                river_budget -= self.create_river(origin);
            }
        }

        if river_budget > 0 {
            log::warn!("failed to use up {} river budget", river_budget);
        }
    }

    // Carve one river from `origin`, returning how many cells it spans.
    // A zero-length attempt found no viable first step and is discarded.
    fn create_river(&mut self, origin: usize) -> i32 {
        let config = self.config;
        let mut flow_directions: Vec<HexDirection> = Vec::new();
        let mut length = 1;
        let mut cell = origin;
        let mut direction = HexDirection::NE;

        while !self.grid.cell(cell).is_underwater() {
            let cell_elevation = self.grid.cell(cell).elevation();
            let mut min_neighbor_elevation = i32::MAX;
            flow_directions.clear();

            for d in HexDirection::ALL {
                let Some(neighbor) = self.grid.neighbor(cell, d) else {
                    continue;
                };
                let neighbor_cell = self.grid.cell(neighbor);
                if neighbor_cell.elevation() < min_neighbor_elevation {
                    min_neighbor_elevation = neighbor_cell.elevation();
                }
                if neighbor == origin || neighbor_cell.has_incoming_river() {
                    continue;
                }
                let delta = neighbor_cell.elevation() - cell_elevation;
                if delta > 0 {
                    continue;
                }
                if neighbor_cell.has_outgoing_river() {
                    // Confluence: join the existing river and stop
                    self.grid.set_outgoing_river(cell, d);
                    return length;
                }
                // Downhill is heavily favored; gentle curves beat sharp
                // turns. The 3/2/1 ratios define the river shapes.
                if delta < 0 {
                    flow_directions.push(d);
                    flow_directions.push(d);
                    flow_directions.push(d);
                }
                if length == 1 || (d != direction.next2() && d != direction.previous2()) {
                    flow_directions.push(d);
                }
                flow_directions.push(d);
            }

            if flow_directions.is_empty() {
                if length == 1 {
                    return 0;
                }
                if min_neighbor_elevation >= cell_elevation {
                    // Nowhere to go: pool into a lake
                    self.grid.set_water_level(cell, min_neighbor_elevation);
                    if min_neighbor_elevation == cell_elevation {
                        self.grid.set_elevation(cell, min_neighbor_elevation - 1);
                    }
                }
                break;
            }

            direction = flow_directions[self.rng.gen_range(0..flow_directions.len())];
            self.grid.set_outgoing_river(cell, direction);
            length += 1;

            if min_neighbor_elevation >= self.grid.cell(cell).elevation()
                && self.rng.gen::<f32>() < config.extra_lake_probability
            {
                let elevation = self.grid.cell(cell).elevation();
                self.grid.set_water_level(cell, elevation);
                self.grid.set_elevation(cell, elevation - 1);
            }

            cell = self
                .grid
                .neighbor(cell, direction)
                .expect("river stepped off the grid");
        }
        length
    }
}

#[cfg(test)]
mod tests {
    use crate::config::MapConfigBuilder;
    use crate::generator::MapGenerator;
    use crate::grid::HexGrid;

    fn generate(seed: u64) -> HexGrid {
        let config = MapConfigBuilder::new()
            .seed(seed)
            .river_percentage(15)
            .build()
            .unwrap();
        MapGenerator::new(config).generate(40, 30, false).unwrap()
    }

    #[test]
    fn rivers_never_cycle_and_end_in_water_or_lakes() {
        let mut found_river = false;
        for seed in [123, 124, 125] {
            let grid = generate(seed);
            for start in 0..grid.cell_count() {
                if !grid.cell(start).has_outgoing_river() {
                    continue;
                }
                found_river = true;
                let mut visited = vec![false; grid.cell_count()];
                let mut cell = start;
                loop {
                    assert!(!visited[cell], "river revisited cell {}", cell);
                    visited[cell] = true;
                    match grid.cell(cell).outgoing_river() {
                        Some(direction) => {
                            cell = grid
                                .neighbor(cell, direction)
                                .expect("river ran off the map");
                        }
                        // Chains stop underwater (ocean or lake) or at a
                        // stranded endpoint left by later terrain edits
                        None => break,
                    }
                }
            }
        }
        assert!(found_river, "expected at least one river across seeds");
    }

    #[test]
    fn river_endpoints_pair_up() {
        let grid = generate(321);
        for id in 0..grid.cell_count() {
            let cell = grid.cell(id);
            if let Some(direction) = cell.outgoing_river() {
                let neighbor = grid.neighbor(id, direction).unwrap();
                assert_eq!(
                    grid.cell(neighbor).incoming_river(),
                    Some(direction.opposite())
                );
            }
            if let Some(direction) = cell.incoming_river() {
                let neighbor = grid.neighbor(id, direction).unwrap();
                assert_eq!(
                    grid.cell(neighbor).outgoing_river(),
                    Some(direction.opposite())
                );
            }
        }
    }

    #[test]
    fn rivers_never_flow_uphill() {
        let grid = generate(55);
        for id in 0..grid.cell_count() {
            if let Some(direction) = grid.cell(id).outgoing_river() {
                let neighbor = grid.neighbor(id, direction).unwrap();
                let cell = grid.cell(id);
                let downhill = cell.elevation() >= grid.cell(neighbor).elevation()
                    || cell.water_level() == grid.cell(neighbor).elevation();
                assert!(downhill, "river flows uphill out of cell {}", id);
            }
        }
    }
}
