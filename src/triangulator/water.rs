//! Water surfaces: open water, shorelines, estuaries and waterfalls
//!
//! Submerged cells triangulate a second surface at their water level. Open
//! water connects submerged neighbors; a shore ribbon bridges to dry
//! neighbors, with the V coordinate running 0 (water) to 1 (land); where a
//! river crosses the shoreline the ribbon is replaced by an estuary blend.

use glam::{Vec2, Vec3};

use crate::grid::{EdgeVertices, HexDirection, HexGrid};
use crate::metrics::{self, INNER_DIAMETER};
use crate::noise;

use super::{ChunkTriangulator, WEIGHTS1, WEIGHTS2, WEIGHTS3};

impl ChunkTriangulator {
    pub(super) fn triangulate_water(
        &mut self,
        grid: &HexGrid,
        direction: HexDirection,
        cell_id: usize,
        center: Vec3,
    ) {
        let cell = grid.cell(cell_id);
        let mut center = center;
        center.y = cell.water_surface_y();

        let neighbor = grid.neighbor(cell_id, direction);
        match neighbor {
            Some(n) if !grid.cell(n).is_underwater() => {
                self.triangulate_water_shore(grid, direction, cell_id, n, center);
            }
            _ => self.triangulate_open_water(grid, direction, cell_id, neighbor, center),
        }
    }

    fn triangulate_open_water(
        &mut self,
        grid: &HexGrid,
        direction: HexDirection,
        cell_id: usize,
        neighbor: Option<usize>,
        center: Vec3,
    ) {
        let c1 = center + metrics::first_water_corner(direction);
        let c2 = center + metrics::second_water_corner(direction);

        self.water.add_triangle(center, c1, c2);
        let mut indices = Vec3::splat(cell_id as f32);
        self.water.add_triangle_cell_data_uniform(indices, WEIGHTS1);

        // One bridge quad per submerged pair, owned by the earlier
        // direction
        let Some(neighbor) = neighbor else {
            return;
        };
        if direction <= HexDirection::SE {
            let bridge = metrics::water_bridge(direction);
            let e1 = c1 + bridge;
            let e2 = c2 + bridge;

            self.water.add_quad(c1, c2, e1, e2);
            indices.y = neighbor as f32;
            self.water
                .add_quad_cell_data_pair(indices, WEIGHTS1, WEIGHTS2);

            // And one corner triangle per submerged triple
            if direction <= HexDirection::E {
                let Some(next_neighbor) = grid.neighbor(cell_id, direction.next()) else {
                    return;
                };
                if !grid.cell(next_neighbor).is_underwater() {
                    return;
                }
                self.water
                    .add_triangle(c2, e2, c2 + metrics::water_bridge(direction.next()));
                indices.z = next_neighbor as f32;
                self.water
                    .add_triangle_cell_data(indices, WEIGHTS1, WEIGHTS2, WEIGHTS3);
            }
        }
    }

    fn triangulate_water_shore(
        &mut self,
        grid: &HexGrid,
        direction: HexDirection,
        cell_id: usize,
        neighbor: usize,
        center: Vec3,
    ) {
        let cell = grid.cell(cell_id);
        let neighbor_cell = grid.cell(neighbor);

        // The water side is perturbed like everything else, so shore quads
        // need the full five-vertex edge to stay crack-free
        let e1 = EdgeVertices::new(
            center + metrics::first_water_corner(direction),
            center + metrics::second_water_corner(direction),
        );
        self.water.add_triangle(center, e1.v1, e1.v2);
        self.water.add_triangle(center, e1.v2, e1.v3);
        self.water.add_triangle(center, e1.v3, e1.v4);
        self.water.add_triangle(center, e1.v4, e1.v5);

        let mut indices = Vec3::new(cell_id as f32, neighbor as f32, cell_id as f32);
        self.water.add_triangle_cell_data_uniform(indices, WEIGHTS1);
        self.water.add_triangle_cell_data_uniform(indices, WEIGHTS1);
        self.water.add_triangle_cell_data_uniform(indices, WEIGHTS1);
        self.water.add_triangle_cell_data_uniform(indices, WEIGHTS1);

        // The land-side edge comes from the neighbor's frame; on wrapping
        // maps a neighbor across the seam reports a far-away column and its
        // center must be shifted one wrap period over
        let mut center2 = neighbor_cell.position();
        if neighbor_cell.column_index() < cell.column_index() - 1 {
            center2.x += self.wrap_size as f32 * INNER_DIAMETER;
        } else if neighbor_cell.column_index() > cell.column_index() + 1 {
            center2.x -= self.wrap_size as f32 * INNER_DIAMETER;
        }
        center2.y = center.y;
        let e2 = EdgeVertices::new(
            center2 + metrics::second_solid_corner(direction.opposite()),
            center2 + metrics::first_solid_corner(direction.opposite()),
        );

        if cell.has_river_through_edge(direction) {
            self.triangulate_estuary(
                &e1,
                &e2,
                cell.incoming_river() == Some(direction),
                indices,
            );
        } else {
            self.water_shore.add_quad(e1.v1, e1.v2, e2.v1, e2.v2);
            self.water_shore.add_quad(e1.v2, e1.v3, e2.v2, e2.v3);
            self.water_shore.add_quad(e1.v3, e1.v4, e2.v3, e2.v4);
            self.water_shore.add_quad(e1.v4, e1.v5, e2.v4, e2.v5);

            // V runs 0 on the water side to 1 on land
            self.water_shore.add_quad_uv_rect(0.0, 0.0, 0.0, 1.0);
            self.water_shore.add_quad_uv_rect(0.0, 0.0, 0.0, 1.0);
            self.water_shore.add_quad_uv_rect(0.0, 0.0, 0.0, 1.0);
            self.water_shore.add_quad_uv_rect(0.0, 0.0, 0.0, 1.0);
            self.water_shore
                .add_quad_cell_data_pair(indices, WEIGHTS1, WEIGHTS2);
            self.water_shore
                .add_quad_cell_data_pair(indices, WEIGHTS1, WEIGHTS2);
            self.water_shore
                .add_quad_cell_data_pair(indices, WEIGHTS1, WEIGHTS2);
            self.water_shore
                .add_quad_cell_data_pair(indices, WEIGHTS1, WEIGHTS2);
        }

        if let Some(next_neighbor) = grid.neighbor(cell_id, direction.next()) {
            let next_cell = grid.cell(next_neighbor);
            let mut center3 = next_cell.position();
            if next_cell.column_index() < cell.column_index() - 1 {
                center3.x += self.wrap_size as f32 * INNER_DIAMETER;
            } else if next_cell.column_index() > cell.column_index() + 1 {
                center3.x -= self.wrap_size as f32 * INNER_DIAMETER;
            }
            // The corner vertex uses the water frame when the third cell is
            // submerged, the solid frame when it is land
            let mut v3 = center3
                + if next_cell.is_underwater() {
                    metrics::first_water_corner(direction.previous())
                } else {
                    metrics::first_solid_corner(direction.previous())
                };
            v3.y = center.y;

            self.water_shore.add_triangle(e1.v5, e2.v5, v3);
            self.water_shore.add_triangle_uv(
                Vec2::new(0.0, 0.0),
                Vec2::new(0.0, 1.0),
                Vec2::new(0.0, if next_cell.is_underwater() { 0.0 } else { 1.0 }),
            );
            indices.z = next_neighbor as f32;
            self.water_shore
                .add_triangle_cell_data(indices, WEIGHTS1, WEIGHTS2, WEIGHTS3);
        }
    }

    // Mirrored trapezoid fans blending river flow into shore water. The
    // UV2 tables are hand-placed so the shader can run the river texture
    // out (or in) through the estuary.
    fn triangulate_estuary(
        &mut self,
        e1: &EdgeVertices,
        e2: &EdgeVertices,
        incoming_river: bool,
        indices: Vec3,
    ) {
        self.water_shore.add_triangle(e2.v1, e1.v2, e1.v1);
        self.water_shore.add_triangle(e2.v5, e1.v5, e1.v4);
        self.water_shore.add_triangle_uv(
            Vec2::new(0.0, 1.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 0.0),
        );
        self.water_shore.add_triangle_uv(
            Vec2::new(0.0, 1.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 0.0),
        );
        self.water_shore
            .add_triangle_cell_data(indices, WEIGHTS2, WEIGHTS1, WEIGHTS1);
        self.water_shore
            .add_triangle_cell_data(indices, WEIGHTS2, WEIGHTS1, WEIGHTS1);

        self.estuaries.add_quad(e2.v1, e1.v2, e2.v2, e1.v3);
        self.estuaries.add_triangle(e1.v3, e2.v2, e2.v4);
        self.estuaries.add_quad(e1.v3, e1.v4, e2.v4, e2.v5);

        self.estuaries.add_quad_uv(
            Vec2::new(0.0, 1.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 0.0),
        );
        self.estuaries.add_triangle_uv(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 1.0),
        );
        self.estuaries.add_quad_uv(
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        );

        self.estuaries
            .add_quad_cell_data(indices, WEIGHTS2, WEIGHTS1, WEIGHTS2, WEIGHTS1);
        self.estuaries
            .add_triangle_cell_data(indices, WEIGHTS1, WEIGHTS2, WEIGHTS2);
        self.estuaries
            .add_quad_cell_data_pair(indices, WEIGHTS1, WEIGHTS2);

        if incoming_river {
            self.estuaries.add_quad_uv2(
                Vec2::new(1.5, 1.0),
                Vec2::new(0.7, 1.15),
                Vec2::new(1.0, 0.8),
                Vec2::new(0.5, 1.1),
            );
            self.estuaries.add_triangle_uv2(
                Vec2::new(0.5, 1.1),
                Vec2::new(1.0, 0.8),
                Vec2::new(0.0, 0.8),
            );
            self.estuaries.add_quad_uv2(
                Vec2::new(0.5, 1.1),
                Vec2::new(0.3, 1.15),
                Vec2::new(0.0, 0.8),
                Vec2::new(-0.5, 1.0),
            );
        } else {
            self.estuaries.add_quad_uv2(
                Vec2::new(-0.5, -0.2),
                Vec2::new(0.3, -0.35),
                Vec2::new(0.0, 0.0),
                Vec2::new(0.5, -0.3),
            );
            self.estuaries.add_triangle_uv2(
                Vec2::new(0.5, -0.3),
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
            );
            self.estuaries.add_quad_uv2(
                Vec2::new(0.5, -0.3),
                Vec2::new(0.7, -0.35),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.5, -0.2),
            );
        }
    }

    // Waterfall wedge: a river quad whose already-perturbed lower edge is
    // clamped up to the receiving water surface, emitted raw so the clamp
    // survives.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn triangulate_waterfall_in_water(
        &mut self,
        mut v1: Vec3,
        mut v2: Vec3,
        mut v3: Vec3,
        mut v4: Vec3,
        y1: f32,
        y2: f32,
        water_y: f32,
        indices: Vec3,
    ) {
        v1.y = y1;
        v2.y = y1;
        v3.y = y2;
        v4.y = y2;
        let v1 = noise::perturb(v1, self.wrap_size);
        let v2 = noise::perturb(v2, self.wrap_size);
        let mut v3 = noise::perturb(v3, self.wrap_size);
        let mut v4 = noise::perturb(v4, self.wrap_size);

        let t = (water_y - y2) / (y1 - y2);
        v3 = v3.lerp(v1, t);
        v4 = v4.lerp(v2, t);

        self.rivers.add_quad_unperturbed(v1, v2, v3, v4);
        self.rivers.add_quad_uv_rect(0.0, 1.0, 0.8, 1.0);
        self.rivers
            .add_quad_cell_data_pair(indices, WEIGHTS1, WEIGHTS2);
    }
}

#[cfg(test)]
mod tests {
    use crate::features::NullFeatures;
    use crate::grid::{HexDirection, HexGrid};
    use crate::triangulator::ChunkTriangulator;

    fn shore_setup() -> (HexGrid, usize) {
        let mut grid = HexGrid::new(5, 5, false).unwrap();
        let cell = grid.cell_index_at_offset(2, 2).unwrap();
        // Only the center cell is submerged
        for i in 0..grid.cell_count() {
            grid.set_elevation(i, 1);
        }
        grid.set_elevation(cell, 0);
        for i in 0..grid.cell_count() {
            grid.set_water_level(i, 1);
        }
        (grid, cell)
    }

    #[test]
    fn submerged_cell_next_to_land_builds_a_shore_ribbon() {
        let (grid, cell) = shore_setup();
        let mut triangulator = ChunkTriangulator::for_grid(&grid);
        triangulator.triangulate(&grid, &[cell], &mut NullFeatures);

        assert!(!triangulator.water.is_empty());
        assert!(!triangulator.water_shore.is_empty());
        assert!(triangulator.estuaries.is_empty());

        // The ribbon carries the 0 (water) to 1 (land) V convention and
        // nothing in between on quad vertices
        assert!(!triangulator.water_shore.uvs.is_empty());
        assert!(triangulator.water_shore.uvs.iter().any(|uv| uv.y == 0.0));
        assert!(triangulator.water_shore.uvs.iter().any(|uv| uv.y == 1.0));
        assert!(triangulator
            .water_shore
            .uvs
            .iter()
            .all(|uv| uv.y == 0.0 || uv.y == 1.0));
    }

    #[test]
    fn river_into_water_builds_an_estuary_instead_of_shore_quads() {
        let (mut grid, cell) = shore_setup();
        // A river from the NE neighbor terminating in the water cell
        let upstream = grid.neighbor(cell, HexDirection::NE).unwrap();
        grid.set_outgoing_river(upstream, HexDirection::SW);
        assert!(grid.cell(cell).has_incoming_river());

        let mut triangulator = ChunkTriangulator::for_grid(&grid);
        triangulator.triangulate(&grid, &[cell], &mut NullFeatures);

        assert!(!triangulator.estuaries.is_empty());
        // Estuary UV2 rows exist for every estuary vertex
        assert_eq!(
            triangulator.estuaries.uv2s.len(),
            triangulator.estuaries.vertex_count()
        );
    }

    #[test]
    fn waterfall_forms_where_a_river_drops_into_water() {
        let mut grid = HexGrid::new(5, 5, false).unwrap();
        let cell = grid.cell_index_at_offset(2, 2).unwrap();
        let downstream = grid.neighbor(cell, HexDirection::SE).unwrap();
        for i in 0..grid.cell_count() {
            grid.set_elevation(i, 3);
        }
        // A deep pool two levels below the river cell
        grid.set_elevation(downstream, 0);
        grid.set_water_level(downstream, 1);
        grid.set_outgoing_river(cell, HexDirection::SE);

        let mut triangulator = ChunkTriangulator::for_grid(&grid);
        triangulator.triangulate(&grid, &[cell], &mut NullFeatures);

        // The river buffer holds the channel quads plus the waterfall
        // wedge; the wedge uses the 0.8..1 V band
        assert!(!triangulator.rivers.is_empty());
        assert!(triangulator
            .rivers
            .uvs
            .iter()
            .any(|uv| uv.y == 0.8 || uv.y == 1.0));
    }
}
