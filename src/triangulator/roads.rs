//! Road geometry
//!
//! Roads ride on top of the terrain as textured strips through the cell
//! center. Cells that also carry a river need special handling so the road
//! keeps clear of the channel: bridges across straight rivers, offsets
//! around zig-zags, pruning inside curves and anchoring outside them.

use glam::{Vec2, Vec3};

use crate::features::FeaturePlacer;
use crate::grid::{EdgeVertices, HexCell, HexDirection, HexGrid};
use crate::metrics::{self, INNER_TO_OUTER};

use super::{ChunkTriangulator, WEIGHTS1};

// How far from the center the road's middle vertices sit: halfway out when
// a road continues on that side, a quarter otherwise.
pub(super) fn road_interpolators(cell: &HexCell, direction: HexDirection) -> Vec2 {
    if cell.has_road_through_edge(direction) {
        Vec2::new(0.5, 0.5)
    } else {
        Vec2::new(
            if cell.has_road_through_edge(direction.previous()) {
                0.5
            } else {
                0.25
            },
            if cell.has_road_through_edge(direction.next()) {
                0.5
            } else {
                0.25
            },
        )
    }
}

impl ChunkTriangulator {
    pub(super) fn triangulate_road(
        &mut self,
        center: Vec3,
        m_l: Vec3,
        m_r: Vec3,
        e: &EdgeVertices,
        has_road_through_cell_edge: bool,
        index: f32,
    ) {
        if has_road_through_cell_edge {
            let indices = Vec3::splat(index);
            let m_c = m_l.lerp(m_r, 0.5);
            self.triangulate_road_segment(m_l, m_c, m_r, e.v2, e.v3, e.v4, WEIGHTS1, WEIGHTS1, indices);

            self.roads.add_triangle(center, m_l, m_c);
            self.roads.add_triangle(center, m_c, m_r);
            // U is 1 at the road center, 0 at its edge
            self.roads.add_triangle_uv(
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
            );
            self.roads.add_triangle_uv(
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 0.0),
            );
            self.roads.add_triangle_cell_data_uniform(indices, WEIGHTS1);
            self.roads.add_triangle_cell_data_uniform(indices, WEIGHTS1);
        } else {
            self.triangulate_road_edge(center, m_l, m_r, index);
        }
    }

    // The tapering sliver where a road-bearing cell meets an edge without a
    // road
    pub(super) fn triangulate_road_edge(&mut self, center: Vec3, m_l: Vec3, m_r: Vec3, index: f32) {
        self.roads.add_triangle(center, m_l, m_r);
        self.roads.add_triangle_uv(
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 0.0),
        );
        let indices = Vec3::splat(index);
        self.roads.add_triangle_cell_data_uniform(indices, WEIGHTS1);
    }

    // Two-quad road strip between the middle line and the cell edge
    #[allow(clippy::too_many_arguments)]
    pub(super) fn triangulate_road_segment(
        &mut self,
        v1: Vec3,
        v2: Vec3,
        v3: Vec3,
        v4: Vec3,
        v5: Vec3,
        v6: Vec3,
        w1: Vec3,
        w2: Vec3,
        indices: Vec3,
    ) {
        self.roads.add_quad(v1, v2, v4, v5);
        self.roads.add_quad(v2, v3, v5, v6);
        self.roads.add_quad_uv_rect(0.0, 1.0, 0.0, 0.0);
        self.roads.add_quad_uv_rect(1.0, 0.0, 0.0, 0.0);
        self.roads.add_quad_cell_data_pair(indices, w1, w2);
        self.roads.add_quad_cell_data_pair(indices, w1, w2);
    }

    // Roads sharing a cell with a river: relocate the road center away
    // from the channel, prune stubs the river cuts off, and span bridges
    // where a road crosses the water.
    pub(super) fn triangulate_road_adjacent_to_river<F: FeaturePlacer>(
        &mut self,
        grid: &HexGrid,
        direction: HexDirection,
        cell_id: usize,
        center: Vec3,
        e: &EdgeVertices,
        features: &mut F,
    ) {
        let cell = grid.cell(cell_id);
        let has_road_through_edge = cell.has_road_through_edge(direction);
        let previous_has_river = cell.has_river_through_edge(direction.previous());
        let next_has_river = cell.has_river_through_edge(direction.next());
        let interpolators = road_interpolators(cell, direction);

        let mut road_center = center;
        let mut center = center;

        if cell.has_river_begin_or_end() {
            // Push the road away from the river mouth
            let river_direction = cell
                .river_begin_or_end_direction()
                .expect("river endpoint cell must record its direction");
            road_center +=
                metrics::solid_edge_middle(river_direction.opposite()) * (1.0 / 3.0);
        } else {
            let incoming = cell
                .incoming_river()
                .expect("river cell without endpoint has both directions");
            let outgoing = cell
                .outgoing_river()
                .expect("river cell without endpoint has both directions");

            if incoming == outgoing.opposite() {
                // Straight river: the road splits into two halves
                let corner = if previous_has_river {
                    if !has_road_through_edge
                        && !cell.has_road_through_edge(direction.next())
                    {
                        return;
                    }
                    metrics::second_solid_corner(direction)
                } else {
                    if !has_road_through_edge
                        && !cell.has_road_through_edge(direction.previous())
                    {
                        return;
                    }
                    metrics::first_solid_corner(direction)
                };
                road_center += corner * 0.5;
                // One bridge per cell, placed from the edge matching the
                // incoming flow when a road continues on the far side
                if incoming == direction.next()
                    && (cell.has_road_through_edge(direction.next2())
                        || cell.has_road_through_edge(direction.opposite()))
                {
                    features.add_bridge(road_center, center - corner * 0.5);
                }
                center += corner * 0.25;
            } else if incoming == outgoing.previous() {
                // Zig-zag: dodge by the shared corner
                road_center -= metrics::second_corner(incoming) * 0.2;
            } else if incoming == outgoing.next() {
                road_center -= metrics::first_corner(incoming) * 0.2;
            } else if previous_has_river && next_has_river {
                // Inside of a curve: drop isolated stubs, squeeze the rest
                if !has_road_through_edge {
                    return;
                }
                let offset = metrics::solid_edge_middle(direction) * INNER_TO_OUTER;
                road_center += offset * 0.7;
                center += offset * 0.5;
            } else {
                // Outside of a curve: anchor toward the open side
                let middle = if previous_has_river {
                    direction.next()
                } else if next_has_river {
                    direction.previous()
                } else {
                    direction
                };
                if !cell.has_road_through_edge(middle)
                    && !cell.has_road_through_edge(middle.previous())
                    && !cell.has_road_through_edge(middle.next())
                {
                    return;
                }
                let offset = metrics::solid_edge_middle(middle);
                road_center += offset * 0.25;
                if direction == middle && cell.has_road_through_edge(direction.opposite()) {
                    features.add_bridge(
                        road_center,
                        center - offset * (INNER_TO_OUTER * 0.7),
                    );
                }
            }
        }

        let m_l = road_center.lerp(e.v1, interpolators.x);
        let m_r = road_center.lerp(e.v5, interpolators.y);
        let index = cell_id as f32;
        self.triangulate_road(road_center, m_l, m_r, e, has_road_through_edge, index);

        // Close the gaps toward the relocated cell center
        if previous_has_river {
            self.triangulate_road_edge(road_center, center, m_l, index);
        }
        if next_has_river {
            self.triangulate_road_edge(road_center, m_r, center, index);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::features::{NullFeatures, RecordingFeatures};
    use crate::grid::{HexDirection, HexGrid};
    use crate::triangulator::ChunkTriangulator;

    fn grid_with_center() -> (HexGrid, usize) {
        let grid = HexGrid::new(5, 5, false).unwrap();
        let cell = grid.cell_index_at_offset(2, 2).unwrap();
        (grid, cell)
    }

    #[test]
    fn road_through_edge_emits_segments_with_uvs() {
        let (mut grid, cell) = grid_with_center();
        grid.add_road(cell, HexDirection::E);
        grid.add_road(cell, HexDirection::W);

        let mut triangulator = ChunkTriangulator::for_grid(&grid);
        triangulator.triangulate(&grid, &[cell], &mut NullFeatures);

        assert!(!triangulator.roads.is_empty());
        assert_eq!(
            triangulator.roads.uvs.len(),
            triangulator.roads.vertex_count()
        );
        // Road UVs only use the center/edge U axis
        assert!(triangulator.roads.uvs.iter().all(|uv| uv.y == 0.0));
    }

    #[test]
    fn roadless_cell_emits_no_road_geometry() {
        let (grid, cell) = grid_with_center();
        let mut triangulator = ChunkTriangulator::for_grid(&grid);
        triangulator.triangulate(&grid, &[cell], &mut NullFeatures);
        assert!(triangulator.roads.is_empty());
    }

    #[test]
    fn straight_river_with_crossing_road_places_one_bridge() {
        let (mut grid, cell) = grid_with_center();
        for i in 0..grid.cell_count() {
            grid.set_elevation(i, 2);
        }
        // Straight river NE -> SW through the center
        let upstream = grid.neighbor(cell, HexDirection::NE).unwrap();
        grid.set_outgoing_river(upstream, HexDirection::SW);
        grid.set_outgoing_river(cell, HexDirection::SW);
        // Road crossing it E <-> W
        grid.add_road(cell, HexDirection::E);
        grid.add_road(cell, HexDirection::W);

        let mut triangulator = ChunkTriangulator::for_grid(&grid);
        let mut features = RecordingFeatures::default();
        triangulator.triangulate(&grid, &[cell], &mut features);

        assert!(!triangulator.roads.is_empty());
        assert_eq!(features.bridges.len(), 1);
    }
}
