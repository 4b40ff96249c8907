//! Chunk triangulation
//!
//! Rebuilds six render surfaces (terrain, rivers, roads, water, water
//! shore, estuaries) from finalized cell state. Each cell is processed
//! independently in index order; per edge direction the work dispatches on
//! the cell's river configuration, then inter-cell connections and corner
//! triangles are resolved once per pair/triple.
//!
//! Everything emitted here runs through the deterministic perturbation
//! noise (except geometry whose heights are already exact), so separately
//! triangulated chunks meet without cracks.

mod roads;
mod water;

use glam::{Vec2, Vec3};

use crate::features::FeaturePlacer;
use crate::grid::{EdgeVertices, HexCell, HexDirection, HexEdgeType, HexGrid};
use crate::mesh::{MeshBuffer, MeshChannels};
use crate::metrics::{self, INNER_TO_OUTER, TERRACE_STEPS};
use crate::noise;

// The three blend-weight channels; which cell each belongs to is carried
// alongside in the cell-index triple.
const WEIGHTS1: Vec3 = Vec3::X;
const WEIGHTS2: Vec3 = Vec3::Y;
const WEIGHTS3: Vec3 = Vec3::Z;

/// River configuration of one cell edge, computed once per direction and
/// dispatched by pattern match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellEdgeState {
    /// No river anywhere on the cell
    Plain,
    /// A river passes through this edge
    RiverThrough,
    /// The cell's river begins or ends at this edge
    RiverEnd,
    /// The cell has a river, but not through this edge
    RiverAdjacent,
}

fn cell_edge_state(cell: &HexCell, direction: HexDirection) -> CellEdgeState {
    if !cell.has_river() {
        CellEdgeState::Plain
    } else if !cell.has_river_through_edge(direction) {
        CellEdgeState::RiverAdjacent
    } else if cell.has_river_begin_or_end() {
        CellEdgeState::RiverEnd
    } else {
        CellEdgeState::RiverThrough
    }
}

/// Rebuilds one chunk's six mesh buffers from cell state
///
/// ```
/// use hex_terrain::{ChunkTriangulator, HexGrid, NullFeatures};
///
/// let grid = HexGrid::new(10, 10, false).unwrap();
/// let mut triangulator = ChunkTriangulator::for_grid(&grid);
/// triangulator.triangulate(&grid, &grid.chunk_cells(0, 0), &mut NullFeatures);
/// assert!(!triangulator.terrain.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ChunkTriangulator {
    wrap_size: i32,
    pub terrain: MeshBuffer,
    pub rivers: MeshBuffer,
    pub roads: MeshBuffer,
    pub water: MeshBuffer,
    pub water_shore: MeshBuffer,
    pub estuaries: MeshBuffer,
}

impl ChunkTriangulator {
    /// Create a triangulator for a map with the given wrap period (in
    /// cells; 0 for non-wrapping maps)
    pub fn new(wrap_size: i32) -> ChunkTriangulator {
        let cell_data = MeshChannels {
            cell_data: true,
            ..Default::default()
        };
        let cell_data_uv = MeshChannels {
            cell_data: true,
            uv: true,
            ..Default::default()
        };
        ChunkTriangulator {
            wrap_size,
            terrain: MeshBuffer::new(
                MeshChannels {
                    collider: true,
                    cell_data: true,
                    ..Default::default()
                },
                wrap_size,
            ),
            rivers: MeshBuffer::new(cell_data_uv, wrap_size),
            roads: MeshBuffer::new(cell_data_uv, wrap_size),
            water: MeshBuffer::new(cell_data, wrap_size),
            water_shore: MeshBuffer::new(cell_data_uv, wrap_size),
            estuaries: MeshBuffer::new(
                MeshChannels {
                    cell_data: true,
                    uv: true,
                    uv2: true,
                    ..Default::default()
                },
                wrap_size,
            ),
        }
    }

    /// Create a triangulator matching a grid's wrap configuration
    pub fn for_grid(grid: &HexGrid) -> ChunkTriangulator {
        Self::new(grid.wrap_size())
    }

    /// Rebuild all buffers for a set of cells (typically one chunk)
    pub fn triangulate<F: FeaturePlacer>(
        &mut self,
        grid: &HexGrid,
        cells: &[usize],
        features: &mut F,
    ) {
        self.terrain.clear();
        self.rivers.clear();
        self.roads.clear();
        self.water.clear();
        self.water_shore.clear();
        self.estuaries.clear();

        for &cell in cells {
            self.triangulate_cell(grid, cell, features);
        }

        self.terrain.apply();
        self.rivers.apply();
        self.roads.apply();
        self.water.apply();
        self.water_shore.apply();
        self.estuaries.apply();
    }

    /// Emit one cell's geometry into the current pass
    pub fn triangulate_cell<F: FeaturePlacer>(
        &mut self,
        grid: &HexGrid,
        cell_id: usize,
        features: &mut F,
    ) {
        for direction in HexDirection::ALL {
            self.triangulate_direction(grid, direction, cell_id, features);
        }
        let cell = grid.cell(cell_id);
        if !cell.is_underwater() {
            if !cell.has_river() && !cell.has_roads() {
                features.add_feature(cell_id, cell.position());
            }
            if cell.is_special() {
                features.add_special_feature(cell_id, cell.position());
            }
        }
    }

    fn triangulate_direction<F: FeaturePlacer>(
        &mut self,
        grid: &HexGrid,
        direction: HexDirection,
        cell_id: usize,
        features: &mut F,
    ) {
        let cell = grid.cell(cell_id);
        let center = cell.position();
        let mut e = EdgeVertices::new(
            center + metrics::first_solid_corner(direction),
            center + metrics::second_solid_corner(direction),
        );

        match cell_edge_state(cell, direction) {
            CellEdgeState::RiverThrough => {
                e.v3.y = cell.stream_bed_y();
                self.triangulate_with_river(grid, direction, cell_id, center, &e);
            }
            CellEdgeState::RiverEnd => {
                e.v3.y = cell.stream_bed_y();
                self.triangulate_with_river_begin_or_end(grid, cell_id, center, &e);
            }
            CellEdgeState::RiverAdjacent => {
                self.triangulate_adjacent_to_river(grid, direction, cell_id, center, &e, features);
            }
            CellEdgeState::Plain => {
                self.triangulate_without_river(grid, direction, cell_id, center, &e);
                if !cell.is_underwater() && !cell.has_road_through_edge(direction) {
                    features.add_feature(cell_id, (center + e.v1 + e.v5) * (1.0 / 3.0));
                }
            }
        }

        // Connections are shared between cell pairs; the earlier directions
        // cover each pair exactly once
        if direction <= HexDirection::SE {
            self.triangulate_connection(grid, direction, cell_id, &e, features);
        }

        if cell.is_underwater() {
            self.triangulate_water(grid, direction, cell_id, center);
        }
    }

    fn triangulate_without_river(
        &mut self,
        grid: &HexGrid,
        direction: HexDirection,
        cell_id: usize,
        center: Vec3,
        e: &EdgeVertices,
    ) {
        self.triangulate_edge_fan(center, e, cell_id as f32);

        let cell = grid.cell(cell_id);
        if cell.has_roads() {
            let interpolators = roads::road_interpolators(cell, direction);
            self.triangulate_road(
                center,
                center.lerp(e.v1, interpolators.x),
                center.lerp(e.v5, interpolators.y),
                e,
                cell.has_road_through_edge(direction),
                cell_id as f32,
            );
        }
    }

    // A river crosses this edge and continues elsewhere: carve the channel
    // through the cell interior.
    fn triangulate_with_river(
        &mut self,
        grid: &HexGrid,
        direction: HexDirection,
        cell_id: usize,
        center: Vec3,
        e: &EdgeVertices,
    ) {
        let cell = grid.cell(cell_id);

        // The channel's two banks inside the cell depend on where the river
        // goes next: straight across, a gentle curve, or a sharp bend.
        let (center_l, center_r) = if cell.has_river_through_edge(direction.opposite()) {
            (
                center + metrics::first_solid_corner(direction.previous()) * 0.25,
                center + metrics::second_solid_corner(direction.next()) * 0.25,
            )
        } else if cell.has_river_through_edge(direction.next()) {
            (center, center.lerp(e.v5, 2.0 / 3.0))
        } else if cell.has_river_through_edge(direction.previous()) {
            (center.lerp(e.v1, 2.0 / 3.0), center)
        } else if cell.has_river_through_edge(direction.next2()) {
            (
                center,
                center + metrics::solid_edge_middle(direction.next()) * (0.5 * INNER_TO_OUTER),
            )
        } else {
            (
                center + metrics::solid_edge_middle(direction.previous()) * (0.5 * INNER_TO_OUTER),
                center,
            )
        };
        let mut center = center_l.lerp(center_r, 0.5);

        let mut m = EdgeVertices::with_outer_step(
            center_l.lerp(e.v1, 0.5),
            center_r.lerp(e.v5, 0.5),
            1.0 / 6.0,
        );
        // The middle of the channel drops to the stream bed
        m.v3.y = e.v3.y;
        center.y = e.v3.y;

        let index = cell_id as f32;
        self.triangulate_edge_strip(&m, WEIGHTS1, index, e, WEIGHTS1, index, false);

        self.terrain.add_triangle(center_l, m.v1, m.v2);
        self.terrain.add_quad(center_l, center, m.v2, m.v3);
        self.terrain.add_quad(center, center_r, m.v3, m.v4);
        self.terrain.add_triangle(center_r, m.v4, m.v5);

        let indices = Vec3::splat(index);
        self.terrain.add_triangle_cell_data_uniform(indices, WEIGHTS1);
        self.terrain.add_quad_cell_data_uniform(indices, WEIGHTS1);
        self.terrain.add_quad_cell_data_uniform(indices, WEIGHTS1);
        self.terrain.add_triangle_cell_data_uniform(indices, WEIGHTS1);

        if !cell.is_underwater() {
            let reversed = cell.incoming_river() == Some(direction);
            let surface = cell.river_surface_y();
            self.triangulate_river_quad(
                center_l, center_r, m.v2, m.v4, surface, surface, 0.4, reversed, indices,
            );
            self.triangulate_river_quad(
                m.v2, m.v4, e.v2, e.v4, surface, surface, 0.6, reversed, indices,
            );
        }
    }

    // The river starts or ends here: a shortened channel capped at the
    // center.
    fn triangulate_with_river_begin_or_end(
        &mut self,
        grid: &HexGrid,
        cell_id: usize,
        center: Vec3,
        e: &EdgeVertices,
    ) {
        let cell = grid.cell(cell_id);
        let index = cell_id as f32;

        let mut m = EdgeVertices::new(center.lerp(e.v1, 0.5), center.lerp(e.v5, 0.5));
        m.v3.y = e.v3.y;

        self.triangulate_edge_strip(&m, WEIGHTS1, index, e, WEIGHTS1, index, false);
        self.triangulate_edge_fan(center, &m, index);

        if !cell.is_underwater() {
            let reversed = cell.has_incoming_river();
            let indices = Vec3::splat(index);
            let surface = cell.river_surface_y();
            self.triangulate_river_quad(
                m.v2, m.v4, e.v2, e.v4, surface, surface, 0.6, reversed, indices,
            );

            // The cap between center and middle: the center vertex sits
            // mid-river, so its U is always one half
            let mut center = center;
            let mut m = m;
            center.y = surface;
            m.v2.y = surface;
            m.v4.y = surface;
            self.rivers.add_triangle(center, m.v2, m.v4);
            if reversed {
                self.rivers.add_triangle_uv(
                    Vec2::new(0.5, 0.4),
                    Vec2::new(1.0, 0.2),
                    Vec2::new(0.0, 0.2),
                );
            } else {
                self.rivers.add_triangle_uv(
                    Vec2::new(0.5, 0.4),
                    Vec2::new(0.0, 0.6),
                    Vec2::new(1.0, 0.6),
                );
            }
            self.rivers.add_triangle_cell_data_uniform(indices, WEIGHTS1);
        }
    }

    // The cell has a river, but not through this edge: shift the fan center
    // away from the channel so the fan never overlaps it.
    fn triangulate_adjacent_to_river<F: FeaturePlacer>(
        &mut self,
        grid: &HexGrid,
        direction: HexDirection,
        cell_id: usize,
        center: Vec3,
        e: &EdgeVertices,
        features: &mut F,
    ) {
        let cell = grid.cell(cell_id);

        if cell.has_roads() {
            self.triangulate_road_adjacent_to_river(grid, direction, cell_id, center, e, features);
        }

        let mut center = center;
        if cell.has_river_through_edge(direction.next()) {
            if cell.has_river_through_edge(direction.previous()) {
                // Inside of a curve: nudge straight toward the edge
                center += metrics::solid_edge_middle(direction) * (INNER_TO_OUTER * 0.5);
            } else if cell.has_river_through_edge(direction.previous2()) {
                center += metrics::first_solid_corner(direction) * 0.25;
            }
        } else if cell.has_river_through_edge(direction.previous())
            && cell.has_river_through_edge(direction.next2())
        {
            center += metrics::second_solid_corner(direction) * 0.25;
        }

        let index = cell_id as f32;
        let m = EdgeVertices::new(center.lerp(e.v1, 0.5), center.lerp(e.v5, 0.5));

        self.triangulate_edge_strip(&m, WEIGHTS1, index, e, WEIGHTS1, index, false);
        self.triangulate_edge_fan(center, &m, index);

        if !cell.is_underwater() && !cell.has_road_through_edge(direction) {
            features.add_feature(cell_id, (center + e.v1 + e.v5) * (1.0 / 3.0));
        }
    }

    // ------------------------------------------------------------------
    // Connections and corners
    // ------------------------------------------------------------------

    fn triangulate_connection<F: FeaturePlacer>(
        &mut self,
        grid: &HexGrid,
        direction: HexDirection,
        cell_id: usize,
        e1: &EdgeVertices,
        features: &mut F,
    ) {
        let Some(neighbor) = grid.neighbor(cell_id, direction) else {
            return;
        };
        let cell = grid.cell(cell_id);
        let neighbor_cell = grid.cell(neighbor);
        let index1 = cell_id as f32;
        let index2 = neighbor as f32;

        let mut bridge = metrics::bridge(direction);
        bridge.y = neighbor_cell.position().y - cell.position().y;
        let mut e2 = EdgeVertices::new(e1.v1 + bridge, e1.v5 + bridge);

        let has_river = cell.has_river_through_edge(direction);
        let has_road = cell.has_road_through_edge(direction);

        if has_river {
            e2.v3.y = neighbor_cell.stream_bed_y();
            let indices = Vec3::new(index1, index2, index1);

            if !cell.is_underwater() {
                if !neighbor_cell.is_underwater() {
                    self.triangulate_river_quad(
                        e1.v2,
                        e1.v4,
                        e2.v2,
                        e2.v4,
                        cell.river_surface_y(),
                        neighbor_cell.river_surface_y(),
                        0.8,
                        cell.incoming_river() == Some(direction),
                        indices,
                    );
                } else if cell.elevation() > neighbor_cell.water_level() {
                    // The river plunges into standing water
                    self.triangulate_waterfall_in_water(
                        e1.v2,
                        e1.v4,
                        e2.v2,
                        e2.v4,
                        cell.river_surface_y(),
                        neighbor_cell.river_surface_y(),
                        neighbor_cell.water_surface_y(),
                        indices,
                    );
                }
            } else if !neighbor_cell.is_underwater()
                && neighbor_cell.elevation() > cell.water_level()
            {
                // Waterfall arriving from the neighbor's side
                self.triangulate_waterfall_in_water(
                    e2.v4,
                    e2.v2,
                    e1.v4,
                    e1.v2,
                    neighbor_cell.river_surface_y(),
                    cell.river_surface_y(),
                    cell.water_surface_y(),
                    indices,
                );
            }
        }

        if grid.edge_type(cell_id, direction) == Some(HexEdgeType::Slope) {
            self.triangulate_edge_terraces(e1, index1, &e2, index2, has_road);
        } else {
            self.triangulate_edge_strip(e1, WEIGHTS1, index1, &e2, WEIGHTS2, index2, has_road);
        }

        features.add_wall(e1, cell_id, &e2, neighbor, has_river, has_road);

        // The corner triangle between this pair and the next neighbor,
        // resolved once per triple with the lowest cell at the bottom
        if direction <= HexDirection::E {
            if let Some(next_neighbor) = grid.neighbor(cell_id, direction.next()) {
                let mut v5 = e1.v5 + metrics::bridge(direction.next());
                v5.y = grid.cell(next_neighbor).position().y;

                let next_elevation = grid.cell(next_neighbor).elevation();
                if cell.elevation() <= neighbor_cell.elevation() {
                    if cell.elevation() <= next_elevation {
                        self.triangulate_corner(
                            grid, e1.v5, cell_id, e2.v5, neighbor, v5, next_neighbor, features,
                        );
                    } else {
                        self.triangulate_corner(
                            grid, v5, next_neighbor, e1.v5, cell_id, e2.v5, neighbor, features,
                        );
                    }
                } else if neighbor_cell.elevation() <= next_elevation {
                    self.triangulate_corner(
                        grid, e2.v5, neighbor, v5, next_neighbor, e1.v5, cell_id, features,
                    );
                } else {
                    self.triangulate_corner(
                        grid, v5, next_neighbor, e1.v5, cell_id, e2.v5, neighbor, features,
                    );
                }
            }
        }
    }

    fn triangulate_edge_terraces(
        &mut self,
        begin: &EdgeVertices,
        begin_index: f32,
        end: &EdgeVertices,
        end_index: f32,
        has_road: bool,
    ) {
        let mut e2 = EdgeVertices::terrace_lerp(begin, end, 1);
        let mut w2 = metrics::terrace_weight_lerp(WEIGHTS1, WEIGHTS2, 1);

        self.triangulate_edge_strip(begin, WEIGHTS1, begin_index, &e2, w2, end_index, has_road);

        for step in 2..TERRACE_STEPS {
            let e1 = e2;
            let w1 = w2;
            e2 = EdgeVertices::terrace_lerp(begin, end, step);
            w2 = metrics::terrace_weight_lerp(WEIGHTS1, WEIGHTS2, step);
            self.triangulate_edge_strip(&e1, w1, begin_index, &e2, w2, end_index, has_road);
        }

        self.triangulate_edge_strip(&e2, w2, begin_index, end, WEIGHTS2, end_index, has_road);
    }

    #[allow(clippy::too_many_arguments)]
    fn triangulate_corner<F: FeaturePlacer>(
        &mut self,
        grid: &HexGrid,
        bottom: Vec3,
        bottom_cell: usize,
        left: Vec3,
        left_cell: usize,
        right: Vec3,
        right_cell: usize,
        features: &mut F,
    ) {
        let bottom_elevation = grid.cell(bottom_cell).elevation();
        let left_elevation = grid.cell(left_cell).elevation();
        let right_elevation = grid.cell(right_cell).elevation();
        let left_edge = HexEdgeType::between(bottom_elevation, left_elevation);
        let right_edge = HexEdgeType::between(bottom_elevation, right_elevation);

        match (left_edge, right_edge) {
            (HexEdgeType::Slope, HexEdgeType::Slope) => {
                self.triangulate_corner_terraces(
                    bottom,
                    bottom_cell,
                    left,
                    left_cell,
                    right,
                    right_cell,
                );
            }
            // One side flat: terracing restarts from the flat side
            (HexEdgeType::Slope, HexEdgeType::Flat) => {
                self.triangulate_corner_terraces(
                    left,
                    left_cell,
                    right,
                    right_cell,
                    bottom,
                    bottom_cell,
                );
            }
            (HexEdgeType::Flat, HexEdgeType::Slope) => {
                self.triangulate_corner_terraces(
                    right,
                    right_cell,
                    bottom,
                    bottom_cell,
                    left,
                    left_cell,
                );
            }
            (HexEdgeType::Slope, _) => {
                self.triangulate_corner_terraces_cliff(
                    grid,
                    bottom,
                    bottom_cell,
                    left,
                    left_cell,
                    right,
                    right_cell,
                );
            }
            (_, HexEdgeType::Slope) => {
                self.triangulate_corner_cliff_terraces(
                    grid,
                    bottom,
                    bottom_cell,
                    left,
                    left_cell,
                    right,
                    right_cell,
                );
            }
            _ => {
                if HexEdgeType::between(left_elevation, right_elevation) == HexEdgeType::Slope {
                    // Cliffs below, slope on top: terracing hangs off
                    // whichever top cell is lower
                    if left_elevation < right_elevation {
                        self.triangulate_corner_cliff_terraces(
                            grid,
                            right,
                            right_cell,
                            bottom,
                            bottom_cell,
                            left,
                            left_cell,
                        );
                    } else {
                        self.triangulate_corner_terraces_cliff(
                            grid,
                            left,
                            left_cell,
                            right,
                            right_cell,
                            bottom,
                            bottom_cell,
                        );
                    }
                } else {
                    self.terrain.add_triangle(bottom, left, right);
                    let indices = Vec3::new(
                        bottom_cell as f32,
                        left_cell as f32,
                        right_cell as f32,
                    );
                    self.terrain
                        .add_triangle_cell_data(indices, WEIGHTS1, WEIGHTS2, WEIGHTS3);
                }
            }
        }

        features.add_corner_wall(bottom, bottom_cell, left, left_cell, right, right_cell);
    }

    fn triangulate_corner_terraces(
        &mut self,
        begin: Vec3,
        begin_cell: usize,
        left: Vec3,
        left_cell: usize,
        right: Vec3,
        right_cell: usize,
    ) {
        let mut v3 = metrics::terrace_lerp(begin, left, 1);
        let mut v4 = metrics::terrace_lerp(begin, right, 1);
        let mut w3 = metrics::terrace_weight_lerp(WEIGHTS1, WEIGHTS2, 1);
        let mut w4 = metrics::terrace_weight_lerp(WEIGHTS1, WEIGHTS3, 1);
        let indices = Vec3::new(begin_cell as f32, left_cell as f32, right_cell as f32);

        self.terrain.add_triangle(begin, v3, v4);
        self.terrain
            .add_triangle_cell_data(indices, WEIGHTS1, w3, w4);

        for step in 2..TERRACE_STEPS {
            let v1 = v3;
            let v2 = v4;
            let w1 = w3;
            let w2 = w4;
            v3 = metrics::terrace_lerp(begin, left, step);
            v4 = metrics::terrace_lerp(begin, right, step);
            w3 = metrics::terrace_weight_lerp(WEIGHTS1, WEIGHTS2, step);
            w4 = metrics::terrace_weight_lerp(WEIGHTS1, WEIGHTS3, step);
            self.terrain.add_quad(v1, v2, v3, v4);
            self.terrain.add_quad_cell_data(indices, w1, w2, w3, w4);
        }

        self.terrain.add_quad(v3, v4, left, right);
        self.terrain
            .add_quad_cell_data(indices, w3, w4, WEIGHTS2, WEIGHTS3);
    }

    // Terraces running into a cliff: the terraced side collapses toward a
    // boundary point interpolated across the elevation gap.
    #[allow(clippy::too_many_arguments)]
    fn triangulate_corner_terraces_cliff(
        &mut self,
        grid: &HexGrid,
        begin: Vec3,
        begin_cell: usize,
        left: Vec3,
        left_cell: usize,
        right: Vec3,
        right_cell: usize,
    ) {
        let mut b = 1.0
            / (grid.cell(right_cell).elevation() - grid.cell(begin_cell).elevation()) as f32;
        if b < 0.0 {
            b = -b;
        }
        let boundary = noise::perturb(begin, self.wrap_size)
            .lerp(noise::perturb(right, self.wrap_size), b);
        let boundary_weights = WEIGHTS1.lerp(WEIGHTS3, b);
        let indices = Vec3::new(begin_cell as f32, left_cell as f32, right_cell as f32);

        self.triangulate_boundary_triangle(
            begin,
            WEIGHTS1,
            left,
            WEIGHTS2,
            boundary,
            boundary_weights,
            indices,
        );

        if HexEdgeType::between(
            grid.cell(left_cell).elevation(),
            grid.cell(right_cell).elevation(),
        ) == HexEdgeType::Slope
        {
            self.triangulate_boundary_triangle(
                left,
                WEIGHTS2,
                right,
                WEIGHTS3,
                boundary,
                boundary_weights,
                indices,
            );
        } else {
            self.terrain.add_triangle_unperturbed(
                noise::perturb(left, self.wrap_size),
                noise::perturb(right, self.wrap_size),
                boundary,
            );
            self.terrain
                .add_triangle_cell_data(indices, WEIGHTS2, WEIGHTS3, boundary_weights);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn triangulate_corner_cliff_terraces(
        &mut self,
        grid: &HexGrid,
        begin: Vec3,
        begin_cell: usize,
        left: Vec3,
        left_cell: usize,
        right: Vec3,
        right_cell: usize,
    ) {
        let mut b =
            1.0 / (grid.cell(left_cell).elevation() - grid.cell(begin_cell).elevation()) as f32;
        if b < 0.0 {
            b = -b;
        }
        let boundary = noise::perturb(begin, self.wrap_size)
            .lerp(noise::perturb(left, self.wrap_size), b);
        let boundary_weights = WEIGHTS1.lerp(WEIGHTS2, b);
        let indices = Vec3::new(begin_cell as f32, left_cell as f32, right_cell as f32);

        self.triangulate_boundary_triangle(
            right,
            WEIGHTS3,
            begin,
            WEIGHTS1,
            boundary,
            boundary_weights,
            indices,
        );

        if HexEdgeType::between(
            grid.cell(left_cell).elevation(),
            grid.cell(right_cell).elevation(),
        ) == HexEdgeType::Slope
        {
            self.triangulate_boundary_triangle(
                left,
                WEIGHTS2,
                right,
                WEIGHTS3,
                boundary,
                boundary_weights,
                indices,
            );
        } else {
            self.terrain.add_triangle_unperturbed(
                noise::perturb(left, self.wrap_size),
                noise::perturb(right, self.wrap_size),
                boundary,
            );
            self.terrain
                .add_triangle_cell_data(indices, WEIGHTS2, WEIGHTS3, boundary_weights);
        }
    }

    // Terrace fan against a fixed boundary point. The boundary is already
    // perturbed, so all emission here is raw.
    #[allow(clippy::too_many_arguments)]
    fn triangulate_boundary_triangle(
        &mut self,
        begin: Vec3,
        begin_weights: Vec3,
        left: Vec3,
        left_weights: Vec3,
        boundary: Vec3,
        boundary_weights: Vec3,
        indices: Vec3,
    ) {
        let mut v2 = noise::perturb(metrics::terrace_lerp(begin, left, 1), self.wrap_size);
        let mut w2 = metrics::terrace_weight_lerp(begin_weights, left_weights, 1);

        self.terrain.add_triangle_unperturbed(
            noise::perturb(begin, self.wrap_size),
            v2,
            boundary,
        );
        self.terrain
            .add_triangle_cell_data(indices, begin_weights, w2, boundary_weights);

        for step in 2..TERRACE_STEPS {
            let v1 = v2;
            let w1 = w2;
            v2 = noise::perturb(metrics::terrace_lerp(begin, left, step), self.wrap_size);
            w2 = metrics::terrace_weight_lerp(begin_weights, left_weights, step);
            self.terrain.add_triangle_unperturbed(v1, v2, boundary);
            self.terrain
                .add_triangle_cell_data(indices, w1, w2, boundary_weights);
        }

        self.terrain.add_triangle_unperturbed(
            v2,
            noise::perturb(left, self.wrap_size),
            boundary,
        );
        self.terrain
            .add_triangle_cell_data(indices, w2, left_weights, boundary_weights);
    }

    // ------------------------------------------------------------------
    // Shared strip/fan/quad helpers
    // ------------------------------------------------------------------

    fn triangulate_edge_fan(&mut self, center: Vec3, edge: &EdgeVertices, index: f32) {
        self.terrain.add_triangle(center, edge.v1, edge.v2);
        self.terrain.add_triangle(center, edge.v2, edge.v3);
        self.terrain.add_triangle(center, edge.v3, edge.v4);
        self.terrain.add_triangle(center, edge.v4, edge.v5);

        let indices = Vec3::splat(index);
        self.terrain.add_triangle_cell_data_uniform(indices, WEIGHTS1);
        self.terrain.add_triangle_cell_data_uniform(indices, WEIGHTS1);
        self.terrain.add_triangle_cell_data_uniform(indices, WEIGHTS1);
        self.terrain.add_triangle_cell_data_uniform(indices, WEIGHTS1);
    }

    #[allow(clippy::too_many_arguments)]
    fn triangulate_edge_strip(
        &mut self,
        e1: &EdgeVertices,
        w1: Vec3,
        index1: f32,
        e2: &EdgeVertices,
        w2: Vec3,
        index2: f32,
        has_road: bool,
    ) {
        self.terrain.add_quad(e1.v1, e1.v2, e2.v1, e2.v2);
        self.terrain.add_quad(e1.v2, e1.v3, e2.v2, e2.v3);
        self.terrain.add_quad(e1.v3, e1.v4, e2.v3, e2.v4);
        self.terrain.add_quad(e1.v4, e1.v5, e2.v4, e2.v5);

        let indices = Vec3::new(index1, index2, index1);
        self.terrain.add_quad_cell_data_pair(indices, w1, w2);
        self.terrain.add_quad_cell_data_pair(indices, w1, w2);
        self.terrain.add_quad_cell_data_pair(indices, w1, w2);
        self.terrain.add_quad_cell_data_pair(indices, w1, w2);

        if has_road {
            self.triangulate_road_segment(
                e1.v2, e1.v3, e1.v4, e2.v2, e2.v3, e2.v4, w1, w2, indices,
            );
        }
    }

    // River surface quad with flow-direction UVs; reversed when the flow
    // runs against the triangulation direction
    #[allow(clippy::too_many_arguments)]
    fn triangulate_river_quad(
        &mut self,
        mut v1: Vec3,
        mut v2: Vec3,
        mut v3: Vec3,
        mut v4: Vec3,
        y1: f32,
        y2: f32,
        v: f32,
        reversed: bool,
        indices: Vec3,
    ) {
        v1.y = y1;
        v2.y = y1;
        v3.y = y2;
        v4.y = y2;
        self.rivers.add_quad(v1, v2, v3, v4);
        if reversed {
            self.rivers.add_quad_uv_rect(1.0, 0.0, 0.8 - v, 0.6 - v);
        } else {
            self.rivers.add_quad_uv_rect(0.0, 1.0, v, v + 0.2);
        }
        self.rivers.add_quad_cell_data_pair(indices, WEIGHTS1, WEIGHTS2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfigBuilder;
    use crate::features::{NullFeatures, RecordingFeatures};
    use crate::generator::MapGenerator;

    fn flat_grid() -> HexGrid {
        HexGrid::new(5, 5, false).unwrap()
    }

    // Center cell of a 5x5 grid: surrounded on all six sides
    fn center_cell(grid: &HexGrid) -> usize {
        grid.cell_index_at_offset(2, 2).unwrap()
    }

    fn triangulate_single(grid: &HexGrid, cell: usize) -> ChunkTriangulator {
        let mut triangulator = ChunkTriangulator::for_grid(grid);
        triangulator.triangulate(grid, &[cell], &mut NullFeatures);
        triangulator
    }

    #[test]
    fn flat_cell_emits_fans_and_nothing_else() {
        let grid = flat_grid();
        let cell = center_cell(&grid);
        let triangulator = triangulate_single(&grid, cell);

        // Six fan directions of four triangles each, three connections of
        // four quads each, two corner triangles.
        let expected = 6 * 4 + 3 * 4 * 2 + 2;
        assert_eq!(triangulator.terrain.triangle_count(), expected);
        assert!(triangulator.rivers.is_empty());
        assert!(triangulator.roads.is_empty());
        assert!(triangulator.water.is_empty());
        assert!(triangulator.water_shore.is_empty());
        assert!(triangulator.estuaries.is_empty());
    }

    #[test]
    fn flat_terrain_normals_point_up() {
        // Elevation perturbation still tilts connections on a level map,
        // but nothing may ever face downward.
        let grid = flat_grid();
        let mut triangulator = ChunkTriangulator::for_grid(&grid);
        let cells: Vec<usize> = (0..grid.cell_count()).collect();
        triangulator.triangulate(&grid, &cells, &mut NullFeatures);
        assert!(!triangulator.terrain.normals.is_empty());
        for normal in &triangulator.terrain.normals {
            assert!(normal.y > 0.0, "normal {:?} not upward", normal);
        }
    }

    #[test]
    fn triangulation_is_idempotent() {
        let config = MapConfigBuilder::new().seed(99).build().unwrap();
        let grid = MapGenerator::new(config).generate(40, 30, false).unwrap();
        let cells = grid.chunk_cells(3, 2);

        let mut triangulator = ChunkTriangulator::for_grid(&grid);
        triangulator.triangulate(&grid, &cells, &mut NullFeatures);
        let first_positions = triangulator.terrain.positions.clone();
        let first_indices = triangulator.terrain.indices.clone();
        let first_river_uvs = triangulator.rivers.uvs.clone();
        let first_shore = triangulator.water_shore.positions.clone();

        triangulator.triangulate(&grid, &cells, &mut NullFeatures);
        assert_eq!(triangulator.terrain.positions, first_positions);
        assert_eq!(triangulator.terrain.indices, first_indices);
        assert_eq!(triangulator.rivers.uvs, first_river_uvs);
        assert_eq!(triangulator.water_shore.positions, first_shore);
    }

    #[test]
    fn straight_river_emits_channel_quads() {
        let mut grid = flat_grid();
        for i in 0..grid.cell_count() {
            grid.set_elevation(i, 2);
        }
        let cell = center_cell(&grid);
        // Straight river: in from NE, out through SW
        let upstream = grid.neighbor(cell, HexDirection::NE).unwrap();
        grid.set_outgoing_river(upstream, HexDirection::SW);
        grid.set_outgoing_river(cell, HexDirection::SW);

        let triangulator = triangulate_single(&grid, cell);
        // Two channel quads per river edge plus the NE connection quad;
        // the SW connection belongs to the neighbor's pass.
        assert_eq!(triangulator.rivers.triangle_count(), 5 * 2);
        // Every river vertex has flow UVs
        assert_eq!(
            triangulator.rivers.uvs.len(),
            triangulator.rivers.vertex_count()
        );
    }

    #[test]
    fn slope_connection_emits_terrace_strips() {
        let mut grid = flat_grid();
        let cell = center_cell(&grid);
        grid.set_elevation(cell, 1);
        let triangulator = triangulate_single(&grid, cell);

        // Fans unchanged, but every connection is now a slope of
        // TERRACE_STEPS strips; corners become double terrace fans.
        let fan = 6 * 4;
        let connection_strips = 3 * TERRACE_STEPS * 4 * 2;
        let corners = 2 * (1 + (TERRACE_STEPS - 2) * 2 + 2);
        assert_eq!(
            triangulator.terrain.triangle_count(),
            fan + connection_strips + corners
        );
    }

    #[test]
    fn features_are_placed_on_plain_cells_only() {
        let mut grid = flat_grid();
        let cell = center_cell(&grid);
        let mut triangulator = ChunkTriangulator::for_grid(&grid);
        let mut features = RecordingFeatures::default();
        triangulator.triangulate(&grid, &[cell], &mut features);
        // One center feature and one per edge third
        assert_eq!(features.features.len(), 7);
        assert!(features.bridges.is_empty());

        // Sink the cell: no features under water
        grid.set_water_level(cell, 3);
        let mut features = RecordingFeatures::default();
        triangulator.triangulate(&grid, &[cell], &mut features);
        assert!(features.features.is_empty());
    }
}
