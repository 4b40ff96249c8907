//! Per-cell state and edge sampling

use glam::Vec3;

use crate::grid::{HexCoordinates, HexDirection};
use crate::metrics::{
    self, ELEVATION_STEP, STREAM_BED_ELEVATION_OFFSET, WATER_ELEVATION_OFFSET,
};

/// One cell of the hex grid.
///
/// Cells live in the grid's arena and reference each other only through
/// indices; all cross-cell edits (rivers, roads, elevation validation) go
/// through [`HexGrid`](crate::grid::HexGrid) so both sides stay in sync.
#[derive(Debug, Clone)]
pub struct HexCell {
    pub(crate) coordinates: HexCoordinates,
    pub(crate) position: Vec3,
    pub(crate) column_index: i32,
    pub(crate) elevation: i32,
    pub(crate) water_level: i32,
    pub(crate) incoming_river: Option<HexDirection>,
    pub(crate) outgoing_river: Option<HexDirection>,
    pub(crate) roads: [bool; 6],
    pub(crate) terrain_type_index: u8,
    pub(crate) plant_level: u8,
    pub(crate) urban_level: u8,
    pub(crate) farm_level: u8,
    pub(crate) special_index: u8,
    pub(crate) walled: bool,
    // Transient search bookkeeping, owned by whichever search pass is
    // active. The phase stamp distinguishes "not yet seen this pass" from
    // "already visited" without full-grid resets.
    pub(crate) search_phase: u32,
    pub(crate) distance: i32,
    pub(crate) search_heuristic: i32,
}

impl HexCell {
    pub(crate) fn new(coordinates: HexCoordinates, position: Vec3, column_index: i32) -> HexCell {
        HexCell {
            coordinates,
            position,
            column_index,
            elevation: 0,
            water_level: 0,
            incoming_river: None,
            outgoing_river: None,
            roads: [false; 6],
            terrain_type_index: 0,
            plant_level: 0,
            urban_level: 0,
            farm_level: 0,
            special_index: 0,
            walled: false,
            search_phase: 0,
            distance: 0,
            search_heuristic: 0,
        }
    }

    #[inline]
    pub fn coordinates(&self) -> HexCoordinates {
        self.coordinates
    }

    /// World position of the cell center, including elevation perturbation
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Chunk column this cell belongs to; used to detect wrap seams
    #[inline]
    pub fn column_index(&self) -> i32 {
        self.column_index
    }

    #[inline]
    pub fn elevation(&self) -> i32 {
        self.elevation
    }

    #[inline]
    pub fn water_level(&self) -> i32 {
        self.water_level
    }

    #[inline]
    pub fn is_underwater(&self) -> bool {
        self.water_level > self.elevation
    }

    /// Elevation as seen by climate and visibility: water counts
    #[inline]
    pub fn view_elevation(&self) -> i32 {
        self.elevation.max(self.water_level)
    }

    #[inline]
    pub fn incoming_river(&self) -> Option<HexDirection> {
        self.incoming_river
    }

    #[inline]
    pub fn outgoing_river(&self) -> Option<HexDirection> {
        self.outgoing_river
    }

    #[inline]
    pub fn has_incoming_river(&self) -> bool {
        self.incoming_river.is_some()
    }

    #[inline]
    pub fn has_outgoing_river(&self) -> bool {
        self.outgoing_river.is_some()
    }

    #[inline]
    pub fn has_river(&self) -> bool {
        self.incoming_river.is_some() || self.outgoing_river.is_some()
    }

    /// True when the river starts or ends here rather than passing through
    #[inline]
    pub fn has_river_begin_or_end(&self) -> bool {
        self.incoming_river.is_some() != self.outgoing_river.is_some()
    }

    /// The single river endpoint direction, for begin/end cells
    #[inline]
    pub fn river_begin_or_end_direction(&self) -> Option<HexDirection> {
        self.incoming_river.or(self.outgoing_river)
    }

    #[inline]
    pub fn has_river_through_edge(&self, direction: HexDirection) -> bool {
        self.incoming_river == Some(direction) || self.outgoing_river == Some(direction)
    }

    #[inline]
    pub fn has_roads(&self) -> bool {
        self.roads.iter().any(|&road| road)
    }

    #[inline]
    pub fn has_road_through_edge(&self, direction: HexDirection) -> bool {
        self.roads[direction as usize]
    }

    #[inline]
    pub fn terrain_type_index(&self) -> u8 {
        self.terrain_type_index
    }

    #[inline]
    pub fn plant_level(&self) -> u8 {
        self.plant_level
    }

    #[inline]
    pub fn urban_level(&self) -> u8 {
        self.urban_level
    }

    #[inline]
    pub fn farm_level(&self) -> u8 {
        self.farm_level
    }

    #[inline]
    pub fn special_index(&self) -> u8 {
        self.special_index
    }

    #[inline]
    pub fn is_special(&self) -> bool {
        self.special_index > 0
    }

    #[inline]
    pub fn walled(&self) -> bool {
        self.walled
    }

    /// Height of the carved stream bed through this cell
    #[inline]
    pub fn stream_bed_y(&self) -> f32 {
        (self.elevation as f32 + STREAM_BED_ELEVATION_OFFSET) * ELEVATION_STEP
    }

    /// Height of the river surface flowing over this cell
    #[inline]
    pub fn river_surface_y(&self) -> f32 {
        (self.elevation as f32 + WATER_ELEVATION_OFFSET) * ELEVATION_STEP
    }

    /// Height of the standing water surface over this cell
    #[inline]
    pub fn water_surface_y(&self) -> f32 {
        (self.water_level as f32 + WATER_ELEVATION_OFFSET) * ELEVATION_STEP
    }

    #[inline]
    pub fn search_phase(&self) -> u32 {
        self.search_phase
    }

    #[inline]
    pub fn distance(&self) -> i32 {
        self.distance
    }

    #[inline]
    pub fn search_heuristic(&self) -> i32 {
        self.search_heuristic
    }
}

/// Five points sampled across one hex edge, used to build fans, strips and
/// terraces. Derived geometry, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeVertices {
    pub v1: Vec3,
    pub v2: Vec3,
    pub v3: Vec3,
    pub v4: Vec3,
    pub v5: Vec3,
}

impl EdgeVertices {
    /// Sample an edge with the default quarter-step outer vertices
    pub fn new(corner1: Vec3, corner2: Vec3) -> EdgeVertices {
        Self::with_outer_step(corner1, corner2, 0.25)
    }

    /// Sample an edge with custom outer spacing; river channels use 1/6 so
    /// the channel walls stay parallel
    pub fn with_outer_step(corner1: Vec3, corner2: Vec3, outer_step: f32) -> EdgeVertices {
        EdgeVertices {
            v1: corner1,
            v2: corner1.lerp(corner2, outer_step),
            v3: corner1.lerp(corner2, 0.5),
            v4: corner1.lerp(corner2, 1.0 - outer_step),
            v5: corner2,
        }
    }

    /// Terrace-interpolate every vertex between two edges
    pub fn terrace_lerp(a: &EdgeVertices, b: &EdgeVertices, step: usize) -> EdgeVertices {
        EdgeVertices {
            v1: metrics::terrace_lerp(a.v1, b.v1, step),
            v2: metrics::terrace_lerp(a.v2, b.v2, step),
            v3: metrics::terrace_lerp(a.v3, b.v3, step),
            v4: metrics::terrace_lerp(a.v4, b.v4, step),
            v5: metrics::terrace_lerp(a.v5, b.v5, step),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::TERRACE_STEPS;

    #[test]
    fn underwater_iff_water_above_elevation() {
        let mut cell = HexCell::new(HexCoordinates::new(0, 0), Vec3::ZERO, 0);
        cell.elevation = 2;
        cell.water_level = 3;
        assert!(cell.is_underwater());
        assert_eq!(cell.view_elevation(), 3);
        cell.water_level = 2;
        assert!(!cell.is_underwater());
        assert_eq!(cell.view_elevation(), 2);
    }

    #[test]
    fn river_endpoint_classification() {
        let mut cell = HexCell::new(HexCoordinates::new(0, 0), Vec3::ZERO, 0);
        assert!(!cell.has_river());
        cell.incoming_river = Some(HexDirection::NE);
        assert!(cell.has_river_begin_or_end());
        assert_eq!(
            cell.river_begin_or_end_direction(),
            Some(HexDirection::NE)
        );
        cell.outgoing_river = Some(HexDirection::SW);
        assert!(cell.has_river());
        assert!(!cell.has_river_begin_or_end());
        assert!(cell.has_river_through_edge(HexDirection::NE));
        assert!(cell.has_river_through_edge(HexDirection::SW));
        assert!(!cell.has_river_through_edge(HexDirection::E));
    }

    #[test]
    fn edge_vertices_span_the_corners() {
        let a = Vec3::new(0.0, 1.0, 0.0);
        let b = Vec3::new(8.0, 1.0, 4.0);
        let e = EdgeVertices::new(a, b);
        assert_eq!(e.v1, a);
        assert_eq!(e.v5, b);
        assert_eq!(e.v3, a.lerp(b, 0.5));
    }

    #[test]
    fn edge_terrace_endpoints_match_inputs() {
        let e1 = EdgeVertices::new(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0));
        let e2 = EdgeVertices::new(Vec3::new(0.0, 3.0, 8.0), Vec3::new(10.0, 3.0, 8.0));
        assert_eq!(EdgeVertices::terrace_lerp(&e1, &e2, 0), e1);
        assert_eq!(EdgeVertices::terrace_lerp(&e1, &e2, TERRACE_STEPS), e2);
    }
}
