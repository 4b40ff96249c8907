//! Feature placement seam
//!
//! The triangulator decides *where* decorations belong (cell centers, edge
//! thirds, wall seams, bridge spans); an external placer decides what to do
//! with those points. All methods default to no-ops so placers implement
//! only what they care about.

use glam::Vec3;

use crate::grid::EdgeVertices;

/// Receiver for feature placement decisions made during triangulation
pub trait FeaturePlacer {
    /// A regular feature point (urban/farm/plant decoration)
    fn add_feature(&mut self, _cell: usize, _position: Vec3) {}

    /// The cell's special feature, placed at its center
    fn add_special_feature(&mut self, _cell: usize, _position: Vec3) {}

    /// A wall candidate along the connection between two cells
    fn add_wall(
        &mut self,
        _near: &EdgeVertices,
        _near_cell: usize,
        _far: &EdgeVertices,
        _far_cell: usize,
        _has_river: bool,
        _has_road: bool,
    ) {
    }

    /// A wall candidate at the corner between three cells
    fn add_corner_wall(
        &mut self,
        _c1: Vec3,
        _cell1: usize,
        _c2: Vec3,
        _cell2: usize,
        _c3: Vec3,
        _cell3: usize,
    ) {
    }

    /// A bridge spanning a river between two road centers
    fn add_bridge(&mut self, _road_center1: Vec3, _road_center2: Vec3) {}
}

/// Placer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFeatures;

impl FeaturePlacer for NullFeatures {}

/// Placer that records every call, for tests and debugging
#[derive(Debug, Default, Clone)]
pub struct RecordingFeatures {
    pub features: Vec<(usize, Vec3)>,
    pub special_features: Vec<(usize, Vec3)>,
    pub walls: usize,
    pub corner_walls: usize,
    pub bridges: Vec<(Vec3, Vec3)>,
}

impl FeaturePlacer for RecordingFeatures {
    fn add_feature(&mut self, cell: usize, position: Vec3) {
        self.features.push((cell, position));
    }

    fn add_special_feature(&mut self, cell: usize, position: Vec3) {
        self.special_features.push((cell, position));
    }

    fn add_wall(
        &mut self,
        _near: &EdgeVertices,
        _near_cell: usize,
        _far: &EdgeVertices,
        _far_cell: usize,
        _has_river: bool,
        _has_road: bool,
    ) {
        self.walls += 1;
    }

    fn add_corner_wall(
        &mut self,
        _c1: Vec3,
        _cell1: usize,
        _c2: Vec3,
        _cell2: usize,
        _c3: Vec3,
        _cell3: usize,
    ) {
        self.corner_walls += 1;
    }

    fn add_bridge(&mut self, road_center1: Vec3, road_center2: Vec3) {
        self.bridges.push((road_center1, road_center2));
    }
}
