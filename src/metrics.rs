//! Hex geometry constants and helper functions
//!
//! Everything here is static geometry: corner offsets, bridge offsets and
//! terrace interpolation. All distances are in world units; a cell spans
//! `OUTER_RADIUS` from center to corner.

use glam::Vec3;

use crate::grid::HexDirection;

/// Ratio of a hexagon's inner radius to its outer radius (sqrt(3)/2)
pub const OUTER_TO_INNER: f32 = 0.866_025_4;
/// Inverse of [`OUTER_TO_INNER`]
pub const INNER_TO_OUTER: f32 = 1.0 / OUTER_TO_INNER;

/// Distance from a cell center to any of its six corners
pub const OUTER_RADIUS: f32 = 10.0;
/// Distance from a cell center to the middle of any edge
pub const INNER_RADIUS: f32 = OUTER_RADIUS * OUTER_TO_INNER;
/// Horizontal distance between two east/west neighbor centers
pub const INNER_DIAMETER: f32 = INNER_RADIUS * 2.0;

/// Fraction of a cell that is solid, uniform interior; the rest blends
/// with neighbors
pub const SOLID_FACTOR: f32 = 0.8;
/// Blend region fraction between two neighboring cells
pub const BLEND_FACTOR: f32 = 1.0 - SOLID_FACTOR;
/// Solid fraction for the water surface hexagon, which shrinks more to
/// keep shorelines wide
pub const WATER_FACTOR: f32 = 0.6;
/// Blend region fraction between two water surfaces
pub const WATER_BLEND_FACTOR: f32 = 1.0 - WATER_FACTOR;

/// World-space height of one elevation level
pub const ELEVATION_STEP: f32 = 3.0;

/// Number of terrace bands on a one-level slope
pub const TERRACES_PER_SLOPE: usize = 2;
/// Number of interpolation steps along a terraced slope
pub const TERRACE_STEPS: usize = TERRACES_PER_SLOPE * 2 + 1;
/// Horizontal interpolation advance per terrace step
pub const HORIZONTAL_TERRACE_STEP_SIZE: f32 = 1.0 / TERRACE_STEPS as f32;
/// Vertical interpolation advance per terrace band
pub const VERTICAL_TERRACE_STEP_SIZE: f32 = 1.0 / (TERRACES_PER_SLOPE as f32 + 1.0);

/// Maximum horizontal displacement applied by vertex perturbation
pub const CELL_PERTURB_STRENGTH: f32 = 4.0;
/// Maximum vertical displacement applied to cell centers
pub const ELEVATION_PERTURB_STRENGTH: f32 = 1.5;
/// Stream beds sit this many elevation levels below their cell
pub const STREAM_BED_ELEVATION_OFFSET: f32 = -1.75;
/// River and water surfaces sit this many levels below their level line
pub const WATER_ELEVATION_OFFSET: f32 = -0.5;

/// World-to-noise coordinate scale for perturbation sampling
pub const NOISE_SCALE: f32 = 0.003;

/// Cells per chunk along the x axis
pub const CHUNK_SIZE_X: i32 = 5;
/// Cells per chunk along the z axis
pub const CHUNK_SIZE_Z: i32 = 5;

// Corner 0 points due north; corners advance clockwise. The seventh entry
// repeats the first so second_corner never wraps an index.
const CORNERS: [Vec3; 7] = [
    Vec3::new(0.0, 0.0, OUTER_RADIUS),
    Vec3::new(INNER_RADIUS, 0.0, 0.5 * OUTER_RADIUS),
    Vec3::new(INNER_RADIUS, 0.0, -0.5 * OUTER_RADIUS),
    Vec3::new(0.0, 0.0, -OUTER_RADIUS),
    Vec3::new(-INNER_RADIUS, 0.0, -0.5 * OUTER_RADIUS),
    Vec3::new(-INNER_RADIUS, 0.0, 0.5 * OUTER_RADIUS),
    Vec3::new(0.0, 0.0, OUTER_RADIUS),
];

/// First corner of the edge facing `direction`, relative to the cell center
#[inline]
pub fn first_corner(direction: HexDirection) -> Vec3 {
    CORNERS[direction as usize]
}

/// Second corner of the edge facing `direction`
#[inline]
pub fn second_corner(direction: HexDirection) -> Vec3 {
    CORNERS[direction as usize + 1]
}

/// First corner of the solid interior hexagon
#[inline]
pub fn first_solid_corner(direction: HexDirection) -> Vec3 {
    CORNERS[direction as usize] * SOLID_FACTOR
}

/// Second corner of the solid interior hexagon
#[inline]
pub fn second_solid_corner(direction: HexDirection) -> Vec3 {
    CORNERS[direction as usize + 1] * SOLID_FACTOR
}

/// First corner of the water surface hexagon
#[inline]
pub fn first_water_corner(direction: HexDirection) -> Vec3 {
    CORNERS[direction as usize] * WATER_FACTOR
}

/// Second corner of the water surface hexagon
#[inline]
pub fn second_water_corner(direction: HexDirection) -> Vec3 {
    CORNERS[direction as usize + 1] * WATER_FACTOR
}

/// Offset across the blend region toward the neighbor in `direction`
#[inline]
pub fn bridge(direction: HexDirection) -> Vec3 {
    (CORNERS[direction as usize] + CORNERS[direction as usize + 1]) * BLEND_FACTOR
}

/// Offset across the water blend region toward the neighbor
#[inline]
pub fn water_bridge(direction: HexDirection) -> Vec3 {
    (CORNERS[direction as usize] + CORNERS[direction as usize + 1]) * WATER_BLEND_FACTOR
}

/// Midpoint of the solid edge facing `direction`
#[inline]
pub fn solid_edge_middle(direction: HexDirection) -> Vec3 {
    (CORNERS[direction as usize] + CORNERS[direction as usize + 1]) * (0.5 * SOLID_FACTOR)
}

/// Interpolate a position along a terraced slope.
///
/// Horizontal movement advances every step; vertical movement only on odd
/// steps, which produces the flat terrace bands. Step 0 yields `a`
/// unchanged and step [`TERRACE_STEPS`] yields `b` exactly.
pub fn terrace_lerp(a: Vec3, b: Vec3, step: usize) -> Vec3 {
    let h = step as f32 * HORIZONTAL_TERRACE_STEP_SIZE;
    let v = ((step + 1) / 2) as f32 * VERTICAL_TERRACE_STEP_SIZE;
    Vec3::new(
        a.x + (b.x - a.x) * h,
        a.y + (b.y - a.y) * v,
        a.z + (b.z - a.z) * h,
    )
}

/// Interpolate blend weights along a terraced slope (purely horizontal)
pub fn terrace_weight_lerp(a: Vec3, b: Vec3, step: usize) -> Vec3 {
    a.lerp(b, step as f32 * HORIZONTAL_TERRACE_STEP_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::HexDirection;

    #[test]
    fn corners_lie_on_outer_radius() {
        for d in HexDirection::ALL {
            let c = first_corner(d);
            assert!((c.length() - OUTER_RADIUS).abs() < 1e-4);
        }
    }

    #[test]
    fn terrace_lerp_endpoints_are_exact() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(8.0, 3.0, -4.0);
        assert_eq!(terrace_lerp(a, b, 0), a);
        assert_eq!(terrace_lerp(a, b, TERRACE_STEPS), b);
    }

    #[test]
    fn terrace_lerp_flattens_even_steps() {
        let a = Vec3::ZERO;
        let b = Vec3::new(10.0, 3.0, 0.0);
        // Band pairs (1,2) and (3,4) share a height: the flat treads.
        let s1 = terrace_lerp(a, b, 1);
        let s2 = terrace_lerp(a, b, 2);
        assert_eq!(s1.y, s2.y);
        assert!(s2.x > s1.x);
    }

    #[test]
    fn straight_river_corridor_corners_are_symmetric() {
        // A straight river offsets its channel by the first solid corner of
        // the previous direction on one side and the second solid corner of
        // the next direction on the other; those must mirror each other.
        for d in HexDirection::ALL {
            let left = first_solid_corner(d.previous());
            let right = second_solid_corner(d.next());
            assert!((left + right).length() < 1e-4);
        }
    }

    #[test]
    fn bridge_spans_blend_region() {
        for d in HexDirection::ALL {
            let expected = (first_corner(d) + second_corner(d)) * BLEND_FACTOR;
            assert_eq!(bridge(d), expected);
        }
    }
}
