//! Engine-agnostic mesh accumulation
//!
//! A [`MeshBuffer`] collects vertices, triangle indices and the optional
//! per-vertex channels one render surface needs: blend-weight colors plus
//! the cell-index triple they refer to, and up to two UV sets. Buffers are
//! cleared and rebuilt in full on every triangulation pass, never patched.
//!
//! Convert the finished channels to whatever the rendering side wants:
//! Bevy `Mesh` attributes, Godot `ArrayMesh` arrays, raw wgpu vertex
//! buffers.

use glam::{Vec2, Vec3};

use crate::noise;

/// Which optional vertex channels a buffer carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshChannels {
    /// Geometry doubles as a collision mesh
    pub collider: bool,
    /// Per-vertex blend weights + cell index triples
    pub cell_data: bool,
    /// Primary UV set
    pub uv: bool,
    /// Secondary UV set
    pub uv2: bool,
}

/// Accumulates one render surface's geometry.
///
/// Positions run through the deterministic perturbation noise unless the
/// `*_unperturbed` primitives are used; because perturbation is a pure
/// function of position, rebuilding unchanged input reproduces the buffer
/// byte for byte, and seams between chunks close exactly.
#[derive(Debug, Clone, Default)]
pub struct MeshBuffer {
    channels: MeshChannels,
    wrap_size: i32,
    ready: bool,
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Vertex normals, recomputed by [`apply`](Self::apply)
    pub normals: Vec<Vec3>,
    /// Triangle index list, always a multiple of three
    pub indices: Vec<u32>,
    /// Barycentric blend weights across the three contributing cells
    pub cell_weights: Vec<Vec3>,
    /// Which cell each weight channel belongs to, as shader-ready floats
    pub cell_indices: Vec<Vec3>,
    /// Primary UV set
    pub uvs: Vec<Vec2>,
    /// Secondary UV set
    pub uv2s: Vec<Vec2>,
}

impl MeshBuffer {
    /// Create a buffer with the given channels. `wrap_size` (in cells, 0
    /// for non-wrapping maps) feeds the perturbation sampling so west-seam
    /// vertices blend across the wrap.
    pub fn new(channels: MeshChannels, wrap_size: i32) -> MeshBuffer {
        MeshBuffer {
            channels,
            wrap_size,
            ..Default::default()
        }
    }

    #[inline]
    pub fn channels(&self) -> MeshChannels {
        self.channels
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Reset all channels for a fresh triangulation pass
    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.indices.clear();
        self.cell_weights.clear();
        self.cell_indices.clear();
        self.uvs.clear();
        self.uv2s.clear();
        self.ready = true;
    }

    /// Finalize the pass: checks channel consistency and recomputes
    /// normals. Must follow a matching [`clear`](Self::clear).
    pub fn apply(&mut self) {
        assert!(self.ready, "apply() without a preceding clear()");
        self.ready = false;
        assert!(
            self.indices.len() % 3 == 0,
            "triangle index list is not a multiple of three"
        );
        if self.channels.cell_data {
            assert_eq!(
                self.cell_weights.len(),
                self.positions.len(),
                "cell data missing for some vertices"
            );
            assert_eq!(self.cell_indices.len(), self.positions.len());
        }
        if self.channels.uv {
            assert_eq!(
                self.uvs.len(),
                self.positions.len(),
                "uv data missing for some vertices"
            );
        }
        if self.channels.uv2 {
            assert_eq!(
                self.uv2s.len(),
                self.positions.len(),
                "uv2 data missing for some vertices"
            );
        }
        self.recompute_normals();
    }

    // Area-weighted vertex normals: larger triangles dominate, which is
    // what flat-shaded terrain wants.
    fn recompute_normals(&mut self) {
        self.normals.clear();
        self.normals.resize(self.positions.len(), Vec3::ZERO);
        for triangle in self.indices.chunks_exact(3) {
            let a = self.positions[triangle[0] as usize];
            let b = self.positions[triangle[1] as usize];
            let c = self.positions[triangle[2] as usize];
            let normal = (b - a).cross(c - a);
            for &index in triangle {
                self.normals[index as usize] += normal;
            }
        }
        for normal in &mut self.normals {
            *normal = normal.normalize_or_zero();
        }
    }

    /// Append a perturbed triangle
    pub fn add_triangle(&mut self, v1: Vec3, v2: Vec3, v3: Vec3) {
        self.add_triangle_unperturbed(
            noise::perturb(v1, self.wrap_size),
            noise::perturb(v2, self.wrap_size),
            noise::perturb(v3, self.wrap_size),
        );
    }

    /// Append a triangle whose heights are already exact (waterfalls,
    /// boundary fans) and must not jitter
    pub fn add_triangle_unperturbed(&mut self, v1: Vec3, v2: Vec3, v3: Vec3) {
        let index = self.positions.len() as u32;
        self.positions.extend([v1, v2, v3]);
        self.indices.extend([index, index + 1, index + 2]);
    }

    /// Append a perturbed quad split along the v1-v3 diagonal
    pub fn add_quad(&mut self, v1: Vec3, v2: Vec3, v3: Vec3, v4: Vec3) {
        self.add_quad_unperturbed(
            noise::perturb(v1, self.wrap_size),
            noise::perturb(v2, self.wrap_size),
            noise::perturb(v3, self.wrap_size),
            noise::perturb(v4, self.wrap_size),
        );
    }

    /// Append a raw quad, same fixed diagonal split
    pub fn add_quad_unperturbed(&mut self, v1: Vec3, v2: Vec3, v3: Vec3, v4: Vec3) {
        let index = self.positions.len() as u32;
        self.positions.extend([v1, v2, v3, v4]);
        self.indices.extend([
            index,
            index + 2,
            index + 1,
            index + 1,
            index + 2,
            index + 3,
        ]);
    }

    /// Attach cell indices and per-vertex weights to the triangle just
    /// added. Exactly one cell-data call must follow each primitive.
    pub fn add_triangle_cell_data(&mut self, indices: Vec3, w1: Vec3, w2: Vec3, w3: Vec3) {
        assert!(self.channels.cell_data, "buffer carries no cell data");
        assert!(
            self.cell_indices.len() + 3 <= self.positions.len(),
            "cell data must follow a primitive that still lacks it"
        );
        self.cell_indices.extend([indices, indices, indices]);
        self.cell_weights.extend([w1, w2, w3]);
    }

    /// Uniform-weight shorthand for [`add_triangle_cell_data`](Self::add_triangle_cell_data)
    pub fn add_triangle_cell_data_uniform(&mut self, indices: Vec3, weights: Vec3) {
        self.add_triangle_cell_data(indices, weights, weights, weights);
    }

    /// Attach cell indices and per-vertex weights to the quad just added
    pub fn add_quad_cell_data(&mut self, indices: Vec3, w1: Vec3, w2: Vec3, w3: Vec3, w4: Vec3) {
        assert!(self.channels.cell_data, "buffer carries no cell data");
        assert!(
            self.cell_indices.len() + 4 <= self.positions.len(),
            "cell data must follow a primitive that still lacks it"
        );
        self.cell_indices.extend([indices, indices, indices, indices]);
        self.cell_weights.extend([w1, w2, w3, w4]);
    }

    /// Near/far paired weights, the common edge-strip case
    pub fn add_quad_cell_data_pair(&mut self, indices: Vec3, w1: Vec3, w2: Vec3) {
        self.add_quad_cell_data(indices, w1, w1, w2, w2);
    }

    /// Uniform-weight shorthand for [`add_quad_cell_data`](Self::add_quad_cell_data)
    pub fn add_quad_cell_data_uniform(&mut self, indices: Vec3, weights: Vec3) {
        self.add_quad_cell_data(indices, weights, weights, weights, weights);
    }

    pub fn add_triangle_uv(&mut self, uv1: Vec2, uv2: Vec2, uv3: Vec2) {
        assert!(self.channels.uv, "buffer carries no uv channel");
        self.uvs.extend([uv1, uv2, uv3]);
    }

    pub fn add_quad_uv(&mut self, uv1: Vec2, uv2: Vec2, uv3: Vec2, uv4: Vec2) {
        assert!(self.channels.uv, "buffer carries no uv channel");
        self.uvs.extend([uv1, uv2, uv3, uv4]);
    }

    /// Axis-aligned quad UVs, matching the quad's vertex order
    pub fn add_quad_uv_rect(&mut self, u_min: f32, u_max: f32, v_min: f32, v_max: f32) {
        self.add_quad_uv(
            Vec2::new(u_min, v_min),
            Vec2::new(u_max, v_min),
            Vec2::new(u_min, v_max),
            Vec2::new(u_max, v_max),
        );
    }

    pub fn add_triangle_uv2(&mut self, uv1: Vec2, uv2: Vec2, uv3: Vec2) {
        assert!(self.channels.uv2, "buffer carries no uv2 channel");
        self.uv2s.extend([uv1, uv2, uv3]);
    }

    pub fn add_quad_uv2(&mut self, uv1: Vec2, uv2: Vec2, uv3: Vec2, uv4: Vec2) {
        assert!(self.channels.uv2, "buffer carries no uv2 channel");
        self.uv2s.extend([uv1, uv2, uv3, uv4]);
    }

    pub fn add_quad_uv2_rect(&mut self, u_min: f32, u_max: f32, v_min: f32, v_max: f32) {
        self.add_quad_uv2(
            Vec2::new(u_min, v_min),
            Vec2::new(u_max, v_min),
            Vec2::new(u_min, v_max),
            Vec2::new(u_max, v_max),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_data_buffer() -> MeshBuffer {
        let mut buffer = MeshBuffer::new(
            MeshChannels {
                cell_data: true,
                ..Default::default()
            },
            0,
        );
        buffer.clear();
        buffer
    }

    #[test]
    fn quad_splits_into_two_ccw_triangles() {
        let mut buffer = MeshBuffer::new(MeshChannels::default(), 0);
        buffer.clear();
        buffer.add_quad_unperturbed(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
        );
        buffer.apply();
        assert_eq!(buffer.triangle_count(), 2);
        // Both triangles of a flat quad must face up
        for normal in &buffer.normals {
            assert!(normal.y > 0.9);
        }
    }

    #[test]
    fn perturbed_and_raw_primitives_share_winding() {
        let mut a = MeshBuffer::new(MeshChannels::default(), 0);
        let mut b = MeshBuffer::new(MeshChannels::default(), 0);
        a.clear();
        b.clear();
        let (v1, v2, v3) = (
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(8.0, 0.0, 5.0),
            Vec3::new(0.0, 0.0, 0.0),
        );
        a.add_triangle(v1, v2, v3);
        b.add_triangle_unperturbed(v1, v2, v3);
        assert_eq!(a.indices, b.indices);
        // Perturbation moved positions but only horizontally
        for (pa, pb) in a.positions.iter().zip(&b.positions) {
            assert_eq!(pa.y, pb.y);
        }
    }

    #[test]
    fn rebuild_of_identical_input_is_byte_identical() {
        let build = || {
            let mut buffer = cell_data_buffer();
            buffer.add_triangle(
                Vec3::new(1.0, 2.0, 3.0),
                Vec3::new(4.0, 5.0, 6.0),
                Vec3::new(7.0, 8.0, 9.0),
            );
            buffer.add_triangle_cell_data_uniform(Vec3::splat(3.0), Vec3::X);
            buffer.apply();
            buffer
        };
        let a = build();
        let b = build();
        assert_eq!(a.positions, b.positions);
        assert_eq!(a.indices, b.indices);
        assert_eq!(a.cell_weights, b.cell_weights);
        assert_eq!(a.normals, b.normals);
    }

    #[test]
    #[should_panic(expected = "cell data must follow a primitive")]
    fn cell_data_without_primitive_panics() {
        let mut buffer = cell_data_buffer();
        buffer.add_triangle_cell_data_uniform(Vec3::ZERO, Vec3::X);
    }

    #[test]
    #[should_panic(expected = "apply() without a preceding clear()")]
    fn apply_requires_clear() {
        let mut buffer = MeshBuffer::new(MeshChannels::default(), 0);
        buffer.apply();
    }

    #[test]
    #[should_panic(expected = "cell data missing")]
    fn apply_catches_missing_cell_data() {
        let mut buffer = cell_data_buffer();
        buffer.add_triangle_unperturbed(Vec3::ZERO, Vec3::X, Vec3::Z);
        buffer.apply();
    }
}
