//! Hexagonal-grid terrain generation and chunk mesh building
//!
//! A standalone library that procedurally generates a hex-cell world map
//! (elevation, water, rivers, climate, biomes) and triangulates map chunks
//! into engine-agnostic mesh buffers (terrain, rivers, roads, water,
//! shorelines, estuaries), suitable for any rendering backend (Bevy,
//! Godot, raw wgpu, etc.)
//!
//! # Quick Start
//!
//! ```rust
//! use hex_terrain::*;
//!
//! // Generate a world
//! let config = MapConfigBuilder::new()
//!     .seed(42)
//!     .land_percentage(40)
//!     .build().unwrap();
//! let grid = MapGenerator::new(config).generate(40, 30, false).unwrap();
//!
//! // Triangulate one chunk for rendering
//! let mut triangulator = ChunkTriangulator::for_grid(&grid);
//! triangulator.triangulate(&grid, &grid.chunk_cells(0, 0), &mut NullFeatures);
//! println!("terrain: {} triangles", triangulator.terrain.triangle_count());
//! ```
//!
//! # Features
//!
//! - `serde`: Enables serialization support for configuration types

// Modules
pub mod config;
pub mod error;
pub mod features;
pub mod generator;
pub mod grid;
pub mod mesh;
pub mod metrics;
pub mod noise;
pub mod search;
pub mod triangulator;

// Re-export core types for convenience
pub use config::{Hemisphere, MapConfig, MapConfigBuilder};
pub use error::{HexMapError, Result};
pub use features::{FeaturePlacer, NullFeatures, RecordingFeatures};
pub use generator::MapGenerator;
pub use grid::{EdgeVertices, HexCell, HexCoordinates, HexDirection, HexEdgeType, HexGrid};
pub use mesh::{MeshBuffer, MeshChannels};
pub use search::CellPriorityQueue;
pub use triangulator::ChunkTriangulator;

// Re-export the vector types used throughout the public API
pub use glam::{Vec2, Vec3, Vec4};
