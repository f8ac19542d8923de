//! World Module
//!
//! The voxel grid, the block catalogue, grid geometry helpers and the
//! one-shot terrain initializers.
//!
//! ## Coordinates
//! Worlds are cubes of edge `size`; valid cells satisfy `0 <= x, y, z < size`.
//! Bedrock only ever appears at y=0.

pub mod block;
pub mod grid;
pub mod terrain;
pub mod voxel_world;

pub use block::BlockType;
pub use grid::{cell_center, clamp_to_world, walk_segment, world_to_cell, GridStep};
pub use terrain::{TerrainLayers, flat_world, layered_world};
pub use voxel_world::{CellChange, DEFAULT_SURFACE_HEIGHT, MAX_WORLD_SIZE, VoxelHit, VoxelWorld};
