//! Voxel Blast Engine Library
//!
//! Simulation core for a destructible voxel world: a bounded block grid,
//! timed explosives with occlusion-aware blast propagation and chain
//! reactions, ballistic debris, and wandering creatures that the blasts
//! interact with.
//!
//! # Modules
//!
//! - [`world`] - Voxel grid, block catalogue, grid geometry, terrain initializers
//! - [`physics`] - Stateless collision and occlusion queries
//! - [`render`] - Byte-layout snapshots for the rendering layer
//! - [`game`] - Explosions, debris, creatures, spawning and the tick driver
//! - [`error`] - Crate error type
//!
//! # Example
//!
//! ```ignore
//! use voxel_blast_engine::game::{SimSettings, Simulation};
//! use voxel_blast_engine::world::BlockType;
//! use glam::IVec3;
//!
//! let mut sim = Simulation::new(SimSettings::default())?;
//! sim.place_block(IVec3::new(20, 10, 20), BlockType::Explosive);
//! for _ in 0..240 {
//!     for event in sim.tick(16.0) {
//!         println!("{event:?}");
//!     }
//! }
//! ```

pub mod error;
pub mod physics;
pub mod render;
pub mod world;

// Game-specific modules (located in src/game/ directory)
#[path = "../../src/game/mod.rs"]
pub mod game;

pub use error::{SimError, SimResult};
pub use world::{BlockType, VoxelWorld};
