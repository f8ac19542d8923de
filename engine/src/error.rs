//! Error Types
//!
//! Errors surfaced by world construction, settings loading and the checked
//! world accessors. Per-tick faults (bad coordinates, NaN positions, stale
//! timers) are repaired in place and logged instead of being returned.

use thiserror::Error;

/// Result alias used across the engine.
pub type SimResult<T> = Result<T, SimError>;

/// Errors produced by the simulation core.
#[derive(Debug, Error)]
pub enum SimError {
    /// World edge length is zero or above [`crate::world::MAX_WORLD_SIZE`].
    #[error("invalid world size {size} (expected 1..={max})")]
    InvalidWorldSize { size: i32, max: i32 },

    /// The dense voxel grid could not be allocated.
    #[error("failed to allocate voxel grid of {cells} cells")]
    WorldAllocation { cells: usize },

    /// A checked accessor was given a coordinate outside the world.
    #[error("cell ({x}, {y}, {z}) is outside the world")]
    OutOfBounds { x: i32, y: i32, z: i32 },

    /// A settings field failed validation.
    #[error("invalid setting `{name}`: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    /// Settings JSON could not be parsed.
    #[error("settings JSON error: {0}")]
    Config(#[from] serde_json::Error),

    /// Tried to arm a cell that does not hold an explosive block.
    #[error("no explosive block at ({x}, {y}, {z})")]
    UnknownExplosive { x: i32, y: i32, z: i32 },
}

impl SimError {
    /// Shorthand for an out-of-bounds error at `cell`.
    pub fn out_of_bounds(cell: glam::IVec3) -> Self {
        SimError::OutOfBounds {
            x: cell.x,
            y: cell.y,
            z: cell.z,
        }
    }
}
