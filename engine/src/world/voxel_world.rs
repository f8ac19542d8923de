//! Voxel World
//!
//! Bounded, dense 3D grid of [`BlockType`] codes; the single source of truth
//! for static geometry. Allocated once, mutated in place, never resized.
//!
//! All mutation goes through [`VoxelWorld::set`]. Every accepted change is
//! appended to a change log that the rendering layer drains once per frame
//! with [`VoxelWorld::drain_changes`].

use glam::{IVec3, Vec3};
use serde::Serialize;

use super::block::BlockType;
use super::grid::{GridStep, cell_center, walk_segment};
use crate::error::{SimError, SimResult};

/// Largest supported world edge length.
pub const MAX_WORLD_SIZE: i32 = 256;

/// Height returned by [`VoxelWorld::highest_solid_y`] for columns that are
/// out of range or contain no ground.
pub const DEFAULT_SURFACE_HEIGHT: i32 = 10;

/// A cell that changed type since the last drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellChange {
    pub cell: IVec3,
    pub block: BlockType,
}

/// First non-Air cell along a view ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelHit {
    pub cell: IVec3,
    pub block: BlockType,
    /// Outward normal of the face the ray entered through
    pub normal: IVec3,
    pub distance: f32,
}

impl VoxelHit {
    /// The empty cell adjacent to the hit face, where a placed block goes.
    pub fn placement_cell(&self) -> IVec3 {
        self.cell + self.normal
    }
}

pub struct VoxelWorld {
    size: i32,
    cells: Vec<BlockType>,
    changes: Vec<CellChange>,
}

impl VoxelWorld {
    /// Allocate an all-Air cube world with edge length `size`.
    ///
    /// Allocation failure is the only fatal error in the simulation.
    pub fn new(size: i32) -> SimResult<Self> {
        if size <= 0 || size > MAX_WORLD_SIZE {
            return Err(SimError::InvalidWorldSize {
                size,
                max: MAX_WORLD_SIZE,
            });
        }
        let count = (size as usize).pow(3);
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(count)
            .map_err(|_| SimError::WorldAllocation { cells: count })?;
        cells.resize(count, BlockType::Air);

        log::info!("allocated voxel world {size}³ ({count} cells)");
        Ok(Self {
            size,
            cells,
            changes: Vec::new(),
        })
    }

    #[inline]
    pub fn size(&self) -> i32 {
        self.size
    }

    /// World-space center of the whole volume.
    pub fn center(&self) -> Vec3 {
        Vec3::splat(self.size as f32 * 0.5)
    }

    #[inline]
    pub fn is_in_bounds(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0 && y >= 0 && z >= 0 && x < self.size && y < self.size && z < self.size
    }

    #[inline]
    pub fn contains(&self, cell: IVec3) -> bool {
        self.is_in_bounds(cell.x, cell.y, cell.z)
    }

    fn index(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        if !self.is_in_bounds(x, y, z) {
            return None;
        }
        let s = self.size as usize;
        Some(x as usize + y as usize * s + z as usize * s * s)
    }

    /// Block at a cell. Out-of-bounds reads return Air.
    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> BlockType {
        match self.index(x, y, z) {
            Some(idx) => self.cells[idx],
            None => BlockType::Air,
        }
    }

    #[inline]
    pub fn block_at(&self, cell: IVec3) -> BlockType {
        self.get(cell.x, cell.y, cell.z)
    }

    /// Block at a cell, or `None` when out of bounds.
    pub fn try_get(&self, cell: IVec3) -> Option<BlockType> {
        self.index(cell.x, cell.y, cell.z).map(|idx| self.cells[idx])
    }

    /// Write a block. Out-of-bounds writes are logged and ignored.
    ///
    /// Returns `true` when the stored type actually changed.
    pub fn set(&mut self, x: i32, y: i32, z: i32, block: BlockType) -> bool {
        let Some(idx) = self.index(x, y, z) else {
            log::warn!("ignoring write of {block} outside world at ({x}, {y}, {z})");
            return false;
        };
        if self.cells[idx] == block {
            return false;
        }
        self.cells[idx] = block;
        self.changes.push(CellChange {
            cell: IVec3::new(x, y, z),
            block,
        });
        true
    }

    #[inline]
    pub fn set_block(&mut self, cell: IVec3, block: BlockType) -> bool {
        self.set(cell.x, cell.y, cell.z, block)
    }

    /// Checked write that reports out-of-bounds coordinates as an error.
    pub fn try_set(&mut self, cell: IVec3, block: BlockType) -> SimResult<bool> {
        if !self.contains(cell) {
            return Err(SimError::out_of_bounds(cell));
        }
        Ok(self.set_block(cell, block))
    }

    /// Top face height of the highest ground block in column `(x, z)`.
    ///
    /// Scans downward from the top and skips Air, Leaves and low-profile
    /// decorations. Columns outside the world or without any ground return
    /// [`DEFAULT_SURFACE_HEIGHT`].
    pub fn highest_solid_y(&self, x: i32, z: i32) -> i32 {
        if !self.is_in_bounds(x, 0, z) {
            return DEFAULT_SURFACE_HEIGHT;
        }
        for y in (0..self.size).rev() {
            if self.get(x, y, z).is_ground() {
                return y + 1;
            }
        }
        DEFAULT_SURFACE_HEIGHT
    }

    /// Drain every accepted change since the previous call.
    pub fn drain_changes(&mut self) -> Vec<CellChange> {
        std::mem::take(&mut self.changes)
    }

    /// Count cells holding `block` (diagnostics and tests).
    pub fn count(&self, block: BlockType) -> usize {
        self.cells.iter().filter(|b| **b == block).count()
    }

    /// First non-Air cell hit by a ray within `max_dist`.
    ///
    /// Used by the input layer to resolve the targeted cell for break/place.
    pub fn raycast(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<VoxelHit> {
        let dir = dir.normalize_or_zero();
        if dir.length_squared() < 1e-8 || max_dist <= 0.0 || !max_dist.is_finite() {
            return None;
        }

        // Nothing past the far side of the world can be hit
        let reach = origin.distance(self.center()) + self.size as f32 * 3.0f32.sqrt();
        let max_dist = max_dist.min(reach);

        let mut hit = None;
        walk_segment(origin, origin + dir * max_dist, |GridStep { cell, t, normal }| {
            let block = self.block_at(cell);
            if block.is_air() {
                return true;
            }
            hit = Some(VoxelHit {
                cell,
                block,
                normal,
                distance: t,
            });
            false
        });
        hit
    }

    /// Euclidean distance between two cell centers.
    #[inline]
    pub fn cell_distance(a: IVec3, b: IVec3) -> f32 {
        cell_center(a).distance(cell_center(b))
    }
}

impl std::fmt::Debug for VoxelWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoxelWorld")
            .field("size", &self.size)
            .field("pending_changes", &self.changes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get_roundtrip() {
        let mut world = VoxelWorld::new(8).unwrap();
        assert!(world.set(1, 2, 3, BlockType::Wood));
        assert_eq!(world.get(1, 2, 3), BlockType::Wood);
        assert_eq!(world.get(3, 2, 1), BlockType::Air);
    }

    #[test]
    fn test_out_of_bounds_is_safe() {
        let mut world = VoxelWorld::new(4).unwrap();
        assert_eq!(world.get(-1, 0, 0), BlockType::Air);
        assert_eq!(world.get(0, 4, 0), BlockType::Air);
        assert!(!world.set(4, 0, 0, BlockType::Stone));
        assert!(world.try_get(IVec3::new(0, -1, 0)).is_none());
        assert!(matches!(
            world.try_set(IVec3::new(9, 0, 0), BlockType::Dirt),
            Err(SimError::OutOfBounds { x: 9, .. })
        ));
        assert!(world.drain_changes().is_empty());
    }

    #[test]
    fn test_invalid_size_rejected() {
        assert!(VoxelWorld::new(0).is_err());
        assert!(VoxelWorld::new(MAX_WORLD_SIZE + 1).is_err());
    }

    #[test]
    fn test_highest_solid_skips_leaves_and_decorations() {
        let mut world = VoxelWorld::new(16).unwrap();
        world.set(3, 0, 3, BlockType::Bedrock);
        world.set(3, 1, 3, BlockType::Dirt);
        world.set(3, 2, 3, BlockType::Flower);
        world.set(3, 6, 3, BlockType::Leaves);
        assert_eq!(world.highest_solid_y(3, 3), 2);
    }

    #[test]
    fn test_highest_solid_defaults() {
        let world = VoxelWorld::new(16).unwrap();
        assert_eq!(world.highest_solid_y(2, 2), DEFAULT_SURFACE_HEIGHT);
        assert_eq!(world.highest_solid_y(-5, 2), DEFAULT_SURFACE_HEIGHT);
    }

    #[test]
    fn test_change_log_only_records_real_changes() {
        let mut world = VoxelWorld::new(4).unwrap();
        world.set(0, 0, 0, BlockType::Dirt);
        world.set(0, 0, 0, BlockType::Dirt);
        world.set(0, 0, 0, BlockType::Air);
        let changes = world.drain_changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[1].block, BlockType::Air);
        assert!(world.drain_changes().is_empty());
    }

    #[test]
    fn test_raycast_hits_first_solid_with_face_normal() {
        let mut world = VoxelWorld::new(16).unwrap();
        world.set(5, 1, 1, BlockType::Stone);
        let hit = world
            .raycast(Vec3::new(1.5, 1.5, 1.5), Vec3::X, 10.0)
            .expect("ray should hit the stone block");
        assert_eq!(hit.cell, IVec3::new(5, 1, 1));
        assert_eq!(hit.normal, IVec3::new(-1, 0, 0));
        assert_eq!(hit.placement_cell(), IVec3::new(4, 1, 1));
        assert!((hit.distance - 3.5).abs() < 1e-4);
    }

    #[test]
    fn test_raycast_huge_distance_is_clipped_to_world() {
        let mut world = VoxelWorld::new(8).unwrap();
        assert!(world.raycast(Vec3::new(1.5, 1.5, 1.5), Vec3::X, f32::MAX).is_none());
        assert!(world.raycast(Vec3::new(1.5, 1.5, 1.5), Vec3::X, 3.0e8).is_none());

        world.set(6, 1, 1, BlockType::Dirt);
        let hit = world
            .raycast(Vec3::new(1.5, 1.5, 1.5), Vec3::X, f32::MAX)
            .expect("clipped ray still reaches the far block");
        assert_eq!(hit.cell, IVec3::new(6, 1, 1));
    }

    #[test]
    fn test_raycast_respects_max_distance() {
        let mut world = VoxelWorld::new(16).unwrap();
        world.set(9, 1, 1, BlockType::Stone);
        assert!(world.raycast(Vec3::new(1.5, 1.5, 1.5), Vec3::X, 4.0).is_none());
    }
}
