//! Terrain Initializers
//!
//! One-shot builders that fill a freshly allocated [`VoxelWorld`]. Real
//! terrain generation lives outside the simulation core; these layouts are
//! what the headless driver and the tests run on.

use rand::Rng;

use super::block::BlockType;
use super::voxel_world::VoxelWorld;
use crate::error::SimResult;

/// Layer thicknesses for [`layered_world`].
#[derive(Debug, Clone, Copy)]
pub struct TerrainLayers {
    /// Top face of the surface (grass) layer
    pub ground_height: i32,
    /// Dirt thickness directly below the grass
    pub dirt_depth: i32,
    /// Fraction of surface columns that get a tree
    pub tree_density: f32,
    /// Fraction of surface columns that get a flower
    pub flower_density: f32,
}

impl Default for TerrainLayers {
    fn default() -> Self {
        Self {
            ground_height: 5,
            dirt_depth: 2,
            tree_density: 0.01,
            flower_density: 0.03,
        }
    }
}

/// Flat world: bedrock at y=0, stone, two dirt layers and a grass top
/// whose upper face sits at `ground_height`.
pub fn flat_world(size: i32, ground_height: i32) -> SimResult<VoxelWorld> {
    let mut world = VoxelWorld::new(size)?;
    let top = ground_height.clamp(1, size);
    for z in 0..size {
        for x in 0..size {
            fill_column(&mut world, x, z, top, 2);
        }
    }
    world.drain_changes();
    Ok(world)
}

/// Layered world with scattered trees and flowers.
pub fn layered_world<R: Rng>(
    size: i32,
    layers: TerrainLayers,
    rng: &mut R,
) -> SimResult<VoxelWorld> {
    let mut world = VoxelWorld::new(size)?;
    let top = layers.ground_height.clamp(1, size);
    for z in 0..size {
        for x in 0..size {
            fill_column(&mut world, x, z, top, layers.dirt_depth);
        }
    }

    // Keep decorations off the outer ring so trees never clip the border.
    for z in 2..size - 2 {
        for x in 2..size - 2 {
            let roll: f32 = rng.gen_range(0.0..1.0);
            if roll < layers.tree_density {
                plant_tree(&mut world, x, top, z, rng.gen_range(3..=5));
            } else if roll < layers.tree_density + layers.flower_density {
                world.set(x, top, z, BlockType::Flower);
            }
        }
    }
    world.drain_changes();
    Ok(world)
}

fn fill_column(world: &mut VoxelWorld, x: i32, z: i32, top: i32, dirt_depth: i32) {
    world.set(x, 0, z, BlockType::Bedrock);
    for y in 1..top {
        let block = if y == top - 1 {
            BlockType::Grass
        } else if y >= top - 1 - dirt_depth {
            BlockType::Dirt
        } else {
            BlockType::Stone
        };
        world.set(x, y, z, block);
    }
}

fn plant_tree(world: &mut VoxelWorld, x: i32, base_y: i32, z: i32, trunk: i32) {
    let canopy = base_y + trunk;
    for dy in -1..=1 {
        for dz in -1..=1 {
            for dx in -1..=1 {
                if world.get(x + dx, canopy + dy, z + dz).is_air() {
                    world.set(x + dx, canopy + dy, z + dz, BlockType::Leaves);
                }
            }
        }
    }
    for y in base_y..canopy {
        world.set(x, y, z, BlockType::Wood);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_flat_world_layers() {
        let world = flat_world(16, 5).unwrap();
        assert_eq!(world.get(3, 0, 3), BlockType::Bedrock);
        assert_eq!(world.get(3, 1, 3), BlockType::Stone);
        assert_eq!(world.get(3, 4, 3), BlockType::Grass);
        assert_eq!(world.get(3, 5, 3), BlockType::Air);
        assert_eq!(world.highest_solid_y(3, 3), 5);
    }

    #[test]
    fn test_initializer_leaves_no_pending_changes() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut world = layered_world(24, TerrainLayers::default(), &mut rng).unwrap();
        assert!(world.drain_changes().is_empty());
    }

    #[test]
    fn test_trees_stand_on_surface() {
        let mut rng = StdRng::seed_from_u64(3);
        let layers = TerrainLayers {
            tree_density: 1.0,
            ..TerrainLayers::default()
        };
        let world = layered_world(12, layers, &mut rng).unwrap();
        assert!(world.count(BlockType::Wood) > 0);
        assert_eq!(world.get(5, 0, 5), BlockType::Bedrock);
    }
}
