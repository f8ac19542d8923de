//! Collision Resolver
//!
//! Stateless geometric queries against the voxel grid and between entities:
//!
//! - [`blocked`] - would a horizontal step run the body into terrain?
//! - [`push_out_of_block`] - minimal horizontal push out of a solid cell
//! - [`push_apart`] - symmetric repulsion between two overlapping bodies
//! - [`line_of_sight_blocked`] - blast occlusion test between two cells
//!
//! Every function is pure: the same inputs always give the same output and
//! callers apply the returned vectors themselves.

use glam::{IVec3, Vec2, Vec3};

use crate::world::{VoxelWorld, cell_center, walk_segment, world_to_cell};

/// Vertical clearance ignored at the feet and head so that a body resting
/// exactly on a block face does not count as overlapping it.
const FACE_EPSILON: f32 = 0.05;

/// Extra distance added to a push so the body ends strictly outside.
const PUSH_MARGIN: f32 = 0.01;

/// Horizontal footprint and height of an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    /// Horizontal radius (world units)
    pub radius: f32,
    /// Height above the feet (world units)
    pub height: f32,
}

impl Body {
    pub const fn new(radius: f32, height: f32) -> Self {
        Self { radius, height }
    }
}

/// Check whether moving a body by `step` (XZ displacement) runs into terrain
/// or leaves the world.
///
/// Tests the column under the leading edge of the body at the projected
/// position across the body's height profile. Low-profile blocks (flowers,
/// torches, wire, fire) never block.
///
/// # Arguments
/// * `world` - Voxel grid to test against
/// * `feet` - Current feet position
/// * `step` - Horizontal displacement for this tick (x, z)
/// * `body` - Entity footprint
pub fn blocked(world: &VoxelWorld, feet: Vec3, step: Vec2, body: Body) -> bool {
    let dir = step.normalize_or_zero();
    let target = Vec2::new(feet.x, feet.z) + step;
    let probe = target + dir * body.radius;

    let size = world.size() as f32;
    if probe.x < 0.0 || probe.y < 0.0 || probe.x >= size || probe.y >= size {
        return true;
    }

    let cx = probe.x.floor() as i32;
    let cz = probe.y.floor() as i32;
    let y_lo = (feet.y + FACE_EPSILON).floor() as i32;
    let y_hi = (feet.y + body.height - FACE_EPSILON).floor() as i32;
    (y_lo..=y_hi).any(|y| world.get(cx, y, cz).is_solid())
}

/// Minimal horizontal push that moves a body out of the solid cell at its
/// body center.
///
/// Picks the nearest of the four side faces whose neighbour cell is open.
/// Returns zero when the body is not inside a solid cell or every side is
/// walled in.
pub fn push_out_of_block(world: &VoxelWorld, feet: Vec3) -> Vec2 {
    let sample = feet + Vec3::Y * 0.5;
    let cell = world_to_cell(sample);
    if !world.block_at(cell).is_solid() {
        return Vec2::ZERO;
    }

    let fx = sample.x - cell.x as f32;
    let fz = sample.z - cell.z as f32;
    let candidates = [
        (IVec3::new(-1, 0, 0), fx, Vec2::new(-1.0, 0.0)),
        (IVec3::new(1, 0, 0), 1.0 - fx, Vec2::new(1.0, 0.0)),
        (IVec3::new(0, 0, -1), fz, Vec2::new(0.0, -1.0)),
        (IVec3::new(0, 0, 1), 1.0 - fz, Vec2::new(0.0, 1.0)),
    ];

    candidates
        .iter()
        .filter(|(offset, _, _)| {
            let neighbour = cell + *offset;
            world.contains(neighbour) && !world.block_at(neighbour).is_solid()
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(_, dist, dir)| *dir * (dist + PUSH_MARGIN))
        .unwrap_or(Vec2::ZERO)
}

/// Repulsion for body A when two bodies are closer than `min_separation`
/// on the XZ plane. Body B receives the negated vector.
///
/// Exactly coincident bodies are separated along a pseudo-random direction
/// derived from `seed`, so the result stays deterministic.
pub fn push_apart(a: Vec3, b: Vec3, min_separation: f32, strength: f32, seed: u32) -> Vec2 {
    let delta = Vec2::new(a.x - b.x, a.z - b.z);
    let dist = delta.length();
    if dist >= min_separation {
        return Vec2::ZERO;
    }
    let dir = if dist > 1e-4 {
        delta / dist
    } else {
        let angle = hash_unit(seed) * std::f32::consts::TAU;
        Vec2::new(angle.cos(), angle.sin())
    };
    dir * (min_separation - dist) * 0.5 * strength
}

/// Blast occlusion: does a blast-opaque block sit on the segment between
/// the centers of `origin` and `target`, strictly closer to the origin than
/// the target is?
///
/// Only Stone occludes. The origin and target cells themselves are never
/// tested.
pub fn line_of_sight_blocked(world: &VoxelWorld, origin: IVec3, target: IVec3) -> bool {
    let from = cell_center(origin);
    let to = cell_center(target);
    let target_dist = from.distance(to);

    let mut hit = false;
    walk_segment(from, to, |step| {
        if step.cell == origin || step.cell == target {
            return true;
        }
        if world.block_at(step.cell).is_blast_opaque()
            && from.distance(cell_center(step.cell)) < target_dist
        {
            hit = true;
            return false;
        }
        true
    });
    hit
}

/// Hash an integer to `[0, 1)`.
fn hash_unit(seed: u32) -> f32 {
    ((seed as f32 * 12.9898 + 78.233).sin() * 43758.5453).fract().abs()
}
