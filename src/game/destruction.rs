//! Debris Particles
//!
//! Short-lived ballistic fragments spawned when a blast destroys a block,
//! and ragdolls left behind by creatures killed in a blast or by fire.
//!
//! Debris advances once per tick with per-tick units: gravity is
//! subtracted from the vertical velocity, velocity is added to the position
//! and the lifetime counts down in ticks. Ragdolls also shrink every tick
//! and are never simulated as live creatures again.

use glam::{IVec3, Vec3};
use rand::Rng;

use super::creatures::{CreatureId, Species};
use crate::render::{CREATURE_DEBRIS_BASE, DebrisInstance};
use crate::world::{BlockType, cell_center};

/// Horizontal launch speed range for block fragments (blocks/tick)
const FRAGMENT_SPEED: std::ops::RangeInclusive<f32> = 0.06..=0.18;
/// Upward kick range for block fragments (blocks/tick)
const FRAGMENT_LIFT: std::ops::RangeInclusive<f32> = 0.08..=0.22;
/// Random spread added on every axis (blocks/tick)
const FRAGMENT_JITTER: f32 = 0.04;
/// Spin range on every axis (radians/tick)
const FRAGMENT_SPIN: f32 = 0.25;
/// Fragment scale range (fraction of a block)
const FRAGMENT_SCALE: std::ops::RangeInclusive<f32> = 0.2..=0.4;

/// Ragdoll lifetime after a blast kill (ticks)
pub const RAGDOLL_LIFETIME_TICKS: u32 = 60;
/// Ragdoll lifetime after burning (ticks)
pub const BURN_LIFETIME_TICKS: u32 = 40;
/// Per-tick scale factor for blast ragdolls
const RAGDOLL_SHRINK: f32 = 0.97;
/// Per-tick scale factor for burned creatures
const BURN_SHRINK: f32 = 0.93;

/// What a debris particle came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DebrisSource {
    Block(BlockType),
    Creature { creature: CreatureId, species: Species },
}

#[derive(Debug, Clone)]
pub struct DebrisParticle {
    pub position: Vec3,
    /// Blocks per tick
    pub velocity: Vec3,
    /// Euler angles (radians)
    pub rotation: Vec3,
    /// Radians per tick
    pub angular_velocity: Vec3,
    /// Ticks left before removal
    pub lifetime: u32,
    /// Blocks per tick²
    pub gravity: f32,
    /// Per-tick scale multiplier for ragdolls
    pub shrink: Option<f32>,
    pub scale: f32,
    pub source: DebrisSource,
}

impl DebrisParticle {
    /// Advance one tick. Returns `false` once the particle should be removed.
    pub fn update(&mut self) -> bool {
        self.velocity.y -= self.gravity;
        self.position += self.velocity;
        self.rotation += self.angular_velocity;
        if let Some(factor) = self.shrink {
            self.scale *= factor;
        }
        self.lifetime = self.lifetime.saturating_sub(1);
        self.is_alive()
    }

    pub fn is_alive(&self) -> bool {
        self.lifetime > 0 && self.position.y >= 0.0 && self.position.is_finite()
    }

    /// Ragdolls are purely visual; they never take part in AI collision or
    /// blast damage.
    pub fn is_ragdoll(&self) -> bool {
        matches!(self.source, DebrisSource::Creature { .. })
    }

    pub fn to_instance(&self) -> DebrisInstance {
        let kind = match self.source {
            DebrisSource::Block(block) => block.to_u8() as u32,
            DebrisSource::Creature { species, .. } => CREATURE_DEBRIS_BASE + species.to_u32(),
        };
        DebrisInstance {
            position: self.position.to_array(),
            scale: self.scale,
            rotation: self.rotation.to_array(),
            kind,
        }
    }
}

/// Spawn `count` fragments for a destroyed cell, flung away from the blast
/// origin with an upward bias.
pub fn spawn_block_debris<R: Rng>(
    cell: IVec3,
    block: BlockType,
    origin: IVec3,
    count: usize,
    gravity: f32,
    lifetime_ticks: &std::ops::RangeInclusive<u32>,
    rng: &mut R,
) -> Vec<DebrisParticle> {
    let center = cell_center(cell);
    let outward = (center - cell_center(origin)).normalize_or_zero();

    (0..count)
        .map(|_| {
            let jitter = Vec3::new(
                rng.gen_range(-FRAGMENT_JITTER..=FRAGMENT_JITTER),
                rng.gen_range(-FRAGMENT_JITTER..=FRAGMENT_JITTER),
                rng.gen_range(-FRAGMENT_JITTER..=FRAGMENT_JITTER),
            );
            let velocity = outward * rng.gen_range(FRAGMENT_SPEED)
                + Vec3::Y * rng.gen_range(FRAGMENT_LIFT)
                + jitter;
            let offset = Vec3::new(
                rng.gen_range(-0.3..=0.3),
                rng.gen_range(-0.3..=0.3),
                rng.gen_range(-0.3..=0.3),
            );
            DebrisParticle {
                position: center + offset,
                velocity,
                rotation: Vec3::ZERO,
                angular_velocity: Vec3::new(
                    rng.gen_range(-FRAGMENT_SPIN..=FRAGMENT_SPIN),
                    rng.gen_range(-FRAGMENT_SPIN..=FRAGMENT_SPIN),
                    rng.gen_range(-FRAGMENT_SPIN..=FRAGMENT_SPIN),
                ),
                lifetime: rng.gen_range(lifetime_ticks.clone()),
                gravity,
                shrink: None,
                scale: rng.gen_range(FRAGMENT_SCALE),
                source: DebrisSource::Block(block),
            }
        })
        .collect()
}

/// Ragdoll for a creature killed by a blast at `origin` (world space).
pub fn spawn_creature_ragdoll<R: Rng>(
    creature: CreatureId,
    species: Species,
    position: Vec3,
    origin: Vec3,
    gravity: f32,
    rng: &mut R,
) -> DebrisParticle {
    let mut away = position - origin;
    away.y = 0.0;
    let away = away.normalize_or_zero();
    DebrisParticle {
        position,
        velocity: away * rng.gen_range(0.15..=0.3) + Vec3::Y * rng.gen_range(0.25..=0.4),
        rotation: Vec3::ZERO,
        angular_velocity: Vec3::new(
            rng.gen_range(-0.3..=0.3),
            rng.gen_range(-0.2..=0.2),
            rng.gen_range(-0.3..=0.3),
        ),
        lifetime: RAGDOLL_LIFETIME_TICKS,
        gravity,
        shrink: Some(RAGDOLL_SHRINK),
        scale: 1.0,
        source: DebrisSource::Creature { creature, species },
    }
}

/// Remains of a creature that walked into fire: a small hop and a fast
/// shrink.
pub fn spawn_burned_remains(
    creature: CreatureId,
    species: Species,
    position: Vec3,
    gravity: f32,
) -> DebrisParticle {
    DebrisParticle {
        position,
        velocity: Vec3::Y * 0.12,
        rotation: Vec3::ZERO,
        angular_velocity: Vec3::new(0.0, 0.15, 0.0),
        lifetime: BURN_LIFETIME_TICKS,
        gravity,
        shrink: Some(BURN_SHRINK),
        scale: 1.0,
        source: DebrisSource::Creature { creature, species },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn still_particle(lifetime: u32) -> DebrisParticle {
        DebrisParticle {
            position: Vec3::new(0.0, 50.0, 0.0),
            velocity: Vec3::ZERO,
            rotation: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            lifetime,
            gravity: 0.0,
            shrink: None,
            scale: 1.0,
            source: DebrisSource::Block(BlockType::Dirt),
        }
    }

    #[test]
    fn test_removed_after_exact_lifetime() {
        let mut p = still_particle(5);
        for tick in 1..5 {
            assert!(p.update(), "particle died early at tick {tick}");
        }
        assert!(!p.update());
        assert_eq!(p.lifetime, 0);
    }

    #[test]
    fn test_removed_below_floor_first() {
        let mut p = still_particle(100);
        p.position.y = 0.05;
        p.velocity.y = -0.1;
        assert!(!p.update());
        assert_eq!(p.lifetime, 99);
    }

    #[test]
    fn test_gravity_is_per_tick() {
        let mut p = still_particle(10);
        p.gravity = 0.015;
        p.update();
        assert!((p.velocity.y + 0.015).abs() < 1e-7);
        assert!((p.position.y - (50.0 - 0.015)).abs() < 1e-5);
    }

    #[test]
    fn test_block_debris_flies_outward_and_up() {
        let mut rng = StdRng::seed_from_u64(9);
        let debris = spawn_block_debris(
            IVec3::new(12, 5, 10),
            BlockType::Dirt,
            IVec3::new(10, 5, 10),
            4,
            0.015,
            &(45..=90),
            &mut rng,
        );
        assert_eq!(debris.len(), 4);
        for p in &debris {
            assert!(p.velocity.x > 0.0, "fragment not outward: {:?}", p.velocity);
            assert!(p.velocity.y > 0.0);
            assert!((45..=90).contains(&p.lifetime));
            assert!(!p.is_ragdoll());
        }
    }

    #[test]
    fn test_ragdoll_shrinks_and_reports_kind() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut p = spawn_creature_ragdoll(
            CreatureId(7),
            Species::Sheep,
            Vec3::new(5.0, 6.0, 5.0),
            Vec3::new(4.0, 6.0, 5.0),
            0.015,
            &mut rng,
        );
        assert!(p.is_ragdoll());
        p.update();
        assert!(p.scale < 1.0);
        assert_eq!(p.to_instance().kind, CREATURE_DEBRIS_BASE + 2);
    }
}
