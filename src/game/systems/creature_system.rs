//! Creature lifecycle system.
//!
//! Owns the creature roster and runs the per-tick sequence for every live
//! creature: NaN repair, physics, wander AI (or magnet pull), leg animation
//! and overlap resolution against terrain, the player and each other.
//!
//! Collision checks during movement read a position snapshot taken at the
//! start of the tick, so update order does not leak into behavior.

use glam::{Vec2, Vec3};
use rand::Rng;

use crate::game::config::SimSettings;
use crate::game::creatures::behavior::{animate_legs, magnet_pull};
use crate::game::creatures::{
    Creature, CreatureId, CreatureRoster, Species, apply_physics, update_movement,
};
use crate::game::player_proxy::PlayerProxy;
use crate::physics::{blocked, push_apart, push_out_of_block};
use crate::render::{CreatureInstance, FLAG_GROUNDED, FLAG_WALKING};
use crate::world::{BlockType, VoxelWorld, clamp_to_world, world_to_cell};

/// Creatures whose feet drop below this height are removed.
pub const FALL_OUT_Y: f32 = -8.0;

/// Vertical distance within which two bodies can collide.
const VERTICAL_CONTACT: f32 = 1.0;

/// Share of the overlap corrected per tick when pushing creatures apart.
const SEPARATION_STRENGTH: f32 = 1.0;

/// What happened to the roster during one update.
#[derive(Debug, Default)]
pub struct CreatureUpdate {
    /// Creatures that fell out of the world and were removed
    pub despawned: Vec<(CreatureId, Species)>,
    /// Creatures whose state had to be repaired
    pub repaired: usize,
}

#[derive(Clone, Copy)]
struct BodySnapshot {
    id: CreatureId,
    position: Vec3,
    radius: f32,
}

pub struct CreatureSystem {
    roster: CreatureRoster,
}

impl Default for CreatureSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl CreatureSystem {
    pub fn new() -> Self {
        Self {
            roster: CreatureRoster::new(),
        }
    }

    pub fn roster(&self) -> &CreatureRoster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut CreatureRoster {
        &mut self.roster
    }

    /// Run one tick for every live creature.
    ///
    /// `magnet_targets` is `Some` while the magnet effect is active; affected
    /// creatures skip their wander AI for the tick.
    pub fn update<R: Rng>(
        &mut self,
        world: &VoxelWorld,
        player: Option<&PlayerProxy>,
        magnet_targets: Option<&[Vec3]>,
        settings: &SimSettings,
        dt_ms: f32,
        rng: &mut R,
    ) -> CreatureUpdate {
        let dt_s = dt_ms / 1000.0;
        let mut result = CreatureUpdate::default();
        let fallback = safe_fallback(world);
        let snapshot: Vec<BodySnapshot> = self
            .roster
            .iter()
            .filter(|c| c.is_active())
            .map(|c| BodySnapshot {
                id: c.id,
                position: c.position,
                radius: c.profile().radius,
            })
            .collect();

        for id in self.roster.ids() {
            let Some(creature) = self.roster.get_mut(id) else {
                continue;
            };
            if !creature.is_active() {
                continue;
            }

            if creature.sanitize(fallback) {
                result.repaired += 1;
            }

            apply_physics(creature, world, settings.gravity, dt_s);

            let pull = match magnet_targets {
                Some(targets) => magnet_pull(
                    creature.position,
                    targets,
                    settings.magnet_radius,
                    settings.magnet_strength,
                    dt_s,
                ),
                None => Vec2::ZERO,
            };
            if pull != Vec2::ZERO {
                creature.position.x += pull.x;
                creature.position.z += pull.y;
            } else {
                let speed = creature.profile().move_speed * settings.default_move_speed;
                let blocker = |c: &Creature, step: Vec2| -> bool {
                    step_blocked(world, player, &snapshot, c, step)
                };
                update_movement(creature, dt_ms, speed, &blocker, rng);
            }

            animate_legs(creature, dt_ms);

            let push = push_out_of_block(world, creature.position);
            creature.position.x += push.x;
            creature.position.z += push.y;

            if let Some(player) = player {
                let shove = push_apart(
                    creature.position,
                    player.position,
                    creature.profile().radius + player.body.radius,
                    SEPARATION_STRENGTH * 2.0,
                    id.0,
                );
                creature.position.x += shove.x;
                creature.position.z += shove.y;
            }

            if creature.position.y < FALL_OUT_Y {
                result.despawned.push((creature.id, creature.species));
            }
        }

        self.separate_creatures();

        let size = world.size();
        for creature in self.roster.iter_mut().filter(|c| c.is_active()) {
            creature.position = clamp_to_world(creature.position, size, creature.profile().radius);
        }

        for (id, species) in &result.despawned {
            self.roster.remove(*id);
            log::debug!("{species} {id} fell out of the world");
        }
        result
    }

    /// Symmetric push-apart for every overlapping pair of live creatures.
    fn separate_creatures(&mut self) {
        let bodies: Vec<BodySnapshot> = self
            .roster
            .iter()
            .filter(|c| c.is_active())
            .map(|c| BodySnapshot {
                id: c.id,
                position: c.position,
                radius: c.profile().radius,
            })
            .collect();

        let mut pushes = vec![Vec2::ZERO; bodies.len()];
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                let (a, b) = (bodies[i], bodies[j]);
                if (a.position.y - b.position.y).abs() > VERTICAL_CONTACT {
                    continue;
                }
                let seed = a.id.0.wrapping_mul(31).wrapping_add(b.id.0);
                let push = push_apart(
                    a.position,
                    b.position,
                    a.radius + b.radius,
                    SEPARATION_STRENGTH,
                    seed,
                );
                pushes[i] += push;
                pushes[j] -= push;
            }
        }

        for (body, push) in bodies.iter().zip(pushes) {
            if push == Vec2::ZERO {
                continue;
            }
            if let Some(creature) = self.roster.get_mut(body.id) {
                creature.position.x += push.x;
                creature.position.z += push.y;
            }
        }
    }

    /// Live creatures standing in a Fire cell.
    pub fn find_burning(&self, world: &VoxelWorld) -> Vec<CreatureId> {
        self.roster
            .iter()
            .filter(|c| c.is_active() && c.position.is_finite())
            .filter(|c| {
                let feet = world_to_cell(c.position + Vec3::Y * 0.1);
                let body = world_to_cell(c.body_center());
                world.block_at(feet) == BlockType::Fire || world.block_at(body) == BlockType::Fire
            })
            .map(|c| c.id)
            .collect()
    }

    /// Mark a creature as ejected and take it out of the roster.
    pub fn eject(&mut self, id: CreatureId) -> Option<Creature> {
        let mut creature = self.roster.remove(id)?;
        creature.ejected = true;
        Some(creature)
    }

    pub fn instances(&self) -> Vec<CreatureInstance> {
        self.roster
            .iter()
            .filter(|c| c.is_active())
            .map(|c| {
                let mut flags = 0;
                if c.state.is_walking() {
                    flags |= FLAG_WALKING;
                }
                if c.grounded {
                    flags |= FLAG_GROUNDED;
                }
                CreatureInstance {
                    position: c.position.to_array(),
                    heading: c.heading,
                    leg_swing: c.leg_swing,
                    species: c.species.to_u32(),
                    height: c.profile().height,
                    flags,
                }
            })
            .collect()
    }
}

/// Would `creature` moving by `step` hit terrain, leave the world, walk into
/// the player or close in on another creature?
fn step_blocked(
    world: &VoxelWorld,
    player: Option<&PlayerProxy>,
    others: &[BodySnapshot],
    creature: &Creature,
    step: Vec2,
) -> bool {
    let body = creature.body();
    if blocked(world, creature.position, step, body) {
        return true;
    }

    let target = creature.position + Vec3::new(step.x, 0.0, step.y);
    if let Some(player) = player {
        if player.overlaps(target, body.radius, body.height) {
            return true;
        }
    }

    let here = Vec2::new(creature.position.x, creature.position.z);
    let there = Vec2::new(target.x, target.z);
    others.iter().any(|other| {
        if other.id == creature.id
            || (other.position.y - creature.position.y).abs() > VERTICAL_CONTACT
        {
            return false;
        }
        let center = Vec2::new(other.position.x, other.position.z);
        let min_sep = body.radius + other.radius;
        let new_dist = there.distance(center);
        new_dist < min_sep && new_dist < here.distance(center)
    })
}

/// World center standing on the ground, used when a creature's history is
/// unusable.
fn safe_fallback(world: &VoxelWorld) -> Vec3 {
    let center = world.center();
    let surface = world.highest_solid_y(center.x as i32, center.z as i32);
    Vec3::new(center.x, surface as f32, center.z)
}
