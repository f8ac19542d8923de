//! Creature Behavior
//!
//! Per-creature, per-tick steps. Each function mutates one creature and
//! nothing else; the creature system decides the order and supplies the
//! collision context.
//!
//! ## Step order (see `CreatureSystem::update`)
//! 1. [`Creature::sanitize`]
//! 2. [`apply_physics`] - ground probe, blended snap or gravity
//! 3. [`update_movement`] - Idle / Walking / Turning
//! 4. [`animate_legs`]
//! 5. magnet pull and overlap resolution (creature system)

use glam::{Vec2, Vec3};
use rand::Rng;

use super::creature::{Creature, MovementState, heading_vector, lerp_angle, wrap_angle};
use super::species::LegSwing;
use crate::world::VoxelWorld;

// ============================================================================
// TUNING
// ============================================================================

/// Rest duration range while idle (ms)
pub const IDLE_MS: std::ops::RangeInclusive<f32> = 2000.0..=6000.0;
/// Walk duration range (ms)
pub const WALK_MS: std::ops::RangeInclusive<f32> = 1000.0..=3000.0;
/// Turn magnitude when blocked (degrees, either direction)
pub const TURN_DEGREES: std::ops::RangeInclusive<f32> = 70.0..=110.0;
/// Fixed duration of a turn (ms)
pub const TURN_DURATION_MS: f32 = 500.0;

/// Cells probed below the feet when looking for ground.
const GROUND_PROBE_DEPTH: i32 = 2;
/// A body this close above a ground face counts as standing on it.
const GROUND_SNAP_RANGE: f32 = 0.3;
/// Blend rate toward standing height (1/s).
const GROUND_SNAP_RATE: f32 = 15.0;
/// Residual offset that is snapped outright.
const GROUND_SNAP_EPSILON: f32 = 0.01;
/// Fall speed cap (blocks/s).
const TERMINAL_VELOCITY: f32 = 40.0;

// ============================================================================
// PHYSICS
// ============================================================================

/// Top face of the first ground block in the short column under `feet`.
///
/// The probe starts half a block above the feet so a creature that sank
/// slightly into the ground still finds it. Leaves and low-profile blocks
/// are ignored.
pub fn ground_below(world: &VoxelWorld, feet: Vec3) -> Option<f32> {
    let cx = feet.x.floor() as i32;
    let cz = feet.z.floor() as i32;
    let start = (feet.y + 0.5).floor() as i32;
    let end = feet.y.floor() as i32 - GROUND_PROBE_DEPTH;
    (end..=start)
        .rev()
        .find(|&y| world.get(cx, y, cz).is_ground())
        .map(|y| (y + 1) as f32)
}

/// Gravity and ground snapping.
///
/// On ground the feet blend toward the ground face and vertical velocity is
/// cleared. In the air gravity accumulates; a fall that would pass through
/// the ground face lands exactly on it.
pub fn apply_physics(creature: &mut Creature, world: &VoxelWorld, gravity: f32, dt_s: f32) {
    let ground = ground_below(world, creature.position);

    if let Some(top) = ground {
        let gap = creature.position.y - top;
        if gap <= GROUND_SNAP_RANGE && creature.velocity.y <= 0.0 {
            let blend = (GROUND_SNAP_RATE * dt_s).min(1.0);
            creature.position.y += (top - creature.position.y) * blend;
            if (creature.position.y - top).abs() < GROUND_SNAP_EPSILON {
                creature.position.y = top;
            }
            creature.velocity.y = 0.0;
            creature.grounded = true;
            return;
        }
    }

    creature.grounded = false;
    creature.velocity.y = (creature.velocity.y - gravity * dt_s).max(-TERMINAL_VELOCITY);
    creature.position.y += creature.velocity.y * dt_s;

    if let Some(top) = ground {
        if creature.position.y < top {
            creature.position.y = top;
            creature.velocity.y = 0.0;
            creature.grounded = true;
        }
    }
}

// ============================================================================
// MOVEMENT AI
// ============================================================================

/// What the walking step ran into, if anything.
pub trait StepBlocker {
    /// Would moving `creature` by `step` (XZ) collide with terrain, bounds,
    /// the player or another creature?
    fn is_blocked(&self, creature: &Creature, step: Vec2) -> bool;
}

impl<F: Fn(&Creature, Vec2) -> bool> StepBlocker for F {
    fn is_blocked(&self, creature: &Creature, step: Vec2) -> bool {
        self(creature, step)
    }
}

/// Advance the Idle / Walking / Turning machine by `dt_ms`.
///
/// `speed` is the final walking speed in blocks/s.
pub fn update_movement<R: Rng>(
    creature: &mut Creature,
    dt_ms: f32,
    speed: f32,
    blocker: &impl StepBlocker,
    rng: &mut R,
) {
    match creature.state {
        MovementState::Idle { remaining_ms } => {
            let remaining_ms = remaining_ms - dt_ms;
            if remaining_ms <= 0.0 {
                let heading = rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI);
                creature.heading = heading;
                creature.move_dir = heading_vector(heading);
                creature.state = MovementState::Walking {
                    remaining_ms: rng.gen_range(WALK_MS),
                };
            } else {
                creature.state = MovementState::Idle { remaining_ms };
            }
        }
        MovementState::Walking { remaining_ms } => {
            if creature.grounded {
                let step = creature.move_dir * speed * (dt_ms / 1000.0);
                if blocker.is_blocked(creature, step) {
                    start_turn(creature, rng);
                    return;
                }
                creature.position.x += step.x;
                creature.position.z += step.y;
            }
            let remaining_ms = remaining_ms - dt_ms;
            creature.state = if remaining_ms <= 0.0 {
                MovementState::Idle {
                    remaining_ms: rng.gen_range(IDLE_MS),
                }
            } else {
                MovementState::Walking { remaining_ms }
            };
        }
        MovementState::Turning {
            from,
            target,
            elapsed_ms,
        } => {
            let elapsed_ms = elapsed_ms + dt_ms;
            let t = (elapsed_ms / TURN_DURATION_MS).min(1.0);
            creature.heading = lerp_angle(from, target, t);
            if t >= 1.0 {
                creature.heading = wrap_angle(target);
                creature.move_dir = heading_vector(creature.heading);
                creature.state = MovementState::Walking {
                    remaining_ms: rng.gen_range(WALK_MS),
                };
            } else {
                creature.state = MovementState::Turning {
                    from,
                    target,
                    elapsed_ms,
                };
            }
        }
    }
}

/// Begin a 70-110° turn to a random side.
pub fn start_turn<R: Rng>(creature: &mut Creature, rng: &mut R) {
    let magnitude = rng.gen_range(TURN_DEGREES).to_radians();
    let side = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    let target = wrap_angle(creature.heading + magnitude * side);
    log::trace!(
        "{} {} blocked, turning {:.0}°",
        creature.species,
        creature.id,
        (magnitude * side).to_degrees()
    );
    creature.state = MovementState::Turning {
        from: creature.heading,
        target,
        elapsed_ms: 0.0,
    };
}

/// Leg phase runs only while walking and snaps back to neutral otherwise.
pub fn animate_legs(creature: &mut Creature, dt_ms: f32) {
    if creature.state.is_walking() {
        let profile = creature.profile();
        let period = profile.swing_period_ms.max(1.0);
        creature.walk_phase_ms = (creature.walk_phase_ms + dt_ms) % period;
        creature.leg_swing = profile.leg_swing(creature.walk_phase_ms);
    } else {
        creature.walk_phase_ms = 0.0;
        creature.leg_swing = 0.0;
    }
}

// ============================================================================
// MAGNET
// ============================================================================

/// Horizontal pull toward the nearest target within `radius`.
///
/// Pull speed grows linearly from zero at the edge of the radius to
/// `strength` at the center and never overshoots the target.
pub fn magnet_pull(feet: Vec3, targets: &[Vec3], radius: f32, strength: f32, dt_s: f32) -> Vec2 {
    let here = Vec2::new(feet.x, feet.z);
    let nearest = targets
        .iter()
        .map(|t| Vec2::new(t.x, t.z))
        .map(|t| (t, here.distance(t)))
        .filter(|(_, d)| *d <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1));

    let Some((target, dist)) = nearest else {
        return Vec2::ZERO;
    };
    if dist < 1e-4 {
        return Vec2::ZERO;
    }
    let speed = strength * (1.0 - dist / radius);
    (target - here) / dist * (speed * dt_s).min(dist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::creatures::{CreatureId, Species};
    use crate::world::{BlockType, flat_world};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn never_blocked(_: &Creature, _: Vec2) -> bool {
        false
    }

    fn always_blocked(_: &Creature, _: Vec2) -> bool {
        true
    }

    #[test]
    fn test_ground_search_ignores_leaves() {
        let mut world = flat_world(16, 5).unwrap();
        world.set(4, 5, 4, BlockType::Leaves);
        assert_eq!(ground_below(&world, Vec3::new(4.5, 6.0, 4.5)), Some(5.0));
        assert_eq!(ground_below(&world, Vec3::new(4.5, 9.0, 4.5)), None);
    }

    #[test]
    fn test_grounded_creature_stays_put() {
        let world = flat_world(16, 5).unwrap();
        let mut c = Creature::new(CreatureId(1), Species::Pig, Vec3::new(8.5, 5.0, 8.5), 0.0);
        for _ in 0..30 {
            apply_physics(&mut c, &world, 20.0, 0.016);
        }
        assert!(c.grounded);
        assert_eq!(c.position.y, 5.0);
        assert_eq!(c.velocity.y, 0.0);
    }

    #[test]
    fn test_snap_is_blended() {
        let world = flat_world(16, 5).unwrap();
        let mut c = Creature::new(CreatureId(1), Species::Pig, Vec3::new(8.5, 5.2, 8.5), 0.0);
        apply_physics(&mut c, &world, 20.0, 0.016);
        assert!(c.position.y < 5.2 && c.position.y > 5.0, "y = {}", c.position.y);
    }

    #[test]
    fn test_falling_lands_on_ground_face() {
        let world = flat_world(16, 5).unwrap();
        let mut c = Creature::new(CreatureId(1), Species::Cow, Vec3::new(8.5, 9.0, 8.5), 0.0);
        for _ in 0..200 {
            apply_physics(&mut c, &world, 20.0, 0.016);
        }
        assert!(c.grounded);
        assert!((c.position.y - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_idle_expires_into_walking() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut c = Creature::new(CreatureId(1), Species::Sheep, Vec3::ZERO, 0.0);
        c.state = MovementState::Idle { remaining_ms: 20.0 };
        update_movement(&mut c, 16.0, 1.0, &never_blocked, &mut rng);
        assert!(matches!(c.state, MovementState::Idle { .. }));
        update_movement(&mut c, 16.0, 1.0, &never_blocked, &mut rng);
        let MovementState::Walking { remaining_ms } = c.state else {
            panic!("expected Walking, got {:?}", c.state);
        };
        assert!(WALK_MS.contains(&remaining_ms));
        assert!((c.move_dir - heading_vector(c.heading)).length() < 1e-5);
    }

    #[test]
    fn test_walk_timer_expiry_rests_for_idle_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let mut c = Creature::new(CreatureId(1), Species::Cow, Vec3::new(5.0, 5.0, 5.0), 0.0);
            c.grounded = true;
            c.state = MovementState::Walking { remaining_ms: 10.0 };
            update_movement(&mut c, 16.0, 1.0, &never_blocked, &mut rng);
            let MovementState::Idle { remaining_ms } = c.state else {
                panic!("expected Idle, got {:?}", c.state);
            };
            assert!(IDLE_MS.contains(&remaining_ms), "rest of {remaining_ms}ms");
        }
    }

    #[test]
    fn test_walking_moves_along_heading_when_grounded() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut c = Creature::new(CreatureId(1), Species::Pig, Vec3::new(5.0, 5.0, 5.0), 0.0);
        c.grounded = true;
        c.state = MovementState::Walking { remaining_ms: 2000.0 };
        update_movement(&mut c, 100.0, 2.0, &never_blocked, &mut rng);
        assert!((c.position.z - 5.2).abs() < 1e-5);
        assert!((c.position.x - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_airborne_walker_does_not_move() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut c = Creature::new(CreatureId(1), Species::Pig, Vec3::new(5.0, 8.0, 5.0), 0.0);
        c.state = MovementState::Walking { remaining_ms: 2000.0 };
        update_movement(&mut c, 100.0, 2.0, &never_blocked, &mut rng);
        assert_eq!(c.position, Vec3::new(5.0, 8.0, 5.0));
    }

    #[test]
    fn test_blocked_walker_turns_then_walks_on_target_heading() {
        let mut rng = StdRng::seed_from_u64(3);
        let start = Vec3::new(5.0, 5.0, 5.0);
        let mut c = Creature::new(CreatureId(1), Species::Chicken, start, 0.3);
        c.grounded = true;
        c.state = MovementState::Walking { remaining_ms: 2000.0 };

        update_movement(&mut c, 16.0, 2.0, &always_blocked, &mut rng);
        assert_eq!(c.position, start, "blocked creature must not move");
        let MovementState::Turning { target, .. } = c.state else {
            panic!("expected Turning, got {:?}", c.state);
        };
        let turned = wrap_angle(target - 0.3).abs().to_degrees();
        assert!((70.0 - 1e-3..=110.0 + 1e-3).contains(&turned), "turned {turned}°");

        let mut elapsed = 0.0;
        while elapsed < TURN_DURATION_MS {
            assert!(c.state.is_turning());
            update_movement(&mut c, 50.0, 2.0, &always_blocked, &mut rng);
            elapsed += 50.0;
        }
        assert!(c.state.is_walking(), "state after turn: {:?}", c.state);
        assert!(wrap_angle(c.heading - target).abs() < 1e-4);
        assert!((c.move_dir - heading_vector(target)).length() < 1e-4);
    }

    #[test]
    fn test_legs_rest_when_not_walking() {
        let mut c = Creature::new(CreatureId(1), Species::Pig, Vec3::ZERO, 0.0);
        c.state = MovementState::Walking { remaining_ms: 1000.0 };
        animate_legs(&mut c, 150.0);
        assert!(c.leg_swing.abs() > 0.0);
        c.state = MovementState::Idle { remaining_ms: 1000.0 };
        animate_legs(&mut c, 16.0);
        assert_eq!(c.leg_swing, 0.0);
        assert_eq!(c.walk_phase_ms, 0.0);
    }

    #[test]
    fn test_magnet_pulls_toward_nearest_in_range() {
        let feet = Vec3::new(0.0, 5.0, 0.0);
        let targets = [
            Vec3::new(4.0, 5.0, 0.0),
            Vec3::new(0.0, 5.0, -2.0),
            Vec3::new(50.0, 5.0, 0.0),
        ];
        let pull = magnet_pull(feet, &targets, 12.0, 6.0, 0.1);
        assert!(pull.y < 0.0 && pull.x.abs() < 1e-6, "pull = {pull:?}");

        let closer = magnet_pull(Vec3::new(0.0, 5.0, -1.0), &targets, 12.0, 6.0, 0.1);
        assert!(closer.length() > pull.length());

        assert_eq!(magnet_pull(feet, &targets[2..], 12.0, 6.0, 0.1), Vec2::ZERO);
    }
}
