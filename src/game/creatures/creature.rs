//! Creature Record
//!
//! One record type for every species; the species tag selects the
//! parameter row. Creatures are addressed by [`CreatureId`] so timers,
//! events and debris never hold references into the roster.

use glam::{Vec2, Vec3};
use serde::Serialize;

use super::species::{Species, SpeciesProfile};
use crate::physics::Body;

/// Stable creature handle. Never reused within one simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CreatureId(pub u32);

impl std::fmt::Display for CreatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Wander state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementState {
    /// Standing still until the rest timer runs out
    Idle { remaining_ms: f32 },
    /// Walking along `move_dir` until the walk timer runs out
    Walking { remaining_ms: f32 },
    /// Rotating from `from` toward `target` over a fixed transition
    Turning {
        from: f32,
        target: f32,
        elapsed_ms: f32,
    },
}

impl MovementState {
    pub fn is_walking(&self) -> bool {
        matches!(self, MovementState::Walking { .. })
    }

    pub fn is_turning(&self) -> bool {
        matches!(self, MovementState::Turning { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            MovementState::Idle { .. } => "Idle",
            MovementState::Walking { .. } => "Walking",
            MovementState::Turning { .. } => "Turning",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Creature {
    pub id: CreatureId,
    pub species: Species,
    /// Feet position in world space
    pub position: Vec3,
    /// Velocity (blocks/s); only the vertical component is integrated
    pub velocity: Vec3,
    /// Facing angle around +Y (radians); 0 faces +Z
    pub heading: f32,
    /// Unit XZ direction of travel while walking
    pub move_dir: Vec2,
    pub grounded: bool,
    pub state: MovementState,
    /// Leg animation clock (ms), only runs while walking
    pub walk_phase_ms: f32,
    /// Current leg rotation (radians)
    pub leg_swing: f32,
    /// Set once a blast or fire has turned this creature into debris
    pub ejected: bool,
    /// Last position that passed the NaN check
    pub last_safe_position: Vec3,
}

impl Creature {
    pub fn new(id: CreatureId, species: Species, position: Vec3, heading: f32) -> Self {
        Self {
            id,
            species,
            position,
            velocity: Vec3::ZERO,
            heading,
            move_dir: heading_vector(heading),
            grounded: false,
            state: MovementState::Idle { remaining_ms: 0.0 },
            walk_phase_ms: 0.0,
            leg_swing: 0.0,
            ejected: false,
            last_safe_position: position,
        }
    }

    #[inline]
    pub fn profile(&self) -> &'static SpeciesProfile {
        self.species.profile()
    }

    #[inline]
    pub fn body(&self) -> Body {
        let profile = self.profile();
        Body::new(profile.radius, profile.height)
    }

    /// Center of the body, used for blast distance.
    pub fn body_center(&self) -> Vec3 {
        self.position + Vec3::Y * 0.5
    }

    /// Whether AI, collision and blasts still apply to this creature.
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.ejected
    }

    /// Repair non-finite state before it reaches the physics step.
    ///
    /// Position falls back to the last safe position, or `fallback` if that
    /// is corrupt too. Returns `true` when anything was repaired.
    pub fn sanitize(&mut self, fallback: Vec3) -> bool {
        let mut repaired = false;
        if !self.position.is_finite() {
            self.position = if self.last_safe_position.is_finite() {
                self.last_safe_position
            } else {
                fallback
            };
            repaired = true;
        }
        if !self.velocity.is_finite() {
            self.velocity = Vec3::ZERO;
            repaired = true;
        }
        if !self.heading.is_finite() {
            self.heading = 0.0;
            repaired = true;
        }
        if !self.move_dir.is_finite() {
            self.move_dir = heading_vector(self.heading);
            repaired = true;
        }
        if repaired {
            log::warn!(
                "repaired non-finite state on {} {}; now at {:?}",
                self.species,
                self.id,
                self.position
            );
        }
        self.last_safe_position = self.position;
        repaired
    }
}

/// Unit XZ vector for a heading; heading 0 points along +Z.
#[inline]
pub fn heading_vector(heading: f32) -> Vec2 {
    Vec2::new(heading.sin(), heading.cos())
}

/// Wrap an angle into `(-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// Shortest-arc interpolation between two angles.
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    let delta = wrap_angle(to - from);
    wrap_angle(from + delta * t.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_sanitize_restores_last_safe_position() {
        let mut c = Creature::new(CreatureId(1), Species::Pig, Vec3::new(4.0, 5.0, 4.0), 0.0);
        assert!(!c.sanitize(Vec3::ZERO));
        c.position.x = f32::NAN;
        c.velocity.y = f32::INFINITY;
        assert!(c.sanitize(Vec3::splat(32.0)));
        assert_eq!(c.position, Vec3::new(4.0, 5.0, 4.0));
        assert_eq!(c.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_sanitize_uses_fallback_when_history_is_bad() {
        let mut c = Creature::new(CreatureId(1), Species::Cow, Vec3::splat(f32::NAN), 0.0);
        assert!(c.sanitize(Vec3::new(32.0, 10.0, 32.0)));
        assert_eq!(c.position, Vec3::new(32.0, 10.0, 32.0));
    }

    #[test]
    fn test_wrap_angle_range() {
        for raw in [-7.0, -PI, 0.0, PI, 3.0 * PI, 10.0] {
            let w = wrap_angle(raw);
            assert!(w > -PI - 1e-5 && w <= PI + 1e-5, "{raw} wrapped to {w}");
            let diff = (raw - w).rem_euclid(2.0 * PI);
            assert!(diff < 1e-4 || diff > 2.0 * PI - 1e-4, "{raw} and {w} differ by {diff}");
        }
    }

    #[test]
    fn test_lerp_angle_takes_short_way() {
        let mid = lerp_angle(PI - 0.1, -PI + 0.1, 0.5);
        assert!((mid.abs() - PI).abs() < 1e-4, "went the long way: {mid}");
    }

    #[test]
    fn test_heading_zero_faces_plus_z() {
        let v = heading_vector(0.0);
        assert!(v.x.abs() < 1e-6 && (v.y - 1.0).abs() < 1e-6);
    }
}
