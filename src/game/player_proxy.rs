//! Player Proxy
//!
//! The player is owned by the host application. Creatures only need its
//! feet position and footprint to steer around it.

use glam::{Vec2, Vec3};

use crate::physics::Body;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerProxy {
    /// Feet position in world space
    pub position: Vec3,
    pub body: Body,
}

impl PlayerProxy {
    /// Standard player capsule: 0.3 radius, 1.8 tall.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            body: Body::new(0.3, 1.8),
        }
    }

    /// Whether a body of `radius` standing at `feet` would overlap the player.
    pub fn overlaps(&self, feet: Vec3, radius: f32, height: f32) -> bool {
        let horizontal = Vec2::new(feet.x - self.position.x, feet.z - self.position.z).length();
        let vertical_overlap =
            feet.y < self.position.y + self.body.height && self.position.y < feet.y + height;
        horizontal < radius + self.body.radius && vertical_overlap
    }
}
