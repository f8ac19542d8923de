//! Debris lifecycle system.
//!
//! Owns every live debris particle and ragdoll. Particles are stepped once
//! per tick and dropped when their lifetime runs out or they fall below the
//! world floor. When the population exceeds the configured cap the oldest
//! particles go first.

use crate::game::destruction::DebrisParticle;
use crate::render::DebrisInstance;

pub struct DebrisSystem {
    particles: Vec<DebrisParticle>,
    max_particles: usize,
    total_spawned: u64,
}

impl DebrisSystem {
    pub fn new(max_particles: usize) -> Self {
        Self {
            particles: Vec::new(),
            max_particles,
            total_spawned: 0,
        }
    }

    /// Add particles, evicting the oldest beyond the cap.
    pub fn spawn(&mut self, particles: impl IntoIterator<Item = DebrisParticle>) {
        let before = self.particles.len();
        self.particles.extend(particles);
        self.total_spawned += (self.particles.len() - before) as u64;

        if self.particles.len() > self.max_particles {
            let excess = self.particles.len() - self.max_particles;
            self.particles.drain(..excess);
            log::trace!("debris cap reached, dropped {excess} oldest particles");
        }
    }

    /// Step every particle one tick. Returns how many were removed.
    pub fn update(&mut self) -> usize {
        let before = self.particles.len();
        self.particles.retain_mut(|p| p.update());
        before - self.particles.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DebrisParticle> {
        self.particles.iter()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Ragdoll count (creature-derived particles).
    pub fn ragdoll_count(&self) -> usize {
        self.particles.iter().filter(|p| p.is_ragdoll()).count()
    }

    pub fn total_spawned(&self) -> u64 {
        self.total_spawned
    }

    pub fn instances(&self) -> Vec<DebrisInstance> {
        self.particles.iter().map(DebrisParticle::to_instance).collect()
    }
}
