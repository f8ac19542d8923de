//! Spawn system.
//!
//! Places the initial population and periodically tops every species back
//! up toward its target census, a few creatures at a time.

use glam::Vec3;
use rand::Rng;

use crate::game::config::PopulationTargets;
use crate::game::creatures::behavior::IDLE_MS;
use crate::game::creatures::{CreatureId, CreatureRoster, MovementState, PlacementPolicy, Species};
use crate::world::{DEFAULT_SURFACE_HEIGHT, VoxelWorld};

/// Height added above the surface so creatures settle onto it.
pub const SPAWN_HEIGHT_MARGIN: f32 = 0.5;

/// A creature placed by the spawn system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spawned {
    pub creature: CreatureId,
    pub species: Species,
    pub position: Vec3,
}

pub struct SpawnSystem {
    targets: PopulationTargets,
    interval_ms: f32,
    batch_cap: u32,
    elapsed_ms: f32,
}

impl SpawnSystem {
    pub fn new(targets: PopulationTargets, interval_ms: f32, batch_cap: u32) -> Self {
        Self {
            targets,
            interval_ms,
            batch_cap,
            elapsed_ms: 0.0,
        }
    }

    pub fn targets(&self) -> &PopulationTargets {
        &self.targets
    }

    /// Spawn the full initial census.
    pub fn populate<R: Rng>(
        &mut self,
        roster: &mut CreatureRoster,
        world: &VoxelWorld,
        rng: &mut R,
    ) -> Vec<Spawned> {
        let mut spawned = Vec::new();
        for species in Species::ALL {
            for _ in 0..self.targets.target(species) {
                spawned.push(spawn_one(species, roster, world, rng));
            }
        }
        log::info!("spawned initial population of {}", spawned.len());
        spawned
    }

    /// Advance the replenishment clock; on each interval spawn the deficit,
    /// at most `batch_cap` creatures per check.
    pub fn update<R: Rng>(
        &mut self,
        dt_ms: f32,
        roster: &mut CreatureRoster,
        world: &VoxelWorld,
        rng: &mut R,
    ) -> Vec<Spawned> {
        self.elapsed_ms += dt_ms;
        if self.elapsed_ms < self.interval_ms {
            return Vec::new();
        }
        self.elapsed_ms = 0.0;
        self.replenish(roster, world, rng)
    }

    /// Spawn up to `batch_cap` creatures, one species at a time in table
    /// order, to cover the current deficit.
    pub fn replenish<R: Rng>(
        &mut self,
        roster: &mut CreatureRoster,
        world: &VoxelWorld,
        rng: &mut R,
    ) -> Vec<Spawned> {
        let mut deficits: Vec<(Species, u32)> = Species::ALL
            .iter()
            .map(|&s| {
                let live = roster.count(s) as u32;
                (s, self.targets.target(s).saturating_sub(live))
            })
            .filter(|(_, missing)| *missing > 0)
            .collect();

        let mut spawned = Vec::new();
        while (spawned.len() as u32) < self.batch_cap {
            let mut progressed = false;
            for (species, missing) in deficits.iter_mut() {
                if *missing == 0 || spawned.len() as u32 >= self.batch_cap {
                    continue;
                }
                spawned.push(spawn_one(*species, roster, world, rng));
                *missing -= 1;
                progressed = true;
            }
            if !progressed {
                break;
            }
        }

        if !spawned.is_empty() {
            log::info!("replenished {} creatures", spawned.len());
        }
        spawned
    }
}

/// Surface height for a spawn column, falling back to the default height
/// when the column gives nothing usable.
pub fn spawn_height(world: &VoxelWorld, x: f32, z: f32) -> f32 {
    let surface = world.highest_solid_y(x.floor() as i32, z.floor() as i32);
    let y = surface as f32 + SPAWN_HEIGHT_MARGIN;
    if y.is_finite() && surface > 0 && surface <= world.size() {
        y
    } else {
        log::warn!("no usable surface at ({x:.1}, {z:.1}), spawning at default height");
        DEFAULT_SURFACE_HEIGHT as f32 + SPAWN_HEIGHT_MARGIN
    }
}

fn spawn_one<R: Rng>(
    species: Species,
    roster: &mut CreatureRoster,
    world: &VoxelWorld,
    rng: &mut R,
) -> Spawned {
    let (x, z) = species.profile().pick_column(world.size(), rng);
    let position = Vec3::new(x, spawn_height(world, x, z), z);
    let heading = rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI);
    let creature = roster.spawn(species, position, heading);
    if let Some(spawned) = roster.get_mut(creature) {
        spawned.state = MovementState::Idle {
            remaining_ms: rng.gen_range(IDLE_MS),
        };
    }
    log::trace!("spawned {species} {creature} at {position}");
    Spawned {
        creature,
        species,
        position,
    }
}
