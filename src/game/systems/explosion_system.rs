//! Explosion lifecycle system.
//!
//! Owns every explosive block, its fuse and blink timers, blast propagation
//! through the voxel grid, chain-detonation scheduling and the transient
//! flashes handed to the renderer.
//!
//! ## Explosive lifecycle
//! `Idle -> Armed -> Exploding -> Removed`. Arming schedules a fuse and a
//! blink timer. A detonation (fuse expiry or a chain hit) cancels every
//! pending timer of that block before anything else happens, clears the
//! cell, propagates the blast and finally drops the block from the index,
//! so a stale timer can never find it again.

use std::collections::{BTreeMap, HashMap};

use glam::{IVec3, Vec3};
use rand::Rng;
use serde::Serialize;

use crate::error::{SimError, SimResult};
use crate::game::config::SimSettings;
use crate::game::creatures::{CreatureId, CreatureRoster, Species};
use crate::game::destruction::{DebrisParticle, spawn_block_debris};
use crate::game::scheduler::{Scheduler, TimerId};
use crate::physics::line_of_sight_blocked;
use crate::world::{BlockType, VoxelWorld, cell_center};

/// Per-cell jitter applied to the blast radius.
pub const RADIUS_JITTER: std::ops::RangeInclusive<f32> = 0.9..=1.1;

/// Debris fragments spawned per destroyed cell.
const DEBRIS_PER_CELL: std::ops::RangeInclusive<usize> = 2..=4;

/// Stable explosive handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ExplosiveId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExplosiveState {
    Idle,
    Armed,
    Exploding,
    Removed,
}

/// Deferred work queued on the simulation scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimTimer {
    FuseExpired(ExplosiveId),
    BlinkToggle(ExplosiveId),
    ChainDetonation(ExplosiveId),
    FlashExpired(u32),
}

#[derive(Debug, Clone)]
pub struct ExplosiveBlock {
    pub id: ExplosiveId,
    pub cell: IVec3,
    pub state: ExplosiveState,
    /// Countdown timer while armed
    pub fuse: Option<TimerId>,
    /// Next blink toggle while armed
    pub blink: Option<TimerId>,
    /// Pending chain detonation, if another blast caught this block
    pub chain: Option<TimerId>,
    /// Cosmetic blink phase
    pub lit: bool,
}

impl ExplosiveBlock {
    fn new(id: ExplosiveId, cell: IVec3) -> Self {
        Self {
            id,
            cell,
            state: ExplosiveState::Idle,
            fuse: None,
            blink: None,
            chain: None,
            lit: false,
        }
    }

    /// Cancel every pending timer. Safe to call repeatedly.
    fn cancel_timers(&mut self, scheduler: &mut Scheduler<SimTimer>) {
        for timer in [self.fuse.take(), self.blink.take(), self.chain.take()]
            .into_iter()
            .flatten()
        {
            scheduler.cancel(timer);
        }
    }
}

/// Transient detonation flash for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExplosionFlash {
    pub id: u32,
    pub origin: IVec3,
    pub radius: f32,
}

/// A creature caught inside a blast radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlastKill {
    pub creature: CreatureId,
    pub species: Species,
    pub position: Vec3,
}

/// Everything one detonation did.
#[derive(Debug, Clone)]
pub struct BlastReport {
    pub id: ExplosiveId,
    pub origin: IVec3,
    pub radius: f32,
    /// `true` for chain detonations and immediate triggers
    pub forced: bool,
    pub destroyed: Vec<(IVec3, BlockType)>,
    /// Explosive cells queued for a delayed chain detonation
    pub chained: Vec<IVec3>,
    pub kills: Vec<BlastKill>,
    pub debris: Vec<DebrisParticle>,
}

pub struct ExplosionSystem {
    explosives: BTreeMap<ExplosiveId, ExplosiveBlock>,
    by_cell: HashMap<IVec3, ExplosiveId>,
    next_id: u32,
    radius: f32,
    flashes: Vec<ExplosionFlash>,
    next_flash_id: u32,
    total_detonations: u32,
}

impl ExplosionSystem {
    pub fn new(radius: f32) -> Self {
        Self {
            explosives: BTreeMap::new(),
            by_cell: HashMap::new(),
            next_id: 0,
            radius,
            flashes: Vec::new(),
            next_flash_id: 0,
            total_detonations: 0,
        }
    }

    // ========================================================================
    // REGISTRY
    // ========================================================================

    /// Register the explosive at `cell` (idempotent) and return its id.
    pub fn register(&mut self, cell: IVec3) -> ExplosiveId {
        if let Some(&id) = self.by_cell.get(&cell) {
            return id;
        }
        self.next_id += 1;
        let id = ExplosiveId(self.next_id);
        self.explosives.insert(id, ExplosiveBlock::new(id, cell));
        self.by_cell.insert(cell, id);
        id
    }

    /// Arm the explosive at `cell`: start its fuse and blink timers.
    ///
    /// Arming an already armed block is a no-op that returns its id.
    pub fn arm(
        &mut self,
        cell: IVec3,
        world: &VoxelWorld,
        scheduler: &mut Scheduler<SimTimer>,
        settings: &SimSettings,
    ) -> SimResult<ExplosiveId> {
        if world.block_at(cell) != BlockType::Explosive {
            return Err(SimError::UnknownExplosive {
                x: cell.x,
                y: cell.y,
                z: cell.z,
            });
        }
        let id = self.register(cell);
        let Some(block) = self.explosives.get_mut(&id) else {
            return Err(SimError::UnknownExplosive {
                x: cell.x,
                y: cell.y,
                z: cell.z,
            });
        };
        if block.state != ExplosiveState::Idle || block.chain.is_some() {
            return Ok(id);
        }

        block.state = ExplosiveState::Armed;
        block.lit = true;
        block.fuse = Some(scheduler.schedule_in(settings.fuse_ms, SimTimer::FuseExpired(id)));
        block.blink = Some(scheduler.schedule_in(
            settings.blink_interval_ms,
            SimTimer::BlinkToggle(id),
        ));
        log::debug!("armed explosive {:?} at {cell}, fuse {}ms", id, settings.fuse_ms);
        Ok(id)
    }

    /// Forget the explosive at `cell` and cancel its timers (block broken).
    pub fn defuse(
        &mut self,
        cell: IVec3,
        scheduler: &mut Scheduler<SimTimer>,
    ) -> Option<ExplosiveId> {
        let id = self.by_cell.remove(&cell)?;
        if let Some(mut block) = self.explosives.remove(&id) {
            block.cancel_timers(scheduler);
            log::debug!("defused explosive {:?} at {cell}", id);
        }
        Some(id)
    }

    /// Toggle the cosmetic blink and queue the next toggle.
    pub fn on_blink(
        &mut self,
        id: ExplosiveId,
        scheduler: &mut Scheduler<SimTimer>,
        interval_ms: f32,
    ) {
        let Some(block) = self.explosives.get_mut(&id) else {
            return;
        };
        if block.state != ExplosiveState::Armed {
            block.blink = None;
            return;
        }
        block.lit = !block.lit;
        block.blink = Some(scheduler.schedule_in(interval_ms, SimTimer::BlinkToggle(id)));
    }

    pub fn get(&self, id: ExplosiveId) -> Option<&ExplosiveBlock> {
        self.explosives.get(&id)
    }

    pub fn at(&self, cell: IVec3) -> Option<&ExplosiveBlock> {
        self.by_cell.get(&cell).and_then(|id| self.explosives.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExplosiveBlock> {
        self.explosives.values()
    }

    pub fn len(&self) -> usize {
        self.explosives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.explosives.is_empty()
    }

    /// World-space centers of every armed or chain-queued explosive.
    pub fn active_positions(&self) -> Vec<Vec3> {
        self.explosives
            .values()
            .filter(|b| b.state == ExplosiveState::Armed || b.chain.is_some())
            .map(|b| cell_center(b.cell))
            .collect()
    }

    // ========================================================================
    // RADIUS
    // ========================================================================

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Grow the blast radius by `step`, capped at `max`. Returns the new radius.
    pub fn upgrade_radius(&mut self, step: f32, max: f32) -> f32 {
        self.radius = (self.radius + step).min(max);
        self.radius
    }

    pub fn total_detonations(&self) -> u32 {
        self.total_detonations
    }

    // ========================================================================
    // FLASHES
    // ========================================================================

    pub fn flashes(&self) -> &[ExplosionFlash] {
        &self.flashes
    }

    pub fn expire_flash(&mut self, flash_id: u32) {
        self.flashes.retain(|f| f.id != flash_id);
    }

    // ========================================================================
    // DETONATION
    // ========================================================================

    /// Detonate explosive `id`.
    ///
    /// Returns `None` when the id is unknown or already detonating, which is
    /// what a stale timer sees.
    pub fn detonate<R: Rng>(
        &mut self,
        id: ExplosiveId,
        forced: bool,
        world: &mut VoxelWorld,
        scheduler: &mut Scheduler<SimTimer>,
        creatures: &CreatureRoster,
        settings: &SimSettings,
        rng: &mut R,
    ) -> Option<BlastReport> {
        let block = self.explosives.get_mut(&id)?;
        if matches!(block.state, ExplosiveState::Exploding | ExplosiveState::Removed) {
            return None;
        }
        block.cancel_timers(scheduler);
        block.state = ExplosiveState::Exploding;
        let origin = block.cell;

        if world.block_at(origin) == BlockType::Explosive {
            world.set_block(origin, BlockType::Air);
        }

        let radius = self.radius;
        log::debug!(
            "explosive {:?} detonating at {origin} (radius {radius}, {})",
            id,
            if forced { "forced" } else { "fuse" }
        );

        let mut report = BlastReport {
            id,
            origin,
            radius,
            forced,
            destroyed: Vec::new(),
            chained: Vec::new(),
            kills: Vec::new(),
            debris: Vec::new(),
        };
        self.propagate(&mut report, world, scheduler, settings, rng);
        report.kills = creatures_in_radius(creatures, origin, radius);

        if let Some(mut block) = self.explosives.remove(&id) {
            block.state = ExplosiveState::Removed;
            self.by_cell.remove(&block.cell);
        }
        self.total_detonations += 1;

        self.next_flash_id += 1;
        let flash_id = self.next_flash_id;
        self.flashes.push(ExplosionFlash {
            id: flash_id,
            origin,
            radius,
        });
        scheduler.schedule_in(settings.flash_duration_ms, SimTimer::FlashExpired(flash_id));

        Some(report)
    }

    /// Cube scan with a jittered spherical cutoff and Stone occlusion.
    fn propagate<R: Rng>(
        &mut self,
        report: &mut BlastReport,
        world: &mut VoxelWorld,
        scheduler: &mut Scheduler<SimTimer>,
        settings: &SimSettings,
        rng: &mut R,
    ) {
        let origin = report.origin;
        let half = report.radius.ceil() as i32;

        for dz in -half..=half {
            for dy in -half..=half {
                for dx in -half..=half {
                    let offset = IVec3::new(dx, dy, dz);
                    if offset == IVec3::ZERO {
                        continue;
                    }
                    let cell = origin + offset;
                    if !world.contains(cell) {
                        continue;
                    }

                    let distance = offset.as_vec3().length();
                    let effective = report.radius * rng.gen_range(RADIUS_JITTER);
                    if distance > effective {
                        continue;
                    }

                    let block = world.block_at(cell);
                    if block.is_blast_immune() || block.is_air() {
                        continue;
                    }
                    if line_of_sight_blocked(world, origin, cell) {
                        log::trace!("{cell} shielded from blast at {origin}");
                        continue;
                    }

                    if block == BlockType::Explosive {
                        if self.queue_chain(cell, scheduler, settings, rng) {
                            report.chained.push(cell);
                        }
                        continue;
                    }

                    world.set_block(cell, BlockType::Air);
                    report.destroyed.push((cell, block));
                    let count = rng.gen_range(DEBRIS_PER_CELL);
                    report.debris.extend(spawn_block_debris(
                        cell,
                        block,
                        origin,
                        count,
                        settings.debris_gravity,
                        &settings.debris_lifetime_ticks,
                        rng,
                    ));
                }
            }
        }
    }

    /// Queue a delayed forced detonation for the explosive at `cell`.
    ///
    /// Its own fuse and blink timers are cancelled. Returns `false` when the
    /// block is already queued or already going off.
    fn queue_chain<R: Rng>(
        &mut self,
        cell: IVec3,
        scheduler: &mut Scheduler<SimTimer>,
        settings: &SimSettings,
        rng: &mut R,
    ) -> bool {
        let id = self.register(cell);
        let Some(block) = self.explosives.get_mut(&id) else {
            return false;
        };
        if block.chain.is_some()
            || matches!(block.state, ExplosiveState::Exploding | ExplosiveState::Removed)
        {
            return false;
        }

        block.cancel_timers(scheduler);
        let delay = rng.gen_range(settings.chain_delay_ms.clone());
        block.chain = Some(scheduler.schedule_in(delay, SimTimer::ChainDetonation(id)));
        log::debug!("chained explosive {:?} at {cell} in {delay:.0}ms", id);
        true
    }
}

/// Live creatures whose body center lies within `radius` of the blast
/// origin's center. Uses the configured radius without jitter.
fn creatures_in_radius(creatures: &CreatureRoster, origin: IVec3, radius: f32) -> Vec<BlastKill> {
    let center = cell_center(origin);
    creatures
        .iter()
        .filter(|c| c.is_active() && c.position.is_finite())
        .filter(|c| c.body_center().distance(center) <= radius)
        .map(|c| BlastKill {
            creature: c.id,
            species: c.species,
            position: c.position,
        })
        .collect()
}
