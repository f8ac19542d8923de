//! Simulation State
//!
//! Central context that owns every subsystem and drives them once per
//! frame. The host supplies `delta_ms`, player position and block actions;
//! it gets back the events produced by the tick and read access to the
//! world, rosters and render snapshots.
//!
//! ## Tick order
//! 1. Sanitize `delta_ms` (stop here while paused)
//! 2. Advance the clock and drain due timers: fuses, blinks, chain
//!    detonations and flash expiry. Blast kills are applied right after
//!    each detonation.
//! 3. Expire the magnet effect
//! 4. Creature update
//! 5. Fire check
//! 6. Debris step
//! 7. Replenishment
//! 8. Cell-change events

use glam::{IVec3, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SimResult;
use crate::game::config::SimSettings;
use crate::game::creatures::CreatureRoster;
use crate::game::destruction::{DebrisParticle, spawn_burned_remains, spawn_creature_ragdoll};
use crate::game::events::SimEvent;
use crate::game::player_proxy::PlayerProxy;
use crate::game::scheduler::Scheduler;
use crate::game::scoring::Scoreboard;
use crate::game::systems::{
    BlastReport, CreatureSystem, DebrisSystem, ExplosionFlash, ExplosionSystem, ExplosiveBlock,
    ExplosiveId, SimTimer, SpawnSystem, Spawned,
};
use crate::render::{CreatureInstance, DebrisInstance};
use crate::world::{BlockType, TerrainLayers, VoxelHit, VoxelWorld, cell_center, layered_world};

/// Substituted for a non-finite, negative or oversized frame time (ms).
pub const DEFAULT_DELTA_MS: f32 = 16.0;

/// Frame times above this are treated as a stall (ms).
pub const MAX_DELTA_MS: f32 = 1000.0;

pub struct Simulation {
    settings: SimSettings,
    world: VoxelWorld,
    explosions: ExplosionSystem,
    creatures: CreatureSystem,
    debris: DebrisSystem,
    spawner: SpawnSystem,
    scheduler: Scheduler<SimTimer>,
    rng: StdRng,
    scoreboard: Scoreboard,
    player: Option<PlayerProxy>,
    paused: bool,
    /// Simulation time at which the magnet effect ends
    magnet_until_ms: Option<f64>,
    events: Vec<SimEvent>,
}

impl Simulation {
    /// Build a simulation on a freshly generated layered world.
    pub fn new(settings: SimSettings) -> SimResult<Self> {
        settings.validate()?;
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let world = layered_world(settings.world_size, TerrainLayers::default(), &mut rng)?;
        Self::build(settings, world, rng)
    }

    /// Build a simulation on a world produced by a terrain initializer.
    pub fn with_world(settings: SimSettings, world: VoxelWorld) -> SimResult<Self> {
        settings.validate()?;
        let rng = StdRng::seed_from_u64(settings.seed);
        Self::build(settings, world, rng)
    }

    fn build(settings: SimSettings, mut world: VoxelWorld, mut rng: StdRng) -> SimResult<Self> {
        if world.size() != settings.world_size {
            log::warn!(
                "world size {} differs from configured {}; using the world's",
                world.size(),
                settings.world_size
            );
        }
        world.drain_changes();

        let mut creatures = CreatureSystem::new();
        let mut spawner = SpawnSystem::new(
            settings.population,
            settings.replenish_interval_ms,
            settings.replenish_batch_cap,
        );
        let spawned = spawner.populate(creatures.roster_mut(), &world, &mut rng);

        let mut sim = Self {
            explosions: ExplosionSystem::new(settings.explosion_radius),
            debris: DebrisSystem::new(settings.max_debris),
            scheduler: Scheduler::new(),
            scoreboard: Scoreboard::new(),
            player: None,
            paused: false,
            magnet_until_ms: None,
            events: Vec::new(),
            settings,
            world,
            creatures,
            spawner,
            rng,
        };
        sim.register_world_explosives();
        sim.push_spawn_events(spawned);
        Ok(sim)
    }

    /// Index explosive blocks that came with the initial world (unarmed).
    fn register_world_explosives(&mut self) {
        let size = self.world.size();
        for z in 0..size {
            for y in 0..size {
                for x in 0..size {
                    if self.world.get(x, y, z) == BlockType::Explosive {
                        self.explosions.register(IVec3::new(x, y, z));
                    }
                }
            }
        }
    }

    // ========================================================================
    // TICK
    // ========================================================================

    /// Advance the simulation by one frame and return its events.
    pub fn tick(&mut self, delta_ms: f32) -> Vec<SimEvent> {
        let dt = sanitize_delta(delta_ms);
        if self.paused {
            return std::mem::take(&mut self.events);
        }

        self.scheduler.advance(dt);
        self.drain_timers();
        self.expire_magnet();

        let magnet_targets = self
            .magnet_until_ms
            .map(|_| self.explosions.active_positions());
        let update = self.creatures.update(
            &self.world,
            self.player.as_ref(),
            magnet_targets.as_deref(),
            &self.settings,
            dt,
            &mut self.rng,
        );
        for (creature, species) in update.despawned {
            self.events.push(SimEvent::CreatureDespawned { creature, species });
        }

        self.burn_creatures();
        self.debris.update();

        let spawned = self
            .spawner
            .update(dt, self.creatures.roster_mut(), &self.world, &mut self.rng);
        self.push_spawn_events(spawned);

        self.emit_cell_changes();
        std::mem::take(&mut self.events)
    }

    fn drain_timers(&mut self) {
        while let Some((_, timer)) = self.scheduler.pop_due() {
            match timer {
                SimTimer::FuseExpired(id) => self.detonate(id, false),
                SimTimer::ChainDetonation(id) => self.detonate(id, true),
                SimTimer::BlinkToggle(id) => self.explosions.on_blink(
                    id,
                    &mut self.scheduler,
                    self.settings.blink_interval_ms,
                ),
                SimTimer::FlashExpired(flash) => self.explosions.expire_flash(flash),
            }
        }
    }

    fn detonate(&mut self, id: ExplosiveId, forced: bool) {
        let report = self.explosions.detonate(
            id,
            forced,
            &mut self.world,
            &mut self.scheduler,
            self.creatures.roster(),
            &self.settings,
            &mut self.rng,
        );
        if let Some(report) = report {
            self.apply_blast(report);
        }
    }

    /// Apply the side effects of a detonation outside the blast scan.
    fn apply_blast(&mut self, report: BlastReport) {
        self.events.push(SimEvent::ExplosionOccurred {
            origin: report.origin,
            radius: report.radius,
            forced: report.forced,
        });
        self.debris.spawn(report.debris);

        let origin = cell_center(report.origin);
        for kill in report.kills {
            let Some(creature) = self.creatures.eject(kill.creature) else {
                continue;
            };
            let ragdoll = spawn_creature_ragdoll(
                creature.id,
                creature.species,
                creature.position,
                origin,
                self.settings.debris_gravity,
                &mut self.rng,
            );
            self.debris.spawn([ragdoll]);
            self.scoreboard.record_kill(kill.species);
            log::debug!("{} {} killed by blast at {}", kill.species, kill.creature, report.origin);
            self.events.push(SimEvent::CreatureKilled {
                creature: kill.creature,
                species: kill.species,
                position: kill.position,
            });
            if self.rng.gen_bool(self.settings.skill_card_chance) {
                self.scoreboard.record_skill_card();
                self.events.push(SimEvent::SkillCardEligible {
                    position: kill.position,
                });
            }
        }
    }

    fn expire_magnet(&mut self) {
        if let Some(until) = self.magnet_until_ms {
            if self.scheduler.now_ms() >= until {
                self.magnet_until_ms = None;
                self.events.push(SimEvent::MagnetExpired);
            }
        }
    }

    fn burn_creatures(&mut self) {
        for id in self.creatures.find_burning(&self.world) {
            let Some(creature) = self.creatures.eject(id) else {
                continue;
            };
            self.debris.spawn([spawn_burned_remains(
                creature.id,
                creature.species,
                creature.position,
                self.settings.debris_gravity,
            )]);
            self.scoreboard.record_burn();
            log::debug!("{} {} burned", creature.species, creature.id);
            self.events.push(SimEvent::CreatureBurned {
                creature: creature.id,
                species: creature.species,
                position: creature.position,
            });
        }
    }

    fn push_spawn_events(&mut self, spawned: Vec<Spawned>) {
        self.events
            .extend(spawned.into_iter().map(|s| SimEvent::CreatureSpawned {
                creature: s.creature,
                species: s.species,
                position: s.position,
            }));
    }

    fn emit_cell_changes(&mut self) {
        self.events.extend(
            self.world
                .drain_changes()
                .into_iter()
                .map(|c| SimEvent::CellChanged {
                    cell: c.cell,
                    block: c.block,
                }),
        );
    }

    // ========================================================================
    // ACTIONS
    // ========================================================================

    /// Place `block` into an empty in-bounds cell. Explosives are armed.
    /// Bedrock only goes into the bottom layer.
    pub fn place_block(&mut self, cell: IVec3, block: BlockType) -> bool {
        if !self.world.contains(cell) {
            log::warn!("refusing to place {block} outside the world at {cell}");
            return false;
        }
        if block == BlockType::Bedrock && cell.y != 0 {
            log::warn!("refusing to place bedrock above the floor at {cell}");
            return false;
        }
        if block.is_air() || !self.world.block_at(cell).is_air() {
            return false;
        }
        self.world.set_block(cell, block);

        if block == BlockType::Explosive {
            match self
                .explosions
                .arm(cell, &self.world, &mut self.scheduler, &self.settings)
            {
                Ok(_) => self.events.push(SimEvent::ExplosiveArmed { cell }),
                Err(err) => log::warn!("placed explosive could not be armed: {err}"),
            }
        }
        true
    }

    /// Break the block at `cell`. Air and Bedrock cannot be broken; an
    /// armed explosive is defused.
    pub fn break_block(&mut self, cell: IVec3) -> Option<BlockType> {
        let block = self.world.try_get(cell)?;
        if !block.is_breakable() {
            return None;
        }
        let defused = block == BlockType::Explosive
            && self.explosions.defuse(cell, &mut self.scheduler).is_some();
        if defused {
            self.events.push(SimEvent::ExplosiveDefused { cell });
        }
        self.world.set_block(cell, BlockType::Air);
        Some(block)
    }

    /// Detonate the explosive at `cell` right now, skipping its countdown.
    pub fn detonate_now(&mut self, cell: IVec3) -> bool {
        if self.world.block_at(cell) != BlockType::Explosive {
            return false;
        }
        let id = self.explosions.register(cell);
        self.detonate(id, true);
        true
    }

    pub fn set_player(&mut self, player: Option<PlayerProxy>) {
        self.player = player;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pull creatures toward armed explosives for `duration_ms`.
    pub fn activate_magnet(&mut self, duration_ms: f32) {
        if !duration_ms.is_finite() || duration_ms <= 0.0 {
            return;
        }
        self.magnet_until_ms = Some(self.scheduler.now_ms() + duration_ms as f64);
        log::debug!("magnet active for {duration_ms}ms");
        self.events.push(SimEvent::MagnetActivated { duration_ms });
    }

    pub fn is_magnet_active(&self) -> bool {
        self.magnet_until_ms.is_some()
    }

    /// Grow the blast radius by one upgrade step. Returns the new radius.
    pub fn upgrade_radius(&mut self) -> f32 {
        self.explosions.upgrade_radius(
            self.settings.radius_upgrade_step,
            self.settings.max_explosion_radius,
        )
    }

    /// First non-Air cell along a view ray.
    pub fn targeted_cell(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<VoxelHit> {
        self.world.raycast(origin, dir, max_dist)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn settings(&self) -> &SimSettings {
        &self.settings
    }

    pub fn world(&self) -> &VoxelWorld {
        &self.world
    }

    pub fn creatures(&self) -> &CreatureRoster {
        self.creatures.roster()
    }

    /// Mutable roster access for hosts that place creatures directly.
    pub fn creatures_mut(&mut self) -> &mut CreatureRoster {
        self.creatures.roster_mut()
    }

    pub fn debris(&self) -> impl Iterator<Item = &DebrisParticle> {
        self.debris.iter()
    }

    pub fn debris_count(&self) -> usize {
        self.debris.len()
    }

    pub fn explosives(&self) -> impl Iterator<Item = &ExplosiveBlock> {
        self.explosions.iter()
    }

    pub fn explosive_at(&self, cell: IVec3) -> Option<&ExplosiveBlock> {
        self.explosions.at(cell)
    }

    pub fn explosion_radius(&self) -> f32 {
        self.explosions.radius()
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    pub fn flashes(&self) -> &[ExplosionFlash] {
        self.explosions.flashes()
    }

    pub fn now_ms(&self) -> f64 {
        self.scheduler.now_ms()
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.len()
    }

    pub fn creature_instances(&self) -> Vec<CreatureInstance> {
        self.creatures.instances()
    }

    pub fn debris_instances(&self) -> Vec<DebrisInstance> {
        self.debris.instances()
    }
}

/// Replace a frame time that would destabilize physics with the default.
pub fn sanitize_delta(delta_ms: f32) -> f32 {
    if delta_ms.is_finite() && (0.0..=MAX_DELTA_MS).contains(&delta_ms) {
        delta_ms
    } else {
        log::warn!("bad frame time {delta_ms}ms, using {DEFAULT_DELTA_MS}ms");
        DEFAULT_DELTA_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::PopulationTargets;
    use crate::world::flat_world;

    fn quiet_settings() -> SimSettings {
        SimSettings {
            world_size: 32,
            population: PopulationTargets::NONE,
            ..SimSettings::default()
        }
    }

    fn sim() -> Simulation {
        Simulation::with_world(quiet_settings(), flat_world(32, 5).unwrap()).unwrap()
    }

    #[test]
    fn test_sanitize_delta() {
        assert_eq!(sanitize_delta(f32::NAN), DEFAULT_DELTA_MS);
        assert_eq!(sanitize_delta(-3.0), DEFAULT_DELTA_MS);
        assert_eq!(sanitize_delta(5000.0), DEFAULT_DELTA_MS);
        assert_eq!(sanitize_delta(f32::INFINITY), DEFAULT_DELTA_MS);
        assert_eq!(sanitize_delta(33.0), 33.0);
    }

    #[test]
    fn test_place_block_rules() {
        let mut sim = sim();
        assert!(!sim.place_block(IVec3::new(-1, 6, 3), BlockType::Dirt));
        assert!(!sim.place_block(IVec3::new(3, 4, 3), BlockType::Dirt), "occupied");
        assert!(!sim.place_block(IVec3::new(3, 6, 3), BlockType::Air));
        assert!(sim.place_block(IVec3::new(3, 6, 3), BlockType::Wood));
        assert_eq!(sim.world().get(3, 6, 3), BlockType::Wood);
    }

    #[test]
    fn test_bedrock_only_placed_on_floor() {
        let mut world = flat_world(32, 5).unwrap();
        world.set(3, 0, 3, BlockType::Air);
        let mut sim = Simulation::with_world(quiet_settings(), world).unwrap();

        assert!(!sim.place_block(IVec3::new(3, 9, 3), BlockType::Bedrock));
        assert_eq!(sim.world().get(3, 9, 3), BlockType::Air);
        assert!(sim.place_block(IVec3::new(3, 0, 3), BlockType::Bedrock));
        assert_eq!(sim.world().get(3, 0, 3), BlockType::Bedrock);
    }

    #[test]
    fn test_tiny_worlds_build_and_tick() {
        for size in [1, 2, 3] {
            let settings = SimSettings {
                world_size: size,
                ..SimSettings::default()
            };
            assert!(settings.validate().is_ok());
            let mut sim = Simulation::new(settings).unwrap();
            for _ in 0..60 {
                sim.tick(16.0);
            }
            for c in sim.creatures().iter() {
                let p = c.position;
                assert!(p.is_finite());
                assert!(p.x >= 0.0 && p.x <= size as f32 && p.z >= 0.0 && p.z <= size as f32);
            }
        }
    }

    #[test]
    fn test_placing_explosive_arms_it() {
        let mut sim = sim();
        let cell = IVec3::new(8, 5, 8);
        assert!(sim.place_block(cell, BlockType::Explosive));
        let events = sim.tick(16.0);
        assert!(events.contains(&SimEvent::ExplosiveArmed { cell }));
        assert!(events.contains(&SimEvent::CellChanged {
            cell,
            block: BlockType::Explosive
        }));
        assert_eq!(
            sim.explosive_at(cell).map(|b| b.state),
            Some(crate::game::ExplosiveState::Armed)
        );
    }

    #[test]
    fn test_fuse_detonates_after_countdown() {
        let mut sim = sim();
        let cell = IVec3::new(8, 5, 8);
        sim.place_block(cell, BlockType::Explosive);
        let mut exploded_at = None;
        for frame in 0..400 {
            let events = sim.tick(10.0);
            if events
                .iter()
                .any(|e| matches!(e, SimEvent::ExplosionOccurred { forced: false, .. }))
            {
                exploded_at = Some(frame);
                break;
            }
        }
        assert_eq!(exploded_at, Some(299), "fuse should burn exactly 3000ms");
        assert_eq!(sim.world().block_at(cell), BlockType::Air);
        assert!(sim.explosive_at(cell).is_none());
    }

    #[test]
    fn test_breaking_armed_explosive_defuses_it() {
        let mut sim = sim();
        let cell = IVec3::new(8, 5, 8);
        sim.place_block(cell, BlockType::Explosive);
        assert_eq!(sim.break_block(cell), Some(BlockType::Explosive));
        let events = sim.tick(16.0);
        assert!(events.contains(&SimEvent::ExplosiveDefused { cell }));
        for _ in 0..400 {
            let events = sim.tick(16.0);
            assert!(
                !events
                    .iter()
                    .any(|e| matches!(e, SimEvent::ExplosionOccurred { .. })),
                "defused explosive went off"
            );
        }
    }

    #[test]
    fn test_bedrock_and_air_cannot_be_broken() {
        let mut sim = sim();
        assert_eq!(sim.break_block(IVec3::new(2, 0, 2)), None);
        assert_eq!(sim.break_block(IVec3::new(2, 10, 2)), None);
        assert_eq!(sim.break_block(IVec3::new(2, 40, 2)), None);
        assert_eq!(sim.break_block(IVec3::new(2, 4, 2)), Some(BlockType::Grass));
    }

    #[test]
    fn test_pause_freezes_clock() {
        let mut sim = sim();
        sim.set_paused(true);
        sim.tick(16.0);
        assert_eq!(sim.now_ms(), 0.0);
        sim.set_paused(false);
        sim.tick(16.0);
        assert_eq!(sim.now_ms(), 16.0);
    }

    #[test]
    fn test_magnet_expires() {
        let mut sim = sim();
        sim.activate_magnet(100.0);
        assert!(sim.is_magnet_active());
        let mut expired = false;
        for _ in 0..10 {
            expired |= sim.tick(16.0).contains(&SimEvent::MagnetExpired);
        }
        assert!(expired);
        assert!(!sim.is_magnet_active());
    }

    #[test]
    fn test_upgrade_radius_caps() {
        let mut sim = sim();
        let mut radius = sim.explosion_radius();
        for _ in 0..20 {
            radius = sim.upgrade_radius();
        }
        assert_eq!(radius, sim.settings().max_explosion_radius);
    }

    #[test]
    fn test_flash_expires_after_duration() {
        let mut sim = sim();
        let cell = IVec3::new(8, 5, 8);
        sim.place_block(cell, BlockType::Explosive);
        assert!(sim.detonate_now(cell));
        assert_eq!(sim.flashes().len(), 1);
        for _ in 0..20 {
            sim.tick(16.0);
        }
        assert!(sim.flashes().is_empty());
    }
}
