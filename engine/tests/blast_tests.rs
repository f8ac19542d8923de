//! Blast Tests - Propagation, Occlusion, Immunity and Chain Reactions
//!
//! End-to-end detonation scenarios driven through the public simulation
//! API on small hand-built worlds.

use glam::{IVec3, Vec3};
use voxel_blast_engine::game::{PopulationTargets, SimEvent, SimSettings, Simulation, Species};
use voxel_blast_engine::world::{BlockType, VoxelWorld, flat_world};

fn settings(world_size: i32, radius: f32) -> SimSettings {
    SimSettings {
        world_size,
        explosion_radius: radius,
        population: PopulationTargets::NONE,
        skill_card_chance: 0.0,
        ..SimSettings::default()
    }
}

fn explosions(events: &[SimEvent]) -> Vec<IVec3> {
    events
        .iter()
        .filter_map(|e| match e {
            SimEvent::ExplosionOccurred { origin, .. } => Some(*origin),
            _ => None,
        })
        .collect()
}

/// Run `frames` ticks of 16ms and collect every event.
fn run(sim: &mut Simulation, frames: usize) -> Vec<SimEvent> {
    (0..frames).flat_map(|_| sim.tick(16.0)).collect()
}

// ============================================================================
// Kill radius and Stone occlusion
// ============================================================================

#[test]
fn test_blast_kills_nearby_creature_and_stone_shields_far_cell() {
    let mut sim = Simulation::with_world(settings(50, 3.5), flat_world(50, 5).unwrap()).unwrap();
    let creature = sim
        .creatures_mut()
        .spawn(Species::Pig, Vec3::new(25.5, 5.0, 26.5), 0.0);

    let origin = IVec3::new(25, 5, 25);
    let shield = IVec3::new(25, 5, 24);
    let behind = IVec3::new(25, 5, 23);
    assert!(sim.place_block(shield, BlockType::Stone));
    assert!(sim.place_block(behind, BlockType::Dirt));
    assert!(sim.place_block(origin, BlockType::Explosive));
    assert!(sim.detonate_now(origin));

    let events = sim.tick(16.0);
    assert_eq!(explosions(&events), vec![origin]);
    assert!(events.iter().any(|e| matches!(
        e,
        SimEvent::CreatureKilled { creature: c, species: Species::Pig, .. } if *c == creature
    )));

    assert!(!sim.creatures().contains(creature), "killed creature left the roster");
    assert!(sim.debris().any(|d| d.is_ragdoll()), "kill spawned a ragdoll");
    assert_eq!(sim.scoreboard().kills(Species::Pig), 1);

    assert_eq!(sim.world().block_at(origin), BlockType::Air);
    assert_eq!(sim.world().block_at(shield), BlockType::Stone);
    assert_eq!(sim.world().block_at(behind), BlockType::Dirt, "cell behind stone survives");
}

#[test]
fn test_creature_outside_radius_survives() {
    let mut sim = Simulation::with_world(settings(50, 3.5), flat_world(50, 5).unwrap()).unwrap();
    let far = sim
        .creatures_mut()
        .spawn(Species::Cow, Vec3::new(30.5, 5.0, 25.5), 0.0);
    let origin = IVec3::new(25, 5, 25);
    sim.place_block(origin, BlockType::Explosive);
    sim.detonate_now(origin);
    sim.tick(16.0);
    assert!(sim.creatures().contains(far));
    assert_eq!(sim.scoreboard().total_kills(), 0);
}

// ============================================================================
// Immunity and radius bound
// ============================================================================

#[test]
fn test_bedrock_and_stone_survive_blast() {
    let mut sim = Simulation::with_world(settings(16, 4.0), flat_world(16, 2).unwrap()).unwrap();
    let origin = IVec3::new(8, 2, 8);
    let stone = IVec3::new(9, 2, 8);
    sim.place_block(stone, BlockType::Stone);
    sim.place_block(origin, BlockType::Explosive);
    sim.detonate_now(origin);
    sim.tick(16.0);

    assert_eq!(sim.world().block_at(stone), BlockType::Stone);
    for x in 4..=12 {
        for z in 4..=12 {
            assert_eq!(sim.world().get(x, 0, z), BlockType::Bedrock);
        }
    }
}

#[test]
fn test_destruction_bounded_by_jittered_radius() {
    let size = 32;
    let radius = 4.0;
    let mut world = VoxelWorld::new(size).unwrap();
    for z in 4..28 {
        for y in 4..28 {
            for x in 4..28 {
                world.set(x, y, z, BlockType::Dirt);
            }
        }
    }
    let origin = IVec3::new(16, 16, 16);
    world.set_block(origin, BlockType::Explosive);

    let mut sim = Simulation::with_world(settings(size, radius), world).unwrap();
    assert!(sim.detonate_now(origin));
    let events = sim.tick(16.0);

    let cleared: Vec<IVec3> = events
        .iter()
        .filter_map(|e| match e {
            SimEvent::CellChanged {
                cell,
                block: BlockType::Air,
            } => Some(*cell),
            _ => None,
        })
        .collect();
    assert!(!cleared.is_empty());
    for cell in &cleared {
        let d = (*cell - origin).as_vec3().length();
        assert!(d <= radius * 1.1 + 1e-4, "{cell} destroyed at distance {d}");
    }

    // Everything comfortably inside the lower jitter bound is gone
    for z in -3..=3 {
        for y in -3..=3 {
            for x in -3..=3 {
                let offset = IVec3::new(x, y, z);
                if offset.as_vec3().length() <= radius * 0.9 {
                    assert_eq!(sim.world().block_at(origin + offset), BlockType::Air);
                }
            }
        }
    }
}

// ============================================================================
// Chain reactions
// ============================================================================

#[test]
fn test_chain_detonation_clears_both_cells_once() {
    let mut sim = Simulation::with_world(settings(32, 3.0), flat_world(32, 5).unwrap()).unwrap();
    let first = IVec3::new(10, 5, 10);
    let second = IVec3::new(10, 5, 12);
    assert!(sim.place_block(first, BlockType::Explosive));
    assert!(sim.place_block(second, BlockType::Explosive));

    assert!(sim.detonate_now(first));
    let mut events = run(&mut sim, 10);
    // Stale fuse timers must not produce extra explosions
    events.extend(run(&mut sim, 250));

    let origins = explosions(&events);
    assert_eq!(origins.iter().filter(|&&o| o == first).count(), 1);
    assert_eq!(origins.iter().filter(|&&o| o == second).count(), 1);
    assert_eq!(origins.len(), 2);

    assert_eq!(sim.world().block_at(first), BlockType::Air);
    assert_eq!(sim.world().block_at(second), BlockType::Air);
    assert_eq!(sim.explosives().count(), 0);
}

#[test]
fn test_chained_explosion_is_forced() {
    let mut sim = Simulation::with_world(settings(32, 3.0), flat_world(32, 5).unwrap()).unwrap();
    let first = IVec3::new(10, 5, 10);
    let second = IVec3::new(12, 5, 10);
    sim.place_block(first, BlockType::Explosive);
    sim.place_block(second, BlockType::Explosive);
    sim.detonate_now(first);

    let events = run(&mut sim, 10);
    assert!(events.iter().any(|e| matches!(
        e,
        SimEvent::ExplosionOccurred { origin, forced: true, .. } if *origin == second
    )));
}

#[test]
fn test_stone_wall_stops_chain() {
    let mut sim = Simulation::with_world(settings(32, 3.0), flat_world(32, 5).unwrap()).unwrap();
    let first = IVec3::new(10, 5, 10);
    let wall = IVec3::new(10, 5, 11);
    let second = IVec3::new(10, 5, 12);
    sim.place_block(wall, BlockType::Stone);
    sim.place_block(first, BlockType::Explosive);
    sim.place_block(second, BlockType::Explosive);
    sim.detonate_now(first);

    let events = run(&mut sim, 10);
    assert_eq!(explosions(&events), vec![first]);
    assert_eq!(sim.world().block_at(second), BlockType::Explosive);
}
