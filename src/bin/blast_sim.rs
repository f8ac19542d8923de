//! Blast Sim - Headless Simulation Driver
//!
//! Run with: `cargo run --bin blast_sim -- [settings.json] [--json]`
//!
//! Builds a world, lays a short TNT fuse line behind a stone wall, turns on
//! the magnet and runs ten simulated seconds at 60 fps. Events are logged;
//! with `--json` every event is also printed to stdout as one JSON object
//! per line.
//!
//! Set `RUST_LOG=debug` for per-detonation detail.

use glam::IVec3;

use voxel_blast_engine::game::{SimEvent, SimSettings, Simulation};
use voxel_blast_engine::world::BlockType;

const FRAME_MS: f32 = 1000.0 / 60.0;
const RUN_MS: f32 = 10_000.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut settings_path = None;
    let mut json = false;
    for arg in std::env::args().skip(1) {
        if arg == "--json" {
            json = true;
        } else {
            settings_path = Some(arg);
        }
    }

    let settings = match settings_path {
        Some(path) => {
            log::info!("reading settings from {path}");
            SimSettings::from_json_str(&std::fs::read_to_string(&path)?)?
        }
        None => SimSettings::default(),
    };

    let mut sim = Simulation::new(settings)?;
    let size = sim.world().size();
    let mid = size / 2;
    let ground = sim.world().highest_solid_y(mid, mid);
    log::info!("world {size}³, surface at y={ground}, {} creatures", sim.creatures().len());

    // Fuse line along X with a stone wall on its -Z side
    for dx in [-4, 0, 4] {
        let cell = IVec3::new(mid + dx, ground, mid);
        if !sim.place_block(cell, BlockType::Explosive) {
            log::warn!("could not place explosive at {cell}");
        }
    }
    for dx in -6..=6 {
        for dy in 0..3 {
            sim.place_block(IVec3::new(mid + dx, ground + dy, mid - 3), BlockType::Stone);
        }
    }
    sim.activate_magnet(2_500.0);

    let mut elapsed = 0.0;
    let mut explosions = 0;
    let mut cells_changed = 0;
    while elapsed < RUN_MS {
        for event in sim.tick(FRAME_MS) {
            match &event {
                SimEvent::ExplosionOccurred {
                    origin,
                    radius,
                    forced,
                } => {
                    explosions += 1;
                    log::info!(
                        "t={:.0}ms explosion at {origin} r={radius:.2}{}",
                        sim.now_ms(),
                        if *forced { " (chained)" } else { "" }
                    );
                }
                SimEvent::CellChanged { .. } => cells_changed += 1,
                SimEvent::CreatureKilled {
                    creature, species, ..
                } => log::info!("{species} {creature} killed"),
                SimEvent::SkillCardEligible { position } => {
                    log::info!("skill card dropped at {position}")
                }
                other => log::debug!("{other:?}"),
            }
            if json {
                println!("{}", serde_json::to_string(&event)?);
            }
        }
        elapsed += FRAME_MS;
    }

    let score = sim.scoreboard();
    log::info!("done: {explosions} explosions, {cells_changed} cell changes");
    log::info!(
        "score: {} kills, {} burned, {} skill cards",
        score.total_kills(),
        score.burned(),
        score.skill_cards()
    );
    log::info!(
        "remaining: {} creatures alive, {} debris in flight",
        sim.creatures().len(),
        sim.debris_count()
    );
    Ok(())
}
