//! Simulation Events
//!
//! Discrete notifications produced during a tick and handed to the
//! rendering/UI layer in emission order.

use glam::{IVec3, Vec3};
use serde::Serialize;

use super::creatures::{CreatureId, Species};
use crate::world::BlockType;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    /// A cell changed type (placement, breaking or blast damage).
    CellChanged { cell: IVec3, block: BlockType },
    /// An explosive was armed and its fuse started.
    ExplosiveArmed { cell: IVec3 },
    /// An armed explosive was broken before it went off.
    ExplosiveDefused { cell: IVec3 },
    /// An explosive detonated.
    ExplosionOccurred {
        origin: IVec3,
        radius: f32,
        forced: bool,
    },
    /// A creature died in a blast.
    CreatureKilled {
        creature: CreatureId,
        species: Species,
        position: Vec3,
    },
    /// A creature walked into fire.
    CreatureBurned {
        creature: CreatureId,
        species: Species,
        position: Vec3,
    },
    /// A kill qualified for a skill card.
    SkillCardEligible { position: Vec3 },
    /// A creature entered the world.
    CreatureSpawned {
        creature: CreatureId,
        species: Species,
        position: Vec3,
    },
    /// A creature fell out of the world.
    CreatureDespawned { creature: CreatureId, species: Species },
    MagnetActivated { duration_ms: f32 },
    MagnetExpired,
}
