//! Game systems: self-contained modules that own state and logic.

pub mod creature_system;
pub mod debris_system;
pub mod explosion_system;
pub mod spawn_system;

pub use creature_system::{CreatureSystem, CreatureUpdate, FALL_OUT_Y};
pub use debris_system::DebrisSystem;
pub use explosion_system::{
    BlastKill, BlastReport, ExplosionFlash, ExplosionSystem, ExplosiveBlock, ExplosiveId,
    ExplosiveState, SimTimer,
};
pub use spawn_system::{SpawnSystem, Spawned};
