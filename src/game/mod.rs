//! Game Module
//!
//! Simulation systems that build on top of the engine: explosives, debris,
//! creatures, spawning and the per-tick driver that ties them together.

pub mod config;
pub mod creatures;
pub mod destruction;
pub mod events;
pub mod player_proxy;
pub mod scheduler;
pub mod scoring;
pub mod state;
pub mod systems;

pub use config::{PopulationTargets, SimSettings};
pub use creatures::{Creature, CreatureId, MovementState, Species, SpeciesProfile};
pub use destruction::{DebrisParticle, DebrisSource};
pub use events::SimEvent;
pub use player_proxy::PlayerProxy;
pub use scheduler::{Scheduler, TimerId};
pub use scoring::Scoreboard;
pub use state::{DEFAULT_DELTA_MS, MAX_DELTA_MS, Simulation};
pub use systems::{ExplosionFlash, ExplosiveBlock, ExplosiveId, ExplosiveState};
