//! Creatures Module
//!
//! Wandering animals: a single data-driven record per creature, a species
//! parameter table, per-tick behavior steps and the roster that owns them.

pub mod behavior;
pub mod creature;
pub mod roster;
pub mod species;

pub use behavior::{StepBlocker, TURN_DURATION_MS, apply_physics, update_movement};
pub use creature::{Creature, CreatureId, MovementState, heading_vector, wrap_angle};
pub use roster::CreatureRoster;
pub use species::{LegSwing, Placement, PlacementPolicy, Species, SpeciesProfile};
