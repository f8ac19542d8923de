//! Config Module
//!
//! Settings consumed by the simulation at construction time.

pub mod sim_config;

pub use sim_config::{PopulationTargets, SimSettings};
