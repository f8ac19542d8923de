//! Render Module
//!
//! GPU-compatible snapshot records. Mesh construction, pipelines and the
//! window live in the host application; the engine only guarantees the
//! byte layout of what it hands over.

pub mod instances;

pub use instances::{
    CREATURE_DEBRIS_BASE, CreatureInstance, DebrisInstance, FLAG_GROUNDED, FLAG_WALKING, as_bytes,
};
