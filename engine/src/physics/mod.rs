//! Physics Module
//!
//! Stateless collision queries shared by the creature and explosion systems.

pub mod collision;

pub use collision::{Body, blocked, line_of_sight_blocked, push_apart, push_out_of_block};
