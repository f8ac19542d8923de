//! Species Table
//!
//! Species differ only in data. Each [`Species`] maps to a static
//! [`SpeciesProfile`] row; behaviour that varies per species goes through
//! the small [`LegSwing`] and [`PlacementPolicy`] capability traits rather
//! than per-species types.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Creature species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Pig,
    Cow,
    Sheep,
    Chicken,
}

impl Species {
    pub const ALL: [Species; 4] = [Species::Pig, Species::Cow, Species::Sheep, Species::Chicken];

    /// Parameter row for this species.
    pub fn profile(self) -> &'static SpeciesProfile {
        match self {
            Species::Pig => &PIG,
            Species::Cow => &COW,
            Species::Sheep => &SHEEP,
            Species::Chicken => &CHICKEN,
        }
    }

    pub fn name(self) -> &'static str {
        self.profile().name
    }

    /// Stable numeric tag for render buffers.
    pub fn to_u32(self) -> u32 {
        match self {
            Species::Pig => 0,
            Species::Cow => 1,
            Species::Sheep => 2,
            Species::Chicken => 3,
        }
    }
}

impl std::fmt::Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a species prefers to appear when spawned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Uniformly anywhere inside the world margin
    Scattered,
    /// Inside a band of `band` cells along the world edge
    EdgeBiased { band: i32 },
}

/// Per-species movement, animation and footprint parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesProfile {
    pub name: &'static str,
    /// Walking speed (blocks/s) before the global speed multiplier
    pub move_speed: f32,
    /// Peak leg rotation while walking (radians)
    pub swing_amplitude: f32,
    /// Duration of one full leg cycle (ms)
    pub swing_period_ms: f32,
    /// Model height above the feet (blocks)
    pub height: f32,
    /// Horizontal body radius (blocks)
    pub radius: f32,
    pub placement: Placement,
}

const PIG: SpeciesProfile = SpeciesProfile {
    name: "Pig",
    move_speed: 1.6,
    swing_amplitude: 0.5,
    swing_period_ms: 600.0,
    height: 0.9,
    radius: 0.35,
    placement: Placement::Scattered,
};

const COW: SpeciesProfile = SpeciesProfile {
    name: "Cow",
    move_speed: 1.2,
    swing_amplitude: 0.4,
    swing_period_ms: 800.0,
    height: 1.4,
    radius: 0.45,
    placement: Placement::Scattered,
};

const SHEEP: SpeciesProfile = SpeciesProfile {
    name: "Sheep",
    move_speed: 1.3,
    swing_amplitude: 0.45,
    swing_period_ms: 700.0,
    height: 1.3,
    radius: 0.4,
    placement: Placement::EdgeBiased { band: 8 },
};

const CHICKEN: SpeciesProfile = SpeciesProfile {
    name: "Chicken",
    move_speed: 2.0,
    swing_amplitude: 0.8,
    swing_period_ms: 350.0,
    height: 0.7,
    radius: 0.25,
    placement: Placement::EdgeBiased { band: 6 },
};

/// Leg animation capability.
pub trait LegSwing {
    /// Leg rotation (radians) at animation phase `phase_ms`.
    fn leg_swing(&self, phase_ms: f32) -> f32;
}

impl LegSwing for SpeciesProfile {
    fn leg_swing(&self, phase_ms: f32) -> f32 {
        let period = self.swing_period_ms.max(1.0);
        (phase_ms / period * std::f32::consts::TAU).sin() * self.swing_amplitude
    }
}

/// Spawn-column selection capability.
pub trait PlacementPolicy {
    /// Pick an `(x, z)` world position inside a world of edge `size`.
    fn pick_column<R: Rng>(&self, size: i32, rng: &mut R) -> (f32, f32);
}

/// Keep spawns this far from the outer faces.
const SPAWN_EDGE_MARGIN: f32 = 1.0;

impl PlacementPolicy for Placement {
    fn pick_column<R: Rng>(&self, size: i32, rng: &mut R) -> (f32, f32) {
        let lo = SPAWN_EDGE_MARGIN;
        let hi = size as f32 - SPAWN_EDGE_MARGIN;
        if hi - lo < 1.0 {
            // No room inside the margin
            let center = size.max(0) as f32 * 0.5;
            return (center, center);
        }
        match *self {
            Placement::Scattered => (rng.gen_range(lo..hi), rng.gen_range(lo..hi)),
            Placement::EdgeBiased { band } => {
                let band = (band as f32).min((hi - lo) * 0.5).max(0.01);
                let along = rng.gen_range(lo..hi);
                let across = if rng.gen_bool(0.5) {
                    rng.gen_range(lo..lo + band)
                } else {
                    rng.gen_range(hi - band..hi)
                };
                if rng.gen_bool(0.5) {
                    (along, across)
                } else {
                    (across, along)
                }
            }
        }
    }
}

impl PlacementPolicy for SpeciesProfile {
    fn pick_column<R: Rng>(&self, size: i32, rng: &mut R) -> (f32, f32) {
        self.placement.pick_column(size, rng)
    }
}
