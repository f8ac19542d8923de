//! Simulation Settings
//!
//! The read-only settings object consumed when a [`Simulation`] is built.
//! Every field has a default so partial JSON documents are accepted.
//!
//! [`Simulation`]: crate::game::Simulation

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::game::creatures::Species;
use crate::world::MAX_WORLD_SIZE;

/// Initial census per species; replenishment tops up toward these counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationTargets {
    pub pig: u32,
    pub cow: u32,
    pub sheep: u32,
    pub chicken: u32,
}

impl Default for PopulationTargets {
    fn default() -> Self {
        Self {
            pig: 6,
            cow: 4,
            sheep: 5,
            chicken: 8,
        }
    }
}

impl PopulationTargets {
    /// No creatures at all.
    pub const NONE: Self = Self {
        pig: 0,
        cow: 0,
        sheep: 0,
        chicken: 0,
    };

    pub fn target(&self, species: Species) -> u32 {
        match species {
            Species::Pig => self.pig,
            Species::Cow => self.cow,
            Species::Sheep => self.sheep,
            Species::Chicken => self.chicken,
        }
    }

    pub fn total(&self) -> u32 {
        self.pig + self.cow + self.sheep + self.chicken
    }
}

/// Central configuration for the simulation.
///
/// Debris values are per tick (debris advances once per frame); creature
/// values are per second and scaled by the frame's `delta_ms`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Edge length of the cubic world (cells)
    pub world_size: i32,
    /// Seed for every random policy
    pub seed: u64,

    /// Base blast radius (cells)
    pub explosion_radius: f32,
    /// Radius added by one upgrade
    pub radius_upgrade_step: f32,
    /// Upgrades never push the radius past this
    pub max_explosion_radius: f32,

    /// Countdown from arming to detonation (ms)
    pub fuse_ms: f32,
    /// Blink toggle period while armed (ms)
    pub blink_interval_ms: f32,
    /// Delay before a chained explosive goes off (ms)
    pub chain_delay_ms: RangeInclusive<f32>,
    /// How long a detonation flash stays visible (ms)
    pub flash_duration_ms: f32,

    /// Creature gravity (blocks/s²)
    pub gravity: f32,
    /// Multiplier applied to every species' walking speed
    pub default_move_speed: f32,

    /// Debris gravity (blocks/tick²)
    pub debris_gravity: f32,
    /// Block debris lifetime (ticks)
    pub debris_lifetime_ticks: RangeInclusive<u32>,
    /// Oldest debris is dropped beyond this count
    pub max_debris: usize,

    pub population: PopulationTargets,
    /// Period of the replenishment check (ms)
    pub replenish_interval_ms: f32,
    /// Most creatures spawned by one replenishment check
    pub replenish_batch_cap: u32,

    /// Magnet pull range (blocks)
    pub magnet_radius: f32,
    /// Magnet pull at zero distance (blocks/s)
    pub magnet_strength: f32,

    /// Probability that a kill awards a skill card
    pub skill_card_chance: f64,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            world_size: 64,
            seed: 0x5EED,
            explosion_radius: 3.5,
            radius_upgrade_step: 0.5,
            max_explosion_radius: 8.0,
            fuse_ms: 3000.0,
            blink_interval_ms: 200.0,
            chain_delay_ms: 30.0..=80.0,
            flash_duration_ms: 250.0,
            gravity: 20.0,
            default_move_speed: 1.0,
            debris_gravity: 0.015,
            debris_lifetime_ticks: 45..=90,
            max_debris: 600,
            population: PopulationTargets::default(),
            replenish_interval_ms: 10_000.0,
            replenish_batch_cap: 3,
            magnet_radius: 12.0,
            magnet_strength: 6.0,
            skill_card_chance: 0.15,
        }
    }
}

impl SimSettings {
    /// Parse settings from JSON and validate them.
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let settings: SimSettings = serde_json::from_str(json)?;
        settings.validate()?;
        log::info!(
            "loaded settings: world {}³, radius {}, seed {:#x}",
            settings.world_size,
            settings.explosion_radius,
            settings.seed
        );
        Ok(settings)
    }

    /// Reject values that would make the simulation meaningless.
    pub fn validate(&self) -> SimResult<()> {
        if self.world_size < 1 || self.world_size > MAX_WORLD_SIZE {
            return Err(SimError::InvalidWorldSize {
                size: self.world_size,
                max: MAX_WORLD_SIZE,
            });
        }

        positive("explosion_radius", self.explosion_radius)?;
        positive("max_explosion_radius", self.max_explosion_radius)?;
        positive("fuse_ms", self.fuse_ms)?;
        positive("blink_interval_ms", self.blink_interval_ms)?;
        positive("replenish_interval_ms", self.replenish_interval_ms)?;
        non_negative("radius_upgrade_step", self.radius_upgrade_step)?;
        non_negative("flash_duration_ms", self.flash_duration_ms)?;
        non_negative("gravity", self.gravity)?;
        non_negative("default_move_speed", self.default_move_speed)?;
        non_negative("debris_gravity", self.debris_gravity)?;
        non_negative("magnet_radius", self.magnet_radius)?;
        non_negative("magnet_strength", self.magnet_strength)?;

        if self.max_explosion_radius < self.explosion_radius {
            return Err(invalid(
                "max_explosion_radius",
                format!("{} is below explosion_radius", self.max_explosion_radius),
            ));
        }
        let (lo, hi) = (*self.chain_delay_ms.start(), *self.chain_delay_ms.end());
        if !lo.is_finite() || !hi.is_finite() || lo < 0.0 || lo > hi {
            return Err(invalid("chain_delay_ms", format!("bad range {lo}..={hi}")));
        }
        if self.debris_lifetime_ticks.is_empty() {
            return Err(invalid("debris_lifetime_ticks", "empty range".to_string()));
        }
        if !(0.0..=1.0).contains(&self.skill_card_chance) {
            return Err(invalid(
                "skill_card_chance",
                format!("{} is not a probability", self.skill_card_chance),
            ));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, reason: String) -> SimError {
    SimError::InvalidSetting { name, reason }
}

fn positive(name: &'static str, value: f32) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("{value} must be positive")))
    }
}

fn non_negative(name: &'static str, value: f32) -> SimResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("{value} must not be negative")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SimSettings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings =
            SimSettings::from_json_str(r#"{ "world_size": 32, "population": { "pig": 2 } }"#)
                .unwrap();
        assert_eq!(settings.world_size, 32);
        assert_eq!(settings.population.pig, 2);
        assert_eq!(settings.population.cow, 4);
        assert_eq!(settings.explosion_radius, 3.5);
    }

    #[test]
    fn test_rejects_bad_world_size() {
        let err = SimSettings::from_json_str(r#"{ "world_size": 0 }"#).unwrap_err();
        assert!(matches!(err, SimError::InvalidWorldSize { size: 0, .. }));
    }

    #[test]
    fn test_rejects_negative_radius() {
        let err = SimSettings::from_json_str(r#"{ "explosion_radius": -1.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidSetting {
                name: "explosion_radius",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        assert!(matches!(
            SimSettings::from_json_str("{ nope"),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn test_population_lookup() {
        let targets = PopulationTargets::default();
        assert_eq!(targets.target(Species::Chicken), 8);
        assert_eq!(targets.total(), 23);
    }
}
