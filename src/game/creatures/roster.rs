//! Creature Roster
//!
//! Arena of live creatures keyed by [`CreatureId`]. Iteration order is the
//! id order, which keeps the simulation deterministic for a given seed.

use std::collections::BTreeMap;

use glam::Vec3;

use super::creature::{Creature, CreatureId};
use super::species::Species;

#[derive(Debug, Default)]
pub struct CreatureRoster {
    next_id: u32,
    creatures: BTreeMap<CreatureId, Creature>,
}

impl CreatureRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a creature and return its id.
    pub fn spawn(&mut self, species: Species, position: Vec3, heading: f32) -> CreatureId {
        self.next_id += 1;
        let id = CreatureId(self.next_id);
        self.creatures
            .insert(id, Creature::new(id, species, position, heading));
        id
    }

    pub fn remove(&mut self, id: CreatureId) -> Option<Creature> {
        self.creatures.remove(&id)
    }

    pub fn get(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    pub fn get_mut(&mut self, id: CreatureId) -> Option<&mut Creature> {
        self.creatures.get_mut(&id)
    }

    pub fn contains(&self, id: CreatureId) -> bool {
        self.creatures.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Creature> {
        self.creatures.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Creature> {
        self.creatures.values_mut()
    }

    /// Snapshot of the current ids, for loops that mutate the roster.
    pub fn ids(&self) -> Vec<CreatureId> {
        self.creatures.keys().copied().collect()
    }

    /// Live (non-ejected) creatures of `species`.
    pub fn count(&self, species: Species) -> usize {
        self.creatures
            .values()
            .filter(|c| c.species == species && c.is_active())
            .count()
    }

    pub fn len(&self) -> usize {
        self.creatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }
}
