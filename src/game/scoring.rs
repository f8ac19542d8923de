//! Scoreboard - kills per species and burned creatures.

use std::collections::BTreeMap;

use serde::Serialize;

use super::creatures::Species;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Scoreboard {
    kills: BTreeMap<Species, u32>,
    burned: u32,
    skill_cards: u32,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_kill(&mut self, species: Species) {
        *self.kills.entry(species).or_insert(0) += 1;
    }

    pub fn record_burn(&mut self) {
        self.burned += 1;
    }

    pub fn record_skill_card(&mut self) {
        self.skill_cards += 1;
    }

    pub fn kills(&self, species: Species) -> u32 {
        self.kills.get(&species).copied().unwrap_or(0)
    }

    pub fn total_kills(&self) -> u32 {
        self.kills.values().sum()
    }

    pub fn burned(&self) -> u32 {
        self.burned
    }

    pub fn skill_cards(&self) -> u32 {
        self.skill_cards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kill_tally() {
        let mut score = Scoreboard::new();
        score.record_kill(Species::Pig);
        score.record_kill(Species::Pig);
        score.record_kill(Species::Cow);
        score.record_burn();
        assert_eq!(score.kills(Species::Pig), 2);
        assert_eq!(score.kills(Species::Sheep), 0);
        assert_eq!(score.total_kills(), 3);
        assert_eq!(score.burned(), 1);
    }
}
