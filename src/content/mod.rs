//! 游戏内容数据（卡牌、敌人、遗物、角色）。

pub mod cards;
pub mod enemies;
pub mod relics;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::game::{CardInstance, Player};

pub use cards::{card_ids, card_template, create_card};
pub use enemies::{create_enemy, enemy_ids, enemy_template, random_encounter};
pub use relics::{create_relic, relic_ids, relic_template};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CharacterClass {
    Ironclad,
    Silent,
    Defect,
}

impl Default for CharacterClass {
    fn default() -> Self {
        CharacterClass::Ironclad
    }
}

impl FromStr for CharacterClass {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ironclad" | "warrior" => Ok(CharacterClass::Ironclad),
            "silent" | "mage" => Ok(CharacterClass::Silent),
            "defect" | "rogue" => Ok(CharacterClass::Defect),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CharacterDefinition {
    pub class: CharacterClass,
    pub name: &'static str,
    pub description: &'static str,
    pub max_hp: i32,
    pub starting_gold: i32,
    pub max_energy: i32,
    pub starter_relic: &'static str,
    /// `(card id, copies)` in deck order.
    pub starter_deck: &'static [(&'static str, usize)],
}

const IRONCLAD: CharacterDefinition = CharacterDefinition {
    class: CharacterClass::Ironclad,
    name: "Ironclad",
    description: "A battle-hardened warrior who harnesses pain to fuel powerful attacks.",
    max_hp: 80,
    starting_gold: 99,
    max_energy: 3,
    starter_relic: "burning_blood",
    starter_deck: &[("strike", 5), ("defend", 4), ("bash", 1)],
};

const SILENT: CharacterDefinition = CharacterDefinition {
    class: CharacterClass::Silent,
    name: "Silent",
    description: "A deadly huntress from the foglands, masters poison and shivs.",
    max_hp: 70,
    starting_gold: 99,
    max_energy: 3,
    starter_relic: "ring_of_the_snake",
    starter_deck: &[("strike", 5), ("defend", 5), ("neutralize", 1), ("survivor", 1)],
};

const DEFECT: CharacterDefinition = CharacterDefinition {
    class: CharacterClass::Defect,
    name: "Defect",
    description: "A combat automaton that channels energy through orbs.",
    max_hp: 75,
    starting_gold: 99,
    max_energy: 3,
    starter_relic: "cracked_core",
    starter_deck: &[("strike", 4), ("defend", 4)],
};

impl CharacterClass {
    pub fn definition(self) -> &'static CharacterDefinition {
        match self {
            CharacterClass::Ironclad => &IRONCLAD,
            CharacterClass::Silent => &SILENT,
            CharacterClass::Defect => &DEFECT,
        }
    }
}

pub fn starter_deck(class: CharacterClass) -> Vec<CardInstance> {
    class
        .definition()
        .starter_deck
        .iter()
        .flat_map(|&(id, copies)| (0..copies).filter_map(move |_| create_card(id, false)))
        .collect()
}

/// A fresh player with the class's stats, starter deck and starter relic.
pub fn create_player(class: CharacterClass) -> Player {
    let definition = class.definition();
    let mut player = Player::new(definition.name, definition.max_hp).with_deck(starter_deck(class));
    player.gold = definition.starting_gold;
    player.max_energy = definition.max_energy;
    if let Some(relic) = create_relic(definition.starter_relic) {
        player.add_relic(relic);
    }
    player
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Combatant;

    #[test]
    fn ironclad_starts_with_ten_cards_and_burning_blood() {
        let player = create_player(CharacterClass::Ironclad);
        assert_eq!(player.max_hp(), 80);
        assert_eq!(player.master_deck.len(), 10);
        assert_eq!(
            player.master_deck.iter().filter(|card| card.id() == "strike").count(),
            5
        );
        assert!(player.has_relic("burning_blood"));
    }

    #[test]
    fn silent_deck_matches_its_definition() {
        let player = create_player(CharacterClass::Silent);
        assert_eq!(player.max_hp(), 70);
        assert_eq!(player.master_deck.len(), 12);
        assert!(player.has_relic("ring_of_the_snake"));
    }

    #[test]
    fn class_names_parse_with_aliases() {
        assert_eq!("Warrior".parse::<CharacterClass>(), Ok(CharacterClass::Ironclad));
        assert_eq!("defect".parse::<CharacterClass>(), Ok(CharacterClass::Defect));
        assert!("watcher".parse::<CharacterClass>().is_err());
    }
}
