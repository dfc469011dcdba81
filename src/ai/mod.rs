//! 敌人 AI 模块（意图选择、难度参数）。

pub mod act1;

use std::str::FromStr;

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::game::{CombatState, Enemy, Intent};

/// Chooses an enemy's next intent. Reads state only; all randomness comes
/// from the supplied generator.
pub type EnemyAi = fn(&Enemy, &CombatState, &mut SmallRng) -> Intent;

/// Fallback behaviour: attack 6 on even turns, block 5 on odd ones.
pub fn alternate_attack_defend(enemy: &Enemy, _state: &CombatState, _rng: &mut SmallRng) -> Intent {
    if enemy.turn_count % 2 == 0 {
        Intent::attack(6)
    } else {
        Intent::defend(5)
    }
}

/// Ascension level of a run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Difficulty {
    pub ascension: u8,
}

impl Difficulty {
    pub const ENEMY_HP_ASCENSION: u8 = 7;

    pub fn ascension(ascension: u8) -> Self {
        Self { ascension }
    }

    pub fn scale_enemy_hp(self, hp: i32) -> i32 {
        if self.ascension >= Self::ENEMY_HP_ASCENSION {
            hp * 11 / 10
        } else {
            hp
        }
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let digits = s
            .strip_prefix("ascension")
            .or_else(|| s.strip_prefix('a'))
            .unwrap_or(s.as_str())
            .trim();
        digits.parse::<u8>().map(Difficulty::ascension).map_err(|_| ())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EncounterTier {
    Easy,
    Normal,
    Elite,
    Boss,
}

impl Default for EncounterTier {
    fn default() -> Self {
        EncounterTier::Normal
    }
}

impl FromStr for EncounterTier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" | "weak" => Ok(EncounterTier::Easy),
            "normal" | "combat" | "monster" => Ok(EncounterTier::Normal),
            "elite" => Ok(EncounterTier::Elite),
            "boss" => Ok(EncounterTier::Boss),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_common_spellings() {
        assert_eq!("7".parse::<Difficulty>(), Ok(Difficulty::ascension(7)));
        assert_eq!("A10".parse::<Difficulty>(), Ok(Difficulty::ascension(10)));
        assert_eq!("ascension 3".parse::<Difficulty>(), Ok(Difficulty::ascension(3)));
        assert!("hard".parse::<Difficulty>().is_err());
    }

    #[test]
    fn hp_scaling_starts_at_ascension_seven() {
        assert_eq!(Difficulty::ascension(6).scale_enemy_hp(44), 44);
        assert_eq!(Difficulty::ascension(7).scale_enemy_hp(44), 48);
    }

    #[test]
    fn encounter_tier_from_str() {
        assert_eq!("ELITE".parse::<EncounterTier>(), Ok(EncounterTier::Elite));
        assert_eq!("monster".parse::<EncounterTier>(), Ok(EncounterTier::Normal));
        assert!("shop".parse::<EncounterTier>().is_err());
    }
}
