//! 战斗之间的玩家存档（JSON）。未知的卡牌、遗物和状态会被跳过。

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::content::{create_card, create_relic};
use crate::game::{Combatant, Player, StatusKind};

pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum SaveError {
    #[error("malformed save: {reason}")]
    Malformed { reason: String },
    #[error("save version {version} is newer than {supported}")]
    UnsupportedVersion { version: u32, supported: u32 },
}

impl From<serde_json::Error> for SaveError {
    fn from(error: serde_json::Error) -> Self {
        SaveError::Malformed {
            reason: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardSave {
    pub card_id: String,
    #[serde(default)]
    pub upgraded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelicSave {
    pub relic_id: String,
    #[serde(default)]
    pub counter: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_version() -> u32 {
    SAVE_VERSION
}

fn default_max_energy() -> i32 {
    Player::DEFAULT_MAX_ENERGY
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSave {
    #[serde(default = "default_version")]
    pub version: u32,
    pub name: String,
    pub max_hp: i32,
    pub current_hp: i32,
    pub gold: i32,
    #[serde(default = "default_max_energy")]
    pub max_energy: i32,
    #[serde(default)]
    pub deck: Vec<CardSave>,
    #[serde(default)]
    pub relics: Vec<RelicSave>,
    /// Keyed by status name so unknown entries can be skipped on load.
    #[serde(default)]
    pub status_effects: BTreeMap<String, i32>,
}

impl PlayerSave {
    pub fn capture(player: &Player) -> Self {
        Self {
            version: SAVE_VERSION,
            name: player.name.clone(),
            max_hp: player.max_hp(),
            current_hp: player.current_hp(),
            gold: player.gold,
            max_energy: player.max_energy,
            deck: player
                .master_deck
                .iter()
                .map(|card| CardSave {
                    card_id: card.id().to_string(),
                    upgraded: card.upgraded,
                })
                .collect(),
            relics: player
                .relics
                .iter()
                .map(|relic| RelicSave {
                    relic_id: relic.id().to_string(),
                    counter: relic.counter,
                    enabled: relic.enabled,
                })
                .collect(),
            status_effects: player
                .statuses
                .iter()
                .map(|(kind, amount)| (kind.to_string(), amount))
                .collect(),
        }
    }

    /// Rebuilds the player. Entries naming content this build does not know
    /// are dropped with a warning.
    pub fn restore(&self) -> Player {
        let mut player = Player::new(self.name.clone(), self.max_hp);
        player.vitals.current_hp = self.current_hp.clamp(0, self.max_hp.max(0));
        player.gold = self.gold;
        player.max_energy = self.max_energy;

        for card in &self.deck {
            match create_card(&card.card_id, card.upgraded) {
                Some(instance) => player.add_card(instance),
                None => warn!(card_id = %card.card_id, "skipping unknown card in save"),
            }
        }

        for saved in &self.relics {
            let Some(mut relic) = create_relic(&saved.relic_id) else {
                warn!(relic_id = %saved.relic_id, "skipping unknown relic in save");
                continue;
            };
            relic.counter = saved.counter;
            relic.enabled = saved.enabled;
            player.add_relic(relic);
        }

        for (name, &amount) in &self.status_effects {
            match StatusKind::from_str(name) {
                Ok(kind) => player.statuses.set(kind, amount),
                Err(_) => warn!(status = %name, "skipping unknown status in save"),
            }
        }
        player
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        let save: PlayerSave = serde_json::from_str(json)?;
        if save.version > SAVE_VERSION {
            return Err(SaveError::UnsupportedVersion {
                version: save.version,
                supported: SAVE_VERSION,
            });
        }
        Ok(save)
    }
}

pub fn save_player(player: &Player) -> Result<String, SaveError> {
    PlayerSave::capture(player).to_json()
}

pub fn load_player(json: &str) -> Result<Player, SaveError> {
    PlayerSave::from_json(json).map(|save| save.restore())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{create_player, CharacterClass};

    #[test]
    fn player_survives_a_save_cycle() {
        let mut player = create_player(CharacterClass::Ironclad);
        player.vitals.current_hp = 41;
        player.gold = 150;
        player.master_deck[0].upgrade();
        player.statuses.set(StatusKind::Strength, 2);

        let json = save_player(&player).expect("save serializes");
        let restored = load_player(&json).expect("save loads");

        assert_eq!(restored.current_hp(), 41);
        assert_eq!(restored.gold, 150);
        assert_eq!(restored.master_deck.len(), 10);
        assert!(restored.master_deck[0].upgraded);
        assert!(restored.has_relic("burning_blood"));
        assert_eq!(restored.statuses.get(StatusKind::Strength), 2);
        assert_eq!(PlayerSave::capture(&restored), PlayerSave::capture(&player));
    }

    #[test]
    fn unknown_entries_are_skipped() {
        let json = r#"{
            "name": "Tester",
            "max_hp": 60,
            "current_hp": 60,
            "gold": 10,
            "deck": [{"card_id": "strike"}, {"card_id": "wish"}],
            "relics": [{"relic_id": "anchor", "counter": 0}, {"relic_id": "snecko_eye"}],
            "status_effects": {"STRENGTH": 1, "MANTRA": 4}
        }"#;

        let player = load_player(json).expect("lossy load succeeds");

        assert_eq!(player.master_deck.len(), 1);
        assert_eq!(player.relics.len(), 1);
        assert_eq!(player.statuses.len(), 1);
        assert_eq!(player.max_energy, Player::DEFAULT_MAX_ENERGY);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            load_player("{\"name\": 3}"),
            Err(SaveError::Malformed { .. })
        ));
        let future = r#"{"version": 9, "name": "T", "max_hp": 1, "current_hp": 1, "gold": 0}"#;
        assert_eq!(
            load_player(future).map(|_| ()),
            Err(SaveError::UnsupportedVersion {
                version: 9,
                supported: SAVE_VERSION
            })
        );
    }
}
