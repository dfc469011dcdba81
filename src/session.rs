//! 面向表现层的会话：以 JSON 收发请求与结果，不包含任何战斗规则。

use std::str::FromStr;

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ai::{Difficulty, EncounterTier};
use crate::content::{self, CharacterClass};
use crate::game::{
    CardUid, CombatConfig, CombatError, CombatEvent, CombatManager, CombatResult, CombatView,
    Player, PlayOutcome, TurnOutcome,
};
use crate::save::{PlayerSave, SaveError};

/// Encounter rolls use a stream of their own, apart from cards and AI.
const ENCOUNTER_RNG_STREAM: u64 = 2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum SessionError {
    #[error("{error}")]
    Combat {
        #[from]
        error: CombatError,
    },
    #[error("{error}")]
    Save {
        #[from]
        error: SaveError,
    },
    #[error("invalid JSON: {reason}")]
    Json { reason: String },
    #[error("unknown character: {name}")]
    UnknownCharacter { name: String },
    #[error("unknown encounter: {name}")]
    UnknownEncounter { name: String },
    #[error("no player has been created or loaded")]
    NotStarted,
}

impl From<serde_json::Error> for SessionError {
    fn from(error: serde_json::Error) -> Self {
        SessionError::Json {
            reason: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    #[serde(flatten)]
    pub combat: CombatConfig,
    #[serde(default)]
    pub ascension: Difficulty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayRequest {
    pub card: CardUid,
    #[serde(default)]
    pub target: Option<usize>,
}

/// Either a tier to roll from the Act 1 pools or an explicit enemy list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncounterRequest {
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub enemies: Vec<String>,
}

pub struct Session {
    manager: CombatManager,
    player: Option<Player>,
    difficulty: Difficulty,
    encounter_rng: SmallRng,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let encounter_rng = config.combat.rng(ENCOUNTER_RNG_STREAM);
        Self {
            manager: CombatManager::new(config.combat),
            player: None,
            difficulty: config.ascension,
            encounter_rng,
        }
    }

    pub fn from_json(config_json: &str) -> Result<Self, SessionError> {
        let config: SessionConfig = serde_json::from_str(config_json)?;
        Ok(Self::new(config))
    }

    pub fn manager(&self) -> &CombatManager {
        &self.manager
    }

    /// The player between fights, or the one inside the running combat.
    pub fn player(&self) -> Option<&Player> {
        self.manager
            .state()
            .map(|state| &state.player)
            .or(self.player.as_ref())
    }

    pub fn choose_character(&mut self, name: &str) -> Result<&Player, SessionError> {
        let class = CharacterClass::from_str(name).map_err(|_| SessionError::UnknownCharacter {
            name: name.to_string(),
        })?;
        self.manager.finish();
        info!(?class, "character chosen");
        Ok(&*self.player.insert(content::create_player(class)))
    }

    pub fn load_player(&mut self, json: &str) -> Result<(), SessionError> {
        let player = crate::save::load_player(json)?;
        self.manager.finish();
        self.player = Some(player);
        Ok(())
    }

    pub fn save_player(&self) -> Result<String, SessionError> {
        let player = self.player().ok_or(SessionError::NotStarted)?;
        Ok(PlayerSave::capture(player).to_json()?)
    }

    /// Starts a fight against a rolled or listed encounter. A fight still
    /// loaded is closed first and its player carried over.
    pub fn start_encounter(&mut self, request: &EncounterRequest) -> Result<CombatView, SessionError> {
        self.reclaim_player();
        if self.player.is_none() {
            return Err(SessionError::NotStarted);
        }

        let enemies = if request.enemies.is_empty() {
            let name = request.tier.as_deref().unwrap_or("normal");
            let tier = EncounterTier::from_str(name).map_err(|_| SessionError::UnknownEncounter {
                name: name.to_string(),
            })?;
            content::random_encounter(tier, self.difficulty, &mut self.encounter_rng)
        } else {
            request
                .enemies
                .iter()
                .map(|id| {
                    content::create_enemy(id, self.difficulty, &mut self.encounter_rng)
                        .ok_or_else(|| SessionError::UnknownEncounter { name: id.clone() })
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        let player = self.player.take().ok_or(SessionError::NotStarted)?;
        Ok(self.manager.start_combat(player, enemies))
    }

    pub fn play_card(&mut self, request: &PlayRequest) -> Result<PlayOutcome, SessionError> {
        Ok(self.manager.play_card(request.card, request.target)?)
    }

    pub fn end_turn(&mut self) -> Result<TurnOutcome, SessionError> {
        Ok(self.manager.end_player_turn()?)
    }

    pub fn view(&self) -> Result<CombatView, SessionError> {
        self.manager
            .view()
            .ok_or(SessionError::Combat {
                error: CombatError::NoActiveCombat,
            })
    }

    pub fn events(&self) -> Result<&[CombatEvent], SessionError> {
        self.manager
            .state()
            .map(|state| state.events.log())
            .ok_or(SessionError::Combat {
                error: CombatError::NoActiveCombat,
            })
    }

    /// Closes the current fight and keeps the player for the next one.
    pub fn finish_combat(&mut self) -> Result<CombatResult, SessionError> {
        let result = self
            .manager
            .state()
            .map(|state| state.result)
            .ok_or(SessionError::Combat {
                error: CombatError::NoActiveCombat,
            })?;
        self.reclaim_player();
        Ok(result)
    }

    /// Rest site: heal 30% of max HP between fights.
    pub fn rest(&mut self) -> Result<i32, SessionError> {
        self.reclaim_player();
        let player = self.player.as_mut().ok_or(SessionError::NotStarted)?;
        Ok(player.rest())
    }

    fn reclaim_player(&mut self) {
        if let Some(player) = self.manager.finish() {
            self.player = Some(player);
        }
    }

    pub fn start_encounter_json(&mut self, request_json: &str) -> Result<String, SessionError> {
        let request: EncounterRequest = serde_json::from_str(request_json)?;
        let view = self.start_encounter(&request)?;
        Ok(serde_json::to_string(&view)?)
    }

    pub fn play_card_json(&mut self, request_json: &str) -> Result<String, SessionError> {
        let request: PlayRequest = serde_json::from_str(request_json)?;
        let outcome = self.play_card(&request)?;
        Ok(serde_json::to_string(&outcome)?)
    }

    pub fn end_turn_json(&mut self) -> Result<String, SessionError> {
        let outcome = self.end_turn()?;
        Ok(serde_json::to_string(&outcome)?)
    }

    pub fn view_json(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string(&self.view()?)?)
    }

    pub fn events_json(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string(self.events()?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Combatant;

    fn session() -> Session {
        Session::from_json(r#"{"seed": 42, "ascension": 0}"#).expect("config parses")
    }

    #[test]
    fn config_json_flattens_combat_settings() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"cards_per_turn": 6, "ascension": 7}"#).expect("config parses");
        assert_eq!(config.combat.cards_per_turn, 6);
        assert_eq!(config.ascension, Difficulty::ascension(7));
    }

    #[test]
    fn fights_need_a_player() {
        let mut session = session();
        assert_eq!(
            session.start_encounter(&EncounterRequest::default()).map(|_| ()),
            Err(SessionError::NotStarted)
        );
        assert!(matches!(
            session.choose_character("watcher"),
            Err(SessionError::UnknownCharacter { .. })
        ));
    }

    #[test]
    fn a_full_fight_round_trips_through_json() {
        let mut session = session();
        session.choose_character("ironclad").expect("ironclad exists");

        let view: CombatView = serde_json::from_str(
            &session
                .start_encounter_json(r#"{"enemies": ["jaw_worm"]}"#)
                .expect("encounter starts"),
        )
        .expect("view parses");
        assert_eq!(view.hand.len(), 5);
        assert_eq!(view.enemies[0].id, "jaw_worm");

        let strike = view
            .hand
            .iter()
            .find(|card| card.id == "strike")
            .map(|card| card.uid);
        if let Some(card) = strike {
            let request = format!(r#"{{"card": {}, "target": 0}}"#, card);
            let outcome: serde_json::Value =
                serde_json::from_str(&session.play_card_json(&request).expect("strike resolves"))
                    .expect("outcome parses");
            assert_eq!(outcome["energy_spent"], 1);
        }

        session.end_turn_json().expect("turn ends");
        let events: Vec<CombatEvent> =
            serde_json::from_str(&session.events_json().expect("log serializes")).expect("events parse");
        assert!(matches!(events.first(), Some(CombatEvent::Shuffle { .. })));

        assert_eq!(session.finish_combat(), Ok(CombatResult::InProgress));
        assert!(!session.manager().is_active());
        assert!(session.player().is_some());
    }

    #[test]
    fn combat_errors_pass_through_tagged() {
        let mut session = session();
        session.choose_character("silent").expect("silent exists");
        session
            .start_encounter(&EncounterRequest {
                tier: Some("boss".into()),
                enemies: Vec::new(),
            })
            .expect("boss fight starts");

        let error = session
            .play_card(&PlayRequest {
                card: 0,
                target: None,
            })
            .expect_err("uid 0 is never handed out");
        let json = serde_json::to_value(&error).expect("error serializes");
        assert_eq!(json["type"], "Combat");
        assert_eq!(json["error"]["type"], "CardNotInHand");
    }

    #[test]
    fn unknown_tiers_and_enemies_are_rejected() {
        let mut session = session();
        session.choose_character("defect").expect("defect exists");
        let request = EncounterRequest {
            tier: Some("shop".into()),
            enemies: Vec::new(),
        };
        assert!(matches!(
            session.start_encounter(&request),
            Err(SessionError::UnknownEncounter { .. })
        ));
        assert!(session.player().is_some(), "player kept after a failed start");
    }

    #[test]
    fn resting_heals_between_fights() {
        let mut session = session();
        session.choose_character("ironclad").expect("ironclad exists");
        let save = session.save_player().expect("save serializes");
        let mut saved: PlayerSave = serde_json::from_str(&save).expect("save parses");
        saved.current_hp = 20;
        session
            .load_player(&serde_json::to_string(&saved).expect("save serializes"))
            .expect("save loads");

        assert_eq!(session.rest().expect("player rests"), 24);
        assert_eq!(session.player().map(|p| p.current_hp()), Some(44));
    }
}
