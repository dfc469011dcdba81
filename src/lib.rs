pub mod ai;
pub mod content;
pub mod game;
pub mod save;
pub mod session;

use std::str::FromStr;

use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

pub use ai::{Difficulty, EncounterTier};
pub use content::{CharacterClass, CharacterDefinition};
pub use game::{
    CardInstance, CardTemplate, CardUid, CardView, CombatConfig, CombatError, CombatEvent,
    CombatManager, CombatPhase, CombatResult, CombatState, CombatView, Enemy, EnemyAction, Intent,
    Player, PlayOutcome, RelicTemplate, StatusKind, TurnOutcome,
};
pub use save::{PlayerSave, SaveError};
pub use session::{EncounterRequest, PlayRequest, Session, SessionConfig, SessionError};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

fn to_js_error(error: SessionError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// 浏览器侧的战斗会话，所有输入输出均为 JSON 字符串。
#[wasm_bindgen]
pub struct CombatSession {
    session: Session,
}

#[wasm_bindgen]
impl CombatSession {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<CombatSession, JsValue> {
        let session = match config_json {
            Some(json) => Session::from_json(&json).map_err(to_js_error)?,
            None => Session::default(),
        };
        Ok(CombatSession { session })
    }

    pub fn choose_character(&mut self, name: &str) -> Result<String, JsValue> {
        let player = self.session.choose_character(name).map_err(to_js_error)?;
        serde_json::to_string(&PlayerSave::capture(player)).map_err(serde_to_js_error)
    }

    pub fn load_player_json(&mut self, json: &str) -> Result<(), JsValue> {
        self.session.load_player(json).map_err(to_js_error)
    }

    pub fn save_player_json(&self) -> Result<String, JsValue> {
        self.session.save_player().map_err(to_js_error)
    }

    pub fn start_encounter_json(&mut self, request_json: &str) -> Result<String, JsValue> {
        self.session
            .start_encounter_json(request_json)
            .map_err(to_js_error)
    }

    pub fn play_card_json(&mut self, request_json: &str) -> Result<String, JsValue> {
        self.session.play_card_json(request_json).map_err(to_js_error)
    }

    pub fn end_turn_json(&mut self) -> Result<String, JsValue> {
        self.session.end_turn_json().map_err(to_js_error)
    }

    pub fn view_json(&self) -> Result<String, JsValue> {
        self.session.view_json().map_err(to_js_error)
    }

    pub fn events_json(&self) -> Result<String, JsValue> {
        self.session.events_json().map_err(to_js_error)
    }

    pub fn finish_combat(&mut self) -> Result<JsValue, JsValue> {
        let result = self.session.finish_combat().map_err(to_js_error)?;
        to_value(&result).map_err(JsValue::from)
    }

    pub fn rest(&mut self) -> Result<i32, JsValue> {
        self.session.rest().map_err(to_js_error)
    }
}

#[wasm_bindgen(js_name = "listCards")]
pub fn list_cards() -> Result<JsValue, JsValue> {
    to_value(&content::card_ids()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "cardTemplate")]
pub fn card_template(id: &str) -> Result<JsValue, JsValue> {
    let template = content::card_template(id);
    to_value(&template).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "listRelics")]
pub fn list_relics() -> Result<JsValue, JsValue> {
    to_value(&content::relic_ids()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "relicTemplate")]
pub fn relic_template(id: &str) -> Result<JsValue, JsValue> {
    to_value(&content::relic_template(id)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "listEnemies")]
pub fn list_enemies() -> Result<JsValue, JsValue> {
    to_value(&content::enemy_ids()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "characterDefinition")]
pub fn character_definition(name: &str) -> Result<JsValue, JsValue> {
    let class = CharacterClass::from_str(name).map_err(|_| {
        to_js_error(SessionError::UnknownCharacter {
            name: name.to_string(),
        })
    })?;
    to_value(class.definition()).map_err(JsValue::from)
}

/// Rebuilds a save through the content catalogue. Unknown entries are
/// dropped and the version is brought current.
#[wasm_bindgen(js_name = "normalizeSave")]
pub fn normalize_save(save: JsValue) -> Result<JsValue, JsValue> {
    let save: PlayerSave = from_value(save).map_err(JsValue::from)?;
    let player = save.restore();
    to_value(&PlayerSave::capture(&player)).map_err(JsValue::from)
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
