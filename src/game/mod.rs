//! 战斗核心逻辑模块（状态、卡牌、状态效果、事件总线、战斗管理器等）。

pub mod cards;
pub mod config;
pub mod effects;
pub mod energy;
pub mod entities;
pub mod events;
pub mod piles;
pub mod relics;
pub mod rules;
pub mod state;
pub mod status;

pub use cards::{
    CardFlags, CardInstance, CardTemplate, CardTemplateBuilder, CardType, CardUid, CardUpgrade,
    CardView, Rarity, TargetMode,
};
pub use config::CombatConfig;
pub use effects::{Effect, EffectContext, EffectOutcome, EffectResolution, Targets};
pub use energy::EnergyState;
pub use entities::{
    Combatant, CombatantId, DamageOutcome, Enemy, EnemyTemplate, Intent, IntentKind, Player,
    Vitals,
};
pub use events::{CombatEvent, EventBus, EventKind, EventQueue, SubscriptionId};
pub use piles::{DeckPiles, InsertPosition, PileCounts, PileKind};
pub use relics::{RelicEffect, RelicInstance, RelicRarity, RelicTemplate, RelicTrigger};
pub use rules::{CombatError, CombatManager, EnemyAction, PlayOutcome, TurnOutcome};
pub use state::{CombatPhase, CombatResult, CombatState, CombatView, EnemyView, PlayerView};
pub use status::{StatusGrant, StatusKind, StatusMap, StatusOutcome};
