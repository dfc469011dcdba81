use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::entities::{CombatantId, Player};
use super::events::{CombatEvent, EventBus, EventKind, SubscriptionId};
use super::state::CombatState;
use super::status::StatusKind;

/// Relic handlers run after anything registered with a higher priority.
pub const RELIC_PRIORITY: i32 = 0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelicTrigger {
    Passive,
    OnPickup,
    CombatStart,
    CombatEnd,
    TurnStart,
    TurnEnd,
    OnCardPlay,
    OnDamageDealt,
    OnDamageTaken,
    OnHpLoss,
    OnShuffle,
    OnExhaust,
    OnRest,
}

impl RelicTrigger {
    /// The event a relic listens to during combat. Triggers outside combat
    /// have none.
    pub fn event_kind(self) -> Option<EventKind> {
        match self {
            RelicTrigger::CombatStart => Some(EventKind::CombatStart),
            RelicTrigger::CombatEnd => Some(EventKind::CombatEnd),
            RelicTrigger::TurnStart => Some(EventKind::TurnStart),
            RelicTrigger::TurnEnd => Some(EventKind::TurnEnd),
            RelicTrigger::OnCardPlay => Some(EventKind::CardPlayed),
            RelicTrigger::OnDamageDealt => Some(EventKind::DamageDealt),
            RelicTrigger::OnDamageTaken => Some(EventKind::DamageTaken),
            RelicTrigger::OnHpLoss => Some(EventKind::HpLost),
            RelicTrigger::OnShuffle => Some(EventKind::Shuffle),
            RelicTrigger::OnExhaust => Some(EventKind::CardExhausted),
            RelicTrigger::Passive | RelicTrigger::OnPickup | RelicTrigger::OnRest => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RelicRarity {
    Starter,
    Common,
    Uncommon,
    Rare,
    Boss,
    Special,
}

/// What a relic does when its event arrives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RelicEffect {
    /// Placeholder for mechanics the engine does not model.
    Inert,
    HealOnVictory { amount: i32 },
    DrawCards { count: usize },
    GainBlock { amount: i32 },
    Heal { amount: i32 },
    GainStatus { status: StatusKind, amount: i32 },
    ApplyToAllEnemies { status: StatusKind, amount: i32 },
    /// Pays out once per charge; charges are added by resting.
    BonusEnergy { amount: i32 },
    DrawOnFirstHpLoss { count: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelicTemplate {
    pub id: String,
    pub name: String,
    pub rarity: RelicRarity,
    pub description: String,
    pub trigger: RelicTrigger,
    pub effect: RelicEffect,
    #[serde(default)]
    pub counter_based: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_counter: Option<i32>,
    #[serde(default)]
    pub resets_each_combat: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RelicInstance {
    pub template: Arc<RelicTemplate>,
    pub counter: i32,
    pub enabled: bool,
    #[serde(skip)]
    pub subscription: Option<SubscriptionId>,
}

impl RelicInstance {
    pub fn new(template: Arc<RelicTemplate>) -> Self {
        Self {
            template,
            counter: 0,
            enabled: true,
            subscription: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.template.id
    }

    pub fn name(&self) -> &str {
        &self.template.name
    }

    pub fn description(&self) -> String {
        if self.template.counter_based {
            self.template
                .description
                .replace("{counter}", &self.counter.to_string())
        } else {
            self.template.description.clone()
        }
    }

    /// Clamped to `max_counter` when the template sets one.
    pub fn increment_counter(&mut self, amount: i32) -> i32 {
        self.counter += amount;
        if let Some(max) = self.template.max_counter {
            self.counter = self.counter.min(max);
        }
        self.counter
    }

    pub fn reset_counter(&mut self) {
        self.counter = 0;
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn on_rest(&mut self) {
        if matches!(self.template.effect, RelicEffect::BonusEnergy { .. }) {
            self.increment_counter(1);
        }
    }
}

/// Resolves the relic at `index` in the player's collection against `event`.
/// Returns whether it had any effect.
pub fn activate(index: usize, event: &CombatEvent, state: &mut CombatState) -> bool {
    let Some(relic) = state.player.relics.get(index) else {
        return false;
    };
    if !relic.enabled {
        return false;
    }
    let effect = relic.template.effect;
    let counter = relic.counter;
    tracing::debug!(relic = relic.id(), event = ?event.kind(), "relic triggered");

    match effect {
        RelicEffect::Inert => false,
        RelicEffect::HealOnVictory { amount } => match event {
            CombatEvent::CombatEnd { victory: true } => {
                state.heal(CombatantId::Player, amount);
                true
            }
            _ => false,
        },
        RelicEffect::DrawCards { count } => !state.draw_cards(count).is_empty(),
        RelicEffect::GainBlock { amount } => state.gain_block(CombatantId::Player, amount) > 0,
        RelicEffect::Heal { amount } => {
            state.heal(CombatantId::Player, amount);
            true
        }
        RelicEffect::GainStatus { status, amount } => state
            .apply_status(CombatantId::Player, status, amount)
            .map_or(false, |outcome| outcome.applied()),
        RelicEffect::ApplyToAllEnemies { status, amount } => {
            for target in state.living_enemy_ids() {
                state.apply_status(target, status, amount);
            }
            true
        }
        RelicEffect::BonusEnergy { amount } => {
            if counter <= 0 {
                return false;
            }
            state.gain_energy(amount);
            state.player.relics[index].reset_counter();
            true
        }
        RelicEffect::DrawOnFirstHpLoss { count } => match event {
            CombatEvent::HpLost {
                target: CombatantId::Player,
                ..
            } if counter == 0 => {
                state.player.relics[index].increment_counter(1);
                state.draw_cards(count);
                true
            }
            _ => false,
        },
    }
}

/// Hooks every relic with a combat trigger into the bus. Per-combat counters
/// reset here.
pub fn subscribe_relics(bus: &mut EventBus<CombatState>, player: &mut Player) {
    for (index, relic) in player.relics.iter_mut().enumerate() {
        if relic.template.resets_each_combat {
            relic.reset_counter();
        }
        let Some(kind) = relic.template.trigger.event_kind() else {
            continue;
        };
        if let Some(previous) = relic.subscription.take() {
            bus.unsubscribe(previous);
        }
        let id = bus.subscribe(kind, RELIC_PRIORITY, move |event, state| {
            activate(index, event, state);
        });
        relic.subscription = Some(id);
    }
}

pub fn unsubscribe_relics(bus: &mut EventBus<CombatState>, player: &mut Player) {
    for relic in &mut player.relics {
        if let Some(id) = relic.subscription.take() {
            bus.unsubscribe(id);
        }
    }
}
