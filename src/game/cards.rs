use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::effects::Effect;

/// 卡牌实例的全局唯一标识。
pub type CardUid = u32;

static NEXT_CARD_UID: AtomicU32 = AtomicU32::new(1);

fn next_uid() -> CardUid {
    NEXT_CARD_UID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CardType {
    Attack,
    Skill,
    Power,
    Status,
    Curse,
}

impl Default for CardType {
    fn default() -> Self {
        CardType::Skill
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Rarity {
    Starter,
    Common,
    Uncommon,
    Rare,
    Special,
}

impl Default for Rarity {
    fn default() -> Self {
        Rarity::Common
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TargetMode {
    SingleEnemy,
    AllEnemies,
    #[serde(rename = "SELF")]
    SelfTarget,
    RandomEnemy,
    None,
}

impl Default for TargetMode {
    fn default() -> Self {
        TargetMode::None
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardFlags {
    #[serde(default)]
    pub exhaust: bool,
    #[serde(default)]
    pub ethereal: bool,
    #[serde(default)]
    pub innate: bool,
    #[serde(default)]
    pub retain: bool,
    #[serde(default)]
    pub unplayable: bool,
}

/// Replacement values used once a card is upgraded. Absent fields fall back
/// to the base template.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardUpgrade {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<Vec<Effect>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Immutable card definition. Shared between instances through `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardTemplate {
    pub id: String,
    pub name: String,
    pub card_type: CardType,
    pub rarity: Rarity,
    pub target: TargetMode,
    pub cost: i32,
    pub effects: Vec<Effect>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade: Option<CardUpgrade>,
    #[serde(default)]
    pub flags: CardFlags,
}

impl CardTemplate {
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> CardTemplateBuilder {
        CardTemplateBuilder::new(id, name)
    }

    pub fn instantiate(self: &Arc<Self>) -> CardInstance {
        CardInstance::new(Arc::clone(self))
    }
}

#[derive(Debug, Clone)]
pub struct CardTemplateBuilder {
    template: CardTemplate,
}

impl CardTemplateBuilder {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            template: CardTemplate {
                id: id.into(),
                name: name.into(),
                card_type: CardType::default(),
                rarity: Rarity::default(),
                target: TargetMode::default(),
                cost: 0,
                effects: Vec::new(),
                description: String::new(),
                upgrade: None,
                flags: CardFlags::default(),
            },
        }
    }

    pub fn card_type(mut self, card_type: CardType) -> Self {
        self.template.card_type = card_type;
        self
    }

    pub fn rarity(mut self, rarity: Rarity) -> Self {
        self.template.rarity = rarity;
        self
    }

    pub fn target(mut self, target: TargetMode) -> Self {
        self.template.target = target;
        self
    }

    pub fn cost(mut self, cost: i32) -> Self {
        self.template.cost = cost;
        self
    }

    pub fn effect(mut self, effect: Effect) -> Self {
        self.template.effects.push(effect);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.template.description = description.into();
        self
    }

    pub fn upgrade(mut self, upgrade: CardUpgrade) -> Self {
        self.template.upgrade = Some(upgrade);
        self
    }

    pub fn exhaust(mut self) -> Self {
        self.template.flags.exhaust = true;
        self
    }

    pub fn ethereal(mut self) -> Self {
        self.template.flags.ethereal = true;
        self
    }

    pub fn innate(mut self) -> Self {
        self.template.flags.innate = true;
        self
    }

    pub fn retain(mut self) -> Self {
        self.template.flags.retain = true;
        self
    }

    pub fn unplayable(mut self) -> Self {
        self.template.flags.unplayable = true;
        self
    }

    pub fn build(self) -> Arc<CardTemplate> {
        Arc::new(self.template)
    }
}

/// A card owned by a deck or pile. Per-run variation lives here, never on the
/// template.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CardInstance {
    pub uid: CardUid,
    pub template: Arc<CardTemplate>,
    pub upgraded: bool,
    pub cost_modifier: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_this_turn: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_this_combat: Option<i32>,
}

impl CardInstance {
    pub fn new(template: Arc<CardTemplate>) -> Self {
        Self {
            uid: next_uid(),
            template,
            upgraded: false,
            cost_modifier: 0,
            cost_this_turn: None,
            cost_this_combat: None,
        }
    }

    pub fn new_upgraded(template: Arc<CardTemplate>) -> Self {
        let mut card = Self::new(template);
        card.upgrade();
        card
    }

    /// Fresh uid, same template and upgrade state. Temporary cost overrides
    /// are not carried over.
    pub fn copy(&self) -> Self {
        Self {
            uid: next_uid(),
            template: Arc::clone(&self.template),
            upgraded: self.upgraded,
            cost_modifier: self.cost_modifier,
            cost_this_turn: None,
            cost_this_combat: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.template.id
    }

    pub fn flags(&self) -> CardFlags {
        self.template.flags
    }

    pub fn card_type(&self) -> CardType {
        self.template.card_type
    }

    pub fn target_mode(&self) -> TargetMode {
        self.template.target
    }

    pub fn can_upgrade(&self) -> bool {
        !self.upgraded && self.template.upgrade.is_some()
    }

    /// One-way. Returns `false` if already upgraded or the template has no
    /// upgraded variant.
    pub fn upgrade(&mut self) -> bool {
        if !self.can_upgrade() {
            return false;
        }
        self.upgraded = true;
        true
    }

    fn active_upgrade(&self) -> Option<&CardUpgrade> {
        if self.upgraded {
            self.template.upgrade.as_ref()
        } else {
            None
        }
    }

    pub fn base_cost(&self) -> i32 {
        self.active_upgrade()
            .and_then(|upgrade| upgrade.cost)
            .unwrap_or(self.template.cost)
    }

    pub fn cost(&self) -> i32 {
        let cost = match (self.cost_this_turn, self.cost_this_combat) {
            (Some(turn), _) => turn,
            (None, Some(combat)) => combat,
            (None, None) => self.base_cost() + self.cost_modifier,
        };
        cost.max(0)
    }

    pub fn effects(&self) -> &[Effect] {
        self.active_upgrade()
            .and_then(|upgrade| upgrade.effects.as_deref())
            .unwrap_or(self.template.effects.as_slice())
    }

    pub fn description(&self) -> &str {
        self.active_upgrade()
            .and_then(|upgrade| upgrade.description.as_deref())
            .unwrap_or(self.template.description.as_str())
    }

    pub fn display_name(&self) -> String {
        match self.active_upgrade() {
            Some(upgrade) => upgrade
                .name
                .clone()
                .unwrap_or_else(|| format!("{}+", self.template.name)),
            None => self.template.name.clone(),
        }
    }

    pub fn set_cost_this_turn(&mut self, cost: i32) {
        self.cost_this_turn = Some(cost);
    }

    pub fn set_cost_this_combat(&mut self, cost: i32) {
        self.cost_this_combat = Some(cost);
    }

    pub fn clear_turn_modifiers(&mut self) {
        self.cost_this_turn = None;
    }

    pub fn clear_combat_modifiers(&mut self) {
        self.cost_this_turn = None;
        self.cost_this_combat = None;
    }
}

/// Presentation projection of a card in hand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardView {
    pub uid: CardUid,
    pub id: String,
    pub name: String,
    pub card_type: CardType,
    pub target: TargetMode,
    pub cost: i32,
    pub description: String,
    pub upgraded: bool,
    pub playable: bool,
}

impl CardInstance {
    pub fn view(&self, available_energy: i32) -> CardView {
        CardView {
            uid: self.uid,
            id: self.template.id.clone(),
            name: self.display_name(),
            card_type: self.template.card_type,
            target: self.template.target,
            cost: self.cost(),
            description: self.description().to_string(),
            upgraded: self.upgraded,
            playable: !self.template.flags.unplayable && self.cost() <= available_energy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strike() -> Arc<CardTemplate> {
        CardTemplate::builder("strike", "Strike")
            .card_type(CardType::Attack)
            .rarity(Rarity::Starter)
            .target(TargetMode::SingleEnemy)
            .cost(1)
            .effect(Effect::damage(6))
            .description("Deal 6 damage.")
            .upgrade(CardUpgrade {
                effects: Some(vec![Effect::damage(9)]),
                description: Some("Deal 9 damage.".into()),
                ..CardUpgrade::default()
            })
            .build()
    }

    #[test]
    fn effective_cost_prefers_turn_then_combat_override() {
        let mut card = strike().instantiate();
        assert_eq!(card.cost(), 1);

        card.cost_modifier = 1;
        assert_eq!(card.cost(), 2);

        card.set_cost_this_combat(0);
        assert_eq!(card.cost(), 0);

        card.set_cost_this_turn(3);
        assert_eq!(card.cost(), 3);

        card.clear_turn_modifiers();
        assert_eq!(card.cost(), 0, "combat override survives turn cleanup");

        card.clear_combat_modifiers();
        card.cost_modifier = -5;
        assert_eq!(card.cost(), 0, "cost is floored at zero");
    }

    #[test]
    fn upgrade_is_one_way_and_resolves_effects() {
        let template = strike();
        let mut card = template.instantiate();
        assert_eq!(card.effects(), &[Effect::damage(6)]);
        assert_eq!(card.display_name(), "Strike");

        assert!(card.upgrade());
        assert!(!card.upgrade(), "second upgrade is rejected");
        assert_eq!(card.effects(), &[Effect::damage(9)]);
        assert_eq!(card.description(), "Deal 9 damage.");
        assert_eq!(card.display_name(), "Strike+");
        assert_eq!(card.base_cost(), 1, "upgrade without cost keeps base cost");
        assert_eq!(template.effects, vec![Effect::damage(6)]);
    }

    #[test]
    fn copy_shares_template_with_fresh_uid() {
        let mut card = CardInstance::new_upgraded(strike());
        card.set_cost_this_turn(0);

        let copy = card.copy();

        assert_ne!(copy.uid, card.uid);
        assert!(Arc::ptr_eq(&copy.template, &card.template));
        assert!(copy.upgraded);
        assert_eq!(copy.cost_this_turn, None);
    }
}
