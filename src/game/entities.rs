use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::cards::{CardInstance, CardUid};
use super::relics::RelicInstance;
use super::status::{StatusGrant, StatusKind, StatusMap};
use crate::ai::{self, Difficulty, EnemyAi};

/// Who an effect or event refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", content = "index")]
pub enum CombatantId {
    Player,
    Enemy(usize),
}

impl CombatantId {
    pub fn is_player(self) -> bool {
        matches!(self, CombatantId::Player)
    }

    /// Whether `other` stands on the opposite side of the fight.
    pub fn is_hostile_to(self, other: CombatantId) -> bool {
        self.is_player() != other.is_player()
    }
}

/// HP and block. `current_hp` stays in `[0, max_hp]`, `block` is never
/// negative.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vitals {
    pub max_hp: i32,
    pub current_hp: i32,
    pub block: i32,
}

impl Vitals {
    pub fn new(max_hp: i32) -> Self {
        let max_hp = max_hp.max(1);
        Self {
            max_hp,
            current_hp: max_hp,
            block: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DamageOutcome {
    pub blocked: i32,
    pub hp_lost: i32,
}

/// Shared capability of everything that fights.
pub trait Combatant {
    fn vitals(&self) -> &Vitals;
    fn vitals_mut(&mut self) -> &mut Vitals;
    fn statuses(&self) -> &StatusMap;
    fn statuses_mut(&mut self) -> &mut StatusMap;

    fn current_hp(&self) -> i32 {
        self.vitals().current_hp
    }

    fn max_hp(&self) -> i32 {
        self.vitals().max_hp
    }

    fn block(&self) -> i32 {
        self.vitals().block
    }

    fn is_alive(&self) -> bool {
        self.vitals().current_hp > 0
    }

    /// Block absorbs first, the remainder comes off HP. Intangible caps every
    /// hit at 1.
    fn take_damage(&mut self, amount: i32) -> DamageOutcome {
        if amount <= 0 {
            return DamageOutcome::default();
        }
        let amount = if self.statuses().has(StatusKind::Intangible) {
            amount.min(1)
        } else {
            amount
        };
        let vitals = self.vitals_mut();
        let blocked = vitals.block.min(amount);
        vitals.block -= blocked;
        let hp_lost = (amount - blocked).min(vitals.current_hp);
        vitals.current_hp -= hp_lost;
        DamageOutcome { blocked, hp_lost }
    }

    /// Ignores block.
    fn lose_hp(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let vitals = self.vitals_mut();
        let lost = amount.min(vitals.current_hp);
        vitals.current_hp -= lost;
        lost
    }

    fn heal(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let vitals = self.vitals_mut();
        let healed = amount.min(vitals.max_hp - vitals.current_hp).max(0);
        vitals.current_hp += healed;
        healed
    }

    fn gain_block(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        self.vitals_mut().block += amount;
        amount
    }

    /// Returns the block that was removed.
    fn reset_block(&mut self) -> i32 {
        std::mem::take(&mut self.vitals_mut().block)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub name: String,
    pub vitals: Vitals,
    pub gold: i32,
    pub max_energy: i32,
    pub master_deck: Vec<CardInstance>,
    pub relics: Vec<RelicInstance>,
    pub statuses: StatusMap,
    pub cards_played_this_turn: u32,
    pub cards_played_this_combat: u32,
    pub damage_dealt_this_combat: i32,
    pub damage_taken_this_combat: i32,
}

impl Player {
    pub const DEFAULT_MAX_ENERGY: i32 = 3;
    pub const DEFAULT_GOLD: i32 = 99;

    pub fn new(name: impl Into<String>, max_hp: i32) -> Self {
        Self {
            name: name.into(),
            vitals: Vitals::new(max_hp),
            gold: Self::DEFAULT_GOLD,
            max_energy: Self::DEFAULT_MAX_ENERGY,
            master_deck: Vec::new(),
            relics: Vec::new(),
            statuses: StatusMap::new(),
            cards_played_this_turn: 0,
            cards_played_this_combat: 0,
            damage_dealt_this_combat: 0,
            damage_taken_this_combat: 0,
        }
    }

    pub fn with_deck(mut self, deck: Vec<CardInstance>) -> Self {
        self.master_deck = deck;
        self
    }

    pub fn with_relic(mut self, relic: RelicInstance) -> Self {
        self.relics.push(relic);
        self
    }

    pub fn start_combat(&mut self) {
        self.vitals.block = 0;
        self.statuses.clear();
        self.cards_played_this_turn = 0;
        self.cards_played_this_combat = 0;
        self.damage_dealt_this_combat = 0;
        self.damage_taken_this_combat = 0;
    }

    pub fn end_combat(&mut self) {
        self.vitals.block = 0;
        self.statuses.clear();
    }

    pub fn start_turn(&mut self) {
        self.cards_played_this_turn = 0;
    }

    pub fn record_card_played(&mut self) {
        self.cards_played_this_turn += 1;
        self.cards_played_this_combat += 1;
    }

    pub fn gain_gold(&mut self, amount: i32) -> i32 {
        self.gold += amount.max(0);
        self.gold
    }

    pub fn spend_gold(&mut self, amount: i32) -> bool {
        if amount < 0 || amount > self.gold {
            return false;
        }
        self.gold -= amount;
        true
    }

    /// Raises both max and current HP.
    pub fn increase_max_hp(&mut self, amount: i32) {
        if amount <= 0 {
            return;
        }
        self.vitals.max_hp += amount;
        self.vitals.current_hp += amount;
    }

    pub fn decrease_max_hp(&mut self, amount: i32) {
        if amount <= 0 {
            return;
        }
        self.vitals.max_hp = (self.vitals.max_hp - amount).max(1);
        self.vitals.current_hp = self.vitals.current_hp.min(self.vitals.max_hp);
    }

    /// Heals 30% of max HP and charges relics that pay out after resting.
    pub fn rest(&mut self) -> i32 {
        let healed = self.heal(self.vitals.max_hp * 3 / 10);
        for relic in &mut self.relics {
            relic.on_rest();
        }
        healed
    }

    pub fn add_card(&mut self, card: CardInstance) {
        self.master_deck.push(card);
    }

    pub fn remove_card(&mut self, uid: CardUid) -> Option<CardInstance> {
        let index = self.master_deck.iter().position(|card| card.uid == uid)?;
        Some(self.master_deck.remove(index))
    }

    pub fn add_relic(&mut self, relic: RelicInstance) {
        self.relics.push(relic);
    }

    pub fn has_relic(&self, relic_id: &str) -> bool {
        self.relic(relic_id).is_some()
    }

    pub fn relic(&self, relic_id: &str) -> Option<&RelicInstance> {
        self.relics.iter().find(|relic| relic.id() == relic_id)
    }

    pub fn relic_mut(&mut self, relic_id: &str) -> Option<&mut RelicInstance> {
        self.relics.iter_mut().find(|relic| relic.id() == relic_id)
    }
}

impl Combatant for Player {
    fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    fn vitals_mut(&mut self) -> &mut Vitals {
        &mut self.vitals
    }

    fn statuses(&self) -> &StatusMap {
        &self.statuses
    }

    fn statuses_mut(&mut self) -> &mut StatusMap {
        &mut self.statuses
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentKind {
    Attack,
    Defend,
    Buff,
    Debuff,
    AttackDefend,
    AttackBuff,
    AttackDebuff,
    Unknown,
    Sleeping,
}

impl IntentKind {
    pub fn label(self) -> &'static str {
        match self {
            IntentKind::Attack => "Attack",
            IntentKind::Defend => "Defend",
            IntentKind::Buff => "Buff",
            IntentKind::Debuff => "Debuff",
            IntentKind::AttackDefend => "Attack Defend",
            IntentKind::AttackBuff => "Attack Buff",
            IntentKind::AttackDebuff => "Attack Debuff",
            IntentKind::Unknown => "Unknown",
            IntentKind::Sleeping => "Sleeping",
        }
    }
}

/// An enemy's declared next action. Display-only until executed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Intent {
    pub kind: IntentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<i32>,
    #[serde(default = "default_times")]
    pub times: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buff: Option<StatusGrant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debuff: Option<StatusGrant>,
}

fn default_times() -> u32 {
    1
}

impl Default for Intent {
    fn default() -> Self {
        Self::of(IntentKind::Unknown)
    }
}

impl Intent {
    pub fn of(kind: IntentKind) -> Self {
        Self {
            kind,
            damage: None,
            times: 1,
            block: None,
            buff: None,
            debuff: None,
        }
    }

    pub fn attack(damage: i32) -> Self {
        Self::of(IntentKind::Attack).with_damage(damage)
    }

    pub fn multi_attack(damage: i32, times: u32) -> Self {
        let mut intent = Self::attack(damage);
        intent.times = times.max(1);
        intent
    }

    pub fn defend(block: i32) -> Self {
        Self::of(IntentKind::Defend).with_block(block)
    }

    pub fn buff(kind: StatusKind, amount: i32) -> Self {
        Self::of(IntentKind::Buff).with_buff(kind, amount)
    }

    pub fn debuff(kind: StatusKind, amount: i32) -> Self {
        Self::of(IntentKind::Debuff).with_debuff(kind, amount)
    }

    pub fn sleeping() -> Self {
        Self::of(IntentKind::Sleeping)
    }

    pub fn with_damage(mut self, damage: i32) -> Self {
        self.damage = Some(damage);
        self
    }

    pub fn with_block(mut self, block: i32) -> Self {
        self.block = Some(block);
        self
    }

    pub fn with_buff(mut self, kind: StatusKind, amount: i32) -> Self {
        self.buff = Some(StatusGrant { kind, amount });
        self
    }

    pub fn with_debuff(mut self, kind: StatusKind, amount: i32) -> Self {
        self.debuff = Some(StatusGrant { kind, amount });
        self
    }

    /// "11", "5x3", "7 | Block 5", or the kind label when there is no payload.
    pub fn display(&self) -> String {
        let mut parts = Vec::new();
        if let Some(damage) = self.damage {
            if self.times > 1 {
                parts.push(format!("{}x{}", damage, self.times));
            } else {
                parts.push(damage.to_string());
            }
        }
        if let Some(block) = self.block {
            parts.push(format!("Block {}", block));
        }
        if parts.is_empty() {
            self.kind.label().to_string()
        } else {
            parts.join(" | ")
        }
    }
}

/// Immutable enemy definition; HP is rolled within the range on spawn.
#[derive(Debug, Clone)]
pub struct EnemyTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub min_hp: i32,
    pub max_hp: i32,
    pub ai: EnemyAi,
}

#[derive(Debug, Clone, Serialize)]
pub struct Enemy {
    pub id: String,
    pub name: String,
    pub vitals: Vitals,
    pub statuses: StatusMap,
    pub intent: Intent,
    pub turn_count: u32,
    pub move_history: Vec<IntentKind>,
    #[serde(skip)]
    pub ai: EnemyAi,
    #[serde(skip)]
    pub(crate) death_announced: bool,
}

impl Enemy {
    pub fn new(id: impl Into<String>, name: impl Into<String>, max_hp: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            vitals: Vitals::new(max_hp),
            statuses: StatusMap::new(),
            intent: Intent::default(),
            turn_count: 0,
            move_history: Vec::new(),
            ai: ai::alternate_attack_defend,
            death_announced: false,
        }
    }

    pub fn with_ai(mut self, ai: EnemyAi) -> Self {
        self.ai = ai;
        self
    }

    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.intent = intent;
        self
    }

    pub fn spawn(template: &EnemyTemplate, difficulty: Difficulty, rng: &mut SmallRng) -> Self {
        let (low, high) = if template.min_hp <= template.max_hp {
            (template.min_hp, template.max_hp)
        } else {
            (template.max_hp, template.min_hp)
        };
        let hp = difficulty.scale_enemy_hp(rng.gen_range(low..=high));
        Self::new(template.id, template.name, hp).with_ai(template.ai)
    }

    /// Per-hit damage of the current intent against a target with `target`
    /// statuses: strength, then own Weak, then target Vulnerable.
    pub fn intent_damage(&self, target: &StatusMap) -> Option<i32> {
        let base = self.intent.damage?;
        let mut damage = base + self.statuses.get(StatusKind::Strength);
        if self.statuses.has(StatusKind::Weak) {
            damage = damage * 3 / 4;
        }
        if target.has(StatusKind::Vulnerable) {
            damage = damage * 3 / 2;
        }
        Some(damage.max(0))
    }

    pub fn start_turn(&mut self) -> i32 {
        self.reset_block()
    }

    pub fn record_move(&mut self) {
        self.move_history.push(self.intent.kind);
        self.turn_count += 1;
    }

    /// Ticks Vulnerable and Weak, converts Ritual into Strength, then
    /// resolves Poison ignoring block.
    pub fn end_turn(&mut self) -> EnemyTurnEnd {
        let mut report = EnemyTurnEnd::default();
        for kind in [StatusKind::Vulnerable, StatusKind::Weak] {
            if self.statuses.decrement(kind) {
                report.expired.push(kind);
            }
        }

        let ritual = self.statuses.get(StatusKind::Ritual);
        if ritual > 0 {
            self.statuses.add(StatusKind::Strength, ritual);
            report.strength_gained = ritual;
        }

        let poison = self.statuses.get(StatusKind::Poison);
        if poison > 0 {
            report.poison_damage = self.lose_hp(poison);
            if self.statuses.decrement(StatusKind::Poison) {
                report.expired.push(StatusKind::Poison);
            }
        }
        report
    }

    pub fn hp_fraction(&self) -> f64 {
        f64::from(self.vitals.current_hp) / f64::from(self.vitals.max_hp.max(1))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnemyTurnEnd {
    pub expired: Vec<StatusKind>,
    pub strength_gained: i32,
    pub poison_damage: i32,
}

impl Combatant for Enemy {
    fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    fn vitals_mut(&mut self) -> &mut Vitals {
        &mut self.vitals
    }

    fn statuses(&self) -> &StatusMap {
        &self.statuses
    }

    fn statuses_mut(&mut self) -> &mut StatusMap {
        &mut self.statuses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn damage_is_absorbed_by_block_before_hp() {
        let mut enemy = Enemy::new("dummy", "Dummy", 40);
        enemy.gain_block(5);

        let outcome = enemy.take_damage(8);

        assert_eq!(outcome, DamageOutcome { blocked: 5, hp_lost: 3 });
        assert_eq!(enemy.block(), 0);
        assert_eq!(enemy.current_hp(), 37);
    }

    #[test]
    fn hp_and_block_stay_in_bounds() {
        let mut player = Player::new("Tester", 20);
        let outcome = player.take_damage(100);
        assert_eq!(outcome.hp_lost, 20);
        assert_eq!(player.current_hp(), 0);
        assert!(!player.is_alive());

        assert_eq!(player.heal(500), 20);
        assert_eq!(player.current_hp(), 20);
        assert_eq!(player.gain_block(-3), 0);
        assert_eq!(player.block(), 0);
        assert_eq!(player.take_damage(-4), DamageOutcome::default());
    }

    #[test]
    fn intangible_caps_each_hit() {
        let mut enemy = Enemy::new("dummy", "Dummy", 40);
        enemy.statuses.set(StatusKind::Intangible, 1);
        assert_eq!(enemy.take_damage(30).hp_lost, 1);
    }

    #[test]
    fn poison_pierces_block_and_ticks_down() {
        let mut enemy = Enemy::new("dummy", "Dummy", 40);
        enemy.gain_block(10);
        enemy.statuses.set(StatusKind::Poison, 4);
        enemy.statuses.set(StatusKind::Weak, 1);

        let report = enemy.end_turn();

        assert_eq!(report.poison_damage, 4);
        assert_eq!(enemy.current_hp(), 36);
        assert_eq!(enemy.block(), 10);
        assert_eq!(enemy.statuses.get(StatusKind::Poison), 3);
        assert_eq!(report.expired, vec![StatusKind::Weak]);
    }

    #[test]
    fn intent_damage_applies_strength_weak_then_vulnerable() {
        let mut enemy = Enemy::new("dummy", "Dummy", 40).with_intent(Intent::attack(6));
        enemy.statuses.set(StatusKind::Strength, 3);
        enemy.statuses.set(StatusKind::Weak, 1);
        let mut target = StatusMap::new();
        target.set(StatusKind::Vulnerable, 1);

        assert_eq!(enemy.intent_damage(&target), Some(9));
        assert_eq!(enemy.intent_damage(&StatusMap::new()), Some(6));
    }

    #[test]
    fn spawn_rolls_hp_in_range_and_scales_with_ascension() {
        let template = EnemyTemplate {
            id: "slime",
            name: "Slime",
            min_hp: 100,
            max_hp: 100,
            ai: ai::alternate_attack_defend,
        };
        let mut rng = SmallRng::seed_from_u64(7);

        let base = Enemy::spawn(&template, Difficulty::default(), &mut rng);
        let scaled = Enemy::spawn(&template, Difficulty::ascension(7), &mut rng);

        assert_eq!(base.max_hp(), 100);
        assert_eq!(scaled.max_hp(), 110);
        assert_eq!(scaled.current_hp(), 110);
    }

    #[test]
    fn intent_display_matches_payload() {
        assert_eq!(Intent::attack(11).display(), "11");
        assert_eq!(Intent::multi_attack(5, 3).display(), "5x3");
        assert_eq!(Intent::attack(7).with_block(5).display(), "7 | Block 5");
        assert_eq!(Intent::sleeping().display(), "Sleeping");
        assert_eq!(Intent::of(IntentKind::AttackDebuff).display(), "Attack Debuff");
    }

    #[test]
    fn gold_and_max_hp_operations() {
        let mut player = Player::new("Tester", 50);
        assert!(!player.spend_gold(100));
        assert!(player.spend_gold(99));
        assert_eq!(player.gain_gold(25), 25);

        player.vitals.current_hp = 40;
        player.increase_max_hp(5);
        assert_eq!((player.current_hp(), player.max_hp()), (45, 55));
        player.decrease_max_hp(20);
        assert_eq!((player.current_hp(), player.max_hp()), (35, 35));
        assert_eq!(player.rest(), 0, "resting at full HP heals nothing");
    }
}
