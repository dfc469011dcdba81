use rand::rngs::SmallRng;
use rand::seq::IteratorRandom;
use serde::{Deserialize, Serialize};

use super::cards::{CardUid, CardView};
use super::config::CombatConfig;
use super::effects::{attack_damage, Targets};
use super::energy::EnergyState;
use super::entities::{Combatant, CombatantId, DamageOutcome, Enemy, Intent, Player};
use super::events::{CombatEvent, EventQueue};
use super::piles::{DeckPiles, PileCounts};
use super::status::{apply_status, StatusKind, StatusMap, StatusOutcome};

/// Card-flow randomness is drawn from stream 0 of the configured seed.
pub(crate) const CARD_RNG_STREAM: u64 = 0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CombatPhase {
    NotStarted,
    PlayerTurn,
    EnemyTurn,
    CombatEnd,
}

impl Default for CombatPhase {
    fn default() -> Self {
        CombatPhase::NotStarted
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CombatResult {
    InProgress,
    Victory,
    Defeat,
}

impl Default for CombatResult {
    fn default() -> Self {
        CombatResult::InProgress
    }
}

/// Aggregate root of one encounter.
#[derive(Debug, Clone, Serialize)]
pub struct CombatState {
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub piles: DeckPiles,
    pub energy: EnergyState,
    pub turn: u32,
    pub phase: CombatPhase,
    pub result: CombatResult,
    pub events: EventQueue,
    #[serde(skip)]
    pub rng: SmallRng,
}

impl CombatState {
    pub fn new(player: Player, enemies: Vec<Enemy>, config: &CombatConfig) -> Self {
        let energy = EnergyState::new(player.max_energy);
        Self {
            player,
            enemies,
            piles: DeckPiles::new(config.max_hand_size),
            energy,
            turn: 0,
            phase: CombatPhase::NotStarted,
            result: CombatResult::InProgress,
            events: EventQueue::new(),
            rng: config.rng(CARD_RNG_STREAM),
        }
    }

    pub fn record_event(&mut self, event: CombatEvent) {
        self.events.push(event);
    }

    pub fn is_over(&self) -> bool {
        self.result != CombatResult::InProgress
    }

    pub fn living_enemies(&self) -> impl Iterator<Item = (usize, &Enemy)> + '_ {
        self.enemies
            .iter()
            .enumerate()
            .filter(|(_, enemy)| enemy.is_alive())
    }

    pub fn living_enemy_ids(&self) -> Vec<CombatantId> {
        self.living_enemies()
            .map(|(index, _)| CombatantId::Enemy(index))
            .collect()
    }

    pub fn all_enemies_dead(&self) -> bool {
        self.living_enemies().next().is_none()
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&dyn Combatant> {
        match id {
            CombatantId::Player => Some(&self.player as &dyn Combatant),
            CombatantId::Enemy(index) => self.enemies.get(index).map(|e| e as &dyn Combatant),
        }
    }

    pub fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut dyn Combatant> {
        match id {
            CombatantId::Player => Some(&mut self.player as &mut dyn Combatant),
            CombatantId::Enemy(index) => self
                .enemies
                .get_mut(index)
                .map(|e| e as &mut dyn Combatant),
        }
    }

    pub fn is_alive(&self, id: CombatantId) -> bool {
        self.combatant(id).map_or(false, |c| c.is_alive())
    }

    pub fn statuses(&self, id: CombatantId) -> Option<&StatusMap> {
        self.combatant(id).map(|c| c.statuses())
    }

    pub fn random_living_enemy(&mut self) -> Option<CombatantId> {
        let (index, _) = self
            .enemies
            .iter()
            .enumerate()
            .filter(|(_, enemy)| enemy.is_alive())
            .choose(&mut self.rng)?;
        Some(CombatantId::Enemy(index))
    }

    /// Living members of `targets`. A random target is rolled here.
    pub fn resolve_targets(&mut self, targets: &Targets) -> Vec<CombatantId> {
        match targets {
            Targets::None => Vec::new(),
            Targets::Single(id) => [*id].into_iter().filter(|id| self.is_alive(*id)).collect(),
            Targets::Many(ids) => ids.iter().copied().filter(|id| self.is_alive(*id)).collect(),
            Targets::RandomEnemy => self.random_living_enemy().into_iter().collect(),
        }
    }

    pub fn resolve_hostile_targets(
        &mut self,
        source: CombatantId,
        targets: &Targets,
    ) -> Vec<CombatantId> {
        self.resolve_targets(targets)
            .into_iter()
            .filter(|target| source.is_hostile_to(*target))
            .collect()
    }

    /// Allies among `targets`, or the source itself when none qualify.
    pub fn resolve_friendly_targets(
        &mut self,
        source: CombatantId,
        targets: &Targets,
    ) -> Vec<CombatantId> {
        let friendly: Vec<CombatantId> = self
            .resolve_targets(targets)
            .into_iter()
            .filter(|target| !source.is_hostile_to(*target))
            .collect();
        if friendly.is_empty() {
            vec![source]
        } else {
            friendly
        }
    }

    /// `None` when either side is missing or the target is already dead.
    pub fn modified_attack_damage(
        &self,
        source: CombatantId,
        target: CombatantId,
        base: i32,
    ) -> Option<i32> {
        let attacker = self.combatant(source)?;
        let defender = self.combatant(target)?;
        if !defender.is_alive() {
            return None;
        }
        Some(attack_damage(base, attacker.statuses(), defender.statuses()))
    }

    /// Deals already-modified damage and records the outcome. Thorns on the
    /// target strike back at the attacker.
    pub fn attack(&mut self, source: CombatantId, target: CombatantId, amount: i32) -> DamageOutcome {
        let outcome = self.deal_damage(source, target, amount);
        let thorns = self
            .statuses(target)
            .map_or(0, |statuses| statuses.get(StatusKind::Thorns));
        if thorns > 0 && source != target && self.is_alive(source) {
            self.deal_damage(target, source, thorns);
        }
        outcome
    }

    pub fn deal_damage(
        &mut self,
        source: CombatantId,
        target: CombatantId,
        amount: i32,
    ) -> DamageOutcome {
        let Some(defender) = self.combatant_mut(target) else {
            return DamageOutcome::default();
        };
        let outcome = defender.take_damage(amount);
        self.record_event(CombatEvent::DamageDealt {
            source,
            target,
            amount,
        });
        if outcome.blocked > 0 {
            self.record_event(CombatEvent::BlockLost {
                target,
                amount: outcome.blocked,
            });
        }
        self.record_hp_loss(target, outcome.hp_lost);
        if source.is_player() {
            self.player.damage_dealt_this_combat += outcome.hp_lost;
        }
        outcome
    }

    /// HP loss that ignores block, such as poison.
    pub fn lose_hp(&mut self, target: CombatantId, amount: i32) -> i32 {
        let lost = self
            .combatant_mut(target)
            .map_or(0, |combatant| combatant.lose_hp(amount));
        self.record_hp_loss(target, lost);
        lost
    }

    pub(crate) fn record_hp_loss(&mut self, target: CombatantId, amount: i32) {
        if amount <= 0 {
            return;
        }
        self.record_event(CombatEvent::DamageTaken { target, amount });
        self.record_event(CombatEvent::HpLost { target, amount });
        if target.is_player() {
            self.player.damage_taken_this_combat += amount;
        }
    }

    pub fn gain_block(&mut self, target: CombatantId, amount: i32) -> i32 {
        let gained = self
            .combatant_mut(target)
            .map_or(0, |combatant| combatant.gain_block(amount));
        if gained > 0 {
            self.record_event(CombatEvent::BlockGained {
                target,
                amount: gained,
            });
        }
        gained
    }

    pub fn heal(&mut self, target: CombatantId, amount: i32) -> i32 {
        let healed = self
            .combatant_mut(target)
            .map_or(0, |combatant| combatant.heal(amount));
        if healed > 0 {
            self.record_event(CombatEvent::HpGained {
                target,
                amount: healed,
            });
        }
        healed
    }

    /// Same Artifact rule as cards; relics call this directly too.
    pub fn apply_status(
        &mut self,
        target: CombatantId,
        status: StatusKind,
        amount: i32,
    ) -> Option<StatusOutcome> {
        let combatant = self.combatant_mut(target)?;
        let outcome = apply_status(combatant.statuses_mut(), status, amount);
        if outcome.applied() {
            self.record_event(CombatEvent::StatusApplied {
                target,
                status,
                amount,
            });
        }
        Some(outcome)
    }

    pub fn draw_cards(&mut self, count: usize) -> Vec<CardUid> {
        self.piles.draw(count, &mut self.rng, &mut self.events)
    }

    pub fn gain_energy(&mut self, amount: i32) {
        self.energy.gain(amount);
        self.record_event(CombatEvent::EnergyGained { amount });
    }

    pub fn view(&self) -> CombatView {
        let player = PlayerView {
            name: self.player.name.clone(),
            hp: self.player.current_hp(),
            max_hp: self.player.max_hp(),
            block: self.player.block(),
            energy: self.energy.current,
            max_energy: self.energy.max,
            statuses: self.player.statuses.clone(),
            gold: self.player.gold,
        };
        let hand = self
            .piles
            .hand
            .iter()
            .map(|card| card.view(self.energy.current))
            .collect();
        let enemies = self
            .living_enemies()
            .map(|(index, enemy)| EnemyView {
                index,
                id: enemy.id.clone(),
                name: enemy.name.clone(),
                hp: enemy.current_hp(),
                max_hp: enemy.max_hp(),
                block: enemy.block(),
                statuses: enemy.statuses.clone(),
                intent: enemy.intent.clone(),
                intent_display: enemy.intent.display(),
                intent_damage: enemy.intent_damage(&self.player.statuses),
            })
            .collect();
        CombatView {
            turn: self.turn,
            phase: self.phase,
            result: self.result,
            player,
            hand,
            piles: self.piles.counts(),
            enemies,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerView {
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub block: i32,
    pub energy: i32,
    pub max_energy: i32,
    pub statuses: StatusMap,
    pub gold: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnemyView {
    pub index: usize,
    pub id: String,
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub block: i32,
    pub statuses: StatusMap,
    pub intent: Intent,
    pub intent_display: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_damage: Option<i32>,
}

/// The public projection the presentation layer renders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CombatView {
    pub turn: u32,
    pub phase: CombatPhase,
    pub result: CombatResult,
    pub player: PlayerView,
    pub hand: Vec<CardView>,
    pub piles: PileCounts,
    pub enemies: Vec<EnemyView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::EventKind;

    fn state() -> CombatState {
        CombatState::new(
            Player::new("Tester", 50),
            vec![Enemy::new("a", "A", 20), Enemy::new("b", "B", 20)],
            &CombatConfig::seeded(5),
        )
    }

    #[test]
    fn random_target_only_picks_living_enemies() {
        let mut state = state();
        state.enemies[0].vitals.current_hp = 0;
        for _ in 0..20 {
            assert_eq!(state.random_living_enemy(), Some(CombatantId::Enemy(1)));
        }
        state.enemies[1].vitals.current_hp = 0;
        assert_eq!(state.random_living_enemy(), None);
    }

    #[test]
    fn friendly_resolution_falls_back_to_source() {
        let mut state = state();
        let hostile = Targets::Single(CombatantId::Enemy(0));
        assert_eq!(
            state.resolve_friendly_targets(CombatantId::Player, &hostile),
            vec![CombatantId::Player]
        );
        assert_eq!(
            state.resolve_hostile_targets(CombatantId::Player, &Targets::Single(CombatantId::Player)),
            Vec::<CombatantId>::new()
        );
    }

    #[test]
    fn thorns_strike_back_at_the_attacker() {
        let mut state = state();
        state.player.statuses.set(StatusKind::Thorns, 3);

        state.attack(CombatantId::Enemy(0), CombatantId::Player, 5);

        assert_eq!(state.player.current_hp(), 45);
        assert_eq!(state.enemies[0].current_hp(), 17);
        assert_eq!(state.player.damage_taken_this_combat, 5);
    }

    #[test]
    fn damage_records_block_and_hp_events() {
        let mut state = state();
        state.enemies[1].gain_block(2);

        state.deal_damage(CombatantId::Player, CombatantId::Enemy(1), 6);

        assert_eq!(state.events.count(EventKind::DamageDealt), 1);
        assert_eq!(state.events.count(EventKind::BlockLost), 1);
        assert_eq!(state.events.count(EventKind::HpLost), 1);
        assert_eq!(state.player.damage_dealt_this_combat, 4);
    }

    #[test]
    fn view_lists_only_living_enemies() {
        let mut state = state();
        state.enemies[0].vitals.current_hp = 0;
        state.enemies[1].intent = Intent::attack(7);

        let view = state.view();

        assert_eq!(view.enemies.len(), 1);
        assert_eq!(view.enemies[0].index, 1);
        assert_eq!(view.enemies[0].intent_display, "7");
        assert_eq!(view.enemies[0].intent_damage, Some(7));
        assert_eq!(view.phase, CombatPhase::NotStarted);
    }
}
