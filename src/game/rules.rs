use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::cards::{CardUid, TargetMode};
use super::config::CombatConfig;
use super::effects::{EffectContext, EffectResolution, Targets};
use super::entities::{Combatant, CombatantId, Enemy, Intent, Player};
use super::events::{CombatEvent, EventBus};
use super::piles::PileKind;
use super::relics::{subscribe_relics, unsubscribe_relics};
use super::state::{CombatPhase, CombatResult, CombatState, CombatView};
use super::status::{
    process_end_of_turn, EndOfTurnReport, StatusKind, StatusOutcome, PLAYER_DURATION_STATUSES,
};

/// Enemy AI rolls come from their own stream so card shuffles stay stable
/// when intents change.
pub(crate) const AI_RNG_STREAM: u64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum CombatError {
    #[error("no combat is active")]
    NoActiveCombat,
    #[error("actions are not allowed during {phase:?}")]
    NotPlayerTurn { phase: CombatPhase },
    #[error("card {card} is not in hand")]
    CardNotInHand { card: CardUid },
    #[error("card {card} cannot be played")]
    Unplayable { card: CardUid },
    #[error("not enough energy: need {required}, have {available}")]
    InsufficientEnergy { required: i32, available: i32 },
    #[error("this card needs an enemy target")]
    MissingTarget,
    #[error("enemy {target} is not a valid target")]
    InvalidTarget { target: usize },
    #[error("combat is already over")]
    CombatOver,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayOutcome {
    pub card: CardUid,
    pub card_id: String,
    pub energy_spent: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<usize>,
    pub resolution: EffectResolution,
    pub destination: PileKind,
    /// Enemies this play finished off.
    pub killed: Vec<usize>,
    pub result: CombatResult,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnemyAction {
    pub enemy: usize,
    pub intent: Intent,
    pub damage_dealt: i32,
    pub damage_blocked: i32,
    pub block_gained: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debuff: Option<StatusOutcome>,
    pub poison_damage: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnOutcome {
    pub discarded: Vec<CardUid>,
    pub end_of_turn: EndOfTurnReport,
    pub unspent_energy: i32,
    pub enemy_actions: Vec<EnemyAction>,
    pub result: CombatResult,
}

/// Drives one encounter at a time: validates player actions, resolves enemy
/// turns and dispatches the queued events to subscribers after every step.
pub struct CombatManager {
    config: CombatConfig,
    bus: EventBus<CombatState>,
    state: Option<CombatState>,
    ai_rng: SmallRng,
}

impl Default for CombatManager {
    fn default() -> Self {
        Self::new(CombatConfig::default())
    }
}

impl std::fmt::Debug for CombatManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombatManager")
            .field("config", &self.config)
            .field("subscribers", &self.bus.len())
            .field("active", &self.is_active())
            .finish()
    }
}

impl CombatManager {
    pub fn new(config: CombatConfig) -> Self {
        let ai_rng = config.rng(AI_RNG_STREAM);
        Self {
            config,
            bus: EventBus::new(),
            state: None,
            ai_rng,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(CombatConfig::seeded(seed))
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn bus(&self) -> &EventBus<CombatState> {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut EventBus<CombatState> {
        &mut self.bus
    }

    pub fn state(&self) -> Option<&CombatState> {
        self.state.as_ref()
    }

    pub fn state_mut(&mut self) -> Option<&mut CombatState> {
        self.state.as_mut()
    }

    /// True while a combat is loaded, finished or not.
    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn view(&self) -> Option<CombatView> {
        self.state.as_ref().map(CombatState::view)
    }

    /// Sets up a fresh encounter and runs the first player turn start.
    /// A combat still loaded is discarded first.
    pub fn start_combat(&mut self, mut player: Player, enemies: Vec<Enemy>) -> CombatView {
        if let Some(mut previous) = self.state.take() {
            warn!(turn = previous.turn, "replacing an unfinished combat");
            unsubscribe_relics(&mut self.bus, &mut previous.player);
        }

        player.start_combat();
        let mut state = CombatState::new(player, enemies, &self.config);
        state.energy.initialize(state.player.max_energy);
        state
            .piles
            .initialize_from_deck(&state.player.master_deck, &mut state.rng, &mut state.events);
        subscribe_relics(&mut self.bus, &mut state.player);

        let enemy_count = state.enemies.len();
        info!(
            player = %state.player.name,
            enemies = enemy_count,
            deck = state.player.master_deck.len(),
            "combat started"
        );
        state.record_event(CombatEvent::CombatStart { enemy_count });

        let mut resolver = Resolver {
            bus: &mut self.bus,
            state: &mut state,
            config: &self.config,
            ai_rng: &mut self.ai_rng,
        };
        resolver.choose_intents();
        resolver.start_player_turn();
        resolver.settle();

        let view = state.view();
        self.state = Some(state);
        view
    }

    fn ensure_player_turn(state: &CombatState) -> Result<(), CombatError> {
        if state.is_over() || state.phase == CombatPhase::CombatEnd {
            return Err(CombatError::CombatOver);
        }
        if state.phase != CombatPhase::PlayerTurn {
            return Err(CombatError::NotPlayerTurn { phase: state.phase });
        }
        Ok(())
    }

    fn ensure_target(state: &CombatState, target: Option<usize>) -> Result<usize, CombatError> {
        let target = target.ok_or(CombatError::MissingTarget)?;
        match state.enemies.get(target) {
            Some(enemy) if enemy.is_alive() => Ok(target),
            _ => Err(CombatError::InvalidTarget { target }),
        }
    }

    pub fn can_play_card(&self, card: CardUid, target: Option<usize>) -> Result<(), CombatError> {
        let state = self.state.as_ref().ok_or(CombatError::NoActiveCombat)?;
        Self::ensure_player_turn(state)?;

        let instance = state
            .piles
            .find_in_hand(card)
            .ok_or(CombatError::CardNotInHand { card })?;
        if instance.flags().unplayable {
            return Err(CombatError::Unplayable { card });
        }
        let required = instance.cost();
        if !state.energy.can_spend(required) {
            return Err(CombatError::InsufficientEnergy {
                required,
                available: state.energy.current,
            });
        }
        if instance.target_mode() == TargetMode::SingleEnemy {
            Self::ensure_target(state, target)?;
        }
        Ok(())
    }

    pub fn play_card(
        &mut self,
        card: CardUid,
        target: Option<usize>,
    ) -> Result<PlayOutcome, CombatError> {
        self.can_play_card(card, target)?;
        let mut resolver = self.resolver()?;
        let state = &mut *resolver.state;

        let instance = state
            .piles
            .take_from_hand(card)
            .ok_or(CombatError::CardNotInHand { card })?;
        let cost = instance.cost();
        let spent = state.energy.spend(cost);
        debug_assert!(spent, "a validated play is always affordable");
        if cost > 0 {
            state.record_event(CombatEvent::EnergySpent { amount: cost });
        }

        let target = match instance.target_mode() {
            TargetMode::SingleEnemy => target,
            _ => None,
        };
        let targets = match instance.target_mode() {
            TargetMode::SingleEnemy => target
                .map(|index| Targets::Single(CombatantId::Enemy(index)))
                .unwrap_or(Targets::None),
            TargetMode::AllEnemies => Targets::Many(state.living_enemy_ids()),
            TargetMode::RandomEnemy => Targets::RandomEnemy,
            TargetMode::SelfTarget => Targets::Single(CombatantId::Player),
            TargetMode::None => Targets::None,
        };
        debug!(card = instance.id(), cost, ?target, "card played");

        let context = EffectContext::new(CombatantId::Player, targets).with_source_card(card);
        let mut resolution = EffectResolution::default();
        for effect in instance.effects() {
            resolution.extend(effect.apply(&context, state));
        }

        state.record_event(CombatEvent::CardPlayed {
            card,
            card_id: instance.id().to_string(),
            target,
        });
        let card_id = instance.id().to_string();
        let destination = if instance.flags().exhaust {
            state.record_event(CombatEvent::CardExhausted {
                card,
                card_id: card_id.clone(),
            });
            state.piles.exhaust.push(instance);
            PileKind::Exhaust
        } else {
            state.piles.discard.push(instance);
            PileKind::Discard
        };
        state.player.record_card_played();

        let killed = resolver.settle();
        Ok(PlayOutcome {
            card,
            card_id,
            energy_spent: cost,
            target,
            resolution,
            destination,
            killed,
            result: resolver.state.result,
        })
    }

    /// Ends the player's turn, runs every living enemy, then starts the next
    /// player turn unless the combat was decided. Fails without touching the
    /// state outside the player's turn.
    pub fn end_player_turn(&mut self) -> Result<TurnOutcome, CombatError> {
        let mut resolver = self.resolver()?;
        Self::ensure_player_turn(resolver.state)?;

        let turn = resolver.state.turn;
        resolver.state.record_event(CombatEvent::TurnEnd { turn });
        resolver.dispatch();

        let state = &mut *resolver.state;
        let discarded = state.piles.end_turn(&mut state.events);
        let before: Vec<StatusKind> = PLAYER_DURATION_STATUSES
            .into_iter()
            .filter(|kind| state.player.statuses.has(*kind))
            .collect();
        let end_of_turn = process_end_of_turn(&mut state.player);
        if end_of_turn.block_gained + end_of_turn.plated_block > 0 {
            state.record_event(CombatEvent::BlockGained {
                target: CombatantId::Player,
                amount: end_of_turn.block_gained + end_of_turn.plated_block,
            });
        }
        if end_of_turn.healed > 0 {
            state.record_event(CombatEvent::HpGained {
                target: CombatantId::Player,
                amount: end_of_turn.healed,
            });
        }
        for status in before {
            if !state.player.statuses.has(status) {
                state.record_event(CombatEvent::StatusRemoved {
                    target: CombatantId::Player,
                    status,
                });
            }
        }
        let unspent_energy = state.energy.end_turn();
        debug!(turn, discarded = discarded.len(), unspent_energy, "player turn ended");

        let enemy_actions = resolver.run_enemy_turn();
        if !resolver.state.is_over() {
            resolver.choose_intents();
            resolver.start_player_turn();
            resolver.settle();
        }

        Ok(TurnOutcome {
            discarded,
            end_of_turn,
            unspent_energy,
            enemy_actions,
            result: resolver.state.result,
        })
    }

    /// Unloads the combat and hands the player back with combat-only state
    /// cleared. Relic subscriptions are released if the fight never ended.
    pub fn finish(&mut self) -> Option<Player> {
        let mut state = self.state.take()?;
        unsubscribe_relics(&mut self.bus, &mut state.player);
        let mut player = state.player;
        player.end_combat();
        Some(player)
    }

    fn resolver(&mut self) -> Result<Resolver<'_>, CombatError> {
        let state = self.state.as_mut().ok_or(CombatError::NoActiveCombat)?;
        Ok(Resolver {
            bus: &mut self.bus,
            state,
            config: &self.config,
            ai_rng: &mut self.ai_rng,
        })
    }
}

/// Split borrow of the manager around one loaded combat.
struct Resolver<'a> {
    bus: &'a mut EventBus<CombatState>,
    state: &'a mut CombatState,
    config: &'a CombatConfig,
    ai_rng: &'a mut SmallRng,
}

impl Resolver<'_> {
    /// Delivers queued events, including any that handlers queue while
    /// running, up to the configured chain limit.
    fn dispatch(&mut self) {
        let limit = self.config.max_event_chain;
        let mut delivered = 0;
        while let Some(event) = self.state.events.pop() {
            if delivered >= limit {
                let dropped = self.state.events.discard_pending() + 1;
                warn!(limit, dropped, "event chain limit reached, dropping events");
                break;
            }
            self.bus.emit(&event, self.state);
            delivered += 1;
        }
    }

    /// Flags newly dead enemies and queues one death event for each.
    fn announce_deaths(&mut self) -> Vec<usize> {
        let mut died = Vec::new();
        for (index, enemy) in self.state.enemies.iter_mut().enumerate() {
            if !enemy.is_alive() && !enemy.death_announced {
                enemy.death_announced = true;
                died.push((index, enemy.id.clone()));
            }
        }
        died.into_iter()
            .map(|(enemy, enemy_id)| {
                debug!(enemy, %enemy_id, "enemy died");
                self.state
                    .record_event(CombatEvent::EnemyDied { enemy, enemy_id });
                enemy
            })
            .collect()
    }

    /// Dispatches, records deaths caused along the way, then checks whether
    /// the combat is decided.
    fn settle(&mut self) -> Vec<usize> {
        let mut killed = self.announce_deaths();
        self.dispatch();
        killed.extend(self.announce_deaths());
        self.dispatch();
        self.check_combat_end();
        killed
    }

    fn check_combat_end(&mut self) -> CombatResult {
        if self.state.is_over() {
            return self.state.result;
        }
        if self.state.all_enemies_dead() {
            self.conclude(CombatResult::Victory);
        } else if !self.state.player.is_alive() {
            self.conclude(CombatResult::Defeat);
        }
        self.state.result
    }

    fn conclude(&mut self, result: CombatResult) {
        self.state.result = result;
        self.state.phase = CombatPhase::CombatEnd;
        let victory = result == CombatResult::Victory;
        info!(
            ?result,
            turn = self.state.turn,
            hp = self.state.player.current_hp(),
            "combat ended"
        );
        self.state.record_event(CombatEvent::CombatEnd { victory });
        self.dispatch();
        unsubscribe_relics(self.bus, &mut self.state.player);
    }

    fn choose_intents(&mut self) {
        let state = &*self.state;
        let rng = &mut *self.ai_rng;
        let intents: Vec<(usize, Intent)> = state
            .living_enemies()
            .map(|(index, enemy)| (index, (enemy.ai)(enemy, state, rng)))
            .collect();
        for (index, intent) in intents {
            self.state.enemies[index].intent = intent;
        }
    }

    fn start_player_turn(&mut self) {
        let state = &mut *self.state;
        state.turn += 1;
        state.phase = CombatPhase::PlayerTurn;
        state.player.reset_block();
        state.player.start_turn();
        let energy = state.energy.start_turn();
        state.record_event(CombatEvent::EnergyGained { amount: energy });
        state.draw_cards(self.config.cards_per_turn);
        state.record_event(CombatEvent::TurnStart { turn: state.turn });
        debug!(turn = state.turn, energy, hand = state.piles.hand.len(), "player turn started");
    }

    /// Every living enemy acts in index order. Stops as soon as the player
    /// falls. A player killed by an intent loses even when the same hit
    /// brings down the last enemy.
    fn run_enemy_turn(&mut self) -> Vec<EnemyAction> {
        self.state.phase = CombatPhase::EnemyTurn;
        let turn = self.state.turn;
        self.state.record_event(CombatEvent::EnemyTurnStart { turn });
        self.dispatch();

        let mut actions = Vec::new();
        for index in 0..self.state.enemies.len() {
            if self.state.is_over() {
                break;
            }
            if !self.state.enemies[index].is_alive() {
                continue;
            }
            self.state.enemies[index].start_turn();
            let mut action = execute_intent(self.state, index);
            self.state.enemies[index].record_move();
            if !self.state.player.is_alive() {
                self.announce_deaths();
                self.conclude(CombatResult::Defeat);
                actions.push(action);
                break;
            }
            self.settle();
            if self.state.is_over() {
                actions.push(action);
                break;
            }

            let report = self.state.enemies[index].end_turn();
            let target = CombatantId::Enemy(index);
            self.state.record_hp_loss(target, report.poison_damage);
            for status in report.expired {
                self.state
                    .record_event(CombatEvent::StatusRemoved { target, status });
            }
            action.poison_damage = report.poison_damage;
            self.settle();
            actions.push(action);
        }

        if !self.state.is_over() {
            self.state.record_event(CombatEvent::EnemyTurnEnd { turn });
            self.settle();
        }
        actions
    }
}

fn execute_intent(state: &mut CombatState, index: usize) -> EnemyAction {
    let source = CombatantId::Enemy(index);
    let intent = state.enemies[index].intent.clone();
    let mut action = EnemyAction {
        enemy: index,
        intent: intent.clone(),
        ..EnemyAction::default()
    };

    if let Some(per_hit) = state.enemies[index].intent_damage(&state.player.statuses) {
        for _ in 0..intent.times {
            if per_hit <= 0 || !state.player.is_alive() || !state.is_alive(source) {
                break;
            }
            let hit = state.attack(source, CombatantId::Player, per_hit);
            action.damage_dealt += hit.hp_lost;
            action.damage_blocked += hit.blocked;
        }
    }
    if let Some(block) = intent.block {
        action.block_gained = state.gain_block(source, block);
    }
    if let Some(grant) = intent.buff {
        state.apply_status(source, grant.kind, grant.amount);
    }
    if let Some(grant) = intent.debuff {
        action.debuff = state.apply_status(CombatantId::Player, grant.kind, grant.amount);
    }
    debug!(
        enemy = index,
        intent = %intent.display(),
        damage = action.damage_dealt,
        "enemy acted"
    );
    action
}
