use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::cards::CardUid;
use super::entities::CombatantId;
use super::state::CombatState;
use super::status::{StatusKind, StatusMap, StatusOutcome};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Effect {
    Damage {
        amount: i32,
        #[serde(default = "one")]
        times: u32,
    },
    Block {
        amount: i32,
    },
    Draw {
        count: usize,
    },
    ApplyStatus {
        status: StatusKind,
        amount: i32,
    },
    Heal {
        amount: i32,
    },
    GainEnergy {
        amount: i32,
    },
    Exhaust {
        count: usize,
        #[serde(default)]
        random: bool,
    },
    Composite {
        effects: Vec<Effect>,
    },
}

fn one() -> u32 {
    1
}

/// Resolved recipients of an effect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "ids")]
pub enum Targets {
    None,
    Single(CombatantId),
    Many(Vec<CombatantId>),
    /// Re-rolled among living enemies on every hit.
    RandomEnemy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectContext {
    pub source: CombatantId,
    pub targets: Targets,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_card: Option<CardUid>,
}

impl EffectContext {
    pub fn new(source: CombatantId, targets: Targets) -> Self {
        Self {
            source,
            targets,
            source_card: None,
        }
    }

    pub fn with_source_card(mut self, card: CardUid) -> Self {
        self.source_card = Some(card);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum EffectOutcome {
    Damage {
        target: CombatantId,
        amount: i32,
        blocked: i32,
        hp_lost: i32,
    },
    Block {
        target: CombatantId,
        amount: i32,
    },
    Drew {
        cards: Vec<CardUid>,
    },
    Status {
        target: CombatantId,
        status: StatusKind,
        outcome: StatusOutcome,
    },
    Healed {
        target: CombatantId,
        amount: i32,
    },
    Energy {
        amount: i32,
    },
    Exhausted {
        cards: Vec<CardUid>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectResolution {
    pub outcomes: Vec<EffectOutcome>,
}

impl EffectResolution {
    pub fn push(&mut self, outcome: EffectOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn extend(&mut self, other: EffectResolution) {
        self.outcomes.extend(other.outcomes);
    }

    pub fn total_hp_lost(&self) -> i32 {
        self.outcomes
            .iter()
            .map(|outcome| match outcome {
                EffectOutcome::Damage { hp_lost, .. } => *hp_lost,
                _ => 0,
            })
            .sum()
    }
}

/// Player-side attack damage: strength, then target Vulnerable, then source
/// Weak. Enemy intents use a different multiplier order, see
/// `Enemy::intent_damage`.
pub fn attack_damage(base: i32, source: &StatusMap, target: &StatusMap) -> i32 {
    let mut damage = base + source.get(StatusKind::Strength);
    if target.has(StatusKind::Vulnerable) {
        damage = damage * 3 / 2;
    }
    if source.has(StatusKind::Weak) {
        damage = damage * 3 / 4;
    }
    damage.max(0)
}

pub fn block_amount(base: i32, source: &StatusMap) -> i32 {
    let mut block = base + source.get(StatusKind::Dexterity);
    if source.has(StatusKind::Frail) {
        block = block * 3 / 4;
    }
    block.max(0)
}

impl Effect {
    pub fn damage(amount: i32) -> Self {
        Effect::Damage { amount, times: 1 }
    }

    pub fn multi_damage(amount: i32, times: u32) -> Self {
        Effect::Damage { amount, times }
    }

    pub fn block(amount: i32) -> Self {
        Effect::Block { amount }
    }

    pub fn draw(count: usize) -> Self {
        Effect::Draw { count }
    }

    pub fn apply_status(status: StatusKind, amount: i32) -> Self {
        Effect::ApplyStatus { status, amount }
    }

    pub fn heal(amount: i32) -> Self {
        Effect::Heal { amount }
    }

    pub fn gain_energy(amount: i32) -> Self {
        Effect::GainEnergy { amount }
    }

    pub fn exhaust(count: usize, random: bool) -> Self {
        Effect::Exhaust { count, random }
    }

    pub fn composite(effects: Vec<Effect>) -> Self {
        Effect::Composite { effects }
    }

    pub fn describe(&self) -> String {
        match self {
            Effect::Damage { amount, times } if *times > 1 => {
                format!("Deal {} damage {} times.", amount, times)
            }
            Effect::Damage { amount, .. } => format!("Deal {} damage.", amount),
            Effect::Block { amount } => format!("Gain {} Block.", amount),
            Effect::Draw { count: 1 } => "Draw 1 card.".to_string(),
            Effect::Draw { count } => format!("Draw {} cards.", count),
            Effect::ApplyStatus { status, amount } => {
                format!("Apply {} {}.", amount, status.definition().name)
            }
            Effect::Heal { amount } => format!("Heal {} HP.", amount),
            Effect::GainEnergy { amount } => format!("Gain {} Energy.", amount),
            Effect::Exhaust { count, random: true } => {
                format!("Exhaust {} random card(s).", count)
            }
            Effect::Exhaust { count, .. } => format!("Exhaust {} card(s).", count),
            Effect::Composite { effects } => effects
                .iter()
                .map(Effect::describe)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Applies the effect. Missing or dead targets are skipped rather than
    /// reported as errors; legality is checked before a card ever gets here.
    pub fn apply(&self, ctx: &EffectContext, state: &mut CombatState) -> EffectResolution {
        let mut resolution = EffectResolution::default();
        match self {
            Effect::Damage { amount, times } => {
                for _ in 0..*times {
                    let targets = state.resolve_hostile_targets(ctx.source, &ctx.targets);
                    if targets.is_empty() {
                        break;
                    }
                    for target in targets {
                        let Some(damage) = state.modified_attack_damage(ctx.source, target, *amount)
                        else {
                            continue;
                        };
                        let hit = state.attack(ctx.source, target, damage);
                        resolution.push(EffectOutcome::Damage {
                            target,
                            amount: damage,
                            blocked: hit.blocked,
                            hp_lost: hit.hp_lost,
                        });
                    }
                }
            }
            Effect::Block { amount } => {
                let Some(statuses) = state.statuses(ctx.source) else {
                    return resolution;
                };
                let block = block_amount(*amount, statuses);
                for target in state.resolve_friendly_targets(ctx.source, &ctx.targets) {
                    let gained = state.gain_block(target, block);
                    resolution.push(EffectOutcome::Block {
                        target,
                        amount: gained,
                    });
                }
            }
            Effect::Draw { count } => {
                if ctx.source.is_player() {
                    let cards = state.draw_cards(*count);
                    resolution.push(EffectOutcome::Drew { cards });
                }
            }
            Effect::ApplyStatus { status, amount } => {
                let targets = match &ctx.targets {
                    Targets::None => vec![ctx.source],
                    other => state.resolve_targets(other),
                };
                for target in targets {
                    if let Some(outcome) = state.apply_status(target, *status, *amount) {
                        resolution.push(EffectOutcome::Status {
                            target,
                            status: *status,
                            outcome,
                        });
                    }
                }
            }
            Effect::Heal { amount } => {
                for target in state.resolve_friendly_targets(ctx.source, &ctx.targets) {
                    let healed = state.heal(target, *amount);
                    resolution.push(EffectOutcome::Healed {
                        target,
                        amount: healed,
                    });
                }
            }
            Effect::GainEnergy { amount } => {
                if ctx.source.is_player() {
                    state.gain_energy(*amount);
                    resolution.push(EffectOutcome::Energy { amount: *amount });
                }
            }
            Effect::Exhaust { count, random } => {
                if ctx.source.is_player() {
                    let cards = Self::exhaust_from_hand(state, *count, *random);
                    resolution.push(EffectOutcome::Exhausted { cards });
                }
            }
            Effect::Composite { effects } => {
                for effect in effects {
                    resolution.extend(effect.apply(ctx, state));
                }
            }
        }
        resolution
    }

    fn exhaust_from_hand(state: &mut CombatState, count: usize, random: bool) -> Vec<CardUid> {
        let mut candidates: Vec<CardUid> = state.piles.hand.iter().map(|card| card.uid).collect();
        if random {
            candidates.shuffle(&mut state.rng);
        }
        candidates.truncate(count);
        candidates
            .into_iter()
            .filter(|uid| state.piles.exhaust_card(*uid, &mut state.events))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::CombatConfig;
    use crate::game::entities::{Combatant, Enemy, Player};

    fn state_with(enemies: Vec<Enemy>) -> CombatState {
        CombatState::new(
            Player::new("Tester", 80),
            enemies,
            &CombatConfig::seeded(11),
        )
    }

    fn player_ctx(targets: Targets) -> EffectContext {
        EffectContext::new(CombatantId::Player, targets)
    }

    #[test]
    fn strength_weak_and_vulnerable_combine_in_fixed_order() {
        let mut source = StatusMap::new();
        source.set(StatusKind::Strength, 3);
        source.set(StatusKind::Weak, 1);
        let mut target = StatusMap::new();
        target.set(StatusKind::Vulnerable, 1);

        assert_eq!(attack_damage(6, &source, &target), 9);
        assert_eq!(attack_damage(6, &source, &StatusMap::new()), 6);
        assert_eq!(attack_damage(6, &StatusMap::new(), &target), 9);
    }

    #[test]
    fn damage_effect_hits_through_block() {
        let mut enemy = Enemy::new("dummy", "Dummy", 40);
        enemy.gain_block(4);
        let mut state = state_with(vec![enemy]);

        let resolution = Effect::multi_damage(5, 2)
            .apply(&player_ctx(Targets::Single(CombatantId::Enemy(0))), &mut state);

        assert_eq!(resolution.outcomes.len(), 2);
        assert_eq!(resolution.total_hp_lost(), 6);
        assert_eq!(state.enemies[0].current_hp(), 34);
        assert_eq!(state.enemies[0].block(), 0);
    }

    #[test]
    fn damage_skips_dead_targets() {
        let mut dead = Enemy::new("dead", "Dead", 10);
        dead.vitals.current_hp = 0;
        let mut state = state_with(vec![dead, Enemy::new("alive", "Alive", 10)]);

        let targets = Targets::Many(vec![CombatantId::Enemy(0), CombatantId::Enemy(1)]);
        let resolution = Effect::damage(3).apply(&player_ctx(targets), &mut state);

        assert_eq!(resolution.outcomes.len(), 1);
        assert_eq!(state.enemies[1].current_hp(), 7);
    }

    #[test]
    fn block_uses_dexterity_and_frail_and_falls_back_to_source() {
        let mut state = state_with(vec![Enemy::new("dummy", "Dummy", 40)]);
        state.player.statuses.set(StatusKind::Dexterity, 3);
        state.player.statuses.set(StatusKind::Frail, 1);

        Effect::block(5).apply(&player_ctx(Targets::Single(CombatantId::Enemy(0))), &mut state);

        assert_eq!(state.player.block(), 6);
        assert_eq!(state.enemies[0].block(), 0);
    }

    #[test]
    fn heal_reports_actual_amount() {
        let mut state = state_with(vec![Enemy::new("dummy", "Dummy", 40)]);
        state.player.vitals.current_hp = 78;

        let resolution = Effect::heal(10).apply(&player_ctx(Targets::None), &mut state);

        assert_eq!(
            resolution.outcomes,
            vec![EffectOutcome::Healed {
                target: CombatantId::Player,
                amount: 2
            }]
        );
    }

    #[test]
    fn apply_status_respects_artifact_per_target() {
        let mut guarded = Enemy::new("guarded", "Guarded", 20);
        guarded.statuses.set(StatusKind::Artifact, 1);
        let mut state = state_with(vec![guarded, Enemy::new("open", "Open", 20)]);

        let targets = Targets::Many(vec![CombatantId::Enemy(0), CombatantId::Enemy(1)]);
        Effect::apply_status(StatusKind::Weak, 2).apply(&player_ctx(targets), &mut state);

        assert!(!state.enemies[0].statuses.has(StatusKind::Weak));
        assert!(!state.enemies[0].statuses.has(StatusKind::Artifact));
        assert_eq!(state.enemies[1].statuses.get(StatusKind::Weak), 2);
    }

    #[test]
    fn energy_and_draw_only_work_for_the_player() {
        let mut state = state_with(vec![Enemy::new("dummy", "Dummy", 40)]);
        let before = state.energy.current;

        let enemy_ctx = EffectContext::new(CombatantId::Enemy(0), Targets::None);
        let resolution = Effect::composite(vec![Effect::gain_energy(2), Effect::draw(2)])
            .apply(&enemy_ctx, &mut state);

        assert!(resolution.outcomes.is_empty());
        assert_eq!(state.energy.current, before);

        Effect::gain_energy(2).apply(&player_ctx(Targets::None), &mut state);
        assert_eq!(state.energy.current, before + 2);
    }

    #[test]
    fn describe_joins_composite_parts() {
        let effect = Effect::composite(vec![Effect::damage(9), Effect::draw(1)]);
        assert_eq!(effect.describe(), "Deal 9 damage. Draw 1 card.");
        assert_eq!(Effect::multi_damage(3, 3).describe(), "Deal 3 damage 3 times.");
    }
}
