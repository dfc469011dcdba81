use rand::rngs::SmallRng;
use rand::Rng;

use crate::game::{Combatant, CombatState, Enemy, Intent, IntentKind, StatusKind};

/// Chomp 11, Bellow (Strength 3, Block 6), Thrash 7 with Block 5.
pub fn jaw_worm(enemy: &Enemy, _state: &CombatState, _rng: &mut SmallRng) -> Intent {
    match enemy.turn_count % 3 {
        0 => Intent::attack(11),
        1 => Intent::of(IntentKind::Buff)
            .with_block(6)
            .with_buff(StatusKind::Strength, 3),
        _ => Intent::of(IntentKind::AttackDefend)
            .with_damage(7)
            .with_block(5),
    }
}

pub fn cultist(enemy: &Enemy, _state: &CombatState, _rng: &mut SmallRng) -> Intent {
    if enemy.turn_count == 0 {
        Intent::buff(StatusKind::Ritual, 3)
    } else {
        Intent::attack(6)
    }
}

/// Curls up a quarter of the time while unblocked, otherwise bites for 5-7.
pub fn louse(enemy: &Enemy, _state: &CombatState, rng: &mut SmallRng) -> Intent {
    let bite = rng.gen_range(5..=7);
    if enemy.block() == 0 && rng.gen_bool(0.25) {
        Intent::defend(rng.gen_range(3..=7))
    } else {
        Intent::attack(bite)
    }
}

pub fn acid_slime(_enemy: &Enemy, _state: &CombatState, rng: &mut SmallRng) -> Intent {
    if rng.gen_bool(0.3) {
        Intent::debuff(StatusKind::Weak, 1)
    } else {
        Intent::attack(10)
    }
}

pub fn spike_slime(_enemy: &Enemy, _state: &CombatState, rng: &mut SmallRng) -> Intent {
    if rng.gen_bool(0.3) {
        Intent::debuff(StatusKind::Frail, 1)
    } else {
        Intent::attack(8)
    }
}

pub fn gremlin_nob(enemy: &Enemy, _state: &CombatState, _rng: &mut SmallRng) -> Intent {
    match enemy.turn_count {
        0 => Intent::buff(StatusKind::Strength, 2),
        turn if turn % 3 == 0 => Intent::of(IntentKind::AttackDebuff)
            .with_damage(6)
            .with_debuff(StatusKind::Vulnerable, 2),
        _ => Intent::attack(14),
    }
}

/// Sleeps through the first three turns unless woken by damage.
pub fn lagavulin(enemy: &Enemy, _state: &CombatState, _rng: &mut SmallRng) -> Intent {
    if enemy.turn_count < 3 && enemy.current_hp() == enemy.max_hp() {
        Intent::sleeping()
    } else if enemy.turn_count % 3 == 0 {
        Intent::debuff(StatusKind::Weak, 1)
    } else {
        Intent::attack(18)
    }
}

pub fn sentry(enemy: &Enemy, _state: &CombatState, _rng: &mut SmallRng) -> Intent {
    if enemy.turn_count % 2 == 0 {
        Intent::attack(9)
    } else {
        Intent::debuff(StatusKind::Frail, 1)
    }
}

pub fn slime_boss(enemy: &Enemy, _state: &CombatState, _rng: &mut SmallRng) -> Intent {
    if enemy.turn_count % 2 == 0 {
        Intent::debuff(StatusKind::Weak, 2)
    } else {
        Intent::attack(35)
    }
}
