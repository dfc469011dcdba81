use std::collections::HashMap;

use once_cell::sync::Lazy;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::ai::{act1, Difficulty, EncounterTier};
use crate::game::{Enemy, EnemyTemplate};

pub const JAW_WORM: EnemyTemplate = EnemyTemplate {
    id: "jaw_worm",
    name: "Jaw Worm",
    min_hp: 40,
    max_hp: 44,
    ai: act1::jaw_worm,
};

pub const CULTIST: EnemyTemplate = EnemyTemplate {
    id: "cultist",
    name: "Cultist",
    min_hp: 48,
    max_hp: 54,
    ai: act1::cultist,
};

pub const LOUSE_RED: EnemyTemplate = EnemyTemplate {
    id: "louse_red",
    name: "Red Louse",
    min_hp: 10,
    max_hp: 15,
    ai: act1::louse,
};

pub const LOUSE_GREEN: EnemyTemplate = EnemyTemplate {
    id: "louse_green",
    name: "Green Louse",
    min_hp: 11,
    max_hp: 17,
    ai: act1::louse,
};

pub const ACID_SLIME_M: EnemyTemplate = EnemyTemplate {
    id: "acid_slime_m",
    name: "Acid Slime (M)",
    min_hp: 28,
    max_hp: 32,
    ai: act1::acid_slime,
};

pub const SPIKE_SLIME_M: EnemyTemplate = EnemyTemplate {
    id: "spike_slime_m",
    name: "Spike Slime (M)",
    min_hp: 28,
    max_hp: 32,
    ai: act1::spike_slime,
};

pub const GREMLIN_NOB: EnemyTemplate = EnemyTemplate {
    id: "gremlin_nob",
    name: "Gremlin Nob",
    min_hp: 82,
    max_hp: 86,
    ai: act1::gremlin_nob,
};

pub const LAGAVULIN: EnemyTemplate = EnemyTemplate {
    id: "lagavulin",
    name: "Lagavulin",
    min_hp: 109,
    max_hp: 111,
    ai: act1::lagavulin,
};

pub const SENTRY: EnemyTemplate = EnemyTemplate {
    id: "sentry",
    name: "Sentry",
    min_hp: 38,
    max_hp: 42,
    ai: act1::sentry,
};

pub const SLIME_BOSS: EnemyTemplate = EnemyTemplate {
    id: "slime_boss",
    name: "Slime Boss",
    min_hp: 140,
    max_hp: 140,
    ai: act1::slime_boss,
};

const EASY_POOL: [&EnemyTemplate; 2] = [&JAW_WORM, &CULTIST];
const NORMAL_POOL: [&EnemyTemplate; 4] = [&LOUSE_RED, &LOUSE_GREEN, &ACID_SLIME_M, &SPIKE_SLIME_M];
const ELITE_POOL: [&EnemyTemplate; 3] = [&GREMLIN_NOB, &LAGAVULIN, &SENTRY];

static ENEMIES: Lazy<HashMap<&'static str, EnemyTemplate>> = Lazy::new(|| {
    [
        JAW_WORM,
        CULTIST,
        LOUSE_RED,
        LOUSE_GREEN,
        ACID_SLIME_M,
        SPIKE_SLIME_M,
        GREMLIN_NOB,
        LAGAVULIN,
        SENTRY,
        SLIME_BOSS,
    ]
    .into_iter()
    .map(|template| (template.id, template))
    .collect()
});

pub fn enemy_template(id: &str) -> Option<&'static EnemyTemplate> {
    ENEMIES.get(id)
}

pub fn enemy_ids() -> Vec<&'static str> {
    let mut ids: Vec<&'static str> = ENEMIES.keys().copied().collect();
    ids.sort_unstable();
    ids
}

pub fn create_enemy(id: &str, difficulty: Difficulty, rng: &mut SmallRng) -> Option<Enemy> {
    enemy_template(id).map(|template| Enemy::spawn(template, difficulty, rng))
}

/// Rolls an Act 1 encounter. Normal fights bring one or two enemies and
/// Sentries always arrive as a pair.
pub fn random_encounter(tier: EncounterTier, difficulty: Difficulty, rng: &mut SmallRng) -> Vec<Enemy> {
    let templates: Vec<&EnemyTemplate> = match tier {
        EncounterTier::Easy => EASY_POOL.choose(rng).copied().into_iter().collect(),
        EncounterTier::Normal => {
            let count = rng.gen_range(1..=2);
            (0..count)
                .filter_map(|_| NORMAL_POOL.choose(rng).copied())
                .collect()
        }
        EncounterTier::Elite => match ELITE_POOL.choose(rng).copied() {
            Some(template) if template.id == SENTRY.id => vec![template, template],
            picked => picked.into_iter().collect(),
        },
        EncounterTier::Boss => vec![&SLIME_BOSS],
    };
    let enemies: Vec<Enemy> = templates
        .into_iter()
        .map(|template| Enemy::spawn(template, difficulty, rng))
        .collect();
    tracing::debug!(?tier, enemies = enemies.len(), "encounter rolled");
    enemies
}
