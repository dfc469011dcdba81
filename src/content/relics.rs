use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::game::{
    RelicEffect, RelicInstance, RelicRarity, RelicTemplate, RelicTrigger, StatusKind,
};

static RELICS: Lazy<HashMap<String, Arc<RelicTemplate>>> = Lazy::new(build_relic_library);

pub const COMMON_RELICS: [&str; 7] = [
    "anchor",
    "ancient_tea_set",
    "bag_of_marbles",
    "blood_vial",
    "bronze_scales",
    "centennial_puzzle",
    "vajra",
];

fn relic(
    id: &str,
    name: &str,
    rarity: RelicRarity,
    trigger: RelicTrigger,
    effect: RelicEffect,
    description: &str,
) -> RelicTemplate {
    RelicTemplate {
        id: id.to_string(),
        name: name.to_string(),
        rarity,
        description: description.to_string(),
        trigger,
        effect,
        counter_based: false,
        max_counter: None,
        resets_each_combat: false,
    }
}

fn build_relic_library() -> HashMap<String, Arc<RelicTemplate>> {
    use RelicRarity::{Common, Starter};
    use RelicTrigger::{CombatEnd, CombatStart, OnHpLoss};

    let relics = vec![
        relic(
            "burning_blood",
            "Burning Blood",
            Starter,
            CombatEnd,
            RelicEffect::HealOnVictory { amount: 6 },
            "At the end of combat, heal 6 HP.",
        ),
        relic(
            "ring_of_the_snake",
            "Ring of the Snake",
            Starter,
            CombatStart,
            RelicEffect::DrawCards { count: 2 },
            "At the start of combat, draw 2 additional cards.",
        ),
        // Orbs are not modelled.
        relic(
            "cracked_core",
            "Cracked Core",
            Starter,
            CombatStart,
            RelicEffect::Inert,
            "At the start of combat, Channel 1 Lightning orb.",
        ),
        relic(
            "anchor",
            "Anchor",
            Common,
            CombatStart,
            RelicEffect::GainBlock { amount: 10 },
            "Start each combat with 10 Block.",
        ),
        RelicTemplate {
            counter_based: true,
            max_counter: Some(1),
            ..relic(
                "ancient_tea_set",
                "Ancient Tea Set",
                Common,
                CombatStart,
                RelicEffect::BonusEnergy { amount: 2 },
                "Whenever you enter a Rest Site, start the next combat with 2 extra Energy.",
            )
        },
        relic(
            "bag_of_marbles",
            "Bag of Marbles",
            Common,
            CombatStart,
            RelicEffect::ApplyToAllEnemies {
                status: StatusKind::Vulnerable,
                amount: 1,
            },
            "At the start of combat, apply 1 Vulnerable to ALL enemies.",
        ),
        relic(
            "blood_vial",
            "Blood Vial",
            Common,
            CombatStart,
            RelicEffect::Heal { amount: 2 },
            "At the start of combat, heal 2 HP.",
        ),
        relic(
            "bronze_scales",
            "Bronze Scales",
            Common,
            CombatStart,
            RelicEffect::GainStatus {
                status: StatusKind::Thorns,
                amount: 3,
            },
            "Start each combat with 3 Thorns.",
        ),
        RelicTemplate {
            counter_based: true,
            max_counter: Some(1),
            resets_each_combat: true,
            ..relic(
                "centennial_puzzle",
                "Centennial Puzzle",
                Common,
                OnHpLoss,
                RelicEffect::DrawOnFirstHpLoss { count: 3 },
                "The first time you lose HP each combat, draw 3 cards.",
            )
        },
        relic(
            "vajra",
            "Vajra",
            Common,
            CombatStart,
            RelicEffect::GainStatus {
                status: StatusKind::Strength,
                amount: 1,
            },
            "Start each combat with 1 Strength.",
        ),
    ];

    relics
        .into_iter()
        .map(|template| (template.id.clone(), Arc::new(template)))
        .collect()
}

pub fn relic_template(id: &str) -> Option<Arc<RelicTemplate>> {
    RELICS.get(id).cloned()
}

pub fn create_relic(id: &str) -> Option<RelicInstance> {
    relic_template(id).map(RelicInstance::new)
}

pub fn relic_ids() -> Vec<&'static str> {
    let mut ids: Vec<&'static str> = RELICS.keys().map(String::as_str).collect();
    ids.sort_unstable();
    ids
}
