use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::game::{
    CardInstance, CardTemplate, CardTemplateBuilder, CardType, CardUpgrade, Effect, Rarity,
    StatusKind, TargetMode,
};

static CARDS: Lazy<HashMap<String, Arc<CardTemplate>>> = Lazy::new(build_card_library);

pub const WARRIOR_COMMONS: [&str; 8] = [
    "anger",
    "cleave",
    "clothesline",
    "iron_wave",
    "pommel_strike",
    "shrug_it_off",
    "sword_boomerang",
    "thunderclap",
];

pub const MAGE_COMMONS: [&str; 6] = [
    "blade_dance",
    "deadly_poison",
    "quick_slash",
    "slice",
    "sneaky_strike",
    "sucker_punch",
];

fn attack(id: &str, name: &str, rarity: Rarity, target: TargetMode, cost: i32) -> CardTemplateBuilder {
    CardTemplate::builder(id, name)
        .card_type(CardType::Attack)
        .rarity(rarity)
        .target(target)
        .cost(cost)
}

fn skill(id: &str, name: &str, rarity: Rarity, target: TargetMode, cost: i32) -> CardTemplateBuilder {
    CardTemplate::builder(id, name)
        .card_type(CardType::Skill)
        .rarity(rarity)
        .target(target)
        .cost(cost)
}

fn upgraded(effects: Vec<Effect>, description: &str) -> CardUpgrade {
    CardUpgrade {
        effects: Some(effects),
        description: Some(description.to_string()),
        ..CardUpgrade::default()
    }
}

fn starter_cards() -> Vec<Arc<CardTemplate>> {
    use Rarity::Starter;
    use TargetMode::{SelfTarget, SingleEnemy};

    vec![
        attack("strike", "Strike", Starter, SingleEnemy, 1)
            .effect(Effect::damage(6))
            .description("Deal 6 damage.")
            .upgrade(upgraded(vec![Effect::damage(9)], "Deal 9 damage."))
            .build(),
        skill("defend", "Defend", Starter, SelfTarget, 1)
            .effect(Effect::block(5))
            .description("Gain 5 Block.")
            .upgrade(upgraded(vec![Effect::block(8)], "Gain 8 Block."))
            .build(),
        attack("bash", "Bash", Starter, SingleEnemy, 2)
            .effect(Effect::damage(8))
            .effect(Effect::apply_status(StatusKind::Vulnerable, 2))
            .description("Deal 8 damage. Apply 2 Vulnerable.")
            .upgrade(upgraded(
                vec![
                    Effect::damage(10),
                    Effect::apply_status(StatusKind::Vulnerable, 3),
                ],
                "Deal 10 damage. Apply 3 Vulnerable.",
            ))
            .build(),
        attack("neutralize", "Neutralize", Starter, SingleEnemy, 0)
            .effect(Effect::damage(3))
            .effect(Effect::apply_status(StatusKind::Weak, 1))
            .description("Deal 3 damage. Apply 1 Weak.")
            .upgrade(upgraded(
                vec![Effect::damage(4), Effect::apply_status(StatusKind::Weak, 2)],
                "Deal 4 damage. Apply 2 Weak.",
            ))
            .build(),
        // The discard half of Survivor needs a hand choice and is not modelled.
        skill("survivor", "Survivor", Starter, SelfTarget, 1)
            .effect(Effect::block(8))
            .description("Gain 8 Block. Discard 1 card.")
            .upgrade(upgraded(vec![Effect::block(11)], "Gain 11 Block. Discard 1 card."))
            .build(),
    ]
}

fn warrior_cards() -> Vec<Arc<CardTemplate>> {
    use Rarity::Common;
    use TargetMode::{AllEnemies, RandomEnemy, SelfTarget, SingleEnemy};

    vec![
        attack("anger", "Anger", Common, SingleEnemy, 0)
            .effect(Effect::damage(6))
            .description("Deal 6 damage. Add a copy of this card to your discard pile.")
            .upgrade(upgraded(
                vec![Effect::damage(8)],
                "Deal 8 damage. Add a copy of this card to your discard pile.",
            ))
            .build(),
        attack("cleave", "Cleave", Common, AllEnemies, 1)
            .effect(Effect::damage(8))
            .description("Deal 8 damage to ALL enemies.")
            .upgrade(upgraded(vec![Effect::damage(11)], "Deal 11 damage to ALL enemies."))
            .build(),
        attack("clothesline", "Clothesline", Common, SingleEnemy, 2)
            .effect(Effect::damage(12))
            .effect(Effect::apply_status(StatusKind::Weak, 2))
            .description("Deal 12 damage. Apply 2 Weak.")
            .upgrade(upgraded(
                vec![Effect::damage(14), Effect::apply_status(StatusKind::Weak, 3)],
                "Deal 14 damage. Apply 3 Weak.",
            ))
            .build(),
        attack("iron_wave", "Iron Wave", Common, SingleEnemy, 1)
            .effect(Effect::damage(5))
            .effect(Effect::block(5))
            .description("Gain 5 Block. Deal 5 damage.")
            .upgrade(upgraded(
                vec![Effect::damage(7), Effect::block(7)],
                "Gain 7 Block. Deal 7 damage.",
            ))
            .build(),
        attack("pommel_strike", "Pommel Strike", Common, SingleEnemy, 1)
            .effect(Effect::damage(9))
            .effect(Effect::draw(1))
            .description("Deal 9 damage. Draw 1 card.")
            .upgrade(upgraded(
                vec![Effect::damage(10), Effect::draw(2)],
                "Deal 10 damage. Draw 2 cards.",
            ))
            .build(),
        skill("shrug_it_off", "Shrug It Off", Common, SelfTarget, 1)
            .effect(Effect::block(8))
            .effect(Effect::draw(1))
            .description("Gain 8 Block. Draw 1 card.")
            .upgrade(upgraded(
                vec![Effect::block(11), Effect::draw(1)],
                "Gain 11 Block. Draw 1 card.",
            ))
            .build(),
        attack("sword_boomerang", "Sword Boomerang", Common, RandomEnemy, 1)
            .effect(Effect::multi_damage(3, 3))
            .description("Deal 3 damage to a random enemy 3 times.")
            .upgrade(upgraded(
                vec![Effect::multi_damage(3, 4)],
                "Deal 3 damage to a random enemy 4 times.",
            ))
            .build(),
        attack("thunderclap", "Thunderclap", Common, AllEnemies, 1)
            .effect(Effect::damage(4))
            .effect(Effect::apply_status(StatusKind::Vulnerable, 1))
            .description("Deal 4 damage and apply 1 Vulnerable to ALL enemies.")
            .upgrade(upgraded(
                vec![
                    Effect::damage(7),
                    Effect::apply_status(StatusKind::Vulnerable, 1),
                ],
                "Deal 7 damage and apply 1 Vulnerable to ALL enemies.",
            ))
            .build(),
    ]
}

fn mage_cards() -> Vec<Arc<CardTemplate>> {
    use Rarity::Common;
    use TargetMode::SingleEnemy;

    vec![
        // Shiv generation is not modelled; the card resolves with no effect.
        skill("blade_dance", "Blade Dance", Common, TargetMode::None, 1)
            .description("Add 3 Shivs to your hand.")
            .upgrade(upgraded(Vec::new(), "Add 4 Shivs to your hand."))
            .build(),
        skill("deadly_poison", "Deadly Poison", Common, SingleEnemy, 1)
            .effect(Effect::apply_status(StatusKind::Poison, 5))
            .description("Apply 5 Poison.")
            .upgrade(upgraded(
                vec![Effect::apply_status(StatusKind::Poison, 7)],
                "Apply 7 Poison.",
            ))
            .build(),
        attack("quick_slash", "Quick Slash", Common, SingleEnemy, 1)
            .effect(Effect::damage(8))
            .effect(Effect::draw(1))
            .description("Deal 8 damage. Draw 1 card.")
            .upgrade(upgraded(
                vec![Effect::damage(12), Effect::draw(1)],
                "Deal 12 damage. Draw 1 card.",
            ))
            .build(),
        attack("slice", "Slice", Common, SingleEnemy, 0)
            .effect(Effect::damage(6))
            .description("Deal 6 damage.")
            .upgrade(upgraded(vec![Effect::damage(9)], "Deal 9 damage."))
            .build(),
        attack("sneaky_strike", "Sneaky Strike", Common, SingleEnemy, 2)
            .effect(Effect::damage(12))
            .description("Deal 12 damage. If you have discarded a card this turn, costs 0.")
            .upgrade(upgraded(
                vec![Effect::damage(16)],
                "Deal 16 damage. If you have discarded a card this turn, costs 0.",
            ))
            .build(),
        attack("sucker_punch", "Sucker Punch", Common, SingleEnemy, 1)
            .effect(Effect::damage(7))
            .effect(Effect::apply_status(StatusKind::Weak, 1))
            .description("Deal 7 damage. Apply 1 Weak.")
            .upgrade(upgraded(
                vec![Effect::damage(9), Effect::apply_status(StatusKind::Weak, 2)],
                "Deal 9 damage. Apply 2 Weak.",
            ))
            .build(),
    ]
}

fn build_card_library() -> HashMap<String, Arc<CardTemplate>> {
    starter_cards()
        .into_iter()
        .chain(warrior_cards())
        .chain(mage_cards())
        .map(|template| (template.id.clone(), template))
        .collect()
}

pub fn card_template(id: &str) -> Option<Arc<CardTemplate>> {
    CARDS.get(id).cloned()
}

pub fn create_card(id: &str, upgraded: bool) -> Option<CardInstance> {
    let template = card_template(id)?;
    Some(if upgraded {
        CardInstance::new_upgraded(template)
    } else {
        CardInstance::new(template)
    })
}

pub fn card_ids() -> Vec<&'static str> {
    let mut ids: Vec<&'static str> = CARDS.keys().map(String::as_str).collect();
    ids.sort_unstable();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_holds_every_card() {
        assert_eq!(card_ids().len(), 5 + WARRIOR_COMMONS.len() + MAGE_COMMONS.len());
        for id in WARRIOR_COMMONS.iter().chain(MAGE_COMMONS.iter()) {
            assert!(card_template(id).is_some(), "{} should be registered", id);
        }
    }

    #[test]
    fn upgraded_strike_hits_harder() {
        let card = create_card("strike", true).expect("strike exists");
        assert_eq!(card.display_name(), "Strike+");
        assert_eq!(card.effects(), &[Effect::damage(9)]);
        assert_eq!(card.description(), "Deal 9 damage.");
    }

    #[test]
    fn templates_are_shared() {
        let a = create_card("bash", false).expect("bash exists");
        let b = create_card("bash", false).expect("bash exists");
        assert!(Arc::ptr_eq(&a.template, &b.template));
        assert_ne!(a.uid, b.uid);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        assert!(create_card("perfected_strike", false).is_none());
    }
}
