use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::entities::Combatant;

/// Every buff and debuff an entity can carry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum StatusKind {
    Strength,
    Dexterity,
    Artifact,
    Intangible,
    Thorns,
    Metallicize,
    PlatedArmor,
    Regen,
    Vulnerable,
    Weak,
    Frail,
    Poison,
    Ritual,
}

/// How repeated applications of the same status combine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Stacking {
    /// Amount accumulates; reduced only by status-specific rules.
    Intensity,
    /// Ticks down by one at the end of the owner's turn.
    Duration,
    /// Consumed one-for-one by a blocking check.
    Counter,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StatusDefinition {
    pub kind: StatusKind,
    pub name: &'static str,
    pub description: &'static str,
    pub is_debuff: bool,
    pub stacking: Stacking,
}

const fn def(
    kind: StatusKind,
    name: &'static str,
    description: &'static str,
    is_debuff: bool,
    stacking: Stacking,
) -> StatusDefinition {
    StatusDefinition {
        kind,
        name,
        description,
        is_debuff,
        stacking,
    }
}

impl StatusKind {
    pub const fn definition(self) -> StatusDefinition {
        use Stacking::*;
        use StatusKind::*;
        match self {
            Strength => def(self, "Strength", "Increases attack damage by {amount}.", false, Intensity),
            Dexterity => def(self, "Dexterity", "Increases block gained by {amount}.", false, Intensity),
            Artifact => def(self, "Artifact", "Negates {amount} debuff application(s).", false, Counter),
            Intangible => def(
                self,
                "Intangible",
                "Reduce ALL damage taken to 1. Lasts {amount} turn(s).",
                false,
                Duration,
            ),
            Thorns => def(self, "Thorns", "When attacked, deal {amount} damage back.", false, Intensity),
            Metallicize => def(self, "Metallicize", "At the end of turn, gain {amount} Block.", false, Intensity),
            PlatedArmor => def(
                self,
                "Plated Armor",
                "At end of turn, gain {amount} Block. Taking unblocked damage reduces this by 1.",
                false,
                Intensity,
            ),
            Regen => def(
                self,
                "Regeneration",
                "Heal {amount} HP at the end of turn, then reduce by 1.",
                false,
                Intensity,
            ),
            Vulnerable => def(
                self,
                "Vulnerable",
                "Takes 50% more damage from attacks. Lasts {amount} turn(s).",
                true,
                Duration,
            ),
            Weak => def(
                self,
                "Weak",
                "Deals 25% less attack damage. Lasts {amount} turn(s).",
                true,
                Duration,
            ),
            Frail => def(
                self,
                "Frail",
                "Gains 25% less block from cards. Lasts {amount} turn(s).",
                true,
                Duration,
            ),
            Poison => def(
                self,
                "Poison",
                "At the end of turn, lose {amount} HP and reduce Poison by 1.",
                true,
                Intensity,
            ),
            Ritual => def(self, "Ritual", "Gain {amount} Strength at the end of turn.", false, Intensity),
        }
    }

    pub const fn is_debuff(self) -> bool {
        self.definition().is_debuff
    }

    pub const fn stacking(self) -> Stacking {
        self.definition().stacking
    }

    pub fn describe(self, amount: i32) -> String {
        self.definition()
            .description
            .replace("{amount}", &amount.to_string())
    }
}

/// Statuses that tick down at the end of the player's turn.
pub const PLAYER_DURATION_STATUSES: [StatusKind; 4] = [
    StatusKind::Vulnerable,
    StatusKind::Weak,
    StatusKind::Frail,
    StatusKind::Intangible,
];

/// Stack counts keyed by kind. A kind whose count drops to zero or below is
/// removed rather than stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusMap {
    stacks: BTreeMap<StatusKind, i32>,
}

impl StatusMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: StatusKind) -> i32 {
        self.stacks.get(&kind).copied().unwrap_or(0)
    }

    pub fn has(&self, kind: StatusKind) -> bool {
        self.get(kind) > 0
    }

    /// Adds `amount` (which may be negative) and returns the new total.
    pub fn add(&mut self, kind: StatusKind, amount: i32) -> i32 {
        let total = self.get(kind) + amount;
        self.set(kind, total);
        total.max(0)
    }

    pub fn set(&mut self, kind: StatusKind, amount: i32) {
        if amount <= 0 {
            self.stacks.remove(&kind);
        } else {
            self.stacks.insert(kind, amount);
        }
    }

    pub fn remove(&mut self, kind: StatusKind) -> bool {
        self.stacks.remove(&kind).is_some()
    }

    /// Reduces a present status by one. Returns `true` if it expired.
    pub fn decrement(&mut self, kind: StatusKind) -> bool {
        if !self.stacks.contains_key(&kind) {
            return false;
        }
        self.add(kind, -1);
        !self.stacks.contains_key(&kind)
    }

    pub fn clear(&mut self) {
        self.stacks.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatusKind, i32)> + '_ {
        self.stacks.iter().map(|(kind, amount)| (*kind, *amount))
    }
}

impl FromIterator<(StatusKind, i32)> for StatusMap {
    fn from_iter<I: IntoIterator<Item = (StatusKind, i32)>>(iter: I) -> Self {
        let mut map = StatusMap::new();
        for (kind, amount) in iter {
            map.add(kind, amount);
        }
        map
    }
}

/// A status payload carried by intents and relics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusGrant {
    pub kind: StatusKind,
    pub amount: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum StatusOutcome {
    Applied { amount: i32, new_total: i32 },
    BlockedByArtifact,
}

impl StatusOutcome {
    pub fn applied(&self) -> bool {
        matches!(self, StatusOutcome::Applied { .. })
    }
}

/// Adds stacks to an entity. A debuff landing on an Artifact holder consumes
/// one Artifact stack instead of applying.
pub fn apply_status(statuses: &mut StatusMap, kind: StatusKind, amount: i32) -> StatusOutcome {
    if kind.is_debuff() && statuses.has(StatusKind::Artifact) {
        statuses.decrement(StatusKind::Artifact);
        tracing::debug!(status = %kind, "debuff negated by artifact");
        return StatusOutcome::BlockedByArtifact;
    }
    let new_total = statuses.add(kind, amount);
    StatusOutcome::Applied { amount, new_total }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndOfTurnReport {
    pub block_gained: i32,
    pub healed: i32,
    pub plated_block: i32,
    pub expired: u8,
}

/// Resolves the player's end-of-turn statuses. Metallicize, Regen and Plated
/// Armor resolve before any duration status ticks down.
pub fn process_end_of_turn<C: Combatant + ?Sized>(entity: &mut C) -> EndOfTurnReport {
    let mut report = EndOfTurnReport::default();

    let metallicize = entity.statuses().get(StatusKind::Metallicize);
    if metallicize > 0 {
        report.block_gained = entity.gain_block(metallicize);
    }

    let regen = entity.statuses().get(StatusKind::Regen);
    if regen > 0 {
        report.healed = entity.heal(regen);
        entity.statuses_mut().decrement(StatusKind::Regen);
    }

    let plated = entity.statuses().get(StatusKind::PlatedArmor);
    if plated > 0 {
        report.plated_block = entity.gain_block(plated);
    }

    for kind in PLAYER_DURATION_STATUSES {
        if entity.statuses_mut().decrement(kind) {
            report.expired += 1;
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;
    use crate::game::entities::Player;

    #[test]
    fn intensity_statuses_accumulate_without_cap() {
        let mut statuses = StatusMap::new();
        apply_status(&mut statuses, StatusKind::Poison, 3);
        let outcome = apply_status(&mut statuses, StatusKind::Poison, 3);

        assert_eq!(statuses.get(StatusKind::Poison), 6);
        assert_eq!(
            outcome,
            StatusOutcome::Applied {
                amount: 3,
                new_total: 6
            }
        );
    }

    #[test]
    fn artifact_consumes_one_stack_per_debuff() {
        let mut statuses = StatusMap::new();
        statuses.set(StatusKind::Artifact, 2);

        let outcome = apply_status(&mut statuses, StatusKind::Vulnerable, 2);

        assert_eq!(outcome, StatusOutcome::BlockedByArtifact);
        assert_eq!(statuses.get(StatusKind::Artifact), 1);
        assert!(!statuses.has(StatusKind::Vulnerable));
    }

    #[test]
    fn artifact_ignores_buffs_and_disappears_at_zero() {
        let mut statuses = StatusMap::new();
        statuses.set(StatusKind::Artifact, 1);

        apply_status(&mut statuses, StatusKind::Strength, 2);
        assert_eq!(statuses.get(StatusKind::Artifact), 1);

        apply_status(&mut statuses, StatusKind::Weak, 1);
        assert!(!statuses.has(StatusKind::Artifact));
        assert_eq!(statuses.len(), 1, "only strength should remain");
    }

    #[test]
    fn zero_or_negative_stacks_are_removed() {
        let mut statuses = StatusMap::new();
        statuses.add(StatusKind::Strength, 2);
        statuses.add(StatusKind::Strength, -2);
        assert!(statuses.is_empty());

        statuses.add(StatusKind::Dexterity, -1);
        assert!(statuses.is_empty(), "negative stacks are never stored");
    }

    #[test]
    fn end_of_turn_order_resolves_block_and_regen_before_durations() {
        let mut player = Player::new("Tester", 50);
        player.vitals.current_hp = 45;
        let statuses = player.statuses_mut();
        statuses.set(StatusKind::Metallicize, 3);
        statuses.set(StatusKind::Regen, 2);
        statuses.set(StatusKind::PlatedArmor, 4);
        statuses.set(StatusKind::Vulnerable, 1);
        statuses.set(StatusKind::Weak, 2);

        let report = process_end_of_turn(&mut player);

        assert_eq!(report.block_gained, 3);
        assert_eq!(report.healed, 2);
        assert_eq!(report.plated_block, 4);
        assert_eq!(report.expired, 1);
        assert_eq!(player.block(), 7);
        assert_eq!(player.current_hp(), 47);
        assert_eq!(player.statuses().get(StatusKind::Regen), 1);
        assert_eq!(player.statuses().get(StatusKind::PlatedArmor), 4);
        assert!(!player.statuses().has(StatusKind::Vulnerable));
        assert_eq!(player.statuses().get(StatusKind::Weak), 1);
    }

    #[test]
    fn regen_heal_is_capped_by_missing_hp() {
        let mut player = Player::new("Tester", 50);
        player.vitals.current_hp = 49;
        player.statuses_mut().set(StatusKind::Regen, 5);

        let report = process_end_of_turn(&mut player);

        assert_eq!(report.healed, 1);
        assert_eq!(player.current_hp(), 50);
        assert_eq!(player.statuses().get(StatusKind::Regen), 4);
    }

    #[test]
    fn status_names_parse_case_insensitively() {
        let kind: StatusKind = "plated_armor".parse().expect("known status");
        assert_eq!(kind, StatusKind::PlatedArmor);
        assert!("NOT_A_STATUS".parse::<StatusKind>().is_err());
        assert_eq!(StatusKind::Poison.describe(4), "At the end of turn, lose 4 HP and reduce Poison by 1.");
    }

    #[test]
    fn every_status_name_parses_back() {
        for kind in StatusKind::iter() {
            assert_eq!(kind.to_string().parse::<StatusKind>(), Ok(kind));
        }
        let debuffs: Vec<StatusKind> = StatusKind::iter().filter(|kind| kind.is_debuff()).collect();
        assert_eq!(
            debuffs,
            vec![
                StatusKind::Vulnerable,
                StatusKind::Weak,
                StatusKind::Frail,
                StatusKind::Poison
            ]
        );
    }
}
