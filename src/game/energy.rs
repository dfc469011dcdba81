use serde::{Deserialize, Serialize};

/// Per-combat energy pool.
///
/// Current energy is never negative: `spend` refuses rather than overdraws.
/// There is no upper clamp, so gains past `max` are legal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnergyState {
    pub current: i32,
    pub max: i32,
    #[serde(default)]
    pub bonus_next_turn: i32,
}

impl Default for EnergyState {
    fn default() -> Self {
        Self {
            current: 0,
            max: 3,
            bonus_next_turn: 0,
        }
    }
}

impl EnergyState {
    pub fn new(max: i32) -> Self {
        let mut energy = Self::default();
        energy.initialize(max);
        energy
    }

    pub fn initialize(&mut self, max: i32) {
        self.max = max.max(0);
        self.current = self.max;
        self.bonus_next_turn = 0;
    }

    /// Refills to `max` plus any banked bonus and returns the new current.
    pub fn start_turn(&mut self) -> i32 {
        self.current = self.max + self.bonus_next_turn;
        self.bonus_next_turn = 0;
        self.current
    }

    /// Reports unspent energy. Nothing is banked implicitly.
    pub fn end_turn(&self) -> i32 {
        self.current
    }

    pub fn can_spend(&self, amount: i32) -> bool {
        amount >= 0 && self.current >= amount
    }

    pub fn spend(&mut self, amount: i32) -> bool {
        if !self.can_spend(amount) {
            return false;
        }
        self.current -= amount;
        true
    }

    pub fn gain(&mut self, amount: i32) -> i32 {
        self.current += amount;
        self.current
    }

    pub fn gain_next_turn(&mut self, amount: i32) {
        self.bonus_next_turn += amount;
    }

    pub fn gain_max_energy(&mut self, amount: i32) {
        self.max += amount;
    }

    pub fn lose_max_energy(&mut self, amount: i32) {
        self.max = (self.max - amount).max(0);
    }

    pub fn set_energy(&mut self, amount: i32) {
        self.current = amount.max(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spend_beyond_current_is_refused_without_mutation() {
        let mut energy = EnergyState::new(3);
        assert!(!energy.spend(4));
        assert_eq!(energy.current, 3);
        assert!(!energy.spend(-1), "negative spends are rejected");
        assert_eq!(energy.current, 3);

        assert!(energy.spend(2));
        assert_eq!(energy.current, 1);
        assert!(energy.spend(1));
        assert_eq!(energy.current, 0);
    }

    #[test]
    fn bonus_is_consumed_by_the_next_turn_only() {
        let mut energy = EnergyState::new(3);
        energy.gain_next_turn(2);
        energy.gain_next_turn(1);

        assert_eq!(energy.start_turn(), 6);
        assert_eq!(energy.bonus_next_turn, 0);
        assert_eq!(energy.start_turn(), 3);
    }

    #[test]
    fn gain_can_exceed_max_and_max_is_floored() {
        let mut energy = EnergyState::new(3);
        assert_eq!(energy.gain(4), 7);

        energy.lose_max_energy(5);
        assert_eq!(energy.max, 0);
        energy.gain_max_energy(2);
        assert_eq!(energy.max, 2);
        assert_eq!(energy.end_turn(), 7, "unspent energy is only reported");
    }
}
