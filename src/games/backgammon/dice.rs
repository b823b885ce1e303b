//! Dice rolls and per-turn die availability.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A rolled pair of dice plus the die values still available this turn.
///
/// Doubles grant four uses of the value; otherwise each die is used once.
/// A die value leaves `available` exactly when a move consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiceRoll {
    die1: u8,
    die2: u8,
    available: Vec<u8>,
}

impl DiceRoll {
    /// Creates a roll from two die values (1–6).
    pub fn new(die1: u8, die2: u8) -> Self {
        debug_assert!((1..=6).contains(&die1) && (1..=6).contains(&die2));
        let available = if die1 == die2 {
            vec![die1; 4]
        } else {
            vec![die1, die2]
        };
        Self { die1, die2, available }
    }

    /// Rolls two dice with the given RNG.
    pub fn roll(rng: &mut impl Rng) -> Self {
        Self::new(rng.gen_range(1..=6), rng.gen_range(1..=6))
    }

    /// First die value.
    pub fn die1(&self) -> u8 {
        self.die1
    }

    /// Second die value.
    pub fn die2(&self) -> u8 {
        self.die2
    }

    /// True when both dice show the same value.
    pub fn is_double(&self) -> bool {
        self.die1 == self.die2
    }

    /// Die values still available to use this turn.
    pub fn available(&self) -> &[u8] {
        &self.available
    }

    /// The higher of the two die values.
    pub fn higher(&self) -> u8 {
        self.die1.max(self.die2)
    }

    /// Consumes one use of the given die value. Returns false if the value
    /// was not available.
    pub fn consume(&mut self, die: u8) -> bool {
        if let Some(pos) = self.available.iter().position(|&d| d == die) {
            self.available.remove(pos);
            true
        } else {
            false
        }
    }
}

impl std::fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.die1, self.die2)
    }
}

/// Rolls a single die (1–6).
pub fn roll_die(rng: &mut impl Rng) -> u8 {
    rng.gen_range(1..=6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_grant_four_uses() {
        let roll = DiceRoll::new(4, 4);
        assert_eq!(roll.available(), &[4, 4, 4, 4]);
        assert!(roll.is_double());
    }

    #[test]
    fn consume_removes_exactly_one_use() {
        let mut roll = DiceRoll::new(6, 3);
        assert!(roll.consume(6));
        assert_eq!(roll.available(), &[3]);
        assert!(!roll.consume(6));
    }
}
