//! Core domain types for backgammon.

use serde::{Deserialize, Serialize};

/// Player in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Player {
    /// White moves from point 23 toward point 0 (home board 0–5).
    White,
    /// Black moves from point 0 toward point 23 (home board 18–23).
    Black,
}

impl Player {
    /// Returns the opponent player.
    pub fn opponent(self) -> Self {
        match self {
            Player::White => Player::Black,
            Player::Black => Player::White,
        }
    }

    /// Index into per-player arrays (White = 0, Black = 1).
    pub fn index(self) -> usize {
        match self {
            Player::White => 0,
            Player::Black => 1,
        }
    }

    /// Home board point range for this player.
    pub fn home_range(self) -> std::ops::RangeInclusive<u8> {
        match self {
            Player::White => 0..=5,
            Player::Black => 18..=23,
        }
    }

    /// Distance in pips from the given point to bearing off.
    pub fn pip_distance(self, point: u8) -> u32 {
        match self {
            Player::White => u32::from(point) + 1,
            Player::Black => 24 - u32::from(point),
        }
    }
}

/// A location a checker can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Location {
    /// The bar, holding hit checkers that must re-enter.
    Bar,
    /// One of the 24 playing points (0–23).
    Point(u8),
    /// Borne off the board.
    Off,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Bar => write!(f, "bar"),
            Location::Point(p) => write!(f, "{}", p + 1),
            Location::Off => write!(f, "off"),
        }
    }
}

/// Multiplier applied to the cube value when a game ends.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::Display,
)]
pub enum GameValue {
    /// Normal win: loser has borne off at least one checker.
    Single,
    /// Loser borne off no checkers.
    Gammon,
    /// Gammon with a losing checker still on the bar or in the winner's home board.
    Backgammon,
}

impl GameValue {
    /// Point multiplier for this game value.
    pub fn multiplier(self) -> u32 {
        match self {
            GameValue::Single => 1,
            GameValue::Gammon => 2,
            GameValue::Backgammon => 3,
        }
    }
}

/// Phase of a single game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Opening roll not yet made.
    Setup,
    /// Current player is about to roll (cube decisions happen here).
    Rolling,
    /// Dice are rolled; current player must commit a ply.
    Moving,
    /// Game is over; winner and game value are set.
    GameOver,
}
