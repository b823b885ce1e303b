//! Backgammon game logic: board model, dice, rules, cube and the per-game
//! state machine.
//!
//! Everything here is synchronous and pure over immutable snapshots; the
//! async orchestration lives in the match controller.

mod board;
mod cube;
mod dice;
mod game;
mod moves;
pub mod rules;
mod types;

pub use board::{Board, PointState};
pub use cube::{CubeError, CubeRules, CubeState, DoubleResponse};
pub use dice::DiceRoll;
pub use game::{Game, OpeningRoll, PlyOutcome, TurnStart, game_value};
pub use moves::{CheckerMove, IllegalMoveError, Ply};
pub use types::{GamePhase, GameValue, Location, Player};
