//! Strictly Backgammon - a backgammon match engine.
//!
//! This library implements the rules and state machine for a single game
//! and a multi-game match of backgammon, the scoring model (gammons,
//! backgammons, doubling cube, Crawford and Jacoby rules), pluggable AI
//! opponents, and a gameplay audit recorder.
//!
//! # Architecture
//!
//! - **Board/Rules**: pure, synchronous functions over immutable board
//!   snapshots ([`Board`], [`Game`], [`rules`])
//! - **Match Controller**: owns the [`MatchState`] and drives games through
//!   the rules engine, emitting an ordered event stream
//! - **Opponents**: async [`OpponentStrategy`] implementations, from random
//!   to Monte-Carlo search
//! - **Audit**: fire-and-forget session recording behind a [`SessionSink`]
//!
//! # Example
//!
//! ```no_run
//! use strictly_backgammon::{AiPreset, MatchConfiguration, MatchController, Player};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut controller = MatchController::new(MatchConfiguration::match_to(5))
//!     .with_ai_seat(Player::White, AiPreset::Hard, None)
//!     .with_ai_seat(Player::Black, AiPreset::Expert, None);
//! let winner = controller.run_match().await?;
//! println!("{winner} wins the match");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod audit;
mod controller;
mod games;
mod matches;
mod players;

// Crate-level exports - Game types (backgammon)
pub use games::backgammon::{
    Board, CheckerMove, CubeError, CubeRules, CubeState, DiceRoll, DoubleResponse, Game, GamePhase,
    GameValue, IllegalMoveError, Location, OpeningRoll, Player, Ply, PlyOutcome, PointState,
    TurnStart, game_value, rules,
};

// Crate-level exports - Match scoring
pub use matches::{GameRecord, MatchConfiguration, MatchState};

// Crate-level exports - Controller and events
pub use controller::{Actor, EngineEvent, MatchController, MatchError};

// Crate-level exports - Opponent strategies
pub use players::{
    AiPreset, CandidateEvaluation, CubeAction, CubeDecisionContext, EvaluationTrace,
    HeuristicStrategy, MonteCarloStrategy, OpponentStrategy, RandomStrategy, StrategyError,
};

// Crate-level exports - Audit recording
pub use audit::{
    AuditConfig, AuditRecorder, GameplaySession, JsonLinesSink, MemorySink, SessionEvent,
    SessionMode, SessionSink,
};
