//! Opponent strategy trait and implementations.
//!
//! Any opponent (difficulty preset, search-based evaluator) implements
//! [`OpponentStrategy`]. The contract: a returned ply must be drawn from the
//! legal set handed over by the rules engine. Anything else is a
//! [`StrategyError::ContractViolation`], and the engine forfeits that turn
//! with a diagnostic instead of silently correcting it.

mod preset;
mod search;

pub use preset::{HeuristicStrategy, RandomStrategy};
pub use search::MonteCarloStrategy;

use crate::games::backgammon::{Board, CubeState, DiceRoll, Player, Ply};
use serde::{Deserialize, Serialize};

/// A cube decision requested from a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CubeAction {
    /// Leave the cube alone.
    NoAction,
    /// Offer a double before rolling.
    Offer,
    /// Accept the opponent's pending double.
    Accept,
    /// Decline the opponent's pending double (concede the game).
    Decline,
}

/// Context handed to a strategy for a cube decision.
#[derive(Debug, Clone, Copy)]
pub struct CubeDecisionContext<'a> {
    /// Current board snapshot.
    pub board: &'a Board,
    /// The seat deciding.
    pub player: Player,
    /// Current cube state.
    pub cube: &'a CubeState,
    /// Deciding player's match score.
    pub score_self: u32,
    /// Opponent's match score.
    pub score_opponent: u32,
    /// Points needed to win the match.
    pub target_points: u32,
    /// Whether an offer from this seat would be legal right now.
    pub may_offer: bool,
    /// Whether a double from the opponent awaits this seat's response.
    pub pending_offer: bool,
}

/// Per-candidate search statistics, recorded by the audit recorder when
/// evaluation logging is enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEvaluation {
    /// The candidate ply.
    pub ply: Ply,
    /// Number of playouts spent on this candidate.
    pub visits: u32,
    /// Estimated probability the mover wins the game.
    pub win_probability: f64,
}

/// Search-evaluation trace for one move decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EvaluationTrace {
    /// One entry per candidate ply considered.
    pub candidates: Vec<CandidateEvaluation>,
}

/// Error from a strategy decision.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum StrategyError {
    /// The strategy returned a ply that is not in the legal set. The engine
    /// forfeits the turn; the invalid ply never touches the board.
    #[display("Strategy '{}' returned a ply outside the legal set: {}", strategy, ply)]
    ContractViolation {
        /// Name of the offending strategy.
        strategy: String,
        /// The rejected ply.
        ply: Ply,
    },

    /// The strategy failed internally.
    #[display("Strategy failure: {}", _0)]
    Internal(#[error(not(source))] String),
}

/// Capability contract for an opponent seat.
#[async_trait::async_trait]
pub trait OpponentStrategy: Send {
    /// Display name (used in diagnostics and audit records).
    fn name(&self) -> &str;

    /// Chooses a ply from the legal set.
    async fn choose_move(
        &mut self,
        player: Player,
        board: &Board,
        legal: &[Ply],
        roll: &DiceRoll,
    ) -> Result<Ply, StrategyError>;

    /// Chooses a ply and, for search-based strategies, the evaluation
    /// trace behind the choice. The default forwards to [`choose_move`]
    /// with no trace.
    ///
    /// [`choose_move`]: OpponentStrategy::choose_move
    async fn choose_move_with_trace(
        &mut self,
        player: Player,
        board: &Board,
        legal: &[Ply],
        roll: &DiceRoll,
    ) -> Result<(Ply, Option<EvaluationTrace>), StrategyError> {
        let ply = self.choose_move(player, board, legal, roll).await?;
        Ok((ply, None))
    }

    /// Decides a cube action. The default never touches the cube and
    /// accepts any offer.
    async fn decide_cube_action(&mut self, ctx: &CubeDecisionContext<'_>) -> CubeAction {
        if ctx.pending_offer {
            CubeAction::Accept
        } else {
            CubeAction::NoAction
        }
    }
}

/// Difficulty presets selectable for an AI seat.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AiPreset {
    /// Uniformly random legal ply.
    Easy,
    /// Greedy: prefers hits and racing progress.
    Medium,
    /// Greedy with blot-exposure penalty.
    Hard,
    /// Monte-Carlo playout evaluation.
    Expert,
}

impl AiPreset {
    /// Builds the strategy implementation for this preset. A seed makes the
    /// strategy deterministic for tests and batch replays.
    pub fn strategy(self, seed: Option<u64>) -> Box<dyn OpponentStrategy> {
        match self {
            AiPreset::Easy => Box::new(RandomStrategy::new(seed)),
            AiPreset::Medium => Box::new(HeuristicStrategy::medium()),
            AiPreset::Hard => Box::new(HeuristicStrategy::hard()),
            AiPreset::Expert => Box::new(MonteCarloStrategy::new(seed)),
        }
    }
}
