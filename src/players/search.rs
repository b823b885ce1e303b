//! Monte-Carlo playout strategy. The `expert` preset.
//!
//! Flat search: each candidate ply gets a fixed budget of random playouts
//! to the end of the game, and the candidate with the best estimated win
//! probability is chosen. The per-candidate visit counts and estimates form
//! the [`EvaluationTrace`] consumed by the audit recorder.

use super::{
    CandidateEvaluation, CubeAction, CubeDecisionContext, EvaluationTrace, OpponentStrategy,
    StrategyError,
};
use crate::games::backgammon::{Board, DiceRoll, Player, Ply, rules};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Monte-Carlo playout evaluation of candidate plies.
pub struct MonteCarloStrategy {
    name: String,
    rollouts_per_candidate: u32,
    max_half_turns: u32,
    rng: StdRng,
}

impl MonteCarloStrategy {
    /// Creates the strategy with the default playout budget (sized for the
    /// ~1 second per-move envelope). A seed makes it deterministic.
    pub fn new(seed: Option<u64>) -> Self {
        Self::with_rollouts(seed, 24)
    }

    /// Creates the strategy with an explicit per-candidate playout budget.
    pub fn with_rollouts(seed: Option<u64>, rollouts_per_candidate: u32) -> Self {
        Self {
            name: "monte-carlo".to_string(),
            rollouts_per_candidate: rollouts_per_candidate.max(1),
            max_half_turns: 400,
            rng: seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64),
        }
    }

    /// Random playout from `board` with `to_move` to act, scored for `me`.
    /// Returns 1.0/0.0 on an actual win/loss, or a pip-count comparison if
    /// the turn cap is hit first.
    fn playout(&mut self, mut board: Board, mut to_move: Player, me: Player) -> f64 {
        for _ in 0..self.max_half_turns {
            let roll = DiceRoll::roll(&mut self.rng);
            let legal = rules::legal_plys(&board, to_move, &roll);
            if !legal.is_empty() {
                let ply = &legal[self.rng.gen_range(0..legal.len())];
                if let Some(next) = super::preset::apply_ply(&board, to_move, ply) {
                    board = next;
                }
                if board.borne_off(to_move) == 15 {
                    return if to_move == me { 1.0 } else { 0.0 };
                }
            }
            to_move = to_move.opponent();
        }
        // Truncated playout: fall back to the race.
        if board.pip_count(me) <= board.pip_count(me.opponent()) {
            0.5
        } else {
            0.25
        }
    }
}

#[async_trait::async_trait]
impl OpponentStrategy for MonteCarloStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn choose_move(
        &mut self,
        player: Player,
        board: &Board,
        legal: &[Ply],
        roll: &DiceRoll,
    ) -> Result<Ply, StrategyError> {
        let (ply, _) = self
            .choose_move_with_trace(player, board, legal, roll)
            .await?;
        Ok(ply)
    }

    async fn choose_move_with_trace(
        &mut self,
        player: Player,
        board: &Board,
        legal: &[Ply],
        _roll: &DiceRoll,
    ) -> Result<(Ply, Option<EvaluationTrace>), StrategyError> {
        if legal.is_empty() {
            return Err(StrategyError::Internal("empty legal set".to_string()));
        }

        let mut candidates = Vec::with_capacity(legal.len());
        for ply in legal {
            let Some(after) = super::preset::apply_ply(board, player, ply) else {
                return Err(StrategyError::Internal(format!(
                    "legal ply failed to apply: {ply}"
                )));
            };
            if after.borne_off(player) == 15 {
                // Immediate win needs no playouts.
                candidates.push(CandidateEvaluation {
                    ply: ply.clone(),
                    visits: 0,
                    win_probability: 1.0,
                });
                continue;
            }
            let mut wins = 0.0;
            for _ in 0..self.rollouts_per_candidate {
                wins += self.playout(after.clone(), player.opponent(), player);
            }
            candidates.push(CandidateEvaluation {
                ply: ply.clone(),
                visits: self.rollouts_per_candidate,
                win_probability: wins / f64::from(self.rollouts_per_candidate),
            });
        }

        let best = candidates
            .iter()
            .max_by(|a, b| a.win_probability.total_cmp(&b.win_probability))
            .cloned()
            .ok_or_else(|| StrategyError::Internal("no candidates evaluated".to_string()))?;

        debug!(
            strategy = %self.name,
            candidates = candidates.len(),
            win_probability = best.win_probability,
            "Search complete"
        );
        Ok((best.ply, Some(EvaluationTrace { candidates })))
    }

    async fn decide_cube_action(&mut self, ctx: &CubeDecisionContext<'_>) -> CubeAction {
        super::preset::pip_cube_policy(ctx)
    }
}
