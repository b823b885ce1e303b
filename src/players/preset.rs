//! Heuristic preset strategies.

use super::{CubeAction, CubeDecisionContext, OpponentStrategy, StrategyError};
use crate::games::backgammon::{Board, DiceRoll, Player, Ply};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Picks a uniformly random legal ply. The `easy` preset.
pub struct RandomStrategy {
    name: String,
    rng: StdRng,
}

impl RandomStrategy {
    /// Creates a random strategy, seeded for determinism when given.
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            name: "random".to_string(),
            rng: seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64),
        }
    }
}

#[async_trait::async_trait]
impl OpponentStrategy for RandomStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn choose_move(
        &mut self,
        _player: Player,
        _board: &Board,
        legal: &[Ply],
        _roll: &DiceRoll,
    ) -> Result<Ply, StrategyError> {
        if legal.is_empty() {
            return Err(StrategyError::Internal("empty legal set".to_string()));
        }
        let pick = self.rng.gen_range(0..legal.len());
        debug!(strategy = %self.name, pick, of = legal.len(), "Random ply chosen");
        Ok(legal[pick].clone())
    }
}

/// Greedy single-ply evaluation. The `medium` and `hard` presets share the
/// scoring function; `hard` additionally penalizes blots it leaves behind.
pub struct HeuristicStrategy {
    name: String,
    blot_penalty: f64,
}

impl HeuristicStrategy {
    /// The `medium` preset: hits and racing progress, no safety term.
    pub fn medium() -> Self {
        Self {
            name: "greedy".to_string(),
            blot_penalty: 0.0,
        }
    }

    /// The `hard` preset: greedy with blot-exposure penalty.
    pub fn hard() -> Self {
        Self {
            name: "greedy-safe".to_string(),
            blot_penalty: 4.0,
        }
    }

    fn score(&self, player: Player, before: &Board, ply: &Ply) -> f64 {
        let Some(after) = apply_ply(before, player, ply) else {
            return f64::MIN;
        };
        let opponent = player.opponent();

        // Hits show up as opponent pip gain (checker sent to the bar).
        let opp_setback =
            f64::from(after.pip_count(opponent)) - f64::from(before.pip_count(opponent));
        let own_progress =
            f64::from(before.pip_count(player)) - f64::from(after.pip_count(player));
        let born_off = f64::from(after.borne_off(player) - before.borne_off(player));
        let blots = after.blots(player).len() as f64;

        opp_setback + 0.25 * own_progress + 2.0 * born_off - self.blot_penalty * blots
    }
}

#[async_trait::async_trait]
impl OpponentStrategy for HeuristicStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn choose_move(
        &mut self,
        player: Player,
        board: &Board,
        legal: &[Ply],
        _roll: &DiceRoll,
    ) -> Result<Ply, StrategyError> {
        legal
            .iter()
            .max_by(|a, b| {
                self.score(player, board, a)
                    .total_cmp(&self.score(player, board, b))
            })
            .cloned()
            .ok_or_else(|| StrategyError::Internal("empty legal set".to_string()))
    }

    async fn decide_cube_action(&mut self, ctx: &CubeDecisionContext<'_>) -> CubeAction {
        pip_cube_policy(ctx)
    }
}

/// Applies a ply to a board snapshot; `None` if any move fails (indicates a
/// ply generated for a different position).
pub(crate) fn apply_ply(board: &Board, player: Player, ply: &Ply) -> Option<Board> {
    let mut next = board.clone();
    for mv in ply.moves() {
        next = next.apply_move(player, mv).ok()?;
    }
    Some(next)
}

/// Shared pip-count cube policy: double with a clear racing lead, take
/// unless well behind.
pub(crate) fn pip_cube_policy(ctx: &CubeDecisionContext<'_>) -> CubeAction {
    let own = f64::from(ctx.board.pip_count(ctx.player));
    let opp = f64::from(ctx.board.pip_count(ctx.player.opponent()));

    if ctx.pending_offer {
        // Take unless trailing by more than a quarter of the race.
        return if own <= opp * 1.25 {
            CubeAction::Accept
        } else {
            CubeAction::Decline
        };
    }
    if ctx.may_offer && own * 1.15 < opp {
        return CubeAction::Offer;
    }
    CubeAction::NoAction
}
