//! Per-game state machine: Setup → Rolling → Moving → GameOver.
//!
//! The game owns the board, dice and cube for one game and enforces phase
//! transitions at runtime. Invalid submissions are rejected and the phase
//! does not advance; the caller resubmits.

use super::board::Board;
use super::cube::{CubeError, CubeRules, CubeState, DoubleResponse};
use super::dice::{DiceRoll, roll_die};
use super::moves::{IllegalMoveError, Ply};
use super::rules;
use super::types::{GamePhase, GameValue, Player};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Result of the opening roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningRoll {
    /// The decisive (non-tied) pair of single dice, White's first.
    pub dice: (u8, u8),
    /// Number of tied rolls before the decisive one.
    pub ties: u32,
    /// The player rolling first.
    pub first: Player,
}

/// Result of rolling the dice for a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnStart {
    /// At least one legal ply exists; the game is now in `Moving`.
    Playable {
        /// The roll.
        roll: DiceRoll,
        /// The complete legal-ply set.
        legal: Vec<Ply>,
    },
    /// No legal ply exists; the turn passes to the opponent immediately.
    /// This is an explicit outcome, not an error.
    Forfeited {
        /// The unplayable roll.
        roll: DiceRoll,
    },
}

/// Result of committing a ply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlyOutcome {
    /// The game continues; the opponent is now rolling.
    Continue,
    /// The moving player bore off the last checker.
    GameOver {
        /// The winner.
        winner: Player,
        /// The computed game value.
        value: GameValue,
    },
}

/// State for a single game of backgammon.
///
/// The legal-ply cache is derived from the board and roll, so it is not
/// serialized; deserialization recomputes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "GameSnapshot")]
pub struct Game {
    board: Board,
    phase: GamePhase,
    to_move: Player,
    roll: Option<DiceRoll>,
    #[serde(skip)]
    legal: Vec<Ply>,
    cube: CubeState,
    winner: Option<Player>,
    value: Option<GameValue>,
    turn: u32,
}

/// Wire form of [`Game`]: the serialized fields without the derived
/// legal-ply cache.
#[derive(Deserialize)]
struct GameSnapshot {
    board: Board,
    phase: GamePhase,
    to_move: Player,
    roll: Option<DiceRoll>,
    cube: CubeState,
    winner: Option<Player>,
    value: Option<GameValue>,
    turn: u32,
}

impl From<GameSnapshot> for Game {
    fn from(snapshot: GameSnapshot) -> Self {
        let legal = match (snapshot.phase, &snapshot.roll) {
            (GamePhase::Moving, Some(roll)) => {
                rules::legal_plys(&snapshot.board, snapshot.to_move, roll)
            }
            _ => Vec::new(),
        };
        Self {
            board: snapshot.board,
            phase: snapshot.phase,
            to_move: snapshot.to_move,
            roll: snapshot.roll,
            legal,
            cube: snapshot.cube,
            winner: snapshot.winner,
            value: snapshot.value,
            turn: snapshot.turn,
        }
    }
}

impl Game {
    /// Creates a game in `Setup` with the standard starting position.
    #[instrument]
    pub fn new() -> Self {
        Self {
            board: Board::start(),
            phase: GamePhase::Setup,
            to_move: Player::White,
            roll: None,
            legal: Vec::new(),
            cube: CubeState::new(),
            winner: None,
            value: None,
            turn: 0,
        }
    }

    /// Performs the opening roll: one die each, higher goes first, ties
    /// re-rolled. With `automatic_doubles`, each tie bumps the centered
    /// cube value. Transitions `Setup → Rolling`.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalMoveError::WrongPhase`] outside `Setup`.
    #[instrument(skip(self, rng))]
    pub fn open(
        &mut self,
        rng: &mut impl Rng,
        automatic_doubles: bool,
    ) -> Result<OpeningRoll, IllegalMoveError> {
        if self.phase != GamePhase::Setup {
            return Err(IllegalMoveError::WrongPhase(self.phase));
        }
        let mut ties = 0;
        let (white, black) = loop {
            let white = roll_die(rng);
            let black = roll_die(rng);
            if white != black {
                break (white, black);
            }
            ties += 1;
            if automatic_doubles {
                self.cube.auto_double();
                debug!(cube = self.cube.value(), "Automatic double on opening tie");
            }
        };
        let first = if white > black { Player::White } else { Player::Black };
        self.to_move = first;
        self.phase = GamePhase::Rolling;
        info!(%first, white, black, ties, "Opening roll decided");
        Ok(OpeningRoll { dice: (white, black), ties, first })
    }

    /// Rolls the dice for the current player and computes the legal-ply
    /// set. With no legal ply the turn is forfeited and the opponent is
    /// rolling next; otherwise the game enters `Moving`.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalMoveError::WrongPhase`] outside `Rolling`, or
    /// [`IllegalMoveError::CubeDecisionPending`] while a double offer is
    /// unanswered.
    #[instrument(skip(self, rng), fields(player = %self.to_move))]
    pub fn roll_dice(&mut self, rng: &mut impl Rng) -> Result<TurnStart, IllegalMoveError> {
        if self.phase != GamePhase::Rolling {
            return Err(IllegalMoveError::WrongPhase(self.phase));
        }
        if self.cube.pending_offer().is_some() {
            return Err(IllegalMoveError::CubeDecisionPending);
        }
        let roll = DiceRoll::roll(rng);
        self.turn += 1;
        let legal = rules::legal_plys(&self.board, self.to_move, &roll);
        if legal.is_empty() {
            info!(player = %self.to_move, roll = %roll, "No legal moves, turn forfeited");
            self.to_move = self.to_move.opponent();
            self.roll = None;
            return Ok(TurnStart::Forfeited { roll });
        }
        debug!(player = %self.to_move, roll = %roll, plys = legal.len(), "Dice rolled");
        self.roll = Some(roll.clone());
        self.legal = legal.clone();
        self.phase = GamePhase::Moving;
        Ok(TurnStart::Playable { roll, legal })
    }

    /// Commits a ply for the current player.
    ///
    /// The ply must match a member of the legal set (full-sequence legality
    /// including maximal dice usage). Hit flags are taken from the legal
    /// set, not from the submission.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalMoveError::NotInLegalSet`] for a ply outside the
    /// legal set; the phase does not advance.
    #[instrument(skip(self, ply), fields(player = %self.to_move, ply = %ply))]
    pub fn commit_ply(&mut self, ply: &Ply) -> Result<PlyOutcome, IllegalMoveError> {
        if self.phase != GamePhase::Moving {
            return Err(IllegalMoveError::WrongPhase(self.phase));
        }
        let Some(validated) = self.legal.iter().find(|l| l.same_sequence(ply)).cloned() else {
            warn!(player = %self.to_move, ply = %ply, "Ply rejected: not in legal set");
            return Err(IllegalMoveError::NotInLegalSet);
        };

        let mut board = self.board.clone();
        for mv in validated.moves() {
            board = board.apply_move(self.to_move, mv)?;
        }
        self.board = board;
        self.roll = None;
        self.legal.clear();

        if self.board.borne_off(self.to_move) == 15 {
            let winner = self.to_move;
            let value = game_value(&self.board, winner);
            self.winner = Some(winner);
            self.value = Some(value);
            self.phase = GamePhase::GameOver;
            info!(%winner, %value, "Game over");
            return Ok(PlyOutcome::GameOver { winner, value });
        }

        self.to_move = self.to_move.opponent();
        self.phase = GamePhase::Rolling;
        Ok(PlyOutcome::Continue)
    }

    /// Forfeits the current player's turn without moving. Used when an AI
    /// strategy violates its contract; the board is untouched.
    #[instrument(skip(self), fields(player = %self.to_move))]
    pub fn forfeit_turn(&mut self) {
        warn!(player = %self.to_move, "Turn forfeited");
        self.roll = None;
        self.legal.clear();
        self.to_move = self.to_move.opponent();
        self.phase = GamePhase::Rolling;
    }

    /// Offers a double by `by`, to be answered by the opponent.
    ///
    /// Only legal while `by` is about to roll, with the cube centered or
    /// owned by `by`, subject to the match-level [`CubeRules`].
    ///
    /// # Errors
    ///
    /// Returns the matching [`CubeError`]; the game state is unchanged.
    #[instrument(skip(self), fields(by = %by))]
    pub fn offer_double(&mut self, by: Player, rules: &CubeRules) -> Result<u32, CubeError> {
        if !rules.enabled {
            return Err(CubeError::CubeDisabled);
        }
        if rules.crawford {
            return Err(CubeError::CrawfordViolation);
        }
        if self.phase != GamePhase::Rolling || self.to_move != by {
            return Err(CubeError::TurnViolation(by));
        }
        if self.cube.pending_offer().is_some() {
            return Err(CubeError::OfferPending);
        }
        if !self.cube.may_offer(by) {
            return Err(CubeError::NotCubeHolder(by));
        }
        if self.cube.doubles_made() >= rules.max_doubles {
            return Err(CubeError::MaxDoublesExceeded(rules.max_doubles));
        }
        self.cube.set_pending(by);
        let proposed = self.cube.value() * 2;
        info!(by = %by, proposed, "Double offered");
        Ok(proposed)
    }

    /// Responds to the pending double offer.
    ///
    /// Rejection ends the game immediately: a single win for the doubler at
    /// the pre-double cube value.
    ///
    /// # Errors
    ///
    /// Returns [`CubeError::NoPendingDouble`] with no offer outstanding.
    #[instrument(skip(self))]
    pub fn respond_to_double(&mut self, accept: bool) -> Result<DoubleResponse, CubeError> {
        if self.cube.pending_offer().is_none() {
            return Err(CubeError::NoPendingDouble);
        }
        if accept {
            self.cube.accept();
            let new_value = self.cube.value();
            info!(new_value, owner = ?self.cube.owner(), "Double accepted");
            Ok(DoubleResponse::Accepted { new_value })
        } else {
            let winner = self
                .cube
                .clear_pending()
                .unwrap_or(self.to_move);
            let cube_value = self.cube.value();
            self.winner = Some(winner);
            self.value = Some(GameValue::Single);
            self.phase = GamePhase::GameOver;
            info!(%winner, cube_value, "Double rejected, game over");
            Ok(DoubleResponse::Rejected { winner, cube_value })
        }
    }

    /// Current board snapshot.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Replaces the board. Test scaffolding for mid-game positions.
    pub fn set_board(&mut self, board: Board) {
        self.board = board;
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// The player to act.
    pub fn to_move(&self) -> Player {
        self.to_move
    }

    /// The current roll, when in `Moving`.
    pub fn current_roll(&self) -> Option<&DiceRoll> {
        self.roll.as_ref()
    }

    /// The legal-ply set for the current roll, when in `Moving`.
    pub fn legal_plys(&self) -> &[Ply] {
        &self.legal
    }

    /// Cube state.
    pub fn cube(&self) -> &CubeState {
        &self.cube
    }

    /// Winner, once the game is over.
    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// Game value, once the game is over.
    pub fn game_value(&self) -> Option<GameValue> {
        self.value
    }

    /// Completed turn count.
    pub fn turn(&self) -> u32 {
        self.turn
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the game value at the end of a completed game.
///
/// GAMMON when the loser bore off nothing; BACKGAMMON when additionally a
/// losing checker sits on the bar or in the winner's home board.
pub fn game_value(board: &Board, winner: Player) -> GameValue {
    let loser = winner.opponent();
    if board.borne_off(loser) > 0 {
        return GameValue::Single;
    }
    let in_winner_home = winner
        .home_range()
        .any(|p| board.point(p).owner == Some(loser));
    if board.checkers_on_bar(loser) > 0 || in_winner_home {
        GameValue::Backgammon
    } else {
        GameValue::Gammon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn opening_roll_transitions_to_rolling() {
        let mut game = Game::new();
        let mut rng = StdRng::seed_from_u64(7);
        let opening = game.open(&mut rng, false).unwrap();
        assert_eq!(game.phase(), GamePhase::Rolling);
        assert_eq!(game.to_move(), opening.first);
        assert_ne!(opening.dice.0, opening.dice.1);
    }

    #[test]
    fn commit_rejects_ply_outside_legal_set() {
        let mut game = Game::new();
        let mut rng = StdRng::seed_from_u64(7);
        game.open(&mut rng, false).unwrap();
        let start = match game.roll_dice(&mut rng).unwrap() {
            TurnStart::Playable { legal, .. } => legal,
            TurnStart::Forfeited { .. } => return,
        };
        let bogus = Ply::new(vec![crate::games::backgammon::CheckerMove::new(
            crate::games::backgammon::Location::Point(12),
            crate::games::backgammon::Location::Point(0),
            6,
            false,
        )]);
        assert!(!start.iter().any(|p| p.same_sequence(&bogus)));
        let before = game.board().clone();
        assert_eq!(game.commit_ply(&bogus), Err(IllegalMoveError::NotInLegalSet));
        assert_eq!(game.board(), &before);
        assert_eq!(game.phase(), GamePhase::Moving);
    }

    #[test]
    fn deserialized_game_recomputes_legal_plys() {
        let mut game = Game::new();
        let mut rng = StdRng::seed_from_u64(7);
        game.open(&mut rng, false).unwrap();
        let legal = match game.roll_dice(&mut rng).unwrap() {
            TurnStart::Playable { legal, .. } => legal,
            TurnStart::Forfeited { .. } => return,
        };

        let json = serde_json::to_string(&game).unwrap();
        let mut restored: Game = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.phase(), GamePhase::Moving);
        assert_eq!(restored.legal_plys(), game.legal_plys());
        restored.commit_ply(&legal[0]).unwrap();
    }

    #[test]
    fn gammon_when_loser_bore_off_nothing() {
        let mut board = Board::empty();
        board.set_off(Player::White, 15);
        board.set_point(10, Player::Black, 15);
        assert_eq!(game_value(&board, Player::White), GameValue::Gammon);
    }

    #[test]
    fn backgammon_when_loser_left_in_winner_home() {
        let mut board = Board::empty();
        board.set_off(Player::White, 15);
        board.set_point(2, Player::Black, 15);
        assert_eq!(game_value(&board, Player::White), GameValue::Backgammon);
    }
}
