//! Match orchestration: drives games to completion, scores them, and
//! requests decisions from AI seats.
//!
//! The controller is the only writer of [`MatchState`]; the rules engine
//! only returns terminal results for the controller to settle. Every state
//! transition emits an [`EngineEvent`] consumed by the renderer and the
//! audit recorder; the engine never depends on its consumers.

use crate::audit::AuditRecorder;
use crate::games::backgammon::{
    Board, CubeError, DiceRoll, Game, GamePhase, GameValue, IllegalMoveError, OpeningRoll, Player,
    Ply, PlyOutcome, TurnStart,
};
use crate::matches::{MatchConfiguration, MatchState};
use crate::players::{
    AiPreset, CubeAction, CubeDecisionContext, EvaluationTrace, OpponentStrategy, StrategyError,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Who committed a ply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    /// A human seat.
    Human,
    /// An AI seat with its preset label.
    Ai {
        /// The preset identifier (e.g. "expert").
        preset: String,
    },
}

/// Ordered event stream emitted by the engine after each state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A match began.
    MatchStarted {
        /// The normalized configuration in force.
        configuration: MatchConfiguration,
    },
    /// A game began with its opening roll.
    GameStarted {
        /// 1-based game number within the match.
        game_number: u32,
        /// Opening roll outcome.
        opening: OpeningRoll,
        /// Whether this is the Crawford game.
        crawford: bool,
    },
    /// Dice were rolled and at least one legal ply exists.
    DiceRolled {
        /// The roller.
        player: Player,
        /// The roll.
        roll: DiceRoll,
    },
    /// Dice were rolled but no legal ply exists; the turn is forfeit.
    /// An explicit outcome, not an error.
    NoLegalMoves {
        /// The unlucky roller.
        player: Player,
        /// The unplayable roll.
        roll: DiceRoll,
    },
    /// A ply was committed.
    PlyApplied {
        /// The mover.
        player: Player,
        /// The committed ply (hit flags validated by the engine).
        ply: Ply,
        /// Board snapshot after the ply.
        board: Board,
        /// Who moved.
        actor: Actor,
    },
    /// A double was offered.
    CubeOffered {
        /// The offering player.
        by: Player,
        /// The value play would continue at if accepted.
        proposed_value: u32,
    },
    /// The pending double was accepted.
    CubeAccepted {
        /// The new cube owner (the accepter).
        owner: Player,
        /// The doubled cube value.
        value: u32,
    },
    /// The pending double was declined, ending the game.
    CubeRejected {
        /// The player who declined.
        by: Player,
        /// The doubler, who wins at the pre-double value.
        winner: Player,
    },
    /// An AI strategy violated its contract; its turn was forfeited.
    StrategyFault {
        /// The offending seat.
        player: Player,
        /// Diagnostic detail.
        detail: String,
    },
    /// A game ended and was settled.
    GameOver {
        /// The winner.
        winner: Player,
        /// The settled game value (after Jacoby adjustment).
        value: GameValue,
        /// Points awarded (value × cube).
        points: u32,
    },
    /// The match ended.
    MatchOver {
        /// The match winner.
        winner: Player,
        /// Final scores, White then Black.
        scores: [u32; 2],
    },
}

/// Controller-level error.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum MatchError {
    /// A move submission was rejected. Recoverable; resubmit.
    #[display("Illegal move: {}", _0)]
    IllegalMove(IllegalMoveError),

    /// A cube action was rejected. Recoverable; state unchanged.
    #[display("Cube action rejected: {}", _0)]
    Cube(CubeError),

    /// A strategy failed internally.
    #[display("Strategy error: {}", _0)]
    Strategy(StrategyError),

    /// An AI decision outran the timeout. The turn is not forfeited; the
    /// caller may extend the wait and retry.
    #[from(ignore)]
    #[display("AI for {} stalled past the decision timeout", _0)]
    StrategyStalled(#[error(not(source))] Player),

    /// No game is active; call `start_next_game` first.
    #[display("No game is active")]
    NoActiveGame,

    /// The match already has a winner.
    #[display("The match is already decided")]
    MatchFinished,

    /// An AI-driven operation was requested for a seat with no strategy.
    #[from(ignore)]
    #[display("No strategy configured for {}", _0)]
    MissingStrategy(#[error(not(source))] Player),
}

/// Orchestrates a sequence of games into a match.
pub struct MatchController {
    match_state: MatchState,
    game: Option<Game>,
    strategies: [Option<Box<dyn OpponentStrategy>>; 2],
    presets: [Option<AiPreset>; 2],
    event_tx: Option<mpsc::UnboundedSender<EngineEvent>>,
    recorder: Option<AuditRecorder>,
    rng: StdRng,
    decision_timeout: Duration,
    game_number: u32,
}

impl MatchController {
    /// Creates a controller for the given configuration. Single-game
    /// sessions are normalized (one point, cube and Crawford off).
    #[instrument(skip(configuration))]
    pub fn new(configuration: MatchConfiguration) -> Self {
        info!(?configuration, "Creating match controller");
        Self {
            match_state: MatchState::new(configuration),
            game: None,
            strategies: [None, None],
            presets: [None, None],
            event_tx: None,
            recorder: None,
            rng: StdRng::from_entropy(),
            decision_timeout: Duration::from_secs(5),
            game_number: 0,
        }
    }

    /// Attaches the event channel consumed by the renderer/recorder side.
    pub fn with_event_channel(mut self, tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Seats an AI preset for a player.
    pub fn with_ai_seat(mut self, player: Player, preset: AiPreset, seed: Option<u64>) -> Self {
        self.strategies[player.index()] = Some(preset.strategy(seed));
        self.presets[player.index()] = Some(preset);
        self
    }

    /// Seats a custom strategy implementation for a player.
    pub fn with_strategy(mut self, player: Player, strategy: Box<dyn OpponentStrategy>) -> Self {
        self.strategies[player.index()] = Some(strategy);
        self
    }

    /// Attaches an audit recorder.
    pub fn with_recorder(mut self, recorder: AuditRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Seeds the dice RNG for deterministic games.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Sets the budget for a single AI decision.
    pub fn with_decision_timeout(mut self, timeout: Duration) -> Self {
        self.decision_timeout = timeout;
        self
    }

    /// Read-only projection of the match state.
    pub fn match_state(&self) -> &MatchState {
        &self.match_state
    }

    /// The active game, if any.
    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    /// Announces the match start. Call once before the first game.
    #[instrument(skip(self))]
    pub fn start_match(&mut self) {
        let configuration = *self.match_state.configuration();
        self.emit(EngineEvent::MatchStarted { configuration }, None);
    }

    /// Starts the next game: fresh board, opening roll, cube re-centered.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MatchFinished`] once the match has a winner.
    #[instrument(skip(self))]
    pub fn start_next_game(&mut self) -> Result<(), MatchError> {
        if self.match_state.match_winner().is_some() {
            return Err(MatchError::MatchFinished);
        }
        let mut game = Game::new();
        let auto = self.match_state.automatic_doubles_active();
        let opening = game.open(&mut self.rng, auto)?;
        self.game_number += 1;
        self.game = Some(game);
        let crawford = *self.match_state.is_crawford_game();
        info!(game_number = self.game_number, first = %opening.first, crawford, "Game started");
        self.emit(
            EngineEvent::GameStarted {
                game_number: self.game_number,
                opening,
                crawford,
            },
            None,
        );
        Ok(())
    }

    /// Abandons the current game without scoring it.
    #[instrument(skip(self))]
    pub fn reset_game(&mut self) {
        if self.game.take().is_some() {
            info!("Game abandoned");
        }
    }

    /// Abandons the match: discards any active game and closes the audit
    /// session so its sink receives the completion record. No points are
    /// awarded; completion is idempotent.
    #[instrument(skip(self))]
    pub fn abandon_match(&mut self) {
        self.reset_game();
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.complete();
        }
        info!("Match abandoned");
    }

    /// Rolls dice for the player to move. Interactive surface; `run_match`
    /// rolls internally for AI-vs-AI play.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::NoActiveGame`] without a game, or forwards the
    /// phase error from the rules engine.
    pub fn roll_dice(&mut self) -> Result<TurnStart, MatchError> {
        let game = self.game.as_mut().ok_or(MatchError::NoActiveGame)?;
        let player = game.to_move();
        let start = game.roll_dice(&mut self.rng)?;
        match &start {
            TurnStart::Playable { roll, .. } => {
                let roll = roll.clone();
                self.emit(EngineEvent::DiceRolled { player, roll }, None);
            }
            TurnStart::Forfeited { roll } => {
                let roll = roll.clone();
                self.emit(EngineEvent::NoLegalMoves { player, roll }, None);
            }
        }
        Ok(start)
    }

    /// The legal-ply set for the current roll.
    pub fn legal_plys(&self) -> &[Ply] {
        self.game.as_ref().map_or(&[], Game::legal_plys)
    }

    /// Commits a ply for the player to move, settling the game if it ends.
    ///
    /// # Errors
    ///
    /// Forwards [`IllegalMoveError`] from the rules engine; the phase does
    /// not advance on rejection.
    #[instrument(skip(self, ply), fields(ply = %ply))]
    pub fn apply_ply(&mut self, ply: &Ply, actor: Actor) -> Result<PlyOutcome, MatchError> {
        let game = self.game.as_mut().ok_or(MatchError::NoActiveGame)?;
        let player = game.to_move();
        let outcome = game.commit_ply(ply)?;
        let board = game.board().clone();
        let committed = ply.clone();
        self.emit(
            EngineEvent::PlyApplied {
                player,
                ply: committed,
                board,
                actor,
            },
            None,
        );
        if let PlyOutcome::GameOver { .. } = outcome {
            self.settle_finished_game()?;
        }
        Ok(outcome)
    }

    /// Offers a double on behalf of `by`.
    ///
    /// # Errors
    ///
    /// Forwards [`CubeError`] from the rules engine; state unchanged.
    #[instrument(skip(self))]
    pub fn offer_double(&mut self, by: Player) -> Result<u32, MatchError> {
        let rules = self.match_state.cube_rules();
        let game = self.game.as_mut().ok_or(MatchError::NoActiveGame)?;
        let proposed = game.offer_double(by, &rules)?;
        self.emit(
            EngineEvent::CubeOffered {
                by,
                proposed_value: proposed,
            },
            None,
        );
        Ok(proposed)
    }

    /// Responds to the pending double. Rejection settles the game
    /// immediately for the doubler.
    ///
    /// # Errors
    ///
    /// Returns [`CubeError::NoPendingDouble`] via [`MatchError::Cube`] when
    /// nothing is pending.
    #[instrument(skip(self))]
    pub fn respond_to_double(&mut self, accept: bool) -> Result<(), MatchError> {
        let game = self.game.as_mut().ok_or(MatchError::NoActiveGame)?;
        let responder = game
            .cube()
            .pending_offer()
            .map(Player::opponent)
            .ok_or(MatchError::Cube(CubeError::NoPendingDouble))?;
        match game.respond_to_double(accept)? {
            crate::games::backgammon::DoubleResponse::Accepted { new_value } => {
                self.emit(
                    EngineEvent::CubeAccepted {
                        owner: responder,
                        value: new_value,
                    },
                    None,
                );
            }
            crate::games::backgammon::DoubleResponse::Rejected { winner, .. } => {
                self.emit(
                    EngineEvent::CubeRejected {
                        by: responder,
                        winner,
                    },
                    None,
                );
                self.settle_finished_game()?;
            }
        }
        Ok(())
    }

    /// Runs an AI-vs-AI match to completion and returns the winner.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MissingStrategy`] unless both seats have
    /// strategies, or [`MatchError::StrategyStalled`] if a decision outruns
    /// the timeout.
    #[instrument(skip(self))]
    pub async fn run_match(&mut self) -> Result<Player, MatchError> {
        for player in [Player::White, Player::Black] {
            if self.strategies[player.index()].is_none() {
                return Err(MatchError::MissingStrategy(player));
            }
        }
        self.start_match();
        loop {
            self.start_next_game()?;
            self.run_game().await?;
            if let Some(winner) = *self.match_state.match_winner() {
                return Ok(winner);
            }
        }
    }

    /// Plays the current game to its end with both seats AI-driven.
    async fn run_game(&mut self) -> Result<(), MatchError> {
        loop {
            // Settlement clears the game slot; an empty slot means done.
            let (phase, player) = match self.game.as_ref() {
                None => return Ok(()),
                Some(game) => (game.phase(), game.to_move()),
            };
            match phase {
                GamePhase::GameOver => return Ok(()),
                GamePhase::Setup => return Err(MatchError::NoActiveGame),
                GamePhase::Rolling => {
                    if self.maybe_run_cube_exchange(player).await? {
                        // Game ended on a rejected double.
                        return Ok(());
                    }
                    self.roll_dice()?;
                }
                GamePhase::Moving => {
                    self.run_ai_move(player).await?;
                }
            }
        }
    }

    /// Lets the roller consider a double and, if offered, lets the opponent
    /// answer. Returns true when the game ended on a rejection.
    async fn maybe_run_cube_exchange(&mut self, player: Player) -> Result<bool, MatchError> {
        let rules = self.match_state.cube_rules();
        let may_offer = {
            let game = self.game.as_ref().ok_or(MatchError::NoActiveGame)?;
            rules.enabled
                && !rules.crawford
                && game.cube().pending_offer().is_none()
                && game.cube().may_offer(player)
                && game.cube().doubles_made() < rules.max_doubles
        };
        if !may_offer {
            return Ok(false);
        }

        let action = self.ask_cube_action(player, false).await?;
        if action != CubeAction::Offer {
            return Ok(false);
        }
        self.offer_double(player)?;

        let response = self.ask_cube_action(player.opponent(), true).await?;
        let accept = response != CubeAction::Decline;
        self.respond_to_double(accept)?;
        // A rejection settles and clears the game slot.
        let over = self
            .game
            .as_ref()
            .is_none_or(|g| g.phase() == GamePhase::GameOver);
        Ok(over)
    }

    /// Requests a cube decision from the seat's strategy, with timeout.
    async fn ask_cube_action(
        &mut self,
        player: Player,
        pending_offer: bool,
    ) -> Result<CubeAction, MatchError> {
        let (board, cube) = {
            let game = self.game.as_ref().ok_or(MatchError::NoActiveGame)?;
            (game.board().clone(), game.cube().clone())
        };
        let score_self = self.match_state.score(player);
        let score_opponent = self.match_state.score(player.opponent());
        let target_points = *self.match_state.configuration().target_points();
        let rules = self.match_state.cube_rules();
        let may_offer = !pending_offer
            && rules.enabled
            && !rules.crawford
            && cube.may_offer(player)
            && cube.doubles_made() < rules.max_doubles;
        let timeout = self.decision_timeout;

        let strategy = self.strategies[player.index()]
            .as_mut()
            .ok_or(MatchError::MissingStrategy(player))?;
        let ctx = CubeDecisionContext {
            board: &board,
            player,
            cube: &cube,
            score_self,
            score_opponent,
            target_points,
            may_offer,
            pending_offer,
        };
        match tokio::time::timeout(timeout, strategy.decide_cube_action(&ctx)).await {
            Ok(action) => Ok(action),
            Err(_) => {
                warn!(player = %player, "Cube decision timed out");
                Err(MatchError::StrategyStalled(player))
            }
        }
    }

    /// Requests and commits one AI move, forfeiting the turn on a contract
    /// violation.
    async fn run_ai_move(&mut self, player: Player) -> Result<(), MatchError> {
        let (board, roll, legal) = {
            let game = self.game.as_ref().ok_or(MatchError::NoActiveGame)?;
            let roll = game
                .current_roll()
                .cloned()
                .ok_or(MatchError::IllegalMove(IllegalMoveError::WrongPhase(
                    game.phase(),
                )))?;
            (game.board().clone(), roll, game.legal_plys().to_vec())
        };
        let want_trace = self
            .recorder
            .as_ref()
            .is_some_and(AuditRecorder::evaluation_logging);
        let timeout = self.decision_timeout;

        let strategy = self.strategies[player.index()]
            .as_mut()
            .ok_or(MatchError::MissingStrategy(player))?;
        let decision = if want_trace {
            tokio::time::timeout(
                timeout,
                strategy.choose_move_with_trace(player, &board, &legal, &roll),
            )
            .await
        } else {
            tokio::time::timeout(timeout, strategy.choose_move(player, &board, &legal, &roll))
                .await
                .map(|r| r.map(|ply| (ply, None)))
        };
        let strategy_name = strategy.name().to_string();

        let (ply, trace) = match decision {
            Err(_) => {
                warn!(player = %player, strategy = %strategy_name, "Move decision timed out");
                return Err(MatchError::StrategyStalled(player));
            }
            Ok(Err(err)) => return Err(MatchError::Strategy(err)),
            Ok(Ok(choice)) => choice,
        };

        if !legal.iter().any(|l| l.same_sequence(&ply)) {
            let fault = StrategyError::ContractViolation {
                strategy: strategy_name,
                ply: ply.clone(),
            };
            warn!(player = %player, %fault, "Contract violation, forfeiting turn");
            self.emit(
                EngineEvent::StrategyFault {
                    player,
                    detail: fault.to_string(),
                },
                None,
            );
            if let Some(game) = self.game.as_mut() {
                game.forfeit_turn();
            }
            return Ok(());
        }

        let actor = self.actor_for(player);
        let game = self.game.as_mut().ok_or(MatchError::NoActiveGame)?;
        let outcome = game.commit_ply(&ply)?;
        let board = game.board().clone();
        self.emit(
            EngineEvent::PlyApplied {
                player,
                ply,
                board,
                actor,
            },
            trace,
        );
        if let PlyOutcome::GameOver { .. } = outcome {
            self.settle_finished_game()?;
        }
        Ok(())
    }

    /// Settles the finished game into the match state and emits the
    /// game-over (and possibly match-over) events.
    fn settle_finished_game(&mut self) -> Result<(), MatchError> {
        let (winner, value, cube) = {
            let game = self.game.as_ref().ok_or(MatchError::NoActiveGame)?;
            debug_assert_eq!(game.phase(), GamePhase::GameOver);
            let winner = game.winner().ok_or(MatchError::NoActiveGame)?;
            let value = game.game_value().unwrap_or(GameValue::Single);
            (winner, value, game.cube().clone())
        };
        let record = self.match_state.settle_game(winner, value, &cube);
        self.emit(
            EngineEvent::GameOver {
                winner,
                value: *record.value(),
                points: *record.points(),
            },
            None,
        );
        self.game = None;
        if let Some(match_winner) = *self.match_state.match_winner() {
            let scores = *self.match_state.scores();
            info!(winner = %match_winner, ?scores, "Match over");
            self.emit(
                EngineEvent::MatchOver {
                    winner: match_winner,
                    scores,
                },
                None,
            );
            if let Some(recorder) = self.recorder.as_mut() {
                recorder.complete();
            }
        }
        Ok(())
    }

    fn actor_for(&self, player: Player) -> Actor {
        match self.presets[player.index()] {
            Some(preset) => Actor::Ai {
                preset: preset.to_string(),
            },
            None if self.strategies[player.index()].is_some() => Actor::Ai {
                preset: "custom".to_string(),
            },
            None => Actor::Human,
        }
    }

    /// Forwards an event to the recorder and the UI channel. Both are
    /// fire-and-forget: a dropped receiver never stalls the engine.
    fn emit(&mut self, event: EngineEvent, trace: Option<EvaluationTrace>) {
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.record(&event, trace);
        }
        if let Some(tx) = &self.event_tx {
            if tx.send(event).is_err() {
                debug!("Event receiver dropped; continuing without UI consumer");
            }
        }
    }
}
