//! Match configuration, score keeping and game settlement.
//!
//! [`MatchState`] is owned by the match controller and mutated only at
//! game-end boundaries. The rules engine never touches it.

use crate::games::backgammon::{CubeState, GameValue, Player};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Configuration for a match (or single-game session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct MatchConfiguration {
    /// False for a single-game session (target coerced to 1, cube and
    /// Crawford disabled).
    match_enabled: bool,
    /// Points needed to win the match.
    target_points: u32,
    /// Whether the doubling cube is in play.
    doubling_cube_enabled: bool,
    /// Jacoby rule: gammon/backgammon bonuses require a turned cube.
    use_jacoby_rule: bool,
    /// Automatic doubles on opening-roll ties.
    automatic_doubles: bool,
    /// Crawford rule: no doubling for one game after a player reaches
    /// target − 1.
    use_crawford_rule: bool,
    /// Cap on accepted doubles per game.
    max_doubles: u32,
}

impl MatchConfiguration {
    /// A match to `target_points` with standard rules (cube and Crawford
    /// on, Jacoby and automatic doubles off).
    pub fn match_to(target_points: u32) -> Self {
        Self {
            match_enabled: true,
            target_points: target_points.max(1),
            doubling_cube_enabled: true,
            use_jacoby_rule: false,
            automatic_doubles: false,
            use_crawford_rule: true,
            max_doubles: 8,
        }
    }

    /// A single-game session: one point, cube and Crawford disabled.
    pub fn single_game() -> Self {
        Self {
            match_enabled: false,
            target_points: 1,
            doubling_cube_enabled: false,
            use_jacoby_rule: false,
            automatic_doubles: false,
            use_crawford_rule: false,
            max_doubles: 0,
        }
    }

    /// Normalizes the configuration: single-game sessions are coerced to
    /// one point with cube and Crawford rules off.
    pub fn normalized(mut self) -> Self {
        if !self.match_enabled {
            self.target_points = 1;
            self.doubling_cube_enabled = false;
            self.use_crawford_rule = false;
            self.automatic_doubles = false;
        }
        self
    }

    /// Enables or disables the doubling cube.
    pub fn with_cube(mut self, enabled: bool) -> Self {
        self.doubling_cube_enabled = enabled;
        self
    }

    /// Enables or disables the Jacoby rule.
    pub fn with_jacoby(mut self, enabled: bool) -> Self {
        self.use_jacoby_rule = enabled;
        self
    }

    /// Enables or disables automatic doubles.
    pub fn with_automatic_doubles(mut self, enabled: bool) -> Self {
        self.automatic_doubles = enabled;
        self
    }

    /// Enables or disables the Crawford rule.
    pub fn with_crawford(mut self, enabled: bool) -> Self {
        self.use_crawford_rule = enabled;
        self
    }

    /// Sets the per-game cap on doubles.
    pub fn with_max_doubles(mut self, max: u32) -> Self {
        self.max_doubles = max;
        self
    }
}

impl Default for MatchConfiguration {
    fn default() -> Self {
        Self::match_to(7)
    }
}

/// Record of a completed game within a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Getters, derive_new::new)]
pub struct GameRecord {
    /// Who won the game.
    winner: Player,
    /// The game value the game settled at.
    value: GameValue,
    /// Cube value at game end.
    cube_value: u32,
    /// Points awarded (`value × cube`, after Jacoby adjustment).
    points: u32,
}

/// Score and history for a match in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct MatchState {
    /// Points per player, indexed White then Black.
    scores: [u32; 2],
    /// Completed games in order.
    game_history: Vec<GameRecord>,
    /// Whether the upcoming/current game is the Crawford game.
    is_crawford_game: bool,
    /// Whether the Crawford game has already been played.
    crawford_played: bool,
    /// The match winner, once decided.
    match_winner: Option<Player>,
    /// The (normalized) configuration.
    configuration: MatchConfiguration,
}

impl MatchState {
    /// Creates a fresh match state from a configuration.
    pub fn new(configuration: MatchConfiguration) -> Self {
        Self {
            scores: [0, 0],
            game_history: Vec::new(),
            is_crawford_game: false,
            crawford_played: false,
            match_winner: None,
            configuration: configuration.normalized(),
        }
    }

    /// Score for one player.
    pub fn score(&self, player: Player) -> u32 {
        self.scores[player.index()]
    }

    /// Cube gating for the current game, derived from configuration and
    /// Crawford status.
    pub fn cube_rules(&self) -> crate::games::backgammon::CubeRules {
        crate::games::backgammon::CubeRules::new(
            *self.configuration.doubling_cube_enabled(),
            self.is_crawford_game,
            *self.configuration.max_doubles(),
        )
    }

    /// True when an opening-roll tie should bump the centered cube: needs
    /// automatic doubles and a live cube, and never applies during the
    /// Crawford game.
    pub fn automatic_doubles_active(&self) -> bool {
        *self.configuration.automatic_doubles()
            && *self.configuration.doubling_cube_enabled()
            && !self.is_crawford_game
    }

    /// Settles a finished game: awards `value × cube` points (Jacoby may
    /// demote to single), appends the history record, recomputes Crawford
    /// status and the match winner.
    ///
    /// The Crawford game is exactly the first game after either side
    /// reaches `target − 1`.
    #[instrument(skip(self, cube), fields(winner = %winner, value = %value))]
    pub fn settle_game(&mut self, winner: Player, value: GameValue, cube: &CubeState) -> GameRecord {
        let effective = if *self.configuration.use_jacoby_rule() && cube.doubles_made() == 0 {
            GameValue::Single
        } else {
            value
        };
        let points = effective.multiplier() * cube.value();
        self.scores[winner.index()] += points;

        let record = GameRecord::new(winner, effective, cube.value(), points);
        self.game_history.push(record);

        if self.score(winner) >= *self.configuration.target_points() {
            self.match_winner = Some(winner);
        }

        // Crawford bookkeeping for the next game.
        if self.is_crawford_game {
            self.is_crawford_game = false;
            self.crawford_played = true;
        } else if *self.configuration.use_crawford_rule()
            && self.match_winner.is_none()
            && !self.crawford_played
        {
            let target = *self.configuration.target_points();
            self.is_crawford_game =
                self.scores.iter().any(|&s| s + 1 == target);
        }

        info!(
            winner = %winner,
            points,
            white = self.scores[0],
            black = self.scores[1],
            crawford_next = self.is_crawford_game,
            "Game settled"
        );
        record
    }
}
