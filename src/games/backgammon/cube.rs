//! Doubling cube state and offer/response rules.

use super::types::Player;
use serde::{Deserialize, Serialize};

/// State of the doubling cube within one game.
///
/// The cube starts centered at 1. A double transfers ownership to the
/// accepter, who alone may redouble. `doubles_made` counts accepted offers;
/// automatic (opening-tie) doubles bump the value without counting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeState {
    value: u32,
    owner: Option<Player>,
    doubles_made: u32,
    pending: Option<Player>,
}

impl CubeState {
    /// Creates a centered cube at value 1.
    pub fn new() -> Self {
        Self {
            value: 1,
            owner: None,
            doubles_made: 0,
            pending: None,
        }
    }

    /// Current cube value (power of two).
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Current owner, `None` while centered.
    pub fn owner(&self) -> Option<Player> {
        self.owner
    }

    /// Number of accepted doubles this game.
    pub fn doubles_made(&self) -> u32 {
        self.doubles_made
    }

    /// The player whose double offer awaits a response, if any.
    pub fn pending_offer(&self) -> Option<Player> {
        self.pending
    }

    /// True when `player` may offer a double (cube centered or owned).
    pub fn may_offer(&self, player: Player) -> bool {
        self.owner.is_none_or(|o| o == player)
    }

    /// Opening-roll tie house rule: the centered cube value doubles with no
    /// offer/response step.
    pub(crate) fn auto_double(&mut self) {
        self.value *= 2;
    }

    pub(crate) fn set_pending(&mut self, by: Player) {
        self.pending = Some(by);
    }

    pub(crate) fn accept(&mut self) -> Option<Player> {
        let by = self.pending.take()?;
        self.value *= 2;
        self.owner = Some(by.opponent());
        self.doubles_made += 1;
        Some(by)
    }

    pub(crate) fn clear_pending(&mut self) -> Option<Player> {
        self.pending.take()
    }
}

impl Default for CubeState {
    fn default() -> Self {
        Self::new()
    }
}

/// Match-level gating for cube offers, supplied by the match controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_new::new)]
pub struct CubeRules {
    /// Whether the doubling cube is in play at all.
    pub enabled: bool,
    /// Whether the current game is the Crawford game.
    pub crawford: bool,
    /// Maximum accepted doubles permitted per game.
    pub max_doubles: u32,
}

impl CubeRules {
    /// Rules with the cube disabled entirely (single-game sessions).
    pub fn disabled() -> Self {
        Self::new(false, false, 0)
    }
}

/// Error raised by a rejected cube action. The game state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum CubeError {
    /// The doubling cube is disabled by match configuration.
    #[display("Doubling cube is disabled")]
    CubeDisabled,

    /// Doubling is forbidden during the Crawford game.
    #[display("Cannot double during the Crawford game")]
    CrawfordViolation,

    /// The per-game cap on doubles has been reached.
    #[display("Maximum of {} doubles per game exceeded", _0)]
    MaxDoublesExceeded(#[error(not(source))] u32),

    /// The acting player is not about to roll.
    #[display("{} cannot act on the cube out of turn", _0)]
    TurnViolation(#[error(not(source))] Player),

    /// The cube is owned by the opponent.
    #[display("{} does not hold the cube", _0)]
    NotCubeHolder(#[error(not(source))] Player),

    /// An offer is already awaiting a response.
    #[display("A double offer is already pending")]
    OfferPending,

    /// No offer exists to respond to.
    #[display("No double offer is pending")]
    NoPendingDouble,
}

/// Outcome of responding to a double offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoubleResponse {
    /// Offer accepted: play continues at the doubled value, cube owned by
    /// the accepter.
    Accepted {
        /// The cube value after doubling.
        new_value: u32,
    },
    /// Offer rejected: the game ends immediately, a single win for the
    /// doubler at the pre-double cube value.
    Rejected {
        /// The doubler, who wins the game.
        winner: Player,
        /// Cube value the game settles at (pre-double).
        cube_value: u32,
    },
}
