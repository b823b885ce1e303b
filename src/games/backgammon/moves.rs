//! First-class move types for backgammon.
//!
//! Moves are domain events, not side effects. A [`CheckerMove`] relocates a
//! single checker; a [`Ply`] is one player's complete turn (1–4 moves).

use super::types::Location;
use serde::{Deserialize, Serialize};

/// A single checker relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CheckerMove {
    /// Where the checker starts (bar or a point).
    pub from: Location,
    /// Where the checker lands (a point or off).
    pub to: Location,
    /// The die value this move consumes.
    pub die: u8,
    /// Whether the move hits a lone opposing checker.
    pub is_hit: bool,
}

impl CheckerMove {
    /// Creates a new checker move.
    pub fn new(from: Location, to: Location, die: u8, is_hit: bool) -> Self {
        Self { from, to, die, is_hit }
    }

    /// True when this move describes the same relocation, ignoring the hit
    /// flag. Used to match caller-submitted moves against the legal set
    /// without trusting caller-computed flags.
    pub fn same_relocation(&self, other: &CheckerMove) -> bool {
        self.from == other.from && self.to == other.to && self.die == other.die
    }
}

impl std::fmt::Display for CheckerMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.from, self.to)?;
        if self.is_hit {
            write!(f, "*")?;
        }
        Ok(())
    }
}

/// One player's full turn: an ordered sequence of checker moves.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Ply {
    moves: Vec<CheckerMove>,
}

impl Ply {
    /// Creates a ply from a move sequence.
    pub fn new(moves: Vec<CheckerMove>) -> Self {
        Self { moves }
    }

    /// The moves making up this ply, in play order.
    pub fn moves(&self) -> &[CheckerMove] {
        &self.moves
    }

    /// Number of dice this ply consumes.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// True for the empty ply (no moves).
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// True when both plies describe the same relocation sequence,
    /// ignoring hit flags.
    pub fn same_sequence(&self, other: &Ply) -> bool {
        self.moves.len() == other.moves.len()
            && self
                .moves
                .iter()
                .zip(other.moves.iter())
                .all(|(a, b)| a.same_relocation(b))
    }
}

impl std::fmt::Display for Ply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.moves.is_empty() {
            return write!(f, "(no moves)");
        }
        let mut first = true;
        for mv in &self.moves {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}", mv)?;
            first = false;
        }
        Ok(())
    }
}

/// Error raised when a move or ply cannot be applied.
///
/// Always local and recoverable: the game phase does not advance and the
/// caller may resubmit.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum IllegalMoveError {
    /// The source location has no checker of the moving player.
    #[display("No checker of the moving player at {}", _0)]
    EmptySource(#[error(not(source))] Location),

    /// The destination is held by two or more opposing checkers.
    #[display("Destination {} is blocked", _0)]
    DestinationBlocked(#[error(not(source))] Location),

    /// Checkers on the bar must enter before any other move.
    #[display("Bar entry is required before moving other checkers")]
    BarEntryRequired,

    /// Bearing off requires all checkers in the home board.
    #[display("Cannot bear off: not all checkers are home")]
    BearOffNotAllowed,

    /// Overshooting bear-off with a checker still on a higher point.
    #[display("Cannot bear off from {} with die {}: higher checker exists", from, die)]
    HigherCheckerExists {
        /// Attempted source point.
        from: u8,
        /// Die value used.
        die: u8,
    },

    /// The submitted ply is not in the legal set for the current roll.
    #[display("Ply is not in the legal set for this roll")]
    NotInLegalSet,

    /// The operation is not valid in the current game phase.
    #[display("Operation not valid in phase {:?}", _0)]
    WrongPhase(#[error(not(source))] super::types::GamePhase),

    /// Dice cannot be rolled while a double offer awaits a response.
    #[display("Respond to the pending double before rolling")]
    CubeDecisionPending,
}
