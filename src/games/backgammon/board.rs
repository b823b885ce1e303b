//! Board model: point occupancy, bar and borne-off counts.
//!
//! The board is pure data. Mutating operations take `&self` and return a new
//! board, so every caller works on an immutable snapshot. Backgammon forbids
//! mixed ownership on a point, so each point stores at most one owner.

use super::moves::{CheckerMove, IllegalMoveError};
use super::types::{Location, Player};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Occupancy of a single point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct PointState {
    /// Owner of the checkers on this point, if any.
    pub owner: Option<Player>,
    /// Number of checkers (0 when unowned).
    pub count: u8,
}

/// Complete checker state for one game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    points: [PointState; 24],
    bar: [u8; 2],
    off: [u8; 2],
}

impl Board {
    /// Creates an empty board (no checkers anywhere). Test scaffolding.
    pub fn empty() -> Self {
        Self {
            points: [PointState::default(); 24],
            bar: [0; 2],
            off: [0; 2],
        }
    }

    /// Creates the standard backgammon starting position.
    pub fn start() -> Self {
        let mut board = Self::empty();
        // White runs 23 -> 0, Black mirrors.
        for (point, count) in [(23u8, 2u8), (12, 5), (7, 3), (5, 5)] {
            board.set_point(point, Player::White, count);
        }
        for (point, count) in [(0u8, 2u8), (11, 5), (16, 3), (18, 5)] {
            board.set_point(point, Player::Black, count);
        }
        debug_assert!(board.invariants_hold());
        board
    }

    /// Occupancy of the given point (0–23).
    pub fn point(&self, point: u8) -> PointState {
        self.points[usize::from(point)]
    }

    /// Number of checkers the player has on the bar.
    pub fn checkers_on_bar(&self, player: Player) -> u8 {
        self.bar[player.index()]
    }

    /// Number of checkers the player has borne off.
    pub fn borne_off(&self, player: Player) -> u8 {
        self.off[player.index()]
    }

    /// True when all of the player's remaining checkers are in their home
    /// board and none are on the bar. Prerequisite for bearing off.
    pub fn all_checkers_home(&self, player: Player) -> bool {
        if self.bar[player.index()] > 0 {
            return false;
        }
        let home = player.home_range();
        (0u8..24).all(|p| {
            home.contains(&p) || self.points[usize::from(p)].owner != Some(player)
        })
    }

    /// True when the move would land on a lone opposing checker.
    pub fn is_hit(&self, player: Player, mv: &CheckerMove) -> bool {
        match mv.to {
            Location::Point(p) => {
                let state = self.point(p);
                state.owner == Some(player.opponent()) && state.count == 1
            }
            _ => false,
        }
    }

    /// Pip count: total distance the player's checkers must travel to bear
    /// off. Checkers on the bar count 25 pips.
    pub fn pip_count(&self, player: Player) -> u32 {
        let mut pips = u32::from(self.bar[player.index()]) * 25;
        for p in 0u8..24 {
            let state = self.points[usize::from(p)];
            if state.owner == Some(player) {
                pips += player.pip_distance(p) * u32::from(state.count);
            }
        }
        pips
    }

    /// Points where the player has exactly one checker (hittable blots).
    pub fn blots(&self, player: Player) -> Vec<u8> {
        (0u8..24)
            .filter(|&p| {
                let state = self.points[usize::from(p)];
                state.owner == Some(player) && state.count == 1
            })
            .collect()
    }

    /// The farthest-from-off pip distance among the player's checkers on
    /// points. `None` when all checkers are off or on the bar.
    pub fn farthest_pip(&self, player: Player) -> Option<u32> {
        (0u8..24)
            .filter(|&p| self.points[usize::from(p)].owner == Some(player))
            .map(|p| player.pip_distance(p))
            .max()
    }

    /// Applies a single checker move, returning the resulting board.
    ///
    /// Pure: `self` is unchanged. Ply-level legality (bar entry first,
    /// maximal dice usage, bear-off eligibility) is enforced by the rules
    /// module; this validates only what the board itself can see.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalMoveError`] if the source holds no checker of the
    /// moving player or the destination is blocked by two or more opposing
    /// checkers.
    #[instrument(skip(self), fields(player = %player, mv = %mv))]
    pub fn apply_move(&self, player: Player, mv: &CheckerMove) -> Result<Board, IllegalMoveError> {
        let mut next = self.clone();

        // Lift the checker from its source.
        match mv.from {
            Location::Bar => {
                if next.bar[player.index()] == 0 {
                    return Err(IllegalMoveError::EmptySource(Location::Bar));
                }
                next.bar[player.index()] -= 1;
            }
            Location::Point(p) => {
                let state = next.point(p);
                if state.owner != Some(player) || state.count == 0 {
                    return Err(IllegalMoveError::EmptySource(mv.from));
                }
                next.remove_checker(p, player);
            }
            Location::Off => return Err(IllegalMoveError::EmptySource(Location::Off)),
        }

        // Land it.
        match mv.to {
            Location::Point(p) => {
                let state = next.point(p);
                match state.owner {
                    Some(opp) if opp == player.opponent() => {
                        if state.count >= 2 {
                            return Err(IllegalMoveError::DestinationBlocked(mv.to));
                        }
                        // Hit: the lone checker goes to the opponent's bar.
                        next.remove_checker(p, opp);
                        next.bar[opp.index()] += 1;
                        next.add_checker(p, player);
                    }
                    _ => next.add_checker(p, player),
                }
            }
            Location::Off => next.off[player.index()] += 1,
            Location::Bar => return Err(IllegalMoveError::DestinationBlocked(Location::Bar)),
        }

        debug_assert!(next.invariants_hold(), "board invariant violated after move {mv}");
        Ok(next)
    }

    /// Total checkers a player has anywhere (points + bar + off).
    pub fn checker_total(&self, player: Player) -> u8 {
        let on_points: u8 = (0u8..24)
            .map(|p| {
                let state = self.points[usize::from(p)];
                if state.owner == Some(player) { state.count } else { 0 }
            })
            .sum();
        on_points + self.bar[player.index()] + self.off[player.index()]
    }

    /// Checks the structural invariants: 15 checkers per player and no
    /// mixed-ownership points. A violation is a programming error, not a
    /// rules error.
    pub fn invariants_hold(&self) -> bool {
        self.checker_total(Player::White) == 15
            && self.checker_total(Player::Black) == 15
            && self.points.iter().all(|s| s.owner.is_some() == (s.count > 0))
    }

    /// Formats the board as a compact human-readable summary.
    pub fn display(&self) -> String {
        let mut out = String::new();
        for p in (0u8..24).rev() {
            let state = self.points[usize::from(p)];
            if let Some(owner) = state.owner {
                let mark = match owner {
                    Player::White => 'W',
                    Player::Black => 'B',
                };
                out.push_str(&format!("{}:{}{} ", p + 1, mark, state.count));
            }
        }
        out.push_str(&format!(
            "| bar W{} B{} | off W{} B{}",
            self.bar[0], self.bar[1], self.off[0], self.off[1]
        ));
        out
    }

    /// Places `count` checkers for `player` on `point`, replacing the
    /// point's contents. Test and setup scaffolding.
    pub fn set_point(&mut self, point: u8, player: Player, count: u8) {
        self.points[usize::from(point)] = if count == 0 {
            PointState::default()
        } else {
            PointState { owner: Some(player), count }
        };
    }

    /// Sets the player's bar count directly. Test scaffolding.
    pub fn set_bar(&mut self, player: Player, count: u8) {
        self.bar[player.index()] = count;
    }

    /// Sets the player's borne-off count directly. Test scaffolding.
    pub fn set_off(&mut self, player: Player, count: u8) {
        self.off[player.index()] = count;
    }

    fn add_checker(&mut self, point: u8, player: Player) {
        let state = &mut self.points[usize::from(point)];
        state.owner = Some(player);
        state.count += 1;
    }

    fn remove_checker(&mut self, point: u8, player: Player) {
        let state = &mut self.points[usize::from(point)];
        debug_assert_eq!(state.owner, Some(player));
        state.count -= 1;
        if state.count == 0 {
            state.owner = None;
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_position_has_fifteen_checkers_each() {
        let board = Board::start();
        assert_eq!(board.checker_total(Player::White), 15);
        assert_eq!(board.checker_total(Player::Black), 15);
        assert!(board.invariants_hold());
    }

    #[test]
    fn start_pip_count_is_167() {
        let board = Board::start();
        assert_eq!(board.pip_count(Player::White), 167);
        assert_eq!(board.pip_count(Player::Black), 167);
    }

    #[test]
    fn hit_sends_checker_to_bar() {
        let mut board = Board::start();
        // Give Black a blot on index 3, thinning the index-0 anchor to keep
        // the total at 15.
        board.set_point(3, Player::Black, 1);
        board.set_point(0, Player::Black, 1);
        let mv = CheckerMove::new(Location::Point(5), Location::Point(3), 2, true);
        assert!(board.is_hit(Player::White, &mv));
        let next = board.apply_move(Player::White, &mv).unwrap();
        assert_eq!(next.checkers_on_bar(Player::Black), 1);
        assert_eq!(next.point(3).owner, Some(Player::White));
    }

    #[test]
    fn blocked_destination_rejected() {
        let board = Board::start();
        // Black holds point 19 (index 18) with five checkers.
        let mv = CheckerMove::new(Location::Point(23), Location::Point(18), 5, false);
        let err = board.apply_move(Player::White, &mv).unwrap_err();
        assert_eq!(err, IllegalMoveError::DestinationBlocked(Location::Point(18)));
    }
}
