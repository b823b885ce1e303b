//! Legal-ply enumeration.
//!
//! Pure functions over board snapshots, separated from board storage so the
//! rules compose into the game state machine and the AI strategies alike.
//!
//! Enumeration follows standard backgammon rules:
//! - checkers on the bar must enter before any other move;
//! - a player must use as many dice as possible (maximal-length plies only);
//! - when only one of two distinct dice can be played, the higher is forced;
//! - bearing off requires all checkers home, and an overshooting die is
//!   legal only from the player's farthest occupied point.

use super::board::Board;
use super::dice::DiceRoll;
use super::moves::{CheckerMove, Ply};
use super::types::{Location, Player};

/// Entry point (0–23) for a bar entry with the given die.
pub fn entry_point(player: Player, die: u8) -> u8 {
    match player {
        Player::White => 24 - die,
        Player::Black => die - 1,
    }
}

/// Destination of a move from a point with the given die, before any
/// blocking or bear-off eligibility checks. `Off` covers exact and
/// overshooting bear-offs alike.
pub fn destination(player: Player, from: u8, die: u8) -> Location {
    match player {
        Player::White => {
            if from >= die {
                Location::Point(from - die)
            } else {
                Location::Off
            }
        }
        Player::Black => {
            let to = from + die;
            if to <= 23 { Location::Point(to) } else { Location::Off }
        }
    }
}

/// All legal single-die moves for the player with the given die value.
///
/// When the player has checkers on the bar, only bar entries are produced;
/// entry is mandatory before any other move.
pub fn single_die_moves(board: &Board, player: Player, die: u8) -> Vec<CheckerMove> {
    let mut moves = Vec::new();

    if board.checkers_on_bar(player) > 0 {
        let entry = entry_point(player, die);
        let state = board.point(entry);
        let blocked = state.owner == Some(player.opponent()) && state.count >= 2;
        if !blocked {
            let mv = CheckerMove::new(Location::Bar, Location::Point(entry), die, false);
            let is_hit = board.is_hit(player, &mv);
            moves.push(CheckerMove { is_hit, ..mv });
        }
        return moves;
    }

    let can_bear_off = board.all_checkers_home(player);
    for from in 0u8..24 {
        if board.point(from).owner != Some(player) {
            continue;
        }
        match destination(player, from, die) {
            Location::Point(to) => {
                let state = board.point(to);
                let blocked = state.owner == Some(player.opponent()) && state.count >= 2;
                if !blocked {
                    let mv = CheckerMove::new(Location::Point(from), Location::Point(to), die, false);
                    let is_hit = board.is_hit(player, &mv);
                    moves.push(CheckerMove { is_hit, ..mv });
                }
            }
            Location::Off => {
                if !can_bear_off {
                    continue;
                }
                let exact = player.pip_distance(from) == u32::from(die);
                let farthest = board.farthest_pip(player) == Some(player.pip_distance(from));
                if exact || farthest {
                    moves.push(CheckerMove::new(Location::Point(from), Location::Off, die, false));
                }
            }
            Location::Bar => unreachable!("destination is never the bar"),
        }
    }
    moves
}

/// Enumerates the complete legal-ply set for the roll.
///
/// Returns an empty vector when no move is possible; the turn is then
/// forfeit (an explicit event at the game level, never an error).
pub fn legal_plys(board: &Board, player: Player, roll: &DiceRoll) -> Vec<Ply> {
    let mut sequences = Vec::new();
    let mut prefix = Vec::new();
    extend(board, player, roll.available(), &mut prefix, &mut sequences);

    let max_len = sequences.iter().map(Ply::len).max().unwrap_or(0);
    if max_len == 0 {
        return Vec::new();
    }
    sequences.retain(|ply| ply.len() == max_len);

    // Larger-die rule: when only a single die can be played of two distinct
    // values, the higher one is forced if playable.
    if max_len == 1 && !roll.is_double() {
        let higher = roll.higher();
        if sequences.iter().any(|ply| ply.moves()[0].die == higher) {
            sequences.retain(|ply| ply.moves()[0].die == higher);
        }
    }

    sequences.sort();
    sequences.dedup();
    sequences
}

fn extend(
    board: &Board,
    player: Player,
    remaining: &[u8],
    prefix: &mut Vec<CheckerMove>,
    out: &mut Vec<Ply>,
) {
    if remaining.is_empty() {
        if !prefix.is_empty() {
            out.push(Ply::new(prefix.clone()));
        }
        return;
    }

    let mut extended = false;
    let mut tried = [false; 7];
    for (i, &die) in remaining.iter().enumerate() {
        // Doubles repeat the same value; try each distinct value once.
        if tried[usize::from(die)] {
            continue;
        }
        tried[usize::from(die)] = true;

        for mv in single_die_moves(board, player, die) {
            let Ok(next) = board.apply_move(player, &mv) else {
                debug_assert!(false, "generated move must apply cleanly: {mv}");
                continue;
            };
            extended = true;
            let mut rest = remaining.to_vec();
            rest.remove(i);
            prefix.push(mv);
            extend(&next, player, &rest, prefix, out);
            prefix.pop();
        }
    }

    // Dead end with dice left: the prefix is a complete (possibly partial
    // dice usage) candidate. The maximal-length filter prunes it later if a
    // longer sequence exists.
    if !extended && !prefix.is_empty() {
        out.push(Ply::new(prefix.clone()));
    }
}
