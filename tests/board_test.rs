//! Tests for the board model: invariants, hits, bear-off eligibility.

use strictly_backgammon::{Board, CheckerMove, DiceRoll, IllegalMoveError, Location, Player, rules};

#[test]
fn checker_conservation_after_every_move() {
    // Walk a handful of turns of random-ish play and check the 15-checker
    // invariant after every single move application.
    let mut board = Board::start();
    let rolls = [(3, 1), (6, 2), (5, 5), (4, 3), (2, 1), (6, 6)];
    let mut player = Player::White;

    for (d1, d2) in rolls {
        let roll = DiceRoll::new(d1, d2);
        let plys = rules::legal_plys(&board, player, &roll);
        if let Some(ply) = plys.first() {
            for mv in ply.moves() {
                board = board.apply_move(player, mv).expect("legal move applies");
                assert_eq!(board.checker_total(Player::White), 15);
                assert_eq!(board.checker_total(Player::Black), 15);
            }
        }
        player = player.opponent();
    }
}

#[test]
fn apply_move_rejects_empty_source() {
    let board = Board::start();
    // Point index 10 is empty at the start.
    let mv = CheckerMove::new(Location::Point(10), Location::Point(7), 3, false);
    let err = board.apply_move(Player::White, &mv).unwrap_err();
    assert_eq!(err, IllegalMoveError::EmptySource(Location::Point(10)));
}

#[test]
fn apply_move_rejects_opponent_source() {
    let board = Board::start();
    // Index 18 holds Black checkers.
    let mv = CheckerMove::new(Location::Point(18), Location::Point(15), 3, false);
    let err = board.apply_move(Player::White, &mv).unwrap_err();
    assert_eq!(err, IllegalMoveError::EmptySource(Location::Point(18)));
}

#[test]
fn hit_moves_lone_checker_to_bar() {
    let mut board = Board::empty();
    board.set_point(7, Player::White, 2);
    board.set_point(23, Player::White, 13);
    board.set_point(4, Player::Black, 1);
    board.set_point(0, Player::Black, 14);
    let mv = CheckerMove::new(Location::Point(7), Location::Point(4), 3, true);
    assert!(board.is_hit(Player::White, &mv));

    let next = board.apply_move(Player::White, &mv).expect("hit applies");
    assert_eq!(next.checkers_on_bar(Player::Black), 1);
    assert_eq!(next.point(4).owner, Some(Player::White));
    assert_eq!(next.checker_total(Player::Black), 15);
}

#[test]
fn all_checkers_home_requires_empty_bar() {
    let mut board = Board::empty();
    board.set_point(2, Player::White, 14);
    board.set_bar(Player::White, 1);
    board.set_point(20, Player::Black, 15);
    assert!(!board.all_checkers_home(Player::White));

    board.set_bar(Player::White, 0);
    board.set_point(2, Player::White, 15);
    assert!(board.all_checkers_home(Player::White));
}

#[test]
fn bear_off_requires_all_home() {
    let mut board = Board::start();
    // White still has checkers outside the home board; no Off moves may be
    // generated for any roll.
    for d1 in 1..=6u8 {
        for d2 in 1..=6u8 {
            let roll = DiceRoll::new(d1, d2);
            for ply in rules::legal_plys(&board, Player::White, &roll) {
                assert!(ply.moves().iter().all(|m| m.to != Location::Off));
            }
        }
    }

    // Bring everything home: bearing off appears.
    board = Board::empty();
    board.set_point(5, Player::White, 15);
    board.set_point(20, Player::Black, 15);
    let roll = DiceRoll::new(6, 6);
    let plys = rules::legal_plys(&board, Player::White, &roll);
    assert!(!plys.is_empty());
    assert!(
        plys.iter()
            .all(|p| p.moves().iter().all(|m| m.to == Location::Off))
    );
}

#[test]
fn pip_count_tracks_bar_checkers() {
    let mut board = Board::empty();
    board.set_point(0, Player::White, 14);
    board.set_bar(Player::White, 1);
    board.set_point(23, Player::Black, 15);
    // 14 checkers one pip out plus 25 for the bar checker.
    assert_eq!(board.pip_count(Player::White), 14 + 25);
    assert_eq!(board.pip_count(Player::Black), 15);
}
