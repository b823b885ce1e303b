//! Tests for legal-ply enumeration: bar entry, maximal dice usage, and the
//! phase transitions of a single game.

use rand::SeedableRng;
use rand::rngs::StdRng;
use strictly_backgammon::{
    Board, DiceRoll, Game, GamePhase, GameValue, Location, Player, TurnStart, game_value, rules,
};

#[test]
fn bar_entry_always_first_when_possible() {
    let mut board = Board::start();
    board.set_point(23, Player::White, 1);
    board.set_bar(Player::White, 1);

    for d1 in 1..=6u8 {
        for d2 in 1..=6u8 {
            let roll = DiceRoll::new(d1, d2);
            for ply in rules::legal_plys(&board, Player::White, &roll) {
                assert_eq!(
                    ply.moves()[0].from,
                    Location::Bar,
                    "ply {ply} does not enter from the bar first"
                );
            }
        }
    }
}

#[test]
fn forced_sequence_uses_both_dice() {
    let mut board = Board::empty();
    // White's mobile checker on 10; the pile on 23 is blocked for both dice.
    // Die 3 alone (10 -> 7) is blocked, so the only play is 6 then 3
    // through point 4. A lazy single-move ply must not be legal.
    board.set_point(10, Player::White, 1);
    board.set_point(23, Player::White, 14);
    board.set_point(7, Player::Black, 2);
    board.set_point(17, Player::Black, 2);
    board.set_point(20, Player::Black, 2);
    board.set_point(0, Player::Black, 9);

    let roll = DiceRoll::new(6, 3);
    let plys = rules::legal_plys(&board, Player::White, &roll);
    assert!(!plys.is_empty());
    for ply in &plys {
        assert_eq!(ply.len(), 2, "ply {ply} wastes a usable die");
        assert_eq!(ply.moves()[0].die, 6);
        assert_eq!(ply.moves()[0].to, Location::Point(4));
        assert_eq!(ply.moves()[1].to, Location::Point(1));
    }
}

#[test]
fn all_legal_plys_have_maximal_length() {
    // Across a spread of rolls from the opening position, the engine never
    // offers a ply shorter than the longest available.
    let board = Board::start();
    for player in [Player::White, Player::Black] {
        for d1 in 1..=6u8 {
            for d2 in 1..=6u8 {
                let plys = rules::legal_plys(&board, player, &DiceRoll::new(d1, d2));
                let max = plys.iter().map(|p| p.len()).max().unwrap_or(0);
                assert!(plys.iter().all(|p| p.len() == max));
            }
        }
    }
}

#[test]
fn doubles_grant_four_moves_from_opening() {
    let board = Board::start();
    // 3-3 is fully playable from the start: every legal ply uses all four.
    let plys = rules::legal_plys(&board, Player::White, &DiceRoll::new(3, 3));
    assert!(!plys.is_empty());
    assert!(plys.iter().all(|p| p.len() == 4));
}

#[test]
fn applied_sources_are_not_movable_for_the_opponent() {
    let mut game = Game::new();
    let mut rng = StdRng::seed_from_u64(42);
    game.open(&mut rng, false).expect("opening roll");

    for _ in 0..40 {
        if game.phase() == GamePhase::GameOver {
            break;
        }
        let mover = game.to_move();
        let legal = match game.roll_dice(&mut rng).expect("roll") {
            TurnStart::Playable { legal, .. } => legal,
            TurnStart::Forfeited { .. } => continue,
        };
        let ply = legal[0].clone();
        game.commit_ply(&ply).expect("legal ply commits");
        if game.phase() == GamePhase::GameOver {
            break;
        }

        // Replaying any opponent ply move by move, no move ever starts on
        // a point the previous mover holds at that moment. A hit earlier
        // in the ply transfers the point, so ownership is checked on the
        // evolving board, not the pre-ply snapshot.
        let opponent = game.to_move();
        assert_eq!(opponent, mover.opponent());
        for roll in [DiceRoll::new(6, 1), DiceRoll::new(2, 4)] {
            for opp_ply in rules::legal_plys(game.board(), opponent, &roll) {
                let mut board = game.board().clone();
                for mv in opp_ply.moves() {
                    if let Location::Point(p) = mv.from {
                        assert_ne!(
                            board.point(p).owner,
                            Some(mover),
                            "opponent moved from {p} while the previous mover held it"
                        );
                    }
                    board = board.apply_move(opponent, mv).expect("legal move applies");
                }
            }
        }
    }
}

#[test]
fn hit_blot_then_continue_with_same_checker() {
    let mut board = Board::empty();
    board.set_point(19, Player::White, 1);
    board.set_point(0, Player::White, 14);
    board.set_point(13, Player::Black, 1);
    board.set_point(23, Player::Black, 14);

    // 19 -> 13* -> 9: the hitting checker continues from the point it just
    // took, a point the defender owned before the ply began.
    assert_eq!(board.point(13).owner, Some(Player::Black));
    let roll = DiceRoll::new(6, 4);
    let plys = rules::legal_plys(&board, Player::White, &roll);
    assert!(plys.iter().any(|ply| {
        let moves = ply.moves();
        moves.len() == 2
            && moves[0].to == Location::Point(13)
            && moves[0].is_hit
            && moves[1].from == Location::Point(13)
    }));
}

#[test]
fn no_legal_moves_forfeits_turn_without_error() {
    let mut game = Game::new();
    let mut rng = StdRng::seed_from_u64(3);
    game.open(&mut rng, false).expect("opening roll");
    let player = game.to_move();

    // Lock the roller out completely: on the bar against a closed board.
    let mut board = Board::empty();
    let opponent = player.opponent();
    for p in opponent.home_range() {
        board.set_point(p, opponent, 2);
    }
    let spare = match opponent {
        Player::White => 12,
        Player::Black => 13,
    };
    board.set_point(spare, opponent, 3);
    board.set_bar(player, 1);
    let own_spare = match player {
        Player::White => 14,
        Player::Black => 9,
    };
    board.set_point(own_spare, player, 14);
    game.set_board(board);

    match game.roll_dice(&mut rng).expect("forfeit is not an error") {
        TurnStart::Forfeited { .. } => {}
        TurnStart::Playable { .. } => panic!("closed board must forfeit the turn"),
    }
    assert_eq!(game.to_move(), player.opponent());
    assert_eq!(game.phase(), GamePhase::Rolling);
}

#[test]
fn gammon_and_backgammon_detection() {
    // Loser bore off nothing: at least a gammon.
    let mut board = Board::empty();
    board.set_off(Player::White, 15);
    board.set_point(12, Player::Black, 15);
    assert_eq!(game_value(&board, Player::White), GameValue::Gammon);

    // A loser checker on the bar upgrades to backgammon.
    board.set_point(12, Player::Black, 14);
    board.set_bar(Player::Black, 1);
    assert_eq!(game_value(&board, Player::White), GameValue::Backgammon);

    // A borne-off checker drops it back to single.
    board.set_bar(Player::Black, 0);
    board.set_point(12, Player::Black, 13);
    board.set_off(Player::Black, 1);
    assert_eq!(game_value(&board, Player::White), GameValue::Single);
}
