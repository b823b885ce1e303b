//! Tests for the doubling cube and match scoring: Crawford, Jacoby,
//! rejection settlements, and match-end accounting.

use rand::SeedableRng;
use rand::rngs::StdRng;
use strictly_backgammon::{
    CubeError, CubeRules, CubeState, DoubleResponse, Game, GamePhase, GameValue,
    MatchConfiguration, MatchState, Player,
};

fn open_game(seed: u64) -> (Game, StdRng) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut game = Game::new();
    game.open(&mut rng, false).expect("opening roll");
    (game, rng)
}

#[test]
fn three_single_wins_take_a_three_point_match() {
    let config = MatchConfiguration::match_to(3).with_cube(false);
    let mut state = MatchState::new(config);
    let cube = CubeState::new();

    for _ in 0..3 {
        assert!(state.match_winner().is_none());
        state.settle_game(Player::White, GameValue::Single, &cube);
    }

    assert_eq!(*state.match_winner(), Some(Player::White));
    assert_eq!(state.score(Player::White), 3);
    assert_eq!(state.score(Player::Black), 0);
    assert_eq!(state.game_history().len(), 3);
}

#[test]
fn accepted_double_then_gammon_scores_four() {
    let (mut game, _rng) = open_game(1);
    let rules = CubeRules::new(true, false, 8);
    let doubler = game.to_move();

    let proposed = game.offer_double(doubler, &rules).expect("offer is legal");
    assert_eq!(proposed, 2);
    match game.respond_to_double(true).expect("accept") {
        DoubleResponse::Accepted { new_value } => assert_eq!(new_value, 2),
        other => panic!("expected acceptance, got {other:?}"),
    }

    // The accepter goes on to win a gammon: 2 (gammon) x 2 (cube) = 4.
    let accepter = doubler.opponent();
    let mut state = MatchState::new(MatchConfiguration::match_to(7));
    let record = state.settle_game(accepter, GameValue::Gammon, game.cube());
    assert_eq!(*record.points(), 4);
    assert_eq!(state.score(accepter), 4);
}

#[test]
fn rejected_double_settles_single_at_pre_double_value() {
    let (mut game, _rng) = open_game(2);
    let rules = CubeRules::new(true, false, 8);
    let doubler = game.to_move();

    game.offer_double(doubler, &rules).expect("offer is legal");
    match game.respond_to_double(false).expect("reject") {
        DoubleResponse::Rejected { winner, cube_value } => {
            assert_eq!(winner, doubler);
            assert_eq!(cube_value, 1, "settles at the pre-double value");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(game.phase(), GamePhase::GameOver);
    assert_eq!(game.winner(), Some(doubler));
    assert_eq!(game.game_value(), Some(GameValue::Single));

    let mut state = MatchState::new(MatchConfiguration::match_to(7));
    let record = state.settle_game(doubler, GameValue::Single, game.cube());
    assert_eq!(*record.points(), 1);
    assert_eq!(*record.value(), GameValue::Single);
}

#[test]
fn crawford_game_rejects_every_double() {
    let mut state = MatchState::new(MatchConfiguration::match_to(3));
    state.settle_game(Player::White, GameValue::Gammon, &CubeState::new());
    assert!(*state.is_crawford_game());

    let (mut game, _rng) = open_game(3);
    let by = game.to_move();
    let err = game.offer_double(by, &state.cube_rules()).unwrap_err();
    assert_eq!(err, CubeError::CrawfordViolation);
}

#[test]
fn cube_disabled_in_single_game_sessions() {
    let state = MatchState::new(MatchConfiguration::single_game());
    let (mut game, _rng) = open_game(4);
    let by = game.to_move();
    let err = game.offer_double(by, &state.cube_rules()).unwrap_err();
    assert_eq!(err, CubeError::CubeDisabled);
}

#[test]
fn out_of_turn_double_is_a_turn_violation() {
    let (mut game, _rng) = open_game(5);
    let rules = CubeRules::new(true, false, 8);
    let waiter = game.to_move().opponent();
    let err = game.offer_double(waiter, &rules).unwrap_err();
    assert_eq!(err, CubeError::TurnViolation(waiter));
}

#[test]
fn max_doubles_cap_is_enforced() {
    let (mut game, mut rng) = open_game(6);
    let rules = CubeRules::new(true, false, 1);

    let doubler = game.to_move();
    game.offer_double(doubler, &rules).expect("first double");
    game.respond_to_double(true).expect("accept");
    assert_eq!(game.cube().doubles_made(), 1);

    // Play on until the new owner is about to roll, then try to redouble.
    let owner = game.cube().owner().expect("cube is owned after a take");
    while game.to_move() != owner || game.phase() != GamePhase::Rolling {
        match game.phase() {
            GamePhase::Rolling => {
                let _ = game.roll_dice(&mut rng).expect("roll");
            }
            GamePhase::Moving => {
                let ply = game.legal_plys()[0].clone();
                game.commit_ply(&ply).expect("commit");
            }
            _ => panic!("unexpected phase"),
        }
        if game.phase() == GamePhase::GameOver {
            return; // freak early finish; nothing left to assert
        }
    }
    let err = game.offer_double(owner, &rules).unwrap_err();
    assert_eq!(err, CubeError::MaxDoublesExceeded(1));
}

#[test]
fn redouble_is_reserved_for_the_cube_owner() {
    let (mut game, mut rng) = open_game(7);
    let rules = CubeRules::new(true, false, 8);

    let doubler = game.to_move();
    game.offer_double(doubler, &rules).expect("first double");
    game.respond_to_double(true).expect("accept");

    // The original doubler no longer holds the cube; when their roll comes
    // around again, a redouble is rejected.
    loop {
        if game.phase() == GamePhase::Rolling && game.to_move() == doubler {
            break;
        }
        match game.phase() {
            GamePhase::Rolling => {
                let _ = game.roll_dice(&mut rng).expect("roll");
            }
            GamePhase::Moving => {
                let ply = game.legal_plys()[0].clone();
                game.commit_ply(&ply).expect("commit");
            }
            _ => return,
        }
    }
    let err = game.offer_double(doubler, &rules).unwrap_err();
    assert_eq!(err, CubeError::NotCubeHolder(doubler));
}

#[test]
fn jacoby_requires_a_turned_cube_for_bonuses() {
    let config = MatchConfiguration::match_to(7).with_jacoby(true);

    // No double all game: gammon settles as single.
    let mut state = MatchState::new(config);
    let record = state.settle_game(Player::Black, GameValue::Backgammon, &CubeState::new());
    assert_eq!(*record.value(), GameValue::Single);
    assert_eq!(*record.points(), 1);

    // With a turned cube the full bonus applies.
    let (mut game, _rng) = open_game(8);
    let doubler = game.to_move();
    game.offer_double(doubler, &CubeRules::new(true, false, 8))
        .expect("offer");
    game.respond_to_double(true).expect("accept");
    let mut state = MatchState::new(config);
    let record = state.settle_game(Player::Black, GameValue::Gammon, game.cube());
    assert_eq!(*record.value(), GameValue::Gammon);
    assert_eq!(*record.points(), 4);
}

#[test]
fn automatic_doubles_bump_the_centered_cube() {
    // Find a seed whose opening roll ties at least once.
    for seed in 0..500u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut game = Game::new();
        let opening = game.open(&mut rng, true).expect("opening roll");
        if opening.ties > 0 {
            assert_eq!(game.cube().value(), 1 << opening.ties);
            assert_eq!(game.cube().owner(), None);
            return;
        }
    }
    panic!("no tying opening roll found in 500 seeds");
}
