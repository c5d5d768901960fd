//! Round/match progression, confirmation flow, win condition and pause.

mod common;

use glam::Vec2;
use pretty_assertions::assert_eq;

use common::*;
use ricochet_arena::config::{MatchConfig, PlayerSetup};
use ricochet_arena::constants::timing;
use ricochet_arena::events::GameEvent;
use ricochet_arena::game::Game;
use ricochet_arena::systems::components::InputFrame;
use ricochet_arena::systems::state::{MatchPhase, MatchState};

fn decide_round(game: &mut Game, winner: usize) {
    // Kill everyone except the winner, then let the state machine settle
    for slot in 0..2 {
        if slot != winner {
            let entity = player_entity(game, slot);
            game.world_mut()
                .get_mut::<ricochet_arena::systems::components::Player>(entity)
                .unwrap()
                .alive = false;
            game.world_mut().resource_mut::<MatchState>().deaths_this_tick += 1;
        }
    }
    run_ticks(game, timing::KO_TICKS + 5);
    assert!(matches!(game.phase(), MatchPhase::RoundEnd { .. }));
}

#[test]
fn test_ready_countdown_then_fight() {
    let mut game = duel();
    assert!(matches!(game.phase(), MatchPhase::Ready { .. }));

    run_ticks(&mut game, timing::READY_TICKS + 2);
    assert_eq!(game.phase(), MatchPhase::Fight);

    let events = game.drain_events();
    assert_eq!(
        events_matching(&events, |e| matches!(e, GameEvent::RoundStart { round: 1 })).len(),
        1
    );
}

#[test]
fn test_winner_confirm_advances_to_next_round() {
    let mut game = duel();
    skip_ready(&mut game);
    decide_round(&mut game, 0);
    game.drain_events();

    game.set_player_input(
        0,
        InputFrame {
            action_pressed: true,
            ..Default::default()
        },
    )
    .unwrap();
    game.tick();

    assert!(matches!(game.phase(), MatchPhase::Ready { .. }));
    assert_eq!(game.match_state().round, 2);

    // Full per-round reset: everyone alive and armed, back on their marks
    for slot in 0..2 {
        let p = player(&game, slot);
        assert!(p.alive);
        assert!(p.has_boomerang);
    }
    assert_eq!(position(&game, 0), LEFT_SPAWN);
    assert_eq!(position(&game, 1), RIGHT_SPAWN);
}

#[test]
fn test_round_end_times_out_without_confirmation() {
    let mut game = duel();
    skip_ready(&mut game);
    decide_round(&mut game, 0);

    run_ticks(&mut game, timing::ROUND_END_TIMEOUT_TICKS + 5);
    assert!(matches!(game.phase(), MatchPhase::Ready { .. }));
    assert_eq!(game.match_state().round, 2);
}

#[test]
fn test_loser_cannot_confirm() {
    let mut game = duel();
    skip_ready(&mut game);
    decide_round(&mut game, 0);

    game.set_player_input(
        1,
        InputFrame {
            action_pressed: true,
            ..Default::default()
        },
    )
    .unwrap();
    game.tick();
    assert!(matches!(game.phase(), MatchPhase::RoundEnd { .. }));
}

#[test]
fn test_winner_falling_during_ko_downgrades_to_a_draw() {
    let mut game = duel();
    skip_ready(&mut game);

    let loser = player_entity(&game, 1);
    game.world_mut()
        .get_mut::<ricochet_arena::systems::components::Player>(loser)
        .unwrap()
        .alive = false;
    game.world_mut().resource_mut::<MatchState>().deaths_this_tick = 1;
    game.tick();
    assert!(matches!(game.phase(), MatchPhase::Ko { .. }));
    assert_eq!(game.match_state().round_winner, 0);

    // A hazard claims the presumed winner during the freeze-frame
    let winner = player_entity(&game, 0);
    game.world_mut()
        .get_mut::<ricochet_arena::systems::components::Player>(winner)
        .unwrap()
        .alive = false;
    game.world_mut().resource_mut::<MatchState>().deaths_this_tick = 1;
    run_ticks(&mut game, timing::KO_TICKS + 5);

    assert!(matches!(game.phase(), MatchPhase::RoundEnd { .. }));
    assert_eq!(game.match_state().round_winner, -1);
    // Nobody banks a score for a round nobody survived
    assert_eq!(game.match_state().records[0].score, 0);
    assert_eq!(game.match_state().records[1].score, 0);
}

#[test]
fn test_match_won_at_threshold() {
    let mut game = duel();
    skip_ready(&mut game);
    game.drain_events();

    let threshold = game.match_state().win_threshold;
    for round in 0..threshold {
        decide_round(&mut game, 0);
        game.set_player_input(
            0,
            InputFrame {
                action_pressed: true,
                ..Default::default()
            },
        )
        .unwrap();
        game.tick();

        if round + 1 < threshold {
            assert!(matches!(game.phase(), MatchPhase::Ready { .. }));
            skip_ready(&mut game);
        }
    }

    assert_eq!(game.phase(), MatchPhase::Win { winner: 0 });
    let events = game.drain_events();
    assert_eq!(
        events_matching(&events, |e| matches!(e, GameEvent::MatchWon { player: 0 })).len(),
        1
    );
    assert_eq!(game.match_state().records[0].score, threshold);

    // Terminal: further ticks change nothing
    run_ticks(&mut game, 30);
    assert_eq!(game.phase(), MatchPhase::Win { winner: 0 });
}

#[test]
fn test_pause_suspends_simulation() {
    let mut game = duel();
    skip_ready(&mut game);

    game.set_player_input(0, move_frame(Vec2::X)).unwrap();
    run_ticks(&mut game, 5);
    let frozen = position(&game, 0);

    game.toggle_pause();
    assert!(game.is_paused());
    run_ticks(&mut game, 30);
    assert_eq!(position(&game, 0), frozen);

    game.toggle_pause();
    assert!(!game.is_paused());
    run_ticks(&mut game, 5);
    assert!(position(&game, 0) != frozen);
}

#[test]
fn test_single_step_runs_exactly_one_tick() {
    let mut game = duel();
    skip_ready(&mut game);

    game.set_player_input(0, move_frame(Vec2::X)).unwrap();
    run_ticks(&mut game, 5);
    game.toggle_pause();
    let before = position(&game, 0);

    game.step_paused();
    game.tick();
    let after_step = position(&game, 0);
    assert!(after_step != before, "the stepped tick must simulate");

    run_ticks(&mut game, 10);
    assert_eq!(position(&game, 0), after_step, "re-paused after the single step");
}

#[test]
fn test_team_round_scores_all_members() {
    let mut config = MatchConfig::new([
        PlayerSetup::human(0).with_team(0),
        PlayerSetup::human(1).with_team(0),
        PlayerSetup::human(2).with_team(1),
    ]);
    config.arena = bare_arena();
    let mut game = Game::new(config).unwrap();
    skip_ready(&mut game);

    // The lone member of team 1 goes down; both team 0 members score
    let entity = player_entity(&game, 2);
    game.world_mut()
        .get_mut::<ricochet_arena::systems::components::Player>(entity)
        .unwrap()
        .alive = false;
    game.world_mut().resource_mut::<MatchState>().deaths_this_tick = 1;
    run_ticks(&mut game, timing::KO_TICKS + 5);

    assert!(matches!(game.phase(), MatchPhase::RoundEnd { .. }));
    let state = game.match_state();
    assert_eq!(state.records[0].score, 1);
    assert_eq!(state.records[1].score, 1);
    assert_eq!(state.records[2].score, 0);
}
