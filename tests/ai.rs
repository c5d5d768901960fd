//! AI controllers drive the fight through the same input surface as humans.

mod common;

use speculoos::prelude::*;

use common::*;
use ricochet_arena::config::{AiDifficulty, MatchConfig, PlayerSetup};
use ricochet_arena::events::GameEvent;
use ricochet_arena::game::Game;
use ricochet_arena::systems::components::InputFrame;

fn bot_duel() -> Game {
    let mut config = MatchConfig::new([
        PlayerSetup::bot(0, AiDifficulty::Hard),
        PlayerSetup::bot(1, AiDifficulty::Hard),
    ]);
    config.arena = bare_arena();
    Game::new(config).unwrap()
}

#[test]
fn test_bots_move_and_attack() {
    let mut game = bot_duel();
    skip_ready(&mut game);

    let mut throws = 0;
    let mut moved = false;
    let start = position(&game, 0);
    for _ in 0..600 {
        game.tick();
        throws += events_matching(&game.drain_events(), |e| matches!(e, GameEvent::Throw { .. })).len();
        if position(&game, 0).distance(start) > 30.0 {
            moved = true;
        }
    }

    assert!(moved, "bots should reposition");
    assert_that(&throws).is_greater_than(0);
}

#[test]
fn test_bot_input_is_always_normalized() {
    let mut game = bot_duel();
    skip_ready(&mut game);

    for _ in 0..120 {
        game.tick();
        let entity = player_entity(&game, 0);
        let input = game.world().get::<InputFrame>(entity).unwrap();
        assert!(input.movement.length() <= 1.0 + 1e-4);
    }
}

#[test]
fn test_dead_bot_emits_no_input() {
    let mut game = bot_duel();
    skip_ready(&mut game);

    let entity = player_entity(&game, 0);
    game.world_mut()
        .get_mut::<ricochet_arena::systems::components::Player>(entity)
        .unwrap()
        .alive = false;
    game.tick();

    let input = game.world().get::<InputFrame>(entity).unwrap();
    assert!(input.movement.length() < 1e-6);
    assert!(!input.action_held);
}
