//! Shared fixtures for integration tests.

#![allow(dead_code)]

use bevy_ecs::entity::Entity;
use glam::Vec2;

use ricochet_arena::config::{ArenaLayout, MatchConfig, PlayerSetup};
use ricochet_arena::constants;
use ricochet_arena::events::GameEvent;
use ricochet_arena::game::Game;
use ricochet_arena::systems::components::{InputFrame, Player, PlayerHandles, Transform};
use ricochet_arena::systems::state::MatchPhase;

pub const LEFT_SPAWN: Vec2 = Vec2::new(100.0, 180.0);
pub const RIGHT_SPAWN: Vec2 = Vec2::new(540.0, 180.0);

/// An arena with no obstacles or hazards, so tests control every variable.
pub fn bare_arena() -> ArenaLayout {
    ArenaLayout {
        size: constants::ARENA_SIZE,
        spawn_points: vec![
            LEFT_SPAWN,
            RIGHT_SPAWN,
            Vec2::new(320.0, 60.0),
            Vec2::new(320.0, 300.0),
        ],
        walls: Vec::new(),
        zones: Vec::new(),
        portals: Vec::new(),
        boulder_spawners: Vec::new(),
        hazard_ring: None,
    }
}

/// Two humans in the bare arena.
pub fn duel() -> Game {
    let mut config = MatchConfig::new([PlayerSetup::human(0), PlayerSetup::human(1)]);
    config.arena = bare_arena();
    Game::new(config).expect("valid duel config")
}

pub fn duel_with_arena(arena: ArenaLayout) -> Game {
    let mut config = MatchConfig::new([PlayerSetup::human(0), PlayerSetup::human(1)]);
    config.arena = arena;
    Game::new(config).expect("valid config")
}

pub fn run_ticks(game: &mut Game, ticks: u32) {
    for _ in 0..ticks {
        game.tick();
    }
}

/// Ticks through the ready countdown until the round is live.
pub fn skip_ready(game: &mut Game) {
    for _ in 0..(constants::timing::READY_TICKS + 10) {
        if game.phase() == MatchPhase::Fight {
            return;
        }
        game.tick();
    }
    panic!("round never went live");
}

pub fn player_entity(game: &Game, slot: usize) -> Entity {
    game.world().resource::<PlayerHandles>().0[slot]
}

pub fn player(game: &Game, slot: usize) -> Player {
    game.world()
        .get::<Player>(player_entity(game, slot))
        .expect("player component")
        .clone()
}

pub fn position(game: &Game, slot: usize) -> Vec2 {
    game.world()
        .get::<Transform>(player_entity(game, slot))
        .expect("transform component")
        .position
}

pub fn set_position(game: &mut Game, slot: usize, position: Vec2) {
    let entity = player_entity(game, slot);
    game.world_mut()
        .get_mut::<Transform>(entity)
        .expect("transform component")
        .position = position;
}

pub fn set_facing(game: &mut Game, slot: usize, facing: f32) {
    let entity = player_entity(game, slot);
    game.world_mut()
        .get_mut::<Player>(entity)
        .expect("player component")
        .facing = facing;
}

pub fn move_frame(direction: Vec2) -> InputFrame {
    InputFrame {
        movement: direction,
        ..Default::default()
    }
}

/// Presses and immediately releases the action, producing an uncharged
/// throw on the second tick.
pub fn quick_throw(game: &mut Game, slot: usize) {
    game.set_player_input(
        slot,
        InputFrame {
            action_pressed: true,
            action_held: true,
            ..Default::default()
        },
    )
    .expect("valid slot");
    game.tick();
    game.set_player_input(
        slot,
        InputFrame {
            action_released: true,
            ..Default::default()
        },
    )
    .expect("valid slot");
    game.tick();
}

/// Collects every event of a matching kind from a drained batch.
pub fn events_matching(events: &[GameEvent], predicate: impl Fn(&GameEvent) -> bool) -> Vec<GameEvent> {
    events.iter().copied().filter(|event| predicate(event)).collect()
}
