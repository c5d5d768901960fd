//! Locomotion, dash, charge and possession behavior.

mod common;

use glam::Vec2;
use pretty_assertions::assert_eq;
use speculoos::prelude::*;

use common::*;
use ricochet_arena::constants::{boomerang, collider, mechanics};
use ricochet_arena::events::GameEvent;
use ricochet_arena::systems::components::{Boomerang, StatusEffects, StatusKind, Velocity};

#[test]
fn test_input_accelerates_player() {
    let mut game = duel();
    skip_ready(&mut game);
    let start = position(&game, 0);

    game.set_player_input(0, move_frame(Vec2::X)).unwrap();
    run_ticks(&mut game, 30);

    assert_that(&position(&game, 0).x).is_greater_than(start.x + 20.0);
}

#[test]
fn test_speed_is_clamped() {
    let mut game = duel();
    skip_ready(&mut game);

    game.set_player_input(0, move_frame(Vec2::X)).unwrap();
    run_ticks(&mut game, 120);

    let entity = player_entity(&game, 0);
    let velocity = game.world().get::<Velocity>(entity).unwrap().0;
    assert_that(&velocity.length()).is_less_than_or_equal_to(mechanics::MAX_SPEED + 1e-3);
}

#[test]
fn test_dash_overrides_speed_and_emits_event() {
    let mut game = duel();
    skip_ready(&mut game);
    game.drain_events();

    let mut frame = move_frame(Vec2::X);
    frame.dash_pressed = true;
    game.set_player_input(0, frame).unwrap();
    game.tick();

    let entity = player_entity(&game, 0);
    let velocity = game.world().get::<Velocity>(entity).unwrap().0;
    assert_that(&velocity.length()).is_close_to(mechanics::DASH_SPEED, 1e-3);

    let events = game.drain_events();
    assert_eq!(
        events_matching(&events, |e| matches!(e, GameEvent::Dash { player: 0 })).len(),
        1
    );
}

#[test]
fn test_dash_respects_cooldown() {
    let mut game = duel();
    skip_ready(&mut game);
    game.drain_events();

    let mut frame = move_frame(Vec2::X);
    frame.dash_pressed = true;
    game.set_player_input(0, frame).unwrap();
    game.tick();
    game.drain_events();

    // A second press right away must be ignored
    let mut frame = move_frame(Vec2::X);
    frame.dash_pressed = true;
    game.set_player_input(0, frame).unwrap();
    game.tick();

    let events = game.drain_events();
    assert_eq!(
        events_matching(&events, |e| matches!(e, GameEvent::Dash { .. })).len(),
        0
    );
}

#[test]
fn test_boundary_stops_and_reports_hard_impacts() {
    let mut game = duel();
    skip_ready(&mut game);
    game.drain_events();

    set_position(&mut game, 0, Vec2::new(20.0, 180.0));
    let mut frame = move_frame(Vec2::NEG_X);
    frame.dash_pressed = true;
    game.set_player_input(0, frame).unwrap();
    run_ticks(&mut game, 4);

    assert_that(&position(&game, 0).x).is_greater_than_or_equal_to(collider::PLAYER_RADIUS - 1e-3);
    let events = game.drain_events();
    assert!(
        !events_matching(&events, |e| matches!(e, GameEvent::WallHit { player: 0, .. })).is_empty(),
        "a full-speed dash into the boundary must report a wall hit"
    );
}

#[test]
fn test_throw_flips_possession_and_catch_restores_it() {
    let mut game = duel();
    skip_ready(&mut game);
    game.drain_events();

    // Throw away from the opponent so nothing interrupts the flight
    set_facing(&mut game, 0, std::f32::consts::PI);
    quick_throw(&mut game, 0);

    assert!(!player(&game, 0).has_boomerang);
    let events = game.drain_events();
    assert_eq!(
        events_matching(&events, |e| matches!(e, GameEvent::Throw { player: 0 })).len(),
        1
    );

    run_ticks(&mut game, 400);

    assert!(player(&game, 0).has_boomerang, "flight always ends in possession");
    let events = game.drain_events();
    assert!(
        !events_matching(&events, |e| matches!(e, GameEvent::Catch { player: 0 })).is_empty(),
        "an unobstructed return should be caught"
    );
}

#[test]
fn test_events_outlive_the_tick_that_emitted_them() {
    let mut game = duel();
    skip_ready(&mut game);
    game.drain_events();

    set_facing(&mut game, 0, std::f32::consts::PI);
    quick_throw(&mut game, 0);
    run_ticks(&mut game, 10);

    // A consumer polling far slower than the simulation still sees the throw
    let events = game.drain_events();
    assert_eq!(
        events_matching(&events, |e| matches!(e, GameEvent::Throw { player: 0 })).len(),
        1
    );
    assert!(game.drain_events().is_empty(), "a drain empties the queue");
}

#[test]
fn test_charge_scales_throw_speed() {
    let mut game = duel();
    skip_ready(&mut game);

    set_facing(&mut game, 0, std::f32::consts::PI);
    game.set_player_input(
        0,
        ricochet_arena::systems::components::InputFrame {
            action_pressed: true,
            action_held: true,
            ..Default::default()
        },
    )
    .unwrap();
    run_ticks(&mut game, mechanics::CHARGE_MAX_TICKS + 5);
    game.set_player_input(
        0,
        ricochet_arena::systems::components::InputFrame {
            action_released: true,
            ..Default::default()
        },
    )
    .unwrap();
    game.tick();

    let mut query = game.world_mut().query::<(&Boomerang, &Velocity)>();
    let speeds: Vec<f32> = query.iter(game.world()).map(|(_, v)| v.0.length()).collect();
    assert_eq!(speeds.len(), 1);
    // Full charge releases near the speed ceiling; one tick of outbound
    // decay has already applied.
    assert_that(&speeds[0]).is_greater_than(boomerang::THROW_SPEED_MAX * 0.9);
}

#[test]
fn test_frozen_player_cannot_move() {
    let mut game = duel();
    skip_ready(&mut game);

    let entity = player_entity(&game, 0);
    game.world_mut()
        .get_mut::<StatusEffects>(entity)
        .unwrap()
        .apply(StatusKind::Freeze, 30, -1);

    let start = position(&game, 0);
    game.set_player_input(0, move_frame(Vec2::X)).unwrap();
    run_ticks(&mut game, 10);

    assert_eq!(position(&game, 0), start);
}
