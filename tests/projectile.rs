//! Projectile flight phases, bounce behavior and end-of-life possession.

mod common;

use glam::Vec2;
use speculoos::prelude::*;

use common::*;
use ricochet_arena::constants::{boomerang, collider};
use ricochet_arena::events::GameEvent;
use ricochet_arena::systems::components::{
    Boomerang, BoomerangBundle, Collider, ElementFlags, FlightPhase, Player, Trail, Transform, Velocity,
};

fn spawn_boomerang_with(
    game: &mut ricochet_arena::game::Game,
    owner: u8,
    position: Vec2,
    velocity: Vec2,
    bounces: u8,
    elements: ElementFlags,
) {
    game.world_mut().spawn(BoomerangBundle {
        boomerang: Boomerang {
            owner,
            phase: FlightPhase::Outbound { age: 20 },
            lifetime: boomerang::LIFETIME_TICKS,
            bounces,
            max_bounces: boomerang::MAX_BOUNCES,
            big: false,
            elements,
            trail_timer: 0,
        },
        transform: Transform::from_position(position),
        velocity: Velocity(velocity),
        collider: Collider::circle(collider::BOOMERANG_RADIUS),
    });
}

#[test]
fn test_outbound_flight_flips_to_returning() {
    let mut game = duel();
    skip_ready(&mut game);

    set_facing(&mut game, 0, std::f32::consts::PI);
    quick_throw(&mut game, 0);

    let mut returned = false;
    for _ in 0..(boomerang::OUTBOUND_MAX_TICKS + 5) {
        game.tick();
        let mut query = game.world_mut().query::<&Boomerang>();
        if query.iter(game.world()).any(|b| b.is_returning()) {
            returned = true;
            break;
        }
    }
    assert!(returned, "outbound flight must flip within the age ceiling");
}

#[test]
fn test_bounce_over_cap_forces_return() {
    let mut game = duel();
    skip_ready(&mut game);
    game.drain_events();

    // Already at the cap, heading into the left boundary
    spawn_boomerang_with(
        &mut game,
        0,
        Vec2::new(8.0, 300.0),
        Vec2::new(-4.0, 0.0),
        boomerang::MAX_BOUNCES,
        ElementFlags::empty(),
    );
    run_ticks(&mut game, 3);

    let mut query = game.world_mut().query::<&Boomerang>();
    let boomerang = query.iter(game.world()).next().expect("projectile still alive");
    assert!(boomerang.is_returning(), "bounce past the cap must force the return");
    assert_that(&boomerang.bounces).is_greater_than(boomerang::MAX_BOUNCES);

    let events = game.drain_events();
    assert!(!events_matching(&events, |e| matches!(e, GameEvent::Bounce { .. })).is_empty());
}

#[test]
fn test_expiry_restores_owner_possession() {
    let mut game = duel();
    skip_ready(&mut game);

    let entity = player_entity(&game, 0);
    game.world_mut().get_mut::<Player>(entity).unwrap().has_boomerang = false;

    game.world_mut().spawn(BoomerangBundle {
        boomerang: Boomerang {
            owner: 0,
            phase: FlightPhase::Returning { elapsed: 0 },
            lifetime: 3,
            bounces: 0,
            max_bounces: boomerang::MAX_BOUNCES,
            big: false,
            elements: ElementFlags::empty(),
            trail_timer: 0,
        },
        transform: Transform::from_position(Vec2::new(320.0, 60.0)),
        velocity: Velocity(Vec2::ZERO),
        collider: Collider::circle(collider::BOOMERANG_RADIUS),
    });

    run_ticks(&mut game, 5);

    let mut query = game.world_mut().query::<&Boomerang>();
    assert_that(&query.iter(game.world()).count()).is_equal_to(0);
    assert!(
        player(&game, 0).has_boomerang,
        "losing the last projectile must hand possession back"
    );
}

#[test]
fn test_fire_element_drops_trails() {
    let mut game = duel();
    skip_ready(&mut game);

    spawn_boomerang_with(
        &mut game,
        0,
        Vec2::new(320.0, 300.0),
        Vec2::new(4.0, 0.0),
        0,
        ElementFlags::FIRE,
    );
    run_ticks(&mut game, boomerang::TRAIL_INTERVAL_TICKS * 3);

    let mut query = game.world_mut().query::<&Trail>();
    assert_that(&query.iter(game.world()).count()).is_greater_than(1);
}

#[test]
fn test_return_homes_toward_owner() {
    let mut game = duel();
    skip_ready(&mut game);

    let owner_position = position(&game, 0);
    let start = Vec2::new(480.0, 60.0);
    game.world_mut().spawn(BoomerangBundle {
        boomerang: Boomerang {
            owner: 0,
            phase: FlightPhase::Returning { elapsed: 0 },
            lifetime: boomerang::LIFETIME_TICKS,
            bounces: 0,
            max_bounces: boomerang::MAX_BOUNCES,
            big: false,
            elements: ElementFlags::empty(),
            trail_timer: 0,
        },
        transform: Transform::from_position(start),
        velocity: Velocity(Vec2::ZERO),
        collider: Collider::circle(collider::BOOMERANG_RADIUS),
    });

    run_ticks(&mut game, 30);

    let mut query = game.world_mut().query::<(&Boomerang, &Transform)>();
    let (_, transform) = query.iter(game.world()).next().expect("projectile alive");
    assert_that(&transform.position.distance(owner_position)).is_less_than(start.distance(owner_position));
}
