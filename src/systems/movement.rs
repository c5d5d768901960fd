//! Player locomotion, dash, charge-aim and status countdown.
//!
//! Runs once per tick for living players; frozen players are suspended
//! entirely. Boundary response reflects the relevant velocity component
//! with an impact-speed-scaled coefficient.

use bevy_ecs::{
    event::EventWriter,
    query::Without,
    system::{Commands, Query, Res, ResMut},
};
use glam::Vec2;
use smallvec::{smallvec, SmallVec};
use tracing::{debug, trace};

use crate::constants::{self, boomerang, collider, mechanics, physics};
use crate::events::GameEvent;
use crate::systems::collision::{circle_radius, kill_player, overlaps};
use crate::systems::components::{
    Boomerang, BoomerangBundle, Charge, Collider, Dash, ElementFlags, FlightPhase, InputFrame, Player, StatusEffects,
    StatusKind, TerrainKind, TerrainZone, Transform, Velocity,
};
use crate::systems::state::MatchState;

/// Rotates `current` toward `target` by at most `rate` radians, wrap-aware.
pub fn turn_toward(current: f32, target: f32, rate: f32) -> f32 {
    let diff = (target - current + std::f32::consts::PI).rem_euclid(std::f32::consts::TAU) - std::f32::consts::PI;
    current + diff.clamp(-rate, rate)
}

/// Boundary bounce coefficient: base blended with impact speed, capped.
/// These constants are behavioral configuration, not derived physics.
fn bounce_coefficient(impact_speed: f32) -> f32 {
    (physics::BOUNCE_BASE + impact_speed * physics::BOUNCE_IMPACT_SCALE).min(physics::BOUNCE_MAX)
}

/// Ticks status-effect timers. Burn that runs out uncleaned kills its
/// victim; freeze pins velocity to zero for its whole duration.
pub fn status_system(
    mut match_state: ResMut<MatchState>,
    mut events: EventWriter<GameEvent>,
    mut players: Query<(&mut Player, &Transform, &mut Velocity, &mut StatusEffects)>,
) {
    for (mut player, transform, mut velocity, mut statuses) in players.iter_mut() {
        if !player.alive {
            continue;
        }

        let mut burn_expired: Option<i8> = None;
        statuses.0.retain(|effect| {
            effect.remaining = effect.remaining.saturating_sub(1);
            if effect.remaining == 0 {
                if effect.kind == StatusKind::Burn {
                    burn_expired = Some(effect.source);
                }
                false
            } else {
                true
            }
        });

        if statuses.has(StatusKind::Freeze) {
            velocity.0 = Vec2::ZERO;
        }

        if let Some(source) = burn_expired {
            let killer = if source >= 0 { Some(source as u8) } else { None };
            let position = transform.position;
            events.write(GameEvent::BurnKill { player: player.id });
            kill_player(&mut player, position, killer, &mut match_state, &mut events);
        }
    }
}

/// Locomotion for living, non-frozen players: input acceleration, friction
/// (ice-aware), speed clamp, dash override, charge-aim, integration and
/// arena-boundary response.
#[allow(clippy::type_complexity)]
pub fn player_movement_system(
    mut commands: Commands,
    match_state: Res<MatchState>,
    mut events: EventWriter<GameEvent>,
    mut players: Query<(
        &mut Player,
        &mut Transform,
        &mut Velocity,
        &mut Dash,
        &mut Charge,
        &StatusEffects,
        &InputFrame,
        &Collider,
    )>,
    zones: Query<(&Transform, &Collider, &TerrainZone), Without<Player>>,
) {
    let time_scale = match_state.time_scale();

    for (mut player, mut transform, mut velocity, mut dash, mut charge, statuses, input, player_collider) in
        players.iter_mut()
    {
        if !player.alive {
            continue;
        }

        player.catch_cooldown = player.catch_cooldown.saturating_sub(1);
        player.portal_cooldown = player.portal_cooldown.saturating_sub(1);

        if statuses.has(StatusKind::Freeze) {
            velocity.0 = Vec2::ZERO;
            continue;
        }

        let radius = circle_radius(player_collider, transform.scale);

        // Dash is a timed override; it cannot start while charging.
        if input.dash_pressed && *dash == Dash::Ready && !charge.is_holding() {
            let direction = if input.movement.length_squared() > 0.01 {
                input.movement.normalize()
            } else {
                Vec2::from_angle(player.facing)
            };
            *dash = Dash::Active {
                remaining: mechanics::DASH_TICKS,
                direction,
            };
            trace!(player = player.id, "Dash started");
            events.write(GameEvent::Dash { player: player.id });
        }

        match *dash {
            Dash::Active { remaining, direction } => {
                velocity.0 = direction * mechanics::DASH_SPEED;
                *dash = if remaining <= 1 {
                    Dash::Cooldown {
                        remaining: mechanics::DASH_COOLDOWN_TICKS,
                    }
                } else {
                    Dash::Active {
                        remaining: remaining - 1,
                        direction,
                    }
                };
            }
            Dash::Cooldown { remaining } => {
                *dash = if remaining <= 1 {
                    Dash::Ready
                } else {
                    Dash::Cooldown { remaining: remaining - 1 }
                };
            }
            Dash::Ready => {}
        }

        if !dash.is_active() {
            velocity.0 += input.movement.clamp_length_max(1.0) * mechanics::ACCELERATION;
            let friction = ice_friction_at(transform.position, radius, &zones).unwrap_or(mechanics::FRICTION);
            velocity.0 *= friction;
            velocity.0 = velocity.0.clamp_length_max(mechanics::MAX_SPEED);
        }

        // Charge-aim: holding accumulates charge and stiffens the aim.
        match *charge {
            Charge::Idle => {
                if input.action_pressed && player.has_boomerang {
                    *charge = Charge::Holding { ticks: 0 };
                } else if input.movement.length_squared() > 0.01 {
                    player.facing = turn_toward(player.facing, input.movement.to_angle(), mechanics::TURN_RATE);
                }
            }
            Charge::Holding { ticks } => {
                if input.action_released || !input.action_held {
                    if player.has_boomerang {
                        release_throw(&mut commands, &mut events, &mut player, &transform, statuses, ticks);
                    }
                    *charge = Charge::Idle;
                } else {
                    let ticks = (ticks + 1).min(mechanics::CHARGE_MAX_TICKS);
                    if input.movement.length_squared() > 0.01 {
                        let ratio = ticks as f32 / mechanics::CHARGE_MAX_TICKS as f32;
                        let rate = mechanics::TURN_RATE * (1.0 - mechanics::CHARGE_TURN_PENALTY * ratio);
                        player.facing = turn_toward(player.facing, input.movement.to_angle(), rate);
                    }
                    *charge = Charge::Holding { ticks };
                }
            }
        }

        transform.position += velocity.0 * time_scale;

        resolve_boundary(&mut transform, &mut velocity, radius, player.id, &mut events);
    }
}

/// Friction override if the position overlaps an ice zone.
fn ice_friction_at(
    position: Vec2,
    radius: f32,
    zones: &Query<(&Transform, &Collider, &TerrainZone), Without<Player>>,
) -> Option<f32> {
    for (zone_transform, zone_collider, zone) in zones.iter() {
        if let TerrainKind::Ice { friction } = zone.kind {
            if overlaps(position, radius, zone_transform, &zone_collider.shape) {
                return Some(friction);
            }
        }
    }
    None
}

/// Reflects the relevant velocity component off the arena boundary with an
/// impact-dependent coefficient (faster impact, stronger bounce, capped).
fn resolve_boundary(
    transform: &mut Transform,
    velocity: &mut Velocity,
    radius: f32,
    player_id: u8,
    events: &mut EventWriter<GameEvent>,
) {
    let bounds = constants::ARENA_SIZE;
    let mut strongest_impact = 0.0f32;

    if transform.position.x < radius {
        transform.position.x = radius;
        if velocity.0.x < 0.0 {
            let impact = -velocity.0.x;
            velocity.0.x = impact * bounce_coefficient(impact);
            strongest_impact = strongest_impact.max(impact);
        }
    } else if transform.position.x > bounds.x - radius {
        transform.position.x = bounds.x - radius;
        if velocity.0.x > 0.0 {
            let impact = velocity.0.x;
            velocity.0.x = -impact * bounce_coefficient(impact);
            strongest_impact = strongest_impact.max(impact);
        }
    }

    if transform.position.y < radius {
        transform.position.y = radius;
        if velocity.0.y < 0.0 {
            let impact = -velocity.0.y;
            velocity.0.y = impact * bounce_coefficient(impact);
            strongest_impact = strongest_impact.max(impact);
        }
    } else if transform.position.y > bounds.y - radius {
        transform.position.y = bounds.y - radius;
        if velocity.0.y > 0.0 {
            let impact = velocity.0.y;
            velocity.0.y = -impact * bounce_coefficient(impact);
            strongest_impact = strongest_impact.max(impact);
        }
    }

    if strongest_impact >= physics::WALL_HIT_EVENT_SPEED {
        events.write(GameEvent::WallHit {
            player: player_id,
            speed: strongest_impact,
        });
    }
}

/// Spawns the thrown boomerang(s) and flips possession.
fn release_throw(
    commands: &mut Commands,
    events: &mut EventWriter<GameEvent>,
    player: &mut Player,
    transform: &Transform,
    statuses: &StatusEffects,
    charge_ticks: u32,
) {
    let ratio = (charge_ticks as f32 / mechanics::CHARGE_MAX_TICKS as f32).min(1.0);
    let speed = boomerang::THROW_SPEED_MIN + ratio * (boomerang::THROW_SPEED_MAX - boomerang::THROW_SPEED_MIN);

    let mut elements = ElementFlags::empty();
    if statuses.has(StatusKind::Fire) {
        elements |= ElementFlags::FIRE;
    }
    if statuses.has(StatusKind::Ice) {
        elements |= ElementFlags::ICE;
    }
    if statuses.has(StatusKind::Pierce) {
        elements |= ElementFlags::PIERCE;
    }
    if statuses.has(StatusKind::LongThrow) {
        elements |= ElementFlags::LONG_THROW;
    }
    let big = statuses.has(StatusKind::Big);

    let angles: SmallVec<[f32; 3]> = if statuses.has(StatusKind::Triple) {
        smallvec![-boomerang::TRIPLE_FAN_ANGLE, 0.0, boomerang::TRIPLE_FAN_ANGLE]
    } else {
        smallvec![0.0]
    };

    for offset in angles {
        let direction = Vec2::from_angle(player.facing + offset);
        commands.spawn(BoomerangBundle {
            boomerang: Boomerang {
                owner: player.id,
                phase: FlightPhase::Outbound { age: 0 },
                lifetime: boomerang::LIFETIME_TICKS,
                bounces: 0,
                max_bounces: boomerang::MAX_BOUNCES,
                big,
                elements,
                trail_timer: 0,
            },
            transform: Transform {
                position: transform.position + direction * (collider::PLAYER_RADIUS + 2.0),
                rotation: player.facing,
                scale: if big { boomerang::BIG_SCALE } else { 1.0 },
            },
            velocity: Velocity(direction * speed),
            collider: Collider::circle(collider::BOOMERANG_RADIUS),
        });
    }

    player.has_boomerang = false;
    player.catch_cooldown = mechanics::CATCH_COOLDOWN_TICKS;
    debug!(player = player.id, charge = charge_ticks, "Boomerang thrown");
    events.write(GameEvent::Throw { player: player.id });
}
