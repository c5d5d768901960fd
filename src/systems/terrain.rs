//! Arena hazards: water, portals, boulders, the shrinking ring and the
//! pickup spawner.

use bevy_ecs::{
    entity::Entity,
    event::EventWriter,
    query::{With, Without},
    system::{Commands, Query, ResMut},
};
use glam::Vec2;
use rand::Rng;
use strum::IntoEnumIterator;
use tracing::{debug, trace};

use crate::constants::{self, boulder, collider, mechanics, powerup, status};
use crate::events::GameEvent;
use crate::systems::collision::{circle_radius, kill_player, overlaps};
use crate::systems::components::{
    Boulder, BoulderSpawner, Collider, Dash, HazardRing, Player, Portal, Powerup, PowerupKind, PowerupTimer, SimRng,
    StatusEffects, StatusKind, TerrainKind, TerrainZone, Transform, Velocity,
};
use crate::systems::state::MatchState;

/// Water drowns any non-dashing player overlapping it; a dash skims
/// across safely. Entering water always cleanses burn.
#[allow(clippy::type_complexity)]
pub fn water_system(
    mut match_state: ResMut<MatchState>,
    mut events: EventWriter<GameEvent>,
    zones: Query<(&Transform, &Collider, &TerrainZone), Without<Player>>,
    mut players: Query<(&mut Player, &Transform, &mut StatusEffects, &Collider, &Dash)>,
) {
    for (mut player, transform, mut statuses, player_collider, dash) in players.iter_mut() {
        if !player.alive {
            continue;
        }
        let radius = circle_radius(player_collider, transform.scale);
        for (zone_transform, zone_collider, zone) in zones.iter() {
            if zone.kind != TerrainKind::Water {
                continue;
            }
            if overlaps(transform.position, radius, zone_transform, &zone_collider.shape) {
                statuses.clear(StatusKind::Burn);
                if !dash.is_active() {
                    let position = transform.position;
                    kill_player(&mut player, position, None, &mut match_state, &mut events);
                }
                break;
            }
        }
    }
}

/// Teleports players who touch a portal to its linked twin. A short
/// per-player cooldown stops immediate ping-ponging back.
pub fn portal_system(
    mut events: EventWriter<GameEvent>,
    portals: Query<(&Portal, &Transform, &Collider), Without<Player>>,
    mut players: Query<(&mut Player, &mut Transform, &Collider)>,
) {
    for (mut player, mut transform, player_collider) in players.iter_mut() {
        if !player.alive || player.portal_cooldown > 0 {
            continue;
        }
        let radius = circle_radius(player_collider, transform.scale);
        for (portal, portal_transform, portal_collider) in portals.iter() {
            if !overlaps(transform.position, radius, portal_transform, &portal_collider.shape) {
                continue;
            }
            let Some((_, exit_transform, _)) = portals.iter().find(|(other, _, _)| other.id == portal.link) else {
                continue;
            };
            transform.position = exit_transform.position;
            player.portal_cooldown = mechanics::PORTAL_COOLDOWN_TICKS;
            trace!(player = player.id, portal = portal.id, "Teleported");
            events.write(GameEvent::PortalTeleport { player: player.id });
            break;
        }
    }
}

/// Spawns boulders on their timers, rolls live ones across the arena and
/// crushes players they touch. Boulders despawn once safely off-arena.
#[allow(clippy::type_complexity)]
pub fn boulder_system(
    mut commands: Commands,
    mut match_state: ResMut<MatchState>,
    mut events: EventWriter<GameEvent>,
    mut spawners: Query<(&mut BoulderSpawner, &Transform), (Without<Boulder>, Without<Player>)>,
    mut boulders: Query<(Entity, &mut Transform, &Velocity, &Collider), (With<Boulder>, Without<Player>)>,
    mut players: Query<(&mut Player, &Transform, &Collider), Without<Boulder>>,
) {
    let time_scale = match_state.time_scale();

    for (mut spawner, spawner_transform) in spawners.iter_mut() {
        spawner.timer = spawner.timer.saturating_sub(1);
        if spawner.timer == 0 {
            spawner.timer = spawner.interval;
            commands.spawn((
                Boulder,
                Transform::from_position(spawner_transform.position),
                Velocity(spawner.direction * boulder::SPEED),
                Collider::circle(collider::BOULDER_RADIUS),
            ));
            debug!(position = ?spawner_transform.position, "Boulder spawned");
        }
    }

    let bounds = constants::ARENA_SIZE;
    for (entity, mut transform, velocity, boulder_collider) in boulders.iter_mut() {
        transform.position += velocity.0 * time_scale;

        let margin = boulder::DESPAWN_MARGIN;
        if transform.position.x < -margin
            || transform.position.x > bounds.x + margin
            || transform.position.y < -margin
            || transform.position.y > bounds.y + margin
        {
            commands.entity(entity).despawn();
            continue;
        }

        let boulder_radius = circle_radius(boulder_collider, transform.scale);
        for (mut player, player_transform, player_collider) in players.iter_mut() {
            if !player.alive {
                continue;
            }
            let player_radius = circle_radius(player_collider, player_transform.scale);
            if transform.position.distance(player_transform.position) <= boulder_radius + player_radius {
                let position = player_transform.position;
                kill_player(&mut player, position, None, &mut match_state, &mut events);
            }
        }
    }
}

/// Shrinks the hazard ring toward its floor and ignites players caught
/// outside it.
pub fn hazard_ring_system(
    mut events: EventWriter<GameEvent>,
    mut rings: Query<(&mut HazardRing, &Transform), Without<Player>>,
    mut players: Query<(&Player, &Transform, &mut StatusEffects)>,
) {
    for (mut ring, ring_transform) in rings.iter_mut() {
        ring.radius = (ring.radius - ring.shrink_rate).max(ring.min_radius);

        for (player, transform, mut statuses) in players.iter_mut() {
            if !player.alive {
                continue;
            }
            if transform.position.distance(ring_transform.position) > ring.radius && !statuses.has(StatusKind::Burn) {
                statuses.apply(StatusKind::Burn, status::BURN_TICKS, -1);
                events.write(GameEvent::Burn { player: player.id });
            }
        }
    }
}

/// Periodically drops a random pickup at a random spot, capped by the
/// number already on the floor.
pub fn powerup_spawn_system(
    mut commands: Commands,
    mut timer: ResMut<PowerupTimer>,
    mut rng: ResMut<SimRng>,
    pickups: Query<(), With<Powerup>>,
) {
    timer.0 = timer.0.saturating_sub(1);
    if timer.0 > 0 {
        return;
    }
    timer.0 = powerup::SPAWN_INTERVAL_TICKS;

    if pickups.iter().count() >= powerup::MAX_ACTIVE {
        return;
    }

    let kinds: Vec<PowerupKind> = PowerupKind::iter().collect();
    let kind = kinds[rng.0.random_range(0..kinds.len())];
    let bounds = constants::ARENA_SIZE;
    let margin = powerup::SPAWN_MARGIN;
    let position = Vec2::new(
        rng.0.random_range(margin..bounds.x - margin),
        rng.0.random_range(margin..bounds.y - margin),
    );

    commands.spawn((
        Powerup { kind },
        Transform::from_position(position),
        Collider::circle(collider::PICKUP_RADIUS),
    ));
    debug!(%kind, ?position, "Powerup spawned");
}
