//! Contact resolution: overlap geometry, player/player separation,
//! projectile hits, wall bounces, pickups and elemental trails.
//!
//! All tests are circle-vs-shape; players, projectiles, pickups and trails
//! are circles, while walls and terrain zones may be circles, rects or
//! convex polygons.

use bevy_ecs::{
    entity::Entity,
    event::EventWriter,
    query::{With, Without},
    system::{Commands, Query, ResMut},
};
use glam::Vec2;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::constants::{boomerang, physics, status};
use crate::events::GameEvent;
use crate::systems::components::{
    Boomerang, Collider, Dash, ElementFlags, FlightPhase, Player, Powerup, PowerupKind, Shape, StatusEffects,
    StatusKind, Trail, TrailElement, Transform, Velocity, Wall,
};
use crate::systems::state::MatchState;

/// Resolved contact: push-out direction for the circle, and depth.
pub struct Contact {
    pub normal: Vec2,
    pub depth: f32,
}

/// Circle-vs-shape penetration test. The shape sits at `shape_transform`
/// (scale applies to circles and rects; polygons carry world-sized
/// vertices). Returns the direction to push the circle out, and by how far.
pub fn penetration(center: Vec2, radius: f32, shape_transform: &Transform, shape: &Shape) -> Option<Contact> {
    match shape {
        Shape::Circle { radius: other } => {
            circle_circle(center, radius, shape_transform.position, other * shape_transform.scale)
        }
        Shape::Rect { half_extents } => circle_rect(
            center,
            radius,
            shape_transform.position,
            *half_extents * shape_transform.scale,
        ),
        Shape::Polygon { vertices } => circle_polygon(center, radius, shape_transform.position, vertices),
    }
}

/// Boolean form of [`penetration`] for systems that only need overlap.
pub fn overlaps(center: Vec2, radius: f32, shape_transform: &Transform, shape: &Shape) -> bool {
    penetration(center, radius, shape_transform, shape).is_some()
}

pub fn circle_circle(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> Option<Contact> {
    let delta = a - b;
    let distance = delta.length();
    let depth = radius_a + radius_b - distance;
    if depth <= 0.0 {
        return None;
    }
    let normal = if distance > f32::EPSILON { delta / distance } else { Vec2::X };
    Some(Contact { normal, depth })
}

pub fn circle_rect(center: Vec2, radius: f32, rect_center: Vec2, half_extents: Vec2) -> Option<Contact> {
    let local = center - rect_center;
    let clamped = local.clamp(-half_extents, half_extents);
    if local != clamped {
        // Circle center outside the rect: test against the closest perimeter point
        let delta = local - clamped;
        let distance = delta.length();
        if distance >= radius {
            return None;
        }
        let normal = if distance > f32::EPSILON { delta / distance } else { Vec2::X };
        Some(Contact {
            normal,
            depth: radius - distance,
        })
    } else {
        // Center inside: push out along the axis of least penetration
        let slack_x = half_extents.x - local.x.abs();
        let slack_y = half_extents.y - local.y.abs();
        if slack_x < slack_y {
            let sign = if local.x >= 0.0 { 1.0 } else { -1.0 };
            Some(Contact {
                normal: Vec2::new(sign, 0.0),
                depth: radius + slack_x,
            })
        } else {
            let sign = if local.y >= 0.0 { 1.0 } else { -1.0 };
            Some(Contact {
                normal: Vec2::new(0.0, sign),
                depth: radius + slack_y,
            })
        }
    }
}

/// Convex polygon, counter-clockwise winding, vertices in local space.
pub fn circle_polygon(center: Vec2, radius: f32, origin: Vec2, vertices: &[Vec2]) -> Option<Contact> {
    let count = vertices.len();
    if count < 3 {
        return None;
    }

    let mut inside = true;
    // Most positive signed distance across edges; negative while inside
    let mut max_signed = f32::NEG_INFINITY;
    let mut escape_normal = Vec2::X;
    let mut closest_point = origin + vertices[0];
    let mut closest_dist_sq = f32::INFINITY;

    for i in 0..count {
        let a = origin + vertices[i];
        let b = origin + vertices[(i + 1) % count];
        let edge = b - a;
        // CCW winding puts the interior to the left; outward is the right normal
        let outward = Vec2::new(edge.y, -edge.x).normalize_or_zero();
        let signed = (center - a).dot(outward);
        if signed > 0.0 {
            inside = false;
        }
        if signed > max_signed {
            max_signed = signed;
            escape_normal = outward;
        }

        let t = ((center - a).dot(edge) / edge.length_squared().max(f32::EPSILON)).clamp(0.0, 1.0);
        let point = a + edge * t;
        let dist_sq = center.distance_squared(point);
        if dist_sq < closest_dist_sq {
            closest_dist_sq = dist_sq;
            closest_point = point;
        }
    }

    if inside {
        return Some(Contact {
            normal: escape_normal,
            depth: radius - max_signed,
        });
    }

    let distance = closest_dist_sq.sqrt();
    if distance >= radius {
        return None;
    }
    let delta = center - closest_point;
    let normal = if distance > f32::EPSILON {
        delta / distance
    } else {
        escape_normal
    };
    Some(Contact {
        normal,
        depth: radius - distance,
    })
}

pub fn reflect(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

pub fn circle_radius(collider: &Collider, scale: f32) -> f32 {
    match &collider.shape {
        Shape::Circle { radius } => radius * scale,
        Shape::Rect { half_extents } => half_extents.max_element() * scale,
        Shape::Polygon { .. } => 0.0,
    }
}

/// Marks a player dead and books the kill. Safe to call twice in a tick;
/// only the first call counts.
pub(crate) fn kill_player(
    player: &mut Player,
    position: Vec2,
    killer: Option<u8>,
    match_state: &mut MatchState,
    events: &mut EventWriter<GameEvent>,
) {
    if !player.alive {
        return;
    }
    player.alive = false;

    if let Some(record) = match_state.records.get_mut(player.id as usize) {
        record.deaths += 1;
    }
    if let Some(killer_id) = killer {
        if killer_id != player.id {
            if let Some(record) = match_state.records.get_mut(killer_id as usize) {
                record.kills += 1;
            }
        }
    }
    match_state.deaths_this_tick += 1;
    debug!(victim = player.id, ?killer, "Player killed");
    events.write(GameEvent::Death {
        victim: player.id,
        killer,
        position,
    });
}

/// Symmetric push-apart for overlapping living players, with a knockback
/// bias toward whichever one is mid-dash.
pub fn player_collision_system(
    mut events: EventWriter<GameEvent>,
    mut players: Query<(&Player, &mut Transform, &mut Velocity, &Collider, &Dash)>,
) {
    let mut pairs = players.iter_combinations_mut();
    while let Some([(pa, mut ta, mut va, ca, da), (pb, mut tb, mut vb, cb, db)]) = pairs.fetch_next() {
        if !pa.alive || !pb.alive {
            continue;
        }
        let ra = circle_radius(ca, ta.scale);
        let rb = circle_radius(cb, tb.scale);
        let Some(contact) = circle_circle(tb.position, rb, ta.position, ra) else {
            continue;
        };
        // contact.normal points from a toward b
        let normal = contact.normal;
        ta.position -= normal * contact.depth * 0.5;
        tb.position += normal * contact.depth * 0.5;

        let closing = (va.0 - vb.0).dot(normal);
        if closing > 0.0 {
            let impulse = closing * physics::SEPARATION_IMPULSE;
            va.0 -= normal * impulse;
            vb.0 += normal * impulse;
        }
        if da.is_active() && !db.is_active() {
            vb.0 += normal * physics::DASH_KNOCKBACK;
        }
        if db.is_active() && !da.is_active() {
            va.0 -= normal * physics::DASH_KNOCKBACK;
        }

        events.write(GameEvent::PlayerCollide { a: pa.id, b: pb.id });
    }
}

/// Projectile-vs-player resolution: catches, shield blocks, freezes, kills.
///
/// A projectile that despawns on impact hands possession back to its owner
/// when it was the owner's last live projectile, so throw capability is
/// never stranded.
#[allow(clippy::type_complexity)]
pub fn boomerang_player_system(
    mut commands: Commands,
    mut match_state: ResMut<MatchState>,
    mut events: EventWriter<GameEvent>,
    mut boomerangs: Query<(Entity, &mut Boomerang, &mut Transform, &mut Velocity, &Collider)>,
    mut players: Query<(&mut Player, &Transform, &mut StatusEffects, &Collider), Without<Boomerang>>,
) {
    let mut live_per_owner = [0u8; 4];
    for (_, boomerang, _, _, _) in boomerangs.iter() {
        live_per_owner[boomerang.owner as usize] += 1;
    }
    let mut restore_owners: SmallVec<[u8; 4]> = SmallVec::new();

    'projectile: for (entity, mut boomerang, mut boom_transform, mut boom_velocity, boom_collider) in
        boomerangs.iter_mut()
    {
        let boom_radius = circle_radius(boom_collider, boom_transform.scale);

        for (mut player, player_transform, mut statuses, player_collider) in players.iter_mut() {
            if !player.alive {
                continue;
            }
            let own = boomerang.owner == player.id;
            let mut player_radius = circle_radius(player_collider, player_transform.scale);
            if own && statuses.has(StatusKind::Magnet) {
                player_radius += status::MAGNET_CATCH_BONUS;
            }

            let delta = boom_transform.position - player_transform.position;
            if delta.length() > boom_radius + player_radius {
                continue;
            }

            if own {
                if boomerang.is_returning() && player.catch_cooldown == 0 {
                    player.has_boomerang = true;
                    live_per_owner[boomerang.owner as usize] -= 1;
                    commands.entity(entity).despawn();
                    trace!(player = player.id, "Boomerang caught");
                    events.write(GameEvent::Catch { player: player.id });
                    continue 'projectile;
                }
                // A freshly thrown projectile is still leaving its owner's body
                if let FlightPhase::Outbound { age } = boomerang.phase {
                    if age < boomerang::FRESH_AGE_TICKS {
                        continue;
                    }
                }
            }

            if player.shield_charges > 0 {
                player.shield_charges -= 1;
                let normal = delta.normalize_or_zero();
                boom_velocity.0 = reflect(boom_velocity.0, normal);
                boom_transform.position = player_transform.position + normal * (boom_radius + player_radius + 1.0);
                events.write(GameEvent::ShieldBlock { player: player.id });
                continue 'projectile;
            }

            if boomerang.elements.contains(ElementFlags::ICE) {
                if !statuses.has(StatusKind::Freeze) {
                    statuses.apply(StatusKind::Freeze, status::FREEZE_TICKS, boomerang.owner as i8);
                    events.write(GameEvent::Freeze { player: player.id });
                }
                continue;
            }

            let position = player_transform.position;
            kill_player(&mut player, position, Some(boomerang.owner), &mut match_state, &mut events);

            live_per_owner[boomerang.owner as usize] -= 1;
            if live_per_owner[boomerang.owner as usize] == 0 {
                restore_owners.push(boomerang.owner);
            }
            commands.entity(entity).despawn();
            continue 'projectile;
        }
    }

    // Possession restore for owners whose last projectile despawned on impact
    for owner in restore_owners {
        for (mut player, _, _, _) in players.iter_mut() {
            if player.id == owner && player.alive && !player.has_boomerang {
                player.has_boomerang = true;
                debug!(player = owner, "Possession restored after impact despawn");
            }
        }
    }
}

/// Projectile-vs-wall bounce. Over the bounce cap the projectile flips to
/// returning but still reflects. Piercing projectiles ignore interior walls.
pub fn boomerang_wall_system(
    mut events: EventWriter<GameEvent>,
    mut boomerangs: Query<(&mut Boomerang, &mut Transform, &mut Velocity, &Collider)>,
    walls: Query<(&Transform, &Collider), (With<Wall>, Without<Boomerang>)>,
) {
    for (mut boomerang, mut transform, mut velocity, collider) in boomerangs.iter_mut() {
        let radius = circle_radius(collider, transform.scale);

        // Arena boundary reflects every projectile, piercing or not
        let bounds = crate::constants::ARENA_SIZE;
        let mut boundary_hit = false;
        if transform.position.x < radius && velocity.0.x < 0.0 {
            transform.position.x = radius;
            velocity.0.x = -velocity.0.x;
            boundary_hit = true;
        } else if transform.position.x > bounds.x - radius && velocity.0.x > 0.0 {
            transform.position.x = bounds.x - radius;
            velocity.0.x = -velocity.0.x;
            boundary_hit = true;
        }
        if transform.position.y < radius && velocity.0.y < 0.0 {
            transform.position.y = radius;
            velocity.0.y = -velocity.0.y;
            boundary_hit = true;
        } else if transform.position.y > bounds.y - radius && velocity.0.y > 0.0 {
            transform.position.y = bounds.y - radius;
            velocity.0.y = -velocity.0.y;
            boundary_hit = true;
        }
        if boundary_hit {
            register_bounce(&mut boomerang, transform.position, &mut events);
        }

        if boomerang.elements.contains(ElementFlags::PIERCE) {
            continue;
        }

        for (wall_transform, wall_collider) in walls.iter() {
            if let Some(contact) = penetration(transform.position, radius, wall_transform, &wall_collider.shape) {
                transform.position += contact.normal * contact.depth;
                velocity.0 = reflect(velocity.0, contact.normal);
                register_bounce(&mut boomerang, transform.position, &mut events);
            }
        }
    }
}

fn register_bounce(boomerang: &mut Boomerang, position: Vec2, events: &mut EventWriter<GameEvent>) {
    if boomerang.bounces >= boomerang.max_bounces && !boomerang.is_returning() {
        boomerang.phase = FlightPhase::Returning { elapsed: 0 };
        trace!(owner = boomerang.owner, "Bounce cap reached, returning");
    }
    boomerang.bounces = boomerang.bounces.saturating_add(1);
    events.write(GameEvent::Bounce { position });
}

/// Pickup collection. Shield sets charges directly; everything else maps to
/// a timed status effect.
#[allow(clippy::type_complexity)]
pub fn pickup_collection_system(
    mut commands: Commands,
    mut events: EventWriter<GameEvent>,
    pickups: Query<(Entity, &Powerup, &Transform, &Collider), Without<Player>>,
    mut players: Query<(&mut Player, &Transform, &mut StatusEffects, &Collider)>,
) {
    for (entity, powerup, pickup_transform, pickup_collider) in pickups.iter() {
        let pickup_radius = circle_radius(pickup_collider, pickup_transform.scale);
        for (mut player, player_transform, mut statuses, player_collider) in players.iter_mut() {
            if !player.alive {
                continue;
            }
            let player_radius = circle_radius(player_collider, player_transform.scale);
            if pickup_transform.position.distance(player_transform.position) > pickup_radius + player_radius {
                continue;
            }

            match powerup.kind {
                PowerupKind::Shield => player.shield_charges = status::SHIELD_CHARGES,
                PowerupKind::Triple => statuses.apply(StatusKind::Triple, status::TRIPLE_TICKS, player.id as i8),
                PowerupKind::Big => statuses.apply(StatusKind::Big, status::BIG_TICKS, player.id as i8),
                PowerupKind::Fire => statuses.apply(StatusKind::Fire, status::FIRE_TICKS, player.id as i8),
                PowerupKind::Ice => statuses.apply(StatusKind::Ice, status::ICE_TICKS, player.id as i8),
                PowerupKind::Pierce => statuses.apply(StatusKind::Pierce, status::PIERCE_TICKS, player.id as i8),
                PowerupKind::LongThrow => {
                    statuses.apply(StatusKind::LongThrow, status::LONG_THROW_TICKS, player.id as i8)
                }
                PowerupKind::Magnet => statuses.apply(StatusKind::Magnet, status::MAGNET_TICKS, player.id as i8),
            }

            commands.entity(entity).despawn();
            debug!(player = player.id, kind = %powerup.kind, "Powerup collected");
            events.write(GameEvent::PowerupCollect {
                player: player.id,
                kind: powerup.kind,
            });
            break;
        }
    }
}

/// Elemental trail contact: fire trails ignite, ice trails freeze. A trail
/// never harms its owner.
#[allow(clippy::type_complexity)]
pub fn trail_overlap_system(
    mut events: EventWriter<GameEvent>,
    trails: Query<(&Trail, &Transform, &Collider), Without<Player>>,
    mut players: Query<(&Player, &Transform, &mut StatusEffects, &Collider)>,
) {
    for (trail, trail_transform, trail_collider) in trails.iter() {
        let trail_radius = circle_radius(trail_collider, trail_transform.scale);
        for (player, player_transform, mut statuses, player_collider) in players.iter_mut() {
            if !player.alive || trail.owner == player.id {
                continue;
            }
            let player_radius = circle_radius(player_collider, player_transform.scale);
            if trail_transform.position.distance(player_transform.position) > trail_radius + player_radius {
                continue;
            }
            match trail.element {
                TrailElement::Fire => {
                    if !statuses.has(StatusKind::Burn) {
                        statuses.apply(StatusKind::Burn, status::BURN_TICKS, trail.owner as i8);
                        events.write(GameEvent::Burn { player: player.id });
                    }
                }
                TrailElement::Ice => {
                    if !statuses.has(StatusKind::Freeze) {
                        statuses.apply(StatusKind::Freeze, status::FREEZE_TICKS, trail.owner as i8);
                        events.write(GameEvent::Freeze { player: player.id });
                    }
                }
            }
        }
    }
}
