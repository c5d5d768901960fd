//! Projectile flight: outbound decay, the flip to homing return, spin,
//! elemental trail drops and end-of-life possession handling.

use bevy_ecs::{
    entity::Entity,
    query::Without,
    system::{Commands, Query, Res},
};
use tracing::{debug, trace};

use crate::constants::{boomerang, collider};
use crate::systems::components::{
    Boomerang, Collider, ElementFlags, FlightPhase, Player, StatusEffects, StatusKind, Trail, TrailElement, Transform,
    Velocity,
};
use crate::systems::lifetime::TimeToLive;
use crate::systems::state::MatchState;

/// Advances every live projectile one tick.
///
/// Outbound flight decays multiplicatively until the speed floor or age
/// ceiling flips it to returning; return flight homes on the living owner
/// at fixed speed. A projectile that expires hands possession back to its
/// owner when it was the owner's last one in flight.
#[allow(clippy::type_complexity)]
pub fn projectile_flight_system(
    mut commands: Commands,
    match_state: Res<MatchState>,
    mut boomerangs: Query<(Entity, &mut Boomerang, &mut Transform, &mut Velocity)>,
    mut owners: Query<(&mut Player, &Transform, &StatusEffects), Without<Boomerang>>,
) {
    let time_scale = match_state.time_scale();

    let mut live_per_owner = [0u8; 4];
    for (_, boomerang, _, _) in boomerangs.iter() {
        live_per_owner[boomerang.owner as usize] += 1;
    }

    for (entity, mut boomerang, mut transform, mut velocity) in boomerangs.iter_mut() {
        let extended = boomerang.elements.contains(ElementFlags::LONG_THROW);
        boomerang.lifetime = boomerang.lifetime.saturating_sub(1);
        let mut expired = boomerang.lifetime == 0;

        match boomerang.phase {
            FlightPhase::Outbound { age } => {
                let decay = if extended {
                    boomerang::OUTBOUND_DECAY_EXTENDED
                } else {
                    boomerang::OUTBOUND_DECAY
                };
                let speed_floor = if extended {
                    boomerang::RETURN_SPEED_FLOOR_EXTENDED
                } else {
                    boomerang::RETURN_SPEED_FLOOR
                };
                let age_ceiling = if extended {
                    boomerang::OUTBOUND_MAX_TICKS_EXTENDED
                } else {
                    boomerang::OUTBOUND_MAX_TICKS
                };

                velocity.0 *= decay;
                let age = age + 1;
                if velocity.0.length() < speed_floor || age > age_ceiling {
                    boomerang.phase = FlightPhase::Returning { elapsed: 0 };
                    trace!(owner = boomerang.owner, age, "Projectile turning back");
                } else {
                    boomerang.phase = FlightPhase::Outbound { age };
                }
            }
            FlightPhase::Returning { elapsed } => {
                let elapsed = elapsed + 1;
                if elapsed > boomerang::RETURN_MAX_TICKS {
                    expired = true;
                }
                boomerang.phase = FlightPhase::Returning { elapsed };

                // Home on the living owner; a dead owner leaves it flying straight
                if let Some((_, owner_transform, owner_statuses)) = owners
                    .iter()
                    .find(|(player, _, _)| player.id == boomerang.owner && player.alive)
                {
                    let desired =
                        (owner_transform.position - transform.position).normalize_or_zero() * boomerang::RETURN_SPEED;
                    let blend = boomerang::RETURN_TURN_BLEND
                        * if owner_statuses.has(StatusKind::Magnet) {
                            boomerang::MAGNET_TURN_MULT
                        } else {
                            1.0
                        };
                    let steered = velocity.0.lerp(desired, blend.min(1.0));
                    velocity.0 = steered.normalize_or_zero() * boomerang::RETURN_SPEED;
                }
            }
        }

        if expired {
            live_per_owner[boomerang.owner as usize] -= 1;
            if live_per_owner[boomerang.owner as usize] == 0 {
                for (mut player, _, _) in owners.iter_mut() {
                    if player.id == boomerang.owner && player.alive && !player.has_boomerang {
                        player.has_boomerang = true;
                        debug!(player = player.id, "Possession restored after expiry");
                    }
                }
            }
            commands.entity(entity).despawn();
            continue;
        }

        transform.position += velocity.0 * time_scale;
        transform.rotation += boomerang::SPIN_RATE * time_scale;

        if boomerang.elements.intersects(ElementFlags::FIRE | ElementFlags::ICE) {
            boomerang.trail_timer += 1;
            if boomerang.trail_timer >= boomerang::TRAIL_INTERVAL_TICKS {
                boomerang.trail_timer = 0;
                let element = if boomerang.elements.contains(ElementFlags::FIRE) {
                    TrailElement::Fire
                } else {
                    TrailElement::Ice
                };
                commands.spawn((
                    Trail {
                        element,
                        owner: boomerang.owner,
                    },
                    Transform::from_position(transform.position),
                    Collider::circle(collider::TRAIL_RADIUS),
                    TimeToLive::new(boomerang::TRAIL_TTL_TICKS),
                ));
            }
        }
    }
}
