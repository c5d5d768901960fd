//! Scripted opponents. Each AI writes an [`InputFrame`] every tick, so the
//! rest of the simulation cannot tell a bot from a human.
//!
//! Behavior is a distance-band orbit around the nearest enemy, dodges and
//! panic dashes driven by incoming projectiles, and charged throws on a
//! jittered timer. Difficulty tiers only change the tuning numbers.

use bevy_ecs::{
    query::Without,
    system::{Query, ResMut},
};
use glam::Vec2;
use rand::Rng;
use tracing::trace;

use crate::constants::ai;
use crate::systems::components::{
    AiController, Boomerang, Charge, HazardRing, InputFrame, Player, SimRng, Transform, Velocity,
};

struct EnemySighting {
    position: Vec2,
    distance: f32,
}

struct ThreatSighting {
    position: Vec2,
    velocity: Vec2,
    distance: f32,
}

/// Drives every AI-controlled player for one tick.
#[allow(clippy::type_complexity)]
pub fn ai_control_system(
    mut rng: ResMut<SimRng>,
    mut controllers: Query<(&Player, &Transform, &Charge, &mut AiController, &mut InputFrame)>,
    all_players: Query<(&Player, &Transform)>,
    projectiles: Query<(&Boomerang, &Transform, &Velocity)>,
    rings: Query<(&HazardRing, &Transform), Without<Player>>,
) {
    for (player, transform, charge, mut controller, mut input) in controllers.iter_mut() {
        let mut frame = InputFrame::default();

        if !player.alive {
            *input = frame;
            continue;
        }

        let enemy = nearest_enemy(player, transform.position, &all_players);
        let threat = nearest_threat(player, transform.position, &projectiles);
        let tuning = &ai::TUNING[controller.tier.min(ai::TUNING.len() - 1)];

        // Occasional orbit flips keep circling from looking mechanical
        if rng.0.random_range(0..300u32) == 0 {
            controller.orbit_sign = -controller.orbit_sign;
        }

        let mut steer = Vec2::ZERO;

        if let Some(enemy) = &enemy {
            let to_enemy = (enemy.position - transform.position).normalize_or_zero();
            if enemy.distance > controller.ideal_distance + ai::BAND_WIDTH {
                steer += to_enemy;
            } else if enemy.distance < controller.ideal_distance - ai::BAND_WIDTH {
                steer -= to_enemy;
            } else {
                steer += to_enemy.perp() * controller.orbit_sign;
            }
        }

        if let Some(threat) = &threat {
            // Sidestep perpendicular to the projectile's travel direction
            let travel = threat.velocity.normalize_or_zero();
            let offset = transform.position - threat.position;
            let side = if travel.perp().dot(offset) >= 0.0 { 1.0 } else { -1.0 };
            steer += travel.perp() * side * 1.5;
            if threat.distance < ai::PANIC_RADIUS {
                frame.dash_pressed = true;
            }
        }

        // Stay inside the ring; burning to death is never worth the angle
        for (ring, ring_transform) in rings.iter() {
            let from_center = transform.position - ring_transform.position;
            if from_center.length() > ring.radius - 20.0 {
                steer += -from_center.normalize_or_zero() * 2.0;
            }
        }

        frame.movement = steer.clamp_length_max(1.0);

        // Attack: start a hold on the jittered timer, release at the rolled
        // charge length. Aim rides on the movement vector while holding.
        match (charge, controller.target_charge) {
            (Charge::Holding { ticks }, Some(target)) => {
                frame.action_held = true;
                if let Some(enemy) = &enemy {
                    frame.movement = (enemy.position - transform.position).normalize_or_zero();
                }
                if *ticks >= target {
                    frame.action_released = true;
                    frame.action_held = false;
                    controller.target_charge = None;
                    controller.attack_timer = rng.0.random_range(tuning.attack_delay.0..=tuning.attack_delay.1);
                    controller.ideal_distance = rng.0.random_range(tuning.ideal_distance.0..=tuning.ideal_distance.1);
                    trace!(player = player.id, "AI throw released");
                }
            }
            _ => {
                controller.attack_timer = controller.attack_timer.saturating_sub(1);
                if controller.attack_timer == 0 && player.has_boomerang && enemy.is_some() {
                    frame.action_pressed = true;
                    frame.action_held = true;
                    controller.target_charge =
                        Some(rng.0.random_range(tuning.charge_hold.0..=tuning.charge_hold.1));
                }
            }
        }

        *input = frame;
    }
}

fn nearest_enemy(me: &Player, position: Vec2, players: &Query<(&Player, &Transform)>) -> Option<EnemySighting> {
    players
        .iter()
        .filter(|(other, _)| other.alive && other.faction() != me.faction())
        .map(|(_, transform)| EnemySighting {
            position: transform.position,
            distance: position.distance(transform.position),
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Nearest hostile projectile that is close and closing.
fn nearest_threat(
    me: &Player,
    position: Vec2,
    projectiles: &Query<(&Boomerang, &Transform, &Velocity)>,
) -> Option<ThreatSighting> {
    projectiles
        .iter()
        .filter(|(boomerang, transform, velocity)| {
            boomerang.owner != me.id
                && position.distance(transform.position) < ai::DANGER_RADIUS
                && velocity.0.dot(position - transform.position) > 0.0
        })
        .map(|(_, transform, velocity)| ThreatSighting {
            position: transform.position,
            velocity: velocity.0,
            distance: position.distance(transform.position),
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}
