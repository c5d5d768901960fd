//! This module contains all the tunable constants used by the simulation.
//!
//! The boundary-bounce blend and the flight-envelope numbers are behavioral
//! configuration carried over for parity; they are not derived physics.

use glam::Vec2;

/// The playfield extents, in world units. The origin is the top-left corner.
pub const ARENA_SIZE: Vec2 = Vec2::new(640.0, 360.0);

/// Player locomotion tuning.
pub mod mechanics {
    /// Acceleration applied from a full-deflection movement input, units/tick².
    pub const ACCELERATION: f32 = 0.55;
    /// Per-tick velocity retention on normal ground.
    pub const FRICTION: f32 = 0.82;
    /// Per-tick velocity retention while overlapping an ice zone.
    pub const ICE_FRICTION: f32 = 0.96;
    /// Hard cap on player speed, units/tick.
    pub const MAX_SPEED: f32 = 4.2;

    /// Fixed dash speed, units/tick.
    pub const DASH_SPEED: f32 = 9.0;
    /// Duration of the dash override.
    pub const DASH_TICKS: u32 = 9;
    /// Cooldown after a dash ends.
    pub const DASH_COOLDOWN_TICKS: u32 = 36;

    /// Facing turn rate at zero charge, radians/tick.
    pub const TURN_RATE: f32 = 0.35;
    /// Fraction of the turn rate lost at full charge (more charge, more precision).
    pub const CHARGE_TURN_PENALTY: f32 = 0.75;
    /// Charge accumulation cap, in ticks of holding.
    pub const CHARGE_MAX_TICKS: u32 = 50;

    /// Ticks after a throw during which the owner cannot catch.
    pub const CATCH_COOLDOWN_TICKS: u32 = 14;
    /// Ticks after a teleport during which portals ignore the player.
    pub const PORTAL_COOLDOWN_TICKS: u32 = 30;
}

/// Boomerang flight envelope.
pub mod boomerang {
    /// Throw speed at zero charge, units/tick.
    pub const THROW_SPEED_MIN: f32 = 5.0;
    /// Throw speed at full charge, units/tick.
    pub const THROW_SPEED_MAX: f32 = 11.0;

    /// Per-tick outbound speed retention.
    pub const OUTBOUND_DECAY: f32 = 0.965;
    /// Outbound retention under the extended-range element (slower decay).
    pub const OUTBOUND_DECAY_EXTENDED: f32 = 0.985;
    /// Speed floor that flips flight to the return leg.
    pub const RETURN_SPEED_FLOOR: f32 = 2.2;
    /// Widened floor under extended range.
    pub const RETURN_SPEED_FLOOR_EXTENDED: f32 = 1.4;
    /// Outbound time ceiling; reaching it forces the return leg.
    pub const OUTBOUND_MAX_TICKS: u32 = 55;
    /// Widened ceiling under extended range.
    pub const OUTBOUND_MAX_TICKS_EXTENDED: u32 = 95;

    /// Cruise speed while homing back to the owner, units/tick.
    pub const RETURN_SPEED: f32 = 6.5;
    /// Per-tick blend factor steering the return leg toward the owner.
    pub const RETURN_TURN_BLEND: f32 = 0.18;
    /// Turn-blend multiplier while the owner holds the magnet effect.
    pub const MAGNET_TURN_MULT: f32 = 2.0;
    /// Return-leg ticks before the projectile gives up and expires.
    pub const RETURN_MAX_TICKS: u32 = 240;

    /// Absolute lifetime cap, any phase.
    pub const LIFETIME_TICKS: u32 = 600;
    /// Wall bounces before the next contact forces the return leg.
    pub const MAX_BOUNCES: u8 = 3;
    /// Visual spin, radians/tick.
    pub const SPIN_RATE: f32 = 0.45;
    /// Outbound age below which a projectile cannot harm its own owner.
    pub const FRESH_AGE_TICKS: u32 = 10;

    /// Angular offset of the outer projectiles of a triple throw, radians.
    pub const TRIPLE_FAN_ANGLE: f32 = 0.26;
    /// Transform scale of the big variant.
    pub const BIG_SCALE: f32 = 1.8;

    /// Ticks between elemental trail drops.
    pub const TRAIL_INTERVAL_TICKS: u32 = 5;
    /// Lifetime of a dropped trail segment.
    pub const TRAIL_TTL_TICKS: u32 = 45;
}

/// Collision-response tuning.
pub mod physics {
    /// Base coefficient of the arena-boundary bounce.
    pub const BOUNCE_BASE: f32 = 0.35;
    /// Impact-speed scaling blended into the bounce coefficient.
    pub const BOUNCE_IMPACT_SCALE: f32 = 0.06;
    /// Upper cap of the blended bounce coefficient.
    pub const BOUNCE_MAX: f32 = 0.85;

    /// Share of closing speed converted into a separation impulse.
    pub const SEPARATION_IMPULSE: f32 = 0.5;
    /// Extra knockback a dashing player imparts on contact.
    pub const DASH_KNOCKBACK: f32 = 1.6;
    /// Minimum impact speed worth a wall-hit event.
    pub const WALL_HIT_EVENT_SPEED: f32 = 2.5;
}

/// Status-effect durations and strengths, in ticks unless noted.
pub mod status {
    pub const FREEZE_TICKS: u32 = 90;
    /// Burn kills when this timer runs out, unless cleared (water) first.
    pub const BURN_TICKS: u32 = 120;
    pub const MAGNET_TICKS: u32 = 600;
    pub const TRIPLE_TICKS: u32 = 600;
    pub const BIG_TICKS: u32 = 600;
    pub const FIRE_TICKS: u32 = 600;
    pub const ICE_TICKS: u32 = 600;
    pub const PIERCE_TICKS: u32 = 600;
    pub const LONG_THROW_TICKS: u32 = 600;

    /// Charges granted by a shield pickup.
    pub const SHIELD_CHARGES: u8 = 3;
    /// Catch-radius bonus while the magnet effect is active, world units.
    pub const MAGNET_CATCH_BONUS: f32 = 10.0;
}

/// Match-flow timing.
pub mod timing {
    /// Ready-countdown length before a round goes live.
    pub const READY_TICKS: u32 = 90;
    /// Length of the ko freeze-frame between the final kill and round end.
    pub const KO_TICKS: u32 = 45;
    /// Hitstop applied at the ko moment.
    pub const KO_HITSTOP_TICKS: u32 = 8;
    /// Slow-motion window entered at the ko moment.
    pub const KO_SLOWMO_TICKS: u32 = 60;
    /// Motion multiplier during the ko slow-motion window.
    pub const KO_SLOWMO_FACTOR: f32 = 0.3;
    /// Automatic round-end confirmation timeout (AI winners and draws).
    pub const ROUND_END_TIMEOUT_TICKS: u32 = 300;
}

/// Collider radii, world units.
pub mod collider {
    pub const PLAYER_RADIUS: f32 = 10.0;
    pub const BOOMERANG_RADIUS: f32 = 6.0;
    pub const PICKUP_RADIUS: f32 = 8.0;
    pub const TRAIL_RADIUS: f32 = 7.0;
    pub const BOULDER_RADIUS: f32 = 14.0;
}

/// Replay buffer sizing.
pub mod replay {
    /// Ring-buffer capacity in frames (15 seconds at 60 ticks/s).
    pub const CAPACITY: usize = 900;
    /// Frames before the newest entry where playback starts, so the kill
    /// is visible immediately instead of after a long preamble.
    pub const PLAYBACK_LEAD: usize = 150;
    /// Default playback speed.
    pub const DEFAULT_SPEED: f32 = 1.0;
}

/// AI controller tuning.
pub mod ai {
    /// Radius inside which incoming projectiles register as threats.
    pub const DANGER_RADIUS: f32 = 90.0;
    /// Threat distance below which the AI spends its dash.
    pub const PANIC_RADIUS: f32 = 40.0;
    /// Half-width of the ideal-distance band.
    pub const BAND_WIDTH: f32 = 25.0;

    /// Per-difficulty tuning; index by tier 0-2.
    #[derive(Debug, Clone, Copy)]
    pub struct Tuning {
        /// Inclusive range the attack timer resets into, ticks.
        pub attack_delay: (u32, u32),
        /// Inclusive range of the target charge hold, ticks.
        pub charge_hold: (u32, u32),
        /// Inclusive range the ideal distance re-rolls into.
        pub ideal_distance: (f32, f32),
    }

    pub const TUNING: [Tuning; 3] = [
        Tuning {
            attack_delay: (120, 220),
            charge_hold: (8, 22),
            ideal_distance: (140.0, 220.0),
        },
        Tuning {
            attack_delay: (70, 140),
            charge_hold: (18, 36),
            ideal_distance: (110.0, 180.0),
        },
        Tuning {
            attack_delay: (35, 80),
            charge_hold: (30, 50),
            ideal_distance: (90.0, 150.0),
        },
    ];
}

/// Pickup spawner cadence.
pub mod powerup {
    /// Ticks between spawn attempts.
    pub const SPAWN_INTERVAL_TICKS: u32 = 420;
    /// Concurrent pickups allowed on the field.
    pub const MAX_ACTIVE: usize = 3;
    /// Distance kept from the arena edge when placing a pickup.
    pub const SPAWN_MARGIN: f32 = 40.0;
}

/// Rolling-boulder hazard tuning.
pub mod boulder {
    /// Boulder travel speed, units/tick.
    pub const SPEED: f32 = 3.2;
    /// Margin past the arena edge before a boulder despawns.
    pub const DESPAWN_MARGIN: f32 = 60.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounce_blend_stays_capped() {
        let coeff = (physics::BOUNCE_BASE + 100.0 * physics::BOUNCE_IMPACT_SCALE).min(physics::BOUNCE_MAX);
        assert_eq!(coeff, physics::BOUNCE_MAX);
    }

    #[test]
    fn test_extended_range_widens_envelope() {
        assert!(boomerang::OUTBOUND_DECAY_EXTENDED > boomerang::OUTBOUND_DECAY);
        assert!(boomerang::RETURN_SPEED_FLOOR_EXTENDED < boomerang::RETURN_SPEED_FLOOR);
        assert!(boomerang::OUTBOUND_MAX_TICKS_EXTENDED > boomerang::OUTBOUND_MAX_TICKS);
    }

    #[test]
    fn test_playback_lead_fits_capacity() {
        assert!(replay::PLAYBACK_LEAD < replay::CAPACITY);
    }

    #[test]
    fn test_ai_difficulty_is_monotonic() {
        for pair in ai::TUNING.windows(2) {
            // Harder tiers react faster and charge longer
            assert!(pair[1].attack_delay.0 <= pair[0].attack_delay.0);
            assert!(pair[1].charge_hold.1 >= pair[0].charge_hold.1);
        }
    }
}
