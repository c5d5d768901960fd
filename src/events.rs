//! Typed outbound event stream.
//!
//! Every gameplay beat the renderer, audio or VFX layers care about is
//! emitted here, queued across ticks and handed out through
//! [`crate::game::Game::drain_events`]. Downstream consumers must never
//! mutate simulation state in response.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::systems::components::PowerupKind;

#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub enum GameEvent {
    /// A player released a charge and threw their boomerang(s).
    Throw { player: u8 },
    Dash { player: u8 },
    /// A returning boomerang was caught by its owner.
    Catch { player: u8 },
    /// A player died. `killer` is `None` for environmental deaths.
    Death { victim: u8, killer: Option<u8>, position: Vec2 },
    /// A projectile reflected off a wall.
    Bounce { position: Vec2 },
    /// A player hit the arena boundary hard enough to matter.
    WallHit { player: u8, speed: f32 },
    PlayerCollide { a: u8, b: u8 },
    PowerupCollect { player: u8, kind: PowerupKind },
    /// A shield charge absorbed a lethal hit.
    ShieldBlock { player: u8 },
    Freeze { player: u8 },
    Burn { player: u8 },
    /// A burn ran its course and killed the victim.
    BurnKill { player: u8 },
    PortalTeleport { player: u8 },
    RoundStart { round: u32 },
    /// `winner` is -1 on a draw.
    RoundEnd { winner: i8 },
    ScoreChange { player: u8, score: u32 },
    MatchWon { player: u8 },
}
