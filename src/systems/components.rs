//! Components, bundles and small world resources.
//!
//! Entity behavior is keyed by component presence: systems filter with
//! required-component predicates, so an entity missing a component is
//! simply skipped rather than treated as a fault.

use bevy_ecs::{bundle::Bundle, component::Component, entity::Entity, resource::Resource};
use bitflags::bitflags;
use glam::Vec2;
use rand::rngs::SmallRng;
use smallvec::SmallVec;
use strum_macros::{Display, EnumIter};

use crate::error::{ConfigError, GameResult};

/// World-space placement. Owned exclusively by the system responsible for
/// the entity's motion; colliders read it, never write it.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    pub rotation: f32,
    pub scale: f32,
}

impl Transform {
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            rotation: 0.0,
            scale: 1.0,
        }
    }
}

/// Velocity in units/tick, integrated under the global time scale.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity(pub Vec2);

/// Geometric shape descriptor, used only for overlap tests.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { half_extents: Vec2 },
    /// Convex polygon, vertices counter-clockwise in local space.
    Polygon { vertices: Vec<Vec2> },
}

impl Shape {
    pub fn validate(&self) -> GameResult<()> {
        match self {
            Shape::Circle { radius } if *radius <= 0.0 => {
                Err(ConfigError::DegenerateShape(format!("circle radius {radius}")).into())
            }
            Shape::Rect { half_extents } if half_extents.min_element() <= 0.0 => {
                Err(ConfigError::DegenerateShape(format!("rect half extents {half_extents}")).into())
            }
            Shape::Polygon { vertices } if vertices.len() < 3 => {
                Err(ConfigError::DegenerateShape(format!("polygon with {} vertices", vertices.len())).into())
            }
            _ => Ok(()),
        }
    }
}

#[derive(Component, Debug, Clone)]
pub struct Collider {
    pub shape: Shape,
}

impl Collider {
    pub fn circle(radius: f32) -> Self {
        Self {
            shape: Shape::Circle { radius },
        }
    }
}

/// Per-player identity and transient combat state.
#[derive(Component, Debug, Clone)]
pub struct Player {
    pub id: u8,
    /// Team index; -1 means unaffiliated solo.
    pub team: i8,
    /// Cosmetic index, opaque to the simulation.
    pub skin: u8,
    /// External input slot; AI slots ignore it.
    pub slot: u8,
    pub alive: bool,
    /// Facing angle in radians; tracks input, throws aim along it.
    pub facing: f32,
    /// True iff the player currently holds their boomerang.
    pub has_boomerang: bool,
    pub catch_cooldown: u32,
    pub portal_cooldown: u32,
    /// Remaining shield hits; a shield pickup sets this, not a timer.
    pub shield_charges: u8,
}

impl Player {
    pub fn new(id: u8, team: i8, skin: u8) -> Self {
        Self {
            id,
            team,
            skin,
            slot: id,
            alive: true,
            facing: 0.0,
            has_boomerang: true,
            catch_cooldown: 0,
            portal_cooldown: 0,
            shield_charges: 0,
        }
    }

    /// Faction key for round-end alive counting: a team, or the solo self.
    pub fn faction(&self) -> i16 {
        if self.team >= 0 {
            self.team as i16
        } else {
            // Solo players occupy a private faction below any team index
            -1 - self.id as i16
        }
    }
}

/// Dash is a timed override of normal locomotion.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub enum Dash {
    #[default]
    Ready,
    Active {
        remaining: u32,
        direction: Vec2,
    },
    Cooldown {
        remaining: u32,
    },
}

impl Dash {
    pub fn is_active(&self) -> bool {
        matches!(self, Dash::Active { .. })
    }
}

/// Held-action charge state; release throws.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Charge {
    #[default]
    Idle,
    Holding {
        ticks: u32,
    },
}

impl Charge {
    pub fn is_holding(&self) -> bool {
        matches!(self, Charge::Holding { .. })
    }
}

/// Temporal effect kinds carried on a player's status list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StatusKind {
    /// Motion and input fully suspended.
    Freeze,
    /// Kills the victim when the timer expires, unless cleared first.
    Burn,
    /// Stronger return homing and a wider catch radius.
    Magnet,
    /// Throws release a three-projectile fan.
    Triple,
    /// Throws release the big variant.
    Big,
    /// Throws carry the fire element (burning trail).
    Fire,
    /// Throws carry the freeze element (freezes instead of killing).
    Ice,
    /// Throws pass through walls.
    Pierce,
    /// Throws fly farther before returning.
    LongThrow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub remaining: u32,
    /// Player id that inflicted the effect, -1 for environmental sources.
    pub source: i8,
}

#[derive(Component, Debug, Clone, Default)]
pub struct StatusEffects(pub SmallVec<[StatusEffect; 4]>);

impl StatusEffects {
    pub fn has(&self, kind: StatusKind) -> bool {
        self.0.iter().any(|s| s.kind == kind)
    }

    /// Applies or refreshes an effect; refreshing keeps the newer source.
    pub fn apply(&mut self, kind: StatusKind, duration: u32, source: i8) {
        if let Some(existing) = self.0.iter_mut().find(|s| s.kind == kind) {
            existing.remaining = existing.remaining.max(duration);
            existing.source = source;
        } else {
            self.0.push(StatusEffect {
                kind,
                remaining: duration,
                source,
            });
        }
    }

    pub fn clear(&mut self, kind: StatusKind) {
        self.0.retain(|s| s.kind != kind);
    }
}

/// One tick of player intent: a movement vector plus action edges.
/// Humans write this from outside; the AI controller writes it in-process.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct InputFrame {
    /// Desired movement direction, magnitude clamped to 1.
    pub movement: Vec2,
    pub action_held: bool,
    pub action_pressed: bool,
    pub action_released: bool,
    pub dash_pressed: bool,
}

bitflags! {
    /// Elemental modifiers stamped onto a projectile at throw time.
    #[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ElementFlags: u8 {
        const FIRE = 1 << 0;
        const ICE = 1 << 1;
        const PIERCE = 1 << 2;
        const LONG_THROW = 1 << 3;
    }
}

/// The two primary phases of projectile flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightPhase {
    Outbound { age: u32 },
    Returning { elapsed: u32 },
}

#[derive(Component, Debug, Clone)]
pub struct Boomerang {
    pub owner: u8,
    pub phase: FlightPhase,
    pub lifetime: u32,
    pub bounces: u8,
    pub max_bounces: u8,
    pub big: bool,
    pub elements: ElementFlags,
    /// Ticks since the last elemental trail drop.
    pub trail_timer: u32,
}

impl Boomerang {
    pub fn is_returning(&self) -> bool {
        matches!(self.phase, FlightPhase::Returning { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailElement {
    Fire,
    Ice,
}

/// Short-lived elemental hazard dropped along a projectile path.
#[derive(Component, Debug, Clone, Copy)]
pub struct Trail {
    pub element: TrailElement,
    pub owner: u8,
}

/// Pickup kinds; lifetime is bounded by collection, not decay.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum PowerupKind {
    Shield,
    Triple,
    Big,
    Fire,
    Ice,
    Pierce,
    LongThrow,
    Magnet,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Powerup {
    pub kind: PowerupKind,
}

/// Marker for static interior obstacles.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct Wall;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TerrainKind {
    /// Friction override sampled by player locomotion.
    Ice { friction: f32 },
    /// Lethal to non-dashing players; cleanses burn.
    Water,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct TerrainZone {
    pub kind: TerrainKind,
}

/// One end of a linked teleporter pair.
#[derive(Component, Debug, Clone, Copy)]
pub struct Portal {
    pub id: u8,
    pub link: u8,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct BoulderSpawner {
    pub interval: u32,
    pub timer: u32,
    pub direction: Vec2,
}

#[derive(Component, Debug, Default, Clone, Copy)]
pub struct Boulder;

/// The shrinking hazard ring; players outside it catch fire.
#[derive(Component, Debug, Clone, Copy)]
pub struct HazardRing {
    pub radius: f32,
    pub shrink_rate: f32,
    pub min_radius: f32,
}

/// Per-AI persistent scratch, attached to the entity itself so it cannot
/// desync from entity lifetime.
#[derive(Component, Debug, Clone)]
pub struct AiController {
    /// Difficulty tier 0-2, indexing [`crate::constants::ai::TUNING`].
    pub tier: usize,
    pub attack_timer: u32,
    pub ideal_distance: f32,
    /// Charge hold being executed, if an attack is in progress.
    pub target_charge: Option<u32>,
    /// Which way this AI orbits within its distance band.
    pub orbit_sign: f32,
}

/// Monotonic simulation tick counter.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct SimTick(pub u64);

/// Per-match RNG; seeded from the configuration for reproducible sessions.
#[derive(Resource)]
pub struct SimRng(pub SmallRng);

/// Countdown to the next pickup spawn attempt.
#[derive(Resource, Debug, Default)]
pub struct PowerupTimer(pub u32);

/// Input-slot to entity mapping, built at spawn time.
#[derive(Resource, Debug, Default)]
pub struct PlayerHandles(pub SmallVec<[Entity; 4]>);

#[derive(Bundle)]
pub struct PlayerBundle {
    pub player: Player,
    pub transform: Transform,
    pub velocity: Velocity,
    pub collider: Collider,
    pub dash: Dash,
    pub charge: Charge,
    pub statuses: StatusEffects,
    pub input: InputFrame,
}

#[derive(Bundle)]
pub struct BoomerangBundle {
    pub boomerang: Boomerang,
    pub transform: Transform,
    pub velocity: Velocity,
    pub collider: Collider,
}
