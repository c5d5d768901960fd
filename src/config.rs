//! Match configuration, consumed once at match start.
//!
//! Player roster, win threshold, AI tiers and the arena layout are read
//! here and never polled during ticks.

use bevy_ecs::prelude::*;
use glam::Vec2;
use smallvec::SmallVec;

use crate::constants;
use crate::error::{ConfigError, GameResult};
use crate::systems::components::{Shape, TerrainKind};

/// AI difficulty tier. Indexes into [`constants::ai::TUNING`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiDifficulty {
    Easy,
    Normal,
    Hard,
}

impl AiDifficulty {
    pub fn tier(self) -> usize {
        match self {
            AiDifficulty::Easy => 0,
            AiDifficulty::Normal => 1,
            AiDifficulty::Hard => 2,
        }
    }
}

/// One competitor's slot in the match.
#[derive(Debug, Clone, Copy)]
pub struct PlayerSetup {
    /// Cosmetic index passed through to replay frames and the renderer.
    pub skin: u8,
    /// Team index; -1 means unaffiliated solo.
    pub team: i8,
    /// `Some` makes this slot AI-driven, bypassing external input.
    pub ai: Option<AiDifficulty>,
}

impl PlayerSetup {
    pub fn human(skin: u8) -> Self {
        Self { skin, team: -1, ai: None }
    }

    pub fn bot(skin: u8, difficulty: AiDifficulty) -> Self {
        Self {
            skin,
            team: -1,
            ai: Some(difficulty),
        }
    }

    pub fn with_team(mut self, team: i8) -> Self {
        self.team = team;
        self
    }
}

/// A portal pair; entering either end exits at the other.
#[derive(Debug, Clone, Copy)]
pub struct PortalPair {
    pub a: Vec2,
    pub b: Vec2,
}

#[derive(Debug, Clone, Copy)]
pub struct BoulderSpawnerConfig {
    pub position: Vec2,
    pub direction: Vec2,
    pub interval_ticks: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct HazardRingConfig {
    pub initial_radius: f32,
    pub shrink_rate: f32,
    pub min_radius: f32,
}

/// Static arena content spawned at round start.
#[derive(Debug, Clone)]
pub struct ArenaLayout {
    pub size: Vec2,
    pub spawn_points: Vec<Vec2>,
    /// Interior obstacles: (center position, shape).
    pub walls: Vec<(Vec2, Shape)>,
    /// Friction/lethality zones: (center position, shape, kind).
    pub zones: Vec<(Vec2, Shape, TerrainKind)>,
    pub portals: Vec<PortalPair>,
    pub boulder_spawners: Vec<BoulderSpawnerConfig>,
    pub hazard_ring: Option<HazardRingConfig>,
}

impl Default for ArenaLayout {
    /// The stock arena: a central pillar, two ice patches, a water pool,
    /// one portal pair and a slowly shrinking ring.
    fn default() -> Self {
        let size = constants::ARENA_SIZE;
        Self {
            size,
            spawn_points: vec![
                Vec2::new(80.0, 80.0),
                Vec2::new(size.x - 80.0, size.y - 80.0),
                Vec2::new(size.x - 80.0, 80.0),
                Vec2::new(80.0, size.y - 80.0),
            ],
            walls: vec![(
                size / 2.0,
                Shape::Rect {
                    half_extents: Vec2::new(20.0, 60.0),
                },
            )],
            zones: vec![
                (
                    Vec2::new(160.0, size.y / 2.0),
                    Shape::Circle { radius: 50.0 },
                    TerrainKind::Ice {
                        friction: constants::mechanics::ICE_FRICTION,
                    },
                ),
                (
                    Vec2::new(size.x - 160.0, size.y / 2.0),
                    Shape::Circle { radius: 50.0 },
                    TerrainKind::Ice {
                        friction: constants::mechanics::ICE_FRICTION,
                    },
                ),
                (
                    Vec2::new(size.x / 2.0, 60.0),
                    Shape::Rect {
                        half_extents: Vec2::new(60.0, 25.0),
                    },
                    TerrainKind::Water,
                ),
            ],
            portals: vec![PortalPair {
                a: Vec2::new(40.0, size.y / 2.0),
                b: Vec2::new(size.x - 40.0, size.y / 2.0),
            }],
            boulder_spawners: vec![BoulderSpawnerConfig {
                position: Vec2::new(size.x / 2.0, size.y + 30.0),
                direction: Vec2::new(0.0, -1.0),
                interval_ticks: 600,
            }],
            hazard_ring: Some(HazardRingConfig {
                initial_radius: 260.0,
                shrink_rate: 0.02,
                min_radius: 80.0,
            }),
        }
    }
}

/// Everything the simulation needs to run one match.
#[derive(Resource, Debug, Clone)]
pub struct MatchConfig {
    pub players: SmallVec<[PlayerSetup; 4]>,
    /// Score a player must reach to win the match.
    pub win_threshold: u32,
    /// Seed for the per-match RNG (AI jitter, pickup placement).
    pub seed: u64,
    pub arena: ArenaLayout,
    /// Where lifetime statistics are persisted; `None` disables persistence.
    pub stats_path: Option<std::path::PathBuf>,
}

impl MatchConfig {
    pub fn new(players: impl IntoIterator<Item = PlayerSetup>) -> Self {
        Self {
            players: players.into_iter().collect(),
            win_threshold: 3,
            seed: 0x5eed,
            arena: ArenaLayout::default(),
            stats_path: None,
        }
    }

    /// Whether round-end counting runs over factions rather than individuals.
    pub fn team_mode(&self) -> bool {
        self.players.iter().any(|p| p.team >= 0)
    }

    pub fn validate(&self) -> GameResult<()> {
        if !(2..=4).contains(&self.players.len()) {
            return Err(ConfigError::PlayerCount(self.players.len()).into());
        }
        if self.win_threshold == 0 {
            return Err(ConfigError::WinThreshold.into());
        }
        if self.arena.spawn_points.len() < self.players.len() {
            return Err(ConfigError::SpawnPoints {
                needed: self.players.len(),
                have: self.arena.spawn_points.len(),
            }
            .into());
        }
        for (_, shape) in &self.walls_and_zone_shapes() {
            shape.validate()?;
        }
        Ok(())
    }

    fn walls_and_zone_shapes(&self) -> Vec<(Vec2, Shape)> {
        self.arena
            .walls
            .iter()
            .cloned()
            .chain(self.arena.zones.iter().map(|(p, s, _)| (*p, s.clone())))
            .collect()
    }
}
