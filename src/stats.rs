//! Lifetime statistics for the local profile (input slot 0), persisted as
//! JSON between sessions.
//!
//! Persistence degrades silently: a missing or corrupt file yields default
//! stats with a warning, and the simulation never blocks on disk.

use std::fs;
use std::path::Path;

use bevy_ecs::{event::EventReader, resource::Resource, system::ResMut};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{GameResult, StatsError};
use crate::events::GameEvent;

/// Slot whose events feed the lifetime tallies.
const PROFILE_SLOT: u8 = 0;

#[derive(Resource, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct LifetimeStats {
    pub matches_won: u32,
    pub kills: u32,
    pub deaths: u32,
    pub throws: u32,
    pub catches: u32,
    pub dashes: u32,
    pub powerups_collected: u32,
    pub win_streak: u32,
    pub best_win_streak: u32,
}

impl LifetimeStats {
    /// Loads stats from disk, falling back to defaults on any failure.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(stats) => {
                    info!(?path, "Lifetime stats loaded");
                    stats
                }
                Err(error) => {
                    warn!(?path, %error, "Stats file unreadable, starting fresh");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> GameResult<()> {
        let raw = serde_json::to_string_pretty(self).map_err(StatsError::Parse)?;
        fs::write(path, raw).map_err(StatsError::Io)?;
        Ok(())
    }
}

/// Folds the tick's events into the profile tallies.
pub fn stats_system(mut stats: ResMut<LifetimeStats>, mut events: EventReader<GameEvent>) {
    for event in events.read() {
        match *event {
            GameEvent::Throw { player } if player == PROFILE_SLOT => stats.throws += 1,
            GameEvent::Catch { player } if player == PROFILE_SLOT => stats.catches += 1,
            GameEvent::Dash { player } if player == PROFILE_SLOT => stats.dashes += 1,
            GameEvent::PowerupCollect { player, .. } if player == PROFILE_SLOT => stats.powerups_collected += 1,
            GameEvent::Death { victim, killer, .. } => {
                if victim == PROFILE_SLOT {
                    stats.deaths += 1;
                }
                if killer == Some(PROFILE_SLOT) && victim != PROFILE_SLOT {
                    stats.kills += 1;
                }
            }
            GameEvent::MatchWon { player } => {
                if player == PROFILE_SLOT {
                    stats.matches_won += 1;
                    stats.win_streak += 1;
                    stats.best_win_streak = stats.best_win_streak.max(stats.win_streak);
                } else {
                    stats.win_streak = 0;
                }
            }
            _ => {}
        }
    }
}
