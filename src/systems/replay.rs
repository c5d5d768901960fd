//! Round replay: a fixed-capacity ring of per-tick snapshots captured
//! during combat, played back between rounds.
//!
//! Frames store render-relevant state only; playback never feeds back into
//! the simulation.

use bevy_ecs::{resource::Resource, system::Query, system::Res, system::ResMut};
use circular_buffer::CircularBuffer;
use glam::Vec2;
use smallvec::SmallVec;

use crate::constants::replay;
use crate::systems::components::{Boomerang, Charge, Dash, Player, SimTick, Trail, TrailElement, Transform};

/// One player's pose in a captured frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerFrame {
    pub position: Vec2,
    pub facing: f32,
    pub alive: bool,
    pub charging: bool,
    pub dashing: bool,
    pub skin: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileFrame {
    pub position: Vec2,
    pub rotation: f32,
    pub big: bool,
}

/// A short-lived visual effect (elemental trail segment) in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectFrame {
    pub position: Vec2,
    pub element: TrailElement,
}

/// One tick's snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayFrame {
    pub tick: u64,
    pub players: SmallVec<[PlayerFrame; 4]>,
    pub projectiles: SmallVec<[ProjectileFrame; 4]>,
    pub effects: SmallVec<[EffectFrame; 8]>,
}

#[derive(Debug, Clone, Copy)]
struct Playback {
    cursor: f32,
    speed: f32,
}

/// Ring of recent frames plus optional playback head. The ring is boxed:
/// at capacity it is far too large for the stack.
#[derive(Resource)]
pub struct ReplayBuffer {
    frames: Box<CircularBuffer<{ replay::CAPACITY }, ReplayFrame>>,
    playback: Option<Playback>,
}

impl Default for ReplayBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayBuffer {
    pub fn new() -> Self {
        Self {
            frames: CircularBuffer::boxed(),
            playback: None,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, index: usize) -> Option<&ReplayFrame> {
        self.frames.get(index)
    }

    pub fn push_frame(&mut self, frame: ReplayFrame) {
        self.frames.push_back(frame);
    }

    /// Starts playback a fixed lead before the newest frame, so the decisive
    /// moment is on screen almost immediately.
    pub fn begin_playback(&mut self, speed: f32) {
        let lead = replay::PLAYBACK_LEAD.min(self.frames.len());
        let start = self.frames.len() - lead;
        self.playback = Some(Playback {
            cursor: start as f32,
            speed,
        });
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }

    /// Current playback frame, if playback is running.
    pub fn current_frame(&self) -> Option<&ReplayFrame> {
        let playback = self.playback.as_ref()?;
        self.frames.get(playback.cursor as usize)
    }

    /// Moves the playback head by its speed, wrapping to the buffer start.
    pub fn advance(&mut self) {
        let len = self.frames.len();
        if let Some(playback) = self.playback.as_mut() {
            playback.cursor += playback.speed;
            if playback.cursor as usize >= len {
                playback.cursor = 0.0;
            }
        }
    }

    pub fn set_speed(&mut self, speed: f32) {
        if let Some(playback) = self.playback.as_mut() {
            playback.speed = speed;
        }
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.playback = None;
    }
}

/// Captures the current tick into the ring. Players are ordered by id so a
/// frame's layout is stable across ticks.
pub fn replay_capture_system(
    mut buffer: ResMut<ReplayBuffer>,
    tick: Res<SimTick>,
    players: Query<(&Player, &Transform, &Charge, &Dash)>,
    projectiles: Query<(&Boomerang, &Transform)>,
    trails: Query<(&Trail, &Transform)>,
) {
    let mut player_frames: SmallVec<[(u8, PlayerFrame); 4]> = players
        .iter()
        .map(|(player, transform, charge, dash)| {
            (
                player.id,
                PlayerFrame {
                    position: transform.position,
                    facing: player.facing,
                    alive: player.alive,
                    charging: charge.is_holding(),
                    dashing: dash.is_active(),
                    skin: player.skin,
                },
            )
        })
        .collect();
    player_frames.sort_by_key(|(id, _)| *id);

    let projectiles = projectiles
        .iter()
        .map(|(boomerang, transform)| ProjectileFrame {
            position: transform.position,
            rotation: transform.rotation,
            big: boomerang.big,
        })
        .collect();

    let effects = trails
        .iter()
        .map(|(trail, transform)| EffectFrame {
            position: transform.position,
            element: trail.element,
        })
        .collect();

    buffer.push_frame(ReplayFrame {
        tick: tick.0,
        players: player_frames.into_iter().map(|(_, frame)| frame).collect(),
        projectiles,
        effects,
    });
}

/// Steps the playback head while a replay is showing.
pub fn replay_playback_system(mut buffer: ResMut<ReplayBuffer>) {
    buffer.advance();
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;

    fn frame(tick: u64) -> ReplayFrame {
        ReplayFrame {
            tick,
            players: SmallVec::new(),
            projectiles: SmallVec::new(),
            effects: SmallVec::new(),
        }
    }

    #[test]
    fn test_capacity_is_bounded() {
        let mut buffer = ReplayBuffer::new();
        for tick in 0..(replay::CAPACITY as u64 + 100) {
            buffer.push_frame(frame(tick));
        }
        assert_that(&buffer.len()).is_equal_to(replay::CAPACITY);
        // The oldest frames were evicted
        assert_that(&buffer.frame(0).unwrap().tick).is_equal_to(100);
    }

    #[test]
    fn test_playback_starts_with_lead() {
        let mut buffer = ReplayBuffer::new();
        for tick in 0..400u64 {
            buffer.push_frame(frame(tick));
        }
        buffer.begin_playback(1.0);
        let start = buffer.current_frame().unwrap().tick;
        assert_that(&start).is_equal_to(400 - replay::PLAYBACK_LEAD as u64);
    }

    #[test]
    fn test_playback_wraps() {
        let mut buffer = ReplayBuffer::new();
        for tick in 0..10u64 {
            buffer.push_frame(frame(tick));
        }
        buffer.begin_playback(1.0);
        for _ in 0..20 {
            buffer.advance();
        }
        assert!(buffer.current_frame().is_some());
    }

    #[test]
    fn test_clear_stops_playback() {
        let mut buffer = ReplayBuffer::new();
        buffer.push_frame(frame(0));
        buffer.begin_playback(1.0);
        buffer.clear();
        assert!(!buffer.is_playing());
        assert!(buffer.is_empty());
    }
}
