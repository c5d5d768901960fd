//! Match and round state machine.
//!
//! `ready → fight → ko → roundEnd → (fight | win)`, with pause as a
//! suspending overlay. [`MatchState`] is the single source of truth for
//! phase and scoring; other systems read it to gate their own activity and
//! write to it only through the kill path in the collision module.

use bevy_ecs::{
    entity::Entity,
    event::EventWriter,
    prelude::Or,
    query::With,
    resource::Resource,
    system::{Commands, Query, Res, ResMut},
};
use glam::Vec2;
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::config::MatchConfig;
use crate::constants::{replay, timing};
use crate::events::GameEvent;
use crate::systems::components::{
    Boomerang, Boulder, Charge, Dash, HazardRing, InputFrame, Player, Powerup, PowerupTimer, StatusEffects, Transform, Trail,
    Velocity,
};
use crate::systems::replay::ReplayBuffer;

/// Per-player scoring record for the current match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerRecord {
    pub score: u32,
    pub kills: u32,
    pub deaths: u32,
}

/// High-level match phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Countdown before the round goes live.
    Ready { remaining_ticks: u32 },
    /// Live gameplay.
    Fight,
    /// Freeze-frame between the deciding kill and the round-end screen.
    Ko { remaining_ticks: u32 },
    /// Score reveal; waits for the winner's confirm press or a timeout.
    RoundEnd { timeout_ticks: u32 },
    /// Terminal until a rematch or menu action tears the match down.
    Win { winner: u8 },
}

impl MatchPhase {
    /// Whether combat systems (movement, projectiles, collision, terrain)
    /// should process this phase. Ko stays active so the slow-motion
    /// freeze-frame still shows drifting bodies.
    pub fn combat_active(&self) -> bool {
        matches!(self, MatchPhase::Fight | MatchPhase::Ko { .. })
    }
}

/// Singleton match state, lifecycle = one match.
#[derive(Resource, Debug, Clone)]
pub struct MatchState {
    pub phase: MatchPhase,
    /// 1-based round number.
    pub round: u32,
    pub records: SmallVec<[PlayerRecord; 4]>,
    /// Scores as they stood before the latest round-end increment, kept
    /// for the score-reveal animation.
    pub pre_round_scores: SmallVec<[u32; 4]>,
    pub win_threshold: u32,
    /// Winner of the round being presented; -1 on a draw.
    pub round_winner: i8,
    pub team_mode: bool,
    /// Ticks during which motion is fully frozen to sell an impact.
    pub hitstop: u32,
    pub slowmo_remaining: u32,
    pub slowmo_factor: f32,
    /// Deaths recorded by the kill path since the last evaluation pass.
    pub deaths_this_tick: u8,
}

impl MatchState {
    pub fn new(config: &MatchConfig) -> Self {
        Self {
            phase: MatchPhase::Ready {
                remaining_ticks: timing::READY_TICKS,
            },
            round: 1,
            records: config.players.iter().map(|_| PlayerRecord::default()).collect(),
            pre_round_scores: config.players.iter().map(|_| 0).collect(),
            win_threshold: config.win_threshold,
            round_winner: -1,
            team_mode: config.team_mode(),
            hitstop: 0,
            slowmo_remaining: 0,
            slowmo_factor: timing::KO_SLOWMO_FACTOR,
            deaths_this_tick: 0,
        }
    }

    /// Multiplier applied to position deltas this tick. Hitstop freezes
    /// motion entirely; slow-motion scales it without halting input.
    pub fn time_scale(&self) -> f32 {
        if self.hitstop > 0 {
            0.0
        } else if self.slowmo_remaining > 0 {
            self.slowmo_factor
        } else {
            1.0
        }
    }
}

/// Suspending pause overlay, reachable from any non-terminal phase; the
/// underlying [`MatchPhase`] is untouched while active.
#[derive(Resource, Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum PauseState {
    #[default]
    Inactive,
    Active {
        /// `None` pauses indefinitely; `Some(n)` steps n ticks then re-pauses.
        remaining_ticks: Option<u32>,
    },
}

impl PauseState {
    /// Whether the overlay is currently suspending the simulation. A pending
    /// single-step (`Some(n)`, n > 0) lets those ticks run before re-pausing.
    pub fn active(&self) -> bool {
        matches!(
            self,
            PauseState::Active { remaining_ticks: None } | PauseState::Active { remaining_ticks: Some(0) }
        )
    }

    pub fn toggle(&mut self) {
        *self = match self {
            PauseState::Active { .. } => PauseState::Inactive,
            PauseState::Inactive => PauseState::Active { remaining_ticks: None },
        };
    }

    /// Single-step: run exactly one tick, then return to the paused state.
    pub fn step(&mut self) {
        if matches!(self, PauseState::Active { remaining_ticks: None }) {
            *self = PauseState::Active {
                remaining_ticks: Some(1),
            };
        }
    }

    pub fn tick(&mut self) {
        if let PauseState::Active {
            remaining_ticks: Some(ticks),
        } = self
        {
            if *ticks <= 1 {
                *self = PauseState::Active { remaining_ticks: None };
            } else {
                *ticks -= 1;
            }
        }
    }
}

/// Counts distinct living factions and derives a round result.
///
/// Returns `None` while more than one faction stands, `Some(-1)` when no
/// one does (a draw), and `Some(id)` of a surviving player otherwise.
fn evaluate_round_end(players: &[(u8, i16, bool)]) -> Option<i8> {
    let mut factions: SmallVec<[i16; 4]> = SmallVec::new();
    let mut survivor: Option<u8> = None;
    for (id, faction, alive) in players {
        if *alive {
            if survivor.is_none() {
                survivor = Some(*id);
            }
            if !factions.contains(faction) {
                factions.push(*faction);
            }
        }
    }
    match factions.len() {
        0 => Some(-1),
        1 => survivor.map(|id| id as i8),
        _ => None,
    }
}

/// Drives phase transitions, scoring and per-round resets.
#[allow(clippy::too_many_arguments)]
#[allow(clippy::type_complexity)]
pub fn match_state_system(
    mut match_state: ResMut<MatchState>,
    config: Res<MatchConfig>,
    mut replay: ResMut<ReplayBuffer>,
    mut powerup_timer: ResMut<PowerupTimer>,
    mut commands: Commands,
    mut events: EventWriter<GameEvent>,
    mut players: Query<(
        &mut Player,
        &mut Transform,
        &mut Velocity,
        &mut Dash,
        &mut Charge,
        &mut StatusEffects,
        &InputFrame,
    )>,
    transient: Query<Entity, Or<(With<Boomerang>, With<Powerup>, With<Trail>, With<Boulder>)>>,
    mut ring: Query<&mut HazardRing>,
) {
    // Presentation timers tick independently of the phase machine.
    match_state.hitstop = match_state.hitstop.saturating_sub(1);
    match_state.slowmo_remaining = match_state.slowmo_remaining.saturating_sub(1);

    let new_phase = match match_state.phase {
        MatchPhase::Ready { remaining_ticks } => {
            if remaining_ticks > 0 {
                MatchPhase::Ready {
                    remaining_ticks: remaining_ticks - 1,
                }
            } else {
                info!(round = match_state.round, "Round live");
                events.write(GameEvent::RoundStart {
                    round: match_state.round,
                });
                MatchPhase::Fight
            }
        }
        MatchPhase::Fight => {
            if match_state.deaths_this_tick > 0 {
                // Evaluate once over the whole kill sequence of this tick,
                // never per kill in isolation: simultaneous deaths must
                // resolve to a draw, not two round-ends.
                let roster: SmallVec<[(u8, i16, bool); 4]> =
                    players.iter().map(|(p, ..)| (p.id, p.faction(), p.alive)).collect();
                match evaluate_round_end(&roster) {
                    Some(winner) => {
                        debug!(winner, "Round decided");
                        match_state.round_winner = winner;
                        match_state.hitstop = timing::KO_HITSTOP_TICKS;
                        match_state.slowmo_remaining = timing::KO_SLOWMO_TICKS;
                        MatchPhase::Ko {
                            remaining_ticks: timing::KO_TICKS,
                        }
                    }
                    None => MatchPhase::Fight,
                }
            } else {
                MatchPhase::Fight
            }
        }
        MatchPhase::Ko { remaining_ticks } => {
            // Combat stays live through the freeze-frame, so a boulder or a
            // running burn can still kill the presumed winner. Re-evaluate
            // on any death; all factions down downgrades the round to a draw.
            if match_state.deaths_this_tick > 0 {
                let roster: SmallVec<[(u8, i16, bool); 4]> =
                    players.iter().map(|(p, ..)| (p.id, p.faction(), p.alive)).collect();
                if let Some(winner) = evaluate_round_end(&roster) {
                    if winner != match_state.round_winner {
                        debug!(winner, "Round outcome revised during Ko");
                        match_state.round_winner = winner;
                    }
                }
            }
            if remaining_ticks > 0 {
                MatchPhase::Ko {
                    remaining_ticks: remaining_ticks - 1,
                }
            } else {
                enter_round_end(&mut match_state, &mut players, &mut replay, &mut events)
            }
        }
        MatchPhase::RoundEnd { timeout_ticks } => {
            let winner = match_state.round_winner;
            let confirmed = if winner >= 0 {
                let winner_is_ai = config
                    .players
                    .get(winner as usize)
                    .is_some_and(|setup| setup.ai.is_some());
                !winner_is_ai
                    && players
                        .iter()
                        .any(|(p, _, _, _, _, _, input)| p.id == winner as u8 && input.action_pressed)
            } else {
                // A draw has no winner to confirm; only the timeout advances.
                false
            };

            if confirmed || timeout_ticks == 0 {
                advance_after_round(
                    &mut match_state,
                    &config,
                    &mut players,
                    &transient,
                    &mut ring,
                    &mut replay,
                    &mut powerup_timer,
                    &mut commands,
                    &mut events,
                )
            } else {
                MatchPhase::RoundEnd {
                    timeout_ticks: timeout_ticks - 1,
                }
            }
        }
        MatchPhase::Win { winner } => MatchPhase::Win { winner },
    };

    match_state.phase = new_phase;
    match_state.deaths_this_tick = 0;
}

/// Ko freeze-frame is over: bank the score and start the replay loop.
fn enter_round_end(
    match_state: &mut MatchState,
    players: &mut Query<(
        &mut Player,
        &mut Transform,
        &mut Velocity,
        &mut Dash,
        &mut Charge,
        &mut StatusEffects,
        &InputFrame,
    )>,
    replay: &mut ReplayBuffer,
    events: &mut EventWriter<GameEvent>,
) -> MatchPhase {
    match_state.pre_round_scores = match_state.records.iter().map(|r| r.score).collect();

    let winner = match_state.round_winner;
    if winner >= 0 {
        // In team mode every member of the winning faction scores.
        let winning_faction = players
            .iter()
            .find(|(p, ..)| p.id == winner as u8)
            .map(|(p, ..)| p.faction());
        if let Some(faction) = winning_faction {
            for (player, ..) in players.iter_mut() {
                if player.faction() == faction {
                    let record = &mut match_state.records[player.id as usize];
                    record.score += 1;
                    events.write(GameEvent::ScoreChange {
                        player: player.id,
                        score: record.score,
                    });
                }
            }
        }
    }

    info!(winner, round = match_state.round, "Round over");
    events.write(GameEvent::RoundEnd { winner });
    replay.begin_playback(replay::DEFAULT_SPEED);

    MatchPhase::RoundEnd {
        timeout_ticks: timing::ROUND_END_TIMEOUT_TICKS,
    }
}

/// Confirmation received (or timed out): either the match is decided, or
/// all per-round transient state resets and a new round counts down.
#[allow(clippy::too_many_arguments)]
#[allow(clippy::type_complexity)]
fn advance_after_round(
    match_state: &mut MatchState,
    config: &MatchConfig,
    players: &mut Query<(
        &mut Player,
        &mut Transform,
        &mut Velocity,
        &mut Dash,
        &mut Charge,
        &mut StatusEffects,
        &InputFrame,
    )>,
    transient: &Query<Entity, Or<(With<Boomerang>, With<Powerup>, With<Trail>, With<Boulder>)>>,
    ring: &mut Query<&mut HazardRing>,
    replay: &mut ReplayBuffer,
    powerup_timer: &mut PowerupTimer,
    commands: &mut Commands,
    events: &mut EventWriter<GameEvent>,
) -> MatchPhase {
    if let Some(champion) = match_state
        .records
        .iter()
        .position(|r| r.score >= match_state.win_threshold)
    {
        info!(winner = champion, "Match won");
        events.write(GameEvent::MatchWon { player: champion as u8 });
        return MatchPhase::Win { winner: champion as u8 };
    }

    for entity in transient.iter() {
        commands.entity(entity).despawn();
    }

    for (mut player, mut transform, mut velocity, mut dash, mut charge, mut statuses, _) in players.iter_mut() {
        let spawn = config.arena.spawn_points[player.id as usize];
        player.alive = true;
        player.has_boomerang = true;
        player.catch_cooldown = 0;
        player.portal_cooldown = 0;
        player.shield_charges = 0;
        player.facing = 0.0;
        *transform = Transform::from_position(spawn);
        *velocity = Velocity(Vec2::ZERO);
        *dash = Dash::Ready;
        *charge = Charge::Idle;
        statuses.0.clear();
    }

    if let (Ok(mut hazard), Some(ring_config)) = (ring.single_mut(), config.arena.hazard_ring) {
        hazard.radius = ring_config.initial_radius;
    }

    replay.clear();
    powerup_timer.0 = crate::constants::powerup::SPAWN_INTERVAL_TICKS;

    match_state.round += 1;
    match_state.round_winner = -1;
    match_state.hitstop = 0;
    match_state.slowmo_remaining = 0;
    debug!(round = match_state.round, "Round reset complete");

    MatchPhase::Ready {
        remaining_ticks: timing::READY_TICKS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_round_end_two_factions_standing() {
        let roster = [(0, -1, true), (1, -2, true)];
        assert_eq!(evaluate_round_end(&roster), None);
    }

    #[test]
    fn test_evaluate_round_end_sole_survivor() {
        let roster = [(0, -1, true), (1, -2, false)];
        assert_eq!(evaluate_round_end(&roster), Some(0));
    }

    #[test]
    fn test_evaluate_round_end_draw() {
        let roster = [(0, -1, false), (1, -2, false)];
        assert_eq!(evaluate_round_end(&roster), Some(-1));
    }

    #[test]
    fn test_evaluate_round_end_team_survivors_count_as_one_faction() {
        let roster = [(0, 0, true), (1, 0, true), (2, -3, false)];
        assert_eq!(evaluate_round_end(&roster), Some(0));
    }

    #[test]
    fn test_pause_overlay_step_returns_to_paused() {
        let mut pause = PauseState::Inactive;
        pause.toggle();
        assert!(pause.active());

        pause.step();
        assert!(!pause.active(), "the stepped tick must be allowed to run");
        pause.tick();
        assert!(pause.active());
        assert_eq!(pause, PauseState::Active { remaining_ticks: None });
    }
}
