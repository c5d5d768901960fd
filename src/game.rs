//! Match orchestration: world construction, the tick schedule and the
//! public control surface for a frontend.
//!
//! [`Game`] owns a `bevy_ecs` [`World`] plus one [`Schedule`] that runs the
//! whole simulation for a tick. System sets run in a fixed chain so a given
//! seed and input stream always replays identically.

use bevy_ecs::{
    event::{EventRegistry, Events},
    prelude::*,
    schedule::{Schedule, SystemSet},
};
use glam::Vec2;
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::config::MatchConfig;
use crate::constants::{ai, collider, powerup};
use crate::error::{GameError, GameResult};
use crate::events::GameEvent;
use crate::stats::{stats_system, LifetimeStats};
use crate::systems::components::{
    AiController, Charge, Collider, Dash, HazardRing, InputFrame, Player, PlayerBundle, PlayerHandles, Portal,
    PowerupTimer, SimRng, SimTick, StatusEffects, TerrainZone, Transform, Velocity, Wall,
};
use crate::systems::replay::ReplayBuffer;
use crate::systems::state::{MatchPhase, MatchState, PauseState};
use crate::systems::{
    ai_control_system, boomerang_player_system, boomerang_wall_system, boulder_system, hazard_ring_system,
    match_state_system, pickup_collection_system, player_collision_system, player_movement_system,
    portal_system, powerup_spawn_system, projectile_flight_system, replay_capture_system, replay_playback_system,
    status_system, time_to_live_system, trail_overlap_system, water_system,
};
use rand::SeedableRng;

/// Tick pipeline stages, executed strictly in declaration order.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum SimSet {
    /// AI controllers write their input frames.
    Input,
    /// Timed entity expiry (trails).
    Decay,
    /// Player locomotion, dash, charge and status countdown.
    Movement,
    /// Projectile flight.
    Projectile,
    /// Contact resolution.
    Collision,
    /// Arena hazards and pickups.
    Terrain,
    /// Phase machine, scoring and stats.
    State,
    /// Replay capture/playback and input edge cleanup.
    Output,
}

pub struct Game {
    world: World,
    schedule: Schedule,
    /// Outbound queue: events collected from the world each tick and held
    /// until the frontend drains them, however rarely it polls.
    pending_events: Vec<GameEvent>,
}

impl Game {
    /// Builds a fully initialized match from a validated configuration.
    pub fn new(config: MatchConfig) -> GameResult<Self> {
        config.validate()?;

        let mut world = World::default();
        EventRegistry::register_event::<GameEvent>(&mut world);

        let stats = config
            .stats_path
            .as_deref()
            .map(LifetimeStats::load)
            .unwrap_or_default();

        world.insert_resource(MatchState::new(&config));
        world.insert_resource(PauseState::default());
        world.insert_resource(SimTick::default());
        world.insert_resource(SimRng(rand::rngs::SmallRng::seed_from_u64(config.seed)));
        world.insert_resource(PowerupTimer(powerup::SPAWN_INTERVAL_TICKS));
        world.insert_resource(ReplayBuffer::new());
        world.insert_resource(stats);

        spawn_players(&mut world, &config);
        spawn_arena(&mut world, &config);
        world.insert_resource(config);

        let mut schedule = Schedule::default();
        configure_schedule(&mut schedule);

        info!("Match initialized");
        Ok(Self {
            world,
            schedule,
            pending_events: Vec::new(),
        })
    }

    /// Runs exactly one simulation tick.
    pub fn tick(&mut self) {
        self.schedule.run(&mut self.world);
        // Collected after the schedule: in-world readers (stats) consume
        // this tick's events first.
        self.pending_events
            .extend(self.world.resource_mut::<Events<GameEvent>>().drain());
        self.world.resource_mut::<PauseState>().tick();
        self.world.resource_mut::<SimTick>().0 += 1;
    }

    /// Replaces the input frame for an external (human) slot.
    pub fn set_player_input(&mut self, slot: usize, frame: InputFrame) -> GameResult<()> {
        let entity = self
            .world
            .resource::<PlayerHandles>()
            .0
            .get(slot)
            .copied()
            .ok_or_else(|| GameError::InvalidState(format!("no player in slot {slot}")))?;
        let mut input = self
            .world
            .get_mut::<InputFrame>(entity)
            .ok_or_else(|| GameError::InvalidState(format!("slot {slot} has no input component")))?;
        *input = frame;
        Ok(())
    }

    /// Drains every event emitted since the last drain, however many ticks
    /// ago that was.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn phase(&self) -> MatchPhase {
        self.world.resource::<MatchState>().phase
    }

    pub fn match_state(&self) -> &MatchState {
        self.world.resource()
    }

    pub fn tick_count(&self) -> u64 {
        self.world.resource::<SimTick>().0
    }

    pub fn is_paused(&self) -> bool {
        self.world.resource::<PauseState>().active()
    }

    pub fn toggle_pause(&mut self) {
        self.world.resource_mut::<PauseState>().toggle();
        debug!(paused = self.is_paused(), "Pause toggled");
    }

    /// While paused, queues exactly one tick of simulation.
    pub fn step_paused(&mut self) {
        self.world.resource_mut::<PauseState>().step();
    }

    pub fn replay(&self) -> &ReplayBuffer {
        self.world.resource()
    }

    pub fn set_replay_speed(&mut self, speed: f32) {
        self.world.resource_mut::<ReplayBuffer>().set_speed(speed);
    }

    pub fn stats(&self) -> &LifetimeStats {
        self.world.resource()
    }

    /// Persists lifetime stats if a path was configured.
    pub fn save_stats(&self) -> GameResult<()> {
        if let Some(path) = self.world.resource::<MatchConfig>().stats_path.as_deref() {
            self.world.resource::<LifetimeStats>().save(path)?;
        }
        Ok(())
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

fn configure_schedule(schedule: &mut Schedule) {
    schedule.configure_sets(
        (
            SimSet::Input.run_if(ai_running),
            SimSet::Decay.run_if(gameplay_running),
            SimSet::Movement.run_if(gameplay_running),
            SimSet::Projectile.run_if(gameplay_running),
            SimSet::Collision.run_if(gameplay_running),
            SimSet::Terrain.run_if(gameplay_running),
            SimSet::State.run_if(unpaused),
            SimSet::Output.run_if(unpaused),
        )
            .chain(),
    );

    schedule.add_systems((
        ai_control_system.in_set(SimSet::Input),
        time_to_live_system.in_set(SimSet::Decay),
        (status_system, player_movement_system).chain().in_set(SimSet::Movement),
        projectile_flight_system.in_set(SimSet::Projectile),
        (
            player_collision_system,
            boomerang_wall_system,
            boomerang_player_system,
            pickup_collection_system,
            trail_overlap_system,
        )
            .chain()
            .in_set(SimSet::Collision),
        (
            water_system,
            portal_system,
            boulder_system,
            hazard_ring_system,
            powerup_spawn_system,
        )
            .chain()
            .in_set(SimSet::Terrain),
        (match_state_system, stats_system).chain().in_set(SimSet::State),
        (
            replay_capture_system.run_if(capture_running),
            replay_playback_system.run_if(playback_running),
            input_edge_reset_system,
        )
            .chain()
            .in_set(SimSet::Output),
    ));
}

/// Combat systems run while fighting (or during the Ko freeze-frame) and
/// neither paused nor inside a hitstop window.
fn gameplay_running(match_state: Res<MatchState>, pause: Res<PauseState>) -> bool {
    !pause.active() && match_state.hitstop == 0 && match_state.phase.combat_active()
}

/// AI only thinks during live fighting; Ko and round-end take no input.
fn ai_running(match_state: Res<MatchState>, pause: Res<PauseState>) -> bool {
    !pause.active() && match_state.phase == MatchPhase::Fight
}

fn unpaused(pause: Res<PauseState>) -> bool {
    !pause.active()
}

fn capture_running(match_state: Res<MatchState>, pause: Res<PauseState>) -> bool {
    !pause.active() && match_state.phase.combat_active()
}

fn playback_running(match_state: Res<MatchState>, pause: Res<PauseState>) -> bool {
    !pause.active() && matches!(match_state.phase, MatchPhase::RoundEnd { .. })
}

/// Edge flags are one-tick signals; held state and movement persist until
/// the next external frame.
fn input_edge_reset_system(mut inputs: Query<&mut InputFrame>) {
    for mut input in inputs.iter_mut() {
        input.action_pressed = false;
        input.action_released = false;
        input.dash_pressed = false;
    }
}

fn spawn_players(world: &mut World, config: &MatchConfig) {
    let mut handles: SmallVec<[Entity; 4]> = SmallVec::new();
    let center = config.arena.size / 2.0;

    for (index, setup) in config.players.iter().enumerate() {
        let spawn = config.arena.spawn_points[index];
        let mut player = Player::new(index as u8, setup.team, setup.skin);
        player.facing = (center - spawn).to_angle();

        let mut entity = world.spawn(PlayerBundle {
            player,
            transform: Transform::from_position(spawn),
            velocity: Velocity::default(),
            collider: Collider::circle(collider::PLAYER_RADIUS),
            dash: Dash::default(),
            charge: Charge::default(),
            statuses: StatusEffects::default(),
            input: InputFrame::default(),
        });

        if let Some(difficulty) = setup.ai {
            let tier = difficulty.tier();
            let tuning = &ai::TUNING[tier];
            entity.insert(AiController {
                tier,
                attack_timer: tuning.attack_delay.1,
                ideal_distance: (tuning.ideal_distance.0 + tuning.ideal_distance.1) / 2.0,
                target_charge: None,
                orbit_sign: if index % 2 == 0 { 1.0 } else { -1.0 },
            });
        }

        handles.push(entity.id());
    }

    world.insert_resource(PlayerHandles(handles));
}

fn spawn_arena(world: &mut World, config: &MatchConfig) {
    let layout = &config.arena;

    for (position, shape) in &layout.walls {
        world.spawn((
            Wall,
            Transform::from_position(*position),
            Collider { shape: shape.clone() },
        ));
    }

    for (position, shape, kind) in &layout.zones {
        world.spawn((
            TerrainZone { kind: *kind },
            Transform::from_position(*position),
            Collider { shape: shape.clone() },
        ));
    }

    for (index, pair) in layout.portals.iter().enumerate() {
        let id_a = (index * 2) as u8;
        let id_b = id_a + 1;
        world.spawn((
            Portal { id: id_a, link: id_b },
            Transform::from_position(pair.a),
            Collider::circle(collider::PICKUP_RADIUS * 2.0),
        ));
        world.spawn((
            Portal { id: id_b, link: id_a },
            Transform::from_position(pair.b),
            Collider::circle(collider::PICKUP_RADIUS * 2.0),
        ));
    }

    for spawner in &layout.boulder_spawners {
        world.spawn((
            crate::systems::components::BoulderSpawner {
                interval: spawner.interval_ticks,
                timer: spawner.interval_ticks,
                direction: spawner.direction.normalize_or(Vec2::NEG_Y),
            },
            Transform::from_position(spawner.position),
        ));
    }

    if let Some(ring) = layout.hazard_ring {
        world.spawn((
            HazardRing {
                radius: ring.initial_radius,
                shrink_rate: ring.shrink_rate,
                min_radius: ring.min_radius,
            },
            Transform::from_position(layout.size / 2.0),
        ));
    }
}
