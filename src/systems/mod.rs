//! Simulation systems and the components they operate on.

pub mod ai;
pub mod collision;
pub mod components;
pub mod lifetime;
pub mod movement;
pub mod projectile;
pub mod replay;
pub mod state;
pub mod terrain;

pub use ai::ai_control_system;
pub use collision::{
    boomerang_player_system, boomerang_wall_system, pickup_collection_system, player_collision_system,
    trail_overlap_system,
};
pub use lifetime::{time_to_live_system, TimeToLive};
pub use movement::{player_movement_system, status_system};
pub use projectile::projectile_flight_system;
pub use replay::{replay_capture_system, replay_playback_system, ReplayBuffer, ReplayFrame};
pub use state::{match_state_system, MatchPhase, MatchState, PauseState};
pub use terrain::{boulder_system, hazard_ring_system, portal_system, powerup_spawn_system, water_system};
