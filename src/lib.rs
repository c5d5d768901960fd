//! Simulation core for a local multiplayer boomerang arena game.
//!
//! The crate is headless: it owns the fixed-tick entity world, projectile
//! flight, collision resolution, terrain hazards, the round/match state
//! machine, replay capture and the AI controller. Rendering, audio and raw
//! input devices live outside and talk to the simulation through
//! [`game::Game`] and the [`events::GameEvent`] stream.

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod game;
pub mod stats;
pub mod systems;
