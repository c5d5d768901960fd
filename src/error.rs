//! Centralized error types for the simulation core.
//!
//! The tick path itself has no I/O failure surface; errors here cover
//! match configuration, geometry validation and persisted-statistics I/O.

use std::io;

/// Main error type for the simulation.
///
/// This is the primary error type that should be used in public APIs.
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Errors produced while validating a match configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Player count must be 2-4, got {0}")]
    PlayerCount(usize),

    #[error("Win threshold must be at least 1")]
    WinThreshold,

    #[error("Arena provides {have} spawn points but {needed} players were configured")]
    SpawnPoints { needed: usize, have: usize },

    #[error("Degenerate collider shape: {0}")]
    DegenerateShape(String),
}

/// Errors related to persisted-statistics operations.
///
/// These are never fatal to gameplay; loading degrades to defaults.
#[derive(thiserror::Error, Debug)]
pub enum StatsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for game operations.
pub type GameResult<T> = Result<T, GameError>;
