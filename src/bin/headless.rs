//! Headless bot match: runs the simulation to completion and logs the
//! event stream. Useful for balance tweaks and soak-testing determinism.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ricochet_arena::config::{AiDifficulty, MatchConfig, PlayerSetup};
use ricochet_arena::events::GameEvent;
use ricochet_arena::game::Game;
use ricochet_arena::systems::state::MatchPhase;

const MAX_TICKS: u64 = 10 * 60 * 60;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = MatchConfig::new([
        PlayerSetup::bot(0, AiDifficulty::Normal),
        PlayerSetup::bot(1, AiDifficulty::Hard),
    ]);
    let mut game = Game::new(config)?;

    loop {
        game.tick();

        for event in game.drain_events() {
            match event {
                GameEvent::Death { victim, killer, .. } => info!(victim, ?killer, "Death"),
                GameEvent::RoundStart { round } => info!(round, "Round start"),
                GameEvent::RoundEnd { winner } => info!(winner, "Round end"),
                GameEvent::ScoreChange { player, score } => info!(player, score, "Score"),
                GameEvent::MatchWon { player } => info!(player, "Match won"),
                _ => {}
            }
        }

        if let MatchPhase::Win { winner } = game.phase() {
            info!(winner, ticks = game.tick_count(), "Simulation finished");
            break;
        }
        if game.tick_count() >= MAX_TICKS {
            info!("Tick cap reached without a winner");
            break;
        }
    }

    Ok(())
}
