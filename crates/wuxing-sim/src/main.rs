//! # Wuxing Sim
//!
//! Headless duel runner for the Wuxing combat engine.
//!
//! Loads combat tuning and skill data, then plays a scripted fight between
//! a player and a pair of enemies, logging every combat event.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod duel;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wuxing_combat::{CombatConfig, CONFIG_FILE, DEFAULT_SKILL_PATH};

use crate::duel::DuelOptions;

/// Run a headless duel through the Wuxing combat engine
#[derive(Parser, Debug)]
#[command(name = "wuxing-sim")]
#[command(about = "Run a headless duel through the Wuxing combat engine", long_about = None)]
#[command(version)]
struct Cli {
    /// Combat configuration file (TOML)
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Skill directory or single skill file (TOML)
    #[arg(long, default_value = DEFAULT_SKILL_PATH)]
    skills: PathBuf,

    /// RNG seed, overriding the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum number of ticks to simulate
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Tick length in milliseconds
    #[arg(long, default_value_t = 100.0)]
    tick_ms: f64,

    /// Print combat events as JSON lines
    #[arg(long)]
    json: bool,
}

/// Main entry point.
fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("wuxing=info".parse()?))
        .init();

    info!("Wuxing sim starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = CombatConfig::load_from(&cli.config);
    if let Some(seed) = cli.seed {
        config.rng_seed = Some(seed);
    }

    let registry = duel::load_registry(&cli.skills)?;
    let options = DuelOptions {
        ticks: cli.ticks,
        tick_ms: cli.tick_ms,
        json: cli.json,
    };

    let summary = duel::run(config, &registry, &options)?;
    info!(
        "Duel finished after {} ticks ({:.1}s): {}",
        summary.ticks,
        summary.elapsed_ms / 1000.0,
        summary.outcome
    );
    info!(
        "Damage dealt: {}, gesture strikes: {}, skills resolved: {}, revives: {}",
        summary.damage_dealt, summary.gesture_strikes, summary.skills_resolved, summary.revives
    );

    Ok(())
}
