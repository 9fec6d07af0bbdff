#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for Warband: auto-plays seeded runs and dumps maps.

mod config;
mod play;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;
use warband_system_encounters::StartingTeam;
use warband_system_map_generation::generate_map;

use crate::{config::RunConfig, play::Autopilot};

/// Warband: a roguelite of layered floors and front-line battles.
#[derive(Debug, Parser)]
#[command(name = "warband", version, about)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Auto-plays a seeded run and prints the narration.
    Play(PlayArgs),
    /// Prints a generated floor map as JSON.
    Map(MapArgs),
}

#[derive(Debug, Args)]
struct PlayArgs {
    /// TOML file supplying defaults for the options below.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for maps, enemies and coin flips.
    #[arg(long)]
    seed: Option<u64>,
    /// Starting party: balanced, aggressive or defensive.
    #[arg(long)]
    team: Option<StartingTeam>,
    /// Floors to clear before the run is won.
    #[arg(long)]
    floors: Option<u32>,
    /// Milliseconds between combat exchanges.
    #[arg(long)]
    tick_interval_ms: Option<u64>,
    /// Sleep through combat and coin flips instead of simulating time.
    #[arg(long)]
    realtime: bool,
    /// Print only the final summary.
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Debug, Args)]
struct MapArgs {
    /// Seed for the generator.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Floor number written into the map.
    #[arg(long, default_value_t = 1)]
    floor: u32,
    /// Emit compact JSON on a single line.
    #[arg(long)]
    compact: bool,
}

/// Entry point for the Warband command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        CliCommand::Play(args) => play(args),
        CliCommand::Map(args) => map(&args),
    }
}

fn play(args: PlayArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(team) = args.team {
        config.starting_team = team;
    }
    if let Some(floors) = args.floors {
        config.floors = floors.max(1);
    }
    if let Some(interval) = args.tick_interval_ms {
        config.tick_interval_ms = interval.max(1);
    }

    tracing::info!(seed = config.seed, team = %config.starting_team, "starting run");
    let summary = Autopilot::new(config, args.realtime, !args.quiet)
        .play()
        .context("auto-played run failed")?;
    println!("{summary}");
    Ok(())
}

fn map(args: &MapArgs) -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let map = generate_map(args.floor.max(1), &mut rng);
    let json = if args.compact {
        serde_json::to_string(&map)
    } else {
        serde_json::to_string_pretty(&map)
    }
    .context("failed to serialize the generated map")?;
    println!("{json}");
    Ok(())
}
