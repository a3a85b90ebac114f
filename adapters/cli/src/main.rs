#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Overheat sessions headlessly.

mod autopilot;

use std::{fs, path::Path, path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use autopilot::{Autopilot, RunStats, Strategy};
use clap::Parser;
use overheat_core::{format_clock, Event, Lifecycle, SessionConfig};
use overheat_session::{BestTimeStore, FileBestTimeStore, MemoryBestTimeStore, SessionController};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless Overheat session runner", long_about = None)]
struct Args {
    /// TOML file overriding the default session configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the shared random stream (overrides the configuration file)
    #[arg(long)]
    seed: Option<u64>,

    /// File holding the best survived time; kept in memory when omitted
    #[arg(long)]
    best_time_file: Option<PathBuf>,

    /// Number of consecutive runs, restarting after each one ends
    #[arg(long, default_value_t = 1)]
    runs: u32,

    /// Scripted player behaviour
    #[arg(long, value_enum, default_value_t = Strategy::Reflex)]
    strategy: Strategy,

    /// Delay between two threat closures by the scripted player (milliseconds)
    #[arg(long, default_value_t = 450)]
    reaction_ms: u64,

    /// Simulation ticks per second
    #[arg(long, default_value_t = 60)]
    tick_rate: u32,

    /// Give up on a run after this many simulated seconds
    #[arg(long, default_value_t = 900)]
    max_seconds: u64,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

/// Entry point for the Overheat command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SessionConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    if args.print_config {
        let rendered =
            toml::to_string_pretty(&config).context("Failed to render configuration as TOML")?;
        println!("{rendered}");
        return Ok(());
    }

    match &args.best_time_file {
        Some(path) => play(config, FileBestTimeStore::new(path), &args),
        None => play(config, MemoryBestTimeStore::default(), &args),
    }
}

fn load_config(path: &Path) -> Result<SessionConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration at {}", path.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("Failed to parse configuration at {}", path.display()))
}

fn play<S: BestTimeStore>(config: SessionConfig, store: S, args: &Args) -> Result<()> {
    ensure!(args.tick_rate > 0, "--tick-rate must be positive");
    ensure!(args.runs > 0, "--runs must be positive");

    let dt = Duration::from_secs(1) / args.tick_rate;
    let limit = Duration::from_secs(args.max_seconds);
    let mut session =
        SessionController::new(config, store).context("Failed to start session")?;
    let mut pilot = Autopilot::new(args.strategy, Duration::from_millis(args.reaction_ms));

    for run in 0..args.runs {
        if run > 0 {
            session
                .request_restart()
                .context("Session refused to restart")?;
            pilot.reset();
        }

        let mut stats = RunStats::default();
        while session.lifecycle() != Lifecycle::Over {
            if session.lifecycle() == Lifecycle::Running && session.elapsed_time() >= limit {
                println!(
                    "run {}: still running after {}, giving up",
                    run + 1,
                    format_clock(limit)
                );
                return Ok(());
            }

            pilot.act(&mut session, dt);
            session.advance(dt);
            for event in session.drain_events() {
                stats.observe(&event);
                if let Event::SessionOver {
                    reason,
                    elapsed,
                    best,
                } = event
                {
                    info!(run = run + 1, "run finished");
                    println!(
                        "run {}: {} survived {} (best {})",
                        run + 1,
                        reason.headline(),
                        format_clock(elapsed),
                        format_clock(best),
                    );
                }
            }
        }

        println!(
            "  threats spawned {}, closed {}, expired {}; powerups caught {}, consumed {}",
            stats.spawned, stats.closed, stats.expired, stats.caught, stats.consumed
        );
    }

    Ok(())
}
