//! Headless runner for Nightfall Survivors.
//!
//! Runs the combat simulation without graphics for balance tuning and CI.
//!
//! # Usage
//!
//! ```bash
//! # Play one run and print the JSON report
//! cargo run -p survivor_headless -- run --seed 42
//!
//! # Sweep many seeds for a win-rate estimate
//! cargo run -p survivor_headless -- batch --count 100 --difficulty hard
//!
//! # Verify determinism of a seed
//! cargo run -p survivor_headless -- verify --seed 12345
//! ```
//!
//! Reports go to stdout as JSON, one per line; logs go to stderr.

use clap::{Parser, Subcommand, ValueEnum};
use survivor_core::prelude::DifficultyTier;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use survivor_headless::runner::{play, verify_determinism, RunConfig};

#[derive(Parser)]
#[command(name = "survivor_headless")]
#[command(about = "Headless balance runner for Nightfall Survivors")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Difficulty tier selection on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Difficulty {
    /// Baseline tuning.
    Normal,
    /// Tougher and more rewarding.
    Hard,
    /// Brutal.
    Hell,
}

impl From<Difficulty> for DifficultyTier {
    fn from(value: Difficulty) -> Self {
        match value {
            Difficulty::Normal => DifficultyTier::Normal,
            Difficulty::Hard => DifficultyTier::Hard,
            Difficulty::Hell => DifficultyTier::Hell,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Play one autopilot run and print its report
    Run {
        /// RNG seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Difficulty tier
        #[arg(long, value_enum, default_value = "normal")]
        difficulty: Difficulty,

        /// Maximum run length in sim seconds
        #[arg(long, default_value = "600")]
        duration_secs: u64,

        /// Sim-time multiplier per tick
        #[arg(long, default_value = "1.0")]
        time_scale: f32,
    },

    /// Play many runs across consecutive seeds for a win-rate estimate
    Batch {
        /// Number of runs
        #[arg(short, long, default_value = "20")]
        count: u64,

        /// Starting seed; runs use seed, seed+1, ...
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Difficulty tier
        #[arg(long, value_enum, default_value = "normal")]
        difficulty: Difficulty,

        /// Maximum run length in sim seconds
        #[arg(long, default_value = "600")]
        duration_secs: u64,
    },

    /// Verify a seed replays identically
    Verify {
        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Ticks to simulate per verification run
        #[arg(long, default_value = "12000")]
        ticks: u64,

        /// Difficulty tier
        #[arg(long, value_enum, default_value = "normal")]
        difficulty: Difficulty,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logging to stderr; stdout carries the JSON reports
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Run {
            seed,
            difficulty,
            duration_secs,
            time_scale,
        }) => cmd_run(seed, difficulty, duration_secs, time_scale),
        Some(Commands::Batch {
            count,
            seed,
            difficulty,
            duration_secs,
        }) => cmd_batch(count, seed, difficulty, duration_secs),
        Some(Commands::Verify {
            seed,
            ticks,
            difficulty,
        }) => cmd_verify(seed, ticks, difficulty),
        None => cmd_run(0, Difficulty::Normal, 600, 1.0),
    }
}

fn cmd_run(seed: u64, difficulty: Difficulty, duration_secs: u64, time_scale: f32) {
    let config = RunConfig {
        seed,
        tier: difficulty.into(),
        max_duration_ms: duration_secs * 1_000,
        time_scale,
        ..RunConfig::default()
    };
    let report = play(&config);
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(err) => tracing::error!(%err, "report serialization failed"),
    }
}

fn cmd_batch(count: u64, start_seed: u64, difficulty: Difficulty, duration_secs: u64) {
    let mut victories = 0u64;
    let mut total_survived_ms = 0u64;
    for i in 0..count {
        let config = RunConfig {
            seed: start_seed + i,
            tier: difficulty.into(),
            max_duration_ms: duration_secs * 1_000,
            report_every_min: 0,
            ..RunConfig::default()
        };
        let report = play(&config);
        if report.outcome == "victory" {
            victories += 1;
        }
        total_survived_ms += report.survived_ms;
        match serde_json::to_string(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => tracing::error!(%err, "report serialization failed"),
        }
    }
    tracing::info!(
        runs = count,
        victories,
        win_rate = victories as f64 / count.max(1) as f64,
        avg_survived_secs = total_survived_ms / count.max(1) / 1_000,
        "batch complete"
    );
}

fn cmd_verify(seed: u64, ticks: u64, difficulty: Difficulty) {
    if verify_determinism(seed, difficulty.into(), ticks) {
        tracing::info!(seed, ticks, "determinism verified");
    } else {
        tracing::error!(seed, ticks, "determinism FAILED");
        std::process::exit(1);
    }
}
