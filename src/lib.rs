//! Racer Core - Driving simulation for a top-down racing game
//!
//! Provides the fixed-step session driver a renderer polls each frame, plus a
//! headless runner for autopilot sessions.

pub mod catalog;
pub mod error;
pub mod race;
pub mod summary;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

pub use catalog::{CarDef, Catalog, TrackDef};
pub use error::{ConfigError, SummaryError};
pub use race::{
    ControlInput, Difficulty, Intent, LapTelemetry, RaceStatus, SessionConfig, SessionDriver,
    SessionStats, Snapshot,
};
pub use summary::{LocalDigest, Summarizer, SummaryRequest, FALLBACK_SUMMARY};

/// Headless session options
#[derive(Debug, Parser)]
#[command(name = "racer-headless", about = "Run an autopilot session and print its telemetry")]
pub struct Args {
    /// Track id from the catalog
    #[arg(long, default_value = "sunset-oval")]
    pub track: String,

    /// Car id from the catalog
    #[arg(long, default_value = "roadster")]
    pub car: String,

    /// Autopilot difficulty
    #[arg(long, value_enum, default_value = "medium")]
    pub difficulty: Difficulty,

    /// Laps to drive before the session ends
    #[arg(long, default_value_t = 3)]
    pub laps: u32,

    /// Give up after this many simulated seconds
    #[arg(long, default_value_t = 300.0)]
    pub max_seconds: f32,

    /// Catalog JSON file; the built-in catalog is used when omitted
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Seconds allowed for the post-session summary
    #[arg(long, default_value_t = 5)]
    pub summary_timeout: u64,
}

/// Drive one autopilot session to completion and print the results
pub fn run_session(args: &Args) -> Result<SessionStats, ConfigError> {
    let catalog = match &args.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin()?,
    };
    let track = catalog.track(&args.track)?.build()?;
    let car = catalog.car(&args.car)?.config()?;

    let config = SessionConfig {
        autopilot: args.difficulty,
        target_laps: Some(args.laps),
        ..Default::default()
    };
    let frame = config.step();
    let mut driver = SessionDriver::new(track, car, config)?;
    log::info!("Driving {} on {} ({} laps)", args.car, args.track, args.laps);

    let mut simulated = 0.0;
    while simulated < args.max_seconds {
        let snapshot = driver.tick(frame);
        simulated += frame;
        if snapshot.status == RaceStatus::Finished {
            break;
        }
    }

    let stats = driver.end_session();
    let timing = driver.stats();
    log::info!(
        "{} steps, avg tick {:.3}ms",
        timing.steps,
        timing.avg_tick_time_ms
    );

    if let Some(request) = driver.request_summary(
        Arc::new(LocalDigest),
        Duration::from_secs(args.summary_timeout),
    ) {
        println!("{}", request.wait());
    }
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(stats)
}

/// Entry point for the headless binary
pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Racer core headless runner initialized");

    let args = Args::parse();
    if let Err(e) = run_session(&args) {
        log::error!("Session failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_flag_parses_autopilot_levels_only() {
        let args = Args::try_parse_from(["racer-headless", "--difficulty", "hard"]).unwrap();
        assert_eq!(args.difficulty, Difficulty::Hard);

        let args = Args::try_parse_from(["racer-headless"]).unwrap();
        assert_eq!(args.difficulty, Difficulty::Medium);
        assert_eq!(args.laps, 3);

        assert!(Args::try_parse_from(["racer-headless", "--difficulty", "off"]).is_err());
    }
}
