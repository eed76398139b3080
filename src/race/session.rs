//! Session - Configuration, status and the data handed to the outside
//!
//! Everything here is plain serializable data: the per-tick snapshot for the
//! renderer and the end-of-session stats for the summarizer.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::race::control::Difficulty;
use crate::race::effects::{SkidMark, Spark};
use crate::race::progress::{LapTelemetry, ProgressRules};
use crate::race::track::Point;
use crate::race::vehicle::{Vehicle, VehicleState};

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Fixed simulation rate (steps per second)
    pub tick_rate: f32,
    /// Seconds the car is held on the grid before racing
    pub countdown: f32,
    /// Finish automatically after this many laps
    pub target_laps: Option<u32>,
    /// Autopilot strength; `Off` hands control to the player
    pub autopilot: Difficulty,
    /// Seed for cosmetic randomness
    pub effects_seed: u64,
    /// Lap validation rules
    pub progress: ProgressRules,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            countdown: 0.0,
            target_laps: None,
            autopilot: Difficulty::Off,
            effects_seed: 0x5eed,
            progress: ProgressRules::default(),
        }
    }
}

impl SessionConfig {
    /// Lowest rate whose step still fits under the physics hitch cap
    const MIN_TICK_RATE: f32 = 1.0 / Vehicle::MAX_DT;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_rate.is_finite() && self.tick_rate >= Self::MIN_TICK_RATE) {
            return Err(ConfigError::InvalidSession {
                field: "tick_rate",
                value: self.tick_rate,
            });
        }
        if !(self.countdown.is_finite() && self.countdown >= 0.0) {
            return Err(ConfigError::InvalidSession {
                field: "countdown",
                value: self.countdown,
            });
        }
        Ok(())
    }

    /// Seconds per simulation step
    pub fn step(&self) -> f32 {
        1.0 / self.tick_rate
    }
}

/// Race status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceStatus {
    Countdown,
    Racing,
    Finished,
}

/// Immutable record of a finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_laps: u32,
    /// Fastest lap time, if any lap was completed
    pub best_lap: Option<f32>,
    pub laps: Vec<LapTelemetry>,
    /// Unix time in milliseconds
    pub completed_at: u64,
}

impl SessionStats {
    pub fn from_laps(laps: Vec<LapTelemetry>) -> Self {
        let completed_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            total_laps: laps.len() as u32,
            best_lap: laps.iter().map(|l| l.time).reduce(f32::min),
            laps,
            completed_at,
        }
    }
}

/// Vehicle pose for the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub position: Point,
    pub heading: f32,
    pub drifting: bool,
    pub boosting: bool,
    pub off_track: bool,
}

impl VehicleSnapshot {
    pub fn new(state: &VehicleState, off_track: bool) -> Self {
        Self {
            position: state.position,
            heading: state.heading,
            drifting: state.drifting,
            boosting: state.boosting(),
            off_track,
        }
    }
}

/// HUD scalars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hud {
    /// Speed in display units
    pub speed: f32,
    /// Lap in progress, starting at 1
    pub lap: u32,
    pub current_lap_time: f32,
    pub last_lap_time: Option<f32>,
    pub best_lap_time: Option<f32>,
    /// Drift charge percentage
    pub drift_charge: f32,
    pub boost_remaining: f32,
}

/// Owned per-tick view handed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub status: RaceStatus,
    pub countdown: f32,
    pub vehicle: VehicleSnapshot,
    pub hud: Hud,
    pub sparks: Vec<Spark>,
    pub skid_marks: Vec<SkidMark>,
}
