//! Progress - Checkpoints, lap detection and telemetry
//!
//! The track is split into equal index sectors. A lap only counts once the
//! back half of the circuit has been visited and the vehicle is back inside
//! the start window.

use serde::{Deserialize, Serialize};

use crate::race::track::{Track, TrackProbe};
use crate::race::vehicle::{StepEvents, Vehicle, VehicleState};

/// Tunable lap validation rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRules {
    /// Number of equal sectors the track is split into
    pub checkpoints: usize,
    /// Points after the start index that count as "back at the line"
    pub start_window: usize,
}

impl Default for ProgressRules {
    fn default() -> Self {
        Self {
            checkpoints: 4,
            start_window: 10,
        }
    }
}

/// One completed lap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapTelemetry {
    pub lap_number: u32,
    /// Lap time in seconds
    pub time: f32,
    /// Display units
    pub max_speed: f32,
    /// Display units, distance over time
    pub average_speed: f32,
    /// Approximate seconds spent off track
    pub off_track_count: u32,
    pub collisions: u32,
}

/// Lap completion notice returned from `LapTracker::update`
#[derive(Debug, Clone, PartialEq)]
pub struct LapEvent {
    pub telemetry: LapTelemetry,
    pub best: bool,
}

/// Per-lap accumulators, cleared whenever a lap completes
#[derive(Debug, Clone, Default)]
struct LapAccumulator {
    elapsed: f32,
    distance: f32,
    max_speed: f32,
    off_track_frames: u32,
    collision_frames: u32,
}

/// Tracks sector visits and builds the telemetry log
#[derive(Debug, Clone)]
pub struct LapTracker {
    track_len: usize,
    start_window: usize,
    checkpoints: Vec<bool>,
    current: LapAccumulator,
    laps: Vec<LapTelemetry>,
}

impl LapTracker {
    const OFF_TRACK_FRAMES_PER_COUNT: u32 = 60;
    const COLLISION_FRAMES_PER_COUNT: u32 = 10;
    const REFERENCE_HZ: f32 = 60.0;

    pub fn new(track: &Track, rules: ProgressRules) -> Self {
        let track_len = track.len();
        let sectors = rules.checkpoints.clamp(2, track_len);
        // First index of the back half
        let back_half = (sectors / 2 * track_len).div_ceil(sectors);
        Self {
            track_len,
            // A window reaching into the back half would close laps there
            start_window: rules.start_window.clamp(1, back_half),
            checkpoints: vec![false; sectors],
            current: LapAccumulator::default(),
            laps: Vec::new(),
        }
    }

    /// Sector containing the given center-line index
    pub fn sector_of(&self, index: usize) -> usize {
        let sectors = self.checkpoints.len();
        (index * sectors / self.track_len).min(sectors - 1)
    }

    /// Points from the start that count as back at the line
    pub fn start_window(&self) -> usize {
        self.start_window
    }

    pub fn checkpoints(&self) -> &[bool] {
        &self.checkpoints
    }

    /// Sectors that must be visited before the lap can close
    fn back_half_done(&self) -> bool {
        let n = self.checkpoints.len();
        self.checkpoints[n / 2..].iter().all(|&c| c)
    }

    /// Feed one physics step. Returns the lap that just closed, if any.
    pub fn update(
        &mut self,
        probe: &TrackProbe,
        vehicle: &VehicleState,
        events: &StepEvents,
        dt: f32,
    ) -> Option<LapEvent> {
        self.current.elapsed += dt;
        self.current.distance += events.distance;
        self.current.max_speed = self.current.max_speed.max(vehicle.display_speed());
        if events.off_track {
            self.current.off_track_frames += 1;
        }

        let sector = self.sector_of(probe.index);
        self.checkpoints[sector] = true;

        if probe.index < self.start_window && self.back_half_done() {
            return Some(self.complete_lap());
        }
        None
    }

    fn complete_lap(&mut self) -> LapEvent {
        let lap = std::mem::take(&mut self.current);
        let average_speed = if lap.elapsed > 0.0 {
            lap.distance / (lap.elapsed * Self::REFERENCE_HZ) * Vehicle::DISPLAY_SCALE
        } else {
            0.0
        };

        let telemetry = LapTelemetry {
            lap_number: self.laps.len() as u32 + 1,
            time: lap.elapsed,
            max_speed: lap.max_speed,
            average_speed,
            off_track_count: lap.off_track_frames / Self::OFF_TRACK_FRAMES_PER_COUNT,
            collisions: lap.collision_frames / Self::COLLISION_FRAMES_PER_COUNT,
        };
        let best = self.best_lap().map_or(true, |b| telemetry.time < b);

        self.checkpoints.iter_mut().for_each(|c| *c = false);
        self.laps.push(telemetry.clone());

        LapEvent { telemetry, best }
    }

    pub fn laps(&self) -> &[LapTelemetry] {
        &self.laps
    }

    pub fn lap_count(&self) -> u32 {
        self.laps.len() as u32
    }

    /// Seconds into the current lap
    pub fn current_lap_time(&self) -> f32 {
        self.current.elapsed
    }

    pub fn last_lap_time(&self) -> Option<f32> {
        self.laps.last().map(|l| l.time)
    }

    /// Minimum recorded lap time
    pub fn best_lap(&self) -> Option<f32> {
        self.laps.iter().map(|l| l.time).reduce(f32::min)
    }

    /// Off-track frames accumulated on the lap in progress
    pub fn off_track_frames(&self) -> u32 {
        self.current.off_track_frames
    }
}
