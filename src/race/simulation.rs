//! Simulation - Session driver and fixed-step loop
//!
//! Owns every piece of mutable session state, advances it in fixed steps
//! from host frame deltas, and hands out owned snapshots.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::race::control::{Autopilot, ControlInput, ControlSource, ControlView, Difficulty, HumanControl};
use crate::race::effects::Effects;
use crate::race::progress::LapTracker;
use crate::race::session::{Hud, RaceStatus, SessionConfig, SessionStats, Snapshot, VehicleSnapshot};
use crate::race::track::{Track, TrackProbe};
use crate::race::vehicle::{Vehicle, VehicleConfig, VehicleState};
use crate::summary::{Summarizer, SummaryRequest};

/// Driver timing statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverStats {
    pub tick_rate: f32,
    pub avg_tick_time_ms: f32,
    pub steps: u64,
    pub status: RaceStatus,
}

/// Runs one single-vehicle session
pub struct SessionDriver {
    track: Track,
    car: VehicleConfig,
    config: SessionConfig,
    status: RaceStatus,
    countdown: f32,
    vehicle: VehicleState,
    probe: TrackProbe,
    tracker: LapTracker,
    effects: Effects,
    human: HumanControl,
    autopilot: Autopilot,
    /// Unsimulated frame time carried between ticks
    accumulator: f32,
    steps: u64,
    paused: bool,
    /// Host-side cost of recent ticks, for averaging
    tick_times: Vec<f32>,
    ended: Option<SessionStats>,
    summary_requested: bool,
}

impl SessionDriver {
    /// Slack so a host ticking at exactly the step rate never skips a step
    const STEP_EPSILON: f32 = 1e-6;
    const TICK_SAMPLES: usize = 60;

    /// Set up a session with the car parked on point 0, facing point 1
    pub fn new(track: Track, car: VehicleConfig, config: SessionConfig) -> Result<Self, ConfigError> {
        car.validate()?;
        config.validate()?;

        let vehicle = VehicleState::new(track.point(0), track.start_heading());
        let probe = track.probe(vehicle.position);
        let tracker = LapTracker::new(&track, config.progress);
        log::debug!(
            "Lap rules: {} sectors, start window {} points",
            tracker.checkpoints().len(),
            tracker.start_window()
        );
        let status = if config.countdown > 0.0 {
            RaceStatus::Countdown
        } else {
            RaceStatus::Racing
        };

        log::info!(
            "Session ready: {} points, width {}, autopilot {}",
            track.len(),
            track.width(),
            config.autopilot.as_str()
        );

        Ok(Self {
            effects: Effects::new(config.effects_seed),
            autopilot: Autopilot::new(config.autopilot),
            countdown: config.countdown,
            track,
            car,
            config,
            status,
            vehicle,
            probe,
            tracker,
            human: HumanControl::new(),
            accumulator: 0.0,
            steps: 0,
            paused: false,
            tick_times: Vec::with_capacity(Self::TICK_SAMPLES),
            ended: None,
            summary_requested: false,
        })
    }

    /// Latest device snapshot for the human control source
    pub fn set_input(&mut self, input: ControlInput) {
        self.human.set_held(input);
    }

    /// Input device lost focus
    pub fn release_all(&mut self) {
        self.human.release_all();
    }

    /// Advance by a host frame delta and return the resulting snapshot.
    ///
    /// The delta is capped at `Vehicle::MAX_DT` and consumed in whole fixed
    /// steps; any remainder carries into the next tick.
    pub fn tick(&mut self, dt: f32) -> Snapshot {
        if self.paused || self.ended.is_some() {
            return self.snapshot();
        }

        let tick_start = Instant::now();
        let step = self.config.step();
        self.accumulator += dt.clamp(0.0, Vehicle::MAX_DT);
        while self.accumulator + Self::STEP_EPSILON >= step {
            self.step(step);
            self.accumulator -= step;
        }
        self.accumulator = self.accumulator.max(0.0);

        let tick_time = tick_start.elapsed().as_secs_f32() * 1000.0;
        self.tick_times.push(tick_time);
        if self.tick_times.len() > Self::TICK_SAMPLES {
            self.tick_times.remove(0);
        }

        self.snapshot()
    }

    /// One fixed simulation step
    fn step(&mut self, dt: f32) {
        self.steps += 1;

        if self.status == RaceStatus::Countdown {
            self.countdown -= dt;
            if self.countdown <= 0.0 {
                self.countdown = 0.0;
                self.status = RaceStatus::Racing;
                log::info!("Race started");
            }
            return;
        }

        // One scan per step, shared by control, physics and progress
        let probe = self.track.probe(self.vehicle.position);

        let input = if self.status == RaceStatus::Racing {
            let view = ControlView {
                track: &self.track,
                probe: &probe,
                vehicle: &self.vehicle,
                config: &self.car,
            };
            let source: &mut dyn ControlSource = if self.autopilot.difficulty() == Difficulty::Off {
                &mut self.human
            } else {
                &mut self.autopilot
            };
            source.sample(&view)
        } else {
            ControlInput::default()
        };

        let events = Vehicle::update(&mut self.vehicle, &self.car, &input, &probe, dt);
        if let Some(secs) = events.boost_granted {
            log::debug!("Drift boost granted: {:.1}s", secs);
        }

        if self.status == RaceStatus::Racing {
            if let Some(lap) = self.tracker.update(&probe, &self.vehicle, &events, dt) {
                log::info!(
                    "Lap {} complete in {:.2}s{}",
                    lap.telemetry.lap_number,
                    lap.telemetry.time,
                    if lap.best { " (best)" } else { "" }
                );
                if self
                    .config
                    .target_laps
                    .is_some_and(|target| self.tracker.lap_count() >= target)
                {
                    self.status = RaceStatus::Finished;
                    log::info!("Race finished after {} laps", self.tracker.lap_count());
                }
            }
        }

        self.effects.update(&self.vehicle, dt);
        self.probe = probe;
    }

    /// Current state without advancing
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status,
            countdown: self.countdown,
            vehicle: VehicleSnapshot::new(&self.vehicle, self.probe.off_track),
            hud: Hud {
                speed: self.vehicle.display_speed(),
                lap: self.tracker.lap_count() + 1,
                current_lap_time: self.tracker.current_lap_time(),
                last_lap_time: self.tracker.last_lap_time(),
                best_lap_time: self.tracker.best_lap(),
                drift_charge: self.vehicle.drift_charge,
                boost_remaining: self.vehicle.boost_timer,
            },
            sparks: self.effects.sparks().to_vec(),
            skid_marks: self.effects.skid_marks().to_vec(),
        }
    }

    /// Close the session and return its stats.
    ///
    /// Safe to call at any time; a lap in progress is not included. Later
    /// calls return the same record.
    pub fn end_session(&mut self) -> SessionStats {
        if let Some(stats) = &self.ended {
            return stats.clone();
        }

        let stats = SessionStats::from_laps(self.tracker.laps().to_vec());
        self.status = RaceStatus::Finished;
        log::info!(
            "Session ended: {} laps, best {:?}",
            stats.total_laps,
            stats.best_lap
        );
        self.ended = Some(stats.clone());
        stats
    }

    /// Stats of an ended session
    pub fn session_stats(&self) -> Option<&SessionStats> {
        self.ended.as_ref()
    }

    /// Ends the session if needed and starts the summarizer.
    ///
    /// Returns `None` when a summary was already requested for this session.
    pub fn request_summary(
        &mut self,
        summarizer: Arc<dyn Summarizer>,
        timeout: Duration,
    ) -> Option<SummaryRequest> {
        let stats = self.end_session();
        if self.summary_requested {
            return None;
        }
        self.summary_requested = true;
        Some(SummaryRequest::spawn(summarizer, stats, timeout))
    }

    /// Throw away all progress and start over with the same setup
    pub fn reset(&mut self) {
        self.vehicle = VehicleState::new(self.track.point(0), self.track.start_heading());
        self.probe = self.track.probe(self.vehicle.position);
        self.tracker = LapTracker::new(&self.track, self.config.progress);
        self.effects = Effects::new(self.config.effects_seed);
        self.autopilot = Autopilot::new(self.config.autopilot);
        self.human.release_all();
        self.countdown = self.config.countdown;
        self.status = if self.countdown > 0.0 {
            RaceStatus::Countdown
        } else {
            RaceStatus::Racing
        };
        self.accumulator = 0.0;
        self.steps = 0;
        self.paused = false;
        self.tick_times.clear();
        self.ended = None;
        self.summary_requested = false;
        log::info!("Session reset");
    }

    /// Freeze ticks
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn status(&self) -> RaceStatus {
        self.status
    }

    pub fn vehicle(&self) -> &VehicleState {
        &self.vehicle
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn tracker(&self) -> &LapTracker {
        &self.tracker
    }

    /// Heading error seen by the autopilot on the last step
    pub fn autopilot_error(&self) -> f32 {
        self.autopilot.last_heading_error()
    }

    pub fn stats(&self) -> DriverStats {
        let avg_tick_time = if self.tick_times.is_empty() {
            0.0
        } else {
            self.tick_times.iter().sum::<f32>() / self.tick_times.len() as f32
        };

        DriverStats {
            tick_rate: self.config.tick_rate,
            avg_tick_time_ms: avg_tick_time,
            steps: self.steps,
            status: self.status,
        }
    }
}
