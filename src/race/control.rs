//! Control - Human and autopilot control sources
//!
//! Both sources produce the same `ControlInput` shape once per tick. The
//! autopilot steers toward a look-ahead point on the center line.

use std::f32::consts::PI;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::race::track::{Track, TrackProbe};
use crate::race::vehicle::{VehicleConfig, VehicleState};

/// A single held intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    Accelerate,
    Brake,
    SteerLeft,
    SteerRight,
    Drift,
}

impl Intent {
    pub const ALL: [Intent; 5] = [
        Intent::Accelerate,
        Intent::Brake,
        Intent::SteerLeft,
        Intent::SteerRight,
        Intent::Drift,
    ];

    const fn slot(self) -> usize {
        match self {
            Intent::Accelerate => 0,
            Intent::Brake => 1,
            Intent::SteerLeft => 2,
            Intent::SteerRight => 3,
            Intent::Drift => 4,
        }
    }
}

/// Intents held during one tick, indexed by `Intent`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlInput {
    held: [bool; 5],
}

impl ControlInput {
    pub fn from_intents(intents: &[Intent]) -> Self {
        let mut input = Self::default();
        for &intent in intents {
            input.set(intent, true);
        }
        input
    }

    pub fn held(&self, intent: Intent) -> bool {
        self.held[intent.slot()]
    }

    pub fn set(&mut self, intent: Intent, held: bool) {
        self.held[intent.slot()] = held;
    }

    pub fn is_idle(&self) -> bool {
        !self.held.iter().any(|&h| h)
    }
}

impl Index<Intent> for ControlInput {
    type Output = bool;

    fn index(&self, intent: Intent) -> &bool {
        &self.held[intent.slot()]
    }
}

/// Everything a control source may look at when deciding
pub struct ControlView<'a> {
    pub track: &'a Track,
    pub probe: &'a TrackProbe,
    pub vehicle: &'a VehicleState,
    pub config: &'a VehicleConfig,
}

/// Produces one `ControlInput` per tick
pub trait ControlSource {
    fn sample(&mut self, view: &ControlView<'_>) -> ControlInput;
}

/// Keyboard/gamepad passthrough
#[derive(Debug, Clone, Default)]
pub struct HumanControl {
    current: ControlInput,
}

impl HumanControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held intents with the latest device snapshot
    pub fn set_held(&mut self, input: ControlInput) {
        self.current = input;
    }

    /// Device lost focus: nothing is held any more
    pub fn release_all(&mut self) {
        self.current = ControlInput::default();
    }
}

impl ControlSource for HumanControl {
    fn sample(&mut self, _view: &ControlView<'_>) -> ControlInput {
        self.current
    }
}

/// Autopilot strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// No autopilot; the human drives. Not offered on the command line.
    #[default]
    #[value(skip)]
    Off,
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Off => "off",
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// Pure-pursuit style driver following the center line
#[derive(Debug, Clone)]
pub struct Autopilot {
    difficulty: Difficulty,
    last_error: f32,
}

impl Autopilot {
    const LOOK_AHEAD: usize = 15;
    const LOOK_AHEAD_HARD: usize = 35;
    const DEADBAND: f32 = 0.05;
    const ERROR_SPEED_PENALTY: f32 = 5.0;
    const SPEED_FACTOR: f32 = 0.8;
    const SPEED_FACTOR_HARD: f32 = 1.05;
    const DRIFT_ERROR: f32 = 0.5;
    const DRIFT_SPEED: f32 = 20.0;

    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            last_error: 0.0,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Heading error computed on the most recent sample
    pub fn last_heading_error(&self) -> f32 {
        self.last_error
    }

    fn hard(&self) -> bool {
        self.difficulty == Difficulty::Hard
    }
}

impl ControlSource for Autopilot {
    fn sample(&mut self, view: &ControlView<'_>) -> ControlInput {
        let mut input = ControlInput::default();
        if self.difficulty == Difficulty::Off {
            return input;
        }

        let look_ahead = if self.hard() {
            Self::LOOK_AHEAD_HARD
        } else {
            Self::LOOK_AHEAD
        };
        let target = view.track.point(view.probe.index + look_ahead);
        let pos = view.vehicle.position;
        let bearing = (target.x - pos.x).atan2(target.z - pos.z);
        let error = wrap_angle(bearing - view.vehicle.heading);
        self.last_error = error;

        if error > Self::DEADBAND {
            input.set(Intent::SteerLeft, true);
        } else if error < -Self::DEADBAND {
            input.set(Intent::SteerRight, true);
        }

        let factor = if self.hard() {
            Self::SPEED_FACTOR_HARD
        } else {
            Self::SPEED_FACTOR
        };
        let desired = view.config.top_speed * factor / (1.0 + Self::ERROR_SPEED_PENALTY * error.abs());
        if view.vehicle.speed < desired {
            input.set(Intent::Accelerate, true);
        } else {
            input.set(Intent::Brake, true);
        }

        if self.hard() && error.abs() > Self::DRIFT_ERROR && view.vehicle.speed > Self::DRIFT_SPEED {
            input.set(Intent::Drift, true);
        }

        input
    }
}

/// Normalize an angle into (-PI, PI]
pub fn wrap_angle(angle: f32) -> f32 {
    let mut a = angle % (2.0 * PI);
    if a <= -PI {
        a += 2.0 * PI;
    } else if a > PI {
        a -= 2.0 * PI;
    }
    a
}
