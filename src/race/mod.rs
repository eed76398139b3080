//! Race Module
//!
//! Single-vehicle driving simulation: track geometry, arcade physics,
//! control sources, lap timing and cosmetic effects, tied together by the
//! session driver.

pub mod control;
pub mod effects;
pub mod progress;
pub mod session;
pub mod simulation;
pub mod track;
pub mod vehicle;

pub use control::{Autopilot, ControlInput, ControlSource, Difficulty, HumanControl, Intent};
pub use progress::{LapTelemetry, LapTracker, ProgressRules};
pub use session::{RaceStatus, SessionConfig, SessionStats, Snapshot};
pub use simulation::{DriverStats, SessionDriver};
pub use track::{Point, Track, TrackProbe};
pub use vehicle::{Vehicle, VehicleConfig, VehicleState};
