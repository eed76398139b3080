//! Vehicle - Arcade car state and per-step physics
//!
//! Each vehicle carries its pose, speed, drift charge and boost timer.
//! Tuning constants assume a 60 Hz reference step, so every rate is scaled
//! by `dt * 60`.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::race::control::{ControlInput, Intent};
use crate::race::track::{Point, TrackProbe};

/// Static per-car tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// Speed gained per reference step while accelerating
    pub acceleration: f32,
    /// Forward speed limit (unboosted)
    pub top_speed: f32,
    /// Grip coefficient in (0, 1]
    pub handling: f32,
}

impl VehicleConfig {
    pub fn new(acceleration: f32, top_speed: f32, handling: f32) -> Result<Self, ConfigError> {
        let config = Self {
            acceleration,
            top_speed,
            handling,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.acceleration.is_finite() && self.acceleration > 0.0) {
            return Err(ConfigError::InvalidVehicle {
                field: "acceleration",
                value: self.acceleration,
            });
        }
        if !(self.top_speed.is_finite() && self.top_speed > 0.0) {
            return Err(ConfigError::InvalidVehicle {
                field: "top_speed",
                value: self.top_speed,
            });
        }
        if !(self.handling > 0.0 && self.handling <= 1.0) {
            return Err(ConfigError::InvalidVehicle {
                field: "handling",
                value: self.handling,
            });
        }
        Ok(())
    }
}

/// Complete kinematic state for one vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub position: Point,
    /// Heading in radians; 0 faces +z, positive turns toward +x
    pub heading: f32,
    /// Signed forward speed (units per reference step)
    pub speed: f32,
    /// Actual travel velocity, lags the heading while sliding
    pub velocity: Point,
    pub drifting: bool,
    /// Drift charge, 0 to 100
    pub drift_charge: f32,
    /// Remaining boost seconds
    pub boost_timer: f32,
}

impl VehicleState {
    /// Parked at `position`, facing `heading`
    pub fn new(position: Point, heading: f32) -> Self {
        Self {
            position,
            heading,
            speed: 0.0,
            velocity: Point::default(),
            drifting: false,
            drift_charge: 0.0,
            boost_timer: 0.0,
        }
    }

    pub fn boosting(&self) -> bool {
        self.boost_timer > 0.0
    }

    /// Speed in HUD units
    pub fn display_speed(&self) -> f32 {
        self.speed.abs() * Vehicle::DISPLAY_SCALE
    }

    fn forward(&self) -> Point {
        Point::new(self.heading.sin(), self.heading.cos())
    }
}

/// What happened during one physics step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepEvents {
    pub off_track: bool,
    /// Boost seconds granted by a drift release this step
    pub boost_granted: Option<f32>,
    /// Distance covered this step
    pub distance: f32,
}

/// Vehicle simulation logic
pub struct Vehicle;

impl Vehicle {
    /// Largest step accepted, guards against frame hitches
    pub const MAX_DT: f32 = 0.1;
    const REFERENCE_HZ: f32 = 60.0;

    const DRIFT_MIN_SPEED: f32 = 10.0;
    const DRIFT_CHARGE_RATE: f32 = 30.0;
    const DRIFT_CHARGE_MAX: f32 = 100.0;
    const BOOST_MIN_CHARGE: f32 = 30.0;
    const BOOST_LONG_CHARGE: f32 = 80.0;
    const BOOST_SHORT_SECS: f32 = 1.0;
    const BOOST_LONG_SECS: f32 = 2.0;

    pub const BOOST_SPEED_FACTOR: f32 = 1.5;
    const BOOST_ACCEL_FACTOR: f32 = 2.0;
    const BRAKE_FACTOR: f32 = 1.5;
    const ROLLING_DECAY: f32 = 0.98;
    const DRIFT_DECAY: f32 = 0.99;

    const TURN_BASE: f32 = 0.02;
    const TURN_SPEED_GAIN: f32 = 0.04;
    const DRIFT_TURN_FACTOR: f32 = 1.4;
    const STEER_MIN_SPEED: f32 = 0.1;
    const DRIFT_GRIP: f32 = 0.92;

    const OFF_TRACK_DRAG: f32 = 0.92;
    pub const DISPLAY_SCALE: f32 = 10.0;

    /// Advance `state` by one step.
    ///
    /// `probe` must describe the position at the start of the step; the
    /// caller computes it once and shares it with the other consumers.
    pub fn update(
        state: &mut VehicleState,
        config: &VehicleConfig,
        input: &ControlInput,
        probe: &TrackProbe,
        dt: f32,
    ) -> StepEvents {
        let dt = dt.clamp(0.0, Self::MAX_DT);
        let scale = dt * Self::REFERENCE_HZ;
        let mut events = StepEvents {
            off_track: probe.off_track,
            ..Default::default()
        };

        // Drift arbitration
        let turning = input.held(Intent::SteerLeft) || input.held(Intent::SteerRight);
        let may_drift =
            state.speed.abs() > Self::DRIFT_MIN_SPEED && (turning || state.drifting);
        if may_drift && input.held(Intent::Drift) {
            state.drifting = true;
            state.drift_charge =
                (state.drift_charge + Self::DRIFT_CHARGE_RATE * dt).min(Self::DRIFT_CHARGE_MAX);
        } else {
            if state.drifting && state.drift_charge > Self::BOOST_MIN_CHARGE {
                let secs = if state.drift_charge > Self::BOOST_LONG_CHARGE {
                    Self::BOOST_LONG_SECS
                } else {
                    Self::BOOST_SHORT_SECS
                };
                state.boost_timer = secs;
                events.boost_granted = Some(secs);
            }
            state.drifting = false;
            state.drift_charge = 0.0;
        }

        // Boost
        let mut top_speed = config.top_speed;
        let mut acceleration = config.acceleration;
        if state.boost_timer > 0.0 {
            top_speed *= Self::BOOST_SPEED_FACTOR;
            acceleration *= Self::BOOST_ACCEL_FACTOR;
            state.boost_timer = (state.boost_timer - dt).max(0.0);
        }

        // Longitudinal
        let accelerating = input.held(Intent::Accelerate);
        let braking = input.held(Intent::Brake);
        if accelerating {
            state.speed += acceleration * scale;
        }
        if braking {
            state.speed -= Self::BRAKE_FACTOR * acceleration * scale;
        }
        if !accelerating && !braking {
            state.speed *= if state.drifting {
                Self::DRIFT_DECAY
            } else {
                Self::ROLLING_DECAY
            };
        }
        state.speed = state.speed.clamp(-config.top_speed / 3.0, top_speed);

        // Steering
        if state.speed.abs() > Self::STEER_MIN_SPEED {
            let mut rate =
                (Self::TURN_SPEED_GAIN * (state.speed.abs() / top_speed) + Self::TURN_BASE) * scale;
            if state.drifting {
                rate *= Self::DRIFT_TURN_FACTOR;
            }
            if input.held(Intent::SteerLeft) {
                state.heading += rate;
            }
            if input.held(Intent::SteerRight) {
                state.heading -= rate;
            }
        }

        // Lateral grip
        let grip = if state.drifting {
            Self::DRIFT_GRIP
        } else {
            config.handling
        };
        let forward = state.forward();
        let target = Point::new(forward.x * state.speed, forward.z * state.speed);
        state.velocity = Point::new(
            state.velocity.x * (1.0 - grip) + target.x * grip,
            state.velocity.z * (1.0 - grip) + target.z * grip,
        );

        let before = state.position;
        state.position.x += state.velocity.x * scale;
        state.position.z += state.velocity.z * scale;
        events.distance = before.distance(state.position);

        if probe.off_track {
            state.drifting = false;
            state.drift_charge = 0.0;
            state.speed *= Self::OFF_TRACK_DRAG;
            state.velocity.x *= Self::OFF_TRACK_DRAG;
            state.velocity.z *= Self::OFF_TRACK_DRAG;
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn on_track() -> TrackProbe {
        TrackProbe {
            index: 0,
            distance: 0.0,
            off_track: false,
        }
    }

    fn car() -> VehicleConfig {
        VehicleConfig::new(0.5, 30.0, 0.95).unwrap()
    }

    fn input(intents: &[Intent]) -> ControlInput {
        ControlInput::from_intents(intents)
    }

    fn run(state: &mut VehicleState, config: &VehicleConfig, input: &ControlInput, ticks: usize) {
        for _ in 0..ticks {
            Vehicle::update(state, config, input, &on_track(), DT);
        }
    }

    /// Reach top speed, then hold a drift for `ticks` and release it.
    fn drift_for(ticks: usize) -> (VehicleState, Option<f32>) {
        let config = car();
        let mut state = VehicleState::new(Point::default(), 0.0);
        run(&mut state, &config, &input(&[Intent::Accelerate]), 120);

        let hold = input(&[Intent::Accelerate, Intent::SteerLeft, Intent::Drift]);
        run(&mut state, &config, &hold, ticks);
        assert!(state.drifting);

        let release = input(&[Intent::Accelerate]);
        let events = Vehicle::update(&mut state, &config, &release, &on_track(), DT);
        (state, events.boost_granted)
    }

    #[test]
    fn rejects_bad_tuning() {
        assert!(VehicleConfig::new(0.5, 30.0, 0.0).is_err());
        assert!(VehicleConfig::new(0.5, 30.0, 1.2).is_err());
        assert!(VehicleConfig::new(-1.0, 30.0, 0.9).is_err());
        assert!(VehicleConfig::new(0.5, 30.0, 1.0).is_ok());
    }

    #[test]
    fn speed_stays_within_bounds() {
        let config = car();
        let mut state = VehicleState::new(Point::default(), 0.0);
        let upper = config.top_speed * Vehicle::BOOST_SPEED_FACTOR;

        let script: [&[Intent]; 4] = [
            &[Intent::Accelerate, Intent::SteerLeft, Intent::Drift],
            &[Intent::Accelerate],
            &[Intent::Brake],
            &[Intent::Brake, Intent::SteerRight],
        ];
        for phase in script.iter().cycle().take(12) {
            let held = input(phase);
            for _ in 0..200 {
                Vehicle::update(&mut state, &config, &held, &on_track(), DT);
                assert!(state.speed <= upper + 1e-4, "speed {} too high", state.speed);
                assert!(state.speed >= -config.top_speed / 3.0 - 1e-4);
            }
        }
    }

    #[test]
    fn short_drift_grants_no_boost() {
        // 0.8s of drift: charge 24
        let (state, granted) = drift_for(48);
        assert_eq!(granted, None);
        assert_eq!(state.boost_timer, 0.0);
        assert_eq!(state.drift_charge, 0.0);
    }

    #[test]
    fn medium_drift_grants_one_second() {
        // 1.5s of drift: charge 45
        let (state, granted) = drift_for(90);
        assert_eq!(granted, Some(1.0));
        assert!(state.boosting());
        assert!(!state.drifting);
    }

    #[test]
    fn long_drift_grants_two_seconds() {
        // 3.2s of drift: charge 96
        let (_, granted) = drift_for(192);
        assert_eq!(granted, Some(2.0));
    }

    #[test]
    fn charge_caps_at_hundred() {
        let config = car();
        let mut state = VehicleState::new(Point::default(), 0.0);
        run(&mut state, &config, &input(&[Intent::Accelerate]), 120);
        let hold = input(&[Intent::Accelerate, Intent::SteerLeft, Intent::Drift]);
        run(&mut state, &config, &hold, 600);
        assert_eq!(state.drift_charge, 100.0);
    }

    #[test]
    fn drift_needs_speed() {
        let config = car();
        let mut state = VehicleState::new(Point::default(), 0.0);
        let hold = input(&[Intent::SteerLeft, Intent::Drift]);
        run(&mut state, &config, &hold, 30);
        assert!(!state.drifting);
        assert_eq!(state.drift_charge, 0.0);
    }

    #[test]
    fn reverse_is_capped_at_a_third() {
        let config = car();
        let mut state = VehicleState::new(Point::default(), 0.0);
        run(&mut state, &config, &input(&[Intent::Brake]), 300);
        assert!((state.speed + config.top_speed / 3.0).abs() < 1e-4);
    }

    #[test]
    fn coasting_decays_speed() {
        let config = car();
        let mut state = VehicleState::new(Point::default(), 0.0);
        run(&mut state, &config, &input(&[Intent::Accelerate]), 60);
        let before = state.speed;
        Vehicle::update(&mut state, &config, &ControlInput::default(), &on_track(), DT);
        assert!((state.speed - before * 0.98).abs() < 1e-4);
    }

    #[test]
    fn no_steering_when_parked() {
        let config = car();
        let mut state = VehicleState::new(Point::default(), 0.3);
        Vehicle::update(&mut state, &config, &input(&[Intent::SteerLeft]), &on_track(), DT);
        assert_eq!(state.heading, 0.3);
    }

    #[test]
    fn opposite_steering_cancels() {
        let config = car();
        let mut state = VehicleState::new(Point::default(), 0.0);
        run(&mut state, &config, &input(&[Intent::Accelerate]), 30);
        let heading = state.heading;
        let both = input(&[Intent::Accelerate, Intent::SteerLeft, Intent::SteerRight]);
        Vehicle::update(&mut state, &config, &both, &on_track(), DT);
        assert!((state.heading - heading).abs() < 1e-6);
    }

    #[test]
    fn off_track_drags_and_cancels_drift() {
        let config = car();
        let mut state = VehicleState::new(Point::default(), 0.0);
        run(&mut state, &config, &input(&[Intent::Accelerate]), 120);
        let hold = input(&[Intent::Accelerate, Intent::SteerLeft, Intent::Drift]);
        run(&mut state, &config, &hold, 30);
        assert!(state.drifting);

        let probe = TrackProbe {
            index: 0,
            distance: 1000.0,
            off_track: true,
        };
        let events = Vehicle::update(&mut state, &config, &hold, &probe, DT);
        assert!(events.off_track);
        assert!(!state.drifting);
        assert_eq!(state.drift_charge, 0.0);
        assert!(state.speed < config.top_speed * 0.93);
    }

    #[test]
    fn hitch_is_capped() {
        let config = car();
        let mut a = VehicleState::new(Point::default(), 0.0);
        let mut b = a.clone();
        let held = input(&[Intent::Accelerate]);
        Vehicle::update(&mut a, &config, &held, &on_track(), 5.0);
        Vehicle::update(&mut b, &config, &held, &on_track(), Vehicle::MAX_DT);
        assert_eq!(a, b);
    }
}
