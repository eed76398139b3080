//! Effects - Cosmetic skid marks and drift sparks
//!
//! Nothing here is read back by physics or telemetry. The RNG is seeded so a
//! replayed session produces the same marks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::race::track::Point;
use crate::race::vehicle::VehicleState;

/// Spark color tier, from drift charge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SparkTint {
    Neutral,
    Yellow,
    Red,
}

impl SparkTint {
    pub fn from_charge(charge: f32) -> Self {
        if charge >= 80.0 {
            SparkTint::Red
        } else if charge >= 30.0 {
            SparkTint::Yellow
        } else {
            SparkTint::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spark {
    pub position: Point,
    pub velocity: Point,
    /// Remaining seconds
    pub life: f32,
    pub tint: SparkTint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkidMark {
    pub position: Point,
    pub heading: f32,
    pub opacity: f32,
}

/// Live effect lists for one vehicle
#[derive(Debug, Clone)]
pub struct Effects {
    sparks: Vec<Spark>,
    skid_marks: Vec<SkidMark>,
    rng: StdRng,
}

impl Effects {
    const MIN_SPEED: f32 = 15.0;
    const SKID_CHANCE: f64 = 0.5;
    const SKID_FADE_RATE: f32 = 0.5;
    const SPARKS_PER_STEP: usize = 2;
    const SPARK_LIFE: f32 = 0.4;
    const SPARK_SPEED: f32 = 120.0;
    const SPARK_SPREAD: f32 = 0.6;
    const MAX_SPARKS: usize = 256;
    const MAX_SKID_MARKS: usize = 512;

    pub fn new(seed: u64) -> Self {
        Self {
            sparks: Vec::with_capacity(64),
            skid_marks: Vec::with_capacity(128),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn sparks(&self) -> &[Spark] {
        &self.sparks
    }

    pub fn skid_marks(&self) -> &[SkidMark] {
        &self.skid_marks
    }

    /// Age existing effects and emit new ones for the vehicle's current pose
    pub fn update(&mut self, vehicle: &VehicleState, dt: f32) {
        for spark in &mut self.sparks {
            spark.life -= dt;
            spark.position.x += spark.velocity.x * dt;
            spark.position.z += spark.velocity.z * dt;
        }
        self.sparks.retain(|s| s.life > 0.0);

        for mark in &mut self.skid_marks {
            mark.opacity -= Self::SKID_FADE_RATE * dt;
        }
        self.skid_marks.retain(|m| m.opacity > 0.0);

        if !vehicle.drifting || vehicle.speed.abs() <= Self::MIN_SPEED {
            return;
        }

        if self.rng.gen_bool(Self::SKID_CHANCE) {
            self.skid_marks.push(SkidMark {
                position: vehicle.position,
                heading: vehicle.heading,
                opacity: 1.0,
            });
        }

        let tint = SparkTint::from_charge(vehicle.drift_charge);
        for _ in 0..Self::SPARKS_PER_STEP {
            // Thrown out behind the car with a little scatter
            let angle = vehicle.heading + std::f32::consts::PI
                + self.rng.gen_range(-Self::SPARK_SPREAD..Self::SPARK_SPREAD);
            self.sparks.push(Spark {
                position: vehicle.position,
                velocity: Point::new(angle.sin() * Self::SPARK_SPEED, angle.cos() * Self::SPARK_SPEED),
                life: Self::SPARK_LIFE,
                tint,
            });
        }

        trim_front(&mut self.sparks, Self::MAX_SPARKS);
        trim_front(&mut self.skid_marks, Self::MAX_SKID_MARKS);
    }
}

/// Drop the oldest entries beyond `max`
fn trim_front<T>(items: &mut Vec<T>, max: usize) {
    if items.len() > max {
        let excess = items.len() - max;
        items.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn drifting(charge: f32) -> VehicleState {
        let mut v = VehicleState::new(Point::new(10.0, 20.0), 0.0);
        v.speed = 25.0;
        v.drifting = true;
        v.drift_charge = charge;
        v
    }

    #[test]
    fn tint_tiers() {
        assert_eq!(SparkTint::from_charge(10.0), SparkTint::Neutral);
        assert_eq!(SparkTint::from_charge(30.0), SparkTint::Yellow);
        assert_eq!(SparkTint::from_charge(79.9), SparkTint::Yellow);
        assert_eq!(SparkTint::from_charge(80.0), SparkTint::Red);
    }

    #[test]
    fn drifting_emits_two_sparks_behind() {
        let mut fx = Effects::new(7);
        fx.update(&drifting(90.0), DT);
        assert_eq!(fx.sparks().len(), 2);
        for spark in fx.sparks() {
            assert_eq!(spark.tint, SparkTint::Red);
            // Heading faces +z, so sparks travel toward -z
            assert!(spark.velocity.z < 0.0);
        }
    }

    #[test]
    fn skid_marks_roughly_half_the_steps() {
        let mut fx = Effects::new(42);
        let vehicle = drifting(40.0);
        for _ in 0..100 {
            fx.update(&vehicle, 0.0);
        }
        let marks = fx.skid_marks().len();
        assert!((25..=75).contains(&marks), "{marks} marks");
    }

    #[test]
    fn slow_or_gripping_emits_nothing() {
        let mut fx = Effects::new(1);
        let mut slow = drifting(50.0);
        slow.speed = 15.0;
        fx.update(&slow, DT);

        let mut gripping = drifting(50.0);
        gripping.drifting = false;
        fx.update(&gripping, DT);

        assert!(fx.sparks().is_empty());
        assert!(fx.skid_marks().is_empty());
    }

    #[test]
    fn effects_expire() {
        let mut fx = Effects::new(3);
        for _ in 0..20 {
            fx.update(&drifting(50.0), DT);
        }
        assert!(!fx.sparks().is_empty());

        let idle = VehicleState::new(Point::default(), 0.0);
        // Sparks live 0.4s
        for _ in 0..30 {
            fx.update(&idle, DT);
        }
        assert!(fx.sparks().is_empty());
        // Skid marks fade over 2s
        for _ in 0..100 {
            fx.update(&idle, DT);
        }
        assert!(fx.skid_marks().is_empty());
    }

    #[test]
    fn lists_are_capped() {
        let mut fx = Effects::new(9);
        for _ in 0..1000 {
            fx.update(&drifting(50.0), 0.0);
        }
        assert!(fx.sparks().len() <= Effects::MAX_SPARKS);
        assert!(fx.skid_marks().len() <= Effects::MAX_SKID_MARKS);
    }
}
