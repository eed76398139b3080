//! Track - Closed center-line geometry and proximity queries
//!
//! A track is a cyclic polyline with a corridor width. It is built once per
//! session and only ever queried afterwards.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 2D point on the ground plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub z: f32,
}

impl Point {
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.z - other.z)
    }
}

/// Result of the per-tick closest-point query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackProbe {
    /// Index of the nearest center-line point
    pub index: usize,
    /// Distance to that point
    pub distance: f32,
    /// Outside the drivable corridor
    pub off_track: bool,
}

/// Immutable track geometry
#[derive(Debug, Clone, Serialize)]
pub struct Track {
    points: Vec<Point>,
    width: f32,
    /// Presentation label, not read by physics
    pub color: String,
    /// Presentation label, not read by physics
    pub difficulty: String,
}

impl Track {
    /// Build a track, rejecting degenerate geometry.
    pub fn new(points: Vec<Point>, width: f32) -> Result<Self, ConfigError> {
        if points.len() < 2 {
            return Err(ConfigError::TooFewPoints { got: points.len() });
        }
        if !(width.is_finite() && width > 0.0) {
            return Err(ConfigError::InvalidWidth { width });
        }

        Ok(Self {
            points,
            width,
            color: String::new(),
            difficulty: String::new(),
        })
    }

    /// Attach presentation labels
    pub fn with_labels(mut self, color: impl Into<String>, difficulty: impl Into<String>) -> Self {
        self.color = color.into();
        self.difficulty = difficulty.into();
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; construction guarantees at least two points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Point at `index`, wrapping around the loop
    pub fn point(&self, index: usize) -> Point {
        self.points[index % self.points.len()]
    }

    /// Nearest center-line point and its distance. Ties keep the first index.
    pub fn closest_point_index(&self, position: Point) -> (usize, f32) {
        let mut best = (0, f32::INFINITY);
        for (i, p) in self.points.iter().enumerate() {
            let d = p.distance(position);
            if d < best.1 {
                best = (i, d);
            }
        }
        best
    }

    pub fn is_off_track(&self, distance: f32) -> bool {
        distance > self.width / 2.0
    }

    /// Single scan shared by every consumer of a tick
    pub fn probe(&self, position: Point) -> TrackProbe {
        let (index, distance) = self.closest_point_index(position);
        TrackProbe {
            index,
            distance,
            off_track: self.is_off_track(distance),
        }
    }

    /// Heading (radians) from the first point toward the second
    pub fn start_heading(&self) -> f32 {
        let a = self.points[0];
        let b = self.points[1];
        (b.x - a.x).atan2(b.z - a.z)
    }
}
