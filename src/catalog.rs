//! Catalog - Static track and car records
//!
//! Records are loaded once before a session and never change afterwards.
//! A small built-in catalog ships with the crate.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::race::track::{Point, Track};
use crate::race::vehicle::VehicleConfig;

const BUILTIN: &str = include_str!("../assets/catalog.json");

/// Track record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackDef {
    pub id: String,
    pub name: String,
    pub points: Vec<Point>,
    pub width: f32,
    pub color: String,
    pub difficulty: String,
}

impl TrackDef {
    pub fn build(&self) -> Result<Track, ConfigError> {
        Ok(Track::new(self.points.clone(), self.width)?
            .with_labels(self.color.clone(), self.difficulty.clone()))
    }
}

/// Car record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarDef {
    pub id: String,
    pub name: String,
    pub color: String,
    pub acceleration: f32,
    pub top_speed: f32,
    pub handling: f32,
}

impl CarDef {
    pub fn config(&self) -> Result<VehicleConfig, ConfigError> {
        VehicleConfig::new(self.acceleration, self.top_speed, self.handling)
    }
}

/// All known tracks and cars
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub tracks: Vec<TrackDef>,
    pub cars: Vec<CarDef>,
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Catalog embedded in the crate
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN)
    }

    pub fn track(&self, id: &str) -> Result<&TrackDef, ConfigError> {
        self.tracks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| ConfigError::UnknownId {
                kind: "track",
                id: id.to_string(),
            })
    }

    pub fn car(&self, id: &str) -> Result<&CarDef, ConfigError> {
        self.cars
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ConfigError::UnknownId {
                kind: "car",
                id: id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_records_are_valid() {
        let catalog = Catalog::builtin().unwrap();
        assert!(!catalog.tracks.is_empty());
        assert!(!catalog.cars.is_empty());
        for track in &catalog.tracks {
            track.build().unwrap();
        }
        for car in &catalog.cars {
            car.config().unwrap();
        }
    }

    #[test]
    fn unknown_ids_are_errors() {
        let catalog = Catalog::builtin().unwrap();
        assert!(matches!(
            catalog.track("moon-base"),
            Err(ConfigError::UnknownId { kind: "track", .. })
        ));
        assert!(catalog.car("hovercraft").is_err());
    }

    #[test]
    fn degenerate_track_rejected_on_build() {
        let json = r##"{
            "tracks": [{ "id": "dot", "name": "Dot", "points": [{ "x": 0, "z": 0 }],
                         "width": 10, "color": "#fff", "difficulty": "easy" }],
            "cars": [{ "id": "kart", "name": "Kart", "color": "#f00",
                       "acceleration": 0.4, "topSpeed": 20, "handling": 0.9 }]
        }"##;
        let catalog = Catalog::from_json(json).unwrap();
        assert!(matches!(
            catalog.track("dot").unwrap().build(),
            Err(ConfigError::TooFewPoints { got: 1 })
        ));
        assert_eq!(catalog.car("kart").unwrap().top_speed, 20.0);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(Catalog::from_json("{ nope"), Err(ConfigError::Json(_))));
    }
}
