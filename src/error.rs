//! Errors - Setup and summarizer failures
//!
//! Ticks never fail; everything that can go wrong happens either while a
//! session is being configured or while the external summarizer runs.

use thiserror::Error;

/// Rejected session setup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Track needs at least two center-line points
    #[error("track must have at least 2 points, got {got}")]
    TooFewPoints {
        /// Number of points supplied
        got: usize,
    },

    /// Track width must be a positive finite number
    #[error("track width must be positive, got {width}")]
    InvalidWidth {
        /// Width supplied
        width: f32,
    },

    /// Vehicle tuning value out of range
    #[error("invalid vehicle tuning: {field} = {value}")]
    InvalidVehicle {
        /// Offending field name
        field: &'static str,
        /// Value supplied
        value: f32,
    },

    /// Session setting out of range
    #[error("invalid session setting: {field} = {value}")]
    InvalidSession {
        /// Offending field name
        field: &'static str,
        /// Value supplied
        value: f32,
    },

    /// Catalog id lookup failed
    #[error("unknown {kind} id '{id}'")]
    UnknownId {
        /// "track" or "car"
        kind: &'static str,
        /// Requested id
        id: String,
    },

    /// Catalog or session data could not be (de)serialized
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Catalog file could not be read
    #[error("could not read catalog: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a coaching summary could not be produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SummaryError {
    /// Service unreachable or returned an error
    #[error("summarizer unavailable: {0}")]
    Unavailable(String),

    /// No answer before the deadline
    #[error("summarizer timed out after {ms}ms")]
    TimedOut {
        /// Timeout that elapsed
        ms: u64,
    },

    /// Worker thread died without answering
    #[error("summarizer worker panicked")]
    Panicked,
}
