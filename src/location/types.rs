//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which feed produced a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixSource {
    Real,
    Simulated,
}

impl fmt::Display for FixSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real => write!(f, "real"),
            Self::Simulated => write!(f, "simulated"),
        }
    }
}

/// One raw emission from the real device feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawFix {
    pub lat: f64,
    pub lng: f64,
    pub accuracy: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
}

impl RawFix {
    pub fn at(lat: f64, lng: f64) -> Self {
        Self { lat, lng, accuracy: None, speed: None, heading: None }
    }
}

/// One audited location sample. Append-only; the log keeps the most
/// recent 50.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSample {
    /// Monotonic per-session sequence number (1-based).
    pub seq: u64,
    pub lat: f64,
    pub lng: f64,
    pub accuracy: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub timestamp_ms: i64,
    pub iso: String,
    pub source: FixSource,
}

/// Arbitration states for the real-vs-simulated source machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackerState {
    /// No consent and no feed.
    Disabled,
    /// The simulated feed is selected (no consent needed).
    SimulatedActive,
    /// Consent granted, real watch running, no fix received yet.
    RealPending,
    /// Consent granted and at least one real fix received.
    RealActive,
}

impl fmt::Display for TrackerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "Disabled"),
            Self::SimulatedActive => write!(f, "SimulatedActive"),
            Self::RealPending => write!(f, "RealPending"),
            Self::RealActive => write!(f, "RealActive"),
        }
    }
}

/// Location subsystem errors.
#[derive(Debug)]
pub enum TrackerError {
    /// The device has no usable location capability.
    CapabilityUnavailable,
    /// A named simulated series does not exist.
    UnknownSeries(String),
    /// Series file could not be read or parsed.
    SeriesFile(String),
    /// Sample export failed.
    Export(String),
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapabilityUnavailable => {
                write!(f, "Location capability unavailable on this device")
            }
            Self::UnknownSeries(id) => write!(f, "Unknown simulated series: '{}'", id),
            Self::SeriesFile(msg) => write!(f, "Series file error: {}", msg),
            Self::Export(msg) => write!(f, "Sample export error: {}", msg),
        }
    }
}

impl std::error::Error for TrackerError {}
