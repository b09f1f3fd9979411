//! Location subsystem: feeds, arbitration, and the bounded sample log.
//!
//! An explicitly constructed [`LocationArbiter`] owns the real-vs-simulated
//! state machine; feeds are injected dependencies, never ambient state.

pub mod arbiter;
pub mod feeds;
pub mod samples;
pub mod types;

pub use arbiter::{LocationArbiter, OriginResolution, ORIGIN_RADIUS_M, REFERENCE_POINT};
pub use feeds::{
    builtin_series, find_series, load_series_file, NamedSeries, RealLocationFeed,
    ScriptedRealFeed, SimulatedFeed, UnavailableRealFeed, MIN_INTERVAL_MS,
};
pub use samples::{default_export_path, SampleLog, SAMPLE_LOG_CAP};
pub use types::{FixSource, LocationSample, RawFix, TrackerError, TrackerState};
