//! Location feeds: the deterministic simulated feed and the real device
//! feed seam.
//!
//! The simulated feed replays a named series of points on a fixed
//! emission interval and needs no consent. The real feed is an external
//! capability behind the [`RealLocationFeed`] trait: an explicit
//! subscription object with start/stop, polled from the owner's event
//! loop.

use super::types::{RawFix, TrackerError};
use crate::geo::Coordinates;
use serde::Deserialize;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

/// Minimum simulated emission interval.
pub const MIN_INTERVAL_MS: u64 = 250;

// ─── Named series ───────────────────────────────────────────────

struct BuiltinSeries {
    id: &'static str,
    points: &'static [(f64, f64)],
}

// Built-in series are laid out around the facility entrance at
// 15.494177, 120.554702.
const BUILTIN_SERIES: &[BuiltinSeries] = &[
    BuiltinSeries {
        id: "entrance-walk",
        points: &[
            (15.494177, 120.554702),
            (15.494360, 120.554900),
            (15.494545, 120.555110),
            (15.494730, 120.555320),
            (15.494910, 120.555540),
            (15.495100, 120.555760),
        ],
    },
    BuiltinSeries {
        id: "town-approach",
        points: &[
            (15.520000, 120.580000),
            (15.514000, 120.574000),
            (15.508000, 120.568000),
            (15.502000, 120.562000),
            (15.497000, 120.557500),
            (15.494177, 120.554702),
        ],
    },
    BuiltinSeries {
        id: "far-north",
        points: &[
            (15.720000, 120.554702),
            (15.721000, 120.555000),
            (15.722000, 120.555300),
        ],
    },
];

/// A named, replayable sequence of points.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedSeries {
    pub id: String,
    pub points: Vec<Coordinates>,
}

#[derive(Deserialize)]
struct SeriesFile {
    series: Vec<NamedSeries>,
}

/// The built-in series set.
pub fn builtin_series() -> Vec<NamedSeries> {
    BUILTIN_SERIES
        .iter()
        .map(|s| NamedSeries {
            id: s.id.to_string(),
            points: s.points.iter().map(|&(lat, lng)| Coordinates::new(lat, lng)).collect(),
        })
        .collect()
}

/// Load additional series from a JSON file of the shape
/// `{"series":[{"id":"...","points":[{"lat":..,"lng":..},...]}]}`.
pub fn load_series_file(path: &Path) -> Result<Vec<NamedSeries>, TrackerError> {
    let data = fs::read_to_string(path)
        .map_err(|e| TrackerError::SeriesFile(format!("{}: {}", path.display(), e)))?;
    let file: SeriesFile =
        serde_json::from_str(&data).map_err(|e| TrackerError::SeriesFile(e.to_string()))?;
    Ok(file.series)
}

/// Find a series by id in the built-in set plus any extras.
pub fn find_series(id: &str, extra: &[NamedSeries]) -> Result<NamedSeries, TrackerError> {
    extra
        .iter()
        .cloned()
        .chain(builtin_series())
        .find(|s| s.id == id)
        .ok_or_else(|| TrackerError::UnknownSeries(id.to_string()))
}

// ─── Simulated feed ─────────────────────────────────────────────

/// Deterministic location feed replaying a named series. The sequence
/// cycles; re-selecting a series restarts it from the first point.
#[derive(Debug)]
pub struct SimulatedFeed {
    series_id: String,
    points: Vec<Coordinates>,
    next_idx: usize,
    interval_ms: u64,
    last_emit_ms: Option<i64>,
}

impl SimulatedFeed {
    pub fn new(series: NamedSeries, interval_ms: u64) -> Self {
        Self {
            series_id: series.id,
            points: series.points,
            next_idx: 0,
            interval_ms: interval_ms.max(MIN_INTERVAL_MS),
            last_emit_ms: None,
        }
    }

    pub fn series_id(&self) -> &str {
        &self.series_id
    }

    /// Replace the active series and restart from its first point.
    pub fn select_series(&mut self, series: NamedSeries) {
        self.series_id = series.id;
        self.points = series.points;
        self.next_idx = 0;
        self.last_emit_ms = None;
    }

    /// Change the emission interval (clamped to the minimum).
    pub fn set_interval_ms(&mut self, interval_ms: u64) {
        self.interval_ms = interval_ms.max(MIN_INTERVAL_MS);
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Emit the next point if the interval has elapsed. The first call
    /// after (re)selection emits immediately.
    pub fn tick(&mut self, now_ms: i64) -> Option<Coordinates> {
        if self.points.is_empty() {
            return None;
        }
        let due = match self.last_emit_ms {
            None => true,
            Some(last) => now_ms - last >= self.interval_ms as i64,
        };
        if !due {
            return None;
        }
        let point = self.points[self.next_idx % self.points.len()];
        self.next_idx = (self.next_idx + 1) % self.points.len();
        self.last_emit_ms = Some(now_ms);
        Some(point)
    }
}

// ─── Real feed seam ─────────────────────────────────────────────

/// One polled event from the real feed.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    Fix(RawFix),
    /// A transient failure; the watch stays alive.
    Fault(String),
}

/// The device location capability: an explicit subscription with
/// start/stop. `start` performs the capability check and begins the
/// watch (one-shot fix plus continuous updates); after `stop`, `poll`
/// must never yield another event.
pub trait RealLocationFeed: Send {
    fn start(&mut self) -> Result<(), TrackerError>;
    fn stop(&mut self);
    fn poll(&mut self) -> Option<FeedEvent>;
}

/// A device without location capability. `start` always fails.
#[derive(Debug, Default)]
pub struct UnavailableRealFeed;

impl RealLocationFeed for UnavailableRealFeed {
    fn start(&mut self) -> Result<(), TrackerError> {
        Err(TrackerError::CapabilityUnavailable)
    }

    fn stop(&mut self) {}

    fn poll(&mut self) -> Option<FeedEvent> {
        None
    }
}

/// A scripted real feed for tests and demos: hands out queued events
/// while the watch is running.
#[derive(Debug, Default)]
pub struct ScriptedRealFeed {
    queue: VecDeque<FeedEvent>,
    running: bool,
}

impl ScriptedRealFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_fix(&mut self, fix: RawFix) {
        self.queue.push_back(FeedEvent::Fix(fix));
    }

    pub fn push_fault(&mut self, msg: impl Into<String>) {
        self.queue.push_back(FeedEvent::Fault(msg.into()));
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl RealLocationFeed for ScriptedRealFeed {
    fn start(&mut self) -> Result<(), TrackerError> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        // Synchronous cancellation: queued events die with the watch.
        self.running = false;
        self.queue.clear();
    }

    fn poll(&mut self) -> Option<FeedEvent> {
        if !self.running {
            return None;
        }
        self.queue.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_series_present() {
        let all = builtin_series();
        assert!(all.iter().any(|s| s.id == "entrance-walk"));
        assert!(all.iter().all(|s| !s.points.is_empty()));
    }

    #[test]
    fn test_find_series_prefers_extra() {
        let extra = vec![NamedSeries {
            id: "entrance-walk".to_string(),
            points: vec![Coordinates::new(1.0, 2.0)],
        }];
        let found = find_series("entrance-walk", &extra).unwrap();
        assert_eq!(found.points.len(), 1);
    }

    #[test]
    fn test_find_series_unknown() {
        assert!(matches!(
            find_series("nope", &[]),
            Err(TrackerError::UnknownSeries(_))
        ));
    }

    #[test]
    fn test_series_file_loading() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("series.json");
        fs::write(
            &path,
            r#"{"series":[{"id":"custom","points":[{"lat":15.5,"lng":120.5}]}]}"#,
        )
        .unwrap();
        let series = load_series_file(&path).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].id, "custom");
    }

    #[test]
    fn test_interval_clamped() {
        let feed = SimulatedFeed::new(builtin_series().remove(0), 50);
        assert_eq!(feed.interval_ms(), MIN_INTERVAL_MS);
    }

    #[test]
    fn test_tick_respects_interval() {
        let mut feed = SimulatedFeed::new(builtin_series().remove(0), 1000);
        assert!(feed.tick(0).is_some()); // first emission is immediate
        assert!(feed.tick(500).is_none());
        assert!(feed.tick(1000).is_some());
    }

    #[test]
    fn test_series_cycles() {
        let series = NamedSeries {
            id: "two".to_string(),
            points: vec![Coordinates::new(1.0, 1.0), Coordinates::new(2.0, 2.0)],
        };
        let mut feed = SimulatedFeed::new(series, 250);
        let a = feed.tick(0).unwrap();
        let b = feed.tick(250).unwrap();
        let c = feed.tick(500).unwrap();
        assert_eq!(a.lat, 1.0);
        assert_eq!(b.lat, 2.0);
        assert_eq!(c.lat, 1.0);
    }

    #[test]
    fn test_reselect_restarts() {
        let series = NamedSeries {
            id: "two".to_string(),
            points: vec![Coordinates::new(1.0, 1.0), Coordinates::new(2.0, 2.0)],
        };
        let mut feed = SimulatedFeed::new(series.clone(), 250);
        feed.tick(0);
        feed.select_series(series);
        // Restart emits the first point again, immediately.
        assert_eq!(feed.tick(1).unwrap().lat, 1.0);
    }

    #[test]
    fn test_scripted_feed_stop_drops_queue() {
        let mut feed = ScriptedRealFeed::new();
        feed.start().unwrap();
        feed.push_fix(RawFix::at(1.0, 2.0));
        feed.stop();
        assert!(feed.poll().is_none());
    }
}
