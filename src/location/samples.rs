//! Bounded audit log of location samples.
//!
//! Ring-buffer semantics: the log keeps the most recent 50 samples in
//! arrival order, evicting the oldest first. The full in-memory log is
//! exportable as a JSON document for offline inspection.

use super::types::{FixSource, LocationSample};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum retained samples.
pub const SAMPLE_LOG_CAP: usize = 50;

/// The bounded sample log. Owned exclusively by the arbiter.
#[derive(Debug, Default)]
pub struct SampleLog {
    entries: VecDeque<LocationSample>,
    total: u64,
}

impl SampleLog {
    pub fn new() -> Self {
        Self { entries: VecDeque::with_capacity(SAMPLE_LOG_CAP), total: 0 }
    }

    /// Append one sample, evicting the oldest entry once the cap is hit.
    pub fn push(
        &mut self,
        lat: f64,
        lng: f64,
        accuracy: Option<f64>,
        speed: Option<f64>,
        heading: Option<f64>,
        timestamp_ms: i64,
        iso: String,
        source: FixSource,
    ) {
        self.total += 1;
        if self.entries.len() == SAMPLE_LOG_CAP {
            self.entries.pop_front();
        }
        self.entries.push_back(LocationSample {
            seq: self.total,
            lat,
            lng,
            accuracy,
            speed,
            heading,
            timestamp_ms,
            iso,
            source,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total samples ever appended, including evicted ones.
    pub fn total_appended(&self) -> u64 {
        self.total
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocationSample> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&LocationSample> {
        self.entries.back()
    }

    /// Serialize the retained samples as pretty JSON.
    pub fn to_json(&self) -> String {
        let retained: Vec<&LocationSample> = self.entries.iter().collect();
        serde_json::to_string_pretty(&retained).unwrap_or_else(|_| "[]".to_string())
    }

    /// Write the retained samples to a file.
    pub fn export_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json())
    }
}

/// Default export location: ~/.lapida/samples.json.
pub fn default_export_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".lapida")
        .join("samples.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn push_n(log: &mut SampleLog, n: usize) {
        for i in 0..n {
            log.push(
                15.0 + i as f64 * 0.001,
                120.0,
                Some(5.0),
                None,
                None,
                1_000 + i as i64,
                format!("t{}", i),
                FixSource::Simulated,
            );
        }
    }

    #[test]
    fn test_log_under_cap() {
        let mut log = SampleLog::new();
        push_n(&mut log, 10);
        assert_eq!(log.len(), 10);
        assert_eq!(log.total_appended(), 10);
    }

    #[test]
    fn test_log_caps_at_50_fifo() {
        let mut log = SampleLog::new();
        push_n(&mut log, 1000);
        assert_eq!(log.len(), SAMPLE_LOG_CAP);
        assert_eq!(log.total_appended(), 1000);
        // Oldest evicted first: the retained window is 951..=1000.
        let seqs: Vec<u64> = log.iter().map(|s| s.seq).collect();
        assert_eq!(seqs.first(), Some(&951));
        assert_eq!(seqs.last(), Some(&1000));
        // Arrival order preserved.
        assert!(seqs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_export() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("samples.json");
        let mut log = SampleLog::new();
        push_n(&mut log, 3);
        log.export_to(&path).unwrap();

        let data = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<LocationSample> = serde_json::from_str(&data).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].seq, 1);
        assert_eq!(parsed[2].source, FixSource::Simulated);
    }
}
