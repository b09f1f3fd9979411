//! Burial records and their external sources.
//!
//! Records are read-only data fetched once per search session. This module
//! also carries the calendar-day date comparison the search prefilter runs
//! on: the contract is literal Y-M-D equality of the parsed calendar
//! fields, with a raw 10-char prefix comparison when parsing fails. No UTC
//! normalization is applied.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// One burial record as served by the external record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurialRecord {
    pub id: i64,
    #[serde(default)]
    pub deceased_name: String,
    #[serde(default)]
    pub birth_date: String,
    #[serde(default)]
    pub death_date: String,
    #[serde(default)]
    pub plot_id: Option<String>,
    /// Raw marker token printed on the physical marker, if any.
    #[serde(default)]
    pub marker_token: Option<String>,
}

/// Extract the calendar day of a date string.
///
/// Accepts plain `YYYY-MM-DD`, RFC3339 timestamps (the embedded offset's
/// own calendar day is kept as-is), and bare `YYYY-MM-DDTHH:MM:SS`.
fn calendar_day(s: &str) -> Option<NaiveDate> {
    let t = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt.naive_local().date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    None
}

/// Literal calendar-day equality. Empty inputs never match; unparseable
/// inputs fall back to comparing the raw `YYYY-MM-DD` prefixes.
pub fn same_calendar_date(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    if a.is_empty() || b.is_empty() {
        return false;
    }
    match (calendar_day(a), calendar_day(b)) {
        (Some(da), Some(db)) => da == db,
        _ => prefix10(a) == prefix10(b),
    }
}

fn prefix10(s: &str) -> &str {
    match s.char_indices().nth(10) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ─── Record sources ─────────────────────────────────────────────

/// Errors while fetching records from an external source.
#[derive(Debug)]
pub enum RecordError {
    Io(String),
    Network(String),
    InvalidData(String),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "Record file error: {}", msg),
            Self::Network(msg) => write!(f, "Record fetch error: {}", msg),
            Self::InvalidData(msg) => write!(f, "Invalid record data: {}", msg),
        }
    }
}

impl std::error::Error for RecordError {}

/// Pull interface over the external record store. The core only consumes
/// the resulting set; transport is the collaborator's concern.
pub trait RecordSource {
    fn fetch(&self) -> Result<Vec<BurialRecord>, RecordError>;
}

/// Records from a local JSON file (an exported record set).
pub struct FileRecordSource {
    path: std::path::PathBuf,
}

impl FileRecordSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl RecordSource for FileRecordSource {
    fn fetch(&self) -> Result<Vec<BurialRecord>, RecordError> {
        let data = fs::read_to_string(&self.path)
            .map_err(|e| RecordError::Io(format!("{}: {}", self.path.display(), e)))?;
        serde_json::from_str(&data).map_err(|e| RecordError::InvalidData(e.to_string()))
    }
}

/// Records pulled from the record store's HTTP endpoint.
pub struct HttpRecordSource {
    url: String,
}

impl HttpRecordSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl RecordSource for HttpRecordSource {
    fn fetch(&self) -> Result<Vec<BurialRecord>, RecordError> {
        let response = ureq::get(&self.url)
            .set("User-Agent", "LapidaTrace/0.3 (burial-record-locator)")
            .call()
            .map_err(|e| RecordError::Network(e.to_string()))?;

        response
            .into_json()
            .map_err(|e| RecordError::InvalidData(e.to_string()))
    }
}

/// Fixed record set, for tests and offline demos.
pub struct StaticRecordSource {
    records: Vec<BurialRecord>,
}

impl StaticRecordSource {
    pub fn new(records: Vec<BurialRecord>) -> Self {
        Self { records }
    }
}

impl RecordSource for StaticRecordSource {
    fn fetch(&self) -> Result<Vec<BurialRecord>, RecordError> {
        Ok(self.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_same_calendar_date_plain() {
        assert!(same_calendar_date("2001-03-04", "2001-03-04"));
        assert!(!same_calendar_date("2001-03-04", "2001-03-05"));
    }

    #[test]
    fn test_same_calendar_date_timestamp() {
        assert!(same_calendar_date("2001-03-04", "2001-03-04T00:00:00.000Z"));
        assert!(same_calendar_date("2001-03-04T10:30:00", "2001-03-04"));
        assert!(!same_calendar_date("2001-03-04", "2001-03-05T00:00:00Z"));
    }

    #[test]
    fn test_same_calendar_date_offset_kept_literal() {
        // The embedded offset's calendar day is taken as-is, not shifted
        // to UTC: 23:30-08:00 is still March 4 in its own offset.
        assert!(same_calendar_date("2001-03-04T23:30:00-08:00", "2001-03-04"));
    }

    #[test]
    fn test_same_calendar_date_unparseable_prefix() {
        assert!(same_calendar_date("2001-03-04 extra junk", "2001-03-04 other"));
        assert!(!same_calendar_date("not-a-date", "2001-03-04"));
    }

    #[test]
    fn test_same_calendar_date_empty() {
        assert!(!same_calendar_date("", "2001-03-04"));
        assert!(!same_calendar_date("2001-03-04", ""));
    }

    #[test]
    fn test_file_source_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");
        let json = r#"[
            {"id":1,"deceased_name":"Juan Dela Cruz","birth_date":"1950-01-01",
             "death_date":"2001-03-04","plot_id":"A4",
             "marker_token":"lat:15.49|lng:120.55"},
            {"id":2,"deceased_name":"Ana Reyes","birth_date":"1950-01-01",
             "death_date":"2001-03-04"}
        ]"#;
        fs::write(&path, json).unwrap();

        let records = FileRecordSource::new(&path).fetch().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].deceased_name, "Juan Dela Cruz");
        assert_eq!(records[0].plot_id.as_deref(), Some("A4"));
        assert!(records[1].marker_token.is_none());
    }

    #[test]
    fn test_file_source_missing() {
        let result = FileRecordSource::new("/nonexistent/records.json").fetch();
        assert!(matches!(result, Err(RecordError::Io(_))));
    }

    #[test]
    fn test_file_source_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");
        fs::write(&path, "{not json").unwrap();
        let result = FileRecordSource::new(&path).fetch();
        assert!(matches!(result, Err(RecordError::InvalidData(_))));
    }
}
