//! Search session: date prefilter, name classification, selection policy.

use crate::matcher::{self, MatchClass, NameQuery};
use crate::records::{same_calendar_date, BurialRecord};
use serde::Serialize;

/// A full search query. Dates are mandatory; name halves are optional.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub death_date: String,
}

/// Why a search produced no selectable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoMatchReason {
    /// No record has both life-dates on the queried calendar days.
    Dates,
    /// Date-matched records exist, but none clears the name thresholds.
    Name,
}

impl NoMatchReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Dates => "No records match the given Birth and Death dates.",
            Self::Name => "No records found for those dates and name.",
        }
    }
}

/// Outcome of one search run.
#[derive(Debug, Clone, Serialize)]
pub enum SearchOutcome {
    /// A single unambiguous record was auto-selected.
    Selected(BurialRecord),
    /// Multiple candidates; the caller must ask the user to disambiguate.
    Ambiguous {
        exact: Vec<BurialRecord>,
        close: Vec<BurialRecord>,
    },
    NoMatch(NoMatchReason),
}

/// Errors reported before matching runs at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    MissingDates,
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingDates => write!(f, "Please provide both Birth Date and Death Date."),
        }
    }
}

impl std::error::Error for SearchError {}

/// Run one search over a fetched record set.
///
/// Records are prefiltered by exact calendar-day match on both dates, then
/// classified by name. Auto-selection: a single exact match wins; with no
/// exact matches, a single close match wins; otherwise both candidate
/// lists are surfaced for the user.
pub fn run_search(records: &[BurialRecord], query: &SearchQuery) -> Result<SearchOutcome, SearchError> {
    if query.birth_date.trim().is_empty() || query.death_date.trim().is_empty() {
        return Err(SearchError::MissingDates);
    }

    let date_matched: Vec<&BurialRecord> = records
        .iter()
        .filter(|r| {
            same_calendar_date(&r.birth_date, &query.birth_date)
                && same_calendar_date(&r.death_date, &query.death_date)
        })
        .collect();

    if date_matched.is_empty() {
        return Ok(SearchOutcome::NoMatch(NoMatchReason::Dates));
    }

    let name_query = NameQuery::new(query.first_name.trim(), query.last_name.trim());
    let mut exact = Vec::new();
    let mut close = Vec::new();
    for record in date_matched {
        match matcher::classify(&name_query, &record.deceased_name) {
            MatchClass::Exact => exact.push(record.clone()),
            MatchClass::Close => close.push(record.clone()),
            MatchClass::None => {}
        }
    }

    if exact.len() == 1 {
        return Ok(SearchOutcome::Selected(exact.remove(0)));
    }
    if exact.is_empty() && close.len() == 1 {
        return Ok(SearchOutcome::Selected(close.remove(0)));
    }
    if exact.is_empty() && close.is_empty() {
        return Ok(SearchOutcome::NoMatch(NoMatchReason::Name));
    }
    Ok(SearchOutcome::Ambiguous { exact, close })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, name: &str, birth: &str, death: &str) -> BurialRecord {
        BurialRecord {
            id,
            deceased_name: name.to_string(),
            birth_date: birth.to_string(),
            death_date: death.to_string(),
            plot_id: None,
            marker_token: None,
        }
    }

    fn sample_records() -> Vec<BurialRecord> {
        vec![
            record(1, "Juan Dela Cruz", "1950-01-01", "2001-03-04"),
            record(2, "Ana Reyes", "1950-01-01", "2001-03-04"),
            record(3, "Juan Dela Cruz", "1950-01-01", "1999-12-31"),
        ]
    }

    fn query(first: &str, last: &str, birth: &str, death: &str) -> SearchQuery {
        SearchQuery {
            first_name: first.to_string(),
            last_name: last.to_string(),
            birth_date: birth.to_string(),
            death_date: death.to_string(),
        }
    }

    #[test]
    fn test_missing_dates_rejected() {
        let q = query("juan", "cruz", "", "2001-03-04");
        assert!(matches!(
            run_search(&sample_records(), &q),
            Err(SearchError::MissingDates)
        ));
    }

    #[test]
    fn test_single_exact_auto_selected() {
        let q = query("juan", "cruz", "1950-01-01", "2001-03-04");
        match run_search(&sample_records(), &q).unwrap() {
            SearchOutcome::Selected(r) => assert_eq!(r.id, 1),
            other => panic!("expected Selected, got {:?}", other),
        }
    }

    #[test]
    fn test_single_close_auto_selected() {
        let q = query("jaun", "crus", "1950-01-01", "2001-03-04");
        match run_search(&sample_records(), &q).unwrap() {
            SearchOutcome::Selected(r) => assert_eq!(r.id, 1),
            other => panic!("expected Selected, got {:?}", other),
        }
    }

    #[test]
    fn test_no_date_match() {
        let q = query("juan", "cruz", "1950-01-01", "2010-01-01");
        match run_search(&sample_records(), &q).unwrap() {
            SearchOutcome::NoMatch(reason) => assert_eq!(reason, NoMatchReason::Dates),
            other => panic!("expected NoMatch, got {:?}", other),
        }
    }

    #[test]
    fn test_dates_match_but_name_does_not() {
        let q = query("pedro", "santos", "1950-01-01", "2001-03-04");
        match run_search(&sample_records(), &q).unwrap() {
            SearchOutcome::NoMatch(reason) => assert_eq!(reason, NoMatchReason::Name),
            other => panic!("expected NoMatch, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_name_with_multiple_records_is_ambiguous() {
        // Name not constraining: every date-matched record is exact.
        let q = query("", "", "1950-01-01", "2001-03-04");
        match run_search(&sample_records(), &q).unwrap() {
            SearchOutcome::Ambiguous { exact, close } => {
                assert_eq!(exact.len(), 2);
                assert!(close.is_empty());
            }
            other => panic!("expected Ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn test_multiple_close_matches_surfaced() {
        let records = vec![
            record(1, "Juan Dela Cruz", "1950-01-01", "2001-03-04"),
            record(2, "Juana Cruz", "1950-01-01", "2001-03-04"),
        ];
        let q = query("jon", "kruz", "1950-01-01", "2001-03-04");
        match run_search(&records, &q).unwrap() {
            SearchOutcome::Ambiguous { exact, close } => {
                assert!(exact.is_empty());
                assert_eq!(close.len(), 2);
            }
            other => panic!("expected Ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn test_timestamp_dates_still_match() {
        let records = vec![record(1, "Juan Dela Cruz", "1950-01-01T00:00:00.000Z", "2001-03-04T00:00:00.000Z")];
        let q = query("juan", "cruz", "1950-01-01", "2001-03-04");
        match run_search(&records, &q).unwrap() {
            SearchOutcome::Selected(r) => assert_eq!(r.id, 1),
            other => panic!("expected Selected, got {:?}", other),
        }
    }
}
