//! Tolerant name matching for burial-record search.
//!
//! Human-entered names are noisy: stray punctuation, accents, middle names,
//! and one-or-two-letter typos. Matching runs over normalized strings and
//! classifies each candidate as Exact, Close, or None.

use serde::Serialize;

/// Average-similarity threshold when both name halves are supplied.
const PAIR_AVG_THRESHOLD: f64 = 0.65;
/// Single-field similarity threshold (also the partial-query threshold).
const FIELD_THRESHOLD: f64 = 0.75;

/// How a record's name compares against the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchClass {
    /// Literal post-normalization equality on both halves.
    Exact,
    /// Clears the fuzzy thresholds without being a literal match.
    Close,
    /// Not a plausible match.
    None,
}

/// A user-supplied name query. Either half may be empty.
#[derive(Debug, Clone, Default)]
pub struct NameQuery {
    pub first: String,
    pub last: String,
}

impl NameQuery {
    pub fn new(first: impl Into<String>, last: impl Into<String>) -> Self {
        Self { first: first.into(), last: last.into() }
    }

    fn has_first(&self) -> bool {
        !normalize(&self.first).is_empty()
    }

    fn has_last(&self) -> bool {
        !normalize(&self.last).is_empty()
    }
}

/// Normalize a name for comparison: lowercase, fold accents, keep only
/// `[a-z ]`, collapse runs of whitespace, trim.
pub fn normalize(s: &str) -> String {
    let folded: String = s
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ø' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            _ => c,
        })
        .collect();

    folded
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compute edit distance between two strings (Levenshtein).
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());

    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n]
}

/// Normalized similarity in [0,1]: `1 - distance / max(len)`.
/// Two empty strings compare as 1.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    1.0 - levenshtein(&a, &b) as f64 / max_len as f64
}

/// Split a normalized full name into (given, family): first whitespace
/// token and last token. Middle tokens are ignored. A one-token name
/// serves as both halves, so a family-name-only query can still match a
/// mononymous record.
fn split_name(full_name: &str) -> (String, String) {
    let norm = normalize(full_name);
    let mut parts = norm.split(' ').filter(|p| !p.is_empty());
    let given = parts.next().unwrap_or("").to_string();
    let family = parts.last().unwrap_or(given.as_str()).to_string();
    (given, family)
}

/// Classify one record name against the query. Deterministic: the same
/// (query, name) pair always yields the same class.
pub fn classify(query: &NameQuery, full_name: &str) -> MatchClass {
    let (given, family) = split_name(full_name);

    match (query.has_first(), query.has_last()) {
        (true, true) => {
            if normalize(&query.first) == given && normalize(&query.last) == family {
                return MatchClass::Exact;
            }
            let sf = similarity(&query.first, &given);
            let sl = similarity(&query.last, &family);
            if (sf + sl) / 2.0 >= PAIR_AVG_THRESHOLD
                || sf >= FIELD_THRESHOLD
                || sl >= FIELD_THRESHOLD
            {
                MatchClass::Close
            } else {
                MatchClass::None
            }
        }
        // Partial queries never classify Exact.
        (true, false) => {
            if similarity(&query.first, &given) >= FIELD_THRESHOLD {
                MatchClass::Close
            } else {
                MatchClass::None
            }
        }
        (false, true) => {
            if similarity(&query.last, &family) >= FIELD_THRESHOLD {
                MatchClass::Close
            } else {
                MatchClass::None
            }
        }
        // Name not constraining: every date-matched record qualifies.
        (false, false) => MatchClass::Exact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Juan   Dela Cruz "), "juan dela cruz");
        assert_eq!(normalize("José Peña-Gómez"), "jose penagomez");
        assert_eq!(normalize("O'Brien, Jr."), "obrien jr");
        assert_eq!(normalize("123!@#"), "");
    }

    #[test]
    fn test_levenshtein_identity() {
        for s in ["", "a", "juan", "dela cruz"] {
            assert_eq!(levenshtein(s, s), 0);
        }
    }

    #[test]
    fn test_levenshtein_symmetry() {
        let pairs = [("kitten", "sitting"), ("juan", "jon"), ("", "cruz")];
        for (a, b) in pairs {
            assert_eq!(levenshtein(a, b), levenshtein(b, a));
        }
    }

    #[test]
    fn test_levenshtein_known() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("cruz", "kruz"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
    }

    #[test]
    fn test_similarity_empty_pair() {
        assert_relative_eq!(similarity("", ""), 1.0);
    }

    #[test]
    fn test_similarity_against_empty() {
        // Length-based distance against an empty string → 0.0.
        assert_relative_eq!(similarity("", "cruz"), 0.0);
    }

    #[test]
    fn test_exact_match() {
        let q = NameQuery::new("juan", "cruz");
        assert_eq!(classify(&q, "Juan Dela Cruz"), MatchClass::Exact);
    }

    #[test]
    fn test_close_match_typos() {
        // "jon" vs "juan": dist 2 over 4 → 0.5; "kruz" vs "cruz": 1/4 → 0.75.
        let q = NameQuery::new("jon", "kruz");
        assert_eq!(classify(&q, "Juan Dela Cruz"), MatchClass::Close);
    }

    #[test]
    fn test_no_match() {
        let q = NameQuery::new("pedro", "reyes");
        assert_eq!(classify(&q, "Juan Dela Cruz"), MatchClass::None);
    }

    #[test]
    fn test_last_name_only() {
        let q = NameQuery::new("", "cruz");
        assert_eq!(classify(&q, "Juan Dela Cruz"), MatchClass::Close);
        assert_eq!(classify(&q, "Ana Reyes"), MatchClass::None);
    }

    #[test]
    fn test_partial_query_never_exact() {
        let q = NameQuery::new("juan", "");
        assert_eq!(classify(&q, "Juan Dela Cruz"), MatchClass::Close);
    }

    #[test]
    fn test_empty_query_is_exact() {
        let q = NameQuery::default();
        assert_eq!(classify(&q, "Anyone At All"), MatchClass::Exact);
    }

    #[test]
    fn test_single_token_name() {
        // A one-word record name serves as both given and family name.
        let q = NameQuery::new("", "madonna");
        assert_eq!(classify(&q, "Madonna"), MatchClass::Close);
    }

    #[test]
    fn test_deterministic() {
        let q = NameQuery::new("jon", "dela kruz");
        let first = classify(&q, "Juan Dela Cruz");
        for _ in 0..10 {
            assert_eq!(classify(&q, "Juan Dela Cruz"), first);
        }
    }
}
