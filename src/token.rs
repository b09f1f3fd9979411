//! Marker-token decoding.
//!
//! A physical marker carries an opaque text token. Four encodings are known
//! in the field: a JSON object (sometimes with coordinates buried in a
//! nested or string-encoded value), delimited `lat:`/`lng:` pairs, URL
//! query parameters, and well-known-text `POINT` syntax. Strategies are
//! tried in that fixed order; the first that matches wins. An unrecognized
//! token is a valid "no geocoding info" outcome, never an error.

use crate::geo::Coordinates;
use serde::Serialize;
use serde_json::{Map, Value};

/// Result of decoding one token. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedToken {
    /// Present only when a strategy matched with both axes finite.
    pub coordinates: Option<Coordinates>,
    /// Structured payload, when the token was a JSON object.
    pub payload: Option<Map<String, Value>>,
    /// The raw token text, untouched.
    pub raw: String,
}

impl DecodedToken {
    pub fn has_coordinates(&self) -> bool {
        self.coordinates.is_some()
    }
}

/// Decode a raw token through the strategy chain.
pub fn decode(token: &str) -> DecodedToken {
    let raw = token.trim();

    if let Some(decoded) = try_json(raw) {
        return DecodedToken { raw: token.to_string(), ..decoded };
    }
    let coordinates = try_key_value(raw)
        .or_else(|| try_url_query(raw))
        .or_else(|| try_wkt_point(raw))
        .and_then(finite_or_none);

    DecodedToken { coordinates, payload: None, raw: token.to_string() }
}

fn finite_or_none(c: Coordinates) -> Option<Coordinates> {
    if c.lat.is_finite() && c.lng.is_finite() { Some(c) } else { None }
}

// ─── Strategy 1: JSON object ────────────────────────────────────

fn try_json(raw: &str) -> Option<DecodedToken> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let obj = value.as_object()?.clone();

    // Direct lat/lng on the object itself.
    if let Some(coords) = coords_from_object(&obj) {
        return Some(DecodedToken {
            coordinates: Some(coords),
            payload: Some(obj),
            raw: String::new(),
        });
    }

    // Coordinates hidden one level down: a nested object, or a value that
    // is itself a JSON-encoded object. The outer object stays the payload.
    for v in obj.values() {
        match v {
            Value::Object(nested) => {
                if let Some(coords) = coords_from_object(nested) {
                    return Some(DecodedToken {
                        coordinates: Some(coords),
                        payload: Some(obj),
                        raw: String::new(),
                    });
                }
            }
            Value::String(s) => {
                let t = s.trim();
                if t.starts_with('{') && t.ends_with('}') {
                    if let Ok(Value::Object(nested)) = serde_json::from_str::<Value>(t) {
                        if let Some(coords) = coords_from_object(&nested) {
                            return Some(DecodedToken {
                                coordinates: Some(coords),
                                payload: Some(obj),
                                raw: String::new(),
                            });
                        }
                    }
                }
            }
            _ => {}
        }
    }

    // Parsed but ungeocoded: still a structured result.
    Some(DecodedToken { coordinates: None, payload: Some(obj), raw: String::new() })
}

fn coords_from_object(obj: &Map<String, Value>) -> Option<Coordinates> {
    let lat = numeric(obj.get("lat")?)?;
    let lng = numeric(obj.get("lng")?)?;
    finite_or_none(Coordinates::new(lat, lng))
}

/// Numeric field values may arrive as JSON numbers or numeric strings.
fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

// ─── Strategy 2: delimited key-value tokens ─────────────────────

fn is_delimiter(c: char) -> bool {
    c == '|' || c == ',' || c == ';' || c.is_whitespace()
}

fn try_key_value(raw: &str) -> Option<Coordinates> {
    let lat = find_kv(raw, "lat")?;
    let lng = find_kv(raw, "lng")?;
    Some(Coordinates::new(lat, lng))
}

/// Scan for `<key> : <number>` bounded by delimiters or string ends.
/// Matching is case-insensitive; all indexing happens on one lowercased
/// copy so offsets stay on char boundaries.
fn find_kv(raw: &str, key: &str) -> Option<f64> {
    let raw = raw.to_lowercase();
    let bytes = raw.as_bytes();
    let mut search_from = 0;

    while let Some(rel) = raw[search_from..].find(key) {
        let start = search_from + rel;
        search_from = start + 1;

        // Must sit at a delimiter or the start of the string.
        if start > 0 {
            let prev = raw[..start].chars().next_back().unwrap_or(' ');
            if !is_delimiter(prev) {
                continue;
            }
        }

        let mut pos = start + key.len();
        pos = skip_spaces(&raw, pos);
        if bytes.get(pos) != Some(&b':') {
            continue;
        }
        pos = skip_spaces(&raw, pos + 1);

        if let Some((value, len)) = take_number(&raw[pos..]) {
            // Must end at a delimiter or the end of the string.
            let after = raw[pos + len..].chars().next();
            if after.is_none() || after.is_some_and(is_delimiter) {
                return Some(value);
            }
        }
    }
    None
}

fn skip_spaces(raw: &str, mut pos: usize) -> usize {
    let bytes = raw.as_bytes();
    while bytes.get(pos).is_some_and(|b| b.is_ascii_whitespace()) {
        pos += 1;
    }
    pos
}

/// Parse a leading `[+-]?digits[.digits]` prefix; returns (value, length).
fn take_number(s: &str) -> Option<(f64, usize)> {
    let bytes = s.as_bytes();
    let mut pos = 0;

    if bytes.first().is_some_and(|b| *b == b'+' || *b == b'-') {
        pos += 1;
    }
    let int_start = pos;
    while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
        pos += 1;
    }
    if pos == int_start {
        return None;
    }
    // Fractional part only counts when digits follow the dot.
    if bytes.get(pos) == Some(&b'.') {
        let frac_start = pos + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        if frac_end > frac_start {
            pos = frac_end;
        }
    }

    s[..pos].parse::<f64>().ok().map(|v| (v, pos))
}

// ─── Strategy 3: URL query parameters ───────────────────────────

fn try_url_query(raw: &str) -> Option<Coordinates> {
    let lat = find_query_param(raw, "lat")?;
    let lng = find_query_param(raw, "lng")?;
    Some(Coordinates::new(lat, lng))
}

/// Scan for `[?&]<key>=<number>` anywhere in the token.
fn find_query_param(raw: &str, key: &str) -> Option<f64> {
    let raw = raw.to_lowercase();
    let needle = format!("{}=", key);
    let mut search_from = 0;

    while let Some(rel) = raw[search_from..].find(&needle) {
        let start = search_from + rel;
        search_from = start + 1;

        if start == 0 {
            continue;
        }
        let prev = raw[..start].chars().next_back().unwrap_or(' ');
        if prev != '?' && prev != '&' {
            continue;
        }
        if let Some((value, _)) = take_number(&raw[start + needle.len()..]) {
            return Some(value);
        }
    }
    None
}

// ─── Strategy 4: well-known-text POINT ──────────────────────────

/// `POINT(<lng> <lat>)` — longitude first, per the encoding convention.
/// Any occurrence of the keyword can start the match; a bare "point"
/// elsewhere in the token does not mask a later well-formed one.
fn try_wkt_point(raw: &str) -> Option<Coordinates> {
    let raw = raw.to_lowercase();
    let mut search_from = 0;

    while let Some(rel) = raw[search_from..].find("point") {
        let start = search_from + rel;
        search_from = start + 1;
        if let Some(coords) = wkt_point_at(&raw, start + "point".len()) {
            return Some(coords);
        }
    }
    None
}

fn wkt_point_at(raw: &str, after_keyword: usize) -> Option<Coordinates> {
    let mut pos = skip_spaces(raw, after_keyword);

    if raw.as_bytes().get(pos) != Some(&b'(') {
        return None;
    }
    pos = skip_spaces(raw, pos + 1);

    let (lng, len) = take_number(&raw[pos..])?;
    pos += len;

    let sep_start = pos;
    pos = skip_spaces(raw, pos);
    if pos == sep_start {
        return None;
    }

    let (lat, len) = take_number(&raw[pos..])?;
    pos = skip_spaces(raw, pos + len);

    if raw.as_bytes().get(pos) != Some(&b')') {
        return None;
    }
    Some(Coordinates::new(lat, lng))
}

// ─── Payload display view ───────────────────────────────────────

/// Keys that are internal plumbing, never shown to a visitor.
const HIDDEN_KEYS: &[&str] = &[
    "_type", "id", "uid", "plot_id", "family_contact", "is_active",
    "lat", "lng", "created_at", "updated_at", "headstone_type",
    "memorial_text",
];

const KNOWN_LABELS: &[(&str, &str)] = &[
    ("deceased_name", "Deceased Name"),
    ("birth_date", "Birth Date"),
    ("death_date", "Death Date"),
    ("burial_date", "Burial Date"),
];

/// A single labelled payload field, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayEntry {
    pub key: String,
    pub label: String,
    pub value: String,
}

/// Filter and label a decoded payload for visitor-facing display.
pub fn display_entries(payload: &Map<String, Value>) -> Vec<DisplayEntry> {
    payload
        .iter()
        .filter(|(k, _)| !HIDDEN_KEYS.contains(&k.as_str()))
        .map(|(k, v)| DisplayEntry {
            key: k.clone(),
            label: label_for(k),
            value: format_value(v),
        })
        .collect()
}

fn label_for(key: &str) -> String {
    if let Some((_, label)) = KNOWN_LABELS.iter().find(|(k, _)| *k == key) {
        return (*label).to_string();
    }
    // "burial_site" → "Burial Site"
    key.split('_')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_value(v: &Value) -> String {
    match v {
        Value::Null => "—".to_string(),
        Value::String(s) if s.is_empty() => "—".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        other => other.to_string(),
    }
}
