use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::geo::Coordinates;
use crate::search::{run_search, SearchOutcome, SearchQuery};
use crate::token::{self, DisplayEntry};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

fn log_request(path: &str, detail: &str, start: Instant) {
    eprintln!(
        "[{}] GET {} -> {} ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        path,
        detail,
        start.elapsed().as_secs_f64() * 1000.0,
    );
}

// ─── GET /api/decode ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct DecodeParams {
    pub token: Option<String>,
}

#[derive(Serialize)]
pub struct DecodeResponse {
    pub coordinates: Option<Coordinates>,
    pub payload: Option<serde_json::Map<String, serde_json::Value>>,
    pub display: Vec<DisplayEntry>,
    pub raw: String,
}

pub async fn decode(
    Query(params): Query<DecodeParams>,
) -> Result<Json<DecodeResponse>, ApiError> {
    let start = Instant::now();
    let raw = params.token.as_deref().unwrap_or("");
    if raw.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'token' parameter"));
    }

    let decoded = token::decode(raw);
    let display = decoded
        .payload
        .as_ref()
        .map(token::display_entries)
        .unwrap_or_default();

    log_request(
        "/api/decode",
        if decoded.has_coordinates() { "coordinates" } else { "no geocoded data" },
        start,
    );

    Ok(Json(DecodeResponse {
        coordinates: decoded.coordinates,
        payload: decoded.payload,
        display,
        raw: decoded.raw,
    }))
}

// ─── GET /api/search ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub first: String,
    #[serde(default)]
    pub last: String,
    #[serde(default)]
    pub birth: String,
    #[serde(default)]
    pub death: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub outcome: SearchOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = Instant::now();

    let query = SearchQuery {
        first_name: params.first,
        last_name: params.last,
        birth_date: params.birth,
        death_date: params.death,
    };

    let outcome = run_search(&state.records, &query)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let (detail, message) = match &outcome {
        SearchOutcome::Selected(r) => (format!("selected #{}", r.id), None),
        SearchOutcome::Ambiguous { exact, close } => (
            format!("{} exact / {} close", exact.len(), close.len()),
            None,
        ),
        SearchOutcome::NoMatch(reason) => {
            ("no match".to_string(), Some(reason.message().to_string()))
        }
    };
    log_request("/api/search", &detail, start);

    Ok(Json(SearchResponse { outcome, message }))
}

// ─── GET /api/samples ────────────────────────────────────────────

pub async fn samples(State(state): State<Arc<AppState>>) -> Response {
    let json = {
        let arbiter = match state.arbiter.lock() {
            Ok(guard) => guard,
            Err(_) => {
                return api_error(StatusCode::INTERNAL_SERVER_ERROR, "arbiter unavailable")
                    .into_response()
            }
        };
        arbiter.samples().to_json()
    };
    ([(header::CONTENT_TYPE, "application/json")], json).into_response()
}
