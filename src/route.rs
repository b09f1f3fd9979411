//! Route coordination against an external routing engine.
//!
//! The coordinator pairs the arbiter's effective origin with the selected
//! destination and issues a route request on every relevant change. It
//! never compares the new origin against the previous one: staleness is
//! worse than redundant recomputation, so each refresh routes afresh.

use crate::geo::Coordinates;
use crate::location::{LocationArbiter, OriginResolution};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Routing errors.
#[derive(Debug)]
pub enum RouteError {
    /// A waypoint failed coordinate validation.
    InvalidWaypoint(String),
    /// The external engine failed or answered with garbage.
    Engine(String),
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWaypoint(msg) => write!(f, "Invalid waypoint: {}", msg),
            Self::Engine(msg) => write!(f, "Routing engine error: {}", msg),
        }
    }
}

impl std::error::Error for RouteError {}

/// Path geometry as reported by the engine. The coordinator passes it
/// through without interpreting it.
#[derive(Debug, Clone, Serialize)]
pub struct RoutePath {
    pub distance_m: f64,
    pub duration_s: f64,
    pub geometry: Vec<Coordinates>,
}

/// The external routing engine: an ordered two-point waypoint list in, a
/// walking path out.
pub trait RoutingEngine {
    fn route(&self, origin: Coordinates, destination: Coordinates) -> Result<RoutePath, RouteError>;
}

// ─── OSRM client ────────────────────────────────────────────────

const OSRM_DEFAULT_URL: &str = "https://router.project-osrm.org/route/v1";

/// OSRM `route/v1` client using the walking profile.
pub struct OsrmEngine {
    service_url: String,
    profile: String,
}

impl OsrmEngine {
    pub fn new() -> Self {
        Self { service_url: OSRM_DEFAULT_URL.to_string(), profile: "foot".to_string() }
    }

    pub fn with_service_url(url: impl Into<String>) -> Self {
        Self { service_url: url.into(), profile: "foot".to_string() }
    }
}

impl Default for OsrmEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
}

#[derive(Deserialize)]
struct OsrmGeometry {
    /// GeoJSON order: [lng, lat].
    coordinates: Vec<[f64; 2]>,
}

impl RoutingEngine for OsrmEngine {
    fn route(&self, origin: Coordinates, destination: Coordinates) -> Result<RoutePath, RouteError> {
        let url = format!(
            "{}/{}/{},{};{},{}?overview=full&geometries=geojson&alternatives=false&steps=false",
            self.service_url, self.profile, origin.lng, origin.lat, destination.lng, destination.lat,
        );

        let response = ureq::get(&url)
            .set("User-Agent", "LapidaTrace/0.3 (burial-record-locator)")
            .call()
            .map_err(|e| RouteError::Engine(e.to_string()))?;

        let body: OsrmResponse =
            response.into_json().map_err(|e| RouteError::Engine(e.to_string()))?;

        if body.code != "Ok" {
            return Err(RouteError::Engine(format!("engine answered '{}'", body.code)));
        }
        let route = body
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| RouteError::Engine("no route in response".to_string()))?;

        Ok(RoutePath {
            distance_m: route.distance,
            duration_s: route.duration,
            geometry: route
                .geometry
                .coordinates
                .iter()
                .map(|&[lng, lat]| Coordinates::new(lat, lng))
                .collect(),
        })
    }
}

// ─── Coordinator ────────────────────────────────────────────────

/// One successful route computation, surfaced to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RouteUpdate {
    pub origin: Coordinates,
    pub destination: Coordinates,
    /// The live fix sat beyond the proximity radius and the reference
    /// point was routed from instead.
    pub outside_radius: bool,
    pub path: RoutePath,
}

/// Pairs the arbiter's effective origin with the current destination and
/// drives the engine.
pub struct RouteCoordinator {
    engine: Box<dyn RoutingEngine>,
    destination: Option<Coordinates>,
}

impl RouteCoordinator {
    pub fn new(engine: Box<dyn RoutingEngine>) -> Self {
        Self { engine, destination: None }
    }

    /// Select (or clear) the routing destination.
    pub fn set_destination(&mut self, destination: Option<Coordinates>) {
        self.destination = destination;
    }

    pub fn destination(&self) -> Option<Coordinates> {
        self.destination
    }

    /// Recompute the effective origin and issue a fresh route request.
    /// Call this on every relevant change: a newly selected destination,
    /// a new fix, or a proximity-fallback flip. With no destination the
    /// coordinator is idle and no request is issued.
    pub fn refresh(&mut self, arbiter: &LocationArbiter) -> Result<Option<RouteUpdate>, RouteError> {
        let Some(destination) = self.destination else {
            return Ok(None);
        };
        if !destination.is_valid() {
            return Err(RouteError::InvalidWaypoint(format!("destination {}", destination)));
        }

        let OriginResolution { origin, outside_radius, .. } = arbiter.effective_origin();
        let path = self.engine.route(origin, destination)?;
        Ok(Some(RouteUpdate { origin, destination, outside_radius, path }))
    }
}
