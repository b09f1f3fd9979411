//! Location-source arbitration.
//!
//! Owns the real-vs-simulated state machine, consent gating, the bounded
//! sample log, and the proximity fallback that picks the effective
//! routing origin. Single-threaded: every mutation happens inside a
//! command or poll call on this struct.

use super::feeds::{FeedEvent, NamedSeries, RealLocationFeed, SimulatedFeed};
use super::samples::SampleLog;
use super::types::{FixSource, RawFix, TrackerError, TrackerState};
use crate::geo::{haversine_m, Coordinates};
use chrono::{SecondsFormat, TimeZone, Utc};

/// The facility entrance: the origin-of-last-resort for routing.
pub const REFERENCE_POINT: Coordinates = Coordinates { lat: 15.494177, lng: 120.554702 };

/// Live fixes further than this from the reference point do not drive
/// routing.
pub const ORIGIN_RADIUS_M: f64 = 10_000.0;

/// The origin actually handed to the routing engine, with provenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OriginResolution {
    pub origin: Coordinates,
    /// A fix exists but lies beyond the radius; the reference point was
    /// used instead.
    pub outside_radius: bool,
    /// Source of the fix that drove this resolution, if one existed.
    pub source: Option<FixSource>,
}

impl OriginResolution {
    /// True when the origin is the reference point rather than a live fix.
    pub fn used_fallback(&self) -> bool {
        self.outside_radius || self.source.is_none()
    }
}

/// The location-source arbiter.
pub struct LocationArbiter {
    simulated_mode: bool,
    consent: bool,
    real_watch_live: bool,
    real_feed: Box<dyn RealLocationFeed>,
    sim_feed: SimulatedFeed,
    current_fix: Option<(Coordinates, FixSource)>,
    got_real_fix: bool,
    log: SampleLog,
    reference: Coordinates,
}

impl LocationArbiter {
    pub fn new(real_feed: Box<dyn RealLocationFeed>, sim_feed: SimulatedFeed) -> Self {
        Self::with_reference(real_feed, sim_feed, REFERENCE_POINT)
    }

    /// Build with a specific reference point (for testing).
    pub fn with_reference(
        real_feed: Box<dyn RealLocationFeed>,
        sim_feed: SimulatedFeed,
        reference: Coordinates,
    ) -> Self {
        Self {
            simulated_mode: false,
            consent: false,
            real_watch_live: false,
            real_feed,
            sim_feed,
            current_fix: None,
            got_real_fix: false,
            log: SampleLog::new(),
            reference,
        }
    }

    // ─── Commands ───────────────────────────────────────────────

    /// Toggle simulated mode. Turning it on cancels the real watch
    /// synchronously and wipes the real feed's contribution; turning it
    /// off restarts the real watch if consent is already granted.
    pub fn set_simulated(&mut self, on: bool) -> Result<(), TrackerError> {
        if on == self.simulated_mode {
            return Ok(());
        }
        self.simulated_mode = on;
        // Switching modes invalidates the other feed's contribution.
        self.current_fix = None;
        if on {
            self.stop_real_watch();
            Ok(())
        } else {
            self.got_real_fix = false;
            if self.consent {
                self.start_real_watch()
            } else {
                Ok(())
            }
        }
    }

    /// Grant consent for the real feed. Independent of mode: in real mode
    /// with no live watch this starts one; in simulated mode it only
    /// records the grant.
    pub fn grant_consent(&mut self) -> Result<(), TrackerError> {
        self.consent = true;
        if !self.simulated_mode && !self.real_watch_live {
            self.start_real_watch()
        } else {
            Ok(())
        }
    }

    /// Withdraw consent: the real watch stops synchronously and its fix
    /// is discarded.
    pub fn revoke_consent(&mut self) {
        self.consent = false;
        self.stop_real_watch();
        self.got_real_fix = false;
        if !self.simulated_mode {
            self.current_fix = None;
        }
    }

    /// Tear down any live subscription.
    pub fn shutdown(&mut self) {
        self.stop_real_watch();
    }

    fn start_real_watch(&mut self) -> Result<(), TrackerError> {
        match self.real_feed.start() {
            Ok(()) => {
                self.real_watch_live = true;
                Ok(())
            }
            Err(e) => {
                // Capability missing: degrade, don't crash. Search and
                // reference-point routing stay usable.
                self.real_watch_live = false;
                Err(e)
            }
        }
    }

    fn stop_real_watch(&mut self) {
        if self.real_watch_live {
            self.real_feed.stop();
            self.real_watch_live = false;
        }
    }

    /// Select a simulated series (restarts it) and re-enter simulated
    /// mode if not already there.
    pub fn select_series(&mut self, series: NamedSeries) -> Result<(), TrackerError> {
        self.sim_feed.select_series(series);
        self.set_simulated(true)
    }

    pub fn set_sim_interval_ms(&mut self, interval_ms: u64) {
        self.sim_feed.set_interval_ms(interval_ms);
    }

    // ─── Event pump ─────────────────────────────────────────────

    /// Pump the active feed once, using the wall clock.
    pub fn poll(&mut self) {
        self.poll_at(Utc::now().timestamp_millis());
    }

    /// Pump the active feed once at a given instant. Only the active
    /// source can append samples; a just-deactivated feed has already
    /// been stopped synchronously, so nothing stale can land here.
    pub fn poll_at(&mut self, now_ms: i64) {
        if self.simulated_mode {
            if let Some(point) = self.sim_feed.tick(now_ms) {
                self.record_fix(
                    RawFix { accuracy: Some(5.0), ..RawFix::at(point.lat, point.lng) },
                    FixSource::Simulated,
                    now_ms,
                );
            }
            return;
        }

        if !self.real_watch_live {
            return;
        }
        while let Some(event) = self.real_feed.poll() {
            match event {
                FeedEvent::Fix(fix) => {
                    self.got_real_fix = true;
                    self.record_fix(fix, FixSource::Real, now_ms);
                }
                FeedEvent::Fault(msg) => {
                    // Transient: log and keep the watch alive.
                    eprintln!("[{}] location feed error: {}", iso_time(now_ms), msg);
                }
            }
        }
    }

    fn record_fix(&mut self, fix: RawFix, source: FixSource, now_ms: i64) {
        self.log.push(
            fix.lat,
            fix.lng,
            fix.accuracy,
            fix.speed,
            fix.heading,
            now_ms,
            iso_time(now_ms),
            source,
        );
        self.current_fix = Some((Coordinates::new(fix.lat, fix.lng), source));
    }

    // ─── Queries ────────────────────────────────────────────────

    pub fn state(&self) -> TrackerState {
        if self.simulated_mode {
            TrackerState::SimulatedActive
        } else if self.real_watch_live {
            if self.got_real_fix {
                TrackerState::RealActive
            } else {
                TrackerState::RealPending
            }
        } else {
            TrackerState::Disabled
        }
    }

    pub fn consent_granted(&self) -> bool {
        self.consent
    }

    pub fn current_fix(&self) -> Option<(Coordinates, FixSource)> {
        self.current_fix
    }

    pub fn reference_point(&self) -> Coordinates {
        self.reference
    }

    /// Resolve the effective routing origin. Recomputed on every call —
    /// never cached — so the proximity comparison tracks each new fix.
    pub fn effective_origin(&self) -> OriginResolution {
        match self.current_fix {
            Some((fix, source)) if fix.is_valid() => {
                if haversine_m(fix, self.reference) > ORIGIN_RADIUS_M {
                    OriginResolution {
                        origin: self.reference,
                        outside_radius: true,
                        source: Some(source),
                    }
                } else {
                    OriginResolution { origin: fix, outside_radius: false, source: Some(source) }
                }
            }
            _ => OriginResolution { origin: self.reference, outside_radius: false, source: None },
        }
    }

    pub fn samples(&self) -> &SampleLog {
        &self.log
    }

    /// Serialize the sample log for offline inspection.
    pub fn export_samples(&self, path: &std::path::Path) -> Result<(), TrackerError> {
        self.log.export_to(path).map_err(|e| TrackerError::Export(e.to_string()))
    }
}

fn iso_time(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}
