//! Read-side snapshot of the plane database
//!
//! A display grabs a consistent copy of everything it needs under the
//! database mutex and renders without holding any engine state.

use std::time::{Duration, Instant};

use skywatch::adsb::VerticalRate;
use skywatch::cpr::Position;
use skywatch::ICAO;

use crate::{PlaneState, Planes};

/// A position younger than this renders as live.
pub const POSITION_FRESH: Duration = Duration::from_secs(5);

/// A plane heard within this window still renders as active.
pub const RECENTLY_SEEN: Duration = Duration::from_secs(15);

/// How current a plane's data is, for display emphasis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// position update within [`POSITION_FRESH`]
    FreshPosition,
    /// any frame within [`RECENTLY_SEEN`]
    RecentlySeen,
    /// nothing recent, but not yet evicted
    Stale,
}

impl Freshness {
    fn classify(state: &PlaneState, now: Instant) -> Self {
        if let Some(position) = &state.position {
            if now.duration_since(position.time) < POSITION_FRESH {
                return Self::FreshPosition;
            }
        }
        if now.duration_since(state.last_seen) < RECENTLY_SEEN {
            return Self::RecentlySeen;
        }
        Self::Stale
    }
}

/// One plane as seen by a viewer.
#[derive(Debug, Clone)]
pub struct PlaneSnapshot {
    pub icao: ICAO,
    pub callsign: Option<String>,
    pub position: Option<Position>,
    /// feet
    pub altitude: Option<i32>,
    /// degrees in [0, 360)
    pub bearing: Option<f64>,
    pub vertical_rate: Option<VerticalRate>,
    pub freshness: Freshness,
}

impl Planes {
    /// Validity-qualified copy of every tracked plane.
    #[must_use]
    pub fn snapshot(&self, now: Instant) -> Vec<PlaneSnapshot> {
        self.iter()
            .map(|(icao, state)| PlaneSnapshot {
                icao: *icao,
                callsign: state.callsign.clone(),
                position: state.position.map(|p| Position {
                    latitude: p.latitude,
                    longitude: p.longitude,
                }),
                altitude: state.altitude,
                bearing: state.bearing,
                vertical_rate: state.vertical_rate.map(|v| v.rate),
                freshness: Freshness::classify(state, now),
            })
            .collect()
    }
}
