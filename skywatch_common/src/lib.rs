/*!
`skywatch_common` is the aircraft state engine behind the `skywatch` apps:
the live database of currently visible planes, the receiver-side plumbing
that fills it (framing parser, message FIFO, driver runtime) and the decode
thread that drains it ([`manager`]).

Raw bytes flow transport -> [`driver`] -> [`framing`] -> [`fifo`] ->
[`manager`] -> [`Planes`], and a display reads [`Planes::snapshot`].
*/

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use skywatch::adsb::{
    AirbornePosition, AirborneVelocity, Identification, VerticalRate, ME,
};
use skywatch::cpr::{self, CprCode, Position};
use skywatch::{Frame, ICAO};
use tracing::{debug, info, warn};

pub mod driver;
pub mod fifo;
pub mod framing;
pub mod geo;
pub mod manager;
pub mod observer;
pub mod view;

/// Drop a plane not heard from in this long.
pub const PLANE_TIMEOUT: Duration = Duration::from_secs(60);

/// CPR pairing and local-decode reference window.
const CPR_WINDOW: Duration = Duration::from_secs(15);

/// Live database of visible aircraft, keyed by ICAO address.
///
/// All mutation happens on the manager thread; viewers read under the
/// database mutex owned by [`manager::Manager`].
#[derive(Debug, Default, Clone)]
pub struct Planes {
    planes: BTreeMap<ICAO, PlaneState>,
    messages: u64,
}

impl fmt::Display for Planes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, state) in self.iter() {
            writeln!(f, "{key}: {state:?}")?;
        }
        Ok(())
    }
}

/// public
impl Planes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tuple `iter()` of all `(ICAO, PlaneState)`
    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, ICAO, PlaneState> {
        self.planes.iter()
    }

    /// From `ICAO`, get `PlaneState`
    pub fn get(&self, key: ICAO) -> Option<&PlaneState> {
        self.planes.get(&key)
    }

    /// Amount of currently tracked planes
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// Total CRC-valid messages decoded since startup (or resume).
    pub fn message_count(&self) -> u64 {
        self.messages
    }

    /// Update the database from one accepted frame.
    pub fn action(&mut self, frame: &Frame, now: Instant) {
        match &frame.me {
            ME::AircraftIdentification(id) => self.add_identification(frame.icao, id, now),
            ME::AirbornePositionBaroAltitude(ap) => {
                self.add_airborne_position(frame.icao, ap, now);
            }
            ME::AirborneVelocity(vel) => self.add_airborne_velocity(frame.icao, vel, now),
            ME::AirbornePositionGnssAltitude => {
                debug!("[{}] GNSS altitude position ignored", frame.icao);
            }
            ME::SurfacePosition | ME::NoPosition | ME::Unsupported(_) => {}
        }
        self.seen(frame.icao, now);
    }

    /// Remove planes not seen for [`PLANE_TIMEOUT`].
    pub fn prune(&mut self, now: Instant) {
        self.planes.retain(|icao, state| {
            if now.duration_since(state.last_seen) <= PLANE_TIMEOUT {
                true
            } else {
                info!("[{icao}] inactive, removing");
                false
            }
        });
    }
}

/// private
impl Planes {
    fn entry(&mut self, icao: ICAO, now: Instant) -> &mut PlaneState {
        self.planes
            .entry(icao)
            .or_insert_with(|| PlaneState::new(now))
    }

    /// Every CRC-valid frame counts, whatever its ME carried.
    fn seen(&mut self, icao: ICAO, now: Instant) {
        let state = self.entry(icao, now);
        state.num_messages += 1;
        state.last_seen = now;
        self.messages += 1;
    }

    /// update from `ME::AircraftIdentification`
    fn add_identification(&mut self, icao: ICAO, id: &Identification, now: Instant) {
        let state = self.entry(icao, now);
        if state.callsign.as_deref() != Some(id.cn.as_str()) {
            info!("[{icao}] identification: {}", id.cn);
            state.callsign = Some(id.cn.clone());
        }
    }

    /// update from `ME::AirbornePositionBaroAltitude`
    fn add_airborne_position(&mut self, icao: ICAO, ap: &AirbornePosition, now: Instant) {
        let state = self.entry(icao, now);

        if let Some(alt) = ap.alt {
            state.altitude = Some(alt);
        }

        let code = CprCode {
            yz: ap.lat_cpr,
            xz: ap.lon_cpr,
        };
        state.cpr[ap.odd_flag as usize] = Some(CprFix { code, time: now });
        state.update_position(icao, ap.odd_flag, now);
    }

    /// update from `ME::AirborneVelocity`
    fn add_airborne_velocity(&mut self, icao: ICAO, vel: &AirborneVelocity, now: Instant) {
        let state = self.entry(icao, now);
        if let Some(bearing) = vel.bearing() {
            debug!("[{icao}] bearing: {bearing:.1}");
            state.bearing = Some(bearing);
        }
        if let Some(rate) = vel.vertical_rate() {
            state.vertical_rate = Some(VerticalRateFix { rate, time: now });
        }
    }
}

/// Value in the map of [`Planes`]
#[derive(Debug, Clone)]
pub struct PlaneState {
    /// 8 character identification, padding included
    pub callsign: Option<String>,
    pub position: Option<PlanePosition>,
    /// Last received CPR encodings, indexed even/odd
    pub cpr: [Option<CprFix>; 2],
    /// Barometric altitude in feet
    pub altitude: Option<i32>,
    pub vertical_rate: Option<VerticalRateFix>,
    /// Track over ground, degrees in [0, 360)
    pub bearing: Option<f64>,
    pub num_messages: u64,
    /// Time of the most recent CRC-valid frame
    pub last_seen: Instant,
}

impl PlaneState {
    fn new(now: Instant) -> Self {
        Self {
            callsign: None,
            position: None,
            cpr: [None, None],
            altitude: None,
            vertical_rate: None,
            bearing: None,
            num_messages: 0,
            last_seen: now,
        }
    }

    /// Try to turn the stored CPR encodings into a position, preferring the
    /// locally unambiguous decode when a fresh reference exists.
    ///
    /// A local decode past the deviation gate suppresses the update and
    /// drops `local_ok`, so the next frame goes through the global pair
    /// again.
    fn update_position(&mut self, icao: ICAO, fmt: skywatch::CPRFormat, now: Instant) {
        let Some(fix) = self.cpr[fmt as usize] else {
            return;
        };

        if let Some(pos) = &mut self.position {
            if pos.local_ok {
                if now.duration_since(pos.time) < CPR_WINDOW {
                    let reference = Position {
                        latitude: pos.latitude,
                        longitude: pos.longitude,
                    };
                    match cpr::local_position(reference, fix.code, fmt) {
                        Some(new) => {
                            *pos = PlanePosition {
                                latitude: new.latitude,
                                longitude: new.longitude,
                                surface: false,
                                time: now,
                                local_ok: true,
                            };
                        }
                        None => {
                            warn!("[{icao}] position deviates from local reference, dropped");
                            pos.local_ok = false;
                        }
                    }
                    return;
                }
                pos.local_ok = false;
            }
        }

        let (Some(even), Some(odd)) = (self.cpr[0], self.cpr[1]) else {
            return;
        };
        let age_gap = even.time.max(odd.time) - even.time.min(odd.time);
        if age_gap >= CPR_WINDOW {
            return;
        }
        if let Some(new) = cpr::global_position(even.code, odd.code, fmt) {
            debug!("[{icao}] global position: {new:?}");
            self.position = Some(PlanePosition {
                latitude: new.latitude,
                longitude: new.longitude,
                surface: false,
                time: now,
                local_ok: true,
            });
        }
    }
}

/// Decoded position of one plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanePosition {
    /// degrees in [-90, 90]
    pub latitude: f64,
    /// degrees in [-180, 180]
    pub longitude: f64,
    /// always false here: surface position decoding is out of scope
    pub surface: bool,
    /// time of the frame that produced this position
    pub time: Instant,
    /// eligible as a reference for the locally unambiguous decode
    pub local_ok: bool,
}

/// One stored CPR encoding with its arrival time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CprFix {
    pub code: CprCode,
    pub time: Instant,
}

/// Vertical rate with its arrival time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerticalRateFix {
    pub rate: VerticalRate,
    pub time: Instant,
}
