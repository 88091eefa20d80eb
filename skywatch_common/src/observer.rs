//! Observer (receiver antenna) position
//!
//! Fed by an external location source, read by the display for
//! plane-relative range and bearing. The last known position can be
//! persisted as a small hint file so a restart has something to center on
//! before the location source reports in.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use skywatch::cpr::Position;
use tracing::debug;

/// Latitude/longitude at or beyond this magnitude means "nothing stored".
const ABSENT: f32 = 400.0;

/// Stored as two 32 bit floats keyed `lat` and `lon`.
#[derive(Debug, Serialize, Deserialize)]
struct Hint {
    lat: f32,
    lon: f32,
}

/// Shared current observer position. Writers set it, readers copy it out;
/// nobody holds the lock beyond the access.
#[derive(Debug, Default)]
pub struct Observer {
    position: Mutex<Option<Position>>,
}

impl Observer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, latitude: f64, longitude: f64) {
        let mut guard = self.position.lock().unwrap();
        *guard = Some(Position {
            latitude,
            longitude,
        });
    }

    /// Copy of the current position, if one has been supplied.
    #[must_use]
    pub fn get(&self) -> Option<Position> {
        *self.position.lock().unwrap()
    }

    /// Seed from a hint file written by [`save`](Self::save). A missing or
    /// unreadable file and the out-of-range sentinel both mean "unknown".
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let observer = Self::new();
        let Ok(contents) = fs::read_to_string(path) else {
            return observer;
        };
        match serde_json::from_str::<Hint>(&contents) {
            Ok(hint) if hint.lat.abs() < ABSENT && hint.lon.abs() < ABSENT => {
                debug!("observer position hint: ({}, {})", hint.lat, hint.lon);
                observer.set(f64::from(hint.lat), f64::from(hint.lon));
            }
            Ok(_) => {}
            Err(e) => debug!("ignoring malformed position hint: {e}"),
        }
        observer
    }

    /// Persist the current position for the next run.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let hint = match self.get() {
            Some(position) => Hint {
                lat: position.latitude as f32,
                lon: position.longitude as f32,
            },
            None => Hint {
                lat: ABSENT,
                lon: ABSENT,
            },
        };
        fs::write(path, serde_json::to_string(&hint)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_round_trip() {
        let observer = Observer::new();
        assert_eq!(observer.get(), None);
        observer.set(51.5, -0.12);
        let position = observer.get().unwrap();
        assert!((position.latitude - 51.5).abs() < f64::EPSILON);
        assert!((position.longitude + 0.12).abs() < f64::EPSILON);
    }

    #[test]
    fn hint_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("position.json");

        let observer = Observer::new();
        observer.set(48.8566, 2.3522);
        observer.save(&path).unwrap();

        let restored = Observer::load(&path);
        let position = restored.get().unwrap();
        assert!((position.latitude - 48.8566).abs() < 1e-4);
        assert!((position.longitude - 2.3522).abs() < 1e-4);
    }

    #[test]
    fn sentinel_means_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("position.json");

        Observer::new().save(&path).unwrap();
        assert_eq!(Observer::load(&path).get(), None);
    }

    #[test]
    fn missing_file_means_absent() {
        assert_eq!(Observer::load(Path::new("/nonexistent/hint")).get(), None);
    }
}
