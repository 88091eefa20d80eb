//! Spherical geometry for observer-relative range and bearing

use skywatch::cpr::Position;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// Great-circle distance in metres (spherical law of cosines) and initial
/// bearing in degrees `[0, 360)` from `from` towards `to`.
#[must_use]
pub fn distance_bearing(from: &Position, to: &Position) -> (f64, f64) {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let d_lambda = (to.longitude - from.longitude).to_radians();

    let central = libm::sin(phi1) * libm::sin(phi2)
        + libm::cos(phi1) * libm::cos(phi2) * libm::cos(d_lambda);
    let distance = EARTH_RADIUS * libm::acos(central.clamp(-1.0, 1.0));

    let y = libm::sin(d_lambda) * libm::cos(phi2);
    let x = libm::cos(phi1) * libm::sin(phi2)
        - libm::sin(phi1) * libm::cos(phi2) * libm::cos(d_lambda);
    let bearing = libm::atan2(y, x).to_degrees();
    let bearing = if bearing < 0.0 { bearing + 360.0 } else { bearing };

    (distance, bearing)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONDON: Position = Position {
        latitude: 51.5074,
        longitude: -0.1278,
    };
    const PARIS: Position = Position {
        latitude: 48.8566,
        longitude: 2.3522,
    };

    #[test]
    fn london_to_paris() {
        let (distance, bearing) = distance_bearing(&LONDON, &PARIS);
        // ~344 km, heading south-east
        assert!((distance - 344_000.0).abs() < 2_000.0, "{distance}");
        assert!((bearing - 148.1).abs() < 1.0, "{bearing}");
    }

    #[test]
    fn coincident_points() {
        let (distance, _) = distance_bearing(&LONDON, &LONDON);
        assert!(distance.abs() < 1.0);
    }

    #[test]
    fn due_east_on_the_equator() {
        let from = Position {
            latitude: 0.0,
            longitude: 0.0,
        };
        let to = Position {
            latitude: 0.0,
            longitude: 1.0,
        };
        let (distance, bearing) = distance_bearing(&from, &to);
        assert!((bearing - 90.0).abs() < 1e-6);
        // one degree of arc
        assert!((distance - EARTH_RADIUS * 1.0_f64.to_radians()).abs() < 1.0);
    }

    #[test]
    fn bearing_stays_in_range() {
        let to = Position {
            latitude: 51.0,
            longitude: -10.0,
        };
        let (_, bearing) = distance_bearing(&LONDON, &to);
        assert!((0.0..360.0).contains(&bearing));
        assert!(bearing > 180.0, "westbound heading expected, got {bearing}");
    }
}
