/*!
Compact Position Reporting

Airborne positions arrive as 17 bit latitude/longitude encodings in
alternating even and odd zone layouts. [`global_position`] recovers an
unambiguous position from one encoding of each parity; [`local_position`]
recovers it from a single encoding and a recent known position.

reference: ICAO 9871 (D.2.4.7)
!*/

use std::cmp;

use crate::CPRFormat;

const D_LAT_EVEN: f64 = 360.0 / 60.0;
const D_LAT_ODD: f64 = 360.0 / 59.0;

/// 2^17 (Max of 17 bits)
const CPR_MAX: f64 = 131_072.0;

/// Post-processing of CPR into Latitude/Longitude
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// One 17 bit encoding pair as transmitted: `yz` latitude, `xz` longitude.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct CprCode {
    pub yz: u32,
    pub xz: u32,
}

/// NL transition latitudes from table 1090-WP-9-14. Crossing the threshold
/// at index `i` drops the zone count from `59 - i` to `58 - i`.
#[rustfmt::skip]
static NL_TABLE: [f64; 58] = [
    10.470_471_30, 14.828_174_37, 18.186_263_57, 21.029_394_93,
    23.545_044_87, 25.829_247_07, 27.938_987_10, 29.911_356_86,
    31.772_097_08, 33.539_934_36, 35.228_995_98, 36.850_251_08,
    38.412_418_92, 39.922_566_84, 41.386_518_32, 42.809_140_12,
    44.194_549_51, 45.546_267_23, 46.867_332_52, 48.160_391_28,
    49.427_764_39, 50.671_501_66, 51.893_424_69, 53.095_161_53,
    54.278_174_72, 55.443_784_44, 56.593_187_56, 57.727_473_54,
    58.847_637_76, 59.954_592_77, 61.049_177_74, 62.132_166_59,
    63.204_274_79, 64.266_165_23, 65.318_453_10, 66.361_710_08,
    67.396_467_74, 68.423_220_22, 69.442_426_31, 70.454_510_75,
    71.459_864_73, 72.458_845_45, 73.451_774_42, 74.438_934_16,
    75.420_562_57, 76.396_843_91, 77.367_894_61, 78.333_740_83,
    79.294_282_25, 80.249_232_13, 81.198_013_49, 82.139_569_81,
    83.071_994_45, 83.991_735_63, 84.891_661_91, 85.755_416_21,
    86.535_369_98, 87.000_000_00,
];

/// Number of longitude zones at a latitude, in `1..=59`.
///
/// The table is symmetric about the equator.
#[must_use]
pub fn nl(lat: f64) -> u64 {
    let lat = libm::fabs(lat);
    let crossed = NL_TABLE.partition_point(|&threshold| lat >= threshold);
    59 - crossed as u64
}

/// `((x mod m) + m) mod m`, in `[0, m)` for positive `m`
#[must_use]
pub fn pmod(x: f64, m: f64) -> f64 {
    ((x % m) + m) % m
}

/// Fold the 180..360 half of the zone arithmetic into -180..0
fn wrap(deg: f64) -> f64 {
    if deg >= 180.0 {
        deg - 360.0
    } else {
        deg
    }
}

/// Globally unambiguous decode from one even and one odd encoding.
///
/// `fmt` selects which of the pair was received last; the result is that
/// frame's position. Returns None when the two encodings straddle a
/// longitude zone boundary.
///
/// reference: ICAO 9871 (D.2.4.7.7)
#[must_use]
pub fn global_position(even: CprCode, odd: CprCode, fmt: CPRFormat) -> Option<Position> {
    let yz_even = f64::from(even.yz) / CPR_MAX;
    let yz_odd = f64::from(odd.yz) / CPR_MAX;
    let xz_even = f64::from(even.xz) / CPR_MAX;
    let xz_odd = f64::from(odd.xz) / CPR_MAX;

    let j = libm::floor(59.0 * yz_even - 60.0 * yz_odd + 0.5);

    let lat_even = wrap(D_LAT_EVEN * (pmod(j, 60.0) + yz_even));
    let lat_odd = wrap(D_LAT_ODD * (pmod(j, 59.0) + yz_odd));

    if nl(lat_even) != nl(lat_odd) {
        return None;
    }
    let nl = nl(lat_even);

    let (lat, i, xz) = match fmt {
        CPRFormat::Even => (lat_even, 0, xz_even),
        CPRFormat::Odd => (lat_odd, 1, xz_odd),
    };

    let ni = cmp::max(nl - i, 1) as f64;
    let m = libm::floor(xz_even * (nl - 1) as f64 - xz_odd * nl as f64 + 0.5);
    let lon = wrap((360.0 / ni) * (pmod(m, ni) + xz));

    Some(Position {
        latitude: lat,
        longitude: lon,
    })
}

/// Locally unambiguous decode from a single encoding and a reference
/// position less than half a zone away.
///
/// Returns None when the result lands a degree of latitude or a sixth of a
/// longitude zone away from the reference, which means the reference was
/// not usable and the caller has to fall back to [`global_position`].
///
/// reference: ICAO 9871 (D.2.4.7.5)
#[must_use]
pub fn local_position(reference: Position, code: CprCode, fmt: CPRFormat) -> Option<Position> {
    let yz = f64::from(code.yz) / CPR_MAX;
    let xz = f64::from(code.xz) / CPR_MAX;
    let (d_lat, i) = match fmt {
        CPRFormat::Even => (D_LAT_EVEN, 0),
        CPRFormat::Odd => (D_LAT_ODD, 1),
    };

    let j = libm::floor(reference.latitude / d_lat)
        + libm::floor(0.5 + pmod(reference.latitude, d_lat) / d_lat - yz);
    let lat = wrap(d_lat * (j + yz));

    let ni = cmp::max(nl(lat) - i, 1) as f64;
    let d_lon = 360.0 / ni;
    let m = libm::floor(reference.longitude / d_lon)
        + libm::floor(0.5 + pmod(reference.longitude, d_lon) / d_lon - xz);
    let lon = wrap(d_lon * (m + xz));

    if libm::fabs(lat - reference.latitude) >= 1.0
        || libm::fabs(lon - reference.longitude) >= d_lon / 6.0
    {
        return None;
    }

    Some(Position {
        latitude: lat,
        longitude: lon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(value: f64, expected: f64) {
        assert!(
            (value - expected).abs() < 1e-9,
            "{value} not close to {expected}"
        );
    }

    #[test]
    fn nl_boundaries() {
        assert_eq!(nl(0.0), 59);
        assert_eq!(nl(10.0), 59);
        assert_eq!(nl(10.470_471_30), 58);
        assert_eq!(nl(51.5), 37);
        assert_eq!(nl(86.9), 2);
        assert_eq!(nl(87.0), 1);
        assert_eq!(nl(89.9), 1);
    }

    #[test]
    fn nl_symmetric() {
        for lat in [5.5, 21.5, 44.2, 51.5, 86.9, 89.9] {
            assert_eq!(nl(lat), nl(-lat));
        }
    }

    #[test]
    fn pmod_negative_operand() {
        assert_close(pmod(-6.0, 59.0), 53.0);
        assert_close(pmod(8.0, 60.0), 8.0);
    }

    #[test]
    fn global_decode() {
        let even = CprCode {
            yz: 93_000,
            xz: 51_372,
        };
        let odd = CprCode {
            yz: 74_158,
            xz: 50_194,
        };

        let position = global_position(even, odd, CPRFormat::Even).unwrap();
        assert_close(position.latitude, 52.257_202_148_437_5);
        assert_close(position.longitude, 3.919_372_558_593_75);
    }

    #[test]
    fn global_decode_negative_m() {
        // *8f7c0017581bb01b3e135e818c6f;
        let even = CprCode {
            yz: 3_487,
            xz: 4_958,
        };
        // *8f7c0017581bb481393da48aef5d;
        let odd = CprCode {
            yz: 16_540,
            xz: 81_316,
        };

        let position = global_position(even, odd, CPRFormat::Odd).unwrap();
        assert_close(position.latitude, -35.840_195_478_019_07);
        assert_close(position.longitude, 150.283_852_435_172_9);
    }

    #[test]
    fn global_rejects_zone_mismatch() {
        // even encodes 51.88, odd encodes 51.91: the pair straddles the
        // NL 37 -> 36 transition at 51.89342469
        let even = CprCode { yz: 84_760, xz: 0 };
        let odd = CprCode { yz: 66_515, xz: 0 };
        assert_eq!(global_position(even, odd, CPRFormat::Even), None);
    }

    #[test]
    fn local_decode_tracks_reference() {
        let reference = Position {
            latitude: 51.499_995_86,
            longitude: 0.0,
        };
        // encodes roughly (51.51, 0.01) in the even layout
        let code = CprCode { yz: 76_677, xz: 135 };

        let position = local_position(reference, code, CPRFormat::Even).unwrap();
        assert!((position.latitude - 51.51).abs() < 1e-4);
        assert!((position.longitude - 0.01).abs() < 1e-4);
    }

    #[test]
    fn local_rejects_distant_reference() {
        // nearest grid solution for this code sits ~1.5 degrees north of
        // the reference, past the deviation gate
        let reference = Position {
            latitude: 50.0,
            longitude: 0.0,
        };
        let code = CprCode { yz: 76_677, xz: 135 };
        assert_eq!(local_position(reference, code, CPRFormat::Even), None);
    }
}
