use assert_hex::assert_eq_hex;
use hexlit::hex;
use skywatch::adsb::{AirborneVelocitySubType, VerticalRate, ME};
use skywatch::{Frame, FrameError, ICAO};

#[test]
fn airborne_position_baro_altitude() {
    // from adsb-rs
    let bytes = hex!("8D40621D58C382D690C8AC2863A7");
    let frame = Frame::from_bytes(&bytes).unwrap();
    assert_eq_hex!(frame.icao.0, [0x40, 0x62, 0x1d]);
    if let ME::AirbornePositionBaroAltitude(me) = frame.me {
        assert_eq!(me.alt, Some(38000));
        assert_eq!(me.lat_cpr, 93000);
        assert_eq!(me.lon_cpr, 51372);
        assert_eq!(me.odd_flag, skywatch::CPRFormat::Even);
        return;
    }
    unreachable!();
}

#[test]
fn airborne_velocity_ground_speed() {
    // from adsb-rs
    let bytes = hex!("8da3d42599250129780484712c50");
    let frame = Frame::from_bytes(&bytes).unwrap();
    if let ME::AirborneVelocity(me) = frame.me {
        assert_eq!(me.st, 1);
        let bearing = me.bearing().unwrap();
        assert!((bearing - 322.197_2).abs() < 1e-3);
        assert_eq!(
            me.vertical_rate(),
            Some(VerticalRate {
                up: false,
                ft_min: 0
            })
        );
        return;
    }
    unreachable!();
}

#[test]
fn aircraft_identification() {
    // from dump1090: Ident N3550U, category A1
    let bytes = hex!("8da3f9cb213b3d75c1582080f4d9");
    let frame = Frame::from_bytes(&bytes).unwrap();
    assert_eq!(frame.icao, "a3f9cb".parse::<ICAO>().unwrap());
    if let ME::AircraftIdentification(id) = frame.me {
        assert_eq!(id.ca, 1);
        assert_eq!(id.cn, "N3550U  ");
        return;
    }
    unreachable!();
}

#[test]
fn parity_mismatch_rejected() {
    let mut bytes = hex!("8da3f9cb213b3d75c1582080f4d9");
    bytes[13] ^= 0x01;
    assert!(matches!(
        Frame::from_bytes(&bytes),
        Err(FrameError::Parity { .. })
    ));
}

#[test]
fn downlink_format_gate() {
    // DF4 surveillance altitude reply, never surfaced
    let mut bytes = [0_u8; 14];
    bytes[0] = 4 << 3;
    assert!(matches!(
        Frame::from_bytes(&bytes),
        Err(FrameError::Unsupported { df: 4, .. })
    ));

    // DF18 with CF=2 (TIS-B fine) is outside the accepted subset
    bytes[0] = 18 << 3 | 2;
    assert!(matches!(
        Frame::from_bytes(&bytes),
        Err(FrameError::Unsupported { df: 18, cf: 2 })
    ));

    // DF19 only accepts CF=0
    bytes[0] = 19 << 3 | 1;
    assert!(matches!(
        Frame::from_bytes(&bytes),
        Err(FrameError::Unsupported { df: 19, cf: 1 })
    ));
}

#[test]
fn velocity_reserved_subtype_decodes_nothing() {
    // subtype 7 parses but yields neither bearing nor vertical rate
    let mut bytes = [0_u8; 14];
    bytes[0] = 17 << 3 | 5;
    bytes[4] = 19 << 3 | 7;
    bytes[5] = 0x12;
    let [_, hi, mid, lo] = skywatch::crc::checksum(&bytes).to_be_bytes();
    bytes[11] = hi;
    bytes[12] = mid;
    bytes[13] = lo;

    let frame = Frame::from_bytes(&bytes).unwrap();
    if let ME::AirborneVelocity(me) = frame.me {
        assert!(matches!(me.sub_type, AirborneVelocitySubType::Reserved1(_)));
        assert_eq!(me.bearing(), None);
        assert_eq!(me.vertical_rate(), None);
        return;
    }
    unreachable!();
}

#[test]
fn zero_altitude_code_is_unavailable() {
    // TC=11 position frame with an all-zero altitude field
    let mut bytes = [0_u8; 14];
    bytes[0] = 17 << 3 | 5;
    bytes[1] = 0xab;
    bytes[2] = 0xcd;
    bytes[3] = 0xef;
    bytes[4] = 11 << 3;
    let [_, hi, mid, lo] = skywatch::crc::checksum(&bytes).to_be_bytes();
    bytes[11] = hi;
    bytes[12] = mid;
    bytes[13] = lo;

    let frame = Frame::from_bytes(&bytes).unwrap();
    if let ME::AirbornePositionBaroAltitude(me) = frame.me {
        assert_eq!(me.alt, None);
        return;
    }
    unreachable!();
}
