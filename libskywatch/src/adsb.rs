//! Field decoders for the surveillance-relevant ME types
//!
//! Each payload struct spells out the full 56 bit ME layout, starting with
//! the 5 bit type code, so [`ME::from_bytes`] can dispatch on the type code
//! without the structs and the dispatcher disagreeing about alignment.

use std::fmt;

use deku::bitvec::{BitSlice, Msb0};
use deku::prelude::*;

use crate::{callsign_read, CPRFormat, Sign};

/// ADS-B Message, the first 5 bits are the Type Code (TC)
///
/// reference: ICAO 9871 (A.2.3.1)
#[derive(Debug, PartialEq, Clone)]
pub enum ME {
    AircraftIdentification(Identification),
    AirbornePositionBaroAltitude(AirbornePosition),
    AirborneVelocity(AirborneVelocity),
    /// TC 20..=22, not decoded
    AirbornePositionGnssAltitude,
    /// TC 5..=8, not decoded
    SurfacePosition,
    NoPosition,
    Unsupported(u8),
}

impl ME {
    /// Decode a 7 byte ME field by its type code.
    pub fn from_bytes(me: &[u8]) -> Result<Self, DekuError> {
        let tc = me.first().map_or(0, |b| b >> 3);
        Ok(match tc {
            1..=4 => Self::AircraftIdentification(Identification::from_bytes((me, 0))?.1),
            5..=8 => Self::SurfacePosition,
            9..=18 => Self::AirbornePositionBaroAltitude(AirbornePosition::from_bytes((me, 0))?.1),
            19 => Self::AirborneVelocity(AirborneVelocity::from_bytes((me, 0))?.1),
            20..=22 => Self::AirbornePositionGnssAltitude,
            0 => Self::NoPosition,
            _ => Self::Unsupported(tc),
        })
    }
}

/// [`ME::AircraftIdentification`]
///
/// Table: A-2-8
#[derive(Debug, PartialEq, Eq, DekuRead, Clone)]
pub struct Identification {
    pub tc: TypeCoding,

    #[deku(bits = "3")]
    pub ca: u8,

    /// Callsign / tail number, always 8 characters
    #[deku(reader = "callsign_read(deku::rest)")]
    pub cn: String,
}

#[derive(Debug, PartialEq, Eq, DekuRead, Copy, Clone)]
#[deku(type = "u8", bits = "5")]
pub enum TypeCoding {
    D = 1,
    C = 2,
    B = 3,
    A = 4,
}

impl fmt::Display for TypeCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::D => "D",
                Self::C => "C",
                Self::B => "B",
                Self::A => "A",
            }
        )
    }
}

/// [`ME::AirbornePositionBaroAltitude`]
///
/// Barometric altitude and one CPR encoding of the position
#[derive(Debug, PartialEq, Eq, DekuRead, Default, Copy, Clone)]
pub struct AirbornePosition {
    #[deku(bits = "5")]
    pub tc: u8,
    pub ss: SurveillanceStatus,
    #[deku(bits = "1")]
    pub saf: u8,
    /// Altitude in feet, None when the 12 bit code is zero or not
    /// Q-bit encoded
    #[deku(reader = "Self::read_altitude(deku::rest)")]
    pub alt: Option<i32>,
    /// UTC sync or not
    #[deku(bits = "1")]
    pub t: bool,
    /// Odd or even
    pub odd_flag: CPRFormat,
    #[deku(bits = "17", endian = "big")]
    pub lat_cpr: u32,
    #[deku(bits = "17", endian = "big")]
    pub lon_cpr: u32,
}

impl AirbornePosition {
    /// 12 bit altitude code: zero means unavailable, a clear Q-bit selects
    /// the 100 ft Gillham encoding which is not supported here. Otherwise
    /// the code counts 25 ft steps from -1000 ft.
    fn read_altitude(
        rest: &BitSlice<Msb0, u8>,
    ) -> Result<(&BitSlice<Msb0, u8>, Option<i32>), DekuError> {
        let (rest, num) = u32::read(rest, (deku::ctx::Endian::Big, deku::ctx::Size::Bits(12)))?;

        if num == 0 || num & 0x10 == 0 {
            return Ok((rest, None));
        }

        let code = ((num & 0x0fe0) >> 1) | (num & 0x000f);
        Ok((rest, Some(code as i32 * 25 - 1000)))
    }
}

/// Climb or descend rate, decoded from [`ME::AirborneVelocity`]
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct VerticalRate {
    /// true when climbing
    pub up: bool,
    /// magnitude in feet per minute
    pub ft_min: u16,
}

/// [`ME::AirborneVelocity`]
#[derive(Debug, PartialEq, Eq, DekuRead, Clone)]
pub struct AirborneVelocity {
    #[deku(bits = "5")]
    pub tc: u8,
    #[deku(bits = "3")]
    pub st: u8,
    #[deku(bits = "5")]
    pub nac_v: u8,
    #[deku(ctx = "*st")]
    pub sub_type: AirborneVelocitySubType,
    pub vrate_src: VerticalRateSource,
    pub vrate_sign: Sign,
    #[deku(endian = "big", bits = "9")]
    pub vrate_value: u16,
    #[deku(bits = "2")]
    pub reserved: u8,
    pub gnss_sign: Sign,
    #[deku(bits = "7")]
    pub gnss_baro_diff: u16,
}

impl AirborneVelocity {
    /// Track over ground in degrees clockwise from north, from the subtype
    /// 1 velocity components.
    #[must_use]
    pub fn bearing(&self) -> Option<f64> {
        if self.st != 1 {
            return None;
        }
        match &self.sub_type {
            AirborneVelocitySubType::GroundSpeed(gs) => gs.bearing(),
            _ => None,
        }
    }

    /// Vertical rate for subtypes 1..=4. A zero magnitude code means not
    /// available.
    #[must_use]
    pub fn vertical_rate(&self) -> Option<VerticalRate> {
        if !matches!(
            self.sub_type,
            AirborneVelocitySubType::GroundSpeed(_) | AirborneVelocitySubType::Airspeed(_)
        ) {
            return None;
        }
        if self.vrate_value == 0 {
            return None;
        }
        Some(VerticalRate {
            up: self.vrate_sign == Sign::Positive,
            ft_min: (self.vrate_value - 1) * 64,
        })
    }
}

/// Airborne Velocity Message "Subtype" Code Field Encoding
#[derive(Debug, PartialEq, Eq, DekuRead, Clone)]
#[deku(ctx = "st: u8", id = "st")]
pub enum AirborneVelocitySubType {
    #[deku(id = "0")]
    Reserved0(#[deku(bits = "22")] u32),

    #[deku(id_pat = "1..=2")]
    GroundSpeed(GroundSpeed),

    #[deku(id_pat = "3..=4")]
    Airspeed(AirspeedDecoding),

    #[deku(id_pat = "5..=7")]
    Reserved1(#[deku(bits = "22")] u32),
}

/// [`AirborneVelocitySubType::GroundSpeed`]
#[derive(Debug, PartialEq, Eq, DekuRead, Copy, Clone)]
pub struct GroundSpeed {
    pub ew_sign: Sign,
    #[deku(endian = "big", bits = "10")]
    pub ew_vel: u16,
    pub ns_sign: Sign,
    #[deku(endian = "big", bits = "10")]
    pub ns_vel: u16,
}

impl GroundSpeed {
    /// Both magnitude codes must be non-zero, zero means not available.
    #[must_use]
    pub fn bearing(&self) -> Option<f64> {
        if self.ew_vel == 0 || self.ns_vel == 0 {
            return None;
        }
        let v_ew = f64::from((i32::from(self.ew_vel) - 1) * self.ew_sign.value());
        let v_ns = f64::from((i32::from(self.ns_vel) - 1) * self.ns_sign.value());
        let h = libm::atan2(v_ew, v_ns) * (360.0 / (2.0 * std::f64::consts::PI));
        Some(if h < 0.0 { h + 360.0 } else { h })
    }
}

/// [`AirborneVelocitySubType::Airspeed`]
#[derive(Debug, PartialEq, Eq, DekuRead, Copy, Clone)]
pub struct AirspeedDecoding {
    #[deku(bits = "1")]
    pub status_heading: u8,
    #[deku(endian = "big", bits = "10")]
    pub mag_heading: u16,
    #[deku(bits = "1")]
    pub airspeed_type: u8,
    #[deku(endian = "big", bits = "10")]
    pub airspeed: u16,
}

#[derive(Debug, PartialEq, Eq, DekuRead, Copy, Clone)]
#[deku(type = "u8", bits = "1")]
pub enum VerticalRateSource {
    BarometricPressureAltitude = 0,
    GeometricAltitude = 1,
}

/// SPI Condition
#[derive(Debug, PartialEq, Eq, DekuRead, Copy, Clone)]
#[deku(type = "u8", bits = "2")]
pub enum SurveillanceStatus {
    NoCondition = 0,
    PermanentAlert = 1,
    TemporaryAlert = 2,
    SPICondition = 3,
}

impl Default for SurveillanceStatus {
    fn default() -> Self {
        Self::NoCondition
    }
}
