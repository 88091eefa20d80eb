/*!
`skywatch` decodes the ADS-B subset of the Mode S downlink used for aircraft
surveillance, by way of the [`deku`] declarative bit parser.

A [`Frame`] is built from a raw 14 byte extended squitter. Acceptance is
gated on the downlink format and the CRC-24 parity before any field is
decoded:

|  DF  |  Name                             | Accepted        |
| ---- | --------------------------------- | --------------- |
| 17   | Extended Squitter (ADS-B)         | any CF          |
| 18   | Extended Squitter (TIS-B)         | CF & 6 == 0     |
| 19   | Extended Squitter (Military)      | CF == 0         |

Everything else on the air is rejected with [`FrameError::Unsupported`].

Of the decoded ME types, identification (1..=4), airborne position with
barometric altitude (9..=18) and airborne velocity (19) carry surveillance
data; the rest parse to tag-only variants.

[`deku`]: https://github.com/sharksforarms/deku
*/

use std::fmt;
use std::str::FromStr;

use deku::bitvec::{BitSlice, Msb0};
use deku::prelude::*;

pub mod adsb;
pub mod cpr;
pub mod crc;

use adsb::ME;

/// Length in bytes of a Mode S extended squitter.
pub const FRAME_BYTES: usize = 14;

/// Characters in an aircraft identification.
const CALLSIGN_LEN: usize = 8;

/// ICAO Address; Mode S transponder code
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone)]
pub struct ICAO(pub [u8; 3]);

impl ICAO {
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        u32::from(self.0[0]) << 16 | u32::from(self.0[1]) << 8 | u32::from(self.0[2])
    }
}

impl fmt::Display for ICAO {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2])
    }
}

impl FromStr for ICAO {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let num = u32::from_str_radix(s, 16)?;
        let bytes = num.to_be_bytes();
        Ok(Self([bytes[1], bytes[2], bytes[3]]))
    }
}

/// Even / Odd
#[derive(Debug, PartialEq, Eq, DekuRead, Copy, Clone)]
#[deku(type = "u8", bits = "1")]
pub enum CPRFormat {
    Even = 0,
    Odd = 1,
}

impl Default for CPRFormat {
    fn default() -> Self {
        Self::Even
    }
}

impl fmt::Display for CPRFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Even => "even",
                Self::Odd => "odd",
            }
        )
    }
}

/// Positive / Negative
#[derive(Debug, PartialEq, Eq, DekuRead, Copy, Clone)]
#[deku(type = "u8", bits = "1")]
pub enum Sign {
    Positive = 0,
    Negative = 1,
}

impl Sign {
    #[must_use]
    pub fn value(&self) -> i32 {
        match self {
            Self::Positive => 1,
            Self::Negative => -1,
        }
    }
}

/// Why a raw frame was not turned into a [`Frame`]
#[derive(Debug, PartialEq)]
pub enum FrameError {
    /// Downlink format / control field combination outside the ADS-B subset
    Unsupported { df: u8, cf: u8 },
    /// Computed remainder does not match the transmitted parity
    Parity { computed: u32, transmitted: u32 },
    /// ME field failed to parse
    Deku(DekuError),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { df, cf } => write!(f, "unsupported frame: DF{df}/CF{cf}"),
            Self::Parity {
                computed,
                transmitted,
            } => write!(f, "parity mismatch: computed {computed:06x}, transmitted {transmitted:06x}"),
            Self::Deku(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for FrameError {}

impl From<DekuError> for FrameError {
    fn from(e: DekuError) -> Self {
        Self::Deku(e)
    }
}

/// One accepted extended squitter
#[derive(Debug, PartialEq, Clone)]
pub struct Frame {
    /// ICAO aircraft address
    pub icao: ICAO,
    /// Message, extended squitter
    pub me: ME,
}

impl Frame {
    /// Gate a raw 14 byte frame on downlink format and parity, then decode
    /// the ME field.
    pub fn from_bytes(buf: &[u8; FRAME_BYTES]) -> Result<Self, FrameError> {
        let df = buf[0] >> 3;
        let cf = buf[0] & 0x07;
        let accepted = match df {
            17 => true,
            18 => cf & 0x06 == 0,
            19 => cf == 0,
            _ => false,
        };
        if !accepted {
            return Err(FrameError::Unsupported { df, cf });
        }

        let computed = crc::checksum(buf);
        let transmitted = crc::parity(buf);
        if computed != transmitted {
            return Err(FrameError::Parity {
                computed,
                transmitted,
            });
        }

        let icao = ICAO([buf[1], buf[2], buf[3]]);
        let me = ME::from_bytes(&buf[4..11])?;
        Ok(Self { icao, me })
    }
}

const CHAR_LOOKUP: &[u8; 64] =
    b" ABCDEFGHIJKLMNOPQRSTUVWXYZ                     0123456789      ";

/// Eight 6 bit characters through [`CHAR_LOOKUP`], padding included.
pub(crate) fn callsign_read(
    rest: &BitSlice<Msb0, u8>,
) -> Result<(&BitSlice<Msb0, u8>, String), DekuError> {
    let mut inside_rest = rest;
    let mut cn = String::with_capacity(CALLSIGN_LEN);
    for _ in 0..CALLSIGN_LEN {
        let (for_rest, c) = u8::read(inside_rest, deku::ctx::Size::Bits(6))?;
        cn.push(char::from(CHAR_LOOKUP[c as usize]));
        inside_rest = for_rest;
    }
    Ok((inside_rest, cn))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icao_formatting() {
        let icao = ICAO([0xa3, 0xf9, 0xcb]);
        assert_eq!(format!("{icao}"), "a3f9cb");
        assert_eq!(icao.as_u32(), 0x00a3_f9cb);
        assert_eq!("a3f9cb".parse::<ICAO>().unwrap(), icao);
    }

    #[test]
    fn char_lookup_covers_every_code() {
        assert_eq!(CHAR_LOOKUP[0], b' ');
        assert_eq!(CHAR_LOOKUP[1], b'A');
        assert_eq!(CHAR_LOOKUP[26], b'Z');
        assert_eq!(CHAR_LOOKUP[48], b'0');
        assert_eq!(CHAR_LOOKUP[57], b'9');
        for i in [27, 32, 47, 58, 63] {
            assert_eq!(CHAR_LOOKUP[i], b' ');
        }
    }
}
