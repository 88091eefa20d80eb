//! ASCII framing for the receiver byte stream
//!
//! Frames arrive as `*<hex nibbles>;` with anything at all allowed in
//! between. 28 nibbles make an extended squitter, which is published to the
//! FIFO when its downlink format can carry ADS-B; 14 nibbles make a
//! standard squitter, which is acknowledged and discarded. The nibble
//! alphabet is strictly `0-9A-F`.

use tracing::warn;

use skywatch::FRAME_BYTES;

use crate::fifo::Producer;

const EXTENDED_NIBBLES: usize = 2 * FRAME_BYTES;
const STANDARD_NIBBLES: usize = FRAME_BYTES;

/// Byte-at-a-time parser assembling frames directly into FIFO slots.
///
/// The producer's uncommitted write slot doubles as the assembly buffer:
/// a discarded frame simply overwrites it, only a published frame advances
/// the ring.
pub struct FrameParser {
    fifo: Producer,
    /// Next nibble to fill, None while between frames.
    index: Option<usize>,
}

impl FrameParser {
    #[must_use]
    pub fn new(fifo: Producer) -> Self {
        Self { fifo, index: None }
    }

    pub fn feed(&mut self, byte: u8) {
        match byte {
            b'*' => self.start(),
            b';' => self.end(),
            _ => self.nibble(byte),
        }
    }

    fn start(&mut self) {
        if self.index.is_some() {
            // restart mid-frame, the slot is reused
            self.index = Some(0);
            return;
        }
        if self.fifo.write_slot().is_none() {
            warn!("message fifo full, dropping frame");
            return;
        }
        self.index = Some(0);
    }

    fn end(&mut self) {
        match self.index.take() {
            // stray terminator between frames
            None => {}
            Some(EXTENDED_NIBBLES) => {
                let eligible = self
                    .fifo
                    .write_slot()
                    .map_or(false, |slot| matches!(slot[0] >> 3, 17..=19));
                if eligible {
                    self.fifo.commit();
                }
                // other downlink formats leave the slot for the next frame
            }
            // standard squitter, not eligible for ADS-B
            Some(STANDARD_NIBBLES) => {}
            Some(n) => warn!("unexpected frame end after {n} nibbles"),
        }
    }

    fn nibble(&mut self, byte: u8) {
        let Some(index) = self.index else {
            return;
        };
        if index >= EXTENDED_NIBBLES {
            warn!("frame exceeds {EXTENDED_NIBBLES} nibbles, dropping");
            self.index = None;
            return;
        }
        let value = match byte {
            b'0'..=b'9' => byte - b'0',
            b'A'..=b'F' => byte - b'A' + 10,
            _ => {
                warn!("bad nibble {:#04x}, dropping frame", byte);
                self.index = None;
                return;
            }
        };
        let Some(slot) = self.fifo.write_slot() else {
            self.index = None;
            return;
        };
        if index % 2 == 0 {
            slot[index / 2] = value << 4;
        } else {
            slot[index / 2] |= value;
        }
        self.index = Some(index + 1);
    }
}

#[cfg(test)]
mod tests {
    use hexlit::hex;

    use super::*;
    use crate::fifo::{self, Consumer};

    fn parser(capacity: usize) -> (FrameParser, Consumer) {
        let (producer, consumer) = fifo::channel(capacity);
        (FrameParser::new(producer), consumer)
    }

    fn feed(parser: &mut FrameParser, bytes: &[u8]) {
        for &byte in bytes {
            parser.feed(byte);
        }
    }

    #[test]
    fn extended_squitter_published() {
        let (mut parser, mut consumer) = parser(4);
        feed(&mut parser, b"*8D4840D6202CC371C32CE0576098;");
        assert_eq!(
            consumer.pop(),
            Some(hex!("8D4840D6202CC371C32CE0576098"))
        );
        assert!(consumer.pop().is_none());
    }

    #[test]
    fn ascii_round_trip() {
        let frame = hex!("8D40621D58C382D690C8AC2863A7");
        let mut line = String::from("*");
        for byte in frame {
            line.push_str(&format!("{byte:02X}"));
        }
        line.push(';');

        let (mut parser, mut consumer) = parser(4);
        feed(&mut parser, line.as_bytes());
        assert_eq!(consumer.pop(), Some(frame));
    }

    #[test]
    fn standard_squitter_discarded() {
        let (mut parser, mut consumer) = parser(4);
        feed(&mut parser, b"*02E197B00179C3;");
        assert!(consumer.pop().is_none());
        // the slot is still usable afterwards
        feed(&mut parser, b"*8D4840D6202CC371C32CE0576098;");
        assert!(consumer.pop().is_some());
    }

    #[test]
    fn non_adsb_downlink_format_retained() {
        // DF=11 all call reply, 28 nibbles, never published
        let (mut parser, mut consumer) = parser(4);
        feed(&mut parser, b"*5D4840D6202CC371C32CE0576098;");
        assert!(consumer.pop().is_none());
    }

    #[test]
    fn junk_between_frames_ignored() {
        let (mut parser, mut consumer) = parser(4);
        feed(&mut parser, b"\r\nnoise;;**garbage\x00\xff");
        feed(&mut parser, b"*8D4840D6202CC371C32CE0576098;");
        feed(&mut parser, b"more ;junk*");
        assert_eq!(
            consumer.pop(),
            Some(hex!("8D4840D6202CC371C32CE0576098"))
        );
        assert!(consumer.pop().is_none());
    }

    #[test]
    fn lowercase_hex_rejected() {
        let (mut parser, mut consumer) = parser(4);
        feed(&mut parser, b"*8d4840d6202cc371c32ce0576098;");
        assert!(consumer.pop().is_none());
    }

    #[test]
    fn restart_resets_assembly() {
        let (mut parser, mut consumer) = parser(4);
        feed(&mut parser, b"*8D4840*8D4840D6202CC371C32CE0576098;");
        assert_eq!(
            consumer.pop(),
            Some(hex!("8D4840D6202CC371C32CE0576098"))
        );
    }

    #[test]
    fn odd_length_frame_dropped() {
        let (mut parser, mut consumer) = parser(4);
        feed(&mut parser, b"*8D4840D6202;");
        assert!(consumer.pop().is_none());
    }

    #[test]
    fn oversized_frame_dropped() {
        let (mut parser, mut consumer) = parser(4);
        feed(&mut parser, b"*8D4840D6202CC371C32CE0576098AA;");
        assert!(consumer.pop().is_none());
    }

    #[test]
    fn full_fifo_drops_frame_until_drained() {
        let (mut parser, mut consumer) = parser(1);
        feed(&mut parser, b"*8D4840D6202CC371C32CE0576098;");
        // ring full: this start is refused and the whole frame is lost
        feed(&mut parser, b"*8D40621D58C382D690C8AC2863A7;");
        assert_eq!(
            consumer.pop(),
            Some(hex!("8D4840D6202CC371C32CE0576098"))
        );
        assert!(consumer.pop().is_none());
        // with a slot free again the next frame goes through
        feed(&mut parser, b"*8D40621D58C382D690C8AC2863A7;");
        assert_eq!(
            consumer.pop(),
            Some(hex!("8D40621D58C382D690C8AC2863A7"))
        );
    }
}