//! EM4100/EM4102 decoding.
//!
//! EM4100 tags repeat a 64-bit Manchester-encoded frame: a header of nine
//! 1-bits, ten 5-bit groups of four data bits plus an even row-parity bit,
//! and a final group of four column-parity bits plus a stop bit. The forty
//! data bits carry a customer ("user") byte and a 32-bit tag number.
//!
//! On the wire, a bit occupies two half-bit cells with a transition in the
//! middle; the level after the mid-bit transition is the bit value. A LONG
//! pulse (one full bit time) always ends on a mid-bit transition and carries
//! the new level as the bit; two SHORT pulses (half a bit time each) span
//! boundary and mid-bit transitions, and the level at the second SHORT is
//! the bit. A LONG therefore resets the SHORT pairing.

use std::fmt;

use crate::hal::Level;
use crate::pulse::{classify, Protocol, PulseClass};
use crate::state::{DecodeShared, DecodeStatus, EdgeDecoder, FRAME_BUF_LEN};

/// Header length: nine consecutive 1-bits.
const HEADER_ONES: u8 = 9;

/// Ten data rows followed by the column-parity group.
const DATA_ROWS: usize = 10;

/// All eleven per-group failure bits set; each passing check clears one.
const PARITY_FAIL_ALL: u16 = 0x07FF;

/// Interrupt-driven EM4100 frame decoder.
///
/// Owned by the armed edge handler; communicates with the session only
/// through [`DecodeShared`].
pub(crate) struct Em4100Decoder {
    last_edge_us: u32,
    /// At least one LONG pulse has been seen since (re)arming. SHORT pulses
    /// before that are startup noise and are not paired.
    long_seen: bool,
    /// The next SHORT pulse is the second half of a bit.
    await_second_short: bool,
    one_counter: u8,
    row_parity: u8,
    /// One failure bit per 5-bit group; bit 10 is the column check.
    parity_fail: u16,
    byte_idx: usize,
    /// Bit position within the current group, counting 4 down to 0; bit 0
    /// of each stored group is its parity bit.
    bit_idx: u8,
    bytes: [u8; FRAME_BUF_LEN],
}

impl Em4100Decoder {
    pub(crate) fn new() -> Em4100Decoder {
        Em4100Decoder {
            last_edge_us: 0,
            long_seen: false,
            await_second_short: false,
            one_counter: 0,
            row_parity: 0,
            parity_fail: PARITY_FAIL_ALL,
            byte_idx: 0,
            bit_idx: 4,
            bytes: [0; FRAME_BUF_LEN],
        }
    }

    /// Drop all assembly progress and return to header search. The pulse
    /// counter and edge timestamp survive.
    fn reset_assembly(&mut self) {
        self.long_seen = false;
        self.await_second_short = false;
        self.one_counter = 0;
        self.row_parity = 0;
        self.parity_fail = PARITY_FAIL_ALL;
        self.byte_idx = 0;
        self.bit_idx = 4;
        self.bytes = [0; FRAME_BUF_LEN];
    }

    fn resync(&mut self, shared: &DecodeShared) {
        self.reset_assembly();
        shared.set_status(DecodeStatus::InProgress);
    }

    /// Consume one decoded bit: count header ones, or place the bit in the
    /// frame and run the parity checks at group boundaries.
    fn take_bit(&mut self, bit: u8, shared: &DecodeShared) {
        if self.one_counter < HEADER_ONES {
            if bit == 1 {
                self.one_counter += 1;
            } else {
                self.one_counter = 0;
            }
            return;
        }

        if bit == 1 {
            self.bytes[self.byte_idx] |= 1 << self.bit_idx;
        } else {
            self.bytes[self.byte_idx] &= !(1 << self.bit_idx);
        }

        if self.bit_idx > 0 {
            self.row_parity ^= bit;
            self.bit_idx -= 1;
            return;
        }

        // bit_idx == 0: the group's parity (or stop) bit just landed.
        if self.byte_idx < DATA_ROWS {
            if self.row_parity == bit {
                self.parity_fail &= !(1 << self.byte_idx);
            } else {
                self.parity_fail |= 1 << self.byte_idx;
            }
            self.row_parity = 0;
            self.byte_idx += 1;
            self.bit_idx = 4;
            return;
        }

        // Final group: four column-parity bits plus the stop bit. The data
        // nibbles of all ten rows xored with the column-parity nibble must
        // vanish.
        let mut column_xor = (self.bytes[DATA_ROWS] >> 1) & 0x0F;
        for row in 0..DATA_ROWS {
            column_xor ^= (self.bytes[row] >> 1) & 0x0F;
        }
        if column_xor == 0 {
            self.parity_fail &= !(1 << DATA_ROWS);
        } else {
            self.parity_fail |= 1 << DATA_ROWS;
        }

        shared.publish_frame(&self.bytes);
        shared.set_status(DecodeStatus::FrameComplete);
        if self.parity_fail == 0 {
            shared.set_status(DecodeStatus::IntegrityPassed);
        } else {
            shared.set_status(DecodeStatus::IntegrityFailed);
            self.reset_assembly();
        }
    }
}

impl EdgeDecoder for Em4100Decoder {
    fn on_edge(&mut self, now_us: u32, level: Level, shared: &DecodeShared) {
        if shared.status() == DecodeStatus::IntegrityPassed {
            return;
        }

        let dt = now_us.wrapping_sub(self.last_edge_us);
        self.last_edge_us = now_us;

        match classify(Protocol::Em4100, dt) {
            PulseClass::Long => {
                shared.count_pulse();
                self.long_seen = true;
                self.await_second_short = false;
                self.take_bit(level.bit(), shared);
            }
            PulseClass::Short => {
                shared.count_pulse();
                if !self.long_seen {
                    return;
                }
                if self.await_second_short {
                    self.await_second_short = false;
                    self.take_bit(level.bit(), shared);
                } else {
                    self.await_second_short = true;
                }
            }
            PulseClass::Invalid => {
                if shared.pulses() != 0 {
                    self.resync(shared);
                }
            }
        }
    }
}

/// A validated EM4100 tag identifier.
///
/// Extracted from a decoded frame: each of the ten data rows contributes
/// its four data bits, giving five payload bytes. The first is the customer
/// ("user") byte, the remaining four the 32-bit tag number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Em4100Tag {
    /// Customer / version byte (the first payload byte).
    pub user: u8,
    /// 32-bit tag number (payload bytes 1..=4, big-endian).
    pub number: u32,
    bytes: [u8; 5],
}

impl Em4100Tag {
    /// Extract the payload from a decoded frame buffer. The buffer holds the
    /// eleven 5-bit groups in its low bits; parity has already been checked
    /// by the decoder.
    pub fn from_frame(frame: &[u8; FRAME_BUF_LEN]) -> Em4100Tag {
        let mut bytes = [0u8; 5];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let hi = (frame[2 * i] >> 1) & 0x0F;
            let lo = (frame[2 * i + 1] >> 1) & 0x0F;
            *byte = (hi << 4) | lo;
        }
        Em4100Tag {
            user: bytes[0],
            number: u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]),
            bytes,
        }
    }

    /// The five payload bytes, user byte first.
    pub fn bytes(&self) -> [u8; 5] {
        self.bytes
    }
}

impl fmt::Display for Em4100Tag {
    /// Ten uppercase hex characters, user byte first: `0F01020304`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.bytes {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}
