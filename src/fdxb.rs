//! FDX-B (ISO 11784/11785) decoding.
//!
//! FDX-B tags repeat a 128-bit frame: a header of ten 0-bits and a single
//! 1-bit, then thirteen octets each followed by a 1-bit stuffing marker
//! (which doubles as the header terminator for the octet that follows).
//! The first eight octets carry a 38-bit national identifier and a 10-bit
//! country code; octets 8–9 hold a CRC-16 over those eight, little-endian;
//! octets 10–12 are application/extension data.
//!
//! The stream is differential-Manchester encoded: every bit boundary has a
//! transition, a 0-bit adds a mid-bit transition. So a 0 arrives as two
//! SHORT pulses (the first carries the bit, the second is dropped) and a 1
//! as one LONG pulse. Octet bits arrive LSB-first.

use std::fmt;

use crate::hal::Level;
use crate::pulse::{classify, Protocol, PulseClass};
use crate::state::{DecodeShared, DecodeStatus, EdgeDecoder, FRAME_BUF_LEN};

/// Payload octets covered by the CRC.
const CRC_SPAN: usize = 8;

/// Octet index after which the CRC trailer is complete.
const CRC_BYTE: usize = 9;

/// Final octet of the frame.
const LAST_BYTE: usize = 12;

/// Bit index of the stuffing slot within an octet.
const STUFF_BIT: u8 = 8;

/// Bit index before the header has been found.
const BIT_IDLE: u8 = 10;

/// CRC-16 with polynomial `0x8408` (reflected `0x1021`), initial value
/// `0x0000`, reflected input, no final xor.
///
/// The check value for `b"123456789"` is `0x2189`.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0x8408
            } else {
                crc >> 1
            };
        }
    }
    crc
}

/// Interrupt-driven FDX-B frame decoder.
pub(crate) struct FdxbDecoder {
    last_edge_us: u32,
    /// Rolling header window; shifted left per decoded bit, 1s ored in for
    /// 1-bits. All-zero low ten bits mean the header run has been seen.
    ten_z: u16,
    /// The next SHORT pulse is the second half of a 0-bit and carries no
    /// information.
    second_half: bool,
    byte_idx: usize,
    bit_idx: u8,
    crc_checked: bool,
    crc_ok: bool,
    bytes: [u8; FRAME_BUF_LEN],
}

impl FdxbDecoder {
    pub(crate) fn new() -> FdxbDecoder {
        FdxbDecoder {
            last_edge_us: 0,
            ten_z: 0xFFFF,
            second_half: false,
            byte_idx: 0,
            bit_idx: BIT_IDLE,
            crc_checked: false,
            crc_ok: false,
            bytes: [0; FRAME_BUF_LEN],
        }
    }

    /// Full reset: assembly, header window, half-bit toggle and CRC verdict.
    /// The pulse counter and edge timestamp survive.
    fn resync(&mut self, shared: &DecodeShared) {
        self.ten_z = 0xFFFF;
        self.second_half = false;
        self.byte_idx = 0;
        self.bit_idx = BIT_IDLE;
        self.crc_checked = false;
        self.crc_ok = false;
        self.bytes = [0; FRAME_BUF_LEN];
        shared.set_status(DecodeStatus::InProgress);
    }

    fn seeking(&self) -> bool {
        self.ten_z & 0x03FF != 0
    }
}

impl EdgeDecoder for FdxbDecoder {
    fn on_edge(&mut self, now_us: u32, _level: Level, shared: &DecodeShared) {
        if shared.status() == DecodeStatus::IntegrityPassed {
            return;
        }

        let dt = now_us.wrapping_sub(self.last_edge_us);
        self.last_edge_us = now_us;
        let class = classify(Protocol::Fdxb, dt);

        // The CRC trailer is complete once the indices reach (9, 8); verify
        // it exactly once, before acting on the current pulse.
        if self.byte_idx == CRC_BYTE && self.bit_idx == STUFF_BIT && !self.crc_checked {
            self.crc_checked = true;
            let computed = crc16(&self.bytes[..CRC_SPAN]);
            let stored = u16::from_le_bytes([self.bytes[CRC_SPAN], self.bytes[CRC_BYTE]]);
            if computed == stored {
                self.crc_ok = true;
            } else {
                self.resync(shared);
                return;
            }
        }

        // The frame is complete once the indices reach (12, 8).
        if self.byte_idx == LAST_BYTE && self.bit_idx == STUFF_BIT {
            shared.publish_frame(&self.bytes);
            shared.set_status(DecodeStatus::FrameComplete);
            if self.crc_ok {
                shared.set_status(DecodeStatus::IntegrityPassed);
            } else {
                self.resync(shared);
            }
            return;
        }

        match class {
            PulseClass::Short => {
                if self.second_half {
                    self.second_half = false;
                    return;
                }
                if self.bit_idx == STUFF_BIT {
                    // A 0 in the stuffing slot is a framing violation.
                    self.resync(shared);
                    return;
                }
                self.second_half = true;
                shared.count_pulse();
                if self.seeking() {
                    self.ten_z <<= 1;
                } else if self.bit_idx < STUFF_BIT {
                    self.bytes[self.byte_idx] &= !(1 << self.bit_idx);
                    self.bit_idx += 1;
                }
                // Zeros arriving between the ten-zero run and the framing
                // 1-bit leave the indices parked.
            }
            PulseClass::Long => {
                self.second_half = false;
                shared.count_pulse();
                if self.seeking() {
                    self.ten_z = (self.ten_z << 1) | 1;
                } else if self.bit_idx < STUFF_BIT {
                    self.bytes[self.byte_idx] |= 1 << self.bit_idx;
                    self.bit_idx += 1;
                } else if self.bit_idx == STUFF_BIT {
                    self.bit_idx = 0;
                    self.byte_idx += 1;
                } else {
                    // The framing 1-bit right after the ten-zero run:
                    // assembly starts with octet 0.
                    self.bit_idx = 0;
                    self.byte_idx = 0;
                }
            }
            PulseClass::Invalid => {
                self.resync(shared);
            }
        }
    }
}

/// A validated FDX-B tag identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FdxbTag {
    /// ISO 3166 numeric country code (10 bits).
    pub country: u16,
    /// 38-bit national identifier.
    pub national_id: u64,
    /// First application/extension octet (octet 10 of the frame).
    pub extension: u8,
    bytes: [u8; 13],
}

impl FdxbTag {
    /// Extract the identifier from a decoded frame buffer. The CRC has
    /// already been checked by the decoder.
    pub fn from_frame(frame: &[u8; FRAME_BUF_LEN]) -> FdxbTag {
        let national_id = u64::from(frame[0])
            | u64::from(frame[1]) << 8
            | u64::from(frame[2]) << 16
            | u64::from(frame[3]) << 24
            | u64::from(frame[4] & 0x3F) << 32;
        let country = u16::from(frame[5]) << 2 | u16::from(frame[4] >> 6);
        let mut bytes = [0u8; 13];
        bytes.copy_from_slice(&frame[..13]);
        FdxbTag {
            country,
            national_id,
            extension: frame[10],
            bytes,
        }
    }

    /// The low 32 bits of the national identifier.
    pub fn number_low32(&self) -> u32 {
        self.national_id as u32
    }

    /// The thirteen frame octets (payload, CRC, extension).
    pub fn bytes(&self) -> [u8; 13] {
        self.bytes
    }
}

impl fmt::Display for FdxbTag {
    /// Country code as three uppercase hex digits, a dot, then the national
    /// identifier as ten uppercase hex digits: `114.01A2B3C4D5`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03X}.{:010X}", self.country, self.national_id)
    }
}
