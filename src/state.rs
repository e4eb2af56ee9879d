//! Decode state shared across the edge-handler boundary.
//!
//! The frame-assembly state itself is owned by the armed decoder, which
//! lives inside the edge handler; the session never touches it. What the
//! two sides share is a [`DecodeShared`]: a release/acquire completion
//! flag, a pulse counter for the presence gate, and the frame buffer the
//! handler publishes once a frame has assembled. The session reads the
//! buffer only after observing [`DecodeStatus::IntegrityPassed`].

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Mutex;

use crate::hal::Level;

/// Frame buffer size; sized for the larger (FDX-B, 13-byte) frame with room
/// to spare, matching the scratch the assembly writes into.
pub(crate) const FRAME_BUF_LEN: usize = 16;

/// Progress of the armed decoder, as observed by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecodeStatus {
    /// Seeking the header or mid-assembly.
    InProgress = 0,
    /// All frame groups filled; integrity verdict pending or failed.
    FrameComplete = 1,
    /// Frame assembled but the parity/CRC check failed; the decoder has
    /// resynchronised and keeps trying.
    IntegrityFailed = 2,
    /// Frame assembled and verified. Terminal until the next arm.
    IntegrityPassed = 3,
}

impl DecodeStatus {
    fn from_u8(raw: u8) -> DecodeStatus {
        match raw {
            1 => DecodeStatus::FrameComplete,
            2 => DecodeStatus::IntegrityFailed,
            3 => DecodeStatus::IntegrityPassed,
            _ => DecodeStatus::InProgress,
        }
    }
}

/// State visible to both the edge handler and the session.
pub(crate) struct DecodeShared {
    status: AtomicU8,
    pulses: AtomicU32,
    frame: Mutex<[u8; FRAME_BUF_LEN]>,
}

impl DecodeShared {
    pub(crate) fn new() -> DecodeShared {
        DecodeShared {
            status: AtomicU8::new(DecodeStatus::InProgress as u8),
            pulses: AtomicU32::new(0),
            frame: Mutex::new([0; FRAME_BUF_LEN]),
        }
    }

    /// Clear everything. Called by the session at arm time, before the edge
    /// handler is attached.
    pub(crate) fn reset(&self) {
        self.status
            .store(DecodeStatus::InProgress as u8, Ordering::Release);
        self.pulses.store(0, Ordering::Relaxed);
        if let Ok(mut frame) = self.frame.lock() {
            frame.fill(0);
        }
    }

    pub(crate) fn status(&self) -> DecodeStatus {
        DecodeStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub(crate) fn set_status(&self, status: DecodeStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    /// Count one classified (SHORT or LONG) pulse toward the presence gate.
    pub(crate) fn count_pulse(&self) {
        self.pulses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn pulses(&self) -> u32 {
        self.pulses.load(Ordering::Relaxed)
    }

    /// Publish an assembled frame. Called from the edge handler exactly when
    /// a frame fills; the critical section is a fixed-size copy, so the
    /// handler stays bounded.
    pub(crate) fn publish_frame(&self, bytes: &[u8; FRAME_BUF_LEN]) {
        if let Ok(mut frame) = self.frame.lock() {
            *frame = *bytes;
        }
    }

    /// Snapshot the published frame. Only meaningful after
    /// [`DecodeStatus::IntegrityPassed`] has been observed.
    pub(crate) fn frame(&self) -> [u8; FRAME_BUF_LEN] {
        self.frame
            .lock()
            .map(|frame| *frame)
            .unwrap_or([0; FRAME_BUF_LEN])
    }
}

/// The decode capability the session arms: one implementation per protocol.
///
/// `on_edge` runs in the edge-delivery context. It must stay bounded: no
/// blocking, no allocation, no formatting — mutate the assembly, touch the
/// atomics, at most copy one frame buffer.
pub(crate) trait EdgeDecoder: Send {
    fn on_edge(&mut self, now_us: u32, level: Level, shared: &DecodeShared);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_everything() {
        let shared = DecodeShared::new();
        shared.count_pulse();
        shared.count_pulse();
        shared.set_status(DecodeStatus::IntegrityPassed);
        shared.publish_frame(&[0xAA; FRAME_BUF_LEN]);

        shared.reset();
        assert_eq!(shared.status(), DecodeStatus::InProgress);
        assert_eq!(shared.pulses(), 0);
        assert_eq!(shared.frame(), [0; FRAME_BUF_LEN]);
    }

    #[test]
    fn published_frame_round_trips() {
        let shared = DecodeShared::new();
        let mut bytes = [0u8; FRAME_BUF_LEN];
        bytes[..4].copy_from_slice(&[1, 2, 3, 4]);
        shared.publish_frame(&bytes);
        assert_eq!(shared.frame(), bytes);
    }
}
