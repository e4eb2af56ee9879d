//! Error types.
//!
//! Only programmer misuse surfaces as an error: bad timing arguments or an
//! out-of-range circuit index, rejected at the API boundary. Everything
//! that can go wrong during a read — no tag, noise, parity or CRC failure,
//! timeout — collapses to a clean [`crate::ReadOutcome::NoTag`].

use thiserror::Error;

/// Result alias for reader operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// `check_delay_ms` is below the minimum the presence gate needs
    /// ([`crate::MIN_CHECK_DELAY_MS`]).
    #[error("check delay {0} ms is below the 25 ms minimum")]
    CheckDelayTooShort(u32),

    /// `read_time_ms` does not cover the presence-check window.
    #[error("read time {read_time_ms} ms is shorter than the check delay {check_delay_ms} ms")]
    ReadTimeTooShort { read_time_ms: u32, check_delay_ms: u32 },

    /// Antenna circuit index out of range (valid: 1 or 2).
    #[error("invalid antenna circuit index {0} (expected 1 or 2)")]
    InvalidCircuit(u8),
}
