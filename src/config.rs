//! Reader configuration.

/// Pin assignments for the demodulator outputs and the antenna shutdown
/// lines. The defaults match the reference board layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinConfig {
    /// Demodulator output of antenna circuit 1.
    pub demod_primary: u8,
    /// Demodulator output of antenna circuit 2.
    pub demod_secondary: u8,
    /// Shutdown line of circuit 1 (high = off).
    pub shutdown_primary: u8,
    /// Shutdown line of circuit 2 (high = off).
    pub shutdown_secondary: u8,
}

impl Default for PinConfig {
    fn default() -> PinConfig {
        PinConfig {
            demod_primary: 41,
            demod_secondary: 42,
            shutdown_primary: 48,
            shutdown_secondary: 49,
        }
    }
}

/// Tunables for [`crate::Reader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    pub pins: PinConfig,
    /// Background pulse allowance for the presence gate. A tag in the field
    /// produces well over one classified pulse per millisecond, so after the
    /// initial check delay the session continues only if it has counted more
    /// than `check_delay_ms - noise_floor_ms` pulses.
    pub noise_floor_ms: u32,
}

impl Default for ReaderConfig {
    fn default() -> ReaderConfig {
        ReaderConfig {
            pins: PinConfig::default(),
            noise_floor_ms: 25,
        }
    }
}
