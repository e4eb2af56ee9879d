//! Antenna circuit selection.
//!
//! Two antenna circuits share the reader; their shutdown lines are
//! active-high, so enabling a circuit drives its line low and the other
//! high. At most one circuit is ever energised, and each circuit has its
//! own demodulator output line for the decoder to watch.

use crate::config::PinConfig;
use crate::error::Error;
use crate::hal::{Level, Platform};

/// One of the two mutually exclusive antenna circuits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Circuit {
    Primary,
    Secondary,
}

impl Circuit {
    /// The 1-based circuit index.
    pub fn index(self) -> u8 {
        match self {
            Circuit::Primary => 1,
            Circuit::Secondary => 2,
        }
    }
}

impl TryFrom<u8> for Circuit {
    type Error = Error;

    fn try_from(index: u8) -> Result<Circuit, Error> {
        match index {
            1 => Ok(Circuit::Primary),
            2 => Ok(Circuit::Secondary),
            other => Err(Error::InvalidCircuit(other)),
        }
    }
}

/// Energise `circuit` (and only it), returning the demodulator input line
/// the decoder must observe.
pub(crate) fn enable<P: Platform>(platform: &mut P, pins: &PinConfig, circuit: Circuit) -> u8 {
    match circuit {
        Circuit::Primary => {
            platform.digital_write(pins.shutdown_primary, Level::Low);
            platform.digital_write(pins.shutdown_secondary, Level::High);
            pins.demod_primary
        }
        Circuit::Secondary => {
            platform.digital_write(pins.shutdown_primary, Level::High);
            platform.digital_write(pins.shutdown_secondary, Level::Low);
            pins.demod_secondary
        }
    }
}

/// Shut both circuits down.
pub(crate) fn disable_all<P: Platform>(platform: &mut P, pins: &PinConfig) {
    platform.digital_write(pins.shutdown_primary, Level::High);
    platform.digital_write(pins.shutdown_secondary, Level::High);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimPlatform;

    #[test]
    fn circuit_indices_round_trip() {
        assert_eq!(Circuit::try_from(1).unwrap(), Circuit::Primary);
        assert_eq!(Circuit::try_from(2).unwrap(), Circuit::Secondary);
        assert!(matches!(Circuit::try_from(0), Err(Error::InvalidCircuit(0))));
        assert!(matches!(Circuit::try_from(3), Err(Error::InvalidCircuit(3))));
        assert_eq!(Circuit::Primary.index(), 1);
        assert_eq!(Circuit::Secondary.index(), 2);
    }

    #[test]
    fn enabling_one_circuit_shuts_the_other_down() {
        let pins = PinConfig::default();
        let mut sim = SimPlatform::new();

        let input = enable(&mut sim, &pins, Circuit::Primary);
        assert_eq!(input, pins.demod_primary);
        assert_eq!(sim.output_level(pins.shutdown_primary), Some(Level::Low));
        assert_eq!(sim.output_level(pins.shutdown_secondary), Some(Level::High));

        let input = enable(&mut sim, &pins, Circuit::Secondary);
        assert_eq!(input, pins.demod_secondary);
        assert_eq!(sim.output_level(pins.shutdown_primary), Some(Level::High));
        assert_eq!(sim.output_level(pins.shutdown_secondary), Some(Level::Low));

        disable_all(&mut sim, &pins);
        assert_eq!(sim.output_level(pins.shutdown_primary), Some(Level::High));
        assert_eq!(sim.output_level(pins.shutdown_secondary), Some(Level::High));
    }
}
