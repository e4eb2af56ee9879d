//! Interrupt-driven 125 kHz RFID tag decoding.
//!
//! Decodes two low-frequency tag protocols from the demodulated output of
//! an analog front end (e.g. an EM4095): **EM4100** (Manchester-encoded
//! 64-bit frames with row and column parity) and **FDX-B / ISO 11784-11785**
//! (differential-Manchester 128-bit frames with a CRC-16). The front end
//! delivers nothing but level changes; the decoders classify the spacing of
//! those edges into half-bit and full-bit pulses and run a small state
//! machine per edge, entirely inside the edge-delivery context.
//!
//! [`Reader`] drives one-shot read sessions over two mutually exclusive
//! antenna circuits: enable one circuit, arm the decoder, bail out early if
//! the field is quiet, otherwise poll until a frame verifies or the read
//! window closes. All hardware access goes through the [`Platform`] trait;
//! [`sim::SimPlatform`] implements it with a virtual clock so the entire
//! path runs on a host.
//!
//! ```
//! use lfreader::sim::{em4100_edges, SimPlatform};
//! use lfreader::{Circuit, PinConfig, Reader};
//!
//! let mut sim = SimPlatform::new();
//! let pins = PinConfig::default();
//! sim.schedule_edges(pins.demod_primary, 2_000, &em4100_edges(0x0F, 0x0102_0304, 3));
//!
//! let mut reader = Reader::new(sim);
//! let tag = reader.fast_read(Circuit::Primary, 50, 200).unwrap().unwrap();
//! assert_eq!(tag.user, 0x0F);
//! assert_eq!(tag.number, 0x0102_0304);
//! assert_eq!(tag.to_string(), "0F01020304");
//! ```

mod antenna;
mod config;
pub mod em4100;
mod error;
pub mod fdxb;
mod hal;
mod pulse;
mod session;
pub mod sim;
mod state;

pub use antenna::Circuit;
pub use config::{PinConfig, ReaderConfig};
pub use em4100::Em4100Tag;
pub use error::{Error, Result};
pub use fdxb::FdxbTag;
pub use hal::{EdgeHandler, Level, Platform};
pub use pulse::Protocol;
pub use session::{ReadOutcome, Reader, TagData, MIN_CHECK_DELAY_MS};
