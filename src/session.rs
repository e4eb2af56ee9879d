//! The one-shot read session.
//!
//! A session energises one antenna circuit, arms the protocol's decoder on
//! that circuit's demodulator line, and then watches the clock: after
//! `check_delay_ms` it bails out early if the line has been too quiet to
//! hold a tag, otherwise it polls the completion flag at millisecond
//! granularity until the decoder verifies a frame or `read_time_ms` runs
//! out. Either way the antenna is off and the handler detached before the
//! call returns.

use std::sync::Arc;

use log::debug;

use crate::antenna::{self, Circuit};
use crate::config::ReaderConfig;
use crate::em4100::{Em4100Decoder, Em4100Tag};
use crate::error::{Error, Result};
use crate::fdxb::{FdxbDecoder, FdxbTag};
use crate::hal::Platform;
use crate::pulse::Protocol;
use crate::state::{DecodeShared, DecodeStatus, EdgeDecoder};

/// Smallest usable presence-check window.
pub const MIN_CHECK_DELAY_MS: u32 = 25;

/// Result of a read session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// No tag was present, or no frame verified within the read window.
    NoTag,
    /// A frame was decoded and its integrity check passed.
    Tag(TagData),
}

/// A decoded identifier, one variant per protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagData {
    Em4100(Em4100Tag),
    Fdxb(FdxbTag),
}

/// RFID reader driving two antenna circuits through a [`Platform`].
///
/// Sessions are strictly one-shot and serialised: `read` takes `&mut self`,
/// so concurrent reads are rejected at compile time.
pub struct Reader<P: Platform> {
    platform: P,
    config: ReaderConfig,
    shared: Arc<DecodeShared>,
}

impl<P: Platform> Reader<P> {
    pub fn new(platform: P) -> Reader<P> {
        Reader::with_config(platform, ReaderConfig::default())
    }

    pub fn with_config(platform: P, config: ReaderConfig) -> Reader<P> {
        Reader {
            platform,
            config,
            shared: Arc::new(DecodeShared::new()),
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Run one read attempt.
    ///
    /// Selects `circuit`, arms the `protocol` decoder, sleeps for
    /// `check_delay_ms`, and exits early with [`ReadOutcome::NoTag`] if the
    /// pulse count stayed at background level. Otherwise polls until the
    /// decoder reports a verified frame or `read_time_ms` (measured from the
    /// start of the session) elapses.
    ///
    /// Requires `check_delay_ms >= 25` and `read_time_ms >= check_delay_ms`.
    pub fn read(
        &mut self,
        protocol: Protocol,
        circuit: Circuit,
        check_delay_ms: u32,
        read_time_ms: u32,
    ) -> Result<ReadOutcome> {
        if check_delay_ms < MIN_CHECK_DELAY_MS {
            return Err(Error::CheckDelayTooShort(check_delay_ms));
        }
        if read_time_ms < check_delay_ms {
            return Err(Error::ReadTimeTooShort {
                read_time_ms,
                check_delay_ms,
            });
        }

        let input = antenna::enable(&mut self.platform, &self.config.pins, circuit);
        self.platform.pin_mode_input(input);
        self.shared.reset();

        let mut decoder: Box<dyn EdgeDecoder> = match protocol {
            Protocol::Em4100 => Box::new(Em4100Decoder::new()),
            Protocol::Fdxb => Box::new(FdxbDecoder::new()),
        };
        let shared = Arc::clone(&self.shared);

        let start_ms = self.platform.millis();
        self.platform.attach_edge_interrupt(
            input,
            Box::new(move |now_us, level| decoder.on_edge(now_us, level, &shared)),
        );
        debug!(
            "armed {:?} decoder on circuit {} (line {})",
            protocol,
            circuit.index(),
            input
        );

        self.platform.sleep_ms(check_delay_ms);

        let pulses = self.shared.pulses();
        let floor = check_delay_ms.saturating_sub(self.config.noise_floor_ms);
        if pulses <= floor {
            self.disarm(input);
            debug!("presence gate: {pulses} pulses in {check_delay_ms} ms, nothing in the field");
            return Ok(ReadOutcome::NoTag);
        }

        while self.platform.millis().wrapping_sub(start_ms) < read_time_ms
            && self.shared.status() != DecodeStatus::IntegrityPassed
        {
            self.platform.sleep_ms(1);
        }

        self.disarm(input);

        if self.shared.status() == DecodeStatus::IntegrityPassed {
            let frame = self.shared.frame();
            let tag = match protocol {
                Protocol::Em4100 => TagData::Em4100(Em4100Tag::from_frame(&frame)),
                Protocol::Fdxb => TagData::Fdxb(FdxbTag::from_frame(&frame)),
            };
            debug!("tag decoded after {} ms", self.platform.millis().wrapping_sub(start_ms));
            Ok(ReadOutcome::Tag(tag))
        } else {
            debug!("read window elapsed without a verified frame");
            Ok(ReadOutcome::NoTag)
        }
    }

    /// EM4100 read attempt; `Some` carries the decoded tag.
    pub fn fast_read(
        &mut self,
        circuit: Circuit,
        check_delay_ms: u32,
        read_time_ms: u32,
    ) -> Result<Option<Em4100Tag>> {
        match self.read(Protocol::Em4100, circuit, check_delay_ms, read_time_ms)? {
            ReadOutcome::Tag(TagData::Em4100(tag)) => Ok(Some(tag)),
            _ => Ok(None),
        }
    }

    /// FDX-B read attempt; `Some` carries the decoded tag.
    pub fn iso_fast_read(
        &mut self,
        circuit: Circuit,
        check_delay_ms: u32,
        read_time_ms: u32,
    ) -> Result<Option<FdxbTag>> {
        match self.read(Protocol::Fdxb, circuit, check_delay_ms, read_time_ms)? {
            ReadOutcome::Tag(TagData::Fdxb(tag)) => Ok(Some(tag)),
            _ => Ok(None),
        }
    }

    /// Shut both antenna circuits down. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        antenna::disable_all(&mut self.platform, &self.config.pins);
    }

    fn disarm(&mut self, input: u8) {
        self.platform.detach_edge_interrupt(input);
        antenna::disable_all(&mut self.platform, &self.config.pins);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimPlatform;

    #[test]
    fn rejects_bad_timing_arguments() {
        let mut reader = Reader::new(SimPlatform::new());
        assert_eq!(
            reader.read(Protocol::Em4100, Circuit::Primary, 10, 100),
            Err(Error::CheckDelayTooShort(10))
        );
        assert_eq!(
            reader.read(Protocol::Em4100, Circuit::Primary, 100, 50),
            Err(Error::ReadTimeTooShort {
                read_time_ms: 50,
                check_delay_ms: 100
            })
        );
    }

    #[test]
    fn empty_field_returns_no_tag_at_the_check_delay() {
        let mut reader = Reader::new(SimPlatform::new());
        let outcome = reader
            .read(Protocol::Em4100, Circuit::Primary, 50, 500)
            .unwrap();
        assert_eq!(outcome, ReadOutcome::NoTag);
        // No pulses at all: the session must not wait out the read window.
        assert_eq!(reader.platform().millis(), 50);
    }
}
