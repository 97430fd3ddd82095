//! Bit-serial protocol engine boundary.
//!
//! The engine that actually shifts I2S bits (a PIO state machine, an SAI,
//! ...) is outside this crate. It provides a FIFO address for the transfer
//! engine, a pacing signal, and a fractional clock divider.

use crate::config::{BitDepth, Direction, Pins};
use crate::dma::PacingSignal;
use crate::error::Error;

/// A bit-serial engine able to clock I2S frames in or out.
pub trait ProtocolEngine {
    /// Load the I2S program for `direction` on `pins` at `bits` per sample.
    ///
    /// Implementations return [`Error::ProtocolUnavailable`] when the engine
    /// cannot be set up (e.g. no free state machine).
    fn init(&mut self, direction: Direction, pins: Pins, bits: BitDepth) -> Result<(), Error>;

    /// Frequency of the clock the divider applies to.
    fn core_clock_hz(&self) -> u32;

    fn set_clock_divider(&mut self, divider: ClockDivider);

    /// Bus address of the TX (output) or RX (input) FIFO.
    fn fifo_address(&self) -> usize;

    /// Request line that paces the transfer engine.
    fn pacing_signal(&self) -> PacingSignal;

    fn set_enabled(&mut self, enabled: bool);
}

/// 16.8 fixed-point clock divider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockDivider {
    pub integer: u16,
    pub fraction: u8,
}

impl ClockDivider {
    /// Divider for `sample_rate` stereo frames of `bits` per channel.
    ///
    /// The engine runs two instructions per bit clock, so the target rate is
    /// `sample_rate * bits * 2 channels * 2 edges`. Returns `None` if the
    /// divider falls outside `1.0..=65536.0` (an integer part of 0 encodes
    /// 65536).
    pub fn for_rate(core_clock_hz: u32, sample_rate: u32, bits: BitDepth) -> Option<Self> {
        if sample_rate == 0 {
            return None;
        }
        let edge_rate = sample_rate as f32 * bits.bits() as f32 * 2.0 * 2.0;
        let div = core_clock_hz as f32 / edge_rate;
        if !(1.0..=65536.0).contains(&div) {
            return None;
        }
        let mut integer = libm::floorf(div) as u32;
        let mut fraction = libm::roundf((div - integer as f32) * 256.0) as u32;
        if fraction == 256 {
            integer += 1;
            fraction = 0;
        }
        if integer > 65536 || (integer == 65536 && fraction != 0) {
            return None;
        }
        Some(ClockDivider {
            integer: integer as u16,
            fraction: fraction as u8,
        })
    }

    pub fn as_f32(self) -> f32 {
        let integer = if self.integer == 0 {
            65536.0
        } else {
            self.integer as f32
        };
        integer + self.fraction as f32 / 256.0
    }
}
