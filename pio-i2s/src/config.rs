//! Stream configuration types.
//!
//! [`RingConfig`] describes one ring engine and is validated by
//! [`RingEngine::init`](crate::ring::RingEngine::init). [`I2sConfig`] is the
//! user-facing configuration of an [`I2s`](crate::i2s::I2s) stream; the
//! I2S layer derives a `RingConfig` from it at `begin`.

use crate::constants::{
    DEFAULT_BCLK_PIN, DEFAULT_BUFFER_COUNT, DEFAULT_BUFFER_WORDS, DEFAULT_DATA_PIN,
    DEFAULT_SAMPLE_RATE,
};
use crate::error::Error;

/// Stream direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Protocol engine → memory (receive).
    Input,
    /// Memory → protocol engine (transmit).
    Output,
}

impl Direction {
    pub(crate) const fn as_u8(self) -> u8 {
        match self {
            Direction::Input => 0,
            Direction::Output => 1,
        }
    }

    pub(crate) const fn from_u8(v: u8) -> Self {
        if v == 0 {
            Direction::Input
        } else {
            Direction::Output
        }
    }
}

/// How many hardware transfer channels feed one ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Topology {
    /// One channel, re-armed by software on every completion.
    Single,
    /// Two channels chained to each other; software refills one slot behind.
    PingPong,
}

impl Topology {
    /// Number of transfer channels this topology claims.
    pub const fn engines(self) -> usize {
        match self {
            Topology::Single => 1,
            Topology::PingPong => 2,
        }
    }
}

/// Geometry and behaviour of one ring engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RingConfig {
    pub direction: Direction,
    pub slot_count: usize,
    pub words_per_slot: usize,
    /// Word written into output slots that carry no caller data.
    pub silence: u32,
    /// Slot the first transfer engine starts on. The second engine, if
    /// any, starts on the slot after it.
    pub first_slot: usize,
}

impl RingConfig {
    pub const fn new(direction: Direction) -> Self {
        RingConfig {
            direction,
            slot_count: DEFAULT_BUFFER_COUNT,
            words_per_slot: DEFAULT_BUFFER_WORDS,
            silence: 0,
            first_slot: 0,
        }
    }

    pub const fn with_slots(mut self, slot_count: usize, words_per_slot: usize) -> Self {
        self.slot_count = slot_count;
        self.words_per_slot = words_per_slot;
        self
    }

    pub const fn with_silence(mut self, silence: u32) -> Self {
        self.silence = silence;
        self
    }

    pub const fn with_first_slot(mut self, first_slot: usize) -> Self {
        self.first_slot = first_slot;
        self
    }
}

/// Supported sample widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitDepth {
    Eight,
    Sixteen,
    TwentyFour,
    ThirtyTwo,
}

impl BitDepth {
    pub const fn bits(self) -> u32 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
            BitDepth::TwentyFour => 24,
            BitDepth::ThirtyTwo => 32,
        }
    }
}

impl TryFrom<u8> for BitDepth {
    type Error = Error;

    fn try_from(bits: u8) -> Result<Self, Error> {
        match bits {
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            24 => Ok(BitDepth::TwentyFour),
            32 => Ok(BitDepth::ThirtyTwo),
            _ => Err(Error::UnsupportedBitDepth),
        }
    }
}

/// Pins handed to the protocol engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pins {
    /// Bit clock. Word select (LRCLK) is `bclk + 1`.
    pub bclk: u8,
    pub data: u8,
}

/// User-facing configuration of an I2S stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2sConfig {
    pub pins: Pins,
    pub bits: BitDepth,
    pub buffer_words: usize,
    pub buffer_count: usize,
    /// Silence sample at the configured width; expanded to a full word at `begin`.
    pub silence: i32,
    pub sample_rate: u32,
}

impl Default for I2sConfig {
    fn default() -> Self {
        I2sConfig {
            pins: Pins {
                bclk: DEFAULT_BCLK_PIN,
                data: DEFAULT_DATA_PIN,
            },
            bits: BitDepth::Sixteen,
            buffer_words: DEFAULT_BUFFER_WORDS,
            buffer_count: DEFAULT_BUFFER_COUNT,
            silence: 0,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}
