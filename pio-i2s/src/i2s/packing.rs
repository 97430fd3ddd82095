//! Stereo sample packing.
//!
//! Conversions between per-channel samples and the 32-bit words the ring
//! moves.
//!
//! ## Word format
//!
//! | Width | Word layout (MSB → LSB)                          |
//! |-------|--------------------------------------------------|
//! | 8     | `L0 R0 L1 R1` (two frames per word)              |
//! | 16    | `L R` (left in the upper half)                   |
//! | 24    | one word per channel, sample left-aligned        |
//! | 32    | one word per channel                             |

use crate::config::BitDepth;

/// Pack one 16-bit stereo frame: `left << 16 | right`.
#[inline]
pub fn pack16(left: i16, right: i16) -> u32 {
    ((left as u16 as u32) << 16) | (right as u16 as u32)
}

/// Inverse of [`pack16`].
#[inline]
pub fn unpack16(word: u32) -> (i16, i16) {
    ((word >> 16) as i16, word as i16)
}

/// Pack one 8-bit stereo frame into a half word: `left << 8 | right`.
#[inline]
pub fn pack8(left: i8, right: i8) -> u16 {
    ((left as u8 as u16) << 8) | (right as u8 as u16)
}

/// Inverse of [`pack8`].
#[inline]
pub fn unpack8(half: u16) -> (i8, i8) {
    ((half >> 8) as i8, half as i8)
}

/// Replicate a silence sample across a whole transfer word.
///
/// An 8-bit sample fills all four bytes and a 16-bit sample both halves;
/// 24- and 32-bit samples are used as-is.
pub fn expand_silence(sample: i32, bits: BitDepth) -> u32 {
    match bits {
        BitDepth::Eight => (sample as u8 as u32) * 0x0101_0101,
        BitDepth::Sixteen => (sample as u16 as u32) * 0x0001_0001,
        BitDepth::TwentyFour | BitDepth::ThirtyTwo => sample as u32,
    }
}

/// Collects narrow samples MSB-first until a full word is assembled.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Accumulator {
    word: u32,
    bits: u32,
}

impl Accumulator {
    pub const fn new() -> Self {
        Accumulator { word: 0, bits: 0 }
    }

    /// Append the low `width` bits of `value`. Returns the word once 32
    /// bits have been collected.
    pub fn push(&mut self, value: u32, width: u32) -> Option<u32> {
        if width >= 32 {
            self.reset();
            return Some(value);
        }
        let mask = (1u32 << width) - 1;
        self.word = (self.word << width) | (value & mask);
        self.bits += width;
        if self.bits >= 32 {
            let word = self.word;
            self.reset();
            Some(word)
        } else {
            None
        }
    }

    /// Bits collected so far.
    pub fn pending_bits(&self) -> u32 {
        self.bits
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Holds the second 8-bit frame of a word between two `read8` calls.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Holding {
    low: Option<u16>,
}

impl Holding {
    pub const fn new() -> Self {
        Holding { low: None }
    }

    /// Frame left over from the previous word, if any.
    pub fn take(&mut self) -> Option<(i8, i8)> {
        self.low.take().map(unpack8)
    }

    /// Split `word` into its two frames, keep the second and return the first.
    pub fn split(&mut self, word: u32) -> (i8, i8) {
        self.low = Some(word as u16);
        unpack8((word >> 16) as u16)
    }

    pub fn reset(&mut self) {
        self.low = None;
    }
}
