//! I2S stream on top of a ring engine.
//!
//! [`I2s`] is the application-facing surface: pin and format configuration,
//! lifecycle, a raw word API and packed stereo helpers at 8/16/24/32 bits.
//! It drives a [`ProtocolEngine`] for the bit-serial side and borrows a
//! [`RingEngine`] for buffering; the completion interrupt keeps calling
//! [`RingEngine::on_interrupt`] directly.
//!
//! ## Bring-up order
//!
//! ```text
//!  validate ──► ring.init ──► pio.init + clock divider ──► ring.begin ──► pio enable
//!                                                            (claims DMA)
//! ```
//!
//! The protocol engine is only enabled once the transfer channels are
//! running.
//!
//! ## Usage
//!
//! ```ignore
//! static RING: RingEngine<8, 16> = RingEngine::new();
//! static IRQ: IrqRegistry = IrqRegistry::new();
//!
//! let mut dma = TransferAdapter::new(controller, &IRQ, Topology::PingPong);
//! let mut out = I2s::new(&RING, pio, Direction::Output);
//! out.set_bits_per_sample(16)?;
//! out.set_frequency(44_100)?;
//! out.begin(&mut dma)?;
//!
//! loop {
//!     let (l, r) = synth.next();
//!     out.write16(l, r)?;
//! }
//! ```

pub mod packing;

use crate::config::{BitDepth, Direction, I2sConfig, Pins, RingConfig};
use crate::constants::{MAX_BCLK_PIN, MAX_DATA_PIN, MIN_BUFFER_WORDS, MIN_SLOTS};
use crate::dma::{TransferAdapter, TransferEngine};
use crate::error::Error;
use crate::protocol::{ClockDivider, ProtocolEngine};
use crate::ring::{NoWait, RingEngine};

use packing::{pack16, pack8, unpack16, Accumulator, Holding};

/// One I2S stream, input or output.
///
/// Setters are only accepted while the stream is stopped; they return
/// [`Error::Running`] otherwise. Packed helpers block until the ring has
/// room (output) or data (input).
pub struct I2s<'a, P, const SLOTS: usize, const WORDS: usize> {
    ring: &'a RingEngine<SLOTS, WORDS>,
    pio: P,
    config: I2sConfig,
    direction: Direction,
    running: bool,
    callback: Option<fn()>,
    writer: Accumulator,
    reader: Holding,
    peeked: Option<u32>,
}

impl<'a, P: ProtocolEngine, const SLOTS: usize, const WORDS: usize> I2s<'a, P, SLOTS, WORDS> {
    /// A stopped stream with [`I2sConfig::default`] settings.
    pub fn new(ring: &'a RingEngine<SLOTS, WORDS>, pio: P, direction: Direction) -> Self {
        I2s {
            ring,
            pio,
            config: I2sConfig::default(),
            direction,
            running: false,
            callback: None,
            writer: Accumulator::new(),
            reader: Holding::new(),
            peeked: None,
        }
    }

    // ── Configuration ──────────────────────────────────────────────────

    /// Bit clock pin; word select is the pin after it.
    pub fn set_bclk(&mut self, pin: u8) -> Result<(), Error> {
        self.stopped()?;
        if pin > MAX_BCLK_PIN {
            return Err(Error::PinOutOfRange);
        }
        self.config.pins.bclk = pin;
        Ok(())
    }

    /// Serial data pin (DOUT for output, DIN for input).
    pub fn set_data(&mut self, pin: u8) -> Result<(), Error> {
        self.stopped()?;
        if pin > MAX_DATA_PIN {
            return Err(Error::PinOutOfRange);
        }
        self.config.pins.data = pin;
        Ok(())
    }

    /// 8, 16, 24 or 32.
    pub fn set_bits_per_sample(&mut self, bits: u8) -> Result<(), Error> {
        self.stopped()?;
        self.config.bits = BitDepth::try_from(bits)?;
        Ok(())
    }

    /// Words per slot and the silence sample sent when the caller falls
    /// behind. The sample is given at the configured width and expanded to
    /// a full word at [`begin`](Self::begin).
    pub fn set_buffers(&mut self, words: usize, silence: i32) -> Result<(), Error> {
        self.stopped()?;
        if words < MIN_BUFFER_WORDS || words > WORDS {
            return Err(Error::InvalidSlotWords);
        }
        self.config.buffer_words = words;
        self.config.silence = silence;
        Ok(())
    }

    /// Number of ring slots, between 3 and `SLOTS`.
    pub fn set_buffer_count(&mut self, count: usize) -> Result<(), Error> {
        self.stopped()?;
        if count < MIN_SLOTS || count > SLOTS {
            return Err(Error::InvalidSlotCount);
        }
        self.config.buffer_count = count;
        Ok(())
    }

    /// Sample rate in Hz. Whether the protocol clock can reach it is only
    /// known at [`begin`](Self::begin).
    pub fn set_frequency(&mut self, hz: u32) -> Result<(), Error> {
        self.stopped()?;
        if hz == 0 {
            return Err(Error::InvalidSampleRate);
        }
        self.config.sample_rate = hz;
        Ok(())
    }

    /// Callback run in interrupt context after every transmitted slot.
    /// Ignored on input streams.
    pub fn on_transmit(&mut self, callback: fn()) {
        if self.direction == Direction::Output {
            self.install(callback);
        }
    }

    /// Callback run in interrupt context after every received slot.
    /// Ignored on output streams.
    pub fn on_receive(&mut self, callback: fn()) {
        if self.direction == Direction::Input {
            self.install(callback);
        }
    }

    fn install(&mut self, callback: fn()) {
        self.callback = Some(callback);
        if self.running {
            self.ring.set_callback(self.callback);
        }
    }

    // ── Lifecycle ──────────────────────────────────────────────────────

    /// Bring the stream up.
    ///
    /// On error the protocol engine is left disabled and no transfer
    /// channel is held.
    pub fn begin<E: TransferEngine>(
        &mut self,
        dma: &mut TransferAdapter<'_, E>,
    ) -> Result<(), Error> {
        self.stopped()?;
        let config = self.config;

        let divider =
            ClockDivider::for_rate(self.pio.core_clock_hz(), config.sample_rate, config.bits)
                .ok_or(Error::InvalidSampleRate)?;
        let silence = packing::expand_silence(config.silence, config.bits);
        self.ring.init(
            RingConfig::new(self.direction)
                .with_slots(config.buffer_count, config.buffer_words)
                .with_silence(silence),
        )?;

        self.pio.init(self.direction, config.pins, config.bits)?;
        self.pio.set_clock_divider(divider);
        if let Err(e) = self
            .ring
            .begin(dma, self.pio.pacing_signal(), self.pio.fifo_address())
        {
            error!("i2s: ring did not start: {}", e);
            return Err(e);
        }
        self.ring.set_callback(self.callback);

        self.writer.reset();
        self.reader.reset();
        self.peeked = None;
        self.pio.set_enabled(true);
        self.running = true;
        info!(
            "i2s: {} bits at {} Hz, {} x {} words",
            config.bits.bits(),
            config.sample_rate,
            config.buffer_count,
            config.buffer_words
        );
        Ok(())
    }

    /// Stop the protocol engine and release the transfer channels.
    pub fn end<E: TransferEngine>(&mut self, dma: &mut TransferAdapter<'_, E>) {
        if !self.running {
            return;
        }
        self.pio.set_enabled(false);
        self.ring.deinit(dma);
        self.running = false;
        info!("i2s: stopped");
    }

    /// True between a successful [`begin`](Self::begin) and [`end`](Self::end).
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Settings applied at the next [`begin`](Self::begin).
    pub fn config(&self) -> &I2sConfig {
        &self.config
    }

    /// Configured pin assignment.
    pub fn pins(&self) -> Pins {
        self.config.pins
    }

    /// The protocol engine driven by this stream.
    pub fn protocol(&self) -> &P {
        &self.pio
    }

    /// Mutable access to the protocol engine. Do not reprogram it while running.
    pub fn protocol_mut(&mut self) -> &mut P {
        &mut self.pio
    }

    // ── Word API ───────────────────────────────────────────────────────

    /// Write one raw transfer word. Packing and alignment are the caller's.
    pub fn write(&mut self, word: u32, blocking: bool) -> Result<(), Error> {
        self.expect(Direction::Output)?;
        self.ring.write(word, blocking)
    }

    /// Read one raw transfer word.
    pub fn read(&mut self, blocking: bool) -> Result<u32, Error> {
        self.expect(Direction::Input)?;
        if let Some(word) = self.peeked.take() {
            return Ok(word);
        }
        self.ring.read(blocking)
    }

    /// Next input word without consuming it. Never blocks.
    pub fn peek(&mut self) -> Result<u32, Error> {
        self.expect(Direction::Input)?;
        if let Some(word) = self.peeked {
            return Ok(word);
        }
        let word = self.ring.read(false)?;
        self.peeked = Some(word);
        Ok(word)
    }

    /// Words that can be written without blocking. Zero on input streams.
    ///
    /// Counts ring space only. An 8- or 16-bit sample held back by
    /// [`write8`](Self::write8) or [`write_natural`](Self::write_natural)
    /// until its word is complete has not reached the ring and is not
    /// subtracted.
    pub fn available_for_write(&self) -> usize {
        if !self.running || self.direction != Direction::Output {
            return 0;
        }
        self.ring.available()
    }

    /// Words that can be read without blocking. Zero on output streams.
    pub fn available(&self) -> usize {
        if !self.running || self.direction != Direction::Input {
            return 0;
        }
        self.ring.available() + self.peeked.is_some() as usize
    }

    /// Output: wait until everything written has reached the hardware.
    /// Input: drop everything received but not yet read.
    pub fn flush(&mut self) -> Result<(), Error> {
        if !self.running {
            return Err(Error::NotRunning);
        }
        if self.direction == Direction::Input {
            self.peeked = None;
            self.reader.reset();
        }
        self.ring.flush()
    }

    /// Return and clear the ring's sticky overflow/underflow flag.
    pub fn take_over_underflow(&self) -> bool {
        self.ring.take_over_underflow()
    }

    /// Write whole little-endian words from `bytes` without blocking.
    ///
    /// Returns the number of bytes taken, always a multiple of 4. A
    /// trailing partial word is left to the caller. Running out of ring
    /// space is reported through the return value, not the fault flag.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> usize {
        if self.expect(Direction::Output).is_err() {
            return 0;
        }
        let mut taken = 0;
        for chunk in bytes.chunks_exact(4) {
            let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            if self.ring.write_with(word, &mut NoWait).is_err() {
                break;
            }
            taken += 4;
        }
        taken
    }

    /// Write one channel sample at the configured width.
    ///
    /// 8- and 16-bit samples are collected until a whole word exists and
    /// only then handed to the ring, blocking if it is full.
    pub fn write_natural(&mut self, sample: u32) -> Result<(), Error> {
        self.expect(Direction::Output)?;
        let word = match self.config.bits {
            BitDepth::Eight => self.writer.push(sample, 8),
            BitDepth::Sixteen => self.writer.push(sample, 16),
            BitDepth::TwentyFour | BitDepth::ThirtyTwo => Some(sample),
        };
        match word {
            Some(word) => self.ring.write(word, true),
            None => Ok(()),
        }
    }

    // ── Packed stereo ──────────────────────────────────────────────────

    /// Two 8-bit frames share a word; the first frame goes in the upper half.
    pub fn write8(&mut self, left: i8, right: i8) -> Result<(), Error> {
        self.expect(Direction::Output)?;
        match self.writer.push(pack8(left, right) as u32, 16) {
            Some(word) => self.ring.write(word, true),
            None => Ok(()),
        }
    }

    /// One word per frame, left channel in the upper half.
    pub fn write16(&mut self, left: i16, right: i16) -> Result<(), Error> {
        self.expect(Direction::Output)?;
        self.ring.write(pack16(left, right), true)
    }

    /// Samples must already be left-aligned (`0xABCDEF00`).
    pub fn write24(&mut self, left: i32, right: i32) -> Result<(), Error> {
        self.write32(left, right)
    }

    /// One word per channel, left first.
    pub fn write32(&mut self, left: i32, right: i32) -> Result<(), Error> {
        self.expect(Direction::Output)?;
        self.ring.write(left as u32, true)?;
        self.ring.write(right as u32, true)
    }

    /// One frame; the second frame of each word is held for the next call.
    pub fn read8(&mut self) -> Result<(i8, i8), Error> {
        self.expect(Direction::Input)?;
        if let Some(frame) = self.reader.take() {
            return Ok(frame);
        }
        let word = self.read(true)?;
        Ok(self.reader.split(word))
    }

    /// One word per frame, left channel in the upper half.
    pub fn read16(&mut self) -> Result<(i16, i16), Error> {
        let word = self.read(true)?;
        Ok(unpack16(word))
    }

    /// Samples arrive right-aligned and are returned left-aligned.
    pub fn read24(&mut self) -> Result<(i32, i32), Error> {
        let (left, right) = self.read32()?;
        Ok((left << 8, right << 8))
    }

    /// One word per channel, left first.
    pub fn read32(&mut self) -> Result<(i32, i32), Error> {
        let left = self.read(true)? as i32;
        let right = self.read(true)? as i32;
        Ok((left, right))
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn stopped(&self) -> Result<(), Error> {
        if self.running {
            Err(Error::Running)
        } else {
            Ok(())
        }
    }

    fn expect(&self, direction: Direction) -> Result<(), Error> {
        if !self.running {
            return Err(Error::NotRunning);
        }
        if self.direction != direction {
            return Err(Error::WrongDirection);
        }
        Ok(())
    }
}
