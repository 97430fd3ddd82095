//! Software stand-ins for the DMA controller and protocol engine.
//!
//! [`SimDma`] behaves like a small DMA controller: a fixed number of
//! channels to claim, registers for addresses and counts, and a pending
//! completion flag per channel. Tests drive it explicitly: `transmit` or
//! `receive` moves one slot's worth of words through the programmed
//! address and raises the completion, then the test runs the ring's
//! interrupt handler.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::{BitDepth, Direction, Pins};
use crate::dma::{ChannelConfig, ChannelId, PacingSignal, TransferEngine};
use crate::error::Error;
use crate::protocol::{ClockDivider, ProtocolEngine};

#[derive(Debug, Clone, Default)]
pub struct SimChannel {
    pub claimed: bool,
    pub config: Option<ChannelConfig>,
    pub source: usize,
    pub dest: usize,
    pub count: u32,
    pub starts: u32,
    pub irq_enabled: bool,
    pub pending: bool,
}

#[derive(Debug, Default)]
struct SimState {
    channels: Vec<SimChannel>,
    line_enabled: bool,
}

/// Shared handle to a simulated DMA controller. Clones see the same state.
#[derive(Clone)]
pub struct SimDma {
    state: Arc<Mutex<SimState>>,
}

impl SimDma {
    pub fn new(channels: usize) -> Self {
        SimDma {
            state: Arc::new(Mutex::new(SimState {
                channels: (0..channels).map(|_| SimChannel::default()).collect(),
                line_enabled: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap()
    }

    pub fn free_channels(&self) -> usize {
        self.lock().channels.iter().filter(|c| !c.claimed).count()
    }

    pub fn channel(&self, channel: ChannelId) -> SimChannel {
        self.lock().channels[channel.0 as usize].clone()
    }

    pub fn line_enabled(&self) -> bool {
        self.lock().line_enabled
    }

    /// Raise the completion without moving data.
    pub fn finish(&self, channel: ChannelId) {
        self.lock().channels[channel.0 as usize].pending = true;
    }

    /// Drain the channel's source buffer into the "FIFO" and complete.
    pub fn transmit(&self, channel: ChannelId) -> Vec<u32> {
        let mut state = self.lock();
        let ch = &mut state.channels[channel.0 as usize];
        let src = ch.source as *const u32;
        // SAFETY: tests program `source` with a live ring slot address and
        // `count` with the slot's active word count.
        let words = (0..ch.count as usize)
            .map(|i| unsafe { src.add(i).read_volatile() })
            .collect();
        ch.pending = true;
        words
    }

    /// Fill the channel's destination buffer from the "FIFO" and complete.
    pub fn receive(&self, channel: ChannelId, words: &[u32]) {
        let mut state = self.lock();
        let ch = &mut state.channels[channel.0 as usize];
        let dst = ch.dest as *mut u32;
        for (i, &w) in words.iter().take(ch.count as usize).enumerate() {
            // SAFETY: as for `transmit`, `dest` is a live slot of at least `count` words.
            unsafe { dst.add(i).write_volatile(w) };
        }
        ch.pending = true;
    }
}

impl TransferEngine for SimDma {
    fn claim_channel(&mut self) -> Option<ChannelId> {
        let mut state = self.lock();
        let index = state.channels.iter().position(|c| !c.claimed)?;
        state.channels[index] = SimChannel {
            claimed: true,
            ..SimChannel::default()
        };
        Some(ChannelId(index as u8))
    }

    fn release_channel(&mut self, channel: ChannelId) {
        self.lock().channels[channel.0 as usize].claimed = false;
    }

    fn configure(&mut self, channel: ChannelId, config: &ChannelConfig) {
        self.lock().channels[channel.0 as usize].config = Some(*config);
    }

    fn set_source_address(&mut self, channel: ChannelId, address: usize) {
        self.lock().channels[channel.0 as usize].source = address;
    }

    fn set_dest_address(&mut self, channel: ChannelId, address: usize) {
        self.lock().channels[channel.0 as usize].dest = address;
    }

    fn set_transfer_count(&mut self, channel: ChannelId, count: u32) {
        self.lock().channels[channel.0 as usize].count = count;
    }

    fn start(&mut self, channel: ChannelId) {
        self.lock().channels[channel.0 as usize].starts += 1;
    }

    fn is_complete(&self, channel: ChannelId) -> bool {
        self.lock().channels[channel.0 as usize].pending
    }

    fn acknowledge(&mut self, channel: ChannelId) {
        self.lock().channels[channel.0 as usize].pending = false;
    }

    fn set_channel_interrupt(&mut self, channel: ChannelId, enabled: bool) {
        self.lock().channels[channel.0 as usize].irq_enabled = enabled;
    }

    fn set_line_enabled(&mut self, enabled: bool) {
        self.lock().line_enabled = enabled;
    }
}

/// Simulated protocol engine. Records what it was asked to do.
#[derive(Debug)]
pub struct SimPio {
    pub core_hz: u32,
    pub fail_init: bool,
    pub inits: Vec<(Direction, Pins, BitDepth)>,
    pub divider: Option<ClockDivider>,
    pub enabled: bool,
}

impl SimPio {
    pub const FIFO: usize = 0x5020_0010;
    pub const DREQ: PacingSignal = PacingSignal(0);

    pub fn new() -> Self {
        SimPio {
            core_hz: 125_000_000,
            fail_init: false,
            inits: Vec::new(),
            divider: None,
            enabled: false,
        }
    }
}

impl ProtocolEngine for SimPio {
    fn init(&mut self, direction: Direction, pins: Pins, bits: BitDepth) -> Result<(), Error> {
        if self.fail_init {
            return Err(Error::ProtocolUnavailable);
        }
        self.inits.push((direction, pins, bits));
        Ok(())
    }

    fn core_clock_hz(&self) -> u32 {
        self.core_hz
    }

    fn set_clock_divider(&mut self, divider: ClockDivider) {
        self.divider = Some(divider);
    }

    fn fifo_address(&self) -> usize {
        Self::FIFO
    }

    fn pacing_signal(&self) -> PacingSignal {
        Self::DREQ
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
