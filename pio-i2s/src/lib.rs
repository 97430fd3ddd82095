//! # pio-i2s
//!
//! A `no_std`, zero-allocation I2S streaming driver for microcontrollers
//! whose I2S bits are shifted by a programmable I/O block (e.g. RP2040 PIO)
//! and whose samples are moved by DMA. Audio flows through a ring of
//! fixed-size slots: the DMA engine transfers one slot while the
//! application fills (or drains) the others a word at a time.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Ring | [`ring`] | Slot pool, hardware/caller cursors, completion handling, wait policies |
//! | DMA | [`dma`] | `TransferEngine` trait, channel adapter (single / ping-pong), shared IRQ registry |
//! | Protocol | [`protocol`] | `ProtocolEngine` trait and clock divider |
//! | Stream | [`i2s`] | Configuration, lifecycle, packed stereo read/write |
//! | Support | [`config`] / [`error`] / [`constants`] | Configuration types, error enum, limits and defaults |
//!
//! ## Quick start
//!
//! ```ignore
//! use pio_i2s::config::{Direction, Topology};
//! use pio_i2s::dma::{IrqRegistry, TransferAdapter};
//! use pio_i2s::i2s::I2s;
//! use pio_i2s::ring::RingEngine;
//!
//! static RING: RingEngine<8, 16> = RingEngine::new();
//! static IRQ: IrqRegistry = IrqRegistry::new();
//!
//! let mut dma = TransferAdapter::new(dma_controller, &IRQ, Topology::PingPong);
//! let mut out = I2s::new(&RING, pio_sm, Direction::Output);
//! out.set_frequency(44_100)?;
//! out.begin(&mut dma)?;
//!
//! // DMA_IRQ_0 handler:
//! RING.on_interrupt(&mut dma);
//!
//! // Application:
//! out.write16(left, right)?;
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `backoff` | yes | `ring::Backoff` spin-then-park wait policy (requires `embedded-hal`) |
//! | `defmt` | no | Logging through `defmt` |
//!
//! ## Stream parameters
//!
//! - **Slots:** at least 3 ([`constants::MIN_SLOTS`]); two are always held
//!   back from the caller
//! - **Defaults:** 8 slots of 16 words, 16-bit samples, 48 kHz
//!   ([`config::I2sConfig`])
//! - **Faults:** underrun/overrun is a sticky flag, never an error; output
//!   falls back to the silence word

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod config;
pub mod constants;
pub mod dma;
pub mod error;
pub mod i2s;
pub mod protocol;
pub mod ring;

pub use error::{Error, ErrorKind};

#[cfg(test)]
mod sim;

#[cfg(test)]
mod integration_tests;
