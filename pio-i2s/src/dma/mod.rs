//! Hardware transfer engine (DMA) boundary.
//!
//! [`TransferEngine`] is the capability a DMA controller exposes to this
//! crate. [`TransferAdapter`] owns the one or two channels a ring uses and
//! implements claim/configure/chain/re-arm on top of it. [`IrqRegistry`]
//! tracks which channels share the controller's interrupt line so that
//! tearing one stream down never silences another.
//!
//! ## Topologies
//!
//! ```text
//! Single:     [ch A] ── complete ──► ISR re-arms A on the next slot
//!
//! PingPong:   [ch A] ── chain ──► [ch B] ── chain ──► [ch A] ...
//!                 └─ ISR re-points A two slots on ─┘
//! ```

pub mod adapter;
pub mod irq;

pub use adapter::TransferAdapter;
pub use irq::IrqRegistry;

/// Hardware channel number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelId(pub u8);

/// Peripheral request line that paces a channel (one word per request).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacingSignal(pub u8);

/// Per-beat transfer size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferSize {
    Byte,
    HalfWord,
    Word,
}

/// Static channel setup, applied once at `begin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    pub size: TransferSize,
    pub read_increment: bool,
    pub write_increment: bool,
    pub pacing: PacingSignal,
    /// Channel to trigger when this one completes.
    pub chain_to: Option<ChannelId>,
}

/// A DMA controller.
///
/// Addresses are plain bus addresses. Implementations must not start a
/// channel from any method other than [`start`](Self::start) (or from a
/// chain trigger in hardware).
pub trait TransferEngine {
    /// Claim an unused channel.
    fn claim_channel(&mut self) -> Option<ChannelId>;

    /// Return a channel claimed with [`claim_channel`](Self::claim_channel).
    fn release_channel(&mut self, channel: ChannelId);

    fn configure(&mut self, channel: ChannelId, config: &ChannelConfig);

    fn set_source_address(&mut self, channel: ChannelId, address: usize);

    fn set_dest_address(&mut self, channel: ChannelId, address: usize);

    /// Number of beats for the next run of the channel.
    fn set_transfer_count(&mut self, channel: ChannelId, count: u32);

    fn start(&mut self, channel: ChannelId);

    /// Completion interrupt pending for this channel.
    fn is_complete(&self, channel: ChannelId) -> bool;

    /// Clear the pending completion interrupt.
    fn acknowledge(&mut self, channel: ChannelId);

    /// Route (or stop routing) this channel's completions to the shared line.
    fn set_channel_interrupt(&mut self, channel: ChannelId, enabled: bool);

    /// Enable or disable the controller's shared interrupt line.
    fn set_line_enabled(&mut self, enabled: bool);
}
