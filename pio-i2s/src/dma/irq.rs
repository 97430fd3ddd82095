use core::cell::Cell;

use critical_section::Mutex;

use super::ChannelId;
use crate::constants::MAX_DMA_CHANNELS;

/// Users of a DMA controller's shared interrupt line, keyed by channel.
///
/// Bit `n` set means channel `n` has completions routed to the line. The
/// line should be enabled when the first channel attaches and disabled only
/// when the last one detaches, whichever stream it belongs to.
///
/// Typically a `static` shared by every stream on the controller.
pub struct IrqRegistry {
    users: Mutex<Cell<u32>>,
}

impl IrqRegistry {
    pub const fn new() -> Self {
        IrqRegistry {
            users: Mutex::new(Cell::new(0)),
        }
    }

    /// Record `channel` as a user. Returns `true` if the line had no users
    /// before, i.e. the caller must enable it.
    ///
    /// Attaching a channel twice is a no-op returning `false`.
    pub fn attach(&self, channel: ChannelId) -> bool {
        let bit = Self::bit(channel);
        critical_section::with(|cs| {
            let users = self.users.borrow(cs);
            let before = users.get();
            users.set(before | bit);
            before == 0
        })
    }

    /// Remove `channel`. Returns `true` if it was the last user, i.e. the
    /// caller must disable the line.
    ///
    /// Detaching a channel that is not attached is a no-op returning `false`.
    pub fn detach(&self, channel: ChannelId) -> bool {
        let bit = Self::bit(channel);
        critical_section::with(|cs| {
            let users = self.users.borrow(cs);
            let before = users.get();
            if before & bit == 0 {
                return false;
            }
            users.set(before & !bit);
            before == bit
        })
    }

    pub fn is_attached(&self, channel: ChannelId) -> bool {
        let bit = Self::bit(channel);
        critical_section::with(|cs| self.users.borrow(cs).get() & bit != 0)
    }

    /// Number of channels currently using the line.
    pub fn users(&self) -> u32 {
        critical_section::with(|cs| self.users.borrow(cs).get().count_ones())
    }

    fn bit(channel: ChannelId) -> u32 {
        debug_assert!((channel.0 as usize) < MAX_DMA_CHANNELS);
        1u32 << (channel.0 as u32 % MAX_DMA_CHANNELS as u32)
    }
}

impl Default for IrqRegistry {
    fn default() -> Self {
        Self::new()
    }
}
