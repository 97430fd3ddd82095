use core::sync::atomic::{AtomicUsize, Ordering};

/// Selects one of the (at most two) transfer engines feeding a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineId {
    A,
    B,
}

impl EngineId {
    pub const ALL: [EngineId; 2] = [EngineId::A, EngineId::B];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            EngineId::A => 0,
            EngineId::B => 1,
        }
    }

    #[inline]
    pub const fn other(self) -> EngineId {
        match self {
            EngineId::A => EngineId::B,
            EngineId::B => EngineId::A,
        }
    }
}

/// Per-engine hardware position. Written only by the completion handler
/// (and by `begin` before the engine starts).
pub(crate) struct HwCursor {
    /// Slot the engine is transferring, or is armed to transfer.
    current: AtomicUsize,
    /// Slot the engine moves to after `current` completes.
    next: AtomicUsize,
}

impl HwCursor {
    pub(crate) const fn new() -> Self {
        HwCursor {
            current: AtomicUsize::new(0),
            next: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub(crate) fn current(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn next(&self) -> usize {
        self.next.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn set(&self, current: usize, next: usize) {
        self.current.store(current, Ordering::Release);
        self.next.store(next, Ordering::Release);
    }
}

/// Caller-side position. Written only by the caller context.
pub(crate) struct UserCursor {
    slot: AtomicUsize,
    offset: AtomicUsize,
}

impl UserCursor {
    const UNSET: usize = usize::MAX;

    pub(crate) const fn new() -> Self {
        UserCursor {
            slot: AtomicUsize::new(Self::UNSET),
            offset: AtomicUsize::new(0),
        }
    }

    /// `None` until the first successful read or write positions it.
    #[inline]
    pub(crate) fn slot(&self) -> Option<usize> {
        match self.slot.load(Ordering::Relaxed) {
            Self::UNSET => None,
            slot => Some(slot),
        }
    }

    #[inline]
    pub(crate) fn offset(&self) -> usize {
        self.offset.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set(&self, slot: usize, offset: usize) {
        self.slot.store(slot, Ordering::Relaxed);
        self.offset.store(offset, Ordering::Relaxed);
    }

    pub(crate) fn unset(&self) {
        self.set(Self::UNSET, 0);
    }
}
