use core::cell::Cell;

use critical_section::Mutex;

/// Sticky overflow/underflow flag.
///
/// Raised from the completion handler, consumed by the caller with
/// test-and-clear semantics. A critical section makes the read-and-clear
/// indivisible on cores without atomic read-modify-write.
pub(crate) struct FaultMonitor {
    flag: Mutex<Cell<bool>>,
}

impl FaultMonitor {
    pub(crate) const fn new() -> Self {
        FaultMonitor {
            flag: Mutex::new(Cell::new(false)),
        }
    }

    pub(crate) fn raise(&self) {
        critical_section::with(|cs| self.flag.borrow(cs).set(true));
    }

    /// Return the flag and clear it.
    pub(crate) fn take(&self) -> bool {
        critical_section::with(|cs| self.flag.borrow(cs).replace(false))
    }

    pub(crate) fn clear(&self) {
        critical_section::with(|cs| self.flag.borrow(cs).set(false));
    }
}
