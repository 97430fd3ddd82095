//! Wait policies for blocking ring operations.
//!
//! A blocked `write`/`read`/`flush` re-tests its condition and calls
//! [`Wait::pause`] between tests. The policy decides whether to keep waiting
//! and how: spin, spin with a budget, or spin then park on a delay provider.
//!
//! Blocking relies on completion interrupts continuing to fire. Blocking on
//! the only core that services them, or with interrupts masked, never
//! returns unless the policy has a deadline.

use crate::error::Error;

/// Called once per failed check while an operation is blocked.
pub trait Wait {
    /// Pause before the next check, or return the error the blocked
    /// operation should fail with.
    fn pause(&mut self) -> Result<(), Error>;
}

/// Fail immediately with [`Error::WouldBlock`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWait;

impl Wait for NoWait {
    fn pause(&mut self) -> Result<(), Error> {
        Err(Error::WouldBlock)
    }
}

/// Spin forever without yielding.
#[derive(Debug, Default, Clone, Copy)]
pub struct Spin;

impl Wait for Spin {
    #[inline]
    fn pause(&mut self) -> Result<(), Error> {
        core::hint::spin_loop();
        Ok(())
    }
}

/// Spin at most `remaining` more times, then fail with [`Error::TimedOut`].
#[derive(Debug, Clone, Copy)]
pub struct SpinLimit {
    remaining: u32,
}

impl SpinLimit {
    pub const fn new(spins: u32) -> Self {
        SpinLimit { remaining: spins }
    }
}

impl Wait for SpinLimit {
    fn pause(&mut self) -> Result<(), Error> {
        if self.remaining == 0 {
            return Err(Error::TimedOut);
        }
        self.remaining -= 1;
        core::hint::spin_loop();
        Ok(())
    }
}

/// Spin for a while, then park on a delay provider between checks.
///
/// With a deadline, gives up with [`Error::TimedOut`] once the parked time
/// would exceed it. Spinning does not count against the deadline.
#[cfg(feature = "backoff")]
pub struct Backoff<D> {
    delay: D,
    spins: u32,
    spun: u32,
    park_us: u32,
    budget_us: Option<u32>,
}

#[cfg(feature = "backoff")]
impl<D: embedded_hal::delay::DelayNs> Backoff<D> {
    /// Spin `spins` times, then park `park_us` microseconds per check.
    pub fn new(delay: D, spins: u32, park_us: u32) -> Self {
        Backoff {
            delay,
            spins,
            spun: 0,
            park_us: park_us.max(1),
            budget_us: None,
        }
    }

    /// Give up after `deadline_us` microseconds of parking.
    pub fn with_deadline(mut self, deadline_us: u32) -> Self {
        self.budget_us = Some(deadline_us);
        self
    }

    /// Recover the delay provider.
    pub fn release(self) -> D {
        self.delay
    }
}

#[cfg(feature = "backoff")]
impl<D: embedded_hal::delay::DelayNs> Wait for Backoff<D> {
    fn pause(&mut self) -> Result<(), Error> {
        if self.spun < self.spins {
            self.spun += 1;
            core::hint::spin_loop();
            return Ok(());
        }
        if let Some(budget) = self.budget_us.as_mut() {
            if *budget < self.park_us {
                return Err(Error::TimedOut);
            }
            *budget -= self.park_us;
        }
        self.delay.delay_us(self.park_us);
        Ok(())
    }
}
