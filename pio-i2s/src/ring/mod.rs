//! Slot ring shared between a transfer engine and the caller.
//!
//! [`RingEngine`] is the core of the crate. It owns `SLOTS` fixed slots of
//! `WORDS` transfer words each, lets the caller fill (output) or drain
//! (input) them one word at a time, and advances the hardware side from the
//! transfer-completion interrupt.
//!
//! ## Ownership without locks
//!
//! ```text
//!               caller context                 completion interrupt
//!          ┌──────────────────────┐         ┌───────────────────────┐
//! writes:  │ user cursor/offset   │         │ engine cursors        │
//!          │ slot words           │         │ in-flight cursor      │
//!          │ empty flag on fill/  │         │ empty flag on         │
//!          │ drain                │         │ completion            │
//!          └──────────────────────┘         └───────────────────────┘
//! ```
//!
//! Every field has one writer. The caller never touches the slot the
//! hardware is transferring: it waits (or fails, when non-blocking) until
//! that slot has moved on.
//!
//! ## Output ring, 4 slots, right after `begin`
//!
//! ```text
//!   slot:    0          1            2        3
//!          in flight  look-ahead   caller   caller
//!                     (silence)     ▲ first write lands here
//! ```
//!
//! Two slots are always held back from the caller, so a fresh output ring
//! accepts `(slots - 2) * words` words.
//!
//! ## Usage
//!
//! ```ignore
//! static RING: RingEngine<8, 64> = RingEngine::new();
//! static IRQ: IrqRegistry = IrqRegistry::new();
//!
//! // init
//! RING.init(RingConfig::new(Direction::Output).with_slots(8, 64))?;
//! let mut dma = TransferAdapter::new(controller, &IRQ, Topology::PingPong);
//! RING.begin(&mut dma, pio.pacing_signal(), pio.fifo_address())?;
//!
//! // DMA ISR (owns `dma`)
//! RING.on_interrupt(&mut dma);
//!
//! // application
//! RING.write(sample, true)?;
//! ```

mod cursor;
mod fault;
mod slot;
pub mod wait;

pub use cursor::EngineId;
pub use slot::{Slot, SlotPool};
pub use wait::{NoWait, Spin, SpinLimit, Wait};

#[cfg(feature = "backoff")]
pub use wait::Backoff;

use core::cell::Cell;
use core::sync::atomic::{AtomicU32, AtomicU8, AtomicUsize, Ordering};

use critical_section::Mutex;

use crate::config::{Direction, RingConfig, Topology};
use crate::constants::{MIN_SLOTS, MIN_WORDS_PER_SLOT};
use crate::dma::{PacingSignal, TransferAdapter, TransferEngine};
use crate::error::Error;

use cursor::{HwCursor, UserCursor};
use fault::FaultMonitor;

/// Lifecycle of a [`RingEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    Uninitialized,
    Initialized,
    Running,
    Stopped,
}

impl State {
    const fn from_u8(v: u8) -> Self {
        match v {
            1 => State::Initialized,
            2 => State::Running,
            3 => State::Stopped,
            _ => State::Uninitialized,
        }
    }
}

/// Multi-slot ring between a caller and one or two transfer engines.
///
/// One instance per stream direction. Shared by reference between the
/// caller context and the completion interrupt; all methods take `&self`.
///
/// # Contract
///
/// - Only one context may call the data methods (`write*`, `read*`,
///   `flush*`, `available`).
/// - Only the completion interrupt may call [`on_interrupt`](Self::on_interrupt)
///   / [`complete`](Self::complete).
/// - The ring must not move between `begin` and `deinit`: the transfer
///   engine holds slot addresses.
pub struct RingEngine<const SLOTS: usize, const WORDS: usize> {
    pool: SlotPool<SLOTS, WORDS>,
    hw: [HwCursor; 2],
    /// Slot the hardware is transferring right now.
    in_flight: AtomicUsize,
    /// Engine stride: 1 (single) or 2 (ping-pong).
    engines: AtomicUsize,
    user: UserCursor,
    fault: FaultMonitor,
    callback: Mutex<Cell<Option<fn()>>>,
    silence: AtomicU32,
    direction: AtomicU8,
    first_slot: AtomicUsize,
    state: AtomicU8,
}

impl<const SLOTS: usize, const WORDS: usize> RingEngine<SLOTS, WORDS> {
    /// An uninitialized ring, usable in a `static`.
    pub const fn new() -> Self {
        RingEngine {
            pool: SlotPool::new(),
            hw: [HwCursor::new(), HwCursor::new()],
            in_flight: AtomicUsize::new(0),
            engines: AtomicUsize::new(1),
            user: UserCursor::new(),
            fault: FaultMonitor::new(),
            callback: Mutex::new(Cell::new(None)),
            silence: AtomicU32::new(0),
            direction: AtomicU8::new(Direction::Output.as_u8()),
            first_slot: AtomicUsize::new(0),
            state: AtomicU8::new(State::Uninitialized as u8),
        }
    }

    // ── Lifecycle ──────────────────────────────────────────────────────

    /// Reset all state for a new stream. Touches no hardware.
    ///
    /// Fails without changing anything if the geometry is invalid or the
    /// ring is running.
    pub fn init(&self, config: RingConfig) -> Result<(), Error> {
        if self.state() == State::Running {
            return Err(Error::Running);
        }
        if config.slot_count < MIN_SLOTS || config.slot_count > SLOTS {
            return Err(Error::InvalidSlotCount);
        }
        if config.words_per_slot < MIN_WORDS_PER_SLOT || config.words_per_slot > WORDS {
            return Err(Error::InvalidSlotWords);
        }
        if config.first_slot >= config.slot_count {
            return Err(Error::FirstSlotOutOfRange);
        }

        self.pool.reset(config.slot_count, config.words_per_slot);
        for hw in &self.hw {
            hw.set(config.first_slot, config.first_slot);
        }
        self.in_flight.store(config.first_slot, Ordering::Release);
        self.engines.store(1, Ordering::Relaxed);
        self.user.unset();
        self.fault.clear();
        critical_section::with(|cs| self.callback.borrow(cs).set(None));
        self.silence.store(config.silence, Ordering::Relaxed);
        self.direction.store(config.direction.as_u8(), Ordering::Relaxed);
        self.first_slot.store(config.first_slot, Ordering::Relaxed);
        self.set_state(State::Initialized);
        Ok(())
    }

    /// Claim transfer channels, arm them on the first slots and start.
    ///
    /// Output slots are pre-filled with silence; the look-ahead slot counts
    /// as supplied so the first completion does not report an underrun.
    /// On failure the ring stays [`State::Initialized`] and no channel is
    /// left claimed.
    pub fn begin<E: TransferEngine>(
        &self,
        dma: &mut TransferAdapter<'_, E>,
        pacing: PacingSignal,
        fifo_address: usize,
    ) -> Result<(), Error> {
        match self.state() {
            State::Initialized => {}
            State::Running => return Err(Error::Running),
            State::Uninitialized | State::Stopped => return Err(Error::NotInitialized),
        }

        let count = self.pool.count();
        let words = self.pool.words();
        let direction = self.direction();
        self.pool.reset(count, words);
        if direction == Direction::Output {
            // SAFETY: no engine has been started on this ring yet.
            unsafe { self.pool.fill_all(self.silence()) };
        }
        self.user.unset();
        self.fault.clear();

        dma.claim()?;

        let first = self.first_slot.load(Ordering::Relaxed);
        let stride = dma.topology().engines();
        for &id in dma.engines() {
            let slot = self.pool.wrap(first + id.index());
            let armed = dma.configure(
                id,
                direction,
                pacing,
                fifo_address,
                self.slot_address(slot),
                words,
            );
            if let Err(e) = armed {
                dma.release();
                return Err(e);
            }
            self.hw[id.index()].set(slot, self.pool.wrap(slot + stride));
        }
        if direction == Direction::Output {
            self.pool.mark_full(self.pool.wrap(first + 1));
        }
        self.in_flight.store(first, Ordering::Release);
        self.engines.store(stride, Ordering::Relaxed);
        self.set_state(State::Running);

        dma.enable_interrupts();
        dma.start();
        debug!(
            "ring: running, {} slots x {} words, first slot {}",
            count,
            words,
            first
        );
        Ok(())
    }

    /// Stop servicing completions and release the transfer channels.
    ///
    /// Must not race a blocked call on another context; a blocked call that
    /// observes the stop returns [`Error::NotRunning`].
    pub fn deinit<E: TransferEngine>(&self, dma: &mut TransferAdapter<'_, E>) {
        self.set_state(State::Stopped);
        if dma.is_claimed() {
            dma.release();
        }
        self.user.unset();
        debug!("ring: stopped");
    }

    // ── Caller context ─────────────────────────────────────────────────

    /// Write one word. Blocking calls spin until a slot frees up.
    ///
    /// A non-blocking write refused because every free slot is already
    /// filled drops the word, and the drop is recorded in the sticky
    /// overflow/underflow flag.
    pub fn write(&self, word: u32, blocking: bool) -> Result<(), Error> {
        if blocking {
            return self.write_with(word, &mut Spin);
        }
        let written = self.write_with(word, &mut NoWait);
        if written == Err(Error::WouldBlock) {
            trace!("ring: overflow, caller ahead of slot {}", self.hardware_cursor());
            self.fault.raise();
        }
        written
    }

    /// Write one word, waiting on contention according to `wait`.
    ///
    /// On error nothing is written, the caller position is unchanged and
    /// the fault flag is left alone.
    pub fn write_with<P: Wait>(&self, word: u32, wait: &mut P) -> Result<(), Error> {
        self.expect(Direction::Output)?;
        loop {
            let in_flight = self.hardware_cursor();
            let (slot, offset) = self.user_position(in_flight);
            if slot != in_flight && self.pool.is_empty(slot) {
                // SAFETY: the slot is empty (released by hardware) and not in flight.
                unsafe { self.pool.slot_at(slot).write(offset, word) };
                if offset + 1 == self.pool.words() {
                    self.pool.mark_full(slot);
                    self.user.set(self.pool.wrap(slot + 1), 0);
                } else {
                    self.user.set(slot, offset + 1);
                }
                return Ok(());
            }
            wait.pause()?;
            self.expect(Direction::Output)?;
        }
    }

    /// Read one word. Blocking calls spin until data arrives.
    pub fn read(&self, blocking: bool) -> Result<u32, Error> {
        if blocking {
            self.read_with(&mut Spin)
        } else {
            self.read_with(&mut NoWait)
        }
    }

    /// Read one word, waiting for data according to `wait`.
    ///
    /// On error nothing is consumed and the caller position is unchanged.
    pub fn read_with<P: Wait>(&self, wait: &mut P) -> Result<u32, Error> {
        self.expect(Direction::Input)?;
        loop {
            let in_flight = self.hardware_cursor();
            let (slot, offset) = self.user_position(in_flight);
            if slot != in_flight && !self.pool.is_empty(slot) {
                // SAFETY: the slot is full (completed by hardware) and not in flight.
                let word = unsafe { self.pool.slot_at(slot).read(offset) };
                if offset + 1 == self.pool.words() {
                    self.pool.mark_empty(slot);
                    self.user.set(self.pool.wrap(slot + 1), 0);
                } else {
                    self.user.set(slot, offset + 1);
                }
                return Ok(word);
            }
            wait.pause()?;
            self.expect(Direction::Input)?;
        }
    }

    /// Words the caller can write (output) or read (input) without waiting.
    ///
    /// Counts the caller's current slot from its offset, then one full slot
    /// for every ready slot between it and the in-flight slot. Zero when
    /// not running.
    pub fn available(&self) -> usize {
        if self.state() != State::Running {
            return 0;
        }
        let count = self.pool.count();
        let words = self.pool.words();
        let in_flight = self.hardware_cursor();
        let (mut slot, offset) = self.user_position(in_flight);
        let direction = self.direction();

        let mut avail = 0;
        for _ in 0..count {
            if slot == in_flight {
                break;
            }
            let ready = match direction {
                Direction::Output => self.pool.is_empty(slot),
                Direction::Input => !self.pool.is_empty(slot),
            };
            if !ready {
                break;
            }
            avail += words;
            slot = self.pool.wrap(slot + 1);
        }
        avail.saturating_sub(offset)
    }

    /// Wait until the hardware has caught up with the caller.
    pub fn flush(&self) -> Result<(), Error> {
        self.flush_with(&mut Spin)
    }

    /// Output: wait (per `wait`) until the in-flight slot is the caller's
    /// slot, i.e. everything written has been handed to the hardware.
    ///
    /// Input: drop every received word not yet read and move the caller to
    /// the in-flight slot. Never waits.
    pub fn flush_with<P: Wait>(&self, wait: &mut P) -> Result<(), Error> {
        if self.state() != State::Running {
            return Err(Error::NotRunning);
        }
        match self.direction() {
            Direction::Output => {
                let Some(user) = self.user.slot() else {
                    return Ok(());
                };
                while self.hardware_cursor() != user {
                    wait.pause()?;
                    if self.state() != State::Running {
                        return Err(Error::NotRunning);
                    }
                }
            }
            Direction::Input => {
                let in_flight = self.hardware_cursor();
                let (mut slot, _) = self.user_position(in_flight);
                while slot != in_flight {
                    self.pool.mark_empty(slot);
                    slot = self.pool.wrap(slot + 1);
                }
                self.user.set(in_flight, 0);
            }
        }
        Ok(())
    }

    /// Return and clear the sticky overflow/underflow flag.
    pub fn take_over_underflow(&self) -> bool {
        self.fault.take()
    }

    /// Replace the completion callback. It runs in interrupt context after
    /// every slot completion and must be short and non-blocking.
    pub fn set_callback(&self, callback: Option<fn()>) {
        critical_section::with(|cs| self.callback.borrow(cs).set(callback));
    }

    // ── Interrupt context ──────────────────────────────────────────────

    /// Service every completed engine, in hardware order.
    pub fn on_interrupt<E: TransferEngine>(&self, dma: &mut TransferAdapter<'_, E>) {
        let mut order = EngineId::ALL;
        if dma.topology() == Topology::PingPong
            && self.hw[EngineId::B.index()].current() == self.hardware_cursor()
        {
            order.swap(0, 1);
        }
        for id in order.into_iter().take(dma.topology().engines()) {
            if dma.is_complete(id) {
                self.complete(id, dma);
            }
        }
    }

    /// Handle completion of engine `id`'s current slot.
    ///
    /// Output: the finished slot is reset to silence and released to the
    /// caller; an underrun is recorded if the engine's next slot was never
    /// filled. Input: the finished slot is published to the caller; an
    /// overrun is recorded if the engine's next slot still holds unread
    /// data. Then the engine is pointed at its next slot, cursors advance,
    /// the interrupt is acknowledged and the callback runs.
    pub fn complete<E: TransferEngine>(&self, id: EngineId, dma: &mut TransferAdapter<'_, E>) {
        if self.state() != State::Running {
            dma.acknowledge(id);
            return;
        }
        let hw = &self.hw[id.index()];
        let done = hw.current();
        let next = hw.next();
        let words = self.pool.words();

        match self.direction() {
            Direction::Output => {
                // SAFETY: `done` has just left the hardware, and the caller
                // does not write a slot until it is marked empty.
                unsafe { self.pool.slot_at(done).fill(words, self.silence()) };
                self.pool.mark_empty(done);
                if self.pool.is_empty(next) {
                    trace!("ring: underrun, slot {} not filled", next);
                    self.fault.raise();
                }
            }
            Direction::Input => {
                self.pool.mark_full(done);
                if !self.pool.is_empty(next) {
                    trace!("ring: overrun, slot {} not drained", next);
                    self.fault.raise();
                }
            }
        }

        dma.retarget(id, self.slot_address(next), words);
        let stride = self.engines.load(Ordering::Relaxed);
        hw.set(next, self.pool.wrap(next + stride));
        self.in_flight.store(self.pool.wrap(done + 1), Ordering::Release);
        dma.acknowledge(id);

        if let Some(callback) = critical_section::with(|cs| self.callback.borrow(cs).get()) {
            callback();
        }
    }

    // ── Introspection ──────────────────────────────────────────────────

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        State::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Direction set by the last [`init`](Self::init).
    pub fn direction(&self) -> Direction {
        Direction::from_u8(self.direction.load(Ordering::Relaxed))
    }

    /// Active slot count (`<= SLOTS`).
    pub fn slot_count(&self) -> usize {
        self.pool.count()
    }

    /// Active words per slot (`<= WORDS`).
    pub fn words_per_slot(&self) -> usize {
        self.pool.words()
    }

    /// Slot the hardware is transferring right now.
    pub fn hardware_cursor(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// `(current, next)` slots of engine `id`.
    pub fn engine_position(&self, id: EngineId) -> (usize, usize) {
        let hw = &self.hw[id.index()];
        (hw.current(), hw.next())
    }

    /// Caller `(slot, offset)`, or `None` before the first transfer.
    pub fn user_cursor(&self) -> Option<(usize, usize)> {
        self.user.slot().map(|slot| (slot, self.user.offset()))
    }

    /// Bus address of slot `index`.
    pub fn slot_address(&self, index: usize) -> usize {
        self.pool.slot_at(index).address()
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SlotPool<SLOTS, WORDS> {
        &self.pool
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn set_state(&self, state: State) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn silence(&self) -> u32 {
        self.silence.load(Ordering::Relaxed)
    }

    fn expect(&self, direction: Direction) -> Result<(), Error> {
        if self.state() != State::Running {
            return Err(Error::NotRunning);
        }
        if self.direction() != direction {
            return Err(Error::WrongDirection);
        }
        Ok(())
    }

    /// Caller position, or where it would land if not yet positioned:
    /// output leads the in-flight slot by two, input trails it by one.
    fn user_position(&self, in_flight: usize) -> (usize, usize) {
        match self.user.slot() {
            Some(slot) => (slot, self.user.offset()),
            None => {
                let count = self.pool.count();
                let slot = match self.direction() {
                    Direction::Output => in_flight + 2,
                    Direction::Input => in_flight + count - 1,
                };
                (self.pool.wrap(slot), 0)
            }
        }
    }
}

impl<const SLOTS: usize, const WORDS: usize> Default for RingEngine<SLOTS, WORDS> {
    fn default() -> Self {
        Self::new()
    }
}
