use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// One ring slot: a fixed block of transfer words plus its `empty` tag.
///
/// 4-byte aligned so a transfer engine can walk it a word at a time.
#[repr(C, align(4))]
pub struct Slot<const WORDS: usize> {
    words: UnsafeCell<[u32; WORDS]>,
    empty: AtomicBool,
}

// SAFETY: a slot's words are written either by the caller context (while the
// slot is not hardware-owned) or by the completion handler (for the slot that
// just left the hardware). The ring's cursor discipline keeps those disjoint,
// and the `empty` flag is published with release ordering after the words.
unsafe impl<const WORDS: usize> Sync for Slot<WORDS> {}

impl<const WORDS: usize> Slot<WORDS> {
    const fn new() -> Self {
        Slot {
            words: UnsafeCell::new([0; WORDS]),
            empty: AtomicBool::new(true),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty.load(Ordering::Acquire)
    }

    /// Start address of the slot's words, for programming a transfer engine.
    pub fn address(&self) -> usize {
        self.words.get() as usize
    }

    /// # Safety
    /// The caller must own the slot (not hardware-owned) and `offset < WORDS`.
    pub(crate) unsafe fn write(&self, offset: usize, word: u32) {
        unsafe { (*self.words.get())[offset] = word };
    }

    /// # Safety
    /// The caller must own the slot (not hardware-owned) and `offset < WORDS`.
    pub(crate) unsafe fn read(&self, offset: usize) -> u32 {
        unsafe { (*self.words.get())[offset] }
    }

    /// # Safety
    /// No transfer engine may be running over this slot, and `len <= WORDS`.
    pub(crate) unsafe fn fill(&self, len: usize, word: u32) {
        // SAFETY: no engine is transferring this slot and the caller does not
        // touch it before it is marked empty, so this `&mut` is unaliased.
        let words = unsafe { &mut *self.words.get() };
        words[..len].fill(word);
    }
}

/// Fixed-capacity pool of `SLOTS` slots of `WORDS` words each.
///
/// The active geometry (`count <= SLOTS`, `words <= WORDS`) is set at ring
/// init. Index arguments are expected to be pre-wrapped with [`wrap`](Self::wrap);
/// only debug builds check them.
pub struct SlotPool<const SLOTS: usize, const WORDS: usize> {
    slots: [Slot<WORDS>; SLOTS],
    count: AtomicUsize,
    words: AtomicUsize,
}

impl<const SLOTS: usize, const WORDS: usize> SlotPool<SLOTS, WORDS> {
    pub const fn new() -> Self {
        SlotPool {
            slots: [const { Slot::new() }; SLOTS],
            count: AtomicUsize::new(0),
            words: AtomicUsize::new(0),
        }
    }

    /// Set the active geometry and mark every slot empty.
    pub(crate) fn reset(&self, count: usize, words: usize) {
        debug_assert!(count <= SLOTS && words <= WORDS);
        self.count.store(count, Ordering::Relaxed);
        self.words.store(words, Ordering::Relaxed);
        for slot in &self.slots {
            slot.empty.store(true, Ordering::Release);
        }
    }

    /// Active slot count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Active words per slot.
    pub fn words(&self) -> usize {
        self.words.load(Ordering::Relaxed)
    }

    /// Index arithmetic modulo the active slot count.
    #[inline]
    pub fn wrap(&self, index: usize) -> usize {
        index % self.count()
    }

    #[inline]
    pub fn slot_at(&self, index: usize) -> &Slot<WORDS> {
        debug_assert!(index < self.count());
        &self.slots[index]
    }

    #[inline]
    pub fn is_empty(&self, index: usize) -> bool {
        self.slot_at(index).is_empty()
    }

    #[inline]
    pub fn mark_empty(&self, index: usize) {
        self.slot_at(index).empty.store(true, Ordering::Release);
    }

    #[inline]
    pub fn mark_full(&self, index: usize) {
        self.slot_at(index).empty.store(false, Ordering::Release);
    }

    /// Fill the active part of every slot with `word`.
    ///
    /// # Safety
    /// No transfer engine may be running over the pool.
    pub(crate) unsafe fn fill_all(&self, word: u32) {
        let words = self.words();
        for slot in &self.slots[..self.count()] {
            unsafe { slot.fill(words, word) };
        }
    }

    /// Copy of a slot's active words, for tests.
    #[cfg(test)]
    pub(crate) fn snapshot(&self, index: usize) -> std::vec::Vec<u32> {
        let words = self.words();
        // SAFETY: tests only inspect slots that no simulated transfer is touching.
        (0..words).map(|i| unsafe { self.slot_at(index).read(i) }).collect()
    }
}

impl<const SLOTS: usize, const WORDS: usize> Default for SlotPool<SLOTS, WORDS> {
    fn default() -> Self {
        Self::new()
    }
}
