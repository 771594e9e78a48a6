//! Fixed-capacity circular FIFO of `CAPACITY` slots, reused in place.
//!
//! [`RingBuffer`] performs no locking: `&mut self` on every mutating call makes
//! the caller responsible for synchronisation. [`SyncRingBuffer`] wraps the
//! same structure in a single mutex so one producer thread and one consumer
//! thread can share it.

use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

const LOG_TARGET: &str = "srbeep::audio::ring_buffer";

/// Where the slot array lives. Behaviour is identical for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Storage {
    /// One heap allocation made at construction.
    #[default]
    Heap,
    /// Slots stored inline in the buffer value itself.
    Inline,
}

/// Which of the three states the buffer is in.
///
/// With only two cursors `idx == end_idx` is ambiguous, so the state is
/// tracked explicitly rather than derived from cursor arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillState {
    Empty,
    Partial,
    Full,
}

enum Slots<T, const N: usize> {
    Heap(Box<[T]>),
    Inline([T; N]),
}

impl<T: Default, const N: usize> Slots<T, N> {
    fn new(storage: Storage) -> Self {
        match storage {
            Storage::Heap => Slots::Heap((0..N).map(|_| T::default()).collect()),
            Storage::Inline => Slots::Inline(std::array::from_fn(|_| T::default())),
        }
    }
}

impl<T, const N: usize> Slots<T, N> {
    fn as_slice(&self) -> &[T] {
        match self {
            Slots::Heap(slots) => slots,
            Slots::Inline(slots) => slots,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        match self {
            Slots::Heap(slots) => slots,
            Slots::Inline(slots) => slots,
        }
    }
}

/// Unsynchronised ring buffer.
pub struct RingBuffer<T, const CAPACITY: usize> {
    slots: Slots<T, CAPACITY>,
    /// Oldest unread element.
    idx: usize,
    /// Next write slot.
    end_idx: usize,
    state: FillState,
}

impl<T: Default, const CAPACITY: usize> RingBuffer<T, CAPACITY> {
    const NON_ZERO: () = assert!(CAPACITY > 0, "ring buffer capacity must be non-zero");

    /// Creates an empty buffer with heap storage.
    pub fn new() -> Self {
        Self::with_storage(Storage::Heap)
    }

    /// Creates an empty buffer with every slot set to `T::default()`.
    pub fn with_storage(storage: Storage) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_ZERO;
        Self {
            slots: Slots::new(storage),
            idx: 0,
            end_idx: 0,
            state: FillState::Empty,
        }
    }
}

impl<T: Default, const CAPACITY: usize> Default for RingBuffer<T, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const CAPACITY: usize> RingBuffer<T, CAPACITY> {
    pub const fn capacity(&self) -> usize {
        CAPACITY
    }

    pub fn fill_state(&self) -> FillState {
        self.state
    }

    pub fn is_empty(&self) -> bool {
        self.state == FillState::Empty
    }

    pub fn has_space(&self) -> bool {
        self.state != FillState::Full
    }

    /// Number of unread elements.
    pub fn len(&self) -> usize {
        match self.state {
            FillState::Empty => 0,
            FillState::Full => CAPACITY,
            FillState::Partial => (self.end_idx + CAPACITY - self.idx) % CAPACITY,
        }
    }

    /// Number of free slots still available for `push`.
    pub fn remaining_space(&self) -> usize {
        CAPACITY - self.len()
    }

    /// Moves `value` into the next write slot.
    ///
    /// Returns the value back untouched if the buffer is full; the buffer is
    /// not modified in that case. Never blocks.
    pub fn push(&mut self, value: T) -> Result<(), T> {
        if self.state == FillState::Full {
            return Err(value);
        }
        self.slots.as_mut_slice()[self.end_idx] = value;
        self.end_idx = (self.end_idx + 1) % CAPACITY;
        self.state = if self.end_idx == self.idx {
            FillState::Full
        } else {
            FillState::Partial
        };
        Ok(())
    }

    /// Oldest unread element, if any.
    pub fn top(&self) -> Option<&T> {
        match self.state {
            FillState::Empty => None,
            _ => Some(&self.slots.as_slice()[self.idx]),
        }
    }

    pub fn top_mut(&mut self) -> Option<&mut T> {
        match self.state {
            FillState::Empty => None,
            _ => Some(&mut self.slots.as_mut_slice()[self.idx]),
        }
    }

    /// Retires the oldest element. No-op on an empty buffer.
    pub fn pop(&mut self) -> bool {
        self.pop_with(|_| {})
    }

    /// Retires the oldest element, handing it to `on_retire` first.
    ///
    /// `on_retire` is not called when the buffer is empty. Returns whether an
    /// element was retired.
    pub fn pop_with<F>(&mut self, on_retire: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        if self.state == FillState::Empty {
            return false;
        }
        on_retire(&mut self.slots.as_mut_slice()[self.idx]);
        self.idx = (self.idx + 1) % CAPACITY;
        self.state = if self.idx == self.end_idx {
            FillState::Empty
        } else {
            FillState::Partial
        };
        true
    }
}

/// Ring buffer whose operations are serialised by one mutex.
///
/// Each call holds the lock only for the O(1) cursor/slot update. The one
/// deliberate exception is [`SyncRingBuffer::locked_top`], which keeps the
/// lock for as long as the returned guard lives.
pub struct SyncRingBuffer<T, const CAPACITY: usize> {
    inner: Mutex<RingBuffer<T, CAPACITY>>,
}

impl<T: Default, const CAPACITY: usize> SyncRingBuffer<T, CAPACITY> {
    pub fn new() -> Self {
        Self::with_storage(Storage::Heap)
    }

    pub fn with_storage(storage: Storage) -> Self {
        Self {
            inner: Mutex::new(RingBuffer::with_storage(storage)),
        }
    }
}

impl<T: Default, const CAPACITY: usize> Default for SyncRingBuffer<T, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const CAPACITY: usize> SyncRingBuffer<T, CAPACITY> {
    // Every operation leaves the cursors consistent before it can panic, so a
    // poisoned lock still guards a valid buffer.
    fn lock(&self) -> MutexGuard<'_, RingBuffer<T, CAPACITY>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub const fn capacity(&self) -> usize {
        CAPACITY
    }

    pub fn fill_state(&self) -> FillState {
        self.lock().fill_state()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn has_space(&self) -> bool {
        self.lock().has_space()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn remaining_space(&self) -> usize {
        self.lock().remaining_space()
    }

    pub fn push(&self, value: T) -> Result<(), T> {
        let result = self.lock().push(value);
        if result.is_err() {
            trace!(target: LOG_TARGET, "push rejected, buffer full");
        }
        result
    }

    /// Copy of the oldest element.
    ///
    /// A reference cannot outlive the internal lock; use
    /// [`locked_top`](Self::locked_top) to read and mutate the front in place.
    pub fn top(&self) -> Option<T>
    where
        T: Clone,
    {
        self.lock().top().cloned()
    }

    /// Borrows the front element with the lock held until the guard drops.
    pub fn locked_top(&self) -> LockedTop<'_, T, CAPACITY> {
        LockedTop { guard: self.lock() }
    }

    /// Runs `f` on the front element under the lock.
    pub fn with_top<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        self.lock().top_mut().map(f)
    }

    pub fn pop(&self) -> bool {
        self.lock().pop()
    }

    pub fn pop_with<F>(&self, on_retire: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        self.lock().pop_with(on_retire)
    }
}

/// Scoped access to the front of a [`SyncRingBuffer`].
///
/// References handed out by the guard borrow from it, so they cannot be used
/// once the lock is released.
pub struct LockedTop<'a, T, const CAPACITY: usize> {
    guard: MutexGuard<'a, RingBuffer<T, CAPACITY>>,
}

impl<'a, T, const CAPACITY: usize> LockedTop<'a, T, CAPACITY> {
    pub fn get(&self) -> Option<&T> {
        self.guard.top()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.guard.top_mut()
    }

    /// Retires the front element without releasing the lock in between.
    pub fn pop(mut self) -> bool {
        self.guard.pop()
    }

    pub fn pop_with<F>(mut self, on_retire: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        self.guard.pop_with(on_retire)
    }
}
