use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// A fixed-capacity integer buffer with overwrite-on-full semantics
///
/// Shared between the ingestion and flush tasks of a buffering stage; every
/// mutation happens under one exclusive lock held only for the duration of
/// the call, so the two tasks never observe a torn state. When the buffer is
/// full, adding evicts the oldest element rather than blocking or failing.
#[derive(Debug)]
pub struct RingBuffer {
    slots: Mutex<VecDeque<i64>>,
    capacity: usize,
    evicted: AtomicU64,
}

impl RingBuffer {
    /// Create a new ring buffer with the specified capacity
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Pipeline configuration validates the
    /// capacity before a buffer is ever constructed.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be positive");
        Self {
            slots: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            evicted: AtomicU64::new(0),
        }
    }

    /// Append a value, evicting the oldest element if the buffer is full
    ///
    /// Never blocks and never fails; the stored element count stays within
    /// `[0, capacity]` at all times.
    pub fn add(&self, value: i64) {
        let mut slots = self.slots.lock();
        if slots.len() == self.capacity {
            let oldest = slots.pop_front();
            self.evicted.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(?oldest, "buffer full, evicting oldest");
        }
        slots.push_back(value);
    }

    /// Atomically take a snapshot of all stored elements and reset to empty
    ///
    /// Elements come back in insertion order. An empty buffer drains to an
    /// empty vector.
    pub fn drain(&self) -> Vec<i64> {
        let mut slots = self.slots.lock();
        slots.drain(..).collect()
    }

    /// Number of elements currently stored
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Get the capacity of the buffer
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of elements evicted to make room since creation
    pub fn evicted_count(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }
}
