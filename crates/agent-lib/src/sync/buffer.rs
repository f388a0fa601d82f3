//! Bounded backlog of snapshots awaiting delivery
//!
//! A fixed-capacity ring: adding to a full buffer overwrites the oldest
//! entry, and a failed send can be put back at the front for retry.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Fixed-capacity circular FIFO
#[derive(Debug)]
pub struct BacklogBuffer<T> {
    slots: Vec<Option<T>>,
    /// Index of the oldest entry
    start: usize,
    size: usize,
}

impl<T> BacklogBuffer<T> {
    /// Create a buffer holding at most `capacity` entries (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            start: 0,
            size: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn is_full(&self) -> bool {
        self.size == self.capacity()
    }

    /// Append an entry, returning the oldest entry if it was overwritten
    pub fn add(&mut self, item: T) -> Option<T> {
        let capacity = self.capacity();
        if self.size < capacity {
            let idx = (self.start + self.size) % capacity;
            self.slots[idx] = Some(item);
            self.size += 1;
            None
        } else {
            let evicted = self.slots[self.start].replace(item);
            self.start = (self.start + 1) % capacity;
            evicted
        }
    }

    /// Remove and return the oldest entry
    pub fn pop(&mut self) -> Option<T> {
        if self.size == 0 {
            return None;
        }
        let item = self.slots[self.start].take();
        self.start = (self.start + 1) % self.capacity();
        self.size -= 1;
        item
    }

    /// Put an entry back at the front so it is popped next
    ///
    /// Hands the item back when the buffer is full.
    pub fn requeue(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        let capacity = self.capacity();
        self.start = (self.start + capacity - 1) % capacity;
        self.slots[self.start] = Some(item);
        self.size += 1;
        Ok(())
    }
}

/// Backlog shared between the collection and delivery loops
///
/// Every operation holds the lock for its whole duration; the ring itself
/// is never exposed.
#[derive(Debug)]
pub struct SharedBacklog<T> {
    inner: Arc<Mutex<BacklogBuffer<T>>>,
}

impl<T> Clone for SharedBacklog<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SharedBacklog<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BacklogBuffer::new(capacity))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BacklogBuffer<T>> {
        // Every ring operation leaves the indices consistent, so a
        // poisoned lock still guards a valid buffer.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add(&self, item: T) -> Option<T> {
        self.lock().add(item)
    }

    pub fn pop(&self) -> Option<T> {
        self.lock().pop()
    }

    pub fn requeue(&self, item: T) -> Result<(), T> {
        self.lock().requeue(item)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }
}

/// Number of samples covering one retention window, rounded up, at least one
pub fn capacity_for(retention: Duration, interval: Duration) -> usize {
    if interval.is_zero() {
        return 1;
    }
    let retention = retention.as_nanos();
    let interval = interval.as_nanos();
    let slots = retention.div_ceil(interval);
    usize::try_from(slots).unwrap_or(usize::MAX).max(1)
}
