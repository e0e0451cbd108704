//! Capacity-bounded FIFO history.
//!
//! Every rolling window in the engine (alignment candidates, readiness
//! samples, feature-point counts) is a [`BoundedHistory`]: pushing past
//! capacity evicts the oldest entry, so memory stays constant regardless of
//! session length.

use std::collections::VecDeque;

/// Fixed-capacity ring of the most recent values, oldest first.
#[derive(Clone, Debug)]
pub struct BoundedHistory<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    /// Create an empty history. A capacity of 0 is bumped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a value, evicting the oldest when full.
    ///
    /// Returns the evicted value, if any.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(value);
        evicted
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffered values.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Most recent value.
    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    /// The `n` most recent values, oldest first. `None` if fewer are buffered.
    pub fn recent(&self, n: usize) -> Option<Vec<&T>> {
        if n > self.items.len() {
            return None;
        }
        Some(self.items.iter().skip(self.items.len() - n).collect())
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
