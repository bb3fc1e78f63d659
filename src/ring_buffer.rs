//! Bounded ring buffer for sliding-window history.
//!
//! This module provides a fixed-capacity circular buffer backed by a single
//! boxed slice and a head index. Key properties:
//!
//! - **Bounded capacity**: Never exceeds configured size
//! - **Strict FIFO**: At capacity, a push evicts exactly the oldest value
//! - **Zero allocations after construction**: Storage is allocated once
//!
//! # Example
//!
//! ```rust
//! use trueno_anomaly::ring_buffer::RingBuffer;
//!
//! let mut buffer = RingBuffer::new(100);
//! for i in 0..200 {
//!     buffer.push(i as f64);
//! }
//! assert_eq!(buffer.len(), 100); // Bounded
//! assert_eq!(buffer.latest(), Some(&199.0));
//! ```

use std::collections::TryReserveError;

/// A fixed-capacity ring buffer.
///
/// Storage is a contiguous boxed slice written in place; `head` is the next
/// write position and the live region is the `len` slots behind it.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Contiguous storage, allocated once.
    data: Box<[T]>,
    /// Next write position.
    head: usize,
    /// Number of valid elements.
    len: usize,
}

impl<T: Clone + Default> RingBuffer<T> {
    /// Creates a new ring buffer with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if capacity is 0.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Ring buffer capacity must be greater than 0");
        Self { data: vec![T::default(); capacity].into_boxed_slice(), head: 0, len: 0 }
    }

    /// Creates a ring buffer, reporting allocation failure instead of
    /// aborting.
    ///
    /// # Errors
    ///
    /// Returns [`TryReserveError`] if storage for `capacity` elements cannot
    /// be allocated.
    ///
    /// # Panics
    ///
    /// Panics if capacity is 0.
    pub fn try_new(capacity: usize) -> Result<Self, TryReserveError> {
        assert!(capacity > 0, "Ring buffer capacity must be greater than 0");
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)?;
        data.resize(capacity, T::default());
        Ok(Self { data: data.into_boxed_slice(), head: 0, len: 0 })
    }
}

impl<T> RingBuffer<T> {
    /// Pushes a value into the buffer.
    ///
    /// If the buffer is at capacity the oldest value is overwritten and
    /// returned. O(1), never allocates.
    pub fn push(&mut self, value: T) -> Option<T> {
        let capacity = self.data.len();
        let evicted = std::mem::replace(&mut self.data[self.head], value);
        self.head = (self.head + 1) % capacity;

        if self.len < capacity {
            self.len += 1;
            None
        } else {
            Some(evicted)
        }
    }

    /// Returns the most recent value, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        let capacity = self.data.len();
        self.data.get((self.head + capacity - 1) % capacity)
    }

    /// Returns the oldest value, if any.
    #[must_use]
    pub fn oldest(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        self.data.get(self.start())
    }

    /// Returns the current number of elements in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if the buffer is at capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len == self.data.len()
    }

    /// Returns the maximum capacity of the buffer.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Returns the live contents as two slices, oldest first.
    ///
    /// The second slice is non-empty only once the buffer has wrapped.
    #[must_use]
    pub fn as_slices(&self) -> (&[T], &[T]) {
        let capacity = self.data.len();
        let start = self.start();
        let end = start + self.len;

        if end <= capacity {
            (&self.data[start..end], &[])
        } else {
            (&self.data[start..], &self.data[..end - capacity])
        }
    }

    /// Returns an iterator over the values from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + Clone + '_ {
        let (front, back) = self.as_slices();
        front.iter().chain(back.iter())
    }

    /// Clears all elements from the buffer. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    fn start(&self) -> usize {
        let capacity = self.data.len();
        (self.head + capacity - self.len) % capacity
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Returns an owned snapshot of the contents, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        let (front, back) = self.as_slices();
        let mut out = Vec::with_capacity(self.len);
        out.extend_from_slice(front);
        out.extend_from_slice(back);
        out
    }
}

// ============================================================================
// Tests
// ============================================================================


// ============================================================================
// Property-based tests with proptest
// ============================================================================
