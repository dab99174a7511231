//! Fixed-capacity circular sample store for streaming frame assembly.
//!
//! Read and write cursors move independently, both modulo the capacity. The
//! occupied length is the modular distance `(write - read) mod capacity`, so a
//! ring holding exactly `capacity` elements reads as empty: size the capacity
//! above the largest backlog the caller keeps.
//!
//! A single `push`, `peek`, `poke` or `pop` may span at most one wraparound,
//! i.e. its length must not exceed the capacity. This is checked in debug
//! builds only.

use crate::error::DspError;

#[derive(Clone, Debug, Default)]
pub struct RingBuffer<T> {
    data: Vec<T>,
    read_idx: usize,
    write_idx: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Unconfigured ring; call [`RingBuffer::set_capacity`] before streaming.
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            read_idx: 0,
            write_idx: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Result<Self, DspError> {
        let mut ring = Self::new();
        ring.set_capacity(capacity)?;
        Ok(ring)
    }

    /// Allocates a zero-filled store and rewinds both cursors. Previously
    /// buffered data is discarded.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), DspError> {
        if capacity == 0 {
            log::warn!("rejecting ring buffer capacity of zero");
            return Err(DspError::InvalidCapacity);
        }
        self.data.clear();
        self.data.resize(capacity, T::default());
        self.read_idx = 0;
        self.write_idx = 0;
        Ok(())
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of buffered elements, normalized to `[0, capacity)`.
    #[inline]
    pub fn size(&self) -> usize {
        let cap = self.capacity();
        if cap == 0 {
            return 0;
        }
        (self.write_idx + cap - self.read_idx) % cap
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.read_idx == self.write_idx
    }

    /// Rewinds both cursors and zeroes the store, keeping the capacity.
    pub fn clear(&mut self) {
        self.data.fill(T::default());
        self.read_idx = 0;
        self.write_idx = 0;
    }

    /// Copies `src` in at the write cursor and advances it.
    pub fn push(&mut self, src: &[T]) {
        let cap = self.capacity();
        if cap == 0 || src.is_empty() {
            return;
        }
        debug_assert!(src.len() <= cap, "push of {} exceeds capacity {}", src.len(), cap);

        let first = src.len().min(cap - self.write_idx);
        self.data[self.write_idx..self.write_idx + first].copy_from_slice(&src[..first]);
        let rest = src.len() - first;
        if rest > 0 {
            self.data[..rest].copy_from_slice(&src[first..]);
        }
        self.write_idx = (self.write_idx + src.len()) % cap;
    }

    /// Copies `dst.len()` elements starting at the read cursor, without
    /// consuming them.
    pub fn peek(&self, dst: &mut [T]) {
        let cap = self.capacity();
        if cap == 0 || dst.is_empty() {
            return;
        }
        debug_assert!(dst.len() <= cap, "peek of {} exceeds capacity {}", dst.len(), cap);

        let first = dst.len().min(cap - self.read_idx);
        dst[..first].copy_from_slice(&self.data[self.read_idx..self.read_idx + first]);
        let rest = dst.len() - first;
        if rest > 0 {
            dst[first..].copy_from_slice(&self.data[..rest]);
        }
    }

    /// Element `index` positions past the read cursor.
    #[inline]
    pub fn peek_at(&self, index: usize) -> T {
        let cap = self.capacity();
        if cap == 0 {
            return T::default();
        }
        self.data[(self.read_idx + index) % cap]
    }

    /// Overwrites already-buffered elements starting at the read cursor.
    /// Cursors do not move.
    pub fn poke(&mut self, src: &[T]) {
        let cap = self.capacity();
        if cap == 0 || src.is_empty() {
            return;
        }
        debug_assert!(src.len() <= cap, "poke of {} exceeds capacity {}", src.len(), cap);

        let first = src.len().min(cap - self.read_idx);
        self.data[self.read_idx..self.read_idx + first].copy_from_slice(&src[..first]);
        let rest = src.len() - first;
        if rest > 0 {
            self.data[..rest].copy_from_slice(&src[first..]);
        }
    }

    #[inline]
    pub fn poke_at(&mut self, index: usize, value: T) {
        let cap = self.capacity();
        if cap == 0 {
            return;
        }
        self.data[(self.read_idx + index) % cap] = value;
    }

    /// Advances the read cursor, logically discarding `count` elements.
    #[inline]
    pub fn pop(&mut self, count: usize) {
        let cap = self.capacity();
        if cap == 0 {
            return;
        }
        debug_assert!(count <= cap, "pop of {count} exceeds capacity {cap}");
        self.read_idx = (self.read_idx + count) % cap;
    }
}
