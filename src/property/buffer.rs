//! Double-buffer primitives.
//!
//! Every per-frame value that the update side writes and the render side
//! reads is stored twice. The update pass of a tick writes exactly one slot
//! (the *update index*) while the consumer reads the other one (the *render
//! index*). The index is never stored inside a cell: every caller passes it.

use std::ops::{Index, IndexMut};

/// Selects one of the two slots of a double-buffered value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BufferIndex(u8);

impl BufferIndex {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1);

    /// The complementary slot.
    #[inline]
    #[must_use]
    pub const fn other(self) -> Self {
        Self(1 - self.0)
    }

    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<BufferIndex> for usize {
    fn from(index: BufferIndex) -> Self {
        index.as_usize()
    }
}

/// A value stored twice, addressed by [`BufferIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DoubleBuffered<T> {
    values: [T; 2],
}

impl<T: Copy> DoubleBuffered<T> {
    /// Creates a buffer with both slots holding `value`.
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self {
            values: [value, value],
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: BufferIndex) -> T {
        self.values[index.as_usize()]
    }

    /// Writes one slot and leaves the other untouched.
    #[inline]
    pub fn set(&mut self, index: BufferIndex, value: T) {
        self.values[index.as_usize()] = value;
    }

    /// Copies the complementary slot into `index`.
    #[inline]
    pub fn copy_from_other(&mut self, index: BufferIndex) {
        self.values[index.as_usize()] = self.values[index.other().as_usize()];
    }
}

impl<T> Index<BufferIndex> for DoubleBuffered<T> {
    type Output = T;

    fn index(&self, index: BufferIndex) -> &T {
        &self.values[index.as_usize()]
    }
}

impl<T> IndexMut<BufferIndex> for DoubleBuffered<T> {
    fn index_mut(&mut self, index: BufferIndex) -> &mut T {
        &mut self.values[index.as_usize()]
    }
}
