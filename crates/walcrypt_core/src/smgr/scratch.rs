//! The WAL encryption staging buffer.

use crate::config::align_up;
use crate::error::{CoreError, CoreResult};
use tracing::debug;

/// Pre-allocated, aligned staging area for encrypted pages.
///
/// Allocated once at startup and never resized. The WAL write path encrypts
/// into this buffer instead of allocating, because it runs inside a critical
/// section where allocation is not allowed. Contents are not cleared between
/// writes.
pub struct ScratchBuffer {
    storage: Vec<u8>,
    start: usize,
    capacity: usize,
}

impl ScratchBuffer {
    /// Allocates a buffer of at least `capacity` bytes whose first byte is
    /// aligned to `align`.
    ///
    /// The usable capacity is `capacity` rounded up to `align`.
    ///
    /// # Errors
    ///
    /// Returns an error if `align` is not a power of two or the size
    /// overflows.
    pub fn allocate(capacity: usize, align: usize) -> CoreResult<Self> {
        if !align.is_power_of_two() {
            return Err(CoreError::invalid_config(format!(
                "buffer alignment {align} must be a power of two"
            )));
        }
        let capacity = capacity
            .checked_add(align - 1)
            .map(|_| align_up(capacity, align))
            .ok_or_else(|| CoreError::invalid_config("encryption buffer size overflows"))?;
        let total = capacity
            .checked_add(align)
            .ok_or_else(|| CoreError::invalid_config("encryption buffer size overflows"))?;

        let storage = vec![0u8; total];
        let start = storage.as_ptr().align_offset(align);
        if start >= align {
            return Err(CoreError::invalid_config(format!(
                "cannot align encryption buffer to {align} bytes"
            )));
        }

        debug!(capacity, align, "initialized WAL encryption buffer");

        Ok(Self {
            storage,
            start,
            capacity,
        })
    }

    /// Usable size in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the first `len` bytes of the buffer for writing.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ScratchOverflow`] if `len` exceeds the capacity.
    pub fn region_mut(&mut self, len: usize) -> CoreResult<&mut [u8]> {
        if len > self.capacity {
            return Err(CoreError::ScratchOverflow {
                requested: len,
                capacity: self.capacity,
            });
        }
        Ok(&mut self.storage[self.start..self.start + len])
    }

    /// Returns the whole usable buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.storage[self.start..self.start + self.capacity]
    }
}

impl std::fmt::Debug for ScratchBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchBuffer")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_is_aligned() {
        for &align in &[1usize, 16, 512, 4096] {
            let buf = ScratchBuffer::allocate(10_000, align).unwrap();
            assert_eq!(buf.as_slice().as_ptr() as usize % align, 0);
            assert!(buf.capacity() >= 10_000);
            assert_eq!(buf.capacity() % align, 0);
        }
    }

    #[test]
    fn capacity_rounds_up() {
        let buf = ScratchBuffer::allocate(8192 * 3 + 1, 4096).unwrap();
        assert_eq!(buf.capacity(), 8192 * 3 + 4096);
    }

    #[test]
    fn region_at_capacity_succeeds() {
        let mut buf = ScratchBuffer::allocate(8192, 4096).unwrap();
        assert_eq!(buf.region_mut(8192).unwrap().len(), 8192);
    }

    #[test]
    fn region_past_capacity_fails() {
        let mut buf = ScratchBuffer::allocate(8192, 4096).unwrap();
        let result = buf.region_mut(8193);
        assert!(matches!(
            result,
            Err(CoreError::ScratchOverflow {
                requested: 8193,
                capacity: 8192
            })
        ));
    }

    #[test]
    fn region_keeps_address() {
        let mut buf = ScratchBuffer::allocate(4096, 4096).unwrap();
        let first = buf.region_mut(100).unwrap().as_ptr();
        let second = buf.region_mut(4096).unwrap().as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_bad_alignment() {
        assert!(ScratchBuffer::allocate(4096, 3).is_err());
        assert!(ScratchBuffer::allocate(4096, 0).is_err());
    }

    #[test]
    fn rejects_overflowing_size() {
        assert!(ScratchBuffer::allocate(usize::MAX, 4096).is_err());
    }
}
