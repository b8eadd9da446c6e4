//! In-memory segment for testing and tooling.

use crate::backend::SegmentFile;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;

/// An in-memory WAL segment.
///
/// This segment stores all data in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Tools that stage a segment before writing it out
///
/// Writes inside the current length never allocate, so a segment created
/// with [`zeroed`](Self::zeroed) can back allocation-sensitive tests.
///
/// # Example
///
/// ```rust
/// use walcrypt_storage::{InMemorySegment, SegmentFile};
///
/// let segment = InMemorySegment::zeroed(8192);
/// segment.write_at(b"test data", 0).unwrap();
/// assert_eq!(segment.size().unwrap(), 8192);
/// ```
#[derive(Debug, Default)]
pub struct InMemorySegment {
    data: RwLock<Vec<u8>>,
}

impl InMemorySegment {
    /// Creates a new empty segment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a zero-filled segment of `len` bytes.
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self::with_data(vec![0u8; len])
    }

    /// Creates a segment with pre-existing data.
    ///
    /// Useful for testing the read path against crafted bytes.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Returns a copy of all data in the segment.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.read().clone()
    }
}

fn checked_range(offset: u64, len: usize) -> StorageResult<(usize, usize)> {
    let start = usize::try_from(offset).map_err(|_| StorageError::OffsetOverflow { offset, len })?;
    let end = start
        .checked_add(len)
        .ok_or(StorageError::OffsetOverflow { offset, len })?;
    Ok((start, end))
}

impl SegmentFile for InMemorySegment {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> StorageResult<usize> {
        let data = self.data.read();
        let (start, end) = checked_range(offset, buf.len())?;

        if start >= data.len() {
            return Ok(0);
        }

        let end = end.min(data.len());
        let n = end - start;
        buf[..n].copy_from_slice(&data[start..end]);
        Ok(n)
    }

    fn write_at(&self, buf: &[u8], offset: u64) -> StorageResult<usize> {
        let mut data = self.data.write();
        let (start, end) = checked_range(offset, buf.len())?;

        if end > data.len() {
            data.resize(end, 0);
        }

        data[start..end].copy_from_slice(buf);
        Ok(buf.len())
    }

    fn sync(&self) -> StorageResult<()> {
        // Nothing to make durable
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.read().len() as u64)
    }
}
