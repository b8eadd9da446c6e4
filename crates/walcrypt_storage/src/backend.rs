//! Segment file trait definition.

use crate::error::StorageResult;

/// Positional I/O on a single WAL segment file.
///
/// This is the `pread`/`pwrite` contract the storage managers build on.
/// Implementations are opaque byte stores.
///
/// # Invariants
///
/// - `write_at` stores exactly `buf` at `offset` and returns `buf.len()`
/// - `read_at` returns the bytes previously written at that offset
/// - `read_at` never fails because of the file length; it returns a short
///   count (possibly `0`) instead
/// - Implementations must not allocate on the `write_at` path unless the
///   file has to grow
///
/// # Implementors
///
/// - [`super::InMemorySegment`] - For testing
/// - [`super::FileSegment`] - For real segment files
pub trait SegmentFile: Send + Sync {
    /// Reads up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns the number of bytes read, which is less than `buf.len()` only
    /// when the end of the file was reached.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> StorageResult<usize>;

    /// Writes all of `buf` at `offset`.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn write_at(&self, buf: &[u8], offset: u64) -> StorageResult<usize>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&self) -> StorageResult<()>;

    /// Returns the current size of the file in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;
}
