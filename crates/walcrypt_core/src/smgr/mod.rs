//! WAL storage managers.
//!
//! The WAL engine never calls segment I/O directly; it goes through a
//! [`SegmentStorage`] chosen once at startup (see [`crate::SmgrBootstrap`]):
//!
//! - [`StandardSmgr`] - positional read/write, no transformation
//! - [`EncryptedSmgr`] - encrypts page bodies on write, decrypts on read
//!
//! ## Write Serialization
//!
//! `seg_write` takes `&mut self`. The encrypting manager stages ciphertext in
//! one shared buffer, so writes must never overlap; the exclusive borrow is
//! the WAL write lock. Reads take `&self` and a caller-owned
//! [`DecryptContext`], and may run from any number of readers.

mod codec;
mod encrypted;
mod scratch;

pub use codec::{DecryptContext, PageCodec};
pub use encrypted::EncryptedSmgr;
pub use scratch::ScratchBuffer;

use crate::error::CoreResult;
use crate::wal::SegmentPosition;
use walcrypt_storage::SegmentFile;

/// The storage manager interface used by the WAL engine for segment I/O.
///
/// # Invariants
///
/// - `seg_write` writes all of `buf` at `offset` or fails
/// - `seg_read` hands back logically plaintext pages whose headers never
///   carry the encrypted flag
/// - I/O errors are returned unchanged; nothing is retried
pub trait SegmentStorage: Send + Sync {
    /// Writes `buf` to `file` at `offset`.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Preconditions
    ///
    /// May be called inside a critical section: implementations perform no
    /// heap allocation and take no locks of their own on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or cannot be prepared.
    fn seg_write(
        &mut self,
        file: &dyn SegmentFile,
        buf: &[u8],
        offset: u64,
        position: SegmentPosition,
    ) -> CoreResult<usize>;

    /// Reads up to `buf.len()` bytes from `file` at `offset`.
    ///
    /// Returns the raw number of bytes read.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the data cannot be decrypted.
    fn seg_read(
        &self,
        ctx: &mut DecryptContext,
        file: &dyn SegmentFile,
        buf: &mut [u8],
        offset: u64,
        position: SegmentPosition,
    ) -> CoreResult<usize>;

    /// Returns true if this manager encrypts writes.
    fn is_encrypting(&self) -> bool;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Pass-through storage manager.
///
/// Byte-for-byte equivalent to calling the segment file directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardSmgr;

impl SegmentStorage for StandardSmgr {
    fn seg_write(
        &mut self,
        file: &dyn SegmentFile,
        buf: &[u8],
        offset: u64,
        _position: SegmentPosition,
    ) -> CoreResult<usize> {
        Ok(file.write_at(buf, offset)?)
    }

    fn seg_read(
        &self,
        _ctx: &mut DecryptContext,
        file: &dyn SegmentFile,
        buf: &mut [u8],
        offset: u64,
        _position: SegmentPosition,
    ) -> CoreResult<usize> {
        Ok(file.read_at(buf, offset)?)
    }

    fn is_encrypting(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}
