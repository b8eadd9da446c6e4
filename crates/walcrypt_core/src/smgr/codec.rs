//! Page-level encryption with the segment header carve-out.

use crate::crypto::{derive_iv, CipherEngine, KeyProvider, KeySpace};
use crate::error::{CoreError, CoreResult};
use crate::smgr::scratch::ScratchBuffer;
use crate::wal::{self, LongPageHeader, SegmentPosition, LONG_HEADER_SIZE};
use std::fmt;
use std::sync::Arc;
use tracing::trace;
use walcrypt_storage::SegmentFile;

/// Per-reader memory of the segment being streamed.
///
/// Only the first page of a segment says whether the segment is encrypted,
/// so a reader keeps the last long header it saw and applies it to the
/// following pages of the same segment.
#[derive(Clone)]
pub struct DecryptContext {
    header: [u8; LONG_HEADER_SIZE],
    position: Option<SegmentPosition>,
}

impl DecryptContext {
    /// Creates a context that has not seen any segment yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            header: [0u8; LONG_HEADER_SIZE],
            position: None,
        }
    }

    /// Forgets the captured header.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The segment whose header was captured last, if any.
    #[must_use]
    pub const fn position(&self) -> Option<SegmentPosition> {
        self.position
    }

    /// Returns true if the captured segment is encrypted.
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.position.is_some() && wal::is_encrypted(&self.header)
    }

    /// Decodes the captured header, with its on-disk flags.
    ///
    /// Returns `None` if nothing was captured or the bytes are not a valid
    /// long header.
    #[must_use]
    pub fn header(&self) -> Option<LongPageHeader> {
        self.position?;
        LongPageHeader::decode(&self.header).ok()
    }

    /// Remembers the first page of `position`.
    ///
    /// A page too short to hold the long header leaves the segment treated
    /// as unencrypted.
    fn capture(&mut self, position: SegmentPosition, first_page: &[u8]) {
        if first_page.len() >= LONG_HEADER_SIZE {
            self.header.copy_from_slice(&first_page[..LONG_HEADER_SIZE]);
        } else {
            self.header = [0u8; LONG_HEADER_SIZE];
        }
        self.position = Some(position);
    }
}

impl Default for DecryptContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DecryptContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptContext")
            .field("position", &self.position)
            .field("encrypted", &self.is_encrypted())
            .finish()
    }
}

/// Encrypts and decrypts batches of WAL pages.
///
/// The IV prefix is derived from `(timeline, segno)` and the cipher is
/// positioned at the absolute file offset of each encrypted range, so pages
/// written in one batch can be read back in any grouping.
#[derive(Clone)]
pub struct PageCodec {
    keys: Arc<dyn KeyProvider>,
    engine: Arc<dyn CipherEngine>,
}

impl PageCodec {
    /// Creates a codec using `keys` for key lookup and `engine` for the cipher.
    pub fn new(keys: Arc<dyn KeyProvider>, engine: Arc<dyn CipherEngine>) -> Self {
        Self { keys, engine }
    }

    /// Encrypts `buf` into `scratch` and writes it to `file` at `offset`.
    ///
    /// At `offset == 0` the long header is copied through in plaintext with
    /// the encrypted flag set. `buf` is never modified.
    ///
    /// # Allocation
    ///
    /// Performs no heap allocation on success, provided the key provider,
    /// cipher engine and `file` do not allocate.
    ///
    /// # Errors
    ///
    /// - [`CoreError::ScratchOverflow`] if `buf` is larger than `scratch`
    /// - [`CoreError::HeaderTruncated`] for a first-page write shorter than
    ///   the long header
    /// - [`CoreError::KeyUnavailable`] if the WAL key cannot be fetched
    /// - [`CoreError::Storage`] with the write error, unchanged
    pub fn write_pages(
        &self,
        scratch: &mut ScratchBuffer,
        file: &dyn SegmentFile,
        buf: &[u8],
        offset: u64,
        position: SegmentPosition,
    ) -> CoreResult<usize> {
        let count = buf.len();
        let out = scratch.region_mut(count)?;
        let key = self.keys.key(KeySpace::WAL)?;

        trace!(
            size = count,
            offset,
            timeline = position.timeline,
            segno = position.segno,
            "write encrypted WAL"
        );

        let enc_off = if offset == 0 {
            if count < LONG_HEADER_SIZE {
                return Err(CoreError::HeaderTruncated { len: count });
            }
            out[..LONG_HEADER_SIZE].copy_from_slice(&buf[..LONG_HEADER_SIZE]);
            wal::set_encrypted(out);
            LONG_HEADER_SIZE
        } else {
            0
        };

        let iv = derive_iv(position.timeline, position.segno);
        self.engine.encrypt(
            key,
            &iv,
            offset + enc_off as u64,
            &buf[enc_off..],
            &mut out[enc_off..],
        )?;

        Ok(file.write_at(out, offset)?)
    }

    /// Reads `buf.len()` bytes at `offset` from `file` and decrypts them in
    /// place if the segment is encrypted.
    ///
    /// At `offset == 0` the long header is captured into `ctx` and the
    /// encrypted flag is cleared in `buf`, so callers always see plaintext
    /// headers. For later pages the decision comes from `ctx`; if `ctx`
    /// belongs to another segment, the first page's header is read first.
    ///
    /// Returns the raw read count. Only the bytes actually read are
    /// decrypted, and a read that finds nothing returns `0` untouched.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Storage`] with the read error, unchanged
    /// - [`CoreError::KeyUnavailable`] if the segment is encrypted and the WAL
    ///   key cannot be fetched
    pub fn read_pages(
        &self,
        ctx: &mut DecryptContext,
        file: &dyn SegmentFile,
        buf: &mut [u8],
        offset: u64,
        position: SegmentPosition,
    ) -> CoreResult<usize> {
        let read = file.read_at(buf, offset)?;

        trace!(
            size = buf.len(),
            read,
            offset,
            timeline = position.timeline,
            segno = position.segno,
            "read WAL segment"
        );

        if read == 0 {
            return Ok(0);
        }
        let data = &mut buf[..read];

        let dec_off = if offset == 0 {
            ctx.capture(position, data);
            if read < LONG_HEADER_SIZE {
                return Ok(read);
            }
            wal::clear_encrypted(data);
            LONG_HEADER_SIZE
        } else {
            if ctx.position != Some(position) {
                Self::refresh_context(ctx, file, position)?;
            }
            0
        };

        if ctx.is_encrypted() && read > dec_off {
            let key = self.keys.key(KeySpace::WAL)?;
            let iv = derive_iv(position.timeline, position.segno);
            self.engine
                .decrypt_in_place(key, &iv, offset + dec_off as u64, &mut data[dec_off..])?;
        }

        Ok(read)
    }

    fn refresh_context(
        ctx: &mut DecryptContext,
        file: &dyn SegmentFile,
        position: SegmentPosition,
    ) -> CoreResult<()> {
        let mut header = [0u8; LONG_HEADER_SIZE];
        let read = file.read_at(&mut header, 0)?;
        ctx.capture(position, &header[..read]);
        trace!(%position, encrypted = ctx.is_encrypted(), "loaded segment header");
        Ok(())
    }
}

impl fmt::Debug for PageCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageCodec").finish_non_exhaustive()
    }
}
