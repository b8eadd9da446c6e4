//! Encrypting storage manager.

use crate::error::CoreResult;
use crate::smgr::codec::{DecryptContext, PageCodec};
use crate::smgr::scratch::ScratchBuffer;
use crate::smgr::SegmentStorage;
use crate::wal::SegmentPosition;
use walcrypt_storage::SegmentFile;

/// Storage manager that encrypts WAL page bodies.
///
/// Owns the encryption buffer for the lifetime of the process. Segment
/// headers stay readable: the long header on the first page of each segment
/// is written in plaintext with the encrypted flag set.
#[derive(Debug)]
pub struct EncryptedSmgr {
    codec: PageCodec,
    scratch: ScratchBuffer,
}

impl EncryptedSmgr {
    /// Creates a manager around an already allocated buffer.
    pub fn new(codec: PageCodec, scratch: ScratchBuffer) -> Self {
        Self { codec, scratch }
    }

    /// Largest single write this manager accepts.
    #[must_use]
    pub fn max_write(&self) -> usize {
        self.scratch.capacity()
    }

    /// The codec used for page encryption.
    #[must_use]
    pub fn codec(&self) -> &PageCodec {
        &self.codec
    }
}

impl SegmentStorage for EncryptedSmgr {
    fn seg_write(
        &mut self,
        file: &dyn SegmentFile,
        buf: &[u8],
        offset: u64,
        position: SegmentPosition,
    ) -> CoreResult<usize> {
        self.codec
            .write_pages(&mut self.scratch, file, buf, offset, position)
    }

    fn seg_read(
        &self,
        ctx: &mut DecryptContext,
        file: &dyn SegmentFile,
        buf: &mut [u8],
        offset: u64,
        position: SegmentPosition,
    ) -> CoreResult<usize> {
        self.codec.read_pages(ctx, file, buf, offset, position)
    }

    fn is_encrypting(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "encrypted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{AesCtrEngine, EncryptionKey, KeyRing, KeySpace, KEY_SIZE};
    use crate::error::CoreError;
    use crate::smgr::StandardSmgr;
    use crate::wal::{self, LongPageHeader, LONG_HEADER_SIZE};
    use std::io;
    use std::sync::Arc;
    use walcrypt_storage::{InMemorySegment, StorageError, StorageResult};

    const PAGE: usize = 512;
    const POS: SegmentPosition = SegmentPosition {
        timeline: 1,
        segno: 0,
    };

    fn keys() -> KeyRing {
        KeyRing::with_key(
            KeySpace::WAL,
            EncryptionKey::from_bytes(&[0x5A; KEY_SIZE]).unwrap(),
        )
    }

    fn smgr_with(keys: KeyRing, capacity: usize) -> EncryptedSmgr {
        let codec = PageCodec::new(Arc::new(keys), Arc::new(AesCtrEngine::new()));
        EncryptedSmgr::new(codec, ScratchBuffer::allocate(capacity, 64).unwrap())
    }

    fn smgr() -> EncryptedSmgr {
        smgr_with(keys(), 8 * PAGE)
    }

    /// Three pages: a long header followed by a recognisable body.
    fn first_pages(n: usize) -> Vec<u8> {
        let mut buf: Vec<u8> = (0..n * PAGE).map(|i| (i % 251) as u8).collect();
        LongPageHeader::new(1, 0, 42, 16 * 1024 * 1024, PAGE as u32).encode_into(&mut buf);
        buf
    }

    struct FailingSegment;

    impl SegmentFile for FailingSegment {
        fn read_at(&self, _buf: &mut [u8], _offset: u64) -> StorageResult<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "read failed").into())
        }

        fn write_at(&self, _buf: &[u8], _offset: u64) -> StorageResult<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full").into())
        }

        fn sync(&self) -> StorageResult<()> {
            Ok(())
        }

        fn size(&self) -> StorageResult<u64> {
            Ok(0)
        }
    }

    #[test]
    fn first_page_header_stays_plaintext() {
        let mut smgr = smgr();
        let segment = InMemorySegment::new();
        let plain = first_pages(3);

        assert_eq!(smgr.seg_write(&segment, &plain, 0, POS).unwrap(), plain.len());

        let disk = segment.data();
        let mut expected_header = plain[..LONG_HEADER_SIZE].to_vec();
        wal::set_encrypted(&mut expected_header);
        assert_eq!(&disk[..LONG_HEADER_SIZE], expected_header.as_slice());
        assert_ne!(&disk[LONG_HEADER_SIZE..], &plain[LONG_HEADER_SIZE..]);
    }

    #[test]
    fn three_page_scenario_roundtrip() {
        let mut smgr = smgr();
        let segment = InMemorySegment::new();
        let plain = first_pages(3);
        smgr.seg_write(&segment, &plain, 0, POS).unwrap();

        let mut ctx = DecryptContext::new();
        let mut out = vec![0u8; plain.len()];
        assert_eq!(smgr.seg_read(&mut ctx, &segment, &mut out, 0, POS).unwrap(), out.len());

        assert_eq!(out, plain);
        assert!(!wal::is_encrypted(&out));
        assert!(ctx.is_encrypted());
        assert!(ctx.header().unwrap().is_encrypted());
    }

    #[test]
    fn batch_write_reads_back_page_by_page() {
        let mut smgr = smgr();
        let segment = InMemorySegment::new();
        let plain = first_pages(4);
        smgr.seg_write(&segment, &plain, 0, POS).unwrap();

        let mut ctx = DecryptContext::new();
        for page in 0..4 {
            let offset = page * PAGE;
            let mut out = vec![0u8; PAGE];
            smgr.seg_read(&mut ctx, &segment, &mut out, offset as u64, POS)
                .unwrap();
            assert_eq!(out, plain[offset..offset + PAGE], "page {page}");
        }
    }

    #[test]
    fn later_writes_encrypt_whole_buffer() {
        let mut smgr = smgr();
        let segment = InMemorySegment::new();
        let first = first_pages(1);
        smgr.seg_write(&segment, &first, 0, POS).unwrap();

        let body = vec![0xEEu8; 2 * PAGE];
        smgr.seg_write(&segment, &body, PAGE as u64, POS).unwrap();
        let disk = segment.data();
        assert!(disk[PAGE..PAGE + 64].iter().any(|&b| b != 0xEE));

        let mut ctx = DecryptContext::new();
        let mut out = vec![0u8; 3 * PAGE];
        smgr.seg_read(&mut ctx, &segment, &mut out, 0, POS).unwrap();
        assert_eq!(&out[..PAGE], first.as_slice());
        assert_eq!(&out[PAGE..], body.as_slice());
    }

    #[test]
    fn input_buffer_is_not_mutated() {
        let mut smgr = smgr();
        let segment = InMemorySegment::new();
        let plain = first_pages(2);
        let copy = plain.clone();

        smgr.seg_write(&segment, &plain, 0, POS).unwrap();
        smgr.seg_write(&segment, &plain[PAGE..], PAGE as u64, POS)
            .unwrap();
        assert_eq!(plain, copy);
    }

    #[test]
    fn write_at_capacity_succeeds() {
        let mut smgr = smgr_with(keys(), 4 * PAGE);
        let segment = InMemorySegment::new();
        let buf = vec![1u8; smgr.max_write()];

        assert_eq!(
            smgr.seg_write(&segment, &buf, PAGE as u64, POS).unwrap(),
            buf.len()
        );
    }

    #[test]
    fn write_past_capacity_fails_without_writing() {
        let mut smgr = smgr_with(keys(), 4 * PAGE);
        let segment = InMemorySegment::new();
        let buf = vec![1u8; smgr.max_write() + 1];

        let result = smgr.seg_write(&segment, &buf, 0, POS);
        assert!(matches!(
            result,
            Err(CoreError::ScratchOverflow {
                requested,
                capacity
            }) if requested == 4 * PAGE + 1 && capacity == 4 * PAGE
        ));
        assert_eq!(segment.size().unwrap(), 0);
    }

    #[test]
    fn missing_key_fails_without_writing() {
        let mut smgr = smgr_with(KeyRing::new(), 4 * PAGE);
        let segment = InMemorySegment::new();

        let result = smgr.seg_write(&segment, &first_pages(1), 0, POS);
        assert!(matches!(
            result,
            Err(CoreError::KeyUnavailable {
                space: KeySpace::WAL
            })
        ));
        assert_eq!(segment.size().unwrap(), 0);
    }

    #[test]
    fn short_first_page_write_rejected() {
        let mut smgr = smgr();
        let segment = InMemorySegment::new();

        let result = smgr.seg_write(&segment, &[0u8; LONG_HEADER_SIZE - 1], 0, POS);
        assert!(matches!(result, Err(CoreError::HeaderTruncated { len }) if len == LONG_HEADER_SIZE - 1));
    }

    #[test]
    fn write_error_propagates() {
        let mut smgr = smgr();
        let result = smgr.seg_write(&FailingSegment, &first_pages(1), 0, POS);
        assert!(matches!(result, Err(CoreError::Storage(StorageError::Io(e))) if e.to_string() == "disk full"));
    }

    #[test]
    fn read_error_propagates() {
        let smgr = smgr();
        let mut ctx = DecryptContext::new();
        let mut buf = [0u8; PAGE];
        let result = smgr.seg_read(&mut ctx, &FailingSegment, &mut buf, 0, POS);
        assert!(matches!(result, Err(CoreError::Storage(StorageError::Io(_)))));
    }

    #[test]
    fn plaintext_segment_reads_without_key() {
        let segment = InMemorySegment::new();
        let plain = first_pages(2);
        StandardSmgr.seg_write(&segment, &plain, 0, POS).unwrap();

        let smgr = smgr_with(KeyRing::new(), PAGE);
        let mut ctx = DecryptContext::new();
        let mut out = vec![0u8; plain.len()];
        smgr.seg_read(&mut ctx, &segment, &mut out, 0, POS).unwrap();
        assert_eq!(out, plain);
        assert!(!ctx.is_encrypted());

        let mut page = vec![0u8; PAGE];
        smgr.seg_read(&mut ctx, &segment, &mut page, PAGE as u64, POS)
            .unwrap();
        assert_eq!(page, plain[PAGE..]);
    }

    #[test]
    fn empty_read_returns_zero_untouched() {
        let smgr = smgr();
        let segment = InMemorySegment::with_data(vec![0u8; PAGE]);
        let mut ctx = DecryptContext::new();
        let mut buf = vec![0xAAu8; PAGE];

        assert_eq!(
            smgr.seg_read(&mut ctx, &segment, &mut buf, PAGE as u64, POS).unwrap(),
            0
        );
        assert!(buf.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn short_read_decrypts_only_what_was_read() {
        let mut smgr = smgr();
        let segment = InMemorySegment::new();
        let plain = first_pages(2);
        smgr.seg_write(&segment, &plain, 0, POS).unwrap();

        let mut ctx = DecryptContext::new();
        let mut out = vec![0u8; 4 * PAGE];
        let n = smgr.seg_read(&mut ctx, &segment, &mut out, 0, POS).unwrap();
        assert_eq!(n, 2 * PAGE);
        assert_eq!(&out[..n], plain.as_slice());
        assert!(out[n..].iter().all(|&b| b == 0));
    }

    #[test]
    fn fresh_context_loads_segment_header() {
        let mut smgr = smgr();
        let segment = InMemorySegment::new();
        let plain = first_pages(3);
        smgr.seg_write(&segment, &plain, 0, POS).unwrap();

        // Start streaming mid-segment without having read the first page.
        let mut ctx = DecryptContext::new();
        let mut out = vec![0u8; PAGE];
        smgr.seg_read(&mut ctx, &segment, &mut out, 2 * PAGE as u64, POS)
            .unwrap();
        assert_eq!(out, plain[2 * PAGE..]);
        assert_eq!(ctx.position(), Some(POS));
    }

    #[test]
    fn context_switches_between_segments() {
        let mut smgr = smgr();
        let encrypted = InMemorySegment::new();
        let plain_seg = InMemorySegment::new();
        let other = SegmentPosition::new(1, 1);
        let plain = first_pages(2);

        smgr.seg_write(&encrypted, &plain, 0, POS).unwrap();
        StandardSmgr.seg_write(&plain_seg, &plain, 0, other).unwrap();

        let mut ctx = DecryptContext::new();
        let mut out = vec![0u8; PAGE];
        smgr.seg_read(&mut ctx, &encrypted, &mut out, PAGE as u64, POS)
            .unwrap();
        assert_eq!(out, plain[PAGE..]);

        smgr.seg_read(&mut ctx, &plain_seg, &mut out, PAGE as u64, other)
            .unwrap();
        assert_eq!(out, plain[PAGE..]);
        assert!(!ctx.is_encrypted());
    }

    #[test]
    fn timeline_changes_ciphertext() {
        let mut smgr = smgr();
        let a = InMemorySegment::new();
        let b = InMemorySegment::new();
        let plain = first_pages(1);

        smgr.seg_write(&a, &plain, 0, SegmentPosition::new(1, 5)).unwrap();
        smgr.seg_write(&b, &plain, 0, SegmentPosition::new(2, 5)).unwrap();
        assert_ne!(a.data()[LONG_HEADER_SIZE..], b.data()[LONG_HEADER_SIZE..]);
    }

    #[test]
    fn reports_encrypting() {
        let smgr = smgr();
        assert!(smgr.is_encrypting());
        assert_eq!(smgr.name(), "encrypted");
    }
}
