//! Segment fixtures and storage manager helpers.
//!
//! Everything here uses small pages and a fixed key so failures are
//! reproducible.

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use walcrypt_core::crypto::{AesCtrEngine, EncryptionKey, KeyRing, KeySpace, KEY_SIZE};
use walcrypt_core::wal::LongPageHeader;
use walcrypt_core::{install_smgr, Config, SegmentPosition, SegmentStorage};
use walcrypt_storage::FileSegment;

/// Page size used by fixtures.
pub const TEST_PAGE_SIZE: usize = 1024;

/// Segment size used by fixtures.
pub const TEST_SEGMENT_SIZE: u64 = 64 * 1024;

/// System identifier written into fixture headers.
pub const TEST_SYSTEM_ID: u64 = 0x7E57_0000_0000_0001;

/// Raw bytes of the fixed test key.
pub const TEST_KEY: [u8; KEY_SIZE] = [0x3C; KEY_SIZE];

/// A key ring holding [`TEST_KEY`] for the WAL key space.
pub fn test_keys() -> KeyRing {
    KeyRing::with_key(
        KeySpace::WAL,
        EncryptionKey::from_bytes(&TEST_KEY).expect("test key has the right size"),
    )
}

/// Configuration matching the fixture page and segment sizes.
pub fn test_config(wal_encrypt: bool, wal_buffers: usize) -> Config {
    Config::new()
        .wal_encrypt(wal_encrypt)
        .wal_buffers(wal_buffers)
        .page_size(TEST_PAGE_SIZE)
        .segment_size(TEST_SEGMENT_SIZE)
        .io_align(512)
}

/// An installed encrypting storage manager with room for `wal_buffers` pages.
pub fn encrypted_smgr(wal_buffers: usize) -> Box<dyn SegmentStorage> {
    install_smgr(
        test_config(true, wal_buffers),
        Arc::new(test_keys()),
        Arc::new(AesCtrEngine::new()),
    )
    .expect("Failed to install encrypting storage manager")
}

/// An installed pass-through storage manager.
pub fn standard_smgr() -> Box<dyn SegmentStorage> {
    install_smgr(
        test_config(false, 8),
        Arc::new(KeyRing::new()),
        Arc::new(AesCtrEngine::new()),
    )
    .expect("Failed to install standard storage manager")
}

/// `count` pages of a patterned body, starting with a long page header.
pub fn first_pages(page_size: usize, count: usize, timeline: u32) -> Vec<u8> {
    let mut buf = body_pages(page_size, count, u64::from(timeline));
    LongPageHeader::new(
        timeline,
        0,
        TEST_SYSTEM_ID,
        TEST_SEGMENT_SIZE as u32,
        page_size as u32,
    )
    .encode_into(&mut buf);
    buf
}

/// `count` pages of a patterned body with no header, seeded by `seed`.
pub fn body_pages(page_size: usize, count: usize, seed: u64) -> Vec<u8> {
    (0..page_size * count)
        .map(|i| ((i as u64).wrapping_mul(31).wrapping_add(seed) % 251) as u8)
        .collect()
}

/// A zero-filled segment file in a temporary directory.
pub struct SegmentFixture {
    /// The open segment.
    pub segment: FileSegment,
    /// The position the file name encodes.
    pub position: SegmentPosition,
    /// Directory holding the file (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl SegmentFixture {
    /// Creates the segment file for `position`.
    pub fn new(position: SegmentPosition) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let name = position
            .file_name(TEST_SEGMENT_SIZE)
            .expect("Segment position has no file name");
        let path = temp_dir.path().join(name);
        let segment =
            FileSegment::create(&path, TEST_SEGMENT_SIZE).expect("Failed to create segment file");

        Self {
            segment,
            position,
            _temp_dir: temp_dir,
        }
    }

    /// Path of the segment file.
    pub fn path(&self) -> PathBuf {
        self.segment.path().to_path_buf()
    }
}
