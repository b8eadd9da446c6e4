//! # walcrypt Core
//!
//! Transparent encryption for write-ahead-log segments.
//!
//! This crate sits between the WAL engine and raw segment I/O:
//! - [`SegmentStorage`] - the storage manager interface the engine calls
//! - [`EncryptedSmgr`] / [`StandardSmgr`] - encrypting and pass-through managers
//! - [`PageCodec`] - page encryption with a plaintext segment header
//! - [`crypto`] - position-derived IVs, the AES-CTR engine, keys
//! - [`SmgrBootstrap`] - startup selection and buffer allocation
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use walcrypt_core::crypto::{AesCtrEngine, EncryptionKey, KeyRing, KeySpace};
//! use walcrypt_core::wal::{self, LongPageHeader};
//! use walcrypt_core::{install_smgr, Config, DecryptContext, SegmentPosition, SegmentStorage};
//! use walcrypt_storage::InMemorySegment;
//!
//! let keys = KeyRing::with_key(KeySpace::WAL, EncryptionKey::generate());
//! let config = Config::new().wal_encrypt(true).wal_buffers(4);
//! let mut smgr = install_smgr(config, Arc::new(keys), Arc::new(AesCtrEngine::new())).unwrap();
//!
//! let segment = InMemorySegment::new();
//! let pos = SegmentPosition::new(1, 0);
//! let mut pages = vec![7u8; 2 * 8192];
//! LongPageHeader::new(1, 0, 42, 16 << 20, 8192).encode_into(&mut pages);
//! smgr.seg_write(&segment, &pages, 0, pos).unwrap();
//!
//! // On disk the header stays readable and flagged; the body is ciphertext.
//! let disk = segment.data();
//! assert!(wal::is_encrypted(&disk));
//! assert_ne!(disk[8192..], pages[8192..]);
//!
//! let mut ctx = DecryptContext::new();
//! let mut out = vec![0u8; pages.len()];
//! smgr.seg_read(&mut ctx, &segment, &mut out, 0, pos).unwrap();
//! assert_eq!(out, pages);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bootstrap;
mod config;
pub mod crypto;
mod error;
pub mod smgr;
pub mod wal;

pub use bootstrap::{install_smgr, ScratchState, SmgrBootstrap};
pub use config::{
    Config, DEFAULT_IO_ALIGN, DEFAULT_PAGE_SIZE, DEFAULT_SEGMENT_SIZE, DEFAULT_SHARED_BUFFERS,
    MAX_SEGMENT_SIZE, MIN_WAL_BUFFERS,
};
pub use error::{CoreError, CoreResult};
pub use smgr::{DecryptContext, EncryptedSmgr, PageCodec, ScratchBuffer, SegmentStorage, StandardSmgr};
pub use wal::SegmentPosition;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
