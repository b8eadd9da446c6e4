//! # walcrypt Testkit
//!
//! Test utilities for walcrypt.
//!
//! This crate provides:
//! - Segment fixtures: page batches with valid headers, on-disk segments
//! - Storage manager helpers with a fixed test key
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use walcrypt_testkit::prelude::*;
//!
//! let mut smgr = encrypted_smgr(8);
//! let segment = walcrypt_storage::InMemorySegment::new();
//! let pages = first_pages(TEST_PAGE_SIZE, 2, 1);
//! smgr.seg_write(&segment, &pages, 0, walcrypt_core::SegmentPosition::new(1, 0)).unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use walcrypt_core::SegmentStorage;
}

pub use fixtures::*;
pub use generators::*;
