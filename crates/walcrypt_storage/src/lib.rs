//! # walcrypt Storage
//!
//! Raw positional I/O primitives for WAL segment files.
//!
//! This crate is the lowest layer of walcrypt. A [`SegmentFile`] behaves like
//! a file descriptor used with `pread`/`pwrite`: every call names an absolute
//! byte offset, and the file never interprets the bytes it stores.
//!
//! ## Design Principles
//!
//! - Reads may be short; a read at or past the end returns `0`
//! - Writes past the end extend the file, zero-filling any gap
//! - No knowledge of page headers, timelines or encryption
//! - Must be `Send + Sync` so readers and the WAL writer can share a file
//!
//! ## Available Implementations
//!
//! - [`InMemorySegment`] - For testing and tooling
//! - [`FileSegment`] - OS positional I/O on a real segment file
//!
//! ## Example
//!
//! ```rust
//! use walcrypt_storage::{InMemorySegment, SegmentFile};
//!
//! let segment = InMemorySegment::new();
//! segment.write_at(b"hello world", 0).unwrap();
//!
//! let mut buf = [0u8; 5];
//! let n = segment.read_at(&mut buf, 6).unwrap();
//! assert_eq!(&buf[..n], b"world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::SegmentFile;
pub use error::{StorageError, StorageResult};
pub use file::FileSegment;
pub use memory::InMemorySegment;
