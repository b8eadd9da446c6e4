//! Error types for segment I/O.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during segment I/O.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The requested range cannot be addressed on this platform.
    #[error("offset out of range: offset {offset}, len {len}")]
    OffsetOverflow {
        /// The requested offset.
        offset: u64,
        /// The requested length.
        len: usize,
    },
}
