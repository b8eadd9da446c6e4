//! Error types for walcrypt core.

use crate::crypto::KeySpace;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in walcrypt core operations.
///
/// Variants raised on the write path carry only plain-old-data so that
/// constructing them never touches the allocator.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Segment I/O error, propagated unchanged.
    #[error("storage error: {0}")]
    Storage(#[from] walcrypt_storage::StorageError),

    /// A write does not fit in the encryption buffer.
    #[error("write of {requested} bytes exceeds encryption buffer capacity of {capacity} bytes")]
    ScratchOverflow {
        /// Bytes the caller asked to write.
        requested: usize,
        /// Capacity of the encryption buffer.
        capacity: usize,
    },

    /// The encrypting storage manager was installed before its buffer existed.
    #[error("encryption buffer has not been allocated")]
    ScratchNotAllocated,

    /// A write at the start of a segment is shorter than the long page header.
    #[error("first page write of {len} bytes is shorter than the long page header")]
    HeaderTruncated {
        /// Length of the rejected write.
        len: usize,
    },

    /// The key provider has no key for the requested key space.
    #[error("no key available for {space}")]
    KeyUnavailable {
        /// The key space that was requested.
        space: KeySpace,
    },

    /// Invalid key size.
    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Expected size in bytes.
        expected: usize,
        /// Actual size in bytes.
        actual: usize,
    },

    /// Key derivation failed.
    #[error("key derivation failed: {message}")]
    KeyDerivationFailed {
        /// Description of the failure.
        message: String,
    },

    /// The cipher could not process the requested range.
    #[error("cipher failed at offset {offset} for {len} bytes")]
    CipherFailed {
        /// Keystream offset of the range.
        offset: u64,
        /// Length of the range.
        len: usize,
    },

    /// The configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },

    /// Invalid page header or segment name.
    #[error("invalid format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates a key derivation failed error.
    pub fn key_derivation_failed(message: impl Into<String>) -> Self {
        Self::KeyDerivationFailed {
            message: message.into(),
        }
    }

    /// Creates an invalid key size error.
    pub fn invalid_key_size(actual: usize, expected: usize) -> Self {
        Self::InvalidKeySize { expected, actual }
    }
}
