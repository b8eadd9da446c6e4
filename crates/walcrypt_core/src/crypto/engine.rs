//! Seekable stream cipher engines.

use crate::crypto::iv::{IvPrefix, IV_PREFIX_SIZE};
use crate::crypto::key::EncryptionKey;
use crate::error::{CoreError, CoreResult};
use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher, StreamCipherSeek};

/// Full IV size of the AES-CTR engine: the 12-byte prefix plus a 32-bit
/// big-endian block counter.
pub const IV_SIZE: usize = 16;

type Aes256Ctr = ctr::Ctr32BE<Aes256>;

/// A seekable stream cipher.
///
/// `offset` is the byte position in the keystream where `buf` starts. Pages
/// written together must decrypt correctly when read back one at a time, so
/// the keystream at a given offset must not depend on where a call began.
///
/// Implementations are called inside the WAL write critical section and must
/// not allocate.
pub trait CipherEngine: Send + Sync {
    /// Encrypts `plaintext` into `ciphertext`, which must have the same length.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CipherFailed`] if the lengths differ or the range
    /// runs past the end of the keystream.
    fn encrypt(
        &self,
        key: &EncryptionKey,
        iv: &IvPrefix,
        offset: u64,
        plaintext: &[u8],
        ciphertext: &mut [u8],
    ) -> CoreResult<()>;

    /// Decrypts `buf` in place.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CipherFailed`] if the range runs past the end of
    /// the keystream.
    fn decrypt_in_place(
        &self,
        key: &EncryptionKey,
        iv: &IvPrefix,
        offset: u64,
        buf: &mut [u8],
    ) -> CoreResult<()>;
}

/// AES-256 in counter mode.
///
/// The counter block is `iv_prefix || be32(offset / 16)`, which gives each
/// IV prefix a 64 GiB keystream.
#[derive(Debug, Default, Clone, Copy)]
pub struct AesCtrEngine;

impl AesCtrEngine {
    /// Creates a new engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn apply(key: &EncryptionKey, iv: &IvPrefix, offset: u64, buf: &mut [u8]) -> CoreResult<()> {
        let len = buf.len();
        let failed = || CoreError::CipherFailed { offset, len };

        let mut full_iv = [0u8; IV_SIZE];
        full_iv[..IV_PREFIX_SIZE].copy_from_slice(iv.as_bytes());

        let mut cipher = Aes256Ctr::new_from_slices(key.as_bytes(), &full_iv).map_err(|_| failed())?;
        cipher.try_seek(offset).map_err(|_| failed())?;
        cipher.try_apply_keystream(buf).map_err(|_| failed())
    }
}

impl CipherEngine for AesCtrEngine {
    fn encrypt(
        &self,
        key: &EncryptionKey,
        iv: &IvPrefix,
        offset: u64,
        plaintext: &[u8],
        ciphertext: &mut [u8],
    ) -> CoreResult<()> {
        if plaintext.len() != ciphertext.len() {
            return Err(CoreError::CipherFailed {
                offset,
                len: plaintext.len(),
            });
        }

        ciphertext.copy_from_slice(plaintext);
        Self::apply(key, iv, offset, ciphertext)
    }

    fn decrypt_in_place(
        &self,
        key: &EncryptionKey,
        iv: &IvPrefix,
        offset: u64,
        buf: &mut [u8],
    ) -> CoreResult<()> {
        Self::apply(key, iv, offset, buf)
    }
}
