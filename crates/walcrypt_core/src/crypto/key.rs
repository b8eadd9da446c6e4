//! Encryption keys and key providers.

use crate::error::{CoreError, CoreResult};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use std::collections::HashMap;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;

/// HKDF info prefix for per-space keys.
const SPACE_KEY_INFO: &[u8] = b"walcrypt-space-key-v1";

/// Encryption key for the WAL cipher.
///
/// The key is automatically zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Generates a new random encryption key.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Creates a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes slice is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CoreError::invalid_key_size(bytes.len(), KEY_SIZE));
        }

        let mut key_bytes = [0u8; KEY_SIZE];
        key_bytes.copy_from_slice(bytes);
        Ok(Self { bytes: key_bytes })
    }

    /// Returns the key as a byte slice.
    ///
    /// # Security
    ///
    /// Don't log or serialize the result.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Derives a key from a password using HKDF-SHA256.
    ///
    /// HKDF is not a password hash; the input should already carry high
    /// entropy (for example a generated passphrase).
    ///
    /// # Errors
    ///
    /// Returns an error if HKDF expansion fails.
    pub fn derive_from_password(password: &[u8], salt: &[u8]) -> CoreResult<Self> {
        let hk = Hkdf::<Sha256>::new(Some(salt), password);

        let mut bytes = [0u8; KEY_SIZE];
        hk.expand(b"walcrypt-encryption-key-v1", &mut bytes)
            .map_err(|_| CoreError::key_derivation_failed("HKDF expand failed"))?;

        Ok(Self { bytes })
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Identifier of a logical key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeySpace(pub u32);

impl KeySpace {
    /// The key space dedicated to the write-ahead log.
    pub const WAL: Self = Self(1);
}

impl fmt::Display for KeySpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::WAL {
            write!(f, "key space {} (wal)", self.0)
        } else {
            write!(f, "key space {}", self.0)
        }
    }
}

/// Source of keys for logical key spaces.
///
/// Lookups happen on every page batch, including inside the WAL write
/// critical section, so implementations must answer from memory without
/// allocating or blocking.
pub trait KeyProvider: Send + Sync {
    /// Returns the key for `space`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::KeyUnavailable`] if no key is known for `space`.
    fn key(&self, space: KeySpace) -> CoreResult<&EncryptionKey>;
}

/// In-memory key provider.
///
/// Keys are resolved up front; [`KeyProvider::key`] is a map lookup.
#[derive(Debug, Default, Clone)]
pub struct KeyRing {
    keys: HashMap<KeySpace, EncryptionKey>,
}

impl KeyRing {
    /// Creates an empty key ring.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a key ring holding `key` for `space`.
    #[must_use]
    pub fn with_key(space: KeySpace, key: EncryptionKey) -> Self {
        let mut ring = Self::new();
        ring.insert(space, key);
        ring
    }

    /// Derives one key per space from `master` with HKDF-SHA256.
    ///
    /// The same master key and space always produce the same key.
    ///
    /// # Errors
    ///
    /// Returns an error if HKDF expansion fails.
    pub fn derive_from_master(master: &EncryptionKey, spaces: &[KeySpace]) -> CoreResult<Self> {
        let hk = Hkdf::<Sha256>::new(None, master.as_bytes());
        let mut ring = Self::new();

        for &space in spaces {
            let mut info = [0u8; SPACE_KEY_INFO.len() + 4];
            info[..SPACE_KEY_INFO.len()].copy_from_slice(SPACE_KEY_INFO);
            info[SPACE_KEY_INFO.len()..].copy_from_slice(&space.0.to_be_bytes());

            let mut bytes = [0u8; KEY_SIZE];
            hk.expand(&info, &mut bytes)
                .map_err(|_| CoreError::key_derivation_failed("HKDF expand failed"))?;
            ring.insert(space, EncryptionKey { bytes });
            bytes.zeroize();
        }

        Ok(ring)
    }

    /// Adds or replaces the key for `space`.
    pub fn insert(&mut self, space: KeySpace, key: EncryptionKey) {
        self.keys.insert(space, key);
    }

    /// Returns true if a key is present for `space`.
    #[must_use]
    pub fn contains(&self, space: KeySpace) -> bool {
        self.keys.contains_key(&space)
    }
}

impl KeyProvider for KeyRing {
    fn key(&self, space: KeySpace) -> CoreResult<&EncryptionKey> {
        self.keys
            .get(&space)
            .ok_or(CoreError::KeyUnavailable { space })
    }
}
