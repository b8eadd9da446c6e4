//! Cryptographic building blocks for WAL encryption.
//!
//! ## Security Model
//!
//! - Confidentiality only: pages are encrypted with a seekable stream cipher
//!   and carry no authentication tag, so the on-disk size never changes
//! - IVs are derived from page position, never stored
//! - Keys are zeroized on drop
//! - Per-space keys are derived from a master key with HKDF-SHA256
//!
//! ## Usage
//!
//! ```
//! use walcrypt_core::crypto::{derive_iv, AesCtrEngine, CipherEngine, EncryptionKey};
//!
//! let key = EncryptionKey::generate();
//! let iv = derive_iv(1, 42);
//! let engine = AesCtrEngine::new();
//!
//! let plain = *b"secret wal bytes";
//! let mut page = [0u8; 16];
//! engine.encrypt(&key, &iv, 8192, &plain, &mut page).unwrap();
//! assert_ne!(page, plain);
//!
//! engine.decrypt_in_place(&key, &iv, 8192, &mut page).unwrap();
//! assert_eq!(page, plain);
//! ```

mod engine;
mod iv;
mod key;

pub use engine::{AesCtrEngine, CipherEngine, IV_SIZE};
pub use iv::{derive_iv, IvPrefix, IV_PREFIX_SIZE};
pub use key::{EncryptionKey, KeyProvider, KeyRing, KeySpace, KEY_SIZE};
