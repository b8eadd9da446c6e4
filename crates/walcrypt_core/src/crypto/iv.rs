//! Position-derived IV prefixes.

/// Size of the IV prefix in bytes.
pub const IV_PREFIX_SIZE: usize = 12;

/// The position-derived leading bytes of a cipher IV.
///
/// Layout: big-endian timeline (4 bytes) followed by big-endian position
/// (8 bytes). The cipher engine owns whatever follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IvPrefix([u8; IV_PREFIX_SIZE]);

impl IvPrefix {
    /// Returns the raw prefix bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; IV_PREFIX_SIZE] {
        &self.0
    }

    /// Timeline encoded in the prefix.
    #[must_use]
    pub fn timeline(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Position encoded in the prefix.
    #[must_use]
    pub fn position(&self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.0[4..]);
        u64::from_be_bytes(bytes)
    }
}

/// Derives the IV prefix for `(timeline, position)`.
///
/// The mapping is injective, so distinct pairs never share a prefix.
#[must_use]
pub fn derive_iv(timeline: u32, position: u64) -> IvPrefix {
    let mut prefix = [0u8; IV_PREFIX_SIZE];
    prefix[..4].copy_from_slice(&timeline.to_be_bytes());
    prefix[4..].copy_from_slice(&position.to_be_bytes());
    IvPrefix(prefix)
}
