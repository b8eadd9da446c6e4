//! WAL storage configuration.

use crate::error::{CoreError, CoreResult};
use crate::wal::LONG_HEADER_SIZE;

/// Default WAL page size in bytes.
pub const DEFAULT_PAGE_SIZE: usize = 8192;
/// Default WAL segment size in bytes.
pub const DEFAULT_SEGMENT_SIZE: u64 = 16 * 1024 * 1024;
/// Default alignment for direct I/O buffers.
pub const DEFAULT_IO_ALIGN: usize = 4096;
/// Default number of shared data buffers used to size WAL buffers.
pub const DEFAULT_SHARED_BUFFERS: usize = 16384;
/// Lower bound for automatically sized WAL buffers.
pub const MIN_WAL_BUFFERS: usize = 8;
/// Upper bound for the segment size (1 GiB).
pub const MAX_SEGMENT_SIZE: u64 = 1024 * 1024 * 1024;

/// Boot-time configuration for the WAL storage manager.
///
/// Nothing here can change once a storage manager has been installed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether WAL pages are encrypted on write.
    pub wal_encrypt: bool,

    /// Number of WAL page buffers, or `None` to size automatically.
    pub wal_buffers: Option<usize>,

    /// Number of shared data buffers; only used for automatic WAL sizing.
    pub shared_buffers: usize,

    /// WAL page size in bytes.
    pub page_size: usize,

    /// WAL segment size in bytes.
    pub segment_size: u64,

    /// Alignment of the encryption buffer.
    pub io_align: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wal_encrypt: false,
            wal_buffers: None,
            shared_buffers: DEFAULT_SHARED_BUFFERS,
            page_size: DEFAULT_PAGE_SIZE,
            segment_size: DEFAULT_SEGMENT_SIZE,
            io_align: DEFAULT_IO_ALIGN,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether WAL encryption is enabled.
    #[must_use]
    pub const fn wal_encrypt(mut self, value: bool) -> Self {
        self.wal_encrypt = value;
        self
    }

    /// Sets an explicit WAL buffer count.
    #[must_use]
    pub const fn wal_buffers(mut self, count: usize) -> Self {
        self.wal_buffers = Some(count);
        self
    }

    /// Sets the shared data buffer count.
    #[must_use]
    pub const fn shared_buffers(mut self, count: usize) -> Self {
        self.shared_buffers = count;
        self
    }

    /// Sets the WAL page size.
    #[must_use]
    pub const fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Sets the WAL segment size.
    #[must_use]
    pub const fn segment_size(mut self, size: u64) -> Self {
        self.segment_size = size;
        self
    }

    /// Sets the encryption buffer alignment.
    #[must_use]
    pub const fn io_align(mut self, align: usize) -> Self {
        self.io_align = align;
        self
    }

    /// Checks that the sizes are usable.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> CoreResult<()> {
        if !self.page_size.is_power_of_two() || self.page_size < LONG_HEADER_SIZE {
            return Err(CoreError::invalid_config(format!(
                "page size {} must be a power of two of at least {LONG_HEADER_SIZE} bytes",
                self.page_size
            )));
        }
        if !self.io_align.is_power_of_two() {
            return Err(CoreError::invalid_config(format!(
                "I/O alignment {} must be a power of two",
                self.io_align
            )));
        }
        if !self.segment_size.is_power_of_two()
            || self.segment_size < self.page_size as u64
            || self.segment_size > MAX_SEGMENT_SIZE
        {
            return Err(CoreError::invalid_config(format!(
                "segment size {} must be a power of two between the page size and {MAX_SEGMENT_SIZE}",
                self.segment_size
            )));
        }
        if self.wal_buffers == Some(0) {
            return Err(CoreError::invalid_config("wal_buffers must be at least 1"));
        }
        self.page_size
            .checked_mul(self.effective_wal_buffers())
            .and_then(|n| n.checked_add(self.io_align))
            .ok_or_else(|| CoreError::invalid_config("WAL buffer size overflows"))?;
        Ok(())
    }

    /// Number of pages that fit in one segment.
    #[must_use]
    pub fn pages_per_segment(&self) -> usize {
        usize::try_from(self.segment_size / self.page_size as u64).unwrap_or(usize::MAX)
    }

    /// Resolves the WAL buffer count.
    ///
    /// Automatic sizing takes 1/32 of the shared buffers, capped at one
    /// segment's worth of pages and floored at [`MIN_WAL_BUFFERS`].
    #[must_use]
    pub fn effective_wal_buffers(&self) -> usize {
        match self.wal_buffers {
            Some(count) => count,
            None => (self.shared_buffers / 32)
                .min(self.pages_per_segment())
                .max(MIN_WAL_BUFFERS),
        }
    }

    /// Size of the encryption buffer: every WAL buffer page, rounded up to
    /// the I/O alignment.
    ///
    /// Only meaningful on a configuration that passed [`validate`](Self::validate).
    #[must_use]
    pub fn scratch_size(&self) -> usize {
        align_up(self.page_size * self.effective_wal_buffers(), self.io_align)
    }
}

/// Rounds `n` up to a multiple of `align`, which must be a power of two.
pub(crate) const fn align_up(n: usize, align: usize) -> usize {
    (n + align - 1) & !(align - 1)
}
