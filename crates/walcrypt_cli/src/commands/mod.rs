//! CLI command implementations.

pub mod decrypt;
pub mod encrypt;
pub mod inspect;
pub mod keygen;

use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walcrypt_core::crypto::{EncryptionKey, KeyRing, KeySpace};
use walcrypt_core::wal::{LongPageHeader, LONG_HEADER_SIZE};
use walcrypt_core::{Config, CoreError, SegmentPosition};
use walcrypt_storage::{FileSegment, SegmentFile, StorageError};

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Error from the encryption layer.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Error from segment I/O.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Error reading or writing a plain file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The arguments do not describe a usable segment.
    #[error("{0}")]
    Usage(String),
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Arguments shared by commands that rewrite a segment.
#[derive(Debug, Clone, Args)]
pub struct SegmentArgs {
    /// Input segment file
    pub segment: PathBuf,

    /// File holding the 32-byte WAL key
    #[arg(short, long)]
    pub key_file: PathBuf,

    /// Output segment file (must not exist)
    #[arg(short, long)]
    pub out: PathBuf,

    /// Timeline, if the file name does not encode it
    #[arg(long)]
    pub timeline: Option<u32>,

    /// Segment number, if the file name does not encode it
    #[arg(long)]
    pub segno: Option<u64>,

    /// Pages processed per batch
    #[arg(long, default_value_t = 8)]
    pub batch_pages: usize,
}

impl SegmentArgs {
    /// Resolves the segment position, preferring explicit flags over the file name.
    pub fn position(&self, segment_size: u64) -> CliResult<SegmentPosition> {
        if let (Some(timeline), Some(segno)) = (self.timeline, self.segno) {
            return Ok(SegmentPosition::new(timeline, segno));
        }

        let parsed = self
            .segment
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| CliError::Usage("segment path has no file name".into()))
            .and_then(|name| {
                SegmentPosition::parse_file_name(name, segment_size).map_err(|e| {
                    CliError::Usage(format!("{e}; pass --timeline and --segno"))
                })
            })?;

        Ok(SegmentPosition::new(
            self.timeline.unwrap_or(parsed.timeline),
            self.segno.unwrap_or(parsed.segno),
        ))
    }

    /// Configuration sized to one batch, checked against the segment header.
    ///
    /// Fails if the header's page or segment size is unusable, so a corrupt
    /// header never sizes a buffer.
    pub fn config(&self, header: &LongPageHeader) -> CliResult<Config> {
        if self.batch_pages == 0 {
            return Err(CliError::Usage("--batch-pages must be at least 1".into()));
        }
        let config = Config::new()
            .wal_encrypt(true)
            .wal_buffers(self.batch_pages)
            .page_size(header.page_size as usize)
            .segment_size(u64::from(header.seg_size));
        config.validate()?;
        Ok(config)
    }
}

/// Reads a raw key file into a key ring for the WAL key space.
pub fn load_keys(path: &Path) -> CliResult<KeyRing> {
    let bytes = fs::read(path)?;
    let key = EncryptionKey::from_bytes(&bytes)?;
    Ok(KeyRing::with_key(KeySpace::WAL, key))
}

/// Reads the long page header at the start of a segment.
pub fn read_header(segment: &FileSegment) -> CliResult<LongPageHeader> {
    let mut bytes = [0u8; LONG_HEADER_SIZE];
    let read = segment.read_at(&mut bytes, 0)?;
    if read < LONG_HEADER_SIZE {
        return Err(CliError::Usage(format!(
            "{} is too short to hold a segment header",
            segment.path().display()
        )));
    }
    Ok(LongPageHeader::decode(&bytes)?)
}
