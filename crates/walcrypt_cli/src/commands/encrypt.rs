//! Encrypt command implementation.

use super::{load_keys, read_header, CliError, CliResult, SegmentArgs};
use std::sync::Arc;
use tracing::info;
use walcrypt_core::crypto::AesCtrEngine;
use walcrypt_core::install_smgr;
use walcrypt_storage::{FileSegment, SegmentFile};

/// Runs the encrypt command.
///
/// Writes the segment batch by batch through an encrypting storage manager,
/// exactly as the log writer would.
pub fn run(args: &SegmentArgs) -> CliResult<()> {
    let input = FileSegment::open_read_only(&args.segment)?;
    let header = read_header(&input)?;
    if header.is_encrypted() {
        return Err(CliError::Usage(format!(
            "{} is already encrypted",
            args.segment.display()
        )));
    }

    let position = args.position(u64::from(header.seg_size))?;
    let config = args.config(&header)?;
    let batch_len = config.effective_wal_buffers() * config.page_size;
    let mut smgr = install_smgr(
        config,
        Arc::new(load_keys(&args.key_file)?),
        Arc::new(AesCtrEngine::new()),
    )?;

    let size = input.size()?;
    let output = FileSegment::create(&args.out, size)?;
    let mut buf = vec![0u8; batch_len];
    let mut offset = 0u64;

    while offset < size {
        let read = input.read_at(&mut buf, offset)?;
        if read == 0 {
            break;
        }
        smgr.seg_write(&output, &buf[..read], offset, position)?;
        offset += read as u64;
    }
    output.sync()?;

    info!(%position, bytes = offset, "encrypted segment");
    println!(
        "Encrypted {} ({}) to {}",
        args.segment.display(),
        position,
        args.out.display()
    );
    Ok(())
}
