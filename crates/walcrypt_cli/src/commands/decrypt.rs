//! Decrypt command implementation.

use super::{load_keys, read_header, CliResult, SegmentArgs};
use std::sync::Arc;
use tracing::{info, warn};
use walcrypt_core::crypto::AesCtrEngine;
use walcrypt_core::{DecryptContext, PageCodec};
use walcrypt_storage::{FileSegment, SegmentFile};

/// Runs the decrypt command.
///
/// Streams the segment through the decrypting read path, so the copy has
/// plaintext bodies and a header with the encrypted flag cleared.
pub fn run(args: &SegmentArgs) -> CliResult<()> {
    let input = FileSegment::open_read_only(&args.segment)?;
    let header = read_header(&input)?;
    // The header is untrusted input; its sizes decide the batch buffer.
    let config = args.config(&header)?;
    let batch_len = config.effective_wal_buffers() * config.page_size;
    let position = args.position(u64::from(header.seg_size))?;
    if !header.is_encrypted() {
        warn!(path = %args.segment.display(), "segment is not encrypted, copying as is");
    }

    let codec = PageCodec::new(
        Arc::new(load_keys(&args.key_file)?),
        Arc::new(AesCtrEngine::new()),
    );

    let size = input.size()?;
    let output = FileSegment::create(&args.out, size)?;
    let mut buf = vec![0u8; batch_len];
    let mut ctx = DecryptContext::new();
    let mut offset = 0u64;

    while offset < size {
        let read = codec.read_pages(&mut ctx, &input, &mut buf, offset, position)?;
        if read == 0 {
            break;
        }
        output.write_at(&buf[..read], offset)?;
        offset += read as u64;
    }
    output.sync()?;

    info!(%position, bytes = offset, "decrypted segment");
    println!(
        "Decrypted {} ({}) to {}",
        args.segment.display(),
        position,
        args.out.display()
    );
    Ok(())
}
