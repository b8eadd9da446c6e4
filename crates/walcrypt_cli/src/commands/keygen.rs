//! Keygen command implementation.

use super::CliResult;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::info;
use walcrypt_core::crypto::EncryptionKey;

/// Runs the keygen command.
///
/// Refuses to overwrite an existing file.
pub fn run(out: &Path) -> CliResult<()> {
    let key = EncryptionKey::generate();

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(out)?;
    file.write_all(key.as_bytes())?;
    file.sync_all()?;

    info!(path = %out.display(), "wrote WAL key");
    println!("Key written to {}", out.display());
    Ok(())
}
