//! File-based segment I/O.

use crate::backend::SegmentFile;
use crate::error::StorageResult;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// A WAL segment backed by an OS file.
///
/// All I/O is positional (`pread`/`pwrite` on Unix, `seek_read`/`seek_write`
/// on Windows), so a single `FileSegment` can be shared between the WAL
/// writer and any number of readers without a seek lock.
///
/// # Durability
///
/// - `write_at()` hands data to the OS
/// - `sync()` calls `File::sync_all()` to ensure data is on disk
///
/// # Example
///
/// ```no_run
/// use walcrypt_storage::{FileSegment, SegmentFile};
/// use std::path::Path;
///
/// let segment = FileSegment::create(Path::new("000000010000000000000001"), 16 * 1024 * 1024).unwrap();
/// segment.write_at(b"page bytes", 0).unwrap();
/// segment.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileSegment {
    path: PathBuf,
    file: File,
}

impl FileSegment {
    /// Opens an existing segment file for reading and writing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be opened.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Opens an existing segment file read-only.
    ///
    /// Writes through a read-only segment fail with an I/O error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be opened.
    pub fn open_read_only(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new().read(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Creates a new zero-filled segment file of `size` bytes.
    ///
    /// Fails if the file already exists, so a live segment is never clobbered.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists or cannot be created or sized.
    pub fn create(path: &Path, size: u64) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;
        file.set_len(size)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn pread(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    std::os::unix::fs::FileExt::read_at(file, buf, offset)
}

#[cfg(unix)]
fn pwrite(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    std::os::unix::fs::FileExt::write_at(file, buf, offset)
}

#[cfg(windows)]
fn pread(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    std::os::windows::fs::FileExt::seek_read(file, buf, offset)
}

#[cfg(windows)]
fn pwrite(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    std::os::windows::fs::FileExt::seek_write(file, buf, offset)
}

impl SegmentFile for FileSegment {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> StorageResult<usize> {
        let mut total = 0;

        while total < buf.len() {
            match pread(&self.file, &mut buf[total..], offset + total as u64) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(total)
    }

    fn write_at(&self, buf: &[u8], offset: u64) -> StorageResult<usize> {
        let mut total = 0;

        while total < buf.len() {
            match pwrite(&self.file, &buf[total..], offset + total as u64) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write whole buffer",
                    )
                    .into());
                }
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(total)
    }

    fn sync(&self) -> StorageResult<()> {
        self.file.sync_all()?;
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.file.metadata()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageError;
    use tempfile::tempdir;

    #[test]
    fn file_create_is_zero_filled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seg");

        let segment = FileSegment::create(&path, 8192).unwrap();
        assert_eq!(segment.size().unwrap(), 8192);

        let mut buf = [0xFFu8; 16];
        assert_eq!(segment.read_at(&mut buf, 100).unwrap(), 16);
        assert_eq!(buf, [0u8; 16]);
    }

    #[test]
    fn file_create_refuses_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seg");

        FileSegment::create(&path, 1024).unwrap();
        let result = FileSegment::create(&path, 1024);
        assert!(matches!(result, Err(StorageError::Io(_))));
    }

    #[test]
    fn file_write_and_read_at() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seg");
        let segment = FileSegment::create(&path, 4096).unwrap();

        assert_eq!(segment.write_at(b"hello", 10).unwrap(), 5);
        assert_eq!(segment.write_at(b"world", 2000).unwrap(), 5);

        let mut buf = [0u8; 5];
        segment.read_at(&mut buf, 10).unwrap();
        assert_eq!(&buf, b"hello");
        segment.read_at(&mut buf, 2000).unwrap();
        assert_eq!(&buf, b"world");
    }

    #[test]
    fn file_short_read_at_end() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seg");
        let segment = FileSegment::create(&path, 100).unwrap();

        let mut buf = [0u8; 64];
        assert_eq!(segment.read_at(&mut buf, 80).unwrap(), 20);
        assert_eq!(segment.read_at(&mut buf, 100).unwrap(), 0);
        assert_eq!(segment.read_at(&mut buf, 5000).unwrap(), 0);
    }

    #[test]
    fn file_write_past_end_extends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seg");
        let segment = FileSegment::create(&path, 0).unwrap();

        segment.write_at(b"tail", 60).unwrap();
        assert_eq!(segment.size().unwrap(), 64);
    }

    #[test]
    fn file_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seg");

        {
            let segment = FileSegment::create(&path, 1024).unwrap();
            segment.write_at(b"persistent data", 512).unwrap();
            segment.sync().unwrap();
        }

        {
            let segment = FileSegment::open(&path).unwrap();
            let mut buf = [0u8; 15];
            segment.read_at(&mut buf, 512).unwrap();
            assert_eq!(&buf, b"persistent data");
        }
    }

    #[test]
    fn file_read_only_rejects_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seg");
        FileSegment::create(&path, 1024).unwrap();

        let segment = FileSegment::open_read_only(&path).unwrap();
        assert!(segment.write_at(b"x", 0).is_err());
    }

    #[test]
    fn file_open_missing_fails() {
        let dir = tempdir().unwrap();
        let result = FileSegment::open(&dir.path().join("missing"));
        assert!(result.is_err());
    }

    #[test]
    fn file_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seg");

        let segment = FileSegment::create(&path, 0).unwrap();
        assert_eq!(segment.path(), path);
    }
}
