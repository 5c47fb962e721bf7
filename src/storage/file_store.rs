//! File Store - positional I/O over the backing file.
//!
//! The [`FileStore`] is the production [`BackingStore`]:
//! - Opens or creates the file read-write
//! - Reads and writes at absolute offsets without a shared cursor
//! - Syncs on request

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::storage::BackingStore;

/// A backing file treated as a flat array of fixed-size pages.
///
/// # File Layout
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0        P        2P      ...     N×P
/// ```
///
/// # Thread Safety
/// Uses positional reads/writes (`pread`/`pwrite` on Unix), so concurrent
/// calls never race on a file cursor and no lock is needed. The file is
/// never opened in append mode, which would redirect every write to the end.
#[derive(Debug)]
pub struct FileStore {
    file: File,
    path: PathBuf,
}

impl FileStore {
    /// Open the file for read-write, creating it if absent.
    ///
    /// Existing contents are kept.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;

        Ok(Self {
            file,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Path the store was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size of the file in bytes.
    pub fn len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Grow or shrink the file to exactly `len` bytes.
    ///
    /// Growing fills with zeros, which makes fresh pages readable.
    pub fn set_len(&self, len: u64) -> io::Result<()> {
        self.file.set_len(len)
    }
}

impl BackingStore for FileStore {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut total = 0;
        while total < buf.len() {
            match positional::read(&self.file, &mut buf[total..], offset + total as u64) {
                Ok(0) => break, // EOF
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> io::Result<usize> {
        let mut total = 0;
        while total < buf.len() {
            match positional::write(&self.file, &buf[total..], offset + total as u64) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }

    fn sync(&self) -> io::Result<()> {
        self.file.sync_data()
    }
}

#[cfg(unix)]
mod positional {
    use std::fs::File;
    use std::io;
    use std::os::unix::fs::FileExt;

    #[inline]
    pub fn read(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        file.read_at(buf, offset)
    }

    #[inline]
    pub fn write(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
        file.write_at(buf, offset)
    }
}

#[cfg(windows)]
mod positional {
    use std::fs::File;
    use std::io;
    use std::os::windows::fs::FileExt;

    #[inline]
    pub fn read(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        file.seek_read(buf, offset)
    }

    #[inline]
    pub fn write(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
        file.seek_write(buf, offset)
    }
}
