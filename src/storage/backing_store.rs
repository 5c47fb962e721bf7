//! The contract the page cache needs from persistent storage.

use std::io;

/// Byte-addressable storage beneath the page cache.
///
/// Offsets are absolute. Both calls return how many bytes were actually
/// transferred; the cache treats any count other than one page as a
/// `ShortRead`/`ShortWrite`, distinct from an I/O error.
///
/// Implementations retry on their own terms; the cache never retries.
///
/// # Thread Safety
/// Calls arrive concurrently from many threads (one per frame being loaded
/// or flushed), so implementations must be `Send + Sync` and use positional
/// I/O or their own locking.
pub trait BackingStore: Send + Sync {
    /// Read up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns fewer bytes only when the end of the store is reached.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Write `buf` starting at `offset`, extending the store if needed.
    fn write_at(&self, offset: u64, buf: &[u8]) -> io::Result<usize>;

    /// Make previous writes durable.
    fn sync(&self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: BackingStore + ?Sized> BackingStore for std::sync::Arc<S> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> io::Result<usize> {
        (**self).write_at(offset, buf)
    }

    fn sync(&self) -> io::Result<()> {
        (**self).sync()
    }
}
