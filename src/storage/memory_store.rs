//! In-memory backing store.

use std::io;

use parking_lot::RwLock;

use crate::storage::BackingStore;

/// A [`BackingStore`] kept entirely in memory.
///
/// Behaves like a sparse file: writes past the end grow the store with
/// zeros, reads past the end return fewer bytes. Useful for tests and for
/// pools that never need to outlive the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bytes: RwLock<Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-sized to `len` zero bytes.
    pub fn with_len(len: usize) -> Self {
        Self {
            bytes: RwLock::new(vec![0u8; len]),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current contents.
    pub fn contents(&self) -> Vec<u8> {
        self.bytes.read().clone()
    }
}

impl BackingStore for MemoryStore {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let bytes = self.bytes.read();
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        if start >= bytes.len() {
            return Ok(0);
        }
        let n = buf.len().min(bytes.len() - start);
        buf[..n].copy_from_slice(&bytes[start..start + n]);
        Ok(n)
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> io::Result<usize> {
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset too large"))?;
        let end = start
            .checked_add(buf.len())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "offset too large"))?;

        let mut bytes = self.bytes.write();
        if bytes.len() < end {
            bytes.resize(end, 0);
        }
        bytes[start..end].copy_from_slice(buf);
        Ok(buf.len())
    }
}
