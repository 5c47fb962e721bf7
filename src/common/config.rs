//! Configuration for the page cache.

use crate::buffer::replacer::PolicyKind;
use crate::common::{Error, Result};

/// Default page size in bytes (4KB).
///
/// Matches the OS page size on most systems. The page size should match the
/// backing medium's natural block size; anything above zero is accepted.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default number of frames in the pool.
pub const DEFAULT_FRAME_COUNT: usize = 64;

/// Settings fixed at pool construction.
///
/// # Example
/// ```
/// use pagecache::{PageCacheConfig, PolicyKind};
///
/// let config = PageCacheConfig::default()
///     .with_page_size(512)
///     .with_frame_count(8)
///     .with_policy(PolicyKind::Lfu);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCacheConfig {
    /// Size of every page and frame buffer, in bytes.
    pub page_size: usize,

    /// Number of frames; the pool never grows or shrinks.
    pub frame_count: usize,

    /// Replacement policy used to rank eviction candidates.
    pub policy: PolicyKind,

    /// Call `sync` on the backing store after every page write.
    ///
    /// Off by default. `flush_all` followed by `PageCache::sync` gives the
    /// same durability for a batch.
    pub sync_writes: bool,
}

impl PageCacheConfig {
    pub fn new(page_size: usize, frame_count: usize) -> Self {
        Self {
            page_size,
            frame_count,
            ..Self::default()
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_frame_count(mut self, frame_count: usize) -> Self {
        self.frame_count = frame_count;
        self
    }

    pub fn with_policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// Reject configurations the pool cannot be built from.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::InvalidConfig("page size must be > 0"));
        }
        if self.frame_count == 0 {
            return Err(Error::InvalidConfig("frame count must be > 0"));
        }
        Ok(())
    }
}

impl Default for PageCacheConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            frame_count: DEFAULT_FRAME_COUNT,
            policy: PolicyKind::default(),
            sync_writes: false,
        }
    }
}
