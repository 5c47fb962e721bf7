//! pagecache - a concurrent, file-backed page cache with pluggable eviction.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           PageCache                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │   Translation (PageTable)   Offset → FrameId             │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │   Frames (FrameTable)   fixed arena, one lock per frame  │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │   Replacer   LRU | LFU | FIFO over an indexed min-heap   │   │
//! │  │              (swappable at runtime)                      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │   Storage (BackingStore)   FileStore | MemoryStore       │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageOffset, FrameId, Error, config)
//! - [`buffer`] - The page cache and eviction policies
//! - [`storage`] - Positional I/O over files and memory
//!
//! # Quick Start
//! ```no_run
//! use pagecache::{PageCache, PageCacheConfig, PageOffset, PolicyKind};
//!
//! let config = PageCacheConfig::new(4096, 64).with_policy(PolicyKind::Lfu);
//! let cache = PageCache::open("pages.bin", config)?;
//!
//! cache.write_page(PageOffset::new(0), &[1u8; 4096])?;
//!
//! let page = cache.fetch(PageOffset::new(0))?;
//! assert_eq!(page[0], 1);
//! # Ok::<(), pagecache::Error>(())
//! ```

pub mod buffer;
pub mod common;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::{PageCacheConfig, DEFAULT_FRAME_COUNT, DEFAULT_PAGE_SIZE};
pub use common::{Error, FrameId, PageOffset, Result};

pub use buffer::replacer::{Access, EvictionPolicy, MinHeap, PolicyKind, Replacer};
pub use buffer::{
    CacheOutcome, Frame, FrameTable, PageCache, PageCacheStats, PageHandle, PageTable, StatsSnapshot,
};
pub use storage::{BackingStore, FileStore, MemoryStore};
