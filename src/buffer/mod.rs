//! Buffer pool management.
//!
//! The page cache is the in-memory layer between callers and the backing
//! store. It manages a fixed pool of frames, each holding one page.
//!
//! # Components
//! - [`PageCache`] - The main page cache
//! - [`Frame`] / [`FrameTable`] - Slots holding a page + metadata
//! - [`PageTable`] - Offset to frame translation
//! - [`PageHandle`] - RAII handle releasing its reference on drop
//! - [`PageCacheStats`] - Performance statistics
//! - [`replacer`] - Eviction policies and the indexed heap that ranks frames

mod frame;
mod frame_table;
mod page_cache;
mod page_guard;
mod page_table;
pub mod replacer;
mod stats;

pub use frame::{Frame, FrameData};
pub use frame_table::FrameTable;
pub use page_cache::{CacheOutcome, PageCache};
pub use page_guard::PageHandle;
pub use page_table::PageTable;
pub use stats::{PageCacheStats, StatsSnapshot};
