//! RAII handle for a referenced page.

use std::ops::Deref;

use log::warn;

use crate::buffer::PageCache;
use crate::common::PageOffset;
use crate::storage::BackingStore;

/// A copy of a page that holds a reference on its frame.
///
/// While the handle lives the frame cannot be evicted. The reference is
/// released when the handle drops, so callers do not pair `read_page` with
/// `release_page` by hand.
///
/// # Example
/// ```ignore
/// let page = cache.fetch(PageOffset::new(0))?;
/// let first = page[0];  // Deref to &[u8]
/// // page drops here, reference released
/// ```
pub struct PageHandle<'a, S: BackingStore> {
    cache: &'a PageCache<S>,
    offset: PageOffset,
    bytes: Box<[u8]>,
    hit: bool,
}

impl<'a, S: BackingStore> PageHandle<'a, S> {
    pub(crate) fn new(cache: &'a PageCache<S>, offset: PageOffset, bytes: Box<[u8]>, hit: bool) -> Self {
        Self {
            cache,
            offset,
            bytes,
            hit,
        }
    }

    #[inline]
    pub fn offset(&self) -> PageOffset {
        self.offset
    }

    /// Whether the page was already resident when fetched.
    #[inline]
    pub fn was_hit(&self) -> bool {
        self.hit
    }
}

impl<S: BackingStore> Deref for PageHandle<'_, S> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl<S: BackingStore> Drop for PageHandle<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.cache.release_page(self.offset) {
            warn!("failed to release {} on drop: {}", self.offset, e);
        }
    }
}
