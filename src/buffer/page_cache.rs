//! Page Cache - the buffer pool manager.
//!
//! The [`PageCache`] provides:
//! - Page-granular reads and writes against a backing store
//! - Reference counting and pinning that keep frames resident
//! - Write-through on miss, write-back on hit, explicit flushing
//! - Pluggable eviction policies

use std::path::Path;
use std::thread;

use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};

use crate::buffer::replacer::{Access, PolicyKind, Replacer};
use crate::buffer::{Frame, FrameTable, PageCacheStats, PageHandle, PageTable};
use crate::common::config::PageCacheConfig;
use crate::common::{Error, FrameId, PageOffset, Result};
use crate::storage::{BackingStore, FileStore};

/// Whether a request was served by a resident frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

impl CacheOutcome {
    #[inline]
    pub fn is_hit(&self) -> bool {
        *self == CacheOutcome::Hit
    }
}

/// Result of trying to take a frame away from its page.
enum Reclaim {
    /// Frame is free and owned by the caller.
    Reclaimed,
    /// Frame is referenced or pinned.
    InUse,
    /// Written to again after the write-back; flush and retry.
    Redirtied,
    /// Frame no longer holds the expected page.
    Stale,
    /// Frame lock held by a write-back; try again later.
    Busy,
}

/// A fixed pool of frames caching pages of a backing store.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                         PageCache                           │
/// │  ┌──────────────┐  ┌───────────────────────────────────┐   │
/// │  │ page_table   │  │      frames: FrameTable           │   │
/// │  │ Offset → Fid │─▶│  [Frame0] [Frame1] [Frame2] ...   │   │
/// │  └──────────────┘  └───────────────────────────────────┘   │
/// │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐      │
/// │  │  free_list   │  │   replacer   │  │    store     │      │
/// │  │ Vec<FrameId> │  │ policy+heap  │  │ BackingStore │      │
/// │  └──────────────┘  └──────────────┘  └──────────────┘      │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// # Write policy
/// - Write miss: the page is written through to the store before returning.
/// - Write hit: the frame is marked dirty and written back on eviction,
///   `flush_page`, `flush_frame` or `flush_all`.
///
/// # References
/// Every successful `read_page` takes a reference on the frame; the caller
/// must `release_page` it. Referenced or pinned frames are never evicted.
///
/// # Thread Safety
/// Lock order is `page_table` → `replacer` → frame lock.
/// - `page_table`: `RwLock`. Hits take it shared just long enough to look up
///   the frame and take a reference; they never wait on a frame lock while
///   holding it. Installs and evictions take it exclusively for the mapping
///   change and only `try_write` frames under it.
/// - `replacer`: `Mutex`. Hits update recency with `try_lock` and skip the
///   update under contention.
/// - `free_list`: `Mutex`.
/// - `frames`: no lock on the table; each frame has its own.
///
/// No shared lock is held during backing-store I/O, and loads hold no lock
/// at all. A frame being loaded is in no table, heap or free list, and its
/// mapping is installed only after the I/O succeeds. The only frame lock
/// held across I/O is the shared lock of a write-back, which delays
/// writers to that same page.
///
/// # Usage
/// ```no_run
/// use pagecache::{PageCache, PageOffset};
///
/// let cache = PageCache::init(4096, 16, "pages.bin")?;
///
/// let mut buf = vec![0u8; 4096];
/// cache.read_page(PageOffset::new(0), &mut buf)?;
/// cache.release_page(PageOffset::new(0))?;
///
/// cache.write_page(PageOffset::new(4096), &[0xAB; 4096])?;
/// cache.flush_all()?;
/// # Ok::<(), pagecache::Error>(())
/// ```
pub struct PageCache<S: BackingStore = FileStore> {
    /// Fixed pool of frames allocated at startup.
    frames: FrameTable,

    /// Maps resident page offsets to frames.
    page_table: RwLock<PageTable>,

    /// Frames holding no page (popped from the back, frame 0 first).
    free_list: Mutex<Vec<FrameId>>,

    /// Ranks resident frames for eviction.
    replacer: Mutex<Replacer>,

    store: S,

    stats: PageCacheStats,

    config: PageCacheConfig,
}

impl PageCache<FileStore> {
    /// Open (or create) `path` as a pool of `frame_count` frames of
    /// `page_size` bytes.
    ///
    /// # Errors
    /// - `Error::InvalidConfig` if either size is zero
    /// - `Error::BackingStoreUnavailable` if the file cannot be opened
    pub fn init<P: AsRef<Path>>(page_size: usize, frame_count: usize, path: P) -> Result<Self> {
        Self::open(path, PageCacheConfig::new(page_size, frame_count))
    }

    /// Open (or create) `path` with a full configuration.
    pub fn open<P: AsRef<Path>>(path: P, config: PageCacheConfig) -> Result<Self> {
        config.validate()?;

        let path = path.as_ref();
        let store = FileStore::open(path).map_err(|source| Error::BackingStoreUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        info!(
            "opened page cache over {}: {} frames of {} bytes, {} policy",
            path.display(),
            config.frame_count,
            config.page_size,
            config.policy
        );

        Self::with_store(store, config)
    }
}

impl<S: BackingStore> PageCache<S> {
    /// Build a pool over any backing store.
    ///
    /// All frames are allocated here and start free.
    pub fn with_store(store: S, config: PageCacheConfig) -> Result<Self> {
        config.validate()?;

        let free_list = (0..config.frame_count).rev().map(FrameId::new).collect();

        Ok(Self {
            frames: FrameTable::new(config.frame_count, config.page_size),
            page_table: RwLock::new(PageTable::with_capacity(config.frame_count)),
            free_list: Mutex::new(free_list),
            replacer: Mutex::new(Replacer::new(config.policy, config.frame_count)),
            store,
            stats: PageCacheStats::new(),
            config,
        })
    }

    // ========================================================================
    // Public API: Reads and writes
    // ========================================================================

    /// Copy the page at `offset` into `dst` and take a reference on it.
    ///
    /// # Errors
    /// - `Error::BufferSizeMismatch` / `Error::MisalignedOffset` for bad input
    /// - `Error::ShortRead` if the store holds less than a full page there
    /// - `Error::EvictionExhausted` if every frame is referenced or pinned
    pub fn read_page(&self, offset: PageOffset, dst: &mut [u8]) -> Result<CacheOutcome> {
        self.check_request(offset, dst.len())?;

        if let Some(frame_id) = self.read_resident(offset, dst) {
            self.record_hit(frame_id);
            return Ok(CacheOutcome::Hit);
        }

        PageCacheStats::bump(&self.stats.misses);
        debug!("read miss on {}", offset);

        let frame_id = self.claim_frame()?;
        let frame = &self.frames[frame_id];

        let mut buffer = frame.write().take_buffer();
        let loaded = self.load(offset, &mut buffer);
        {
            let mut data = frame.write();
            data.restore_buffer(buffer);
            if loaded.is_ok() {
                frame.assign(&mut data, offset);
                dst.copy_from_slice(data.buffer());
            }
        }
        if let Err(e) = loaded {
            self.release_frame(frame_id);
            return Err(e);
        }

        let mut table = self.page_table.write();
        if let Some(winner) = table.lookup(offset) {
            // A concurrent reader installed the page first; serve from its frame
            self.frames[winner].acquire();
            drop(table);
            self.release_frame(frame_id);
            self.copy_out(winner, dst);
            return Ok(CacheOutcome::Miss);
        }

        frame.acquire();
        table.insert(offset, frame_id)?;
        self.replacer.lock().record_access(frame_id, Access::Load);

        Ok(CacheOutcome::Miss)
    }

    /// Store `content` as the page at `offset`. Returns `true` on a hit.
    ///
    /// A hit only updates the frame and marks it dirty. A miss claims a
    /// frame and writes the page through to the store before returning; if
    /// that write fails the page is not cached. Writes take no reference.
    ///
    /// # Errors
    /// Same classes as [`PageCache::read_page`], with `Error::ShortWrite`
    /// instead of `Error::ShortRead`.
    pub fn write_page(&self, offset: PageOffset, content: &[u8]) -> Result<bool> {
        self.check_request(offset, content.len())?;

        if let Some(frame_id) = self.write_resident(offset, content) {
            self.record_hit(frame_id);
            return Ok(true);
        }

        PageCacheStats::bump(&self.stats.misses);
        debug!("write miss on {}", offset);

        let frame_id = self.claim_frame()?;
        let frame = &self.frames[frame_id];

        if let Err(e) = self.store_page(offset, content) {
            self.free_list.lock().push(frame_id);
            return Err(e);
        }
        {
            let mut data = frame.write();
            data.buffer_mut().copy_from_slice(content);
            frame.assign(&mut data, offset);
        }

        let mut table = self.page_table.write();
        if let Some(winner) = table.lookup(offset) {
            let winner_frame = &self.frames[winner];
            winner_frame.acquire();
            drop(table);
            self.release_frame(frame_id);
            {
                let mut data = winner_frame.write();
                data.buffer_mut().copy_from_slice(content);
                // A flush of an interleaved hit may have overwritten our
                // write-through since, so the store can no longer be trusted
                // to match this content.
                winner_frame.mark_dirty();
            }
            winner_frame.release();
            return Ok(false);
        }

        table.insert(offset, frame_id)?;
        self.replacer.lock().record_access(frame_id, Access::Load);

        Ok(false)
    }

    /// Read a page into an owned handle that releases its reference on drop.
    pub fn fetch(&self, offset: PageOffset) -> Result<PageHandle<'_, S>> {
        let mut bytes = vec![0u8; self.config.page_size].into_boxed_slice();
        let outcome = self.read_page(offset, &mut bytes)?;
        Ok(PageHandle::new(self, offset, bytes, outcome.is_hit()))
    }

    // ========================================================================
    // Public API: References and pins
    // ========================================================================

    /// Drop one reference taken by [`PageCache::read_page`].
    ///
    /// # Errors
    /// - `Error::UnknownPage` if `offset` is not resident
    /// - `Error::NegativeReference` if no reference is held
    pub fn release_page(&self, offset: PageOffset) -> Result<()> {
        let table = self.page_table.read();
        let frame_id = table.lookup(offset).ok_or(Error::UnknownPage(offset))?;

        self.frames[frame_id]
            .release()
            .ok_or(Error::NegativeReference(offset))?;
        Ok(())
    }

    /// Keep a resident page from being evicted, independent of references.
    pub fn pin_page(&self, offset: PageOffset) -> Result<()> {
        let table = self.page_table.read();
        let frame_id = table.lookup(offset).ok_or(Error::UnknownPage(offset))?;

        self.frames[frame_id].set_pinned(true);
        Ok(())
    }

    /// Clear the pin set by [`PageCache::pin_page`].
    ///
    /// # Errors
    /// `Error::NotPinned` if the page was not pinned.
    pub fn unpin_page(&self, offset: PageOffset) -> Result<()> {
        let table = self.page_table.read();
        let frame_id = table.lookup(offset).ok_or(Error::UnknownPage(offset))?;

        if !self.frames[frame_id].set_pinned(false) {
            return Err(Error::NotPinned(offset));
        }
        Ok(())
    }

    // ========================================================================
    // Public API: Flushing and eviction
    // ========================================================================

    /// Write a dirty frame back to the store and mark it clean.
    ///
    /// Clean and free frames are left alone, so a second flush does no I/O.
    ///
    /// # Errors
    /// - `Error::UnknownFrame` if the index is out of range
    /// - `Error::ShortWrite` / `Error::Io`; the frame stays dirty
    pub fn flush_frame(&self, frame_id: FrameId) -> Result<()> {
        let frame = self.frames.get(frame_id).ok_or(Error::UnknownFrame(frame_id))?;
        self.write_back(frame)?;
        Ok(())
    }

    /// Flush the frame holding `offset`.
    pub fn flush_page(&self, offset: PageOffset) -> Result<()> {
        let frame_id = self
            .page_table
            .read()
            .lookup(offset)
            .ok_or(Error::UnknownPage(offset))?;
        self.flush_frame(frame_id)
    }

    /// Flush every dirty frame, in frame order.
    ///
    /// Stops at the first failure. Frames flushed before it stay clean.
    pub fn flush_all(&self) -> Result<()> {
        let mut flushed = 0;
        for frame in self.frames.iter() {
            if self.write_back(frame)? {
                flushed += 1;
            }
        }
        debug!("flushed {} dirty frames", flushed);
        Ok(())
    }

    /// Make all writes so far durable in the backing store.
    pub fn sync(&self) -> Result<()> {
        self.store.sync()?;
        Ok(())
    }

    /// Drop a resident page from the pool, writing it back first if dirty.
    ///
    /// # Errors
    /// - `Error::UnknownPage` if `offset` is not resident
    /// - `Error::PageInUse` if it is referenced or pinned
    pub fn evict_page(&self, offset: PageOffset) -> Result<()> {
        loop {
            let frame_id = self
                .page_table
                .read()
                .lookup(offset)
                .ok_or(Error::UnknownPage(offset))?;

            match self.reclaim(frame_id, Some(offset))? {
                Reclaim::Reclaimed => {
                    self.free_list.lock().push(frame_id);
                    return Ok(());
                }
                Reclaim::InUse => return Err(Error::PageInUse(offset)),
                Reclaim::Busy => thread::yield_now(),
                Reclaim::Redirtied | Reclaim::Stale => {}
            }
        }
    }

    /// Switch the replacement policy. Current candidates keep their order.
    pub fn set_policy(&self, kind: PolicyKind) {
        self.replacer.lock().set_policy(kind);
        info!("replacement policy switched to {}", kind);
    }

    pub fn policy(&self) -> PolicyKind {
        self.replacer.lock().kind()
    }

    // ========================================================================
    // Public API: Stats and info
    // ========================================================================

    pub fn stats(&self) -> &PageCacheStats {
        &self.stats
    }

    pub fn config(&self) -> &PageCacheConfig {
        &self.config
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Number of pages currently cached.
    pub fn resident_count(&self) -> usize {
        self.page_table.read().len()
    }

    pub fn free_frame_count(&self) -> usize {
        self.free_list.lock().len()
    }

    /// Frame currently holding `offset`.
    pub fn frame_of(&self, offset: PageOffset) -> Option<FrameId> {
        self.page_table.read().lookup(offset)
    }

    /// Reference count of a resident page.
    pub fn reference_count(&self, offset: PageOffset) -> Option<u32> {
        self.with_resident(offset, Frame::reference_count)
    }

    pub fn is_dirty(&self, offset: PageOffset) -> Option<bool> {
        self.with_resident(offset, Frame::is_dirty)
    }

    pub fn is_pinned(&self, offset: PageOffset) -> Option<bool> {
        self.with_resident(offset, Frame::is_pinned)
    }

    /// All `(offset, frame)` mappings, sorted by offset.
    pub fn resident_pages(&self) -> Vec<(PageOffset, FrameId)> {
        let mut pages: Vec<_> = self.page_table.read().iter().collect();
        pages.sort_unstable();
        pages
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ========================================================================
    // Internal: Hit paths
    // ========================================================================

    fn check_request(&self, offset: PageOffset, len: usize) -> Result<()> {
        let page_size = self.config.page_size;
        if len != page_size {
            return Err(Error::BufferSizeMismatch {
                expected: page_size,
                actual: len,
            });
        }
        if !offset.is_aligned(page_size) {
            return Err(Error::MisalignedOffset { offset, page_size });
        }
        Ok(())
    }

    /// Take a reference on the frame holding `offset`.
    ///
    /// The page table is held only for the lookup. The reference keeps the
    /// mapping in place once it is dropped.
    fn pin_resident(&self, offset: PageOffset) -> Option<FrameId> {
        let table = self.page_table.read();
        let frame_id = table.lookup(offset)?;
        self.frames[frame_id].acquire();
        Some(frame_id)
    }

    /// Copy out a resident page, keeping the reference for the caller.
    fn read_resident(&self, offset: PageOffset, dst: &mut [u8]) -> Option<FrameId> {
        let frame_id = self.pin_resident(offset)?;
        self.copy_out(frame_id, dst);
        Some(frame_id)
    }

    /// Overwrite a resident page and mark it dirty.
    fn write_resident(&self, offset: PageOffset, content: &[u8]) -> Option<FrameId> {
        let frame_id = self.pin_resident(offset)?;
        let frame = &self.frames[frame_id];
        {
            let mut data = frame.write();
            data.buffer_mut().copy_from_slice(content);
            frame.mark_dirty();
        }
        frame.release();
        Some(frame_id)
    }

    fn copy_out(&self, frame_id: FrameId, dst: &mut [u8]) {
        let data = self.frames[frame_id].read();
        dst.copy_from_slice(data.buffer());
    }

    fn record_hit(&self, frame_id: FrameId) {
        PageCacheStats::bump(&self.stats.hits);
        if let Some(mut replacer) = self.replacer.try_lock() {
            replacer.record_access(frame_id, Access::Hit);
        }
    }

    fn with_resident<T>(&self, offset: PageOffset, f: impl FnOnce(&Frame) -> T) -> Option<T> {
        let table = self.page_table.read();
        table.lookup(offset).map(|frame_id| f(&self.frames[frame_id]))
    }

    // ========================================================================
    // Internal: Frame allocation and eviction
    // ========================================================================

    /// Get a free frame, evicting if necessary.
    ///
    /// The returned frame is unassigned and reachable only by the caller.
    fn claim_frame(&self) -> Result<FrameId> {
        if let Some(frame_id) = self.free_list.lock().pop() {
            return Ok(frame_id);
        }
        self.evict_victim()
    }

    /// Evict the replacer's lowest-priority eligible frame.
    ///
    /// Frames busy with a write-back are passed over for this call. Only
    /// when nothing else is eligible does it wait for them.
    fn evict_victim(&self) -> Result<FrameId> {
        let mut busy = Vec::new();
        loop {
            let victim = self.replacer.lock().select_victim(|frame_id| {
                !busy.contains(&frame_id) && self.frames[frame_id].is_evictable()
            });
            let Some(victim) = victim else {
                if busy.is_empty() {
                    return Err(Error::EvictionExhausted);
                }
                busy.clear();
                thread::yield_now();
                continue;
            };

            match self.reclaim(victim, None)? {
                Reclaim::Reclaimed => return Ok(victim),
                Reclaim::Busy => busy.push(victim),
                Reclaim::InUse | Reclaim::Redirtied | Reclaim::Stale => {}
            }
        }
    }

    /// Take `frame_id` away from its page.
    ///
    /// Writes back first without holding the page table. The final
    /// eligibility check and the unmapping happen together under the page
    /// table write lock, so no reader can take a reference in between. The
    /// frame lock is only tried there; a frame in the middle of a write-back
    /// comes back as `Busy`. A failed write-back leaves the frame mapped.
    fn reclaim(&self, frame_id: FrameId, expected: Option<PageOffset>) -> Result<Reclaim> {
        let frame = &self.frames[frame_id];
        self.write_back(frame)?;

        let mut table = self.page_table.write();
        let Some(mut data) = frame.try_write() else {
            return Ok(Reclaim::Busy);
        };

        let Some(offset) = data.page_offset() else {
            drop(data);
            self.replacer.lock().remove(frame_id);
            return Ok(Reclaim::Stale);
        };
        // Assigned but not yet installed, or installed by someone else
        if table.lookup(offset) != Some(frame_id) || expected.is_some_and(|e| e != offset) {
            return Ok(Reclaim::Stale);
        }
        if !frame.is_evictable() {
            return Ok(Reclaim::InUse);
        }
        if frame.is_dirty() {
            return Ok(Reclaim::Redirtied);
        }

        table.remove(offset);
        frame.reset(&mut data);
        drop(data);
        self.replacer.lock().remove(frame_id);

        PageCacheStats::bump(&self.stats.evictions);
        debug!("evicted {} from {}", offset, frame_id);
        Ok(Reclaim::Reclaimed)
    }

    /// Reset an unmapped frame and put it back on the free list.
    fn release_frame(&self, frame_id: FrameId) {
        let frame = &self.frames[frame_id];
        {
            let mut data = frame.write();
            frame.reset(&mut data);
        }
        self.free_list.lock().push(frame_id);
    }

    // ========================================================================
    // Internal: Backing store I/O
    // ========================================================================

    /// Flush a frame if it is assigned and dirty. Returns whether it wrote.
    ///
    /// Holds the frame lock shared for the duration of the write, which
    /// keeps writers out until the dirty flag is cleared.
    fn write_back(&self, frame: &Frame) -> Result<bool> {
        if !frame.is_dirty() {
            return Ok(false);
        }

        let data = frame.read();
        let Some(offset) = data.page_offset() else {
            return Ok(false);
        };
        if !frame.is_dirty() {
            return Ok(false);
        }

        if let Err(e) = self.store_page(offset, data.buffer()) {
            warn!("write-back of {} from {} failed: {}", offset, frame.id(), e);
            return Err(e);
        }
        frame.clear_dirty();
        debug!("wrote back {} from {}", offset, frame.id());
        Ok(true)
    }

    fn load(&self, offset: PageOffset, buf: &mut [u8]) -> Result<()> {
        let actual = self.store.read_at(offset.0, buf)?;
        if actual != buf.len() {
            return Err(Error::ShortRead {
                offset,
                expected: buf.len(),
                actual,
            });
        }
        PageCacheStats::bump(&self.stats.pages_read);
        Ok(())
    }

    fn store_page(&self, offset: PageOffset, buf: &[u8]) -> Result<()> {
        let actual = self.store.write_at(offset.0, buf)?;
        if actual != buf.len() {
            return Err(Error::ShortWrite {
                offset,
                expected: buf.len(),
                actual,
            });
        }
        if self.config.sync_writes {
            self.store.sync()?;
        }
        PageCacheStats::bump(&self.stats.pages_written);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    const PAGE: usize = 64;

    /// Helper to create a cache over `pages` zeroed pages in memory.
    fn create_cache(frames: usize, pages: usize) -> PageCache<MemoryStore> {
        let store = MemoryStore::with_len(PAGE * pages);
        PageCache::with_store(store, PageCacheConfig::new(PAGE, frames)).unwrap()
    }

    fn offset(index: u64) -> PageOffset {
        PageOffset::from_page_index(index, PAGE)
    }

    fn page(byte: u8) -> Vec<u8> {
        vec![byte; PAGE]
    }

    /// Every mapping points at a frame holding that offset, and every
    /// assigned frame is mapped exactly once.
    fn assert_translation_consistent(cache: &PageCache<MemoryStore>) {
        let table = cache.page_table.read();
        for (offset, frame_id) in table.iter() {
            assert_eq!(cache.frames[frame_id].page_offset(), Some(offset));
        }
        let assigned = cache
            .frames
            .iter()
            .filter(|f| f.page_offset().is_some())
            .count();
        assert_eq!(assigned, table.len());
    }

    #[test]
    fn test_new_cache_is_cold() {
        let cache = create_cache(4, 4);
        assert_eq!(cache.frame_count(), 4);
        assert_eq!(cache.free_frame_count(), 4);
        assert_eq!(cache.resident_count(), 0);
        assert_eq!(cache.policy(), PolicyKind::Lru);
    }

    #[test]
    fn test_zero_frames_rejected() {
        let result = PageCache::with_store(MemoryStore::new(), PageCacheConfig::new(PAGE, 0));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_read_miss_then_hit() {
        let cache = create_cache(4, 4);
        cache.store().write_at(0, &page(7)).unwrap();

        let mut first = page(0);
        let mut second = page(0);
        assert_eq!(cache.read_page(offset(0), &mut first).unwrap(), CacheOutcome::Miss);
        assert_eq!(cache.read_page(offset(0), &mut second).unwrap(), CacheOutcome::Hit);

        assert_eq!(first, page(7));
        assert_eq!(first, second);
        assert_eq!(cache.reference_count(offset(0)), Some(2));
        assert_eq!(cache.frame_of(offset(0)), Some(FrameId::new(0)));

        let stats = cache.stats().snapshot();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.pages_read, 1);
        assert_translation_consistent(&cache);
    }

    #[test]
    fn test_release_page() {
        let cache = create_cache(2, 2);
        let mut buf = page(0);
        cache.read_page(offset(1), &mut buf).unwrap();

        cache.release_page(offset(1)).unwrap();
        assert_eq!(cache.reference_count(offset(1)), Some(0));

        let result = cache.release_page(offset(1));
        assert!(matches!(result, Err(Error::NegativeReference(o)) if o == offset(1)));
        assert_eq!(cache.reference_count(offset(1)), Some(0));
    }

    #[test]
    fn test_release_unknown_page() {
        let cache = create_cache(2, 2);
        let result = cache.release_page(offset(0));
        assert!(matches!(result, Err(Error::UnknownPage(_))));
    }

    #[test]
    fn test_write_hit_marks_dirty() {
        let cache = create_cache(2, 2);
        let mut buf = page(0);
        cache.read_page(offset(0), &mut buf).unwrap();
        cache.release_page(offset(0)).unwrap();

        assert!(cache.write_page(offset(0), &page(9)).unwrap());
        assert_eq!(cache.is_dirty(offset(0)), Some(true));

        // Not on the store until flushed
        assert_eq!(&cache.store().contents()[..PAGE], &page(0)[..]);

        cache.flush_page(offset(0)).unwrap();
        assert_eq!(cache.is_dirty(offset(0)), Some(false));
        assert_eq!(&cache.store().contents()[..PAGE], &page(9)[..]);
    }

    #[test]
    fn test_write_miss_writes_through() {
        let cache = create_cache(2, 2);

        assert!(!cache.write_page(offset(1), &page(5)).unwrap());

        assert_eq!(cache.is_dirty(offset(1)), Some(false));
        assert_eq!(cache.reference_count(offset(1)), Some(0));
        assert_eq!(&cache.store().contents()[PAGE..2 * PAGE], &page(5)[..]);
        assert_eq!(cache.stats().snapshot().pages_written, 1);
        assert_translation_consistent(&cache);
    }

    #[test]
    fn test_write_miss_extends_store() {
        let cache = create_cache(1, 0);
        cache.write_page(offset(3), &page(1)).unwrap();
        assert_eq!(cache.store().len(), 4 * PAGE);
    }

    #[test]
    fn test_single_frame_eviction() {
        let cache = create_cache(1, 2);
        let mut buf = page(0);

        assert_eq!(cache.read_page(offset(0), &mut buf).unwrap(), CacheOutcome::Miss);
        cache.release_page(offset(0)).unwrap();
        assert_eq!(cache.read_page(offset(1), &mut buf).unwrap(), CacheOutcome::Miss);
        cache.release_page(offset(1)).unwrap();

        assert_eq!(cache.frame_of(offset(0)), None);
        assert_eq!(cache.read_page(offset(0), &mut buf).unwrap(), CacheOutcome::Miss);
        assert_eq!(cache.stats().snapshot().evictions, 2);
        assert_translation_consistent(&cache);
    }

    #[test]
    fn test_referenced_frame_not_evicted() {
        let cache = create_cache(1, 2);
        let mut buf = page(0);
        cache.read_page(offset(0), &mut buf).unwrap();

        let result = cache.read_page(offset(1), &mut buf);
        assert!(matches!(result, Err(Error::EvictionExhausted)));
        assert_eq!(cache.frame_of(offset(0)), Some(FrameId::new(0)));

        // Released frames become evictable again
        cache.release_page(offset(0)).unwrap();
        assert!(cache.read_page(offset(1), &mut buf).is_ok());
    }

    #[test]
    fn test_pinned_frame_not_evicted() {
        let cache = create_cache(1, 2);
        cache.write_page(offset(0), &page(1)).unwrap();
        cache.pin_page(offset(0)).unwrap();
        assert_eq!(cache.is_pinned(offset(0)), Some(true));

        let result = cache.write_page(offset(1), &page(2));
        assert!(matches!(result, Err(Error::EvictionExhausted)));

        cache.unpin_page(offset(0)).unwrap();
        assert!(matches!(cache.unpin_page(offset(0)), Err(Error::NotPinned(_))));
        assert!(cache.write_page(offset(1), &page(2)).is_ok());
    }

    #[test]
    fn test_dirty_victim_flushed_on_eviction() {
        let cache = create_cache(1, 2);
        let mut buf = page(0);

        cache.read_page(offset(0), &mut buf).unwrap();
        cache.release_page(offset(0)).unwrap();
        cache.write_page(offset(0), &page(0x42)).unwrap(); // hit, dirty

        // Evicts offset 0, which must be written back first
        cache.read_page(offset(1), &mut buf).unwrap();
        cache.release_page(offset(1)).unwrap();
        assert_eq!(&cache.store().contents()[..PAGE], &page(0x42)[..]);

        cache.read_page(offset(0), &mut buf).unwrap();
        assert_eq!(buf, page(0x42));
    }

    #[test]
    fn test_lru_eviction_order() {
        let cache = create_cache(3, 4);
        let mut buf = page(0);

        for i in 0..3 {
            cache.read_page(offset(i), &mut buf).unwrap();
            cache.release_page(offset(i)).unwrap();
        }
        // Touch page 0 so page 1 is least recently used
        cache.read_page(offset(0), &mut buf).unwrap();
        cache.release_page(offset(0)).unwrap();

        cache.read_page(offset(3), &mut buf).unwrap();

        assert_eq!(cache.frame_of(offset(1)), None);
        assert!(cache.frame_of(offset(0)).is_some());
        assert!(cache.frame_of(offset(2)).is_some());
        assert_eq!(cache.frame_of(offset(3)), Some(FrameId::new(1)));
    }

    #[test]
    fn test_fifo_policy_ignores_hits() {
        let store = MemoryStore::with_len(PAGE * 4);
        let config = PageCacheConfig::new(PAGE, 3).with_policy(PolicyKind::Fifo);
        let cache = PageCache::with_store(store, config).unwrap();
        let mut buf = page(0);

        for i in 0..3 {
            cache.read_page(offset(i), &mut buf).unwrap();
            cache.release_page(offset(i)).unwrap();
        }
        cache.read_page(offset(0), &mut buf).unwrap();
        cache.release_page(offset(0)).unwrap();

        cache.read_page(offset(3), &mut buf).unwrap();
        assert_eq!(cache.frame_of(offset(0)), None);
    }

    #[test]
    fn test_set_policy() {
        let cache = create_cache(2, 2);
        cache.set_policy(PolicyKind::Lfu);
        assert_eq!(cache.policy(), PolicyKind::Lfu);
    }

    #[test]
    fn test_set_policy_lfu_keeps_ranking() {
        let cache = create_cache(3, 4);
        let mut buf = page(0);

        for i in 0..3 {
            cache.read_page(offset(i), &mut buf).unwrap();
            cache.release_page(offset(i)).unwrap();
        }
        cache.read_page(offset(0), &mut buf).unwrap(); // order: 1, 2, 0
        cache.release_page(offset(0)).unwrap();

        cache.set_policy(PolicyKind::Lfu);
        cache.read_page(offset(3), &mut buf).unwrap();

        assert_eq!(cache.frame_of(offset(1)), None);
        assert!(cache.frame_of(offset(0)).is_some());
        assert!(cache.frame_of(offset(2)).is_some());
    }

    #[test]
    fn test_write_hit_leaves_no_reference() {
        let cache = create_cache(1, 2);
        cache.write_page(offset(0), &page(1)).unwrap();
        assert!(cache.write_page(offset(0), &page(2)).unwrap());

        assert_eq!(cache.reference_count(offset(0)), Some(0));
        // Still evictable
        cache.write_page(offset(1), &page(3)).unwrap();
        assert_eq!(cache.frame_of(offset(0)), None);
        assert_eq!(&cache.store().contents()[..PAGE], &page(2)[..]);
    }

    #[test]
    fn test_evict_skips_frame_under_write_back() {
        let cache = create_cache(2, 3);
        let mut buf = page(0);
        for i in 0..2 {
            cache.read_page(offset(i), &mut buf).unwrap();
            cache.release_page(offset(i)).unwrap();
        }

        // Simulate a write-back in progress on the least recently used frame
        let busy = cache.frame_of(offset(0)).unwrap();
        let guard = cache.frames[busy].read();
        cache.read_page(offset(2), &mut buf).unwrap();
        drop(guard);

        assert!(cache.frame_of(offset(0)).is_some());
        assert_eq!(cache.frame_of(offset(1)), None);
    }

    #[test]
    fn test_flush_frame_idempotent() {
        let cache = create_cache(2, 2);
        cache.write_page(offset(0), &page(1)).unwrap();
        cache.write_page(offset(0), &page(2)).unwrap(); // hit, dirty
        let frame_id = cache.frame_of(offset(0)).unwrap();

        cache.flush_frame(frame_id).unwrap();
        let written = cache.stats().snapshot().pages_written;

        cache.flush_frame(frame_id).unwrap();
        assert_eq!(cache.stats().snapshot().pages_written, written);
    }

    #[test]
    fn test_flush_free_frame_is_noop() {
        let cache = create_cache(2, 2);
        cache.flush_frame(FrameId::new(1)).unwrap();
        assert_eq!(cache.stats().snapshot().pages_written, 0);
    }

    #[test]
    fn test_flush_unknown_frame() {
        let cache = create_cache(2, 2);
        let result = cache.flush_frame(FrameId::new(2));
        assert!(matches!(result, Err(Error::UnknownFrame(f)) if f == FrameId::new(2)));
    }

    #[test]
    fn test_flush_all() {
        let cache = create_cache(4, 4);
        for i in 0..4 {
            cache.write_page(offset(i), &page(0)).unwrap();
            cache.write_page(offset(i), &page(i as u8 + 1)).unwrap();
        }

        cache.flush_all().unwrap();

        let contents = cache.store().contents();
        for i in 0..4usize {
            assert_eq!(&contents[i * PAGE..(i + 1) * PAGE], &page(i as u8 + 1)[..]);
            assert_eq!(cache.is_dirty(offset(i as u64)), Some(false));
        }
    }

    #[test]
    fn test_evict_page() {
        let cache = create_cache(2, 2);
        cache.write_page(offset(0), &page(1)).unwrap();
        cache.write_page(offset(0), &page(3)).unwrap();

        cache.evict_page(offset(0)).unwrap();

        assert_eq!(cache.resident_count(), 0);
        assert_eq!(cache.free_frame_count(), 2);
        assert_eq!(&cache.store().contents()[..PAGE], &page(3)[..]);
        assert!(matches!(cache.evict_page(offset(0)), Err(Error::UnknownPage(_))));
    }

    #[test]
    fn test_evict_referenced_page_fails() {
        let cache = create_cache(2, 2);
        let mut buf = page(0);
        cache.read_page(offset(0), &mut buf).unwrap();

        let result = cache.evict_page(offset(0));
        assert!(matches!(result, Err(Error::PageInUse(_))));
        assert_eq!(cache.resident_count(), 1);
    }

    #[test]
    fn test_buffer_size_mismatch() {
        let cache = create_cache(2, 2);
        let mut small = vec![0u8; PAGE - 1];

        let result = cache.read_page(offset(0), &mut small);
        assert!(matches!(
            result,
            Err(Error::BufferSizeMismatch { expected: PAGE, actual }) if actual == PAGE - 1
        ));
        assert!(cache.write_page(offset(0), &small).is_err());
    }

    #[test]
    fn test_misaligned_offset() {
        let cache = create_cache(2, 2);
        let mut buf = page(0);

        let result = cache.read_page(PageOffset::new(10), &mut buf);
        assert!(matches!(result, Err(Error::MisalignedOffset { .. })));
    }

    #[test]
    fn test_short_read_returns_frame() {
        let cache = create_cache(2, 1);
        cache.store().write_at(PAGE as u64, &[1u8; 10]).unwrap(); // half a page

        let mut buf = page(0);
        let result = cache.read_page(offset(1), &mut buf);
        assert!(matches!(result, Err(Error::ShortRead { actual: 10, .. })));

        let result = cache.read_page(offset(5), &mut buf);
        assert!(matches!(result, Err(Error::ShortRead { actual: 0, .. })));

        assert_eq!(cache.free_frame_count(), 2);
        assert_eq!(cache.resident_count(), 0);
        assert_translation_consistent(&cache);
    }

    #[test]
    fn test_fetch_releases_on_drop() {
        let cache = create_cache(1, 2);
        cache.store().write_at(0, &page(4)).unwrap();

        {
            let handle = cache.fetch(offset(0)).unwrap();
            assert!(!handle.was_hit());
            assert_eq!(handle.offset(), offset(0));
            assert_eq!(&handle[..], &page(4)[..]);
            assert_eq!(cache.reference_count(offset(0)), Some(1));
        }

        assert_eq!(cache.reference_count(offset(0)), Some(0));
        assert!(cache.fetch(offset(1)).is_ok());
    }

    #[test]
    fn test_resident_pages_sorted() {
        let cache = create_cache(3, 3);
        for i in [2, 0, 1] {
            cache.write_page(offset(i), &page(0)).unwrap();
        }

        let offsets: Vec<_> = cache.resident_pages().into_iter().map(|(o, _)| o).collect();
        assert_eq!(offsets, vec![offset(0), offset(1), offset(2)]);
    }

    #[test]
    fn test_concurrent_hits_same_page() {
        use std::sync::Arc;
        use std::thread;

        let cache = Arc::new(create_cache(4, 4));
        cache.store().write_at(0, &page(0x42)).unwrap();

        let mut handles = vec![];
        for _ in 0..8 {
            let cache_clone = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                let mut buf = page(0);
                for _ in 0..50 {
                    cache_clone.read_page(offset(0), &mut buf).unwrap();
                    assert_eq!(buf, page(0x42));
                    cache_clone.release_page(offset(0)).unwrap();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.reference_count(offset(0)), Some(0));
        assert_eq!(cache.resident_count(), 1);
        assert_translation_consistent(&cache);
    }
}
