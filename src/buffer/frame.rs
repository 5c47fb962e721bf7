//! Frame - a slot in the buffer pool.
//!
//! A [`Frame`] holds one page-sized buffer plus the metadata needed for
//! buffer management:
//! - Which page offset is loaded (if any)
//! - Reference count and pinned flag, which keep it from being evicted
//! - Dirty flag for write-back tracking

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::{FrameId, PageOffset};

/// Buffer and owning offset, guarded by the frame lock.
#[derive(Debug)]
pub struct FrameData {
    page_offset: Option<PageOffset>,
    buffer: Box<[u8]>,
}

impl FrameData {
    /// Offset of the page held, or `None` while the frame is free.
    #[inline]
    pub fn page_offset(&self) -> Option<PageOffset> {
        self.page_offset
    }

    #[inline]
    pub fn is_assigned(&self) -> bool {
        self.page_offset.is_some()
    }

    #[inline]
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    #[inline]
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Move the buffer out, leaving an empty one, so a free frame can be
    /// filled without holding its lock.
    pub(crate) fn take_buffer(&mut self) -> Box<[u8]> {
        debug_assert!(self.page_offset.is_none());
        std::mem::take(&mut self.buffer)
    }

    pub(crate) fn restore_buffer(&mut self, buffer: Box<[u8]>) {
        self.buffer = buffer;
    }
}

/// A frame in the buffer pool.
///
/// Frames are allocated once at startup and never freed while the pool
/// lives; they are only reset and reassigned.
///
/// # Thread Safety
/// - `data`: `RwLock` - the per-frame lock. Readers copy out and write-back
///   runs under a shared lock; writers, installs and eviction take it
///   exclusively. Loads run outside it (see [`FrameData::take_buffer`]).
/// - `reference_count`, `pinned`: atomics. On a mapped frame they change
///   only while the page table lock is held (shared is enough). Eviction
///   re-checks them under the page table write lock, so no reference can
///   appear between that check and the unmapping.
/// - `dirty`: atomic, set and cleared under the frame lock.
///
/// All three can be read without any lock, which lets the replacer filter
/// candidates cheaply.
#[derive(Debug)]
pub struct Frame {
    frame_id: FrameId,
    data: RwLock<FrameData>,
    reference_count: AtomicU32,
    pinned: AtomicBool,
    dirty: AtomicBool,
}

impl Frame {
    /// Create a free frame with a zeroed buffer of `page_size` bytes.
    pub fn new(frame_id: FrameId, page_size: usize) -> Self {
        Self {
            frame_id,
            data: RwLock::new(FrameData {
                page_offset: None,
                buffer: vec![0u8; page_size].into_boxed_slice(),
            }),
            reference_count: AtomicU32::new(0),
            pinned: AtomicBool::new(false),
            dirty: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn id(&self) -> FrameId {
        self.frame_id
    }

    // ========================================================================
    // Frame lock
    // ========================================================================

    /// Acquire the frame lock in shared mode.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, FrameData> {
        self.data.read()
    }

    /// Acquire the frame lock exclusively.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, FrameData> {
        self.data.write()
    }

    /// Acquire the frame lock exclusively, or `None` if it is held.
    #[inline]
    pub fn try_write(&self) -> Option<RwLockWriteGuard<'_, FrameData>> {
        self.data.try_write()
    }

    /// Offset currently held. Takes the frame lock briefly.
    pub fn page_offset(&self) -> Option<PageOffset> {
        self.data.read().page_offset
    }

    // ========================================================================
    // State transitions (caller holds this frame's exclusive lock)
    // ========================================================================

    /// Give a free frame to `offset`.
    pub fn assign(&self, data: &mut FrameData, offset: PageOffset) {
        debug_assert!(data.page_offset.is_none(), "{} is already assigned", self.frame_id);
        data.page_offset = Some(offset);
    }

    /// Return the frame to the free state.
    ///
    /// The buffer is left as is; its contents are meaningless until the next
    /// load overwrites them.
    pub fn reset(&self, data: &mut FrameData) {
        data.page_offset = None;
        self.reference_count.store(0, Ordering::Relaxed);
        self.pinned.store(false, Ordering::Relaxed);
        self.dirty.store(false, Ordering::Relaxed);
    }

    // ========================================================================
    // Reference count (Atomic, changed under the page table lock)
    // ========================================================================

    /// Take a reference. Returns the new count.
    #[inline]
    pub fn acquire(&self) -> u32 {
        self.reference_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Drop a reference. Returns the new count.
    ///
    /// Returns `None` and leaves the count at zero if nothing was held.
    #[inline]
    pub fn release(&self) -> Option<u32> {
        self.reference_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .ok()
            .map(|old| old - 1)
    }

    #[inline]
    pub fn reference_count(&self) -> u32 {
        self.reference_count.load(Ordering::Relaxed)
    }

    // ========================================================================
    // Pinned flag
    // ========================================================================

    /// Set the pinned flag, returning the previous value.
    #[inline]
    pub fn set_pinned(&self, pinned: bool) -> bool {
        self.pinned.swap(pinned, Ordering::Relaxed)
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pinned.load(Ordering::Relaxed)
    }

    // ========================================================================
    // Dirty flag
    // ========================================================================

    #[inline]
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Relaxed)
    }

    /// Neither referenced nor pinned.
    ///
    /// Says nothing about whether a page is loaded; the replacer only tracks
    /// frames that hold one.
    #[inline]
    pub fn is_evictable(&self) -> bool {
        self.reference_count() == 0 && !self.is_pinned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::new(FrameId::new(0), 64)
    }

    #[test]
    fn test_frame_new() {
        let frame = frame();
        assert_eq!(frame.id(), FrameId::new(0));
        assert_eq!(frame.page_offset(), None);
        assert!(!frame.is_pinned());
        assert!(!frame.is_dirty());
        assert_eq!(frame.reference_count(), 0);

        let data = frame.read();
        assert_eq!(data.buffer().len(), 64);
        assert!(data.buffer().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_frame_acquire_release() {
        let frame = frame();

        assert_eq!(frame.acquire(), 1);
        assert_eq!(frame.acquire(), 2);
        assert!(!frame.is_evictable());

        assert_eq!(frame.release(), Some(1));
        assert_eq!(frame.release(), Some(0));
        assert!(frame.is_evictable());
    }

    #[test]
    fn test_frame_release_below_zero_rejected() {
        let frame = frame();
        assert_eq!(frame.release(), None);
        assert_eq!(frame.reference_count(), 0);
    }

    #[test]
    fn test_frame_pinned_flag() {
        let frame = frame();

        assert!(!frame.set_pinned(true));
        assert!(frame.is_pinned());
        assert!(!frame.is_evictable());

        assert!(frame.set_pinned(false));
        assert!(frame.is_evictable());
    }

    #[test]
    fn test_frame_dirty_flag() {
        let frame = frame();
        frame.mark_dirty();
        assert!(frame.is_dirty());
        frame.clear_dirty();
        assert!(!frame.is_dirty());
    }

    #[test]
    fn test_frame_assign() {
        let frame = frame();
        {
            let mut data = frame.write();
            frame.assign(&mut data, PageOffset::new(128));
            assert!(data.is_assigned());
        }
        assert_eq!(frame.page_offset(), Some(PageOffset::new(128)));
    }

    #[test]
    fn test_frame_reset_keeps_buffer() {
        let frame = frame();
        {
            let mut data = frame.write();
            frame.assign(&mut data, PageOffset::new(64));
            data.buffer_mut()[10] = 0xFF;
        }
        frame.acquire();
        frame.set_pinned(true);
        frame.mark_dirty();

        {
            let mut data = frame.write();
            frame.reset(&mut data);
            assert_eq!(data.buffer()[10], 0xFF);
        }

        assert_eq!(frame.page_offset(), None);
        assert_eq!(frame.reference_count(), 0);
        assert!(!frame.is_pinned());
        assert!(!frame.is_dirty());
    }

    #[test]
    fn test_frame_take_and_restore_buffer() {
        let frame = frame();

        let mut buffer = frame.write().take_buffer();
        assert_eq!(buffer.len(), 64);
        assert!(frame.read().buffer().is_empty());

        // Lock is free while the buffer is out
        buffer[0] = 7;
        assert!(frame.try_write().is_some());

        frame.write().restore_buffer(buffer);
        assert_eq!(frame.read().buffer()[0], 7);
    }

    #[test]
    fn test_frame_try_write_contended() {
        let frame = frame();
        let _reader = frame.read();
        assert!(frame.try_write().is_none());
    }

    #[test]
    fn test_frame_concurrent_acquire() {
        use std::sync::Arc;
        use std::thread;

        let frame = Arc::new(frame());
        let mut handles = vec![];

        for _ in 0..8 {
            let frame_clone = Arc::clone(&frame);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    let _guard = frame_clone.read();
                    frame_clone.acquire();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(frame.reference_count(), 800);
    }
}
