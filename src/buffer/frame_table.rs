//! Frame Table - the fixed arena of frames.

use std::ops::Index;

use crate::buffer::Frame;
use crate::common::FrameId;

/// All frames of a pool, allocated once.
///
/// The table never grows or shrinks, so a [`FrameId`] stays valid for the
/// life of the pool.
#[derive(Debug)]
pub struct FrameTable {
    frames: Box<[Frame]>,
    page_size: usize,
}

impl FrameTable {
    /// Allocate `frame_count` zeroed frames of `page_size` bytes each.
    pub fn new(frame_count: usize, page_size: usize) -> Self {
        let frames = (0..frame_count)
            .map(|i| Frame::new(FrameId::new(i), page_size))
            .collect();

        Self { frames, page_size }
    }

    /// Look up a frame, or `None` if the id is out of range.
    #[inline]
    pub fn get(&self, frame_id: FrameId) -> Option<&Frame> {
        self.frames.get(frame_id.index())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Frames in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }
}

impl Index<FrameId> for FrameTable {
    type Output = Frame;

    #[inline]
    fn index(&self, frame_id: FrameId) -> &Frame {
        &self.frames[frame_id.index()]
    }
}
