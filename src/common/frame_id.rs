//! Frame identifier type.

use std::fmt;

/// Stable handle to a slot in the frame table.
///
/// Frames are allocated once and never move, so the index is the only
/// long-lived reference to a frame. Buffer contents are rewritten in place
/// on eviction; never keep a pointer into a frame's buffer instead.
///
/// Ordered by index: the replacer breaks priority ties toward the lowest
/// frame.
///
/// # Example
/// ```
/// use pagecache::FrameId;
///
/// let frame_id = FrameId::new(5);
/// assert_eq!(frame_id.index(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub usize);

impl FrameId {
    #[inline]
    pub fn new(id: usize) -> Self {
        FrameId(id)
    }

    /// Position in the frame table.
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", self.0)
    }
}
