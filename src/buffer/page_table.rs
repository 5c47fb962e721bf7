//! Page Table - address translation from page offset to frame.

use std::collections::HashMap;

use crate::common::{Error, FrameId, PageOffset, Result};

/// Maps each resident page offset to the frame holding it.
///
/// Holds indices only, never references into frames. Keys are unique: at
/// most one frame maps to a given offset.
#[derive(Debug, Default)]
pub struct PageTable {
    entries: HashMap<PageOffset, FrameId>,
}

impl PageTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn lookup(&self, offset: PageOffset) -> Option<FrameId> {
        self.entries.get(&offset).copied()
    }

    /// Add a mapping.
    ///
    /// # Errors
    /// `Error::DuplicateOffset` if `offset` is already mapped; the old entry
    /// must be removed first.
    pub fn insert(&mut self, offset: PageOffset, frame_id: FrameId) -> Result<()> {
        match self.entries.entry(offset) {
            std::collections::hash_map::Entry::Occupied(_) => Err(Error::DuplicateOffset(offset)),
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(frame_id);
                Ok(())
            }
        }
    }

    #[inline]
    pub fn remove(&mut self, offset: PageOffset) -> Option<FrameId> {
        self.entries.remove(&offset)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PageOffset, FrameId)> + '_ {
        self.entries.iter().map(|(&offset, &frame_id)| (offset, frame_id))
    }
}
