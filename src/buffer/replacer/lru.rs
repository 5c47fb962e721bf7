//! LRU (Least Recently Used) replacement policy.

use crate::buffer::replacer::{Access, EvictionPolicy};
use crate::common::FrameId;

/// Ranks frames by the logical time of their last access.
///
/// Every load or hit advances a clock and stamps the frame; the smallest
/// stamp is the least recently used.
#[derive(Debug, Default)]
pub struct LruPolicy {
    clock: u64,
    last_access: Vec<u64>,
}

impl LruPolicy {
    pub fn new(capacity: usize) -> Self {
        Self {
            clock: 0,
            last_access: vec![0; capacity],
        }
    }
}

impl EvictionPolicy for LruPolicy {
    fn name(&self) -> &'static str {
        "lru"
    }

    fn record(&mut self, frame_id: FrameId, _access: Access) {
        self.clock += 1;
        *super::slot(&mut self.last_access, frame_id) = self.clock;
    }

    fn priority(&self, frame_id: FrameId) -> u64 {
        self.last_access.get(frame_id.index()).copied().unwrap_or(0)
    }

    fn forget(&mut self, frame_id: FrameId) {
        if let Some(slot) = self.last_access.get_mut(frame_id.index()) {
            *slot = 0;
        }
    }
}
