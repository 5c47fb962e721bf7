//! LFU (Least Frequently Used) replacement policy.

use crate::buffer::replacer::{Access, EvictionPolicy};
use crate::common::FrameId;

/// Ranks frames by how often they were accessed since they were loaded.
///
/// A load resets the count to one. Frames with equal counts fall back to
/// the heap's lowest-index tie-break. Frames taken over from another policy
/// start with a count of their rank plus one, so the old order holds until
/// new accesses change it.
#[derive(Debug, Default)]
pub struct LfuPolicy {
    counts: Vec<u64>,
}

impl LfuPolicy {
    pub fn new(capacity: usize) -> Self {
        Self {
            counts: vec![0; capacity],
        }
    }
}

impl EvictionPolicy for LfuPolicy {
    fn name(&self) -> &'static str {
        "lfu"
    }

    fn record(&mut self, frame_id: FrameId, access: Access) {
        let count = super::slot(&mut self.counts, frame_id);
        match access {
            Access::Load => *count = 1,
            Access::Hit => *count = count.saturating_add(1),
        }
    }

    fn priority(&self, frame_id: FrameId) -> u64 {
        self.counts.get(frame_id.index()).copied().unwrap_or(0)
    }

    fn forget(&mut self, frame_id: FrameId) {
        if let Some(count) = self.counts.get_mut(frame_id.index()) {
            *count = 0;
        }
    }

    fn seed(&mut self, frame_id: FrameId, rank: u64) {
        *super::slot(&mut self.counts, frame_id) = rank.saturating_add(1);
    }
}
