//! FIFO (First-In-First-Out) replacement policy.

use crate::buffer::replacer::{Access, EvictionPolicy};
use crate::common::FrameId;

/// Evicts pages in the order they were loaded.
///
/// Hits do not reorder: a frame's priority is the load tick and stays put
/// until the frame is evicted.
#[derive(Debug, Default)]
pub struct FifoPolicy {
    /// Logical clock, bumped on every load.
    clock: u64,
    /// Load tick per frame (index = frame id).
    loaded_at: Vec<u64>,
}

impl FifoPolicy {
    pub fn new(capacity: usize) -> Self {
        Self {
            clock: 0,
            loaded_at: vec![0; capacity],
        }
    }
}

impl EvictionPolicy for FifoPolicy {
    fn name(&self) -> &'static str {
        "fifo"
    }

    fn record(&mut self, frame_id: FrameId, access: Access) {
        if access == Access::Load {
            self.clock += 1;
            let slot = super::slot(&mut self.loaded_at, frame_id);
            *slot = self.clock;
        }
    }

    fn priority(&self, frame_id: FrameId) -> u64 {
        self.loaded_at.get(frame_id.index()).copied().unwrap_or(0)
    }

    fn forget(&mut self, frame_id: FrameId) {
        if let Some(slot) = self.loaded_at.get_mut(frame_id.index()) {
            *slot = 0;
        }
    }
}
